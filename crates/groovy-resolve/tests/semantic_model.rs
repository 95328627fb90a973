use std::sync::Arc;

use groovy_ast::{GroovyParser, NodeId, NodeKind};
use groovy_config::ParserConfig;
use groovy_core::{Position, Severity};
use groovy_resolve::SemanticModel;
use groovy_types::ReflectionTypeSolver;
use pretty_assertions::assert_eq;

fn model(source: &str) -> SemanticModel {
    let model = SemanticModel::from_source(source);
    assert!(
        model.problems().iter().all(|p| p.severity != Severity::Error),
        "{:?}",
        model.problems()
    );
    model
}

/// The `Variable` declared by `def <name> = ...` (or a typed declaration).
fn declared(model: &SemanticModel, name: &str) -> NodeId {
    let ast = model.ast();
    model
        .get_all_nodes()
        .into_iter()
        .find_map(|id| match ast.kind(id) {
            Some(NodeKind::Declaration { target, .. }) if ast.name(*target) == Some(name) => {
                Some(*target)
            }
            _ => None,
        })
        .expect("declaration")
}

/// Inferred type of the local `t` in `source`.
fn type_of_t(source: &str) -> String {
    let model = model(source);
    model.resolve_type(declared(&model, "t")).describe()
}

#[test]
fn literal_inference_table() {
    let cases = [
        ("def t = 1 + 1", "int"),
        ("def t = 1.0 + 1", "double"),
        ("def t = \"a\" + 1", "java.lang.String"),
        ("def t = [1, 2, 3]", "java.util.ArrayList<java.lang.Integer>"),
        ("def t = true ? 1 : 2.0", "double"),
        ("def t = 2 ** 3", "java.math.BigDecimal"),
        ("def t = [a: 1]", "java.util.LinkedHashMap<java.lang.String, java.lang.Integer>"),
        ("def t = 1..3", "groovy.lang.IntRange"),
        ("def t = 'a'..'c'", "groovy.lang.Range<java.lang.String>"),
        ("def t = 10G", "java.math.BigInteger"),
        ("def t = 1.5G * 2", "java.math.BigDecimal"),
        ("def t = null", "java.lang.Object"),
        ("def t = []", "java.util.ArrayList<java.lang.Object>"),
        ("def t = [:]", "java.util.LinkedHashMap<java.lang.Object, java.lang.Object>"),
        ("def t = 1 < 2", "boolean"),
        ("def t = 1 <=> 2", "int"),
        ("def t = !1", "boolean"),
        ("def t = -2.5", "double"),
        ("def t = { 1 }", "groovy.lang.Closure"),
        ("def n = 1\ndef t = \"n=$n\"", "groovy.lang.GString"),
        ("def t = \"1\" as Integer", "java.lang.Integer"),
        ("def t = new StringBuilder()", "java.lang.StringBuilder"),
        ("def t = new int[3]", "int[]"),
        ("def t = [1, 2.5]", "java.util.ArrayList<java.lang.Double>"),
    ];
    for (source, expected) in cases {
        assert_eq!(type_of_t(source), expected, "{source}");
    }
}

#[test]
fn operators_follow_their_operands() {
    assert_eq!(type_of_t("long a = 1\ndef t = a << 2"), "long");
    assert_eq!(type_of_t("def a = 1\ndef t = a << 2"), "int");
    assert_eq!(type_of_t("def s = \"x\"\ndef t = s ?: 1"), "java.lang.String");
    assert_eq!(type_of_t("def s = \"x\"\ndef t = s * 3"), "java.lang.String");
    assert_eq!(type_of_t("def a = 1\ndef t = a += 2"), "int");
    assert_eq!(type_of_t("def t = true & false"), "boolean");
    assert_eq!(type_of_t("def t = 6 & 3"), "int");
    assert_eq!(type_of_t("def xs = [1]\ndef t = xs + [2]"), "java.util.ArrayList<java.lang.Integer>");
}

#[test]
fn generic_members_are_substituted() {
    assert_eq!(
        type_of_t("ArrayList<Integer> list = []\ndef t = list.get(0)"),
        "java.lang.Integer"
    );
    assert_eq!(type_of_t("def xs = [1, 2]\ndef t = xs[0]"), "java.lang.Integer");
    assert_eq!(type_of_t("def m = [a: 1]\ndef t = m['a']"), "java.lang.Integer");
    assert_eq!(type_of_t("def m = [a: 1]\ndef t = m.a"), "java.lang.Integer");
    assert_eq!(type_of_t("def t = \"abc\"[0]"), "java.lang.String");
    assert_eq!(type_of_t("def xs = [1, 2]\ndef t = xs.size()"), "int");
    assert_eq!(
        type_of_t(
            "class Box<T> {\n    T value\n    T get() { value }\n}\nBox<String> box = null\ndef t = box.get()"
        ),
        "java.lang.String"
    );
    assert_eq!(
        type_of_t("class Box<T> {\n    T value\n}\nBox<String> box = null\ndef t = box.value"),
        "java.lang.String"
    );
}

#[test]
fn properties_fall_back_to_getters() {
    assert_eq!(type_of_t("def s = \"abc\"\ndef t = s.empty"), "boolean");
    assert_eq!(type_of_t("def s = \"abc\"\ndef t = s?.length()"), "int");
    assert_eq!(type_of_t("int[] a = new int[3]\ndef t = a.length"), "int");
    assert_eq!(type_of_t("int[] a = new int[3]\ndef t = a[0]"), "int");
    assert_eq!(type_of_t("def s = \"abc\"\ndef t = s.nothing"), "java.lang.Object");
    assert_eq!(
        type_of_t("def xs = [\"a\", \"b\"]\ndef t = xs*.length()"),
        "java.util.ArrayList<java.lang.Integer>"
    );
    assert_eq!(
        type_of_t("class Base { String name }\nclass Child extends Base {}\nChild c = null\ndef t = c.name"),
        "java.lang.String"
    );
}

#[test]
fn static_members_through_class_names() {
    assert_eq!(type_of_t("def t = Math.max(1, 2)"), "int");
    assert_eq!(type_of_t("def t = Math.max(1.0, 2)"), "double");
    assert_eq!(type_of_t("def t = System.out"), "java.io.PrintStream");
    assert_eq!(type_of_t("def t = Integer.parseInt(\"4\")"), "int");
}

#[test]
fn for_in_variables_take_the_element_type() {
    assert_eq!(type_of_t("for (i in 1..3) { def t = i }"), "java.lang.Integer");
    assert_eq!(type_of_t("int[] xs = new int[2]\nfor (x in xs) { def t = x }"), "int");
    assert_eq!(type_of_t("for (c in \"abc\") { def t = c }"), "java.lang.String");
    assert_eq!(
        type_of_t("def m = [a: 1]\nfor (e in m) { def t = e }"),
        "java.util.Map$Entry<java.lang.String, java.lang.Integer>"
    );
    assert_eq!(type_of_t("for (String s in []) { def t = s }"), "java.lang.String");
}

#[test]
fn parameter_shadows_field() {
    let model = model(
        "class Shop {\n    String name\n    def rename(int name) {\n        def t = name\n    }\n    def label() {\n        def u = name\n    }\n}\n",
    );
    assert_eq!(model.resolve_type(declared(&model, "t")).describe(), "int");
    assert_eq!(model.resolve_type(declared(&model, "u")).describe(), "java.lang.String");
}

#[test]
fn this_and_super_name_the_enclosing_class() {
    let model = model(
        "class Base {}\nclass Shop extends Base {\n    def me() {\n        def t = this\n        def u = super\n    }\n}\n",
    );
    assert_eq!(model.resolve_type(declared(&model, "t")).describe(), "Shop");
    assert_eq!(model.resolve_type(declared(&model, "u")).describe(), "Base");
}

#[test]
fn script_calls_resolve_through_groovy_script() {
    let model = model("println \"hello\"\n");
    let ast = model.ast();
    let call = model
        .get_all_nodes()
        .into_iter()
        .find(|&id| matches!(ast.kind(id), Some(NodeKind::MethodCall { name, .. }) if name == "println"))
        .expect("println call");

    let string = model.resolve_type(match ast.kind(call) {
        Some(NodeKind::MethodCall { args, .. }) => args[0],
        other => panic!("unexpected {other:?}"),
    });
    assert_eq!(string.describe(), "java.lang.String");

    let method = model
        .solve_method("println", &[string], call)
        .into_declaration()
        .expect("println");
    assert_eq!(method.decl.declaring_type(), "groovy.lang.Script");
    assert_eq!(method.decl.signature(), "println(Object)");
    assert!(model.resolve_type(call).is_void());
}

#[test]
fn declarations_resolve_to_their_declared_types() {
    let model = model(
        "package shop\nclass Order {\n    List<String> items\n    Order(int id) {}\n    BigDecimal total(int count, String... notes) { 0 }\n}\n",
    );
    let ast = model.ast();
    let find = |pred: &dyn Fn(&NodeKind) -> bool| {
        model
            .get_all_nodes()
            .into_iter()
            .find(|&id| ast.kind(id).is_some_and(pred))
            .expect("node")
    };

    let class = find(&|k| matches!(k, NodeKind::Class { .. }));
    let field = find(&|k| matches!(k, NodeKind::Field { .. }));
    let ctor = find(&|k| matches!(k, NodeKind::Constructor { .. }));
    let method = find(&|k| matches!(k, NodeKind::Method { name, .. } if name == "total"));
    let notes = find(&|k| matches!(k, NodeKind::Parameter { name, .. } if name == "notes"));

    assert_eq!(model.resolve_type(class).describe(), "shop.Order");
    assert_eq!(model.resolve_type(field).describe(), "java.util.List<java.lang.String>");
    assert_eq!(model.resolve_type(ctor).describe(), "shop.Order");
    assert_eq!(model.resolve_type(method).describe(), "java.math.BigDecimal");
    assert_eq!(model.resolve_type(notes).describe(), "java.lang.String[]");
    assert_eq!(model.resolve_type(ast.root()).describe(), "java.lang.Object");
}

#[test]
fn queries_never_fail_on_unknown_input() {
    for source in ["", "class {", "def x = ", "foo(bar, baz)"] {
        let model = SemanticModel::from_source(source);
        let nodes = model.get_all_nodes();
        assert!(!nodes.is_empty(), "{source}");
        for node in nodes {
            assert!(!model.solve_symbol("", node).is_solved());
            assert!(!model.solve_symbol("nope", node).is_solved());
            assert!(!model.solve_type("", node).is_solved());
            assert!(!model.solve_type("com.nowhere.Missing", node).is_solved());
            assert!(!model.solve_method("", &[], node).is_solved());
            assert!(!model.solve_method("nope", &[], node).is_solved());
            let _ = model.resolve_type(node);
        }
    }

    let model = model("foo(bar, baz)");
    let call = model
        .get_all_nodes()
        .into_iter()
        .find(|&id| matches!(model.ast().kind(id), Some(NodeKind::MethodCall { .. })))
        .expect("call");
    assert_eq!(model.resolve_type(call).describe(), "java.lang.Object");
}

#[test]
fn solve_type_ignores_type_arguments() {
    let model = model("def t = 1\n");
    let node = declared(&model, "t");
    let map = model.solve_type("Map<String, Integer>", node).into_declaration();
    assert_eq!(map.map(|d| d.qualified_name()).as_deref(), Some("java.util.Map"));
}

#[test]
fn lenient_parse_still_resolves_the_rest() {
    let model = SemanticModel::parse(
        "def a = 1\nx = ;\ndef t = a\n",
        &GroovyParser::default(),
        Arc::new(ReflectionTypeSolver::builtin()),
    );
    assert_eq!(model.problems().len(), 1, "{:?}", model.problems());
    assert_eq!(model.problems()[0].line(), Some(2));
    assert_eq!(model.resolve_type(declared(&model, "t")).describe(), "int");
}

#[test]
fn strict_failure_gives_an_empty_unit() {
    let parser = GroovyParser::new(ParserConfig {
        lenient_mode: false,
        ..ParserConfig::default()
    });
    let model = SemanticModel::parse(
        "def a = 1\nx = ;\n",
        &parser,
        Arc::new(ReflectionTypeSolver::builtin()),
    );
    assert!(!model.problems().is_empty());
    assert!(model.ast().types().is_empty());
    assert_eq!(model.get_all_nodes(), vec![model.ast().root()]);
}

#[test]
fn type_at_uses_the_deepest_node() {
    let model = model("def total = 40 + 2\n");
    // Column 13 is the `4` of `40`.
    let ty = model.type_at(Position::new(1, 13)).expect("node at position");
    assert_eq!(ty.describe(), "int");
    assert_eq!(model.type_at(Position::new(9, 1)), None);
}

#[test]
fn locals_referenced_repeatedly_are_inferred_once() {
    // Each local reads the previous one twice; re-inferring every reference
    // would take 2^40 steps.
    let mut source = String::from("def a0 = 1\n");
    for i in 1..=40 {
        source.push_str(&format!("def a{i} = a{p} + a{p}\n", p = i - 1));
    }
    let model = model(&source);
    assert_eq!(model.resolve_type(declared(&model, "a40")).describe(), "int");
    assert_eq!(model.resolve_type(declared(&model, "a20")).describe(), "int");
}
