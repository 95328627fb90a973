use std::sync::Arc;

use groovy_ast::{Ast, GroovyParser, NodeId, NodeKind};
use groovy_types::reflection::JsonClassIndex;
use groovy_types::{ReflectionTypeSolver, TypeKind, TypeSolver, ValueDeclaration};
use pretty_assertions::assert_eq;

use super::*;

fn parse(source: &str) -> Arc<Ast> {
    let result = GroovyParser::default().parse(source);
    assert!(!result.has_errors(), "{:?}", result.problems);
    Arc::new(result.ast.expect("ast"))
}

fn resolver(source: &str) -> SymbolResolver {
    SymbolResolver::new(parse(source), Arc::new(ReflectionTypeSolver::builtin()))
}

fn resolver_with_index(source: &str, index: &str) -> SymbolResolver {
    let index = JsonClassIndex::from_json_str(index).expect("index");
    SymbolResolver::new(parse(source), Arc::new(ReflectionTypeSolver::with_index(index)))
}

/// The value of `def <name> = ...`.
fn initializer(ast: &Ast, name: &str) -> NodeId {
    ast.get_all_nodes()
        .into_iter()
        .find_map(|id| match ast.kind(id) {
            Some(NodeKind::Declaration {
                target,
                value: Some(value),
                ..
            }) if ast.name(*target) == Some(name) => Some(*value),
            _ => None,
        })
        .expect("declaration")
}

fn solved_type(solver: &dyn TypeSolver, name: &str) -> Option<String> {
    solver
        .try_to_solve_type(name)
        .into_declaration()
        .map(|decl| decl.qualified_name())
}

const ACME: &str = r#"{
  "classes": [
    { "name": "com.acme.Widget", "access_flags": 1, "super_class": "java.lang.Object" },
    { "name": "com.other.Widget", "access_flags": 1, "super_class": "java.lang.Object" },
    { "name": "com.other.Gadget", "access_flags": 1, "super_class": "java.lang.Object" }
  ]
}"#;

#[test]
fn local_classes_win_over_default_packages() {
    let resolver = resolver("class List {}\n");
    let solver = resolver.type_solver();
    assert_eq!(solved_type(solver, "List").as_deref(), Some("List"));
    assert_eq!(solved_type(solver, "java.util.List").as_deref(), Some("java.util.List"));
}

#[test]
fn names_resolve_through_packages_in_order() {
    let resolver = resolver("package shop\nclass Order {}\n");
    let solver = resolver.type_solver();
    assert_eq!(solved_type(solver, "Order").as_deref(), Some("shop.Order"));
    assert_eq!(solved_type(solver, "shop.Order").as_deref(), Some("shop.Order"));
    assert_eq!(solved_type(solver, "String").as_deref(), Some("java.lang.String"));
    assert_eq!(solved_type(solver, "HashMap").as_deref(), Some("java.util.HashMap"));
    assert_eq!(solved_type(solver, "BigDecimal").as_deref(), Some("java.math.BigDecimal"));
    assert_eq!(solved_type(solver, "Closure").as_deref(), Some("groovy.lang.Closure"));
    assert_eq!(solved_type(solver, "Missing"), None);
    assert_eq!(solved_type(solver, ""), None);
}

#[test]
fn explicit_imports_beat_star_imports() {
    let resolver = resolver_with_index("import com.acme.*\nimport com.other.Widget\n", ACME);
    let solver = resolver.type_solver();
    assert_eq!(solved_type(solver, "Widget").as_deref(), Some("com.other.Widget"));

    let resolver = resolver_with_index("import com.other.*\n", ACME);
    assert_eq!(
        solved_type(resolver.type_solver(), "Gadget").as_deref(),
        Some("com.other.Gadget")
    );
}

#[test]
fn aliased_and_nested_imports() {
    let resolver = resolver("import java.util.ArrayList as Bag\nimport java.util.Map\n");
    let solver = resolver.type_solver();
    assert_eq!(solved_type(solver, "Bag").as_deref(), Some("java.util.ArrayList"));
    assert_eq!(solved_type(solver, "Map.Entry").as_deref(), Some("java.util.Map$Entry"));
}

#[test]
fn source_classes_are_declarations() {
    let resolver = resolver(
        "interface Priced { BigDecimal price() }\n\
         class Item<T extends Number> implements Priced {\n\
             T amount\n\
             Item(T amount) { this.amount = amount }\n\
             BigDecimal price() { 1.0G }\n\
             <R> R convert(R value, String... notes) { value }\n\
         }\n\
         enum Color { RED, GREEN }\n",
    );
    let solver = resolver.type_solver();

    let priced = solver.try_to_solve_type("Priced").into_declaration().expect("Priced");
    assert_eq!(priced.kind(), TypeKind::Interface);
    assert!(priced.superclass().is_none());

    let item = solver.try_to_solve_type("Item").into_declaration().expect("Item");
    assert_eq!(item.kind(), TypeKind::Class);
    let params = item.type_parameters();
    assert_eq!(params.len(), 1);
    assert_eq!(params[0].name, "T");
    assert_eq!(params[0].bounds[0].describe(), "java.lang.Number");
    assert_eq!(item.superclass().map(|s| s.describe()).as_deref(), Some("java.lang.Object"));
    assert_eq!(
        item.interfaces().iter().map(|i| i.describe()).collect::<Vec<_>>(),
        vec!["Priced"]
    );

    let fields = item.declared_fields();
    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0].ty().describe(), "T");
    assert_eq!(fields[0].declaring_type(), "Item");
    assert_eq!(item.constructors()[0].parameters()[0].ty.describe(), "T");

    let convert = item
        .declared_methods()
        .into_iter()
        .find(|m| m.name() == "convert")
        .expect("convert");
    assert_eq!(convert.return_type().describe(), "R");
    assert_eq!(convert.type_parameters()[0].name, "R");
    assert!(convert.is_varargs());
    assert_eq!(convert.signature(), "convert(R, String[])");

    let color = solver.try_to_solve_type("Color").into_declaration().expect("Color");
    assert!(color.is_enum());
    assert_eq!(
        color.superclass().map(|s| s.describe()).as_deref(),
        Some("java.lang.Enum<Color>")
    );
}

#[test]
fn chain_lists_scopes_innermost_first() {
    let resolver = resolver(
        "class Shop {\n\
             def total(int count) {\n\
                 def base = 1\n\
                 [1].each { n ->\n\
                     def t = base\n\
                 }\n\
             }\n\
         }\n",
    );
    let ast = resolver.ast();
    let query = initializer(ast, "t");
    let chain = resolver.context(query);

    let kinds: Vec<&str> = chain
        .contexts()
        .iter()
        .map(|context| match context {
            Context::CompilationUnit => "unit",
            Context::Class { .. } => "class",
            Context::Method { .. } => "method",
            Context::Closure { .. } => "closure",
        })
        .collect();
    assert_eq!(kinds, vec!["closure", "method", "class", "unit"]);

    let Context::Method { method, locals } = &chain.contexts()[1] else {
        panic!("expected a method context");
    };
    assert_eq!(ast.name(*method), Some("total"));
    let names: Vec<&str> = locals.iter().filter_map(|&l| ast.name(l)).collect();
    assert_eq!(names, vec!["base"]);
    assert_eq!(
        chain.enclosing_class().and_then(|c| ast.name(c)),
        Some("Shop")
    );
}

#[test]
fn symbols_resolve_innermost_first() {
    let resolver = resolver(
        "class Shop {\n\
             String count\n\
             def total(int count) {\n\
                 def base = 1\n\
                 [1].each { n ->\n\
                     def t = base\n\
                 }\n\
             }\n\
         }\n",
    );
    let query = initializer(resolver.ast(), "t");
    let describe = |name: &str| {
        resolver
            .solve_symbol(name, query)
            .into_declaration()
            .map(|value| (value.is_field(), value.ty().describe()))
    };

    assert_eq!(describe("n"), Some((false, "java.lang.Object".to_string())));
    assert_eq!(describe("base"), Some((false, "int".to_string())));
    assert_eq!(describe("count"), Some((false, "int".to_string())));
    assert_eq!(describe("t"), None);
    assert_eq!(describe("missing"), None);
    assert_eq!(describe(""), None);
}

#[test]
fn fields_are_found_on_superclasses() {
    let resolver = resolver(
        "class Base { protected List<String> names }\n\
         class Child extends Base {\n\
             def first() { def t = names }\n\
         }\n",
    );
    let query = initializer(resolver.ast(), "t");
    let value = resolver.solve_symbol("names", query).into_declaration().expect("names");
    let ValueDeclaration::Field(field) = &value else {
        panic!("expected a field, got {value:?}");
    };
    assert_eq!(field.declaring_type(), "Base");
    assert_eq!(value.ty().describe(), "java.util.List<java.lang.String>");
}

#[test]
fn closure_without_parameters_has_it() {
    let resolver = resolver("def c = { def t = it }\ndef d = { x -> def u = it }\n");
    let ast = resolver.ast();
    assert!(resolver.solve_symbol(IMPLICIT_PARAMETER, initializer(ast, "t")).is_solved());
    assert!(!resolver.solve_symbol(IMPLICIT_PARAMETER, initializer(ast, "u")).is_solved());
    assert!(resolver.solve_symbol("x", initializer(ast, "u")).is_solved());
}

#[test]
fn later_locals_are_not_visible() {
    let resolver = resolver("def t = later\ndef later = 1\ndef u = later\n");
    let ast = resolver.ast();
    assert!(!resolver.solve_symbol("later", initializer(ast, "t")).is_solved());
    assert_eq!(resolver.extract_type(initializer(ast, "t")).describe(), "java.lang.Object");
    assert_eq!(resolver.extract_type(initializer(ast, "u")).describe(), "int");
}

#[test]
fn loop_and_catch_variables_are_scoped_to_their_bodies() {
    let resolver = resolver(
        "for (s in [\"a\", \"b\"]) { def t = s }\n\
         for (int i = 0; i < 3; i++) { def u = i }\n\
         try { def v = 1 } catch (IOException e) { def w = e }\n\
         def x = s\n",
    );
    let ast = resolver.ast();
    let at = |name: &str| resolver.extract_type(initializer(ast, name)).describe();
    assert_eq!(at("t"), "java.lang.String");
    assert_eq!(at("u"), "int");
    assert_eq!(at("w"), "java.io.IOException");
    assert!(!resolver.solve_symbol("e", initializer(ast, "v")).is_solved());
    assert!(!resolver.solve_symbol("s", initializer(ast, "x")).is_solved());
}

#[test]
fn implicit_this_calls_search_the_class_then_static_imports() {
    let resolver = resolver(
        "import static java.lang.Math.max\n\
         class Shop {\n\
             List<String> items() { [] }\n\
             def first() {\n\
                 def t = items()\n\
                 def u = max(1, 2)\n\
             }\n\
         }\n",
    );
    let ast = resolver.ast();
    let at = |name: &str| resolver.extract_type(initializer(ast, name)).describe();
    assert_eq!(at("t"), "java.util.List<java.lang.String>");
    assert_eq!(at("u"), "int");

    let query = initializer(ast, "t");
    let method = resolver.solve_method("items", &[], query).into_declaration().expect("items");
    assert_eq!(method.decl.declaring_type(), "Shop");
    assert!(!resolver.solve_method("nothing", &[], query).is_solved());
    assert!(!resolver.solve_method("", &[], query).is_solved());
}

#[test]
fn static_import_fields_are_values() {
    let resolver = resolver("import static java.lang.Math.PI\nimport static java.lang.System.*\ndef t = PI\ndef u = out\n");
    let ast = resolver.ast();
    assert_eq!(resolver.extract_type(initializer(ast, "t")).describe(), "double");
    assert_eq!(resolver.extract_type(initializer(ast, "u")).describe(), "java.io.PrintStream");
}

#[test]
fn type_variables_are_in_scope_for_declarations() {
    let resolver = resolver(
        "class Box<T> {\n\
             T value\n\
             <R> R map(R seed) { T current = value\n seed }\n\
         }\n",
    );
    let ast = resolver.ast();
    let current = ast
        .get_all_nodes()
        .into_iter()
        .find(|&id| matches!(ast.kind(id), Some(NodeKind::Variable { name }) if name == "current"))
        .expect("current");
    assert_eq!(resolver.resolve_type(current).describe(), "T");

    let chain = resolver.context(current);
    let vars: Vec<String> = chain
        .type_variables(resolver.type_solver())
        .into_iter()
        .map(|v| v.name.to_string())
        .collect();
    assert_eq!(vars, vec!["R", "T"]);
}

#[test]
fn runaway_inference_degrades_to_object() {
    let mut source = String::from("def v0 = 1\n");
    for i in 1..200 {
        source.push_str(&format!("def v{i} = v{}\n", i - 1));
    }
    let resolver = resolver(&source);
    let ast = resolver.ast();
    assert_eq!(resolver.extract_type(initializer(ast, "v5")).describe(), "int");
    assert_eq!(resolver.extract_type(initializer(ast, "v199")).describe(), "java.lang.Object");
}
