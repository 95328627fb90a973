use groovy_config::{LanguageLevel, ParserConfig};
use groovy_core::TypeRef;
use pretty_assertions::assert_eq;

use crate::raw::*;
use crate::{
    lex, parse_number, split_gstring, unescape_string, FrontEnd, FrontEndOutput, GStringPart,
    GroovyFrontEnd, Message, SyntaxKind,
};

fn parse_with(source: &str, config: &ParserConfig) -> FrontEndOutput {
    GroovyFrontEnd::default().parse(source, config)
}

fn parse(source: &str) -> RawModule {
    let output = parse_with(source, &ParserConfig::default());
    assert_eq!(output.messages, Vec::new(), "unexpected errors for {source:?}");
    output.module.expect("module")
}

fn run_statements(module: &RawModule) -> &[RawStmt] {
    let script = module.script_class().expect("script class");
    let run = script.methods.iter().find(|m| m.name == "run").expect("run method");
    match &run.body.as_ref().expect("run body").kind {
        StmtKind::Block(statements) => statements,
        other => panic!("unexpected run body {other:?}"),
    }
}

fn expr(stmt: &RawStmt) -> &RawExpr {
    match &stmt.kind {
        StmtKind::Expression(expr) => expr,
        other => panic!("expected expression statement, got {other:?}"),
    }
}

fn declaration_value(stmt: &RawStmt) -> &RawExpr {
    &expr(stmt).as_declaration().expect("declaration").right
}

fn kinds(source: &str) -> Vec<SyntaxKind> {
    lex(source, 4).0.into_iter().map(|t| t.kind).collect()
}

#[test]
fn number_literal_kinds() {
    assert_eq!(
        kinds("1 1L 1G 1.0 1.0G 1f 0x1F 1..3"),
        vec![
            SyntaxKind::IntLiteral,
            SyntaxKind::LongLiteral,
            SyntaxKind::BigIntegerLiteral,
            SyntaxKind::DoubleLiteral,
            SyntaxKind::BigDecimalLiteral,
            SyntaxKind::FloatLiteral,
            SyntaxKind::IntLiteral,
            SyntaxKind::IntLiteral,
            SyntaxKind::Range,
            SyntaxKind::IntLiteral,
            SyntaxKind::Eof,
        ]
    );
}

#[test]
fn tabs_expand_to_tab_stops() {
    let (tokens, errors) = lex("\tx\n  y", 4);
    assert!(errors.is_empty());
    assert_eq!((tokens[0].line, tokens[0].column, tokens[0].end_column), (1, 5, 6));
    assert!(!tokens[0].newline_before);
    assert_eq!((tokens[1].line, tokens[1].column), (2, 3));
    assert!(tokens[1].newline_before);
}

#[test]
fn interpolated_strings_are_detected() {
    assert_eq!(
        kinds(r#""a $b" 'c $d' "e ${f}" "cost: $5""#),
        vec![
            SyntaxKind::GStringLiteral,
            SyntaxKind::StringLiteral,
            SyntaxKind::GStringLiteral,
            SyntaxKind::StringLiteral,
            SyntaxKind::Eof,
        ]
    );
}

#[test]
fn unterminated_string_is_a_lex_error() {
    let (tokens, errors) = lex("x = 'abc", 4);
    assert_eq!(tokens[2].kind, SyntaxKind::Error);
    assert_eq!(errors.len(), 1);
    assert_eq!((errors[0].line, errors[0].column), (1, 5));
}

#[test]
fn integer_literals_widen() {
    assert_eq!(
        parse_number(SyntaxKind::IntLiteral, "2147483647").unwrap(),
        ConstantValue::Integer(i32::MAX)
    );
    assert_eq!(
        parse_number(SyntaxKind::IntLiteral, "2147483648").unwrap(),
        ConstantValue::Long(2_147_483_648)
    );
    assert_eq!(
        parse_number(SyntaxKind::IntLiteral, "-2147483648").unwrap(),
        ConstantValue::Integer(i32::MIN)
    );
    assert_eq!(
        parse_number(SyntaxKind::IntLiteral, "99999999999999999999").unwrap(),
        ConstantValue::BigInteger("99999999999999999999".to_string())
    );
    assert!(parse_number(SyntaxKind::IntLiteral, "3000000000i").is_err());
}

#[test]
fn integer_literal_radixes() {
    assert_eq!(parse_number(SyntaxKind::IntLiteral, "0x10").unwrap(), ConstantValue::Integer(16));
    assert_eq!(parse_number(SyntaxKind::IntLiteral, "010").unwrap(), ConstantValue::Integer(8));
    assert_eq!(parse_number(SyntaxKind::IntLiteral, "0b101").unwrap(), ConstantValue::Integer(5));
    assert_eq!(parse_number(SyntaxKind::IntLiteral, "1_000").unwrap(), ConstantValue::Integer(1000));
    assert_eq!(parse_number(SyntaxKind::LongLiteral, "0xFFL").unwrap(), ConstantValue::Long(255));
}

#[test]
fn decimal_literals_keep_their_text() {
    assert_eq!(parse_number(SyntaxKind::DoubleLiteral, "1.5").unwrap(), ConstantValue::Double(1.5));
    assert_eq!(parse_number(SyntaxKind::FloatLiteral, "2.5f").unwrap(), ConstantValue::Float(2.5));
    assert_eq!(
        parse_number(SyntaxKind::BigDecimalLiteral, "-1.25G").unwrap(),
        ConstantValue::BigDecimal("-1.25".to_string())
    );
}

#[test]
fn string_escapes() {
    assert_eq!(unescape_string("'a\\tb'").unwrap(), "a\tb");
    assert_eq!(unescape_string("\"\\u0041\\$\"").unwrap(), "A$");
    assert_eq!(unescape_string("'''multi\nline'''").unwrap(), "multi\nline");
    assert!(unescape_string("'\\q'").is_err());
}

#[test]
fn gstring_parts() {
    assert_eq!(
        split_gstring("hi $name.first!"),
        vec![
            GStringPart::Text("hi ".to_string()),
            GStringPart::Value {
                source: "name.first".to_string(),
                offset: 4,
            },
            GStringPart::Text("!".to_string()),
        ]
    );
    assert_eq!(
        split_gstring("${a + 1}"),
        vec![
            GStringPart::Text(String::new()),
            GStringPart::Value {
                source: "a + 1".to_string(),
                offset: 2,
            },
            GStringPart::Text(String::new()),
        ]
    );
}

#[test]
fn parses_class_declarations() {
    let module = parse(
        r#"package demo

import java.util.List

class Person extends Base implements Named {
    String name
    int age = 3
    Person(String name) { this.name = name }
    String greet(String other) { return "hi" }
}
"#,
    );
    assert_eq!(module.package.as_ref().map(|p| p.name.as_str()), Some("demo"));
    assert_eq!(module.imports[0].name, "java.util.List");
    assert_eq!(module.classes.len(), 1);

    let class = &module.classes[0];
    assert_eq!(class.name, "Person");
    assert_eq!(class.kind, ClassKind::Class);
    assert!(!class.is_script);
    assert_eq!(class.superclass, Some(TypeRef::new("Base")));
    assert_eq!(class.interfaces, vec![TypeRef::new("Named")]);
    assert_eq!(
        class.fields.iter().map(|f| f.name.as_str()).collect::<Vec<_>>(),
        vec!["name", "age"]
    );
    assert_eq!(class.fields[1].ty, Some(TypeRef::new("int")));
    assert_eq!(class.constructors.len(), 1);
    assert_eq!(class.constructors[0].params[0].ty, Some(TypeRef::new("String")));

    let greet = &class.methods[0];
    assert_eq!(greet.name, "greet");
    assert_eq!(greet.return_type, Some(TypeRef::new("String")));
    assert_eq!(greet.params[0].name, "other");
    assert_eq!(class.pos.line, 5);
    assert_eq!(class.pos.last_line, 10);
}

#[test]
fn interface_and_enum_modifiers() {
    let module = parse("interface Shape { double area() }\nenum Color { RED, GREEN; String hex }");
    let shape = &module.classes[0];
    assert_eq!(shape.kind, ClassKind::Interface);
    assert!(shape.modifiers.is_abstract());
    assert!(shape.methods[0].body.is_none());

    let color = &module.classes[1];
    assert_eq!(color.kind, ClassKind::Enum);
    assert!(color.modifiers.is_final());
    let constants: Vec<_> = color
        .fields
        .iter()
        .filter(|f| f.is_enum_constant)
        .map(|f| f.name.as_str())
        .collect();
    assert_eq!(constants, vec!["RED", "GREEN"]);
    assert_eq!(color.fields[0].ty, Some(TypeRef::new("Color")));
    assert_eq!(color.fields[2].name, "hex");
}

#[test]
fn nested_classes_are_hoisted() {
    let module = parse("class Outer { class Inner {} }");
    let names: Vec<_> = module.classes.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Outer", "Outer$Inner"]);
}

#[test]
fn synthesizes_script_class() {
    let module = parse("def x = 1\nprintln x\ndef greet(name) { \"hi $name\" }\n");
    assert_eq!(module.classes.len(), 1);
    let script = module.script_class().unwrap();
    assert_eq!(script.name, "Script");
    assert_eq!(script.superclass, Some(TypeRef::new("groovy.lang.Script")));
    assert_eq!(
        script.methods.iter().map(|m| m.name.as_str()).collect::<Vec<_>>(),
        vec!["greet", "run"]
    );

    let statements = run_statements(&module);
    assert_eq!(statements.len(), 2);
    let decl = expr(&statements[0]);
    assert_eq!(decl.class, ExprClass::Declaration);
    assert!(decl.as_binary().is_some());
    match &decl.as_declaration().unwrap().left.data {
        ExprData::Variable { name, origin_type } => {
            assert_eq!(name, "x");
            assert_eq!(origin_type, &None);
        }
        other => panic!("unexpected target {other:?}"),
    }

    match &expr(&statements[1]).data {
        ExprData::MethodCall {
            object: None,
            method,
            args,
            ..
        } => {
            assert_eq!(method, "println");
            assert_eq!(args.len(), 1);
        }
        other => panic!("expected command call, got {other:?}"),
    }
}

#[test]
fn script_name_is_configurable() {
    let output = GroovyFrontEnd::with_script_name("build").parse("x = 1", &ParserConfig::default());
    assert_eq!(output.module.unwrap().classes[0].name, "build");
}

#[test]
fn typed_declarations_record_origin_type() {
    let module = parse("List<String> names = []\nint a = 1, b");
    let statements = run_statements(&module);
    assert_eq!(statements.len(), 3);
    match &expr(&statements[0]).as_declaration().unwrap().left.data {
        ExprData::Variable { origin_type, .. } => assert_eq!(
            origin_type,
            &Some(TypeRef::new("List").with_args(vec![TypeRef::new("String")]))
        ),
        other => panic!("unexpected target {other:?}"),
    }
    assert_eq!(expr(&statements[2]).as_declaration().unwrap().right.class, ExprClass::Empty);
}

#[test]
fn plain_assignment_is_not_a_declaration() {
    let module = parse("x = 1");
    let assignment = expr(&run_statements(&module)[0]);
    assert_eq!(assignment.class, ExprClass::Binary);
    assert!(assignment.as_declaration().is_none());
    assert_eq!(assignment.as_binary().unwrap().op, "=");
}

#[test]
fn specialized_expression_classes() {
    let module = parse("def a = b ?: c\ndef d = x.@y\ndef f = (p) -> p\ndef g = { it }");
    let statements = run_statements(&module);

    let elvis = declaration_value(&statements[0]);
    assert_eq!(elvis.class, ExprClass::Elvis);
    assert!(elvis.is_a(ExprClass::Ternary));
    let ternary = elvis.as_ternary().unwrap();
    assert_eq!(ternary.condition, ternary.true_expr);

    let attribute = declaration_value(&statements[1]);
    assert_eq!(attribute.class, ExprClass::Attribute);
    assert_eq!(attribute.as_property().unwrap().property, "y");

    let lambda = declaration_value(&statements[2]);
    assert_eq!(lambda.class, ExprClass::Lambda);
    assert_eq!(lambda.as_closure().unwrap().params.as_ref().unwrap().len(), 1);

    let closure = declaration_value(&statements[3]);
    assert_eq!(closure.class, ExprClass::Closure);
    assert!(closure.as_lambda().is_none());
    assert_eq!(closure.as_closure().unwrap().params, None);
}

#[test]
fn ranges_and_negative_literals() {
    let module = parse("def r = 1..<3\ndef n = -2147483648");
    let statements = run_statements(&module);
    match &declaration_value(&statements[0]).data {
        ExprData::Range { inclusive, .. } => assert!(!inclusive),
        other => panic!("expected range, got {other:?}"),
    }
    assert_eq!(
        declaration_value(&statements[1]).data,
        ExprData::Constant(ConstantValue::Integer(i32::MIN))
    );
}

#[test]
fn named_arguments_become_a_leading_map() {
    let module = parse("foo(a: 1, 2)\nobj.bar 1");
    let statements = run_statements(&module);
    match &expr(&statements[0]).data {
        ExprData::MethodCall { args, .. } => {
            assert_eq!(args.len(), 2);
            assert_eq!(args[0].class, ExprClass::Map);
            assert_eq!(args[1].data, ExprData::Constant(ConstantValue::Integer(2)));
        }
        other => panic!("expected call, got {other:?}"),
    }
    match &expr(&statements[1]).data {
        ExprData::MethodCall { object, method, .. } => {
            assert_eq!(method, "bar");
            assert_eq!(object.as_ref().map(|o| o.class), Some(ExprClass::Variable));
        }
        other => panic!("expected command call, got {other:?}"),
    }
}

#[test]
fn control_flow_statements() {
    let module = parse(
        r#"for (item in items) { println item }
for (int i = 0; i < 3; i++) {}
try { risky() } catch (IOException | RuntimeException e) { } finally { done() }
while (x) x--
"#,
    );
    let statements = run_statements(&module);
    assert!(matches!(statements[0].kind, StmtKind::ForIn { .. }));
    match &statements[1].kind {
        StmtKind::For { init, condition, update, .. } => {
            assert_eq!(init.len(), 1);
            assert!(condition.is_some());
            assert_eq!(update[0].class, ExprClass::Postfix);
        }
        other => panic!("expected for, got {other:?}"),
    }
    match &statements[2].kind {
        StmtKind::Try { catches, finally, .. } => {
            assert_eq!(catches.len(), 2);
            assert_eq!(catches[1].param.ty, Some(TypeRef::new("RuntimeException")));
            assert!(finally.is_some());
        }
        other => panic!("expected try, got {other:?}"),
    }
    assert!(matches!(statements[3].kind, StmtKind::While { .. }));
}

#[test]
fn interpolation_positions_are_absolute() {
    let module = parse("def s = \"ab ${x}\"");
    match &declaration_value(&run_statements(&module)[0]).data {
        ExprData::GString { strings, values, .. } => {
            assert_eq!(strings, &vec!["ab ".to_string(), String::new()]);
            assert_eq!((values[0].pos.line, values[0].pos.column), (1, 15));
        }
        other => panic!("expected gstring, got {other:?}"),
    }
}

#[test]
fn parrot_syntax_is_gated_by_language_level() {
    let config = ParserConfig {
        language_level: LanguageLevel::Groovy2_5,
        ..ParserConfig::default()
    };
    let output = parse_with("def f = (a) -> a", &config);
    assert!(output.module.is_none());
    assert!(output.messages[0].text().starts_with("lambda expressions require"));

    let output = parse_with("def ok = a !in b", &config);
    assert_eq!(output.messages.len(), 1);

    let output = parse_with("def ok = a !in b", &ParserConfig::default());
    assert!(output.messages.is_empty());
}

#[test]
fn errors_stop_at_tolerance() {
    let config = ParserConfig {
        tolerance: 2,
        ..ParserConfig::default()
    };
    let output = parse_with(")\n)\n)\n)\n)\n)", &config);
    assert_eq!(output.messages.len(), 2);
    assert!(output.module.is_none());
    assert_eq!(output.messages[0].line(), Some(1));
    assert_eq!(output.messages[1].line(), Some(2));
}

#[test]
fn unconsumed_token_is_reported_once() {
    let source = "class A {\n  void m() {\n    int x = )\n  }\n}\n";
    let output = parse_with(source, &ParserConfig::default());
    assert_eq!(output.messages.len(), 1, "{:?}", output.messages);
    assert_eq!(output.messages[0].line(), Some(3));
}

#[test]
fn incomplete_expression_is_reported_on_its_own_line() {
    let cases = [
        ("class B {\n  def y =\n}\n", 2),
        ("class B {\n  int x = 1 +\n}\n", 2),
        ("class B {\n  void m() {\n    foo(1,\n  }\n}\n", 3),
    ];
    for (source, line) in cases {
        let output = parse_with(source, &ParserConfig::default());
        assert_eq!(output.messages.len(), 1, "{source:?}: {:?}", output.messages);
        assert_eq!(output.messages[0].line(), Some(line), "{source:?}");
    }
}

#[test]
fn statement_starting_with_a_bad_token_is_reported_at_it() {
    let output = parse_with("x = 1\n)\n", &ParserConfig::default());
    assert_eq!(output.messages.len(), 1);
    assert_eq!(output.messages[0].line(), Some(2));
}

#[test]
fn runaway_nesting_is_reported_as_exception() {
    let source = format!("{}1{}", "(".repeat(150), ")".repeat(150));
    let output = parse_with(&source, &ParserConfig::default());
    assert!(output
        .messages
        .iter()
        .any(|m| matches!(m, Message::Exception { .. })));
    assert!(output.module.is_none());
}

#[test]
fn redundant_imports_warn() {
    let output = parse_with(
        "import java.lang.String\nimport java.util.List\nimport java.util.List\n",
        &ParserConfig::default(),
    );
    assert!(output.messages.is_empty());
    assert_eq!(output.warnings.len(), 2);
    assert!(output.warnings[0].message.contains("java.lang.String"));
    assert_eq!(output.warnings[1].line, 3);
}

#[test]
fn duplicate_classes_are_reported() {
    let output = parse_with("class A {}\nclass A {}", &ParserConfig::default());
    assert!(matches!(
        &output.messages[0],
        Message::Simple { message } if message.starts_with("Invalid duplicate class definition of class A")
    ));
}

#[test]
fn tokens_are_kept_on_request() {
    let config = ParserConfig {
        store_tokens: true,
        ..ParserConfig::default()
    };
    let tokens = parse_with("x = 1", &config).tokens.unwrap();
    assert_eq!(tokens.len(), 4);
    assert_eq!(tokens.last().map(|t| t.kind), Some(SyntaxKind::Eof));
    assert!(parse_with("x = 1", &ParserConfig::default()).tokens.is_none());
}
