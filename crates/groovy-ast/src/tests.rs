use groovy_config::ParserConfig;
use groovy_core::{Position, Range, TypeRef};
use groovy_syntax::raw::{
    BinaryData, ClosureData, ExprClass, ExprData, PropertyData, RawExpr, RawStmt, SourcePos,
    StmtKind, TernaryData,
};
use pretty_assertions::assert_eq;

use super::*;

const POS: SourcePos = SourcePos {
    line: 1,
    column: 1,
    last_line: 1,
    last_column: 2,
};

fn parse(source: &str) -> Ast {
    let result = GroovyParser::default().parse(source);
    assert!(!result.has_errors(), "{:?}", result.problems);
    result.ast.expect("ast")
}

fn find(ast: &Ast, pred: impl Fn(&NodeKind) -> bool) -> NodeId {
    ast.get_all_nodes()
        .into_iter()
        .find(|&id| pred(&ast[id].kind))
        .expect("node")
}

fn named(ast: &Ast, name: &str) -> NodeId {
    find(ast, |kind| kind.name().is_some_and(|n| n == name) && kind.is_declaration())
}

fn variable(name: &str) -> RawExpr {
    RawExpr::new(
        ExprClass::Variable,
        ExprData::Variable {
            name: name.to_string(),
            origin_type: None,
        },
        POS,
    )
}

fn int(value: i32) -> RawExpr {
    RawExpr::new(
        ExprClass::Constant,
        ExprData::Constant(ConstantValue::Integer(value)),
        POS,
    )
}

fn lower(raw: &RawExpr) -> Ast {
    let mut converter = Converter::new();
    let root = converter.expr(raw).expect("convert");
    converter.finish(root)
}

fn root_kind(ast: &Ast) -> &NodeKind {
    &ast[ast.root()].kind
}

#[test]
fn declaration_is_not_downgraded_to_assignment() {
    let data = BinaryData {
        left: Box::new(RawExpr::new(
            ExprClass::Variable,
            ExprData::Variable {
                name: "s".to_string(),
                origin_type: Some(TypeRef::new("String")),
            },
            POS,
        )),
        op: "=".to_string(),
        right: Box::new(int(1)),
    };

    let decl = lower(&RawExpr::new(
        ExprClass::Declaration,
        ExprData::Binary(data.clone()),
        POS,
    ));
    match root_kind(&decl) {
        NodeKind::Declaration { ty, target, value } => {
            assert_eq!(ty, &TypeRef::new("String"));
            assert_eq!(decl.name(*target), Some("s"));
            assert!(value.is_some());
        }
        other => panic!("expected a declaration, got {other:?}"),
    }

    let assign = lower(&RawExpr::new(ExprClass::Binary, ExprData::Binary(data), POS));
    assert!(matches!(
        root_kind(&assign),
        NodeKind::Binary {
            op: BinaryOp::Assign,
            ..
        }
    ));
}

#[test]
fn attribute_is_not_downgraded_to_property() {
    let data = PropertyData {
        object: Box::new(variable("person")),
        property: "name".to_string(),
        safe: false,
        spread: false,
    };
    let attribute = lower(&RawExpr::new(
        ExprClass::Attribute,
        ExprData::Property(data.clone()),
        POS,
    ));
    assert!(matches!(root_kind(&attribute), NodeKind::Attribute { name, .. } if name == "name"));

    let property = lower(&RawExpr::new(ExprClass::Property, ExprData::Property(data), POS));
    assert!(matches!(root_kind(&property), NodeKind::Property { name, .. } if name == "name"));
}

#[test]
fn elvis_is_not_downgraded_to_ternary() {
    let data = TernaryData {
        condition: Box::new(variable("a")),
        true_expr: Box::new(variable("a")),
        false_expr: Box::new(int(0)),
    };
    let elvis = lower(&RawExpr::new(ExprClass::Elvis, ExprData::Ternary(data.clone()), POS));
    assert!(matches!(root_kind(&elvis), NodeKind::Elvis { .. }));

    let ternary = lower(&RawExpr::new(ExprClass::Ternary, ExprData::Ternary(data), POS));
    assert!(matches!(root_kind(&ternary), NodeKind::Ternary { .. }));
}

#[test]
fn lambda_is_not_downgraded_to_closure() {
    let data = ClosureData {
        params: None,
        body: Box::new(RawStmt::new(StmtKind::Block(Vec::new()), POS)),
    };
    let lambda = lower(&RawExpr::new(ExprClass::Lambda, ExprData::Closure(data.clone()), POS));
    assert!(matches!(root_kind(&lambda), NodeKind::Lambda { params, .. } if params.is_empty()));

    let closure = lower(&RawExpr::new(ExprClass::Closure, ExprData::Closure(data), POS));
    assert!(matches!(root_kind(&closure), NodeKind::Closure { params: None, .. }));
}

#[test]
fn mismatched_class_and_data_is_malformed() {
    let raw = RawExpr::new(
        ExprClass::Constant,
        ExprData::Binary(BinaryData {
            left: Box::new(int(1)),
            op: "+".to_string(),
            right: Box::new(int(2)),
        }),
        POS,
    );
    let err = Converter::new().expr(&raw).unwrap_err();
    assert!(matches!(err, ConvertError::MalformedTree { .. }), "{err}");
}

#[test]
fn unknown_operator_is_malformed() {
    let raw = RawExpr::new(
        ExprClass::Binary,
        ExprData::Binary(BinaryData {
            left: Box::new(int(1)),
            op: "<>".to_string(),
            right: Box::new(int(2)),
        }),
        POS,
    );
    assert!(Converter::new().expr(&raw).is_err());
}

#[test]
fn runaway_nesting_is_rejected() {
    let mut raw = int(1);
    for _ in 0..(MAX_CONVERT_DEPTH + 10) {
        raw = RawExpr::new(ExprClass::Not, ExprData::Unary(Box::new(raw)), POS);
    }
    let err = Converter::new().expr(&raw).unwrap_err();
    assert_eq!(err, ConvertError::TooDeep(MAX_CONVERT_DEPTH));
}

#[test]
fn missing_end_collapses_range() {
    let pos = SourcePos {
        line: 3,
        column: 5,
        last_line: -1,
        last_column: -1,
    };
    assert_eq!(
        source_range(pos),
        Some(Range::point(Position::new(3, 5)))
    );
    assert_eq!(source_range(SourcePos::UNKNOWN), None);
}

#[test]
fn declarations_keep_names_and_ranges() {
    let ast = parse("class Account {\n    int balance\n    def deposit(int amount) {}\n}\n");
    assert_eq!(ast.types().len(), 1);

    let class = ast.types()[0];
    assert_eq!(ast.name(class), Some("Account"));
    assert_eq!(ast.range(class).map(|r| r.begin), Some(Position::new(1, 1)));
    assert_eq!(ast.range(class).map(|r| r.end.line), Some(4));

    let field = named(&ast, "balance");
    assert_eq!(ast.range(field).map(|r| r.begin), Some(Position::new(2, 5)));
    assert_eq!(ast.get_parent(field), Some(class));

    let method = named(&ast, "deposit");
    assert_eq!(ast.range(method).map(|r| r.begin.line), Some(3));
    match ast.kind(method) {
        Some(NodeKind::Method {
            return_type,
            params,
            ..
        }) => {
            assert!(return_type.is_dynamic());
            assert_eq!(params.len(), 1);
            assert_eq!(ast.name(params[0]), Some("amount"));
        }
        other => panic!("expected a method, got {other:?}"),
    }
}

#[test]
fn annotations_become_nodes() {
    let ast = parse("@Deprecated\n@SuppressWarnings('unchecked')\nclass Legacy {}\n");
    let class = ast.types()[0];
    let annotations = &ast[class].annotations;
    assert_eq!(annotations.len(), 2);
    match ast.kind(annotations[1]) {
        Some(NodeKind::Annotation { name, value, members }) => {
            assert_eq!(name, "SuppressWarnings");
            assert!(value.is_some());
            assert!(members.is_empty());
        }
        other => panic!("expected an annotation, got {other:?}"),
    }
    assert_eq!(ast.get_parent(annotations[0]), Some(class));
}

#[test]
fn every_node_but_the_root_has_one_parent() {
    let ast = parse("def total = [1, 2, 3].sum { it * 2 }\nprintln \"total: $total\"\n");
    let all = ast.get_all_nodes();
    assert_eq!(all.len(), ast.len());
    assert_eq!(all[0], ast.root());
    assert_eq!(ast.get_parent(ast.root()), None);
    for &id in &all[1..] {
        let parent = ast.get_parent(id).expect("parent");
        assert!(ast[parent].children().contains(&id));
    }
}

#[test]
fn node_at_finds_the_deepest_node() {
    let ast = parse("def x = 1\nprintln x\n");
    let id = ast.node_at(Position::new(2, 9)).expect("node");
    assert_eq!(ast.kind(id), Some(&NodeKind::Variable { name: "x".into() }));

    let ancestors: Vec<NodeId> = ast.ancestors(id).collect();
    assert!(matches!(
        ast.kind(ancestors[0]),
        Some(NodeKind::MethodCall { name, .. }) if name == "println"
    ));
    assert_eq!(ancestors.last(), Some(&ast.root()));
}

#[test]
fn clone_is_equal_detached_and_disjoint() {
    let mut ast = parse(
        "class Greeter {\n    /** Says hi. */\n    String greet(String who = 'world') {\n        return \"hi $who\"\n    }\n}\n",
    );
    let method = named(&ast, "greet");
    let before = ast.len();

    let copy = clone_subtree(&mut ast, method).expect("clone");
    assert!(structurally_equal(&ast, method, &ast, copy));
    assert_eq!(ast.get_parent(copy), None);
    assert!(ast.get_parent(method).is_some());
    assert_eq!(ast[copy].comment, ast[method].comment);

    let subtree = |root: NodeId| -> Vec<NodeId> {
        let mut out = vec![root];
        let mut i = 0;
        while i < out.len() {
            out.extend(ast[out[i]].children());
            i += 1;
        }
        out
    };
    let original = subtree(method);
    let cloned = subtree(copy);
    assert_eq!(original.len(), cloned.len());
    assert_eq!(ast.len(), before + cloned.len());
    assert!(cloned.iter().all(|id| !original.contains(id)));
}

#[test]
fn extracted_subtree_is_its_own_tree() {
    let ast = parse("class A {\n    def run(x) { x ? x.size() : 0 }\n}\n");
    let method = named(&ast, "run");
    let extracted = extract_subtree(&ast, method).expect("extract");
    assert!(structurally_equal(&ast, method, &extracted, extracted.root()));
    assert_eq!(extracted.get_parent(extracted.root()), None);
    assert_eq!(extracted.get_all_nodes().len(), extracted.len());
}

#[test]
fn structural_equality_sees_values() {
    let ast = parse("def a = 1\ndef b = 2\n");
    let ones: Vec<NodeId> = ast
        .get_all_nodes()
        .into_iter()
        .filter(|&id| matches!(ast[id].kind, NodeKind::Constant(_)))
        .collect();
    assert_eq!(ones.len(), 2);
    assert!(!structurally_equal(&ast, ones[0], &ast, ones[1]));
}

#[test]
fn cloning_a_dangling_handle_fails() {
    let mut ast = parse("class A {}");
    let dangling = NodeId::from_raw(10_000);
    assert_eq!(
        clone_subtree(&mut ast, dangling),
        Err(CloneError::DanglingNode(dangling))
    );
}

#[test]
fn extracts_comment_variants() {
    let comments = extract_comments("// a\n/* b */\n/** c */\nclass A {}\n", 4);
    assert_eq!(
        comments,
        vec![
            Comment::Line {
                content: " a".to_string(),
                range: Range::new(Position::new(1, 1), Position::new(1, 5)),
            },
            Comment::Block {
                content: " b ".to_string(),
                range: Range::new(Position::new(2, 1), Position::new(2, 8)),
            },
            Comment::Javadoc {
                content: " c ".to_string(),
                range: Range::new(Position::new(3, 1), Position::new(3, 9)),
            },
        ]
    );
}

#[test]
fn comment_markers_inside_strings_are_ignored() {
    let source = "def url = 'http://example.com'\ndef glob = \"/* not */\"\n";
    assert!(extract_comments(source, 4).is_empty());
}

#[test]
fn comment_columns_expand_tabs() {
    let comments = extract_comments("\t// tabbed\n", 4);
    assert_eq!(comments[0].range().begin, Position::new(1, 5));
}

#[test]
fn last_leading_comment_is_the_doc_comment() {
    let ast = parse("// license\n/* note */\n/** The widget. */\nclass Widget {}\n");
    let class = ast.types()[0];
    let node = &ast[class];
    assert_eq!(node.comment.as_ref().map(Comment::content), Some(" The widget. "));
    assert!(node.comment.as_ref().is_some_and(Comment::is_doc));
    let orphans: Vec<&str> = node.orphan_comments.iter().map(Comment::content).collect();
    assert_eq!(orphans, vec![" license", " note "]);
}

#[test]
fn comments_are_consumed_by_the_first_declaration_after_them() {
    let ast = parse("/** first */\nclass First {}\nclass Second {}\n");
    let (first, second) = (ast.types()[0], ast.types()[1]);
    assert!(ast[first].comment.is_some());
    assert_eq!(ast[second].comment, None);
}

#[test]
fn members_get_leading_comments() {
    let ast = parse(
        "class Counter {\n    /** the count */\n    int count\n    // bumps\n    def bump() { count++ }\n}\n",
    );
    let field = named(&ast, "count");
    let method = named(&ast, "bump");
    assert_eq!(ast[field].comment.as_ref().map(Comment::content), Some(" the count "));
    assert_eq!(ast[method].comment.as_ref().map(Comment::content), Some(" bumps"));
    assert_eq!(ast[ast.types()[0]].comment, None);
}

#[test]
fn script_methods_get_leading_comments() {
    let ast = parse("// setup\nprintln 'start'\n/** Greets. */\ndef greet() {}\ngreet()\n");
    let method = named(&ast, "greet");
    let node = &ast[method];
    assert_eq!(node.comment.as_ref().map(Comment::content), Some(" Greets. "));
    assert!(node.orphan_comments.is_empty());
}

#[test]
fn comment_attribution_can_be_disabled() {
    let config = ParserConfig {
        attribute_comments: false,
        ..ParserConfig::default()
    };
    let result = GroovyParser::new(config).parse("/** doc */\nclass A {}\n");
    let ast = result.ast.expect("ast");
    assert_eq!(ast[ast.types()[0]].comment, None);
}

#[test]
fn binary_operators_round_trip_their_text() {
    for text in ["+", "==~", "<=>", "?=", "!instanceof", "?[", ">>>="] {
        let op = BinaryOp::from_text(text).expect(text);
        assert_eq!(op.text(), text);
    }
    assert_eq!(BinaryOp::from_text("<>"), None);
    assert!(BinaryOp::ElvisAssign.is_assignment());
    assert!(BinaryOp::NotIn.is_boolean());
    assert!(!BinaryOp::Plus.is_boolean());
}
