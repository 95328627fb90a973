use pretty_assertions::assert_eq;

use crate::{LineIndex, Position, Problem, Range, Severity, TextSize, TypeRef};

#[test]
fn range_clamps_inverted_end() {
    let range = Range::new(Position::new(3, 5), Position::new(2, 1));
    assert_eq!(range.end, range.begin);
}

#[test]
fn range_contains_is_inclusive() {
    let range = Range::new(Position::new(1, 5), Position::new(1, 8));
    assert!(range.contains(Position::new(1, 5)));
    assert!(range.contains(Position::new(1, 8)));
    assert!(!range.contains(Position::new(1, 9)));
    assert!(!range.contains(Position::new(2, 1)));
}

#[test]
fn line_index_positions_are_one_based() {
    let text = "class A {\r\n  def x\n}";
    let index = LineIndex::new(text);
    assert_eq!(index.line_count(), 3);
    assert_eq!(index.position(text, TextSize::from(0)), Position::new(1, 1));
    assert_eq!(index.position(text, TextSize::from(13)), Position::new(2, 3));
    assert_eq!(index.line_text(text, 2), Some("  def x"));
    assert_eq!(
        index.offset(text, Position::new(2, 3)),
        Some(TextSize::from(13))
    );
    assert_eq!(index.offset(text, Position::new(2, 40)), None);
}

#[test]
fn problem_with_range_defaults_position() {
    let range = Range::new(Position::new(4, 2), Position::new(4, 9));
    let problem = Problem::error("unexpected token").with_range(range);
    assert_eq!(problem.position, Some(Position::new(4, 2)));
    assert_eq!(problem.severity, Severity::Error);
    assert_eq!(problem.to_string(), "ERROR @ 4:2: unexpected token");
}

#[test]
fn type_ref_parses_generics_and_arrays() {
    let ty = TypeRef::parse("java.util.Map<String, List<Integer>>[]").unwrap();
    assert_eq!(ty.name, "java.util.Map");
    assert_eq!(ty.args.len(), 2);
    assert_eq!(ty.args[1].args[0].name, "Integer");
    assert_eq!(ty.dimensions, 1);
    assert_eq!(ty.to_string(), "java.util.Map<String, List<Integer>>[]");
}

#[test]
fn type_ref_wildcards_collapse_to_bounds() {
    let ty = TypeRef::parse("List<? extends Number>").unwrap();
    assert_eq!(ty.args[0].name, "Number");
    let ty = TypeRef::parse("List<?>").unwrap();
    assert_eq!(ty.args[0].name, "java.lang.Object");
}

#[test]
fn type_ref_varargs_add_a_dimension() {
    let ty = TypeRef::parse("String...").unwrap();
    assert_eq!(ty.name, "String");
    assert_eq!(ty.dimensions, 1);
}

#[test]
fn type_ref_rejects_garbage() {
    assert_eq!(TypeRef::parse(""), None);
    assert_eq!(TypeRef::parse("List<"), None);
    assert_eq!(TypeRef::parse("a b"), None);
}
