use std::sync::Arc;

use groovy_core::TypeRef;
use pretty_assertions::assert_eq;

use super::reflection::*;
use super::*;

fn solver() -> ReflectionTypeSolver {
    ReflectionTypeSolver::builtin()
}

fn ty(solver: &ReflectionTypeSolver, name: &str) -> ResolvedType {
    let decl = solver
        .try_to_solve_type(name)
        .into_declaration()
        .unwrap_or_else(|| panic!("{name} should resolve"));
    ResolvedType::reference(decl)
}

fn generic(solver: &ReflectionTypeSolver, name: &str, args: &[ResolvedType]) -> ResolvedType {
    match ty(solver, name) {
        ResolvedType::Reference { decl, .. } => ResolvedType::generic(decl, args.to_vec()),
        other => other,
    }
}

fn int() -> ResolvedType {
    ResolvedType::Primitive(PrimitiveType::Int)
}

fn double() -> ResolvedType {
    ResolvedType::Primitive(PrimitiveType::Double)
}

fn call(solver: &ReflectionTypeSolver, receiver: &ResolvedType, name: &str, args: &[ResolvedType]) -> MemberMethod {
    let candidates = find_methods(solver, receiver, name);
    select_method(solver, candidates, args).unwrap_or_else(|| panic!("no `{name}` on {receiver}"))
}

#[test]
fn primitive_widening() {
    assert!(PrimitiveType::Int.widens_to(PrimitiveType::Long));
    assert!(PrimitiveType::Char.widens_to(PrimitiveType::Int));
    assert!(PrimitiveType::Long.widens_to(PrimitiveType::Float));
    assert!(!PrimitiveType::Int.widens_to(PrimitiveType::Short));
    assert!(!PrimitiveType::Boolean.widens_to(PrimitiveType::Int));
    assert_eq!(PrimitiveType::from_boxed_name("java.lang.Character"), Some(PrimitiveType::Char));
}

#[test]
fn method_signature_with_type_params() {
    let sig = parse_method_signature("<T:Ljava/lang/Object;>(TT;[I)Ljava/util/List<+TT;>;").unwrap();
    assert_eq!(sig.type_params.len(), 1);
    assert_eq!(sig.type_params[0].name, "T");
    assert_eq!(
        sig.params,
        vec![
            TypeSig::TypeVar("T".to_string()),
            TypeSig::Array(Box::new(TypeSig::Base(PrimitiveType::Int))),
        ]
    );
    assert_eq!(
        sig.return_type,
        Some(TypeSig::Class {
            name: "java.util.List".to_string(),
            args: vec![TypeArg::Extends(TypeSig::TypeVar("T".to_string()))],
        })
    );
}

#[test]
fn class_signature_with_interface_bound_only() {
    let sig = parse_class_signature("<T::Ljava/lang/Comparable;>Ljava/lang/Object;Ljava/util/List<TT;>;")
        .unwrap();
    assert_eq!(sig.type_params[0].bounds.len(), 1);
    assert_eq!(sig.interfaces.len(), 1);
}

#[test]
fn inner_class_signature_uses_binary_name() {
    let sig = parse_field_signature("Ljava/util/Map$Entry<TK;TV;>;").unwrap();
    let TypeSig::Class { name, args } = sig else {
        panic!("class signature expected");
    };
    assert_eq!(name, "java.util.Map$Entry");
    assert_eq!(args.len(), 2);
}

#[test]
fn truncated_signature_reports_offset() {
    let err = parse_field_signature("Ljava/lang/String").unwrap_err();
    assert_eq!(err.offset, 17);
    assert!(parse_method_signature("(I").is_err());
    assert!(parse_field_signature("Q").is_err());
}

#[test]
fn type_for_class_names() {
    let solver = solver();
    assert_eq!(solver.type_for_class("int"), int());
    assert_eq!(solver.type_for_class("void"), ResolvedType::Void);
    assert_eq!(solver.type_for_class("java.lang.String").describe(), "java.lang.String");
    assert_eq!(solver.type_for_class("java.lang.String[]").describe(), "java.lang.String[]");
    assert_eq!(solver.type_for_class("[[I").describe(), "int[][]");
    assert_eq!(solver.type_for_class("[Ljava.lang.String;").describe(), "java.lang.String[]");
    assert!(solver.type_for_class("com.example.Missing").is_object());
}

#[test]
fn dotted_inner_class_name_resolves() {
    let solver = solver();
    let entry = solver.try_to_solve_type("java.util.Map.Entry").into_declaration().unwrap();
    assert_eq!(entry.qualified_name(), "java.util.Map$Entry");
    assert_eq!(entry.name(), "Entry");
    assert!(!solver.try_to_solve_type("java.util.Nope.Entry").is_solved());
}

#[test]
fn reflection_class_members() {
    let solver = solver();
    let string = ty(&solver, "java.lang.String");
    let decl = string.declaration().unwrap();
    assert_eq!(decl.kind(), TypeKind::Class);
    assert!(decl.modifiers().is_final());
    assert_eq!(decl.package_name().as_deref(), Some("java.lang"));
    assert_eq!(decl.constructors().len(), 2);
    assert!(decl.declared_methods().iter().all(|m| m.name() != "<init>"));

    let substring = call(&solver, &string, "substring", &[int(), int()]);
    let names: Vec<&str> = substring.params.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["beginIndex", "endIndex"]);
    assert_eq!(substring.return_type, string);

    let list = ty(&solver, "java.util.List");
    assert!(list.declaration().unwrap().is_interface());
}

#[test]
fn unnamed_parameters_get_positional_names() {
    let index = JsonClassIndex::from_stubs([ClassStub {
        name: "demo.Calc".to_string(),
        access_flags: 1,
        super_class: Some("java.lang.Object".to_string()),
        interfaces: Vec::new(),
        signature: None,
        fields: Vec::new(),
        methods: vec![MethodStub {
            name: "sum".to_string(),
            access_flags: 1 | 0x80,
            descriptor: "(Ljava/lang/String;[I)J".to_string(),
            signature: None,
            parameter_names: Vec::new(),
        }],
    }]);
    let solver = ReflectionTypeSolver::with_index(index);
    let calc = ty(&solver, "demo.Calc");
    let sum = calc.declaration().unwrap().declared_methods().remove(0);
    let params = sum.parameters();
    assert_eq!(params[0].name, "arg0");
    assert_eq!(params[1].name, "arg1");
    assert!(params[1].variadic);
    assert!(sum.is_varargs());
    assert_eq!(sum.signature(), "sum(String, int[])");
    assert_eq!(sum.return_type(), ResolvedType::Primitive(PrimitiveType::Long));
}

#[test]
fn generic_method_type_parameters() {
    let solver = solver();
    let list = ty(&solver, "java.util.List");
    let of = call(&solver, &list, "of", &[int(), int()]);
    let params: Vec<String> = of
        .decl
        .type_parameters()
        .iter()
        .map(|p| p.name.to_string())
        .collect();
    assert_eq!(params, ["E"]);
    assert!(of.decl.is_static());
    assert!(of.decl.is_varargs());
}

#[test]
fn substitution_through_generic_receiver() {
    let solver = solver();
    let integer = ty(&solver, "java.lang.Integer");
    let list = generic(&solver, "java.util.ArrayList", &[integer.clone()]);
    assert_eq!(call(&solver, &list, "get", &[int()]).return_type, integer);

    // Declared on Collection<E>.
    let iterator = call(&solver, &list, "iterator", &[]).return_type;
    assert_eq!(iterator.describe(), "java.util.Iterator<java.lang.Integer>");

    let raw = ty(&solver, "java.util.ArrayList");
    assert!(call(&solver, &raw, "get", &[int()]).return_type.is_object());
}

#[test]
fn nested_generic_return_type() {
    let solver = solver();
    let string = ty(&solver, "java.lang.String");
    let integer = ty(&solver, "java.lang.Integer");
    let map = generic(&solver, "java.util.HashMap", &[string, integer]);
    let entries = call(&solver, &map, "entrySet", &[]).return_type;
    assert_eq!(
        entries.describe(),
        "java.util.Set<java.util.Map$Entry<java.lang.String, java.lang.Integer>>"
    );
}

#[test]
fn supertypes_substitute_arguments() {
    let solver = solver();
    let range = ty(&solver, "groovy.lang.IntRange");
    assert_eq!(
        as_supertype(&solver, &range, "java.util.List").unwrap().describe(),
        "java.util.List<java.lang.Integer>"
    );
    assert_eq!(
        as_supertype(&solver, &range, "java.lang.Iterable").unwrap().describe(),
        "java.lang.Iterable<java.lang.Integer>"
    );
    let all = supertypes(&solver, &range);
    assert_eq!(all.first(), Some(&range));
    assert!(all.last().unwrap().is_object());
}

#[test]
fn range_type_parameter_bound() {
    let solver = solver();
    let range = ty(&solver, "groovy.lang.Range");
    let params = range.declaration().unwrap().type_parameters();
    assert_eq!(params.len(), 1);
    assert_eq!(params[0].bounds[0].describe(), "java.lang.Comparable");
}

#[test]
fn subtyping_and_assignability() {
    let solver = solver();
    let string = ty(&solver, "java.lang.String");
    let object = object_type(&solver);
    let list = generic(&solver, "java.util.ArrayList", &[string.clone()]);
    let collection = ty(&solver, "java.util.Collection");
    assert!(is_subtype(&solver, &list, &collection));
    assert!(!is_subtype(&solver, &collection, &list));
    assert!(is_subtype(&solver, &ResolvedType::array_of(int(), 1), &object));
    assert!(is_subtype(
        &solver,
        &ResolvedType::array_of(string.clone(), 1),
        &ResolvedType::array_of(object, 1)
    ));
    assert!(is_subtype(&solver, &ResolvedType::Null, &string));

    let long = ResolvedType::Primitive(PrimitiveType::Long);
    assert!(is_assignable(&solver, &long, &int()));
    assert!(!is_assignable(&solver, &int(), &long));
    assert!(is_assignable(&solver, &ty(&solver, "java.lang.Integer"), &int()));
    assert!(is_assignable(&solver, &ty(&solver, "java.lang.Number"), &int()));
    assert!(is_assignable(&solver, &int(), &ty(&solver, "java.lang.Integer")));
    assert!(!is_assignable(&solver, &string, &int()));
}

#[test]
fn overloads_prefer_exact_then_assignable() {
    let solver = solver();
    let math = ty(&solver, "java.lang.Math");
    assert_eq!(call(&solver, &math, "max", &[int(), int()]).return_type, int());
    assert_eq!(call(&solver, &math, "max", &[double(), int()]).return_type, double());

    let string = ty(&solver, "java.lang.String");
    let value_of = call(&solver, &string, "valueOf", &[int()]);
    assert_eq!(value_of.params[0].ty, int());
}

#[test]
fn overloads_fall_back_to_first_arity_match() {
    let solver = solver();
    let math = ty(&solver, "java.lang.Math");
    let string = ty(&solver, "java.lang.String");
    let abs = call(&solver, &math, "abs", &[string]);
    assert_eq!(abs.params[0].ty, int());
    assert!(select_method(&solver, find_methods(&solver, &math, "abs"), &[]).is_none());
}

#[test]
fn varargs_accept_any_trailing_count() {
    let solver = solver();
    let string = ty(&solver, "java.lang.String");
    let format = call(&solver, &string, "format", &[string.clone(), int(), int()]);
    assert_eq!(format.return_type, string);
    assert!(format.accepts_arity(1));
    assert_eq!(format.param_type_at(5), Some(object_type(&solver)));
}

#[test]
fn numeric_promotion() {
    let solver = solver();
    let long = ResolvedType::Primitive(PrimitiveType::Long);
    let boolean = ResolvedType::Primitive(PrimitiveType::Boolean);
    let big_int = ty(&solver, BIG_INTEGER);
    let big_dec = ty(&solver, BIG_DECIMAL);
    assert_eq!(promote(&solver, &int(), &long), Some(long.clone()));
    assert_eq!(promote(&solver, &ty(&solver, "java.lang.Integer"), &double()), Some(double()));
    assert_eq!(promote(&solver, &long, &big_int), Some(big_int.clone()));
    assert_eq!(promote(&solver, &big_int, &double()), Some(big_int));
    assert_eq!(promote(&solver, &int(), &big_dec), Some(big_dec));
    assert_eq!(promote(&solver, &boolean, &int()), None);
    assert_eq!(promote(&solver, &ty(&solver, "java.lang.String"), &int()), None);
}

#[test]
fn least_upper_bounds() {
    let solver = solver();
    let string = ty(&solver, "java.lang.String");
    let integer = ty(&solver, "java.lang.Integer");
    let long = ty(&solver, "java.lang.Long");
    let boolean = ResolvedType::Primitive(PrimitiveType::Boolean);

    assert_eq!(lub(&solver, &[int(), double()]), double());
    assert_eq!(lub(&solver, &[ResolvedType::Null, string.clone()]), string);
    assert!(lub(&solver, &[]).is_object());
    assert_eq!(lub(&solver, &[integer.clone(), long]).describe(), "java.lang.Number");
    assert_eq!(lub(&solver, &[string.clone(), integer]).describe(), "java.io.Serializable");
    // Comparable<Integer> and Comparable<Boolean> disagree: erased.
    assert_eq!(lub(&solver, &[int(), boolean]).describe(), "java.lang.Comparable");

    let list_of = |arg: &ResolvedType| generic(&solver, "java.util.ArrayList", &[arg.clone()]);
    assert_eq!(
        lub(&solver, &[list_of(&string), list_of(&string)]).describe(),
        "java.util.ArrayList<java.lang.String>"
    );
}

#[test]
fn resolve_source_type_refs() {
    let solver = solver();
    let list = TypeRef::parse("java.util.List<java.lang.String>[]").unwrap();
    assert_eq!(
        resolve_type_ref(&solver, &list, &[]).describe(),
        "java.util.List<java.lang.String>[]"
    );
    let var = TypeRef::new("T");
    let params = [TypeParameter::unbounded("T")];
    assert!(resolve_type_ref(&solver, &var, &params).is_type_variable());
    assert!(resolve_type_ref(&solver, &TypeRef::dynamic(), &[]).is_object());
    assert!(resolve_type_ref(&solver, &TypeRef::new("no.Such"), &[]).is_object());
}

#[test]
fn cache_records_hits_and_misses() {
    let solver = solver();
    assert!(solver.class_stub("java.lang.String").is_some());
    assert!(solver.class_stub("com.example.Missing").is_none());
    let cache = solver.cache();
    assert_eq!(cache.len(), 2);
    assert_eq!(cache.get("com.example.Missing"), Some(None));

    cache.invalidate("com.example.Missing");
    assert_eq!(cache.get("com.example.Missing"), None);
    cache.clear();
    assert!(cache.is_empty());

    // Clones share the cache.
    let clone = solver.clone();
    clone.class_stub("java.lang.Object");
    assert_eq!(solver.cache().len(), 1);
}

struct Broken;

impl ClassProvider for Broken {
    fn load(&self, name: &str) -> Result<Option<ClassStub>, ClassLoadError> {
        Err(ClassLoadError::Unavailable {
            name: name.to_string(),
            message: "offline".to_string(),
        })
    }
}

#[test]
fn failing_provider_is_skipped() {
    let solver = ReflectionTypeSolver::new(
        vec![Arc::new(Broken), Arc::new(BuiltinClasses)],
        Arc::new(ClassCache::new()),
    );
    assert!(solver.class_stub("java.lang.String").is_some());

    let only_broken = ReflectionTypeSolver::new(vec![Arc::new(Broken)], Arc::new(ClassCache::new()));
    assert!(!only_broken.try_to_solve_type("java.lang.String").is_solved());
    assert!(object_type(&only_broken).is_object());
}

#[test]
fn combined_solver_consults_in_order() {
    let index = JsonClassIndex::from_stubs([ClassStub {
        name: "demo.Thing".to_string(),
        access_flags: 1,
        super_class: None,
        interfaces: Vec::new(),
        signature: None,
        fields: Vec::new(),
        methods: Vec::new(),
    }]);
    let only_index =
        ReflectionTypeSolver::new(vec![Arc::new(index)], Arc::new(ClassCache::new()));
    let combined = CombinedTypeSolver::new(vec![Arc::new(only_index), Arc::new(solver())]);
    assert!(combined.try_to_solve_type("demo.Thing").is_solved());
    assert!(combined.try_to_solve_type("java.lang.String").is_solved());
    assert!(!combined.try_to_solve_type("demo.Other").is_solved());
}

#[test]
fn builtin_index_parses() {
    let names = BuiltinClasses::names();
    assert!(names.contains(&"groovy.lang.IntRange"));
    assert!(names.contains(&"java.util.LinkedHashMap"));
}

#[test]
fn static_fields_resolve() {
    let solver = solver();
    let system = ty(&solver, "java.lang.System");
    let out = find_field(&solver, &system, "out").unwrap();
    assert!(out.decl.is_static());
    assert_eq!(out.ty.describe(), "java.io.PrintStream");
    assert!(find_field(&solver, &system, "in").is_none());
}
