use std::io::Write;

use groovy_types::reflection::{ClassLoadError, JsonClassIndex};
use groovy_types::{find_field, find_methods, select_method, ReflectionTypeSolver, ResolvedType, TypeSolver};
use pretty_assertions::assert_eq;

const WIDGETS: &str = r#"{
  "classes": [
    {
      "name": "com.acme.Widgets",
      "access_flags": 1,
      "super_class": "java.util.ArrayList",
      "interfaces": [],
      "signature": "Ljava/util/ArrayList<Ljava/lang/String;>;",
      "fields": [
        { "name": "owner", "access_flags": 1, "descriptor": "Ljava/lang/String;" }
      ],
      "methods": [
        { "name": "<init>", "access_flags": 1, "descriptor": "()V" },
        { "name": "first", "access_flags": 1, "descriptor": "()Ljava/lang/String;" }
      ]
    }
  ]
}"#;

fn write_index(text: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(text.as_bytes()).expect("write index");
    file
}

#[test]
fn index_file_extends_builtin_classes() {
    let file = write_index(WIDGETS);
    let index = JsonClassIndex::from_path(file.path()).expect("index loads");
    assert_eq!(index.len(), 1);

    let solver = ReflectionTypeSolver::with_index(index);
    let widgets = ResolvedType::reference(
        solver
            .try_to_solve_type("com.acme.Widgets")
            .into_declaration()
            .expect("widgets resolve"),
    );

    let owner = find_field(&solver, &widgets, "owner").expect("owner field");
    assert_eq!(owner.ty.describe(), "java.lang.String");

    // Inherited from ArrayList<String>.
    let int = ResolvedType::Primitive(groovy_types::PrimitiveType::Int);
    let get = select_method(&solver, find_methods(&solver, &widgets, "get"), &[int]).expect("get");
    assert_eq!(get.return_type.describe(), "java.lang.String");
    assert_eq!(get.decl.declaring_type(), "java.util.ArrayList");
}

#[test]
fn missing_index_file_is_an_io_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let err = JsonClassIndex::from_path(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, ClassLoadError::Io { .. }), "{err}");
}

#[test]
fn malformed_index_is_a_json_error() {
    let file = write_index(r#"{"classes": [{"access_flags": 1}]}"#);
    let err = JsonClassIndex::from_path(file.path()).unwrap_err();
    assert!(matches!(err, ClassLoadError::Json(_)), "{err}");
}
