use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use serde::Deserialize;

use super::stub::ClassStub;

#[derive(Debug, thiserror::Error)]
pub enum ClassLoadError {
    #[error("failed to read class index {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid class index: {0}")]
    Json(#[from] serde_json::Error),
    #[error("class `{name}` could not be loaded: {message}")]
    Unavailable { name: String, message: String },
}

/// Source of class metadata, the stand-in for a class loader.
pub trait ClassProvider: Send + Sync {
    /// Metadata for a binary name; `Ok(None)` if this provider does not
    /// know the class.
    fn load(&self, name: &str) -> Result<Option<ClassStub>, ClassLoadError>;
}

#[derive(Debug, Deserialize)]
struct IndexFile {
    classes: Vec<ClassStub>,
}

/// Class metadata read from a JSON document of the form
/// `{"classes": [ClassStub, ...]}`.
#[derive(Debug, Clone, Default)]
pub struct JsonClassIndex {
    classes: HashMap<String, ClassStub>,
}

impl JsonClassIndex {
    pub fn from_json_str(text: &str) -> Result<Self, ClassLoadError> {
        let file: IndexFile = serde_json::from_str(text)?;
        Ok(Self::from_stubs(file.classes))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ClassLoadError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ClassLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn from_stubs(stubs: impl IntoIterator<Item = ClassStub>) -> Self {
        Self {
            classes: stubs
                .into_iter()
                .map(|stub| (stub.name.clone(), stub))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(String::as_str)
    }
}

impl ClassProvider for JsonClassIndex {
    fn load(&self, name: &str) -> Result<Option<ClassStub>, ClassLoadError> {
        Ok(self.classes.get(name).cloned())
    }
}

static BUILTIN_JSON: &str = include_str!("builtin.json");

/// A small built-in set of JDK and Groovy runtime classes, enough to type
/// common scripts without a real class path.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinClasses;

impl BuiltinClasses {
    fn index() -> Result<&'static JsonClassIndex, ClassLoadError> {
        static INDEX: OnceLock<Result<JsonClassIndex, String>> = OnceLock::new();
        INDEX
            .get_or_init(|| JsonClassIndex::from_json_str(BUILTIN_JSON).map_err(|e| e.to_string()))
            .as_ref()
            .map_err(|message| ClassLoadError::Unavailable {
                name: "builtin index".to_string(),
                message: message.clone(),
            })
    }

    pub fn names() -> Vec<&'static str> {
        match Self::index() {
            Ok(index) => index.names().collect(),
            Err(_) => Vec::new(),
        }
    }
}

impl ClassProvider for BuiltinClasses {
    fn load(&self, name: &str) -> Result<Option<ClassStub>, ClassLoadError> {
        Self::index()?.load(name)
    }
}
