//! Type solving backed by class metadata.
//!
//! [`ReflectionTypeSolver`] loads [`ClassStub`]s from its providers on
//! demand and wraps them in lazily evaluated declarations. Loaded stubs are
//! memoized in an injected [`ClassCache`]; declarations themselves are cheap
//! and rebuilt per lookup.

mod provider;
mod signature;
mod stub;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use groovy_core::{Modifiers, Name};
use parking_lot::RwLock;

pub use provider::{BuiltinClasses, ClassLoadError, ClassProvider, JsonClassIndex};
pub use signature::{
    internal_to_binary, parse_class_signature, parse_field_signature, parse_method_signature,
    ClassSig, MethodSig, SignatureError, TypeArg, TypeParamSig, TypeSig,
};
pub use stub::{ClassStub, FieldStub, MethodStub};

use crate::declarations::{
    ConstructorDeclaration, FieldDeclaration, MethodDeclaration, ResolvedParameter,
    TypeDeclaration, TypeKind, TypeParameter,
};
use crate::solver::{object_type, TypeRefResult, TypeSolver};
use crate::{PrimitiveType, ResolvedType, SymbolReference};

/// Memoized class lookups, including misses. Safe for concurrent use; the
/// owner decides when to invalidate.
#[derive(Default)]
pub struct ClassCache {
    entries: RwLock<HashMap<String, Option<Arc<ClassStub>>>>,
}

impl ClassCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// `Some(None)` records a known miss.
    pub fn get(&self, name: &str) -> Option<Option<Arc<ClassStub>>> {
        self.entries.read().get(name).cloned()
    }

    pub fn insert(&self, name: &str, stub: Option<Arc<ClassStub>>) {
        self.entries.write().insert(name.to_string(), stub);
    }

    pub fn invalidate(&self, name: &str) {
        self.entries.write().remove(name);
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl fmt::Debug for ClassCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassCache").field("len", &self.len()).finish()
    }
}

struct SolverInner {
    providers: Vec<Arc<dyn ClassProvider>>,
    cache: Arc<ClassCache>,
}

/// Type solver over class metadata providers. Cloning is cheap and clones
/// share the cache.
#[derive(Clone)]
pub struct ReflectionTypeSolver {
    inner: Arc<SolverInner>,
}

impl fmt::Debug for ReflectionTypeSolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReflectionTypeSolver")
            .field("providers", &self.inner.providers.len())
            .field("cache", &self.inner.cache)
            .finish()
    }
}

impl Default for ReflectionTypeSolver {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ReflectionTypeSolver {
    pub fn new(providers: Vec<Arc<dyn ClassProvider>>, cache: Arc<ClassCache>) -> Self {
        Self {
            inner: Arc::new(SolverInner { providers, cache }),
        }
    }

    /// Solver over the built-in runtime classes only.
    pub fn builtin() -> Self {
        Self::new(vec![Arc::new(BuiltinClasses)], Arc::new(ClassCache::new()))
    }

    /// Built-in classes plus `index`, which is consulted first.
    pub fn with_index(index: JsonClassIndex) -> Self {
        Self::new(
            vec![Arc::new(index), Arc::new(BuiltinClasses)],
            Arc::new(ClassCache::new()),
        )
    }

    pub fn cache(&self) -> &Arc<ClassCache> {
        &self.inner.cache
    }

    /// Class metadata for a binary name. Provider failures are logged and
    /// treated as "not found".
    pub fn class_stub(&self, name: &str) -> Option<Arc<ClassStub>> {
        if let Some(cached) = self.inner.cache.get(name) {
            return cached;
        }
        let mut found = None;
        for provider in &self.inner.providers {
            match provider.load(name) {
                Ok(Some(stub)) => {
                    found = Some(Arc::new(stub));
                    break;
                }
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(target: "groovy.types", name, error = %err, "class load failed");
                }
            }
        }
        self.inner.cache.insert(name, found.clone());
        found
    }

    pub fn declaration(&self, name: &str) -> Option<Arc<dyn TypeDeclaration>> {
        let stub = self.class_stub(name).or_else(|| {
            // `java.util.Map.Entry` → `java.util.Map$Entry`
            let mut candidate = name.to_string();
            while let Some(dot) = candidate.rfind('.') {
                let outer = &candidate[..dot];
                let outer_simple = outer.rsplit(['.', '$']).next().unwrap_or(outer);
                if !outer_simple.starts_with(char::is_uppercase) {
                    break;
                }
                candidate.replace_range(dot..=dot, "$");
                if let Some(stub) = self.class_stub(&candidate) {
                    return Some(stub);
                }
            }
            None
        })?;
        Some(Arc::new(ReflectionClass {
            stub,
            solver: self.clone(),
        }))
    }

    /// The type denoted by a runtime class name: `int`, `java.lang.String`,
    /// `java.lang.String[]`, or a JVM array name such as `[I` or
    /// `[Ljava.lang.String;`. Unknown classes give `Object`.
    pub fn type_for_class(&self, name: &str) -> ResolvedType {
        if let Some(element) = name.strip_suffix("[]") {
            return ResolvedType::array_of(self.type_for_class(element), 1);
        }
        if name.starts_with('[') {
            let descriptor = name.replace('.', "/");
            return match parse_field_signature(&descriptor) {
                Ok(sig) => self.sig_to_type(&sig, &[]),
                Err(err) => {
                    tracing::trace!(target: "groovy.types", error = %err, "bad array class name");
                    object_type(self)
                }
            };
        }
        if name == "void" {
            return ResolvedType::Void;
        }
        if let Some(p) = PrimitiveType::from_name(name) {
            return ResolvedType::Primitive(p);
        }
        match self.declaration(name) {
            Some(decl) => ResolvedType::reference(decl),
            None => object_type(self),
        }
    }

    fn sig_to_type(&self, sig: &TypeSig, vars: &[TypeParameter]) -> ResolvedType {
        match sig {
            TypeSig::Base(p) => ResolvedType::Primitive(*p),
            TypeSig::Array(component) => ResolvedType::array_of(self.sig_to_type(component, vars), 1),
            TypeSig::TypeVar(name) => vars
                .iter()
                .find(|v| v.name == name.as_str())
                .map_or_else(|| TypeParameter::unbounded(name.as_str()).as_type(), TypeParameter::as_type),
            TypeSig::Class { name, args } => {
                let Some(decl) = self.declaration(name) else {
                    return object_type(self);
                };
                let args = args
                    .iter()
                    .map(|arg| match arg {
                        TypeArg::Exact(ty) | TypeArg::Extends(ty) => self.sig_to_type(ty, vars),
                        TypeArg::Any | TypeArg::Super(_) => object_type(self),
                    })
                    .collect();
                ResolvedType::generic(decl, args)
            }
        }
    }

    /// Type parameters with bounds; variables inside bounds stay unbounded.
    fn type_params(&self, sigs: &[TypeParamSig], outer: &[TypeParameter]) -> Vec<TypeParameter> {
        let names: Vec<TypeParameter> = sigs
            .iter()
            .map(|s| TypeParameter::unbounded(s.name.as_str()))
            .chain(outer.iter().cloned())
            .collect();
        sigs.iter()
            .map(|s| TypeParameter {
                name: Name::new(&s.name),
                bounds: s.bounds.iter().map(|b| self.sig_to_type(b, &names)).collect(),
            })
            .collect()
    }
}

impl TypeSolver for ReflectionTypeSolver {
    fn try_to_solve_type(&self, name: &str) -> TypeRefResult {
        SymbolReference::from(self.declaration(name))
    }
}

#[derive(Debug)]
pub struct ReflectionClass {
    stub: Arc<ClassStub>,
    solver: ReflectionTypeSolver,
}

impl ReflectionClass {
    pub fn stub(&self) -> &ClassStub {
        &self.stub
    }

    fn signature(&self) -> Option<ClassSig> {
        let text = self.stub.signature.as_deref()?;
        match parse_class_signature(text) {
            Ok(sig) => Some(sig),
            Err(err) => {
                tracing::trace!(target: "groovy.types", class = %self.stub.name, error = %err, "bad class signature");
                None
            }
        }
    }
}

impl TypeDeclaration for ReflectionClass {
    fn name(&self) -> &str {
        self.stub.simple_name()
    }

    fn qualified_name(&self) -> String {
        self.stub.name.clone()
    }

    fn kind(&self) -> TypeKind {
        self.stub.kind()
    }

    fn modifiers(&self) -> Modifiers {
        Modifiers(self.stub.access_flags)
    }

    fn type_parameters(&self) -> Vec<TypeParameter> {
        match self.signature() {
            Some(sig) => self.solver.type_params(&sig.type_params, &[]),
            None => Vec::new(),
        }
    }

    fn superclass(&self) -> Option<ResolvedType> {
        if self.is_interface() {
            return None;
        }
        if let Some(sig) = self.signature() {
            let vars = self.solver.type_params(&sig.type_params, &[]);
            let ty = self.solver.sig_to_type(&sig.superclass, &vars);
            return (!ty.is(&self.stub.name)).then_some(ty);
        }
        let name = self.stub.super_class.as_deref()?;
        Some(self.solver.type_for_class(name))
    }

    fn interfaces(&self) -> Vec<ResolvedType> {
        if let Some(sig) = self.signature() {
            let vars = self.solver.type_params(&sig.type_params, &[]);
            return sig
                .interfaces
                .iter()
                .map(|i| self.solver.sig_to_type(i, &vars))
                .collect();
        }
        self.stub
            .interfaces
            .iter()
            .map(|name| self.solver.type_for_class(name))
            .collect()
    }

    fn declared_fields(&self) -> Vec<Arc<dyn FieldDeclaration>> {
        self.stub
            .fields
            .iter()
            .map(|field| {
                Arc::new(ReflectionField {
                    field: field.clone(),
                    owner: self.stub.clone(),
                    solver: self.solver.clone(),
                }) as Arc<dyn FieldDeclaration>
            })
            .collect()
    }

    fn declared_methods(&self) -> Vec<Arc<dyn MethodDeclaration>> {
        self.stub
            .methods
            .iter()
            .filter(|m| !m.name.starts_with('<'))
            .map(|method| Arc::new(self.method(method)) as Arc<dyn MethodDeclaration>)
            .collect()
    }

    fn constructors(&self) -> Vec<Arc<dyn ConstructorDeclaration>> {
        self.stub
            .methods
            .iter()
            .filter(|m| m.is_constructor())
            .map(|method| Arc::new(self.method(method)) as Arc<dyn ConstructorDeclaration>)
            .collect()
    }
}

impl ReflectionClass {
    fn method(&self, method: &MethodStub) -> ReflectionMethod {
        ReflectionMethod {
            method: method.clone(),
            owner: self.stub.clone(),
            solver: self.solver.clone(),
        }
    }
}

fn class_type_params(solver: &ReflectionTypeSolver, owner: &ClassStub) -> Vec<TypeParameter> {
    owner
        .signature
        .as_deref()
        .and_then(|text| parse_class_signature(text).ok())
        .map(|sig| solver.type_params(&sig.type_params, &[]))
        .unwrap_or_default()
}

#[derive(Debug)]
pub struct ReflectionField {
    field: FieldStub,
    owner: Arc<ClassStub>,
    solver: ReflectionTypeSolver,
}

impl FieldDeclaration for ReflectionField {
    fn name(&self) -> &str {
        &self.field.name
    }

    fn ty(&self) -> ResolvedType {
        let text = self.field.signature.as_deref().unwrap_or(&self.field.descriptor);
        match parse_field_signature(text) {
            Ok(sig) => {
                let vars = class_type_params(&self.solver, &self.owner);
                self.solver.sig_to_type(&sig, &vars)
            }
            Err(err) => {
                tracing::trace!(target: "groovy.types", field = %self.field.name, error = %err, "bad field signature");
                object_type(&self.solver)
            }
        }
    }

    fn modifiers(&self) -> Modifiers {
        Modifiers(self.field.access_flags)
    }

    fn declaring_type(&self) -> String {
        self.owner.name.clone()
    }
}

#[derive(Debug)]
pub struct ReflectionMethod {
    method: MethodStub,
    owner: Arc<ClassStub>,
    solver: ReflectionTypeSolver,
}

impl ReflectionMethod {
    /// Parsed signature (or descriptor) and the type variables in scope.
    fn parsed(&self) -> Option<(MethodSig, Vec<TypeParameter>)> {
        let text = self.method.signature.as_deref().unwrap_or(&self.method.descriptor);
        let sig = match parse_method_signature(text) {
            Ok(sig) => sig,
            Err(err) => {
                tracing::trace!(target: "groovy.types", method = %self.method.name, error = %err, "bad method signature");
                return None;
            }
        };
        let class_vars = class_type_params(&self.solver, &self.owner);
        let mut vars = self.solver.type_params(&sig.type_params, &class_vars);
        vars.extend(class_vars);
        Some((sig, vars))
    }

    fn resolved_parameters(&self) -> Vec<ResolvedParameter> {
        let Some((sig, vars)) = self.parsed() else {
            return Vec::new();
        };
        let count = sig.params.len();
        sig.params
            .iter()
            .enumerate()
            .map(|(i, param)| {
                let name = self
                    .method
                    .parameter_names
                    .get(i)
                    .map_or_else(|| Name::new(format!("arg{i}")), Name::new);
                ResolvedParameter {
                    name,
                    ty: self.solver.sig_to_type(param, &vars),
                    variadic: i + 1 == count && self.method.is_varargs(),
                    has_default: false,
                }
            })
            .collect()
    }
}

impl MethodDeclaration for ReflectionMethod {
    fn name(&self) -> &str {
        &self.method.name
    }

    fn return_type(&self) -> ResolvedType {
        match self.parsed() {
            Some((sig, vars)) => match &sig.return_type {
                Some(ty) => self.solver.sig_to_type(ty, &vars),
                None => ResolvedType::Void,
            },
            None => object_type(&self.solver),
        }
    }

    fn parameters(&self) -> Vec<ResolvedParameter> {
        self.resolved_parameters()
    }

    fn modifiers(&self) -> Modifiers {
        Modifiers(self.method.access_flags)
    }

    fn declaring_type(&self) -> String {
        self.owner.name.clone()
    }

    fn type_parameters(&self) -> Vec<TypeParameter> {
        match self.parsed() {
            Some((sig, vars)) => vars.into_iter().take(sig.type_params.len()).collect(),
            None => Vec::new(),
        }
    }
}

impl ConstructorDeclaration for ReflectionMethod {
    fn parameters(&self) -> Vec<ResolvedParameter> {
        self.resolved_parameters()
    }

    fn modifiers(&self) -> Modifiers {
        Modifiers(self.method.access_flags)
    }

    fn declaring_type(&self) -> String {
        self.owner.name.clone()
    }
}
