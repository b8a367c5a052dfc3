use indexmap::IndexMap;

use crate::ids::{FunctionId, ObjectId};

/// The enclosing scope of a member: used as the root of sync/async
/// lookup fallback (the chain terminates at `Model`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Container {
    Model,
    Class(String),
    Generic(String),
    Single(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    Sync,
    Async,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub class_name: String,
    pub name: String,
}

/// A tagged body statement, emitted by the body checker as it validates
/// each line of a function. Call arguments are validated (arity,
/// readiness, type) at check time but not retained here — the shape
/// below only carries what the data model names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Note(String),
    SyncVarNull { class_name: String, name: String },
    SyncVarReady { class_name: String, name: String },
    SyncCopyOrCall { class_name: String, lhs: Vec<String>, rhs: Vec<String> },
    AsyncCall { class_name: String, lhs: Vec<String>, rhs: Vec<String> },
    Return { rhs: Vec<String> },
}

#[derive(Debug, Clone)]
pub struct Function {
    pub kind: FunctionKind,
    pub name: String,
    pub return_type: String,
    pub params: Vec<Parameter>,
    pub body: Vec<Statement>,
    pub container: Container,
    /// Whether the declaration carried a `{ ... }` body at all, as
    /// opposed to a bare `;` stub — distinct from `body.is_empty()`,
    /// since an implemented `Void` function may legitimately have no
    /// statements. Needed so the pretty-printer can round-trip stub vs.
    /// empty-impl forms.
    pub implemented: bool,
}

impl Function {
    pub fn new(kind: FunctionKind, name: String, return_type: String, params: Vec<Parameter>, container: Container) -> Self {
        return Self { kind, name, return_type, params, body: Vec::new(), container, implemented: false };
    }
}

/// An instance-typed named member (a field). `ready` is the class-level
/// *declared* default only — per-use readiness during body checking is
/// tracked separately by the checker's local overlay, never mutated
/// here, so that marking a field ready in one function body can never
/// leak into another (see DESIGN.md's "Readiness tracking" entry).
#[derive(Debug, Clone)]
pub struct Object {
    pub class_name: String,
    pub ready: bool,
}

impl Object {
    pub fn new(class_name: String, ready: bool) -> Self {
        return Self { class_name, ready };
    }
}

/// A named specific type: the thing a type string ultimately resolves to.
#[derive(Debug, Clone)]
pub struct Class {
    pub name: String,
    pub parents: Vec<String>,
    pub async_fns: IndexMap<String, FunctionId>,
    pub sync_fns: IndexMap<String, FunctionId>,
    pub objects: IndexMap<String, ObjectId>,
    pub placeholder: bool,
    pub implemented: bool,
}

impl Class {
    pub fn new(name: String) -> Self {
        return Self {
            name,
            parents: Vec::new(),
            async_fns: IndexMap::new(),
            sync_fns: IndexMap::new(),
            objects: IndexMap::new(),
            placeholder: false,
            implemented: false,
        };
    }

    pub fn placeholder(name: String) -> Self {
        let mut class = Self::new(name);
        class.placeholder = true;
        return class;
    }

    /// Whether `name` is already declared directly on this class, under
    /// any of the three member maps (used by the inheritance linearizer
    /// to decide whether a parent member is shadowed).
    pub fn declares(&self, name: &str) -> bool {
        return self.async_fns.contains_key(name) || self.sync_fns.contains_key(name) || self.objects.contains_key(name);
    }
}

/// A parameterized class template. Never itself a type; it produces
/// Classes through instantiation (see `checker::generics`).
#[derive(Debug, Clone)]
pub struct Generic {
    pub name: String,
    pub template_params: Vec<String>,
    pub async_fns: IndexMap<String, FunctionId>,
    pub sync_fns: IndexMap<String, FunctionId>,
    pub objects: IndexMap<String, ObjectId>,
    pub implemented: bool,
}

impl Generic {
    pub fn new(name: String, template_params: Vec<String>) -> Self {
        return Self {
            name,
            template_params,
            async_fns: IndexMap::new(),
            sync_fns: IndexMap::new(),
            objects: IndexMap::new(),
            implemented: false,
        };
    }

    pub fn declares(&self, name: &str) -> bool {
        return self.async_fns.contains_key(name) || self.sync_fns.contains_key(name) || self.objects.contains_key(name);
    }
}

/// A one-off class/object pair: a named singleton whose type is unique
/// to it, backed internally by a class named `Single|<name>`.
#[derive(Debug, Clone)]
pub struct Single {
    pub name: String,
    pub class_name: String,
    pub object: ObjectId,
}

impl Single {
    pub fn class_name_for(name: &str) -> String {
        return format!("Single|{}", name);
    }
}
