use std::collections::HashMap;

use indexmap::IndexMap;

use data::SemanticError;
use parser::node::{
    Node, RULE_CB_ASYNC_FROM, RULE_CB_NOTE, RULE_CB_RETURN, RULE_CB_SYNC_COPY, RULE_CB_SYNC_FROM, RULE_CB_VAR_ASYNC_SET, RULE_CB_VAR_READY,
    RULE_CB_VAR_STUB, RULE_CB_VAR_SYNC_SET,
};
use syntax::entities::{Container, Object, Statement};
use syntax::{FunctionId, ObjectId, Registry};

use crate::resolver;

/// What a dotref token resolves to at any given step of the scope
/// chain (§9's "Polymorphic lookup receivers" note, recast as an
/// explicit variant instead of the source's ad-hoc duck typing).
/// `Root` only ever appears as the starting point of a walk — a
/// dotref always has at least one token, so it never survives to be
/// the *result* of resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    Root,
    Object(ObjectId),
    SyncFunction(FunctionId),
    AsyncFunction(FunctionId),
    Flow(FunctionId),
}

/// A fresh local scope chain, one per function body (§4.7 "Local
/// scope"). Readiness lives entirely in `readiness`, keyed by
/// `ObjectId`, rather than mutating `Registry::objects` directly —
/// this is what keeps a field marked ready in one function's body from
/// leaking into the next function that reads the same shared field
/// (see DESIGN.md's "Readiness tracking" entry).
pub struct Scope<'a> {
    pub registry: &'a mut Registry,
    container: Container,
    locals: IndexMap<String, ObjectId>,
    readiness: HashMap<ObjectId, bool>,
}

impl<'a> Scope<'a> {
    pub fn new(registry: &'a mut Registry, container: Container, self_object: ObjectId) -> Self {
        let mut locals = IndexMap::new();
        locals.insert("self".to_string(), self_object);
        let mut readiness = HashMap::new();
        readiness.insert(self_object, true);
        return Self { registry, container, locals, readiness };
    }

    pub fn bind(&mut self, name: String, id: ObjectId, ready: bool) {
        self.locals.insert(name, id);
        self.readiness.insert(id, ready);
    }

    /// Allocates a fresh Object exclusively owned by this function
    /// check — safe to track readiness for directly, unlike a field
    /// shared across every instance of a class.
    pub fn push_local_object(&mut self, class_name: String, ready: bool) -> ObjectId {
        let id = self.registry.push_object(Object::new(class_name, ready));
        self.readiness.insert(id, ready);
        return id;
    }

    pub fn is_ready(&self, id: ObjectId) -> bool {
        return self.readiness.get(&id).copied().unwrap_or(self.registry.object(id).ready);
    }

    pub fn mark_ready(&mut self, id: ObjectId) {
        self.readiness.insert(id, true);
    }

    /// `resolve_sync(d[0..k-1])`: walk every token through synchronous
    /// lookup only (§4.7 "Dotref resolution").
    pub fn resolve_sync(&self, path: &[String]) -> Result<Resolved, SemanticError> {
        let mut current = Resolved::Root;
        for (i, token) in path.iter().enumerate() {
            let next = self.sync_step(&current, token)?;
            current = next.ok_or_else(|| SemanticError::unknown_name(&path[..=i]))?;
        }
        return Ok(current);
    }

    /// `resolve_async(d)`: sync-walk every token but the last, then
    /// request the async member for the last.
    pub fn resolve_async(&self, path: &[String]) -> Result<Resolved, SemanticError> {
        let (last, head) = path.split_last().expect("a dotref always has at least one token");
        let mut current = Resolved::Root;
        for (i, token) in head.iter().enumerate() {
            let next = self.sync_step(&current, token)?;
            current = next.ok_or_else(|| SemanticError::unknown_name(&path[..=i]))?;
        }
        let resolved = self.async_step(&current, last)?;
        return resolved.ok_or_else(|| SemanticError::unknown_name(path));
    }

    fn sync_step(&self, current: &Resolved, token: &str) -> Result<Option<Resolved>, SemanticError> {
        return match current {
            Resolved::Root => {
                if let Some(id) = self.locals.get(token) {
                    return Ok(Some(Resolved::Object(*id)));
                }
                if let Some(single) = self.registry.singles.get(token) {
                    return Ok(Some(Resolved::Object(single.object)));
                }
                sync_lookup(self.registry, &self.container, token)
            }
            Resolved::Object(id) => {
                let container = object_container(self.registry, *id);
                sync_lookup(self.registry, &container, token)
            }
            Resolved::SyncFunction(_) | Resolved::AsyncFunction(_) | Resolved::Flow(_) => Ok(None),
        };
    }

    fn async_step(&self, current: &Resolved, token: &str) -> Result<Option<Resolved>, SemanticError> {
        return match current {
            Resolved::Root => async_lookup(self.registry, &self.container, token),
            Resolved::Object(id) => {
                let container = object_container(self.registry, *id);
                async_lookup(self.registry, &container, token)
            }
            Resolved::SyncFunction(_) | Resolved::AsyncFunction(_) | Resolved::Flow(_) => Ok(None),
        };
    }
}

/// The container an Object's own members live on — a Class in every
/// ordinary case, but a Generic when the object is `self` inside the
/// generic's own (not-yet-materialized) body.
fn object_container(registry: &Registry, id: ObjectId) -> Container {
    let class_name = &registry.object(id).class_name;
    if registry.classes.contains_key(class_name) {
        return Container::Class(class_name.clone());
    }
    return Container::Generic(class_name.clone());
}

fn sync_lookup(registry: &Registry, container: &Container, name: &str) -> Result<Option<Resolved>, SemanticError> {
    return match container {
        Container::Model => {
            if registry.flows.contains_key(name) {
                return Err(SemanticError::wrong_kind(name, "sync member"));
            }
            if name == syntax::registry::VOID_OBJECT {
                return Ok(Some(Resolved::Object(registry.void_object)));
            }
            if let Some(single) = registry.singles.get(name) {
                return Ok(Some(Resolved::Object(single.object)));
            }
            Ok(None)
        }
        Container::Class(class_name) => {
            let class = &registry.classes[class_name];
            if let Some(id) = class.objects.get(name) {
                return Ok(Some(Resolved::Object(*id)));
            }
            if let Some(id) = class.sync_fns.get(name) {
                return Ok(Some(Resolved::SyncFunction(*id)));
            }
            if class.async_fns.contains_key(name) {
                return Err(SemanticError::wrong_kind(name, "sync member"));
            }
            sync_lookup(registry, &Container::Model, name)
        }
        Container::Generic(generic_name) => {
            let generic = &registry.generics[generic_name];
            if let Some(id) = generic.objects.get(name) {
                return Ok(Some(Resolved::Object(*id)));
            }
            if let Some(id) = generic.sync_fns.get(name) {
                return Ok(Some(Resolved::SyncFunction(*id)));
            }
            if generic.async_fns.contains_key(name) {
                return Err(SemanticError::wrong_kind(name, "sync member"));
            }
            sync_lookup(registry, &Container::Model, name)
        }
        Container::Single(single_name) => {
            let class_name = registry.singles[single_name].class_name.clone();
            sync_lookup(registry, &Container::Class(class_name), name)
        }
    };
}

fn async_lookup(registry: &Registry, container: &Container, name: &str) -> Result<Option<Resolved>, SemanticError> {
    return match container {
        Container::Model => Ok(registry.flows.get(name).map(|id| Resolved::Flow(*id))),
        Container::Class(class_name) => {
            let class = &registry.classes[class_name];
            if let Some(id) = class.async_fns.get(name) {
                return Ok(Some(Resolved::AsyncFunction(*id)));
            }
            async_lookup(registry, &Container::Model, name)
        }
        Container::Generic(generic_name) => {
            let generic = &registry.generics[generic_name];
            if let Some(id) = generic.async_fns.get(name) {
                return Ok(Some(Resolved::AsyncFunction(*id)));
            }
            async_lookup(registry, &Container::Model, name)
        }
        Container::Single(single_name) => {
            let class_name = registry.singles[single_name].class_name.clone();
            async_lookup(registry, &Container::Class(class_name), name)
        }
    };
}

fn type_of(registry: &Registry, resolved: &Resolved) -> Option<String> {
    return match resolved {
        Resolved::Root => None,
        Resolved::Object(id) => Some(registry.object(*id).class_name.clone()),
        Resolved::SyncFunction(id) | Resolved::AsyncFunction(id) | Resolved::Flow(id) => Some(registry.function(*id).return_type.clone()),
    };
}

fn lhs_object_or_void(scope: &Scope, lhs: &Resolved, lhs_path: &[String]) -> Result<(ObjectId, bool), SemanticError> {
    return match lhs {
        Resolved::Object(id) => {
            let is_void = scope.registry.is_void_class(&scope.registry.object(*id).class_name);
            Ok((*id, is_void))
        }
        _ => Err(SemanticError::wrong_kind(&lhs_path.join("."), "object")),
    };
}

/// Checks every call argument: arity, type, and (for synchronous calls
/// only) readiness. `Void` arguments skip the readiness check but
/// still must match the declared parameter type exactly.
fn check_call_args(scope: &Scope, function_id: FunctionId, arg_paths: &[Vec<String>], require_ready: bool) -> Result<(), SemanticError> {
    let params = scope.registry.function(function_id).params.clone();
    if arg_paths.len() != params.len() {
        let what = format!("call to '{}'", scope.registry.function(function_id).name);
        return Err(SemanticError::arity_mismatch(&what, params.len(), arg_paths.len()));
    }
    for (arg_path, param) in arg_paths.iter().zip(params.iter()) {
        let resolved = scope.resolve_sync(arg_path)?;
        let (id, _) = lhs_object_or_void(scope, &resolved, arg_path)?;
        let class_name = scope.registry.object(id).class_name.clone();
        if scope.registry.is_void_class(&class_name) {
            if class_name != param.class_name {
                return Err(SemanticError::type_mismatch(&param.class_name, &class_name));
            }
            continue;
        }
        if require_ready && !scope.is_ready(id) {
            return Err(SemanticError::not_ready(&arg_path.join(".")));
        }
        if class_name != param.class_name {
            return Err(SemanticError::type_mismatch(&param.class_name, &class_name));
        }
    }
    return Ok(());
}

fn check_note(node: &Node) -> Statement {
    let text = node.children()[0].value().unwrap_or("").to_string();
    return Statement::Note(text);
}

fn check_var_stub(scope: &mut Scope, node: &Node, ready: bool) -> Result<Statement, SemanticError> {
    let type_name = node.children()[0].value().expect("_cb_var_stub/_cb_var_ready carry a type terminal");
    let name = node.children()[1].value().expect("_cb_var_stub/_cb_var_ready carry a name terminal").to_string();
    let class_name = resolver::resolve_type(scope.registry, type_name)?;
    let id = scope.push_local_object(class_name.clone(), ready);
    scope.bind(name.clone(), id, ready);
    if ready {
        return Ok(Statement::SyncVarReady { class_name, name });
    }
    return Ok(Statement::SyncVarNull { class_name, name });
}

fn check_sync_copy(scope: &mut Scope, node: &Node) -> Result<Statement, SemanticError> {
    let lhs_path = node.children()[0].terminal_values();
    let rhs_path = node.children()[1].terminal_values();
    let lhs = scope.resolve_sync(&lhs_path)?;
    let rhs = scope.resolve_sync(&rhs_path)?;

    let (lhs_id, is_void) = lhs_object_or_void(scope, &lhs, &lhs_path)?;
    if !is_void {
        let lhs_type = scope.registry.object(lhs_id).class_name.clone();
        let rhs_type = type_of(scope.registry, &rhs).ok_or_else(|| SemanticError::wrong_kind(&rhs_path.join("."), "value"))?;
        if lhs_type != rhs_type {
            return Err(SemanticError::type_mismatch(&lhs_type, &rhs_type));
        }
        scope.mark_ready(lhs_id);
    }
    let class_name = scope.registry.object(lhs_id).class_name.clone();
    return Ok(Statement::SyncCopyOrCall { class_name, lhs: lhs_path, rhs: rhs_path });
}

fn check_sync_from(scope: &mut Scope, node: &Node) -> Result<Statement, SemanticError> {
    let lhs_path = node.children()[0].terminal_values();
    let rhs_path = node.children()[1].terminal_values();
    let arg_paths: Vec<Vec<String>> = node.children()[2].children().iter().map(Node::terminal_values).collect();

    let lhs = scope.resolve_sync(&lhs_path)?;
    let rhs = scope.resolve_sync(&rhs_path)?;
    let function_id = match rhs {
        Resolved::SyncFunction(id) => id,
        _ => return Err(SemanticError::wrong_kind(&rhs_path.join("."), "sync function")),
    };
    check_call_args(scope, function_id, &arg_paths, true)?;

    let (lhs_id, is_void) = lhs_object_or_void(scope, &lhs, &lhs_path)?;
    if !is_void {
        let lhs_type = scope.registry.object(lhs_id).class_name.clone();
        let rhs_type = scope.registry.function(function_id).return_type.clone();
        if lhs_type != rhs_type {
            return Err(SemanticError::type_mismatch(&lhs_type, &rhs_type));
        }
        scope.mark_ready(lhs_id);
    }
    let class_name = scope.registry.object(lhs_id).class_name.clone();
    return Ok(Statement::SyncCopyOrCall { class_name, lhs: lhs_path, rhs: rhs_path });
}

fn check_async_from(scope: &mut Scope, node: &Node) -> Result<Statement, SemanticError> {
    let lhs_path = node.children()[0].terminal_values();
    let rhs_path = node.children()[1].terminal_values();
    let arg_paths: Vec<Vec<String>> = node.children()[2].children().iter().map(Node::terminal_values).collect();

    let lhs = scope.resolve_sync(&lhs_path)?;
    let rhs = scope.resolve_async(&rhs_path)?;
    let function_id = match rhs {
        Resolved::AsyncFunction(id) | Resolved::Flow(id) => id,
        _ => return Err(SemanticError::wrong_kind(&rhs_path.join("."), "async function")),
    };
    check_call_args(scope, function_id, &arg_paths, false)?;

    let (lhs_id, is_void) = lhs_object_or_void(scope, &lhs, &lhs_path)?;
    if !is_void {
        let lhs_type = scope.registry.object(lhs_id).class_name.clone();
        let rhs_type = scope.registry.function(function_id).return_type.clone();
        if lhs_type != rhs_type {
            return Err(SemanticError::type_mismatch(&lhs_type, &rhs_type));
        }
    }
    // Not marked ready: the result is a future, not yet present (§4.8).
    let class_name = scope.registry.object(lhs_id).class_name.clone();
    return Ok(Statement::AsyncCall { class_name, lhs: lhs_path, rhs: rhs_path });
}

/// `_cb_var_async_set` / `_cb_var_sync_set`: a var stub fused with the
/// matching call form, so the freshly declared variable is both the
/// binding and the call's LHS. The original source never implements
/// this pair at all (its statement dispatch has no case for either
/// rule name); built here directly from the var-stub and call-checking
/// logic above per §4.7's explicit description of both forms.
fn check_var_set(scope: &mut Scope, node: &Node, is_async: bool) -> Result<Statement, SemanticError> {
    let type_name = node.children()[0].value().expect("var-set forms carry a type terminal");
    let name = node.children()[1].value().expect("var-set forms carry a name terminal").to_string();
    let rhs_path = node.children()[2].terminal_values();
    let arg_paths: Vec<Vec<String>> = node.children()[3].children().iter().map(Node::terminal_values).collect();

    let declared_class = resolver::resolve_type(scope.registry, type_name)?;
    let lhs_id = scope.push_local_object(declared_class.clone(), false);

    let function_id = if is_async {
        match scope.resolve_async(&rhs_path)? {
            Resolved::AsyncFunction(id) | Resolved::Flow(id) => id,
            _ => return Err(SemanticError::wrong_kind(&rhs_path.join("."), "async function")),
        }
    } else {
        match scope.resolve_sync(&rhs_path)? {
            Resolved::SyncFunction(id) => id,
            _ => return Err(SemanticError::wrong_kind(&rhs_path.join("."), "sync function")),
        }
    };
    check_call_args(scope, function_id, &arg_paths, !is_async)?;

    let rhs_type = scope.registry.function(function_id).return_type.clone();
    if declared_class != rhs_type {
        return Err(SemanticError::type_mismatch(&declared_class, &rhs_type));
    }
    if !is_async {
        scope.mark_ready(lhs_id);
    }
    scope.bind(name.clone(), lhs_id, !is_async);

    if is_async {
        return Ok(Statement::AsyncCall { class_name: declared_class, lhs: vec![name], rhs: rhs_path });
    }
    return Ok(Statement::SyncCopyOrCall { class_name: declared_class, lhs: vec![name], rhs: rhs_path });
}

fn check_return(scope: &Scope, node: &Node, return_type: &str) -> Result<Statement, SemanticError> {
    let rhs_path = node.children()[0].terminal_values();
    let resolved = scope.resolve_sync(&rhs_path)?;
    let rhs_type = type_of(scope.registry, &resolved).ok_or_else(|| SemanticError::wrong_kind(&rhs_path.join("."), "value"))?;
    if rhs_type != return_type {
        return Err(SemanticError::type_mismatch(return_type, &rhs_type));
    }
    return Ok(Statement::Return { rhs: rhs_path });
}

/// Dispatches one statement node by rule name (§4.7 "Statement handling").
pub fn check_statement(scope: &mut Scope, node: &Node, return_type: &str) -> Result<Statement, SemanticError> {
    return match node.rule_name() {
        RULE_CB_NOTE => Ok(check_note(node)),
        RULE_CB_VAR_STUB => check_var_stub(scope, node, false),
        RULE_CB_VAR_READY => check_var_stub(scope, node, true),
        RULE_CB_SYNC_COPY => check_sync_copy(scope, node),
        RULE_CB_SYNC_FROM => check_sync_from(scope, node),
        RULE_CB_ASYNC_FROM => check_async_from(scope, node),
        RULE_CB_VAR_SYNC_SET => check_var_set(scope, node, false),
        RULE_CB_VAR_ASYNC_SET => check_var_set(scope, node, true),
        RULE_CB_RETURN => check_return(scope, node, return_type),
        other => panic!("unexpected statement-block rule name '{}'", other),
    };
}

#[cfg(test)]
mod test {
    use syntax::entities::{Class, Function, FunctionKind, Parameter};
    use syntax::Registry;

    use super::*;

    fn registry_with_effect() -> Registry {
        let mut registry = Registry::new();
        registry.classes.insert("Effect".to_string(), Class::new("Effect".to_string()));
        return registry;
    }

    #[test]
    fn sync_copy_assigns_and_marks_ready() {
        let mut registry = registry_with_effect();
        let root = Container::Model;
        let self_obj = registry.push_object(Object::new("Effect".to_string(), true));
        let mut scope = Scope::new(&mut registry, root, self_obj);
        let src = scope.push_local_object("Effect".to_string(), true);
        scope.bind("src".to_string(), src, true);
        let dst = scope.push_local_object("Effect".to_string(), false);
        scope.bind("dst".to_string(), dst, false);

        let node = Node::non_terminal(
            RULE_CB_SYNC_COPY,
            vec![Node::non_terminal("_dotref", vec![Node::terminal("dst")]), Node::non_terminal("_dotref", vec![Node::terminal("src")])],
        );
        check_statement(&mut scope, &node, "Void").unwrap();
        assert!(scope.is_ready(dst));
    }

    #[test]
    fn sync_copy_type_mismatch_fails() {
        let mut registry = registry_with_effect();
        registry.classes.insert("Other".to_string(), Class::new("Other".to_string()));
        let self_obj = registry.push_object(Object::new("Effect".to_string(), true));
        let mut scope = Scope::new(&mut registry, Container::Model, self_obj);
        let src = scope.push_local_object("Other".to_string(), true);
        scope.bind("src".to_string(), src, true);
        let dst = scope.push_local_object("Effect".to_string(), false);
        scope.bind("dst".to_string(), dst, false);

        let node = Node::non_terminal(
            RULE_CB_SYNC_COPY,
            vec![Node::non_terminal("_dotref", vec![Node::terminal("dst")]), Node::non_terminal("_dotref", vec![Node::terminal("src")])],
        );
        assert!(check_statement(&mut scope, &node, "Void").is_err());
    }

    #[test]
    fn sync_from_requires_ready_args() {
        let mut registry = registry_with_effect();
        let mut class = Class::new("Holder".to_string());
        let method = registry.push_function(Function::new(
            FunctionKind::Sync,
            "make".to_string(),
            "Effect".to_string(),
            vec![Parameter { name: "input".to_string(), class_name: "Effect".to_string() }],
            Container::Class("Holder".to_string()),
        ));
        class.sync_fns.insert("make".to_string(), method);
        registry.classes.insert("Holder".to_string(), class);

        let self_obj = registry.push_object(Object::new("Holder".to_string(), true));
        let mut scope = Scope::new(&mut registry, Container::Class("Holder".to_string()), self_obj);
        let arg = scope.push_local_object("Effect".to_string(), false);
        scope.bind("arg".to_string(), arg, false);
        let dst = scope.push_local_object("Effect".to_string(), false);
        scope.bind("dst".to_string(), dst, false);

        let node = Node::non_terminal(
            RULE_CB_SYNC_FROM,
            vec![
                Node::non_terminal("_dotref", vec![Node::terminal("dst")]),
                Node::non_terminal("_dotref", vec![Node::terminal("self"), Node::terminal("make")]),
                Node::non_terminal("_arglist", vec![Node::non_terminal("_dotref", vec![Node::terminal("arg")])]),
            ],
        );
        assert!(check_statement(&mut scope, &node, "Void").is_err());
    }

    #[test]
    fn var_sync_set_declares_and_calls() {
        let mut registry = registry_with_effect();
        let mut class = Class::new("Holder".to_string());
        let method = registry.push_function(Function::new(
            FunctionKind::Sync,
            "make".to_string(),
            "Effect".to_string(),
            Vec::new(),
            Container::Class("Holder".to_string()),
        ));
        class.sync_fns.insert("make".to_string(), method);
        registry.classes.insert("Holder".to_string(), class);

        let self_obj = registry.push_object(Object::new("Holder".to_string(), true));
        let mut scope = Scope::new(&mut registry, Container::Class("Holder".to_string()), self_obj);

        let node = Node::non_terminal(
            RULE_CB_VAR_SYNC_SET,
            vec![
                Node::terminal("Effect"),
                Node::terminal("result"),
                Node::non_terminal("_dotref", vec![Node::terminal("self"), Node::terminal("make")]),
                Node::non_terminal("_arglist", Vec::new()),
            ],
        );
        check_statement(&mut scope, &node, "Void").unwrap();
        let result_id = scope.resolve_sync(&["result".to_string()]).unwrap();
        match result_id {
            Resolved::Object(id) => assert!(scope.is_ready(id)),
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn var_async_set_does_not_mark_ready() {
        let mut registry = registry_with_effect();
        let mut class = Class::new("Holder".to_string());
        let flow = registry.push_function(Function::new(
            FunctionKind::Async,
            "fetch".to_string(),
            "Effect".to_string(),
            Vec::new(),
            Container::Class("Holder".to_string()),
        ));
        class.async_fns.insert("fetch".to_string(), flow);
        registry.classes.insert("Holder".to_string(), class);

        let self_obj = registry.push_object(Object::new("Holder".to_string(), true));
        let mut scope = Scope::new(&mut registry, Container::Class("Holder".to_string()), self_obj);

        let node = Node::non_terminal(
            RULE_CB_VAR_ASYNC_SET,
            vec![
                Node::terminal("Effect"),
                Node::terminal("pending"),
                Node::non_terminal("_dotref", vec![Node::terminal("self"), Node::terminal("fetch")]),
                Node::non_terminal("_arglist", Vec::new()),
            ],
        );
        check_statement(&mut scope, &node, "Void").unwrap();
        let result = scope.resolve_sync(&["pending".to_string()]).unwrap();
        match result {
            Resolved::Object(id) => assert!(!scope.is_ready(id)),
            _ => panic!("expected an object"),
        }
    }
}
