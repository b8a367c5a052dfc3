use std::collections::HashMap;

use data::SemanticError;
use parser::node::{
    Node, RULE_ALIAS_GRAM, RULE_CGS_ASYNC_IMPL, RULE_CGS_ASYNC_STUB, RULE_CGS_SYNC_IMPL, RULE_CGS_SYNC_STUB, RULE_CGS_VAR_READY,
    RULE_CGS_VAR_STUB, RULE_CLASS_BASE_IMPL, RULE_CLASS_BASE_STUB, RULE_CLASS_GRAM, RULE_CLASS_INH_IMPL, RULE_CLASS_INH_STUB,
    RULE_FLOW_GRAM, RULE_FLOW_IMPL, RULE_FLOW_STUB, RULE_GENERIC_GRAM, RULE_GENERIC_IMPL, RULE_GENERIC_STUB, RULE_SINGLE_GRAM,
    RULE_SINGLE_IMPL, RULE_SINGLE_STUB,
};
use syntax::entities::{Class, Container, Function, FunctionKind, Generic, Object, Parameter, Single};
use syntax::{FunctionId, Registry};

use crate::resolver;

/// Every implemented function body discovered during the populate pass
/// (§4.3 pass 2), queued up for the body checker (§4.7) to walk once
/// inheritance and generic retrofit have both settled.
pub struct Bodies {
    pub pending: Vec<(FunctionId, Node)>,
    generic_members: HashMap<(String, String, bool), Node>,
}

impl Bodies {
    fn new() -> Self {
        return Self { pending: Vec::new(), generic_members: HashMap::new() };
    }

    /// After `degeneric::retrofit_all`, queues one more body check per
    /// materialized instance member, reusing its generic template's own
    /// parsed node — an instantiation differs from its template only in
    /// which concrete Objects/Functions its `self` and locals resolve
    /// to, never in source text, so there is nothing new to parse.
    pub fn expand_generic_instances(&mut self, registry: &Registry) {
        for (generic_name, instances) in &registry.generic_instances {
            for full_name in instances {
                let class = &registry.classes[full_name];
                for (member_name, id) in &class.sync_fns {
                    if let Some(node) = self.generic_members.get(&(generic_name.clone(), member_name.clone(), false)) {
                        self.pending.push((*id, node.clone()));
                    }
                }
                for (member_name, id) in &class.async_fns {
                    if let Some(node) = self.generic_members.get(&(generic_name.clone(), member_name.clone(), true)) {
                        self.pending.push((*id, node.clone()));
                    }
                }
            }
        }
    }
}

/// Pass 1 (§4.3): registers every top-level name — classes, generics
/// (plus a placeholder class per template parameter), singles (plus
/// their backing class and prebuilt object), and flows — checking each
/// against invariant 1 before anything references it. Alias targets
/// are recorded but not yet validated; `resolver::validate_aliases`
/// handles that once every class name that could plausibly be a target
/// exists.
pub fn stub_pass(registry: &mut Registry, tree: &Node) -> Result<(), SemanticError> {
    for decl in tree.children() {
        match decl.rule_name() {
            RULE_CLASS_GRAM => stub_class(registry, &decl.children()[0])?,
            RULE_GENERIC_GRAM => stub_generic(registry, &decl.children()[0])?,
            RULE_SINGLE_GRAM => stub_single(registry, &decl.children()[0])?,
            RULE_ALIAS_GRAM => stub_alias(registry, decl),
            RULE_FLOW_GRAM => stub_flow(registry, &decl.children()[0])?,
            other => panic!("unexpected top-level rule name '{}'", other),
        }
    }
    return Ok(());
}

fn stub_class(registry: &mut Registry, inner: &Node) -> Result<(), SemanticError> {
    let (name, parents) = match inner.rule_name() {
        RULE_CLASS_BASE_STUB | RULE_CLASS_BASE_IMPL => (inner.children()[0].value().unwrap().to_string(), Vec::new()),
        RULE_CLASS_INH_STUB | RULE_CLASS_INH_IMPL => {
            (inner.children()[0].value().unwrap().to_string(), inner.children()[1].terminal_values())
        }
        other => panic!("unexpected class-gram variant '{}'", other),
    };
    if registry.name_taken_at_root(&name) {
        return Err(SemanticError::duplicate_name(&name));
    }
    let mut class = Class::new(name.clone());
    class.parents = parents;
    registry.classes.insert(name, class);
    return Ok(());
}

fn stub_generic(registry: &mut Registry, inner: &Node) -> Result<(), SemanticError> {
    let name = inner.children()[0].value().unwrap().to_string();
    if registry.name_taken_at_root(&name) {
        return Err(SemanticError::duplicate_name(&name));
    }
    let params = inner.children()[1].terminal_values();
    for param in &params {
        registry.classes.entry(param.clone()).or_insert_with(|| Class::placeholder(param.clone()));
    }
    registry.generics.insert(name.clone(), Generic::new(name, params));
    return Ok(());
}

fn stub_single(registry: &mut Registry, inner: &Node) -> Result<(), SemanticError> {
    let name = inner.children()[0].value().unwrap().to_string();
    if registry.name_taken_at_root(&name) {
        return Err(SemanticError::duplicate_name(&name));
    }
    let backing_name = Single::class_name_for(&name);
    registry.classes.insert(backing_name.clone(), Class::new(backing_name.clone()));
    let object = registry.push_object(Object::new(backing_name.clone(), true));
    registry.singles.insert(name.clone(), Single { name, class_name: backing_name, object });
    return Ok(());
}

/// §9 "Alias grammar token order": the first captured type names the
/// alias, the second (after `to`) names its target.
fn stub_alias(registry: &mut Registry, alias_gram: &Node) {
    let alias_name = alias_gram.children()[0].value().unwrap().to_string();
    let target = alias_gram.children()[1].value().unwrap().to_string();
    registry.aliases.insert(alias_name, target);
}

fn stub_flow(registry: &mut Registry, inner: &Node) -> Result<(), SemanticError> {
    let name = inner.children()[0].value().unwrap().to_string();
    if registry.name_taken_at_root(&name) {
        return Err(SemanticError::duplicate_name(&name));
    }
    let function = Function::new(FunctionKind::Async, name.clone(), syntax::registry::VOID_CLASS.to_string(), Vec::new(), Container::Model);
    let id = registry.push_function(function);
    registry.flows.insert(name, id);
    return Ok(());
}

enum Member {
    Var { name: String, class_name: String, ready: bool },
    Function { name: String, kind: FunctionKind, id: FunctionId, body: Option<Node> },
}

fn build_member(registry: &mut Registry, container: &Container, node: &Node) -> Result<Member, SemanticError> {
    return match node.rule_name() {
        RULE_CGS_VAR_STUB | RULE_CGS_VAR_READY => {
            let type_name = node.children()[0].value().expect("cgs var forms carry a type terminal");
            let name = node.children()[1].value().expect("cgs var forms carry a name terminal").to_string();
            let class_name = resolver::resolve_type(registry, type_name)?;
            let ready = node.rule_name() == RULE_CGS_VAR_READY;
            Ok(Member::Var { name, class_name, ready })
        }
        RULE_CGS_SYNC_STUB | RULE_CGS_SYNC_IMPL | RULE_CGS_ASYNC_STUB | RULE_CGS_ASYNC_IMPL => {
            let kind = if node.rule_name() == RULE_CGS_ASYNC_STUB || node.rule_name() == RULE_CGS_ASYNC_IMPL {
                FunctionKind::Async
            } else {
                FunctionKind::Sync
            };
            let implemented = node.rule_name() == RULE_CGS_SYNC_IMPL || node.rule_name() == RULE_CGS_ASYNC_IMPL;
            let return_type = resolver::resolve_type(registry, node.children()[0].value().expect("cgs function forms carry a return-type terminal"))?;
            let name = node.children()[1].value().expect("cgs function forms carry a name terminal").to_string();
            let mut params = Vec::new();
            for pair in node.children()[2].children() {
                let param_type = resolver::resolve_type(registry, pair.children()[0].value().expect("a sig pair carries a type terminal"))?;
                let param_name = pair.children()[1].value().expect("a sig pair carries a name terminal").to_string();
                params.push(Parameter { name: param_name, class_name: param_type });
            }
            let mut function = Function::new(kind, name.clone(), return_type, params, container.clone());
            function.implemented = implemented;
            let id = registry.push_function(function);
            let body = if implemented { Some(node.children()[3].clone()) } else { None };
            Ok(Member::Function { name, kind, id, body })
        }
        other => panic!("unexpected member rule name '{}'", other),
    };
}

/// Pass 2 (§4.3): walks every implemented declaration again, this time
/// resolving every type string through `resolver::resolve_type` and
/// building the concrete `Function`/`Object` entries each container
/// owns. Bodies are recorded for later, not checked here — §4.3 keeps
/// declaration shape and body semantics in separate passes so a
/// forward reference to a not-yet-declared class never trips up a
/// sibling's body check.
pub fn populate_pass(registry: &mut Registry, tree: &Node) -> Result<Bodies, SemanticError> {
    let mut bodies = Bodies::new();
    for decl in tree.children() {
        match decl.rule_name() {
            RULE_CLASS_GRAM => populate_class(registry, &decl.children()[0], &mut bodies)?,
            RULE_GENERIC_GRAM => populate_generic(registry, &decl.children()[0], &mut bodies)?,
            RULE_SINGLE_GRAM => populate_single(registry, &decl.children()[0], &mut bodies)?,
            RULE_ALIAS_GRAM => {}
            RULE_FLOW_GRAM => populate_flow(registry, &decl.children()[0], &mut bodies)?,
            other => panic!("unexpected top-level rule name '{}'", other),
        }
    }
    return Ok(bodies);
}

fn populate_class(registry: &mut Registry, inner: &Node, bodies: &mut Bodies) -> Result<(), SemanticError> {
    let (name, block) = match inner.rule_name() {
        RULE_CLASS_BASE_STUB | RULE_CLASS_INH_STUB => return Ok(()),
        RULE_CLASS_BASE_IMPL => (inner.children()[0].value().unwrap().to_string(), &inner.children()[1]),
        RULE_CLASS_INH_IMPL => (inner.children()[0].value().unwrap().to_string(), &inner.children()[2]),
        other => panic!("unexpected class-gram variant '{}'", other),
    };
    let container = Container::Class(name.clone());
    for member_node in block.children() {
        match build_member(registry, &container, member_node)? {
            Member::Var { name: member_name, class_name, ready } => {
                let id = registry.push_object(Object::new(class_name, ready));
                registry.classes.get_mut(&name).expect("stubbed in pass 1").objects.insert(member_name, id);
            }
            Member::Function { name: member_name, kind, id, body } => {
                insert_fn(registry.classes.get_mut(&name).expect("stubbed in pass 1"), kind, member_name, id);
                if let Some(body_node) = body {
                    bodies.pending.push((id, body_node));
                }
            }
        }
    }
    return Ok(());
}

fn populate_generic(registry: &mut Registry, inner: &Node, bodies: &mut Bodies) -> Result<(), SemanticError> {
    let (name, block) = match inner.rule_name() {
        RULE_GENERIC_STUB => return Ok(()),
        RULE_GENERIC_IMPL => (inner.children()[0].value().unwrap().to_string(), &inner.children()[2]),
        other => panic!("unexpected generic-gram variant '{}'", other),
    };
    let container = Container::Generic(name.clone());
    for member_node in block.children() {
        match build_member(registry, &container, member_node)? {
            Member::Var { name: member_name, class_name, ready } => {
                let id = registry.push_object(Object::new(class_name, ready));
                registry.generics.get_mut(&name).expect("stubbed in pass 1").objects.insert(member_name, id);
            }
            Member::Function { name: member_name, kind, id, body } => {
                insert_fn_generic(registry.generics.get_mut(&name).expect("stubbed in pass 1"), kind, member_name.clone(), id);
                if let Some(body_node) = body {
                    bodies.pending.push((id, body_node.clone()));
                    bodies.generic_members.insert((name.clone(), member_name, kind == FunctionKind::Async), body_node);
                }
            }
        }
    }
    return Ok(());
}

fn populate_single(registry: &mut Registry, inner: &Node, bodies: &mut Bodies) -> Result<(), SemanticError> {
    let (name, block) = match inner.rule_name() {
        RULE_SINGLE_STUB => return Ok(()),
        RULE_SINGLE_IMPL => (inner.children()[0].value().unwrap().to_string(), &inner.children()[1]),
        other => panic!("unexpected single-gram variant '{}'", other),
    };
    let backing_name = Single::class_name_for(&name);
    let container = Container::Single(name);
    for member_node in block.children() {
        match build_member(registry, &container, member_node)? {
            Member::Var { name: member_name, class_name, ready } => {
                let id = registry.push_object(Object::new(class_name, ready));
                registry.classes.get_mut(&backing_name).expect("stubbed in pass 1").objects.insert(member_name, id);
            }
            Member::Function { name: member_name, kind, id, body } => {
                insert_fn(registry.classes.get_mut(&backing_name).expect("stubbed in pass 1"), kind, member_name, id);
                if let Some(body_node) = body {
                    bodies.pending.push((id, body_node));
                }
            }
        }
    }
    return Ok(());
}

fn populate_flow(registry: &mut Registry, inner: &Node, bodies: &mut Bodies) -> Result<(), SemanticError> {
    let (name, body_node) = match inner.rule_name() {
        RULE_FLOW_STUB => return Ok(()),
        RULE_FLOW_IMPL => (inner.children()[0].value().unwrap().to_string(), inner.children()[1].clone()),
        other => panic!("unexpected flow-gram variant '{}'", other),
    };
    let id = registry.flows[&name];
    registry.function_mut(id).implemented = true;
    bodies.pending.push((id, body_node));
    return Ok(());
}

fn insert_fn(class: &mut Class, kind: FunctionKind, name: String, id: FunctionId) {
    match kind {
        FunctionKind::Sync => class.sync_fns.insert(name, id),
        FunctionKind::Async => class.async_fns.insert(name, id),
    };
}

fn insert_fn_generic(generic: &mut Generic, kind: FunctionKind, name: String, id: FunctionId) {
    match kind {
        FunctionKind::Sync => generic.sync_fns.insert(name, id),
        FunctionKind::Async => generic.async_fns.insert(name, id),
    };
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn stubs_a_class_and_rejects_redeclaration() {
        let mut registry = Registry::new();
        let tree = parser::parse("class Effect.\nclass Effect.").unwrap();
        assert!(stub_pass(&mut registry, &tree).is_err());
    }

    #[test]
    fn populate_builds_members_and_queues_bodies() {
        let mut registry = Registry::new();
        let tree = parser::parse("class Base { sync Void ping() {note{p}} }\nclass Derived is Base.").unwrap();
        stub_pass(&mut registry, &tree).unwrap();
        resolver::validate_aliases(&mut registry).unwrap();
        let bodies = populate_pass(&mut registry, &tree).unwrap();
        assert!(registry.classes["Base"].sync_fns.contains_key("ping"));
        assert_eq!(bodies.pending.len(), 1);
        assert_eq!(registry.classes["Derived"].parents, vec!["Base".to_string()]);
    }

    #[test]
    fn alias_to_generic_instantiation_materializes_on_validate() {
        let mut registry = Registry::new();
        let tree = parser::parse("class Effect.\ngeneric List T.\nalias Effects to List/Effect.").unwrap();
        stub_pass(&mut registry, &tree).unwrap();
        resolver::validate_aliases(&mut registry).unwrap();
        assert!(registry.classes.contains_key("List/Effect"));
    }
}
