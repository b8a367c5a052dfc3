use data::SemanticError;
use parser::node::Node;
use syntax::entities::{Container, Object, Single, Statement};
use syntax::{FunctionId, Registry};

use crate::check_code::{self, Scope};

/// Checks one function's body (§4.7): binds `self` and every parameter
/// ready in a fresh local scope, dispatches each statement of the
/// parsed `_cb_grammar` node, then enforces the definite-return rule
/// (§4.7 "Definite-return rule"). A `Void`-returning function is
/// exempt — there is no value to come back with, so it is satisfied
/// before the first statement runs. `body` is the walker's recorded
/// parse node for this function; the checked `Statement`s it produces
/// are written onto `registry.function_mut(function_id).body`.
pub fn check_function(registry: &mut Registry, function_id: FunctionId, body: &Node) -> Result<(), SemanticError> {
    let (container, return_type, params, name) = {
        let function = registry.function(function_id);
        (function.container.clone(), function.return_type.clone(), function.params.clone(), function.name.clone())
    };

    let self_object = registry.push_object(Object::new(self_class_name(&container), true));
    let is_void_return = registry.is_void_class(&return_type);
    let mut scope = Scope::new(registry, container, self_object);

    for param in &params {
        let id = scope.push_local_object(param.class_name.clone(), true);
        scope.bind(param.name.clone(), id, true);
    }

    let mut valid_return = is_void_return;
    let mut statements = Vec::new();
    for node in body.children() {
        let statement = check_code::check_statement(&mut scope, node, &return_type)?;
        if let Statement::Return { .. } = &statement {
            valid_return = true;
        }
        statements.push(statement);
    }

    if !valid_return {
        return Err(SemanticError::missing_return(&name, &return_type));
    }

    registry.function_mut(function_id).body = statements;
    return Ok(());
}

/// The class `self` is bound to for the duration of a body check. A
/// flow has no real enclosing type, so `self` there is simply `Void` —
/// flows never reference it meaningfully, but the binding still has to
/// resolve to something for the lookup chain to stay uniform.
fn self_class_name(container: &Container) -> String {
    return match container {
        Container::Model => syntax::registry::VOID_CLASS.to_string(),
        Container::Class(name) => name.clone(),
        Container::Generic(name) => name.clone(),
        Container::Single(name) => Single::class_name_for(name),
    };
}

#[cfg(test)]
mod test {
    use parser::node::{RULE_CB_RETURN, RULE_DOTREF, RULE_CB_GRAMMAR};
    use syntax::entities::{Class, Function, FunctionKind, Parameter};

    use super::*;

    fn empty_body() -> Node {
        return Node::non_terminal(RULE_CB_GRAMMAR, Vec::new());
    }

    #[test]
    fn void_function_with_no_return_is_valid() {
        let mut registry = Registry::new();
        registry.classes.insert("Holder".to_string(), Class::new("Holder".to_string()));
        let id = registry.push_function(Function::new(
            FunctionKind::Sync,
            "noop".to_string(),
            "Void".to_string(),
            Vec::new(),
            Container::Class("Holder".to_string()),
        ));
        assert!(check_function(&mut registry, id, &empty_body()).is_ok());
    }

    #[test]
    fn non_void_function_without_return_fails() {
        let mut registry = Registry::new();
        registry.classes.insert("Effect".to_string(), Class::new("Effect".to_string()));
        let id = registry.push_function(Function::new(
            FunctionKind::Sync,
            "make".to_string(),
            "Effect".to_string(),
            Vec::new(),
            Container::Class("Effect".to_string()),
        ));
        assert!(check_function(&mut registry, id, &empty_body()).is_err());
    }

    #[test]
    fn returning_a_ready_parameter_satisfies_the_return_type() {
        let mut registry = Registry::new();
        registry.classes.insert("Effect".to_string(), Class::new("Effect".to_string()));
        let id = registry.push_function(Function::new(
            FunctionKind::Sync,
            "echo".to_string(),
            "Effect".to_string(),
            vec![Parameter { name: "input".to_string(), class_name: "Effect".to_string() }],
            Container::Class("Effect".to_string()),
        ));
        let body = Node::non_terminal(
            RULE_CB_GRAMMAR,
            vec![Node::non_terminal(RULE_CB_RETURN, vec![Node::non_terminal(RULE_DOTREF, vec![Node::terminal("input")])])],
        );
        check_function(&mut registry, id, &body).unwrap();
        assert_eq!(registry.function(id).body.len(), 1);
    }
}
