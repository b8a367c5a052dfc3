use data::SemanticError;
use parser::node::Node;
use syntax::Registry;

pub mod check_code;
pub mod check_function;
pub mod degeneric;
pub mod inheritance;
pub mod resolver;
pub mod walker;

/// Runs the full analysis (§4.3) over a parsed tree and returns the
/// finished `Registry`, or the first fatal `SemanticError` encountered.
/// Passes run strictly in order — each one depends on every earlier
/// pass having already settled the whole model, not just the
/// declaration it happens to be looking at:
///
/// 1. `walker::stub_pass` — register every root-level name.
/// 2. `resolver::validate_aliases` — every alias target must resolve.
/// 3. `walker::populate_pass` — build concrete members, queue bodies.
/// 4. `degeneric::retrofit_all` — rebuild every generic instance from
///    its now-fully-populated generic.
/// 5. Queue a body check for every materialized instance member too,
///    reusing its generic template's parsed node.
/// 6. `inheritance::linearize` — copy parent members onto children.
/// 7. Check every queued body (§4.7–§4.8).
pub fn build_model(tree: &Node) -> Result<Registry, SemanticError> {
    let mut registry = Registry::new();

    walker::stub_pass(&mut registry, tree)?;
    resolver::validate_aliases(&mut registry)?;
    let mut bodies = walker::populate_pass(&mut registry, tree)?;
    degeneric::retrofit_all(&mut registry);
    bodies.expand_generic_instances(&registry);
    inheritance::linearize(&mut registry)?;

    for (function_id, body) in &bodies.pending {
        check_function::check_function(&mut registry, *function_id, body)?;
    }

    return Ok(registry);
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn empty_source_builds_an_empty_model() {
        let tree = parser::parse("").unwrap();
        let registry = build_model(&tree).unwrap();
        assert!(registry.classes.contains_key("Void"));
    }

    #[test]
    fn minimal_class_and_flow_build_cleanly() {
        let tree = parser::parse("class Effect.\nflow main { Effect x!; }").unwrap();
        let registry = build_model(&tree).unwrap();
        assert!(registry.classes.contains_key("Effect"));
        assert!(registry.flows.contains_key("main"));
    }

    #[test]
    fn duplicate_class_name_fails() {
        let tree = parser::parse("class Effect.\nclass Effect.").unwrap();
        assert!(build_model(&tree).is_err());
    }

    #[test]
    fn generic_instantiation_with_wrong_arity_fails() {
        let src = "generic Pair K,V.\nalias Bad to Pair/Int.";
        let tree = parser::parse(src).unwrap();
        assert!(build_model(&tree).is_err());
    }

    #[test]
    fn generic_instantiation_through_alias_is_checked() {
        let src = "class Effect.\ngeneric List T { T head; }\nalias Effects to List/Effect.\nflow main { Effects x; }";
        let tree = parser::parse(src).unwrap();
        let registry = build_model(&tree).unwrap();
        assert!(registry.classes.contains_key("List/Effect"));
    }

    #[test]
    fn inheritance_propagates_a_ready_method_to_a_subclass() {
        let src = "class Base { sync Void ping() {note{p}} }\nclass Derived is Base.\nflow main { Derived d!; void = d.ping(); }";
        let tree = parser::parse(src).unwrap();
        assert!(build_model(&tree).is_ok());
    }

    #[test]
    fn calling_with_an_unready_argument_fails() {
        let src = "class Effect.\n\
                   class Holder { sync Void take(Effect input) {} }\n\
                   flow main { Holder h!; Effect e; void = h.take(e); }";
        let tree = parser::parse(src).unwrap();
        assert!(build_model(&tree).is_err());
    }

    #[test]
    fn calling_an_async_member_synchronously_fails() {
        let src = "class Effect.\n\
                   class Holder { async Effect fetch() {note{x}} }\n\
                   flow main { Holder h!; Effect e = h.fetch(); }";
        let tree = parser::parse(src).unwrap();
        assert!(build_model(&tree).is_err());
    }
}
