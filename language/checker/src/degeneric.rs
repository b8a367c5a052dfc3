use std::collections::HashMap;

use indexmap::IndexMap;

use data::SemanticError;
use syntax::entities::{Class, Function, Object};
use syntax::{Container, Registry};

/// Produces a derived Class for a generic instantiation `G/A1,...,An`,
/// substituting each occurrence of a template-parameter name used as a
/// type with its concrete replacement (§4.5).
///
/// Materialization happens in two passes across the whole model, not
/// two passes per generic: the first time a given instantiation is
/// requested (typically mid populate-pass, possibly before `G` itself
/// has been populated) this only stamps out an empty shell and records
/// it in `generic_instances`. `retrofit_all` later rebuilds every
/// recorded instance's member tables once every generic's own members
/// are known, per §9's "Generic retrofit" design note — reading this
/// function alone is reading only half the story.
pub fn materialize(registry: &mut Registry, generic_name: &str, args: &[String], full_name: &str) -> Result<String, SemanticError> {
    if registry.classes.contains_key(full_name) {
        return Ok(full_name.to_string());
    }

    let arity = registry.generics[generic_name].template_params.len();
    if args.len() != arity {
        return Err(SemanticError::arity_mismatch(&format!("generic '{}'", generic_name), arity, args.len()));
    }

    registry.classes.insert(full_name.to_string(), Class::new(full_name.to_string()));
    registry.record_generic_instance(generic_name, full_name.to_string());
    populate_instance(registry, generic_name, args, full_name);
    return Ok(full_name.to_string());
}

/// Rebuilds every already-materialized instance of every generic from
/// that generic's current (now fully populated) member tables. Safe to
/// call more than once: it always rebuilds from scratch rather than
/// appending, so an instance requested before its generic was fully
/// populated still ends up consistent once this runs.
pub fn retrofit_all(registry: &mut Registry) {
    let generics: Vec<String> = registry.generics.keys().cloned().collect();
    for generic_name in generics {
        let instances = registry.generic_instances.get(&generic_name).cloned().unwrap_or_default();
        for full_name in instances {
            let args: Vec<String> = full_name[generic_name.len() + 1..].split(',').map(|arg| arg.to_string()).collect();
            populate_instance(registry, &generic_name, &args, &full_name);
        }
    }
}

fn populate_instance(registry: &mut Registry, generic_name: &str, args: &[String], full_name: &str) {
    let generic = registry.generics[generic_name].clone();
    let subst: HashMap<&str, &str> = generic.template_params.iter().map(String::as_str).zip(args.iter().map(String::as_str)).collect();

    let mut sync_fns = IndexMap::new();
    for (name, id) in &generic.sync_fns {
        let function = substitute_function(registry.function(*id).clone(), &subst, full_name);
        sync_fns.insert(name.clone(), registry.push_function(function));
    }
    let mut async_fns = IndexMap::new();
    for (name, id) in &generic.async_fns {
        let function = substitute_function(registry.function(*id).clone(), &subst, full_name);
        async_fns.insert(name.clone(), registry.push_function(function));
    }
    let mut objects = IndexMap::new();
    for (name, id) in &generic.objects {
        let object = registry.object(*id).clone();
        let class_name = subst.get(object.class_name.as_str()).map(|s| s.to_string()).unwrap_or(object.class_name);
        objects.insert(name.clone(), registry.push_object(Object::new(class_name, object.ready)));
    }

    let class = registry.classes.get_mut(full_name).expect("materialize always inserts the shell first");
    class.sync_fns = sync_fns;
    class.async_fns = async_fns;
    class.objects = objects;
    class.implemented = generic.implemented;
}

/// Clones a generic's function member, substituting any return or
/// parameter type that is exactly a template-parameter name. Nested
/// generic references (`Other/T`) are left literal — they re-resolve
/// lazily the next time something asks the type resolver about them.
fn substitute_function(mut function: Function, subst: &HashMap<&str, &str>, container_class: &str) -> Function {
    if let Some(concrete) = subst.get(function.return_type.as_str()) {
        function.return_type = concrete.to_string();
    }
    for param in &mut function.params {
        if let Some(concrete) = subst.get(param.class_name.as_str()) {
            param.class_name = concrete.to_string();
        }
    }
    function.container = Container::Class(container_class.to_string());
    return function;
}

#[cfg(test)]
mod test {
    use syntax::entities::Generic;

    use super::*;

    #[test]
    fn materializes_with_substitution() {
        let mut registry = Registry::new();
        registry.classes.insert("Effect".to_string(), Class::new("Effect".to_string()));
        let mut generic = Generic::new("List".to_string(), vec!["T".to_string()]);
        let template_head = registry.push_object(Object::new("T".to_string(), false));
        generic.objects.insert("head".to_string(), template_head);
        registry.generics.insert("List".to_string(), generic);

        let name = materialize(&mut registry, "List", &["Effect".to_string()], "List/Effect").unwrap();
        retrofit_all(&mut registry);
        let head = registry.classes[&name].objects["head"];
        assert_eq!(registry.object(head).class_name, "Effect");
    }

    #[test]
    fn wrong_arity_fails() {
        let mut registry = Registry::new();
        registry.generics.insert("Pair".to_string(), Generic::new("Pair".to_string(), vec!["K".to_string(), "V".to_string()]));
        assert!(materialize(&mut registry, "Pair", &["Int".to_string()], "Pair/Int").is_err());
    }

    #[test]
    fn materialize_is_idempotent_on_repeat_requests() {
        let mut registry = Registry::new();
        registry.classes.insert("Effect".to_string(), Class::new("Effect".to_string()));
        registry.generics.insert("List".to_string(), Generic::new("List".to_string(), vec!["T".to_string()]));
        materialize(&mut registry, "List", &["Effect".to_string()], "List/Effect").unwrap();
        let before = registry.classes.len();
        materialize(&mut registry, "List", &["Effect".to_string()], "List/Effect").unwrap();
        assert_eq!(registry.classes.len(), before);
    }
}
