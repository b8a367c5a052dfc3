use std::collections::{HashMap, HashSet};

use data::SemanticError;
use syntax::Registry;

/// Topologically propagates parent members onto children (§4.6).
///
/// Builds `depends_on`/`needed_by` adjacency over every class in the
/// registry (generic-derived and Single-backed classes included — they
/// simply have no parents, so they're trivially ready in round one),
/// then repeatedly drains the ready frontier: for each ready class, for
/// each parent (already fully populated by construction, since a class
/// only becomes ready once every parent is done), copy in — as a
/// reference, the same `FunctionId`/`ObjectId`, never a clone — every
/// member not already declared directly on the child.
pub fn linearize(registry: &mut Registry) -> Result<(), SemanticError> {
    let names: Vec<String> = registry.classes.keys().cloned().collect();
    let depends_on: HashMap<String, Vec<String>> = names.iter().map(|name| (name.clone(), registry.classes[name].parents.clone())).collect();

    let mut needed_by: HashMap<String, Vec<String>> = names.iter().map(|name| (name.clone(), Vec::new())).collect();
    for name in &names {
        for parent in &depends_on[name] {
            needed_by.entry(parent.clone()).or_default().push(name.clone());
        }
    }

    let mut done: HashSet<String> = HashSet::new();
    let mut ready: Vec<String> = names.iter().filter(|name| depends_on[*name].is_empty()).cloned().collect();

    while !ready.is_empty() {
        for child in &ready {
            let parents = depends_on[child].clone();
            for parent in parents {
                inherit(registry, &parent, child);
            }
        }
        for child in &ready {
            done.insert(child.clone());
        }

        let mut next = Vec::new();
        for finished in &ready {
            for candidate in needed_by.get(finished).cloned().unwrap_or_default() {
                if done.contains(&candidate) || next.contains(&candidate) {
                    continue;
                }
                if depends_on[&candidate].iter().all(|parent| done.contains(parent)) {
                    next.push(candidate);
                }
            }
        }
        ready = next;
    }

    if done.len() != names.len() {
        let remaining: Vec<String> = names.into_iter().filter(|name| !done.contains(name)).collect();
        return Err(SemanticError::inheritance_cycle(&remaining));
    }
    return Ok(());
}

/// Copies every member of `parent` not shadowed directly on `child`
/// onto `child`, preserving the parent's own insertion order.
fn inherit(registry: &mut Registry, parent: &str, child: &str) {
    let (async_fns, sync_fns, objects) = {
        let parent_class = &registry.classes[parent];
        (parent_class.async_fns.clone(), parent_class.sync_fns.clone(), parent_class.objects.clone())
    };
    let child_class = registry.classes.get_mut(child).expect("child named in its own depends_on entry");
    for (name, id) in async_fns {
        if !child_class.declares(&name) {
            child_class.async_fns.insert(name, id);
        }
    }
    for (name, id) in sync_fns {
        if !child_class.declares(&name) {
            child_class.sync_fns.insert(name, id);
        }
    }
    for (name, id) in objects {
        if !child_class.declares(&name) {
            child_class.objects.insert(name, id);
        }
    }
}

#[cfg(test)]
mod test {
    use syntax::entities::{Class, Function, FunctionKind};
    use syntax::Container;

    use super::*;

    #[test]
    fn propagates_a_single_parent_method() {
        let mut registry = Registry::new();
        let mut base = Class::new("Base".to_string());
        let ping = registry.push_function(Function::new(
            FunctionKind::Sync,
            "ping".to_string(),
            "Void".to_string(),
            Vec::new(),
            Container::Class("Base".to_string()),
        ));
        base.sync_fns.insert("ping".to_string(), ping);
        registry.classes.insert("Base".to_string(), base);

        let mut derived = Class::new("Derived".to_string());
        derived.parents.push("Base".to_string());
        registry.classes.insert("Derived".to_string(), derived);

        linearize(&mut registry).unwrap();
        assert_eq!(registry.classes["Derived"].sync_fns["ping"], ping);
    }

    #[test]
    fn a_cycle_fails() {
        let mut registry = Registry::new();
        let mut a = Class::new("A".to_string());
        a.parents.push("B".to_string());
        registry.classes.insert("A".to_string(), a);
        let mut b = Class::new("B".to_string());
        b.parents.push("A".to_string());
        registry.classes.insert("B".to_string(), b);

        assert!(linearize(&mut registry).is_err());
    }

    #[test]
    fn shadowed_members_are_not_overwritten() {
        let mut registry = Registry::new();
        let mut base = Class::new("Base".to_string());
        let base_ping = registry.push_function(Function::new(
            FunctionKind::Sync,
            "ping".to_string(),
            "Void".to_string(),
            Vec::new(),
            Container::Class("Base".to_string()),
        ));
        base.sync_fns.insert("ping".to_string(), base_ping);
        registry.classes.insert("Base".to_string(), base);

        let mut derived = Class::new("Derived".to_string());
        derived.parents.push("Base".to_string());
        let own_ping = registry.push_function(Function::new(
            FunctionKind::Sync,
            "ping".to_string(),
            "Void".to_string(),
            Vec::new(),
            Container::Class("Derived".to_string()),
        ));
        derived.sync_fns.insert("ping".to_string(), own_ping);
        registry.classes.insert("Derived".to_string(), derived);

        linearize(&mut registry).unwrap();
        assert_eq!(registry.classes["Derived"].sync_fns["ping"], own_ping);
    }
}
