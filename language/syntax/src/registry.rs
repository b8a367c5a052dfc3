use indexmap::IndexMap;

use crate::entities::{Class, Function, Generic, Object, Single};
use crate::ids::{FunctionId, ObjectId};

pub const VOID_CLASS: &str = "Void";
pub const VOID_OBJECT: &str = "void";

/// The root container: a flat scope holding four name spaces (specific
/// classes, generics, aliases, flow declarations) plus the arenas that
/// back every `Function` and `Object` in the model. Mutated exclusively
/// by the walker, the resolver, the generic materializer, and the
/// inheritance linearizer, in that order; effectively immutable once
/// body checking completes.
pub struct Registry {
    pub classes: IndexMap<String, Class>,
    pub generics: IndexMap<String, Generic>,
    pub aliases: IndexMap<String, String>,
    pub flows: IndexMap<String, FunctionId>,
    pub singles: IndexMap<String, Single>,
    pub functions: Vec<Function>,
    pub objects: Vec<Object>,
    /// Every already-materialized instance of each generic, in creation
    /// order, so that a later populate of the generic's own members can
    /// retrofit every derived class (§4.5 step 5).
    pub generic_instances: IndexMap<String, Vec<String>>,
    pub void_object: ObjectId,
}

impl Registry {
    pub fn new() -> Self {
        let mut registry = Self {
            classes: IndexMap::new(),
            generics: IndexMap::new(),
            aliases: IndexMap::new(),
            flows: IndexMap::new(),
            singles: IndexMap::new(),
            functions: Vec::new(),
            objects: Vec::new(),
            generic_instances: IndexMap::new(),
            void_object: ObjectId(0),
        };
        registry.classes.insert(VOID_CLASS.to_string(), Class::new(VOID_CLASS.to_string()));
        registry.void_object = registry.push_object(Object::new(VOID_CLASS.to_string(), true));
        return registry;
    }

    pub fn push_function(&mut self, function: Function) -> FunctionId {
        let id = FunctionId(self.functions.len() as u32);
        self.functions.push(function);
        return id;
    }

    pub fn push_object(&mut self, object: Object) -> ObjectId {
        let id = ObjectId(self.objects.len() as u32);
        self.objects.push(object);
        return id;
    }

    pub fn function(&self, id: FunctionId) -> &Function {
        return &self.functions[id.0 as usize];
    }

    pub fn function_mut(&mut self, id: FunctionId) -> &mut Function {
        return &mut self.functions[id.0 as usize];
    }

    pub fn object(&self, id: ObjectId) -> &Object {
        return &self.objects[id.0 as usize];
    }

    pub fn object_mut(&mut self, id: ObjectId) -> &mut Object {
        return &mut self.objects[id.0 as usize];
    }

    pub fn is_void_class(&self, class_name: &str) -> bool {
        return class_name == VOID_CLASS;
    }

    /// Whether `name` collides with a root-level declaration (invariant
    /// 1). Placeholder classes (generic template parameters) are exempt.
    pub fn name_taken_at_root(&self, name: &str) -> bool {
        if name == VOID_OBJECT {
            return true;
        }
        if let Some(class) = self.classes.get(name) {
            if !class.placeholder {
                return true;
            }
        }
        return self.generics.contains_key(name) || self.singles.contains_key(name) || self.flows.contains_key(name);
    }

    pub fn record_generic_instance(&mut self, generic_name: &str, class_name: String) {
        self.generic_instances.entry(generic_name.to_string()).or_default().push(class_name);
    }
}

impl Default for Registry {
    fn default() -> Self {
        return Self::new();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn seeds_void() {
        let registry = Registry::new();
        assert!(registry.classes.contains_key(VOID_CLASS));
        assert!(registry.object(registry.void_object).ready);
    }

    #[test]
    fn placeholder_names_are_exempt() {
        let mut registry = Registry::new();
        registry.classes.insert("T".to_string(), Class::placeholder("T".to_string()));
        assert!(!registry.name_taken_at_root("T"));
    }

    #[test]
    fn void_object_name_is_reserved() {
        let registry = Registry::new();
        assert!(registry.name_taken_at_root(VOID_OBJECT));
    }
}
