use data::SemanticError;
use syntax::Registry;

use crate::degeneric;

/// Resolves a type string to the name it names in the specific-class
/// table, materializing a generic instantiation on first use (§4.4).
///
/// Aliases only ever indirect one level: the target of an alias is
/// never itself looked up in the alias table again, matching §9's
/// "Alias chaining" decision. There is no enclosing-scope fallback to
/// speak of: classes are always root-level in this language, so the
/// resolver has exactly one namespace to search.
pub fn resolve_type(registry: &mut Registry, type_string: &str) -> Result<String, SemanticError> {
    let owned;
    let candidate = match registry.aliases.get(type_string) {
        Some(target) => {
            owned = target.clone();
            owned.as_str()
        }
        None => type_string,
    };

    if registry.classes.contains_key(candidate) {
        return Ok(candidate.to_string());
    }

    if let Some(slash) = candidate.find('/') {
        let generic_name = &candidate[..slash];
        let args: Vec<String> = candidate[slash + 1..].split(',').map(|arg| arg.to_string()).collect();
        if !registry.generics.contains_key(generic_name) {
            return Err(SemanticError::unknown_type(candidate));
        }
        return degeneric::materialize(registry, generic_name, &args, candidate);
    }

    return Err(SemanticError::unknown_type(candidate));
}

/// §4.3's alias-validation intermission: every alias target must
/// resolve, using the same resolver every other caller uses, but
/// reporting failure as `InvalidAlias` rather than `UnknownType`.
pub fn validate_aliases(registry: &mut Registry) -> Result<(), SemanticError> {
    let entries: Vec<(String, String)> = registry.aliases.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
    for (alias, target) in entries {
        if resolve_type(registry, &target).is_err() {
            return Err(SemanticError::invalid_alias(&alias, &target));
        }
    }
    return Ok(());
}

#[cfg(test)]
mod test {
    use syntax::entities::Class;

    use super::*;

    #[test]
    fn resolves_a_plain_class() {
        let mut registry = Registry::new();
        registry.classes.insert("Effect".to_string(), Class::new("Effect".to_string()));
        assert_eq!(resolve_type(&mut registry, "Effect").unwrap(), "Effect");
    }

    #[test]
    fn unknown_type_fails() {
        let mut registry = Registry::new();
        assert!(resolve_type(&mut registry, "Nowhere").is_err());
    }

    #[test]
    fn alias_indirects_one_level() {
        let mut registry = Registry::new();
        registry.classes.insert("Effect".to_string(), Class::new("Effect".to_string()));
        registry.aliases.insert("Effects".to_string(), "Effect".to_string());
        assert_eq!(resolve_type(&mut registry, "Effects").unwrap(), "Effect");
    }
}
