//! Accessor name derivation.
//!
//! A field name is first reduced to a *base* by stripping a configured prefix,
//! then expanded into every name an accessor for it could carry. The first
//! candidate is the canonical name the synthesizer uses; the rest are only
//! consulted by conflict detection.

use af_core::FieldDecl;
use thiserror::Error;

use crate::config::{NamingPolicy, PrefixCase};

/// Candidate accessor names for one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessorNames {
    pub canonical: String,
    /// Every candidate, canonical first, without duplicates.
    pub all: Vec<String>,
}

/// The field name does not fit the configured prefix list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("field '{field}' does not fit the configured prefix list")]
pub struct NoMatch {
    pub field: String,
}

/// Derive accessor names for `field` under `policy`.
pub fn resolve(field: &FieldDecl, policy: &NamingPolicy) -> Result<AccessorNames, NoMatch> {
    let no_match = || NoMatch {
        field: field.name.clone(),
    };

    let base = strip_prefix(&field.name, &policy.prefixes, policy.case_rule).ok_or_else(no_match)?;
    if !base.chars().next().is_some_and(is_identifier_start) {
        return Err(no_match());
    }

    let is_boolean = field.ty.is_primitive_boolean();
    let names = if policy.fluent {
        fluent_names(&base, is_boolean)
    } else {
        bean_names(&base, is_boolean)
    };

    debug_assert!(!names.is_empty());
    Ok(AccessorNames {
        canonical: names[0].clone(),
        all: names,
    })
}

/// Strip the first matching prefix. `None` when prefixes are configured and none match.
fn strip_prefix(name: &str, prefixes: &[String], case_rule: PrefixCase) -> Option<String> {
    if prefixes.is_empty() {
        return Some(name.to_string());
    }

    for prefix in prefixes {
        if prefix.is_empty() {
            return Some(name.to_string());
        }
        let Some(rest) = name.strip_prefix(prefix.as_str()) else {
            continue;
        };
        let Some(next) = rest.chars().next() else {
            continue;
        };
        let ends_in_letter = prefix.chars().last().is_some_and(char::is_alphabetic);
        if case_rule == PrefixCase::Strict && ends_in_letter && next.is_lowercase() {
            continue;
        }
        return Some(decapitalize(rest));
    }

    None
}

fn bean_names(base: &str, is_boolean: bool) -> Vec<String> {
    if !is_boolean {
        return vec![format!("get{}", capitalize(base))];
    }

    let canonical = if has_is_prefix(base) {
        base.to_string()
    } else {
        format!("is{}", capitalize(base))
    };

    let mut variants = Vec::with_capacity(2);
    if has_is_prefix(base) {
        variants.push(base[2..].to_string());
    }
    variants.push(base.to_string());

    let mut names = vec![canonical];
    for variant in variants {
        push_unique(&mut names, format!("is{}", capitalize(&variant)));
        push_unique(&mut names, format!("get{}", capitalize(&variant)));
    }
    names
}

fn fluent_names(base: &str, is_boolean: bool) -> Vec<String> {
    let mut names = vec![base.to_string()];
    if is_boolean && has_is_prefix(base) {
        push_unique(&mut names, decapitalize(&base[2..]));
    }
    names
}

/// `isX` where `X` is not lowercase.
fn has_is_prefix(name: &str) -> bool {
    name.strip_prefix("is")
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| !c.is_lowercase())
}

fn is_identifier_start(c: char) -> bool {
    c == '_' || c == '$' || c.is_alphabetic()
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn decapitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn push_unique(names: &mut Vec<String>, name: String) {
    if !names.contains(&name) {
        names.push(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use af_core::{Modifiers, PrimitiveKind, TypeRef};

    fn field(name: &str, ty: TypeRef) -> FieldDecl {
        FieldDecl::new(name, ty, Modifiers::PRIVATE)
    }

    fn int_field(name: &str) -> FieldDecl {
        field(name, TypeRef::Primitive(PrimitiveKind::Int))
    }

    fn bool_field(name: &str) -> FieldDecl {
        field(name, TypeRef::Primitive(PrimitiveKind::Boolean))
    }

    fn prefixed(prefixes: &[&str]) -> NamingPolicy {
        NamingPolicy {
            prefixes: prefixes.iter().map(|p| p.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_plain_getter() {
        let names = resolve(&int_field("count"), &NamingPolicy::default()).unwrap();
        assert_eq!(names.canonical, "getCount");
        assert_eq!(names.all, vec!["getCount"]);
    }

    #[test]
    fn test_boolean_getter() {
        let names = resolve(&bool_field("active"), &NamingPolicy::default()).unwrap();
        assert_eq!(names.canonical, "isActive");
        assert_eq!(names.all, vec!["isActive", "getActive"]);
    }

    #[test]
    fn test_boolean_already_is_prefixed() {
        let names = resolve(&bool_field("isFoo"), &NamingPolicy::default()).unwrap();
        assert_eq!(names.canonical, "isFoo");
        assert_eq!(names.all, vec!["isFoo", "getFoo", "isIsFoo", "getIsFoo"]);

        // `island` is not an is-prefixed name.
        let names = resolve(&bool_field("island"), &NamingPolicy::default()).unwrap();
        assert_eq!(names.all, vec!["isIsland", "getIsland"]);
    }

    #[test]
    fn test_boxed_boolean_uses_get() {
        let names = resolve(&field("active", TypeRef::named("Boolean")), &NamingPolicy::default()).unwrap();
        assert_eq!(names.canonical, "getActive");
    }

    #[test]
    fn test_prefix_stripping() {
        let policy = prefixed(&["f", "m_"]);
        assert_eq!(resolve(&int_field("fCount"), &policy).unwrap().canonical, "getCount");
        assert_eq!(resolve(&int_field("m_count"), &policy).unwrap().canonical, "getCount");
        assert_eq!(resolve(&int_field("m_Count"), &policy).unwrap().canonical, "getCount");
        assert_eq!(resolve(&bool_field("fActive"), &policy).unwrap().canonical, "isActive");
    }

    #[test]
    fn test_prefix_no_match() {
        let policy = prefixed(&["f"]);
        let err = resolve(&int_field("count"), &policy).unwrap_err();
        assert_eq!(err.field, "count");

        // Strict case rule: `fname` is a word, not `f` + `name`.
        assert!(resolve(&int_field("fname"), &policy).is_err());
        // Name equal to the prefix leaves nothing to name the accessor after.
        assert!(resolve(&int_field("f"), &policy).is_err());
    }

    #[test]
    fn test_relaxed_prefix() {
        let policy = NamingPolicy {
            prefixes: vec!["f".to_string()],
            case_rule: PrefixCase::Relaxed,
            fluent: false,
        };
        assert_eq!(resolve(&int_field("fname"), &policy).unwrap().canonical, "getName");
    }

    #[test]
    fn test_empty_prefix_matches_everything() {
        let policy = prefixed(&["f", ""]);
        assert_eq!(resolve(&int_field("count"), &policy).unwrap().canonical, "getCount");
        assert_eq!(resolve(&int_field("fCount"), &policy).unwrap().canonical, "getCount");
    }

    #[test]
    fn test_illegal_base() {
        let policy = prefixed(&["m_"]);
        assert!(resolve(&int_field("m_1st"), &policy).is_err());
    }

    #[test]
    fn test_fluent() {
        let policy = NamingPolicy {
            fluent: true,
            ..Default::default()
        };
        assert_eq!(resolve(&int_field("count"), &policy).unwrap().all, vec!["count"]);
        assert_eq!(resolve(&bool_field("isFoo"), &policy).unwrap().all, vec!["isFoo", "foo"]);
        assert_eq!(resolve(&bool_field("active"), &policy).unwrap().all, vec!["active"]);
    }

    #[test]
    fn test_non_ascii_names() {
        let names = resolve(&int_field("ärger"), &NamingPolicy::default()).unwrap();
        assert_eq!(names.canonical, "getÄrger");
    }
}
