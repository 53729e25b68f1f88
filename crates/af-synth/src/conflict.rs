//! Detection of methods that already occupy an accessor's name.

use af_core::{ModelError, StructureId, Tree};

use crate::naming::AccessorNames;

/// Outcome of scanning a structure for existing accessors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conflict {
    None,
    /// A previous synthesis pass already produced a method for this candidate name.
    Synthesized(String),
    /// A user-written method occupies this candidate name.
    UserDefined(String),
}

impl Conflict {
    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, Conflict::None)
    }
}

/// Look for a zero-argument-callable method whose name matches any candidate, ignoring case.
///
/// Candidates are tried in order and the first hit wins, so the canonical name is
/// reported whenever it is the one taken.
pub fn scan(tree: &Tree, owner: StructureId, names: &AccessorNames) -> Result<Conflict, ModelError> {
    let methods = tree.methods_of(owner)?;

    for candidate in &names.all {
        let lowered = candidate.to_lowercase();
        let hit = methods
            .iter()
            .map(|(_, method)| method)
            .find(|method| method.name.to_lowercase() == lowered && method.accepts_arity(0));

        if let Some(method) = hit {
            return Ok(if method.is_generated() {
                Conflict::Synthesized(candidate.clone())
            } else {
                Conflict::UserDefined(candidate.clone())
            });
        }
    }

    Ok(Conflict::None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use af_core::{MethodDecl, Modifiers, Param, PrimitiveKind, SourcePos, StructureKind, TypeRef};

    fn method(name: &str, params: Vec<Param>, generated: bool) -> MethodDecl {
        MethodDecl {
            name: name.to_string(),
            return_type: TypeRef::Primitive(PrimitiveKind::Boolean),
            modifiers: Modifiers::PUBLIC,
            annotations: Vec::new(),
            params,
            body: None,
            generated_by: generated.then_some(SourcePos::new(2, 5)),
            pos: None,
        }
    }

    fn names(all: &[&str]) -> AccessorNames {
        AccessorNames {
            canonical: all[0].to_string(),
            all: all.iter().map(|n| n.to_string()).collect(),
        }
    }

    #[test]
    fn test_no_methods() {
        let mut tree = Tree::new();
        let s = tree.add_structure("Flag", StructureKind::Class);
        assert!(scan(&tree, s, &names(&["isActive", "getActive"])).unwrap().is_none());
    }

    #[test]
    fn test_user_defined_alternative_name() {
        let mut tree = Tree::new();
        let s = tree.add_structure("Flag", StructureKind::Class);
        tree.add_method(s, method("getActive", vec![], false)).unwrap();

        let conflict = scan(&tree, s, &names(&["isActive", "getActive"])).unwrap();
        assert_eq!(conflict, Conflict::UserDefined("getActive".to_string()));
    }

    #[test]
    fn test_case_insensitive_and_prior_synthesis() {
        let mut tree = Tree::new();
        let s = tree.add_structure("Flag", StructureKind::Class);
        tree.add_method(s, method("ISACTIVE", vec![], true)).unwrap();

        let conflict = scan(&tree, s, &names(&["isActive"])).unwrap();
        assert_eq!(conflict, Conflict::Synthesized("isActive".to_string()));
    }

    #[test]
    fn test_arity_filters_overloads() {
        let mut tree = Tree::new();
        let s = tree.add_structure("Flag", StructureKind::Class);
        let int_param = |varargs| Param {
            name: "x".to_string(),
            ty: TypeRef::Primitive(PrimitiveKind::Int),
            varargs,
        };
        tree.add_method(s, method("isActive", vec![int_param(false)], false))
            .unwrap();
        assert!(scan(&tree, s, &names(&["isActive"])).unwrap().is_none());

        tree.add_method(s, method("isActive", vec![int_param(true)], false))
            .unwrap();
        assert_eq!(
            scan(&tree, s, &names(&["isActive"])).unwrap(),
            Conflict::UserDefined("isActive".to_string())
        );
    }

    #[test]
    fn test_canonical_wins_over_later_candidates() {
        let mut tree = Tree::new();
        let s = tree.add_structure("Flag", StructureKind::Class);
        tree.add_method(s, method("getActive", vec![], false)).unwrap();
        tree.add_method(s, method("isActive", vec![], false)).unwrap();

        let conflict = scan(&tree, s, &names(&["isActive", "getActive"])).unwrap();
        assert_eq!(conflict, Conflict::UserDefined("isActive".to_string()));
    }
}
