//! JSON model files: a declaration tree plus the getter requests to run on it.
//!
//! ```json
//! {
//!   "structures": [
//!     { "name": "Cache", "kind": "class", "members": [
//!         { "field": { "name": "x", "ty": { "primitive": "int" },
//!                      "modifiers": ["private", "final"],
//!                      "init": { "kind": { "call": { "method": "compute" } } } } }
//!     ] }
//!   ],
//!   "requests": [
//!     { "kind": "field", "structure": "Cache", "fields": ["x"], "lazy": true,
//!       "pos": { "line": 3, "column": 5 } }
//!   ]
//! }
//! ```

use std::path::Path;

use af_core::{AccessLevel, Annotation, FieldDecl, MethodDecl, SourcePos, StructureId, StructureKind, Tree};
use serde::{Deserialize, Serialize};

use crate::driver::{GetterRequest, RequestTarget};
use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelFile {
    pub structures: Vec<StructureSpec>,
    #[serde(default)]
    pub requests: Vec<RequestSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureSpec {
    pub name: String,
    pub kind: StructureKind,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub members: Vec<MemberSpec>,
    #[serde(default)]
    pub pos: Option<SourcePos>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberSpec {
    Field(FieldDecl),
    Method(MethodDecl),
    Other(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    Field,
    Type,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestSpec {
    pub kind: RequestKind,
    pub structure: String,
    /// Field names for `field` requests.
    #[serde(default)]
    pub fields: Vec<String>,
    /// Falls back to the configured default level.
    #[serde(default)]
    pub level: Option<AccessLevel>,
    #[serde(default)]
    pub lazy: bool,
    #[serde(default)]
    pub on_method: Vec<Annotation>,
    pub pos: SourcePos,
}

/// A model file resolved into a tree and id-based requests.
#[derive(Debug, Clone)]
pub struct LoadedModel {
    pub tree: Tree,
    /// Structures in file order.
    pub structures: Vec<StructureId>,
    pub requests: Vec<GetterRequest>,
}

impl ModelFile {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Build the tree and resolve request names to ids.
    pub fn into_model(self, default_level: AccessLevel) -> Result<LoadedModel, ConfigError> {
        let mut tree = Tree::new();
        let mut structures = Vec::with_capacity(self.structures.len());

        for spec in self.structures {
            let id = tree.add_structure(spec.name, spec.kind);
            {
                let structure = tree.structure_mut(id)?;
                structure.annotations = spec.annotations;
                structure.pos = spec.pos;
            }
            for member in spec.members {
                match member {
                    MemberSpec::Field(field) => {
                        tree.add_field(id, field)?;
                    }
                    MemberSpec::Method(method) => {
                        tree.add_method(id, method)?;
                    }
                    MemberSpec::Other(description) => tree.add_other(id, description)?,
                }
            }
            structures.push(id);
        }

        let mut requests = Vec::with_capacity(self.requests.len());
        for spec in self.requests {
            let structure = structures
                .iter()
                .copied()
                .find(|id| tree.structure(*id).is_ok_and(|s| s.name == spec.structure))
                .ok_or_else(|| ConfigError::UnknownStructure(spec.structure.clone()))?;

            let target = match spec.kind {
                RequestKind::Type => RequestTarget::Type(structure),
                RequestKind::Field => {
                    let mut fields = Vec::with_capacity(spec.fields.len());
                    for name in &spec.fields {
                        let field = tree.find_field(structure, name)?.ok_or_else(|| {
                            ConfigError::UnknownField {
                                structure: spec.structure.clone(),
                                field: name.clone(),
                            }
                        })?;
                        fields.push(field);
                    }
                    RequestTarget::Fields(fields)
                }
            };

            requests.push(GetterRequest {
                target,
                level: spec.level.unwrap_or(default_level),
                lazy: spec.lazy,
                on_method: spec.on_method,
                source: spec.pos,
            });
        }

        Ok(LoadedModel {
            tree,
            structures,
            requests,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use af_core::{Expr, Modifiers, PrimitiveKind, TypeRef};
    use std::io::Write;

    const MODEL: &str = r#"{
        "structures": [
            {
                "name": "Cache",
                "kind": "class",
                "members": [
                    { "field": {
                        "name": "x",
                        "ty": { "primitive": "int" },
                        "modifiers": ["private", "final"],
                        "init": { "kind": { "call": { "method": "compute" } } }
                    } },
                    { "other": "static initializer" },
                    { "method": {
                        "name": "compute",
                        "return_type": { "primitive": "int" },
                        "modifiers": ["private"]
                    } }
                ]
            }
        ],
        "requests": [
            { "kind": "field", "structure": "Cache", "fields": ["x"], "lazy": true,
              "pos": { "line": 3, "column": 5 } },
            { "kind": "type", "structure": "Cache", "level": "PROTECTED",
              "pos": { "line": 1, "column": 1 } }
        ]
    }"#;

    #[test]
    fn test_load_model() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MODEL.as_bytes()).unwrap();

        let model = ModelFile::load(file.path())
            .unwrap()
            .into_model(AccessLevel::Public)
            .unwrap();
        let cache = model.structures[0];

        let x = model.tree.find_field(cache, "x").unwrap().unwrap();
        let field = model.tree.field(x).unwrap();
        assert_eq!(field.ty, TypeRef::Primitive(PrimitiveKind::Int));
        assert_eq!(field.modifiers, Modifiers::PRIVATE | Modifiers::FINAL);
        assert_eq!(field.init, Some(Expr::invoke("compute", vec![])));
        assert_eq!(model.tree.structure(cache).unwrap().members.len(), 3);

        assert_eq!(model.requests.len(), 2);
        assert_eq!(model.requests[0].target, RequestTarget::Fields(vec![x]));
        assert_eq!(model.requests[0].level, AccessLevel::Public);
        assert!(model.requests[0].lazy);
        assert_eq!(model.requests[1].target, RequestTarget::Type(cache));
        assert_eq!(model.requests[1].level, AccessLevel::Protected);
    }

    #[test]
    fn test_unknown_names() {
        let json = r#"{"structures": [], "requests": [
            {"kind": "type", "structure": "Missing", "pos": {"line": 1, "column": 1}}
        ]}"#;
        let err = ModelFile::from_json_str(json)
            .unwrap()
            .into_model(AccessLevel::Public)
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownStructure(name) if name == "Missing"));

        let json = r#"{"structures": [{"name": "A", "kind": "class"}], "requests": [
            {"kind": "field", "structure": "A", "fields": ["nope"], "pos": {"line": 1, "column": 1}}
        ]}"#;
        let err = ModelFile::from_json_str(json)
            .unwrap()
            .into_model(AccessLevel::Public)
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownField { .. }));
    }
}
