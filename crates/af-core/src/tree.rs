//! Arena-indexed declaration tree.
//!
//! Structures, fields and methods live in flat arenas and are addressed by
//! index. Replacing a node's contents through its id is how the synthesizer
//! "mutates in place": every other holder of the id sees the new contents.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ast::{Block, Expr};
use crate::markers;
use crate::types::{Modifiers, SourcePos, TypeRef};

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u32);

        impl $name {
            #[must_use]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

arena_id!(
    /// Index of a [`Structure`] in a [`Tree`].
    StructureId,
    "structure"
);
arena_id!(
    /// Index of a [`FieldDecl`] in a [`Tree`].
    FieldId,
    "field"
);
arena_id!(
    /// Index of a [`MethodDecl`] in a [`Tree`].
    MethodId,
    "method"
);

/// Errors from tree lookups.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("unknown structure {0}")]
    UnknownStructure(StructureId),

    #[error("unknown field {0}")]
    UnknownField(FieldId),

    #[error("unknown method {0}")]
    UnknownMethod(MethodId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureKind {
    Class,
    Enum,
    Interface,
    Annotation,
}

impl StructureKind {
    /// Classes and enums hold instance state; interfaces and annotation types do not.
    #[must_use]
    pub fn is_class_like(self) -> bool {
        matches!(self, StructureKind::Class | StructureKind::Enum)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationArg {
    pub name: String,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<AnnotationArg>,
}

impl Annotation {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            args: Vec::new(),
        }
    }

    #[must_use]
    pub fn simple_name(&self) -> &str {
        self.type_name.rsplit('.').next().unwrap_or(&self.type_name)
    }

    /// True if this annotation's type is `qualified`, written simple or qualified.
    #[must_use]
    pub fn is(&self, qualified: &str) -> bool {
        markers::type_matches(qualified, &self.type_name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub ty: TypeRef,
    #[serde(default)]
    pub varargs: bool,
}

/// A method declaration, either user-authored or synthesized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDecl {
    pub name: String,
    pub return_type: TypeRef,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub params: Vec<Param>,
    #[serde(default)]
    pub body: Option<Block>,
    /// Set when a synthesis pass produced this method.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_by: Option<SourcePos>,
    #[serde(default)]
    pub pos: Option<SourcePos>,
}

impl MethodDecl {
    /// Whether a call with `count` arguments could bind to this method.
    #[must_use]
    pub fn accepts_arity(&self, count: usize) -> bool {
        match self.params.last() {
            Some(last) if last.varargs => count + 1 >= self.params.len(),
            _ => self.params.len() == count,
        }
    }

    #[must_use]
    pub fn is_generated(&self) -> bool {
        self.generated_by.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    pub ty: TypeRef,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default)]
    pub init: Option<Expr>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    /// Deprecated through documentation rather than an annotation.
    #[serde(default)]
    pub deprecated_doc: bool,
    #[serde(default)]
    pub pos: Option<SourcePos>,
}

impl FieldDecl {
    pub fn new(name: impl Into<String>, ty: TypeRef, modifiers: Modifiers) -> Self {
        Self {
            name: name.into(),
            ty,
            modifiers,
            init: None,
            annotations: Vec::new(),
            deprecated_doc: false,
            pos: None,
        }
    }

    #[must_use]
    pub fn with_init(mut self, init: Expr) -> Self {
        self.init = Some(init);
        self
    }

    #[must_use]
    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    #[must_use]
    pub fn at(mut self, pos: SourcePos) -> Self {
        self.pos = Some(pos);
        self
    }

    #[must_use]
    pub fn has_annotation(&self, qualified: &str) -> bool {
        self.annotations.iter().any(|a| a.is(qualified))
    }

    #[must_use]
    pub fn is_deprecated(&self) -> bool {
        self.deprecated_doc || self.has_annotation(markers::DEPRECATED)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Member {
    Field(FieldId),
    Method(MethodId),
    /// Member the engine does not inspect (nested type, initializer block, ...).
    Other(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Structure {
    pub name: String,
    pub kind: StructureKind,
    pub annotations: Vec<Annotation>,
    pub members: Vec<Member>,
    pub pos: Option<SourcePos>,
}

impl Structure {
    #[must_use]
    pub fn has_annotation(&self, qualified: &str) -> bool {
        self.annotations.iter().any(|a| a.is(qualified))
    }
}

/// The declaration tree handed to the synthesizer.
#[derive(Debug, Clone, Default)]
pub struct Tree {
    structures: Vec<Structure>,
    fields: Vec<FieldDecl>,
    field_owners: Vec<StructureId>,
    methods: Vec<MethodDecl>,
}

impl Tree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_structure(&mut self, name: impl Into<String>, kind: StructureKind) -> StructureId {
        let id = StructureId(self.structures.len() as u32);
        self.structures.push(Structure {
            name: name.into(),
            kind,
            annotations: Vec::new(),
            members: Vec::new(),
            pos: None,
        });
        id
    }

    /// Append a field member to `owner`.
    pub fn add_field(&mut self, owner: StructureId, field: FieldDecl) -> Result<FieldId, ModelError> {
        let id = FieldId(self.fields.len() as u32);
        self.structure_mut(owner)?.members.push(Member::Field(id));
        self.fields.push(field);
        self.field_owners.push(owner);
        debug_assert_eq!(self.fields.len(), self.field_owners.len());
        Ok(id)
    }

    /// Append a method member to `owner`. This is how synthesized accessors are injected.
    pub fn add_method(&mut self, owner: StructureId, method: MethodDecl) -> Result<MethodId, ModelError> {
        let id = MethodId(self.methods.len() as u32);
        self.structure_mut(owner)?.members.push(Member::Method(id));
        self.methods.push(method);
        Ok(id)
    }

    pub fn add_other(&mut self, owner: StructureId, description: impl Into<String>) -> Result<(), ModelError> {
        self.structure_mut(owner)?
            .members
            .push(Member::Other(description.into()));
        Ok(())
    }

    pub fn structure(&self, id: StructureId) -> Result<&Structure, ModelError> {
        self.structures
            .get(id.index())
            .ok_or(ModelError::UnknownStructure(id))
    }

    pub fn structure_mut(&mut self, id: StructureId) -> Result<&mut Structure, ModelError> {
        self.structures
            .get_mut(id.index())
            .ok_or(ModelError::UnknownStructure(id))
    }

    pub fn field(&self, id: FieldId) -> Result<&FieldDecl, ModelError> {
        self.fields.get(id.index()).ok_or(ModelError::UnknownField(id))
    }

    pub fn field_mut(&mut self, id: FieldId) -> Result<&mut FieldDecl, ModelError> {
        self.fields
            .get_mut(id.index())
            .ok_or(ModelError::UnknownField(id))
    }

    pub fn method(&self, id: MethodId) -> Result<&MethodDecl, ModelError> {
        self.methods
            .get(id.index())
            .ok_or(ModelError::UnknownMethod(id))
    }

    pub fn owner_of(&self, field: FieldId) -> Result<StructureId, ModelError> {
        self.field_owners
            .get(field.index())
            .copied()
            .ok_or(ModelError::UnknownField(field))
    }

    /// All structure ids in insertion order.
    pub fn structure_ids(&self) -> impl Iterator<Item = StructureId> + '_ {
        (0..self.structures.len()).map(|i| StructureId(i as u32))
    }

    /// Field members of a structure, in declaration order.
    pub fn fields_of(&self, owner: StructureId) -> Result<Vec<FieldId>, ModelError> {
        Ok(self
            .structure(owner)?
            .members
            .iter()
            .filter_map(|m| match m {
                Member::Field(id) => Some(*id),
                _ => None,
            })
            .collect())
    }

    /// Method members of a structure, in declaration order.
    pub fn methods_of(&self, owner: StructureId) -> Result<Vec<(MethodId, &MethodDecl)>, ModelError> {
        let structure = self.structure(owner)?;
        structure
            .members
            .iter()
            .filter_map(|m| match m {
                Member::Method(id) => Some(*id),
                _ => None,
            })
            .map(|id| self.method(id).map(|method| (id, method)))
            .collect()
    }

    /// Find a field of `owner` by name.
    pub fn find_field(&self, owner: StructureId, name: &str) -> Result<Option<FieldId>, ModelError> {
        Ok(self
            .fields_of(owner)?
            .into_iter()
            .find(|id| self.fields.get(id.index()).is_some_and(|f| f.name == name)))
    }

    /// Find a method of `owner` by exact name and arity.
    pub fn find_method(
        &self,
        owner: StructureId,
        name: &str,
        arity: usize,
    ) -> Result<Option<&MethodDecl>, ModelError> {
        Ok(self
            .methods_of(owner)?
            .into_iter()
            .map(|(_, method)| method)
            .find(|method| method.name == name && method.accepts_arity(arity)))
    }

    /// Replace a field's declared type and initializer, returning the old initializer.
    pub fn replace_field_storage(
        &mut self,
        id: FieldId,
        ty: TypeRef,
        init: Option<Expr>,
    ) -> Result<Option<Expr>, ModelError> {
        let field = self.field_mut(id)?;
        field.ty = ty;
        Ok(std::mem::replace(&mut field.init, init))
    }

    /// Remove every annotation matching `predicate` from a field, preserving the others' order.
    ///
    /// The field is left untouched when nothing matches.
    pub fn remove_field_annotations(
        &mut self,
        id: FieldId,
        predicate: impl Fn(&Annotation) -> bool,
    ) -> Result<Vec<Annotation>, ModelError> {
        let field = self.field_mut(id)?;
        if !field.annotations.iter().any(&predicate) {
            return Ok(Vec::new());
        }
        let (removed, kept): (Vec<_>, Vec<_>) =
            field.annotations.drain(..).partition(|a| predicate(a));
        field.annotations = kept;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PrimitiveKind;

    fn int() -> TypeRef {
        TypeRef::Primitive(PrimitiveKind::Int)
    }

    #[test]
    fn test_members_keep_declaration_order() {
        let mut tree = Tree::new();
        let point = tree.add_structure("Point", StructureKind::Class);
        let x = tree.add_field(point, FieldDecl::new("x", int(), Modifiers::PRIVATE)).unwrap();
        tree.add_other(point, "static initializer").unwrap();
        let y = tree.add_field(point, FieldDecl::new("y", int(), Modifiers::PRIVATE)).unwrap();

        assert_eq!(tree.fields_of(point).unwrap(), vec![x, y]);
        assert_eq!(tree.owner_of(y).unwrap(), point);
        assert_eq!(tree.find_field(point, "y").unwrap(), Some(y));
        assert_eq!(tree.find_field(point, "z").unwrap(), None);
    }

    #[test]
    fn test_unknown_ids() {
        let tree = Tree::new();
        assert_eq!(
            tree.structure(StructureId(3)).unwrap_err(),
            ModelError::UnknownStructure(StructureId(3))
        );
        assert!(tree.field(FieldId(0)).is_err());
    }

    #[test]
    fn test_accepts_arity() {
        let mut method = MethodDecl {
            name: "get".to_string(),
            return_type: int(),
            modifiers: Modifiers::PUBLIC,
            annotations: Vec::new(),
            params: Vec::new(),
            body: None,
            generated_by: None,
            pos: None,
        };
        assert!(method.accepts_arity(0));
        assert!(!method.accepts_arity(1));

        method.params.push(Param {
            name: "rest".to_string(),
            ty: TypeRef::Array(Box::new(int())),
            varargs: true,
        });
        assert!(method.accepts_arity(0));
        assert!(method.accepts_arity(4));
    }

    #[test]
    fn test_remove_field_annotations() {
        let mut tree = Tree::new();
        let owner = tree.add_structure("Holder", StructureKind::Class);
        let field = FieldDecl::new("inner", TypeRef::named("Runnable"), Modifiers::PRIVATE)
            .with_annotation(Annotation::new("Delegate"))
            .with_annotation(Annotation::new("Nullable"));
        let id = tree.add_field(owner, field).unwrap();

        let removed = tree
            .remove_field_annotations(id, |a| a.is(markers::DELEGATES[0]))
            .unwrap();
        assert_eq!(removed, vec![Annotation::new("Delegate")]);
        assert_eq!(tree.field(id).unwrap().annotations, vec![Annotation::new("Nullable")]);

        let removed = tree
            .remove_field_annotations(id, |a| a.is(markers::DELEGATES[0]))
            .unwrap();
        assert!(removed.is_empty());
    }

    #[test]
    fn test_replace_field_storage() {
        let mut tree = Tree::new();
        let owner = tree.add_structure("Lazy", StructureKind::Class);
        let id = tree
            .add_field(
                owner,
                FieldDecl::new("x", int(), Modifiers::PRIVATE | Modifiers::FINAL)
                    .with_init(Expr::invoke("compute", vec![])),
            )
            .unwrap();

        let old = tree.replace_field_storage(id, TypeRef::object(), None).unwrap();
        assert_eq!(old, Some(Expr::invoke("compute", vec![])));
        assert_eq!(tree.field(id).unwrap().ty, TypeRef::object());
        assert!(tree.field(id).unwrap().init.is_none());
    }
}
