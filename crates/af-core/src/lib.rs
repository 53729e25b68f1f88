//! # af-core
//!
//! Tree model shared by the accessor synthesizer and the runtime.
//!
//! - [`tree`]: arena of structures, fields and methods addressed by id
//! - [`ast`]: method-body statements and expressions with provenance markers
//! - [`types`]: declared types, modifiers, access levels
//! - [`diagnostics`]: warning/error sink
//! - [`property`] and [`invariants`]: checks that a synthesized tree is well formed

pub mod ast;
pub mod diagnostics;
pub mod invariants;
pub mod markers;
pub mod property;
pub mod tree;
pub mod types;

pub use ast::{BinOp, Block, Expr, ExprKind, Literal, Stmt};
pub use diagnostics::{Diagnostic, DiagnosticLog, Diagnostics, Severity};
pub use invariants::AccessorInvariants;
pub use property::{PropertyChecker, PropertyResult, PropertySummary};
pub use tree::{
    Annotation, AnnotationArg, FieldDecl, FieldId, Member, MethodDecl, MethodId, ModelError, Param,
    Structure, StructureId, StructureKind, Tree,
};
pub use types::{AccessLevel, Modifiers, PrimitiveKind, SourcePos, TypeRef};
