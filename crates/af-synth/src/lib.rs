//! # af-synth
//!
//! Synthesizes read accessors for fields of an [`af_core::Tree`].
//!
//! A request for one field flows through:
//!
//! 1. [`naming`]: derive the canonical accessor name and its alternatives
//! 2. [`conflict`]: stop if any of those names is already taken
//! 3. [`body`]: build a direct-read body, or a double-checked-locking lazy body
//! 4. [`assemble`]: attach modifiers and annotations, relocate delegate markers
//!
//! [`driver::Synthesizer`] ties the steps together and offers the single-field,
//! type-wide and marker-driven entry points.
//!
//! ```
//! use af_core::{AccessLevel, DiagnosticLog, FieldDecl, Modifiers, PrimitiveKind, SourcePos, StructureKind, Tree, TypeRef};
//! use af_synth::Synthesizer;
//!
//! let mut tree = Tree::new();
//! let point = tree.add_structure("Point", StructureKind::Class);
//! let x = tree
//!     .add_field(point, FieldDecl::new("x", TypeRef::Primitive(PrimitiveKind::Int), Modifiers::PRIVATE))
//!     .unwrap();
//!
//! let mut log = DiagnosticLog::new();
//! let outcome = Synthesizer::default().generate_for_field(
//!     &mut tree, x, AccessLevel::Public, false, SourcePos::new(1, 1), &mut log,
//! );
//! let id = outcome.method().unwrap();
//! assert_eq!(tree.method(id).unwrap().name, "getX");
//! ```

pub mod assemble;
pub mod body;
pub mod config;
pub mod conflict;
pub mod driver;
pub mod error;
pub mod model_file;
pub mod naming;
pub mod render;

pub use assemble::AccessorSpec;
pub use body::{AccessorMode, FieldRef};
pub use config::{NamingPolicy, PrefixCase, SynthConfig};
pub use conflict::Conflict;
pub use driver::{
    FieldOutcome, FieldReport, GetterRequest, RequestTarget, Suppressed, Synthesis, Synthesizer,
};
pub use error::{ConfigError, SynthError};
pub use model_file::{LoadedModel, ModelFile};
pub use naming::{AccessorNames, NoMatch};
