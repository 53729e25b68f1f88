//! Synthesis entry points.
//!
//! [`Synthesizer::synthesize`] runs one field through naming, conflict
//! detection and assembly and hands back the method without touching the
//! structure's member list. The `generate_*` entry points and
//! [`Synthesizer::handle`] also inject the result and report problems through
//! a [`Diagnostics`] sink; a failing field never stops its siblings.

use af_core::markers::{self, INTERNAL_PREFIX};
use af_core::{
    AccessLevel, Annotation, Diagnostics, FieldDecl, FieldId, MethodDecl, MethodId, ModelError, SourcePos,
    StructureId, Tree,
};
use tracing::{debug, warn};

use crate::assemble::{assemble, AccessorSpec};
use crate::body::{select_mode, AccessorMode};
use crate::config::SynthConfig;
use crate::conflict::{scan, Conflict};
use crate::error::SynthError;
use crate::naming::resolve;

/// Why no accessor was generated for a field. Not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Suppressed {
    /// The requested level was `NONE`.
    AccessLevelNone,
    /// An earlier pass already synthesized this accessor.
    AlreadyGenerated(String),
    /// A user-written method occupies this name.
    UserDefined(String),
    /// The field name does not fit the prefix list.
    NoValidName,
    /// The field has its own getter marker, which will drive its synthesis.
    FieldAnnotated,
}

/// Result of [`Synthesizer::synthesize`].
#[derive(Debug, Clone, PartialEq)]
pub enum Synthesis {
    Method(MethodDecl),
    Suppressed(Suppressed),
}

/// What happened to one field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldOutcome {
    Generated(MethodId),
    Suppressed(Suppressed),
    Failed(SynthError),
}

impl FieldOutcome {
    #[must_use]
    pub fn method(&self) -> Option<MethodId> {
        match self {
            FieldOutcome::Generated(id) => Some(*id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldReport {
    pub field: FieldId,
    pub outcome: FieldOutcome,
}

/// What a getter marker was placed on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestTarget {
    /// One field declaration; several fields when they share a declaration.
    Fields(Vec<FieldId>),
    Type(StructureId),
}

/// A getter marker found in the tree, with its arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct GetterRequest {
    pub target: RequestTarget,
    pub level: AccessLevel,
    pub lazy: bool,
    pub on_method: Vec<Annotation>,
    pub source: SourcePos,
}

/// Accessor synthesizer.
#[derive(Debug, Clone, Default)]
pub struct Synthesizer {
    config: SynthConfig,
}

impl Synthesizer {
    #[must_use]
    pub fn new(config: SynthConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &SynthConfig {
        &self.config
    }

    /// Synthesize the accessor described by `spec` without injecting it.
    ///
    /// Lazy mode still rewrites the field's storage, since the returned body
    /// depends on it. Warnings for suppressed fields go to `diagnostics`;
    /// errors are returned, not reported.
    pub fn synthesize(
        &self,
        tree: &mut Tree,
        spec: &AccessorSpec,
        diagnostics: &mut dyn Diagnostics,
    ) -> Result<Synthesis, SynthError> {
        let pos = Some(spec.source);
        let lazy = spec.mode == AccessorMode::Lazy;

        if spec.level.is_none() {
            if lazy {
                diagnostics.add_warning(pos, "'lazy' does not work with AccessLevel.NONE.".to_string());
            }
            return Ok(Synthesis::Suppressed(Suppressed::AccessLevelNone));
        }

        let field = tree.field(spec.field)?;
        if holds_lazy_storage(field) {
            let owner = tree.owner_of(spec.field)?;
            let name = lazy_accessor_of(tree, owner, &field.name)?.unwrap_or_else(|| field.name.clone());
            debug!(field = %field.name, method = %name, "field storage already rewritten");
            return Ok(Synthesis::Suppressed(Suppressed::AlreadyGenerated(name)));
        }
        let mode = select_mode(field, lazy)?;

        let names = match resolve(field, &self.config.naming) {
            Ok(names) => names,
            Err(no_match) => {
                warn!(field = %no_match.field, "field does not fit the prefix list");
                diagnostics.add_warning(
                    pos,
                    "Not generating getter for this field: It does not fit your prefix list.".to_string(),
                );
                return Ok(Synthesis::Suppressed(Suppressed::NoValidName));
            }
        };

        let owner = tree.owner_of(spec.field)?;
        match scan(tree, owner, &names)? {
            Conflict::None => {}
            Conflict::Synthesized(name) => {
                debug!(method = %name, "accessor already synthesized");
                return Ok(Synthesis::Suppressed(Suppressed::AlreadyGenerated(name)));
            }
            Conflict::UserDefined(name) => {
                if spec.whine_if_exists {
                    warn!(field = %spec.field, method = %name, "user-defined method occupies accessor name");
                    let alt = if name == names.canonical {
                        String::new()
                    } else {
                        format!(" ({})", name)
                    };
                    diagnostics.add_warning(
                        pos,
                        format!(
                            "Not generating {}(): A method with that name already exists{}",
                            names.canonical, alt
                        ),
                    );
                }
                debug!(method = %name, "user-defined method occupies accessor name");
                return Ok(Synthesis::Suppressed(Suppressed::UserDefined(name)));
            }
        }

        let method = assemble(tree, spec, mode, &names.canonical)?;
        Ok(Synthesis::Method(method))
    }

    /// Synthesize and inject; errors are reported at the request position.
    pub fn generate(
        &self,
        tree: &mut Tree,
        spec: &AccessorSpec,
        diagnostics: &mut dyn Diagnostics,
    ) -> FieldOutcome {
        match self.synthesize(tree, spec, diagnostics).and_then(|synthesis| match synthesis {
            Synthesis::Method(method) => {
                let owner = tree.owner_of(spec.field)?;
                let name = method.name.clone();
                let id = tree.add_method(owner, method)?;
                debug!(method = %name, field = %spec.field, "generated accessor");
                Ok(FieldOutcome::Generated(id))
            }
            Synthesis::Suppressed(reason) => Ok(FieldOutcome::Suppressed(reason)),
        }) {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(field = %spec.field, error = %err, "accessor synthesis failed");
                diagnostics.add_error(Some(spec.source), err.to_string());
                FieldOutcome::Failed(err)
            }
        }
    }

    /// Single-field entry point for collaborators that imply accessors on every field.
    ///
    /// Skips fields carrying their own getter marker and never warns about
    /// user-written methods.
    pub fn generate_for_field(
        &self,
        tree: &mut Tree,
        field: FieldId,
        level: AccessLevel,
        lazy: bool,
        source: SourcePos,
        diagnostics: &mut dyn Diagnostics,
    ) -> FieldOutcome {
        match tree.field(field) {
            Ok(decl) if decl.has_annotation(markers::GETTER) => {
                return FieldOutcome::Suppressed(Suppressed::FieldAnnotated)
            }
            Ok(_) => {}
            Err(err) => {
                let err = SynthError::from(err);
                diagnostics.add_error(Some(source), err.to_string());
                return FieldOutcome::Failed(err);
            }
        }

        let mut spec = AccessorSpec::new(field, level, source);
        if lazy {
            spec = spec.lazy();
        }
        self.generate(tree, &spec, diagnostics)
    }

    /// Generate accessors for every eligible field of `structure`.
    ///
    /// With `check_type_level`, a structure carrying its own getter marker is left
    /// to that marker and nothing is generated.
    pub fn generate_for_type(
        &self,
        tree: &mut Tree,
        structure: StructureId,
        level: AccessLevel,
        check_type_level: bool,
        source: SourcePos,
        diagnostics: &mut dyn Diagnostics,
    ) -> Result<Vec<FieldReport>, SynthError> {
        let decl = tree.structure(structure)?;
        if check_type_level && decl.has_annotation(markers::GETTER) {
            debug!(structure = %decl.name, "structure has its own getter marker");
            return Ok(Vec::new());
        }
        if !decl.kind.is_class_like() {
            let err = SynthError::NotAClass;
            diagnostics.add_error(Some(source), err.to_string());
            return Err(err);
        }

        let mut reports = Vec::new();
        for field in tree.fields_of(structure)? {
            if !self.is_eligible(tree, field)? {
                continue;
            }
            let outcome = self.generate_for_field(tree, field, level, false, source, diagnostics);
            reports.push(FieldReport { field, outcome });
        }
        Ok(reports)
    }

    /// Field-level eligibility for type-wide generation: not engine-internal, not static.
    pub fn is_eligible(&self, tree: &Tree, field: FieldId) -> Result<bool, SynthError> {
        let decl = tree.field(field)?;
        Ok(!decl.name.starts_with(INTERNAL_PREFIX) && !decl.modifiers.is_static())
    }

    /// Process a getter marker placed on a field declaration or a type.
    pub fn handle(
        &self,
        tree: &mut Tree,
        request: &GetterRequest,
        diagnostics: &mut dyn Diagnostics,
    ) -> Result<Vec<FieldReport>, SynthError> {
        let pos = Some(request.source);

        if request.level.is_none() {
            if request.lazy {
                diagnostics.add_warning(pos, "'lazy' does not work with AccessLevel.NONE.".to_string());
            }
            return Ok(Vec::new());
        }

        match &request.target {
            RequestTarget::Fields(fields) => Ok(fields
                .iter()
                .map(|&field| {
                    let mut spec = AccessorSpec::new(field, request.level, request.source)
                        .on_method(request.on_method.clone())
                        .whine_if_exists(true);
                    if request.lazy {
                        spec = spec.lazy();
                    }
                    FieldReport {
                        field,
                        outcome: self.generate(tree, &spec, diagnostics),
                    }
                })
                .collect()),
            RequestTarget::Type(structure) => {
                if !request.on_method.is_empty() {
                    diagnostics.add_error(pos, SynthError::OnMethodOnType.to_string());
                }
                if request.lazy {
                    diagnostics.add_error(pos, SynthError::LazyOnType.to_string());
                }
                self.generate_for_type(tree, *structure, request.level, false, request.source, diagnostics)
            }
        }
    }
}

/// A previous lazy pass replaced this field's storage with a holder it created.
fn holds_lazy_storage(field: &FieldDecl) -> bool {
    field.ty == markers::lazy_holder_type()
        && field.init.as_ref().is_some_and(|init| init.generated_by.is_some())
}

/// Name of the synthesized method that locks on `field`.
fn lazy_accessor_of(tree: &Tree, owner: StructureId, field: &str) -> Result<Option<String>, ModelError> {
    Ok(tree
        .methods_of(owner)?
        .into_iter()
        .map(|(_, method)| method)
        .find(|method| {
            method.is_generated()
                && method
                    .body
                    .as_ref()
                    .is_some_and(|body| body.synchronized_field() == Some(field))
        })
        .map(|method| method.name.clone()))
}
