//! Error types for synthesis and configuration loading.

use std::path::PathBuf;

use af_core::ModelError;
use thiserror::Error;

/// Errors that abort synthesis for one field or one structure.
///
/// The display strings are the messages reported through the diagnostics sink.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SynthError {
    #[error("'lazy' requires the field to be private and final.")]
    LazyRequiresPrivateFinal,

    #[error("'lazy' requires field initialization.")]
    LazyRequiresInitializer,

    #[error("@Getter is only supported on a class, an enum, or a field.")]
    NotAClass,

    #[error("'onMethod' is not supported for @Getter on a type.")]
    OnMethodOnType,

    #[error("'lazy' is not supported for @Getter on a type.")]
    LazyOnType,

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Errors loading configuration or model files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown structure '{0}'")]
    UnknownStructure(String),

    #[error("structure '{structure}' has no field '{field}'")]
    UnknownField { structure: String, field: String },

    #[error(transparent)]
    Model(#[from] ModelError),
}
