use af_core::ModelError;
use thiserror::Error;

use crate::value::ObjId;

/// Errors raised while executing method bodies.
///
/// An error escaping a lazy initializer propagates out of the accessor; the
/// holder is left empty and the next call evaluates the initializer again.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecError {
    #[error("unknown local '{0}'")]
    UnknownLocal(String),

    #[error("unknown field '{0}'")]
    UnknownField(String),

    #[error("unknown type '{0}'")]
    UnknownType(String),

    #[error("no method '{name}' taking {arity} arguments")]
    UnknownMethod { name: String, arity: usize },

    #[error("method '{0}' has no body")]
    NoBody(String),

    #[error("cannot instantiate '{0}'")]
    NotInstantiable(String),

    #[error("null dereference: {0}")]
    NullPointer(String),

    #[error("cannot cast {found} to {expected}")]
    ClassCast { expected: String, found: String },

    #[error("expected an object reference, found {0}")]
    NotAnObject(String),

    #[error("condition did not evaluate to a boolean")]
    NotABoolean,

    #[error("dangling reference {0}")]
    DanglingRef(ObjId),

    #[error("lock poisoned")]
    Poisoned,

    #[error("host call '{method}' failed: {message}")]
    Host { method: String, message: String },

    #[error(transparent)]
    Model(#[from] ModelError),
}
