//! Well-known annotation and type names the engine recognizes.

use crate::types::TypeRef;

/// Getter marker: presence on a field or type means that node drives its own synthesis.
pub const GETTER: &str = "lombok.Getter";

/// Delegate markers, relocated from a field onto its generated accessor.
pub const DELEGATES: [&str; 2] = ["lombok.Delegate", "lombok.experimental.Delegate"];

pub const DEPRECATED: &str = "java.lang.Deprecated";

/// Simple names (case-insensitive) copied from a field onto its accessor.
pub const NON_NULL_SIMPLE: &str = "nonnull";
pub const NULLABLE_SIMPLE: &str = "nullable";

/// Storage type of a lazy field after rewriting.
pub const ATOMIC_REFERENCE: &str = "java.util.concurrent.atomic.AtomicReference";

pub const OBJECT: &str = "java.lang.Object";

/// Locals introduced by a lazy accessor body.
pub const LAZY_VALUE_LOCAL: &str = "value";
pub const LAZY_ACTUAL_LOCAL: &str = "actualValue";

/// Fields whose names start with this are engine-internal and never get accessors.
pub const INTERNAL_PREFIX: char = '$';

/// `AtomicReference<Object>`, the storage type of a rewritten lazy field.
#[must_use]
pub fn lazy_holder_type() -> TypeRef {
    TypeRef::generic(ATOMIC_REFERENCE, vec![TypeRef::object()])
}

/// True if `type_name` refers to `qualified`, either fully qualified or by simple name.
#[must_use]
pub fn type_matches(qualified: &str, type_name: &str) -> bool {
    if type_name == qualified {
        return true;
    }
    let simple = qualified.rsplit('.').next().unwrap_or(qualified);
    type_name == simple
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_matches() {
        assert!(type_matches(GETTER, "Getter"));
        assert!(type_matches(GETTER, "lombok.Getter"));
        assert!(!type_matches(GETTER, "other.Getter"));
        assert!(!type_matches(GETTER, "Setter"));
    }
}
