//! Runtime values.

use std::fmt;

use af_core::PrimitiveKind;

/// Index of an object on the [`crate::Heap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjId(pub(crate) u32);

impl ObjId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ObjId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "obj#{}", self.0)
    }
}

/// A primitive, `null`, or a reference to a heap object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Char(char),
    Float(f32),
    Double(f64),
    Ref(ObjId),
}

impl Value {
    /// Primitive kind, or `None` for `null` and references.
    #[must_use]
    pub fn primitive_kind(self) -> Option<PrimitiveKind> {
        match self {
            Value::Bool(_) => Some(PrimitiveKind::Boolean),
            Value::Byte(_) => Some(PrimitiveKind::Byte),
            Value::Short(_) => Some(PrimitiveKind::Short),
            Value::Int(_) => Some(PrimitiveKind::Int),
            Value::Long(_) => Some(PrimitiveKind::Long),
            Value::Char(_) => Some(PrimitiveKind::Char),
            Value::Float(_) => Some(PrimitiveKind::Float),
            Value::Double(_) => Some(PrimitiveKind::Double),
            Value::Null | Value::Ref(_) => None,
        }
    }

    /// Zero value a field of `kind` holds before initialization.
    #[must_use]
    pub fn default_of(kind: Option<PrimitiveKind>) -> Value {
        match kind {
            Some(PrimitiveKind::Boolean) => Value::Bool(false),
            Some(PrimitiveKind::Byte) => Value::Byte(0),
            Some(PrimitiveKind::Short) => Value::Short(0),
            Some(PrimitiveKind::Int) => Value::Int(0),
            Some(PrimitiveKind::Long) => Value::Long(0),
            Some(PrimitiveKind::Char) => Value::Char('\0'),
            Some(PrimitiveKind::Float) => Value::Float(0.0),
            Some(PrimitiveKind::Double) => Value::Double(0.0),
            None => Value::Null,
        }
    }

    #[must_use]
    pub fn as_obj(self) -> Option<ObjId> {
        match self {
            Value::Ref(id) => Some(id),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_null(self) -> bool {
        self == Value::Null
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Byte(v) => write!(f, "{}", v),
            Value::Short(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::Long(v) => write!(f, "{}L", v),
            Value::Char(c) => write!(f, "'{}'", c),
            Value::Float(v) => write!(f, "{}f", v),
            Value::Double(v) => write!(f, "{}", v),
            Value::Ref(id) => write!(f, "{}", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_kind() {
        for kind in [
            PrimitiveKind::Boolean,
            PrimitiveKind::Byte,
            PrimitiveKind::Short,
            PrimitiveKind::Int,
            PrimitiveKind::Long,
            PrimitiveKind::Char,
            PrimitiveKind::Float,
            PrimitiveKind::Double,
        ] {
            assert_eq!(Value::default_of(Some(kind)).primitive_kind(), Some(kind));
        }
        assert!(Value::default_of(None).is_null());
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Ref(ObjId(4)).to_string(), "obj#4");
        assert_eq!(Value::Long(2).to_string(), "2L");
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(Value::Ref(ObjId(4)).as_obj(), Some(ObjId(4)));
        assert_eq!(Value::Int(4).as_obj(), None);
    }
}
