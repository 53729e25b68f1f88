//! Declared types, modifiers and access levels.

use std::fmt;
use std::ops::BitOr;

use serde::{Deserialize, Serialize};

/// Primitive value types.
///
/// A closed set: boxing is a pure function over it, see [`PrimitiveKind::boxed_name`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    Boolean,
    Byte,
    Short,
    Int,
    Long,
    Char,
    Float,
    Double,
}

impl PrimitiveKind {
    /// Source keyword for this type.
    #[must_use]
    pub fn keyword(self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Byte => "byte",
            PrimitiveKind::Short => "short",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Long => "long",
            PrimitiveKind::Char => "char",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
        }
    }

    /// Fully qualified name of the reference type that boxes this primitive.
    #[must_use]
    pub fn boxed_name(self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "java.lang.Boolean",
            PrimitiveKind::Byte => "java.lang.Byte",
            PrimitiveKind::Short => "java.lang.Short",
            PrimitiveKind::Int => "java.lang.Integer",
            PrimitiveKind::Long => "java.lang.Long",
            PrimitiveKind::Char => "java.lang.Character",
            PrimitiveKind::Float => "java.lang.Float",
            PrimitiveKind::Double => "java.lang.Double",
        }
    }

    /// Inverse of [`PrimitiveKind::boxed_name`].
    #[must_use]
    pub fn from_boxed_name(name: &str) -> Option<Self> {
        const ALL: [PrimitiveKind; 8] = [
            PrimitiveKind::Boolean,
            PrimitiveKind::Byte,
            PrimitiveKind::Short,
            PrimitiveKind::Int,
            PrimitiveKind::Long,
            PrimitiveKind::Char,
            PrimitiveKind::Float,
            PrimitiveKind::Double,
        ];
        ALL.into_iter().find(|kind| {
            let boxed = kind.boxed_name();
            boxed == name || boxed.rsplit('.').next() == Some(name)
        })
    }
}

/// A declared type as written on a field, local or method.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeRef {
    Primitive(PrimitiveKind),
    Named {
        name: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        args: Vec<TypeRef>,
    },
    Array(Box<TypeRef>),
}

impl TypeRef {
    /// A non-generic reference type.
    pub fn named(name: impl Into<String>) -> Self {
        TypeRef::Named {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// A parameterized reference type.
    pub fn generic(name: impl Into<String>, args: Vec<TypeRef>) -> Self {
        TypeRef::Named {
            name: name.into(),
            args,
        }
    }

    /// `java.lang.Object`.
    #[must_use]
    pub fn object() -> Self {
        TypeRef::named(crate::markers::OBJECT)
    }

    #[must_use]
    pub fn as_primitive(&self) -> Option<PrimitiveKind> {
        match self {
            TypeRef::Primitive(kind) => Some(*kind),
            _ => None,
        }
    }

    /// True only for primitive `boolean`; the boxed form does not get `is` accessors.
    #[must_use]
    pub fn is_primitive_boolean(&self) -> bool {
        matches!(self, TypeRef::Primitive(PrimitiveKind::Boolean))
    }

    /// The reference type used to hold a value of this type.
    #[must_use]
    pub fn boxed(&self) -> TypeRef {
        match self {
            TypeRef::Primitive(kind) => TypeRef::named(kind.boxed_name()),
            other => other.clone(),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Primitive(kind) => f.write_str(kind.keyword()),
            TypeRef::Named { name, args } => {
                f.write_str(name)?;
                if !args.is_empty() {
                    f.write_str("<")?;
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{}", arg)?;
                    }
                    f.write_str(">")?;
                }
                Ok(())
            }
            TypeRef::Array(inner) => write!(f, "{}[]", inner),
        }
    }
}

/// Declaration modifier set.
///
/// Serialized as a list of keywords (`["private", "final"]`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Modifiers(u16);

impl Modifiers {
    pub const PUBLIC: Modifiers = Modifiers(1);
    pub const PROTECTED: Modifiers = Modifiers(1 << 1);
    pub const PRIVATE: Modifiers = Modifiers(1 << 2);
    pub const STATIC: Modifiers = Modifiers(1 << 3);
    pub const FINAL: Modifiers = Modifiers(1 << 4);
    pub const TRANSIENT: Modifiers = Modifiers(1 << 5);
    pub const VOLATILE: Modifiers = Modifiers(1 << 6);

    /// Keyword order used when rendering.
    const KEYWORDS: [(Modifiers, &'static str); 7] = [
        (Modifiers::PUBLIC, "public"),
        (Modifiers::PROTECTED, "protected"),
        (Modifiers::PRIVATE, "private"),
        (Modifiers::STATIC, "static"),
        (Modifiers::FINAL, "final"),
        (Modifiers::TRANSIENT, "transient"),
        (Modifiers::VOLATILE, "volatile"),
    ];

    #[must_use]
    pub const fn empty() -> Self {
        Modifiers(0)
    }

    #[must_use]
    pub fn contains(self, other: Modifiers) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Modifiers) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Modifiers) {
        self.0 &= !other.0;
    }

    /// Only the bits also set in `mask`.
    #[must_use]
    pub fn intersection(self, mask: Modifiers) -> Modifiers {
        Modifiers(self.0 & mask.0)
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub fn is_static(self) -> bool {
        self.contains(Modifiers::STATIC)
    }

    /// Keywords in declaration order.
    #[must_use]
    pub fn keywords(self) -> Vec<&'static str> {
        Self::KEYWORDS
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, kw)| *kw)
            .collect()
    }
}

impl BitOr for Modifiers {
    type Output = Modifiers;

    fn bitor(self, rhs: Modifiers) -> Modifiers {
        Modifiers(self.0 | rhs.0)
    }
}

impl TryFrom<Vec<String>> for Modifiers {
    type Error = String;

    fn try_from(words: Vec<String>) -> Result<Self, Self::Error> {
        let mut modifiers = Modifiers::empty();
        for word in words {
            let flag = Self::KEYWORDS
                .iter()
                .find(|(_, kw)| *kw == word)
                .map(|(flag, _)| *flag)
                .ok_or_else(|| format!("unknown modifier '{}'", word))?;
            modifiers.insert(flag);
        }
        Ok(modifiers)
    }
}

impl From<Modifiers> for Vec<String> {
    fn from(modifiers: Modifiers) -> Self {
        modifiers.keywords().into_iter().map(String::from).collect()
    }
}

/// Visibility requested for a generated accessor.
///
/// `None` means "do not generate" and wins over every other flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessLevel {
    #[default]
    Public,
    Module,
    Protected,
    Package,
    Private,
    None,
}

impl AccessLevel {
    /// Modifier bits for a method declared at this level.
    #[must_use]
    pub fn to_modifiers(self) -> Modifiers {
        match self {
            AccessLevel::Public => Modifiers::PUBLIC,
            AccessLevel::Protected => Modifiers::PROTECTED,
            AccessLevel::Private => Modifiers::PRIVATE,
            AccessLevel::Module | AccessLevel::Package | AccessLevel::None => Modifiers::empty(),
        }
    }

    #[must_use]
    pub fn is_none(self) -> bool {
        self == AccessLevel::None
    }
}

/// Location in the original source, attached to diagnostics and provenance markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourcePos {
    pub line: u32,
    pub column: u32,
}

impl SourcePos {
    #[must_use]
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for SourcePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boxed_names() {
        assert_eq!(PrimitiveKind::Int.boxed_name(), "java.lang.Integer");
        assert_eq!(PrimitiveKind::Char.boxed_name(), "java.lang.Character");
        assert_eq!(
            PrimitiveKind::from_boxed_name("Integer"),
            Some(PrimitiveKind::Int)
        );
        assert_eq!(
            PrimitiveKind::from_boxed_name("java.lang.Boolean"),
            Some(PrimitiveKind::Boolean)
        );
        assert_eq!(PrimitiveKind::from_boxed_name("java.lang.String"), None);
    }

    #[test]
    fn test_type_display() {
        let list = TypeRef::generic("java.util.List", vec![TypeRef::named("String")]);
        assert_eq!(list.to_string(), "java.util.List<String>");

        let arr = TypeRef::Array(Box::new(TypeRef::Primitive(PrimitiveKind::Int)));
        assert_eq!(arr.to_string(), "int[]");
        assert_eq!(
            TypeRef::Primitive(PrimitiveKind::Long).boxed().to_string(),
            "java.lang.Long"
        );
    }

    #[test]
    fn test_modifiers_keywords() {
        let mods = Modifiers::FINAL | Modifiers::PRIVATE | Modifiers::STATIC;
        assert_eq!(mods.keywords(), vec!["private", "static", "final"]);
        assert!(mods.is_static());

        let parsed = Modifiers::try_from(vec!["private".to_string(), "final".to_string()]).unwrap();
        assert_eq!(parsed, Modifiers::PRIVATE | Modifiers::FINAL);
        assert!(Modifiers::try_from(vec!["sealed".to_string()]).is_err());
    }

    #[test]
    fn test_access_level_modifiers() {
        assert_eq!(AccessLevel::Public.to_modifiers(), Modifiers::PUBLIC);
        assert!(AccessLevel::Package.to_modifiers().is_empty());
        assert!(AccessLevel::None.to_modifiers().is_empty());
        assert!(AccessLevel::None.is_none());
    }

    #[test]
    fn test_access_level_serde() {
        let level: AccessLevel = serde_json::from_str("\"PROTECTED\"").unwrap();
        assert_eq!(level, AccessLevel::Protected);
        assert_eq!(serde_json::to_string(&AccessLevel::None).unwrap(), "\"NONE\"");
    }
}
