//! Type names used for declarations and casts

use std::fmt;
use std::sync::Arc;

/// Surface name of the Nothing type
pub const NOTHIN: &str = "NOTHIN";
/// Surface name of the Boolean type
pub const BOOL: &str = "BOOL";
/// Surface name of the Integer type
pub const INTEGR: &str = "INTEGR";
/// Surface name of the Double type
pub const DUBBLE: &str = "DUBBLE";
/// Surface name of the String type
pub const STRIN: &str = "STRIN";

/// A declared or requested type.
///
/// `Any` is the empty type: casting to it is the identity, and a variable
/// declared with it stores whatever it is given.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum TypeName {
    /// No declared type (dynamic)
    #[default]
    Any,
    /// `NOTHIN`
    Nothing,
    /// `BOOL`
    Boolean,
    /// `INTEGR`
    Integer,
    /// `DUBBLE`
    Double,
    /// `STRIN`
    String,
    /// A class, by simple or qualified name
    Class(Arc<str>),
}

impl TypeName {
    /// Parse a surface type name. The empty string is `Any`.
    pub fn parse(name: &str) -> Self {
        match name {
            "" => TypeName::Any,
            NOTHIN => TypeName::Nothing,
            BOOL => TypeName::Boolean,
            INTEGR => TypeName::Integer,
            DUBBLE => TypeName::Double,
            STRIN => TypeName::String,
            other => TypeName::Class(Arc::from(other)),
        }
    }

    /// Create a class type name.
    pub fn class(name: impl AsRef<str>) -> Self {
        TypeName::Class(Arc::from(name.as_ref()))
    }

    /// The surface text of this type name.
    pub fn as_str(&self) -> &str {
        match self {
            TypeName::Any => "",
            TypeName::Nothing => NOTHIN,
            TypeName::Boolean => BOOL,
            TypeName::Integer => INTEGR,
            TypeName::Double => DUBBLE,
            TypeName::String => STRIN,
            TypeName::Class(name) => name,
        }
    }

    /// Whether this is the dynamic (empty) type.
    pub fn is_any(&self) -> bool {
        matches!(self, TypeName::Any)
    }

    /// Whether this names a built-in value type rather than a class.
    pub fn is_builtin(&self) -> bool {
        !matches!(self, TypeName::Class(_))
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for TypeName {
    fn from(name: &str) -> Self {
        TypeName::parse(name)
    }
}

impl From<String> for TypeName {
    fn from(name: String) -> Self {
        TypeName::parse(&name)
    }
}
