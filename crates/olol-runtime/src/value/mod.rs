//! Value representation for runtime values

mod cast;
mod display;
mod impls;
pub mod types;

pub use types::TypeName;

use std::sync::Arc;

use crate::object::Object;

/// Runtime value representation.
///
/// The set of kinds is closed. Value kinds (`Boolean`, `Integer`, `Double`,
/// `String`) copy by value; `Object` is a shared reference, so cloning it
/// yields the same instance, never a structural copy.
#[derive(Clone, Default)]
pub enum Value {
    // ═══════════════════════════════════════════════════════════════════
    // Value Types
    // ═══════════════════════════════════════════════════════════════════
    /// `NOTHIN`, the absent value
    #[default]
    Nothing,

    /// `BOOL`: `YEZ` or `NO`
    Boolean(bool),

    /// `INTEGR`: 64-bit signed integer
    Integer(i64),

    /// `DUBBLE`: 64-bit float
    Double(f64),

    /// `STRIN`: immutable text
    String(Arc<str>),

    // ═══════════════════════════════════════════════════════════════════
    // Reference Types
    // ═══════════════════════════════════════════════════════════════════
    /// Reference to a live object instance
    Object(Object),
}

impl Value {
    /// The type-name projection.
    ///
    /// Objects report their class's display name.
    pub fn type_name(&self) -> String {
        match self {
            Value::Nothing => types::NOTHIN.to_string(),
            Value::Boolean(_) => types::BOOL.to_string(),
            Value::Integer(_) => types::INTEGR.to_string(),
            Value::Double(_) => types::DUBBLE.to_string(),
            Value::String(_) => types::STRIN.to_string(),
            Value::Object(obj) => obj.class().name().to_string(),
        }
    }

    /// The truthiness projection.
    pub fn truthy(&self) -> bool {
        match self {
            Value::Nothing => false,
            Value::Boolean(b) => *b,
            Value::Integer(n) => *n != 0,
            Value::Double(n) => *n != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Object(_) => true,
        }
    }

    /// True only for `Nothing`.
    pub fn is_nothing(&self) -> bool {
        matches!(self, Value::Nothing)
    }
}
