//! Variables: typed, optionally locked storage cells

use crate::error::{Result, RuntimeError};
use crate::value::{TypeName, Value};

/// Member visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    /// Accessible from any calling context
    #[default]
    Public,
    /// Accessible only from the declaring class
    Private,
}

/// A named variable.
///
/// A variable declared with `TypeName::Any` stores values as given; any
/// other declared type holds the result of casting the assigned value to
/// that type.
#[derive(Debug, Clone)]
pub struct Variable {
    /// The variable's name
    pub name: String,

    /// Declared type (`Any` for dynamically typed)
    pub ty: TypeName,

    /// Current value
    pub value: Value,

    /// Whether the value is fixed after definition
    pub locked: bool,

    /// Visibility when accessed as a class member
    pub visibility: Visibility,

    /// Documentation lines
    pub documentation: Vec<String>,
}

impl Variable {
    /// Create a public, unlocked variable, casting `value` to `ty`.
    pub fn new(name: impl Into<String>, ty: impl Into<TypeName>, value: Value) -> Result<Self> {
        let name = name.into();
        let ty = ty.into();
        let value = value.cast(&ty).map_err(|err| initialization_error(&name, err))?;
        Ok(Self {
            name,
            ty,
            value,
            locked: false,
            visibility: Visibility::Public,
            documentation: Vec::new(),
        })
    }

    /// Create a dynamically typed variable.
    pub fn dynamic(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            ty: TypeName::Any,
            value,
            locked: false,
            visibility: Visibility::Public,
            documentation: Vec::new(),
        }
    }

    /// Mark as locked (builder pattern).
    pub fn locked(mut self) -> Self {
        self.locked = true;
        self
    }

    /// Set visibility (builder pattern).
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Mark as private (builder pattern).
    pub fn private(self) -> Self {
        self.with_visibility(Visibility::Private)
    }

    /// Attach documentation lines (builder pattern).
    pub fn with_docs<I, S>(mut self, docs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.documentation = docs.into_iter().map(Into::into).collect();
        self
    }

    /// Whether the variable is publicly visible.
    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }

    /// Check that `value` may be assigned and cast it to the declared type.
    ///
    /// Does not modify the variable.
    pub fn prepare_assignment(&self, value: &Value) -> Result<Value> {
        if self.locked {
            return Err(RuntimeError::Locked {
                name: self.name.clone(),
            });
        }
        value.cast(&self.ty)
    }

    /// Assign a new value.
    ///
    /// # Errors
    ///
    /// - `Locked` if the variable is locked
    /// - `Cast` if the value cannot be cast to the declared type
    pub fn assign(&mut self, value: Value) -> Result<()> {
        self.value = self.prepare_assignment(&value)?;
        Ok(())
    }
}

fn initialization_error(name: &str, err: RuntimeError) -> RuntimeError {
    match err {
        RuntimeError::Cast { from, to, detail } => RuntimeError::Cast {
            from,
            to,
            detail: Some(match detail {
                Some(detail) => format!("cannot initialize variable '{}': {}", name, detail),
                None => format!("cannot initialize variable '{}'", name),
            }),
        },
        other => other,
    }
}
