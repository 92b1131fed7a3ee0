//! Error types for the object and scope runtime

use std::fmt;

use thiserror::Error;

/// What kind of runtime entity an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    /// A scope variable
    Variable,
    /// A free function
    Function,
    /// A class definition
    Class,
    /// A member variable of an instance
    Member,
    /// A member function of a class
    Method,
    /// A registered object instance
    Object,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Variable => "variable",
            EntityKind::Function => "function",
            EntityKind::Class => "class",
            EntityKind::Member => "member variable",
            EntityKind::Method => "member function",
            EntityKind::Object => "object",
        };
        f.write_str(name)
    }
}

/// Main error type for runtime operations.
///
/// Every variant is recoverable. The evaluator decides whether to surface
/// it as a language-level exception or abort.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Undefined variable, function, class, member or object handle
    #[error("undefined {kind} '{name}'")]
    NotFound {
        /// What was looked up
        kind: EntityKind,
        /// The name (or handle) that was not found
        name: String,
    },

    /// Duplicate definition in the same scope
    #[error("{kind} '{name}' already defined in current scope")]
    AlreadyExists {
        /// What was being defined
        kind: EntityKind,
        /// The duplicated name
        name: String,
    },

    /// A class simple name already bound to a different qualified class
    #[error("class {name} ({existing}) redeclared as {name} ({incoming}) in current scope")]
    Redeclared {
        /// The shared simple name
        name: String,
        /// Qualified name of the class already bound
        existing: String,
        /// Qualified name of the class being defined
        incoming: String,
    },

    /// Private member accessed from outside its declaring class
    #[error("{kind} '{name}' is private")]
    Private {
        /// Member or method
        kind: EntityKind,
        /// The member name
        name: String,
    },

    /// Assignment to a locked variable
    #[error("cannot assign to locked variable '{name}'")]
    Locked {
        /// The variable name
        name: String,
    },

    /// A value could not be converted to the requested type
    #[error("cannot cast {from} to {to}{}", detail.as_deref().map(|d| format!(": {d}")).unwrap_or_default())]
    Cast {
        /// Source type name
        from: String,
        /// Target type name
        to: String,
        /// Extra context (e.g. the unparsable text)
        detail: Option<String>,
    },

    /// C3 linearization has no solution
    #[error("multiple inheritance conflict in class {class}: {reason}")]
    InconsistentHierarchy {
        /// Qualified name of the class whose MRO failed
        class: String,
        /// Why the merge failed
        reason: String,
    },

    /// Wrong number of arguments
    #[error("function '{name}' expects {}{expected} arguments, got {got}", if *varargs { "at least " } else { "" })]
    ArityMismatch {
        /// Function name
        name: String,
        /// Number of declared (fixed) parameters
        expected: usize,
        /// Number of arguments supplied
        got: usize,
        /// Whether the function accepts extra arguments
        varargs: bool,
    },

    /// Call depth limit exceeded
    #[error("stack overflow: call depth {depth} exceeds maximum {max}")]
    StackOverflow {
        /// Depth at which the limit was hit
        depth: usize,
        /// Configured maximum
        max: usize,
    },

    /// An interpreted function body was called with no evaluator installed
    #[error("function '{function}' has an interpreted body but no evaluator is installed")]
    NoEvaluator {
        /// Function name
        function: String,
    },

    /// Error raised by a native function implementation
    #[error(transparent)]
    Native(#[from] anyhow::Error),
}

impl RuntimeError {
    /// Shorthand for a `NotFound` error.
    pub fn not_found(kind: EntityKind, name: impl Into<String>) -> Self {
        RuntimeError::NotFound {
            kind,
            name: name.into(),
        }
    }

    /// Shorthand for an `AlreadyExists` error.
    pub fn already_exists(kind: EntityKind, name: impl Into<String>) -> Self {
        RuntimeError::AlreadyExists {
            kind,
            name: name.into(),
        }
    }

    /// Shorthand for a `Private` error.
    pub fn private(kind: EntityKind, name: impl Into<String>) -> Self {
        RuntimeError::Private {
            kind,
            name: name.into(),
        }
    }

    /// Shorthand for a `Cast` error without detail.
    pub fn cast(from: impl Into<String>, to: impl Into<String>) -> Self {
        RuntimeError::Cast {
            from: from.into(),
            to: to.into(),
            detail: None,
        }
    }

    /// Shorthand for a `Cast` error with detail.
    pub fn cast_with(
        from: impl Into<String>,
        to: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        RuntimeError::Cast {
            from: from.into(),
            to: to.into(),
            detail: Some(detail.into()),
        }
    }

    /// Whether this is a `NotFound` error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RuntimeError::NotFound { .. })
    }

    /// Whether this is a duplicate-definition error.
    pub fn is_already_exists(&self) -> bool {
        matches!(
            self,
            RuntimeError::AlreadyExists { .. } | RuntimeError::Redeclared { .. }
        )
    }

    /// Whether this is a visibility error.
    pub fn is_private(&self) -> bool {
        matches!(self, RuntimeError::Private { .. })
    }

    /// Whether this is a locked-assignment error.
    pub fn is_locked(&self) -> bool {
        matches!(self, RuntimeError::Locked { .. })
    }

    /// Whether this is a cast error.
    pub fn is_cast(&self) -> bool {
        matches!(self, RuntimeError::Cast { .. })
    }

    /// Whether this is an MRO failure.
    pub fn is_inconsistent_hierarchy(&self) -> bool {
        matches!(self, RuntimeError::InconsistentHierarchy { .. })
    }
}

/// Result type alias for runtime operations
pub type Result<T> = std::result::Result<T, RuntimeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cast_message_with_detail() {
        let err = RuntimeError::cast_with("STRIN", "INTEGR", "'abc' is not a number");
        assert_eq!(
            err.to_string(),
            "cannot cast STRIN to INTEGR: 'abc' is not a number"
        );
    }

    #[test]
    fn test_cast_message_without_detail() {
        assert_eq!(
            RuntimeError::cast("NOTHIN", "Foo").to_string(),
            "cannot cast NOTHIN to Foo"
        );
    }

    #[test]
    fn test_arity_message_mentions_varargs() {
        let err = RuntimeError::ArityMismatch {
            name: "SAY".into(),
            expected: 1,
            got: 0,
            varargs: true,
        };
        assert_eq!(
            err.to_string(),
            "function 'SAY' expects at least 1 arguments, got 0"
        );
    }

    #[test]
    fn test_native_errors_convert() {
        fn fails() -> Result<()> {
            let host: anyhow::Result<()> = Err(anyhow::anyhow!("disk on fire"));
            host?;
            Ok(())
        }
        let err = fails().unwrap_err();
        assert!(matches!(err, RuntimeError::Native(_)));
        assert_eq!(err.to_string(), "disk on fire");
    }

    #[test]
    fn test_predicates() {
        assert!(RuntimeError::not_found(EntityKind::Class, "A").is_not_found());
        assert!(RuntimeError::already_exists(EntityKind::Variable, "X").is_already_exists());
        assert!(RuntimeError::private(EntityKind::Method, "m").is_private());
        assert!(RuntimeError::Locked { name: "X".into() }.is_locked());
        assert!(!RuntimeError::Locked { name: "X".into() }.is_cast());
    }
}
