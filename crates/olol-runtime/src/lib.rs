//! # olol-runtime
//!
//! The object and scope runtime of the Objective-LOL language.
//!
//! This crate defines what a value is, how names resolve through nested
//! scopes, how classes compose through multiple inheritance (C3
//! linearization) and how instances guard member visibility and dispatch
//! methods. Parsing, statement evaluation and the standard library live
//! elsewhere and talk to the runtime through [`Context`].
//!
//! ## Architecture
//!
//! - **Values**: the closed [`Value`] type with its cast and equality rules
//! - **Scopes**: chained variable, function and class tables
//! - **Classes**: member declarations, memoized MRO, method resolution
//! - **Objects**: per-instance members, shared class variables, dispatch
//! - **Context**: the facade for evaluators and native functions
//!
//! ## Example
//!
//! ```
//! use olol_runtime::{Class, Runtime, Value, Variable};
//!
//! let runtime = Runtime::new();
//! let mut ctx = runtime.context();
//!
//! let mut counter = Class::new("COUNTER", "main", Vec::<String>::new());
//! counter.declare_variable(Variable::new("N", "INTEGR", Value::Integer(0)).unwrap());
//! ctx.define_class(counter).unwrap();
//!
//! let obj = ctx.construct("COUNTER", vec![]).unwrap();
//! ctx.set_member(&obj, "N", Value::from("41")).unwrap();
//! assert_eq!(ctx.get_member(&obj, "N").unwrap(), Value::Integer(41));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod class;
pub mod context;
pub mod error;
pub mod function;
pub mod object;
pub mod registry;
pub mod runtime;
pub mod scope;
pub mod value;

// Re-export main types
pub use class::{qualify, Caller, Class, FallbackHandler};
pub use context::{Context, Evaluator, RuntimeConfig};
pub use error::{EntityKind, Result, RuntimeError};
pub use function::{Function, FunctionBody, FunctionKind, InterpretedBody, NativeFn, Parameter};
pub use object::Object;
pub use registry::{InstanceRegistry, ObjectId};
pub use runtime::Runtime;
pub use scope::{Scope, Variable, Visibility};
pub use value::{TypeName, Value};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_exists() {
        assert!(!VERSION.is_empty());
    }
}
