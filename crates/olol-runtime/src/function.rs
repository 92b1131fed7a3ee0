//! Function definitions: free functions and class methods

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::context::Context;
use crate::error::{Result, RuntimeError};
use crate::object::Object;
use crate::value::{TypeName, Value};

/// Signature of a native function implementation.
///
/// The receiver is `None` for free functions and shared methods.
pub type NativeFn =
    Arc<dyn Fn(&mut Context, Option<&Object>, Vec<Value>) -> Result<Value> + Send + Sync>;

/// An interpreted function body, opaque to the runtime.
pub type InterpretedBody = Arc<dyn Any + Send + Sync>;

/// How a function's body is executed.
#[derive(Clone)]
pub enum FunctionBody {
    /// Syntax tree handed back to the host evaluator
    Interpreted(InterpretedBody),
    /// Host-language callable
    Native(NativeFn),
}

impl fmt::Debug for FunctionBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FunctionBody::Interpreted(_) => write!(f, "Interpreted(..)"),
            FunctionBody::Native(_) => write!(f, "Native(..)"),
        }
    }
}

/// Where a function lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FunctionKind {
    /// Free function in a scope
    #[default]
    Free,
    /// Class-level method, called without a receiver
    Shared,
    /// Per-instance method, called with a receiver
    Instance,
}

/// A declared parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// Parameter name
    pub name: String,
    /// Declared type (`Any` for untyped)
    pub ty: TypeName,
}

/// A user-defined or native function.
#[derive(Debug, Clone)]
pub struct Function {
    /// Function name
    pub name: String,

    /// Declared return type (`Any` for untyped)
    pub return_type: TypeName,

    /// Fixed parameters in order
    pub parameters: Vec<Parameter>,

    /// Whether extra trailing arguments are accepted
    pub varargs: bool,

    /// The function body
    pub body: FunctionBody,

    /// Free function, shared method or instance method
    pub kind: FunctionKind,

    /// Documentation lines
    pub documentation: Vec<String>,
}

impl Function {
    fn with_body(name: impl Into<String>, body: FunctionBody) -> Self {
        Self {
            name: name.into(),
            return_type: TypeName::Any,
            parameters: Vec::new(),
            varargs: false,
            body,
            kind: FunctionKind::Free,
            documentation: Vec::new(),
        }
    }

    /// Create a native function.
    pub fn native<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&mut Context, Option<&Object>, Vec<Value>) -> Result<Value> + Send + Sync + 'static,
    {
        Self::with_body(name, FunctionBody::Native(Arc::new(func)))
    }

    /// Create a function whose body is interpreted by the host evaluator.
    pub fn interpreted<B>(name: impl Into<String>, body: B) -> Self
    where
        B: Any + Send + Sync,
    {
        Self::with_body(name, FunctionBody::Interpreted(Arc::new(body)))
    }

    /// Add a parameter (builder pattern).
    pub fn with_param(mut self, name: impl Into<String>, ty: impl Into<TypeName>) -> Self {
        self.parameters.push(Parameter {
            name: name.into(),
            ty: ty.into(),
        });
        self
    }

    /// Set the return type (builder pattern).
    pub fn with_return_type(mut self, ty: impl Into<TypeName>) -> Self {
        self.return_type = ty.into();
        self
    }

    /// Accept extra trailing arguments (builder pattern).
    pub fn with_varargs(mut self) -> Self {
        self.varargs = true;
        self
    }

    /// Set the function kind (builder pattern).
    pub fn with_kind(mut self, kind: FunctionKind) -> Self {
        self.kind = kind;
        self
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

    /// `None` for free functions, `Some(true)` for shared methods,
    /// `Some(false)` for instance methods.
    pub fn is_shared(&self) -> Option<bool> {
        match self.kind {
            FunctionKind::Free => None,
            FunctionKind::Shared => Some(true),
            FunctionKind::Instance => Some(false),
        }
    }

    /// Whether the body is a host callable.
    pub fn is_native(&self) -> bool {
        matches!(self.body, FunctionBody::Native(_))
    }

    /// Number of fixed parameters.
    pub fn arity(&self) -> usize {
        self.parameters.len()
    }

    /// Downcast an interpreted body to the evaluator's node type.
    pub fn body_as<T: Any>(&self) -> Option<&T> {
        match &self.body {
            FunctionBody::Interpreted(body) => body.downcast_ref::<T>(),
            FunctionBody::Native(_) => None,
        }
    }

    /// Check arity and cast arguments to their declared parameter types.
    ///
    /// Extra arguments of a varargs function pass through uncast.
    pub fn bind_arguments(&self, args: Vec<Value>) -> Result<Vec<Value>> {
        let expected = self.parameters.len();
        let arity_ok = if self.varargs {
            args.len() >= expected
        } else {
            args.len() == expected
        };
        if !arity_ok {
            return Err(RuntimeError::ArityMismatch {
                name: self.name.clone(),
                expected,
                got: args.len(),
                varargs: self.varargs,
            });
        }

        args.into_iter()
            .enumerate()
            .map(|(i, arg)| match self.parameters.get(i) {
                Some(param) => arg.cast(&param.ty).map_err(|err| match err {
                    RuntimeError::Cast { from, to, detail } => RuntimeError::Cast {
                        from,
                        to,
                        detail: Some(format!(
                            "argument '{}' of '{}'{}",
                            param.name,
                            self.name,
                            detail.map(|d| format!(": {}", d)).unwrap_or_default()
                        )),
                    },
                    other => other,
                }),
                None => Ok(arg),
            })
            .collect()
    }
}
