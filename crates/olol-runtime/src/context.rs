//! Execution context: the facade used by evaluators and native functions

use std::fmt;
use std::sync::Arc;

use crate::class::{Caller, Class};
use crate::error::{Result, RuntimeError};
use crate::function::{Function, FunctionBody, FunctionKind, InterpretedBody};
use crate::object::Object;
use crate::registry::ObjectId;
use crate::runtime::Runtime;
use crate::scope::{Scope, Visibility};
use crate::value::{TypeName, Value};

/// Runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Maximum call depth (stack overflow protection)
    pub max_call_depth: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_call_depth: 1000,
        }
    }
}

impl RuntimeConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the call depth limit (builder pattern).
    pub fn with_max_call_depth(mut self, max_depth: usize) -> Self {
        self.max_call_depth = max_depth;
        self
    }
}

/// Executes interpreted function bodies.
///
/// Implemented by the host's tree-walking evaluator. The callee context
/// passed in already has the parameters defined in its scope.
pub trait Evaluator: Send + Sync {
    /// Evaluate `body` of `function`.
    fn call(
        &self,
        ctx: &mut Context,
        function: &Function,
        body: &InterpretedBody,
        receiver: Option<&Object>,
        args: Vec<Value>,
    ) -> Result<Value>;
}

/// The narrow surface through which code interacts with the runtime.
///
/// A context pairs the shared [`Runtime`] with a current scope, the
/// identity of the executing class (for visibility checks) and the
/// current call depth.
pub struct Context {
    runtime: Runtime,
    scope: Scope,
    caller: Caller,
    receiver: Option<Object>,
    depth: usize,
}

impl Context {
    pub(crate) fn new(runtime: Runtime, scope: Scope) -> Self {
        Self {
            runtime,
            scope,
            caller: Caller::Outside,
            receiver: None,
            depth: 0,
        }
    }

    /// The runtime this context belongs to.
    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    /// The current scope.
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Identity of the executing code.
    pub fn caller(&self) -> &Caller {
        &self.caller
    }

    /// The instance whose method is executing, if any.
    pub fn receiver(&self) -> Option<&Object> {
        self.receiver.as_ref()
    }

    /// Current call depth.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Run as `caller` (builder pattern).
    ///
    /// Used by evaluators executing a class body.
    pub fn with_caller(mut self, caller: Caller) -> Self {
        self.caller = caller;
        self
    }

    /// A context for a nested block scope.
    pub fn child(&self) -> Context {
        Context {
            runtime: self.runtime.clone(),
            scope: self.scope.child(),
            caller: self.caller.clone(),
            receiver: self.receiver.clone(),
            depth: self.depth,
        }
    }

    /// An independent context over a fresh child of the global scope.
    ///
    /// The fork shares the global scope, classes and instance registry
    /// with this context but not its local variables.
    pub fn fork(&self) -> Context {
        Context::new(self.runtime.clone(), self.runtime.global().child())
    }

    // ═══════════════════════════════════════════════════════════════════
    // Variables
    // ═══════════════════════════════════════════════════════════════════

    /// Read a variable visible from the current scope.
    pub fn get_variable(&self, name: &str) -> Result<Value> {
        self.scope.value(name)
    }

    /// Assign an existing variable.
    pub fn set_variable(&self, name: &str, value: Value) -> Result<()> {
        self.scope.set(name, value)
    }

    /// Define a variable in the current scope.
    pub fn define_variable(
        &self,
        name: impl Into<String>,
        ty: impl Into<TypeName>,
        value: Value,
        locked: bool,
    ) -> Result<()> {
        self.scope.define(name, ty, value, locked)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Functions
    // ═══════════════════════════════════════════════════════════════════

    /// Define a free function in the current scope.
    pub fn define_function(&self, function: Function) -> Result<Arc<Function>> {
        self.scope.define_function(function)
    }

    /// Call a free function by name.
    pub fn call_function(&mut self, name: &str, args: Vec<Value>) -> Result<Value> {
        let function = self.scope.get_function(name)?;
        self.invoke(&function, None, args)
    }

    /// Call a method on `object` as this context's caller.
    pub fn call_method(&mut self, object: &Object, name: &str, args: Vec<Value>) -> Result<Value> {
        let caller = self.caller.clone();
        self.call_method_as(object, name, &caller, args)
    }

    /// Call a method on `object` as `caller`.
    pub fn call_method_as(
        &mut self,
        object: &Object,
        name: &str,
        caller: &Caller,
        args: Vec<Value>,
    ) -> Result<Value> {
        let method = object.dispatch(name, caller)?;
        self.invoke(&method, Some(object), args)
    }

    /// Call a shared (class-level) method of the named class.
    pub fn call_shared(&mut self, class: &str, name: &str, args: Vec<Value>) -> Result<Value> {
        let class = self.get_class(class)?;
        let method = class.resolve(&self.scope, name, &self.caller)?;
        let previous = std::mem::replace(&mut self.caller, Caller::of(&class));
        let result = self.invoke(&method, None, args);
        self.caller = previous;
        result
    }

    /// Invoke a function with an optional receiver.
    ///
    /// Checks arity, casts arguments to parameter types and the result to
    /// the return type. Instance methods see the receiver's class as their
    /// caller identity.
    ///
    /// # Errors
    ///
    /// - `ArityMismatch` or `Cast` if the arguments do not fit
    /// - `StackOverflow` if the call depth limit is exceeded
    /// - `NoEvaluator` for an interpreted body with no evaluator installed
    /// - any error raised by the body
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(function = %function.name, depth = self.depth + 1)
    )]
    pub fn invoke(
        &mut self,
        function: &Function,
        receiver: Option<&Object>,
        args: Vec<Value>,
    ) -> Result<Value> {
        let args = function.bind_arguments(args)?;

        let depth = self.depth + 1;
        let max = self.runtime.config().max_call_depth;
        if depth > max {
            return Err(RuntimeError::StackOverflow { depth, max });
        }

        let receiver = match function.kind {
            FunctionKind::Instance => receiver,
            FunctionKind::Free | FunctionKind::Shared => None,
        };
        let caller = match receiver {
            Some(object) => Caller::of(object.class()),
            None => self.caller.clone(),
        };
        let scope = match receiver.and_then(Object::scope) {
            Some(scope) => scope.child(),
            None => self.scope.child(),
        };

        let mut callee = Context {
            runtime: self.runtime.clone(),
            scope,
            caller,
            receiver: receiver.cloned(),
            depth,
        };

        let result = match &function.body {
            FunctionBody::Native(native) => native(&mut callee, receiver, args)?,
            FunctionBody::Interpreted(body) => {
                for (param, arg) in function.parameters.iter().zip(&args) {
                    callee
                        .scope
                        .define(param.name.clone(), param.ty.clone(), arg.clone(), false)?;
                }
                let evaluator =
                    self.runtime
                        .evaluator()
                        .ok_or_else(|| RuntimeError::NoEvaluator {
                            function: function.name.clone(),
                        })?;
                evaluator.call(&mut callee, function, body, receiver, args)?
            }
        };

        result.cast(&function.return_type)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Classes and Objects
    // ═══════════════════════════════════════════════════════════════════

    /// Look up a class by qualified or simple name.
    pub fn get_class(&self, name: &str) -> Result<Arc<Class>> {
        self.scope.get_class(name)
    }

    /// Register a class in the current scope.
    pub fn define_class(&self, class: Class) -> Result<Arc<Class>> {
        self.scope.define_class(class)
    }

    /// Instantiate the named class and register the instance.
    ///
    /// No constructor is run; see [`Context::construct`].
    pub fn new_object(&self, class: &str) -> Result<Object> {
        let class = self.get_class(class)?;
        let object = Object::instantiate(&class, &self.scope)?;
        self.runtime.registry().register(&object);
        Ok(object)
    }

    /// Instantiate the named class and run its constructor.
    ///
    /// The constructor is the public method named like the class. A class
    /// without one accepts no arguments.
    pub fn construct(&mut self, class: &str, args: Vec<Value>) -> Result<Object> {
        let object = self.new_object(class)?;
        let class = Arc::clone(object.class());

        match class.functions(Visibility::Public).get(class.name()) {
            Some(constructor) => {
                let constructor = Arc::clone(constructor);
                self.invoke(&constructor, Some(&object), args)?;
            }
            None if !args.is_empty() => {
                return Err(RuntimeError::ArityMismatch {
                    name: class.name().to_string(),
                    expected: 0,
                    got: args.len(),
                    varargs: false,
                });
            }
            None => {}
        }
        Ok(object)
    }

    /// Read a member of `object` as this context's caller.
    pub fn get_member(&self, object: &Object, name: &str) -> Result<Value> {
        object.get_member(name, &self.caller)
    }

    /// Assign a member of `object` as this context's caller.
    pub fn set_member(&self, object: &Object, name: &str, value: Value) -> Result<()> {
        object.set_member(name, value, &self.caller)
    }

    /// Register an instance and return its handle.
    pub fn register_object(&self, object: &Object) -> ObjectId {
        self.runtime.registry().register(object)
    }

    /// Resolve an instance handle.
    pub fn lookup_object(&self, id: ObjectId) -> Result<Object> {
        self.runtime.registry().lookup(id)
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("scope", &self.scope)
            .field("caller", &self.caller)
            .field("receiver", &self.receiver)
            .field("depth", &self.depth)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = RuntimeConfig::default();
        assert_eq!(config.max_call_depth, 1000);
        assert_eq!(RuntimeConfig::new().with_max_call_depth(8).max_call_depth, 8);
    }

    #[test]
    fn test_child_shares_runtime_not_scope() {
        let ctx = Runtime::new().context();
        ctx.define_variable("A", "", Value::Integer(1), false).unwrap();

        let child = ctx.child();
        child.define_variable("B", "", Value::Integer(2), false).unwrap();

        assert_eq!(child.get_variable("A").unwrap(), Value::Integer(1));
        assert!(ctx.get_variable("B").is_err());
        assert_eq!(child.scope().depth(), ctx.scope().depth() + 1);
    }
}
