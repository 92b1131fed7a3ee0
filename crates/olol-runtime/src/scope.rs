//! Lexical scopes for variables, functions and classes

mod variable;

pub use variable::{Variable, Visibility};

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::class::Class;
use crate::error::{EntityKind, Result, RuntimeError};
use crate::function::Function;
use crate::value::{TypeName, Value};

/// A chained lookup table for variables, functions and classes.
///
/// `Scope` is a cheap, clonable handle. A child keeps its parent alive for
/// as long as the child exists; a parent never refers to its children.
/// Lookups walk outward through parents; definitions only ever touch the
/// current scope, so shadowing an outer name is always allowed.
///
/// # Example
///
/// ```
/// use olol_runtime::{Scope, TypeName, Value};
///
/// let global = Scope::new();
/// global.define("X", TypeName::Integer, Value::Integer(1), false).unwrap();
///
/// let block = global.child();
/// block.define("X", TypeName::String, Value::from("inner"), false).unwrap();
///
/// assert_eq!(block.value("X").unwrap(), Value::from("inner"));
/// assert_eq!(global.value("X").unwrap(), Value::Integer(1));
/// ```
#[derive(Clone)]
pub struct Scope {
    inner: Arc<ScopeInner>,
}

struct ScopeInner {
    parent: Option<Scope>,
    depth: usize,
    variables: RwLock<HashMap<String, Variable>>,
    functions: RwLock<HashMap<String, Arc<Function>>>,
    classes: RwLock<HashMap<String, Arc<Class>>>,
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

impl Scope {
    /// Create a root (global) scope.
    pub fn new() -> Self {
        Self::with_parent(None)
    }

    fn with_parent(parent: Option<Scope>) -> Self {
        let depth = parent.as_ref().map_or(0, |p| p.depth() + 1);
        Self {
            inner: Arc::new(ScopeInner {
                parent,
                depth,
                variables: RwLock::new(HashMap::new()),
                functions: RwLock::new(HashMap::new()),
                classes: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Create a nested scope whose parent is this one.
    pub fn child(&self) -> Scope {
        Self::with_parent(Some(self.clone()))
    }

    /// The enclosing scope, if any.
    pub fn parent(&self) -> Option<&Scope> {
        self.inner.parent.as_ref()
    }

    /// Nesting depth (0 for a root scope).
    pub fn depth(&self) -> usize {
        self.inner.depth
    }

    /// Check if this is a root scope.
    pub fn is_global(&self) -> bool {
        self.inner.parent.is_none()
    }

    /// Whether two handles refer to the same scope.
    pub fn ptr_eq(&self, other: &Scope) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Variables
    // ═══════════════════════════════════════════════════════════════════

    /// Define a new public variable in the current scope.
    ///
    /// The value is cast to `ty` first; nothing is stored if the cast fails.
    ///
    /// # Errors
    ///
    /// - `AlreadyExists` if `name` is already defined in this scope
    /// - `Cast` if the value cannot be cast to `ty`
    pub fn define(
        &self,
        name: impl Into<String>,
        ty: impl Into<TypeName>,
        value: Value,
        locked: bool,
    ) -> Result<()> {
        let mut variable = Variable::new(name, ty, value)?;
        variable.locked = locked;
        self.define_variable(variable)
    }

    /// Define a fully built variable in the current scope.
    pub fn define_variable(&self, variable: Variable) -> Result<()> {
        let mut variables = self.inner.variables.write();
        if variables.contains_key(&variable.name) {
            return Err(RuntimeError::already_exists(
                EntityKind::Variable,
                variable.name,
            ));
        }
        variables.insert(variable.name.clone(), variable);
        Ok(())
    }

    /// Look up a variable, searching this scope then its parents.
    ///
    /// Returns a snapshot; use [`Scope::set`] to modify.
    pub fn get(&self, name: &str) -> Result<Variable> {
        let mut scope = Some(self);
        while let Some(current) = scope {
            if let Some(variable) = current.inner.variables.read().get(name) {
                return Ok(variable.clone());
            }
            scope = current.parent();
        }
        Err(RuntimeError::not_found(EntityKind::Variable, name))
    }

    /// Look up a variable's current value.
    pub fn value(&self, name: &str) -> Result<Value> {
        self.get(name).map(|variable| variable.value)
    }

    /// Assign to an existing variable in the nearest scope defining it.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no enclosing scope defines `name`
    /// - `Locked` if the variable is locked
    /// - `Cast` if the value cannot be cast to the declared type
    pub fn set(&self, name: &str, value: Value) -> Result<()> {
        let owner = self
            .owner_of(name)
            .ok_or_else(|| RuntimeError::not_found(EntityKind::Variable, name))?;

        // Cast outside the write lock: casting an object may look up classes.
        let prepared = match owner.inner.variables.read().get(name) {
            Some(variable) => variable.prepare_assignment(&value)?,
            None => return Err(RuntimeError::not_found(EntityKind::Variable, name)),
        };

        match owner.inner.variables.write().get_mut(name) {
            Some(variable) => {
                variable.value = prepared;
                Ok(())
            }
            None => Err(RuntimeError::not_found(EntityKind::Variable, name)),
        }
    }

    /// Check if a variable is visible from this scope.
    pub fn contains(&self, name: &str) -> bool {
        self.owner_of(name).is_some()
    }

    /// Check if a variable is defined in this scope only.
    pub fn contains_in_current_scope(&self, name: &str) -> bool {
        self.inner.variables.read().contains_key(name)
    }

    fn owner_of(&self, name: &str) -> Option<&Scope> {
        let mut scope = Some(self);
        while let Some(current) = scope {
            if current.contains_in_current_scope(name) {
                return Some(current);
            }
            scope = current.parent();
        }
        None
    }

    // ═══════════════════════════════════════════════════════════════════
    // Functions
    // ═══════════════════════════════════════════════════════════════════

    /// Define a function in the current scope.
    pub fn define_function(&self, function: Function) -> Result<Arc<Function>> {
        let mut functions = self.inner.functions.write();
        if functions.contains_key(&function.name) {
            return Err(RuntimeError::already_exists(
                EntityKind::Function,
                function.name,
            ));
        }
        let function = Arc::new(function);
        functions.insert(function.name.clone(), Arc::clone(&function));
        Ok(function)
    }

    /// Look up a function, searching this scope then its parents.
    pub fn get_function(&self, name: &str) -> Result<Arc<Function>> {
        let mut scope = Some(self);
        while let Some(current) = scope {
            if let Some(function) = current.inner.functions.read().get(name) {
                return Ok(Arc::clone(function));
            }
            scope = current.parent();
        }
        Err(RuntimeError::not_found(EntityKind::Function, name))
    }

    // ═══════════════════════════════════════════════════════════════════
    // Classes
    // ═══════════════════════════════════════════════════════════════════

    /// Register a class in the current scope.
    ///
    /// The class is indexed under its qualified name and under its simple
    /// name. Member declarations are frozen from here on.
    ///
    /// # Errors
    ///
    /// - `AlreadyExists` if the qualified name is already registered here
    /// - `Redeclared` if the simple name is bound to a different class here
    pub fn define_class(&self, class: Class) -> Result<Arc<Class>> {
        let mut classes = self.inner.classes.write();
        if classes.contains_key(class.qualified_name()) {
            return Err(RuntimeError::already_exists(
                EntityKind::Class,
                class.qualified_name(),
            ));
        }
        if let Some(existing) = classes.get(class.name()) {
            if existing.qualified_name() != class.qualified_name() {
                return Err(RuntimeError::Redeclared {
                    name: class.name().to_string(),
                    existing: existing.qualified_name().to_string(),
                    incoming: class.qualified_name().to_string(),
                });
            }
        }

        tracing::debug!(
            class = class.qualified_name(),
            parents = ?class.parents(),
            "define_class"
        );

        let class = Arc::new(class);
        classes.insert(class.qualified_name().to_string(), Arc::clone(&class));
        classes.insert(class.name().to_string(), Arc::clone(&class));
        Ok(class)
    }

    /// Look up a class by qualified or simple name, searching outward.
    pub fn get_class(&self, name: &str) -> Result<Arc<Class>> {
        let mut scope = Some(self);
        while let Some(current) = scope {
            if let Some(class) = current.inner.classes.read().get(name) {
                return Ok(Arc::clone(class));
            }
            scope = current.parent();
        }
        Err(RuntimeError::not_found(EntityKind::Class, name))
    }

    // ═══════════════════════════════════════════════════════════════════
    // Iteration and Inspection
    // ═══════════════════════════════════════════════════════════════════

    /// Names of variables defined in this scope, sorted.
    pub fn variable_names(&self) -> Vec<String> {
        sorted_keys(&self.inner.variables.read())
    }

    /// Names of functions defined in this scope, sorted.
    pub fn function_names(&self) -> Vec<String> {
        sorted_keys(&self.inner.functions.read())
    }

    /// Qualified names of classes defined in this scope, sorted.
    pub fn class_names(&self) -> Vec<String> {
        let classes = self.inner.classes.read();
        let mut names: Vec<String> = classes
            .values()
            .map(|class| class.qualified_name().to_string())
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// Remove every definition from this scope.
    ///
    /// Used at runtime teardown to drop objects that refer back to it.
    pub fn clear(&self) {
        self.inner.variables.write().clear();
        self.inner.functions.write().clear();
        self.inner.classes.write().clear();
    }
}

fn sorted_keys<V>(map: &HashMap<String, V>) -> Vec<String> {
    let mut names: Vec<String> = map.keys().cloned().collect();
    names.sort();
    names
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("depth", &self.depth())
            .field("variables", &self.variable_names())
            .field("functions", &self.function_names())
            .field("classes", &self.class_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_depth() {
        let global = Scope::new();
        let child = global.child();
        let grandchild = child.child();
        assert!(global.is_global());
        assert_eq!(grandchild.depth(), 2);
        assert!(grandchild.parent().unwrap().ptr_eq(&child));
    }

    #[test]
    fn test_set_writes_to_owning_scope() {
        let global = Scope::new();
        global.define("N", "INTEGR", Value::Integer(1), false).unwrap();

        let inner = global.child();
        inner.set("N", Value::Integer(2)).unwrap();

        assert!(!inner.contains_in_current_scope("N"));
        assert_eq!(global.value("N").unwrap(), Value::Integer(2));
    }

    #[test]
    fn test_clear_empties_current_scope() {
        let scope = Scope::new();
        scope.define("A", "", Value::Nothing, false).unwrap();
        scope.clear();
        assert!(!scope.contains("A"));
        assert!(scope.variable_names().is_empty());
    }
}
