//! Object instances: member storage, visibility and dispatch

use std::any::Any;
use std::fmt;
use std::sync::{Arc, OnceLock};

use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};

use crate::class::{Caller, Class, SharedVariables};
use crate::error::{EntityKind, Result, RuntimeError};
use crate::function::Function;
use crate::registry::ObjectId;
use crate::scope::{Scope, Variable, Visibility};
use crate::value::Value;

/// A live instance of a class.
///
/// `Object` is a reference handle: cloning it yields another handle to the
/// same instance, and equality is identity.
#[derive(Clone)]
pub struct Object(pub(crate) Arc<Instance>);

pub(crate) struct Instance {
    class: Arc<Class>,

    /// Scope the instance was created in; `None` for detached instances
    scope: Option<Scope>,

    mro: Arc<[String]>,
    variables: RwLock<IndexMap<String, Variable>>,
    shared_variables: SharedVariables,
    native_data: Mutex<Option<Box<dyn Any + Send + Sync>>>,
    pub(crate) id: OnceLock<ObjectId>,
}

impl Object {
    /// Instantiate `class`, resolving its ancestors in `scope`.
    ///
    /// Members are copied from the MRO back to front so that the most
    /// derived declaration wins. Only `class` itself contributes private
    /// members.
    ///
    /// # Errors
    ///
    /// - `NotFound` if an ancestor class is not visible from `scope`
    /// - `InconsistentHierarchy` if the MRO cannot be computed
    pub fn instantiate(class: &Arc<Class>, scope: &Scope) -> Result<Object> {
        let mro = class.mro(scope)?;

        let mut variables = IndexMap::new();
        for qualified in mro.iter().rev() {
            let ancestor = if qualified == class.qualified_name() {
                Arc::clone(class)
            } else {
                scope.get_class(qualified)?
            };
            copy_members(&mut variables, &ancestor, Visibility::Public);
            if Arc::ptr_eq(&ancestor, class) {
                copy_members(&mut variables, &ancestor, Visibility::Private);
            }
        }

        tracing::debug!(
            class = class.qualified_name(),
            members = variables.len(),
            "instantiate"
        );

        Ok(Self::from_parts(class, Some(scope.clone()), mro, variables))
    }

    /// An instance with no defining scope.
    ///
    /// Only the class's own members are copied and its hierarchy is just
    /// itself. A detached object compares equal to `NOTHIN`.
    pub fn detached(class: &Arc<Class>) -> Object {
        let mut variables = IndexMap::new();
        copy_members(&mut variables, class, Visibility::Public);
        copy_members(&mut variables, class, Visibility::Private);
        let mro: Arc<[String]> = Arc::from(vec![class.qualified_name().to_string()]);
        Self::from_parts(class, None, mro, variables)
    }

    fn from_parts(
        class: &Arc<Class>,
        scope: Option<Scope>,
        mro: Arc<[String]>,
        variables: IndexMap<String, Variable>,
    ) -> Object {
        Object(Arc::new(Instance {
            class: Arc::clone(class),
            scope,
            mro,
            variables: RwLock::new(variables),
            shared_variables: Arc::clone(class.shared_variables()),
            native_data: Mutex::new(None),
            id: OnceLock::new(),
        }))
    }

    // ═══════════════════════════════════════════════════════════════════
    // Identity
    // ═══════════════════════════════════════════════════════════════════

    /// The instance's class.
    pub fn class(&self) -> &Arc<Class> {
        &self.0.class
    }

    /// The defining scope.
    pub fn scope(&self) -> Option<&Scope> {
        self.0.scope.as_ref()
    }

    /// Qualified names of the class and its ancestors, in MRO order.
    pub fn hierarchy(&self) -> Arc<[String]> {
        Arc::clone(&self.0.mro)
    }

    /// Whether the instance is of class `name` or one of its subclasses.
    ///
    /// `name` may be a qualified name or a simple name resolvable from the
    /// instance's scope.
    pub fn is_instance_of(&self, name: &str) -> bool {
        let mro = &self.0.mro;
        if mro.iter().any(|qualified| qualified == name) {
            return true;
        }
        let suffix = format!(".{}", name);
        if mro.iter().any(|qualified| qualified.ends_with(&suffix)) {
            return true;
        }
        self.scope()
            .and_then(|scope| scope.get_class(name).ok())
            .is_some_and(|class| mro.iter().any(|q| q == class.qualified_name()))
    }

    /// Whether this instance has no defining scope.
    pub fn is_detached(&self) -> bool {
        self.0.scope.is_none()
    }

    /// Whether two handles refer to the same instance.
    pub fn ptr_eq(&self, other: &Object) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Address of the instance, for diagnostics.
    pub fn as_ptr(&self) -> *const () {
        Arc::as_ptr(&self.0) as *const ()
    }

    /// Registry handle, if the instance has been registered.
    pub fn id(&self) -> Option<ObjectId> {
        self.0.id.get().copied()
    }

    // ═══════════════════════════════════════════════════════════════════
    // Members
    // ═══════════════════════════════════════════════════════════════════

    /// Read a member variable as `caller`.
    ///
    /// Instance members are checked first, then shared class variables.
    ///
    /// # Errors
    ///
    /// - `Private` if the member is private and `caller` is not the class
    /// - `NotFound` if no such member exists
    pub fn get_member(&self, name: &str, caller: &Caller) -> Result<Value> {
        tracing::trace!(member = name, %caller, "get_member");

        if let Some(variable) = self.0.variables.read().get(name) {
            self.check_visible(variable, caller)?;
            return Ok(variable.value.clone());
        }
        match self.0.shared_variables.read().get(name) {
            Some(variable) => Ok(variable.value.clone()),
            None => Err(RuntimeError::not_found(EntityKind::Member, name)),
        }
    }

    /// Assign a member variable as `caller`.
    ///
    /// Shared class variables are written through to every instance.
    ///
    /// # Errors
    ///
    /// - `Private` if the member is private and `caller` is not the class
    /// - `Locked` if the member is locked
    /// - `Cast` if the value cannot be cast to the member's type
    /// - `NotFound` if no such member exists
    pub fn set_member(&self, name: &str, value: Value, caller: &Caller) -> Result<()> {
        tracing::trace!(member = name, %caller, "set_member");

        let current = self.0.variables.read().get(name).cloned();
        if let Some(variable) = current {
            self.check_visible(&variable, caller)?;
            let prepared = variable.prepare_assignment(&value)?;
            return store(&self.0.variables, name, prepared);
        }

        let shared = self.0.shared_variables.read().get(name).cloned();
        match shared {
            Some(variable) => {
                let prepared = variable.prepare_assignment(&value)?;
                store(&self.0.shared_variables, name, prepared)
            }
            None => Err(RuntimeError::not_found(EntityKind::Member, name)),
        }
    }

    /// Names of per-instance members, in declaration order.
    pub fn member_names(&self) -> Vec<String> {
        self.0.variables.read().keys().cloned().collect()
    }

    fn check_visible(&self, variable: &Variable, caller: &Caller) -> Result<()> {
        if variable.is_public() || caller.is(self.0.class.qualified_name()) {
            Ok(())
        } else {
            Err(RuntimeError::private(EntityKind::Member, &variable.name))
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Methods
    // ═══════════════════════════════════════════════════════════════════

    /// Resolve a method through the instance's MRO as `caller`.
    pub fn dispatch(&self, name: &str, caller: &Caller) -> Result<Arc<Function>> {
        self.0
            .class
            .resolve_with_mro(&self.0.mro, self.0.scope.as_ref(), name, caller)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Native Data
    // ═══════════════════════════════════════════════════════════════════

    /// Attach host state, replacing any previous value.
    pub fn set_native_data<T: Any + Send + Sync>(&self, data: T) {
        *self.0.native_data.lock() = Some(Box::new(data));
    }

    /// Whether host state is attached.
    pub fn has_native_data(&self) -> bool {
        self.0.native_data.lock().is_some()
    }

    /// Run `f` on the attached host state if it is a `T`.
    ///
    /// The state is detached while `f` runs, so `f` may use this object's
    /// other native data methods. If `f` attaches new state, that state is
    /// kept and the detached state is dropped.
    pub fn with_native_data<T, R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R>
    where
        T: Any + Send + Sync,
    {
        let mut data = {
            let mut slot = self.0.native_data.lock();
            match slot.take()?.downcast::<T>() {
                Ok(data) => data,
                Err(other) => {
                    *slot = Some(other);
                    return None;
                }
            }
        };
        let result = f(&mut data);
        let mut slot = self.0.native_data.lock();
        if slot.is_none() {
            *slot = Some(data);
        }
        Some(result)
    }

    /// Detach and return the host state if it is a `T`.
    ///
    /// State of any other type is left in place.
    pub fn take_native_data<T: Any>(&self) -> Option<T> {
        let mut slot = self.0.native_data.lock();
        match slot.take() {
            Some(data) => match data.downcast::<T>() {
                Ok(data) => Some(*data),
                Err(data) => {
                    *slot = Some(data);
                    None
                }
            },
            None => None,
        }
    }
}

fn copy_members(into: &mut IndexMap<String, Variable>, class: &Class, visibility: Visibility) {
    for (name, variable) in class.variables(visibility) {
        into.insert(name.clone(), variable.clone());
    }
}

fn store(map: &RwLock<IndexMap<String, Variable>>, name: &str, value: Value) -> Result<()> {
    match map.write().get_mut(name) {
        Some(variable) => {
            variable.value = value;
            Ok(())
        }
        None => Err(RuntimeError::not_found(EntityKind::Member, name)),
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Object {}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("class", &self.0.class.qualified_name())
            .field("id", &self.id())
            .field("members", &self.member_names())
            .field("detached", &self.is_detached())
            .finish()
    }
}
