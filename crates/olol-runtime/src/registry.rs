//! Process-wide instance registry

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

use crate::error::{EntityKind, Result, RuntimeError};
use crate::object::{Instance, Object};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque handle to a registered instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u64);

impl ObjectId {
    fn next() -> Self {
        ObjectId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw numeric handle.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ObjectId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.parse().map(ObjectId)
    }
}

/// Maps handles to instances for code that cannot hold an [`Object`].
///
/// A registered instance stays alive until its handle is released or the
/// registry is cleared.
#[derive(Default)]
pub struct InstanceRegistry {
    instances: DashMap<ObjectId, Arc<Instance>>,
}

impl InstanceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an instance and return its handle.
    ///
    /// Registering the same instance again returns the same handle.
    pub fn register(&self, object: &Object) -> ObjectId {
        let id = *object.0.id.get_or_init(ObjectId::next);
        self.instances
            .entry(id)
            .or_insert_with(|| Arc::clone(&object.0));
        tracing::debug!(%id, class = object.class().qualified_name(), "register");
        id
    }

    /// Look up an instance by handle.
    ///
    /// # Errors
    ///
    /// `NotFound` if the handle is unknown or has been released.
    pub fn lookup(&self, id: ObjectId) -> Result<Object> {
        self.instances
            .get(&id)
            .map(|entry| Object(Arc::clone(entry.value())))
            .ok_or_else(|| RuntimeError::not_found(EntityKind::Object, id.to_string()))
    }

    /// Release a handle. Returns whether it was registered.
    pub fn release(&self, id: ObjectId) -> bool {
        self.instances.remove(&id).is_some()
    }

    /// Number of registered handles.
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Whether no handles are registered.
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Release every handle.
    pub fn clear(&self) {
        self.instances.clear();
    }
}

impl fmt::Debug for InstanceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceRegistry")
            .field("len", &self.len())
            .finish()
    }
}
