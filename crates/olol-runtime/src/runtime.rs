//! The runtime: owner of process-wide state

use std::fmt;
use std::sync::Arc;

use crate::context::{Context, Evaluator, RuntimeConfig};
use crate::registry::InstanceRegistry;
use crate::scope::Scope;

/// Global state shared by every context: the global scope (and the
/// classes registered there), the instance registry, configuration and
/// the optional evaluator.
///
/// Cloning a `Runtime` yields another handle to the same state. State
/// lives until [`Runtime::shutdown`] or until the last handle is dropped.
#[derive(Clone)]
pub struct Runtime {
    inner: Arc<RuntimeInner>,
}

struct RuntimeInner {
    global: Scope,
    registry: Arc<InstanceRegistry>,
    config: RuntimeConfig,
    evaluator: Option<Arc<dyn Evaluator>>,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime {
    /// Create a runtime with default configuration.
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    /// Create a runtime with the given configuration.
    pub fn with_config(config: RuntimeConfig) -> Self {
        Self {
            inner: Arc::new(RuntimeInner {
                global: Scope::new(),
                registry: Arc::new(InstanceRegistry::new()),
                config,
                evaluator: None,
            }),
        }
    }

    /// Install the evaluator for interpreted function bodies.
    ///
    /// Returns a handle sharing this runtime's global scope and registry.
    pub fn with_evaluator(self, evaluator: impl Evaluator + 'static) -> Self {
        Self {
            inner: Arc::new(RuntimeInner {
                global: self.inner.global.clone(),
                registry: Arc::clone(&self.inner.registry),
                config: self.inner.config.clone(),
                evaluator: Some(Arc::new(evaluator)),
            }),
        }
    }

    /// The global (top-level) scope.
    pub fn global(&self) -> &Scope {
        &self.inner.global
    }

    /// The instance registry.
    pub fn registry(&self) -> &InstanceRegistry {
        &self.inner.registry
    }

    /// The configuration.
    pub fn config(&self) -> &RuntimeConfig {
        &self.inner.config
    }

    /// The installed evaluator, if any.
    pub fn evaluator(&self) -> Option<&Arc<dyn Evaluator>> {
        self.inner.evaluator.as_ref()
    }

    /// A context over a new module scope nested in the global scope.
    pub fn context(&self) -> Context {
        Context::new(self.clone(), self.global().child())
    }

    /// A context operating directly on the global scope.
    pub fn global_context(&self) -> Context {
        Context::new(self.clone(), self.global().clone())
    }

    /// Tear down global state.
    ///
    /// Clears the global scope and the instance registry so that objects
    /// stored in globals are released. Handles stay usable but empty.
    pub fn shutdown(&self) {
        tracing::debug!(
            instances = self.registry().len(),
            classes = self.global().class_names().len(),
            "shutdown"
        );
        self.inner.registry.clear();
        self.inner.global.clear();
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("global", &self.inner.global)
            .field("registry", &self.inner.registry)
            .field("config", &self.inner.config)
            .field("evaluator", &self.inner.evaluator.is_some())
            .finish()
    }
}
