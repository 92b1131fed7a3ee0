//! Class definitions and method resolution

mod mro;

use std::fmt;
use std::sync::{Arc, OnceLock};

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::error::{EntityKind, Result, RuntimeError};
use crate::function::{Function, FunctionKind};
use crate::scope::{Scope, Variable, Visibility};

/// Handler consulted when method lookup fails everywhere in the MRO.
pub type FallbackHandler = Arc<dyn Fn(&str, &Caller) -> Result<Arc<Function>> + Send + Sync>;

/// Class-level variables shared by every instance.
pub(crate) type SharedVariables = Arc<RwLock<IndexMap<String, Variable>>>;

/// Identity of the code performing an access.
///
/// Private members are visible only when the caller is the declaring class.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Caller {
    /// Code outside any class body
    #[default]
    Outside,
    /// Code running inside the class with this qualified name
    Class(Arc<str>),
}

impl Caller {
    /// Caller identity for code of `class`.
    pub fn of(class: &Class) -> Self {
        Caller::Class(Arc::from(class.qualified_name()))
    }

    /// Caller identity from a qualified class name.
    pub fn class(qualified_name: impl AsRef<str>) -> Self {
        Caller::Class(Arc::from(qualified_name.as_ref()))
    }

    /// Whether this caller is the class with `qualified_name`.
    pub fn is(&self, qualified_name: &str) -> bool {
        matches!(self, Caller::Class(name) if &**name == qualified_name)
    }
}

impl fmt::Display for Caller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Caller::Outside => write!(f, "<outside>"),
            Caller::Class(name) => write!(f, "{}", name),
        }
    }
}

/// Build a qualified class name from a module path and display name.
pub fn qualify(module_path: &str, name: &str) -> String {
    if module_path.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", module_path, name)
    }
}

/// A class definition.
///
/// Built and populated with `&mut` methods, then frozen by registering it
/// with [`Scope::define_class`]. The MRO is computed lazily on first use
/// and never recomputed.
pub struct Class {
    name: String,
    qualified_name: String,
    module_path: String,
    documentation: Vec<String>,

    /// Qualified (or resolvable) names of direct parents
    parents: RwLock<Vec<String>>,

    /// Memoized C3 linearization, self first
    mro: OnceLock<Arc<[String]>>,

    public_variables: IndexMap<String, Variable>,
    private_variables: IndexMap<String, Variable>,
    public_functions: IndexMap<String, Arc<Function>>,
    private_functions: IndexMap<String, Arc<Function>>,
    shared_variables: SharedVariables,
    shared_functions: IndexMap<String, Arc<Function>>,

    fallback: Option<FallbackHandler>,
}

/// Outcome of looking a method up in one class's own tables.
enum LocalLookup {
    Found(Arc<Function>),
    Denied,
    Missing,
}

impl Class {
    /// Create a class in `module_path` with the given direct parents.
    pub fn new<I, S>(name: impl Into<String>, module_path: impl Into<String>, parents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        let module_path = module_path.into();
        Self {
            qualified_name: qualify(&module_path, &name),
            name,
            module_path,
            documentation: Vec::new(),
            parents: RwLock::new(parents.into_iter().map(Into::into).collect()),
            mro: OnceLock::new(),
            public_variables: IndexMap::new(),
            private_variables: IndexMap::new(),
            public_functions: IndexMap::new(),
            private_functions: IndexMap::new(),
            shared_variables: Arc::new(RwLock::new(IndexMap::new())),
            shared_functions: IndexMap::new(),
            fallback: None,
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Identity
    // ═══════════════════════════════════════════════════════════════════

    /// Display name, e.g. `READER`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Globally unique name, e.g. `stdlib:IO.READER`.
    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    /// Module the class was declared in.
    pub fn module_path(&self) -> &str {
        &self.module_path
    }

    /// Documentation lines.
    pub fn documentation(&self) -> &[String] {
        &self.documentation
    }

    /// Direct parents as declared.
    pub fn parents(&self) -> Vec<String> {
        self.parents.read().clone()
    }

    /// Replace the declared parent list.
    ///
    /// Has no effect on an MRO that has already been computed.
    pub fn set_parents<I, S>(&self, parents: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        *self.parents.write() = parents.into_iter().map(Into::into).collect();
    }

    /// The memoized MRO, if it has been computed.
    pub fn cached_mro(&self) -> Option<Arc<[String]>> {
        self.mro.get().cloned()
    }

    // ═══════════════════════════════════════════════════════════════════
    // Declarations
    // ═══════════════════════════════════════════════════════════════════

    /// Attach documentation lines (builder pattern).
    pub fn with_docs<I, S>(mut self, docs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.documentation = docs.into_iter().map(Into::into).collect();
        self
    }

    /// Declare a per-instance member variable.
    ///
    /// The variable's own visibility selects the public or private table.
    pub fn declare_variable(&mut self, variable: Variable) -> &mut Self {
        let table = match variable.visibility {
            Visibility::Public => &mut self.public_variables,
            Visibility::Private => &mut self.private_variables,
        };
        table.insert(variable.name.clone(), variable);
        self
    }

    /// Declare a per-instance method.
    pub fn declare_function(&mut self, function: Function, visibility: Visibility) -> &mut Self {
        let function = match function.kind {
            FunctionKind::Free => function.with_kind(FunctionKind::Instance),
            _ => function,
        };
        let table = match visibility {
            Visibility::Public => &mut self.public_functions,
            Visibility::Private => &mut self.private_functions,
        };
        table.insert(function.name.clone(), Arc::new(function));
        self
    }

    /// Declare a class-level variable shared by all instances.
    pub fn declare_shared_variable(&mut self, variable: Variable) -> &mut Self {
        self.shared_variables
            .write()
            .insert(variable.name.clone(), variable);
        self
    }

    /// Declare a class-level method.
    pub fn declare_shared_function(&mut self, function: Function) -> &mut Self {
        let function = function.with_kind(FunctionKind::Shared);
        self.shared_functions
            .insert(function.name.clone(), Arc::new(function));
        self
    }

    /// Install the fallback handler for unresolved methods.
    pub fn set_fallback<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(&str, &Caller) -> Result<Arc<Function>> + Send + Sync + 'static,
    {
        self.fallback = Some(Arc::new(handler));
        self
    }

    // ═══════════════════════════════════════════════════════════════════
    // Inspection
    // ═══════════════════════════════════════════════════════════════════

    /// Per-instance variable declarations with the given visibility.
    pub fn variables(&self, visibility: Visibility) -> &IndexMap<String, Variable> {
        match visibility {
            Visibility::Public => &self.public_variables,
            Visibility::Private => &self.private_variables,
        }
    }

    /// Per-instance method declarations with the given visibility.
    pub fn functions(&self, visibility: Visibility) -> &IndexMap<String, Arc<Function>> {
        match visibility {
            Visibility::Public => &self.public_functions,
            Visibility::Private => &self.private_functions,
        }
    }

    /// Class-level method declarations.
    pub fn shared_functions(&self) -> &IndexMap<String, Arc<Function>> {
        &self.shared_functions
    }

    /// Snapshot of a class-level variable.
    pub fn shared_variable(&self, name: &str) -> Option<Variable> {
        self.shared_variables.read().get(name).cloned()
    }

    /// Names of class-level variables, in declaration order.
    pub fn shared_variable_names(&self) -> Vec<String> {
        self.shared_variables.read().keys().cloned().collect()
    }

    pub(crate) fn shared_variables(&self) -> &SharedVariables {
        &self.shared_variables
    }

    /// Whether a fallback handler is installed.
    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    // ═══════════════════════════════════════════════════════════════════
    // Method Resolution
    // ═══════════════════════════════════════════════════════════════════

    /// Resolve a method by name for `caller`.
    ///
    /// Search order: public, private, shared methods of this class, then
    /// each ancestor in MRO order. The first match wins. If nothing
    /// matches, the first fallback handler along the MRO is consulted; a
    /// free function it returns is treated as an instance method.
    ///
    /// # Errors
    ///
    /// - `Private` if this class's private method is requested by another
    ///   caller, or if the only matches are private ancestor methods
    /// - `NotFound` if nothing matches and no fallback is installed
    /// - any error from MRO computation
    pub fn resolve(&self, scope: &Scope, name: &str, caller: &Caller) -> Result<Arc<Function>> {
        let mro = self.mro(scope)?;
        self.resolve_with_mro(&mro, Some(scope), name, caller)
    }

    pub(crate) fn resolve_with_mro(
        &self,
        mro: &[String],
        scope: Option<&Scope>,
        name: &str,
        caller: &Caller,
    ) -> Result<Arc<Function>> {
        match self.lookup_local(name, caller) {
            LocalLookup::Found(function) => return Ok(function),
            LocalLookup::Denied => return Err(RuntimeError::private(EntityKind::Method, name)),
            LocalLookup::Missing => {}
        }

        let ancestors: Vec<Arc<Class>> = match scope {
            Some(scope) => mro
                .iter()
                .skip(1)
                .filter_map(|qualified| scope.get_class(qualified).ok())
                .collect(),
            None => Vec::new(),
        };

        let mut denied = false;
        for ancestor in &ancestors {
            match ancestor.lookup_local(name, caller) {
                LocalLookup::Found(function) => {
                    tracing::trace!(
                        method = name,
                        class = self.qualified_name(),
                        found_in = ancestor.qualified_name(),
                        "resolve"
                    );
                    return Ok(function);
                }
                LocalLookup::Denied => denied = true,
                LocalLookup::Missing => {}
            }
        }

        let fallback = self
            .fallback
            .as_ref()
            .or_else(|| ancestors.iter().find_map(|class| class.fallback.as_ref()));
        if let Some(handler) = fallback {
            tracing::trace!(method = name, class = self.qualified_name(), "resolve via fallback");
            // Fallback methods act on the instance they were resolved for.
            let function = handler(name, caller)?;
            return Ok(match function.kind {
                FunctionKind::Free => {
                    Arc::new((*function).clone().with_kind(FunctionKind::Instance))
                }
                FunctionKind::Shared | FunctionKind::Instance => function,
            });
        }

        if denied {
            Err(RuntimeError::private(EntityKind::Method, name))
        } else {
            Err(RuntimeError::not_found(EntityKind::Method, name))
        }
    }

    fn lookup_local(&self, name: &str, caller: &Caller) -> LocalLookup {
        if let Some(function) = self.public_functions.get(name) {
            return LocalLookup::Found(Arc::clone(function));
        }
        if let Some(function) = self.private_functions.get(name) {
            return if caller.is(&self.qualified_name) {
                LocalLookup::Found(Arc::clone(function))
            } else {
                LocalLookup::Denied
            };
        }
        if let Some(function) = self.shared_functions.get(name) {
            return LocalLookup::Found(Arc::clone(function));
        }
        LocalLookup::Missing
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("qualified_name", &self.qualified_name)
            .field("parents", &self.parents())
            .field("mro", &self.cached_mro())
            .field("public_variables", &self.public_variables.keys().collect::<Vec<_>>())
            .field("private_variables", &self.private_variables.keys().collect::<Vec<_>>())
            .field("public_functions", &self.public_functions.keys().collect::<Vec<_>>())
            .field("private_functions", &self.private_functions.keys().collect::<Vec<_>>())
            .field("shared_variables", &self.shared_variable_names())
            .field("shared_functions", &self.shared_functions.keys().collect::<Vec<_>>())
            .finish()
    }
}
