//! Name → builtin constructor lookup.

use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

use super::builtin;
use super::FunctionClass;

/// Registry of function classes keyed by lowercase name.
///
/// The process-wide instance returned by [`FunctionRegistry::global`] is
/// populated once and never mutated afterwards, so lookups need no locking.
#[derive(Default)]
pub struct FunctionRegistry {
    funcs: HashMap<String, Box<dyn FunctionClass>>,
}

impl FunctionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding every builtin shipped with the crate.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        builtin::register_all(&mut registry);
        registry
    }

    /// Returns the process-wide registry.
    pub fn global() -> &'static FunctionRegistry {
        static REGISTRY: OnceLock<FunctionRegistry> = OnceLock::new();
        REGISTRY.get_or_init(FunctionRegistry::with_builtins)
    }

    /// Registers a function class, replacing any class with the same name.
    pub fn register(&mut self, class: impl FunctionClass + 'static) {
        self.funcs
            .insert(class.name().to_lowercase(), Box::new(class));
    }

    /// Looks up a function class by name (case-insensitive).
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&dyn FunctionClass> {
        let found = match self.funcs.get(name) {
            Some(class) => Some(class),
            None => self.funcs.get(&name.to_lowercase()),
        };
        found.map(|class| class.as_ref())
    }

    /// Checks if a function is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Returns all registered names, sorted.
    #[must_use]
    pub fn function_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.funcs.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Returns the number of registered functions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.funcs.len()
    }

    /// Returns true if no function is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.funcs.is_empty()
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("functions", &self.function_names())
            .finish()
    }
}
