use accessor_store::Store;

use crate::config::AccessorOptions;
use crate::factory::{bind_to, IntoAccessor};
use crate::registry::accessor_store;

/// An explicit default store, passed down instead of read from the
/// process-wide slot.
///
/// Accessors built through a context bind to its store unless the options
/// name another one. Changing the context's store later does not rebind
/// accessors that were already built.
#[derive(Clone, Debug)]
pub struct AccessorContext {
    store: Store,
}

impl AccessorContext {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Snapshot of the current ambient store.
    pub fn from_ambient() -> Self {
        Self::new(accessor_store())
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn set_store(&mut self, store: Store) {
        self.store = store;
    }

    pub fn accessor<A: IntoAccessor>(&self, atom: A) -> A::Accessor {
        self.accessor_with(atom, AccessorOptions::default())
    }

    pub fn accessor_with<A: IntoAccessor>(&self, atom: A, options: AccessorOptions) -> A::Accessor {
        let AccessorOptions { store, debug_label } = options;
        let store = store.unwrap_or_else(|| self.store.clone());
        bind_to(atom, store, debug_label)
    }
}

impl Default for AccessorContext {
    fn default() -> Self {
        Self::from_ambient()
    }
}
