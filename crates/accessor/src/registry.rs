//! Process-wide ambient store used when an accessor is built without one.
//!
//! The slot starts out empty and then resolves to the lazily created
//! [`default_store`]. Hosts typically call [`set_accessor_store`] once during
//! bootstrap. Replacing the store affects only accessors constructed
//! afterwards.

use std::sync::RwLock;

use accessor_store::{default_store, Store};
use tracing::debug;

static AMBIENT_STORE: RwLock<Option<Store>> = RwLock::new(None);

/// Replace the ambient store for all future accessor constructions.
pub fn set_accessor_store(store: Store) {
    debug!(store = %store.id(), "ambient accessor store replaced");
    *AMBIENT_STORE.write().expect("ambient store lock poisoned") = Some(store);
}

/// The store new accessors bind to when none is supplied.
pub fn accessor_store() -> Store {
    let ambient = AMBIENT_STORE.read().expect("ambient store lock poisoned");
    match ambient.as_ref() {
        Some(store) => store.clone(),
        None => default_store(),
    }
}

/// Revert the ambient store to the process default store.
pub fn reset_accessor_store() {
    debug!("ambient accessor store reset to default");
    *AMBIENT_STORE.write().expect("ambient store lock poisoned") = None;
}
