//! Capability-correct accessors over reactive atoms.
//!
//! An accessor wraps one atom together with the store it reads from and
//! writes to, and exposes a single uniform shape: `get`, `subscribe`,
//! `debug`, serialization, and `set` when (and only when) the atom is
//! writable.
//!
//! ```
//! use accessor::{accessor_with, atom, derived, AccessorOptions, Readable, Store};
//!
//! let store = Store::new();
//! let options = || AccessorOptions::new().with_store(store.clone());
//!
//! let count = accessor_with(atom(1), options());
//! let doubled = {
//!     let base = count.atom().clone();
//!     accessor_with(derived(move |get| get.get(&base) * 2), options())
//! };
//!
//! count.update(|prev| prev + 1);
//! assert_eq!(doubled.get(), 4);
//! assert_eq!(serde_json::to_string(&doubled).unwrap(), "4");
//! ```
//!
//! # Modules
//!
//! - [`types`] -- [`Accessor`], [`ReadonlyAccessor`], the [`Readable`] trait
//! - [`factory`] -- [`accessor`] / [`accessor_with`] and [`IntoAccessor`]
//! - [`registry`] -- the ambient default store
//! - [`context`] -- [`AccessorContext`], an injectable default store
//! - [`config`] -- [`AccessorOptions`]
//! - [`debug`] -- the default tracing logger
//! - [`error`] -- [`AccessorError`]
//!
//! # Design Rules
//!
//! 1. The bound store is chosen once at construction and never changes.
//! 2. `set` exists only on [`Accessor`]; read-only atoms cannot be written.
//! 3. Serializing an accessor yields only its current value.
//! 4. Debug labels live on the atom, so all accessors over it share one.

pub mod config;
pub mod context;
pub mod debug;
pub mod error;
pub mod factory;
pub mod registry;
pub mod types;

pub use config::AccessorOptions;
pub use context::AccessorContext;
pub use error::{AccessorError, AccessorResult};
pub use factory::{accessor, accessor_with, IntoAccessor};
pub use registry::{accessor_store, reset_accessor_store, set_accessor_store};
pub use types::{Accessor, Readable, ReadonlyAccessor, SetStateAction};

// Re-export the atom primitives so hosts need only this crate.
pub use accessor_store::{
    atom, default_store, derived, writable, write_only, Atom, AtomId, AtomValue, Capability,
    Getter, PrimitiveAtom, Setter, Store, Unsubscribe, WritableAtom,
};
