//! Reactive atoms and the store that holds their values.
//!
//! An atom is an identity-stable handle describing one unit of state. It
//! never holds the current value itself: values live in a [`Store`], keyed
//! by [`AtomId`], so the same atom can carry independent values in any
//! number of stores.
//!
//! # Atom Kinds
//!
//! - [`atom`] -- primitive read-write atom with an initial value
//! - [`derived`] -- read-only atom computed from other atoms
//! - [`writable`] -- derived read plus a custom write function
//! - [`write_only`] -- custom write function, reads as `()`
//!
//! # Design Rules
//!
//! 1. Writing requires a [`WritableAtom`]; read-only atoms have no write path.
//! 2. Derived atoms are recomputed on every read and never cached.
//! 3. Listeners fire once per [`Store::set`] call that touched any of the
//!    primitive atoms the subscribed atom reads, after the write completes.
//! 4. No store lock is held while user read/write functions or listeners run.

pub mod atom;
pub mod context;
pub mod store;

pub use atom::{
    atom, derived, writable, write_only, Atom, AtomId, AtomValue, Capability, PrimitiveAtom,
    WritableAtom,
};
pub use context::{Getter, Setter};
pub use store::{default_store, Store, StoreId, Unsubscribe, WeakStore};
