//! Read and write contexts handed to atom functions.
//!
//! A [`Getter`] is passed to derived read functions and records every
//! primitive atom it touches; the store uses that set to decide which
//! subscriptions a write affects. A [`Setter`] is passed to write functions
//! and records which primitive slots were written.

use std::cell::RefCell;
use std::collections::BTreeSet;

use crate::atom::{Atom, AtomId, AtomValue, Source, WritableAtom};
use crate::store::Store;

/// Read context for derived atoms.
pub struct Getter<'a> {
    store: &'a Store,
    deps: RefCell<BTreeSet<AtomId>>,
}

impl<'a> Getter<'a> {
    pub(crate) fn new(store: &'a Store) -> Self {
        Self {
            store,
            deps: RefCell::new(BTreeSet::new()),
        }
    }

    /// Read the current value of `atom` in this store.
    ///
    /// Derived atoms are evaluated in place with this same getter, so
    /// dependencies are collected transitively.
    pub fn get<T, A>(&self, atom: &A) -> T
    where
        T: AtomValue,
        A: AsRef<Atom<T>> + ?Sized,
    {
        let atom = atom.as_ref();
        match atom.source() {
            Source::Primitive(initial) => {
                self.deps.borrow_mut().insert(atom.id());
                self.store
                    .read_slot::<T>(atom.id())
                    .unwrap_or_else(|| initial.clone())
            }
            Source::Derived(read) => read(self),
        }
    }

    pub(crate) fn into_deps(self) -> BTreeSet<AtomId> {
        self.deps.into_inner()
    }
}

/// Write context for writable atoms.
pub struct Setter<'a> {
    store: &'a Store,
    changed: RefCell<BTreeSet<AtomId>>,
}

impl<'a> Setter<'a> {
    pub(crate) fn new(store: &'a Store) -> Self {
        Self {
            store,
            changed: RefCell::new(BTreeSet::new()),
        }
    }

    /// Read the current value of `atom`, including writes already made
    /// earlier in this same write.
    pub fn get<T, A>(&self, atom: &A) -> T
    where
        T: AtomValue,
        A: AsRef<Atom<T>> + ?Sized,
    {
        Getter::new(self.store).get(atom)
    }

    /// Invoke another atom's write function inside this write.
    ///
    /// Listeners are notified once, after the outermost write returns.
    pub fn set<T, W, R>(&self, atom: &WritableAtom<T, W, R>, arg: W) -> R {
        atom.write(self, arg)
    }

    pub(crate) fn put<T: AtomValue>(&self, id: AtomId, value: T) {
        self.store.write_slot(id, value);
        self.changed.borrow_mut().insert(id);
    }

    pub(crate) fn into_changed(self) -> BTreeSet<AtomId> {
        self.changed.into_inner()
    }
}
