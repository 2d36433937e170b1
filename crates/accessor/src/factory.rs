use accessor_store::{Atom, AtomValue, Store, WritableAtom};
use tracing::debug;

use crate::config::AccessorOptions;
use crate::registry::accessor_store;
use crate::types::{Accessor, Readable, ReadonlyAccessor};

/// Atom handles that can be wrapped into an accessor.
///
/// The implementing handle type decides the accessor variant: read-only
/// [`Atom`]s become [`ReadonlyAccessor`]s, [`WritableAtom`]s become
/// [`Accessor`]s with a `set` method.
pub trait IntoAccessor: Sized {
    type Value: AtomValue;
    type Accessor: Readable<Value = Self::Value>;

    /// The read side of the handle.
    fn as_atom(&self) -> &Atom<Self::Value>;

    /// Wrap the handle, binding it permanently to `store`.
    fn bind(self, store: Store) -> Self::Accessor;
}

impl<T: AtomValue> IntoAccessor for Atom<T> {
    type Value = T;
    type Accessor = ReadonlyAccessor<T>;

    fn as_atom(&self) -> &Atom<T> {
        self
    }

    fn bind(self, store: Store) -> ReadonlyAccessor<T> {
        ReadonlyAccessor::bind(self, store)
    }
}

impl<T: AtomValue, W, R> IntoAccessor for WritableAtom<T, W, R> {
    type Value = T;
    type Accessor = Accessor<T, W, R>;

    fn as_atom(&self) -> &Atom<T> {
        WritableAtom::as_atom(self)
    }

    fn bind(self, store: Store) -> Accessor<T, W, R> {
        Accessor::bind(self, store)
    }
}

/// Wrap `atom` in an accessor bound to the current ambient store.
pub fn accessor<A: IntoAccessor>(atom: A) -> A::Accessor {
    accessor_with(atom, AccessorOptions::default())
}

/// Wrap `atom` in an accessor configured by `options`.
///
/// The store is resolved once, here: later changes to the ambient store do
/// not affect the returned accessor. A debug label, when given, is written
/// onto the atom itself and is therefore seen by every accessor over it.
pub fn accessor_with<A: IntoAccessor>(atom: A, options: AccessorOptions) -> A::Accessor {
    let AccessorOptions { store, debug_label } = options;
    let store = store.unwrap_or_else(accessor_store);
    bind_to(atom, store, debug_label)
}

pub(crate) fn bind_to<A: IntoAccessor>(
    atom: A,
    store: Store,
    debug_label: Option<String>,
) -> A::Accessor {
    if let Some(label) = debug_label {
        atom.as_atom().set_debug_label(label);
    }
    let bound = atom.bind(store);
    debug!(
        atom = %bound.atom().id(),
        store = %bound.store().id(),
        capability = %bound.capability(),
        "accessor bound"
    );
    bound
}
