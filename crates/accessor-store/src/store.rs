use std::any::Any;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock, RwLock, Weak};

use tracing::{debug, trace};

use crate::atom::{Atom, AtomId, AtomValue, WritableAtom};
use crate::context::{Getter, Setter};

static NEXT_STORE_ID: AtomicU64 = AtomicU64::new(1);
static DEFAULT_STORE: OnceLock<Store> = OnceLock::new();

/// Process-unique identity of a store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StoreId(u64);

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "store#{}", self.0)
    }
}

type Listener = Arc<dyn Fn() + Send + Sync>;
type Tracker = Arc<dyn Fn(&Store) -> Evaluation + Send + Sync>;

/// Result of re-reading a mounted atom.
struct Evaluation {
    deps: BTreeSet<AtomId>,
    /// The value differs from the one seen at the previous evaluation.
    changed: bool,
}

/// A subscribed atom: its current primitive dependencies and listeners.
struct Mount {
    deps: BTreeSet<AtomId>,
    tracker: Tracker,
    listeners: Vec<(u64, Listener)>,
}

struct StoreInner {
    id: StoreId,
    slots: RwLock<HashMap<AtomId, Box<dyn Any + Send + Sync>>>,
    mounts: Mutex<BTreeMap<AtomId, Mount>>,
    next_listener: AtomicU64,
}

/// Keyed reactive container mapping atom identity to current value.
///
/// `Store` is a shared handle: clones refer to the same slots and
/// subscriptions. Independent stores are created with [`Store::new`].
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

/// Non-owning handle to a [`Store`], for listeners that must not keep the
/// store alive.
#[derive(Clone)]
pub struct WeakStore {
    inner: Weak<StoreInner>,
}

impl WeakStore {
    pub fn upgrade(&self) -> Option<Store> {
        self.inner.upgrade().map(|inner| Store { inner })
    }
}

impl fmt::Debug for WeakStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakStore")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

impl Store {
    /// Create a new, empty store.
    pub fn new() -> Self {
        let id = StoreId(NEXT_STORE_ID.fetch_add(1, Ordering::Relaxed));
        debug!(store = %id, "store created");
        Self {
            inner: Arc::new(StoreInner {
                id,
                slots: RwLock::new(HashMap::new()),
                mounts: Mutex::new(BTreeMap::new()),
                next_listener: AtomicU64::new(1),
            }),
        }
    }

    pub fn id(&self) -> StoreId {
        self.inner.id
    }

    /// Returns `true` if both handles refer to the same store.
    pub fn same_store(&self, other: &Store) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn downgrade(&self) -> WeakStore {
        WeakStore {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Read the current value of `atom` in this store.
    pub fn get<T, A>(&self, atom: &A) -> T
    where
        T: AtomValue,
        A: AsRef<Atom<T>> + ?Sized,
    {
        trace!(store = %self.inner.id, atom = %atom.as_ref().id(), "get");
        Getter::new(self).get(atom)
    }

    /// Run `atom`'s write function with `arg` and notify affected listeners.
    ///
    /// Every subscription whose atom reads any primitive slot written during
    /// this call is re-read after the write function returns, and its
    /// listeners run once if the value is no longer equal to the last one
    /// seen.
    pub fn set<T, W, R>(&self, atom: &WritableAtom<T, W, R>, arg: W) -> R {
        let setter = Setter::new(self);
        let result = atom.write(&setter, arg);
        let changed = setter.into_changed();
        debug!(
            store = %self.inner.id,
            atom = %atom.id(),
            changed = changed.len(),
            "set"
        );
        if !changed.is_empty() {
            self.notify(&changed);
        }
        result
    }

    /// Register `listener` to run whenever `atom`'s value changes.
    ///
    /// The listener receives no arguments; read the new value with
    /// [`Store::get`]. Writes that leave the value equal do not notify.
    /// Subscriptions stay active until the returned
    /// [`Unsubscribe`] handle is invoked; dropping the handle does not
    /// unsubscribe.
    pub fn sub<T, A, F>(&self, atom: &A, listener: F) -> Unsubscribe
    where
        T: AtomValue + PartialEq,
        A: AsRef<Atom<T>> + ?Sized,
        F: Fn() + Send + Sync + 'static,
    {
        let atom = atom.as_ref().clone();
        let atom_id = atom.id();
        let last: Mutex<Option<T>> = Mutex::new(None);
        let tracker: Tracker = Arc::new(move |store: &Store| {
            let getter = Getter::new(store);
            let value = getter.get(&atom);
            let deps = getter.into_deps();
            let mut last = last.lock().expect("value lock poisoned");
            let changed = last.as_ref() != Some(&value);
            *last = Some(value);
            Evaluation { deps, changed }
        });
        // Evaluate before taking the mount lock: the read function may call
        // back into this store.
        let Evaluation { deps, .. } = tracker(self);
        let listener_id = self.inner.next_listener.fetch_add(1, Ordering::Relaxed);

        let count = {
            let mut mounts = self.inner.mounts.lock().expect("mount lock poisoned");
            let mount = mounts.entry(atom_id).or_insert_with(|| Mount {
                deps,
                tracker,
                listeners: Vec::new(),
            });
            mount.listeners.push((listener_id, Arc::new(listener)));
            mount.listeners.len()
        };
        debug!(
            store = %self.inner.id,
            atom = %atom_id,
            listener = listener_id,
            listeners = count,
            "subscribed"
        );

        Unsubscribe {
            store: self.downgrade(),
            atom: atom_id,
            listener: listener_id,
            done: AtomicBool::new(false),
        }
    }

    /// Number of listeners currently registered for `atom`.
    pub fn listener_count<T, A>(&self, atom: &A) -> usize
    where
        A: AsRef<Atom<T>> + ?Sized,
    {
        let mounts = self.inner.mounts.lock().expect("mount lock poisoned");
        mounts
            .get(&atom.as_ref().id())
            .map_or(0, |mount| mount.listeners.len())
    }

    /// Number of atoms with at least one listener.
    pub fn mounted_count(&self) -> usize {
        self.inner.mounts.lock().expect("mount lock poisoned").len()
    }

    /// Number of primitive slots that have been written in this store.
    pub fn slot_count(&self) -> usize {
        self.inner.slots.read().expect("slot lock poisoned").len()
    }

    pub(crate) fn read_slot<T: AtomValue>(&self, id: AtomId) -> Option<T> {
        let slots = self.inner.slots.read().expect("slot lock poisoned");
        slots
            .get(&id)
            .and_then(|value| value.downcast_ref::<T>())
            .cloned()
    }

    pub(crate) fn write_slot<T: AtomValue>(&self, id: AtomId, value: T) {
        let mut slots = self.inner.slots.write().expect("slot lock poisoned");
        slots.insert(id, Box::new(value));
    }

    fn notify(&self, changed: &BTreeSet<AtomId>) {
        let affected: Vec<(AtomId, Tracker, Vec<(u64, Listener)>)> = {
            let mounts = self.inner.mounts.lock().expect("mount lock poisoned");
            mounts
                .iter()
                .filter(|(_, mount)| !mount.deps.is_disjoint(changed))
                .map(|(id, mount)| (*id, Arc::clone(&mount.tracker), mount.listeners.clone()))
                .collect()
        };

        // Refresh dependencies first so writes made by listeners are routed
        // against the current dependency sets.
        let mut pending = Vec::with_capacity(affected.len());
        for (atom_id, tracker, listeners) in affected {
            let Evaluation { deps, changed } = tracker(self);
            {
                let mut mounts = self.inner.mounts.lock().expect("mount lock poisoned");
                if let Some(mount) = mounts.get_mut(&atom_id) {
                    mount.deps = deps;
                }
            }
            if changed {
                pending.push((atom_id, listeners));
            } else {
                trace!(store = %self.inner.id, atom = %atom_id, "value unchanged");
            }
        }

        for (atom_id, listeners) in pending {
            trace!(store = %self.inner.id, atom = %atom_id, listeners = listeners.len(), "notify");
            for (listener_id, listener) in listeners {
                // An earlier listener in this round may have unsubscribed it.
                if self.is_listening(atom_id, listener_id) {
                    listener();
                }
            }
        }
    }

    fn is_listening(&self, atom: AtomId, listener: u64) -> bool {
        let mounts = self.inner.mounts.lock().expect("mount lock poisoned");
        mounts
            .get(&atom)
            .is_some_and(|mount| mount.listeners.iter().any(|(id, _)| *id == listener))
    }

    fn remove_listener(&self, atom: AtomId, listener: u64) {
        let mut mounts = self.inner.mounts.lock().expect("mount lock poisoned");
        let remaining = match mounts.get_mut(&atom) {
            Some(mount) => {
                mount.listeners.retain(|(id, _)| *id != listener);
                mount.listeners.len()
            }
            None => return,
        };
        if remaining == 0 {
            mounts.remove(&atom);
        }
        drop(mounts);
        debug!(
            store = %self.inner.id,
            atom = %atom,
            listener,
            listeners = remaining,
            "unsubscribed"
        );
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("id", &self.inner.id)
            .field("slot_count", &self.slot_count())
            .field("mounted_count", &self.mounted_count())
            .finish()
    }
}

/// The process-wide default store, created on first use.
pub fn default_store() -> Store {
    DEFAULT_STORE.get_or_init(Store::new).clone()
}

/// Handle returned by [`Store::sub`].
///
/// Calling [`Unsubscribe::unsubscribe`] removes exactly the listener it was
/// created for. Repeated calls are no-ops.
pub struct Unsubscribe {
    store: WeakStore,
    atom: AtomId,
    listener: u64,
    done: AtomicBool,
}

impl Unsubscribe {
    pub fn unsubscribe(&self) {
        if self.done.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(store) = self.store.upgrade() {
            store.remove_listener(self.atom, self.listener);
        }
    }

    /// Returns `true` until [`Unsubscribe::unsubscribe`] has been called.
    pub fn is_active(&self) -> bool {
        !self.done.load(Ordering::Acquire)
    }

    pub fn atom_id(&self) -> AtomId {
        self.atom
    }
}

impl fmt::Debug for Unsubscribe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unsubscribe")
            .field("atom", &self.atom)
            .field("listener", &self.listener)
            .field("active", &self.is_active())
            .finish()
    }
}
