use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::context::{Getter, Setter};

static NEXT_ATOM_ID: AtomicU64 = AtomicU64::new(1);

/// Bound for every value an atom can hold.
///
/// Values are cloned out of the store on read and may be shared across
/// threads, so they must be `Clone + Send + Sync + 'static`.
pub trait AtomValue: Clone + Send + Sync + 'static {}

impl<T: Clone + Send + Sync + 'static> AtomValue for T {}

/// Process-unique identity of an atom.
///
/// Cloned handles share the same id; two separately constructed atoms never
/// do, even when they hold equal initial values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AtomId(u64);

impl AtomId {
    fn next() -> Self {
        Self(NEXT_ATOM_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw numeric id.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for AtomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "atom#{}", self.0)
    }
}

/// What an atom allows its holders to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

impl Capability {
    /// Whether reads yield a meaningful value (write-only atoms read as `()`).
    pub fn can_read(self) -> bool {
        !matches!(self, Self::WriteOnly)
    }

    /// Whether the atom carries a write function.
    pub fn can_write(self) -> bool {
        !matches!(self, Self::ReadOnly)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ReadOnly => "read-only",
            Self::WriteOnly => "write-only",
            Self::ReadWrite => "read-write",
        };
        f.write_str(s)
    }
}

pub(crate) type ReadFn<T> = dyn Fn(&Getter<'_>) -> T + Send + Sync;
pub(crate) type WriteFn<W, R> = dyn Fn(&Setter<'_>, W) -> R + Send + Sync;

/// Where an atom's value comes from.
pub(crate) enum Source<T> {
    /// Value stored in the store slot; the initial value until first write.
    Primitive(T),
    /// Value computed from other atoms on every read.
    Derived(Box<ReadFn<T>>),
}

struct AtomInner<T> {
    id: AtomId,
    capability: Capability,
    label: RwLock<Option<String>>,
    source: Source<T>,
}

/// Read handle for a unit of reactive state.
///
/// Cloning is cheap and preserves identity. The debug label is shared by
/// every clone: setting it through one handle is visible through all.
pub struct Atom<T> {
    inner: Arc<AtomInner<T>>,
}

impl<T> Atom<T> {
    pub(crate) fn from_source(source: Source<T>, capability: Capability) -> Self {
        Self {
            inner: Arc::new(AtomInner {
                id: AtomId::next(),
                capability,
                label: RwLock::new(None),
                source,
            }),
        }
    }

    pub fn id(&self) -> AtomId {
        self.inner.id
    }

    pub fn capability(&self) -> Capability {
        self.inner.capability
    }

    /// Current debug label, if one was assigned.
    pub fn debug_label(&self) -> Option<String> {
        self.inner.label.read().expect("label lock poisoned").clone()
    }

    /// Replace the debug label. Last writer wins across all clones.
    pub fn set_debug_label(&self, label: impl Into<String>) {
        *self.inner.label.write().expect("label lock poisoned") = Some(label.into());
    }

    pub fn clear_debug_label(&self) {
        *self.inner.label.write().expect("label lock poisoned") = None;
    }

    pub(crate) fn source(&self) -> &Source<T> {
        &self.inner.source
    }
}

impl<T: AtomValue> Atom<T> {
    /// Create a read-only atom computed by `read`.
    pub fn derived<F>(read: F) -> Self
    where
        F: Fn(&Getter<'_>) -> T + Send + Sync + 'static,
    {
        Self::from_source(Source::Derived(Box::new(read)), Capability::ReadOnly)
    }
}

impl<T> Clone for Atom<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> PartialEq for Atom<T> {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl<T> Eq for Atom<T> {}

impl<T> Hash for Atom<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.id.hash(state);
    }
}

impl<T> AsRef<Atom<T>> for Atom<T> {
    fn as_ref(&self) -> &Atom<T> {
        self
    }
}

impl<T> fmt::Debug for Atom<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Atom")
            .field("id", &self.inner.id)
            .field("capability", &self.inner.capability)
            .field("label", &self.debug_label())
            .finish()
    }
}

/// An atom that also carries a write function.
///
/// `W` is the argument accepted by the write function and `R` its result.
/// For primitive atoms `W` is the value type itself and `R` is `()`.
pub struct WritableAtom<T, W = T, R = ()> {
    atom: Atom<T>,
    write: Arc<WriteFn<W, R>>,
}

/// A plain read-write atom holding a value of type `T`.
pub type PrimitiveAtom<T> = WritableAtom<T, T, ()>;

fn write_fn<W, R, F>(write: F) -> Arc<WriteFn<W, R>>
where
    F: Fn(&Setter<'_>, W) -> R + Send + Sync + 'static,
{
    Arc::new(write)
}

impl<T: AtomValue> WritableAtom<T, T, ()> {
    /// Create a primitive atom. Writes replace the stored value.
    pub fn primitive(initial: T) -> Self {
        let atom = Atom::from_source(Source::Primitive(initial), Capability::ReadWrite);
        let id = atom.id();
        let write = write_fn(move |setter: &Setter<'_>, value: T| setter.put(id, value));
        Self { atom, write }
    }
}

impl<T: AtomValue, W, R> WritableAtom<T, W, R> {
    /// Create a read-write atom from a derived read and a custom write.
    pub fn new<F, G>(read: F, write: G) -> Self
    where
        F: Fn(&Getter<'_>) -> T + Send + Sync + 'static,
        G: Fn(&Setter<'_>, W) -> R + Send + Sync + 'static,
    {
        Self {
            atom: Atom::from_source(Source::Derived(Box::new(read)), Capability::ReadWrite),
            write: write_fn(write),
        }
    }
}

impl<W, R> WritableAtom<(), W, R> {
    /// Create a write-only atom. Reads always yield `()`.
    pub fn write_only<G>(write: G) -> Self
    where
        G: Fn(&Setter<'_>, W) -> R + Send + Sync + 'static,
    {
        Self {
            atom: Atom::from_source(Source::Primitive(()), Capability::WriteOnly),
            write: write_fn(write),
        }
    }
}

impl<T, W, R> WritableAtom<T, W, R> {
    /// The read side of this atom. Shares identity and label.
    pub fn as_atom(&self) -> &Atom<T> {
        &self.atom
    }

    pub fn id(&self) -> AtomId {
        self.atom.id()
    }

    pub fn capability(&self) -> Capability {
        self.atom.capability()
    }

    pub fn debug_label(&self) -> Option<String> {
        self.atom.debug_label()
    }

    pub fn set_debug_label(&self, label: impl Into<String>) {
        self.atom.set_debug_label(label);
    }

    pub fn clear_debug_label(&self) {
        self.atom.clear_debug_label();
    }

    pub(crate) fn write(&self, setter: &Setter<'_>, arg: W) -> R {
        (self.write)(setter, arg)
    }
}

impl<T, W, R> Clone for WritableAtom<T, W, R> {
    fn clone(&self) -> Self {
        Self {
            atom: self.atom.clone(),
            write: Arc::clone(&self.write),
        }
    }
}

impl<T, W, R> PartialEq for WritableAtom<T, W, R> {
    fn eq(&self, other: &Self) -> bool {
        self.atom == other.atom
    }
}

impl<T, W, R> Eq for WritableAtom<T, W, R> {}

impl<T, W, R> Hash for WritableAtom<T, W, R> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.atom.hash(state);
    }
}

impl<T, W, R> AsRef<Atom<T>> for WritableAtom<T, W, R> {
    fn as_ref(&self) -> &Atom<T> {
        &self.atom
    }
}

impl<T, W, R> fmt::Debug for WritableAtom<T, W, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("WritableAtom").field(&self.atom).finish()
    }
}

/// Shorthand for [`WritableAtom::primitive`].
pub fn atom<T: AtomValue>(initial: T) -> PrimitiveAtom<T> {
    WritableAtom::primitive(initial)
}

/// Shorthand for [`Atom::derived`].
pub fn derived<T, F>(read: F) -> Atom<T>
where
    T: AtomValue,
    F: Fn(&Getter<'_>) -> T + Send + Sync + 'static,
{
    Atom::derived(read)
}

/// Shorthand for [`WritableAtom::new`].
pub fn writable<T, W, R, F, G>(read: F, write: G) -> WritableAtom<T, W, R>
where
    T: AtomValue,
    F: Fn(&Getter<'_>) -> T + Send + Sync + 'static,
    G: Fn(&Setter<'_>, W) -> R + Send + Sync + 'static,
{
    WritableAtom::new(read, write)
}

/// Shorthand for [`WritableAtom::write_only`].
pub fn write_only<W, R, G>(write: G) -> WritableAtom<(), W, R>
where
    G: Fn(&Setter<'_>, W) -> R + Send + Sync + 'static,
{
    WritableAtom::write_only(write)
}
