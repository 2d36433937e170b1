//! Accessor types: the uniform shape every atom is wrapped into.
//!
//! - [`ReadonlyAccessor`] wraps a read-only [`Atom`] and has no `set`.
//! - [`Accessor`] wraps a [`WritableAtom`] (read-write or write-only) and
//!   adds [`Accessor::set`] / [`Accessor::update`].
//!
//! Both implement [`Readable`] for `get`, `subscribe`, and `debug`, and both
//! serialize as their current value, so a struct holding accessors
//! serializes as plain data.

use std::fmt;

use accessor_store::{Atom, AtomValue, Capability, Store, Unsubscribe, WritableAtom};
use serde::{Serialize, Serializer};

use crate::debug::trace_logger;
use crate::error::AccessorResult;

/// Argument to [`Accessor::set`]: a next value or an updater of the
/// previous value.
///
/// `W` is the atom's write argument. For primitive atoms it is the value
/// type itself, so `acc.set(5)` converts through `From<W>`.
pub enum SetStateAction<'a, T, W = T> {
    Value(W),
    Update(Box<dyn FnOnce(T) -> W + 'a>),
}

impl<'a, T, W> SetStateAction<'a, T, W> {
    pub fn update<F>(f: F) -> Self
    where
        F: FnOnce(T) -> W + 'a,
    {
        Self::Update(Box::new(f))
    }

    /// Produce the write argument, reading the previous value only for
    /// updaters.
    pub(crate) fn resolve(self, previous: impl FnOnce() -> T) -> W {
        match self {
            Self::Value(value) => value,
            Self::Update(f) => f(previous()),
        }
    }
}

impl<'a, T, W> From<W> for SetStateAction<'a, T, W> {
    fn from(value: W) -> Self {
        Self::Value(value)
    }
}

impl<T, W: fmt::Debug> fmt::Debug for SetStateAction<'_, T, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Update(_) => f.write_str("Update(..)"),
        }
    }
}

/// Operations shared by every accessor variant.
///
/// Generic code can accept `impl Readable<Value = T>` to read or observe
/// any accessor regardless of its write capability.
pub trait Readable: Sized {
    type Value: AtomValue;

    /// The underlying atom, for interop with code that talks to the store
    /// directly.
    fn atom(&self) -> &Atom<Self::Value>;

    /// The store this accessor was bound to at construction.
    fn store(&self) -> &Store;

    fn capability(&self) -> Capability;

    /// Current value in the bound store.
    fn get(&self) -> Self::Value {
        self.store().get(self.atom())
    }

    /// Call `listener` with the current value after every change.
    ///
    /// Changes of upstream atoms that a derived atom reads count as changes
    /// of the derived atom when they alter its value. Writes that leave the
    /// value equal are not reported.
    fn subscribe<F>(&self, listener: F) -> Unsubscribe
    where
        Self::Value: PartialEq,
        F: Fn(&Self::Value) + Send + Sync + 'static,
    {
        let atom = self.atom().clone();
        let store = self.store().downgrade();
        self.store().sub(self.atom(), move || {
            if let Some(store) = store.upgrade() {
                listener(&store.get(&atom));
            }
        })
    }

    /// Subscribe `logger` for the lifetime of the store and return `self`.
    ///
    /// Each call adds another independent subscription.
    fn debug_with<F>(self, logger: F) -> Self
    where
        Self::Value: PartialEq,
        F: Fn(&Self::Value) + Send + Sync + 'static,
    {
        let _subscription = self.subscribe(logger);
        self
    }

    /// [`Readable::debug_with`] using the default tracing logger.
    fn debug(self) -> Self
    where
        Self::Value: PartialEq + fmt::Debug,
    {
        let logger = trace_logger(self.atom());
        self.debug_with(logger)
    }

    fn to_json(&self) -> AccessorResult<String>
    where
        Self: Serialize,
    {
        Ok(serde_json::to_string(self)?)
    }

    fn to_json_pretty(&self) -> AccessorResult<String>
    where
        Self: Serialize,
    {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Accessor over a read-only atom. Has no write path.
///
/// ```compile_fail
/// use accessor::{accessor_with, atom, derived, AccessorOptions, Store};
///
/// let base = atom(1);
/// let doubled = accessor_with(
///     derived(move |get| get.get(&base) * 2),
///     AccessorOptions::new().with_store(Store::new()),
/// );
/// doubled.set(4);
/// ```
pub struct ReadonlyAccessor<T> {
    atom: Atom<T>,
    store: Store,
}

impl<T> ReadonlyAccessor<T> {
    pub(crate) fn bind(atom: Atom<T>, store: Store) -> Self {
        Self { atom, store }
    }
}

impl<T: AtomValue> Readable for ReadonlyAccessor<T> {
    type Value = T;

    fn atom(&self) -> &Atom<T> {
        &self.atom
    }

    fn store(&self) -> &Store {
        &self.store
    }

    fn capability(&self) -> Capability {
        Capability::ReadOnly
    }
}

impl<T> Clone for ReadonlyAccessor<T> {
    fn clone(&self) -> Self {
        Self {
            atom: self.atom.clone(),
            store: self.store.clone(),
        }
    }
}

impl<T: AtomValue + Serialize> Serialize for ReadonlyAccessor<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.get().serialize(serializer)
    }
}

impl<T> fmt::Debug for ReadonlyAccessor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadonlyAccessor")
            .field("atom", &self.atom)
            .field("store", &self.store.id())
            .finish()
    }
}

/// Accessor over a writable atom (read-write or write-only).
///
/// Write-only atoms read as `()`.
pub struct Accessor<T, W = T, R = ()> {
    atom: WritableAtom<T, W, R>,
    store: Store,
}

impl<T, W, R> Accessor<T, W, R> {
    pub(crate) fn bind(atom: WritableAtom<T, W, R>, store: Store) -> Self {
        Self { atom, store }
    }

    /// The underlying writable atom.
    pub fn as_writable(&self) -> &WritableAtom<T, W, R> {
        &self.atom
    }
}

impl<T: AtomValue, W, R> Accessor<T, W, R> {
    /// Write through the atom's write function in the bound store.
    ///
    /// An updater reads the previous value from the bound store and runs
    /// exactly once before the write.
    pub fn set<'a>(&self, action: impl Into<SetStateAction<'a, T, W>>) -> R {
        let action: SetStateAction<'a, T, W> = action.into();
        let arg = action.resolve(|| self.store.get(&self.atom));
        self.store.set(&self.atom, arg)
    }

    /// Shorthand for `set(SetStateAction::update(f))`.
    pub fn update<F>(&self, f: F) -> R
    where
        F: FnOnce(T) -> W,
    {
        let previous = self.store.get(&self.atom);
        self.store.set(&self.atom, f(previous))
    }
}

impl<T: AtomValue, W, R> Readable for Accessor<T, W, R> {
    type Value = T;

    fn atom(&self) -> &Atom<T> {
        self.atom.as_atom()
    }

    fn store(&self) -> &Store {
        &self.store
    }

    fn capability(&self) -> Capability {
        self.atom.capability()
    }
}

impl<T, W, R> Clone for Accessor<T, W, R> {
    fn clone(&self) -> Self {
        Self {
            atom: self.atom.clone(),
            store: self.store.clone(),
        }
    }
}

impl<T: AtomValue + Serialize, W, R> Serialize for Accessor<T, W, R> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.get().serialize(serializer)
    }
}

impl<T, W, R> fmt::Debug for Accessor<T, W, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accessor")
            .field("atom", &self.atom)
            .field("store", &self.store.id())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AccessorOptions;
    use crate::debug::test_support::capture_logs;
    use crate::factory::accessor_with;
    use accessor_store::{atom, derived, writable, write_only};
    use proptest::prelude::*;
    use serde::Serialize;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    fn opts(store: &Store) -> AccessorOptions {
        AccessorOptions::default().with_store(store.clone())
    }

    fn recorder<T: Clone + Send + 'static>() -> (Arc<Mutex<Vec<T>>>, impl Fn(&T) + Send + Sync) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let listener = {
            let seen = Arc::clone(&seen);
            move |value: &T| seen.lock().unwrap().push(value.clone())
        };
        (seen, listener)
    }

    // -----------------------------------------------------------------------
    // Capability shape
    // -----------------------------------------------------------------------

    #[test]
    fn read_only_atom_yields_readonly_accessor() {
        let store = Store::new();
        let some = atom(1);
        let value: ReadonlyAccessor<i32> = {
            let some = some.clone();
            accessor_with(derived(move |get| get.get(&some)), opts(&store))
        };
        assert_eq!(value.get(), 1);
        assert_eq!(value.capability(), Capability::ReadOnly);
        assert!(!value.capability().can_write());
    }

    #[test]
    fn write_only_atom_has_get_and_set() {
        let store = Store::new();
        let some = atom(1);
        let value: Accessor<(), i32> = {
            let some = some.clone();
            accessor_with(write_only(move |set, next: i32| set.set(&some, next)), opts(&store))
        };
        assert_eq!(value.capability(), Capability::WriteOnly);
        let () = value.get();

        value.set(2);
        assert_eq!(store.get(&some), 2);
    }

    #[test]
    fn read_write_atom_has_get_and_set() {
        let store = Store::new();
        let some = atom(1);
        let value = {
            let read = some.clone();
            let target = some.clone();
            accessor_with(
                writable(move |get| get.get(&read), move |set, _: ()| set.set(&target, 2)),
                opts(&store),
            )
        };
        assert_eq!(value.capability(), Capability::ReadWrite);
        assert_eq!(value.get(), 1);

        value.set(());
        assert_eq!(value.get(), 2);
    }

    #[test]
    fn write_only_set_returns_write_result() {
        let store = Store::new();
        let total = atom(10);
        let withdraw = {
            let total = total.clone();
            accessor_with(
                write_only(move |set, amount: i32| {
                    let balance = set.get(&total);
                    if amount > balance {
                        return Err("insufficient");
                    }
                    set.set(&total, balance - amount);
                    Ok(balance - amount)
                }),
                opts(&store),
            )
        };

        assert_eq!(withdraw.set(4), Ok(6));
        assert_eq!(withdraw.set(7), Err("insufficient"));
        assert_eq!(store.get(&total), 6);
    }

    // -----------------------------------------------------------------------
    // Set / update
    // -----------------------------------------------------------------------

    #[test]
    fn set_value_then_get() {
        let store = Store::new();
        let value = accessor_with(atom(1), opts(&store));
        value.set(5);
        assert_eq!(value.get(), 5);
    }

    #[test]
    fn set_with_updater_uses_previous_value() {
        let store = Store::new();
        let value = accessor_with(atom(1), opts(&store));

        value.set(SetStateAction::update(|prev: i32| prev + 1));
        assert_eq!(value.get(), 2);

        value.update(|prev| prev * 10);
        assert_eq!(value.get(), 20);
    }

    #[test]
    fn updater_may_borrow_locals() {
        let store = Store::new();
        let value = accessor_with(atom(String::from("a")), opts(&store));
        let suffix = String::from("bc");
        value.update(|prev| prev + &suffix);
        assert_eq!(value.get(), "abc");
    }

    #[test]
    fn updater_on_write_only_receives_unit() {
        let store = Store::new();
        let target = atom(0);
        let value = {
            let target = target.clone();
            accessor_with(write_only(move |set, v: i32| set.set(&target, v)), opts(&store))
        };
        value.update(|()| 9);
        assert_eq!(store.get(&target), 9);
    }

    #[test]
    fn set_state_action_debug() {
        let action: SetStateAction<'_, i32> = 3.into();
        assert_eq!(format!("{action:?}"), "Value(3)");
        let update: SetStateAction<'_, i32> = SetStateAction::update(|p| p);
        assert_eq!(format!("{update:?}"), "Update(..)");
    }

    // -----------------------------------------------------------------------
    // Subscribe
    // -----------------------------------------------------------------------

    #[test]
    fn listener_receives_updated_values() {
        let store = Store::new();
        let value = accessor_with(atom(1), opts(&store));
        let (seen, listener) = recorder::<i32>();
        let unsubscribe = value.subscribe(listener);

        value.set(2);
        assert_eq!(*seen.lock().unwrap(), vec![2]);

        value.set(3);
        assert_eq!(*seen.lock().unwrap(), vec![2, 3]);

        unsubscribe.unsubscribe();
        value.set(4);
        assert_eq!(*seen.lock().unwrap(), vec![2, 3]);
    }

    #[test]
    fn derived_listener_sees_recomputed_value() {
        let store = Store::new();
        let counter = accessor_with(atom(0), opts(&store));
        let value = {
            let base = counter.atom().clone();
            accessor_with(derived(move |get| get.get(&base) * 2), opts(&store))
        };
        let (seen, listener) = recorder::<i32>();
        let unsubscribe = value.subscribe(listener);

        counter.set(1);
        assert_eq!(*seen.lock().unwrap(), vec![2]);

        counter.set(2);
        assert_eq!(*seen.lock().unwrap(), vec![2, 4]);

        unsubscribe.unsubscribe();
        counter.set(3);
        assert_eq!(*seen.lock().unwrap(), vec![2, 4]);
    }

    #[test]
    fn equal_value_is_not_reported() {
        let store = Store::new();
        let value = accessor_with(atom(1), opts(&store));
        let (seen, listener) = recorder::<i32>();
        let _unsubscribe = value.subscribe(listener);

        value.set(1);
        value.update(|prev| prev);
        assert!(seen.lock().unwrap().is_empty());

        value.set(2);
        value.set(2);
        assert_eq!(*seen.lock().unwrap(), vec![2]);
    }

    #[test]
    fn derived_listener_skips_unchanged_result() {
        let store = Store::new();
        let counter = accessor_with(atom(1), opts(&store));
        let positive = {
            let base = counter.atom().clone();
            accessor_with(derived(move |get| get.get(&base) > 0), opts(&store))
        };
        let (seen, listener) = recorder::<bool>();
        let _unsubscribe = positive.subscribe(listener);

        counter.set(2);
        counter.set(3);
        assert!(seen.lock().unwrap().is_empty());

        counter.set(0);
        counter.set(-5);
        assert_eq!(*seen.lock().unwrap(), vec![false]);
    }

    #[test]
    fn independent_subscriptions_unsubscribe_independently() {
        let store = Store::new();
        let value = accessor_with(atom(0), opts(&store));
        let (first, l1) = recorder::<i32>();
        let (second, l2) = recorder::<i32>();
        let u1 = value.subscribe(l1);
        let _u2 = value.subscribe(l2);

        value.set(1);
        u1.unsubscribe();
        u1.unsubscribe();
        value.set(2);

        assert_eq!(*first.lock().unwrap(), vec![1]);
        assert_eq!(*second.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn raw_atom_writes_reach_accessor_listeners() {
        let store = Store::new();
        let counter = accessor_with(atom(1), opts(&store));
        let (seen, listener) = recorder::<i32>();
        let _unsubscribe = counter.subscribe(listener);

        store.set(counter.as_writable(), 2);
        assert_eq!(counter.get(), 2);

        counter.update(|prev| prev + 1);
        assert_eq!(store.get(counter.atom()), 3);
        assert_eq!(*seen.lock().unwrap(), vec![2, 3]);
    }

    // -----------------------------------------------------------------------
    // Store binding
    // -----------------------------------------------------------------------

    #[test]
    fn value_lives_in_the_provided_store() {
        let store1 = Store::new();
        let store2 = Store::new();
        let value = accessor_with(atom(1), opts(&store1));
        assert_eq!(value.get(), 1);

        store2.set(value.as_writable(), 2);
        assert_eq!(value.get(), 1);
        assert!(value.store().same_store(&store1));
    }

    #[test]
    fn accessors_over_one_atom_in_two_stores_are_independent() {
        let (store1, store2) = (Store::new(), Store::new());
        let shared = atom(0);
        let a = accessor_with(shared.clone(), opts(&store1));
        let b = accessor_with(shared, opts(&store2));

        a.set(5);
        assert_eq!(a.get(), 5);
        assert_eq!(b.get(), 0);
    }

    // -----------------------------------------------------------------------
    // Serialization
    // -----------------------------------------------------------------------

    #[derive(Clone, Serialize)]
    struct Nested {
        value: Accessor<i32>,
    }

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct Model {
        value: Accessor<i32>,
        double_value: ReadonlyAccessor<i32>,
        test: Accessor<Nested>,
    }

    impl Model {
        fn new(store: &Store) -> Self {
            let value = accessor_with(atom(1), opts(store));
            let double_value = {
                let base = value.atom().clone();
                accessor_with(derived(move |get| get.get(&base) * 2), opts(store))
            };
            let nested = Nested {
                value: accessor_with(atom(1), opts(store)),
            };
            let test = accessor_with(atom(nested), opts(store));
            Self {
                value,
                double_value,
                test,
            }
        }
    }

    #[test]
    fn updating_value_updates_derived_field() {
        let store = Store::new();
        let model = Model::new(&store);

        model.value.set(2);
        assert_eq!(model.value.get(), 2);
        assert_eq!(model.double_value.get(), 4);
    }

    #[test]
    fn serializes_as_plain_values() {
        let store = Store::new();
        let model = Model::new(&store);

        assert_eq!(
            serde_json::to_string(&model).unwrap(),
            r#"{"value":1,"doubleValue":2,"test":{"value":1}}"#
        );
        assert_eq!(model.value.to_json().unwrap(), "1");
        assert_eq!(model.double_value.to_json().unwrap(), "2");
        assert_eq!(model.test.to_json().unwrap(), r#"{"value":1}"#);
    }

    #[test]
    fn serialization_tracks_current_values() {
        let store = Store::new();
        let model = Model::new(&store);
        model.value.set(3);
        model.test.get().value.set(7);

        let json: serde_json::Value = serde_json::to_value(&model).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"value": 3, "doubleValue": 6, "test": {"value": 7}})
        );
    }

    #[test]
    fn write_only_serializes_as_null() {
        let store = Store::new();
        let value = accessor_with(write_only(|_set, _: i32| {}), opts(&store));
        assert_eq!(value.to_json().unwrap(), "null");
    }

    #[test]
    fn pretty_json() {
        let store = Store::new();
        let value = accessor_with(atom(vec![1, 2]), opts(&store));
        assert_eq!(value.to_json_pretty().unwrap(), "[\n  1,\n  2\n]");
    }

    // -----------------------------------------------------------------------
    // Debug
    // -----------------------------------------------------------------------

    #[test]
    fn debug_logger_fires_on_every_change() {
        let store = Store::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = {
            let hits = Arc::clone(&hits);
            accessor_with(atom(1), opts(&store)).debug_with(move |_| {
                hits.fetch_add(1, Ordering::SeqCst);
            })
        };

        counter.update(|prev| prev + 1);
        store.set(counter.as_writable(), 10);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn repeated_debug_adds_subscriptions() {
        let store = Store::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let logger = {
            let hits = Arc::clone(&hits);
            move |_: &i32| {
                hits.fetch_add(1, Ordering::SeqCst);
            }
        };
        let counter = accessor_with(atom(0), opts(&store))
            .debug_with(logger.clone())
            .debug_with(logger);

        counter.set(1);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert_eq!(store.listener_count(counter.atom()), 2);
    }

    #[test]
    fn debug_keeps_readonly_type() {
        let store = Store::new();
        let base = atom(1);
        let doubled: ReadonlyAccessor<i32> = {
            let base = base.clone();
            accessor_with(derived(move |get| get.get(&base) * 2), opts(&store)).debug()
        };
        assert_eq!(doubled.get(), 2);
        assert_eq!(store.listener_count(doubled.atom()), 1);
    }

    #[test]
    fn default_debug_logger_reports_changes() {
        let store = Store::new();
        let counter = accessor_with(atom(1), opts(&store).with_debug_label("clicks")).debug();

        let output = capture_logs(|| {
            counter.set(2);
        });
        assert!(output.contains("accessor debug"));
        assert!(output.contains("clicks"));
        assert!(output.contains("value=2"));

        let quiet = capture_logs(|| {
            counter.set(2);
        });
        assert!(!quiet.contains("accessor debug"));
    }

    #[test]
    fn default_debug_logger_does_not_disturb_writes() {
        let store = Store::new();
        let counter = accessor_with(atom(1), opts(&store)).debug();
        counter.set(2);
        assert_eq!(counter.get(), 2);
    }

    // -----------------------------------------------------------------------
    // Generic access
    // -----------------------------------------------------------------------

    fn read_twice<A: Readable<Value = i32>>(acc: &A) -> i32 {
        acc.get() + acc.get()
    }

    #[test]
    fn readable_is_generic_over_variants() {
        let store = Store::new();
        let rw = accessor_with(atom(2), opts(&store));
        let ro = {
            let base = rw.atom().clone();
            accessor_with(derived(move |get| get.get(&base) + 1), opts(&store))
        };
        assert_eq!(read_twice(&rw), 4);
        assert_eq!(read_twice(&ro), 6);
    }

    #[test]
    fn debug_format_names_variant() {
        let store = Store::new();
        let rw = accessor_with(atom(0), opts(&store));
        let ro = accessor_with(derived(|_| 0), opts(&store));
        assert!(format!("{rw:?}").starts_with("Accessor"));
        assert!(format!("{ro:?}").starts_with("ReadonlyAccessor"));
    }

    proptest! {
        #[test]
        fn read_after_write(values in proptest::collection::vec(any::<i64>(), 1..16)) {
            let store = Store::new();
            let value = accessor_with(atom(0_i64), opts(&store));
            for v in values {
                value.set(v);
                prop_assert_eq!(value.get(), v);
            }
        }

        #[test]
        fn updater_applies_once(start in any::<i32>(), delta in any::<i32>()) {
            let store = Store::new();
            let value = accessor_with(atom(start), opts(&store));
            let mut calls = 0;
            value.update(|prev| {
                calls += 1;
                prev.wrapping_add(delta)
            });
            prop_assert_eq!(calls, 1);
            prop_assert_eq!(value.get(), start.wrapping_add(delta));
        }
    }
}
