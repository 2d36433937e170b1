//! Default tracing logger installed by [`Readable::debug`].
//!
//! [`Readable::debug`]: crate::Readable::debug

use std::backtrace::Backtrace;
use std::fmt;

use accessor_store::{Atom, AtomValue};

/// Label reported for atoms that were never given a debug label.
pub const ANONYMOUS_LABEL: &str = "<anonymous>";

/// The atom's debug label, or [`ANONYMOUS_LABEL`].
pub fn display_label<T>(atom: &Atom<T>) -> String {
    atom.debug_label()
        .unwrap_or_else(|| ANONYMOUS_LABEL.to_string())
}

/// Build a listener that logs every new value of `atom` with a backtrace.
///
/// The label is read when each event fires, not when the logger is built,
/// so a later relabel of the shared atom shows up in subsequent events.
pub fn trace_logger<T>(atom: &Atom<T>) -> impl Fn(&T) + Send + Sync + 'static
where
    T: AtomValue + fmt::Debug,
{
    let atom = atom.clone();
    move |value: &T| {
        let label = display_label(&atom);
        let backtrace = Backtrace::force_capture();
        tracing::debug!(
            target: "accessor::debug",
            label = %label,
            atom = %atom.id(),
            value = ?value,
            backtrace = %backtrace,
            "accessor debug"
        );
    }
}
