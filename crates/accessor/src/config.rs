use accessor_store::Store;

/// Per-accessor construction options.
///
/// Both fields are optional. A missing store resolves to the ambient store
/// at construction time; a missing label leaves the atom's label untouched.
#[derive(Clone, Debug, Default)]
pub struct AccessorOptions {
    /// Store the accessor is bound to.
    pub store: Option<Store>,
    /// Label written onto the atom for diagnostics.
    pub debug_label: Option<String>,
}

impl AccessorOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_store(mut self, store: Store) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_debug_label(mut self, label: impl Into<String>) -> Self {
        self.debug_label = Some(label.into());
        self
    }
}
