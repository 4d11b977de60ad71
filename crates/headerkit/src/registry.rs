//! Name-based registries for parser backends and writers.
//!
//! Registries are plain values built explicitly by the caller; nothing
//! registers itself at load time. [`BackendRegistry::with_builtins`] and
//! [`WriterRegistry::with_builtins`] construct the stock configuration.
//!
//! Registration order is significant: the first registered entry is the
//! default.

use headerkit_c::CBackend;
use headerkit_diff::DiffWriter;
use headerkit_ir::{HeaderWriter, ParserBackend};
use headerkit_writers::{CdefWriter, JsonWriter};

/// Registry of named [`ParserBackend`] implementations.
#[derive(Default)]
pub struct BackendRegistry {
    entries: Vec<(String, Box<dyn ParserBackend>)>,
}

impl BackendRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in backends, with `"c"` as default.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("c", Box::new(CBackend::new()));
        registry
    }

    /// Register a backend. Re-registering a name replaces the previous
    /// entry without changing its position.
    pub fn register(&mut self, name: impl Into<String>, backend: Box<dyn ParserBackend>) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = backend,
            None => self.entries.push((name, backend)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&dyn ParserBackend> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, b)| b.as_ref())
    }

    /// The first registered backend.
    pub fn default_backend(&self) -> Option<&dyn ParserBackend> {
        self.entries.first().map(|(_, b)| b.as_ref())
    }

    pub fn is_available(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Registered names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(n, _)| n.as_str()).collect()
    }
}

/// Registry of named [`HeaderWriter`] implementations.
#[derive(Default)]
pub struct WriterRegistry {
    entries: Vec<(String, Box<dyn HeaderWriter>)>,
}

impl WriterRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in writers in their default
    /// configuration: `"cdef"`, `"json"`, and `"diff"`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("cdef", Box::new(CdefWriter::default()));
        registry.register("json", Box::new(JsonWriter::default()));
        registry.register("diff", Box::new(DiffWriter::new(Default::default())));
        registry
    }

    /// Register a writer. Re-registering a name replaces the previous
    /// entry without changing its position.
    pub fn register(&mut self, name: impl Into<String>, writer: Box<dyn HeaderWriter>) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = writer,
            None => self.entries.push((name, writer)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&dyn HeaderWriter> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, w)| w.as_ref())
    }

    /// The first registered writer.
    pub fn default_writer(&self) -> Option<&dyn HeaderWriter> {
        self.entries.first().map(|(_, w)| w.as_ref())
    }

    pub fn is_available(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Registered names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(n, _)| n.as_str()).collect()
    }
}
