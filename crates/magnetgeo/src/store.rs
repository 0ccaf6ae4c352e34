//! Record resolution by name.
//!
//! Composites hold bare record names. Whoever derives metadata from them
//! passes a [`Resolver`] that turns a name back into a full record: a
//! [`FileStore`] reading `{name}.{ext}` from a directory, a [`MemoryStore`]
//! for fixtures, or a [`CachedResolver`] in front of either.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use magnetgeo_ir::{Format, Record};
use tracing::{debug, warn};

use crate::error::{GeoError, Result};

/// Turns record names into records.
///
/// Records must not change while a derivation pass is running, so repeated
/// lookups of one name always agree.
pub trait Resolver {
    /// Load the record stored under `name`.
    fn record(&self, name: &str) -> Result<Record>;

    /// Load the raw text of an HTS stack configuration.
    fn config(&self, name: &str) -> Result<String>;
}

/// Resolve a child of `parent`, reporting any failure as a missing reference.
pub fn resolve_child(store: &dyn Resolver, parent: &str, name: &str) -> Result<Record> {
    store.record(name).map_err(|e| GeoError::MissingReference {
        name: name.to_string(),
        parent: parent.to_string(),
        source: Box::new(e),
    })
}

/// Records stored one per file in a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
    format: Format,
}

impl FileStore {
    /// Store rooted at `root`, using the TOML form.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            format: Format::Toml,
        }
    }

    /// Use another record format.
    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    /// Directory holding the records.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Record format in use.
    pub fn format(&self) -> Format {
        self.format
    }

    /// Path of the file holding record `name`.
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.{}", self.format.extension()))
    }

    /// Write `record` to `{name}.{ext}`.
    ///
    /// The text is written to a sibling temporary file first and renamed
    /// into place, so a failed dump never leaves a truncated record behind.
    pub fn dump(&self, record: &Record) -> Result<PathBuf> {
        let name = record.name();
        let text = record.encode(self.format)?;
        let path = self.path_for(name);
        let tmp = path.with_extension(format!("{}.tmp", self.format.extension()));
        let io_err = |source| GeoError::Io {
            name: name.to_string(),
            op: "dump",
            source,
        };
        fs::write(&tmp, text).map_err(io_err)?;
        fs::rename(&tmp, &path).map_err(io_err)?;
        debug!(name, path = %path.display(), "Dumped record");
        Ok(path)
    }

    fn read(&self, name: &str, path: &Path) -> Result<String> {
        fs::read_to_string(path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => GeoError::NotFound(name.to_string()),
            _ => GeoError::Io {
                name: name.to_string(),
                op: "load",
                source,
            },
        })
    }
}

impl Resolver for FileStore {
    fn record(&self, name: &str) -> Result<Record> {
        let path = self.path_for(name);
        let text = self.read(name, &path)?;
        let record = Record::decode(&text, self.format)?;
        if record.name() != name {
            warn!(file = %path.display(), record = record.name(), "Record name differs from its file name");
        }
        debug!(name, kind = record.kind(), "Loaded record");
        Ok(record)
    }

    fn config(&self, name: &str) -> Result<String> {
        let mut path = self.root.join(name);
        if path.extension().is_none() {
            path.set_extension("json");
        }
        self.read(name, &path)
    }
}

/// In-memory records, keyed by record name.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: HashMap<String, Record>,
    configs: HashMap<String, String>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a record under its own name, replacing any previous one.
    pub fn insert(&mut self, record: Record) {
        self.records.insert(record.name().to_string(), record);
    }

    /// Store an HTS stack configuration.
    pub fn insert_config(&mut self, name: impl Into<String>, text: impl Into<String>) {
        self.configs.insert(name.into(), text.into());
    }

    /// Builder-style [`MemoryStore::insert`].
    pub fn with(mut self, record: Record) -> Self {
        self.insert(record);
        self
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no record.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Resolver for MemoryStore {
    fn record(&self, name: &str) -> Result<Record> {
        self.records
            .get(name)
            .cloned()
            .ok_or_else(|| GeoError::NotFound(name.to_string()))
    }

    fn config(&self, name: &str) -> Result<String> {
        self.configs
            .get(name)
            .cloned()
            .ok_or_else(|| GeoError::NotFound(name.to_string()))
    }
}

/// Memoizes another resolver for the duration of one pass.
pub struct CachedResolver<'a> {
    inner: &'a dyn Resolver,
    records: RefCell<HashMap<String, Record>>,
}

impl<'a> CachedResolver<'a> {
    /// Cache lookups made through `inner`.
    pub fn new(inner: &'a dyn Resolver) -> Self {
        Self {
            inner,
            records: RefCell::new(HashMap::new()),
        }
    }

    /// Number of distinct records loaded so far.
    pub fn cached(&self) -> usize {
        self.records.borrow().len()
    }
}

impl Resolver for CachedResolver<'_> {
    fn record(&self, name: &str) -> Result<Record> {
        if let Some(record) = self.records.borrow().get(name) {
            return Ok(record.clone());
        }
        let record = self.inner.record(name)?;
        self.records
            .borrow_mut()
            .insert(name.to_string(), record.clone());
        Ok(record)
    }

    fn config(&self, name: &str) -> Result<String> {
        self.inner.config(name)
    }
}
