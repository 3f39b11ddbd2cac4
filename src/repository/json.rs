//! JSON-file rule repository.
//!
//! ```json
//! { "version": 1, "rules": [ { "id": "...", "head": "_dog_n_1", ... } ] }
//! ```
//!
//! The whole document is read on open; lookups never touch the disk.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::rule::RuleId;
use crate::{Error, Result};
use super::{MemoryRepository, RuleRecord, RuleRepository};

/// Document format version written by [`JsonRepository::save`].
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct Document {
    version: u32,
    #[serde(default)]
    rules: Vec<RuleRecord>,
}

/// Rule repository backed by a JSON document.
#[derive(Debug, Clone)]
pub struct JsonRepository {
    path: PathBuf,
    rules: MemoryRepository,
}

impl JsonRepository {
    /// Read the document at `path`. A missing, unreadable or malformed file
    /// is `Error::RepositoryUnavailable`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let unavailable = |reason: String| Error::RepositoryUnavailable(format!("{}: {reason}", path.display()));

        let text = fs::read_to_string(&path).map_err(|e| unavailable(e.to_string()))?;
        let document: Document = serde_json::from_str(&text).map_err(|e| unavailable(e.to_string()))?;
        if document.version != FORMAT_VERSION {
            return Err(unavailable(format!("unsupported format version {}", document.version)));
        }

        let rules = MemoryRepository::new();
        for record in document.rules {
            rules.insert(record);
        }
        Ok(Self { path, rules })
    }

    /// Empty repository that will be written to `path` on [`save`](Self::save).
    pub fn create(path: impl AsRef<Path>) -> Self {
        Self { path: path.as_ref().to_path_buf(), rules: MemoryRepository::new() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn insert(&self, record: RuleRecord) {
        self.rules.insert(record);
    }

    /// Write the document back, records sorted by id.
    pub fn save(&self) -> Result<()> {
        let document = Document { version: FORMAT_VERSION, rules: self.rules.records() };
        let text = serde_json::to_string_pretty(&document)?;
        fs::write(&self.path, text)?;
        Ok(())
    }
}

impl RuleRepository for JsonRepository {
    fn by_head_predicate(&self, predicate: &str) -> Result<Vec<RuleId>> {
        self.rules.by_head_predicate(predicate)
    }

    fn get(&self, id: &str) -> Result<Option<RuleRecord>> {
        self.rules.get(id)
    }

    fn len(&self) -> usize {
        self.rules.len()
    }
}
