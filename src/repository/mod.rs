//! # Rule Repository
//!
//! Persisted mapping from head predicate to rule constructions. The
//! transformer looks rules up by the predicates it sees in a graph, so the
//! repository is keyed by head predicate string.
//!
//! ## Implementations
//!
//! | Repository | Module | Description |
//! |------------|--------|-------------|
//! | `MemoryRepository` | `memory` | In-memory, for tests and the offline builder |
//! | `JsonRepository` | `json` | JSON document on disk |
//!
//! [`RuleCache`] sits in front of either and materializes each stored
//! construction into a [`Rule`] at most once.

pub mod memory;
pub mod json;

use std::path::PathBuf;
use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::rule::{Rule, RuleId};
use crate::Result;

pub use memory::MemoryRepository;
pub use json::JsonRepository;

// ============================================================================
// Records
// ============================================================================

/// One stored rule. `construction` holds the construction in notation form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleRecord {
    pub id: RuleId,
    /// Head predicate string, e.g. `_dog_n_1`.
    pub head: String,
    pub lemma: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pos: Option<String>,
    #[serde(default)]
    pub adjacent: bool,
    pub construction: String,
}

// ============================================================================
// Repository Configuration
// ============================================================================

/// Which rule repository a transformer consults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RepositoryConfig {
    /// Hand-authored rules only.
    #[default]
    None,

    /// Records supplied inline.
    Memory {
        #[serde(default)]
        rules: Vec<RuleRecord>,
    },

    /// JSON document on disk.
    Json { path: PathBuf },
}

/// Open the configured repository. `Ok(None)` when none is configured.
pub fn open(config: &RepositoryConfig) -> Result<Option<Arc<dyn RuleRepository>>> {
    match config {
        RepositoryConfig::None => Ok(None),
        RepositoryConfig::Memory { rules } => {
            let repo = MemoryRepository::new();
            for record in rules {
                repo.insert(record.clone());
            }
            Ok(Some(Arc::new(repo)))
        }
        RepositoryConfig::Json { path } => {
            let repo = JsonRepository::open(path)?;
            info!(path = %path.display(), rules = repo.len(), "opened rule repository");
            Ok(Some(Arc::new(repo)))
        }
    }
}

// ============================================================================
// The Trait
// ============================================================================

/// Read side of a rule store.
pub trait RuleRepository: Send + Sync {
    /// Ids of the rules whose head predicate is `predicate`, in stable order.
    fn by_head_predicate(&self, predicate: &str) -> Result<Vec<RuleId>>;

    /// Look up one record.
    fn get(&self, id: &str) -> Result<Option<RuleRecord>>;

    /// Number of stored records.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// Materialized-rule cache
// ============================================================================

/// Lazily materialized rules over a repository.
///
/// Each entry is built once. Records that fail to build are remembered as
/// absent, so the failure is logged a single time.
pub struct RuleCache {
    repository: Arc<dyn RuleRepository>,
    by_head: RwLock<HashMap<String, Vec<RuleId>>>,
    rules: RwLock<HashMap<RuleId, Option<Arc<Rule>>>>,
}

impl RuleCache {
    pub fn new(repository: Arc<dyn RuleRepository>) -> Self {
        Self {
            repository,
            by_head: RwLock::new(HashMap::new()),
            rules: RwLock::new(HashMap::new()),
        }
    }

    pub fn repository(&self) -> &Arc<dyn RuleRepository> {
        &self.repository
    }

    /// Materialized rules whose head predicate is `predicate`.
    pub fn rules_for(&self, predicate: &str) -> Result<Vec<Arc<Rule>>> {
        let cached = self.by_head.read().get(predicate).cloned();
        let ids = match cached {
            Some(ids) => ids,
            None => {
                let ids = self.repository.by_head_predicate(predicate)?;
                self.by_head.write().insert(predicate.to_string(), ids.clone());
                ids
            }
        };

        let mut rules = Vec::with_capacity(ids.len());
        for id in &ids {
            if let Some(rule) = self.rule(id)? {
                rules.push(rule);
            }
        }
        Ok(rules)
    }

    /// Materialize one rule, consulting the cache first.
    pub fn rule(&self, id: &str) -> Result<Option<Arc<Rule>>> {
        if let Some(entry) = self.rules.read().get(id) {
            return Ok(entry.clone());
        }

        let built = match self.repository.get(id)? {
            None => {
                warn!(rule = %id, "rule listed by repository but not stored");
                None
            }
            Some(record) => match Rule::from_record(&record) {
                Ok(rule) => Some(Arc::new(rule)),
                Err(e) => {
                    warn!(rule = %id, error = %e, "rejected repository rule");
                    None
                }
            },
        };
        // A concurrent builder may have won; keep whichever landed first.
        let mut rules = self.rules.write();
        Ok(rules.entry(id.to_string()).or_insert(built).clone())
    }

    /// Number of materialized entries, absent ones included.
    pub fn cached(&self) -> usize {
        self.rules.read().len()
    }
}

impl std::fmt::Debug for RuleCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleCache")
            .field("stored", &self.repository.len())
            .field("cached", &self.cached())
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn guard_dog_record() -> RuleRecord {
        RuleRecord {
            id: "guard+dog".into(),
            head: "_dog_n_1".into(),
            lemma: "guard+dog".into(),
            pos: Some("n".into()),
            adjacent: true,
            construction: "dmrs {
                2 [_guard_n_1<0:5> x];
                3 [_dog_n_1<6:9> x];
                4 [compound<0:9> e];
                0:/H -> 3;
                4:ARG1/EQ -> 3;
                4:ARG2/NEQ -> 2;
            }"
            .into(),
        }
    }

    fn broken_record() -> RuleRecord {
        RuleRecord {
            id: "broken".into(),
            head: "_dog_n_1".into(),
            lemma: "x".into(),
            pos: None,
            adjacent: false,
            construction: "dmrs { 3 [_dog_n_1]".into(),
        }
    }

    #[test]
    fn test_cache_materializes_once() {
        let repo = MemoryRepository::new();
        repo.insert(guard_dog_record());
        let cache = RuleCache::new(Arc::new(repo));

        let first = cache.rules_for("_dog_n_1").unwrap();
        let second = cache.rules_for("_dog_n_1").unwrap();
        assert_eq!(first.len(), 1);
        assert!(Arc::ptr_eq(&first[0], &second[0]));
        assert_eq!(cache.cached(), 1);
    }

    #[test]
    fn test_cache_skips_broken_records() {
        let repo = MemoryRepository::new();
        repo.insert(guard_dog_record());
        repo.insert(broken_record());
        let cache = RuleCache::new(Arc::new(repo));

        let rules = cache.rules_for("_dog_n_1").unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].id(), "guard+dog");
        assert_eq!(cache.cached(), 2);
        assert!(cache.rule("broken").unwrap().is_none());
    }

    #[test]
    fn test_unknown_predicate() {
        let cache = RuleCache::new(Arc::new(MemoryRepository::new()));
        assert!(cache.rules_for("_cat_n_1").unwrap().is_empty());
    }

    #[test]
    fn test_open_config() {
        assert!(open(&RepositoryConfig::None).unwrap().is_none());

        let config = RepositoryConfig::Memory { rules: vec![guard_dog_record()] };
        let repo = open(&config).unwrap().unwrap();
        assert_eq!(repo.len(), 1);

        let missing = RepositoryConfig::Json { path: "/nonexistent/rules.json".into() };
        assert!(matches!(open(&missing), Err(crate::Error::RepositoryUnavailable(_))));
    }

    #[test]
    fn test_config_from_json() {
        let config: RepositoryConfig =
            serde_json::from_str(r#"{ "kind": "json", "path": "rules.json" }"#).unwrap();
        assert_eq!(config, RepositoryConfig::Json { path: "rules.json".into() });
    }
}
