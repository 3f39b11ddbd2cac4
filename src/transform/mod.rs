//! # Transformer
//!
//! One normalization pass over a parse graph:
//!
//! 1. collapse named-entity chains (optional, on by default);
//! 2. look up rules for every distinct predicate in the graph, hand-authored
//!    rules first, then repository rules;
//! 3. apply each rule until it no longer matches, sweeping again while any
//!    sweep still rewrites something;
//! 4. validate the graph.
//!
//! A second pass over the result is a no-op.

use std::sync::Arc;

use hashbrown::{HashMap, HashSet};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::model::{Graph, Predicate};
use crate::repository::{self, RepositoryConfig, RuleCache, RuleRecord, RuleRepository};
use crate::rule::{named, Rule};
use crate::Result;

// ============================================================================
// Configuration
// ============================================================================

/// Transformer settings, deserializable from JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformerConfig {
    /// Collapse compound/named chains before applying rules.
    pub collapse_named: bool,
    pub repository: RepositoryConfig,
}

impl Default for TransformerConfig {
    fn default() -> Self {
        Self { collapse_named: true, repository: RepositoryConfig::None }
    }
}

impl TransformerConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Counters for one `process` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformStats {
    pub chains_collapsed: usize,
    pub rules_applied: usize,
    pub nodes_removed: usize,
}

impl TransformStats {
    pub fn is_noop(&self) -> bool {
        *self == Self::default()
    }
}

// ============================================================================
// Transformer
// ============================================================================

type RuleSet = Arc<Vec<Arc<Rule>>>;

pub struct Transformer {
    config: TransformerConfig,
    /// hand-authored rules by head predicate
    hand: HashMap<String, Vec<Arc<Rule>>>,
    cache: Option<RuleCache>,
    /// lookup key → hand rules followed by repository rules
    index: RwLock<HashMap<String, RuleSet>>,
}

impl Transformer {
    /// Hand-authored rules only.
    pub fn new(rules: Vec<Rule>) -> Self {
        Self::build(TransformerConfig::default(), rules, None)
    }

    pub fn with_repository(rules: Vec<Rule>, repository: Arc<dyn RuleRepository>) -> Self {
        Self::build(TransformerConfig::default(), rules, Some(repository))
    }

    /// Open the configured repository. Never fails: an unavailable repository
    /// leaves the hand-authored rules in charge.
    pub fn open(config: TransformerConfig, rules: Vec<Rule>) -> Self {
        let repository = match repository::open(&config.repository) {
            Ok(repository) => repository,
            Err(e) => {
                warn!(error = %e, "rule repository unavailable, using hand-authored rules only");
                None
            }
        };
        Self::build(config, rules, repository)
    }

    /// Build hand-authored rules from records, then open the configured
    /// repository. A record that fails to build is logged and skipped.
    pub fn from_records(config: TransformerConfig, records: &[RuleRecord]) -> Self {
        let mut rules = Vec::with_capacity(records.len());
        for record in records {
            match Rule::from_record(record) {
                Ok(rule) => rules.push(rule),
                Err(e) => warn!(rule = %record.id, error = %e, "skipping invalid hand-authored rule"),
            }
        }
        Self::open(config, rules)
    }

    fn build(config: TransformerConfig, rules: Vec<Rule>, repository: Option<Arc<dyn RuleRepository>>) -> Self {
        let mut hand: HashMap<String, Vec<Arc<Rule>>> = HashMap::new();
        for rule in rules {
            hand.entry(rule.head_predicate()).or_default().push(Arc::new(rule));
        }
        Self {
            config,
            hand,
            cache: repository.map(RuleCache::new),
            index: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &TransformerConfig {
        &self.config
    }

    pub fn has_repository(&self) -> bool {
        self.cache.is_some()
    }

    pub fn hand_rule_count(&self) -> usize {
        self.hand.values().map(Vec::len).sum()
    }

    /// Rules whose head could match a node carrying `predicate`. A rule
    /// written without a sense is found for every sense of its lemma.
    pub fn rules_for(&self, predicate: &Predicate) -> Result<Vec<Arc<Rule>>> {
        let mut keys = vec![predicate.name()];
        if let Predicate::Real { lemma, pos, sense: Some(_) } = predicate {
            keys.push(Predicate::real(lemma.as_str(), pos.as_str(), None).name());
        }
        let mut rules = Vec::new();
        for key in keys {
            rules.extend(self.rules_for_key(&key)?.iter().cloned());
        }
        Ok(rules)
    }

    fn rules_for_key(&self, key: &str) -> Result<RuleSet> {
        if let Some(rules) = self.index.read().get(key) {
            return Ok(rules.clone());
        }
        let mut rules: Vec<Arc<Rule>> = self.hand.get(key).cloned().unwrap_or_default();
        if let Some(cache) = &self.cache {
            rules.extend(cache.rules_for(key)?);
        }
        let rules = Arc::new(rules);
        self.index.write().insert(key.to_string(), rules.clone());
        Ok(rules)
    }

    /// Normalize `graph` in place.
    pub fn process(&self, graph: &mut Graph) -> Result<TransformStats> {
        let mut stats = TransformStats::default();

        if self.config.collapse_named {
            let before = graph.node_count();
            stats.chains_collapsed = named::collapse_all(graph)?;
            stats.nodes_removed += before - graph.node_count();
        }

        loop {
            let applied = self.sweep(graph, &mut stats)?;
            if applied == 0 {
                break;
            }
        }

        graph.validate()?;
        debug!(
            chains = stats.chains_collapsed,
            rules = stats.rules_applied,
            removed = stats.nodes_removed,
            "transformed graph"
        );
        Ok(stats)
    }

    /// One pass over the distinct predicates present now. Returns the
    /// number of rewrites made.
    fn sweep(&self, graph: &mut Graph, stats: &mut TransformStats) -> Result<usize> {
        let mut seen = HashSet::new();
        let predicates: Vec<Predicate> = graph
            .nodes()
            .map(|n| n.predicate.clone())
            .filter(|p| seen.insert(p.name()))
            .collect();

        let mut applied = 0;
        for predicate in &predicates {
            for rule in self.rules_for(predicate)? {
                // Every application removes at least one node, so this ends.
                while let Some(m) = rule.find_first(graph)? {
                    stats.nodes_removed += rule.apply(graph, &m)?;
                    stats.rules_applied += 1;
                    applied += 1;
                }
            }
        }
        Ok(applied)
    }
}

impl std::fmt::Debug for Transformer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transformer")
            .field("config", &self.config)
            .field("hand_rules", &self.hand_rule_count())
            .field("cache", &self.cache)
            .finish()
    }
}
