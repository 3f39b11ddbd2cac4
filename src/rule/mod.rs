//! # Rewrite Rules
//!
//! A [`Rule`] pairs a construction (a small template graph) with a fused
//! target lemma. Applying it to a match renames the matched head, widens its
//! span over an immediately preceding complement and deletes every
//! complement node.
//!
//! Rules are validated once, at construction. A rule that exists can always
//! be matched and applied.

pub mod named;

use tracing::debug;

use crate::matcher::{Match, Pattern};
use crate::model::{Graph, NodeId, Predicate};
use crate::notation;
use crate::repository::RuleRecord;
use crate::{Error, Result};

/// Rule identifier (repository key or hand-authored name).
pub type RuleId = String;

/// A multiword-expression rewrite rule.
#[derive(Debug, Clone)]
pub struct Rule {
    id: RuleId,
    lemma: String,
    pos: Option<String>,
    pattern: Pattern,
}

impl Rule {
    /// Build a rule from a construction graph whose top link names the head.
    ///
    /// Fails with `Error::Construction` when the construction has no head,
    /// the head is not a surface predicate, the head lacks the required
    /// part-of-speech, some construction node is unreachable from it, or
    /// nothing besides the head would be rewritten.
    pub fn new(
        id: impl Into<RuleId>,
        construction: Graph,
        lemma: impl Into<String>,
        pos: Option<&str>,
        adjacent: bool,
    ) -> Result<Rule> {
        let id = id.into();
        let lemma = lemma.into();
        let fail = |message: String| Error::Construction { rule: id.clone(), message };

        if lemma.trim().is_empty() {
            return Err(fail("empty target lemma".into()));
        }
        let head = construction.head().ok_or_else(|| fail("construction has no top node".into()))?;
        let head_pos = head
            .predicate
            .pos()
            .ok_or_else(|| fail(format!("head {} is not a surface predicate", head.predicate)))?;
        if let Some(required) = pos {
            if head_pos != required {
                return Err(fail(format!(
                    "head {} has part-of-speech '{head_pos}', '{required}' required",
                    head.predicate
                )));
            }
        }
        let head_id = head.id;
        let pattern = Pattern::compile(construction, head_id, adjacent).map_err(|e| fail(e.to_string()))?;
        if pattern.members().len() < 2 {
            return Err(fail("construction has no complement nodes".into()));
        }

        Ok(Rule { id, lemma, pos: pos.map(str::to_string), pattern })
    }

    /// Build a rule from construction notation.
    pub fn from_notation(
        id: impl Into<RuleId>,
        construction: &str,
        lemma: impl Into<String>,
        pos: Option<&str>,
        adjacent: bool,
    ) -> Result<Rule> {
        let id = id.into();
        let graph = notation::parse(construction).map_err(|e| Error::Construction {
            rule: id.clone(),
            message: e.to_string(),
        })?;
        Rule::new(id, graph, lemma, pos, adjacent)
    }

    /// Materialize a repository record.
    pub fn from_record(record: &RuleRecord) -> Result<Rule> {
        Rule::from_notation(
            record.id.clone(),
            &record.construction,
            record.lemma.clone(),
            record.pos.as_deref(),
            record.adjacent,
        )
    }

    /// Persistable form, for the offline repository builder.
    pub fn to_record(&self) -> RuleRecord {
        RuleRecord {
            id: self.id.clone(),
            head: self.head_predicate(),
            lemma: self.lemma.clone(),
            pos: self.pos.clone(),
            adjacent: self.pattern.requires_adjacency(),
            construction: notation::write(self.construction()),
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Fused target lemma.
    pub fn lemma(&self) -> &str {
        &self.lemma
    }

    pub fn pos(&self) -> Option<&str> {
        self.pos.as_deref()
    }

    /// Head predicate string; the key rules are indexed under.
    pub fn head_predicate(&self) -> String {
        self.pattern.head_predicate().name()
    }

    pub fn construction(&self) -> &Graph {
        self.pattern.graph()
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn head_signature(&self) -> &crate::canon::Signature {
        self.pattern.signature()
    }

    pub fn requires_adjacency(&self) -> bool {
        self.pattern.requires_adjacency()
    }

    // ========================================================================
    // Matching and rewriting
    // ========================================================================

    pub fn find_matches(&self, graph: &Graph) -> Result<Vec<Match>> {
        self.pattern.find_matches(graph)
    }

    pub fn find_first(&self, graph: &Graph) -> Result<Option<Match>> {
        self.pattern.find_first(graph)
    }

    /// Rewrite `graph` in place for one match. Returns the number of nodes
    /// removed. Callers must not hold on to ids of the removed nodes.
    pub fn apply(&self, graph: &mut Graph, m: &Match) -> Result<usize> {
        let head = graph.node(m.head)?;
        let head_pos = head.predicate.pos().unwrap_or_default().to_string();
        let mut span = head.span;

        let complements: Vec<NodeId> = m.complements().collect();
        let mut surface = Vec::new();
        for id in &complements {
            let node = graph.node(*id)?;
            if node.predicate.is_real() {
                surface.push(node.span);
            }
        }
        // Grow leftwards across complements that end where the head starts.
        surface.sort_by(|a, b| b.cfrom.cmp(&a.cfrom));
        for s in surface {
            if s.cto <= span.cfrom && span.cfrom - s.cto <= 1 {
                span.cfrom = s.cfrom;
            }
        }

        let mut doomed = complements.clone();
        for id in &complements {
            for q in graph.quantifiers_of(*id) {
                if q != m.head && !doomed.contains(&q) {
                    doomed.push(q);
                }
            }
        }

        let node = graph.node_mut(m.head)?;
        node.predicate = Predicate::real(self.lemma.clone(), head_pos, None);
        node.span = span;
        if graph.top().is_some_and(|t| complements.contains(&t)) {
            graph.set_top(m.head)?;
        }
        let removed = graph.remove_nodes(&doomed);
        debug!(rule = %self.id, head = %m.head, removed, "applied rewrite rule");
        Ok(removed)
    }
}

// ============================================================================
// Tests
// ============================================================================
