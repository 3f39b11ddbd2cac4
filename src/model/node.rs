//! Node in the DMRS graph.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use super::Predicate;

/// Graph-local node identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Half-open character span `[cfrom, cto)` into the source sentence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Span {
    pub cfrom: usize,
    pub cto: usize,
}

impl Span {
    pub fn new(cfrom: usize, cto: usize) -> Self {
        Self { cfrom, cto }
    }

    /// Smallest span covering both.
    pub fn cover(self, other: Span) -> Span {
        Span {
            cfrom: self.cfrom.min(other.cfrom),
            cto: self.cto.max(other.cto),
        }
    }

    /// Characters between the end of `self` and the start of `next`.
    /// `None` when `next` does not start at or after `self` ends.
    pub fn gap_to(&self, next: &Span) -> Option<usize> {
        next.cfrom.checked_sub(self.cto)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}:{}>", self.cfrom, self.cto)
    }
}

/// Morphosyntactic features (`cvarsort`, `num`, `pers`, `tense`, ...).
pub type SortInfo = HashMap<String, String>;

/// A sense tag assigned by an external WSD component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenseTag {
    pub id: String,
    pub lemma: String,
}

/// A node in the DMRS graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub predicate: Predicate,
    pub span: Span,
    pub sortinfo: SortInfo,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub senses: Vec<SenseTag>,
}

impl Node {
    pub fn new(id: NodeId, predicate: impl Into<Predicate>) -> Self {
        Self {
            id,
            predicate: predicate.into(),
            span: Span::default(),
            sortinfo: SortInfo::new(),
            senses: Vec::new(),
        }
    }

    pub fn with_span(mut self, cfrom: usize, cto: usize) -> Self {
        self.span = Span::new(cfrom, cto);
        self
    }

    pub fn with_carg(mut self, carg: impl Into<String>) -> Self {
        self.predicate = Predicate::constant(self.predicate.name(), carg);
        self
    }

    pub fn with_sort(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.sortinfo.insert(key.into(), value.into());
        self
    }

    pub fn with_sense(mut self, id: impl Into<String>, lemma: impl Into<String>) -> Self {
        self.senses.push(SenseTag { id: id.into(), lemma: lemma.into() });
        self
    }

    pub fn cvarsort(&self) -> Option<&str> {
        self.sortinfo.get("cvarsort").map(String::as_str)
    }

    /// `named` string constant node.
    pub fn is_named(&self) -> bool {
        matches!(&self.predicate, super::Predicate::StringConstant { name, .. } if name == "named")
    }

    pub fn is_compound(&self) -> bool {
        self.predicate.matches("compound")
    }
}
