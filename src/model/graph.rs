//! Graph: the DMRS container.
//!
//! Nodes live in an insertion-ordered arena with an id → slot index; links
//! are an ordered list of plain id pairs. Nothing holds a reference into
//! another node, so removal never leaves a live back-pointer behind.

use std::fmt;

use hashbrown::{HashMap, HashSet};
use serde::{Deserialize, Serialize};

use super::{Link, Node, NodeId};
use crate::{Error, Result};

/// A DMRS graph for one parse.
///
/// Deserialization replays every node, link and the top through the
/// checked builders, so a decoded graph is indexed and valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GraphData")]
pub struct Graph {
    nodes: Vec<Node>,
    #[serde(skip)]
    index: HashMap<NodeId, usize>,
    links: Vec<Link>,
    top: Option<NodeId>,
    /// Source sentence, when known.
    pub surface: Option<String>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_surface(surface: impl Into<String>) -> Self {
        Self { surface: Some(surface.into()), ..Self::default() }
    }

    // ========================================================================
    // Construction
    // ========================================================================

    /// Add a node. Fails if its id is already taken.
    pub fn add_node(&mut self, node: Node) -> Result<NodeId> {
        let id = node.id;
        if self.index.contains_key(&id) {
            return Err(Error::Structural(format!("Duplicate node id {id}")));
        }
        self.index.insert(id, self.nodes.len());
        self.nodes.push(node);
        Ok(id)
    }

    /// Add a link. Both endpoints must exist.
    pub fn add_link(&mut self, link: Link) -> Result<()> {
        if !self.contains(link.from) {
            return Err(Error::NotFound(format!("Source node {}", link.from)));
        }
        if !self.contains(link.to) {
            return Err(Error::NotFound(format!("Target node {}", link.to)));
        }
        self.links.push(link);
        Ok(())
    }

    /// Point the top pseudo-link at `id`.
    pub fn set_top(&mut self, id: NodeId) -> Result<()> {
        if !self.contains(id) {
            return Err(Error::NotFound(format!("Top node {id}")));
        }
        self.top = Some(id);
        Ok(())
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    pub fn top(&self) -> Option<NodeId> {
        self.top
    }

    /// The node referenced by the top link.
    pub fn head(&self) -> Option<&Node> {
        self.top.and_then(|id| self.get_node(id))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.index.get(&id).map(|&slot| &self.nodes[slot])
    }

    /// Node by id, or `NotFound`.
    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.get_node(id).ok_or_else(|| Error::NotFound(format!("Node {id}")))
    }

    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        match self.index.get(&id) {
            Some(&slot) => Ok(&mut self.nodes[slot]),
            None => Err(Error::NotFound(format!("Node {id}"))),
        }
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.iter().map(|n| n.id).collect()
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Links ending at `id`, in graph link order.
    pub fn in_links(&self, id: NodeId) -> impl Iterator<Item = &Link> {
        self.links.iter().filter(move |l| l.to == id)
    }

    /// Links starting at `id`, in graph link order.
    pub fn out_links(&self, id: NodeId) -> impl Iterator<Item = &Link> {
        self.links.iter().filter(move |l| l.from == id)
    }

    pub fn has_link(&self, link: &Link) -> bool {
        self.links.contains(link)
    }

    /// Outgoing link target by role (`ARG1`, `RSTR`, ...).
    pub fn arg(&self, id: NodeId, role: &str) -> Option<NodeId> {
        self.out_links(id).find(|l| l.role == role).map(|l| l.to)
    }

    /// Distinct predicate names, in node insertion order.
    pub fn predicates(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.nodes
            .iter()
            .map(|n| n.predicate.name())
            .filter(|name| seen.insert(name.clone()))
            .collect()
    }

    /// Quantifier nodes restricting `id` through an `RSTR` link.
    pub fn quantifiers_of(&self, id: NodeId) -> Vec<NodeId> {
        self.in_links(id)
            .filter(|l| l.is_rstr())
            .map(|l| l.from)
            .filter(|q| self.get_node(*q).is_some_and(|n| n.predicate.is_quantifier()))
            .collect()
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Remove nodes and every link touching them. Clears top when its
    /// target goes. Returns the number of nodes actually removed.
    pub fn remove_nodes(&mut self, ids: &[NodeId]) -> usize {
        let doomed: HashSet<NodeId> = ids.iter().copied().filter(|id| self.contains(*id)).collect();
        if doomed.is_empty() {
            return 0;
        }
        self.nodes.retain(|n| !doomed.contains(&n.id));
        self.links.retain(|l| !doomed.contains(&l.from) && !doomed.contains(&l.to));
        if self.top.is_some_and(|t| doomed.contains(&t)) {
            self.top = None;
        }
        self.reindex();
        doomed.len()
    }

    /// Move every link endpoint at `from` onto `to`, skipping links for
    /// which `keep` returns true. Links that collapse into self-loops or
    /// duplicate an existing link are dropped. Returns links moved.
    pub fn redirect_links(&mut self, from: NodeId, to: NodeId, keep: impl Fn(&Link) -> bool) -> usize {
        let mut moved = 0;
        let mut result: Vec<Link> = Vec::with_capacity(self.links.len());
        for mut link in std::mem::take(&mut self.links) {
            if link.touches(from) && !keep(&link) {
                if link.from == from { link.from = to; }
                if link.to == from { link.to = to; }
                moved += 1;
                if link.from == link.to || result.contains(&link) {
                    continue;
                }
            }
            result.push(link);
        }
        self.links = result;
        moved
    }

    /// Re-check every invariant: unique ids, live link endpoints, live top.
    pub fn validate(&self) -> Result<()> {
        if self.index.len() != self.nodes.len() {
            return Err(Error::Structural("Node index out of sync with arena".into()));
        }
        for link in &self.links {
            if !self.contains(link.from) || !self.contains(link.to) {
                return Err(Error::Structural(format!("Dangling link {link}")));
            }
        }
        if let Some(top) = self.top {
            if !self.contains(top) {
                return Err(Error::Structural(format!("Top references missing node {top}")));
            }
        }
        Ok(())
    }

    /// Rebuild the id → slot index.
    pub fn reindex(&mut self) {
        self.index = self.nodes.iter().enumerate().map(|(slot, n)| (n.id, slot)).collect();
    }
}

/// Wire form of a [`Graph`]: everything but the index.
#[derive(Deserialize)]
struct GraphData {
    nodes: Vec<Node>,
    links: Vec<Link>,
    top: Option<NodeId>,
    #[serde(default)]
    surface: Option<String>,
}

impl TryFrom<GraphData> for Graph {
    type Error = Error;

    fn try_from(data: GraphData) -> Result<Self> {
        let mut graph = Graph { surface: data.surface, ..Graph::default() };
        for node in data.nodes {
            graph.add_node(node)?;
        }
        for link in data.links {
            graph.add_link(link)?;
        }
        if let Some(top) = data.top {
            graph.set_top(top)?;
        }
        Ok(graph)
    }
}

impl fmt::Display for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::notation::write(self))
    }
}

// ============================================================================
// Tests
// ============================================================================
