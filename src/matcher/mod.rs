//! # Subgraph Matcher
//!
//! Locates induced subgraphs of a target graph congruent to a compiled
//! construction.
//!
//! Matching never searches the target freely. The construction is walked
//! once at compile time, breadth-first from its head, producing a fixed
//! plan of steps ("reach pattern node B from already-mapped node A over an
//! `ARG2/NEQ` link, outgoing"). At match time the plan is replayed from each
//! candidate head, with a little backtracking when several target links fit
//! one step. A replayed correspondence is accepted only if every pattern link
//! is present and the target's signature, restricted to the mapped nodes and
//! labelled with the pattern nodes they matched, equals the construction's
//! head signature.

use hashbrown::{HashMap, HashSet};
use smallvec::SmallVec;

use crate::canon::{self, Signature, SignatureOptions};
use crate::model::{Direction, Graph, Link, Node, NodeId, Predicate, Span};
use crate::{Error, Result};

/// One replay step: reach `node` from the already-mapped `anchor`.
#[derive(Debug, Clone)]
struct Step {
    node: NodeId,
    anchor: NodeId,
    link: Link,
    /// Direction of `link` as seen from `anchor`.
    direction: Direction,
}

/// A construction compiled for matching.
#[derive(Debug, Clone)]
pub struct Pattern {
    graph: Graph,
    head: NodeId,
    head_predicate: Predicate,
    members: HashSet<NodeId>,
    signature: Signature,
    scan_outgoing: bool,
    adjacent: bool,
    plan: Vec<Step>,
    /// Pattern surface nodes in text order.
    surface: Vec<NodeId>,
}

/// A concrete pattern → target correspondence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    /// Target node matched by the pattern head.
    pub head: NodeId,
    /// `(pattern node, target node)` pairs, head first.
    pub pairs: SmallVec<[(NodeId, NodeId); 8]>,
}

impl Match {
    pub fn target_for(&self, pattern_node: NodeId) -> Option<NodeId> {
        self.pairs.iter().find(|(p, _)| *p == pattern_node).map(|(_, t)| *t)
    }

    /// Every matched target node.
    pub fn targets(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.pairs.iter().map(|(_, t)| *t)
    }

    /// Matched target nodes other than the head.
    pub fn complements(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.targets().filter(move |t| *t != self.head)
    }
}

impl Pattern {
    /// Compile `graph` around `head`.
    ///
    /// Quantifiers are never part of a pattern. The walk follows incoming
    /// links only, unless some non-quantifier node is unreachable that way,
    /// in which case outgoing links are scanned too.
    pub fn compile(graph: Graph, head: NodeId, adjacent: bool) -> Result<Pattern> {
        let head_predicate = graph.node(head)?.predicate.clone();
        let base = SignatureOptions { skip_quantifiers: true, ..Default::default() };
        let wanted = graph
            .nodes()
            .filter(|n| !n.predicate.is_quantifier())
            .count();
        let scan_outgoing = canon::reachable(&graph, head, &base).len() < wanted;
        let walk = base.scan_outgoing(scan_outgoing);
        let members = canon::reachable(&graph, head, &walk);
        if members.len() < wanted {
            return Err(Error::Structural(format!(
                "{} construction node(s) unreachable from head {head}",
                wanted - members.len()
            )));
        }

        let signature = canon::compute_signature(&graph, head, &walk.within(&members))?;
        let plan = plan_walk(&graph, head, &walk);
        let mut surface: Vec<&Node> = graph
            .nodes()
            .filter(|n| members.contains(&n.id) && n.predicate.is_real())
            .collect();
        surface.sort_by_key(|n| (n.span.cfrom, n.id));
        let surface = surface.into_iter().map(|n| n.id).collect();

        Ok(Pattern { graph, head, head_predicate, members, signature, scan_outgoing, adjacent, plan, surface })
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn head(&self) -> NodeId {
        self.head
    }

    pub fn head_predicate(&self) -> &Predicate {
        &self.head_predicate
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn scans_outgoing(&self) -> bool {
        self.scan_outgoing
    }

    pub fn requires_adjacency(&self) -> bool {
        self.adjacent
    }

    /// Pattern nodes taking part in matching (quantifiers excluded).
    pub fn members(&self) -> &HashSet<NodeId> {
        &self.members
    }

    fn options(&self) -> SignatureOptions<'_> {
        SignatureOptions { skip_quantifiers: true, ..Default::default() }.scan_outgoing(self.scan_outgoing)
    }

    // ========================================================================
    // Matching
    // ========================================================================

    /// All matches in `target`, in head insertion order.
    pub fn find_matches(&self, target: &Graph) -> Result<Vec<Match>> {
        let head_pred = &self.head_predicate;
        let mut matches = Vec::new();
        for node in target.nodes().filter(|n| head_pred.accepts(&n.predicate)) {
            if let Some(m) = self.match_at(target, node.id)? {
                matches.push(m);
            }
        }
        Ok(matches)
    }

    /// First match in `target`, if any.
    pub fn find_first(&self, target: &Graph) -> Result<Option<Match>> {
        let head_pred = &self.head_predicate;
        for node in target.nodes().filter(|n| head_pred.accepts(&n.predicate)) {
            if let Some(m) = self.match_at(target, node.id)? {
                return Ok(Some(m));
            }
        }
        Ok(None)
    }

    /// Try to match with the pattern head placed on `site`.
    pub fn match_at(&self, target: &Graph, site: NodeId) -> Result<Option<Match>> {
        let site_node = target.node(site)?;
        if !self.head_predicate.accepts(&site_node.predicate) {
            return Ok(None);
        }
        let mut pairs: SmallVec<[(NodeId, NodeId); 8]> = SmallVec::new();
        pairs.push((self.head, site));
        let mut used = HashSet::from([site]);
        if self.extend(target, 0, &mut pairs, &mut used)? {
            Ok(Some(Match { head: site, pairs }))
        } else {
            Ok(None)
        }
    }

    fn extend(
        &self,
        target: &Graph,
        step_idx: usize,
        pairs: &mut SmallVec<[(NodeId, NodeId); 8]>,
        used: &mut HashSet<NodeId>,
    ) -> Result<bool> {
        let Some(step) = self.plan.get(step_idx) else {
            return self.verify(target, pairs);
        };
        let anchor = pairs
            .iter()
            .find(|(p, _)| *p == step.anchor)
            .map(|(_, t)| *t)
            .ok_or_else(|| Error::Structural(format!("Unmapped anchor {}", step.anchor)))?;
        let wanted = self.graph.node(step.node)?;

        let candidates: Vec<NodeId> = target
            .links()
            .iter()
            .filter(|l| l.role == step.link.role && l.post == step.link.post)
            .filter_map(|l| match step.direction {
                Direction::Incoming if l.to == anchor => Some(l.from),
                Direction::Outgoing if l.from == anchor => Some(l.to),
                _ => None,
            })
            .filter(|c| !used.contains(c))
            .filter(|c| target.get_node(*c).is_some_and(|n| wanted.predicate.accepts(&n.predicate)))
            .collect();

        for candidate in candidates {
            pairs.push((step.node, candidate));
            used.insert(candidate);
            if self.extend(target, step_idx + 1, pairs, used)? {
                return Ok(true);
            }
            pairs.pop();
            used.remove(&candidate);
        }
        Ok(false)
    }

    fn verify(&self, target: &Graph, pairs: &[(NodeId, NodeId)]) -> Result<bool> {
        let lookup = |p: NodeId| pairs.iter().find(|(q, _)| *q == p).map(|(_, t)| *t);

        // Links off the plan's spanning tree must exist as well.
        for link in self.graph.links() {
            if let (Some(from), Some(to)) = (lookup(link.from), lookup(link.to)) {
                let mapped = Link::new(from, to, link.role.clone(), link.post);
                if !target.has_link(&mapped) {
                    return Ok(false);
                }
            }
        }

        // Each pair already passed `accepts`, so a mapped node is signed
        // with its pattern node's label: a sense-less or literal-free
        // pattern node stays a wildcard.
        let mapped: HashSet<NodeId> = pairs.iter().map(|(_, t)| *t).collect();
        let mut labels = HashMap::with_capacity(pairs.len());
        for (p, t) in pairs {
            labels.insert(*t, self.graph.node(*p)?.predicate.signature_label());
        }
        let site = pairs[0].1;
        let options = self.options().within(&mapped).labelled(&labels);
        let signature = canon::compute_signature(target, site, &options)?;
        if signature != self.signature {
            return Ok(false);
        }

        if self.adjacent {
            let mut spans = Vec::with_capacity(self.surface.len());
            for p in &self.surface {
                match lookup(*p) {
                    Some(t) => spans.push(target.node(t)?.span),
                    None => return Ok(false),
                }
            }
            if gaps(&spans) != self.pattern_gaps()? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn pattern_gaps(&self) -> Result<Vec<Option<usize>>> {
        let spans = self
            .surface
            .iter()
            .map(|id| self.graph.node(*id).map(|n| n.span))
            .collect::<Result<Vec<_>>>()?;
        Ok(gaps(&spans))
    }
}

/// Gap between consecutive spans; `None` where the order breaks or spans overlap.
fn gaps(spans: &[Span]) -> Vec<Option<usize>> {
    spans.windows(2).map(|w| w[0].gap_to(&w[1])).collect()
}

/// Breadth-first replay plan from `head`.
fn plan_walk(graph: &Graph, head: NodeId, options: &SignatureOptions) -> Vec<Step> {
    let mut plan = Vec::new();
    let mut seen: HashSet<NodeId> = HashSet::from([head]);
    let mut queue = std::collections::VecDeque::from([head]);
    while let Some(anchor) = queue.pop_front() {
        let incoming = graph
            .in_links(anchor)
            .map(|l| (l.from, l, Direction::Incoming));
        let outgoing = graph
            .out_links(anchor)
            .filter(|_| options.scan_outgoing)
            .map(|l| (l.to, l, Direction::Outgoing));
        for (node, link, direction) in incoming.chain(outgoing) {
            if options.admits(graph, node) && seen.insert(node) {
                plan.push(Step { node, anchor, link: link.clone(), direction });
                queue.push_back(node);
            }
        }
    }
    plan
}

// ============================================================================
// Tests
// ============================================================================
