//! # Canonical Signatures
//!
//! A [`Signature`] is a renumbering-invariant structural fingerprint of a
//! node and the fragment around it. Two nodes are structurally
//! interchangeable iff their signatures are equal.
//!
//! Children are sorted by `(role, direction, post, child)` before inclusion,
//! so neither node ids nor link insertion order leak into the value. Cycles
//! are cut with a [`Signature::BackRef`] sentinel for any node already on the
//! current walk path, and a hard depth limit fails closed with
//! [`Signature::Truncated`].

use std::collections::VecDeque;
use std::fmt;

use hashbrown::{HashMap, HashSet};
use serde::{Deserialize, Serialize};

use crate::model::{Direction, Graph, NodeId, Post, Predicate};
use crate::Result;

/// Depth limit used when none is configured.
pub const DEFAULT_MAX_DEPTH: usize = 16;

/// Structural fingerprint of a node and its neighbourhood.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Signature {
    Node { label: String, children: Vec<SignatureEdge> },
    /// Node already on the walk path.
    BackRef,
    /// Depth limit reached.
    Truncated,
}

/// One labelled edge inside a signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SignatureEdge {
    pub role: String,
    pub direction: Direction,
    pub post: Post,
    pub child: Signature,
}

/// Which edges a signature walk follows.
#[derive(Debug, Clone, Copy)]
pub struct SignatureOptions<'a> {
    /// Follow outgoing links as well as incoming ones.
    pub scan_outgoing: bool,
    /// Ignore quantifier nodes entirely.
    pub skip_quantifiers: bool,
    pub max_depth: usize,
    /// Restrict the walk to this node set.
    pub within: Option<&'a HashSet<NodeId>>,
    /// Labels to use in place of the nodes' own predicate labels.
    pub labels: Option<&'a HashMap<NodeId, String>>,
}

impl Default for SignatureOptions<'_> {
    fn default() -> Self {
        Self {
            scan_outgoing: false,
            skip_quantifiers: false,
            max_depth: DEFAULT_MAX_DEPTH,
            within: None,
            labels: None,
        }
    }
}

impl<'a> SignatureOptions<'a> {
    pub fn scan_outgoing(mut self, scan: bool) -> Self {
        self.scan_outgoing = scan;
        self
    }

    pub fn within(mut self, ids: &'a HashSet<NodeId>) -> Self {
        self.within = Some(ids);
        self
    }

    /// Sign the nodes in `labels` with the given label, not their predicate's.
    pub fn labelled(mut self, labels: &'a HashMap<NodeId, String>) -> Self {
        self.labels = Some(labels);
        self
    }

    fn label(&self, id: NodeId, predicate: &Predicate) -> String {
        match self.labels.and_then(|labels| labels.get(&id)) {
            Some(label) => label.clone(),
            None => predicate.signature_label(),
        }
    }

    /// Whether the walk may step onto `id`.
    pub fn admits(&self, graph: &Graph, id: NodeId) -> bool {
        if self.within.is_some_and(|set| !set.contains(&id)) {
            return false;
        }
        !(self.skip_quantifiers && graph.get_node(id).is_some_and(|n| n.predicate.is_quantifier()))
    }
}

/// Compute the signature of `id` with an empty visited set.
pub fn compute_signature(graph: &Graph, id: NodeId, options: &SignatureOptions) -> Result<Signature> {
    let mut visited = HashSet::new();
    compute_signature_from(graph, id, &mut visited, options)
}

/// Compute the signature of `id`, treating nodes in `visited` as already on
/// the walk path. `visited` is restored before returning, on success and
/// on error alike.
pub fn compute_signature_from(
    graph: &Graph,
    id: NodeId,
    visited: &mut HashSet<NodeId>,
    options: &SignatureOptions,
) -> Result<Signature> {
    sign(graph, id, visited, 0, options)
}

fn sign(
    graph: &Graph,
    id: NodeId,
    visited: &mut HashSet<NodeId>,
    depth: usize,
    options: &SignatureOptions,
) -> Result<Signature> {
    if visited.contains(&id) {
        return Ok(Signature::BackRef);
    }
    if depth >= options.max_depth {
        return Ok(Signature::Truncated);
    }
    let node = graph.node(id)?;
    visited.insert(id);
    let children = sign_children(graph, id, visited, depth, options);
    visited.remove(&id);

    let mut children = children?;
    children.sort();
    Ok(Signature::Node { label: options.label(id, &node.predicate), children })
}

fn sign_children(
    graph: &Graph,
    id: NodeId,
    visited: &mut HashSet<NodeId>,
    depth: usize,
    options: &SignatureOptions,
) -> Result<Vec<SignatureEdge>> {
    let mut children = Vec::new();
    for link in graph.in_links(id) {
        if options.admits(graph, link.from) {
            children.push(SignatureEdge {
                role: link.role.clone(),
                direction: Direction::Incoming,
                post: link.post,
                child: sign(graph, link.from, visited, depth + 1, options)?,
            });
        }
    }
    if options.scan_outgoing {
        for link in graph.out_links(id) {
            if options.admits(graph, link.to) {
                children.push(SignatureEdge {
                    role: link.role.clone(),
                    direction: Direction::Outgoing,
                    post: link.post,
                    child: sign(graph, link.to, visited, depth + 1, options)?,
                });
            }
        }
    }
    Ok(children)
}

/// Nodes reachable from `id` along incoming links (and outgoing ones when
/// `scan_outgoing`), `id` included.
pub fn reachable(graph: &Graph, id: NodeId, options: &SignatureOptions) -> HashSet<NodeId> {
    let mut seen = HashSet::from([id]);
    let mut queue = VecDeque::from([id]);
    while let Some(current) = queue.pop_front() {
        let incoming = graph.in_links(current).map(|l| l.from);
        let outgoing = graph
            .out_links(current)
            .filter(|_| options.scan_outgoing)
            .map(|l| l.to);
        for next in incoming.chain(outgoing).collect::<Vec<_>>() {
            if options.admits(graph, next) && seen.insert(next) {
                queue.push_back(next);
            }
        }
    }
    seen
}

impl Signature {
    pub fn label(&self) -> Option<&str> {
        match self {
            Signature::Node { label, .. } => Some(label),
            _ => None,
        }
    }

    /// Number of signature nodes, sentinels included.
    pub fn size(&self) -> usize {
        match self {
            Signature::Node { children, .. } => 1 + children.iter().map(|e| e.child.size()).sum::<usize>(),
            _ => 1,
        }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signature::BackRef => f.write_str("^"),
            Signature::Truncated => f.write_str("…"),
            Signature::Node { label, children } => {
                f.write_str(label)?;
                if !children.is_empty() {
                    f.write_str("(")?;
                    for (i, edge) in children.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        let arrow = match edge.direction {
                            Direction::Incoming => "<-",
                            Direction::Outgoing => "->",
                        };
                        write!(f, "{}/{}{}{}", edge.role, edge.post, arrow, edge.child)?;
                    }
                    f.write_str(")")?;
                }
                Ok(())
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Link, Node};
    use crate::notation;
    use proptest::prelude::*;

    const GUARD_DOG: &str = "dmrs {
        10 [udef_q<0:9>];
        11 [compound<0:9> e];
        12 [udef_q<0:5>];
        13 [_guard_n_1<0:5> x];
        14 [_dog_n_1<6:9> x];
        0:/H -> 14;
        10:RSTR/H -> 14;
        11:ARG1/EQ -> 14;
        11:ARG2/NEQ -> 13;
        12:RSTR/H -> 13;
    }";

    // Same graph, renumbered, links and nodes shuffled.
    const GUARD_DOG_RENUMBERED: &str = "dmrs {
        7 [_dog_n_1<6:9> x];
        3 [_guard_n_1<0:5> x];
        5 [udef_q<0:5>];
        1 [compound<0:9> e];
        9 [udef_q<0:9>];
        5:RSTR/H -> 3;
        1:ARG2/NEQ -> 3;
        9:RSTR/H -> 7;
        1:ARG1/EQ -> 7;
        0:/H -> 7;
    }";

    #[test]
    fn test_incoming_only() {
        let g = notation::parse(GUARD_DOG).unwrap();
        let sig = compute_signature(&g, NodeId(14), &SignatureOptions::default()).unwrap();
        assert_eq!(sig.to_string(), "_dog_n_1(ARG1/EQ<-compound, RSTR/H<-udef_q)");
    }

    #[test]
    fn test_scan_outgoing_reaches_modifier() {
        let g = notation::parse(GUARD_DOG).unwrap();
        let options = SignatureOptions { skip_quantifiers: true, ..Default::default() }.scan_outgoing(true);
        let sig = compute_signature(&g, NodeId(14), &options).unwrap();
        assert_eq!(sig.to_string(), "_dog_n_1(ARG1/EQ<-compound(ARG1/EQ->^, ARG2/NEQ->_guard_n_1(ARG2/NEQ<-^)))");
    }

    #[test]
    fn test_renumbering_invariance() {
        let a = notation::parse(GUARD_DOG).unwrap();
        let b = notation::parse(GUARD_DOG_RENUMBERED).unwrap();
        for scan in [false, true] {
            let options = SignatureOptions::default().scan_outgoing(scan);
            assert_eq!(
                compute_signature(&a, NodeId(14), &options).unwrap(),
                compute_signature(&b, NodeId(7), &options).unwrap(),
            );
        }
    }

    #[test]
    fn test_within_restriction() {
        let g = notation::parse(GUARD_DOG).unwrap();
        let set = HashSet::from([NodeId(14), NodeId(11)]);
        let options = SignatureOptions::default().scan_outgoing(true).within(&set);
        let sig = compute_signature(&g, NodeId(14), &options).unwrap();
        assert_eq!(sig.to_string(), "_dog_n_1(ARG1/EQ<-compound(ARG1/EQ->^))");
    }

    #[test]
    fn test_cycle_terminates() {
        let mut g = Graph::new();
        g.add_node(Node::new(NodeId(1), "a")).unwrap();
        g.add_node(Node::new(NodeId(2), "b")).unwrap();
        g.add_link(Link::new(NodeId(1), NodeId(2), "ARG1", Post::Neq)).unwrap();
        g.add_link(Link::new(NodeId(2), NodeId(1), "ARG1", Post::Neq)).unwrap();
        let sig = compute_signature(&g, NodeId(1), &SignatureOptions::default().scan_outgoing(true)).unwrap();
        assert!(sig.size() < 10);
    }

    #[test]
    fn test_depth_limit_fails_closed() {
        let mut g = Graph::new();
        for i in 0..40 {
            g.add_node(Node::new(NodeId(i), "x")).unwrap();
            if i > 0 {
                g.add_link(Link::new(NodeId(i), NodeId(i - 1), "ARG1", Post::Neq)).unwrap();
            }
        }
        let options = SignatureOptions { max_depth: 4, ..Default::default() };
        let sig = compute_signature(&g, NodeId(0), &options).unwrap();
        assert_eq!(sig.size(), 5);
        assert!(sig.to_string().ends_with("…))))"));
    }

    #[test]
    fn test_missing_node() {
        let g = Graph::new();
        assert!(compute_signature(&g, NodeId(1), &SignatureOptions::default()).is_err());
    }

    #[test]
    fn test_visited_restored() {
        let g = notation::parse(GUARD_DOG).unwrap();
        let options = SignatureOptions::default().scan_outgoing(true);
        let mut visited = HashSet::from([NodeId(10)]);

        let sig = compute_signature_from(&g, NodeId(14), &mut visited, &options).unwrap();
        assert!(sig.to_string().contains("RSTR/H<-^"));
        assert_eq!(visited, HashSet::from([NodeId(10)]));

        assert!(compute_signature_from(&g, NodeId(99), &mut visited, &options).is_err());
        assert_eq!(visited, HashSet::from([NodeId(10)]));
    }

    #[test]
    fn test_labelled_overrides_predicate() {
        let g = notation::parse(GUARD_DOG).unwrap();
        let set = HashSet::from([NodeId(14), NodeId(11), NodeId(13)]);
        let labels = HashMap::from([(NodeId(14), "_dog_n".to_string()), (NodeId(13), "_guard_n".to_string())]);
        let options = SignatureOptions::default().scan_outgoing(true).within(&set).labelled(&labels);
        let sig = compute_signature(&g, NodeId(14), &options).unwrap();
        assert_eq!(sig.to_string(), "_dog_n(ARG1/EQ<-compound(ARG1/EQ->^, ARG2/NEQ->_guard_n(ARG2/NEQ<-^)))");
    }

    #[test]
    fn test_reachable() {
        let g = notation::parse(GUARD_DOG).unwrap();
        let incoming = reachable(&g, NodeId(14), &SignatureOptions::default());
        assert_eq!(incoming.len(), 3);
        let both = reachable(&g, NodeId(14), &SignatureOptions::default().scan_outgoing(true));
        assert_eq!(both.len(), 5);
    }

    const PREDS: [&str; 4] = ["_dog_n_1", "compound", "udef_q", "_bark_v_1"];
    const ROLES: [&str; 3] = ["ARG1", "ARG2", "RSTR"];

    fn arb_graph() -> impl Strategy<Value = (Vec<usize>, Vec<(usize, usize, usize)>, Vec<usize>, Vec<usize>)> {
        (2usize..7).prop_flat_map(|n| {
            (
                proptest::collection::vec(0..PREDS.len(), n),
                proptest::collection::vec((0..n, 0..n, 0..ROLES.len()), 0..10),
                Just((0..n).collect::<Vec<_>>()).prop_shuffle(),
            )
        })
        .prop_flat_map(|(preds, links, perm)| {
            let order = Just((0..links.len()).collect::<Vec<_>>()).prop_shuffle();
            (Just(preds), Just(links), Just(perm), order)
        })
    }

    fn build(preds: &[usize], links: &[(usize, usize, usize)], ids: impl Fn(usize) -> u32, order: &[usize]) -> Graph {
        let mut g = Graph::new();
        for (i, p) in preds.iter().enumerate() {
            g.add_node(Node::new(NodeId(ids(i)), PREDS[*p])).unwrap();
        }
        for &k in order {
            let (from, to, role) = links[k];
            g.add_link(Link::new(NodeId(ids(from)), NodeId(ids(to)), ROLES[role], Post::Neq)).unwrap();
        }
        g
    }

    proptest! {
        #[test]
        fn prop_signature_ignores_numbering((preds, links, perm, order) in arb_graph(), scan in any::<bool>()) {
            let identity: Vec<usize> = (0..links.len()).collect();
            let a = build(&preds, &links, |i| i as u32 + 1, &identity);
            let b = build(&preds, &links, |i| perm[i] as u32 + 100, &order);
            let options = SignatureOptions::default().scan_outgoing(scan);
            for i in 0..preds.len() {
                let sa = compute_signature(&a, NodeId(i as u32 + 1), &options).unwrap();
                let sb = compute_signature(&b, NodeId(perm[i] as u32 + 100), &options).unwrap();
                prop_assert_eq!(sa, sb);
            }
        }
    }
}
