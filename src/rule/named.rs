//! Named-entity chain collapsing.
//!
//! A chain such as "Francis Charles Bond" comes out of the grammar as three
//! `named` nodes joined by two `compound` nodes. Collapsing it leaves a
//! single `named` node whose literal is the full name in surface order.

use hashbrown::HashSet;
use tracing::debug;

use crate::model::{Graph, NodeId, Predicate};
use crate::{Error, Result};

/// Compound nodes linked to `id` through an `ARG1`/`ARG2` role.
fn attached_compounds(graph: &Graph, id: NodeId) -> Vec<NodeId> {
    graph
        .in_links(id)
        .filter(|l| l.role == "ARG1" || l.role == "ARG2")
        .map(|l| l.from)
        .filter(|c| graph.get_node(*c).is_some_and(|n| n.is_compound()))
        .collect()
}

fn arguments(graph: &Graph, compound: NodeId) -> Option<(NodeId, NodeId)> {
    Some((graph.arg(compound, "ARG1")?, graph.arg(compound, "ARG2")?))
}

/// True when `compound` joins two named nodes and every other compound
/// hanging off those nodes is itself all-named. `visited` breaks cycles
/// and carries the compounds already examined.
pub fn is_named(graph: &Graph, compound: NodeId, visited: &mut HashSet<NodeId>) -> Result<bool> {
    if !visited.insert(compound) {
        return Ok(true);
    }
    if !graph.node(compound)?.is_compound() {
        return Ok(false);
    }
    let Some((arg1, arg2)) = arguments(graph, compound) else {
        return Ok(false);
    };
    for arg in [arg1, arg2] {
        if !graph.node(arg)?.is_named() {
            return Ok(false);
        }
        for other in attached_compounds(graph, arg) {
            if other != compound && !is_named(graph, other, visited)? {
                return Ok(false);
            }
        }
    }
    Ok(true)
}

/// Collapse the chain around `compound` when it is all-named. Returns the
/// surviving node, or `None` when the chain does not qualify.
pub fn collapse(graph: &mut Graph, compound: NodeId) -> Result<Option<NodeId>> {
    if !is_named(graph, compound, &mut HashSet::new())? {
        return Ok(None);
    }
    let survivor = collapse_from(graph, compound, &mut HashSet::new())?;
    Ok(Some(survivor))
}

/// Collapse every all-named chain in the graph. Returns the number of
/// compound nodes folded away.
pub fn collapse_all(graph: &mut Graph) -> Result<usize> {
    let mut collapsed = 0;
    loop {
        let mut next = None;
        for node in graph.nodes().filter(|n| n.is_compound()) {
            if is_named(graph, node.id, &mut HashSet::new())? {
                next = Some(node.id);
                break;
            }
        }
        let Some(compound) = next else { break };
        let before = graph.nodes().filter(|n| n.is_compound()).count();
        collapse_from(graph, compound, &mut HashSet::new())?;
        collapsed += before - graph.nodes().filter(|n| n.is_compound()).count();
    }
    Ok(collapsed)
}

/// Neighbouring compounds first, then this one. Arguments are re-read after
/// the recursion since inner merges move links.
fn collapse_from(graph: &mut Graph, compound: NodeId, visited: &mut HashSet<NodeId>) -> Result<NodeId> {
    visited.insert(compound);
    let (arg1, arg2) = arguments(graph, compound)
        .ok_or_else(|| Error::Structural(format!("Compound {compound} lacks ARG1/ARG2")))?;
    for arg in [arg1, arg2] {
        for other in attached_compounds(graph, arg) {
            if !visited.contains(&other) && graph.contains(other) {
                collapse_from(graph, other, visited)?;
            }
        }
    }

    let (survivor, absorbed) = arguments(graph, compound)
        .ok_or_else(|| Error::Structural(format!("Compound {compound} lost an argument")))?;
    if survivor == absorbed {
        graph.remove_nodes(&[compound]);
        return Ok(survivor);
    }

    let (kept, gone) = (graph.node(survivor)?, graph.node(absorbed)?);
    let (left, right) = if gone.span.cfrom < kept.span.cfrom { (gone, kept) } else { (kept, gone) };
    let literal = format!(
        "{} {}",
        left.predicate.carg().unwrap_or_default(),
        right.predicate.carg().unwrap_or_default()
    );
    let span = kept.span.cover(gone.span);
    let name = kept.predicate.name();
    let quantifiers = graph.quantifiers_of(absorbed);

    let node = graph.node_mut(survivor)?;
    node.predicate = Predicate::constant(name, literal.as_str());
    node.span = span;

    graph.redirect_links(absorbed, survivor, |l| l.from == compound || l.is_rstr());
    if graph.top() == Some(absorbed) {
        graph.set_top(survivor)?;
    }
    let mut doomed = vec![absorbed, compound];
    doomed.extend(quantifiers);
    graph.remove_nodes(&doomed);

    debug!(%compound, %survivor, literal = %literal, "collapsed named entity");
    Ok(survivor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Span;
    use crate::notation;

    const FRANCIS_CHARLES_BOND: &str = r#"dmrs {
        1 [proper_q<0:7>];
        2 [named<0:7>("Francis") x];
        3 [proper_q<8:15>];
        4 [named<8:15>("Charles") x];
        5 [proper_q<16:20>];
        6 [named<16:20>("Bond") x];
        7 [compound<0:15> e];
        8 [compound<8:20> e];
        9 [_sleep_v_1<21:27> e];
        0:/H -> 9;
        1:RSTR/H -> 2;
        3:RSTR/H -> 4;
        5:RSTR/H -> 6;
        7:ARG1/EQ -> 4;
        7:ARG2/NEQ -> 2;
        8:ARG1/EQ -> 6;
        8:ARG2/NEQ -> 4;
        9:ARG1/NEQ -> 6;
    }"#;

    #[test]
    fn test_is_named() {
        let g = notation::parse(FRANCIS_CHARLES_BOND).unwrap();
        assert!(is_named(&g, NodeId(7), &mut HashSet::new()).unwrap());
        assert!(is_named(&g, NodeId(8), &mut HashSet::new()).unwrap());
        assert!(!is_named(&g, NodeId(9), &mut HashSet::new()).unwrap());
    }

    #[test]
    fn test_collapse_chain() {
        let mut g = notation::parse(FRANCIS_CHARLES_BOND).unwrap();
        let survivor = collapse(&mut g, NodeId(8)).unwrap().unwrap();

        assert_eq!(survivor, NodeId(6));
        let node = g.node(survivor).unwrap();
        assert_eq!(node.predicate.carg(), Some("Francis Charles Bond"));
        assert_eq!(node.span, Span::new(0, 20));
        assert_eq!(g.node_count(), 3);
        assert_eq!(g.arg(NodeId(9), "ARG1"), Some(survivor));
        assert!(g.validate().is_ok());
    }

    #[test]
    fn test_collapse_from_other_end() {
        let mut g = notation::parse(FRANCIS_CHARLES_BOND).unwrap();
        let survivor = collapse(&mut g, NodeId(7)).unwrap().unwrap();
        assert_eq!(g.node(survivor).unwrap().predicate.carg(), Some("Francis Charles Bond"));
        assert_eq!(g.nodes().filter(|n| n.is_named()).count(), 1);
    }

    #[test]
    fn test_collapse_all() {
        let mut g = notation::parse(FRANCIS_CHARLES_BOND).unwrap();
        assert_eq!(collapse_all(&mut g).unwrap(), 2);
        assert_eq!(collapse_all(&mut g).unwrap(), 0);
    }

    #[test]
    fn test_mixed_compound_left_alone() {
        let source = r#"dmrs {
            1 [named<0:5>("Tokyo") x];
            2 [_office_n_1<6:12> x];
            3 [compound<0:12> e];
            3:ARG1/EQ -> 2;
            3:ARG2/NEQ -> 1;
        }"#;
        let mut g = notation::parse(source).unwrap();
        assert_eq!(collapse(&mut g, NodeId(3)).unwrap(), None);
        assert_eq!(collapse_all(&mut g).unwrap(), 0);
        assert_eq!(g.node_count(), 3);
    }

    #[test]
    fn test_cyclic_compounds_terminate() {
        // Two compounds joining the same pair of names in opposite roles.
        let source = r#"dmrs {
            1 [named<0:3>("Kim") x];
            2 [named<4:7>("Lee") x];
            3 [compound<0:7> e];
            4 [compound<0:7> e];
            5 [_sleep_v_1<8:14> e];
            0:/H -> 5;
            3:ARG1/EQ -> 1;
            3:ARG2/NEQ -> 2;
            4:ARG1/EQ -> 2;
            4:ARG2/NEQ -> 1;
            5:ARG1/NEQ -> 2;
        }"#;
        let mut g = notation::parse(source).unwrap();
        assert!(is_named(&g, NodeId(3), &mut HashSet::new()).unwrap());
        assert!(is_named(&g, NodeId(4), &mut HashSet::new()).unwrap());

        assert_eq!(collapse_all(&mut g).unwrap(), 2);
        assert_eq!(g.nodes().filter(|n| n.is_named()).count(), 1);
        assert_eq!(g.nodes().filter(|n| n.is_compound()).count(), 0);
        assert!(g.validate().is_ok());
    }
}
