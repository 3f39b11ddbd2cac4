//! End-to-end tests for named-entity chain collapsing through the transformer.

use dmrs_rs::{notation, NodeId, Span, Transformer, TransformerConfig};

// ============================================================================
// Helpers
// ============================================================================

/// "Francis Charles Bond slept."
const FRANCIS_CHARLES_BOND: &str = r#"dmrs {
    1 [proper_q<0:7>];
    2 [named<0:7>("Francis") x];
    3 [proper_q<8:15>];
    4 [named<8:15>("Charles") x];
    5 [proper_q<16:20>];
    6 [named<16:20>("Bond") x];
    7 [compound<0:15> e];
    8 [compound<8:20> e];
    9 [_sleep_v_1<21:26> e tense=past];
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

// ============================================================================
// 1. A three-part name collapses to one literal
// ============================================================================

#[test]
fn test_three_part_name() {
    let mut g = notation::parse(FRANCIS_CHARLES_BOND).unwrap();
    let stats = Transformer::new(vec![]).process(&mut g).unwrap();

    assert_eq!(stats.chains_collapsed, 2);
    assert_eq!(stats.nodes_removed, 6);

    let named: Vec<_> = g.nodes().filter(|n| n.is_named()).collect();
    assert_eq!(named.len(), 1);
    assert_eq!(named[0].predicate.carg(), Some("Francis Charles Bond"));
    assert_eq!(named[0].span, Span::new(0, 20));

    assert!(g.nodes().all(|n| !n.is_compound()));
    assert_eq!(g.arg(NodeId(9), "ARG1"), Some(named[0].id));
    assert_eq!(g.quantifiers_of(named[0].id).len(), 1);
    assert!(g.validate().is_ok());
}

#[test]
fn test_collapse_is_idempotent() {
    let transformer = Transformer::new(vec![]);
    let mut g = notation::parse(FRANCIS_CHARLES_BOND).unwrap();
    transformer.process(&mut g).unwrap();
    let once = g.clone();
    assert!(transformer.process(&mut g).unwrap().is_noop());
    assert_eq!(g, once);
}

// ============================================================================
// 2. Configuration switch
// ============================================================================

#[test]
fn test_collapse_can_be_disabled() {
    let config = TransformerConfig::from_json_str(r#"{ "collapse_named": false }"#).unwrap();
    let transformer = Transformer::open(config, vec![]);
    let mut g = notation::parse(FRANCIS_CHARLES_BOND).unwrap();
    let stats = transformer.process(&mut g).unwrap();

    assert_eq!(stats.chains_collapsed, 0);
    assert_eq!(g.node_count(), 9);
}

// ============================================================================
// 3. Top follows the surviving node
// ============================================================================

#[test]
fn test_top_on_absorbed_name() {
    // Fragment "Francis Bond" with the top on the first name.
    let mut g = notation::parse(r#"dmrs {
        1 [named<0:7>("Francis") x];
        2 [named<8:12>("Bond") x];
        3 [compound<0:12> e];
        0:/H -> 1;
        3:ARG1/EQ -> 2;
        3:ARG2/NEQ -> 1;
    }"#)
    .unwrap();
    Transformer::new(vec![]).process(&mut g).unwrap();

    assert_eq!(g.top(), Some(NodeId(2)));
    let head = g.head().unwrap();
    assert_eq!(head.predicate.carg(), Some("Francis Bond"));
    assert_eq!(g.node_count(), 1);
}

// ============================================================================
// 4. Chains touching common nouns stay intact
// ============================================================================

#[test]
fn test_name_modifying_noun_is_kept() {
    // "New York office": the office compound blocks the whole chain.
    let mut g = notation::parse(r#"dmrs {
        1 [named<0:3>("New") x];
        2 [named<4:8>("York") x];
        3 [compound<0:8> e];
        4 [_office_n_1<9:15> x];
        5 [compound<0:15> e];
        3:ARG1/EQ -> 2;
        3:ARG2/NEQ -> 1;
        5:ARG1/EQ -> 4;
        5:ARG2/NEQ -> 2;
    }"#)
    .unwrap();
    let stats = Transformer::new(vec![]).process(&mut g).unwrap();
    assert_eq!(stats.chains_collapsed, 0);
    assert_eq!(g.node_count(), 5);
}

#[test]
fn test_two_separate_names() {
    // "Kim Lee met Sandy Smith"
    let mut g = notation::parse(r#"dmrs {
        1 [named<0:3>("Kim") x];
        2 [named<4:7>("Lee") x];
        3 [compound<0:7> e];
        4 [_meet_v_1<8:11> e];
        5 [named<12:17>("Sandy") x];
        6 [named<18:23>("Smith") x];
        7 [compound<12:23> e];
        0:/H -> 4;
        3:ARG1/EQ -> 2;
        3:ARG2/NEQ -> 1;
        4:ARG1/NEQ -> 2;
        4:ARG2/NEQ -> 6;
        7:ARG1/EQ -> 6;
        7:ARG2/NEQ -> 5;
    }"#)
    .unwrap();
    let stats = Transformer::new(vec![]).process(&mut g).unwrap();
    assert_eq!(stats.chains_collapsed, 2);

    let mut literals: Vec<_> = g.nodes().filter_map(|n| n.predicate.carg()).collect();
    literals.sort();
    assert_eq!(literals, vec!["Kim Lee", "Sandy Smith"]);
    assert_eq!(g.arg(NodeId(4), "ARG2"), Some(NodeId(6)));
}
