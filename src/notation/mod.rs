//! # Construction Notation
//!
//! A compact text layout for DMRS graphs, used to hand-author rule
//! constructions and to persist them in a rule repository.
//! Pure functions, no I/O.
//!
//! ```text
//! dmrs {
//!   10 [_guard_n_1<0:5> x num=sg];
//!   20 [_dog_n_1<6:9> x];
//!   30 [compound<0:9> e];
//!   0:/H -> 20;
//!   30:ARG1/EQ -> 20;
//!   30:ARG2/NEQ -> 10;
//! }
//! ```

pub mod lexer;
pub mod parser;

use crate::model::{Graph, Node};
use crate::Result;

/// Parse a construction string into a graph.
pub fn parse(input: &str) -> Result<Graph> {
    let tokens = lexer::tokenize(input)?;
    parser::parse_graph(&tokens)
}

/// Write a graph in construction notation. Output is stable: nodes and links
/// keep graph order, sort keys are sorted.
pub fn write(graph: &Graph) -> String {
    let mut out = String::from("dmrs {\n");
    for node in graph.nodes() {
        out.push_str(&format!("  {};\n", format_node(node)));
    }
    if let Some(top) = graph.top() {
        out.push_str(&format!("  0:/H -> {top};\n"));
    }
    for link in graph.links() {
        out.push_str(&format!("  {link};\n"));
    }
    out.push('}');
    out
}

fn format_node(node: &Node) -> String {
    let mut s = format!("{} [{}{}", node.id, node.predicate.name(), node.span);
    if let Some(carg) = node.predicate.carg() {
        s.push_str(&format!("(\"{}\")", carg.replace('\\', "\\\\").replace('"', "\\\"")));
    }
    if let Some(cvarsort) = node.cvarsort() {
        s.push(' ');
        s.push_str(cvarsort);
    }
    let mut keys: Vec<&String> = node.sortinfo.keys().filter(|k| *k != "cvarsort").collect();
    keys.sort();
    for key in keys {
        s.push_str(&format!(" {}={}", key, node.sortinfo[key]));
    }
    s.push(']');
    s
}
