//! # DMRS Graph Model
//!
//! Plain data types for dependency minimal recursion semantics graphs.
//! These types cross every boundary: upstream parser ↔ rewriting ↔ downstream
//! consumers.
//!
//! Design rule: cross-references are node ids resolved through the owning
//! [`Graph`], never pointers. This module does no I/O.

pub mod predicate;
pub mod node;
pub mod link;
pub mod graph;

pub use predicate::Predicate;
pub use node::{Node, NodeId, SenseTag, SortInfo, Span};
pub use link::{Direction, Link, Post};
pub use graph::Graph;
