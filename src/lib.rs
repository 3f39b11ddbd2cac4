//! # dmrs-rs: DMRS Semantic Graph Normalization
//!
//! Rewrites dependency minimal recursion semantics graphs produced by a deep
//! grammar so that multiword expressions and named-entity chains become
//! single nodes.
//!
//! ## Design Principles
//!
//! 1. **Ids, not pointers**: nodes live in a graph-owned arena; links name ids
//! 2. **Signatures are values**: structural identity is a sortable, hashable tree
//! 3. **Rules are validated once**: a `Rule` that exists can always be applied
//! 4. **Repository-agnostic transformer**: rules come from a trait object
//!
//! ## Quick Start
//!
//! ```rust
//! use dmrs_rs::{notation, Rule, Transformer};
//!
//! # fn example() -> dmrs_rs::Result<()> {
//! let construction = "dmrs {
//!     2 [_guard_n_1<0:5> x];
//!     3 [_dog_n_1<6:9> x];
//!     4 [compound<0:9> e];
//!     0:/H -> 3;
//!     4:ARG1/EQ -> 3;
//!     4:ARG2/NEQ -> 2;
//! }";
//! let rule = Rule::from_notation("guard+dog", construction, "guard+dog", Some("n"), true)?;
//! let transformer = Transformer::new(vec![rule]);
//!
//! let mut graph = notation::parse(construction)?;
//! let stats = transformer.process(&mut graph)?;
//! assert_eq!(stats.rules_applied, 1);
//! assert_eq!(graph.node_count(), 1);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```
//!
//! ## Rule Repositories
//!
//! | Repository | Config | Description |
//! |------------|--------|-------------|
//! | none | `RepositoryConfig::None` | Hand-authored rules only |
//! | Memory | `RepositoryConfig::Memory` | Records supplied inline |
//! | JSON | `RepositoryConfig::Json` | Persisted document, read once |

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod notation;
pub mod canon;
pub mod matcher;
pub mod rule;
pub mod repository;
pub mod transform;

// ============================================================================
// Re-exports: Model (the DTOs)
// ============================================================================

pub use model::{
    Graph, Node, NodeId, Link, Post, Direction,
    Predicate, Span, SenseTag,
};

// ============================================================================
// Re-exports: Matching and rewriting
// ============================================================================

pub use canon::{Signature, SignatureOptions, compute_signature};
pub use matcher::{Match, Pattern};
pub use rule::{Rule, RuleId};

// ============================================================================
// Re-exports: Repository and transformer
// ============================================================================

pub use repository::{
    RuleRepository, RuleRecord, RuleCache, RepositoryConfig,
    MemoryRepository, JsonRepository,
};
pub use transform::{Transformer, TransformerConfig, TransformStats};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Structural error: {0}")]
    Structural(String),

    #[error("Invalid rule {rule}: {message}")]
    Construction { rule: String, message: String },

    #[error("Rule repository unavailable: {0}")]
    RepositoryUnavailable(String),

    #[error("Notation syntax error at position {position}: {message}")]
    SyntaxError { position: usize, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
