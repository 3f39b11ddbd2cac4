//! Link (edge) in the DMRS graph.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use super::NodeId;
use crate::Error;

/// Scopal relation carried by a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Post {
    /// Argument's label is the head of a scope (`H`, qeq).
    H,
    /// Labels differ.
    Neq,
    /// Labels are shared.
    Eq,
    /// Argument is the scopal head of the label.
    Heq,
}

impl Post {
    pub fn as_str(&self) -> &'static str {
        match self {
            Post::H => "H",
            Post::Neq => "NEQ",
            Post::Eq => "EQ",
            Post::Heq => "HEQ",
        }
    }
}

impl fmt::Display for Post {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Post {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "H" => Ok(Post::H),
            "NEQ" => Ok(Post::Neq),
            "EQ" => Ok(Post::Eq),
            "HEQ" => Ok(Post::Heq),
            other => Err(Error::Structural(format!("Unknown link post '{other}'"))),
        }
    }
}

/// Traversal direction relative to a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    Outgoing,
    Incoming,
}

/// A directed, role-labelled link between two nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Link {
    pub from: NodeId,
    pub to: NodeId,
    pub role: String,
    pub post: Post,
}

impl Link {
    pub fn new(from: NodeId, to: NodeId, role: impl Into<String>, post: Post) -> Self {
        Self { from, to, role: role.into(), post }
    }

    pub fn touches(&self, id: NodeId) -> bool {
        self.from == id || self.to == id
    }

    /// Quantifier restriction link.
    pub fn is_rstr(&self) -> bool {
        self.role == "RSTR"
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}/{} -> {}", self.from, self.role, self.post, self.to)
    }
}
