//! Predicate: the semantic head label of a node.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A node predicate.
///
/// Surface predicates follow the `_lemma_pos_sense` grammar, grammar
/// predicates are bare identifiers (`compound`, `udef_q`), and string
/// constant predicates carry a literal (`named("Kim")`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Predicate {
    Abstract { name: String },
    Real { lemma: String, pos: String, sense: Option<String> },
    StringConstant { name: String, carg: String },
}

impl Predicate {
    pub fn abstract_(name: impl Into<String>) -> Self {
        Predicate::Abstract { name: name.into() }
    }

    pub fn real(lemma: impl Into<String>, pos: impl Into<String>, sense: Option<&str>) -> Self {
        Predicate::Real {
            lemma: lemma.into(),
            pos: pos.into(),
            sense: sense.map(str::to_string),
        }
    }

    pub fn constant(name: impl Into<String>, carg: impl Into<String>) -> Self {
        Predicate::StringConstant { name: name.into(), carg: carg.into() }
    }

    /// Parse a predicate string.
    ///
    /// `_lemma_pos[_sense]` yields `Real`; everything else is `Abstract`.
    /// A trailing `_rel` is dropped. Lemmas keep inner underscores only when
    /// both pos and sense follow (`_in_front_p_of` → lemma `in_front`).
    pub fn parse(s: &str) -> Self {
        let s = s.strip_suffix("_rel").unwrap_or(s);
        let Some(body) = s.strip_prefix('_') else {
            return Predicate::abstract_(s);
        };
        let parts: Vec<&str> = body.split('_').collect();
        match parts.as_slice() {
            [lemma, pos] if !lemma.is_empty() && !pos.is_empty() => {
                Predicate::real(*lemma, *pos, None)
            }
            [lemma @ .., pos, sense] if !lemma.is_empty() && !pos.is_empty() => {
                Predicate::real(lemma.join("_"), *pos, Some(*sense))
            }
            _ => Predicate::abstract_(s),
        }
    }

    /// Predicate name without any constant argument.
    pub fn name(&self) -> String {
        match self {
            Predicate::Abstract { name } | Predicate::StringConstant { name, .. } => name.clone(),
            Predicate::Real { lemma, pos, sense: Some(sense) } => format!("_{lemma}_{pos}_{sense}"),
            Predicate::Real { lemma, pos, sense: None } => format!("_{lemma}_{pos}"),
        }
    }

    /// Explicit comparison against a predicate string.
    pub fn matches(&self, name: &str) -> bool {
        self.name() == name.strip_suffix("_rel").unwrap_or(name)
    }

    /// Pattern-side predicate comparison.
    ///
    /// A `Real` pattern without a sense accepts any sense; a string constant
    /// pattern with an empty literal accepts any literal.
    pub fn accepts(&self, target: &Predicate) -> bool {
        match (self, target) {
            (
                Predicate::Real { lemma, pos, sense },
                Predicate::Real { lemma: t_lemma, pos: t_pos, sense: t_sense },
            ) => lemma == t_lemma && pos == t_pos && (sense.is_none() || sense == t_sense),
            (
                Predicate::StringConstant { name, carg },
                Predicate::StringConstant { name: t_name, carg: t_carg },
            ) => name == t_name && (carg.is_empty() || carg == t_carg),
            (Predicate::Abstract { name }, Predicate::Abstract { name: t_name }) => name == t_name,
            _ => false,
        }
    }

    pub fn lemma(&self) -> Option<&str> {
        match self {
            Predicate::Real { lemma, .. } => Some(lemma),
            _ => None,
        }
    }

    pub fn pos(&self) -> Option<&str> {
        match self {
            Predicate::Real { pos, .. } => Some(pos),
            _ => None,
        }
    }

    pub fn carg(&self) -> Option<&str> {
        match self {
            Predicate::StringConstant { carg, .. } => Some(carg),
            _ => None,
        }
    }

    pub fn is_real(&self) -> bool {
        matches!(self, Predicate::Real { .. })
    }

    pub fn is_quantifier(&self) -> bool {
        match self {
            Predicate::Real { pos, .. } => pos == "q",
            Predicate::Abstract { name } => name.ends_with("_q"),
            Predicate::StringConstant { .. } => false,
        }
    }

    /// Label used by structural signatures.
    pub fn signature_label(&self) -> String {
        match self {
            Predicate::StringConstant { name, carg } => format!("{name}({carg:?})"),
            other => other.name(),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl From<&str> for Predicate {
    fn from(s: &str) -> Self {
        Predicate::parse(s)
    }
}
