//! Document nodes and their validation verdicts.

use crate::Expr;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::{self, Display};
use core::str::FromStr;
use putdown_parse::{Attributes, Decl};
use serde::{Deserialize, Serialize};

/// Attribute under which verdicts are published.
pub const VALIDATION_RESULT: &str = "validation result";

/// Identifier of a node, unique within its document.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Kind {
    Expression(Expr),
    /// environment, being a formula (rule template) if the flag is set
    Environment { formula: bool },
    /// declaration of symbols, whose body (if any) is the only child
    Declaration { decl: Decl, symbols: Vec<String> },
    Comment(String),
}

#[derive(Clone, Debug)]
pub struct Node {
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) kind: Kind,
    pub(crate) given: bool,
    pub(crate) attributes: Attributes,
    pub(crate) dirty: bool,
    /// false once the node was removed from its document
    pub(crate) alive: bool,
    pub(crate) verdict: Option<Verdict>,
}

impl Node {
    pub(crate) fn new(kind: Kind, given: bool, attributes: Attributes) -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            kind,
            given,
            attributes,
            dirty: true,
            alive: true,
            verdict: None,
        }
    }

    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    pub fn is_given(&self) -> bool {
        self.given
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn verdict(&self) -> Option<&Verdict> {
        self.verdict.as_ref()
    }

    pub fn expr(&self) -> Option<&Expr> {
        match &self.kind {
            Kind::Expression(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_formula(&self) -> bool {
        matches!(self.kind, Kind::Environment { formula: true })
    }

    pub fn is_environment(&self) -> bool {
        matches!(self.kind, Kind::Environment { .. })
    }

    /// Return true for nodes without logical content.
    pub fn is_comment(&self) -> bool {
        match &self.kind {
            Kind::Comment(_) => true,
            Kind::Expression(e) => e.is_comment(),
            _ => false,
        }
    }

    /// Return true if the attribute is set to `true`.
    pub fn flag(&self, key: &str) -> bool {
        self.attributes.get(key).and_then(|v| v.as_bool()) == Some(true)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Valid,
    Invalid,
    Indeterminate,
    /// the engine failed on the node
    Error,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::Invalid => "invalid",
            Self::Indeterminate => "indeterminate",
            Self::Error => "error",
        }
    }
}

impl Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.as_str().fmt(f)
    }
}

impl FromStr for Outcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "valid" => Ok(Self::Valid),
            "invalid" => Ok(Self::Invalid),
            "indeterminate" => Ok(Self::Indeterminate),
            "error" => Ok(Self::Error),
            _ => Err(alloc::format!("unknown result {}", s)),
        }
    }
}

/// Result of validating a node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub result: Outcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// results reported by individual tools, such as `"arithmetic": "inapplicable"`
    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub tools: Attributes,
}

impl Verdict {
    pub fn new(result: Outcome) -> Self {
        Self {
            result,
            reason: None,
            tools: Attributes::new(),
        }
    }

    pub fn because(result: Outcome, reason: impl Into<String>) -> Self {
        Self {
            reason: Some(reason.into()),
            ..Self::new(result)
        }
    }

    pub fn with_tools(self, tools: Attributes) -> Self {
        Self { tools, ..self }
    }

    pub fn is_valid(&self) -> bool {
        self.result == Outcome::Valid
    }
}

impl Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.result.fmt(f)?;
        if let Some(reason) = &self.reason {
            write!(f, " ({})", reason)?;
        }
        Ok(())
    }
}

#[test]
fn verdict_json() {
    let v = Verdict::because(Outcome::Invalid, "bad BIH");
    let json = serde_json::to_value(&v).unwrap();
    assert_eq!(json, serde_json::json!({"result": "invalid", "reason": "bad BIH"}));
    assert_eq!(serde_json::from_value::<Verdict>(json).unwrap(), v);
    assert_eq!("indeterminate".parse(), Ok(Outcome::Indeterminate));
}
