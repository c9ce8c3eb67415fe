//! Common error type.

use crate::NodeId;
use alloc::string::String;
use core::fmt::{self, Display};
use putdown_parse::Error as ParseError;

/// Failure of the engine on a single node.
///
/// Such failures do not abort validation;
/// the affected node receives an error verdict instead.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineError {
    /// a formula occurs inside another formula
    NestedFormula(NodeId),
    /// a metavariable of a rule was left without a value
    UnboundMetavariable(NodeId, String),
    /// a declared metavariable was instantiated with a non-symbol
    NonSymbolDeclaration(NodeId, String),
    /// a form cannot be represented as document node
    NotAnExpression,
}

impl Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::NestedFormula(id) => write!(f, "formula {} occurs inside a formula", id),
            Self::UnboundMetavariable(id, x) => {
                write!(f, "metavariable {} of rule {} is unbound", x, id)
            }
            Self::NonSymbolDeclaration(id, x) => {
                write!(f, "declared metavariable {} of rule {} is not a symbol", x, id)
            }
            Self::NotAnExpression => write!(f, "form is not an expression"),
        }
    }
}

/// Common error type.
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    Parse(ParseError),
    Engine(EngineError),
    /// no database entry with the given key
    Missing(String),
    /// number of logic concepts in an entry that should contain exactly one
    Cardinality(usize),
    /// a node cannot be inserted below itself
    Cycle(NodeId),
}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Self {
        Self::Parse(err)
    }
}

impl From<EngineError> for Error {
    fn from(err: EngineError) -> Self {
        Self::Engine(err)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Parse(e) => write!(f, "parse error: {}", e),
            Self::Engine(e) => e.fmt(f),
            Self::Missing(key) => write!(f, "no entry {}", key),
            Self::Cardinality(n) => write!(f, "Expected 1 LogicConcept, got {}", n),
            Self::Cycle(id) => write!(f, "node {} would become its own descendant", id),
        }
    }
}
