//! Comparison of verdicts with expected results.
//!
//! Test documents mark claims with `✔︎` or `✗`, which sets the attribute
//! [`EXPECTED_RESULT`] to `"valid"` or `"invalid"`.
//! Other expectations, such as `"indeterminate"` or `"inapplicable"`,
//! can be given via JSON attributes.

use crate::chain;
use crate::scope::SCOPE_ERRORS;
use crate::validate::BAD_BIH;
use crate::{Document, NodeId, Outcome, Verdict};
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::{self, Display};
use serde_json::Value;

pub const EXPECTED_RESULT: &str = "ExpectedResult";

/// Nodes with an expected result, in document order.
pub fn expectations(doc: &Document) -> Vec<(NodeId, &str)> {
    let expected = |n: NodeId| doc.get_attribute(n, EXPECTED_RESULT).and_then(Value::as_str);
    let nodes = doc.descendants(doc.root());
    nodes.filter_map(|n| expected(n).map(|e| (n, e))).collect()
}

/// Return true if a node was validated as expected.
///
/// Hints that instantiate no rule and redeclarations count as invalid,
/// and chains of equations are compared by their combined verdict.
pub fn is_met(doc: &Document, id: NodeId, expected: &str) -> bool {
    let node = doc.node(id);
    let is = |o: Outcome| o.as_str() == expected;
    let invalid = expected == Outcome::Invalid.as_str();
    let verdict = doc.verdict(id).map_or(false, |v| {
        let tool = v.tools.get("arithmetic").and_then(Value::as_str);
        is(v.result) || tool == Some(expected) || (node.flag(BAD_BIH) && invalid)
    });
    let redeclared = doc.get_attribute(id, SCOPE_ERRORS).and_then(|e| e.get("redeclared"));
    let chained = doc.expr(id).map_or(false, |e| e.args_of("=").is_some());
    verdict || (redeclared.is_some() && invalid) || (chained && chain::aggregate(doc, id).map_or(false, is))
}

/// A node whose verdict differs from its expected result.
#[derive(Clone, Debug, PartialEq)]
pub struct Failure {
    pub node: NodeId,
    pub address: Vec<usize>,
    pub expected: String,
    pub actual: Option<Verdict>,
}

impl Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "expected {} at address {:?}, got ", self.expected, self.address)?;
        match &self.actual {
            Some(v) => v.fmt(f),
            None => "no verdict".fmt(f),
        }
    }
}

/// Return all expectations that were not met.
pub fn expected_failures(doc: &Document) -> Vec<Failure> {
    let unmet = expectations(doc).into_iter().filter(|(n, e)| !is_met(doc, *n, e));
    unmet
        .map(|(node, expected)| Failure {
            node,
            address: doc.address(node),
            expected: expected.into(),
            actual: doc.verdict(node).cloned(),
        })
        .collect()
}

/// Number of expectations per expected result.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tally {
    pub valid: usize,
    pub indeterminate: usize,
    pub invalid: usize,
    pub inapplicable: usize,
}

impl core::ops::AddAssign for Tally {
    fn add_assign(&mut self, other: Self) {
        self.valid += other.valid;
        self.indeterminate += other.indeterminate;
        self.invalid += other.invalid;
        self.inapplicable += other.inapplicable;
    }
}

pub fn tally(doc: &Document) -> Tally {
    let mut t = Tally::default();
    for (_, expected) in expectations(doc) {
        match expected {
            "valid" => t.valid += 1,
            "indeterminate" => t.indeterminate += 1,
            "invalid" => t.invalid += 1,
            "inapplicable" => t.inapplicable += 1,
            _ => (),
        }
    }
    t
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Options, Validator};
    use alloc::string::ToString;

    #[test]
    fn failures() {
        let src = "[and const] {* :A :B (and A B) *} :P :Q (and P Q) ✔︎ (and P R) ✗ [x var] [x var] ✗";
        let mut doc = Document::parse(src).unwrap();
        Validator::new(Options::default()).validate(&mut doc);
        let failures = expected_failures(&doc);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].expected, "invalid");
        assert_eq!(failures[0].actual.as_ref().map(|v| v.result), Some(Outcome::Indeterminate));
        assert_eq!(doc.expr(failures[0].node).unwrap().to_string(), "(and P R)");
        assert_eq!(tally(&doc), Tally { valid: 1, invalid: 2, ..Tally::default() });
    }

    #[test]
    fn inapplicable() {
        let src = r#"(= x 1) +{"by": "arithmetic", "ExpectedResult": "inapplicable"}"#;
        let mut doc = Document::parse(src).unwrap();
        Validator::new(Options::default()).validate(&mut doc);
        assert!(expected_failures(&doc).is_empty());
        assert_eq!(tally(&doc).inapplicable, 1);
    }
}
