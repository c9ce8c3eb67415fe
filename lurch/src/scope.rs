//! Scoping of declarations.

use crate::node::Kind;
use crate::{Document, NodeId};
use alloc::collections::BTreeSet;
use alloc::string::String;
use alloc::vec::Vec;

/// Attribute listing the scoping errors of a declaration.
pub const SCOPE_ERRORS: &str = "scope errors";

fn declared(doc: &Document, id: NodeId) -> Option<&[String]> {
    match doc.node(id).kind() {
        Kind::Declaration { symbols, .. } => Some(symbols),
        _ => None,
    }
}

/// Find user declarations of symbols that are already declared,
/// together with the redeclared symbols.
///
/// Declarations inside formulas are not checked.
pub fn redeclarations(doc: &Document) -> Vec<(NodeId, Vec<String>)> {
    let decls = doc.descendants_satisfying(doc.root(), |n| declared(doc, n).is_some() && doc.is_user(n));
    let mut out = Vec::new();
    for d in decls {
        let earlier: BTreeSet<&String> = doc
            .accessibles(d)
            .into_iter()
            .filter_map(|a| declared(doc, a))
            .flatten()
            .collect();
        let mut seen = BTreeSet::new();
        let redeclared: Vec<String> = declared(doc, d)
            .unwrap_or_default()
            .iter()
            .filter(|x| earlier.contains(x) || !seen.insert(*x))
            .cloned()
            .collect();
        if !redeclared.is_empty() {
            out.push((d, redeclared))
        }
    }
    out
}

#[test]
fn redeclared() {
    let doc = Document::parse("[x var] { [y x var] [z z var] } [y var]").unwrap();
    let found: Vec<_> = redeclarations(&doc).into_iter().map(|(_, xs)| xs).collect();
    assert_eq!(found, [alloc::vec!["x"], alloc::vec!["z"]]);
}
