//! Chains of equations.
//!
//! A chain `(= a b c)` is split into the equations `(= a b)` and `(= b c)`,
//! which are inserted right before the chain and validated individually.
//! Chain and derived equations share the value of the attribute [`CHAIN_ID`].

use crate::{Document, Error, Expr, NodeId, Outcome};
use alloc::vec::Vec;
use itertools::Itertools;
use putdown_parse::{Form, Kind};

/// Attribute linking equations to their chain.
pub const CHAIN_ID: &str = "_id";

/// Return the links of a chain.
pub fn links(chain: &Expr) -> Vec<Expr> {
    let args = chain.args_of("=").unwrap_or_default();
    let link = |(a, b): (&Expr, &Expr)| Expr::apply(Expr::symbol("="), [a.clone(), b.clone()]);
    args.iter().tuple_windows().map(link).collect()
}

/// Return the equation between the first and the last term of a chain.
pub fn endpoints(chain: &Expr) -> Option<Expr> {
    let args = chain.args_of("=")?;
    let (first, last) = (args.first()?, args.last()?);
    Some(Expr::apply(Expr::symbol("="), [first.clone(), last.clone()]))
}

/// Insert the equations of all chains that have not been split yet,
/// returning the number of inserted equations.
pub fn expand(doc: &mut Document) -> Result<usize, Error> {
    // equations whose chain was removed
    let mut orphans: Vec<NodeId> = doc
        .chains
        .iter()
        .filter(|(link, chain)| doc.is_alive(**link) && !doc.is_alive(**chain))
        .map(|(link, _)| *link)
        .collect();
    orphans.sort();
    for link in orphans {
        if let (Some(parent), Some(index)) = (doc.parent(link), doc.index_in_parent(link)) {
            doc.remove_child(parent, index);
        }
    }

    let root = doc.root();
    let chains: Vec<NodeId> = doc
        .descendants_satisfying(root, |n| {
            doc.is_user(n) && doc.chain_of(n).is_none() && doc.expr(n).map_or(false, Expr::is_equation_chain)
        })
        .filter(|n| !doc.chains.values().any(|c| c == n))
        .collect();

    let mut inserted = 0;
    for chain in chains {
        let (parent, index) = match (doc.parent(chain), doc.index_in_parent(chain)) {
            (Some(parent), Some(index)) => (parent, index),
            _ => continue,
        };
        let given = doc.node(chain).is_given();
        let equations = doc.expr(chain).map(links).unwrap_or_default();
        doc.annotate(chain, CHAIN_ID, chain.index().into());
        for (i, eq) in equations.into_iter().enumerate() {
            let mut form = Form::new(given, Kind::from(eq));
            form.attributes.insert(CHAIN_ID.into(), chain.index().into());
            let link = doc.insert_form(parent, index + i, form)?;
            doc.chains.insert(link, chain);
            inserted += 1;
        }
    }
    Ok(inserted)
}

/// Remove all equations derived from chains, returning their number.
pub fn collapse(doc: &mut Document) -> usize {
    let mut links: Vec<(NodeId, NodeId)> = doc.chains.iter().map(|(l, c)| (*l, *c)).collect();
    links.sort();
    for (link, chain) in &links {
        if let (Some(parent), Some(index)) = (doc.parent(*link), doc.index_in_parent(*link)) {
            doc.remove_child(parent, index);
        }
        doc.unannotate(*chain, CHAIN_ID);
    }
    links.len()
}

/// Combine the verdicts of the equations of a chain.
///
/// The chain is invalid if any equation is invalid,
/// otherwise indeterminate if any equation is indeterminate,
/// otherwise valid if any equation is valid.
pub fn aggregate(doc: &Document, chain: NodeId) -> Option<Outcome> {
    let results: Vec<Outcome> = doc
        .chains
        .iter()
        .filter(|(link, c)| **c == chain && doc.is_alive(**link))
        .filter_map(|(link, _)| doc.verdict(*link).map(|v| v.result))
        .collect();
    [Outcome::Invalid, Outcome::Indeterminate, Outcome::Valid, Outcome::Error]
        .into_iter()
        .find(|o| results.contains(o))
}
