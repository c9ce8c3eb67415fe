//! Instantiation of rules.
//!
//! Instantiations of a rule are found by matching the patterns of the rule
//! against user propositions.
//! Every pattern may be matched against any proposition or be skipped,
//! so a substitution may be built from several propositions.
//! Each instantiation remembers the latest proposition used to find it,
//! its *anchor*, which decides whether it may justify a given conclusion.

use crate::error::EngineError;
use crate::matching::Matcher;
use crate::node::{Kind, VALIDATION_RESULT};
use crate::pattern::{Pattern, Rule, Shape};
use crate::{Document, Expr, NodeId, Options, Subst};
use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::cmp::Reverse;
use fnv::FnvHashMap;
use putdown_parse::{self as putdown, Attributes, Form};
use serde_json::Value;

#[derive(Clone, Debug, PartialEq)]
pub struct Instantiation {
    pub rule: NodeId,
    pub subst: Subst,
    /// latest user proposition used to find the substitution
    pub anchor: Option<NodeId>,
}

impl Instantiation {
    /// Key that is equal for instantiations of the same rule with
    /// equivalent substitutions and anchors.
    pub fn key(&self) -> String {
        let mut key = alloc::format!("{}", self.rule);
        for (x, e) in self.subst.iter() {
            key.push_str(&alloc::format!(" {}={}", x, e.canonical()));
        }
        if let Some(anchor) = self.anchor {
            key.push_str(&alloc::format!(" @{}", anchor));
        }
        key
    }

    /// Substitution as JSON object from metavariables to putdown.
    pub fn subst_json(&self) -> Value {
        let subst = self.subst.iter().map(|(x, e)| (x.clone(), Value::from(e.to_string())));
        Value::Object(subst.collect())
    }
}

/// Propositions that rules are instantiated with, in document order.
pub struct Propositions {
    ids: Vec<NodeId>,
    /// positions of the propositions that cases rules may conclude
    conclusions: Vec<usize>,
    positions: FnvHashMap<NodeId, usize>,
}

impl Propositions {
    pub fn new(ids: Vec<NodeId>, conclusions: &[NodeId]) -> Self {
        let positions: FnvHashMap<_, _> = ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();
        let conclusions = conclusions.iter().filter_map(|c| positions.get(c).copied()).collect();
        Self {
            ids,
            conclusions,
            positions,
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn position(&self, id: NodeId) -> Option<usize> {
        self.positions.get(&id).copied()
    }
}

type Partial = (Subst, Option<usize>);

/// Remove duplicate substitutions, keeping the earliest anchor for each.
fn dedup(partials: Vec<Partial>, limit: usize, rule: NodeId) -> Vec<Partial> {
    let mut seen: BTreeMap<String, usize> = BTreeMap::new();
    let mut out: Vec<Partial> = Vec::new();
    for (subst, anchor) in partials {
        let key: String = subst.iter().map(|(x, e)| alloc::format!("{}={};", x, e.canonical())).collect();
        match seen.get(&key) {
            Some(i) => {
                let old = &mut out[*i].1;
                if anchor < *old {
                    *old = anchor
                }
            }
            None => {
                if out.len() >= limit {
                    warn!("Stopping search for instantiations of {} after {} candidates", rule, limit);
                    break;
                }
                seen.insert(key, out.len());
                out.push((subst, anchor))
            }
        }
    }
    out
}

/// Find instantiations of a rule.
pub fn search(doc: &Document, rule: &Rule, props: &Propositions, opts: &Options) -> Vec<Instantiation> {
    if rule.metavars.is_empty() {
        return alloc::vec![Instantiation {
            rule: rule.id,
            subst: Subst::new(),
            anchor: None,
        }];
    }

    let matcher = Matcher::new(&rule.metavars);
    let exprs: Vec<(usize, &Expr)> = props
        .ids
        .iter()
        .enumerate()
        .filter_map(|(i, id)| doc.expr(*id).map(|e| (i, e)))
        .collect();

    // avoided patterns are only matched once their operator is known
    let avoided = |p: &Pattern| p.shape.is_avoided(opts);
    let mut sources: Vec<&Pattern> = rule
        .patterns
        .iter()
        .filter(|p| !(p.shape == Shape::LoneMetavar && avoided(*p)))
        .collect();
    // patterns with more structure first, as they have fewer matches
    sources.sort_by_key(|p| (avoided(*p), p.shape != Shape::Anchored, Reverse(p.expr.size())));

    let mut partials: Vec<Partial> = alloc::vec![(Subst::new(), None)];
    for pat in sources {
        let mut next = partials.clone();
        for (subst, anchor) in &partials {
            if avoided(pat) && !pat.is_determined_by(subst) {
                continue;
            }
            for (i, e) in &exprs {
                let found = matcher.matches(&pat.expr, e, subst.clone());
                next.extend(found.into_iter().map(|s| (s, (*anchor).max(Some(*i)))));
            }
        }
        partials = dedup(next, opts.instantiation_limit, rule.id);
    }

    let complete = |s: &Subst| rule.metavars.iter().all(|x| s.contains_key(x));
    let mut found = Vec::new();
    for (subst, anchor) in partials {
        if complete(&subst) {
            found.push((subst, anchor));
            continue;
        }
        // the cases tool instantiates the conclusion with every conclusion of the user
        if let Some(c) = rule.cases.as_ref().filter(|c| !subst.contains_key(*c)) {
            for i in &props.conclusions {
                if let Some(e) = doc.expr(props.ids[*i]) {
                    let subst = subst.update(c.clone(), e.clone());
                    if complete(&subst) {
                        found.push((subst, anchor.max(Some(*i))));
                    }
                }
            }
        }
    }

    let found = dedup(found, usize::MAX, rule.id);
    let mut insts: Vec<_> = found
        .into_iter()
        .map(|(subst, anchor)| Instantiation {
            rule: rule.id,
            subst,
            anchor: anchor.map(|i| props.ids[i]),
        })
        .collect();
    insts.sort_by_key(|i| i.key());
    insts
}

/// Construct the instance of a rule under a substitution.
///
/// The instance is a given environment whose expressions are those
/// of the rule, substituted and beta-reduced.
pub fn instantiate(doc: &Document, rule: &Rule, inst: &Instantiation) -> Result<Form<String>, EngineError> {
    let mut form = instance(doc, rule, rule.id, &inst.subst)?;
    form.given = true;
    if let putdown::Kind::Environment(formula, _) = &mut form.kind {
        *formula = false;
    }
    let mut attributes = Attributes::new();
    attributes.insert("instantiation".into(), true.into());
    attributes.insert("rule".into(), rule.id.index().into());
    attributes.insert("substitution".into(), inst.subst_json());
    if let Some(anchor) = inst.anchor {
        attributes.insert("anchor".into(), anchor.index().into());
    }
    form.attributes = attributes;
    Ok(form)
}

fn instance(doc: &Document, rule: &Rule, id: NodeId, subst: &Subst) -> Result<Form<String>, EngineError> {
    let node = doc.node(id);
    let unbound = |x: &String| rule.metavars.contains(x) && !subst.contains_key(x);
    let children = node.children().iter().map(|c| instance(doc, rule, *c, subst));
    let kind = match node.kind() {
        Kind::Expression(e) => {
            if let Some(x) = e.free_symbols().iter().find(|x| unbound(*x)) {
                return Err(EngineError::UnboundMetavariable(rule.id, x.clone()));
            }
            putdown::Kind::from(e.subst(subst).beta())
        }
        Kind::Environment { formula } => putdown::Kind::Environment(*formula, children.collect::<Result<_, _>>()?),
        Kind::Declaration { decl, symbols } => {
            let symbols = symbols.iter().map(|x| match subst.get(x) {
                Some(Expr::Symbol(s)) => Ok(s.clone()),
                Some(_) => Err(EngineError::NonSymbolDeclaration(rule.id, x.clone())),
                None if unbound(x) => Err(EngineError::UnboundMetavariable(rule.id, x.clone())),
                None => Ok(x.clone()),
            });
            let symbols = symbols.collect::<Result<_, _>>()?;
            let body = children.map(|b| b.map(Box::new)).next().transpose()?;
            putdown::Kind::Declaration(*decl, symbols, body)
        }
        Kind::Comment(c) => putdown::Kind::Comment(c.clone()),
    };
    let mut attributes = node.attributes().clone();
    attributes.remove(VALIDATION_RESULT);
    Ok(Form {
        given: node.is_given(),
        kind,
        attributes,
    })
}

/// Remove all instantiations of a rule, returning their number.
pub fn discard(doc: &mut Document, rule: NodeId) -> usize {
    let mut insts: Vec<NodeId> = doc.provenance.iter().filter(|(_, i)| i.rule == rule).map(|(id, _)| *id).collect();
    insts.sort();
    for id in &insts {
        if let (Some(parent), Some(index)) = (doc.parent(*id), doc.index_in_parent(*id)) {
            doc.remove_child(parent, index);
        }
    }
    insts.len()
}

/// Find a substitution under which a subtree is an instance of the rule.
///
/// Below the top level, given flags must agree. Comments are ignored.
pub fn match_instance(doc: &Document, rule: &Rule, node: NodeId) -> Option<Subst> {
    let matcher = Matcher::new(&rule.metavars);
    let found = match_children(doc, &matcher, rule.id, node, alloc::vec![Subst::new()]);
    found.into_iter().find(|s| rule.metavars.iter().all(|x| s.contains_key(x)))
}

fn contents(doc: &Document, id: NodeId) -> Vec<NodeId> {
    let children = doc.children(id).iter().copied();
    children.filter(|c| !doc.node(*c).is_comment()).collect()
}

fn match_children(doc: &Document, matcher: &Matcher, pat: NodeId, node: NodeId, substs: Vec<Subst>) -> Vec<Subst> {
    let (pats, nodes) = (contents(doc, pat), contents(doc, node));
    if pats.len() != nodes.len() {
        return Vec::new();
    }
    pats.iter().zip(&nodes).fold(substs, |substs, (p, n)| {
        if doc.node(*p).is_given() != doc.node(*n).is_given() {
            return Vec::new();
        }
        match_node(doc, matcher, *p, *n, substs)
    })
}

fn match_node(doc: &Document, matcher: &Matcher, pat: NodeId, node: NodeId, substs: Vec<Subst>) -> Vec<Subst> {
    let exprs = |substs: Vec<Subst>, p: &Expr, e: &Expr| -> Vec<Subst> {
        substs.into_iter().flat_map(|s| matcher.matches(p, e, s)).collect()
    };
    match (doc.node(pat).kind(), doc.node(node).kind()) {
        (Kind::Expression(p), Kind::Expression(e)) => exprs(substs, p, e),
        (Kind::Environment { formula: false }, Kind::Environment { formula: false }) => {
            match_children(doc, matcher, pat, node, substs)
        }
        (Kind::Declaration { decl: d1, symbols: xs }, Kind::Declaration { decl: d2, symbols: ys })
            if d1 == d2 && xs.len() == ys.len() =>
        {
            let substs = xs.iter().zip(ys).fold(substs, |substs, (x, y)| {
                exprs(substs, &Expr::symbol(x.clone()), &Expr::symbol(y.clone()))
            });
            match_children(doc, matcher, pat, node, substs)
        }
        _ => Vec::new(),
    }
}

/// Bring the instantiations of a rule in the document up to date.
///
/// Instantiations are placed right after their rule.
/// Existing instantiations that are still wanted stay untouched,
/// such that verdicts depending on them remain valid.
/// Return the number of inserted instantiations.
pub fn sync(doc: &mut Document, rule: &Rule, wanted: Vec<Instantiation>) -> Result<usize, crate::Error> {
    let parent = match doc.parent(rule.id) {
        Some(parent) => parent,
        None => return Ok(0),
    };
    let mut wanted: BTreeMap<String, Instantiation> = wanted.into_iter().map(|i| (i.key(), i)).collect();

    let existing: Vec<(NodeId, String)> = doc
        .children(parent)
        .iter()
        .filter_map(|c| doc.provenance.get(c).filter(|i| i.rule == rule.id).map(|i| (*c, i.key())))
        .collect();
    let mut kept = 0;
    for (id, key) in existing {
        if wanted.remove(&key).is_some() {
            kept += 1;
        } else if let Some(index) = doc.index_in_parent(id) {
            debug!("Removing stale instantiation {} of {}", id, rule.id);
            doc.remove_child(parent, index);
        }
    }

    let mut inserted = 0;
    for (_, inst) in wanted {
        let form = instantiate(doc, rule, &inst)?;
        let index = doc.index_in_parent(rule.id).unwrap_or(0) + 1 + kept + inserted;
        let id = doc.insert_form(parent, index, form)?;
        doc.provenance.insert(id, inst);
        inserted += 1;
    }
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::parse_expr;

    fn setup(src: &str) -> (Document, Rule, Propositions) {
        let doc = Document::parse(src).unwrap();
        let root = doc.root();
        let rule = doc.children(root).iter().copied().find(|c| doc.node(*c).is_formula()).unwrap();
        let rule = Rule::new(&doc, rule, &Options::default()).unwrap();
        let props: Vec<_> = doc.descendants_satisfying(root, |n| doc.is_user(n) && doc.expr(n).is_some()).collect();
        let claims: Vec<_> = props.iter().copied().filter(|p| !doc.node(*p).is_given()).collect();
        let props = Propositions::new(props, &claims);
        (doc, rule, props)
    }

    #[test]
    fn conjunction() {
        let (doc, rule, props) = setup("[and const] {* :A :B (and A B) *} :P :Q (and P Q)");
        let insts = search(&doc, &rule, &props, &Options::default());
        assert_eq!(insts.len(), 1);
        assert_eq!(insts[0].subst["A"], parse_expr("P"));
        assert_eq!(insts[0].anchor, doc.children(doc.root()).last().copied());

        let form = instantiate(&doc, &rule, &insts[0]).unwrap();
        let form = Form { attributes: Attributes::new(), ..form };
        assert_eq!(form.to_string(), ":{ :P :Q (and P Q) }");
    }

    #[test]
    fn modus_ponens() {
        let src = "[⇒ const] {* :A :(⇒ A B) B *} :(⇒ P Q) :(⇒ Q R) :P R";
        let (doc, rule, props) = setup(src);
        let insts = search(&doc, &rule, &props, &Options::default());
        let substs: Vec<_> = insts.iter().map(|i| i.subst_json().to_string()).collect();
        assert_eq!(substs, [r#"{"A":"P","B":"Q"}"#, r#"{"A":"Q","B":"R"}"#]);
    }

    #[test]
    fn cases() {
        let src = "[or const] {* :(or A B) :{ :A C } :{ :B C } C *} +{\"cases\": true} :(or P Q) S";
        let (doc, rule, props) = setup(src);
        let insts = search(&doc, &rule, &props, &Options::default());
        assert_eq!(insts.len(), 1);
        assert_eq!(insts[0].subst["C"], parse_expr("S"));
    }

    #[test]
    fn instance() {
        let src = "[⇒ const] {* :A :(⇒ A B) B *} { :P :(⇒ P Q) Q } { :P :(⇒ Q P) Q } { :P Q }";
        let (doc, rule, _) = setup(src);
        let [good, swapped, short] = [2, 3, 4].map(|i| doc.children(doc.root())[i]);
        let subst = match_instance(&doc, &rule, good).unwrap();
        assert_eq!(subst["B"], parse_expr("Q"));
        assert_eq!(match_instance(&doc, &rule, swapped), None);
        assert_eq!(match_instance(&doc, &rule, short), None);
    }

    #[test]
    fn synchronise() {
        let (mut doc, rule, props) = setup("[and const] {* :A :B (and A B) *} :P :Q (and P Q)");
        let insts = search(&doc, &rule, &props, &Options::default());
        assert_eq!(sync(&mut doc, &rule, insts.clone()).unwrap(), 1);
        let inst = doc.children(doc.root())[2];
        assert!(doc.provenance.contains_key(&inst));
        assert!(doc.node(inst).is_given());

        // nothing changes if the same instantiations are wanted again
        assert_eq!(sync(&mut doc, &rule, insts).unwrap(), 0);
        assert_eq!(doc.children(doc.root())[2], inst);

        assert_eq!(discard(&mut doc, rule.id), 1);
        assert!(!doc.is_alive(inst));
        assert_eq!(doc.children(doc.root()).len(), 5);
    }
}
