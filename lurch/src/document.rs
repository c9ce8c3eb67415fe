//! Documents as trees of nodes.
//!
//! A document owns all its nodes in an arena and refers to them by [`NodeId`].
//! The root of a document is an environment whose children are the
//! top-level forms of the document.
//!
//! Every change to the tree marks the changed node and all its ancestors
//! as dirty and removes the verdicts of all nodes that follow the change
//! in document order, because only those may depend on it.
//!
//! Nodes are never freed while their document lives:
//! a removed subtree keeps its ids, so that it can be inserted again.
//! The arena therefore only grows.

use crate::error::{EngineError, Error};
use crate::instantiate::Instantiation;
use crate::node::{Kind, Node, NodeId, Verdict, VALIDATION_RESULT};
use crate::{Expr, Options};
use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::convert::TryFrom;
use fnv::FnvHashMap;
use itertools::Itertools;
use putdown_parse::{self as putdown, Attributes, Form};
use serde_json::Value;

#[derive(Clone, Debug)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
    /// rule instantiations inserted by the engine
    pub(crate) provenance: FnvHashMap<NodeId, Instantiation>,
    /// equations derived from a chain, mapped to their chain
    pub(crate) chains: FnvHashMap<NodeId, NodeId>,
    /// options of the last validation
    pub(crate) validated_with: Option<Options>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document.
    pub fn new() -> Self {
        let root = Node::new(Kind::Environment { formula: false }, false, Attributes::new());
        Self {
            nodes: alloc::vec![root],
            root: NodeId(0),
            provenance: Default::default(),
            chains: Default::default(),
            validated_with: None,
        }
    }

    /// Parse a document from putdown notation.
    ///
    /// ~~~
    /// # use lurch::{Document, node::Kind};
    /// let doc = Document::parse("{ :A B } C")?;
    /// let env = doc.children(doc.root())[0];
    /// assert!(matches!(doc.node(env).kind(), Kind::Environment { formula: false }));
    /// assert_eq!(doc.address(doc.children(env)[1]), [0, 1]);
    /// # Ok::<_, lurch::Error>(())
    /// ~~~
    pub fn parse(s: &str) -> Result<Self, Error> {
        Self::from_forms(putdown_parse::parse(s)?)
    }

    pub fn from_forms<S: Into<String>>(forms: impl IntoIterator<Item = Form<S>>) -> Result<Self, Error> {
        let mut doc = Self::new();
        let root = doc.root;
        for form in forms {
            let id = doc.build(form)?;
            doc.attach(root, None, id);
        }
        Ok(doc)
    }

    /// Insert dependencies as givens at the start of the document.
    pub fn import<S: Into<String>>(&mut self, forms: impl IntoIterator<Item = Form<S>>) -> Result<(), Error> {
        let root = self.root;
        let forms = forms.into_iter().filter(|f| !f.is_comment());
        for (i, mut form) in forms.enumerate() {
            form.given = true;
            let id = self.build(form)?;
            self.insert_child(root, i, id)?;
        }
        Ok(())
    }

    /// Create a detached subtree from a form.
    ///
    /// The subtree becomes part of the document once it is inserted.
    pub fn create<S: Into<String>>(&mut self, form: Form<S>) -> Result<NodeId, Error> {
        let id = self.build(form)?;
        self.set_alive(id, false);
        Ok(id)
    }

    fn build<S: Into<String>>(&mut self, form: Form<S>) -> Result<NodeId, EngineError> {
        let Form {
            given,
            kind,
            attributes,
        } = form;
        let (kind, children) = match kind {
            putdown::Kind::Environment(formula, items) => (Kind::Environment { formula }, items),
            putdown::Kind::Declaration(decl, symbols, body) => {
                let symbols = symbols.into_iter().map(Into::into).collect();
                let body = body.map(|body| {
                    let mut body = *body;
                    body.given = given;
                    body
                });
                (Kind::Declaration { decl, symbols }, body.into_iter().collect())
            }
            putdown::Kind::Comment(c) => (Kind::Comment(c.into()), Vec::new()),
            kind => {
                let expr = Expr::try_from(kind).map_err(|()| EngineError::NotAnExpression)?;
                (Kind::Expression(expr), Vec::new())
            }
        };
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(kind, given, attributes));
        for child in children {
            let child = self.build(child)?;
            self.attach(id, None, child);
        }
        Ok(id)
    }

    fn attach(&mut self, parent: NodeId, index: Option<usize>, child: NodeId) {
        self.nodes[child.0].parent = Some(parent);
        let children = &mut self.nodes[parent.0].children;
        let index = index.map_or(children.len(), |i| i.min(children.len()));
        children.insert(index, child);
    }

    fn set_alive(&mut self, id: NodeId, alive: bool) {
        let ids: Vec<_> = self.descendants(id).collect();
        ids.into_iter().for_each(|i| self.nodes[i.0].alive = alive)
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    pub fn child(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.children(id).get(index).copied()
    }

    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|c| *c == id)
    }

    pub fn expr(&self, id: NodeId) -> Option<&Expr> {
        self.node(id).expr()
    }

    /// Return false if the node is not (or no longer) part of the document tree.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.node(id).alive
    }

    /// Insert a subtree as child of the parent at the given index.
    ///
    /// A subtree that is still attached is moved:
    /// it is first removed from its old parent, and
    /// the index refers to the children of the parent after that removal.
    /// Inserting a node below itself fails.
    ///
    /// ~~~
    /// # use lurch::{Document, Error};
    /// let mut doc = Document::parse("{ A } B")?;
    /// let root = doc.root();
    /// let env = doc.children(root)[0];
    /// assert_eq!(doc.insert_child(env, 0, root), Err(Error::Cycle(root)));
    /// doc.insert_child(root, 1, env)?;
    /// assert_eq!(doc.to_putdown(), "B\n{ A }");
    /// # Ok::<_, lurch::Error>(())
    /// ~~~
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) -> Result<(), Error> {
        if self.ancestors(parent).any(|a| a == child) {
            return Err(Error::Cycle(child));
        }
        if let Some(old) = self.parent(child) {
            if let Some(i) = self.index_in_parent(child) {
                self.remove_child(old, i);
            }
        }
        self.attach(parent, Some(index), child);
        self.set_alive(child, true);
        self.invalidate_from(child);
        self.mark_dirty(parent);
        Ok(())
    }

    /// Parse a form into a subtree and insert it, returning the new child.
    pub fn insert_form<S: Into<String>>(
        &mut self,
        parent: NodeId,
        index: usize,
        form: Form<S>,
    ) -> Result<NodeId, Error> {
        let child = self.build(form)?;
        self.insert_child(parent, index, child)?;
        Ok(child)
    }

    /// Detach the child at the given index, returning it.
    ///
    /// The child and its descendants stay in the arena
    /// and can be inserted again with [`Self::insert_child`].
    pub fn remove_child(&mut self, parent: NodeId, index: usize) -> Option<NodeId> {
        let child = self.child(parent, index)?;
        self.invalidate_from(child);
        self.nodes[parent.0].children.remove(index);
        self.nodes[child.0].parent = None;
        let removed: Vec<_> = self.descendants(child).collect();
        for id in removed {
            self.nodes[id.0].alive = false;
            self.provenance.remove(&id);
            self.chains.remove(&id);
        }
        self.mark_dirty(parent);
        Some(child)
    }

    /// Mark a node and all its ancestors as dirty.
    pub fn mark_dirty(&mut self, id: NodeId) {
        let mut cur = Some(id);
        while let Some(id) = cur {
            self.nodes[id.0].dirty = true;
            cur = self.parent(id);
        }
    }

    /// Return true if the node or one of its descendants changed since the last validation.
    pub fn is_dirty(&self, id: NodeId) -> bool {
        self.node(id).dirty
    }

    /// Remove all verdicts, such that the next validation starts afresh.
    pub fn reset(&mut self) {
        let root = self.root;
        self.invalidate_from(root);
        self.mark_dirty(root);
        self.validated_with = None;
    }

    pub(crate) fn clean(&mut self) {
        self.nodes.iter_mut().for_each(|n| n.dirty = false)
    }

    /// Remove the verdicts of the node and of all nodes after it in document order.
    fn invalidate_from(&mut self, id: NodeId) {
        let after: Vec<_> = self.descendants(self.root).skip_while(|n| *n != id).collect();
        let detached = self.descendants(id);
        let ids: Vec<_> = if after.is_empty() { detached.collect() } else { after };
        for id in ids {
            let node = &mut self.nodes[id.0];
            node.verdict = None;
            node.attributes.remove(VALIDATION_RESULT);
        }
    }

    pub fn get_attribute(&self, id: NodeId, key: &str) -> Option<&Value> {
        self.node(id).attributes.get(key)
    }

    pub fn set_attribute(&mut self, id: NodeId, key: impl Into<String>, value: impl Into<Value>) {
        self.nodes[id.0].attributes.insert(key.into(), value.into());
        self.invalidate_from(id);
        self.mark_dirty(id);
    }

    pub fn clear_attribute(&mut self, id: NodeId, key: &str) -> Option<Value> {
        let old = self.nodes[id.0].attributes.remove(key);
        if old.is_some() {
            self.invalidate_from(id);
            self.mark_dirty(id);
        }
        old
    }

    /// Make a node given or claimed.
    pub fn set_given(&mut self, id: NodeId, given: bool) {
        if self.node(id).given != given {
            self.nodes[id.0].given = given;
            self.invalidate_from(id);
            self.mark_dirty(id);
        }
    }

    /// Set an attribute computed by the engine, leaving verdicts untouched.
    pub(crate) fn annotate(&mut self, id: NodeId, key: &str, value: Value) {
        self.nodes[id.0].attributes.insert(key.into(), value);
    }

    pub(crate) fn unannotate(&mut self, id: NodeId, key: &str) {
        self.nodes[id.0].attributes.remove(key);
    }

    pub fn verdict(&self, id: NodeId) -> Option<&Verdict> {
        self.node(id).verdict.as_ref()
    }

    pub(crate) fn set_verdict(&mut self, id: NodeId, verdict: Verdict) {
        if let Ok(json) = serde_json::to_value(&verdict) {
            self.annotate(id, VALIDATION_RESULT, json);
        }
        self.nodes[id.0].verdict = Some(verdict);
    }

    /// Nodes of the subtree rooted at the given node, in pre-order.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            doc: self,
            stack: alloc::vec![id],
        }
    }

    /// Lazily enumerate the nodes of a subtree that satisfy a predicate.
    pub fn descendants_satisfying<'a>(
        &'a self,
        id: NodeId,
        mut pred: impl FnMut(NodeId) -> bool + 'a,
    ) -> impl Iterator<Item = NodeId> + 'a {
        self.descendants(id).filter(move |n| pred(*n))
    }

    /// Indices leading from the root to the node.
    pub fn address(&self, id: NodeId) -> Vec<usize> {
        let mut address = Vec::new();
        let mut cur = id;
        while let Some(i) = self.index_in_parent(cur) {
            address.push(i);
            cur = self.nodes[cur.0].parent.unwrap_or(self.root);
        }
        address.reverse();
        address
    }

    /// Return true if `a` precedes `b` in document order.
    ///
    /// Ancestors precede their descendants.
    pub fn is_earlier_than(&self, a: NodeId, b: NodeId) -> bool {
        self.address(a) < self.address(b)
    }

    /// Nodes whose content may be used at the given node, in document order:
    /// the earlier siblings of the node and of all its ancestors.
    pub fn accessibles(&self, id: NodeId) -> Vec<NodeId> {
        let mut levels = Vec::new();
        let mut cur = id;
        while let Some(parent) = self.parent(cur) {
            let siblings = self.children(parent);
            let i = siblings.iter().position(|s| *s == cur).unwrap_or(0);
            levels.push(&siblings[..i]);
            cur = parent;
        }
        levels.into_iter().rev().flatten().copied().collect()
    }

    /// Formulas accessible to the given node.
    pub fn accessible_rules(&self, id: NodeId) -> Vec<NodeId> {
        let mut rules = self.accessibles(id);
        rules.retain(|r| self.node(*r).is_formula());
        rules
    }

    /// The node and all its ancestors, innermost first.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        core::iter::successors(Some(id), move |id| self.parent(*id))
    }

    /// Return true if the node is a formula or lies inside one.
    pub fn in_formula(&self, id: NodeId) -> bool {
        self.ancestors(id).any(|a| self.node(a).is_formula())
    }

    /// Return the instantiation that contains the node, if any.
    pub fn instantiation_of(&self, id: NodeId) -> Option<(NodeId, &Instantiation)> {
        self.ancestors(id)
            .find_map(|a| self.provenance.get(&a).map(|inst| (a, inst)))
    }

    /// Return true if the node was written by the user,
    /// i.e. it is neither part of a formula nor created by the engine.
    pub fn is_user(&self, id: NodeId) -> bool {
        !self.in_formula(id) && self.instantiation_of(id).is_none()
    }

    /// Return the equation chain from which the node was derived.
    pub fn chain_of(&self, id: NodeId) -> Option<NodeId> {
        self.chains.get(&id).copied()
    }

    /// Convert a subtree back to a form.
    pub fn form(&self, id: NodeId) -> Form<String> {
        let node = self.node(id);
        let mut children = node.children.iter().map(|c| self.form(*c));
        let kind = match &node.kind {
            Kind::Expression(e) => putdown::Kind::from(e.clone()),
            Kind::Environment { formula } => putdown::Kind::Environment(*formula, children.collect()),
            Kind::Declaration { decl, symbols } => {
                let body = children.next().map(|mut body| {
                    body.given = false;
                    Box::new(body)
                });
                putdown::Kind::Declaration(*decl, symbols.clone(), body)
            }
            Kind::Comment(c) => putdown::Kind::Comment(c.clone()),
        };
        Form {
            given: node.given,
            kind,
            attributes: node.attributes.clone(),
        }
    }

    /// Print the document in putdown notation, one top-level form per line.
    pub fn to_putdown(&self) -> String {
        let forms = self.children(self.root).iter();
        forms.map(|c| self.form(*c)).join("\n")
    }
}

/// Pre-order traversal of a subtree.
pub struct Descendants<'a> {
    doc: &'a Document,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        self.stack.extend(self.doc.children(id).iter().rev());
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Outcome;

    fn doc() -> Document {
        Document::parse("{ :A B } C [x var (P x)]").unwrap()
    }

    #[test]
    fn structure() {
        let doc = doc();
        let root = doc.root();
        let [env, c, decl] = [0, 1, 2].map(|i| doc.children(root)[i]);
        let [a, b] = [0, 1].map(|i| doc.children(env)[i]);
        assert!(doc.node(a).is_given());
        assert_eq!(doc.address(b), [0, 1]);
        assert!(doc.is_earlier_than(env, a));
        assert!(doc.is_earlier_than(b, c));
        assert!(!doc.is_earlier_than(c, b));
        assert_eq!(doc.accessibles(b), [a]);
        assert_eq!(doc.accessibles(c), [env]);
        assert_eq!(doc.accessibles(doc.children(decl)[0]), [env, c]);
        let exprs = doc.descendants_satisfying(root, |n| doc.expr(n).is_some());
        assert_eq!(exprs.count(), 4);
    }

    #[test]
    fn invalidation() {
        let mut doc = doc();
        let root = doc.root();
        let [env, c] = [0, 1].map(|i| doc.children(root)[i]);
        doc.set_verdict(env, Verdict::new(Outcome::Valid));
        doc.set_verdict(c, Verdict::new(Outcome::Valid));
        doc.clean();

        doc.insert_form(root, 3, Form::new(false, putdown::Kind::Symbol("D")))
            .unwrap();
        assert!(doc.verdict(c).is_some());
        assert!(doc.is_dirty(root));
        assert!(!doc.is_dirty(env));

        let b = doc.children(env)[1];
        doc.set_given(b, true);
        assert!(doc.verdict(env).is_some());
        assert!(doc.verdict(c).is_none());
        assert!(doc.get_attribute(c, VALIDATION_RESULT).is_none());
        assert!(doc.is_dirty(env));
    }

    #[test]
    fn removal() {
        let mut doc = doc();
        let root = doc.root();
        let env = doc.remove_child(root, 0).unwrap();
        assert!(!doc.is_alive(env));
        assert!(!doc.is_alive(doc.children(env)[0]));
        assert_eq!(doc.children(root).len(), 2);
        doc.insert_child(root, 2, env).unwrap();
        assert!(doc.is_alive(doc.children(env)[1]));
        assert_eq!(doc.to_putdown(), "C\n[x var (P x)]\n{ :A B }");
    }

    #[test]
    fn moving() {
        let mut doc = doc();
        let root = doc.root();
        let [env, c] = [0, 1].map(|i| doc.children(root)[i]);
        let b = doc.children(env)[1];

        // an attached node is moved, not duplicated
        doc.insert_child(root, 0, b).unwrap();
        assert_eq!(doc.parent(b), Some(root));
        assert_eq!(doc.children(env).len(), 1);
        assert_eq!(doc.children(root).iter().filter(|n| **n == b).count(), 1);
        assert_eq!(doc.to_putdown(), "B\n{ :A }\nC\n[x var (P x)]");

        // the index refers to the siblings left after detaching
        doc.insert_child(root, 1, c).unwrap();
        assert_eq!(doc.children(root)[1], c);
        assert_eq!(doc.descendants(root).filter(|n| *n == c).count(), 1);

        // no node may be inserted below itself
        let a = doc.children(env)[0];
        assert_eq!(doc.insert_child(a, 0, env), Err(Error::Cycle(env)));
        assert_eq!(doc.insert_child(env, 0, env), Err(Error::Cycle(env)));
        assert_eq!(doc.insert_child(env, 0, root), Err(Error::Cycle(root)));
        assert_eq!(doc.parent(env), Some(root));
    }

    #[test]
    fn lazy_descendants() {
        use core::cell::Cell;
        let doc = doc();
        let calls = Cell::new(0);
        let first = doc
            .descendants_satisfying(doc.root(), |n| {
                calls.set(calls.get() + 1);
                doc.expr(n).is_some()
            })
            .next();
        // root, environment, A
        assert_eq!(first, Some(doc.children(doc.children(doc.root())[0])[0]));
        assert_eq!(calls.get(), 3);
        assert!(calls.get() < doc.descendants(doc.root()).count());
    }
}
