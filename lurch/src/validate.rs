//! Validation of documents.
//!
//! Validation first prepares a document by a sequence of passes that
//! insert derived nodes, namely the equations of chains and the
//! instantiations of rules, and then judges all targets in document order.
//!
//! A target is judged only by nodes that precede it.
//! Its verdict therefore stays cached until something before it changes.

use crate::cas::{Arithmetic, Cas};
use crate::chain;
use crate::instantiate::{self, Propositions};
use crate::node::Kind;
use crate::pattern::Rule;
use crate::prop::{self, Atoms, Prop};
use crate::scope::{self, SCOPE_ERRORS};
use crate::{Document, Error, Expr, NodeId, Options, Outcome, Verdict};
use alloc::boxed::Box;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use fnv::FnvHashMap;
use putdown_parse::Attributes;
use serde_json::{Map, Value};

/// Attribute marking an environment as blatant instantiation hint.
pub const BIH: &str = "BIH";
/// Attribute set by validation on hints that instantiate no rule.
pub const BAD_BIH: &str = "badBIH";
/// Attribute marking a claim to be validated if not all claims are.
pub const TARGET: &str = "target";
pub const THEOREM: &str = "theorem";
pub const PROOF: &str = "proof";
/// Attribute naming the tool that justifies a claim, such as `"arithmetic"`.
pub const BY: &str = "by";

/// Verdict counts of a validation run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub targets: usize,
    pub valid: usize,
    pub invalid: usize,
    pub indeterminate: usize,
    pub errors: usize,
    /// instantiations present in the document
    pub instantiations: usize,
}

impl Summary {
    fn count(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Valid => self.valid += 1,
            Outcome::Invalid => self.invalid += 1,
            Outcome::Indeterminate => self.indeterminate += 1,
            Outcome::Error => self.errors += 1,
        }
    }
}

type Progress = Box<dyn FnMut(usize, usize)>;

/// Rules that could not be processed, with a description of the fault.
type Faults = FnvHashMap<NodeId, String>;

/// Validates documents under fixed options.
///
/// ~~~
/// # use lurch::{Document, Options, Outcome, Validator};
/// let mut doc = Document::parse("{* :A :B (and A B) *} :P :Q (and P Q)")?;
/// let summary = Validator::new(Options::default()).validate(&mut doc);
/// assert_eq!((summary.targets, summary.valid), (1, 1));
/// # Ok::<_, lurch::Error>(())
/// ~~~
pub struct Validator {
    opts: Options,
    cas: Box<dyn Cas>,
    progress: Option<Progress>,
}

impl Validator {
    pub fn new(opts: Options) -> Self {
        Self {
            opts,
            cas: Box::new(Arithmetic),
            progress: None,
        }
    }

    pub fn options(&self) -> &Options {
        &self.opts
    }

    /// Use a computer algebra system for claims justified `"by": "algebra"`.
    pub fn with_cas(self, cas: impl Cas + 'static) -> Self {
        Self {
            cas: Box::new(cas),
            ..self
        }
    }

    /// Call `f(done, total)` whenever `update_freq` further targets were judged.
    pub fn on_progress(self, f: impl FnMut(usize, usize) + 'static) -> Self {
        Self {
            progress: Some(Box::new(f)),
            ..self
        }
    }

    /// Give a verdict to all targets of the document.
    ///
    /// Verdicts from previous runs with the same options are reused.
    pub fn validate(&mut self, doc: &mut Document) -> Summary {
        self.run(doc, None)
    }

    /// Validate the document and return the verdict of a node.
    ///
    /// The node is validated even if not all claims are validated
    /// and it is not marked as target.
    pub fn validate_node(&mut self, doc: &mut Document, id: NodeId) -> Option<Verdict> {
        self.run(doc, Some(id));
        doc.verdict(id).cloned()
    }

    fn run(&mut self, doc: &mut Document, requested: Option<NodeId>) -> Summary {
        if doc.validated_with.as_ref() != Some(&self.opts) {
            doc.reset();
        }
        let faults = if doc.is_dirty(doc.root()) {
            self.prepare(doc)
        } else {
            Faults::default()
        };

        let targets = self.targets(doc, &faults, requested);
        let total = targets.len();
        info!("Validating {} targets with {} instantiations", total, doc.provenance.len());
        let mut summary = Summary {
            targets: total,
            ..Summary::default()
        };
        let freq = self.opts.update_freq;
        for (i, target) in targets.into_iter().enumerate() {
            let result = match doc.verdict(target) {
                Some(verdict) => verdict.result,
                None => {
                    let verdict = self.judge(doc, target, &faults);
                    debug!("{} is {}", target, verdict);
                    let result = verdict.result;
                    doc.set_verdict(target, verdict);
                    result
                }
            };
            summary.count(result);
            if freq > 0 && (i + 1) % freq == 0 && i + 1 < total {
                self.report(i + 1, total)
            }
        }
        self.report(total, total);

        summary.instantiations = doc.provenance.len();
        doc.validated_with = Some(self.opts.clone());
        doc.clean();
        summary
    }

    fn report(&mut self, done: usize, total: usize) {
        if let Some(f) = self.progress.as_mut() {
            f(done, total)
        }
    }

    /// Insert derived nodes and annotate the document.
    fn prepare(&self, doc: &mut Document) -> Faults {
        if self.opts.swap_theorem_proof_pairs {
            swap_theorems(doc);
        }

        if self.opts.process_equations {
            match chain::expand(doc) {
                Ok(n) => debug!("Inserted {} equations of chains", n),
                Err(e) => error!("Failed to split chains: {}", e),
            }
        } else {
            chain::collapse(doc);
        }

        let root = doc.root();
        let errors: FnvHashMap<NodeId, Vec<String>> = scope::redeclarations(doc).into_iter().collect();
        let stale: Vec<NodeId> = doc
            .descendants_satisfying(root, |n| {
                doc.get_attribute(n, SCOPE_ERRORS).is_some() && !errors.contains_key(&n)
            })
            .collect();
        stale.into_iter().for_each(|n| doc.unannotate(n, SCOPE_ERRORS));
        for (decl, symbols) in errors {
            let mut err = Map::new();
            err.insert("redeclared".into(), symbols.into());
            doc.annotate(decl, SCOPE_ERRORS, Value::Object(err));
        }

        self.instantiate(doc)
    }

    /// Bring the instantiations of all rules up to date.
    fn instantiate(&self, doc: &mut Document) -> Faults {
        let root = doc.root();
        let props: Vec<NodeId> = doc
            .descendants_satisfying(root, |n| {
                doc.is_user(n) && doc.expr(n).map_or(false, |e| !e.is_comment())
            })
            .collect();
        let claims: Vec<NodeId> = props.iter().copied().filter(|p| !doc.node(*p).is_given()).collect();
        let props = Propositions::new(props, &claims);

        let rules: Vec<NodeId> = doc
            .descendants_satisfying(root, |n| {
                doc.node(n).is_formula() && doc.parent(n).map_or(false, |p| doc.is_user(p))
            })
            .collect();

        let mut faults = Faults::default();
        let mut inserted = 0;
        for id in rules {
            let synced = match Rule::new(doc, id, &self.opts) {
                Ok(rule) => {
                    let wanted = instantiate::search(doc, &rule, &props, &self.opts);
                    instantiate::sync(doc, &rule, wanted)
                }
                Err(e) => Err(Error::from(e)),
            };
            match synced {
                Ok(n) => inserted += n,
                Err(e) => {
                    error!("Failed to instantiate rule {}: {}", id, e);
                    instantiate::discard(doc, id);
                    faults.insert(id, e.to_string());
                }
            }
        }
        debug!("Inserted {} instantiations", inserted);
        faults
    }

    fn is_bih(&self, doc: &Document, id: NodeId) -> bool {
        let node = doc.node(id);
        self.opts.process_bihs && node.is_environment() && node.flag(BIH)
    }

    fn is_target(&self, doc: &Document, id: NodeId, faults: &Faults, requested: Option<NodeId>) -> bool {
        let node = doc.node(id);
        if node.is_formula() {
            let failed = node.verdict().map_or(false, |v| v.result == Outcome::Error);
            return faults.contains_key(&id) || failed;
        }
        if id == doc.root() || !doc.is_user(id) {
            return false;
        }
        // claims in hypothetical contexts, hints and declaration bodies are not validated
        let mut outer = doc.ancestors(id).skip(1);
        let hidden = |a: NodeId| matches!(doc.node(a).kind(), Kind::Declaration { .. }) || self.is_bih(doc, a);
        if outer.any(|a| doc.node(a).is_given() || hidden(a)) {
            return false;
        }
        match node.kind() {
            Kind::Expression(e) => {
                let wanted = self.opts.validate_all || node.flag(TARGET) || requested == Some(id);
                !node.is_given() && !e.is_comment() && wanted
            }
            Kind::Environment { .. } => self.is_bih(doc, id),
            Kind::Declaration { .. } => doc.get_attribute(id, SCOPE_ERRORS).is_some(),
            Kind::Comment(_) => false,
        }
    }

    fn targets(&self, doc: &Document, faults: &Faults, requested: Option<NodeId>) -> Vec<NodeId> {
        let root = doc.root();
        doc.descendants_satisfying(root, |n| self.is_target(doc, n, faults, requested))
            .collect()
    }

    fn judge(&self, doc: &mut Document, id: NodeId, faults: &Faults) -> Verdict {
        if let Some(fault) = faults.get(&id) {
            return Verdict::because(Outcome::Error, fault.clone());
        }
        match doc.node(id).kind() {
            Kind::Environment { .. } => self.judge_bih(doc, id),
            Kind::Declaration { .. } => Verdict::because(Outcome::Invalid, "redeclared"),
            Kind::Expression(e) => {
                let claim = e.clone();
                self.judge_claim(doc, id, &claim)
            }
            Kind::Comment(_) => Verdict::new(self.opts.bad_result),
        }
    }

    /// A hint is valid iff it is an instance of an accessible rule.
    fn judge_bih(&self, doc: &mut Document, id: NodeId) -> Verdict {
        let rules = doc.accessible_rules(id).into_iter();
        let rules = rules.filter_map(|r| Rule::new(doc, r, &self.opts).ok());
        let found = rules.into_iter().find(|rule| instantiate::match_instance(doc, rule, id).is_some());
        doc.unannotate(id, BAD_BIH);
        match found {
            Some(rule) => {
                debug!("Hint {} instantiates {}", id, rule.id);
                Verdict::because(Outcome::Valid, "BIH")
            }
            None => {
                doc.annotate(id, BAD_BIH, true.into());
                Verdict::because(Outcome::Invalid, "bad BIH")
            }
        }
    }

    fn judge_claim(&self, doc: &Document, id: NodeId, claim: &Expr) -> Verdict {
        let decide = |decided: bool, reason: &str| {
            let result = if decided { Outcome::Valid } else { Outcome::Invalid };
            Verdict::because(result, reason)
        };

        if doc.chains.values().any(|c| *c == id) {
            if let Some(result) = chain::aggregate(doc, id) {
                return Verdict::new(result);
            }
        }

        let mut tools = Attributes::new();
        match doc.get_attribute(id, BY).and_then(Value::as_str) {
            Some(tool @ "arithmetic") if self.opts.process_arithmetic => {
                if let Some(b) = Arithmetic.decide(claim) {
                    return decide(b, tool);
                }
                tools.insert(tool.into(), "inapplicable".into());
            }
            Some(tool @ "algebra") if self.opts.process_algebra => {
                if let Some(b) = self.cas.decide(claim) {
                    return decide(b, tool);
                }
                tools.insert(tool.into(), "inapplicable".into());
            }
            _ => (),
        }

        let premises = |restrict| Premises {
            doc,
            target: id,
            restrict,
            opts: &self.opts,
        };
        let preemies = self.opts.check_preemies;
        let fallback = if claim.is_contradiction() {
            Outcome::Invalid
        } else {
            self.opts.bad_result
        };
        let verdict = if premises(preemies).entail(claim) {
            Verdict::new(Outcome::Valid)
        } else if let Some(b) = self.opts.process_cas.then(|| self.cas.decide(claim)).flatten() {
            decide(b, "CAS")
        } else if preemies && premises(false).entail(claim) {
            Verdict::because(fallback, "preemie")
        } else {
            Verdict::new(fallback)
        };
        verdict.with_tools(tools)
    }
}

/// Premises accessible to a target.
struct Premises<'a> {
    doc: &'a Document,
    target: NodeId,
    /// exclude instantiations found only with propositions after the target
    restrict: bool,
    opts: &'a Options,
}

impl<'a> Premises<'a> {
    fn usable(&self, id: NodeId) -> bool {
        let node = self.doc.node(id);
        if node.is_formula() || node.is_comment() || node.flag(BAD_BIH) {
            return false;
        }
        if self.opts.process_bihs && node.is_environment() && node.flag(BIH) {
            return node.verdict().map_or(false, Verdict::is_valid);
        }
        match self.doc.provenance.get(&id).and_then(|inst| inst.anchor) {
            Some(anchor) if self.restrict => anchor == self.target || self.doc.is_earlier_than(anchor, self.target),
            _ => true,
        }
    }

    /// Propositional meaning of a node.
    ///
    /// An environment means the conjunction of its claims,
    /// each implied by the givens before it.
    fn meaning(&self, id: NodeId, atoms: &mut Atoms) -> Prop {
        let doc = self.doc;
        let node = doc.node(id);
        match node.kind() {
            Kind::Expression(e) => {
                let p = atoms.atom(e);
                match chain::endpoints(e).filter(|_| e.is_equation_chain()) {
                    Some(eq) => p.and(atoms.atom(&eq)),
                    None => p,
                }
            }
            Kind::Environment { .. } => {
                let children = node.children().iter().rev().filter(|c| self.usable(**c));
                children.fold(Prop::True, |acc, c| {
                    let p = self.meaning(*c, atoms);
                    if doc.node(*c).is_given() && !doc.provenance.contains_key(c) {
                        p.implies(acc)
                    } else {
                        p.and(acc)
                    }
                })
            }
            Kind::Declaration { .. } => match node.children().first() {
                Some(body) => self.meaning(*body, atoms),
                None => Prop::True,
            },
            Kind::Comment(_) => Prop::True,
        }
    }

    fn entail(&self, goal: &Expr) -> bool {
        let mut atoms = Atoms::default();
        let accessible = self.doc.accessibles(self.target).into_iter();
        let premises: Vec<Prop> = accessible
            .filter(|a| self.usable(*a))
            .map(|a| self.meaning(a, &mut atoms))
            .collect();
        let goal = atoms.atom(goal);
        prop::entails(atoms.len(), &premises, &goal)
    }
}

/// Move theorems after a directly following proof,
/// such that the proof cannot use the theorem.
fn swap_theorems(doc: &mut Document) -> usize {
    let root = doc.root();
    let theorems: Vec<NodeId> = doc
        .descendants_satisfying(root, |n| {
            doc.node(n).flag(THEOREM) && doc.parent(n).map_or(false, |p| doc.is_user(p))
        })
        .collect();

    let mut swapped = 0;
    for theorem in theorems {
        let parent = match doc.parent(theorem) {
            Some(parent) => parent,
            None => continue,
        };
        let authored: Vec<NodeId> = doc
            .children(parent)
            .iter()
            .copied()
            .filter(|c| !doc.provenance.contains_key(c) && doc.chain_of(*c).is_none())
            .collect();
        let proof = |i: usize| authored.get(i).copied().filter(|p| doc.node(*p).flag(PROOF));
        let i = match authored.iter().position(|c| *c == theorem) {
            Some(i) => i,
            None => continue,
        };
        // a theorem after a proof was already moved
        let moved = i.checked_sub(1).and_then(proof).is_some();
        let proof = match proof(i + 1) {
            Some(proof) if !moved => proof,
            _ => continue,
        };

        instantiate::discard(doc, theorem);
        if let Some(index) = doc.index_in_parent(theorem) {
            doc.remove_child(parent, index);
        }
        let index = doc.index_in_parent(proof).map_or(0, |i| i + 1);
        if let Err(e) = doc.insert_child(parent, index, theorem) {
            error!("Cannot move theorem {}: {}", theorem, e);
            continue;
        }
        debug!("Moved theorem {} after its proof {}", theorem, proof);
        swapped += 1;
    }
    swapped
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::rc::Rc;
    use core::cell::RefCell;
    use putdown_parse::{Form, Kind as FormKind};

    fn validate(src: &str, opts: Options) -> Document {
        let mut doc = Document::parse(src).unwrap();
        Validator::new(opts).validate(&mut doc);
        doc
    }

    /// The first user expression printed as the given string.
    fn find(doc: &Document, s: &str) -> NodeId {
        let printed = |n: NodeId| doc.expr(n).map(|e| e.to_string());
        let mut found = doc.descendants_satisfying(doc.root(), |n| doc.is_user(n) && printed(n).as_deref() == Some(s));
        found.next().unwrap()
    }

    fn result(doc: &Document, s: &str) -> Option<Outcome> {
        doc.verdict(find(doc, s)).map(|v| v.result)
    }

    #[test]
    fn conjunction() {
        let src = "{* :A :B (and A B) *} :P :Q (and P Q)";
        let doc = validate(src, Options::default());
        assert_eq!(result(&doc, "(and P Q)"), Some(Outcome::Valid));
        assert_eq!(result(&doc, "P"), None);
        assert_eq!(doc.provenance.len(), 1);

        let doc = validate("{* :A :B (and A B) *} :P (and P Q)", Options::default());
        assert_eq!(result(&doc, "(and P Q)"), Some(Outcome::Indeterminate));
    }

    #[test]
    fn modus_ponens() {
        let src = "[⇒ const] {* :A :(⇒ A B) B *} :(⇒ P Q) :(⇒ Q R) :P Q R S";
        let doc = validate(src, Options::default());
        assert_eq!(result(&doc, "Q"), Some(Outcome::Valid));
        assert_eq!(result(&doc, "R"), Some(Outcome::Valid));
        assert_eq!(result(&doc, "S"), Some(Outcome::Indeterminate));
    }

    #[test]
    fn scoping() {
        let src = "{ :P Q } Q { :P P }";
        let doc = validate(src, Options::default());
        assert_eq!(result(&doc, "Q"), Some(Outcome::Indeterminate));
        let env = doc.children(doc.root())[2];
        assert_eq!(doc.verdict(doc.children(env)[1]).map(|v| v.result), Some(Outcome::Valid));
    }

    const PREEMIE: &str = "{* :(∀ x , (@ P x)) (@ P t) *} :(∀ y , (> y 0)) :(⇒ (> 3 0) W) W (> 3 0)";

    #[test]
    fn preemie() {
        let doc = validate(PREEMIE, Options::default());
        let w = doc.verdict(find(&doc, "W")).unwrap();
        assert_eq!(w.result, Outcome::Indeterminate);
        assert_eq!(w.reason.as_deref(), Some("preemie"));
        assert_eq!(result(&doc, "(> 3 0)"), Some(Outcome::Valid));

        let opts = Options {
            check_preemies: false,
            ..Options::default()
        };
        let doc = validate(PREEMIE, opts);
        assert_eq!(result(&doc, "W"), Some(Outcome::Valid));
    }

    #[test]
    fn chains() {
        let doc = validate(":(= a b) :(= b c) (= a b c)", Options::default());
        assert_eq!(result(&doc, "(= a b c)"), Some(Outcome::Valid));

        let doc = validate(":(= a b) :(= c d) (= a b c d)", Options::default());
        let chain = find(&doc, "(= a b c d)");
        let links: Vec<_> = doc.children(doc.root())[2..5].iter().map(|l| doc.verdict(*l).unwrap().result).collect();
        assert_eq!(links, [Outcome::Valid, Outcome::Indeterminate, Outcome::Valid]);
        assert_eq!(doc.verdict(chain).unwrap().result, Outcome::Indeterminate);

        let opts = Options {
            process_equations: false,
            ..Options::default()
        };
        let doc = validate(":(= a b) :(= b c) (= a b c)", opts);
        assert_eq!(doc.children(doc.root()).len(), 3);
        assert_eq!(result(&doc, "(= a b c)"), Some(Outcome::Indeterminate));
    }

    #[test]
    fn hints() {
        let src = "[⇒ const] {* :A :(⇒ A B) B *} { :P :(⇒ P Q) Q } << { :P :(⇒ Q P) Q } <<";
        let doc = validate(src, Options::default());
        let hints: Vec<_> = doc.children(doc.root()).iter().copied().filter(|c| doc.node(*c).flag(BIH)).collect();
        let (good, bad) = (hints[0], hints[1]);
        let good_verdict = doc.verdict(good).unwrap();
        assert!(good_verdict.is_valid());
        assert_eq!(good_verdict.reason.as_deref(), Some("BIH"));
        assert_eq!(doc.verdict(bad).unwrap().reason.as_deref(), Some("bad BIH"));
        assert!(doc.node(bad).flag(BAD_BIH));
        assert!(!doc.node(good).flag(BAD_BIH));
        // claims inside hints are not targets
        assert_eq!(doc.verdict(doc.children(good)[2]), None);
    }

    #[test]
    fn redeclaration() {
        let doc = validate("[x var] [x y var] (P x)", Options::default());
        let decl = doc.children(doc.root())[1];
        assert_eq!(doc.verdict(decl).unwrap().reason.as_deref(), Some("redeclared"));
        let errors = doc.get_attribute(decl, SCOPE_ERRORS).unwrap();
        assert_eq!(errors, &serde_json::json!({"redeclared": ["x"]}));
    }

    #[test]
    fn arithmetic() {
        let by = "+{\"by\": \"arithmetic\"}";
        let src = alloc::format!("(= (+ 1 1) 2) {by} (< 3 (- 2)) {by} (= x 1) {by}", by = by);
        let doc = validate(&src, Options::default());
        let verdicts: Vec<_> = doc.children(doc.root()).iter().map(|c| doc.verdict(*c).unwrap()).collect();
        assert_eq!(verdicts[0].result, Outcome::Valid);
        assert_eq!(verdicts[1].result, Outcome::Invalid);
        assert_eq!(verdicts[2].result, Outcome::Indeterminate);
        assert_eq!(verdicts[2].tools["arithmetic"], "inapplicable");
    }

    struct Oracle;

    impl Cas for Oracle {
        fn decide(&self, _: &Expr) -> Option<bool> {
            Some(true)
        }
    }

    #[test]
    fn algebra() {
        let src = "(= (* x x) (^ x 2)) +{\"by\": \"algebra\"} (= (+ x 1) y)";
        let mut doc = Document::parse(src).unwrap();
        Validator::new(Options::default()).with_cas(Oracle).validate(&mut doc);
        assert_eq!(result(&doc, "(= (* x x) (^ x 2))"), Some(Outcome::Valid));
        assert_eq!(result(&doc, "(= (+ x 1) y)"), Some(Outcome::Indeterminate));

        let opts = Options {
            process_cas: true,
            ..Options::default()
        };
        Validator::new(opts).with_cas(Oracle).validate(&mut doc);
        assert_eq!(result(&doc, "(= (+ x 1) y)"), Some(Outcome::Valid));
    }

    #[test]
    fn contradiction() {
        let doc = validate("→← :→← Q", Options::default());
        let [absurd, q] = [0, 2].map(|i| doc.children(doc.root())[i]);
        assert_eq!(doc.verdict(absurd).unwrap().result, Outcome::Invalid);
        assert_eq!(doc.verdict(q).unwrap().result, Outcome::Valid);
    }

    #[test]
    fn fault() {
        let mut doc = Document::parse("{* :A {* B *} *} A").unwrap();
        let summary = Validator::new(Options::default()).validate(&mut doc);
        let rule = doc.children(doc.root())[0];
        assert_eq!(doc.verdict(rule).unwrap().result, Outcome::Error);
        assert_eq!(result(&doc, "A"), Some(Outcome::Indeterminate));
        assert_eq!((summary.targets, summary.errors), (2, 1));
    }

    #[test]
    fn theorems() {
        let src = "[A B const] {* :A B *} +{\"theorem\": true} { :A B } +{\"proof\": true}";
        let doc = validate(src, Options::default());
        let children = doc.children(doc.root());
        assert!(doc.node(children[1]).flag(PROOF));
        assert!(doc.node(children[2]).flag(THEOREM));
        assert_eq!(doc.provenance.len(), 1);
        // the proof cannot use the theorem
        let proof = doc.children(children[1]);
        assert_eq!(doc.verdict(proof[1]).unwrap().result, Outcome::Indeterminate);
    }

    #[test]
    fn incremental() {
        let mut doc = Document::parse("{* :A :B (and A B) *} :P :Q (and P Q)").unwrap();
        let mut validator = Validator::new(Options::default());
        let first = validator.validate(&mut doc);
        let inst = doc.children(doc.root())[1];

        // nothing changes when validating again
        assert_eq!(validator.validate(&mut doc), first);
        assert_eq!(doc.children(doc.root())[1], inst);

        let claim = find(&doc, "(and P Q)");
        let root = doc.root();
        let len = doc.children(root).len();
        doc.insert_form(root, len, Form::new(false, FormKind::Symbol("R")))
            .unwrap();
        assert!(doc.verdict(claim).is_some());
        let second = validator.validate(&mut doc);
        assert_eq!(doc.children(doc.root())[1], inst);
        assert_eq!((second.targets, second.valid, second.indeterminate), (2, 1, 1));
    }

    #[test]
    fn options_change() {
        let mut doc = Document::parse(PREEMIE).unwrap();
        Validator::new(Options::default()).validate(&mut doc);
        assert_eq!(result(&doc, "W"), Some(Outcome::Indeterminate));
        let opts = Options {
            check_preemies: false,
            ..Options::default()
        };
        Validator::new(opts).validate(&mut doc);
        assert_eq!(result(&doc, "W"), Some(Outcome::Valid));
    }

    #[test]
    fn progress() {
        let reports = Rc::new(RefCell::new(Vec::new()));
        let log = reports.clone();
        let opts = Options {
            update_freq: 2,
            ..Options::default()
        };
        let mut doc = Document::parse("A B C").unwrap();
        let summary = Validator::new(opts)
            .on_progress(move |done, total| log.borrow_mut().push((done, total)))
            .validate(&mut doc);
        assert_eq!(summary.indeterminate, 3);
        assert_eq!(*reports.borrow(), [(2, 3), (3, 3)]);
    }

    #[test]
    fn targets() {
        let src = "A B +{\"target\": true} { :C D } :{ E }";
        let opts = Options {
            validate_all: false,
            ..Options::default()
        };
        let doc = validate(src, opts);
        assert_eq!(result(&doc, "A"), None);
        assert_eq!(result(&doc, "B"), Some(Outcome::Indeterminate));
        let doc = validate(src, Options::default());
        assert_eq!(result(&doc, "D"), Some(Outcome::Indeterminate));
        assert_eq!(result(&doc, "E"), None);
    }

    #[test]
    fn requested_node() {
        let src = "{* :A :B (and A B) *} :P :Q (and P Q) (and Q P)";
        let opts = Options {
            validate_all: false,
            ..Options::default()
        };
        let mut doc = Document::parse(src).unwrap();
        let claim = find(&doc, "(and P Q)");
        let mut validator = Validator::new(opts);
        let verdict = validator.validate_node(&mut doc, claim);
        assert_eq!(verdict.map(|v| v.result), Some(Outcome::Valid));
        // other claims stay unvalidated
        assert_eq!(result(&doc, "(and Q P)"), None);
        let p = find(&doc, "P");
        assert_eq!(validator.validate_node(&mut doc, p), None);
    }

    #[test]
    fn bound_lookalike() {
        let doc = validate(":(∀ x , (P x)) (∀ y , (P #0)) (∀ y , (P y))", Options::default());
        assert_eq!(result(&doc, "(∀ y , (P #0))"), Some(Outcome::Indeterminate));
        assert_eq!(result(&doc, "(∀ y , (P y))"), Some(Outcome::Valid));
    }

    #[test]
    fn deterministic() {
        let src = "{* :A :B (and A B) *} :P :Q (and P Q) (= a b c) (and Q R) { :R (and P R) }";
        let verdicts = |doc: &Document| -> Vec<(Vec<usize>, Option<Verdict>)> {
            let nodes = doc.descendants(doc.root());
            nodes.map(|n| (doc.address(n), doc.verdict(n).cloned())).collect()
        };
        let parsed = Document::parse(src).unwrap();
        let mut cloned = parsed.clone();
        let mut doc = parsed;
        let mut validator = Validator::new(Options::default());
        validator.validate(&mut doc);
        let first = verdicts(&doc);
        assert!(first.iter().any(|(_, v)| v.is_some()));

        // revalidating after a reset yields the same verdicts
        doc.reset();
        validator.validate(&mut doc);
        assert_eq!(verdicts(&doc), first);

        Validator::new(Options::default()).validate(&mut cloned);
        assert_eq!(verdicts(&cloned), first);
        assert_eq!(doc.to_putdown(), cloned.to_putdown());
    }
}
