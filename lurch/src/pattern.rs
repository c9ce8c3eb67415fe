//! Rules and their patterns.

use crate::error::EngineError;
use crate::expr::{is_element_of, is_lambda, COMMENT, CONTRADICTION, EFA};
use crate::node::Kind;
use crate::{Document, Expr, NodeId, Options, Subst};
use alloc::collections::BTreeSet;
use alloc::string::String;
use alloc::vec::Vec;
use putdown_parse::Decl;

/// Attribute marking a formula as cases rule.
pub const CASES: &str = "cases";

/// Shape of a pattern, determining whether it is used to find instantiations.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Shape {
    /// any compound pattern not covered by the other shapes,
    /// even if it consists only of metavariables
    Anchored,
    /// a single metavariable, matching anything
    LoneMetavar,
    /// `(@ P ...)` with a metavariable `P`
    LoneEfa,
    /// `(∈ x A)` with a metavariable `A`
    LoneElementOf,
}

impl Shape {
    fn classify(e: &Expr, metavars: &BTreeSet<String>) -> Self {
        let is_metavar = |e: &Expr| e.get_symbol().map_or(false, |x| metavars.contains(x));
        if is_metavar(e) {
            return Self::LoneMetavar;
        }
        match e.get_apply() {
            Some((head, [f, ..])) if head.get_symbol() == Some(EFA) && is_metavar(f) => Self::LoneEfa,
            Some((head, [_, set])) if head.get_symbol().map_or(false, is_element_of) && is_metavar(set) => {
                Self::LoneElementOf
            }
            _ => Self::Anchored,
        }
    }

    /// Return true if patterns of this shape are not matched against propositions.
    pub fn is_avoided(self, opts: &Options) -> bool {
        match self {
            Self::Anchored => false,
            Self::LoneMetavar => opts.avoids_lone_metavars(),
            Self::LoneEfa => opts.avoids_lone_efas(),
            Self::LoneElementOf => opts.avoids_lone_element_ofs(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Pattern {
    pub expr: Expr,
    pub shape: Shape,
}

impl Pattern {
    /// Return true if the substitution fixes the metavariable
    /// that lets the pattern match arbitrary propositions.
    pub fn is_determined_by(&self, subst: &Subst) -> bool {
        let key = match self.shape {
            Shape::Anchored => return true,
            Shape::LoneMetavar => self.expr.get_symbol(),
            Shape::LoneEfa => self.expr.args_of(EFA).and_then(|a| a.first()).and_then(Expr::get_symbol),
            Shape::LoneElementOf => self.expr.get_apply().and_then(|(_, a)| a.get(1)).and_then(Expr::get_symbol),
        };
        key.map_or(false, |x| subst.contains_key(x))
    }
}

/// A formula together with its metavariables and patterns.
#[derive(Clone, Debug)]
pub struct Rule {
    pub id: NodeId,
    pub metavars: BTreeSet<String>,
    /// distinct expressions of the formula
    pub patterns: Vec<Pattern>,
    /// lone metavariable concluding a cases rule
    pub cases: Option<String>,
}

fn is_reserved(x: &str) -> bool {
    matches!(x, EFA | CONTRADICTION | COMMENT) || is_lambda(x)
}

/// Symbols declared constant by declarations accessible to the node.
pub fn constants(doc: &Document, id: NodeId) -> BTreeSet<String> {
    let decls = doc.accessibles(id).into_iter().filter_map(|a| match doc.node(a).kind() {
        Kind::Declaration {
            decl: Decl::Const,
            symbols,
        } => Some(symbols.iter().cloned()),
        _ => None,
    });
    decls.flatten().collect()
}

impl Rule {
    /// Analyse a formula.
    ///
    /// The metavariables of a formula are all its free symbols
    /// that are not declared constant before the formula.
    pub fn new(doc: &Document, id: NodeId, opts: &Options) -> Result<Self, EngineError> {
        let mut leaves: Vec<&Expr> = Vec::new();
        for n in doc.descendants(id).skip(1) {
            let node = doc.node(n);
            if node.is_formula() {
                return Err(EngineError::NestedFormula(n));
            }
            match node.expr() {
                Some(e) if !e.is_comment() => leaves.push(e),
                _ => (),
            }
        }

        let constants = constants(doc, id);
        let metavars: BTreeSet<String> = leaves
            .iter()
            .flat_map(|e| e.free_symbols())
            .filter(|x| !constants.contains(x) && !is_reserved(x))
            .collect();

        let mut patterns: Vec<Pattern> = Vec::new();
        for e in leaves {
            if !patterns.iter().any(|p| p.expr.alpha_eq(e)) {
                let shape = Shape::classify(e, &metavars);
                patterns.push(Pattern { expr: e.clone(), shape });
            }
        }

        let node = doc.node(id);
        let enabled = opts.process_cases && (node.flag(CASES) || opts.auto_cases);
        let conclusion = doc
            .children(id)
            .iter()
            .rev()
            .find(|c| !doc.node(**c).is_comment())
            .filter(|c| !doc.node(**c).is_given())
            .and_then(|c| doc.expr(*c))
            .and_then(|e| e.get_symbol())
            .filter(|x| metavars.contains(*x));
        let cases = conclusion.filter(|_| enabled).map(String::from);

        Ok(Self {
            id,
            metavars,
            patterns,
            cases,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(src: &str, opts: &Options) -> Rule {
        let doc = Document::parse(src).unwrap();
        let id = doc.descendants(doc.root()).find(|n| doc.node(*n).is_formula()).unwrap();
        Rule::new(&doc, id, opts).unwrap()
    }

    #[test]
    fn metavariables() {
        let r = rule("[and const] {* :A :B (and A B) *}", &Options::default());
        let mvs: Vec<_> = r.metavars.iter().map(|x| x.as_str()).collect();
        assert_eq!(mvs, ["A", "B"]);
        let shapes: Vec<_> = r.patterns.iter().map(|p| p.shape).collect();
        assert_eq!(shapes, [Shape::LoneMetavar, Shape::LoneMetavar, Shape::Anchored]);
        assert_eq!(r.cases, None);
    }

    #[test]
    fn shapes() {
        let r = rule("[∀ ∈ const] {* :(∀ x , (@ P x)) (@ P t) (∈ t S) *}", &Options::default());
        let shapes: Vec<_> = r.patterns.iter().map(|p| p.shape).collect();
        assert_eq!(shapes, [Shape::Anchored, Shape::LoneEfa, Shape::LoneElementOf]);
        assert!(!r.metavars.contains("x"));

        // without constants, an application is still anchored
        let r = rule("{* :A (f A) *}", &Options::default());
        assert!(r.metavars.contains("f"));
        let shapes: Vec<_> = r.patterns.iter().map(|p| p.shape).collect();
        assert_eq!(shapes, [Shape::LoneMetavar, Shape::Anchored]);
    }

    #[test]
    fn cases() {
        let src = "{* :(or A B) :{ :A C } :{ :B C } C *} +{\"cases\": true}";
        assert_eq!(rule(src, &Options::default()).cases.as_deref(), Some("C"));
        let opts = Options {
            process_cases: false,
            ..Options::default()
        };
        assert_eq!(rule(src, &opts).cases, None);
        let untagged = "{* :(or A B) :{ :A C } :{ :B C } C *}";
        let auto = Options {
            auto_cases: true,
            ..Options::default()
        };
        assert_eq!(rule(untagged, &Options::default()).cases, None);
        assert!(rule(untagged, &auto).cases.is_some());
    }

    #[test]
    fn nested_formula() {
        let doc = Document::parse("{* :A {* B *} *}").unwrap();
        let id = doc.children(doc.root())[0];
        let inner = doc.children(id)[1];
        let err = Rule::new(&doc, id, &Options::default()).unwrap_err();
        assert_eq!(err, EngineError::NestedFormula(inner));
    }
}
