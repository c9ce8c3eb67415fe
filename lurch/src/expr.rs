//! Expressions, i.e. the leaves of the document tree.

use crate::Stack;
use alloc::boxed::Box;
use alloc::collections::BTreeSet;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::convert::TryFrom;
use core::fmt::{self, Display};
use putdown_parse::{Form, Kind};

/// Symbol denoting a contradiction.
pub const CONTRADICTION: &str = "→←";
/// Head of an expression function application `(@ P x)`.
pub const EFA: &str = "@";
/// Head of the comment expression `(<<< "text")`.
pub const COMMENT: &str = "<<<";
/// Canonical head of lambda bindings.
pub const LAMBDA: &str = "𝜆";

/// Return true if the symbol may head a lambda binding.
pub fn is_lambda(s: &str) -> bool {
    matches!(s, "𝜆" | "λ" | "lambda")
}

/// Return true if the symbol denotes the element-of relation.
pub fn is_element_of(s: &str) -> bool {
    matches!(s, "∈" | "in")
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Expr {
    Symbol(String),
    Number(String),
    /// head followed by its arguments
    Apply(Vec<Expr>),
    /// binding of variables in a body, such as `(∀ x , (P x))`
    Bind(Box<Expr>, Vec<String>, Box<Expr>),
}

impl Expr {
    pub fn symbol(s: impl Into<String>) -> Self {
        Self::Symbol(s.into())
    }

    pub fn apply(head: Expr, args: impl IntoIterator<Item = Expr>) -> Self {
        Self::Apply(core::iter::once(head).chain(args).collect())
    }

    /// Construct a lambda abstraction.
    pub fn lambda(vars: Vec<String>, body: Expr) -> Self {
        Self::Bind(Box::new(Self::symbol(LAMBDA)), vars, Box::new(body))
    }

    pub fn get_symbol(&self) -> Option<&str> {
        match self {
            Self::Symbol(s) => Some(s),
            _ => None,
        }
    }

    /// Return the head and the arguments of an application.
    pub fn get_apply(&self) -> Option<(&Expr, &[Expr])> {
        match self {
            Self::Apply(items) => items.split_first(),
            _ => None,
        }
    }

    /// Return the arguments of an application headed by the given symbol.
    pub fn args_of(&self, head: &str) -> Option<&[Expr]> {
        self.get_apply()
            .filter(|(h, _)| h.get_symbol() == Some(head))
            .map(|(_, args)| args)
    }

    /// Return the variables and the body of a lambda abstraction.
    pub fn get_lambda(&self) -> Option<(&[String], &Expr)> {
        match self {
            Self::Bind(head, vars, body) if head.get_symbol().map_or(false, is_lambda) => {
                Some((vars, body))
            }
            _ => None,
        }
    }

    pub fn is_contradiction(&self) -> bool {
        self.get_symbol() == Some(CONTRADICTION)
    }

    /// Return true for `(<<< ...)`, which has no logical content.
    pub fn is_comment(&self) -> bool {
        self.args_of(COMMENT).is_some()
    }

    /// Return true for chains `(= a b c ...)` of at least two equations.
    pub fn is_equation_chain(&self) -> bool {
        self.args_of("=").map_or(false, |args| args.len() >= 3)
    }

    /// Number of nodes in the expression tree.
    pub fn size(&self) -> usize {
        match self {
            Self::Symbol(_) | Self::Number(_) => 1,
            Self::Apply(items) => 1 + items.iter().map(Self::size).sum::<usize>(),
            Self::Bind(head, _, body) => 1 + head.size() + body.size(),
        }
    }

    /// Symbols occurring freely in the expression.
    pub fn free_symbols(&self) -> BTreeSet<String> {
        let mut free = BTreeSet::new();
        self.free_symbols_in(&mut Stack::new(), &mut free);
        free
    }

    fn free_symbols_in<'a>(&'a self, bnd: &mut Stack<&'a str>, free: &mut BTreeSet<String>) {
        match self {
            Self::Symbol(s) => {
                if bnd.position(|b| *b == s.as_str()).is_none() {
                    free.insert(s.clone());
                }
            }
            Self::Number(_) => (),
            Self::Apply(items) => items.iter().for_each(|i| i.free_symbols_in(bnd, free)),
            Self::Bind(head, vars, body) => {
                head.free_symbols_in(bnd, free);
                bnd.with_pushed(vars.iter().map(|v| v.as_str()), |bnd| {
                    body.free_symbols_in(bnd, free)
                })
            }
        }
    }

    /// Return true if the symbol occurs freely in the expression.
    pub fn has_free(&self, x: &str) -> bool {
        match self {
            Self::Symbol(s) => s == x,
            Self::Number(_) => false,
            Self::Apply(items) => items.iter().any(|i| i.has_free(x)),
            Self::Bind(head, vars, body) => {
                head.has_free(x) || (!vars.iter().any(|v| v == x) && body.has_free(x))
            }
        }
    }

    /// A key that is equal for two expressions iff they are equal up to
    /// renaming of bound variables.
    ///
    /// Symbols and numbers are prefixed with their length,
    /// so that no symbol can be confused with a bound variable `#i`.
    pub fn canonical(&self) -> String {
        let mut out = String::new();
        self.canonical_in(&mut Stack::new(), &mut out);
        out
    }

    fn canonical_in<'a>(&'a self, bnd: &mut Stack<&'a str>, out: &mut String) {
        match self {
            Self::Symbol(s) => match bnd.position(|b| *b == s.as_str()) {
                Some(i) => out.push_str(&format!("#{}", i)),
                None => out.push_str(&format!("'{}:{}", s.len(), s)),
            },
            Self::Number(n) => out.push_str(&format!("n{}:{}", n.len(), n)),
            Self::Apply(items) => {
                out.push('(');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(' ')
                    }
                    item.canonical_in(bnd, out)
                }
                out.push(')')
            }
            Self::Bind(head, vars, body) => {
                out.push('(');
                head.canonical_in(bnd, out);
                out.push_str(&format!(" {} , ", vars.len()));
                bnd.with_pushed(vars.iter().rev().map(|v| v.as_str()), |bnd| {
                    body.canonical_in(bnd, out)
                });
                out.push(')')
            }
        }
    }

    /// Return true if both expressions are equal up to renaming of bound variables.
    pub fn alpha_eq(&self, other: &Self) -> bool {
        self == other || self.canonical() == other.canonical()
    }
}

impl<S: Into<String>> TryFrom<Kind<S>> for Expr {
    type Error = ();

    fn try_from(kind: Kind<S>) -> Result<Self, Self::Error> {
        match kind {
            Kind::Symbol(s) => Ok(Self::Symbol(s.into())),
            Kind::Number(n) => Ok(Self::Number(n.into())),
            Kind::Application(items) => {
                let items = items.into_iter().map(|i| Self::try_from(i.kind));
                Ok(Self::Apply(items.collect::<Result<_, _>>()?))
            }
            Kind::Binding(head, vars, body) => Ok(Self::Bind(
                Box::new(Self::try_from(head.kind)?),
                vars.into_iter().map(Into::into).collect(),
                Box::new(Self::try_from(body.kind)?),
            )),
            Kind::Environment(..) | Kind::Declaration(..) | Kind::Comment(_) => Err(()),
        }
    }
}

impl From<Expr> for Kind<String> {
    fn from(e: Expr) -> Self {
        let form = |e: Expr| Form::new(false, Self::from(e));
        match e {
            Expr::Symbol(s) => Self::Symbol(s),
            Expr::Number(n) => Self::Number(n),
            Expr::Apply(items) => Self::Application(items.into_iter().map(form).collect()),
            Expr::Bind(head, vars, body) => {
                Self::Binding(Box::new(form(*head)), vars, Box::new(form(*body)))
            }
        }
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Symbol(s) | Self::Number(s) => s.fmt(f),
            Self::Apply(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    item.fmt(f)?;
                }
                write!(f, ")")
            }
            Self::Bind(head, vars, body) => {
                write!(f, "({}", head)?;
                vars.iter().try_for_each(|v| write!(f, " {}", v))?;
                write!(f, " , {})", body)
            }
        }
    }
}

#[cfg(test)]
pub(crate) fn parse_expr(s: &str) -> Expr {
    let forms = putdown_parse::parse(s).unwrap();
    Expr::try_from(forms.into_iter().next().unwrap().kind).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn alpha() {
        let e1 = parse_expr("(∀ x , (P x y))");
        let e2 = parse_expr("(∀ z , (P z y))");
        let e3 = parse_expr("(∀ y , (P y y))");
        assert!(e1.alpha_eq(&e2));
        assert!(!e1.alpha_eq(&e3));
        assert_eq!(e1.canonical(), "('3:∀ 1 , ('1:P #0 '1:y))");

        // free symbols never look like bound variables
        let e4 = parse_expr("(∀ y , (P #0))");
        assert!(!e1.alpha_eq(&e4));
        assert!(!parse_expr("(∀ x , (P x))").alpha_eq(&e4));
    }

    #[test]
    fn free() {
        let e = parse_expr("(and (∀ x , (P x y)) x)");
        let free: Vec<_> = e.free_symbols().into_iter().collect();
        assert_eq!(free, ["P", "and", "x", "y", "∀"]);
        assert!(e.has_free("x"));
        assert!(!parse_expr("(∀ x , (P x))").has_free("x"));
    }

    #[test]
    fn shapes() {
        assert!(parse_expr("(= a b c)").is_equation_chain());
        assert!(!parse_expr("(= a b)").is_equation_chain());
        assert!(parse_expr("(<<< \"note\")").is_comment());
        assert!(parse_expr("→←").is_contradiction());
        assert!(parse_expr("(λ x , (f x))").get_lambda().is_some());
        assert_eq!(parse_expr("(f (g 1) x)").to_string(), "(f (g 1) x)");
    }
}
