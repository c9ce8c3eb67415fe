//! Parse trees of putdown notation.

use alloc::{boxed::Box, string::String, vec::Vec};
use core::fmt::{self, Display};

/// JSON attributes attached to a form with `+{ ... }`.
pub type Attributes = serde_json::Map<String, serde_json::Value>;

/// Kind of a declaration.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Decl {
    /// `[x y var]`
    Var,
    /// `[a b const]`
    Const,
}

/// A putdown form together with its given flag and attributes.
#[derive(Clone, Debug, PartialEq)]
pub struct Form<S> {
    /// true if the form was preceded by `:`
    pub given: bool,
    pub kind: Kind<S>,
    pub attributes: Attributes,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Kind<S> {
    Symbol(S),
    Number(S),
    /// Prefix application (`(f a1 ... an)`), the head being the first element
    Application(Vec<Form<S>>),
    /// Binding (`(head x1 ... xk , body)`)
    Binding(Box<Form<S>>, Vec<S>, Box<Form<S>>),
    /// Environment (`{ ... }`), being a formula (`{* ... *}`) if the flag is set
    Environment(bool, Vec<Form<S>>),
    /// Declaration of symbols, possibly with a body (`[x y var (P x y)]`)
    Declaration(Decl, Vec<S>, Option<Box<Form<S>>>),
    /// Line comment (`// ...`), without the leading slashes
    Comment(S),
}

impl<S> Form<S> {
    pub fn new(given: bool, kind: Kind<S>) -> Self {
        Self {
            given,
            kind,
            attributes: Attributes::new(),
        }
    }

    pub fn is_comment(&self) -> bool {
        matches!(self.kind, Kind::Comment(_))
    }

    /// Return true if the form may appear inside an expression.
    pub fn is_expression(&self) -> bool {
        matches!(
            self.kind,
            Kind::Symbol(_) | Kind::Number(_) | Kind::Application(_) | Kind::Binding(..)
        )
    }

    pub fn map<T>(self, f: &impl Fn(S) -> T) -> Form<T> {
        let kind = match self.kind {
            Kind::Symbol(s) => Kind::Symbol(f(s)),
            Kind::Number(n) => Kind::Number(f(n)),
            Kind::Application(args) => Kind::Application(args.into_iter().map(|a| a.map(f)).collect()),
            Kind::Binding(head, vars, body) => Kind::Binding(
                Box::new(head.map(f)),
                vars.into_iter().map(f).collect(),
                Box::new(body.map(f)),
            ),
            Kind::Environment(formula, items) => {
                Kind::Environment(formula, items.into_iter().map(|i| i.map(f)).collect())
            }
            Kind::Declaration(decl, syms, body) => Kind::Declaration(
                decl,
                syms.into_iter().map(f).collect(),
                body.map(|b| Box::new(b.map(f))),
            ),
            Kind::Comment(c) => Kind::Comment(f(c)),
        };
        Form {
            given: self.given,
            kind,
            attributes: self.attributes,
        }
    }
}

fn spaced<T: Display>(items: &[T], f: &mut fmt::Formatter) -> fmt::Result {
    items.iter().try_for_each(|i| write!(f, " {}", i))
}

impl<S: Display> Display for Kind<S> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Symbol(s) | Self::Number(s) => s.fmt(f),
            Self::Application(args) => match args.split_first() {
                Some((head, tail)) => {
                    write!(f, "({}", head)?;
                    spaced(tail, f)?;
                    write!(f, ")")
                }
                None => write!(f, "()"),
            },
            Self::Binding(head, vars, body) => {
                write!(f, "({}", head)?;
                spaced(vars, f)?;
                write!(f, " , {})", body)
            }
            Self::Environment(formula, items) => {
                write!(f, "{}", if *formula { "{*" } else { "{" })?;
                spaced(items, f)?;
                write!(f, " {}", if *formula { "*}" } else { "}" })
            }
            Self::Declaration(decl, syms, body) => {
                write!(f, "[")?;
                syms.iter().try_for_each(|s| write!(f, "{} ", s))?;
                match decl {
                    Decl::Var => write!(f, "var")?,
                    Decl::Const => write!(f, "const")?,
                }
                if let Some(body) = body {
                    write!(f, " {}", body)?;
                }
                write!(f, "]")
            }
            Self::Comment(c) => writeln!(f, "//{}", c),
        }
    }
}

impl<S: Display> Display for Form<S> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.given {
            write!(f, ":")?;
        }
        self.kind.fmt(f)?;
        if !self.attributes.is_empty() {
            let json = serde_json::to_string(&self.attributes).map_err(|_| fmt::Error)?;
            write!(f, " +{}", json)?;
        }
        Ok(())
    }
}
