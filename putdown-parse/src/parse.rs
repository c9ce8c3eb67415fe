//! Deterministic single-pass parsing of putdown forms.

use crate::form::{Attributes, Decl, Form, Kind};
use crate::Token;
use alloc::{boxed::Box, string::String, string::ToString, vec::Vec};
use core::fmt::{self, Display};
use core::iter::Peekable;
use logos::{Logos, SpannedIter};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    EnvironmentInExpression,
    DeclarationInExpression,
    NestedDeclaration,
    GivenInExpression,
    UnexpectedClose,
    Unclosed,
    MisplacedComma,
    BindingWithoutVariables,
    BoundNonSymbol,
    BindingBody,
    EmptyApplication,
    EmptyDeclaration,
    DeclarationBody,
    DanglingGiven,
    DanglingSuffix,
    BadAttributes(String),
    UnknownToken,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::EnvironmentInExpression => write!(f, "environment inside an expression"),
            Self::DeclarationInExpression => write!(f, "declaration inside an expression"),
            Self::NestedDeclaration => write!(f, "declaration inside a declaration"),
            Self::GivenInExpression => write!(f, "given marker inside an expression"),
            Self::UnexpectedClose => write!(f, "unexpected closing delimiter"),
            Self::Unclosed => write!(f, "unclosed delimiter at end of input"),
            Self::MisplacedComma => write!(f, "comma outside of a binding"),
            Self::BindingWithoutVariables => write!(f, "binding without bound variables"),
            Self::BoundNonSymbol => write!(f, "bound variable is not a symbol"),
            Self::BindingBody => write!(f, "binding must have exactly one body"),
            Self::EmptyApplication => write!(f, "empty application"),
            Self::EmptyDeclaration => write!(f, "declaration without symbols"),
            Self::DeclarationBody => write!(f, "declaration must have at most one body after var/const"),
            Self::DanglingGiven => write!(f, "given marker not followed by a form"),
            Self::DanglingSuffix => write!(f, "suffix not following a suitable form"),
            Self::BadAttributes(e) => write!(f, "invalid attribute JSON: {}", e),
            Self::UnknownToken => write!(f, "unknown token"),
        }
    }
}

/// Syntax error with the position where it was detected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Error {
    pub kind: ErrorKind,
    /// byte offset
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl Error {
    fn new(kind: ErrorKind, src: &str, offset: usize) -> Self {
        let before = &src[..offset.min(src.len())];
        let line = before.matches('\n').count() + 1;
        let column = before.rsplit('\n').next().map_or(0, |l| l.chars().count()) + 1;
        Self {
            kind,
            offset,
            line,
            column,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "line {}, column {}: {}", self.line, self.column, self.kind)
    }
}

type Result<T> = core::result::Result<T, ErrorKind>;

/// An opened, not yet closed form.
#[derive(Debug)]
enum Frame<'s> {
    /// `(`, followed by the position of the comma if there was one
    App {
        given: bool,
        items: Vec<Form<&'s str>>,
        comma: Option<usize>,
    },
    /// `{` or `{*`
    Env {
        given: bool,
        formula: bool,
        items: Vec<Form<&'s str>>,
    },
    /// `[`
    Decl {
        given: bool,
        symbols: Vec<&'s str>,
        decl: Option<Decl>,
        body: Option<Form<&'s str>>,
    },
}

impl<'s> Frame<'s> {
    fn is_expression(&self) -> bool {
        matches!(self, Self::App { .. } | Self::Decl { .. })
    }

    fn push(&mut self, form: Form<&'s str>) -> Result<()> {
        match self {
            Self::App { items, .. } | Self::Env { items, .. } => items.push(form),
            Self::Decl {
                symbols,
                decl,
                body,
                ..
            } => {
                if decl.is_some() {
                    if body.is_some() {
                        return Err(ErrorKind::DeclarationBody);
                    }
                    *body = Some(form);
                    return Ok(());
                }
                match form.kind {
                    Kind::Symbol(s) if form.attributes.is_empty() => match s {
                        "var" => *decl = Some(Decl::Var),
                        "const" => *decl = Some(Decl::Const),
                        _ => symbols.push(s),
                    },
                    _ => return Err(ErrorKind::DeclarationBody),
                }
            }
        }
        Ok(())
    }
}

fn application<S>(mut items: Vec<Form<S>>, comma: Option<usize>) -> Result<Kind<S>> {
    let pos = match comma {
        None if items.is_empty() => return Err(ErrorKind::EmptyApplication),
        None => return Ok(Kind::Application(items)),
        Some(pos) => pos,
    };
    if items.len() != pos + 1 {
        return Err(ErrorKind::BindingBody);
    }
    let body = items.pop().ok_or(ErrorKind::BindingBody)?;
    let mut iter = items.into_iter();
    let head = iter.next().ok_or(ErrorKind::MisplacedComma)?;
    let vars = iter.map(|f| match f.kind {
        Kind::Symbol(s) if !f.given && f.attributes.is_empty() => Ok(s),
        _ => Err(ErrorKind::BoundNonSymbol),
    });
    let vars: Vec<_> = vars.collect::<Result<_>>()?;
    if vars.is_empty() {
        return Err(ErrorKind::BindingWithoutVariables);
    }
    Ok(Kind::Binding(Box::new(head), vars, Box::new(body)))
}

fn attributes(s: &str) -> Result<Attributes> {
    // strip the leading `+`
    serde_json::from_str(&s[1..]).map_err(|e| ErrorKind::BadAttributes(e.to_string()))
}

/// Iterator over the top-level forms of a putdown source.
///
/// Iteration stops after the first error.
pub struct Parser<'s> {
    src: &'s str,
    tokens: Peekable<SpannedIter<'s, Token<'s>>>,
    stack: Vec<Frame<'s>>,
    given: bool,
    done: bool,
}

impl<'s> Parser<'s> {
    pub fn new(src: &'s str) -> Self {
        Self {
            src,
            tokens: Token::lexer(src).spanned().peekable(),
            stack: Vec::new(),
            given: false,
            done: false,
        }
    }

    fn take_given(&mut self) -> bool {
        core::mem::take(&mut self.given)
    }

    fn no_given(&self) -> Result<()> {
        if self.given {
            Err(ErrorKind::DanglingGiven)
        } else {
            Ok(())
        }
    }

    fn atom(&mut self, kind: Kind<&'s str>) -> Form<&'s str> {
        Form::new(self.take_given(), kind)
    }

    /// Process a token, returning a form if it completes one.
    fn token(&mut self, token: Token<'s>) -> Result<Option<Form<&'s str>>> {
        let in_expression = self.stack.last().map_or(false, Frame::is_expression);
        match token {
            Token::Colon if self.given => Err(ErrorKind::DanglingGiven),
            Token::Colon if in_expression => Err(ErrorKind::GivenInExpression),
            Token::Colon => {
                self.given = true;
                Ok(None)
            }
            Token::Symbol(s) => Ok(Some(self.atom(Kind::Symbol(s)))),
            Token::Number(n) => Ok(Some(self.atom(Kind::Number(n)))),
            Token::LPar => {
                let given = self.take_given();
                let (items, comma) = (Vec::new(), None);
                self.stack.push(Frame::App { given, items, comma });
                Ok(None)
            }
            Token::LBrace | Token::LFormula => {
                if let Some(Frame::App { .. }) = self.stack.last() {
                    return Err(ErrorKind::EnvironmentInExpression);
                }
                let given = self.take_given();
                let formula = token == Token::LFormula;
                let items = Vec::new();
                self.stack.push(Frame::Env { given, formula, items });
                Ok(None)
            }
            Token::LBrk => match self.stack.last() {
                Some(Frame::App { .. }) => Err(ErrorKind::DeclarationInExpression),
                _ if self.stack.iter().any(|f| matches!(f, Frame::Decl { .. })) => {
                    Err(ErrorKind::NestedDeclaration)
                }
                _ => {
                    let given = self.take_given();
                    self.stack.push(Frame::Decl {
                        given,
                        symbols: Vec::new(),
                        decl: None,
                        body: None,
                    });
                    Ok(None)
                }
            },
            Token::RPar => {
                self.no_given()?;
                match self.stack.pop() {
                    Some(Frame::App { given, items, comma }) => {
                        Ok(Some(Form::new(given, application(items, comma)?)))
                    }
                    _ => Err(ErrorKind::UnexpectedClose),
                }
            }
            Token::RBrace | Token::RFormula => {
                self.no_given()?;
                let closes_formula = token == Token::RFormula;
                match self.stack.pop() {
                    Some(Frame::Env { given, formula, items }) if formula == closes_formula => {
                        Ok(Some(Form::new(given, Kind::Environment(formula, items))))
                    }
                    _ => Err(ErrorKind::UnexpectedClose),
                }
            }
            Token::RBrk => {
                self.no_given()?;
                match self.stack.pop() {
                    Some(Frame::Decl { symbols, .. }) if symbols.is_empty() => {
                        Err(ErrorKind::EmptyDeclaration)
                    }
                    Some(Frame::Decl {
                        given,
                        symbols,
                        decl,
                        body,
                    }) => {
                        let decl = decl.unwrap_or(Decl::Var);
                        let kind = Kind::Declaration(decl, symbols, body.map(Box::new));
                        Ok(Some(Form::new(given, kind)))
                    }
                    _ => Err(ErrorKind::UnexpectedClose),
                }
            }
            Token::Comma => {
                self.no_given()?;
                match self.stack.last_mut() {
                    Some(Frame::App {
                        items,
                        comma: comma @ None,
                        ..
                    }) if !items.is_empty() => {
                        *comma = Some(items.len());
                        Ok(None)
                    }
                    _ => Err(ErrorKind::MisplacedComma),
                }
            }
            // comments inside expressions are dropped
            Token::Comment(_) if in_expression => Ok(None),
            Token::Comment(c) => Ok(Some(Form::new(false, Kind::Comment(c)))),
            Token::Attributes(_) | Token::Bih | Token::Check | Token::Cross => {
                Err(ErrorKind::DanglingSuffix)
            }
            Token::Error => Err(ErrorKind::UnknownToken),
        }
    }

    /// Attach all suffixes following a just completed form to it.
    fn suffixes(&mut self, form: &mut Form<&'s str>) -> core::result::Result<(), Error> {
        use serde_json::Value;
        while let Some((token, span)) = self.tokens.peek() {
            let offset = span.start;
            let result = match token {
                Token::Attributes(s) => attributes(s).map(|attrs| form.attributes.extend(attrs)),
                Token::Bih if matches!(form.kind, Kind::Environment(false, _)) => {
                    form.attributes.insert("BIH".into(), Value::Bool(true));
                    Ok(())
                }
                Token::Check | Token::Cross if !form.is_comment() => {
                    let expected = if *token == Token::Check { "valid" } else { "invalid" };
                    form.attributes.insert("ExpectedResult".into(), expected.into());
                    Ok(())
                }
                Token::Bih | Token::Check | Token::Cross => Err(ErrorKind::DanglingSuffix),
                _ => return Ok(()),
            };
            result.map_err(|kind| Error::new(kind, self.src, offset))?;
            self.tokens.next();
        }
        Ok(())
    }

    /// Parse the next top-level form.
    fn form(&mut self) -> core::result::Result<Option<Form<&'s str>>, Error> {
        while let Some((token, span)) = self.tokens.next() {
            let start = span.start;
            let completed = self.token(token);
            let mut form = match completed {
                Ok(Some(form)) => form,
                Ok(None) => continue,
                Err(kind) => return Err(Error::new(kind, self.src, start)),
            };
            self.suffixes(&mut form)?;
            match self.stack.last_mut() {
                None => return Ok(Some(form)),
                Some(frame) => {
                    if let Err(kind) = frame.push(form) {
                        return Err(Error::new(kind, self.src, start));
                    }
                }
            }
        }
        let end = self.src.len();
        if !self.stack.is_empty() {
            return Err(Error::new(ErrorKind::Unclosed, self.src, end));
        }
        self.no_given().map_err(|kind| Error::new(kind, self.src, end))?;
        Ok(None)
    }
}

impl<'s> Iterator for Parser<'s> {
    type Item = core::result::Result<Form<&'s str>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let result = self.form().transpose();
        if !matches!(result, Some(Ok(_))) {
            self.done = true;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    fn err(s: &str) -> ErrorKind {
        match parse(s) {
            Err(e) => e.kind,
            Ok(forms) => panic!("expected error, got {} forms", forms.len()),
        }
    }

    #[test]
    fn positive() -> core::result::Result<(), Error> {
        assert_eq!(parse("(+ 1 2) (- k t (* u v))")?.len(), 2);
        assert_eq!(parse("(polynomial (variable x) (coefficients 9 0 -6 2 1))")?.len(), 1);
        assert_eq!(parse("(forall x , (exists y , (> x y)))")?.len(), 1);
        assert_eq!(parse("[x y z var] [A B C const] [x y z var (P x y z)]")?.len(), 3);
        assert_eq!(parse("[A B C const { (Q A) (R B) (S T) }]")?.len(), 1);
        assert_eq!(parse("{* :A :B (and A B) *}")?.len(), 1);
        assert_eq!(parse("{:[ z ] (< 1 z) ✔︎ (∀ x , (< 1 x)) ✗ }")?.len(), 1);
        Ok(())
    }

    #[test]
    fn nested() -> core::result::Result<(), Error> {
        let src = "{\n  // Let x be arbitrary.\n  :[x var]\n  :(in x R)\n  (in x C) +{\"reason\":\"Theorem 21\"}\n}\n";
        let forms = parse(src)?;
        assert_eq!(forms.len(), 1);
        let items = match &forms[0].kind {
            Kind::Environment(false, items) => items,
            _ => panic!("environment expected"),
        };
        assert_eq!(items.len(), 4);
        assert!(items[0].is_comment());
        assert!(items[1].given && items[2].given && !items[3].given);
        assert_eq!(items[3].attributes["reason"], "Theorem 21");
        Ok(())
    }

    #[test]
    fn suffixes() -> core::result::Result<(), Error> {
        let forms = parse("{ :(= a b) (= b a) } << (P x) ✔︎ (Q x) ✗")?;
        assert_eq!(forms[0].attributes["BIH"], true);
        assert_eq!(forms[1].attributes["ExpectedResult"], "valid");
        assert_eq!(forms[2].attributes["ExpectedResult"], "invalid");
        Ok(())
    }

    #[test]
    fn negative() {
        use ErrorKind::*;
        assert_eq!(err("(+ 1 2 { :A B })"), EnvironmentInExpression);
        assert_eq!(err("[x y z var [A B C const]]"), NestedDeclaration);
        assert_eq!(err("[x y z var] // valid\n[x y z var [A B C const]] // invalid"), NestedDeclaration);
        assert_eq!(err("[x var { [y var] }]"), NestedDeclaration);
        assert_eq!(err("[x var { :A { [y var] } }]"), NestedDeclaration);
        assert_eq!(err("(f [x var])"), DeclarationInExpression);
        assert_eq!(err("(f :x)"), GivenInExpression);
        assert_eq!(err("(f x))"), UnexpectedClose);
        assert_eq!(err("{ (f x) "), Unclosed);
        assert_eq!(err("{ (f x) *}"), UnexpectedClose);
        assert_eq!(err("(f , x)"), BindingWithoutVariables);
        assert_eq!(err("(f (g x) , x)"), BoundNonSymbol);
        assert_eq!(err("(f x , y z)"), BindingBody);
        assert_eq!(err("f , x"), MisplacedComma);
        assert_eq!(err("()"), EmptyApplication);
        assert_eq!(err("[var]"), EmptyDeclaration);
        assert_eq!(err("[x var (P x) (Q x)]"), DeclarationBody);
        assert_eq!(err(":"), DanglingGiven);
        assert_eq!(err("+{\"a\": 1}"), DanglingSuffix);
        assert_eq!(err("(P x) <<"), DanglingSuffix);
        assert!(matches!(err("x +{\"a\": }"), BadAttributes(_)));
    }

    #[test]
    fn position() {
        let e = parse("(f x)\n(+ 1 2 { :A B })").unwrap_err();
        assert_eq!((e.line, e.column, e.offset), (2, 8, 13));
        assert_eq!(e.to_string(), "line 2, column 8: environment inside an expression");
    }

    #[test]
    fn roundtrip() -> core::result::Result<(), Error> {
        let src = "(+ 1 2) :{ :[x var] (∀ y , (P x y)) +{\"k\":[1,2]} // c\n } {* :A B *} [a b const { (Q a) }]";
        let forms = parse(src)?;
        let printed: Vec<_> = forms.iter().map(|f| f.to_string()).collect();
        let joined = printed.join(" ");
        let reparsed = parse(&joined)?;
        assert_eq!(forms, reparsed);
        Ok(())
    }
}
