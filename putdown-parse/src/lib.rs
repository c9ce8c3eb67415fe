//! Parser for the putdown notation of Lurch documents.
//!
//! A putdown source is a sequence of forms:
//! expressions such as `(+ 1 2)` and bindings such as `(∀ x , (P x))`,
//! environments `{ ... }` and formulas (rule templates) `{* ... *}`,
//! and declarations such as `[x y var]` or `[and or const]`.
//! Any form may be preceded by `:` to mark it as given and
//! followed by JSON attributes `+{ "key": value }`.
//!
//! Example usage:
//!
//! ~~~
//! use putdown_parse::{parse, Error, Kind};
//!
//! let forms = parse("{* :A :B (and A B) *} :P :Q (and P Q)")?;
//! assert_eq!(forms.len(), 4);
//! assert!(matches!(forms[0].kind, Kind::Environment(true, _)));
//! assert!(forms[1].given);
//!
//! // environments must not occur inside expressions
//! assert!(parse("(+ 1 2 { :A B })").is_err());
//! # Ok::<_, Error>(())
//! ~~~
#![no_std]

extern crate alloc;

pub mod form;
pub mod lex;
pub mod parse;

pub use form::{Attributes, Decl, Form, Kind};
pub use lex::Token;
pub use parse::{Error, ErrorKind, Parser};

use alloc::vec::Vec;
use logos::Logos;

pub fn lex(s: &str) -> impl Iterator<Item = Token<'_>> {
    Token::lexer(s)
}

/// Parse all forms of a putdown source, failing on the first syntax error.
pub fn parse(s: &str) -> Result<Vec<Form<&str>>, Error> {
    Parser::new(s).collect()
}
