#![no_std]
#![forbid(unsafe_code)]

//! Validation of Lurch documents.
//!
//! This is the library underlying the `lurchcheck` validator.
//!
//! # Usage
//!
//! A Lurch document is a tree of expressions, environments, and declarations,
//! written in putdown notation.
//! Some environments, written `{* ... *}`, are *formulas*:
//! templates of inference rules whose free symbols are metavariables,
//! unless they are declared to be constants.
//! Every node is either *given* (written with a leading `:`) or *claimed*.
//!
//! How is a document validated?
//! A [`Validator`] first instantiates the formulas of the document
//! by matching their patterns against the propositions of the user.
//! Every instantiation is inserted into the document right after its formula.
//! Then, every claim receives a [`Verdict`]:
//! the claim is valid if it follows propositionally from
//! the givens, claims, and instantiations that precede it.
//!
//! The following example validates a claim by conjunction introduction:
//!
//! ~~~
//! # use lurch::{Document, Options, Outcome, Validator};
//! let src = r"
//!     [and const]
//!     {* :A :B (and A B) *}
//!     :P :Q (and P Q)
//! ";
//! let mut doc = Document::parse(src)?;
//! let claim = *doc.children(doc.root()).last().unwrap();
//!
//! let mut validator = Validator::new(Options::default());
//! let summary = validator.validate(&mut doc);
//! assert_eq!(summary.instantiations, 1);
//! assert_eq!(doc.verdict(claim).unwrap().result, Outcome::Valid);
//!
//! // verdicts are also published as node attributes
//! let attribute = doc.get_attribute(claim, lurch::node::VALIDATION_RESULT);
//! assert_eq!(attribute.unwrap()["result"], "valid");
//! # Ok::<_, lurch::Error>(())
//! ~~~
//!
//! # Organisation
//!
//! * [`Document`] stores the tree of nodes in an arena,
//!   together with side tables for instantiations and chains of equations.
//! * The [`expr`], [`subst`], and [`matching`] modules handle
//!   expressions with binders, substitution, and higher-order pattern matching.
//! * The [`pattern`] and [`instantiate`] modules analyse formulas and
//!   find their instantiations.
//! * The [`validate`] module judges claims, using the decision procedure
//!   for propositional logic in [`prop`] and the algebra tools in [`cas`].
//! * The [`database`] module gives access to a corpus of named documents.

extern crate alloc;
#[macro_use]
extern crate log;

pub mod cas;
pub mod chain;
pub mod database;
pub mod document;
pub mod error;
pub mod expect;
pub mod expr;
pub mod instantiate;
pub mod matching;
pub mod node;
mod options;
pub mod pattern;
pub mod prop;
pub mod scope;
mod stack;
pub mod subst;
pub mod validate;

pub use document::Document;
pub use error::{EngineError, Error};
pub use expr::Expr;
pub use node::{NodeId, Outcome, Verdict};
pub use options::Options;
pub use stack::Stack;
pub use subst::Subst;
pub use validate::{Summary, Validator};

pub use putdown_parse as putdown;
