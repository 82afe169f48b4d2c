//! The EBNF front end and semantic analyzer.
//!
//! [`EbnfParser`](parser::EbnfParser) turns the textual grammar into an
//! [`EbnfAST`](ast::EbnfAST); [`EbnfGrammar`](grammar::EbnfGrammar) turns the
//! AST into an indexed, fully analyzed grammar ready for the emitter back
//! ends.

use std::{error::Error, fmt};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::Span;

pub mod ast;
mod attributes;
pub mod grammar;
mod lattice;
pub mod parser;

pub use grammar::EbnfGrammar;

/// The lexical class of an expression on the right-hand side of a production.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ExprKind {
    /// An all-caps identifier naming a token of the target language.
    Keyword,
    /// An identifier naming another production.
    NonTerminal,
    /// An all-caps identifier naming a value-carrying lexical class
    /// (`CHARSTRING`, `INTSTRING`, `REALSTRING`).
    Terminal,
    /// A single-quoted one-character literal.
    OneChar,
    /// A single-quoted two-character literal whose characters are an
    /// upper/lower case pair of the same letter.
    TwoChar,
    /// Any other single-quoted literal.
    TerminalString,
    /// The comma alias `c`. All occurrences share one expression.
    Comma,
}

/// Whether a production encodes a left-recursive list of elements, and if so
/// whether the elements are comma separated.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ListKind {
    None,
    Plain,
    CommaSeparated,
}

/// The role a production plays in an optional (`p = c | '$' ;`) pairing, if
/// any.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum OptionalRole {
    None,
    /// An optional parent whose child is an instance or the supertype of an
    /// instance.
    ParentOfInstanceOrSupertype,
    /// An optional parent whose child is neither an instance nor the
    /// supertype of an instance.
    ParentOfOther,
    /// The non-`$` alternative of an optional parent.
    Child,
}

/// The various different possible EBNF grammar errors.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum EbnfGrammarErrorKind {
    IllegalName,
    IllegalString,
    IncompleteComment,
    MissingEquals,
    MissingSemicolon,
    PrematureEnd,
    DuplicateProduction(String),
    BadCommaProduction,
    UndefinedNonTerminal(String),
    MissingStartAttributes,
    MissingEndAttributes,
    MalformedAttributeLine,
    UnknownAttributeProduction(String),
    BadTokenSpelling,
    NotEnoughExpressions(String),
    NotEnoughAttNames(String),
    AttributeNameMismatch(String, String, String),
    NoTransferName(String),
    ProductionLoop,
    TooManyKeywords(char),
    TooManyClasses(char),
    TooManyTerminals,
}

/// Any error from parsing or analyzing an EBNF grammar returns an instance of
/// this struct.
#[derive(Debug, PartialEq, Eq)]
pub struct EbnfGrammarError {
    /// Uniquely identifies each error.
    pub(crate) kind: EbnfGrammarErrorKind,
    /// The spans of source text the error refers to; empty for errors raised
    /// by the analysis passes, which refer to productions by name instead.
    pub(crate) spans: Vec<Span>,
}

impl EbnfGrammarError {
    pub(crate) fn new(kind: EbnfGrammarErrorKind) -> Self {
        EbnfGrammarError {
            kind,
            spans: Vec::new(),
        }
    }

    pub(crate) fn new_with_spans(kind: EbnfGrammarErrorKind, spans: Vec<Span>) -> Self {
        EbnfGrammarError { kind, spans }
    }

    /// The kind of this error.
    pub fn kind(&self) -> &EbnfGrammarErrorKind {
        &self.kind
    }

    /// Returns the spans associated with the error, if any.
    pub fn spans(&self) -> impl Iterator<Item = Span> + '_ {
        self.spans.iter().copied()
    }
}

impl Error for EbnfGrammarError {}

impl fmt::Display for EbnfGrammarError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl fmt::Display for EbnfGrammarErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            EbnfGrammarErrorKind::IllegalName => "Illegal name",
            EbnfGrammarErrorKind::IllegalString => "Illegal string",
            EbnfGrammarErrorKind::IncompleteComment => "Incomplete comment",
            EbnfGrammarErrorKind::MissingEquals => "Missing '='",
            EbnfGrammarErrorKind::MissingSemicolon => "Missing ';'",
            EbnfGrammarErrorKind::PrematureEnd => "File ends prematurely",
            EbnfGrammarErrorKind::DuplicateProduction(name) => {
                return write!(f, "Production {} defined more than once", name)
            }
            EbnfGrammarErrorKind::BadCommaProduction => {
                "The production c must have the single definition ','"
            }
            EbnfGrammarErrorKind::UndefinedNonTerminal(name) => {
                return write!(f, "{} is not defined", name)
            }
            EbnfGrammarErrorKind::MissingStartAttributes => "Did not find Start attributes",
            EbnfGrammarErrorKind::MissingEndAttributes => "Did not find End attributes",
            EbnfGrammarErrorKind::MalformedAttributeLine => "Malformed attribute line",
            EbnfGrammarErrorKind::UnknownAttributeProduction(name) => {
                return write!(f, "Did not find production {}", name)
            }
            EbnfGrammarErrorKind::BadTokenSpelling => "Bad token spelling",
            EbnfGrammarErrorKind::NotEnoughExpressions(name) => {
                return write!(f, "Not enough expressions to match attributes for {}", name)
            }
            EbnfGrammarErrorKind::NotEnoughAttNames(name) => {
                return write!(f, "Not enough attNames to match myAtts for {}", name)
            }
            EbnfGrammarErrorKind::AttributeNameMismatch(a, b, name) => {
                return write!(
                    f,
                    "Matching attribute names {} and {} differ for {}",
                    a, b, name
                )
            }
            EbnfGrammarErrorKind::NoTransferName(name) => {
                return write!(f, "did not find transferName for {}", name)
            }
            EbnfGrammarErrorKind::ProductionLoop => "loop found in productions",
            EbnfGrammarErrorKind::TooManyKeywords(c) => {
                return write!(f, "Too many tokens starting with {}", c)
            }
            EbnfGrammarErrorKind::TooManyClasses(c) => {
                return write!(f, "Too many classes starting with {}", c)
            }
            EbnfGrammarErrorKind::TooManyTerminals => "Too many terminals",
        };
        write!(f, "{}", s)
    }
}
