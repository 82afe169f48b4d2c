//! A library for manipulating grammars written in the restricted EBNF dialect
//! that describes STEP Part 21 data models (entities, attributes,
//! supertype/subtype hierarchies, optional attributes, and list types).
//!
//! A note on the terminology we use, since the EBNF standard's own vocabulary
//! is partially anachronistic:
//!
//!   * A production is a mapping from a name to 1 or more definitions (the
//!     latter of which EBNF separates with vertical bars).
//!   * A definition is a (possibly empty) ordered sequence of expressions.
//!   * An expression is a keyword, a non-terminal, a terminal, a quoted
//!     character or character pair, or a quoted string.
//!
//! ebnfgrammar makes the following guarantees about grammars:
//!
//!   * Productions are numbered from `0` to `prods_len() - 1` (inclusive), in
//!     the order they appear in the input.
//!   * Definitions are numbered from `0` to `defs_len() - 1` (inclusive).
//!   * Expressions are numbered from `0` to `exps_len() - 1` (inclusive), and
//!     the shared comma expression (written `c` in the input) is always
//!     expression `0`, so two occurrences of the comma alias are identical.
//!   * Indices are newtypes ([`PIdx`], [`DIdx`], [`EIdx`]) over a storage
//!     type chosen at construction; widening one back to `usize` never loses
//!     bits, because the counts are checked against the storage type before
//!     any index is built.
//!
//! For most uses, the main function to investigate is
//! [`EbnfGrammar::new()`](ebnf::EbnfGrammar::new), which takes as input an
//! EBNF grammar in textual form and returns the fully analyzed grammar.

mod idxnewtype;
pub mod ebnf;
pub mod nametable;
mod span;

pub use crate::idxnewtype::{DIdx, EIdx, PIdx};
pub use crate::span::Span;
