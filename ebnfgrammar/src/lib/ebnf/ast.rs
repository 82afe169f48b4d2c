use indexmap::IndexMap;

use super::ExprKind;
use crate::{
    nametable::{KeywordNames, TerminalNames},
    Span,
};

/// An AST representing an EBNF grammar. This is built up gradually by
/// [`EbnfParser`](super::parser::EbnfParser); the ordering of productions and
/// of everything within a production is that of the input file.
///
/// The production named `c` (the comma alias) is never added to `prods`: the
/// parser canonicalizes it away, recording the synthetic keyword `C` instead.
#[derive(Debug)]
#[cfg_attr(test, derive(PartialEq))]
pub struct EbnfAST {
    /// Map from a production name to its parsed form. Using an `IndexMap`
    /// means that we retain the order of productions as they're found in the
    /// input file.
    pub prods: IndexMap<String, AstProd>,
    /// The keyword names seen in right-hand sides, plus `C` if the comma
    /// production was seen.
    pub keywords: KeywordNames,
    /// The terminal names seen in right-hand sides.
    pub terminals: TerminalNames,
}

#[derive(Debug)]
#[cfg_attr(test, derive(PartialEq))]
pub struct AstProd {
    pub name: (String, Span),
    /// The definitions (`|`-separated alternatives), each an ordered
    /// sequence of expressions.
    pub defs: Vec<Vec<AstExpr>>,
}

#[derive(Clone, Debug)]
#[cfg_attr(test, derive(PartialEq))]
pub struct AstExpr {
    pub kind: ExprKind,
    /// The name or (unquoted) literal text of the expression. The comma
    /// alias has lexeme `c`.
    pub lexeme: String,
    pub span: Span,
}

/// One line of the bracketed attribute-comment block: the named production's
/// own attributes, plus (after a second colon) an explicit override for its
/// full attribute list.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AttributeLine {
    pub prod_name: String,
    pub own: Vec<String>,
    pub full: Option<Vec<String>>,
}

impl EbnfAST {
    pub fn new() -> Self {
        EbnfAST {
            prods: IndexMap::new(),
            keywords: KeywordNames::new(),
            terminals: TerminalNames::new(),
        }
    }

    pub fn add_prod(&mut self, name: (String, Span), defs: Vec<Vec<AstExpr>>) {
        self.prods.insert(name.0.clone(), AstProd { name, defs });
    }

    pub fn get_prod(&self, name: &str) -> Option<&AstProd> {
        self.prods.get(name)
    }
}

impl Default for EbnfAST {
    fn default() -> Self {
        EbnfAST::new()
    }
}
