use lazy_static::lazy_static;
use regex::Regex;

use super::{
    ast::{AstExpr, AttributeLine, EbnfAST},
    EbnfGrammarError, EbnfGrammarErrorKind, ExprKind,
};
use crate::Span;

/// The all-caps names that denote value-carrying lexical classes rather than
/// keywords. References to these lex as `Terminal`; everything else all-caps
/// lexes as `Keyword`.
pub const TERMINAL_NAMES: [&str; 3] = ["CHARSTRING", "INTSTRING", "REALSTRING"];

const START_ATTRIBUTES: &str = "(* Start attributes *)";
const END_ATTRIBUTES: &str = "(* End attributes *)";

lazy_static! {
    static ref RE_NAME: Regex = Regex::new(r"^[A-Za-z][A-Za-z0-9]*").unwrap();
}

pub struct EbnfParser {
    src: String,
    ast: EbnfAST,
}

/// The parser walks a byte index over the source; the index always points at
/// the beginning of a UTF-8 character.
impl EbnfParser {
    pub fn new(src: &str) -> EbnfParser {
        EbnfParser {
            src: src.to_string(),
            ast: EbnfAST::new(),
        }
    }

    /// Parse the whole source into productions. A source with no productions
    /// at all is accepted.
    pub fn parse(&mut self) -> Result<(), EbnfGrammarError> {
        let mut i = self.parse_ws(0)?;
        while i < self.src.len() {
            i = self.parse_prod(i)?;
            i = self.parse_ws(i)?;
        }
        Ok(())
    }

    pub fn build(self) -> EbnfAST {
        self.ast
    }

    fn parse_prod(&mut self, mut i: usize) -> Result<usize, EbnfGrammarError> {
        let (j, name) = self.parse_name(i)?;
        let name_span = Span::new(i, j);
        i = self.parse_ws(j)?;
        match self.lookahead_is("=", i) {
            Some(j) => i = self.parse_ws(j)?,
            None => return Err(self.mk_error(EbnfGrammarErrorKind::MissingEquals, i)),
        }
        let mut defs = Vec::new();
        let mut exprs = Vec::new();
        loop {
            if let Some(j) = self.lookahead_is("|", i) {
                defs.push(exprs);
                exprs = Vec::new();
                i = self.parse_ws(j)?;
                continue;
            }
            if let Some(j) = self.lookahead_is(";", i) {
                defs.push(exprs);
                i = j;
                break;
            }
            if i >= self.src.len() {
                return Err(self.mk_error(EbnfGrammarErrorKind::PrematureEnd, i));
            }
            if !exprs.is_empty() {
                // The commas between expressions are EBNF metasyntax, not
                // part of the language being described.
                match self.lookahead_is(",", i) {
                    Some(j) => i = self.parse_ws(j)?,
                    None => return Err(self.mk_error(EbnfGrammarErrorKind::MissingSemicolon, i)),
                }
            }
            let (j, expr) = self.parse_expr(i)?;
            exprs.push(expr);
            i = self.parse_ws(j)?;
        }
        if name == "c" {
            // The comma-alias production is not retained: the keyword C
            // stands in for it from here on.
            let well_formed = defs.len() == 1
                && defs[0].len() == 1
                && defs[0][0].kind == ExprKind::OneChar
                && defs[0][0].lexeme == ",";
            if !well_formed {
                return Err(EbnfGrammarError::new_with_spans(
                    EbnfGrammarErrorKind::BadCommaProduction,
                    vec![name_span],
                ));
            }
            self.ast.keywords.record("C")?;
        } else if let Some(orig) = self.ast.get_prod(&name) {
            return Err(EbnfGrammarError::new_with_spans(
                EbnfGrammarErrorKind::DuplicateProduction(name),
                vec![orig.name.1, name_span],
            ));
        } else {
            self.ast.add_prod((name, name_span), defs);
        }
        Ok(i)
    }

    fn parse_expr(&mut self, i: usize) -> Result<(usize, AstExpr), EbnfGrammarError> {
        if self.lookahead_is("'", i).is_some() {
            return self.parse_literal(i);
        }
        let (j, name) = self.parse_name(i)?;
        let span = Span::new(i, j);
        let kind = if name == "c" {
            ExprKind::Comma
        } else if name
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        {
            if TERMINAL_NAMES.contains(&name.as_str()) {
                self.ast.terminals.record(&name)?;
                ExprKind::Terminal
            } else {
                self.ast.keywords.record(&name)?;
                ExprKind::Keyword
            }
        } else {
            ExprKind::NonTerminal
        };
        Ok((
            j,
            AstExpr {
                kind,
                lexeme: name,
                span,
            },
        ))
    }

    fn parse_literal(&self, i: usize) -> Result<(usize, AstExpr), EbnfGrammarError> {
        let body_start = i + 1;
        let body_len = match self.src[body_start..].find('\'') {
            Some(0) | None => return Err(self.mk_error(EbnfGrammarErrorKind::IllegalString, i)),
            Some(n) => n,
        };
        let lexeme = self.src[body_start..body_start + body_len].to_string();
        let mut chars = lexeme.chars();
        let kind = match (chars.next(), chars.next(), chars.next()) {
            (Some(_), None, None) => ExprKind::OneChar,
            (Some(c0), Some(c1), None)
                if c0.is_ascii_uppercase() && c1 == c0.to_ascii_lowercase() =>
            {
                ExprKind::TwoChar
            }
            _ => ExprKind::TerminalString,
        };
        Ok((
            body_start + body_len + 1,
            AstExpr {
                kind,
                lexeme,
                span: Span::new(body_start, body_start + body_len),
            },
        ))
    }

    fn parse_name(&self, i: usize) -> Result<(usize, String), EbnfGrammarError> {
        match RE_NAME.find(&self.src[i..]) {
            Some(m) => {
                assert_eq!(m.start(), 0);
                Ok((i + m.end(), self.src[i..i + m.end()].to_string()))
            }
            None => Err(self.mk_error(EbnfGrammarErrorKind::IllegalName, i)),
        }
    }

    fn parse_ws(&self, mut i: usize) -> Result<usize, EbnfGrammarError> {
        while i < self.src.len() {
            let c = self.src[i..].chars().next().unwrap();
            if c.is_whitespace() {
                i += c.len_utf8();
            } else if self.lookahead_is("(*", i).is_some() {
                match self.src[i + 2..].find("*)") {
                    Some(off) => i = i + 2 + off + 2,
                    None => {
                        return Err(self.mk_error(EbnfGrammarErrorKind::IncompleteComment, i));
                    }
                }
            } else {
                break;
            }
        }
        Ok(i)
    }

    fn lookahead_is(&self, s: &'static str, i: usize) -> Option<usize> {
        if self.src[i..].starts_with(s) {
            Some(i + s.len())
        } else {
            None
        }
    }

    fn mk_error(&self, kind: EbnfGrammarErrorKind, off: usize) -> EbnfGrammarError {
        EbnfGrammarError::new_with_spans(kind, vec![Span::point(off)])
    }
}

/// Extract the attribute-comment block:
///
/// ```text
/// (* Start attributes *)
/// (* approval : status level *)
/// (* rapidMovement : : itsSecplane itsToolpath itsToolDirection *)
/// (* End attributes *)
/// ```
///
/// One line per production; the names after the first colon are the
/// production's own attributes, and a second colon introduces an explicit
/// override of the full (inherited plus own) attribute list. Blank lines and
/// line-wrapped attribute lists are not permitted. Both sentinel lines are
/// required even when the block is empty.
pub fn parse_attribute_comments(src: &str) -> Result<Vec<AttributeLine>, EbnfGrammarError> {
    let mut lines = src.lines();
    loop {
        match lines.next() {
            None => {
                return Err(EbnfGrammarError::new(
                    EbnfGrammarErrorKind::MissingStartAttributes,
                ));
            }
            Some(l) if l.trim() == START_ATTRIBUTES => break,
            Some(_) => (),
        }
    }
    let mut out = Vec::new();
    loop {
        let line = match lines.next() {
            None => {
                return Err(EbnfGrammarError::new(
                    EbnfGrammarErrorKind::MissingEndAttributes,
                ));
            }
            Some(l) => l,
        };
        if line.trim() == END_ATTRIBUTES {
            return Ok(out);
        }
        let toks = line.split_whitespace().collect::<Vec<_>>();
        if toks.len() < 4
            || toks[0] != "(*"
            || toks[2] != ":"
            || toks[toks.len() - 1] != "*)"
        {
            return Err(EbnfGrammarError::new(
                EbnfGrammarErrorKind::MalformedAttributeLine,
            ));
        }
        let prod_name = toks[1].to_string();
        let body = &toks[3..toks.len() - 1];
        let (own, full) = match body.iter().position(|t| *t == ":") {
            Some(pos) => (
                &body[..pos],
                Some(body[pos + 1..].iter().map(|t| t.to_string()).collect()),
            ),
            None => (body, None),
        };
        out.push(AttributeLine {
            prod_name,
            own: own.iter().map(|t| t.to_string()).collect(),
            full,
        });
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn parse(s: &str) -> EbnfAST {
        let mut ep = EbnfParser::new(s);
        ep.parse().unwrap();
        ep.build()
    }

    fn parse_err(s: &str) -> EbnfGrammarErrorKind {
        let mut ep = EbnfParser::new(s);
        match ep.parse() {
            Err(e) => e.kind,
            Ok(_) => panic!("parsed without error"),
        }
    }

    #[test]
    fn test_empty_source() {
        let ast = parse("  (* nothing here *)  ");
        assert!(ast.prods.is_empty());
    }

    #[test]
    fn test_expression_kinds() {
        let ast = parse(
            "workpiece = WORKPIECE , '(' , CharString , c , INTSTRING , 'Xx' , 'abc' , ')' ;",
        );
        let prod = ast.get_prod("workpiece").unwrap();
        assert_eq!(prod.defs.len(), 1);
        let kinds = prod.defs[0].iter().map(|e| e.kind).collect::<Vec<_>>();
        assert_eq!(
            kinds,
            vec![
                ExprKind::Keyword,
                ExprKind::OneChar,
                ExprKind::NonTerminal,
                ExprKind::Comma,
                ExprKind::Terminal,
                ExprKind::TwoChar,
                ExprKind::TerminalString,
                ExprKind::OneChar,
            ]
        );
        assert!(ast.keywords.contains("WORKPIECE"));
        assert!(ast.terminals.contains("INTSTRING"));
        assert!(!ast.keywords.contains("INTSTRING"));
    }

    #[test]
    fn test_definitions_split_on_bar() {
        let ast = parse("approvalItem = workplan | workpiece | '$' ;");
        let prod = ast.get_prod("approvalItem").unwrap();
        assert_eq!(prod.defs.len(), 3);
        assert_eq!(prod.defs[0].len(), 1);
        assert_eq!(prod.defs[2][0].kind, ExprKind::OneChar);
        assert_eq!(prod.defs[2][0].lexeme, "$");
    }

    #[test]
    fn test_empty_definition() {
        let ast = parse("maybe = thing | ;");
        let prod = ast.get_prod("maybe").unwrap();
        assert_eq!(prod.defs.len(), 2);
        assert!(prod.defs[1].is_empty());
    }

    #[test]
    fn test_comma_production_suppressed() {
        let ast = parse("c = ',' ;\nintList = intVal | intList , c , intVal ;");
        assert!(ast.get_prod("c").is_none());
        assert_eq!(ast.prods.len(), 1);
        assert!(ast.keywords.contains("C"));
    }

    #[test]
    fn test_bad_comma_production() {
        assert_eq!(
            parse_err("c = ';' ;"),
            EbnfGrammarErrorKind::BadCommaProduction
        );
        assert_eq!(
            parse_err("c = ',' | ';' ;"),
            EbnfGrammarErrorKind::BadCommaProduction
        );
    }

    #[test]
    fn test_duplicate_production() {
        match parse_err("a = b ;\na = d ;") {
            EbnfGrammarErrorKind::DuplicateProduction(name) => assert_eq!(name, "a"),
            k => panic!("wrong error {:?}", k),
        }
    }

    #[test]
    fn test_comments_are_whitespace() {
        let ast = parse("a (* comment *) = (* another *) b ;");
        assert!(ast.get_prod("a").is_some());
    }

    #[test]
    fn test_incomplete_comment() {
        assert_eq!(
            parse_err("a = b ; (* unfinished"),
            EbnfGrammarErrorKind::IncompleteComment
        );
    }

    #[test]
    fn test_missing_equals_and_semicolon() {
        assert_eq!(parse_err("a b ;"), EbnfGrammarErrorKind::MissingEquals);
        assert_eq!(parse_err("a = b c ;"), EbnfGrammarErrorKind::MissingSemicolon);
        assert_eq!(parse_err("a = b , c"), EbnfGrammarErrorKind::PrematureEnd);
    }

    #[test]
    fn test_attribute_comments() {
        let src = "\
plane = PLANE ;
(* Start attributes *)
(* angleTaper : angle *)
(* rapidMovement : : itsSecplane itsToolpath itsToolDirection *)
(* workplan : itsElements itsChannel : itsId itsElements itsChannel *)
(* End attributes *)
";
        let lines = parse_attribute_comments(src).unwrap();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].prod_name, "angleTaper");
        assert_eq!(lines[0].own, vec!["angle"]);
        assert_eq!(lines[0].full, None);
        assert!(lines[1].own.is_empty());
        assert_eq!(
            lines[1].full.as_ref().unwrap(),
            &vec!["itsSecplane", "itsToolpath", "itsToolDirection"]
        );
        assert_eq!(lines[2].own, vec!["itsElements", "itsChannel"]);
        assert_eq!(
            lines[2].full.as_ref().unwrap(),
            &vec!["itsId", "itsElements", "itsChannel"]
        );
    }

    #[test]
    fn test_attribute_comments_missing_sentinels() {
        assert_eq!(
            parse_attribute_comments("plane = PLANE ;").unwrap_err().kind,
            EbnfGrammarErrorKind::MissingStartAttributes
        );
        assert_eq!(
            parse_attribute_comments("(* Start attributes *)\n(* a : b *)")
                .unwrap_err()
                .kind,
            EbnfGrammarErrorKind::MissingEndAttributes
        );
    }
}
