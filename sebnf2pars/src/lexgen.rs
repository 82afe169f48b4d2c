//! The lexer back end: projects the keyword-lexeme table onto a Lex
//! specification. Keywords match case-insensitively through per-letter
//! character classes; the fixed tail handles comments, strings, `#N` ids,
//! numbers, and punctuation.

use ebnfgrammar::ebnf::EbnfGrammar;

pub struct LexEmitter<'a> {
    grm: &'a EbnfGrammar<u32>,
    base: &'a str,
}

impl<'a> LexEmitter<'a> {
    pub fn new(grm: &'a EbnfGrammar<u32>, base: &'a str) -> Self {
        LexEmitter { grm, base }
    }

    pub fn emit(&self) -> String {
        let mut out = String::new();
        self.emit_start(&mut out);
        self.emit_middle(&mut out);
        for entry in self.grm.keywords().iter() {
            // C stands for a comma in the Yacc file; an upper case C in a
            // Part 21 file must not lex as it.
            if entry.name == "C" {
                continue;
            }
            self.emit_keyword(&entry.name, &entry.lexeme, &mut out);
        }
        self.emit_end(&mut out);
        out
    }

    fn emit_start(&self, out: &mut String) {
        out.push_str("%{\n\n");
        out.push_str(&format!(
            "/* {}.lex\n\n   Lexer generated by sebnf2pars. Do not edit.\n\n*/\n\n",
            self.base
        ));
        out.push_str("#include <string.h>          // for strdup, etc.\n");
        out.push_str("#include <ctype.h>           // for isalpha\n");
        out.push_str(&format!("#include \"{}classes.hh\"\n", self.base));
        out.push_str(&format!("#include \"{}YACC.hh\"\n", self.base));
    }

    fn emit_middle(&self, out: &mut String) {
        out.push_str(
            "\n#define ECH  for (k=0; ((k < yyleng) && (lineTextIndex < 4095));)\\\n    lineText[lineTextIndex++] = yytext[k++];\\\n    lineText[lineTextIndex] = 0\n\n",
        );
        out.push_str("extern char lineText[];\nextern char lexMessage[];\n");
        out.push_str("int lineTextIndex;\nchar stringText[4096];\n");
        out.push_str("int j;      // index for stringText\ndouble num; // number to parse reals into\nint k;      // utility index, used in ECH macro\n");
        out.push_str("\n%}\n\n");
        for c in b'A'..=b'Z' {
            let upper = c as char;
            let lower = upper.to_ascii_lowercase();
            out.push_str(&format!("{} [{}{}]\n", upper, lower, upper));
        }
        out.push_str("\n_ [ \\t\\n\\r]*\n");
        out.push_str("\n%x COMMENT\n%x INSTRING\n%x INID\n\n%%\n\n");
    }

    fn emit_keyword(&self, name: &str, lexeme: &str, out: &mut String) {
        let mut rule = String::from("{_}");
        for c in lexeme.chars() {
            if c.is_ascii_uppercase() {
                rule.push_str(&format!("{{{}}}", c));
            } else {
                rule.push_str(&format!("\"{}\"", c));
            }
        }
        rule.push_str("{_} ");
        while rule.len() < 40 {
            rule.push(' ');
        }
        out.push_str(&format!("{}{{ECH; return {};}}\n", rule, name));
    }

    fn emit_end(&self, out: &mut String) {
        out.push_str(
            "{_}\"/*\"                                 {ECH; BEGIN(COMMENT);}\n\
             <COMMENT>.                              {ECH;}\n\
             <COMMENT>\\n                             {ECH;}\n\
             <COMMENT>\"*/\"{_}                        {ECH; BEGIN(INITIAL);}\n\
             {_}'                                    {ECH; j=0; BEGIN INSTRING;}\n\
             <INSTRING>('')                          {ECH; stringText[j++] = '\\'';}\n\
             <INSTRING>'{_}                          {ECH; BEGIN INITIAL;\n\
             \x20                                        stringText[j] = 0;\n\
             \x20                                        yylval.sval = strdup(stringText);\n\
             \x20                                        return CHARSTRING;}\n\
             <INSTRING>[ -&(-~\\t]                    {ECH; stringText[j++]=yytext[0];}\n\
             <INSTRING>\\n                            {ECH;\n\
             \x20                                        sprintf(lexMessage,\n\
             \x20                                                \"newline in string\");\n\
             \x20                                        BEGIN INITIAL;\n\
             \x20                                        return BAD;}\n\
             <INSTRING>.                             {ECH;\n\
             \x20                                        sprintf(lexMessage,\n\
             \x20                                             \"bad character in string\");\n\
             \x20                                        BEGIN INITIAL;\n\
             \x20                                        return BAD;}\n\
             <INID>[0-9]+{_}                         {ECH;\n\
             \x20                                        sscanf(yytext, \"%d\", &k);\n\
             \x20                                        yylval.ival = k;\n\
             \x20                                        BEGIN INITIAL;\n\
             \x20                                        return INTSTRING;}\n\
             <INID>.                                 {ECH;\n\
             \x20                                        sprintf(lexMessage,\n\
             \x20                                             \"bad character in id\");\n\
             \x20                                        BEGIN INITIAL;\n\
             \x20                                        return BAD;}\n\
             {_}\"$\"{_}                               {ECH; return DOLLAR;}\n\
             {_}\",\"{_}                               {ECH; return C;}\n\
             {_}\":\"{_}                               {ECH; return COLON;}\n\
             {_}\"=\"{_}                               {ECH; return EQUALS;}\n\
             {_}\"[\"{_}                               {ECH; return LBOX;}\n\
             {_}\"(\"{_}                               {ECH; return LPAREN;}\n\
             {_}\"]\"{_}                               {ECH; return RBOX;}\n\
             {_}\")\"{_}                               {ECH; return RPAREN;}\n\
             {_}\";\"{_}                               {ECH;\n\
             \x20                                          lineTextIndex = 0;\n\
             \x20                                          return SEMICOLON;}\n\
             {_}\"#\"                                  {ECH; BEGIN INID; return SHARP;}\n\
             {_}\"/\"{_}                               {ECH; return SLASH;}\n\
             {_}[0-9]+{_}                            {ECH;\n\
             \x20                                        sscanf(yytext, \"%d\", &k);\n\
             \x20                                        yylval.ival = k;\n\
             \x20                                        return INTSTRING;}\n\
             {_}(-?|\"+\")(([0-9]+\".\"[0-9]+)|(\".\"[0-9]+)){_} {ECH;\n\
             \x20                                        sscanf(yytext, \"%lf\", &num);\n\
             \x20                                        yylval.rval = num;\n\
             \x20                                        return REALSTRING;}\n\
             {_}(-?|\"+\")([0-9]+\".\")/[^a-zA-Z]{_}     {ECH;\n\
             \x20                                        sscanf(yytext, \"%lf\", &num);\n\
             \x20                                        yylval.rval = num;\n\
             \x20                                        return REALSTRING;}\n\
             .                                 {ECH;\n\
             \x20                                  sprintf(lexMessage, \"bad character\");\n\
             \x20                                  BEGIN INITIAL;\n\
             \x20                                  return BAD;}\n\
             \n\
             %%\n\
             \n\
             int yywrap()\n\
             {\n\
             \x20 return 1;\n\
             }\n",
        );
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::emit::test_support::analyzed;

    #[test]
    fn test_keyword_rules_use_respelled_lexemes() {
        let (grm, _) = analyzed();
        let lex = LexEmitter::new(&grm, "p21").emit();
        assert!(lex.contains("{_}{P}{L}{A}{N}{E}{_}"));
        assert!(lex.contains("{ECH; return PLANE;}"));
        // The respelled keyword matches its explicit spelling, digits and
        // underscores quoted.
        assert!(lex.contains("{A}{X}{I}{S}\"2\"\"_\"{P}{L}{A}{C}{E}{M}{E}{N}{T}\"_\"\"3\"{D}"));
        assert!(lex.contains("return AXIS2PLACEMENT3D;"));
    }

    #[test]
    fn test_comma_keyword_not_lexed() {
        let (grm, _) = analyzed();
        let lex = LexEmitter::new(&grm, "p21").emit();
        // The comma itself returns C; there must be no keyword rule for an
        // upper case C.
        assert!(!lex.contains("{_}{C}{_}"));
        assert!(lex.contains("{_}\",\"{_}"));
    }

    #[test]
    fn test_letter_classes_and_states() {
        let (grm, _) = analyzed();
        let lex = LexEmitter::new(&grm, "p21").emit();
        assert!(lex.contains("A [aA]\n"));
        assert!(lex.contains("Z [zZ]\n"));
        assert!(lex.contains("%x COMMENT\n%x INSTRING\n%x INID\n"));
        assert!(lex.contains("int yywrap()"));
    }
}
