//! The parser back end: projects the analyzed grammar onto a Yacc grammar
//! file whose actions build the generated classes. References to instances
//! parse as `instanceId` and are enqueued on per-class link queues; after a
//! file has been read, `linkAll` patches the queued references to point at
//! the instances themselves.

use std::collections::BTreeSet;

use ebnfgrammar::{
    ebnf::{
        grammar::{INSTANCE, INSTANCE_PLUS},
        EbnfGrammar, ExprKind, ListKind, OptionalRole,
    },
    EIdx, PIdx,
};

use crate::emit::{attribute_positions, is_instance_ref, list_cpp_type, onechar_token};

pub struct YaccEmitter<'a> {
    grm: &'a EbnfGrammar<u32>,
    base: &'a str,
}

impl<'a> YaccEmitter<'a> {
    pub fn new(grm: &'a EbnfGrammar<u32>, base: &'a str) -> Self {
        YaccEmitter { grm, base }
    }

    /// Does `p` get a rule of its own? Terminal names and keyword-spelling
    /// directives are lexer business, and a supertype of an instance parses
    /// as an `instanceId` wherever it is referenced.
    fn has_rule(&self, p: PIdx<u32>) -> bool {
        let name = self.grm.prod_name(p);
        !(self.grm.terminals().contains(name)
            || self.grm.keywords().contains(name)
            || self.grm.be_instance(p).is_some())
    }

    fn rule_prods(&self) -> Vec<PIdx<u32>> {
        self.grm
            .iter_pidxs()
            .filter(|&p| self.has_rule(p))
            .collect()
    }

    /// The type a rule's semantic value has in the %union, if it has one.
    fn value_type(&self, p: PIdx<u32>) -> String {
        let name = self.grm.prod_name(p);
        if name == INSTANCE_PLUS {
            return "instance *".to_string();
        }
        match self.grm.list_kind(p) {
            ListKind::None => (),
            _ => return format!("{} *", list_cpp_type(self.grm, p)),
        }
        match self.grm.optional_role(p) {
            OptionalRole::ParentOfInstanceOrSupertype | OptionalRole::ParentOfOther => {
                format!("{} *", self.grm.prod_name(self.grm.opt_peer(p).unwrap()))
            }
            _ => format!("{} *", name),
        }
    }

    /// Every class name that instance references get linked to: the targets
    /// of plain instance-valued attributes, of instance-valued optionals
    /// (their children), and of instance-valued list elements.
    fn link_targets(&self) -> BTreeSet<String> {
        let mut targets = BTreeSet::new();
        for p in self.rule_prods() {
            if self.grm.list_kind(p) != ListKind::None {
                let item = self.grm.def_exps(self.grm.prod_defs(p)[0])[0];
                if is_instance_ref(self.grm, item) {
                    targets.insert(self.grm.exp(item).lexeme.clone());
                }
                continue;
            }
            for &didx in self.grm.prod_defs(p) {
                for &eidx in self.grm.def_exps(didx) {
                    let exp = self.grm.exp(eidx);
                    if exp.kind != ExprKind::NonTerminal {
                        continue;
                    }
                    if let Some(target) = exp.prod {
                        if self.grm.optional_role(target)
                            == OptionalRole::ParentOfInstanceOrSupertype
                        {
                            targets.insert(
                                self.grm
                                    .prod_name(self.grm.opt_peer(target).unwrap())
                                    .to_string(),
                            );
                        } else if is_instance_ref(self.grm, eidx) {
                            targets.insert(exp.lexeme.clone());
                        }
                    }
                }
            }
        }
        targets
    }

    pub fn emit(&self) -> String {
        let mut out = String::new();
        let rule_prods = self.rule_prods();
        self.emit_prologue(&mut out);
        self.emit_union_and_types(&rule_prods, &mut out);
        self.emit_tokens(&mut out);
        if let Some(&first) = rule_prods.first() {
            out.push_str(&format!("\n%start {}\n", self.grm.prod_name(first)));
        }
        out.push_str("\n%%\n\n");
        for &p in &rule_prods {
            self.emit_rule(p, &mut out);
        }
        out.push_str("%%\n");
        self.emit_epilogue(&mut out);
        out
    }

    fn emit_prologue(&self, out: &mut String) {
        out.push_str("%{\n\n");
        out.push_str(&format!(
            "/* {}.y\n\n   Parser generated by sebnf2pars. Do not edit.\n\n*/\n\n",
            self.base
        ));
        out.push_str("#include <stdio.h>\n#include <stdlib.h>\n#include <string.h>\n#include <list>\n");
        out.push_str(&format!("#include \"{}classes.hh\"\n\n", self.base));
        out.push_str("#define YYERROR_VERBOSE\n\n");
        out.push_str("extern int yylex();\nextern FILE * yyin;\n");
        out.push_str("char lineText[4096];\nchar lexMessage[4096];\n\n");
        out.push_str("int yyerror(char * s);\nvoid linkAll();\ninstance * findInstance(int idNum);\n\n");
        out.push_str("std::list<instance *> instances;\n");
        for target in self.link_targets() {
            out.push_str(&format!("std::list<{} **> {}_refs;\n", target, target));
            out.push_str(&format!("std::list<int> {}_nums;\n", target));
        }
        out.push_str("\n%}\n\n");
    }

    fn emit_union_and_types(&self, rule_prods: &[PIdx<u32>], out: &mut String) {
        out.push_str("%union {\n  int ival;\n  double rval;\n  char * sval;\n");
        for &p in rule_prods {
            out.push_str(&format!(
                "  {} {}_val;\n",
                self.value_type(p),
                self.grm.prod_name(p)
            ));
        }
        out.push_str("}\n\n");
        for &p in rule_prods {
            out.push_str(&format!(
                "%type <{}_val> {}\n",
                self.grm.prod_name(p),
                self.grm.prod_name(p)
            ));
        }
    }

    fn emit_tokens(&self, out: &mut String) {
        out.push_str("\n%token BAD COLON DOLLAR EQUALS LBOX LPAREN RBOX RPAREN SEMICOLON SHARP SLASH\n");
        out.push_str("%token <ival> INTSTRING\n");
        out.push_str("%token <rval> REALSTRING\n");
        out.push_str("%token <sval> CHARSTRING\n");
        let mut line = String::new();
        for entry in self.grm.keywords().iter() {
            if line.len() + entry.name.len() > 70 {
                out.push_str(&format!("%token{}\n", line));
                line.clear();
            }
            line.push(' ');
            line.push_str(&entry.name);
        }
        if !line.is_empty() {
            out.push_str(&format!("%token{}\n", line));
        }
    }

    /// The symbol an expression contributes to a rule. Instance references
    /// become `instanceId`, because what actually appears in a Part 21 file
    /// is an `#N`.
    fn rule_symbol(&self, eidx: EIdx<u32>) -> String {
        if is_instance_ref(self.grm, eidx) {
            return "instanceId".to_string();
        }
        let exp = self.grm.exp(eidx);
        match exp.kind {
            ExprKind::Comma => "C".to_string(),
            ExprKind::OneChar => onechar_token(exp.lexeme.chars().next().unwrap())
                .unwrap_or("BAD")
                .to_string(),
            _ => exp.lexeme.clone(),
        }
    }

    fn emit_rule(&self, p: PIdx<u32>, out: &mut String) {
        let name = self.grm.prod_name(p);
        if name == INSTANCE_PLUS {
            if self.emit_instance_plus_rule(p, out) {
                return;
            }
        }
        match self.grm.list_kind(p) {
            ListKind::CommaSeparated => return self.emit_list_rule(p, true, out),
            ListKind::Plain => return self.emit_list_rule(p, false, out),
            ListKind::None => (),
        }
        match self.grm.optional_role(p) {
            OptionalRole::ParentOfInstanceOrSupertype => return self.emit_opt_instance_rule(p, out),
            OptionalRole::ParentOfOther => return self.emit_opt_other_rule(p, out),
            _ => (),
        }
        if self.grm.is_supertype(p) {
            return self.emit_supertype_rule(p, out);
        }
        self.emit_plain_rule(p, out);
    }

    /// `instancePlus` pairs an id with an instance and records the instance
    /// for later lookup.
    fn emit_instance_plus_rule(&self, p: PIdx<u32>, out: &mut String) -> bool {
        let exps = self.grm.def_exps(self.grm.prod_defs(p)[0]);
        let id_pos = exps
            .iter()
            .position(|&e| self.grm.exp(e).lexeme == "instanceId");
        let inst_pos = exps.iter().position(|&e| self.grm.exp(e).lexeme == INSTANCE);
        let (id_pos, inst_pos) = match (id_pos, inst_pos) {
            (Some(i), Some(n)) => (i + 1, n + 1),
            _ => return false,
        };
        out.push_str(&format!("{} :\n\t ", self.grm.prod_name(p)));
        for &eidx in exps {
            out.push_str(&format!(" {}", self.rule_symbol(eidx)));
        }
        out.push_str(&format!(
            "\n\t    {{ $$ = ${};\n\t      $$->set_id(${});\n\t      instances.push_back($$);\n\t    }}\n\t;\n\n",
            inst_pos, id_pos
        ));
        true
    }

    fn emit_list_rule(&self, p: PIdx<u32>, has_comma: bool, out: &mut String) {
        let name = self.grm.prod_name(p);
        let item = self.grm.def_exps(self.grm.prod_defs(p)[0])[0];
        let item_lexeme = self.grm.exp(item).lexeme.clone();
        let list_type = list_cpp_type(self.grm, p);
        let item_sym = self.rule_symbol(item);
        let tail_pos = if has_comma { 3 } else { 2 };
        out.push_str(&format!("{} :\n", name));
        if is_instance_ref(self.grm, item) {
            out.push_str("\t  instanceId\n");
            out.push_str(&format!("\t    {{ $$ = new {};\n", list_type));
            out.push_str("\t      $$->push_back(0);\n");
            out.push_str(&format!("\t      {}_refs.push_back(&($$->back()));\n", item_lexeme));
            out.push_str(&format!("\t      {}_nums.push_back($1->get_val());\n", item_lexeme));
            out.push_str("\t      delete $1;\n\t    }\n");
            out.push_str(&format!(
                "\t| {}{} instanceId\n",
                name,
                if has_comma { " C" } else { "" }
            ));
            out.push_str("\t    { $$ = $1;\n\t      $$->push_back(0);\n");
            out.push_str(&format!("\t      {}_refs.push_back(&($$->back()));\n", item_lexeme));
            out.push_str(&format!(
                "\t      {}_nums.push_back(${}->get_val());\n",
                item_lexeme, tail_pos
            ));
            out.push_str(&format!("\t      delete ${};\n\t    }}\n\t;\n\n", tail_pos));
        } else {
            out.push_str(&format!("\t  {}\n", item_sym));
            out.push_str(&format!(
                "\t    {{ $$ = new {};\n\t      $$->push_back($1);\n\t    }}\n",
                list_type
            ));
            out.push_str(&format!(
                "\t| {}{} {}\n",
                name,
                if has_comma { " C" } else { "" },
                item_sym
            ));
            out.push_str(&format!(
                "\t    {{ $$ = $1;\n\t      $$->push_back(${});\n\t    }}\n\t;\n\n",
                tail_pos
            ));
        }
    }

    /// An optional whose child carries an instance id: build a throwaway
    /// child to ferry the id, or null for `$`.
    fn emit_opt_instance_rule(&self, p: PIdx<u32>, out: &mut String) {
        let transfer = self.grm.transfer_name(p).unwrap();
        out.push_str(&format!("{} :\n", self.grm.prod_name(p)));
        out.push_str("\t  instanceId\n");
        out.push_str(&format!(
            "\t    {{ $$ = new {}();\n\t      $$->set_id($1);\n\t    }}\n",
            transfer
        ));
        out.push_str("\t| DOLLAR\n\t    { $$ = 0; }\n\t;\n\n");
    }

    fn emit_opt_other_rule(&self, p: PIdx<u32>, out: &mut String) {
        let child = self.grm.opt_peer(p).unwrap();
        out.push_str(&format!("{} :\n", self.grm.prod_name(p)));
        out.push_str(&format!("\t  {}\n\t    {{ $$ = $1; }}\n", self.grm.prod_name(child)));
        out.push_str("\t| DOLLAR\n\t    { $$ = 0; }\n\t;\n\n");
    }

    fn emit_supertype_rule(&self, p: PIdx<u32>, out: &mut String) {
        out.push_str(&format!("{} :\n", self.grm.prod_name(p)));
        for (k, &didx) in self.grm.prod_defs(p).iter().enumerate() {
            let sub = self.grm.def_exps(didx)[0];
            out.push_str(&format!(
                "\t{} {}\n\t    {{ $$ = $1; }}\n",
                if k == 0 { " " } else { "|" },
                self.grm.exp(sub).lexeme
            ));
        }
        out.push_str("\t;\n\n");
    }

    fn emit_plain_rule(&self, p: PIdx<u32>, out: &mut String) {
        let name = self.grm.prod_name(p);
        let full = self.grm.full_att_names(p);
        out.push_str(&format!("{} :\n", name));
        for (k, &didx) in self.grm.prod_defs(p).iter().enumerate() {
            let exps = self.grm.def_exps(didx);
            out.push_str(if k == 0 { "\t " } else { "\t|" });
            if exps.is_empty() {
                out.push_str("  /* empty */");
            }
            for &eidx in exps {
                out.push_str(&format!(" {}", self.rule_symbol(eidx)));
            }
            out.push('\n');
            self.emit_plain_action(p, exps, full, out);
        }
        out.push_str("\t;\n\n");
    }

    fn emit_plain_action(
        &self,
        p: PIdx<u32>,
        exps: &[EIdx<u32>],
        full: &[String],
        out: &mut String,
    ) {
        let atts = attribute_positions(self.grm, exps);
        // Constructor arguments, one per attribute of the full list; null
        // for instance references (patched by linkAll) and for attributes a
        // shorter alternative doesn't carry.
        let mut args = Vec::with_capacity(full.len());
        for k in 0..full.len() {
            match atts.get(k) {
                Some(&eidx) => {
                    let n = exps.iter().position(|&e| e == eidx).unwrap() + 1;
                    if is_instance_ref(self.grm, eidx)
                        && self.optional_instance_child(eidx).is_none()
                    {
                        args.push("0".to_string());
                    } else {
                        args.push(format!("${}", n));
                    }
                }
                None => args.push("0".to_string()),
            }
        }
        out.push_str(&format!("\t    {{ $$ = new {}({});", self.grm.prod_name(p), args.join(", ")));
        for (k, &eidx) in atts.iter().enumerate() {
            let att = match full.get(k) {
                Some(a) => a,
                None => break,
            };
            let n = exps.iter().position(|&e| e == eidx).unwrap() + 1;
            if let Some(child) = self.optional_instance_child(eidx) {
                let child_name = self.grm.prod_name(child);
                out.push_str(&format!("\n\t      if (${})\n\t\t{{\n", n));
                out.push_str(&format!("\t\t  $$->set_{}(0);\n", att));
                out.push_str(&format!("\t\t  {}_refs.push_back(&($$->{}));\n", child_name, att));
                out.push_str(&format!(
                    "\t\t  {}_nums.push_back(${}->get_id()->get_val());\n",
                    child_name, n
                ));
                out.push_str(&format!("\t\t  delete ${}->get_id();\n", n));
                out.push_str(&format!("\t\t  delete ${};\n\t\t}}", n));
            } else if is_instance_ref(self.grm, eidx) {
                let target = &self.grm.exp(eidx).lexeme;
                out.push_str(&format!("\n\t      {}_refs.push_back(&($$->{}));\n", target, att));
                out.push_str(&format!("\t      {}_nums.push_back(${}->get_val());\n", target, n));
                out.push_str(&format!("\t      delete ${};", n));
            }
        }
        out.push_str("\n\t    }\n");
    }

    /// If `eidx` references an optional parent whose child carries an
    /// instance id, the child production.
    fn optional_instance_child(&self, eidx: EIdx<u32>) -> Option<PIdx<u32>> {
        let target = self.grm.exp(eidx).prod?;
        if self.grm.optional_role(target) == OptionalRole::ParentOfInstanceOrSupertype {
            self.grm.opt_peer(target)
        } else {
            None
        }
    }

    fn emit_epilogue(&self, out: &mut String) {
        out.push_str(
            "\nint yyerror(\n char * s)\n{\n  if (lexMessage[0])\n    {\n      fprintf(stderr, \"Error: %s\\n\", lexMessage);\n      lexMessage[0] = 0;\n    }\n  else\n    fprintf(stderr, \"Error: %s\\n\", s);\n  fprintf(stderr, \"%s\\n\", lineText);\n  return 0;\n}\n",
        );
        out.push_str(
            "\ninstance * findInstance(\n int idNum)\n{\n  std::list<instance *>::iterator iter;\n\n  for (iter = instances.begin(); iter != instances.end(); iter++)\n    {\n      if ((*iter)->get_id()->get_val() == idNum)\n        return *iter;\n    }\n  return 0;\n}\n",
        );
        out.push_str("\nvoid linkAll()\n{\n");
        for target in self.link_targets() {
            out.push_str(&format!(
                "  {{\n    std::list<{} **>::iterator refIter;\n    std::list<int>::iterator numIter;\n\n",
                target
            ));
            out.push_str(&format!(
                "    for (refIter = {}_refs.begin(), numIter = {}_nums.begin();\n         refIter != {}_refs.end();\n         refIter++, numIter++)\n",
                target, target, target
            ));
            out.push_str(&format!(
                "      *(*refIter) = dynamic_cast<{} *>(findInstance(*numIter));\n  }}\n",
                target
            ));
        }
        out.push_str("}\n");
    }
}
