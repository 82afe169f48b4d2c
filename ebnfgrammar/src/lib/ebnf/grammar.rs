use std::collections::HashMap;

use num_traits::{self, AsPrimitive, PrimInt, Unsigned};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use vob::Vob;

use super::{
    ast::EbnfAST,
    parser::{self, EbnfParser},
    EbnfGrammarError, EbnfGrammarErrorKind, ExprKind, ListKind, OptionalRole,
};
use crate::{
    nametable::{ClassNames, KeywordNames, TerminalNames},
    DIdx, EIdx, PIdx, Span,
};

/// The distinguished root of the instance lattice.
pub const INSTANCE: &str = "instance";
/// The auxiliary production pairing an `#N` identifier with an instance; it
/// is never given a class of its own.
pub const INSTANCE_PLUS: &str = "instancePlus";

/// One expression occurrence on a right-hand side. Occurrences are not
/// shared, with a single exception: every use of the comma alias `c` is the
/// same expression, index 0.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Expr<StorageT> {
    pub kind: ExprKind,
    pub lexeme: String,
    /// Filled during binding for `NonTerminal` and `Terminal` expressions
    /// whose lexeme names a production; `None` otherwise. Non-owning: the
    /// grammar owns the production.
    pub prod: Option<PIdx<StorageT>>,
}

/// Representation of an analyzed EBNF grammar. See the
/// [top-level documentation](../../index.html) for the guarantees this struct
/// makes about productions, definitions, and expressions.
///
/// All derived per-production facts start at their neutral value and are
/// filled by the analysis passes, which run in a fixed order (binding and
/// list classification at construction, then spelling refinement, attribute
/// input, supertype classification, ancestors, `beInstance`, optionals, full
/// attribute names, own expressions).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EbnfGrammar<StorageT = u32> {
    /// How many productions does this grammar have?
    pub(crate) prods_len: PIdx<StorageT>,
    /// A mapping from `PIdx` -> `(name, Span)`.
    pub(crate) prod_names: Vec<(String, Span)>,
    /// A mapping from a production name to its `PIdx`.
    pub(crate) prod_map: HashMap<String, PIdx<StorageT>>,
    /// A mapping from `PIdx` -> the `DIdx`s of its definitions, in file
    /// order.
    pub(crate) prod_defs: Vec<Vec<DIdx<StorageT>>>,
    /// A mapping from `DIdx` -> the `EIdx`s of its expressions, in file
    /// order.
    pub(crate) def_exps: Vec<Vec<EIdx<StorageT>>>,
    /// All expressions. Index 0 is the shared comma.
    pub(crate) exps: Vec<Expr<StorageT>>,
    /// A mapping from `PIdx` -> whether (and how) the production encodes a
    /// list.
    pub(crate) list_kinds: Vec<ListKind>,
    /// A mapping from `PIdx` -> whether the production is a supertype.
    pub(crate) supertypes: Vec<bool>,
    /// A mapping from `PIdx` -> whether the production is an immediate
    /// subtype of `instance`.
    pub(crate) instances: Vec<bool>,
    /// A mapping from `PIdx` -> the first instance production this one is an
    /// ancestor of, if any. An instance production's own entry stays `None`.
    pub(crate) be_instances: Vec<Option<PIdx<StorageT>>>,
    /// A mapping from `PIdx` -> the production's role in an optional
    /// pairing.
    pub(crate) opt_roles: Vec<OptionalRole>,
    /// A mapping from `PIdx` -> the other half of the optional pairing: the
    /// child for a parent, the parent for a child.
    pub(crate) opt_peers: Vec<Option<PIdx<StorageT>>>,
    /// A mapping from `PIdx` -> the production's immediate supertypes, in
    /// the order they were discovered.
    pub(crate) subtype_ofs: Vec<Vec<PIdx<StorageT>>>,
    /// A mapping from `PIdx` -> all the production's ancestors in
    /// first-encounter depth-first order, excluding optional parents and
    /// `instance`.
    pub(crate) ancestor_sets: Vec<Vec<PIdx<StorageT>>>,
    /// A mapping from `PIdx` -> the production's own (non-inherited)
    /// attribute names, from the attribute-comment block.
    pub(crate) own_att_names: Vec<Vec<String>>,
    /// A mapping from `PIdx` -> the production's full attribute list
    /// (inherited then own), either computed over the lattice or given
    /// explicitly in the attribute-comment block.
    pub(crate) full_att_names: Vec<Vec<String>>,
    /// A mapping from `PIdx` -> the expressions aligned positionally with
    /// the production's own attribute names.
    pub(crate) own_exps: Vec<Vec<EIdx<StorageT>>>,
    /// A mapping from `PIdx` -> for an optional parent, the instance
    /// production used to ferry an identifier across the optional position.
    pub(crate) transfer_names: Vec<Option<PIdx<StorageT>>>,
    pub(crate) keywords: KeywordNames,
    pub(crate) terminals: TerminalNames,
    /// Populated from the emittable set just before emission.
    pub(crate) classes: ClassNames,
}

impl EbnfGrammar<u32> {
    /// Parse and fully analyze the EBNF grammar `s`, which must also carry
    /// the attribute-comment block.
    pub fn new(s: &str) -> Result<Self, EbnfGrammarError> {
        EbnfGrammar::new_with_storaget(s)
    }
}

impl<StorageT: 'static + PrimInt + Unsigned> EbnfGrammar<StorageT>
where
    usize: AsPrimitive<StorageT>,
{
    /// As [`EbnfGrammar::new`], but with a user-chosen storage type for the
    /// index newtypes.
    pub fn new_with_storaget(s: &str) -> Result<Self, EbnfGrammarError> {
        let mut ep = EbnfParser::new(s);
        ep.parse()?;
        let mut grm = EbnfGrammar::from_ast(ep.build());
        grm.analyze(s)?;
        Ok(grm)
    }

    /// Turn an AST into the indexed grammar: allocate stable indices, bind
    /// every non-terminal and terminal reference to the production it names
    /// (self-references included), and classify list shapes.
    pub(crate) fn from_ast(ast: EbnfAST) -> Self {
        // The index newtypes widen back to usize unchecked, so every count
        // must fit StorageT before the first index is built.
        if ast.prods.len() > num_traits::cast(StorageT::max_value()).unwrap() {
            panic!("grammar has more productions than StorageT can index");
        }
        let num_defs = ast.prods.values().map(|p| p.defs.len()).sum::<usize>();
        if num_defs > num_traits::cast(StorageT::max_value()).unwrap() {
            panic!("grammar has more definitions than StorageT can index");
        }
        let num_exps = ast
            .prods
            .values()
            .flat_map(|p| p.defs.iter())
            .map(|d| d.len())
            .sum::<usize>();
        // One extra slot: the shared comma is expression 0.
        if num_exps >= num_traits::cast(StorageT::max_value()).unwrap() {
            panic!("grammar has more expressions than StorageT can index");
        }

        let plen = ast.prods.len();
        let mut prod_names = Vec::with_capacity(plen);
        let mut prod_map = HashMap::with_capacity(plen);
        for (i, prod) in ast.prods.values().enumerate() {
            prod_names.push(prod.name.clone());
            prod_map.insert(prod.name.0.clone(), PIdx(i.as_()));
        }

        let mut prod_defs = Vec::with_capacity(plen);
        let mut def_exps = Vec::new();
        let mut exps = vec![Expr {
            kind: ExprKind::Comma,
            lexeme: "c".to_string(),
            prod: None,
        }];
        for prod in ast.prods.values() {
            let mut didxs = Vec::with_capacity(prod.defs.len());
            for def in &prod.defs {
                let mut eidxs = Vec::with_capacity(def.len());
                for astexp in def {
                    if astexp.kind == ExprKind::Comma {
                        eidxs.push(EIdx(0usize.as_()));
                        continue;
                    }
                    let prod_ref = match astexp.kind {
                        ExprKind::NonTerminal | ExprKind::Terminal => {
                            prod_map.get(astexp.lexeme.as_str()).copied()
                        }
                        _ => None,
                    };
                    eidxs.push(EIdx(exps.len().as_()));
                    exps.push(Expr {
                        kind: astexp.kind,
                        lexeme: astexp.lexeme.clone(),
                        prod: prod_ref,
                    });
                }
                didxs.push(DIdx(def_exps.len().as_()));
                def_exps.push(eidxs);
            }
            prod_defs.push(didxs);
        }

        let mut grm = EbnfGrammar {
            prods_len: PIdx(plen.as_()),
            prod_names,
            prod_map,
            prod_defs,
            def_exps,
            exps,
            list_kinds: vec![ListKind::None; plen],
            supertypes: vec![false; plen],
            instances: vec![false; plen],
            be_instances: vec![None; plen],
            opt_roles: vec![OptionalRole::None; plen],
            opt_peers: vec![None; plen],
            subtype_ofs: vec![Vec::new(); plen],
            ancestor_sets: vec![Vec::new(); plen],
            own_att_names: vec![Vec::new(); plen],
            full_att_names: vec![Vec::new(); plen],
            own_exps: vec![Vec::new(); plen],
            transfer_names: vec![None; plen],
            keywords: ast.keywords,
            terminals: ast.terminals,
            classes: ClassNames::new(),
        };
        for i in 0..plen {
            let kind = grm.classify_list(PIdx(i.as_()));
            grm.list_kinds[i] = kind;
        }
        grm
    }

    /// Run the analysis passes, in their required order, over a freshly
    /// constructed grammar. `src` is re-scanned for the attribute-comment
    /// block.
    pub(crate) fn analyze(&mut self, src: &str) -> Result<(), EbnfGrammarError> {
        self.refine_spelling()?;
        self.read_own_attributes(src)?;
        self.find_supertypes();
        self.find_all_ancestors();
        self.find_be_instance();
        self.find_optionals()?;
        self.find_full_att_names();
        self.find_own_exps()
    }

    /// Decide whether production `pidx` encodes a left-recursive list: two
    /// definitions, the first a single expression (the list item), the
    /// second starting with the production's own name and ending with the
    /// list item, with optionally the comma alias between them.
    fn classify_list(&self, pidx: PIdx<StorageT>) -> ListKind {
        let defs = &self.prod_defs[usize::from(pidx)];
        if defs.len() != 2 {
            return ListKind::None;
        }
        let d1 = &self.def_exps[usize::from(defs[0])];
        let d2 = &self.def_exps[usize::from(defs[1])];
        if d1.len() != 1 || !(d2.len() == 2 || d2.len() == 3) {
            return ListKind::None;
        }
        if self.exp(d2[0]).lexeme != self.prod_names[usize::from(pidx)].0 {
            return ListKind::None;
        }
        if self.exp(*d2.last().unwrap()).lexeme != self.exp(d1[0]).lexeme {
            return ListKind::None;
        }
        if d2.len() == 3 {
            if self.exp(d2[1]).kind == ExprKind::Comma {
                ListKind::CommaSeparated
            } else {
                ListKind::None
            }
        } else {
            ListKind::Plain
        }
    }

    /// Replace the implicit spelling of each keyword that the grammar
    /// respells explicitly. A production whose left-hand side is a keyword
    /// name is a spelling directive: its single definition must consist
    /// entirely of `OneChar` and `TwoChar` expressions, whose first
    /// characters concatenate to the lexeme the generated lexer should
    /// match.
    pub(crate) fn refine_spelling(&mut self) -> Result<(), EbnfGrammarError> {
        for i in 0..usize::from(self.prods_len) {
            let found = self.keywords.find(&self.prod_names[i].0);
            let (bucket, pos) = match found {
                Some(x) => x,
                None => continue,
            };
            let defs = &self.prod_defs[i];
            if defs.len() != 1 {
                return Err(EbnfGrammarError::new(EbnfGrammarErrorKind::BadTokenSpelling));
            }
            let mut lexeme = String::new();
            for &eidx in &self.def_exps[usize::from(defs[0])] {
                let exp = &self.exps[usize::from(eidx)];
                match exp.kind {
                    // A TwoChar is an upper/lower pair of one letter; the
                    // letter itself is the spelling.
                    ExprKind::OneChar | ExprKind::TwoChar => {
                        lexeme.push(exp.lexeme.chars().next().unwrap())
                    }
                    _ => {
                        return Err(EbnfGrammarError::new(
                            EbnfGrammarErrorKind::BadTokenSpelling,
                        ));
                    }
                }
            }
            self.keywords.set_lexeme(bucket, pos, lexeme);
        }
        Ok(())
    }

    /// Apply the attribute-comment block: set each named production's own
    /// attribute names, and, where a second colon was given, its full
    /// attribute list verbatim.
    pub(crate) fn read_own_attributes(&mut self, src: &str) -> Result<(), EbnfGrammarError> {
        for line in parser::parse_attribute_comments(src)? {
            let pidx = match self.prod_map.get(line.prod_name.as_str()) {
                Some(&pidx) => pidx,
                None => {
                    return Err(EbnfGrammarError::new(
                        EbnfGrammarErrorKind::UnknownAttributeProduction(line.prod_name),
                    ));
                }
            };
            self.own_att_names[usize::from(pidx)].extend(line.own);
            if let Some(full) = line.full {
                self.full_att_names[usize::from(pidx)].extend(full);
            }
        }
        Ok(())
    }

    /// Is `pidx` one of the productions the class emitter prints? Excluded:
    /// terminal names, keyword names (spelling directives), lists,
    /// `instancePlus`, and optional parents.
    pub fn is_emittable(&self, pidx: PIdx<StorageT>) -> bool {
        let i = usize::from(pidx);
        let name = self.prod_names[i].0.as_str();
        !(self.terminals.contains(name)
            || self.keywords.contains(name)
            || self.list_kinds[i] != ListKind::None
            || name == INSTANCE_PLUS
            || matches!(
                self.opt_roles[i],
                OptionalRole::ParentOfInstanceOrSupertype | OptionalRole::ParentOfOther
            ))
    }

    /// Compute the order in which classes must be emitted: every direct
    /// supertype before its subtypes, and `instance` before any instance
    /// production. Also populates the class-name table and checks that every
    /// non-terminal reference in a retained production resolved.
    ///
    /// Fails with "loop found in productions" if the supertype graph is
    /// cyclic.
    pub fn emit_order(&mut self) -> Result<Vec<PIdx<StorageT>>, EbnfGrammarError> {
        for eidxs in &self.def_exps {
            for &eidx in eidxs {
                let exp = &self.exps[usize::from(eidx)];
                if exp.kind == ExprKind::NonTerminal && exp.prod.is_none() {
                    return Err(EbnfGrammarError::new(
                        EbnfGrammarErrorKind::UndefinedNonTerminal(exp.lexeme.clone()),
                    ));
                }
            }
        }
        let to_print = self
            .iter_pidxs()
            .filter(|&p| self.is_emittable(p))
            .collect::<Vec<_>>();
        for &p in &to_print {
            let name = self.prod_names[usize::from(p)].0.clone();
            self.classes.record(&name)?;
        }
        let instance_pidx = self.prod_map.get(INSTANCE).copied();
        let mut emitted = Vob::from_elem(false, usize::from(self.prods_len));
        let mut order = Vec::with_capacity(to_print.len());
        for _ in 0..to_print.len() {
            let mut progressed = false;
            for &p in &to_print {
                let i = usize::from(p);
                if emitted[i] {
                    continue;
                }
                if self.instances[i]
                    && !instance_pidx.is_some_and(|ip| emitted[usize::from(ip)])
                {
                    continue;
                }
                if self.subtype_ofs[i].iter().any(|&s| !emitted[usize::from(s)]) {
                    continue;
                }
                emitted.set(i, true);
                order.push(p);
                progressed = true;
            }
            if !progressed || order.len() == to_print.len() {
                break;
            }
        }
        if order.len() != to_print.len() {
            return Err(EbnfGrammarError::new(EbnfGrammarErrorKind::ProductionLoop));
        }
        Ok(order)
    }

    /// How many productions does this grammar have?
    pub fn prods_len(&self) -> PIdx<StorageT> {
        self.prods_len
    }

    /// Return an iterator which produces (in order from `0..self.prods_len()`)
    /// all this grammar's valid `PIdx`s.
    pub fn iter_pidxs(&self) -> impl Iterator<Item = PIdx<StorageT>> {
        (0..usize::from(self.prods_len)).map(|x| PIdx(x.as_()))
    }

    /// Get the name of production `pidx`. Panics if `pidx` doesn't exist.
    pub fn prod_name(&self, pidx: PIdx<StorageT>) -> &str {
        &self.prod_names[usize::from(pidx)].0
    }

    /// Return the `PIdx` of the production named `name`, if it exists.
    pub fn pidx(&self, name: &str) -> Option<PIdx<StorageT>> {
        self.prod_map.get(name).copied()
    }

    /// Get the definitions of production `pidx`, in file order.
    pub fn prod_defs(&self, pidx: PIdx<StorageT>) -> &[DIdx<StorageT>] {
        &self.prod_defs[usize::from(pidx)]
    }

    /// Get the expressions of definition `didx`, in file order.
    pub fn def_exps(&self, didx: DIdx<StorageT>) -> &[EIdx<StorageT>] {
        &self.def_exps[usize::from(didx)]
    }

    /// Get expression `eidx`.
    pub fn exp(&self, eidx: EIdx<StorageT>) -> &Expr<StorageT> {
        &self.exps[usize::from(eidx)]
    }

    /// The index of the shared comma expression.
    pub fn comma(&self) -> EIdx<StorageT> {
        EIdx(0usize.as_())
    }

    pub fn list_kind(&self, pidx: PIdx<StorageT>) -> ListKind {
        self.list_kinds[usize::from(pidx)]
    }

    pub fn is_supertype(&self, pidx: PIdx<StorageT>) -> bool {
        self.supertypes[usize::from(pidx)]
    }

    pub fn is_instance(&self, pidx: PIdx<StorageT>) -> bool {
        self.instances[usize::from(pidx)]
    }

    /// If `pidx` is the ancestor of an instance production, one such
    /// production (what matters to most callers is `is_some()`; the value is
    /// only used when an optional is being handled). Always `None` for a
    /// production that is itself an instance.
    pub fn be_instance(&self, pidx: PIdx<StorageT>) -> Option<PIdx<StorageT>> {
        self.be_instances[usize::from(pidx)]
    }

    pub fn optional_role(&self, pidx: PIdx<StorageT>) -> OptionalRole {
        self.opt_roles[usize::from(pidx)]
    }

    /// For an optional parent, its child; for an optional child, its parent.
    pub fn opt_peer(&self, pidx: PIdx<StorageT>) -> Option<PIdx<StorageT>> {
        self.opt_peers[usize::from(pidx)]
    }

    /// For an optional parent, the instance production used to carry an
    /// identifier across the optional position.
    pub fn transfer_name(&self, pidx: PIdx<StorageT>) -> Option<&str> {
        self.transfer_names[usize::from(pidx)].map(|p| self.prod_name(p))
    }

    /// The immediate supertypes of `pidx`.
    pub fn subtype_of(&self, pidx: PIdx<StorageT>) -> &[PIdx<StorageT>] {
        &self.subtype_ofs[usize::from(pidx)]
    }

    /// All ancestors of `pidx` in first-encounter depth-first order,
    /// excluding optional parents and `instance`.
    pub fn ancestors(&self, pidx: PIdx<StorageT>) -> &[PIdx<StorageT>] {
        &self.ancestor_sets[usize::from(pidx)]
    }

    /// The production's own (non-inherited) attribute names.
    pub fn own_att_names(&self, pidx: PIdx<StorageT>) -> &[String] {
        &self.own_att_names[usize::from(pidx)]
    }

    /// The production's full attribute list: inherited attributes in lattice
    /// order, then its own.
    pub fn full_att_names(&self, pidx: PIdx<StorageT>) -> &[String] {
        &self.full_att_names[usize::from(pidx)]
    }

    /// The expressions aligned positionally with
    /// [`own_att_names`](Self::own_att_names).
    pub fn own_exps(&self, pidx: PIdx<StorageT>) -> &[EIdx<StorageT>] {
        &self.own_exps[usize::from(pidx)]
    }

    pub fn keywords(&self) -> &KeywordNames {
        &self.keywords
    }

    pub fn terminals(&self) -> &TerminalNames {
        &self.terminals
    }

    /// The class-name table; populated by [`emit_order`](Self::emit_order).
    pub fn class_names(&self) -> &ClassNames {
        &self.classes
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;

    /// Build a grammar from `s`, appending an empty attribute block if the
    /// source doesn't carry one.
    pub(crate) fn grm(s: &str) -> EbnfGrammar<u32> {
        try_grm(s).unwrap()
    }

    pub(crate) fn try_grm(s: &str) -> Result<EbnfGrammar<u32>, EbnfGrammarError> {
        let mut src = s.to_string();
        if !src.contains("Start attributes") {
            src.push_str("\n(* Start attributes *)\n(* End attributes *)\n");
        }
        EbnfGrammar::new(&src)
    }

    pub(crate) fn grm_err(s: &str) -> EbnfGrammarErrorKind {
        match try_grm(s) {
            Err(e) => e.kind,
            Ok(_) => panic!("analyzed without error"),
        }
    }

    #[test]
    fn test_zero_productions() {
        let g = grm("");
        assert_eq!(usize::from(g.prods_len()), 0);
        let mut g = g;
        assert!(g.emit_order().unwrap().is_empty());
    }

    #[test]
    fn test_binding_including_self_references() {
        let g = grm("xs = x | xs , x ;\nx = X ;");
        let xs = g.pidx("xs").unwrap();
        let x = g.pidx("x").unwrap();
        let d2 = g.def_exps(g.prod_defs(xs)[1]);
        assert_eq!(g.exp(d2[0]).prod, Some(xs));
        assert_eq!(g.exp(d2[1]).prod, Some(x));
    }

    #[test]
    fn test_comma_expressions_are_identical() {
        let g = grm(
            "c = ',' ;\n\
             pair = a , c , b , c , a ;\n\
             a = A ;\n\
             b = B ;",
        );
        let pair = g.pidx("pair").unwrap();
        let exps = g.def_exps(g.prod_defs(pair)[0]);
        assert_eq!(exps[1], g.comma());
        assert_eq!(exps[3], g.comma());
        assert!(g.pidx("c").is_none());
        assert!(g.keywords().contains("C"));
    }

    #[test]
    fn test_list_kinds() {
        let g = grm(
            "c = ',' ;\n\
             intList = intVal | intList , c , intVal ;\n\
             xs = x | xs , x ;\n\
             notAList = x | xs , x , x ;\n\
             x = X ;\n\
             intVal = INTSTRING ;",
        );
        assert_eq!(g.list_kind(g.pidx("intList").unwrap()), ListKind::CommaSeparated);
        assert_eq!(g.list_kind(g.pidx("xs").unwrap()), ListKind::Plain);
        assert_eq!(g.list_kind(g.pidx("notAList").unwrap()), ListKind::None);
        assert_eq!(g.list_kind(g.pidx("x").unwrap()), ListKind::None);
    }

    #[test]
    fn test_spelling_refinement() {
        let g = grm(
            "plane = AXIS2PLACEMENT3D ;\n\
             AXIS2PLACEMENT3D = 'Aa','Xx','Ii','Ss','2','_','Pp','Ll','Aa','Cc','Ee','Mm','Ee','Nn','Tt','_','3','Dd' ;",
        );
        assert_eq!(g.keywords().lexeme("AXIS2PLACEMENT3D"), Some("AXIS2_PLACEMENT_3D"));
    }

    #[test]
    fn test_bad_spelling() {
        assert_eq!(
            grm_err("plane = ENDSEC ;\nENDSEC = 'Ee', nope ;"),
            EbnfGrammarErrorKind::BadTokenSpelling
        );
        assert_eq!(
            grm_err("plane = ENDSEC ;\nENDSEC = 'Ee' | 'Ss' ;"),
            EbnfGrammarErrorKind::BadTokenSpelling
        );
    }

    #[test]
    fn test_selection() {
        let mut g = grm(
            "c = ',' ;\n\
             workplan = WORKPLAN , '(' , elementList , ')' ;\n\
             elementList = element | elementList , c , element ;\n\
             element = ELEMENT ;\n\
             optElement = element | '$' ;\n\
             WORKPLAN = 'Ww','Oo','Rr','Kk','Pp','Ll','Aa','Nn' ;\n\
             (* Start attributes *)\n\
             (* workplan : itsElements *)\n\
             (* End attributes *)\n",
        );
        let order = g.emit_order().unwrap();
        let names = order.iter().map(|&p| g.prod_name(p)).collect::<Vec<_>>();
        // Lists, optional parents, and keyword-spelling directives get no
        // class.
        assert_eq!(names, vec!["workplan", "element"]);
        assert!(g.class_names().contains("workplan"));
        assert!(!g.class_names().contains("elementList"));
    }

    #[test]
    fn test_emit_order_supertypes_first() {
        let mut g = grm(
            "instance = plane | direction ;\n\
             geometricRepresentationItem = plane ;\n\
             plane = PLANE ;\n\
             direction = DIRECTION ;",
        );
        let order = g.emit_order().unwrap();
        let names = order.iter().map(|&p| g.prod_name(p)).collect::<Vec<_>>();
        let pos = |n: &str| names.iter().position(|m| *m == n).unwrap();
        assert!(pos("instance") < pos("plane"));
        assert!(pos("geometricRepresentationItem") < pos("plane"));
        assert!(pos("instance") < pos("direction"));
    }

    #[test]
    fn test_supertype_cycle_is_fatal() {
        let mut g = grm("a = b ;\nb = a ;");
        assert_eq!(
            g.emit_order().unwrap_err().kind,
            EbnfGrammarErrorKind::ProductionLoop
        );
    }

    #[test]
    fn test_undefined_nonterminal() {
        let mut g = grm("a = A , '(' , missing , ')' ;");
        match g.emit_order().unwrap_err().kind {
            EbnfGrammarErrorKind::UndefinedNonTerminal(name) => assert_eq!(name, "missing"),
            k => panic!("wrong error {:?}", k),
        }
    }

    #[test]
    fn test_analysis_is_idempotent_over_input() {
        let src = "\
c = ',' ;
instance = plane ;
plane = PLANE , '(' , CHARSTRING , ')' ;
(* Start attributes *)
(* plane : name *)
(* End attributes *)
";
        let mut a = EbnfGrammar::<u32>::new(src).unwrap();
        let mut b = EbnfGrammar::<u32>::new(src).unwrap();
        assert_eq!(a.emit_order().unwrap(), b.emit_order().unwrap());
        let plane_a = a.pidx("plane").unwrap();
        let plane_b = b.pidx("plane").unwrap();
        assert_eq!(a.full_att_names(plane_a), b.full_att_names(plane_b));
        assert_eq!(a.own_exps(plane_a), b.own_exps(plane_b));
    }
}
