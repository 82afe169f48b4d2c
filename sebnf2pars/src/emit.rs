//! Helpers shared by the three emitter back ends. The emitters consume only
//! the analyzed model: per-production list kinds, roles, lattice facts, and
//! the aligned attribute names and expressions.

use ebnfgrammar::{
    ebnf::{grammar::INSTANCE_PLUS, EbnfGrammar, ExprKind, ListKind, OptionalRole},
    EIdx, PIdx,
};

/// The token the generated Yacc file uses for a one-character literal.
pub fn onechar_token(c: char) -> Option<&'static str> {
    match c {
        '$' => Some("DOLLAR"),
        ',' => Some("C"),
        ':' => Some("COLON"),
        '=' => Some("EQUALS"),
        '[' => Some("LBOX"),
        '(' => Some("LPAREN"),
        ']' => Some("RBOX"),
        ')' => Some("RPAREN"),
        ';' => Some("SEMICOLON"),
        '#' => Some("SHARP"),
        '/' => Some("SLASH"),
        _ => None,
    }
}

/// Does this expression stand for an instance reference in a Part 21 file
/// (and so parse as an `instanceId`)?
pub fn is_instance_ref(grm: &EbnfGrammar<u32>, eidx: EIdx<u32>) -> bool {
    match grm.exp(eidx).prod {
        Some(p) => grm.is_instance(p) || grm.be_instance(p).is_some(),
        None => false,
    }
}

/// The name of the element type of a list production: the sole expression of
/// its first definition, with the value-carrying terminals mapped to plain
/// C++ types and `instancePlus` to `instance`.
pub fn list_item_type(grm: &EbnfGrammar<u32>, list: PIdx<u32>) -> String {
    let item = grm.def_exps(grm.prod_defs(list)[0])[0];
    let lexeme = grm.exp(item).lexeme.as_str();
    match lexeme {
        "CHARSTRING" => "char".to_string(),
        "INTSTRING" => "int".to_string(),
        "REALSTRING" => "double".to_string(),
        INSTANCE_PLUS => "instance".to_string(),
        _ => lexeme.to_string(),
    }
}

/// The C++ container type a list production's value is built into. Strings
/// stay `char *` elements; ints and doubles are stored by value.
pub fn list_cpp_type(grm: &EbnfGrammar<u32>, list: PIdx<u32>) -> String {
    match list_item_type(grm, list).as_str() {
        "char" => "std::list<char *>".to_string(),
        "int" => "std::list<int>".to_string(),
        "double" => "std::list<double>".to_string(),
        item => format!("std::list<{} *>", item),
    }
}

/// The C++ type of the data member generated for an attribute-bearing
/// expression.
pub fn cpp_type(grm: &EbnfGrammar<u32>, eidx: EIdx<u32>) -> String {
    let exp = grm.exp(eidx);
    match exp.kind {
        ExprKind::Terminal => match exp.lexeme.as_str() {
            "INTSTRING" => "int".to_string(),
            "REALSTRING" => "double".to_string(),
            _ => "char *".to_string(),
        },
        _ => {
            let prod = match exp.prod {
                Some(p) => p,
                None => return "char *".to_string(),
            };
            if grm.list_kind(prod) != ListKind::None {
                format!("{} *", list_cpp_type(grm, prod))
            } else if matches!(
                grm.optional_role(prod),
                OptionalRole::ParentOfInstanceOrSupertype | OptionalRole::ParentOfOther
            ) {
                format!("{} *", grm.prod_name(grm.opt_peer(prod).unwrap()))
            } else {
                format!("{} *", exp.lexeme)
            }
        }
    }
}

/// How a printSelf body reads an attribute: directly if the class owns it,
/// through the accessor if a parent class does.
pub fn attribute_access(own: bool, att: &str) -> String {
    if own {
        att.to_string()
    } else {
        format!("get_{}()", att)
    }
}

/// The attribute-bearing expressions of a production's definition, in order.
pub fn attribute_positions(grm: &EbnfGrammar<u32>, exps: &[EIdx<u32>]) -> Vec<EIdx<u32>> {
    exps.iter()
        .copied()
        .filter(|&e| {
            matches!(
                grm.exp(e).kind,
                ExprKind::NonTerminal | ExprKind::Terminal
            )
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod test_support {
    use ebnfgrammar::{ebnf::EbnfGrammar, PIdx};

    /// A miniature Part 21 model exercising lists, optionals, instances,
    /// inheritance, and keyword respelling.
    pub(crate) const SMALL: &str = "\
c = ',' ;
inputFile = instanceList ;
instanceList = instancePlus | instanceList , instancePlus ;
instancePlus = instanceId , '=' , instance , ';' ;
instanceId = '#' , INTSTRING ;
instance = plane | axis2placement3d | direction ;
geometricRepresentationItem = plane ;
plane = PLANE , '(' , CHARSTRING , c , axis2placement3d , c , optDirection , ')' ;
axis2placement3d = AXIS2PLACEMENT3D , '(' , CHARSTRING , c , direction , ')' ;
direction = DIRECTION , '(' , CHARSTRING , c , parenRealList , ')' ;
parenRealList = '(' , realList , ')' ;
realList = REALSTRING | realList , c , REALSTRING ;
optDirection = direction | '$' ;
AXIS2PLACEMENT3D = 'Aa','Xx','Ii','Ss','2','_','Pp','Ll','Aa','Cc','Ee','Mm','Ee','Nn','Tt','_','3','Dd' ;
(* Start attributes *)
(* inputFile : itsInstances *)
(* instanceId : val *)
(* geometricRepresentationItem : name *)
(* plane : position refDirection *)
(* axis2placement3d : name axis *)
(* direction : name directionRatios *)
(* parenRealList : theList *)
(* End attributes *)
";

    pub(crate) fn analyzed() -> (EbnfGrammar<u32>, Vec<PIdx<u32>>) {
        let mut grm = EbnfGrammar::new(SMALL).unwrap();
        let order = grm.emit_order().unwrap();
        (grm, order)
    }
}

/// Map each attribute name of class `pidx` (its full list) to the expression
/// it is aligned with: own attributes from the production's own aligned
/// expressions, inherited ones from the ancestor that introduced them.
pub fn attribute_exprs(grm: &EbnfGrammar<u32>, pidx: PIdx<u32>) -> Vec<(String, Option<EIdx<u32>>)> {
    let mut out = Vec::new();
    for att in grm.full_att_names(pidx) {
        let mut found = None;
        let own = grm.own_att_names(pidx);
        if let Some(k) = own.iter().position(|a| a == att) {
            found = grm.own_exps(pidx).get(k).copied();
        } else {
            for &anc in grm.ancestors(pidx) {
                let anc_own = grm.own_att_names(anc);
                if let Some(k) = anc_own.iter().position(|a| a == att) {
                    found = grm.own_exps(anc).get(k).copied();
                    break;
                }
            }
        }
        out.push((att.clone(), found));
    }
    out
}
