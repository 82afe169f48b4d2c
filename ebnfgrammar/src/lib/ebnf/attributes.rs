//! The attribute passes: propagating full attribute lists down the
//! supertype lattice, and aligning each production's own attribute names
//! with the grammar expressions they correspond to.

use num_traits::{AsPrimitive, PrimInt, Unsigned};
use vob::Vob;

use super::{
    grammar::{EbnfGrammar, INSTANCE},
    EbnfGrammarError, EbnfGrammarErrorKind, ExprKind,
};
use crate::{EIdx, PIdx};

impl<StorageT: 'static + PrimInt + Unsigned> EbnfGrammar<StorageT>
where
    usize: AsPrimitive<StorageT>,
{
    /// Fill in the full attribute list of every production: for each
    /// production with no supertype (other than `instance`, which is
    /// skipped), its full list is its own list, and if it is a supertype its
    /// full list is pushed down the lattice as a prefix of each subtype's
    /// list. A full list given explicitly in the attribute-comment block is
    /// left untouched; that override is required when a subtype inherits
    /// from more than one attribute-bearing chain, because only the grammar
    /// author knows the order.
    pub(crate) fn find_full_att_names(&mut self) {
        let plen = usize::from(self.prods_len);
        let mut visited = Vob::from_elem(false, plen);
        for i in 0..plen {
            if self.prod_names[i].0 == INSTANCE || !self.subtype_ofs[i].is_empty() {
                continue;
            }
            if self.full_att_names[i].is_empty() {
                self.full_att_names[i] = self.own_att_names[i].clone();
            }
            if self.supertypes[i] {
                let front = self.full_att_names[i].clone();
                self.find_att_names_one(PIdx(i.as_()), &front, &mut visited);
            }
        }
    }

    /// For each subtype of the supertype `sup`, set its full attribute list
    /// to `front` followed by its own attributes, unless it already has one.
    /// A subtype reachable along more than one chain is written by the first
    /// traversal only; later traversals find its list non-empty (and would
    /// push the same prefix anyway).
    fn find_att_names_one(&mut self, sup: PIdx<StorageT>, front: &[String], visited: &mut Vob) {
        // For a supertype, each definition is a single expression whose
        // resolved production is a subtype.
        for k in 0..self.prod_defs[usize::from(sup)].len() {
            let didx = self.prod_defs[usize::from(sup)][k];
            let eidx = self.def_exps[usize::from(didx)][0];
            let sub = match self.exps[usize::from(eidx)].prod {
                Some(s) => s,
                None => continue,
            };
            let si = usize::from(sub);
            if self.full_att_names[si].is_empty() {
                let mut full = front.to_vec();
                full.extend(self.own_att_names[si].iter().cloned());
                self.full_att_names[si] = full;
            }
            if self.supertypes[si] && !visited[si] {
                visited.set(si, true);
                let sub_front = self.full_att_names[si].clone();
                self.find_att_names_one(sub, &sub_front, visited);
            }
        }
    }

    /// For every production with own attributes, find the expressions they
    /// correspond to.
    ///
    /// The expressions are taken from the first definition of the *source*
    /// production: the production itself if it is an instance, else the
    /// instance it is an ancestor of, else itself. Only `NonTerminal` and
    /// `Terminal` expressions correspond to attributes; walking the source's
    /// full attribute list and its attribute-bearing expressions in
    /// lockstep, the own attributes must appear as a contiguous run.
    pub(crate) fn find_own_exps(&mut self) -> Result<(), EbnfGrammarError> {
        for i in 0..usize::from(self.prods_len) {
            if self.own_att_names[i].is_empty() {
                continue;
            }
            let source = if self.instances[i] {
                PIdx(i.as_())
            } else if let Some(b) = self.be_instances[i] {
                b
            } else {
                PIdx(i.as_())
            };
            let si = usize::from(source);
            let first_def = self.prod_defs[si][0];
            let xs = self.def_exps[usize::from(first_def)]
                .iter()
                .copied()
                .filter(|&e| {
                    matches!(
                        self.exps[usize::from(e)].kind,
                        ExprKind::NonTerminal | ExprKind::Terminal
                    )
                })
                .collect::<Vec<EIdx<StorageT>>>();
            if xs.is_empty() {
                return Err(EbnfGrammarError::new(
                    EbnfGrammarErrorKind::NotEnoughExpressions(self.prod_names[i].0.clone()),
                ));
            }
            let full = &self.full_att_names[si];
            let own = &self.own_att_names[i];
            // Find the position at which the source's attribute list reaches
            // this production's first own attribute.
            let mut ai = 0;
            let mut xi = 0;
            while ai < full.len() && full[ai] != own[0] {
                ai += 1;
                xi += 1;
            }
            let mut picked = Vec::with_capacity(own.len());
            for own_name in own {
                if xi >= xs.len() {
                    return Err(EbnfGrammarError::new(
                        EbnfGrammarErrorKind::NotEnoughExpressions(self.prod_names[i].0.clone()),
                    ));
                }
                if ai >= full.len() {
                    return Err(EbnfGrammarError::new(
                        EbnfGrammarErrorKind::NotEnoughAttNames(self.prod_names[i].0.clone()),
                    ));
                }
                if &full[ai] != own_name {
                    return Err(EbnfGrammarError::new(
                        EbnfGrammarErrorKind::AttributeNameMismatch(
                            full[ai].clone(),
                            own_name.clone(),
                            self.prod_names[i].0.clone(),
                        ),
                    ));
                }
                picked.push(xs[xi]);
                xi += 1;
                ai += 1;
            }
            self.own_exps[i] = picked;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::super::grammar::test::{grm, grm_err};
    use super::*;

    #[test]
    fn test_instance_subtype_inherits_attributes() {
        let g = grm(
            "c = ',' ;\n\
             instance = plane | axis2placement3d ;\n\
             geometricRepresentationItem = plane ;\n\
             plane = PLANE , '(' , CHARSTRING , c , axis2placement3d , ')' ;\n\
             axis2placement3d = AXIS2PLACEMENT3D , '(' , CHARSTRING , ')' ;\n\
             (* Start attributes *)\n\
             (* geometricRepresentationItem : name *)\n\
             (* plane : position *)\n\
             (* axis2placement3d : name *)\n\
             (* End attributes *)\n",
        );
        let plane = g.pidx("plane").unwrap();
        let geo = g.pidx("geometricRepresentationItem").unwrap();
        assert_eq!(g.full_att_names(plane), ["name", "position"]);
        assert_eq!(g.full_att_names(geo), ["name"]);
        // plane's own expression is the axis2placement3d reference, skipping
        // the inherited name position.
        assert_eq!(g.own_exps(plane).len(), 1);
        assert_eq!(g.exp(g.own_exps(plane)[0]).lexeme, "axis2placement3d");
        // geometricRepresentationItem's own expression comes from plane (its
        // beInstance source): the CHARSTRING carrying the name.
        assert_eq!(g.own_exps(geo).len(), 1);
        assert_eq!(g.exp(g.own_exps(geo)[0]).lexeme, "CHARSTRING");
    }

    #[test]
    fn test_deep_chain_propagation() {
        let g = grm(
            "c = ',' ;\n\
             instance = machiningWorkingstep ;\n\
             executable = workingstep ;\n\
             workingstep = machiningWorkingstep ;\n\
             machiningWorkingstep = STEP , '(' , CHARSTRING , c , CHARSTRING , c , CHARSTRING , ')' ;\n\
             (* Start attributes *)\n\
             (* executable : itsId *)\n\
             (* workingstep : itsSecplane *)\n\
             (* machiningWorkingstep : itsFeature *)\n\
             (* End attributes *)\n",
        );
        let mws = g.pidx("machiningWorkingstep").unwrap();
        assert_eq!(
            g.full_att_names(mws),
            ["itsId", "itsSecplane", "itsFeature"]
        );
        let ws = g.pidx("workingstep").unwrap();
        assert_eq!(g.full_att_names(ws), ["itsId", "itsSecplane"]);
    }

    #[test]
    fn test_explicit_full_override_wins() {
        // rapidMovement inherits from two attribute-bearing chains, so its
        // full list must be given explicitly.
        let g = grm(
            "c = ',' ;\n\
             instance = rapidMovement ;\n\
             twoAxes = rapidMovement ;\n\
             threeAxes = rapidMovement ;\n\
             rapidMovement = RAPID , '(' , CHARSTRING , c , CHARSTRING , ')' ;\n\
             (* Start attributes *)\n\
             (* twoAxes : itsSecplane *)\n\
             (* threeAxes : itsToolDirection *)\n\
             (* rapidMovement : : itsSecplane itsToolDirection *)\n\
             (* End attributes *)\n",
        );
        let rm = g.pidx("rapidMovement").unwrap();
        assert_eq!(g.full_att_names(rm), ["itsSecplane", "itsToolDirection"]);
    }

    #[test]
    fn test_non_instance_production_owns_all_attributes() {
        let g = grm(
            "c = ',' ;\n\
             parenStringListFull = '(' , stringList , ')' ;\n\
             stringList = CHARSTRING | stringList , c , CHARSTRING ;\n\
             (* Start attributes *)\n\
             (* parenStringListFull : theList *)\n\
             (* End attributes *)\n",
        );
        let p = g.pidx("parenStringListFull").unwrap();
        assert_eq!(g.full_att_names(p), ["theList"]);
        assert_eq!(g.own_exps(p).len(), 1);
        assert_eq!(g.exp(g.own_exps(p)[0]).lexeme, "stringList");
    }

    #[test]
    fn test_attribute_name_mismatch() {
        let kind = grm_err(
            "c = ',' ;\n\
             a = KEY , '(' , CHARSTRING , c , CHARSTRING , ')' ;\n\
             (* Start attributes *)\n\
             (* a : x z : x y *)\n\
             (* End attributes *)\n",
        );
        match kind {
            EbnfGrammarErrorKind::AttributeNameMismatch(a, b, p) => {
                assert_eq!((a.as_str(), b.as_str(), p.as_str()), ("y", "z", "a"));
            }
            k => panic!("wrong error {:?}", k),
        }
    }

    #[test]
    fn test_not_enough_att_names() {
        let kind = grm_err(
            "c = ',' ;\n\
             a = KEY , '(' , CHARSTRING , c , CHARSTRING , ')' ;\n\
             (* Start attributes *)\n\
             (* a : x y : x *)\n\
             (* End attributes *)\n",
        );
        match kind {
            EbnfGrammarErrorKind::NotEnoughAttNames(p) => assert_eq!(p, "a"),
            k => panic!("wrong error {:?}", k),
        }
    }

    #[test]
    fn test_not_enough_expressions() {
        let kind = grm_err(
            "a = KEY , '(' , CHARSTRING , ')' ;\n\
             (* Start attributes *)\n\
             (* a : x y *)\n\
             (* End attributes *)\n",
        );
        match kind {
            EbnfGrammarErrorKind::NotEnoughExpressions(p) => assert_eq!(p, "a"),
            k => panic!("wrong error {:?}", k),
        }
    }
}
