//! The supertype/subtype lattice passes: supertype classification, the
//! ancestor closure, `beInstance` marking, and optional classification.
//!
//! These run in exactly this order: optional classification needs
//! `isInstance` and `beInstance`, which need the ancestor closure, which
//! needs `subtypeOf`.

use num_traits::{AsPrimitive, PrimInt, Unsigned};

use super::{
    grammar::{EbnfGrammar, INSTANCE},
    EbnfGrammarError, EbnfGrammarErrorKind, ExprKind, ListKind, OptionalRole,
};
use crate::PIdx;

impl<StorageT: 'static + PrimInt + Unsigned> EbnfGrammar<StorageT>
where
    usize: AsPrimitive<StorageT>,
{
    /// A production is a supertype iff every one of its definitions is a
    /// single non-terminal expression resolving to a non-list production.
    /// The immediate subtypes of the distinguished `instance` production are
    /// marked `isInstance`; the subtypes of every other supertype get the
    /// supertype appended to their `subtypeOf` list.
    pub(crate) fn find_supertypes(&mut self) {
        for i in 0..usize::from(self.prods_len) {
            let mut subs = Vec::with_capacity(self.prod_defs[i].len());
            let mut is_super = true;
            for &didx in &self.prod_defs[i] {
                let exps = &self.def_exps[usize::from(didx)];
                if exps.len() != 1 {
                    is_super = false;
                    break;
                }
                let exp = &self.exps[usize::from(exps[0])];
                match exp.prod {
                    Some(q)
                        if exp.kind == ExprKind::NonTerminal
                            && self.list_kinds[usize::from(q)] == ListKind::None =>
                    {
                        subs.push(q)
                    }
                    _ => {
                        is_super = false;
                        break;
                    }
                }
            }
            if !is_super {
                continue;
            }
            self.supertypes[i] = true;
            if self.prod_names[i].0 == INSTANCE {
                for q in subs {
                    self.instances[usize::from(q)] = true;
                }
            } else {
                for q in subs {
                    self.subtype_ofs[usize::from(q)].push(PIdx(i.as_()));
                }
            }
        }
    }

    /// Compute the ancestor closure of every production: the transitive
    /// closure over `subtypeOf` in first-encounter depth-first order, never
    /// revisiting, and skipping optional parents (`instance` never appears
    /// in a `subtypeOf` list, so it is excluded by construction).
    pub(crate) fn find_all_ancestors(&mut self) {
        for i in 0..usize::from(self.prods_len) {
            let mut ancesti = Vec::new();
            self.find_ancestors(PIdx(i.as_()), &mut ancesti);
            self.ancestor_sets[i] = ancesti;
        }
    }

    fn find_ancestors(&self, pidx: PIdx<StorageT>, ancesti: &mut Vec<PIdx<StorageT>>) {
        for &sup in &self.subtype_ofs[usize::from(pidx)] {
            if !ancesti.contains(&sup)
                && !matches!(
                    self.opt_roles[usize::from(sup)],
                    OptionalRole::ParentOfInstanceOrSupertype | OptionalRole::ParentOfOther
                )
            {
                ancesti.push(sup);
                self.find_ancestors(sup, ancesti);
            }
        }
    }

    /// For every instance production Q, mark each ancestor P of Q with
    /// `beInstance = Q` unless some earlier instance already claimed P. A
    /// production that is itself an instance never receives a `beInstance`
    /// value; downstream code depends on that.
    pub(crate) fn find_be_instance(&mut self) {
        for i in 0..usize::from(self.prods_len) {
            if !self.instances[i] {
                continue;
            }
            let q = PIdx(i.as_());
            for k in 0..self.ancestor_sets[i].len() {
                let pi = usize::from(self.ancestor_sets[i][k]);
                if !self.instances[pi] && self.be_instances[pi].is_none() {
                    self.be_instances[pi] = Some(q);
                }
            }
        }
    }

    /// An optional parent is a production with exactly two one-expression
    /// definitions, one a resolved non-terminal (the child) and the other
    /// the literal `$`. The parent's role depends on whether the child is an
    /// instance, the supertype of an instance, or neither; the `transferName`
    /// names the instance production that ferries an identifier across the
    /// optional position.
    pub(crate) fn find_optionals(&mut self) -> Result<(), EbnfGrammarError> {
        for i in 0..usize::from(self.prods_len) {
            let defs = &self.prod_defs[i];
            if defs.len() != 2 {
                continue;
            }
            let d0 = &self.def_exps[usize::from(defs[0])];
            let d1 = &self.def_exps[usize::from(defs[1])];
            if d0.len() != 1 || d1.len() != 1 {
                continue;
            }
            let child_of = |eidx| {
                let exp = self.exp(eidx);
                match (exp.kind, exp.prod) {
                    (ExprKind::NonTerminal, Some(q)) => Some(q),
                    _ => None,
                }
            };
            let is_dollar = |eidx| {
                let exp = self.exp(eidx);
                exp.kind == ExprKind::OneChar && exp.lexeme == "$"
            };
            let child = match (child_of(d0[0]), child_of(d1[0])) {
                (Some(c), _) if is_dollar(d1[0]) => c,
                (_, Some(c)) if is_dollar(d0[0]) => c,
                _ => continue,
            };
            let parent = PIdx(i.as_());
            let ci = usize::from(child);
            self.opt_roles[ci] = OptionalRole::Child;
            self.opt_peers[ci] = Some(parent);
            self.opt_peers[i] = Some(child);
            if self.instances[ci] {
                self.opt_roles[i] = OptionalRole::ParentOfInstanceOrSupertype;
                self.transfer_names[i] = Some(child);
            } else if self.be_instances[ci].is_some() {
                self.opt_roles[i] = OptionalRole::ParentOfInstanceOrSupertype;
                self.transfer_names[i] = Some(self.find_transfer_name(parent, child)?);
            } else {
                self.opt_roles[i] = OptionalRole::ParentOfOther;
                self.transfer_names[i] = Some(child);
            }
        }
        Ok(())
    }

    /// The child is not an instance: find a production that is an instance
    /// and descends from the child. Any such production will do, so this
    /// picks the first one it finds.
    fn find_transfer_name(
        &self,
        parent: PIdx<StorageT>,
        child: PIdx<StorageT>,
    ) -> Result<PIdx<StorageT>, EbnfGrammarError> {
        for d in self.iter_pidxs() {
            if self.instances[usize::from(d)]
                && self.ancestor_sets[usize::from(d)].contains(&child)
            {
                return Ok(d);
            }
        }
        Err(EbnfGrammarError::new(EbnfGrammarErrorKind::NoTransferName(
            self.prod_name(parent).to_string(),
        )))
    }
}

#[cfg(test)]
mod test {
    use super::super::grammar::test::grm;
    use super::*;

    #[test]
    fn test_supertype_with_two_subtypes() {
        let g = grm(
            "two5DstrategyKind = contourParallel | bidirectionalMilling ;\n\
             contourParallel = CONTOURPARALLEL ;\n\
             bidirectionalMilling = BIDIRECTIONALMILLING ;",
        );
        let sup = g.pidx("two5DstrategyKind").unwrap();
        let cp = g.pidx("contourParallel").unwrap();
        let bm = g.pidx("bidirectionalMilling").unwrap();
        assert!(g.is_supertype(sup));
        assert!(!g.is_supertype(cp));
        assert_eq!(g.subtype_of(cp), [sup]);
        assert_eq!(g.subtype_of(bm), [sup]);
    }

    #[test]
    fn test_a_list_reference_is_not_a_supertype() {
        let g = grm(
            "c = ',' ;\n\
             xs = x | xs , c , x ;\n\
             refsList = xs ;\n\
             x = X ;",
        );
        assert!(!g.is_supertype(g.pidx("refsList").unwrap()));
    }

    #[test]
    fn test_instance_subtypes_marked() {
        let g = grm(
            "instance = plane | direction ;\n\
             plane = PLANE ;\n\
             direction = DIRECTION ;",
        );
        let plane = g.pidx("plane").unwrap();
        let direction = g.pidx("direction").unwrap();
        let instance = g.pidx("instance").unwrap();
        assert!(g.is_instance(plane));
        assert!(g.is_instance(direction));
        assert!(!g.is_instance(instance));
        // instance does not appear in subtypeOf or ancestors.
        assert!(g.subtype_of(plane).is_empty());
        assert!(g.ancestors(plane).is_empty());
    }

    #[test]
    fn test_ancestors_depth_first_no_revisit() {
        // d has two chains to a: d -> b -> a and d -> c -> a.
        let g = grm(
            "a = b | c ;\n\
             b = d ;\n\
             c = d ;\n\
             d = D ;",
        );
        let a = g.pidx("a").unwrap();
        let b = g.pidx("b").unwrap();
        let c = g.pidx("c").unwrap();
        let d = g.pidx("d").unwrap();
        assert_eq!(g.ancestors(d), [b, a, c]);
        assert_eq!(g.ancestors(b), [a]);
        assert!(g.ancestors(a).is_empty());
    }

    #[test]
    fn test_be_instance() {
        let g = grm(
            "instance = plane ;\n\
             representationItem = geometricRepresentationItem ;\n\
             geometricRepresentationItem = plane ;\n\
             plane = PLANE ;",
        );
        let plane = g.pidx("plane").unwrap();
        let geo = g.pidx("geometricRepresentationItem").unwrap();
        let rep = g.pidx("representationItem").unwrap();
        assert_eq!(g.be_instance(geo), Some(plane));
        assert_eq!(g.be_instance(rep), Some(plane));
        // A production that is itself an instance has no beInstance.
        assert_eq!(g.be_instance(plane), None);
    }

    #[test]
    fn test_optional_parent_with_instance_child() {
        let g = grm(
            "instance = direction ;\n\
             direction = DIRECTION ;\n\
             optDirection = direction | '$' ;",
        );
        let opt = g.pidx("optDirection").unwrap();
        let dir = g.pidx("direction").unwrap();
        assert_eq!(g.optional_role(opt), OptionalRole::ParentOfInstanceOrSupertype);
        assert_eq!(g.transfer_name(opt), Some("direction"));
        assert_eq!(g.optional_role(dir), OptionalRole::Child);
        assert_eq!(g.opt_peer(dir), Some(opt));
        assert_eq!(g.opt_peer(opt), Some(dir));
    }

    #[test]
    fn test_optional_parent_with_supertype_of_instance_child() {
        // The child is abstract: the transfer name resolves to the first
        // instance production descending from it.
        let g = grm(
            "instance = plungeHelix | plungeRamp ;\n\
             approachRetractStrategy = plungeHelix | plungeRamp ;\n\
             plungeHelix = PLUNGEHELIX ;\n\
             plungeRamp = PLUNGERAMP ;\n\
             optApproachRetractStrategy = approachRetractStrategy | '$' ;",
        );
        let opt = g.pidx("optApproachRetractStrategy").unwrap();
        assert_eq!(g.optional_role(opt), OptionalRole::ParentOfInstanceOrSupertype);
        assert_eq!(g.transfer_name(opt), Some("plungeHelix"));
    }

    #[test]
    fn test_optional_parent_of_other() {
        let g = grm(
            "optLabel = label | '$' ;\n\
             label = CHARSTRING ;",
        );
        let opt = g.pidx("optLabel").unwrap();
        assert_eq!(g.optional_role(opt), OptionalRole::ParentOfOther);
        assert_eq!(g.transfer_name(opt), Some("label"));
    }

    #[test]
    fn test_dollar_first_is_still_an_optional() {
        let g = grm(
            "optLabel = '$' | label ;\n\
             label = CHARSTRING ;",
        );
        assert_eq!(
            g.optional_role(g.pidx("optLabel").unwrap()),
            OptionalRole::ParentOfOther
        );
    }

    #[test]
    fn test_optional_duality() {
        let g = grm(
            "instance = direction ;\n\
             direction = DIRECTION ;\n\
             optDirection = direction | '$' ;\n\
             optLabel = label | '$' ;\n\
             label = CHARSTRING ;",
        );
        for p in g.iter_pidxs() {
            match g.optional_role(p) {
                OptionalRole::Child => {
                    let parent = g.opt_peer(p).unwrap();
                    assert!(matches!(
                        g.optional_role(parent),
                        OptionalRole::ParentOfInstanceOrSupertype | OptionalRole::ParentOfOther
                    ));
                    assert_eq!(g.opt_peer(parent), Some(p));
                }
                OptionalRole::ParentOfInstanceOrSupertype | OptionalRole::ParentOfOther => {
                    assert_eq!(g.optional_role(g.opt_peer(p).unwrap()), OptionalRole::Child);
                }
                OptionalRole::None => assert_eq!(g.opt_peer(p), None),
            }
        }
    }
}
