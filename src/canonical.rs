//! Canonicalization into the `{Neg, Or, F}` basis
//!
//! Every boolean and temporal connective except "until" can be expressed
//! with negation, disjunction, and "eventually" alone:
//!
//! * `a & b`      becomes `!((!a) | (!b))`
//! * `G[l, h](a)` becomes `!(F[l, h](!a))`
//!
//! Atoms (`true`, `false`, inequalities, named predicates) pass through
//! unchanged. The rewrite is purely structural; no simplification such as
//! double-negation elimination is performed, so the output prints exactly as
//! derived.

use crate::ast::{env, neg, orf, Formula};
use crate::{Error, StlResult};

/// Rewrite a formula into the `{Neg, Or, F}` basis over its atoms.
///
/// Returns [`Error::UnsupportedOperator`] if the formula contains an "until"
/// node, which has no encoding in this basis.
pub fn f_neg_or_canonical_form(phi: &Formula) -> StlResult<Formula> {
    match phi {
        Formula::Top(_) | Formula::Bot(_) | Formula::LinEq(_) | Formula::AtomicPred(_) => {
            Ok(phi.clone())
        }
        Formula::Neg(node) => Ok(neg(f_neg_or_canonical_form(&node.arg)?)),
        Formula::Or(node) => {
            let children: StlResult<Vec<_>> =
                node.args.iter().map(f_neg_or_canonical_form).collect();
            Ok(orf(children?))
        }
        Formula::And(node) => {
            let children: StlResult<Vec<_>> = node
                .args
                .iter()
                .map(|arg| Ok(neg(f_neg_or_canonical_form(arg)?)))
                .collect();
            Ok(neg(orf(children?)))
        }
        Formula::Eventually(node) => Ok(env(
            node.interval.clone(),
            f_neg_or_canonical_form(&node.arg)?,
        )),
        Formula::Always(node) => Ok(neg(env(
            node.interval.clone(),
            neg(f_neg_or_canonical_form(&node.arg)?),
        ))),
        Formula::Until(_) => Err(Error::UnsupportedOperator { op: "until" }),
    }
}

#[cfg(test)]
mod tests {
    use hashbrown::HashMap;
    use proptest::prelude::*;

    use super::*;
    use crate::ast::{self, alw, andf, until, AtomicPred, Interval};

    fn ap(name: &str) -> Formula {
        AtomicPred { name: name.to_owned() }.into()
    }

    /// Truth value of a propositional formula under an atom assignment.
    fn holds(phi: &Formula, env: &HashMap<String, bool>) -> bool {
        match phi {
            Formula::Top(_) => true,
            Formula::Bot(_) => false,
            Formula::AtomicPred(p) => env[&p.name],
            Formula::Neg(node) => !holds(&node.arg, env),
            Formula::And(node) => node.args.iter().all(|arg| holds(arg, env)),
            Formula::Or(node) => node.args.iter().any(|arg| holds(arg, env)),
            _ => panic!("not a propositional formula"),
        }
    }

    /// Propositional formulas over atoms `a` and `b`.
    fn propositional() -> impl Strategy<Value = Formula> {
        let leaf = prop_oneof![
            Just(ast::top()),
            Just(ast::bot()),
            Just(ap("a")),
            Just(ap("b")),
        ];
        leaf.prop_recursive(5, 32, 3, |inner| {
            prop_oneof![
                inner.clone().prop_map(ast::neg),
                prop::collection::vec(inner.clone(), 1..4).prop_map(andf),
                prop::collection::vec(inner, 1..4).prop_map(ast::orf),
            ]
        })
    }

    #[test]
    fn always_becomes_not_eventually_not() {
        let phi = alw(Interval::new(0.0, 1.0), ap("p"));
        let canon = f_neg_or_canonical_form(&phi).unwrap();
        let expected = ast::neg(ast::env(Interval::new(0.0, 1.0), ast::neg(ap("p"))));
        assert_eq!(canon, expected);
    }

    #[test]
    fn conjunction_becomes_negated_disjunction() {
        let phi = andf([ap("p"), ap("q")]);
        let canon = f_neg_or_canonical_form(&phi).unwrap();
        let expected = ast::neg(ast::orf([ast::neg(ap("p")), ast::neg(ap("q"))]));
        assert_eq!(canon, expected);
    }

    #[test]
    fn atoms_are_fixed_points() {
        for atom in [ast::top(), ast::bot(), ap("p")] {
            assert_eq!(f_neg_or_canonical_form(&atom).unwrap(), atom);
        }
    }

    #[test]
    fn until_is_rejected() {
        let phi = until(Interval::new(0.0, 1.0), ap("p"), ap("q"));
        let err = f_neg_or_canonical_form(&phi).unwrap_err();
        assert!(matches!(err, Error::UnsupportedOperator { op: "until" }));

        // Even when buried under other connectives.
        let nested = andf([ap("r"), ast::neg(phi)]);
        assert!(f_neg_or_canonical_form(&nested).is_err());
    }

    proptest! {
        #[test]
        fn output_stays_in_basis(phi in ast::arbitrary::formula()) {
            prop_assume!(!phi.iter().any(|node| matches!(node, Formula::Until(_))));
            let canon = f_neg_or_canonical_form(&phi).unwrap();
            for node in canon.iter() {
                prop_assert!(!matches!(
                    node,
                    Formula::And(_) | Formula::Always(_) | Formula::Until(_)
                ));
            }
        }

        #[test]
        fn propositional_truth_is_preserved(phi in propositional(), a: bool, b: bool) {
            let env = HashMap::from_iter([("a".to_owned(), a), ("b".to_owned(), b)]);
            let canon = f_neg_or_canonical_form(&phi).unwrap();
            prop_assert_eq!(holds(&canon, &env), holds(&phi, &env));
        }

        #[test]
        fn canonicalization_is_idempotent(phi in ast::arbitrary::formula()) {
            prop_assume!(!phi.iter().any(|node| matches!(node, Formula::Until(_))));
            let once = f_neg_or_canonical_form(&phi).unwrap();
            let twice = f_neg_or_canonical_form(&once).unwrap();
            prop_assert_eq!(twice, once);
        }
    }
}
