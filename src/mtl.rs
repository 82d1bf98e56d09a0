//! Lossless bridge between STL and MTL formulas
//!
//! An STL formula keeps its atomic state as linear inequalities; an MTL
//! formula abstracts those into named atomic predicates. [`to_mtl`] replaces
//! every inequality with a generated predicate name and returns the
//! [`ApMap`] recording the correspondence; [`from_mtl`] applies the map in
//! reverse. The round trip is exact.
//!
//! [`inline_context`] substitutes named predicates by formulas from a
//! context map, repeating until no predicate in the result has a definition
//! left to expand.

use hashbrown::{HashMap, HashSet};

use crate::ast::{AtomicPred, Formula, LinEq};
use crate::focus::{ap_focus, lineq_focus, Value, ValueRef};
use crate::parser::parse_str;
use crate::{Error, StlResult};

/// Substitution rounds after which [`inline_context`] gives up.
///
/// A context whose definitions mention each other can need several rounds to
/// settle; a cyclic one never settles.
pub const MAX_INLINE_ROUNDS: usize = 64;

/// A bijection between generated predicate names and linear inequalities.
///
/// Names are assigned by [`to_mtl`] as `AP0`, `AP1`, ... in order of each
/// distinct inequality's first appearance in a pre-order traversal, so the
/// map is deterministic for a given formula. Indices whose name is already
/// taken by an atomic predicate in the input are skipped, so a generated
/// name never captures a pre-existing atom.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ApMap {
    by_name: HashMap<String, LinEq>,
    by_lineq: HashMap<LinEq, String>,
}

impl ApMap {
    /// Number of name/inequality pairs.
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Check if the map holds no pairs.
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Look up the inequality a generated name stands for.
    pub fn lineq(&self, name: &str) -> Option<&LinEq> {
        self.by_name.get(name)
    }

    /// Look up the generated name of an inequality.
    pub fn name(&self, lineq: &LinEq) -> Option<&str> {
        self.by_lineq.get(lineq).map(String::as_str)
    }

    /// Iterate over the name/inequality pairs, in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &LinEq)> {
        self.by_name.iter().map(|(name, leq)| (name.as_str(), leq))
    }

    fn insert(&mut self, name: String, leq: LinEq) {
        self.by_lineq.insert(leq.clone(), name.clone());
        self.by_name.insert(name, leq);
    }
}

/// Abstract every linear inequality into a named atomic predicate.
///
/// Structurally equal inequalities share one name, so the returned map is a
/// true bijection. The input formula is untouched.
pub fn to_mtl(phi: &Formula) -> (Formula, ApMap) {
    let taken: HashSet<&str> = phi
        .iter()
        .filter_map(|node| match node {
            Formula::AtomicPred(ap) => Some(ap.name.as_str()),
            _ => None,
        })
        .collect();

    let focus = lineq_focus(phi);
    let mut ap_map = ApMap::default();
    let mut index = 0usize;
    for value in focus.get_all(phi) {
        let ValueRef::Formula(Formula::LinEq(leq)) = value else {
            unreachable!("inequality focus yields only inequalities");
        };
        if ap_map.name(leq).is_none() {
            let name = loop {
                let candidate = format!("AP{}", index);
                index += 1;
                if !taken.contains(candidate.as_str()) {
                    break candidate;
                }
            };
            ap_map.insert(name, leq.clone());
        }
    }

    let abstracted = focus.modify(phi, |value| match value {
        Value::Formula(Formula::LinEq(leq)) => {
            let Some(name) = ap_map.name(&leq) else {
                unreachable!("every focused inequality was just named");
            };
            Value::Formula(AtomicPred { name: name.to_owned() }.into())
        }
        other => other,
    });
    (abstracted, ap_map)
}

/// Replace named atomic predicates by the inequalities they stand for.
///
/// Predicates without an entry in `ap_map` are left in place, so a partial
/// map performs a partial translation.
pub fn from_mtl(phi: &Formula, ap_map: &ApMap) -> Formula {
    ap_focus(phi).modify(phi, |value| match value {
        Value::Formula(Formula::AtomicPred(ap)) => match ap_map.lineq(&ap.name) {
            Some(leq) => Value::Formula(leq.clone().into()),
            None => Value::Formula(ap.into()),
        },
        other => other,
    })
}

/// Expand named predicates using a context of definitions, to a fixed point.
///
/// Definitions may reference each other; substitution repeats until a round
/// changes nothing. The result is re-parsed from its printed form, which
/// flattens any conjunction or disjunction chains the substitution nested.
/// Returns [`Error::NonConvergentContext`] when the context is cyclic (no
/// fixed point within [`MAX_INLINE_ROUNDS`] rounds).
pub fn inline_context(phi: &Formula, context: &HashMap<String, Formula>) -> StlResult<Formula> {
    let mut current = phi.clone();
    for _ in 0..MAX_INLINE_ROUNDS {
        let next = ap_focus(&current).modify(&current, |value| match value {
            Value::Formula(Formula::AtomicPred(ap)) => match context.get(&ap.name) {
                Some(def) => Value::Formula(def.clone()),
                None => Value::Formula(ap.into()),
            },
            other => other,
        });
        if next == current {
            log::debug!("inlined context into formula: {}", next);
            return parse_str(&next.to_string());
        }
        current = next;
    }
    Err(Error::NonConvergentContext {
        rounds: MAX_INLINE_ROUNDS,
    })
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::ast::{self, alw, andf, orf, AnyNode, Interval, Ordering, Scalar, Term};

    fn ap(name: &str) -> Formula {
        AtomicPred { name: name.to_owned() }.into()
    }

    fn x_gt(threshold: f64) -> LinEq {
        LinEq {
            terms: vec![Term::new(1.0, "x")],
            op: Ordering::greater_than(),
            constant: Scalar::Num(threshold),
        }
    }

    #[test]
    fn round_trip_is_exact() {
        let phi = alw(
            Interval::new(0.0, 5.0),
            orf([x_gt(1.0).into(), andf([x_gt(2.0).into(), ap("q")])]),
        );

        let (mtl, ap_map) = to_mtl(&phi);
        assert_eq!(ap_map.len(), 2);
        // No inequality survives abstraction.
        assert!(!mtl.iter().any(|node| matches!(node, Formula::LinEq(_))));

        assert_eq!(from_mtl(&mtl, &ap_map), phi);
    }

    #[test]
    fn naming_follows_first_occurrence() {
        let phi = andf([x_gt(2.0).into(), x_gt(1.0).into()]);
        let (_, ap_map) = to_mtl(&phi);
        assert_eq!(ap_map.lineq("AP0"), Some(&x_gt(2.0)));
        assert_eq!(ap_map.lineq("AP1"), Some(&x_gt(1.0)));
    }

    #[test]
    fn duplicate_inequalities_share_a_name() {
        let phi = orf([x_gt(3.0).into(), alw(Interval::new(0.0, 1.0), x_gt(3.0).into())]);
        let (mtl, ap_map) = to_mtl(&phi);

        assert_eq!(ap_map.len(), 1);
        let names: Vec<&str> = mtl
            .iter()
            .filter_map(|node| match node {
                Formula::AtomicPred(p) => Some(p.name.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(names, vec!["AP0", "AP0"]);
    }

    #[test]
    fn naming_avoids_existing_atoms() {
        let phi = andf([ap("AP0"), x_gt(1.0).into()]);
        let (mtl, ap_map) = to_mtl(&phi);

        // The pre-existing atom keeps its name; the inequality gets the next
        // free index.
        assert_eq!(ap_map.lineq("AP0"), None);
        assert_eq!(ap_map.lineq("AP1"), Some(&x_gt(1.0)));
        assert_eq!(from_mtl(&mtl, &ap_map), phi);
    }

    #[test]
    fn partial_map_translates_partially() {
        let phi = andf([ap("AP0"), ap("pedestrian")]);
        let mut ap_map = ApMap::default();
        ap_map.insert("AP0".to_owned(), x_gt(0.0));

        let back = from_mtl(&phi, &ap_map);
        assert_eq!(back, andf([x_gt(0.0).into(), ap("pedestrian")]));
    }

    #[test]
    fn inline_expands_nested_definitions() {
        // c -> b & q, b -> x > 1; two rounds to settle.
        let context = HashMap::from_iter([
            ("c".to_owned(), andf([ap("b"), ap("q")])),
            ("b".to_owned(), x_gt(1.0).into()),
        ]);

        let phi = andf([ap("c"), ap("p")]);
        let inlined = inline_context(&phi, &context).unwrap();
        assert_eq!(inlined, andf([x_gt(1.0).into(), ap("q"), ap("p")]));
    }

    #[test]
    fn inline_flattens_substituted_chains() {
        let context = HashMap::from_iter([("c".to_owned(), andf([ap("a"), ap("b")]))]);
        let phi = andf([ap("c"), ap("d")]);

        let inlined = inline_context(&phi, &context).unwrap();
        // A single four-way conjunction, not a nested pair.
        assert_eq!(inlined, andf([ap("a"), ap("b"), ap("d")]));
        assert_eq!(inlined.children().len(), 3);
    }

    #[test]
    fn keyword_named_atoms_survive_inlining() {
        // "ev" and "until" are operator spellings, so the printed fixed point
        // must quote them for the re-parse to see atoms.
        let context = HashMap::from_iter([("c".to_owned(), andf([ap("ev"), ap("until")]))]);
        let phi = andf([ap("c"), ap("p")]);

        let inlined = inline_context(&phi, &context).unwrap();
        assert_eq!(inlined, andf([ap("ev"), ap("until"), ap("p")]));
    }

    #[test]
    fn cyclic_context_is_rejected() {
        let context = HashMap::from_iter([
            ("a".to_owned(), ast::neg(ap("b"))),
            ("b".to_owned(), ast::neg(ap("a"))),
        ]);
        let err = inline_context(&ap("a"), &context).unwrap_err();
        assert!(matches!(err, Error::NonConvergentContext { .. }));
    }

    #[test]
    fn empty_context_is_identity() {
        let phi = alw(Interval::new(0.0, 2.0), andf([ap("p"), x_gt(1.0).into()]));
        let inlined = inline_context(&phi, &HashMap::new()).unwrap();
        assert_eq!(inlined, phi);
    }

    proptest! {
        #[test]
        fn abstraction_preserves_shape(phi in ast::arbitrary::formula()) {
            let (mtl, ap_map) = to_mtl(&phi);
            prop_assert_eq!(mtl.iter().count(), phi.iter().count());
            prop_assert_eq!(from_mtl(&mtl, &ap_map), phi);
        }

        #[test]
        fn to_mtl_is_deterministic(phi in ast::arbitrary::formula()) {
            let (mtl_a, map_a) = to_mtl(&phi);
            let (mtl_b, map_b) = to_mtl(&phi);
            prop_assert_eq!(mtl_a, mtl_b);
            prop_assert_eq!(map_a, map_b);
        }
    }
}
