//! Predicate-guided query and rewrite engine over formula trees
//!
//! A [`Focus`] is a reusable, composable description of zero or more
//! locations inside an immutable formula: every sub-formula, term, or scalar
//! matched by a predicate anywhere in the tree. Reading a focus
//! ([`Focus::get_all`]) yields the values at every location in discovery
//! order (pre-order, left to right); rewriting one ([`Focus::modify`])
//! produces a new tree with all focused locations replaced and every other
//! node unchanged.
//!
//! Apart from canonicalization, the higher-level operations in the crate are
//! thin policies over this engine: the STL↔MTL bridge, the context inliner,
//! the parameter binder, and the evaluator's inequality collection.

use hashbrown::HashMap;

use crate::ast::{AnyNode, Formula, Scalar, Term};

/// One step of a path from a formula node to a location nested inside it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// Descend into the n-th formula-valued child, counted in declared child
    /// order.
    Child(usize),
    /// The threshold constant of a linear inequality.
    Constant,
    /// The n-th term of a linear inequality.
    Term(usize),
    /// The lower endpoint of a temporal interval.
    Lo,
    /// The upper endpoint of a temporal interval.
    Hi,
}

/// A path from the root of a formula to a single addressable location.
pub type Path = Vec<Step>;

/// A borrowed view of the value at a focused location.
#[derive(Clone, Copy, Debug)]
pub enum ValueRef<'a> {
    /// A sub-formula
    Formula(&'a Formula),
    /// A term of a linear inequality
    Term(&'a Term),
    /// A threshold or interval endpoint
    Scalar(&'a Scalar),
}

/// An owned value taken out of a focused location during a rewrite.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// A sub-formula
    Formula(Formula),
    /// A term of a linear inequality
    Term(Term),
    /// A threshold or interval endpoint
    Scalar(Scalar),
}

enum ValueMut<'a> {
    Formula(&'a mut Formula),
    Term(&'a mut Term),
    Scalar(&'a mut Scalar),
}

/// An ordered multi-location focus over a formula tree.
///
/// The focus stores only paths, so it can be applied to the formula it was
/// built from (or any formula of identical shape) any number of times.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Focus {
    paths: Vec<Path>,
}

impl Focus {
    /// Number of focused locations.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Check if the focus matched no locations.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Read the values at every focused location, in discovery order.
    pub fn get_all<'a>(&self, phi: &'a Formula) -> Vec<ValueRef<'a>> {
        self.paths.iter().map(|path| resolve(phi, path)).collect()
    }

    /// Rewrite every focused location and return the new tree.
    ///
    /// The rewrite function receives the current value at each location and
    /// must return a value of the same kind (a formula for a formula slot,
    /// and so on). Locations are rewritten in discovery order, so when one
    /// focused location contains another, the inner path resolves through
    /// the already-rewritten outer value. The input formula is left
    /// untouched.
    pub fn modify<F>(&self, phi: &Formula, mut rewrite: F) -> Formula
    where
        F: FnMut(Value) -> Value,
    {
        let mut out = phi.clone();
        for path in &self.paths {
            match resolve_mut(&mut out, path) {
                ValueMut::Formula(slot) => {
                    let old = std::mem::replace(slot, Formula::Top(crate::ast::Top));
                    match rewrite(Value::Formula(old)) {
                        Value::Formula(new) => *slot = new,
                        _ => unreachable!("rewrite must preserve the focused value kind"),
                    }
                }
                ValueMut::Term(slot) => {
                    let old = std::mem::replace(slot, Term::new(0.0, ""));
                    match rewrite(Value::Term(old)) {
                        Value::Term(new) => *slot = new,
                        _ => unreachable!("rewrite must preserve the focused value kind"),
                    }
                }
                ValueMut::Scalar(slot) => {
                    let old = std::mem::replace(slot, Scalar::Num(0.0));
                    match rewrite(Value::Scalar(old)) {
                        Value::Scalar(new) => *slot = new,
                        _ => unreachable!("rewrite must preserve the focused value kind"),
                    }
                }
            }
        }
        out
    }

    /// Narrow the focus to the locations whose current value satisfies
    /// `keep`.
    pub fn retain<F>(mut self, phi: &Formula, mut keep: F) -> Focus
    where
        F: FnMut(ValueRef<'_>) -> bool,
    {
        self.paths.retain(|path| keep(resolve(phi, path)));
        self
    }
}

fn resolve<'a>(phi: &'a Formula, path: &[Step]) -> ValueRef<'a> {
    let Some((step, rest)) = path.split_first() else {
        return ValueRef::Formula(phi);
    };
    match (step, phi) {
        (Step::Child(idx), node) => {
            let child = node
                .children()
                .into_iter()
                .nth(*idx)
                .unwrap_or_else(|| unreachable!("path step out of range for node"));
            resolve(child, rest)
        }
        (Step::Constant, Formula::LinEq(leq)) => ValueRef::Scalar(&leq.constant),
        (Step::Term(idx), Formula::LinEq(leq)) => ValueRef::Term(&leq.terms[*idx]),
        (Step::Lo, Formula::Eventually(node)) => ValueRef::Scalar(&node.interval.lo),
        (Step::Hi, Formula::Eventually(node)) => ValueRef::Scalar(&node.interval.hi),
        (Step::Lo, Formula::Always(node)) => ValueRef::Scalar(&node.interval.lo),
        (Step::Hi, Formula::Always(node)) => ValueRef::Scalar(&node.interval.hi),
        _ => unreachable!("path does not match the shape of the formula"),
    }
}

fn resolve_mut<'a>(phi: &'a mut Formula, path: &[Step]) -> ValueMut<'a> {
    let Some((step, rest)) = path.split_first() else {
        return ValueMut::Formula(phi);
    };
    match (step, phi) {
        (Step::Child(idx), node) => {
            let child = node
                .children_mut()
                .into_iter()
                .nth(*idx)
                .unwrap_or_else(|| unreachable!("path step out of range for node"));
            resolve_mut(child, rest)
        }
        (Step::Constant, Formula::LinEq(leq)) => ValueMut::Scalar(&mut leq.constant),
        (Step::Term(idx), Formula::LinEq(leq)) => ValueMut::Term(&mut leq.terms[*idx]),
        (Step::Lo, Formula::Eventually(node)) => ValueMut::Scalar(&mut node.interval.lo),
        (Step::Hi, Formula::Eventually(node)) => ValueMut::Scalar(&mut node.interval.hi),
        (Step::Lo, Formula::Always(node)) => ValueMut::Scalar(&mut node.interval.lo),
        (Step::Hi, Formula::Always(node)) => ValueMut::Scalar(&mut node.interval.hi),
        _ => unreachable!("path does not match the shape of the formula"),
    }
}

/// Build a focus on every node satisfying `pred`, refined by `sub_locs`.
///
/// The predicate is tested once per visited node, in depth-first pre-order.
/// For each match, `sub_locs` maps the node to the paths of interest *within*
/// it (the empty path focuses the node itself). `Top`/`Bot` constants are
/// terminal and are never tested; `LinEq` and `AtomicPred` are tested but
/// never recursed into, as they have no formula-valued children.
pub fn ast_focus<P, F>(phi: &Formula, pred: P, sub_locs: F) -> Focus
where
    P: Fn(&Formula) -> bool,
    F: Fn(&Formula) -> Vec<Path>,
{
    let mut paths = Vec::new();
    collect_paths(phi, &pred, &sub_locs, &mut Vec::new(), &mut paths);
    Focus { paths }
}

fn collect_paths<P, F>(phi: &Formula, pred: &P, sub_locs: &F, prefix: &mut Path, out: &mut Vec<Path>)
where
    P: Fn(&Formula) -> bool,
    F: Fn(&Formula) -> Vec<Path>,
{
    if matches!(phi, Formula::Top(_) | Formula::Bot(_)) {
        return;
    }
    if pred(phi) {
        for rel in sub_locs(phi) {
            let mut path = prefix.clone();
            path.extend(rel);
            out.push(path);
        }
    }
    if matches!(phi, Formula::LinEq(_) | Formula::AtomicPred(_)) {
        return;
    }
    for (idx, child) in phi.children().into_iter().enumerate() {
        prefix.push(Step::Child(idx));
        collect_paths(child, pred, sub_locs, prefix, out);
        prefix.pop();
    }
}

fn identity_locs(_: &Formula) -> Vec<Path> {
    vec![Vec::new()]
}

/// Focus on every linear inequality in the formula.
pub fn lineq_focus(phi: &Formula) -> Focus {
    ast_focus(phi, |node| matches!(node, Formula::LinEq(_)), identity_locs)
}

/// Focus on every named atomic predicate in the formula.
pub fn ap_focus(phi: &Formula) -> Focus {
    ast_focus(phi, |node| matches!(node, Formula::AtomicPred(_)), identity_locs)
}

/// Focus on every conjunction or disjunction node in the formula.
pub fn and_or_focus(phi: &Formula) -> Focus {
    ast_focus(phi, |node| matches!(node, Formula::And(_) | Formula::Or(_)), identity_locs)
}

/// Focus on every [`Term`] of every linear inequality in the formula.
pub fn terms_focus(phi: &Formula) -> Focus {
    ast_focus(
        phi,
        |node| matches!(node, Formula::LinEq(_)),
        |node| match node {
            Formula::LinEq(leq) => (0..leq.terms.len()).map(|idx| vec![Step::Term(idx)]).collect(),
            _ => unreachable!("sub-locations only requested for matched nodes"),
        },
    )
}

/// Focus on every *free* symbolic parameter in the formula: inequality
/// thresholds and temporal interval endpoints that are still
/// [`Scalar::Param`].
pub fn param_focus(phi: &Formula) -> Focus {
    let focus = ast_focus(
        phi,
        |node| {
            matches!(
                node,
                Formula::LinEq(_) | Formula::Eventually(_) | Formula::Always(_)
            )
        },
        |node| match node {
            Formula::LinEq(_) => vec![vec![Step::Constant]],
            Formula::Eventually(_) | Formula::Always(_) => vec![vec![Step::Lo], vec![Step::Hi]],
            _ => unreachable!("sub-locations only requested for matched nodes"),
        },
    );
    focus.retain(phi, |value| matches!(value, ValueRef::Scalar(Scalar::Param(_))))
}

/// Bind free symbolic parameters to concrete values.
///
/// Every parameter whose name is a key of `vals` is replaced by its value;
/// parameters absent from `vals` are deliberately left symbolic (partial
/// binding is allowed). Returns a new formula.
pub fn set_params(phi: &Formula, vals: &HashMap<String, f64>) -> Formula {
    set_params_with(&param_focus(phi), phi, vals)
}

/// [`set_params`] over an already-computed parameter focus.
pub fn set_params_with(focus: &Focus, phi: &Formula, vals: &HashMap<String, f64>) -> Formula {
    focus.modify(phi, |value| match value {
        Value::Scalar(Scalar::Param(name)) => match vals.get(&name) {
            Some(val) => Value::Scalar(Scalar::Num(*val)),
            None => Value::Scalar(Scalar::Param(name)),
        },
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::ast::{self, alw, andf, env, neg, orf, until, AtomicPred, Interval, LinEq, Ordering, Scalar, Term};

    fn ap(name: &str) -> Formula {
        AtomicPred { name: name.to_owned() }.into()
    }

    fn leq(coeff: f64, var: &str, threshold: Scalar) -> LinEq {
        LinEq {
            terms: vec![Term::new(coeff, var)],
            op: Ordering::greater_than(),
            constant: threshold,
        }
    }

    #[test]
    fn lineq_focus_in_preorder() {
        let a = leq(1.0, "a", Scalar::Num(0.0));
        let b = leq(2.0, "b", Scalar::Num(1.0));
        let c = leq(3.0, "c", Scalar::Num(2.0));
        let phi = orf([
            until(Interval::new(0.0, 1.0), a.clone().into(), b.clone().into()),
            neg(c.clone().into()),
        ]);

        let focus = lineq_focus(&phi);
        let found: Vec<&LinEq> = focus
            .get_all(&phi)
            .into_iter()
            .map(|value| match value {
                ValueRef::Formula(Formula::LinEq(leq)) => leq,
                _ => panic!("lineq focus yielded a non-inequality"),
            })
            .collect();

        assert_eq!(found, vec![&a, &b, &c]);
    }

    #[test]
    fn focus_skips_constants_and_atoms() {
        let phi = andf([ast::top(), ap("p"), ast::bot()]);
        assert!(lineq_focus(&phi).is_empty());
        assert_eq!(ap_focus(&phi).len(), 1);
        assert_eq!(and_or_focus(&phi).len(), 1);
    }

    #[test]
    fn terms_focus_expands_each_inequality() {
        let two_terms = LinEq {
            terms: vec![Term::new(2.0, "x"), Term::new(-3.0, "y")],
            op: Ordering::less_than_eq(),
            constant: Scalar::Num(0.0),
        };
        let phi = andf([two_terms.into(), leq(1.0, "z", Scalar::Num(5.0)).into()]);

        let focus = terms_focus(&phi);
        let coeffs: Vec<f64> = focus
            .get_all(&phi)
            .into_iter()
            .map(|value| match value {
                ValueRef::Term(term) => term.coeff,
                _ => panic!("terms focus yielded a non-term"),
            })
            .collect();
        assert_eq!(coeffs, vec![2.0, -3.0, 1.0]);
    }

    #[test]
    fn param_focus_keeps_only_free_parameters() {
        let phi = alw(
            Interval::new("lo", 5.0),
            leq(1.0, "x", Scalar::Param("thresh".to_owned())).into(),
        );

        let focus = param_focus(&phi);
        let names: Vec<&str> = focus
            .get_all(&phi)
            .into_iter()
            .map(|value| match value {
                ValueRef::Scalar(Scalar::Param(name)) => name.as_str(),
                _ => panic!("param focus yielded a bound value"),
            })
            .collect();
        // Interval endpoints come before the threshold of the nested child.
        assert_eq!(names, vec!["lo", "thresh"]);
    }

    #[test]
    fn set_params_binds_partially() {
        let phi = env(
            Interval::new("lo", "hi"),
            leq(1.0, "x", Scalar::Param("thresh".to_owned())).into(),
        );

        let vals = HashMap::from_iter([("lo".to_owned(), 0.0), ("thresh".to_owned(), 3.5)]);
        let bound = set_params(&phi, &vals);

        let expected = env(
            Interval::new(0.0, "hi"),
            leq(1.0, "x", Scalar::Num(3.5)).into(),
        );
        assert_eq!(bound, expected);
        // The input is untouched.
        assert_eq!(param_focus(&phi).len(), 3);
    }

    proptest! {
        #[test]
        fn identity_rewrite_is_noop(phi in ast::arbitrary::formula()) {
            let focus = lineq_focus(&phi);
            let same = focus.modify(&phi, |value| value);
            prop_assert_eq!(&same, &phi);

            let focus = param_focus(&phi);
            let same = focus.modify(&phi, |value| value);
            prop_assert_eq!(&same, &phi);
        }

        #[test]
        fn get_all_matches_focus_len(phi in ast::arbitrary::formula()) {
            let focus = ap_focus(&phi);
            prop_assert_eq!(focus.get_all(&phi).len(), focus.len());
        }
    }
}
