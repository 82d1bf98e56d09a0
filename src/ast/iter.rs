//! Depth-first traversal over formula trees

use hashbrown::HashSet;

use super::{AnyNode, Formula, Var};

/// Iterator that starts from some root [`Formula`] and travels down to its
/// leaves.
///
/// The traversal is depth-first and pre-order: a node is yielded before its
/// children, a child's entire subtree is visited before the next sibling, and
/// siblings are visited in each node's declared child order (for
/// [`Until`](super::Until): `arg1` then `arg2`).
pub struct AstIter<'a> {
    stack: Vec<&'a Formula>,
}

impl<'a> AstIter<'a> {
    /// Create an iterator that traverses a [`Formula`] from root to leaf.
    pub fn new(root: &'a Formula) -> Self {
        Self { stack: vec![root] }
    }
}

impl<'a> Iterator for AstIter<'a> {
    type Item = &'a Formula;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        // Children pushed in reverse so the stack pops them in declared
        // sibling order.
        for child in node.children().into_iter().rev() {
            self.stack.push(child);
        }
        Some(node)
    }
}

/// Collect every variable referenced by a linear inequality anywhere in the
/// formula.
pub fn vars_in(phi: &Formula) -> HashSet<&Var> {
    phi.iter()
        .filter_map(|node| match node {
            Formula::LinEq(leq) => Some(leq.terms.iter().map(|term| &term.id)),
            _ => None,
        })
        .flatten()
        .collect()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::ast::{self, alw, andf, env, until, AtomicPred, Interval, LinEq, Ordering, Scalar, Term};

    fn ap(name: &str) -> Formula {
        AtomicPred { name: name.to_owned() }.into()
    }

    /// Structural node count computed without the iterator.
    fn node_count(phi: &Formula) -> usize {
        1 + phi.children().iter().map(|child| node_count(child)).sum::<usize>()
    }

    #[test]
    fn preorder_sibling_order() {
        let phi = andf([
            ap("a"),
            until(Interval::new(0.0, 1.0), ap("b"), ap("c")),
            env(Interval::new(0.0, 2.0), ap("d")),
        ]);

        let visited: Vec<String> = phi
            .iter()
            .map(|node| match node {
                Formula::AtomicPred(p) => p.name.clone(),
                Formula::And(_) => "&".to_owned(),
                Formula::Until(_) => "U".to_owned(),
                Formula::Eventually(_) => "F".to_owned(),
                _ => unreachable!(),
            })
            .collect();

        assert_eq!(visited, ["&", "a", "U", "b", "c", "F", "d"]);
    }

    proptest! {
        #[test]
        fn traversal_is_complete(phi in ast::arbitrary::formula()) {
            prop_assert_eq!(phi.iter().count(), node_count(&phi));
        }
    }

    #[test]
    fn collects_variables() {
        let leq_a = LinEq {
            terms: vec![Term::new(2.0, "x"), Term::new(-3.0, "y")],
            op: Ordering::less_than_eq(),
            constant: Scalar::Num(0.0),
        };
        let leq_b = LinEq {
            terms: vec![Term::new(1.0, "x")],
            op: Ordering::greater_than(),
            constant: Scalar::Num(1.0),
        };
        let phi = alw(Interval::new(0.0, 5.0), andf([leq_a.into(), leq_b.into(), ap("p")]));

        let vars = vars_in(&phi);
        let names: HashSet<&str> = vars.iter().map(|var| var.name.as_str()).collect();
        assert_eq!(names, HashSet::from_iter(["x", "y"]));
    }

    #[test]
    fn constants_are_leaves() {
        let phi = andf([ast::top(), ast::bot()]);
        assert_eq!(phi.iter().count(), 3);
        assert!(vars_in(&phi).is_empty());
    }
}
