//! Expression tree for STL/MTL formulas
//!
//! A [`Formula`] is an immutable tagged tree: atomic leaves (linear
//! inequalities, named boolean atoms, and the `true`/`false` constants) under
//! boolean and temporal connectives. Transformations elsewhere in the crate
//! never mutate a formula in place; they produce new trees.

use std::fmt;
use std::hash::{Hash, Hasher};

pub mod iter;
mod ops;

use enum_dispatch::enum_dispatch;
use itertools::Itertools;

use self::iter::AstIter;

/// A trait representing formula tree nodes.
#[enum_dispatch]
pub trait AnyNode {
    /// Get the formula-valued children of the current node, in declared order.
    ///
    /// Atomic nodes return an empty vector.
    fn children(&self) -> Vec<&Formula>;
    /// Mutable access to the formula-valued children, in the same order as
    /// [`children`](AnyNode::children).
    fn children_mut(&mut self) -> Vec<&mut Formula>;
}

/// An STL/MTL formula.
#[derive(Clone, Debug, PartialEq, derive_more::Display)]
#[enum_dispatch(AnyNode)]
pub enum Formula {
    /// The `true` constant
    Top(Top),
    /// The `false` constant
    Bot(Bot),
    /// An atomic linear inequality over signal variables
    LinEq(LinEq),
    /// A named boolean atomic predicate
    AtomicPred(AtomicPred),
    /// Logical negation
    Neg(Neg),
    /// N-ary conjunction
    And(And),
    /// N-ary disjunction
    Or(Or),
    /// Temporal "eventually" over a closed interval
    Eventually(Eventually),
    /// Temporal "always" over a closed interval
    Always(Always),
    /// Temporal "until" over a closed interval
    Until(Until),
}

impl Formula {
    /// Create a borrowed depth-first iterator over the formula tree.
    pub fn iter(&self) -> AstIter<'_> {
        AstIter::new(self)
    }
}

/// A concrete number or a free symbolic parameter.
///
/// Parameters appear in inequality thresholds and interval endpoints until
/// they are bound by [`set_params`](crate::focus::set_params).
#[derive(Clone, Debug, PartialEq)]
pub enum Scalar {
    /// A concrete value
    Num(f64),
    /// A free parameter, identified by name
    Param(String),
}

impl Scalar {
    /// Check whether the scalar is still a free parameter.
    pub fn is_param(&self) -> bool {
        matches!(self, Scalar::Param(_))
    }

    /// Get the concrete value, if the scalar has one.
    pub fn as_num(&self) -> Option<f64> {
        match self {
            Scalar::Num(val) => Some(*val),
            Scalar::Param(_) => None,
        }
    }
}

impl Eq for Scalar {}

impl Hash for Scalar {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // f64 hashed bitwise; NaN thresholds are never meaningful here.
        match self {
            Scalar::Num(val) => {
                state.write_u8(0);
                val.to_bits().hash(state);
            }
            Scalar::Param(name) => {
                state.write_u8(1);
                name.hash(state);
            }
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Num(val) => write!(f, "{}", val),
            Scalar::Param(name) => crate::parser::fmt_ident(name, f),
        }
    }
}

impl From<f64> for Scalar {
    fn from(val: f64) -> Self {
        Scalar::Num(val)
    }
}

impl From<&str> for Scalar {
    fn from(name: &str) -> Self {
        Scalar::Param(name.to_owned())
    }
}

impl From<String> for Scalar {
    fn from(name: String) -> Self {
        Scalar::Param(name)
    }
}

/// A signal variable reference.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Var {
    /// Name of the variable
    pub name: String,
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::parser::fmt_ident(&self.name, f)
    }
}

/// One weighted variable in a linear inequality.
#[derive(Clone, Debug, PartialEq)]
pub struct Term {
    /// Coefficient of the variable
    pub coeff: f64,
    /// The variable being weighted
    pub id: Var,
}

impl Term {
    /// Create a term `coeff * name`.
    pub fn new(coeff: f64, name: impl Into<String>) -> Self {
        Self {
            coeff,
            id: Var { name: name.into() },
        }
    }
}

impl Eq for Term {}

impl Hash for Term {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.coeff.to_bits().hash(state);
        self.id.hash(state);
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.coeff == 1.0 {
            write!(f, "{}", self.id)
        } else {
            write!(f, "{}*{}", self.coeff, self.id)
        }
    }
}

/// Types of comparison operations in a linear inequality.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Ordering {
    /// Equality check
    Eq,
    /// Less than check
    Less {
        /// Denotes `lhs < rhs` if `strict`, and `lhs <= rhs` otherwise.
        strict: bool,
    },
    /// Greater than check
    Greater {
        /// Denotes `lhs > rhs` if `strict`, and `lhs >= rhs` otherwise.
        strict: bool,
    },
}

impl Ordering {
    /// `Ordering::Eq`
    pub fn equal() -> Self {
        Self::Eq
    }

    /// `Ordering::Less { strict: true }`
    pub fn less_than() -> Self {
        Self::Less { strict: true }
    }

    /// `Ordering::Less { strict: false }`
    pub fn less_than_eq() -> Self {
        Self::Less { strict: false }
    }

    /// `Ordering::Greater { strict: true }`
    pub fn greater_than() -> Self {
        Self::Greater { strict: true }
    }

    /// `Ordering::Greater { strict: false }`
    pub fn greater_than_eq() -> Self {
        Self::Greater { strict: false }
    }

    /// Apply the comparison to concrete operands.
    pub fn apply(&self, lhs: f64, rhs: f64) -> bool {
        match self {
            Ordering::Eq => lhs == rhs,
            Ordering::Less { strict: true } => lhs < rhs,
            Ordering::Less { strict: false } => lhs <= rhs,
            Ordering::Greater { strict: true } => lhs > rhs,
            Ordering::Greater { strict: false } => lhs >= rhs,
        }
    }
}

impl fmt::Display for Ordering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            Ordering::Eq => "=",
            Ordering::Less { strict: true } => "<",
            Ordering::Less { strict: false } => "<=",
            Ordering::Greater { strict: true } => ">",
            Ordering::Greater { strict: false } => ">=",
        };
        write!(f, "{}", op)
    }
}

/// A time interval for a temporal operator.
///
/// Both endpoints are closed, and either may still be a free parameter.
#[derive(Clone, Debug, PartialEq)]
pub struct Interval {
    /// Start of the interval
    pub lo: Scalar,
    /// End of the interval
    pub hi: Scalar,
}

impl Interval {
    /// Create a new interval `[lo, hi]`.
    pub fn new(lo: impl Into<Scalar>, hi: impl Into<Scalar>) -> Self {
        Self {
            lo: lo.into(),
            hi: hi.into(),
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.lo, self.hi)
    }
}

macro_rules! impl_node {
    ($ty:ty) => {
        impl AnyNode for $ty {
            fn children(&self) -> Vec<&Formula> {
                Vec::new()
            }

            fn children_mut(&mut self) -> Vec<&mut Formula> {
                Vec::new()
            }
        }
    };
    ($ty:ty, [$args:ident]) => {
        impl AnyNode for $ty {
            fn children(&self) -> Vec<&Formula> {
                self.$args.iter().collect()
            }

            fn children_mut(&mut self) -> Vec<&mut Formula> {
                self.$args.iter_mut().collect()
            }
        }
    };
    ($ty:ty, $($arg:ident),+) => {
        impl AnyNode for $ty {
            fn children(&self) -> Vec<&Formula> {
                vec![$( self.$arg.as_ref(), )+]
            }

            fn children_mut(&mut self) -> Vec<&mut Formula> {
                vec![$( self.$arg.as_mut(), )+]
            }
        }
    };
}

/// The `true` constant
#[derive(Clone, Copy, Debug, PartialEq, Eq, derive_more::Display)]
#[display(fmt = "true")]
pub struct Top;
impl_node!(Top);

/// The `false` constant
#[derive(Clone, Copy, Debug, PartialEq, Eq, derive_more::Display)]
#[display(fmt = "false")]
pub struct Bot;
impl_node!(Bot);

/// An atomic linear inequality `c_1*x_1 + ... + c_n*x_n op const`.
///
/// Two inequalities are equal (and hash equal) iff their terms, comparison,
/// and threshold are structurally equal; the evaluator relies on this for
/// deduplication.
#[derive(Clone, Debug, PartialEq)]
pub struct LinEq {
    /// Weighted variables on the left-hand side
    pub terms: Vec<Term>,
    /// The comparison operator
    pub op: Ordering,
    /// The threshold on the right-hand side
    pub constant: Scalar,
}

impl Eq for LinEq {}

impl Hash for LinEq {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.terms.hash(state);
        self.op.hash(state);
        self.constant.hash(state);
    }
}

impl fmt::Display for LinEq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.terms.iter().map(ToString::to_string).join(" + "),
            self.op,
            self.constant
        )
    }
}

impl_node!(LinEq);

/// A named boolean atomic predicate
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AtomicPred {
    /// Name of the predicate
    pub name: String,
}

impl fmt::Display for AtomicPred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::parser::fmt_ident(&self.name, f)
    }
}

impl_node!(AtomicPred);

/// Logical negation of a formula
#[derive(Clone, Debug, PartialEq, derive_more::Display)]
#[display(fmt = "!({})", arg)]
pub struct Neg {
    /// Formula being negated
    pub arg: Box<Formula>,
}

impl_node!(Neg, arg);

/// Logical conjunction of a list of formulas
#[derive(Clone, Debug, PartialEq)]
pub struct And {
    /// Formulas being "and"-ed
    pub args: Vec<Formula>,
}

impl fmt::Display for And {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.args.iter().map(ToString::to_string).join(") & ("))
    }
}

impl_node!(And, [args]);

/// Logical disjunction of a list of formulas
#[derive(Clone, Debug, PartialEq)]
pub struct Or {
    /// Formulas being "or"-ed
    pub args: Vec<Formula>,
}

impl fmt::Display for Or {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.args.iter().map(ToString::to_string).join(") | ("))
    }
}

impl_node!(Or, [args]);

/// A temporal eventually expression
///
/// Checks if the argument holds at some point within the interval.
#[derive(Clone, Debug, PartialEq, derive_more::Display)]
#[display(fmt = "F{}({})", interval, arg)]
pub struct Eventually {
    /// Interval for the expression
    pub interval: Interval,
    /// Argument for `Eventually`
    pub arg: Box<Formula>,
}

impl_node!(Eventually, arg);

/// A temporal always expression
///
/// Checks if the argument holds at every point within the interval.
#[derive(Clone, Debug, PartialEq, derive_more::Display)]
#[display(fmt = "G{}({})", interval, arg)]
pub struct Always {
    /// Interval for the expression
    pub interval: Interval,
    /// Argument for `Always`
    pub arg: Box<Formula>,
}

impl_node!(Always, arg);

/// A temporal until expression
///
/// Checks if `arg1` holds until `arg2` becomes true within the interval.
#[derive(Clone, Debug, PartialEq, derive_more::Display)]
#[display(fmt = "({}) U{} ({})", arg1, interval, arg2)]
pub struct Until {
    /// Interval for the expression
    pub interval: Interval,
    /// LHS of `arg1 U arg2`
    pub arg1: Box<Formula>,
    /// RHS of `arg1 U arg2`
    pub arg2: Box<Formula>,
}

impl_node!(Until, arg1, arg2);

/// Create the `true` constant.
pub fn top() -> Formula {
    Top.into()
}

/// Create the `false` constant.
pub fn bot() -> Formula {
    Bot.into()
}

/// Negate a formula.
pub fn neg(arg: Formula) -> Formula {
    Neg { arg: Box::new(arg) }.into()
}

/// Conjoin a list of formulas, flattening nested conjunctions.
///
/// The identity element of conjunction is `true`: `andf([])` is [`Top`]. A
/// single-element list collapses to the element itself.
pub fn andf<I>(args: I) -> Formula
where
    I: IntoIterator<Item = Formula>,
{
    let mut flat = Vec::new();
    for arg in args {
        if let Formula::And(And { args }) = arg {
            flat.extend(args);
        } else {
            flat.push(arg);
        }
    }
    match flat.len() {
        0 => Top.into(),
        1 => flat.remove(0),
        _ => And { args: flat }.into(),
    }
}

/// Disjoin a list of formulas, flattening nested disjunctions.
///
/// The identity element of disjunction is `false`: `orf([])` is [`Bot`].
pub fn orf<I>(args: I) -> Formula
where
    I: IntoIterator<Item = Formula>,
{
    let mut flat = Vec::new();
    for arg in args {
        if let Formula::Or(Or { args }) = arg {
            flat.extend(args);
        } else {
            flat.push(arg);
        }
    }
    match flat.len() {
        0 => Bot.into(),
        1 => flat.remove(0),
        _ => Or { args: flat }.into(),
    }
}

/// Create an [`Always`] formula (`G[lo, hi] arg`).
pub fn alw(interval: Interval, arg: Formula) -> Formula {
    Always {
        interval,
        arg: Box::new(arg),
    }
    .into()
}

/// Create an [`Eventually`] formula (`F[lo, hi] arg`).
pub fn env(interval: Interval, arg: Formula) -> Formula {
    Eventually {
        interval,
        arg: Box::new(arg),
    }
    .into()
}

/// Create an [`Until`] formula (`arg1 U[lo, hi] arg2`).
pub fn until(interval: Interval, arg1: Formula, arg2: Formula) -> Formula {
    Until {
        interval,
        arg1: Box::new(arg1),
        arg2: Box::new(arg2),
    }
    .into()
}

/// Create a formula equivalent to `lhs -> rhs`, as `!lhs | rhs`.
pub fn implies(lhs: Formula, rhs: Formula) -> Formula {
    !lhs | rhs
}

/// Create a formula equivalent to `lhs ^ rhs`, as `(lhs | rhs) & !(lhs & rhs)`.
pub fn xor(lhs: Formula, rhs: Formula) -> Formula {
    (lhs.clone() | rhs.clone()) & !(lhs & rhs)
}

/// Create a formula equivalent to `lhs <-> rhs`, as `(lhs & rhs) | (!lhs & !rhs)`.
pub fn iff(lhs: Formula, rhs: Formula) -> Formula {
    (lhs.clone() & rhs.clone()) | (!lhs & !rhs)
}

#[cfg(any(test, feature = "arbitrary"))]
pub mod arbitrary {
    //! Helper functions to generate arbitrary formulas using [`mod@proptest`].
    use proptest::prelude::*;

    use super::*;

    fn ident() -> impl Strategy<Value = String> {
        // Restricted alphabet so generated names never collide with the
        // parser's keywords.
        "[a-e][a-e0-9]{0,3}"
    }

    /// Generate arbitrary scalars (concrete or symbolic).
    pub fn scalar() -> impl Strategy<Value = Scalar> {
        prop_oneof![
            (-100i32..100).prop_map(|val| Scalar::Num(f64::from(val))),
            ident().prop_map(Scalar::Param),
        ]
    }

    /// Generate arbitrary linear inequalities.
    pub fn lineq() -> impl Strategy<Value = LinEq> {
        let term = ((-10i32..10).prop_filter("coefficients are nonzero", |c| *c != 0), ident())
            .prop_map(|(coeff, name)| Term::new(f64::from(coeff), name));
        let op = prop_oneof![
            Just(Ordering::equal()),
            Just(Ordering::less_than()),
            Just(Ordering::less_than_eq()),
            Just(Ordering::greater_than()),
            Just(Ordering::greater_than_eq()),
        ];
        (prop::collection::vec(term, 1..4), op, scalar()).prop_map(|(terms, op, constant)| LinEq {
            terms,
            op,
            constant,
        })
    }

    /// Generate arbitrary intervals.
    pub fn interval() -> impl Strategy<Value = Interval> {
        (scalar(), scalar()).prop_map(|(lo, hi)| Interval { lo, hi })
    }

    /// Generate arbitrary formulas, built through the EDSL constructors.
    pub fn formula() -> impl Strategy<Value = Formula> {
        let leaf = prop_oneof![
            Just(top()),
            Just(bot()),
            ident().prop_map(|name| AtomicPred { name }.into()),
            lineq().prop_map(Formula::from),
        ];

        leaf.prop_recursive(
            6,  // levels deep
            64, // maximum total nodes
            4,  // items per collection
            |inner| {
                prop_oneof![
                    inner.clone().prop_map(neg),
                    prop::collection::vec(inner.clone(), 0..4).prop_map(andf),
                    prop::collection::vec(inner.clone(), 0..4).prop_map(orf),
                    (interval(), inner.clone()).prop_map(|(i, arg)| env(i, arg)),
                    (interval(), inner.clone()).prop_map(|(i, arg)| alw(i, arg)),
                    (interval(), inner.clone(), inner).prop_map(|(i, arg1, arg2)| until(i, arg1, arg2)),
                ]
            },
        )
    }
}
