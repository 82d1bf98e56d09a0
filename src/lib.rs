//! # `stlkit`
//!
//! The manipulation core for Signal Temporal Logic (STL) formulas. The crate
//! provides:
//!
//! 1. An immutable expression tree for STL/MTL formulas, together with an EDSL
//!    for building them (see [`ast`]).
//! 2. A predicate-guided query/rewrite engine over formula trees, which every
//!    other operation is layered on (see [`focus`]).
//! 3. A canonicalizer into the reduced operator basis `{Neg, Or, F, atoms}`
//!    (see [`canonical`]).
//! 4. A reversible abstraction from STL (linear-inequality atoms) to MTL
//!    (named boolean atoms) and back (see [`mtl`]).
//! 5. An evaluator that checks linear inequalities against discrete-time
//!    multivariate signals (see [`eval`] and [`signals`]).
//!
//! Formulas are never mutated in place: every transformation returns a new
//! tree, so formulas can be shared freely across threads without
//! synchronization.

pub mod ast;
pub mod canonical;
pub mod eval;
pub mod focus;
pub mod mtl;
pub mod parser;
pub mod signals;

use thiserror::Error;

/// All errors any `stlkit` operation can surface.
#[derive(Error, Debug)]
pub enum Error {
    /// Canonicalization reached a node kind outside the supported set.
    #[error("unsupported operator `{op}` in canonicalization")]
    UnsupportedOperator {
        /// The offending operator, as printed.
        op: &'static str,
    },
    /// Evaluation was invoked on a signal assignment with no samples.
    #[error("signal assignment contains no sample times")]
    EmptyDomain,
    /// A term referenced a variable or time with no sample at or before it.
    #[error("no sample for variable `{name}` at or before time {time}")]
    UnresolvedLookup {
        /// The variable being looked up.
        name: String,
        /// The lookup time.
        time: f64,
    },
    /// A sample was pushed at or before the last time point of a signal.
    #[error("signal samples must have strictly increasing times (last sample at {last}, got {time})")]
    NonMonotonicSignal {
        /// Time of the last sample already in the signal.
        last: f64,
        /// Time of the rejected sample.
        time: f64,
    },
    /// Context substitution did not reach a fixed point within the bound.
    #[error("context substitution did not converge after {rounds} rounds (cyclic definitions?)")]
    NonConvergentContext {
        /// Number of substitution rounds attempted.
        rounds: usize,
    },
    /// A symbolic parameter reached the evaluator unbound.
    #[error("parameter `{name}` is unbound at evaluation time")]
    UnboundParameter {
        /// Name of the unbound parameter.
        name: String,
    },
    /// A Lipschitz bound was requested for a formula with no inequalities.
    #[error("formula contains no linear inequalities")]
    NoLinEqs,
    /// The input string is not a well-formed formula.
    #[error("syntax error: {0}")]
    Parse(String),
}

/// Convenience alias for `Result<T, stlkit::Error>`.
pub type StlResult<T> = Result<T, Error>;

pub mod prelude {
    //! Single-import surface for the common types and operations.
    pub use crate::ast::{
        alw, andf, bot, env, iff, implies, neg, orf, top, until, xor, AnyNode, AtomicPred, Formula, Interval, LinEq,
        Ordering, Scalar, Term, Var,
    };
    pub use crate::canonical::f_neg_or_canonical_form;
    pub use crate::eval::{eval_lineq, eval_lineqs, get_times, lineq_lipschitz, lipschitz, Trace};
    pub use crate::focus::{
        and_or_focus, ap_focus, ast_focus, lineq_focus, param_focus, set_params, set_params_with, terms_focus, Focus,
    };
    pub use crate::mtl::{from_mtl, inline_context, to_mtl, ApMap};
    pub use crate::parser::parse_str;
    pub use crate::signals::Signal;
    pub use crate::{Error, StlResult};
}
