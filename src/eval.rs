//! Evaluation of linear inequalities against sampled traces
//!
//! A [`Trace`] maps variable names to real-valued [`Signal`]s. Evaluating an
//! inequality samples every referenced signal at each query time using the
//! at-or-before convention (a signal holds its last value between samples)
//! and compares the weighted sum against the threshold, producing a boolean
//! [`Signal`].

use hashbrown::{HashMap, HashSet};
use itertools::Itertools;

use crate::ast::{Formula, LinEq, Scalar};
use crate::focus::{lineq_focus, ValueRef};
use crate::signals::Signal;
use crate::{Error, StlResult};

/// A collection of named real-valued signals.
pub trait Trace {
    /// The names of the signals in the trace.
    fn signal_names(&self) -> Vec<&str>;

    /// Get the signal with the given name.
    fn get(&self, name: &str) -> Option<&Signal<f64>>;
}

impl Trace for HashMap<String, Signal<f64>> {
    fn signal_names(&self) -> Vec<&str> {
        self.keys().map(String::as_str).collect()
    }

    fn get(&self, name: &str) -> Option<&Signal<f64>> {
        self.get(name)
    }
}

impl Trace for std::collections::HashMap<String, Signal<f64>> {
    fn signal_names(&self) -> Vec<&str> {
        self.keys().map(String::as_str).collect()
    }

    fn get(&self, name: &str) -> Option<&Signal<f64>> {
        self.get(name)
    }
}

/// The sorted union of all sample times across a trace, without duplicates.
///
/// Returns [`Error::EmptyDomain`] when the trace holds no samples at all, as
/// there is then no time domain to evaluate over.
pub fn get_times(trace: &impl Trace) -> StlResult<Vec<f64>> {
    let times: Vec<f64> = trace
        .signal_names()
        .into_iter()
        .filter_map(|name| trace.get(name))
        .flat_map(|signal| signal.times().iter().copied())
        .sorted_by(f64::total_cmp)
        .dedup()
        .collect();
    if times.is_empty() {
        return Err(Error::EmptyDomain);
    }
    Ok(times)
}

/// Evaluate a single inequality over a trace.
///
/// Samples at each time in `times` (strictly increasing; defaults to
/// [`get_times`]); each variable resolves to its signal's at-or-before
/// value. With `compact`, consecutive equal results collapse to the first
/// sample of each run.
///
/// Fails with [`Error::UnboundParameter`] if the threshold is still
/// symbolic, and [`Error::UnresolvedLookup`] if a referenced signal is
/// missing or has no sample at or before a query time.
pub fn eval_lineq(
    lineq: &LinEq,
    trace: &impl Trace,
    times: Option<&[f64]>,
    compact: bool,
) -> StlResult<Signal<bool>> {
    let all_times;
    let times = match times {
        Some(times) => times,
        None => {
            all_times = get_times(trace)?;
            &all_times
        }
    };
    let threshold = match &lineq.constant {
        Scalar::Num(val) => *val,
        Scalar::Param(name) => return Err(Error::UnboundParameter { name: name.clone() }),
    };

    let mut output = Signal::with_capacity(times.len());
    for &t in times {
        let mut lhs = 0.0;
        for term in &lineq.terms {
            let name = &term.id.name;
            let value = trace
                .get(name)
                .and_then(|signal| signal.at_or_before(t))
                .ok_or_else(|| Error::UnresolvedLookup {
                    name: name.clone(),
                    time: t,
                })?;
            lhs += term.coeff * value;
        }
        output.push(t, lineq.op.apply(lhs, threshold))?;
    }

    if compact {
        output.compact();
    }
    Ok(output)
}

/// Evaluate every distinct inequality in a formula over a trace.
///
/// Structurally equal inequalities are evaluated once; results are keyed by
/// the inequality itself and are compacted.
pub fn eval_lineqs(
    phi: &Formula,
    trace: &impl Trace,
    times: Option<&[f64]>,
) -> StlResult<HashMap<LinEq, Signal<bool>>> {
    let all_times;
    let times = match times {
        Some(times) => times,
        None => {
            all_times = get_times(trace)?;
            &all_times
        }
    };

    let focus = lineq_focus(phi);
    let lineqs: HashSet<&LinEq> = focus
        .get_all(phi)
        .into_iter()
        .map(|value| match value {
            ValueRef::Formula(Formula::LinEq(leq)) => leq,
            _ => unreachable!("inequality focus yields only inequalities"),
        })
        .collect();

    let mut out = HashMap::with_capacity(lineqs.len());
    for leq in lineqs {
        let signal = eval_lineq(leq, trace, Some(times), true)?;
        out.insert(leq.clone(), signal);
    }
    Ok(out)
}

/// Infinity-norm Lipschitz bound of one inequality's left-hand side: the sum
/// of absolute coefficient values.
pub fn lineq_lipschitz(lineq: &LinEq) -> f64 {
    lineq.terms.iter().map(|term| term.coeff.abs()).sum()
}

/// Infinity-norm Lipschitz bound of a formula: the largest bound among its
/// inequalities.
///
/// Returns [`Error::NoLinEqs`] for a formula without inequalities, which has
/// no bound to report.
pub fn lipschitz(phi: &Formula) -> StlResult<f64> {
    lineq_focus(phi)
        .get_all(phi)
        .into_iter()
        .map(|value| match value {
            ValueRef::Formula(Formula::LinEq(leq)) => lineq_lipschitz(leq),
            _ => unreachable!("inequality focus yields only inequalities"),
        })
        .fold(None, |acc: Option<f64>, bound| {
            Some(acc.map_or(bound, |best| best.max(bound)))
        })
        .ok_or(Error::NoLinEqs)
}
