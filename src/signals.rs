//! Discrete-time signal types
//!
//! A [`Signal`] is a finite, possibly irregularly sampled series over
//! real-valued time. Sample times are strictly monotonically increasing;
//! lookups resolve either exactly ([`Signal::at`]) or to the sample
//! at-or-before a query time ([`Signal::at_or_before`]), which is the
//! evaluator's lookup contract.

use crate::{Error, StlResult};

/// A sequence of time points and corresponding value samples.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct Signal<T> {
    pub(crate) values: Vec<T>,
    pub(crate) time_points: Vec<f64>,
}

impl<T> Signal<T> {
    /// Create a new empty signal.
    pub fn new() -> Self {
        Self {
            values: Vec::new(),
            time_points: Vec::new(),
        }
    }

    /// Create a new empty signal with the specified capacity.
    pub fn with_capacity(size: usize) -> Self {
        Self {
            values: Vec::with_capacity(size),
            time_points: Vec::with_capacity(size),
        }
    }

    /// Try to create a signal from an iterator of `(time, value)` pairs.
    ///
    /// Returns an `Err` if the input samples are not in strictly
    /// monotonically increasing time order.
    pub fn try_from_iter<I>(iter: I) -> StlResult<Self>
    where
        I: IntoIterator<Item = (f64, T)>,
    {
        let iter = iter.into_iter();
        let mut signal = Signal::with_capacity(iter.size_hint().0);
        for (time, value) in iter {
            signal.push(time, value)?;
        }
        Ok(signal)
    }

    /// Number of samples in the signal.
    pub fn len(&self) -> usize {
        self.time_points.len()
    }

    /// Check if the signal has no samples.
    pub fn is_empty(&self) -> bool {
        self.time_points.is_empty()
    }

    /// The sample times of the signal, in increasing order.
    pub fn times(&self) -> &[f64] {
        &self.time_points
    }

    /// The first and last sample times, or `None` for an empty signal.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        match (self.time_points.first(), self.time_points.last()) {
            (Some(first), Some(last)) => Some((*first, *last)),
            _ => None,
        }
    }

    /// Create an iterator over the pairs of time points and values.
    pub fn iter(&self) -> impl Iterator<Item = (f64, &T)> {
        self.time_points.iter().copied().zip(self.values.iter())
    }

    /// Push a new sample to the signal at the given time point.
    ///
    /// The time points of a signal must be strictly monotonically
    /// increasing; a sample at or before the current last time is rejected
    /// without being added.
    pub fn push(&mut self, time: f64, value: T) -> StlResult<()> {
        match self.time_points.last() {
            Some(last) if *last >= time => Err(Error::NonMonotonicSignal { last: *last, time }),
            _ => {
                self.time_points.push(time);
                self.values.push(value);
                Ok(())
            }
        }
    }

    /// Get the value sampled exactly at `time`, if any.
    pub fn at(&self, time: f64) -> Option<&T> {
        self.time_points
            .binary_search_by(|probe| probe.total_cmp(&time))
            .ok()
            .and_then(|idx| self.values.get(idx))
    }

    /// Get the value of the sample at-or-before `time`.
    ///
    /// Returns `None` when the signal has no sample at or earlier than
    /// `time`.
    pub fn at_or_before(&self, time: f64) -> Option<&T> {
        let idx = self.time_points.partition_point(|t| *t <= time);
        idx.checked_sub(1).and_then(|idx| self.values.get(idx))
    }
}

impl<T: PartialEq> Signal<T> {
    /// Collapse consecutive equal-valued samples into the first sample of
    /// each run.
    ///
    /// Compaction is idempotent: compacting an already-compacted signal
    /// leaves it unchanged.
    pub fn compact(&mut self) {
        let mut keep = 0;
        for idx in 1..self.values.len() {
            if self.values[idx] != self.values[keep] {
                keep += 1;
                self.values.swap(keep, idx);
                self.time_points.swap(keep, idx);
            }
        }
        if !self.values.is_empty() {
            self.values.truncate(keep + 1);
            self.time_points.truncate(keep + 1);
        }
    }
}

impl<T> FromIterator<(f64, T)> for Signal<T> {
    /// Create a signal from an iterator of samples.
    ///
    /// # Panics
    ///
    /// Panics if the samples are not in strictly increasing time order; use
    /// [`Signal::try_from_iter`] to handle the error instead.
    fn from_iter<I: IntoIterator<Item = (f64, T)>>(iter: I) -> Self {
        match Self::try_from_iter(iter) {
            Ok(signal) => signal,
            Err(err) => panic!("invalid samples: {}", err),
        }
    }
}

impl<'a, T> IntoIterator for &'a Signal<T> {
    type IntoIter = std::iter::Zip<std::iter::Copied<std::slice::Iter<'a, f64>>, std::slice::Iter<'a, T>>;
    type Item = (f64, &'a T);

    fn into_iter(self) -> Self::IntoIter {
        self.time_points.iter().copied().zip(self.values.iter())
    }
}
