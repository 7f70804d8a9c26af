//! Time intervals and cluster assignments.

use serde::{Deserialize, Serialize};

/// A `(start, end)` time span of the source signal, in seconds.
///
/// Constructed through [`Interval::new`], which enforces finite bounds and
/// `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    start: f64,
    end: f64,
}

impl Interval {
    /// Create an interval, rejecting non-finite or non-increasing bounds.
    ///
    /// # Example
    /// ```
    /// use segsift::Interval;
    ///
    /// let iv = Interval::new(0.5, 1.25).unwrap();
    /// assert_eq!(iv.duration(), 0.75);
    /// assert!(Interval::new(1.0, 1.0).is_err());
    /// ```
    pub fn new(start: f64, end: f64) -> crate::Result<Self> {
        if !start.is_finite() || !end.is_finite() {
            return Err(crate::Error::InvalidInterval {
                start,
                end,
                reason: "bounds must be finite",
            });
        }
        if start >= end {
            return Err(crate::Error::InvalidInterval {
                start,
                end,
                reason: "start must be before end",
            });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Smallest interval covering every interval in `members`.
    ///
    /// Returns `None` for an empty slice.
    pub fn span<'a, I>(members: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Interval>,
    {
        members.into_iter().fold(None, |acc: Option<Interval>, iv| {
            Some(match acc {
                None => *iv,
                Some(a) => Interval {
                    start: a.start.min(iv.start),
                    end: a.end.max(iv.end),
                },
            })
        })
    }
}

/// Sort intervals by start time (then end time).
pub fn sort_by_start(intervals: &mut [Interval]) {
    intervals.sort_by(|a, b| a.start.total_cmp(&b.start).then(a.end.total_cmp(&b.end)));
}

/// Cluster membership for a list of intervals.
///
/// `Unclustered` routes output into a flat layout; `Clustered` carries one
/// cluster id per interval.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterAssignment {
    #[default]
    Unclustered,
    Clustered(Vec<usize>),
}

impl ClusterAssignment {
    /// Number of distinct clusters, 0 when unclustered.
    pub fn n_clusters(&self) -> usize {
        match self {
            ClusterAssignment::Unclustered => 0,
            ClusterAssignment::Clustered(labels) => {
                let mut seen: Vec<usize> = labels.clone();
                seen.sort_unstable();
                seen.dedup();
                seen.len()
            }
        }
    }

    /// Check that a clustered assignment has exactly one id per interval.
    pub fn check_len(&self, n_intervals: usize) -> crate::Result<()> {
        match self {
            ClusterAssignment::Clustered(labels) if labels.len() != n_intervals => {
                Err(crate::Error::ShapeMismatch {
                    expected: format!("{} cluster labels", n_intervals),
                    got: format!("{}", labels.len()),
                })
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_rejects_bad_bounds() {
        assert!(Interval::new(2.0, 1.0).is_err());
        assert!(Interval::new(f64::NAN, 1.0).is_err());
        assert!(Interval::new(0.0, f64::INFINITY).is_err());
        assert!(Interval::new(0.0, 1e-9).is_ok());
    }

    #[test]
    fn test_span() {
        let ivs = vec![
            Interval::new(3.0, 4.0).unwrap(),
            Interval::new(0.5, 1.0).unwrap(),
            Interval::new(2.0, 5.0).unwrap(),
        ];
        let span = Interval::span(&ivs).unwrap();
        assert_eq!((span.start(), span.end()), (0.5, 5.0));
        assert!(Interval::span(&Vec::<Interval>::new()).is_none());
    }

    #[test]
    fn test_sort_by_start() {
        let mut ivs = vec![
            Interval::new(2.0, 3.0).unwrap(),
            Interval::new(0.0, 1.0).unwrap(),
        ];
        sort_by_start(&mut ivs);
        assert_eq!(ivs[0].start(), 0.0);
    }

    #[test]
    fn test_assignment_len_check() {
        let labels = ClusterAssignment::Clustered(vec![0, 1, 1]);
        assert_eq!(labels.n_clusters(), 2);
        assert!(labels.check_len(3).is_ok());
        assert!(labels.check_len(2).is_err());
        assert!(ClusterAssignment::Unclustered.check_len(7).is_ok());
    }
}
