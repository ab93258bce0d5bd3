//! The shared lane-audit core.
//!
//! Both validation paths reduce to the same question, asked once per bucket:
//! given this lane's capacity, its existing usage, and the proposed
//! increment, does the post-commit usage breach? The aggregate path asks it
//! for one duration-weighted bucket per lane; the timeline path asks it for
//! every spanned week. The arithmetic lives here so the two paths can never
//! drift apart.

use capgov_types::{Role, Utilization, WeekKey, EPSILON};

/// How a lane breached.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BreachKind {
    /// Capacity is configured and the post-commit usage exceeds it.
    Exceeded,
    /// No capacity is configured for the lane at all, yet demand exists.
    /// Requires a configuration fix, not a smaller commitment.
    Unprovisioned,
}

/// Outcome of checking one (capacity, post-commit usage) bucket.
#[derive(Clone, Copy, Debug)]
pub(crate) struct BucketAssessment {
    pub utilization: Utilization,
    pub breach: Option<BreachKind>,
}

/// Assess one bucket.
///
/// Zero capacity with zero usage reads as an exact 0% (nothing was asked
/// for); zero capacity with any usage is an unprovisioned breach carrying
/// the not-applicable marker. With capacity configured, the breach line is
/// `100% + EPSILON` so exact-boundary commitments survive float noise.
pub(crate) fn assess_bucket(capacity: f64, next_usage: f64) -> BucketAssessment {
    if capacity <= EPSILON {
        if next_usage <= EPSILON {
            BucketAssessment {
                utilization: Utilization::Percent(0.0),
                breach: None,
            }
        } else {
            BucketAssessment {
                utilization: Utilization::NotApplicable,
                breach: Some(BreachKind::Unprovisioned),
            }
        }
    } else {
        let pct = next_usage / capacity * 100.0;
        BucketAssessment {
            utilization: Utilization::Percent(pct),
            breach: (pct > 100.0 + EPSILON).then_some(BreachKind::Exceeded),
        }
    }
}

/// Per-lane accumulator across a sequence of buckets.
///
/// Tracks the peak utilization (the not-applicable marker dominates numeric
/// readings), the breach kind, and the first bucket's week at which the lane
/// breached. Buckets must be fed in chronological order for the first-breach
/// week to be meaningful.
#[derive(Clone, Debug)]
pub(crate) struct LaneAudit {
    pub role: Role,
    peak: Utilization,
    breach: Option<BreachKind>,
    first_breach_week: Option<WeekKey>,
}

impl LaneAudit {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            peak: Utilization::Percent(0.0),
            breach: None,
            first_breach_week: None,
        }
    }

    pub fn record(&mut self, assessment: BucketAssessment, week: Option<WeekKey>) {
        match (self.peak, assessment.utilization) {
            (Utilization::NotApplicable, _) => {}
            (_, Utilization::NotApplicable) => self.peak = Utilization::NotApplicable,
            (Utilization::Percent(current), Utilization::Percent(pct)) if pct > current => {
                self.peak = Utilization::Percent(pct);
            }
            _ => {}
        }
        if let Some(kind) = assessment.breach {
            if self.breach.is_none() {
                self.breach = Some(kind);
                self.first_breach_week = week;
            }
        }
    }

    pub fn peak(&self) -> Utilization {
        self.peak
    }

    pub fn breach(&self) -> Option<BreachKind> {
        self.breach
    }

    pub fn first_breach_week(&self) -> Option<WeekKey> {
        self.first_breach_week
    }
}
