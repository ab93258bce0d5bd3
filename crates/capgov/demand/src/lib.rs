//! # capgov-demand
//!
//! Turns a snapshot of existing commitments into the two usage views the
//! validation and alerting layers compare against capacity:
//!
//! - a **duration-weighted aggregate** per (portfolio, role), in
//!   person-weeks, and
//! - **calendar-week buckets** per (portfolio, ISO week, role), in FTE.
//!
//! Self-exclusion (for "unlock and re-edit" revalidation) removes the target
//! commitment from the source set before aggregating, never by arithmetic
//! subtraction afterwards. Absent or malformed data is handled defensively:
//! a commitment with an unusable date range is skipped from weekly usage and
//! tallied as unscheduled demand instead of failing the call.
#![deny(unsafe_code)]

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use capgov_types::{Commitment, CommitmentId, Portfolio, Role, RoleMap, WeekKey};

/// Duration-weighted usage per (portfolio, role), in person-weeks.
#[derive(Clone, Debug, Default)]
pub struct AggregateUsage {
    totals: BTreeMap<Portfolio, RoleMap<f64>>,
}

impl AggregateUsage {
    pub fn get(&self, portfolio: Portfolio, role: Role) -> f64 {
        self.totals.get(&portfolio).map_or(0.0, |slot| slot[role])
    }
}

/// Calendar-week usage per (portfolio, week, role), in FTE, plus the tally
/// of demand that never reached a week bucket.
#[derive(Clone, Debug, Default)]
pub struct WeeklyUsage {
    buckets: BTreeMap<Portfolio, BTreeMap<WeekKey, RoleMap<f64>>>,
    unscheduled_demand_items: usize,
}

impl WeeklyUsage {
    pub fn get(&self, portfolio: Portfolio, week: WeekKey, role: Role) -> f64 {
        self.buckets
            .get(&portfolio)
            .and_then(|weeks| weeks.get(&week))
            .map_or(0.0, |slot| slot[role])
    }

    /// Weeks with any recorded demand for one portfolio, chronologically.
    pub fn weeks_for(&self, portfolio: Portfolio) -> Vec<WeekKey> {
        self.buckets
            .get(&portfolio)
            .map_or_else(Vec::new, |weeks| weeks.keys().copied().collect())
    }

    /// Weeks with any recorded demand across all portfolios,
    /// chronologically.
    pub fn all_weeks(&self) -> Vec<WeekKey> {
        self.buckets
            .values()
            .flat_map(|weeks| weeks.keys().copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Commitments carrying nonzero demand but no usable date range. They
    /// are invisible to weekly validation and must be surfaced by the
    /// dashboard so a human can schedule them.
    pub fn unscheduled_demand_items(&self) -> usize {
        self.unscheduled_demand_items
    }
}

/// Aggregation over one commitment snapshot.
pub struct DemandAggregator<'a> {
    commitments: &'a [Commitment],
}

impl<'a> DemandAggregator<'a> {
    pub fn new(commitments: &'a [Commitment]) -> Self {
        Self { commitments }
    }

    fn survivors(
        &self,
        exclude: Option<CommitmentId>,
    ) -> impl Iterator<Item = &'a Commitment> + '_ {
        self.commitments
            .iter()
            .filter(move |c| exclude != Some(c.id))
    }

    /// Duration-weighted aggregate usage.
    ///
    /// Each commitment contributes `demand × effective duration` to its
    /// portfolio, with the duration defaulting to one week when unset or
    /// non-positive.
    pub fn aggregate(&self, exclude: Option<CommitmentId>) -> AggregateUsage {
        let mut usage = AggregateUsage::default();
        for commitment in self.survivors(exclude) {
            let weeks = commitment.effective_duration_weeks();
            let slot = usage.totals.entry(commitment.portfolio).or_default();
            for role in Role::ALL {
                slot[role] += commitment.demand_for(role) * weeks;
            }
        }
        usage
    }

    /// Calendar-week usage.
    ///
    /// Each commitment with a usable planned window contributes its per-role
    /// demand to every ISO week the window spans. Commitments without a
    /// usable window are skipped; those among them that still carry demand
    /// are tallied as unscheduled.
    pub fn weekly(&self, exclude: Option<CommitmentId>) -> WeeklyUsage {
        let mut usage = WeeklyUsage::default();
        for commitment in self.survivors(exclude) {
            let Some(window) = commitment.planned_window() else {
                if commitment.has_demand() {
                    debug!(
                        commitment = %commitment.id,
                        "commitment carries demand but no usable planned window"
                    );
                    usage.unscheduled_demand_items += 1;
                }
                continue;
            };
            let portfolio_buckets = usage.buckets.entry(commitment.portfolio).or_default();
            for week in window.weeks() {
                let slot = portfolio_buckets.entry(week).or_default();
                for role in Role::ALL {
                    slot[role] += commitment.demand_for(role);
                }
            }
        }
        usage
    }
}
