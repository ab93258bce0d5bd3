//! # capgov-validate
//!
//! The admission decision function. Given a snapshot of the governance
//! baseline and the existing commitments, plus a proposed incremental
//! demand, decides APPROVED or REJECTED with per-role diagnostics.
//!
//! Two public operations share one audit core (see [`audit`]):
//!
//! - [`Validator::validate_aggregate`] checks duration-weighted person-week
//!   usage against annual capacity, one bucket per lane.
//! - [`Validator::validate_timeline`] checks FTE usage against weekly
//!   capacity for every ISO week a planned date range spans, tracking the
//!   peak per lane and the first breach week.
//!
//! Both are pure: the baseline and commitment snapshots are taken as
//! parameters, nothing is cached, and no error escapes. Every input,
//! however malformed, maps to a `ValidationResult`.
#![deny(unsafe_code)]

mod audit;

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::{debug, warn};

use capgov_capacity::CapacityModel;
use capgov_demand::DemandAggregator;
use capgov_types::{
    Commitment, CommitmentId, GovernanceBaseline, Portfolio, Role, RoleMap, Utilization,
    ValidationResult, ValidationStatus, WeekKey,
};

use audit::{assess_bucket, BreachKind, LaneAudit};

/// Capacity validator over one (baseline, commitments) snapshot.
pub struct Validator<'a> {
    baseline: Option<&'a GovernanceBaseline>,
    commitments: &'a [Commitment],
}

impl<'a> Validator<'a> {
    pub fn new(baseline: Option<&'a GovernanceBaseline>, commitments: &'a [Commitment]) -> Self {
        Self {
            baseline,
            commitments,
        }
    }

    /// Validate a proposal against annual capacity using the
    /// duration-weighted aggregate view.
    ///
    /// `duration_weeks` scales the proposed demand into person-weeks and
    /// defaults to one week when non-positive. `exclude` removes an existing
    /// commitment from the usage snapshot, so an admitted commitment can be
    /// re-validated against its own unchanged values.
    pub fn validate_aggregate(
        &self,
        portfolio: Portfolio,
        proposed: &RoleMap<f64>,
        duration_weeks: i64,
        exclude: Option<CommitmentId>,
    ) -> ValidationResult {
        let model = CapacityModel::new(self.baseline);
        let usage = DemandAggregator::new(self.commitments).aggregate(exclude);
        let duration = if duration_weeks > 0 {
            duration_weeks as f64
        } else {
            1.0
        };

        let mut audits: Vec<LaneAudit> = Role::LANES.iter().map(|&r| LaneAudit::new(r)).collect();
        for lane_audit in &mut audits {
            let lane = lane_audit.role;
            let capacity = model.annual_capacity(lane, portfolio);
            let next = usage.get(portfolio, lane) + proposed[lane].max(0.0) * duration;
            lane_audit.record(assess_bucket(capacity, next), None);
        }
        self.finish(portfolio, audits, "annual capacity")
    }

    /// Validate a proposal against weekly capacity for every ISO week the
    /// planned date range spans.
    ///
    /// The caller chose the timeline path by supplying dates, so a
    /// malformed range is rejected with a parse-specific reason rather than
    /// silently degraded to the aggregate path.
    pub fn validate_timeline(
        &self,
        portfolio: Portfolio,
        proposed: &RoleMap<f64>,
        start_date: &str,
        end_date: &str,
        exclude: Option<CommitmentId>,
    ) -> ValidationResult {
        let (start, end) = match parse_range(start_date, end_date) {
            Ok(range) => range,
            Err(detail) => {
                warn!(%detail, "timeline validation rejected malformed date range");
                return rejected_for_range(detail);
            }
        };
        let weeks = WeekKey::span(start, end);
        let model = CapacityModel::new(self.baseline);
        let usage = DemandAggregator::new(self.commitments).weekly(exclude);

        let mut audits: Vec<LaneAudit> = Role::LANES.iter().map(|&r| LaneAudit::new(r)).collect();
        for lane_audit in &mut audits {
            let lane = lane_audit.role;
            let capacity = model.weekly_capacity(lane, portfolio);
            let increment = proposed[lane].max(0.0);
            for &week in &weeks {
                let next = usage.get(portfolio, week, lane) + increment;
                lane_audit.record(assess_bucket(capacity, next), Some(week));
            }
        }
        let scope = format!("weekly capacity across {} week(s)", weeks.len());
        self.finish(portfolio, audits, &scope)
    }

    fn finish(&self, portfolio: Portfolio, audits: Vec<LaneAudit>, scope: &str) -> ValidationResult {
        let mut breach_roles = Vec::new();
        let mut utilization = BTreeMap::new();
        let mut first_breach_week = BTreeMap::new();
        let mut exceeded = Vec::new();
        let mut unprovisioned = Vec::new();

        for lane_audit in &audits {
            utilization.insert(lane_audit.role, lane_audit.peak());
            let Some(kind) = lane_audit.breach() else {
                continue;
            };
            breach_roles.push(lane_audit.role);
            if let Some(week) = lane_audit.first_breach_week() {
                first_breach_week.insert(lane_audit.role, week);
            }
            match kind {
                BreachKind::Exceeded => exceeded.push(lane_audit),
                BreachKind::Unprovisioned => unprovisioned.push(lane_audit),
            }
        }

        if breach_roles.is_empty() {
            debug!(%portfolio, scope, "capacity validation passed");
            return ValidationResult {
                status: ValidationStatus::Approved,
                breach_roles,
                utilization,
                first_breach_week,
                reason: format!("All roles within {scope} for the {portfolio} portfolio."),
            };
        }

        let mut parts = Vec::new();
        if !exceeded.is_empty() {
            let items: Vec<String> = exceeded
                .iter()
                .map(|a| match a.first_breach_week() {
                    Some(week) => format!("{} ({} at {week})", a.role, a.peak()),
                    None => format!("{} ({})", a.role, a.peak()),
                })
                .collect();
            parts.push(format!("capacity exceeded for {}", items.join(", ")));
        }
        if !unprovisioned.is_empty() {
            let items: Vec<&str> = unprovisioned.iter().map(|a| a.role.code()).collect();
            parts.push(format!("no configured capacity for {}", items.join(", ")));
        }
        let reason = if self.baseline.is_none() {
            format!(
                "Governance baseline is missing, so all roles are treated as zero capacity. \
                 Rejected: {}. Configure team capacity and portfolio quotas first.",
                parts.join("; ")
            )
        } else {
            format!("Rejected: {}.", parts.join("; "))
        };
        warn!(
            %portfolio,
            scope,
            breaches = breach_roles.len(),
            "capacity validation rejected commitment"
        );

        ValidationResult {
            status: ValidationStatus::Rejected,
            breach_roles,
            utilization,
            first_breach_week,
            reason,
        }
    }
}

fn parse_range(start_raw: &str, end_raw: &str) -> Result<(NaiveDate, NaiveDate), String> {
    let start_raw = start_raw.trim();
    let end_raw = end_raw.trim();
    if start_raw.is_empty() || end_raw.is_empty() {
        return Err("planned start and end dates are required".to_string());
    }
    let start: NaiveDate = start_raw
        .parse()
        .map_err(|_| format!("start date {start_raw:?} is not a valid ISO date"))?;
    let end: NaiveDate = end_raw
        .parse()
        .map_err(|_| format!("end date {end_raw:?} is not a valid ISO date"))?;
    if end < start {
        return Err(format!("end date {end_raw} precedes start date {start_raw}"));
    }
    Ok((start, end))
}

fn rejected_for_range(detail: String) -> ValidationResult {
    let utilization = Role::LANES
        .iter()
        .map(|&lane| (lane, Utilization::Percent(0.0)))
        .collect();
    ValidationResult {
        status: ValidationStatus::Rejected,
        breach_roles: Vec::new(),
        utilization,
        first_breach_week: BTreeMap::new(),
        reason: format!("Rejected: invalid planned date range ({detail})."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn client_baseline(team: u32, efficiency: f64, quota: f64) -> GovernanceBaseline {
        GovernanceBaseline::new()
            .with_role(Role::Fe, team, efficiency)
            .with_quota(Role::Fe, Portfolio::Client, quota)
    }

    fn fe(fte: f64) -> RoleMap<f64> {
        RoleMap::new().with(Role::Fe, fte)
    }

    #[test]
    fn aggregate_admits_within_annual_capacity() {
        // Capacity 10 × 0.85 × 52 × 0.60 = 265.2 pw; existing 48 pw;
        // proposal 3.0 FTE × 6 weeks = 18 pw; next 66 pw = 24.89%.
        let baseline = client_baseline(10, 0.85, 0.60);
        let existing = vec![Commitment::new(Portfolio::Client)
            .with_demand(Role::Fe, 4.0)
            .with_duration(12)];
        let result = Validator::new(Some(&baseline), &existing).validate_aggregate(
            Portfolio::Client,
            &fe(3.0),
            6,
            None,
        );
        assert!(result.is_approved());
        assert!(result.breach_roles.is_empty());
        let pct = result.utilization[&Role::Fe].percent().unwrap();
        assert!((pct - 66.0 / 265.2 * 100.0).abs() < 1e-9);
        assert_eq!(result.utilization[&Role::Fe].to_string(), "24.89%");
    }

    #[test]
    fn aggregate_rejects_over_annual_capacity() {
        // Capacity 1 × 1.0 × 52 × 1.0 = 52 pw.
        let baseline = client_baseline(1, 1.0, 1.0);
        let result = Validator::new(Some(&baseline), &[]).validate_aggregate(
            Portfolio::Client,
            &fe(2.0),
            30,
            None,
        );
        assert!(!result.is_approved());
        assert_eq!(result.breach_roles, vec![Role::Fe]);
        assert!(result.reason.contains("capacity exceeded for FE"));
    }

    #[test]
    fn aggregate_boundary_is_admitted_and_epsilon_above_is_not() {
        let baseline = client_baseline(1, 1.0, 1.0); // 52 pw annual
        let validator = Validator::new(Some(&baseline), &[]);
        let exact = validator.validate_aggregate(Portfolio::Client, &fe(52.0), 1, None);
        assert!(exact.is_approved());

        let above = validator.validate_aggregate(Portfolio::Client, &fe(52.001), 1, None);
        assert!(!above.is_approved());
    }

    #[test]
    fn aggregate_defaults_non_positive_duration_to_one_week() {
        let baseline = client_baseline(1, 1.0, 1.0); // 52 pw annual
        let validator = Validator::new(Some(&baseline), &[]);
        // 40 FTE × 1 week (defaulted from 0) = 40 pw: fits.
        assert!(validator
            .validate_aggregate(Portfolio::Client, &fe(40.0), 0, None)
            .is_approved());
        assert!(validator
            .validate_aggregate(Portfolio::Client, &fe(40.0), -5, None)
            .is_approved());
    }

    #[test]
    fn aggregate_clamps_negative_proposed_demand() {
        let baseline = client_baseline(1, 1.0, 1.0);
        let result = Validator::new(Some(&baseline), &[]).validate_aggregate(
            Portfolio::Client,
            &fe(-10.0),
            4,
            None,
        );
        assert!(result.is_approved());
        assert_eq!(result.utilization[&Role::Fe].to_string(), "0%");
    }

    #[test]
    fn timeline_rejects_week_level_overload() {
        // Weekly capacity 6 × 0.80 × 0.70 = 3.36 FTE; W37 existing load
        // 1.40 + 1.10 + 0.95 = 3.45; +0.40 = 3.85 FTE = 114.58%.
        let baseline = client_baseline(6, 0.80, 0.70);
        let existing = vec![
            Commitment::new(Portfolio::Client)
                .with_demand(Role::Fe, 1.40)
                .with_window("2025-09-08", "2025-09-14"),
            Commitment::new(Portfolio::Client)
                .with_demand(Role::Fe, 1.10)
                .with_window("2025-09-10", "2025-09-12"),
            Commitment::new(Portfolio::Client)
                .with_demand(Role::Fe, 0.95)
                .with_window("2025-09-12", "2025-09-14"),
        ];
        let result = Validator::new(Some(&baseline), &existing).validate_timeline(
            Portfolio::Client,
            &fe(0.40),
            "2025-09-08",
            "2025-09-14",
            None,
        );
        assert!(!result.is_approved());
        assert_eq!(result.breach_roles, vec![Role::Fe]);
        let pct = result.utilization[&Role::Fe].percent().unwrap();
        assert!((pct - 3.85 / 3.36 * 100.0).abs() < 1e-9);
        assert_eq!(result.utilization[&Role::Fe].to_string(), "114.58%");
        assert_eq!(
            result.first_breach_week[&Role::Fe],
            WeekKey { year: 2025, week: 37 }
        );
        assert!(result.reason.contains("2025-W37"));
    }

    #[test]
    fn timeline_tracks_peak_across_weeks_and_first_breach_week() {
        // Capacity 2.0 FTE. W37 load 1.0, W38 load 2.5, W39 load 2.2.
        let baseline = client_baseline(2, 1.0, 1.0);
        let existing = vec![
            Commitment::new(Portfolio::Client)
                .with_demand(Role::Fe, 1.0)
                .with_window("2025-09-08", "2025-09-14"),
            Commitment::new(Portfolio::Client)
                .with_demand(Role::Fe, 2.5)
                .with_window("2025-09-15", "2025-09-21"),
            Commitment::new(Portfolio::Client)
                .with_demand(Role::Fe, 2.2)
                .with_window("2025-09-22", "2025-09-28"),
        ];
        let result = Validator::new(Some(&baseline), &existing).validate_timeline(
            Portfolio::Client,
            &fe(0.0),
            "2025-09-08",
            "2025-09-28",
            None,
        );
        assert!(!result.is_approved());
        // Peak is W38's 125%, but the first breach is also W38.
        let pct = result.utilization[&Role::Fe].percent().unwrap();
        assert!((pct - 125.0).abs() < 1e-9);
        assert_eq!(
            result.first_breach_week[&Role::Fe],
            WeekKey { year: 2025, week: 38 }
        );
    }

    #[test]
    fn timeline_rejects_malformed_ranges_outright() {
        let baseline = client_baseline(6, 0.80, 0.70);
        let validator = Validator::new(Some(&baseline), &[]);

        let missing = validator.validate_timeline(Portfolio::Client, &fe(0.1), "", "", None);
        assert!(!missing.is_approved());
        assert!(missing.reason.contains("invalid planned date range"));

        let garbled =
            validator.validate_timeline(Portfolio::Client, &fe(0.1), "next sprint", "2025-09-14", None);
        assert!(!garbled.is_approved());
        assert!(garbled.reason.contains("not a valid ISO date"));

        let reversed =
            validator.validate_timeline(Portfolio::Client, &fe(0.1), "2025-09-14", "2025-09-08", None);
        assert!(!reversed.is_approved());
        assert!(reversed.reason.contains("precedes"));
        assert!(reversed.breach_roles.is_empty());
    }

    #[test]
    fn zero_capacity_with_demand_is_a_distinct_breach() {
        // FE is provisioned; AI has no quota anywhere.
        let baseline = client_baseline(10, 0.85, 0.60);
        let proposal = RoleMap::new().with(Role::Fe, 1.0).with(Role::Ai, 1.0);
        let result = Validator::new(Some(&baseline), &[]).validate_aggregate(
            Portfolio::Client,
            &proposal,
            4,
            None,
        );
        assert!(!result.is_approved());
        assert_eq!(result.breach_roles, vec![Role::Ai]);
        assert!(result.utilization[&Role::Ai].is_not_applicable());
        assert_eq!(result.utilization[&Role::Ai].to_string(), "n/a");
        assert!(result.reason.contains("no configured capacity for AI"));
        assert!(!result.reason.contains("capacity exceeded"));
    }

    #[test]
    fn zero_capacity_with_zero_demand_reads_zero_percent() {
        let baseline = client_baseline(10, 0.85, 0.60);
        let result = Validator::new(Some(&baseline), &[]).validate_aggregate(
            Portfolio::Client,
            &fe(1.0),
            4,
            None,
        );
        assert!(result.is_approved());
        assert_eq!(result.utilization[&Role::Ai].to_string(), "0%");
        assert_eq!(result.utilization[&Role::Pm].to_string(), "0%");
    }

    #[test]
    fn missing_baseline_fails_safe_to_denial() {
        let result = Validator::new(None, &[]).validate_aggregate(
            Portfolio::Client,
            &fe(0.1),
            1,
            None,
        );
        assert!(!result.is_approved());
        assert_eq!(result.breach_roles, vec![Role::Fe]);
        assert!(result.reason.contains("Governance baseline is missing"));

        // Asking for nothing breaches nothing, even unconfigured.
        let idle = Validator::new(None, &[]).validate_aggregate(
            Portfolio::Client,
            &RoleMap::new(),
            1,
            None,
        );
        assert!(idle.is_approved());
        assert_eq!(idle.utilization[&Role::Fe].to_string(), "0%");
    }

    #[test]
    fn self_revalidation_reproduces_approval_on_aggregate_path() {
        // Capacity 52 pw; the admitted commitment consumes 40 of them.
        let baseline = client_baseline(1, 1.0, 1.0);
        let admitted = Commitment::new(Portfolio::Client)
            .with_demand(Role::Fe, 10.0)
            .with_duration(4);
        let commitments = vec![admitted.clone()];
        let validator = Validator::new(Some(&baseline), &commitments);

        let again = validator.validate_aggregate(
            Portfolio::Client,
            &fe(10.0),
            4,
            Some(admitted.id),
        );
        assert!(again.is_approved());

        // Without self-exclusion the same values double-count and breach.
        let doubled = validator.validate_aggregate(Portfolio::Client, &fe(10.0), 4, None);
        assert!(!doubled.is_approved());
    }

    #[test]
    fn self_revalidation_reproduces_approval_on_timeline_path() {
        let baseline = client_baseline(2, 1.0, 1.0); // 2.0 FTE weekly
        let admitted = Commitment::new(Portfolio::Client)
            .with_demand(Role::Fe, 1.5)
            .with_window("2025-09-08", "2025-09-21");
        let commitments = vec![admitted.clone()];
        let validator = Validator::new(Some(&baseline), &commitments);

        let again = validator.validate_timeline(
            Portfolio::Client,
            &fe(1.5),
            "2025-09-08",
            "2025-09-21",
            Some(admitted.id),
        );
        assert!(again.is_approved());

        let doubled = validator.validate_timeline(
            Portfolio::Client,
            &fe(1.5),
            "2025-09-08",
            "2025-09-21",
            None,
        );
        assert!(!doubled.is_approved());
    }

    #[test]
    fn usage_in_other_portfolios_does_not_count() {
        let baseline = client_baseline(1, 1.0, 1.0)
            .with_quota(Role::Fe, Portfolio::Internal, 1.0);
        let existing = vec![Commitment::new(Portfolio::Internal)
            .with_demand(Role::Fe, 10.0)
            .with_duration(5)];
        let result = Validator::new(Some(&baseline), &existing).validate_aggregate(
            Portfolio::Client,
            &fe(1.0),
            4,
            None,
        );
        assert!(result.is_approved());
    }

    proptest! {
        /// If proposal A breaches, any component-wise larger proposal B must
        /// also breach (for the same snapshot of existing usage).
        #[test]
        fn rejection_is_upward_monotone(
            base in proptest::collection::vec(0.0f64..4.0, 4),
            extra in proptest::collection::vec(0.0f64..4.0, 4),
        ) {
            let baseline = GovernanceBaseline::new()
                .with_role(Role::Fe, 2, 0.8)
                .with_role(Role::Be, 1, 0.9)
                .with_role(Role::Pm, 1, 0.5)
                .with_quota(Role::Fe, Portfolio::Client, 0.6)
                .with_quota(Role::Be, Portfolio::Client, 0.5)
                .with_quota(Role::Pm, Portfolio::Client, 0.3);
            let existing = vec![Commitment::new(Portfolio::Client)
                .with_demand(Role::Fe, 0.5)
                .with_demand(Role::Be, 0.3)
                .with_duration(8)];
            let validator = Validator::new(Some(&baseline), &existing);

            let mut smaller = RoleMap::new();
            let mut larger = RoleMap::new();
            for (i, &lane) in Role::LANES.iter().enumerate() {
                smaller[lane] = base[i];
                larger[lane] = base[i] + extra[i];
            }

            let small = validator.validate_aggregate(Portfolio::Client, &smaller, 6, None);
            let large = validator.validate_aggregate(Portfolio::Client, &larger, 6, None);
            if !small.is_approved() {
                prop_assert!(!large.is_approved());
            }
            // Equivalently: approving the larger proposal implies the
            // smaller one was approvable too.
            if large.is_approved() {
                prop_assert!(small.is_approved());
            }
        }

        /// With capacity configured, utilization never decreases as the
        /// proposed demand grows.
        #[test]
        fn utilization_is_monotone_in_demand(
            demand in 0.0f64..30.0,
            bump in 0.0f64..10.0,
        ) {
            let baseline = GovernanceBaseline::new()
                .with_role(Role::Fe, 3, 0.9)
                .with_quota(Role::Fe, Portfolio::Client, 0.7);
            let validator = Validator::new(Some(&baseline), &[]);
            let lo = validator
                .validate_aggregate(Portfolio::Client, &RoleMap::new().with(Role::Fe, demand), 4, None)
                .utilization[&Role::Fe]
                .percent()
                .unwrap();
            let hi = validator
                .validate_aggregate(
                    Portfolio::Client,
                    &RoleMap::new().with(Role::Fe, demand + bump),
                    4,
                    None,
                )
                .utilization[&Role::Fe]
                .percent()
                .unwrap();
            prop_assert!(hi >= lo);
        }
    }
}
