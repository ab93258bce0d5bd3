//! # capgov-alert
//!
//! The dashboard-facing governance scan. Unlike the validator it carries no
//! proposal: it walks *all* existing commitments, finds the worst shortage
//! or near-capacity week per role across every portfolio, and rolls the
//! findings up into a single governance status. No admission decision is
//! implied; the output exists so a human can rebalance before the validator
//! starts rejecting.
#![deny(unsafe_code)]

use tracing::{info, warn};

use capgov_capacity::CapacityModel;
use capgov_demand::DemandAggregator;
use capgov_types::{
    AlertStatus, Commitment, GovernanceAlert, GovernanceBaseline, Portfolio, Role, RoleAlert,
    WeekKey, EPSILON,
};

/// Peak utilization (percent) at or above which a role without a shortage
/// is still flagged for attention.
pub const WARNING_UTILIZATION_THRESHOLD: f64 = 85.0;

/// One observed (portfolio, week) data point for a role.
#[derive(Clone, Copy, Debug)]
struct Observation {
    portfolio: Portfolio,
    week: WeekKey,
    demand: f64,
    capacity: f64,
    /// Meaningless (absent) when the lane has no capacity configured.
    utilization_pct: Option<f64>,
    required_extra_fte: f64,
}

/// Whole-portfolio governance scan over one snapshot.
pub struct GovernanceAlertBuilder<'a> {
    baseline: Option<&'a GovernanceBaseline>,
    commitments: &'a [Commitment],
}

impl<'a> GovernanceAlertBuilder<'a> {
    pub fn new(baseline: Option<&'a GovernanceBaseline>, commitments: &'a [Commitment]) -> Self {
        Self {
            baseline,
            commitments,
        }
    }

    pub fn build(&self) -> GovernanceAlert {
        let Some(cfg) = self.baseline else {
            warn!("governance baseline missing; dashboard alert degraded to critical");
            return GovernanceAlert {
                status: AlertStatus::Critical,
                message: "Governance configuration missing. Configure team capacity and \
                          portfolio quotas before committing resources."
                    .to_string(),
                shortage_roles: Vec::new(),
                warning_roles: Vec::new(),
                unscheduled_demand_items: 0,
                role_alerts: Vec::new(),
            };
        };

        let usage = DemandAggregator::new(self.commitments).weekly(None);
        let model = CapacityModel::new(Some(cfg));
        let last_week = usage.all_weeks().last().copied();

        let mut role_alerts = Vec::new();
        let mut shortage_roles = Vec::new();
        let mut warning_roles = Vec::new();

        for role in Role::ALL {
            let mut worst_shortage: Option<Observation> = None;
            let mut peak_utilization: Option<Observation> = None;

            for portfolio in Portfolio::ALL {
                let capacity = model.weekly_capacity(role, portfolio);
                for week in usage.weeks_for(portfolio) {
                    let demand = usage.get(portfolio, week, role);
                    let observation = observe(portfolio, week, demand, capacity);

                    let best_required = worst_shortage.map_or(0.0, |o| o.required_extra_fte);
                    if observation.required_extra_fte > best_required + EPSILON {
                        worst_shortage = Some(observation);
                    }
                    if let Some(pct) = observation.utilization_pct {
                        let best_pct = peak_utilization
                            .and_then(|o| o.utilization_pct)
                            .unwrap_or(0.0);
                        if pct > best_pct + EPSILON {
                            peak_utilization = Some(observation);
                        }
                    }
                }
            }

            match (worst_shortage, peak_utilization) {
                (Some(shortage), _) if shortage.required_extra_fte > EPSILON => {
                    shortage_roles.push(role);
                    role_alerts.push(RoleAlert {
                        role,
                        status: AlertStatus::Critical,
                        portfolio: Some(shortage.portfolio),
                        peak_week: Some(shortage.week),
                        peak_demand_fte: shortage.demand,
                        capacity_fte: shortage.capacity,
                        required_extra_fte: shortage.required_extra_fte,
                        peak_utilization_pct: shortage.utilization_pct,
                    });
                }
                (_, Some(peak))
                    if peak.utilization_pct.unwrap_or(0.0)
                        >= WARNING_UTILIZATION_THRESHOLD - EPSILON =>
                {
                    warning_roles.push(role);
                    role_alerts.push(RoleAlert {
                        role,
                        status: AlertStatus::Warning,
                        portfolio: Some(peak.portfolio),
                        peak_week: Some(peak.week),
                        peak_demand_fte: peak.demand,
                        capacity_fte: peak.capacity,
                        required_extra_fte: 0.0,
                        peak_utilization_pct: peak.utilization_pct,
                    });
                }
                _ => {
                    role_alerts.push(RoleAlert {
                        role,
                        status: AlertStatus::Ok,
                        portfolio: None,
                        peak_week: last_week,
                        peak_demand_fte: 0.0,
                        capacity_fte: 0.0,
                        required_extra_fte: 0.0,
                        peak_utilization_pct: Some(0.0),
                    });
                }
            }
        }

        let status = role_alerts
            .iter()
            .map(|alert| alert.status)
            .max()
            .unwrap_or(AlertStatus::Ok);
        let mut message = compose_message(status, &role_alerts);
        let unscheduled_demand_items = usage.unscheduled_demand_items();
        if unscheduled_demand_items > 0 {
            message = format!("{message} Unscheduled demand items: {unscheduled_demand_items}.");
        }
        info!(
            %status,
            shortages = shortage_roles.len(),
            warnings = warning_roles.len(),
            unscheduled = unscheduled_demand_items,
            "governance alert composed"
        );

        GovernanceAlert {
            status,
            message,
            shortage_roles,
            warning_roles,
            unscheduled_demand_items,
            role_alerts,
        }
    }
}

fn observe(portfolio: Portfolio, week: WeekKey, demand: f64, capacity: f64) -> Observation {
    let (utilization_pct, required_extra_fte) = if capacity <= EPSILON {
        let utilization = (demand <= EPSILON).then_some(0.0);
        let required = if demand > EPSILON { demand } else { 0.0 };
        (utilization, required)
    } else {
        (
            Some(demand / capacity * 100.0),
            (demand - capacity).max(0.0),
        )
    };
    Observation {
        portfolio,
        week,
        demand,
        capacity,
        utilization_pct,
        required_extra_fte,
    }
}

fn compose_message(status: AlertStatus, role_alerts: &[RoleAlert]) -> String {
    match status {
        AlertStatus::Critical => {
            let detail: Vec<String> = role_alerts
                .iter()
                .filter(|alert| alert.status == AlertStatus::Critical)
                .map(|alert| format!("{} (+{:.2} FTE)", alert.role, alert.required_extra_fte))
                .collect();
            format!(
                "Additional resources required for roadmap commitments: {}.",
                detail.join(", ")
            )
        }
        AlertStatus::Warning => {
            let detail: Vec<String> = role_alerts
                .iter()
                .filter(|alert| alert.status == AlertStatus::Warning)
                .map(|alert| {
                    format!(
                        "{} ({:.2}%)",
                        alert.role,
                        alert.peak_utilization_pct.unwrap_or(0.0)
                    )
                })
                .collect();
            format!(
                "Capacity risk nearing limit (>= {WARNING_UTILIZATION_THRESHOLD}%): {}.",
                detail.join(", ")
            )
        }
        AlertStatus::Ok => "Roadmap demand is within configured capacity limits.".to_string(),
    }
}
