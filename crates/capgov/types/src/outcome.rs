//! Decision and alert outcome types.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::role::{Portfolio, Role};
use crate::week::WeekKey;
use crate::EPSILON;

/// A per-role utilization reading.
///
/// `NotApplicable` marks the zero-capacity condition: demand exists but no
/// capacity is configured, so a percentage would be meaningless. A role with
/// zero capacity *and* zero demand reads as `Percent(0.0)`, never
/// `NotApplicable`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Utilization {
    Percent(f64),
    NotApplicable,
}

impl Utilization {
    pub fn percent(self) -> Option<f64> {
        match self {
            Utilization::Percent(pct) => Some(pct),
            Utilization::NotApplicable => None,
        }
    }

    pub fn is_not_applicable(self) -> bool {
        matches!(self, Utilization::NotApplicable)
    }
}

impl fmt::Display for Utilization {
    /// Wire rendering: `"24.89%"`, `"0%"` for an exact zero, `"n/a"`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Utilization::Percent(pct) if pct.abs() <= EPSILON => f.write_str("0%"),
            Utilization::Percent(pct) => write!(f, "{pct:.2}%"),
            Utilization::NotApplicable => f.write_str("n/a"),
        }
    }
}

/// Admission decision status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationStatus {
    Approved,
    Rejected,
}

impl ValidationStatus {
    pub fn is_approved(self) -> bool {
        matches!(self, ValidationStatus::Approved)
    }
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ValidationStatus::Approved => "APPROVED",
            ValidationStatus::Rejected => "REJECTED",
        })
    }
}

/// Outcome of a capacity validation call.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ValidationResult {
    pub status: ValidationStatus,
    /// Lanes that breached, in canonical lane order.
    pub breach_roles: Vec<Role>,
    /// Peak utilization observed per lane.
    pub utilization: BTreeMap<Role, Utilization>,
    /// For timeline validations, the first week each breaching lane crossed
    /// its capacity. Diagnostic only.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub first_breach_week: BTreeMap<Role, WeekKey>,
    pub reason: String,
}

impl ValidationResult {
    pub fn is_approved(&self) -> bool {
        self.status.is_approved()
    }
}

/// Dashboard alert severity. Ordering is by severity, so the overall status
/// is the `max` across roles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertStatus {
    Ok,
    Warning,
    Critical,
}

impl fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AlertStatus::Ok => "OK",
            AlertStatus::Warning => "WARNING",
            AlertStatus::Critical => "CRITICAL",
        })
    }
}

/// The worst observed condition for one role across every portfolio/week.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoleAlert {
    pub role: Role,
    pub status: AlertStatus,
    /// Portfolio of the worst occurrence; absent for an OK role.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portfolio: Option<Portfolio>,
    /// Week of the worst occurrence (for OK roles, the last observed week).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peak_week: Option<WeekKey>,
    pub peak_demand_fte: f64,
    pub capacity_fte: f64,
    pub required_extra_fte: f64,
    /// Peak utilization percentage; absent when the worst occurrence hit a
    /// zero-capacity lane (no meaningful percentage exists).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peak_utilization_pct: Option<f64>,
}

/// The dashboard governance alert payload.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GovernanceAlert {
    pub status: AlertStatus,
    pub message: String,
    pub shortage_roles: Vec<Role>,
    pub warning_roles: Vec<Role>,
    pub unscheduled_demand_items: usize,
    pub role_alerts: Vec<RoleAlert>,
}
