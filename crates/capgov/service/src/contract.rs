//! The wire-stable validation contract.
//!
//! Downstream reporting depends on this exact shape; field names, status
//! codes, and the percentage string formats must not drift.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use capgov_types::{CommitmentId, Role, RoleMap, Utilization, ValidationResult, ValidationStatus};

/// An admission validation request.
///
/// Mirrors what the intake UI submits: per-lane FTE figures, a tentative
/// duration for the aggregate path, and optional planned dates. Supplying
/// both dates selects the timeline path.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationRequest {
    pub portfolio: String,
    pub tentative_duration_weeks: i64,
    pub planned_start_date: String,
    pub planned_end_date: String,
    pub fe_fte: f64,
    pub be_fte: f64,
    pub ai_fte: f64,
    pub pm_fte: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_commitment_id: Option<CommitmentId>,
}

impl Default for ValidationRequest {
    fn default() -> Self {
        Self {
            portfolio: "internal".to_string(),
            tentative_duration_weeks: 1,
            planned_start_date: String::new(),
            planned_end_date: String::new(),
            fe_fte: 0.0,
            be_fte: 0.0,
            ai_fte: 0.0,
            pm_fte: 0.0,
            exclude_commitment_id: None,
        }
    }
}

impl ValidationRequest {
    /// The proposed per-lane demand as a role map (FS is never proposed).
    pub fn demand(&self) -> RoleMap<f64> {
        RoleMap::new()
            .with(Role::Fe, self.fe_fte)
            .with(Role::Be, self.be_fte)
            .with(Role::Ai, self.ai_fte)
            .with(Role::Pm, self.pm_fte)
    }

    /// Whether the caller supplied a full planned date pair.
    pub fn has_timeline(&self) -> bool {
        !self.planned_start_date.trim().is_empty() && !self.planned_end_date.trim().is_empty()
    }
}

/// An admission validation response.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ValidationResponse {
    pub status: ValidationStatus,
    pub breach_roles: Vec<Role>,
    /// Per-lane utilization strings: `"24.89%"`, `"0%"`, or `"n/a"` for a
    /// lane with demand but no configured capacity.
    pub utilization_percentage: BTreeMap<String, String>,
    pub reason: String,
}

impl From<ValidationResult> for ValidationResponse {
    fn from(result: ValidationResult) -> Self {
        let mut utilization_percentage = BTreeMap::new();
        for lane in Role::LANES {
            let reading = result
                .utilization
                .get(&lane)
                .copied()
                .unwrap_or(Utilization::Percent(0.0));
            utilization_percentage.insert(lane.code().to_string(), reading.to_string());
        }
        Self {
            status: result.status,
            breach_roles: result.breach_roles,
            utilization_percentage,
            reason: result.reason,
        }
    }
}
