//! The governance baseline: team sizes, efficiency coefficients, quotas.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::role::{Portfolio, Role, RoleMap};

/// Two-tier portfolio quota lookup.
///
/// Granular per-(role, portfolio) fractions are preferred. When a granular
/// entry is absent, resolution falls back to the legacy coarse quotas, which
/// only ever carried client and internal fractions; the `rnd` portfolio has
/// no legacy fallback and resolves to zero there. Resolved quotas are
/// clamped non-negative.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QuotaTable {
    #[serde(default)]
    granular: BTreeMap<Role, BTreeMap<Portfolio, f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    legacy_client: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    legacy_internal: Option<f64>,
}

impl QuotaTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a granular quota fraction.
    pub fn set(&mut self, role: Role, portfolio: Portfolio, quota: f64) {
        self.granular.entry(role).or_default().insert(portfolio, quota);
    }

    /// Builder-style [`QuotaTable::set`].
    pub fn with(mut self, role: Role, portfolio: Portfolio, quota: f64) -> Self {
        self.set(role, portfolio, quota);
        self
    }

    /// Set the legacy coarse client/internal quotas.
    pub fn set_legacy(&mut self, client: f64, internal: f64) {
        self.legacy_client = Some(client);
        self.legacy_internal = Some(internal);
    }

    /// Builder-style [`QuotaTable::set_legacy`].
    pub fn with_legacy(mut self, client: f64, internal: f64) -> Self {
        self.set_legacy(client, internal);
        self
    }

    /// The granular quota, if one is configured.
    pub fn granular(&self, role: Role, portfolio: Portfolio) -> Option<f64> {
        self.granular.get(&role).and_then(|m| m.get(&portfolio)).copied()
    }

    /// Resolve the effective quota fraction for `(role, portfolio)`.
    pub fn resolve(&self, role: Role, portfolio: Portfolio) -> f64 {
        if let Some(quota) = self.granular(role, portfolio) {
            return quota.max(0.0);
        }
        let legacy = match portfolio {
            Portfolio::Client => self.legacy_client,
            Portfolio::Internal => self.legacy_internal,
            Portfolio::Rnd => None,
        };
        legacy.unwrap_or(0.0).max(0.0)
    }
}

/// The organization-wide capacity configuration.
///
/// Owned and mutated by an external governance workflow; the engine re-reads
/// it fresh on every call and treats it as an immutable snapshot. An absent
/// baseline means zero capacity everywhere: the engine fails safe toward
/// denial, never toward unlimited capacity. Per-role quota fractions are
/// expected to sum to 1.0 across portfolios, but that invariant is enforced
/// by the configuring workflow, not here.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GovernanceBaseline {
    /// Nominal team headcount per role.
    pub team_size: RoleMap<u32>,
    /// Efficiency coefficient per role (usable fraction of nominal time).
    pub efficiency: RoleMap<f64>,
    /// Portfolio quota fractions.
    pub quotas: QuotaTable,
}

impl GovernanceBaseline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style team size and efficiency for one role.
    pub fn with_role(mut self, role: Role, team_size: u32, efficiency: f64) -> Self {
        self.team_size[role] = team_size;
        self.efficiency[role] = efficiency;
        self
    }

    /// Builder-style granular quota entry.
    pub fn with_quota(mut self, role: Role, portfolio: Portfolio, quota: f64) -> Self {
        self.quotas.set(role, portfolio, quota);
        self
    }

    /// Builder-style legacy coarse quotas.
    pub fn with_legacy_quotas(mut self, client: f64, internal: f64) -> Self {
        self.quotas.set_legacy(client, internal);
        self
    }
}
