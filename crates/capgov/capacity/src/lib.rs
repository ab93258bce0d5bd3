//! # capgov-capacity
//!
//! Derives usable capacity per (role, portfolio) from a governance baseline.
//!
//! Capacity comes in two horizons: **annual** (person-weeks, used by the
//! duration-weighted validation path) and **weekly** (FTE, used by the
//! calendar-week path and the dashboard scan). The model is a pure function
//! of the baseline snapshot passed in: nothing is cached between calls, and
//! an absent baseline yields zero capacity everywhere (fail-safe-deny).
#![deny(unsafe_code)]

use capgov_types::{GovernanceBaseline, Portfolio, Role};

/// Planning weeks in a year for the annual horizon.
pub const WEEKS_PER_YEAR: f64 = 52.0;

/// Capacity horizon selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CapacityHorizon {
    /// Person-weeks over a planning year.
    Annual,
    /// FTE within a single calendar week.
    Weekly,
}

impl CapacityHorizon {
    fn weeks(self) -> f64 {
        match self {
            CapacityHorizon::Annual => WEEKS_PER_YEAR,
            CapacityHorizon::Weekly => 1.0,
        }
    }
}

/// Usable-capacity calculator over one baseline snapshot.
#[derive(Clone, Copy, Debug)]
pub struct CapacityModel<'a> {
    baseline: Option<&'a GovernanceBaseline>,
}

impl<'a> CapacityModel<'a> {
    pub fn new(baseline: Option<&'a GovernanceBaseline>) -> Self {
        Self { baseline }
    }

    /// Whether a baseline snapshot is present at all.
    pub fn is_configured(&self) -> bool {
        self.baseline.is_some()
    }

    /// Annual capacity in person-weeks:
    /// `team × efficiency × 52 × quota(role, portfolio)`.
    pub fn annual_capacity(&self, role: Role, portfolio: Portfolio) -> f64 {
        self.capacity(role, portfolio, CapacityHorizon::Annual)
    }

    /// Weekly capacity in FTE: `team × efficiency × quota(role, portfolio)`.
    pub fn weekly_capacity(&self, role: Role, portfolio: Portfolio) -> f64 {
        self.capacity(role, portfolio, CapacityHorizon::Weekly)
    }

    /// Usable capacity for `(role, portfolio)` on the given horizon.
    ///
    /// Full-stack generalists can be deployed to either the FE or the BE
    /// lane, so FS capacity (scaled by FS's own quota for the target
    /// portfolio) folds into those two lanes on top of their base
    /// capacity. AI and PM receive no fold; the FS lane itself carries only
    /// its base capacity.
    pub fn capacity(&self, role: Role, portfolio: Portfolio, horizon: CapacityHorizon) -> f64 {
        let Some(cfg) = self.baseline else {
            return 0.0;
        };
        let mut capacity = unit_capacity(cfg, role, horizon) * cfg.quotas.resolve(role, portfolio);
        if matches!(role, Role::Fe | Role::Be) {
            capacity += unit_capacity(cfg, Role::Fs, horizon)
                * cfg.quotas.resolve(Role::Fs, portfolio);
        }
        capacity.max(0.0)
    }
}

/// Quota-independent capacity of one role: headcount × efficiency × horizon.
fn unit_capacity(cfg: &GovernanceBaseline, role: Role, horizon: CapacityHorizon) -> f64 {
    f64::from(cfg.team_size[role]) * cfg.efficiency[role].max(0.0) * horizon.weeks()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn annual_capacity_formula() {
        // team 10 × efficiency 0.85 × 52 × quota 0.60 = 265.2 person-weeks.
        let baseline = GovernanceBaseline::new()
            .with_role(Role::Fe, 10, 0.85)
            .with_quota(Role::Fe, Portfolio::Client, 0.60);
        let model = CapacityModel::new(Some(&baseline));
        assert_close(model.annual_capacity(Role::Fe, Portfolio::Client), 265.2);
    }

    #[test]
    fn weekly_capacity_formula() {
        // team 6 × efficiency 0.80 × quota 0.70 = 3.36 FTE.
        let baseline = GovernanceBaseline::new()
            .with_role(Role::Fe, 6, 0.80)
            .with_quota(Role::Fe, Portfolio::Client, 0.70);
        let model = CapacityModel::new(Some(&baseline));
        assert_close(model.weekly_capacity(Role::Fe, Portfolio::Client), 3.36);
    }

    #[test]
    fn fs_capacity_folds_into_fe_and_be_only() {
        let baseline = GovernanceBaseline::new()
            .with_role(Role::Fe, 4, 1.0)
            .with_role(Role::Be, 4, 1.0)
            .with_role(Role::Ai, 4, 1.0)
            .with_role(Role::Fs, 2, 0.9)
            .with_quota(Role::Fe, Portfolio::Client, 0.5)
            .with_quota(Role::Be, Portfolio::Client, 0.5)
            .with_quota(Role::Ai, Portfolio::Client, 0.5)
            .with_quota(Role::Fs, Portfolio::Client, 0.4);
        let model = CapacityModel::new(Some(&baseline));

        // Base 4 × 1.0 × 0.5 = 2.0, fold 2 × 0.9 × 0.4 = 0.72.
        assert_close(model.weekly_capacity(Role::Fe, Portfolio::Client), 2.72);
        assert_close(model.weekly_capacity(Role::Be, Portfolio::Client), 2.72);
        assert_close(model.weekly_capacity(Role::Ai, Portfolio::Client), 2.0);
        // FS's own lane carries only its base capacity.
        assert_close(model.weekly_capacity(Role::Fs, Portfolio::Client), 0.72);
        // The fold scales with the horizon.
        assert_close(model.annual_capacity(Role::Fe, Portfolio::Client), 2.72 * 52.0);
    }

    #[test]
    fn legacy_quota_fallback_applies_per_portfolio() {
        let baseline = GovernanceBaseline::new()
            .with_role(Role::Be, 5, 1.0)
            .with_legacy_quotas(0.6, 0.3);
        let model = CapacityModel::new(Some(&baseline));
        assert_close(model.weekly_capacity(Role::Be, Portfolio::Client), 3.0);
        assert_close(model.weekly_capacity(Role::Be, Portfolio::Internal), 1.5);
        // rnd has no legacy fallback.
        assert_close(model.weekly_capacity(Role::Be, Portfolio::Rnd), 0.0);
    }

    #[test]
    fn missing_baseline_means_zero_capacity_everywhere() {
        let model = CapacityModel::new(None);
        assert!(!model.is_configured());
        for role in Role::ALL {
            for portfolio in Portfolio::ALL {
                assert_eq!(model.annual_capacity(role, portfolio), 0.0);
                assert_eq!(model.weekly_capacity(role, portfolio), 0.0);
            }
        }
    }

    #[test]
    fn zero_valued_baseline_yields_zero_capacity() {
        let baseline = GovernanceBaseline::new();
        let model = CapacityModel::new(Some(&baseline));
        assert_eq!(model.annual_capacity(Role::Fe, Portfolio::Client), 0.0);
    }

    #[test]
    fn negative_efficiency_is_clamped() {
        let baseline = GovernanceBaseline::new()
            .with_role(Role::Pm, 3, -0.5)
            .with_quota(Role::Pm, Portfolio::Internal, 0.5);
        let model = CapacityModel::new(Some(&baseline));
        assert_eq!(model.weekly_capacity(Role::Pm, Portfolio::Internal), 0.0);
    }
}
