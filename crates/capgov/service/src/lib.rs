//! # capgov-service
//!
//! The engine's external surface. Hosts bring their own transport and
//! persistence; this crate gives them:
//!
//! - the wire-stable validation request/response contract ([`contract`]),
//! - read accessor traits for the externally-owned baseline and commitment
//!   stores, plus the dispatching [`GovernanceService`],
//! - the [`admission::AdmissionGate`], which serializes validate-then-persist
//!   per portfolio so two concurrent admissions cannot jointly breach
//!   capacity that neither alone would have breached.
#![deny(unsafe_code)]

pub mod admission;
pub mod contract;

pub use admission::{AdmissionError, AdmissionGate, AdmissionOutcome};
pub use contract::{ValidationRequest, ValidationResponse};

use tracing::debug;

use capgov_alert::GovernanceAlertBuilder;
use capgov_types::{Commitment, GovernanceAlert, GovernanceBaseline, Portfolio};
use capgov_validate::Validator;

/// Read access to the latest governance configuration.
///
/// The baseline is owned and mutated by an external governance workflow;
/// the engine re-reads it fresh on every call and never caches it.
pub trait BaselineSource {
    /// The current configuration, or `None` when governance has not been
    /// configured yet (the engine then fails safe toward denial).
    fn latest_baseline(&self) -> Option<GovernanceBaseline>;
}

/// Read access to a point-in-time snapshot of all commitment records.
pub trait CommitmentSource {
    fn snapshot(&self) -> Vec<Commitment>;

    fn snapshot_for(&self, portfolio: Portfolio) -> Vec<Commitment> {
        self.snapshot()
            .into_iter()
            .filter(|c| c.portfolio == portfolio)
            .collect()
    }
}

/// Facade over the engine for the admission workflow and the dashboard.
///
/// Stateless between calls: every operation pulls fresh snapshots from its
/// sources and threads them through the pure engine crates.
pub struct GovernanceService<B, C> {
    baselines: B,
    commitments: C,
}

impl<B: BaselineSource, C: CommitmentSource> GovernanceService<B, C> {
    pub fn new(baselines: B, commitments: C) -> Self {
        Self {
            baselines,
            commitments,
        }
    }

    /// Validate one admission request.
    ///
    /// The caller opting into a timeline (both planned dates present)
    /// selects the weekly path; otherwise the duration-weighted aggregate
    /// path runs.
    pub fn validate(&self, request: &ValidationRequest) -> ValidationResponse {
        let baseline = self.baselines.latest_baseline();
        let snapshot = self.commitments.snapshot();
        let portfolio = Portfolio::normalize(&request.portfolio);
        let validator = Validator::new(baseline.as_ref(), &snapshot);

        let result = if request.has_timeline() {
            debug!(%portfolio, "dispatching timeline validation");
            validator.validate_timeline(
                portfolio,
                &request.demand(),
                &request.planned_start_date,
                &request.planned_end_date,
                request.exclude_commitment_id,
            )
        } else {
            debug!(%portfolio, "dispatching aggregate validation");
            validator.validate_aggregate(
                portfolio,
                &request.demand(),
                request.tentative_duration_weeks,
                request.exclude_commitment_id,
            )
        };
        ValidationResponse::from(result)
    }

    /// Build the dashboard governance alert from fresh snapshots.
    pub fn governance_alert(&self) -> GovernanceAlert {
        let baseline = self.baselines.latest_baseline();
        let snapshot = self.commitments.snapshot();
        GovernanceAlertBuilder::new(baseline.as_ref(), &snapshot).build()
    }
}
