//! Admission serialization.
//!
//! Validation and persistence are two steps owned by the host workflow, and
//! two concurrent admissions against shrinking shared capacity can each
//! observe a passing snapshot and jointly breach it (check-then-act). The
//! [`AdmissionGate`] closes that window: it holds an advisory per-portfolio
//! lock across "re-validate on a fresh snapshot, then persist". A losing
//! concurrent request is told to re-validate and retry via
//! [`AdmissionError::Contended`] instead of blocking.
//!
//! The lock is scoped per portfolio because an admission carries demand
//! across several roles of a single portfolio and validation always reads
//! that whole lane set; admissions against different portfolios never
//! contend.

use std::sync::{Mutex, TryLockError};

use thiserror::Error;
use tracing::{debug, warn};

use capgov_types::Portfolio;

use crate::contract::{ValidationRequest, ValidationResponse};
use crate::{BaselineSource, CommitmentSource, GovernanceService};

/// Outcome of a serialized admission attempt.
#[derive(Debug)]
pub enum AdmissionOutcome {
    /// Validation approved and the persist closure ran successfully.
    Admitted(ValidationResponse),
    /// Validation rejected; nothing was persisted.
    Rejected(ValidationResponse),
}

impl AdmissionOutcome {
    pub fn is_admitted(&self) -> bool {
        matches!(self, AdmissionOutcome::Admitted(_))
    }

    pub fn response(&self) -> &ValidationResponse {
        match self {
            AdmissionOutcome::Admitted(response) | AdmissionOutcome::Rejected(response) => response,
        }
    }
}

/// Failure modes of a serialized admission attempt.
///
/// A REJECTED validation is *not* an error; it comes back as
/// [`AdmissionOutcome::Rejected`].
#[derive(Error, Debug)]
pub enum AdmissionError {
    /// Another admission currently holds this portfolio. Retryable: the
    /// caller should re-validate and try again.
    #[error("a concurrent admission holds the {0} portfolio; re-validate and retry")]
    Contended(Portfolio),

    /// A previous admission panicked while holding the lock.
    #[error("admission lock poisoned for the {0} portfolio")]
    LockPoisoned(Portfolio),

    /// The host's persistence step failed after approval.
    #[error("failed to persist approved commitment")]
    Persistence(#[source] anyhow::Error),
}

impl AdmissionError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, AdmissionError::Contended(_))
    }
}

/// Serializes validate-then-persist per portfolio.
pub struct AdmissionGate<B, C> {
    service: GovernanceService<B, C>,
    // One advisory lock per portfolio, indexed by `Portfolio::index`.
    locks: [Mutex<()>; 3],
}

impl<B: BaselineSource, C: CommitmentSource> AdmissionGate<B, C> {
    pub fn new(service: GovernanceService<B, C>) -> Self {
        Self {
            service,
            locks: Default::default(),
        }
    }

    /// The underlying service, for lock-free reads (dashboards, previews).
    pub fn service(&self) -> &GovernanceService<B, C> {
        &self.service
    }

    /// Validate `request` on a fresh snapshot and, if approved, run the
    /// host's `persist` closure, all under this portfolio's advisory lock.
    ///
    /// The lock is taken without blocking: a losing concurrent request gets
    /// [`AdmissionError::Contended`] immediately rather than queueing behind
    /// a snapshot that its validation never saw.
    pub fn admit<F>(
        &self,
        request: &ValidationRequest,
        persist: F,
    ) -> Result<AdmissionOutcome, AdmissionError>
    where
        F: FnOnce(&ValidationResponse) -> anyhow::Result<()>,
    {
        let portfolio = Portfolio::normalize(&request.portfolio);
        let _guard = match self.locks[portfolio.index()].try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::WouldBlock) => {
                debug!(%portfolio, "admission contended");
                return Err(AdmissionError::Contended(portfolio));
            }
            Err(TryLockError::Poisoned(_)) => {
                warn!(%portfolio, "admission lock poisoned");
                return Err(AdmissionError::LockPoisoned(portfolio));
            }
        };

        let response = self.service.validate(request);
        if response.status.is_approved() {
            persist(&response).map_err(AdmissionError::Persistence)?;
            Ok(AdmissionOutcome::Admitted(response))
        } else {
            Ok(AdmissionOutcome::Rejected(response))
        }
    }
}
