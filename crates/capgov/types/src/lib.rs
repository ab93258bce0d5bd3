//! # capgov-types
//!
//! Shared vocabulary of the capacity governance engine: the fixed role and
//! portfolio enumerations, the governance baseline (team sizes, efficiency
//! coefficients, portfolio quotas), commitment records, ISO week keys, and
//! the decision/alert types every other `capgov` crate produces or consumes.
//!
//! This crate is a leaf: it carries data and defensive accessors only.
//! Capacity math lives in `capgov-capacity`, aggregation in `capgov-demand`,
//! decisions in `capgov-validate` and `capgov-alert`.
#![deny(unsafe_code)]

pub mod baseline;
pub mod commitment;
pub mod outcome;
pub mod role;
pub mod week;

pub use baseline::{GovernanceBaseline, QuotaTable};
pub use commitment::{Commitment, CommitmentId, DateWindow};
pub use outcome::{
    AlertStatus, GovernanceAlert, RoleAlert, Utilization, ValidationResult, ValidationStatus,
};
pub use role::{ParseRoleError, Portfolio, Role, RoleMap};
pub use week::{ParseWeekKeyError, WeekKey};

/// Comparison slack for capacity and utilization arithmetic.
///
/// Breach checks compare against `100.0 + EPSILON` so that a commitment
/// landing exactly on the capacity line is admitted despite floating-point
/// noise. The value is load-bearing for boundary behavior and must not
/// change.
pub const EPSILON: f64 = 1e-9;
