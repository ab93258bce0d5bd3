//! Commitment records as supplied by the external admission workflow.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::role::{Portfolio, Role, RoleMap};
use crate::week::WeekKey;
use crate::EPSILON;

/// Stable identity of a commitment record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CommitmentId(pub Uuid);

impl CommitmentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CommitmentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CommitmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated, inclusive planned date range.
///
/// Exists only for commitments whose raw date pair actually parses with
/// `end >= start`; everything else stays "unscheduled".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// Defensive construction from raw collaborator-supplied date strings.
    ///
    /// Returns `None` for a missing/blank/unparseable endpoint or a reversed
    /// range, never an error; unusable windows are a data condition the
    /// aggregation layer tallies, not a failure.
    pub fn parse(start: Option<&str>, end: Option<&str>) -> Option<Self> {
        let start = parse_date(start?)?;
        let end = parse_date(end?)?;
        (end >= start).then_some(Self { start, end })
    }

    /// The ISO weeks this window spans, inclusive.
    pub fn weeks(&self) -> Vec<WeekKey> {
        WeekKey::span(self.start, self.end)
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse().ok()
}

/// A resource commitment: per-role FTE demand against one portfolio.
///
/// Owned by the external admission workflow. The engine only ever reads a
/// point-in-time snapshot of these records; all accessors are defensive
/// (demand clamped non-negative, duration defaulted, dates parsed leniently).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Commitment {
    pub id: CommitmentId,
    pub portfolio: Portfolio,
    /// Raw per-role FTE demand; may arrive negative from a misbehaving
    /// caller. Read through [`Commitment::demand_for`].
    pub demand: RoleMap<f64>,
    /// Tentative duration used by the duration-weighted aggregate view.
    #[serde(default)]
    pub tentative_duration_weeks: Option<i64>,
    /// Raw ISO start date, if planned.
    #[serde(default)]
    pub planned_start_date: Option<String>,
    /// Raw ISO end date, if planned.
    #[serde(default)]
    pub planned_end_date: Option<String>,
}

impl Commitment {
    pub fn new(portfolio: Portfolio) -> Self {
        Self {
            id: CommitmentId::new(),
            portfolio,
            demand: RoleMap::new(),
            tentative_duration_weeks: None,
            planned_start_date: None,
            planned_end_date: None,
        }
    }

    /// Builder-style demand assignment.
    pub fn with_demand(mut self, role: Role, fte: f64) -> Self {
        self.demand[role] = fte;
        self
    }

    /// Builder-style tentative duration.
    pub fn with_duration(mut self, weeks: i64) -> Self {
        self.tentative_duration_weeks = Some(weeks);
        self
    }

    /// Builder-style planned window from raw date strings.
    pub fn with_window(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.planned_start_date = Some(start.into());
        self.planned_end_date = Some(end.into());
        self
    }

    /// Clamped FTE demand for one role.
    pub fn demand_for(&self, role: Role) -> f64 {
        self.demand[role].max(0.0)
    }

    /// Whether any role carries demand above the noise floor.
    pub fn has_demand(&self) -> bool {
        Role::ALL.iter().any(|&role| self.demand_for(role) > EPSILON)
    }

    /// Duration in weeks for the aggregate view; 1 when unset or
    /// non-positive.
    pub fn effective_duration_weeks(&self) -> f64 {
        match self.tentative_duration_weeks {
            Some(weeks) if weeks > 0 => weeks as f64,
            _ => 1.0,
        }
    }

    /// The usable planned window, if the raw date pair validates.
    pub fn planned_window(&self) -> Option<DateWindow> {
        DateWindow::parse(
            self.planned_start_date.as_deref(),
            self.planned_end_date.as_deref(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_defaults_to_one_week() {
        let base = Commitment::new(Portfolio::Client);
        assert_eq!(base.effective_duration_weeks(), 1.0);
        assert_eq!(base.clone().with_duration(0).effective_duration_weeks(), 1.0);
        assert_eq!(base.clone().with_duration(-3).effective_duration_weeks(), 1.0);
        assert_eq!(base.with_duration(6).effective_duration_weeks(), 6.0);
    }

    #[test]
    fn demand_reads_clamp_negatives() {
        let commitment = Commitment::new(Portfolio::Internal)
            .with_demand(Role::Fe, -2.0)
            .with_demand(Role::Be, 1.5);
        assert_eq!(commitment.demand_for(Role::Fe), 0.0);
        assert_eq!(commitment.demand_for(Role::Be), 1.5);
        assert!(commitment.has_demand());
    }

    #[test]
    fn all_negative_demand_counts_as_no_demand() {
        let commitment = Commitment::new(Portfolio::Internal).with_demand(Role::Fe, -2.0);
        assert!(!commitment.has_demand());
    }

    #[test]
    fn window_requires_parseable_ordered_dates() {
        let good = Commitment::new(Portfolio::Client).with_window("2025-09-08", "2025-09-21");
        assert!(good.planned_window().is_some());

        let reversed = Commitment::new(Portfolio::Client).with_window("2025-09-21", "2025-09-08");
        assert!(reversed.planned_window().is_none());

        let garbled = Commitment::new(Portfolio::Client).with_window("next sprint", "2025-09-21");
        assert!(garbled.planned_window().is_none());

        let blank = Commitment::new(Portfolio::Client).with_window("", "2025-09-21");
        assert!(blank.planned_window().is_none());

        let unplanned = Commitment::new(Portfolio::Client);
        assert!(unplanned.planned_window().is_none());
    }

    #[test]
    fn window_spans_expected_weeks() {
        let commitment = Commitment::new(Portfolio::Client).with_window("2025-09-08", "2025-09-21");
        let weeks = commitment.planned_window().unwrap().weeks();
        assert_eq!(
            weeks,
            vec![
                WeekKey { year: 2025, week: 37 },
                WeekKey { year: 2025, week: 38 },
            ]
        );
    }
}
