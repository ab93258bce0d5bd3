//! # capgov-intake
//!
//! Advisory demand estimation for intake review. Proposals arrive with a
//! list of tagged activity lines (`"[FE/BE] Build dashboard | Complex"`);
//! this crate turns them into a census, estimates the FTE each role would
//! actually need over the tentative duration, and grades the gap between
//! estimated and proposed staffing.
//!
//! The output is advisory only: it informs a reviewer during intake and
//! never feeds the admit/reject decision, which belongs to
//! `capgov-validate`.
#![deny(unsafe_code)]

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use capgov_types::{Role, RoleMap};

/// Working hours in one FTE-week.
pub const WEEKLY_HOURS: f64 = 40.0;

/// Activity complexity grade, weighted in hours of effort.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Complexity {
    Simple,
    Medium,
    Complex,
}

impl Complexity {
    pub const ALL: [Complexity; 3] = [Complexity::Simple, Complexity::Medium, Complexity::Complex];

    /// Estimated effort per activity.
    pub fn hours(self) -> f64 {
        match self {
            Complexity::Simple => 4.0,  // half a day
            Complexity::Medium => 8.0,  // one day
            Complexity::Complex => 16.0, // two days
        }
    }

    fn marker(self) -> &'static str {
        match self {
            Complexity::Simple => "Simple",
            Complexity::Medium => "Medium",
            Complexity::Complex => "Complex",
        }
    }
}

/// Counts of parsed activities by role tag and complexity grade.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ActivityCensus {
    pub by_role: RoleMap<usize>,
    pub by_complexity: BTreeMap<Complexity, usize>,
}

impl ActivityCensus {
    /// Total role tags seen. An activity tagged `[FE/BE]` counts once per
    /// role.
    pub fn tagged_total(&self) -> usize {
        Role::ALL.iter().map(|&role| self.by_role[role]).sum()
    }

    /// Complexity-weighted mean hours per activity; Medium when nothing
    /// parsed.
    pub fn average_complexity_hours(&self) -> f64 {
        let total: usize = self.by_complexity.values().sum();
        if total == 0 {
            return Complexity::Medium.hours();
        }
        let weighted: f64 = self
            .by_complexity
            .iter()
            .map(|(complexity, &count)| complexity.hours() * count as f64)
            .sum();
        weighted / total as f64
    }
}

/// How badly a role is understaffed relative to the estimate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GapSeverity {
    None,
    Low,
    Medium,
    High,
}

impl GapSeverity {
    /// Grade a gap percentage (gap relative to required FTE).
    pub fn from_gap_pct(gap_pct: f64) -> Self {
        if gap_pct <= -50.0 {
            GapSeverity::High
        } else if gap_pct <= -20.0 {
            GapSeverity::Medium
        } else if gap_pct < 0.0 {
            GapSeverity::Low
        } else {
            GapSeverity::None
        }
    }
}

/// Estimated-versus-proposed staffing for one role.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoleGap {
    pub role: Role,
    pub activities: usize,
    pub proposed_fte: f64,
    pub estimated_weeks: i64,
    pub required_fte: f64,
    pub gap: f64,
    pub severity: GapSeverity,
}

/// The full advisory assessment for one intake proposal.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IntakeAssessment {
    pub census: ActivityCensus,
    pub gaps: Vec<RoleGap>,
    pub summary: String,
    /// Grows with the number of tagged activities; capped at 1.0.
    pub confidence: f64,
}

/// Parse tagged activity lines into a census.
///
/// Supported format: `"[TAG] Activity text | Complexity"`, where `TAG` is
/// one or more role codes joined by `/`. Unknown tags are ignored;
/// complexity defaults to Medium. Untagged lines still contribute their
/// complexity (legacy format).
pub fn parse_activities<S: AsRef<str>>(activities: &[S]) -> ActivityCensus {
    let mut census = ActivityCensus::default();
    for raw in activities {
        let line = raw.as_ref();
        let mut roles = Vec::new();
        let mut had_tag_text = false;
        let mut complexity = Complexity::Medium;

        let bracketed = line
            .find('[')
            .zip(line.find(']'))
            .filter(|&(open, close)| open < close);
        if let Some((open, close)) = bracketed {
            for tag in line[open + 1..close].split('/') {
                if tag.trim().is_empty() {
                    continue;
                }
                had_tag_text = true;
                if let Ok(role) = Role::from_str(tag) {
                    roles.push(role);
                }
            }
            complexity = detect_complexity(&line[close + 1..]);
        }
        if !had_tag_text {
            complexity = detect_complexity(line);
        }

        for role in roles {
            census.by_role[role] += 1;
        }
        *census.by_complexity.entry(complexity).or_insert(0) += 1;
    }
    census
}

fn detect_complexity(text: &str) -> Complexity {
    for complexity in Complexity::ALL {
        let marker = complexity.marker();
        if text.contains(&format!("| {marker}")) || text.contains(&format!("|{marker}")) {
            return complexity;
        }
    }
    Complexity::Medium
}

/// FTE needed to finish `activity_count` activities of `avg_hours` each
/// within `weeks`; zero for a non-positive duration.
pub fn required_fte(activity_count: usize, avg_hours: f64, weeks: i64) -> f64 {
    if weeks <= 0 {
        return 0.0;
    }
    let total_hours = activity_count as f64 * avg_hours;
    round2(total_hours / WEEKLY_HOURS / weeks as f64)
}

/// Assess a proposed allocation against the activity-derived estimate.
///
/// Roles with neither activities nor proposed FTE are omitted from the gap
/// rows. Negative proposed FTE is clamped, consistent with the rest of the
/// engine.
pub fn assess_allocation<S: AsRef<str>>(
    activities: &[S],
    proposed: &RoleMap<f64>,
    duration_weeks: i64,
) -> IntakeAssessment {
    let census = parse_activities(activities);
    let avg_hours = census.average_complexity_hours();

    let mut gaps = Vec::new();
    for role in Role::ALL {
        let count = census.by_role[role];
        let proposed_fte = proposed[role].max(0.0);
        if count == 0 && proposed_fte <= 0.0 {
            continue;
        }
        let required = required_fte(count, avg_hours, duration_weeks);
        let gap = proposed_fte - required;
        let gap_pct = if required > 0.0 {
            gap / required * 100.0
        } else {
            0.0
        };
        gaps.push(RoleGap {
            role,
            activities: count,
            proposed_fte: round2(proposed_fte),
            estimated_weeks: duration_weeks,
            required_fte: required,
            gap: round2(gap),
            severity: GapSeverity::from_gap_pct(gap_pct),
        });
    }

    let summary = compose_summary(&gaps);
    let confidence = round2((census.tagged_total() as f64 / 10.0).min(1.0));
    debug!(
        tagged = census.tagged_total(),
        gaps = gaps.len(),
        confidence,
        "intake assessment composed"
    );

    IntakeAssessment {
        census,
        gaps,
        summary,
        confidence,
    }
}

fn compose_summary(gaps: &[RoleGap]) -> String {
    let high: Vec<&RoleGap> = gaps
        .iter()
        .filter(|g| g.severity == GapSeverity::High)
        .collect();
    let medium: Vec<&RoleGap> = gaps
        .iter()
        .filter(|g| g.severity == GapSeverity::Medium)
        .collect();

    let mut parts = Vec::new();
    if !high.is_empty() {
        let detail: Vec<String> = high
            .iter()
            .map(|g| {
                format!(
                    "{} ({} activities, need {:.2} FTE, proposed {:.2} FTE)",
                    g.role, g.activities, g.required_fte, g.proposed_fte
                )
            })
            .collect();
        parts.push(format!("Critical gaps detected: {}.", detail.join(", ")));
    }
    if !medium.is_empty() {
        let detail: Vec<String> = medium
            .iter()
            .map(|g| format!("{} ({} activities)", g.role, g.activities))
            .collect();
        parts.push(format!("Moderate gaps: {}.", detail.join(", ")));
    }
    if parts.is_empty() {
        parts.push(
            "Resource allocation looks balanced for the proposed activity mix.".to_string(),
        );
    }
    parts.join(" ")
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
