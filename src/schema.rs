use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{ReportError, Result};

/// Bucket label for sales-side records whose salesperson is missing or not on
/// the configured roster.
pub const OTHER_REP: &str = "Other Rep";

/// Bucket label for calls with no agent attribution.
pub const UNASSIGNED: &str = "Unassigned";

/// Outcome of a closed (or still open) lead.
///
/// The export carries free text; the reporting logic only distinguishes the
/// two win categories, the lost family, and everything else. Unknown statuses
/// must survive ingestion, so the open/lost variants keep the original text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CloseStatus {
    WonRecurring,
    WonOneTime,
    /// Any status containing "Lost" (e.g. "Lost: Price", "Lost: Competitor").
    Lost(String),
    /// Everything else, typically a lead still in flight.
    Open(String),
}

impl CloseStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "Won: Recurring" => CloseStatus::WonRecurring,
            "Won: One Time" => CloseStatus::WonOneTime,
            other if other.contains("Lost") => CloseStatus::Lost(other.to_string()),
            other => CloseStatus::Open(other.to_string()),
        }
    }

    pub fn is_lost(&self) -> bool {
        matches!(self, CloseStatus::Lost(_))
    }

    /// Won or lost; open leads do not count toward close rate.
    pub fn is_closed(&self) -> bool {
        !matches!(self, CloseStatus::Open(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallStatus {
    Answered,
    Other(String),
}

impl CallStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "answered" => CallStatus::Answered,
            other => CallStatus::Other(other.to_string()),
        }
    }

    pub fn is_answered(&self) -> bool {
        matches!(self, CallStatus::Answered)
    }
}

/// One lead from the leads-reporting export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadRecord {
    pub salesperson: String,
    pub close_date: Option<NaiveDate>,
    pub close_status: Option<CloseStatus>,
    pub lead_type: Option<String>,
}

/// One sold job from the price-analysis export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleRecord {
    pub salesperson: String,
    pub add_date: Option<NaiveDate>,
    /// First-year annual contract value in dollars.
    pub first_year_acv: f64,
    pub sale_type: Option<String>,
}

/// One phone call from the call-log export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallRecord {
    pub agent: String,
    pub call_date: Option<NaiveDate>,
    pub status: Option<CallStatus>,
    pub talk_time_secs: u64,
}

/// One recurring-service subscription from the starts export. Carries two
/// independent event dates: the start and, when present, the cancellation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    pub salesperson: String,
    pub date_added: Option<NaiveDate>,
    pub cancel_date: Option<NaiveDate>,
}

/// What happens to a record whose actor is not on the roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnlistedPolicy {
    /// The record is excluded from every aggregation.
    Drop,
    /// The record is attributed to the given bucket actor.
    Bucket(String),
}

/// Actor normalization applied at ingestion: identity rewrites, a fallback
/// for missing attribution, and the treatment of actors outside the roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Roster {
    /// Explicit actor list. Empty means "every actor seen in the data".
    pub actors: Vec<String>,
    /// Identity rewrites applied before any roster check, e.g. mapping a
    /// dialer login email to the agent's display name.
    #[serde(default)]
    pub replacements: BTreeMap<String, String>,
    /// Label given to records with no actor at all; `None` drops them.
    pub missing: Option<String>,
    pub unlisted: UnlistedPolicy,
}

impl Roster {
    /// Salespeople roster that keeps everyone else under "Other Rep".
    pub fn salespeople(actors: Vec<String>) -> Self {
        Self {
            actors,
            replacements: BTreeMap::new(),
            missing: Some(OTHER_REP.to_string()),
            unlisted: UnlistedPolicy::Bucket(OTHER_REP.to_string()),
        }
    }

    /// Roster that only admits the listed actors; unlisted and unattributed
    /// records are excluded entirely.
    pub fn strict(actors: Vec<String>) -> Self {
        Self {
            actors,
            replacements: BTreeMap::new(),
            missing: None,
            unlisted: UnlistedPolicy::Drop,
        }
    }

    /// Call-agent roster: identity replacements plus an "Unassigned" bucket
    /// for calls without attribution.
    pub fn agents(actors: Vec<String>, replacements: BTreeMap<String, String>) -> Self {
        Self {
            actors,
            replacements,
            missing: Some(UNASSIGNED.to_string()),
            unlisted: UnlistedPolicy::Drop,
        }
    }

    /// Resolves a raw actor field to the name aggregation groups by, or
    /// `None` when the record should be excluded.
    pub fn normalize(&self, raw: Option<&str>) -> Option<String> {
        let name = match raw.map(str::trim).filter(|s| !s.is_empty()) {
            Some(name) => name,
            None => return self.missing.clone(),
        };
        let name = self.replacements.get(name).map(String::as_str).unwrap_or(name);

        if self.actors.is_empty() || self.actors.iter().any(|a| a == name) {
            return Some(name.to_string());
        }
        match &self.unlisted {
            UnlistedPolicy::Drop => None,
            UnlistedPolicy::Bucket(bucket) => Some(bucket.clone()),
        }
    }

    /// The actor dimension of the output tables, in deterministic order:
    /// the configured roster followed by any sentinel labels, or every actor
    /// seen in the data when no roster was configured.
    pub fn output_actors(&self, seen: &BTreeSet<String>) -> Vec<String> {
        if self.actors.is_empty() {
            return seen.iter().cloned().collect();
        }

        let mut actors = self.actors.clone();
        if let UnlistedPolicy::Bucket(bucket) = &self.unlisted {
            if !actors.contains(bucket) {
                actors.push(bucket.clone());
            }
        }
        if let Some(missing) = &self.missing {
            if !actors.contains(missing) {
                actors.push(missing.clone());
            }
        }
        actors
    }
}

/// Which of the four interval reports to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportKind {
    CloseRate,
    Sales,
    Calls,
    Retention,
}

impl ReportKind {
    pub const ALL: [ReportKind; 4] = [
        ReportKind::CloseRate,
        ReportKind::Sales,
        ReportKind::Calls,
        ReportKind::Retention,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ReportKind::CloseRate => "close rate",
            ReportKind::Sales => "sales",
            ReportKind::Calls => "calls",
            ReportKind::Retention => "retention",
        }
    }
}

/// Configuration for one full reporting run.
///
/// Every knob lives here explicitly instead of being scattered across call
/// sites, so a run is a pure function of this struct, the input files and
/// the `as_of` date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Directory holding the weekly review exports.
    pub data_dir: PathBuf,
    /// Directory the report CSVs are written into (created on demand).
    pub out_dir: PathBuf,
    /// Lower bound on event dates; records before it are ignored.
    #[serde(default)]
    pub beginning_of_time: Option<NaiveDate>,
    /// Salesperson roster for the close-rate, sales and retention reports.
    #[serde(default)]
    pub salespeople: Vec<String>,
    /// Identity rewrites for call agents (dialer email -> display name).
    #[serde(default)]
    pub agent_replacements: BTreeMap<String, String>,
    #[serde(default)]
    pub exclude_sale_types: Vec<String>,
    /// Lead-type channels excluded from the close-rate report.
    #[serde(default)]
    pub exclude_channels: Vec<String>,
    #[serde(default)]
    pub exclude_call_statuses: Vec<String>,
}

impl RunConfig {
    pub fn new(data_dir: impl Into<PathBuf>, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            out_dir: out_dir.into(),
            beginning_of_time: None,
            salespeople: Vec::new(),
            agent_replacements: BTreeMap::new(),
            exclude_sale_types: Vec::new(),
            exclude_channels: Vec::new(),
            exclude_call_statuses: Vec::new(),
        }
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: RunConfig = serde_json::from_str(&text)?;
        Ok(config)
    }

    pub fn validate(&self, as_of: NaiveDate) -> Result<()> {
        if let Some(start) = self.beginning_of_time {
            if start > as_of {
                return Err(ReportError::Config(format!(
                    "beginning_of_time {} is after the as-of date {}",
                    start, as_of
                )));
            }
        }
        Ok(())
    }

    /// Close rate restricts to the listed salespeople outright; an empty
    /// list reports every salesperson found in the export.
    pub fn close_rate_roster(&self) -> Roster {
        Roster::strict(self.salespeople.clone())
    }

    pub fn sales_roster(&self) -> Roster {
        Roster::salespeople(self.salespeople.clone())
    }

    pub fn retention_roster(&self) -> Roster {
        if self.salespeople.is_empty() {
            Roster {
                actors: Vec::new(),
                replacements: BTreeMap::new(),
                missing: Some(OTHER_REP.to_string()),
                unlisted: UnlistedPolicy::Drop,
            }
        } else {
            Roster::salespeople(self.salespeople.clone())
        }
    }

    pub fn call_roster(&self) -> Roster {
        Roster::agents(Vec::new(), self.agent_replacements.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_close_status_parse() {
        assert_eq!(
            CloseStatus::parse("Won: Recurring"),
            CloseStatus::WonRecurring
        );
        assert_eq!(CloseStatus::parse("Won: One Time"), CloseStatus::WonOneTime);
        assert!(CloseStatus::parse("Lost: Price").is_lost());
        assert!(CloseStatus::parse("Lost").is_closed());
        assert!(!CloseStatus::parse("Open").is_closed());
        assert_eq!(
            CloseStatus::parse("Pending"),
            CloseStatus::Open("Pending".to_string())
        );
    }

    #[test]
    fn test_roster_bucket_and_missing() {
        let roster = Roster::salespeople(vec!["Hussam Olabi".into(), "Rob Dively".into()]);
        assert_eq!(
            roster.normalize(Some("Hussam Olabi")),
            Some("Hussam Olabi".to_string())
        );
        assert_eq!(
            roster.normalize(Some("Somebody Else")),
            Some(OTHER_REP.to_string())
        );
        assert_eq!(roster.normalize(None), Some(OTHER_REP.to_string()));
        assert_eq!(roster.normalize(Some("   ")), Some(OTHER_REP.to_string()));
    }

    #[test]
    fn test_strict_roster_drops_unlisted() {
        let roster = Roster::strict(vec!["Rob Dively".into()]);
        assert_eq!(roster.normalize(Some("Somebody Else")), None);
        assert_eq!(roster.normalize(None), None);
        assert_eq!(
            roster.normalize(Some("Rob Dively")),
            Some("Rob Dively".to_string())
        );
    }

    #[test]
    fn test_agent_roster_replacements() {
        let mut replacements = BTreeMap::new();
        replacements.insert(
            "hussamobetter@gmail.com".to_string(),
            "Hussam Olabi".to_string(),
        );
        let roster = Roster::agents(Vec::new(), replacements);
        assert_eq!(
            roster.normalize(Some("hussamobetter@gmail.com")),
            Some("Hussam Olabi".to_string())
        );
        assert_eq!(roster.normalize(None), Some(UNASSIGNED.to_string()));
    }

    #[test]
    fn test_output_actors_appends_sentinels() {
        let roster = Roster::salespeople(vec!["A".into(), "B".into()]);
        let actors = roster.output_actors(&BTreeSet::new());
        assert_eq!(actors, vec!["A", "B", OTHER_REP]);

        let open = Roster::agents(Vec::new(), BTreeMap::new());
        let mut seen = BTreeSet::new();
        seen.insert("Z".to_string());
        seen.insert("A".to_string());
        assert_eq!(open.output_actors(&seen), vec!["A", "Z"]);
    }

    #[test]
    fn test_run_config_roundtrip() {
        let mut config = RunConfig::new("weekly_review_data", "weekly_outputs");
        config.salespeople = vec!["Rob Dively".to_string()];
        config.beginning_of_time = NaiveDate::from_ymd_opt(2023, 1, 1);

        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed: RunConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.salespeople, config.salespeople);
        assert_eq!(parsed.beginning_of_time, config.beginning_of_time);
    }

    #[test]
    fn test_validate_rejects_inverted_range() {
        let mut config = RunConfig::new("in", "out");
        config.beginning_of_time = NaiveDate::from_ymd_opt(2025, 1, 1);
        let as_of = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert!(config.validate(as_of).is_err());
    }
}
