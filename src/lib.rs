//! # Interval Report Builder
//!
//! A library for turning operational CSV exports from a service business
//! (leads, sales, calls, subscription starts/cancels) into weekly review
//! reports with rolling month-to-date and fiscal-year-to-date figures.
//!
//! ## Core Concepts
//!
//! - **Record**: one dated transactional fact attributed to an actor (a
//!   salesperson or call agent). Records are loaded once and never mutated.
//! - **Window**: an inclusive day interval. Weekly windows are Monday-aligned
//!   and tile the fiscal year (September 1 through August 31) with no gaps.
//! - **As-of-week recomputation**: each week's MTD/YTD figures use only data
//!   through that week's end, so a historical week never changes when the
//!   report is re-run later.
//! - **Mega report**: one row per actor per active week, with Weekly, MTD
//!   and YTD columns side by side.
//! - **Snapshot**: one row per actor with YTD/MTD figures as of the run
//!   date, including actors with zero activity.
//!
//! ## Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use interval_report_builder::*;
//!
//! let leads = vec![
//!     LeadRecord {
//!         salesperson: "Rob Dively".to_string(),
//!         close_date: NaiveDate::from_ymd_opt(2024, 9, 3),
//!         close_status: Some(CloseStatus::WonRecurring),
//!         lead_type: None,
//!     },
//!     LeadRecord {
//!         salesperson: "Rob Dively".to_string(),
//!         close_date: NaiveDate::from_ymd_opt(2024, 9, 4),
//!         close_status: Some(CloseStatus::parse("Lost: Price")),
//!         lead_type: None,
//!     },
//! ];
//!
//! let actors = vec!["Rob Dively".to_string()];
//! let as_of = NaiveDate::from_ymd_opt(2024, 9, 30).unwrap();
//! let bundle = close_rate_report(&leads, &actors, as_of);
//!
//! assert_eq!(bundle.snapshot[0].ytd.won_recurring, 1);
//! assert_eq!(bundle.snapshot[0].ytd.close_rate, 50.0);
//! ```

pub mod engine;
pub mod error;
pub mod ingestion;
pub mod metrics;
pub mod output;
pub mod periods;
pub mod reports;
pub mod schema;

pub use engine::{assemble_mega_report, assemble_snapshot, MegaRow, ReportSpec, SnapshotRow};
pub use error::{ReportError, Result};
pub use ingestion::*;
pub use metrics::*;
pub use output::*;
pub use periods::*;
pub use reports::*;
pub use schema::*;

use std::collections::BTreeSet;
use std::path::PathBuf;

use chrono::NaiveDate;
use log::{debug, info};

/// Bookkeeping for one completed run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub files_written: Vec<PathBuf>,
    /// Data rows read across all consumed exports.
    pub rows_read: usize,
    /// Rows kept whose event dates could not be parsed.
    pub undated_rows: usize,
}

struct ExecutedReport {
    tables: ReportTables,
    mega_file: &'static str,
    summary_file: &'static str,
    rows_read: usize,
    undated_rows: usize,
}

/// Loads the exports named by a [`RunConfig`], runs the interval reports and
/// writes their CSV tables.
pub struct ReportRunner {
    config: RunConfig,
}

impl ReportRunner {
    pub fn new(config: RunConfig) -> Self {
        Self { config }
    }

    /// Runs all four reports as of `as_of`.
    pub fn run(&self, as_of: NaiveDate) -> Result<RunSummary> {
        self.run_reports(&ReportKind::ALL, as_of)
    }

    pub fn run_reports(&self, kinds: &[ReportKind], as_of: NaiveDate) -> Result<RunSummary> {
        self.config.validate(as_of)?;
        info!(
            "Running {} report(s) as of {} from {}",
            kinds.len(),
            as_of,
            self.config.data_dir.display()
        );

        let mut summary = RunSummary::default();
        for kind in kinds {
            let executed = self.execute(*kind, as_of)?;

            let mega_path = self.config.out_dir.join(executed.mega_file);
            executed.tables.mega.write_csv(&mega_path)?;
            let summary_path = self.config.out_dir.join(executed.summary_file);
            executed.tables.snapshot.write_csv(&summary_path)?;

            debug!(
                "{} report: {} weekly rows, {} snapshot rows",
                kind.name(),
                executed.tables.mega.rows.len(),
                executed.tables.snapshot.rows.len()
            );
            summary.files_written.push(mega_path);
            summary.files_written.push(summary_path);
            summary.rows_read += executed.rows_read;
            summary.undated_rows += executed.undated_rows;
        }

        info!(
            "Run complete: {} files written, {} rows read, {} undated rows",
            summary.files_written.len(),
            summary.rows_read,
            summary.undated_rows
        );
        Ok(summary)
    }

    fn execute(&self, kind: ReportKind, as_of: NaiveDate) -> Result<ExecutedReport> {
        let config = &self.config;
        let start = config.beginning_of_time;

        match kind {
            ReportKind::CloseRate => {
                let roster = config.close_rate_roster();
                let loaded = load_leads(
                    &config.data_dir.join(LEADS_EXPORT),
                    &roster,
                    &config.exclude_channels,
                    start,
                )?;
                let seen: BTreeSet<String> =
                    loaded.records.iter().map(|r| r.salesperson.clone()).collect();
                let actors = roster.output_actors(&seen);
                let bundle = close_rate_report(&loaded.records, &actors, as_of);
                Ok(ExecutedReport {
                    tables: close_rate_tables(&bundle),
                    mega_file: CLOSE_RATE_REPORT_FILE,
                    summary_file: CLOSE_RATE_SUMMARY_FILE,
                    rows_read: loaded.rows_read,
                    undated_rows: loaded.undated_rows,
                })
            }
            ReportKind::Sales => {
                let roster = config.sales_roster();
                let loaded = load_sales(
                    &config.data_dir.join(PRICE_ANALYSIS_EXPORT),
                    &roster,
                    &config.exclude_sale_types,
                    start,
                )?;
                let seen: BTreeSet<String> =
                    loaded.records.iter().map(|r| r.salesperson.clone()).collect();
                let actors = roster.output_actors(&seen);
                let bundle = sales_report(&loaded.records, &actors, as_of);
                Ok(ExecutedReport {
                    tables: sales_tables(&bundle),
                    mega_file: SALES_REPORT_FILE,
                    summary_file: SALES_SUMMARY_FILE,
                    rows_read: loaded.rows_read,
                    undated_rows: loaded.undated_rows,
                })
            }
            ReportKind::Calls => {
                let roster = config.call_roster();
                let loaded = load_calls(
                    &config.data_dir.join(CALLS_EXPORT),
                    &roster,
                    &config.exclude_call_statuses,
                    start,
                )?;
                let seen: BTreeSet<String> =
                    loaded.records.iter().map(|r| r.agent.clone()).collect();
                let actors = roster.output_actors(&seen);
                let bundle = call_volume_report(&loaded.records, &actors, as_of);
                Ok(ExecutedReport {
                    tables: call_volume_tables(&bundle),
                    mega_file: CALLS_REPORT_FILE,
                    summary_file: CALLS_SUMMARY_FILE,
                    rows_read: loaded.rows_read,
                    undated_rows: loaded.undated_rows,
                })
            }
            ReportKind::Retention => {
                let roster = config.retention_roster();
                let loaded = load_subscriptions(
                    &config.data_dir.join(STARTS_EXPORT),
                    &roster,
                    start,
                )?;
                let seen: BTreeSet<String> =
                    loaded.records.iter().map(|r| r.salesperson.clone()).collect();
                let actors = roster.output_actors(&seen);
                let bundle = retention_report(&loaded.records, &actors, as_of);
                Ok(ExecutedReport {
                    tables: retention_tables(&bundle),
                    mega_file: CANCEL_REPORT_FILE,
                    summary_file: CANCEL_SUMMARY_FILE,
                    rows_read: loaded.rows_read,
                    undated_rows: loaded.undated_rows,
                })
            }
        }
    }
}

/// Convenience wrapper: run every report with the given configuration.
pub fn run_weekly_reports(config: RunConfig, as_of: NaiveDate) -> Result<RunSummary> {
    ReportRunner::new(config).run(as_of)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_close_rate_end_to_end_in_memory() {
        let statuses = [
            "Won: Recurring",
            "Won: Recurring",
            "Lost: Competitor",
            "Estimate Scheduled",
        ];
        let leads: Vec<LeadRecord> = statuses
            .iter()
            .enumerate()
            .map(|(i, status)| LeadRecord {
                salesperson: "Kamaal Sherrod".to_string(),
                close_date: Some(date(2024, 9, 3 + i as u32)),
                close_status: Some(CloseStatus::parse(status)),
                lead_type: None,
            })
            .collect();

        let actors = vec!["Kamaal Sherrod".to_string()];
        let bundle = close_rate_report(&leads, &actors, date(2024, 9, 30));

        // One active week; the open lead neither closes nor counts.
        assert_eq!(bundle.mega.len(), 1);
        let week = &bundle.mega[0];
        assert_eq!(week.weekly.won_recurring, 2);
        assert_eq!(week.weekly.lost, 1);
        assert_eq!(week.weekly.total_closed, 3);
        assert!((week.weekly.close_rate - 200.0 / 3.0).abs() < 1e-9);

        // Snapshot YTD matches the only active week of the fiscal year.
        assert_eq!(bundle.snapshot.len(), 1);
        assert_eq!(bundle.snapshot[0].ytd.total_closed, 3);
    }

    #[test]
    fn test_roster_wiring_from_run_config() {
        let mut config = RunConfig::new("in", "out");
        config.salespeople = vec!["A".to_string()];

        let close = config.close_rate_roster();
        assert_eq!(close.normalize(Some("B")), None);

        let sales = config.sales_roster();
        assert_eq!(sales.normalize(Some("B")), Some(OTHER_REP.to_string()));

        let retention = config.retention_roster();
        assert_eq!(retention.normalize(None), Some(OTHER_REP.to_string()));
    }

    #[test]
    fn test_snapshot_zero_actor_has_zero_sales_metrics() {
        let actors = vec!["Bianca Ramirez".to_string()];
        let bundle = sales_report(&[], &actors, date(2025, 2, 14));

        let row = &bundle.snapshot[0];
        assert_eq!(row.ytd.count, 0);
        assert_eq!(row.ytd.total_sales, 0.0);
        assert_eq!(row.ytd.average_sale, 0.0);
        assert_eq!(row.mtd.count, 0);
    }
}
