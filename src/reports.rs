//! The four interval reports, wired through the shared engine.
//!
//! Each report pairs a [`ReportSpec`] with fixed output table schemas. The
//! column sets and header wording follow the weekly review spreadsheets the
//! business already reads.

use chrono::NaiveDate;

use crate::engine::{
    assemble_mega_report, assemble_snapshot, MegaRow, ReportSpec, SnapshotRow,
};
use crate::metrics::{CallVolumeMetrics, CloseRateMetrics, RetentionMetrics, SalesMetrics};
use crate::output::{format_count, format_hms, format_money, format_percent, Table};
use crate::periods::DateWindow;
use crate::schema::{CallRecord, LeadRecord, SaleRecord, SubscriptionRecord};

/// Output file names, one pair per report.
pub const CLOSE_RATE_REPORT_FILE: &str = "Close Rate Report.csv";
pub const CLOSE_RATE_SUMMARY_FILE: &str = "Close Rate YTD MTD Summary.csv";
pub const SALES_REPORT_FILE: &str = "Sales Report.csv";
pub const SALES_SUMMARY_FILE: &str = "Sales YTD MTD Summary.csv";
pub const CALLS_REPORT_FILE: &str = "Calls Report.csv";
pub const CALLS_SUMMARY_FILE: &str = "Calls YTD MTD Summary.csv";
pub const CANCEL_REPORT_FILE: &str = "Cancel Report.csv";
pub const CANCEL_SUMMARY_FILE: &str = "Cancel YTD MTD Summary.csv";

/// The two assembled artifacts of one report run.
#[derive(Debug, Clone)]
pub struct ReportBundle<M> {
    pub snapshot: Vec<SnapshotRow<M>>,
    pub mega: Vec<MegaRow<M>>,
}

/// The bundle rendered into writable tables.
#[derive(Debug, Clone)]
pub struct ReportTables {
    pub mega: Table,
    pub snapshot: Table,
}

fn prefixed(prefix: &str, names: &[&str]) -> Vec<String> {
    names.iter().map(|n| format!("{} {}", prefix, n)).collect()
}

/// Mega table layout shared by every report: actor, week bounds, then the
/// metric columns three times over (Weekly, MTD as of the week, YTD as of
/// the week).
fn mega_table<M>(
    actor_label: &str,
    metric_names: &[&str],
    rows: &[MegaRow<M>],
    render: impl Fn(&M) -> Vec<String>,
) -> Table {
    let mut headers = vec![
        actor_label.to_string(),
        "Week Start".to_string(),
        "Week End".to_string(),
    ];
    headers.extend(prefixed("Weekly", metric_names));
    headers.extend(prefixed("MTD", metric_names));
    headers.extend(prefixed("YTD", metric_names));

    let mut table = Table { headers, rows: Vec::new() };
    for row in rows {
        let mut cells = vec![
            row.actor.clone(),
            row.week.start.format("%Y-%m-%d").to_string(),
            row.week.end.format("%Y-%m-%d").to_string(),
        ];
        cells.extend(render(&row.weekly));
        cells.extend(render(&row.mtd));
        cells.extend(render(&row.ytd));
        table.push_row(cells);
    }
    table
}

fn snapshot_table<M>(
    actor_label: &str,
    metric_names: &[&str],
    rows: &[SnapshotRow<M>],
    render: impl Fn(&M) -> Vec<String>,
) -> Table {
    let mut headers = vec![actor_label.to_string()];
    headers.extend(prefixed("YTD", metric_names));
    headers.extend(prefixed("MTD", metric_names));

    let mut table = Table { headers, rows: Vec::new() };
    for row in rows {
        let mut cells = vec![row.actor.clone()];
        cells.extend(render(&row.ytd));
        cells.extend(render(&row.mtd));
        table.push_row(cells);
    }
    table
}

// --- Close rate ---

pub struct CloseRateSpec;

impl ReportSpec for CloseRateSpec {
    type Record = LeadRecord;
    type Metrics = CloseRateMetrics;

    fn actor<'r>(&self, record: &'r LeadRecord) -> &'r str {
        &record.salesperson
    }

    fn metrics(&self, records: &[&LeadRecord], window: &DateWindow) -> CloseRateMetrics {
        CloseRateMetrics::compute(records, window)
    }

    // A week with leads closed; open leads alone keep the week out.
    fn weekly_activity(&self, metrics: &CloseRateMetrics) -> bool {
        metrics.total_closed > 0
    }
}

const CLOSE_RATE_COLUMNS: [&str; 5] = [
    "Lost",
    "Won: Recurring",
    "Won: One Time",
    "Total Closed",
    "Close Rate",
];

fn close_rate_cells(metrics: &CloseRateMetrics) -> Vec<String> {
    vec![
        format_count(metrics.lost),
        format_count(metrics.won_recurring),
        format_count(metrics.won_one_time),
        format_count(metrics.total_closed),
        format_percent(metrics.close_rate),
    ]
}

pub fn close_rate_report(
    leads: &[LeadRecord],
    actors: &[String],
    as_of: NaiveDate,
) -> ReportBundle<CloseRateMetrics> {
    ReportBundle {
        snapshot: assemble_snapshot(&CloseRateSpec, leads, actors, as_of),
        mega: assemble_mega_report(&CloseRateSpec, leads, actors, as_of),
    }
}

pub fn close_rate_tables(bundle: &ReportBundle<CloseRateMetrics>) -> ReportTables {
    ReportTables {
        mega: mega_table(
            "Salesperson",
            &CLOSE_RATE_COLUMNS,
            &bundle.mega,
            close_rate_cells,
        ),
        snapshot: snapshot_table(
            "Salesperson",
            &CLOSE_RATE_COLUMNS,
            &bundle.snapshot,
            close_rate_cells,
        ),
    }
}

// --- Sales ---

pub struct SalesSpec;

impl ReportSpec for SalesSpec {
    type Record = SaleRecord;
    type Metrics = SalesMetrics;

    fn actor<'r>(&self, record: &'r SaleRecord) -> &'r str {
        &record.salesperson
    }

    fn metrics(&self, records: &[&SaleRecord], window: &DateWindow) -> SalesMetrics {
        SalesMetrics::compute(records, window)
    }

    fn weekly_activity(&self, metrics: &SalesMetrics) -> bool {
        metrics.count > 0
    }
}

const SALES_COLUMNS: [&str; 3] = ["Total Sales", "Count", "Average Sale"];

fn sales_cells(metrics: &SalesMetrics) -> Vec<String> {
    vec![
        format_money(metrics.total_sales),
        format_count(metrics.count),
        format_money(metrics.average_sale),
    ]
}

pub fn sales_report(
    sales: &[SaleRecord],
    actors: &[String],
    as_of: NaiveDate,
) -> ReportBundle<SalesMetrics> {
    ReportBundle {
        snapshot: assemble_snapshot(&SalesSpec, sales, actors, as_of),
        mega: assemble_mega_report(&SalesSpec, sales, actors, as_of),
    }
}

pub fn sales_tables(bundle: &ReportBundle<SalesMetrics>) -> ReportTables {
    ReportTables {
        mega: mega_table("Salesperson", &SALES_COLUMNS, &bundle.mega, sales_cells),
        snapshot: snapshot_table(
            "Salesperson",
            &SALES_COLUMNS,
            &bundle.snapshot,
            sales_cells,
        ),
    }
}

// --- Call volume ---

pub struct CallVolumeSpec;

impl ReportSpec for CallVolumeSpec {
    type Record = CallRecord;
    type Metrics = CallVolumeMetrics;

    fn actor<'r>(&self, record: &'r CallRecord) -> &'r str {
        &record.agent
    }

    fn metrics(&self, records: &[&CallRecord], window: &DateWindow) -> CallVolumeMetrics {
        CallVolumeMetrics::compute(records, window)
    }

    fn weekly_activity(&self, metrics: &CallVolumeMetrics) -> bool {
        metrics.total_calls > 0
    }
}

const CALL_COLUMNS: [&str; 5] = [
    "Total Calls",
    "Answered Calls",
    "Answer Rate",
    "Total Talk Time",
    "Average Talk Time",
];

fn call_cells(metrics: &CallVolumeMetrics) -> Vec<String> {
    vec![
        format_count(metrics.total_calls),
        format_count(metrics.answered_calls),
        format_percent(metrics.answer_rate),
        format_hms(metrics.total_talk_secs as f64),
        format_hms(metrics.average_talk_secs),
    ]
}

pub fn call_volume_report(
    calls: &[CallRecord],
    actors: &[String],
    as_of: NaiveDate,
) -> ReportBundle<CallVolumeMetrics> {
    ReportBundle {
        snapshot: assemble_snapshot(&CallVolumeSpec, calls, actors, as_of),
        mega: assemble_mega_report(&CallVolumeSpec, calls, actors, as_of),
    }
}

pub fn call_volume_tables(bundle: &ReportBundle<CallVolumeMetrics>) -> ReportTables {
    ReportTables {
        mega: mega_table("Agent", &CALL_COLUMNS, &bundle.mega, call_cells),
        snapshot: snapshot_table("Agent", &CALL_COLUMNS, &bundle.snapshot, call_cells),
    }
}

// --- Retention ---

pub struct RetentionSpec;

impl ReportSpec for RetentionSpec {
    type Record = SubscriptionRecord;
    type Metrics = RetentionMetrics;

    fn actor<'r>(&self, record: &'r SubscriptionRecord) -> &'r str {
        &record.salesperson
    }

    fn metrics(&self, records: &[&SubscriptionRecord], window: &DateWindow) -> RetentionMetrics {
        RetentionMetrics::compute(records, window)
    }

    // Either side of the ledger counts: a cancel-only week still reports.
    fn weekly_activity(&self, metrics: &RetentionMetrics) -> bool {
        metrics.cancels > 0 || metrics.starts > 0
    }
}

const RETENTION_COLUMNS: [&str; 2] = ["Cancels", "Starts"];

fn retention_cells(metrics: &RetentionMetrics) -> Vec<String> {
    vec![format_count(metrics.cancels), format_count(metrics.starts)]
}

pub fn retention_report(
    subscriptions: &[SubscriptionRecord],
    actors: &[String],
    as_of: NaiveDate,
) -> ReportBundle<RetentionMetrics> {
    ReportBundle {
        snapshot: assemble_snapshot(&RetentionSpec, subscriptions, actors, as_of),
        mega: assemble_mega_report(&RetentionSpec, subscriptions, actors, as_of),
    }
}

pub fn retention_tables(bundle: &ReportBundle<RetentionMetrics>) -> ReportTables {
    // The summary sheet groups by measure first: both Cancels columns, then
    // both Starts columns.
    let mut snapshot = Table::new(&[
        "Salesperson",
        "YTD Cancels",
        "MTD Cancels",
        "YTD Starts",
        "MTD Starts",
    ]);
    for row in &bundle.snapshot {
        snapshot.push_row(vec![
            row.actor.clone(),
            format_count(row.ytd.cancels),
            format_count(row.mtd.cancels),
            format_count(row.ytd.starts),
            format_count(row.mtd.starts),
        ]);
    }

    ReportTables {
        mega: mega_table(
            "Salesperson",
            &RETENTION_COLUMNS,
            &bundle.mega,
            retention_cells,
        ),
        snapshot,
    }
}
