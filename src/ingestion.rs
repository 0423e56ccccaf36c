use std::path::Path;

use chrono::NaiveDate;
use log::{debug, warn};
use serde::Deserialize;

use crate::error::{ReportError, Result};
use crate::schema::{
    CallRecord, CallStatus, CloseStatus, LeadRecord, Roster, SaleRecord, SubscriptionRecord,
};

/// File names of the weekly review exports, as produced by the upstream
/// export job.
pub const LEADS_EXPORT: &str = "Leads-Reporting Export.csv";
pub const PRICE_ANALYSIS_EXPORT: &str = "Price Analysis.csv";
pub const CALLS_EXPORT: &str = "Calls.csv";
pub const STARTS_EXPORT: &str = "Starts.csv";

/// Outcome of loading one export: the usable records plus bookkeeping about
/// what was filtered or damaged on the way in.
#[derive(Debug, Clone)]
pub struct LoadReport<T> {
    pub records: Vec<T>,
    /// Data rows present in the file.
    pub rows_read: usize,
    /// Rows removed by roster policy, exclusion lists or the lower date bound.
    pub rows_dropped: usize,
    /// Rows kept whose event date could not be parsed. They are excluded
    /// from every window but still counted here so a noisy export is visible.
    pub undated_rows: usize,
}

impl<T> LoadReport<T> {
    fn new() -> Self {
        Self {
            records: Vec::new(),
            rows_read: 0,
            rows_dropped: 0,
            undated_rows: 0,
        }
    }
}

/// Accepted event-date formats. The two-digit-year form is tried before the
/// four-digit one so "9/2/24" resolves to 2024, not year 24.
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%m/%d/%y", "%m/%d/%Y", "%Y-%m-%d %H:%M:%S"];

/// Best-effort date parse. `None` means the record carries no usable event
/// date and will not match any window.
pub fn parse_date(raw: Option<&str>) -> Option<NaiveDate> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
}

/// Parses a currency field like "$1,234.56". An empty field is zero; a
/// malformed non-empty field is a hard error, since silently zeroing revenue
/// would corrupt every downstream total.
pub fn parse_money(raw: Option<&str>) -> std::result::Result<f64, String> {
    let raw = match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => raw,
        None => return Ok(0.0),
    };
    let cleaned: String = raw.chars().filter(|c| *c != '$' && *c != ',').collect();
    cleaned
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("unparseable currency amount '{}'", raw))
}

/// Parses a talk-time field in `HH:MM:SS` form into seconds. Blank or
/// malformed values are zero, matching how the call export pads missed calls.
pub fn parse_talk_time(raw: Option<&str>) -> u64 {
    let raw = match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => raw,
        None => return 0,
    };
    let parts: Vec<&str> = raw.split(':').collect();
    if parts.len() != 3 {
        return 0;
    }
    match (
        parts[0].parse::<u64>(),
        parts[1].parse::<u64>(),
        parts[2].parse::<u64>(),
    ) {
        (Ok(h), Ok(m), Ok(s)) => h * 3600 + m * 60 + s,
        _ => 0,
    }
}

fn open_reader(path: &Path) -> Result<csv::Reader<std::fs::File>> {
    csv::Reader::from_path(path).map_err(|source| ReportError::InputFile {
        path: path.to_path_buf(),
        source,
    })
}

fn warn_undated(file: &str, row: usize, field: &str) {
    warn!("{file}: row {row}: unparseable {field}; excluded from all windows");
}

#[derive(Debug, Deserialize)]
struct LeadRow {
    #[serde(rename = "Salesperson")]
    salesperson: Option<String>,
    #[serde(rename = "Close Date")]
    close_date: Option<String>,
    #[serde(rename = "Close Status")]
    close_status: Option<String>,
    #[serde(rename = "Lead Type")]
    lead_type: Option<String>,
}

/// Loads the leads export for the close-rate report.
pub fn load_leads(
    path: &Path,
    roster: &Roster,
    exclude_channels: &[String],
    beginning_of_time: Option<NaiveDate>,
) -> Result<LoadReport<LeadRecord>> {
    let mut report = LoadReport::new();
    let mut reader = open_reader(path)?;

    for (idx, row) in reader.deserialize::<LeadRow>().enumerate() {
        let row = row?;
        report.rows_read += 1;

        if let Some(lead_type) = row.lead_type.as_deref() {
            if exclude_channels.iter().any(|c| c == lead_type) {
                report.rows_dropped += 1;
                continue;
            }
        }
        let salesperson = match roster.normalize(row.salesperson.as_deref()) {
            Some(name) => name,
            None => {
                report.rows_dropped += 1;
                continue;
            }
        };

        let close_date = parse_date(row.close_date.as_deref());
        if close_date.is_none() {
            if row.close_date.as_deref().is_some_and(|s| !s.trim().is_empty()) {
                warn_undated(LEADS_EXPORT, idx + 2, "close date");
            }
            if beginning_of_time.is_some() {
                report.rows_dropped += 1;
                continue;
            }
            report.undated_rows += 1;
        } else if let (Some(start), Some(date)) = (beginning_of_time, close_date) {
            if date < start {
                report.rows_dropped += 1;
                continue;
            }
        }

        report.records.push(LeadRecord {
            salesperson,
            close_date,
            close_status: row
                .close_status
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(CloseStatus::parse),
            lead_type: row.lead_type,
        });
    }

    debug!(
        "{}: {} rows, {} kept, {} dropped, {} undated",
        LEADS_EXPORT,
        report.rows_read,
        report.records.len(),
        report.rows_dropped,
        report.undated_rows
    );
    Ok(report)
}

#[derive(Debug, Deserialize)]
struct SaleRow {
    #[serde(rename = "Salesperson")]
    salesperson: Option<String>,
    #[serde(rename = "Add Date")]
    add_date: Option<String>,
    #[serde(rename = "First Year ACV")]
    first_year_acv: Option<String>,
    #[serde(rename = "Sale Type")]
    sale_type: Option<String>,
}

/// Loads the price-analysis export for the sales report.
pub fn load_sales(
    path: &Path,
    roster: &Roster,
    exclude_sale_types: &[String],
    beginning_of_time: Option<NaiveDate>,
) -> Result<LoadReport<SaleRecord>> {
    let mut report = LoadReport::new();
    let mut reader = open_reader(path)?;

    for (idx, row) in reader.deserialize::<SaleRow>().enumerate() {
        let row = row?;
        report.rows_read += 1;

        if let Some(sale_type) = row.sale_type.as_deref() {
            if exclude_sale_types.iter().any(|t| t == sale_type) {
                report.rows_dropped += 1;
                continue;
            }
        }
        let salesperson = match roster.normalize(row.salesperson.as_deref()) {
            Some(name) => name,
            None => {
                report.rows_dropped += 1;
                continue;
            }
        };

        let add_date = parse_date(row.add_date.as_deref());
        if add_date.is_none() {
            if row.add_date.as_deref().is_some_and(|s| !s.trim().is_empty()) {
                warn_undated(PRICE_ANALYSIS_EXPORT, idx + 2, "add date");
            }
            if beginning_of_time.is_some() {
                report.rows_dropped += 1;
                continue;
            }
            report.undated_rows += 1;
        } else if let (Some(start), Some(date)) = (beginning_of_time, add_date) {
            if date < start {
                report.rows_dropped += 1;
                continue;
            }
        }

        let first_year_acv = parse_money(row.first_year_acv.as_deref()).map_err(|details| {
            ReportError::Field {
                file: PRICE_ANALYSIS_EXPORT.to_string(),
                row: idx + 2,
                details,
            }
        })?;

        report.records.push(SaleRecord {
            salesperson,
            add_date,
            first_year_acv,
            sale_type: row.sale_type,
        });
    }

    debug!(
        "{}: {} rows, {} kept, {} dropped, {} undated",
        PRICE_ANALYSIS_EXPORT,
        report.rows_read,
        report.records.len(),
        report.rows_dropped,
        report.undated_rows
    );
    Ok(report)
}

#[derive(Debug, Deserialize)]
struct CallRow {
    #[serde(rename = "Agent")]
    agent: Option<String>,
    #[serde(rename = "Date")]
    date: Option<String>,
    #[serde(rename = "Call Status")]
    call_status: Option<String>,
    #[serde(rename = "Talk Time")]
    talk_time: Option<String>,
}

/// Loads the call-log export for the call-volume report.
pub fn load_calls(
    path: &Path,
    roster: &Roster,
    exclude_call_statuses: &[String],
    beginning_of_time: Option<NaiveDate>,
) -> Result<LoadReport<CallRecord>> {
    let mut report = LoadReport::new();
    let mut reader = open_reader(path)?;

    for (idx, row) in reader.deserialize::<CallRow>().enumerate() {
        let row = row?;
        report.rows_read += 1;

        if let Some(status) = row.call_status.as_deref() {
            if exclude_call_statuses.iter().any(|s| s == status) {
                report.rows_dropped += 1;
                continue;
            }
        }
        let agent = match roster.normalize(row.agent.as_deref()) {
            Some(name) => name,
            None => {
                report.rows_dropped += 1;
                continue;
            }
        };

        let call_date = parse_date(row.date.as_deref());
        if call_date.is_none() {
            if row.date.as_deref().is_some_and(|s| !s.trim().is_empty()) {
                warn_undated(CALLS_EXPORT, idx + 2, "call date");
            }
            if beginning_of_time.is_some() {
                report.rows_dropped += 1;
                continue;
            }
            report.undated_rows += 1;
        } else if let (Some(start), Some(date)) = (beginning_of_time, call_date) {
            if date < start {
                report.rows_dropped += 1;
                continue;
            }
        }

        report.records.push(CallRecord {
            agent,
            call_date,
            status: row
                .call_status
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(CallStatus::parse),
            talk_time_secs: parse_talk_time(row.talk_time.as_deref()),
        });
    }

    debug!(
        "{}: {} rows, {} kept, {} dropped, {} undated",
        CALLS_EXPORT,
        report.rows_read,
        report.records.len(),
        report.rows_dropped,
        report.undated_rows
    );
    Ok(report)
}

#[derive(Debug, Deserialize)]
struct SubscriptionRow {
    #[serde(rename = "Salesperson")]
    salesperson: Option<String>,
    #[serde(rename = "Date Added")]
    date_added: Option<String>,
    #[serde(rename = "Cancel Date")]
    cancel_date: Option<String>,
}

/// Loads the starts export for the retention report. A row survives the
/// lower date bound when either of its event dates qualifies, since starts
/// and cancellations are windowed independently.
pub fn load_subscriptions(
    path: &Path,
    roster: &Roster,
    beginning_of_time: Option<NaiveDate>,
) -> Result<LoadReport<SubscriptionRecord>> {
    let mut report = LoadReport::new();
    let mut reader = open_reader(path)?;

    for (idx, row) in reader.deserialize::<SubscriptionRow>().enumerate() {
        let row = row?;
        report.rows_read += 1;

        let salesperson = match roster.normalize(row.salesperson.as_deref()) {
            Some(name) => name,
            None => {
                report.rows_dropped += 1;
                continue;
            }
        };

        let date_added = parse_date(row.date_added.as_deref());
        let cancel_date = parse_date(row.cancel_date.as_deref());
        if date_added.is_none()
            && row.date_added.as_deref().is_some_and(|s| !s.trim().is_empty())
        {
            warn_undated(STARTS_EXPORT, idx + 2, "date added");
        }
        if cancel_date.is_none()
            && row.cancel_date.as_deref().is_some_and(|s| !s.trim().is_empty())
        {
            warn_undated(STARTS_EXPORT, idx + 2, "cancel date");
        }

        if let Some(start) = beginning_of_time {
            let added_ok = date_added.is_some_and(|d| d >= start);
            let cancelled_ok = cancel_date.is_some_and(|d| d >= start);
            if !added_ok && !cancelled_ok {
                report.rows_dropped += 1;
                continue;
            }
        }
        if date_added.is_none() && cancel_date.is_none() {
            report.undated_rows += 1;
        }

        report.records.push(SubscriptionRecord {
            salesperson,
            date_added,
            cancel_date,
        });
    }

    debug!(
        "{}: {} rows, {} kept, {} dropped, {} undated",
        STARTS_EXPORT,
        report.rows_read,
        report.records.len(),
        report.rows_dropped,
        report.undated_rows
    );
    Ok(report)
}
