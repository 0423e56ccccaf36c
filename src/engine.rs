//! The interval aggregation engine.
//!
//! Every report in this crate has the same shape: a set of dated records
//! grouped by actor, summarized over weekly windows with month-to-date and
//! fiscal-year-to-date figures recomputed *as of each week's end*. That loop
//! lives here exactly once, parameterized by a [`ReportSpec`] that owns the
//! metric arithmetic.

use std::collections::HashMap;

use chrono::NaiveDate;
use log::debug;

use crate::periods::{
    fiscal_year_start, month_start, mtd_window, weekly_windows, ytd_window, DateWindow,
};

/// Strategy for one report: how to attribute a record to an actor, how to
/// summarize a window, and when a weekly row counts as activity.
pub trait ReportSpec {
    type Record;
    type Metrics: Clone;

    /// Actor the aggregation groups this record under.
    fn actor<'r>(&self, record: &'r Self::Record) -> &'r str;

    /// Metrics for one actor's records restricted to `window`. The record
    /// slice is the actor's full history; window filtering happens here so
    /// a spec may window several date fields independently.
    fn metrics(&self, records: &[&Self::Record], window: &DateWindow) -> Self::Metrics;

    /// Whether a weekly row shows activity. Inactive weeks are omitted from
    /// the mega report; the drop predicate differs per report.
    fn weekly_activity(&self, metrics: &Self::Metrics) -> bool;
}

/// One actor-week of the mega report: the week's own figures plus MTD and
/// YTD recomputed as of the week's end.
#[derive(Debug, Clone)]
pub struct MegaRow<M> {
    pub actor: String,
    pub week: DateWindow,
    pub weekly: M,
    pub mtd: M,
    pub ytd: M,
}

/// One actor of the snapshot report: YTD and MTD as of the run date.
#[derive(Debug, Clone)]
pub struct SnapshotRow<M> {
    pub actor: String,
    pub ytd: M,
    pub mtd: M,
}

fn group_by_actor<'a, S: ReportSpec>(
    spec: &S,
    records: &'a [S::Record],
) -> HashMap<&'a str, Vec<&'a S::Record>> {
    let mut by_actor: HashMap<&str, Vec<&S::Record>> = HashMap::new();
    for record in records {
        by_actor.entry(spec.actor(record)).or_default().push(record);
    }
    by_actor
}

/// Builds the weekly mega report: for every weekly window from the fiscal
/// year start through `as_of`, and every actor, the weekly metrics plus MTD
/// and YTD metrics using only data through that week's end. Weeks where an
/// actor shows no activity produce no row.
///
/// Because every figure is derived from `[some_start, week_end]` windows,
/// historical weeks are stable: re-running with a later `as_of` never
/// changes a finished week's row.
pub fn assemble_mega_report<S: ReportSpec>(
    spec: &S,
    records: &[S::Record],
    actors: &[String],
    as_of: NaiveDate,
) -> Vec<MegaRow<S::Metrics>> {
    let by_actor = group_by_actor(spec, records);
    let fy_start = fiscal_year_start(as_of);
    let weeks = weekly_windows(fy_start, as_of);

    let mut rows = Vec::new();
    for week in &weeks {
        let week_mtd = DateWindow::new(month_start(week.end), week.end);
        let week_ytd = DateWindow::new(fy_start, week.end);

        for actor in actors {
            let actor_records = by_actor
                .get(actor.as_str())
                .map(Vec::as_slice)
                .unwrap_or(&[]);

            let weekly = spec.metrics(actor_records, week);
            if !spec.weekly_activity(&weekly) {
                continue;
            }

            rows.push(MegaRow {
                actor: actor.clone(),
                week: *week,
                weekly,
                mtd: spec.metrics(actor_records, &week_mtd),
                ytd: spec.metrics(actor_records, &week_ytd),
            });
        }
    }

    debug!(
        "mega report: {} weeks x {} actors -> {} active rows",
        weeks.len(),
        actors.len(),
        rows.len()
    );
    rows
}

/// Builds the snapshot report: one row per actor with YTD and MTD metrics
/// as of `as_of`. Every actor appears, including those with no activity at
/// all; their metrics are all zero.
pub fn assemble_snapshot<S: ReportSpec>(
    spec: &S,
    records: &[S::Record],
    actors: &[String],
    as_of: NaiveDate,
) -> Vec<SnapshotRow<S::Metrics>> {
    let by_actor = group_by_actor(spec, records);
    let ytd = ytd_window(as_of);
    let mtd = mtd_window(as_of);

    actors
        .iter()
        .map(|actor| {
            let actor_records = by_actor
                .get(actor.as_str())
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            SnapshotRow {
                actor: actor.clone(),
                ytd: spec.metrics(actor_records, &ytd),
                mtd: spec.metrics(actor_records, &mtd),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Days;

    /// Minimal spec over bare dated events, counting them per window.
    struct CountSpec;

    #[derive(Debug, Clone)]
    struct Event {
        actor: String,
        date: Option<NaiveDate>,
    }

    impl ReportSpec for CountSpec {
        type Record = Event;
        type Metrics = u64;

        fn actor<'r>(&self, record: &'r Event) -> &'r str {
            &record.actor
        }

        fn metrics(&self, records: &[&Event], window: &DateWindow) -> u64 {
            records
                .iter()
                .filter(|e| window.contains_opt(e.date))
                .count() as u64
        }

        fn weekly_activity(&self, metrics: &u64) -> bool {
            *metrics > 0
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn event(actor: &str, on: NaiveDate) -> Event {
        Event {
            actor: actor.to_string(),
            date: Some(on),
        }
    }

    #[test]
    fn test_mega_report_skips_inactive_weeks() {
        let records = vec![
            event("A", date(2024, 9, 3)),
            event("A", date(2024, 9, 17)),
            event("B", date(2024, 9, 3)),
        ];
        let actors = vec!["A".to_string(), "B".to_string()];
        let rows = assemble_mega_report(&CountSpec, &records, &actors, date(2024, 9, 30));

        // A is active in two weeks, B in one; the quiet weeks between the
        // fiscal year start and as_of produce nothing.
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|row| row.weekly > 0));
    }

    #[test]
    fn test_mega_report_ytd_accumulates_as_of_week_end() {
        let records = vec![
            event("A", date(2024, 9, 3)),
            event("A", date(2024, 9, 10)),
            event("A", date(2024, 9, 17)),
        ];
        let actors = vec!["A".to_string()];
        let rows = assemble_mega_report(&CountSpec, &records, &actors, date(2024, 9, 30));

        let ytds: Vec<u64> = rows.iter().map(|row| row.ytd).collect();
        assert_eq!(ytds, vec![1, 2, 3]);
    }

    #[test]
    fn test_mega_report_mtd_resets_at_month_boundary() {
        let records = vec![
            event("A", date(2024, 9, 26)),
            event("A", date(2024, 10, 1)),
        ];
        let actors = vec!["A".to_string()];
        let rows = assemble_mega_report(&CountSpec, &records, &actors, date(2024, 10, 13));

        // Week of Sept 23 counts only September activity in its MTD; the
        // week containing Oct 1 starts a fresh month-to-date.
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].mtd, 1);
        assert_eq!(rows[1].mtd, 1);
        assert_eq!(rows[1].ytd, 2);
    }

    #[test]
    fn test_as_of_reconstruction_is_stable() {
        let records = vec![
            event("A", date(2024, 9, 3)),
            event("A", date(2024, 9, 10)),
            event("A", date(2024, 10, 2)),
        ];
        let actors = vec!["A".to_string()];

        let early = assemble_mega_report(&CountSpec, &records, &actors, date(2024, 9, 15));
        let late = assemble_mega_report(&CountSpec, &records, &actors, date(2024, 11, 1));

        for early_row in &early {
            let late_row = late
                .iter()
                .find(|r| r.week.start == early_row.week.start && r.actor == early_row.actor)
                .expect("historical week must survive a later run");
            assert_eq!(late_row.weekly, early_row.weekly);
            assert_eq!(late_row.mtd, early_row.mtd);
            assert_eq!(late_row.ytd, early_row.ytd);
        }
    }

    #[test]
    fn test_truncated_final_week_matches_full_run_at_that_date() {
        // Property from the spec: a week's figures under as_of = week_end
        // equal that week's figures under any later as_of.
        let records = vec![event("A", date(2024, 9, 11))];
        let actors = vec!["A".to_string()];
        let mid_week = date(2024, 9, 11);

        let truncated = assemble_mega_report(&CountSpec, &records, &actors, mid_week);
        let last = truncated.last().unwrap();
        assert_eq!(last.week.end, mid_week);

        let full = assemble_mega_report(&CountSpec, &records, &actors, mid_week + Days::new(30));
        let same_week = full
            .iter()
            .find(|r| r.week.start == last.week.start)
            .unwrap();
        assert_eq!(same_week.weekly, last.weekly);
        assert_eq!(same_week.ytd, last.ytd);
    }

    #[test]
    fn test_snapshot_includes_inactive_actors() {
        let records = vec![event("A", date(2024, 9, 3))];
        let actors = vec!["A".to_string(), "B".to_string()];
        let rows = assemble_snapshot(&CountSpec, &records, &actors, date(2024, 9, 30));

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].actor, "A");
        assert_eq!(rows[0].ytd, 1);
        assert_eq!(rows[1].actor, "B");
        assert_eq!(rows[1].ytd, 0);
        assert_eq!(rows[1].mtd, 0);
    }

    #[test]
    fn test_undated_records_never_match() {
        let records = vec![Event {
            actor: "A".to_string(),
            date: None,
        }];
        let actors = vec!["A".to_string()];
        let rows = assemble_mega_report(&CountSpec, &records, &actors, date(2024, 9, 30));
        assert!(rows.is_empty());

        let snapshot = assemble_snapshot(&CountSpec, &records, &actors, date(2024, 9, 30));
        assert_eq!(snapshot[0].ytd, 0);
    }
}
