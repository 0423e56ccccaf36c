use serde::Serialize;

use crate::periods::DateWindow;
use crate::schema::{CallRecord, CloseStatus, LeadRecord, SaleRecord, SubscriptionRecord};

/// Percentage with a zero-denominator guard: rates over an empty window are
/// 0, never NaN.
fn percent(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64 * 100.0
    }
}

fn mean(total: f64, count: u64) -> f64 {
    if count == 0 {
        0.0
    } else {
        total / count as f64
    }
}

/// Close-rate figures for one actor over one window.
///
/// The close rate is recurring wins over everything closed, expressed as a
/// percentage; one-time wins dilute the rate but do not count as misses the
/// way losses do.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CloseRateMetrics {
    pub lost: u64,
    pub won_recurring: u64,
    pub won_one_time: u64,
    pub total_closed: u64,
    pub close_rate: f64,
}

impl CloseRateMetrics {
    pub fn compute(leads: &[&LeadRecord], window: &DateWindow) -> Self {
        let mut metrics = Self::default();
        for lead in leads {
            if !window.contains_opt(lead.close_date) {
                continue;
            }
            match &lead.close_status {
                Some(CloseStatus::Lost(_)) => metrics.lost += 1,
                Some(CloseStatus::WonRecurring) => metrics.won_recurring += 1,
                Some(CloseStatus::WonOneTime) => metrics.won_one_time += 1,
                Some(CloseStatus::Open(_)) | None => {}
            }
        }
        metrics.total_closed = metrics.lost + metrics.won_recurring + metrics.won_one_time;
        metrics.close_rate = percent(metrics.won_recurring, metrics.total_closed);
        metrics
    }
}

/// Sales figures for one actor over one window, based on first-year ACV.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SalesMetrics {
    pub total_sales: f64,
    pub count: u64,
    pub average_sale: f64,
}

impl SalesMetrics {
    pub fn compute(sales: &[&SaleRecord], window: &DateWindow) -> Self {
        let mut metrics = Self::default();
        for sale in sales {
            if !window.contains_opt(sale.add_date) {
                continue;
            }
            metrics.total_sales += sale.first_year_acv;
            metrics.count += 1;
        }
        metrics.average_sale = mean(metrics.total_sales, metrics.count);
        metrics
    }
}

/// Call-volume figures for one agent over one window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CallVolumeMetrics {
    pub total_calls: u64,
    pub answered_calls: u64,
    /// Percentage of calls answered.
    pub answer_rate: f64,
    pub total_talk_secs: u64,
    pub average_talk_secs: f64,
}

impl CallVolumeMetrics {
    pub fn compute(calls: &[&CallRecord], window: &DateWindow) -> Self {
        let mut metrics = Self::default();
        for call in calls {
            if !window.contains_opt(call.call_date) {
                continue;
            }
            metrics.total_calls += 1;
            metrics.total_talk_secs += call.talk_time_secs;
            if call.status.as_ref().is_some_and(|s| s.is_answered()) {
                metrics.answered_calls += 1;
            }
        }
        metrics.answer_rate = percent(metrics.answered_calls, metrics.total_calls);
        metrics.average_talk_secs = mean(metrics.total_talk_secs as f64, metrics.total_calls);
        metrics
    }
}

/// Start and cancellation counts for one actor over one window. The two
/// counts window different date fields of the same record set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RetentionMetrics {
    pub cancels: u64,
    pub starts: u64,
}

impl RetentionMetrics {
    pub fn compute(subscriptions: &[&SubscriptionRecord], window: &DateWindow) -> Self {
        let mut metrics = Self::default();
        for subscription in subscriptions {
            if window.contains_opt(subscription.cancel_date) {
                metrics.cancels += 1;
            }
            if window.contains_opt(subscription.date_added) {
                metrics.starts += 1;
            }
        }
        metrics
    }
}
