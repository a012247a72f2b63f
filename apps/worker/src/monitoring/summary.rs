//! Aggregated performance summaries.
//!
//! Success rate, mean/median durations, per-report-type and per-format
//! breakdowns, an error-category histogram derived by keyword matching on
//! error text, and per-day trend series for performance and quality.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::monitoring::tracker::{PerformanceSpan, PerformanceTracker};

#[derive(Debug, Clone, Copy)]
pub struct DateRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupStats {
    pub count: usize,
    pub success_rate: f64,
    pub average_duration_ms: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailyPerformance {
    pub day: NaiveDate,
    pub count: usize,
    pub success_rate: f64,
    pub average_duration_ms: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailyQuality {
    pub day: NaiveDate,
    pub samples: usize,
    pub average_score: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PerformanceSummary {
    pub total_operations: usize,
    pub success_rate: f64,
    pub average_duration_ms: f64,
    pub median_duration_ms: f64,
    pub by_report_type: BTreeMap<String, GroupStats>,
    pub by_output_format: BTreeMap<String, GroupStats>,
    pub error_categories: BTreeMap<String, usize>,
    pub daily_performance: Vec<DailyPerformance>,
    pub daily_quality: Vec<DailyQuality>,
}

/// Maps an error message to a coarse category by keyword. First match wins;
/// anything unrecognized is `other`.
pub fn categorize_error(message: &str) -> &'static str {
    let lower = message.to_lowercase();
    const CATEGORIES: &[(&str, &[&str])] = &[
        ("timeout", &["timeout", "timed out", "deadline", "budget exceeded"]),
        ("validation", &["validation", "invalid", "malformed"]),
        ("not_found", &["not found", "missing", "no such"]),
        ("authorization", &["unauthorized", "forbidden", "authorization", "access denied"]),
        ("network", &["network", "connection", "unreachable", "dns"]),
        ("model_error", &["model", "llm", "generation", "rate limited"]),
        ("storage", &["storage", "s3", "blob", "database", "sql"]),
    ];
    for (category, keywords) in CATEGORIES {
        if keywords.iter().any(|k| lower.contains(k)) {
            return category;
        }
    }
    "other"
}

impl PerformanceTracker {
    /// Aggregates completed spans and quality samples inside a date range.
    pub fn performance_summary(&self, range: &DateRange) -> PerformanceSummary {
        let spans = self.spans_between(range.from, range.to);
        let quality = self.quality_between(range.from, range.to);

        let total = spans.len();
        let successes = spans.iter().filter(|s| s.success).count();
        let success_rate = if total == 0 {
            1.0
        } else {
            successes as f64 / total as f64
        };

        let durations: Vec<i64> = spans.iter().filter_map(|s| s.duration_ms).collect();
        let average_duration_ms = mean(&durations);
        let median_duration_ms = median(&durations);

        let mut error_categories: BTreeMap<String, usize> = BTreeMap::new();
        for span in spans.iter().filter(|s| !s.success) {
            let message = span.error_message.as_deref().unwrap_or("");
            *error_categories
                .entry(categorize_error(message).to_string())
                .or_default() += 1;
        }

        let by_report_type = group_stats(&spans, |s| s.metadata.report_type.clone());
        let by_output_format = group_stats(&spans, |s| s.metadata.output_format.clone());

        // Per-day trend series, in chronological order.
        let mut per_day: BTreeMap<NaiveDate, Vec<&PerformanceSpan>> = BTreeMap::new();
        for span in &spans {
            per_day.entry(span.started_at.date_naive()).or_default().push(span);
        }
        let daily_performance = per_day
            .into_iter()
            .map(|(day, day_spans)| {
                let day_durations: Vec<i64> =
                    day_spans.iter().filter_map(|s| s.duration_ms).collect();
                DailyPerformance {
                    day,
                    count: day_spans.len(),
                    success_rate: day_spans.iter().filter(|s| s.success).count() as f64
                        / day_spans.len() as f64,
                    average_duration_ms: mean(&day_durations),
                }
            })
            .collect();

        let mut quality_per_day: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
        for metric in &quality {
            quality_per_day
                .entry(metric.recorded_at.date_naive())
                .or_default()
                .push(metric.quality_score);
        }
        let daily_quality = quality_per_day
            .into_iter()
            .map(|(day, scores)| DailyQuality {
                day,
                samples: scores.len(),
                average_score: scores.iter().sum::<f64>() / scores.len() as f64,
            })
            .collect();

        PerformanceSummary {
            total_operations: total,
            success_rate,
            average_duration_ms,
            median_duration_ms,
            by_report_type,
            by_output_format,
            error_categories,
            daily_performance,
            daily_quality,
        }
    }
}

fn group_stats(
    spans: &[PerformanceSpan],
    key: impl Fn(&PerformanceSpan) -> Option<String>,
) -> BTreeMap<String, GroupStats> {
    let mut grouped: BTreeMap<String, Vec<&PerformanceSpan>> = BTreeMap::new();
    for span in spans {
        if let Some(k) = key(span) {
            grouped.entry(k).or_default().push(span);
        }
    }
    grouped
        .into_iter()
        .map(|(k, group)| {
            let durations: Vec<i64> = group.iter().filter_map(|s| s.duration_ms).collect();
            let stats = GroupStats {
                count: group.len(),
                success_rate: group.iter().filter(|s| s.success).count() as f64
                    / group.len() as f64,
                average_duration_ms: mean(&durations),
            };
            (k, stats)
        })
        .collect()
}

fn mean(durations: &[i64]) -> f64 {
    if durations.is_empty() {
        return 0.0;
    }
    durations.iter().sum::<i64>() as f64 / durations.len() as f64
}

fn median(durations: &[i64]) -> f64 {
    if durations.is_empty() {
        return 0.0;
    }
    let mut sorted = durations.to_vec();
    sorted.sort_unstable();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[mid] as f64
    } else {
        (sorted[mid - 1] + sorted[mid]) as f64 / 2.0
    }
}
