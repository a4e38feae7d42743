//! Per-line grouping and descriptive statistics over trip summaries.

use crate::analyzers::utility::{max, mean, median, min};
use crate::model::TripSummaryRecord;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Groups records by line in ascending line order, keeping input order within
/// each group.
pub fn group_by_line<'a, I>(records: I) -> BTreeMap<&'a str, Vec<&'a TripSummaryRecord>>
where
    I: IntoIterator<Item = &'a TripSummaryRecord>,
{
    let mut groups: BTreeMap<&str, Vec<&TripSummaryRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(record.line.as_str()).or_default().push(record);
    }
    groups
}

/// Distinct line identifiers, sorted ascending.
pub fn available_lines(records: &[TripSummaryRecord]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.line.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Keeps the records whose line is in `lines`.
pub fn filter_by_lines<'a>(
    records: &'a [TripSummaryRecord],
    lines: &BTreeSet<String>,
) -> Vec<&'a TripSummaryRecord> {
    records.iter().filter(|r| lines.contains(&r.line)).collect()
}

/// Distinct cluster ids, numeric ids first in numeric order.
pub fn cluster_ids<'a, I>(cluster_ids: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut ids: Vec<String> = cluster_ids
        .into_iter()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect();
    ids.sort_by_key(|id| (id.parse::<i64>().map_err(|_| ()), id.clone()));
    ids
}

/// Row of the side-by-side comparison table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineComparison {
    pub line: String,
    pub min_time: f64,
    pub median_time: f64,
    pub max_time: f64,
    pub mean_time: f64,
    pub total_time: f64,
    pub mean_delay: f64,
}

/// Per-line transit-time spread and mean delay, in ascending line order.
pub fn line_comparison<'a, I>(records: I) -> Vec<LineComparison>
where
    I: IntoIterator<Item = &'a TripSummaryRecord>,
{
    group_by_line(records)
        .into_iter()
        .filter_map(|(line, rows)| {
            let times: Vec<f64> = rows.iter().map(|r| r.time_in_zone_min).collect();
            let delays: Vec<f64> = rows.iter().map(|r| r.delay_proportion).collect();

            Some(LineComparison {
                line: line.to_string(),
                min_time: min(&times)?,
                median_time: median(&times)?,
                max_time: max(&times)?,
                mean_time: mean(&times)?,
                total_time: times.iter().sum(),
                mean_delay: mean(&delays)?,
            })
        })
        .collect()
}

/// Headline numbers shown on the metric cards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryMetrics {
    pub median_time_min: Option<f64>,
    pub mean_delay_pct: Option<f64>,
    pub cluster_count: usize,
}

pub fn summary_metrics<'a, I>(records: I) -> SummaryMetrics
where
    I: IntoIterator<Item = &'a TripSummaryRecord>,
{
    let mut times = Vec::new();
    let mut delays = Vec::new();
    let mut clusters = BTreeSet::new();

    for record in records {
        times.push(record.time_in_zone_min);
        delays.push(record.delay_proportion);
        clusters.insert(record.cluster_id.as_str());
    }

    SummaryMetrics {
        median_time_min: median(&times),
        mean_delay_pct: mean(&delays).map(|d| d * 100.0),
        cluster_count: clusters.len(),
    }
}

/// Line order for the box plot: descending median time in zone.
///
/// The sort is stable over ascending line order, so equal medians keep that order.
pub fn box_plot_order<'a, I>(records: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a TripSummaryRecord>,
{
    let mut medians: Vec<(&str, f64)> = group_by_line(records)
        .into_iter()
        .filter_map(|(line, rows)| {
            let times: Vec<f64> = rows.iter().map(|r| r.time_in_zone_min).collect();
            median(&times).map(|m| (line, m))
        })
        .collect();

    medians.sort_by(|a, b| b.1.total_cmp(&a.1));
    medians.into_iter().map(|(line, _)| line.to_string()).collect()
}
