//! Trait for the data warehouse that holds the model predictions.

use anyhow::Result;

use crate::model::{GpsPoint, TripSummaryRecord};

/// Source of the two dashboard datasets.
///
/// Implemented by the BigQuery client for production and by the CSV reader
/// for offline runs and tests.
#[async_trait::async_trait]
pub trait Warehouse: Send + Sync {
    /// Identity of the summary query. Results are cached under this key.
    fn summary_key(&self) -> String;

    /// Identity of the GPS query. Results are cached under this key.
    fn gps_key(&self) -> String;

    /// Every (line, date) observation with cluster and PCA columns.
    async fn trip_summaries(&self) -> Result<Vec<TripSummaryRecord>>;

    /// GPS pings inside the zone on the map date, joined with that day's clusters.
    async fn gps_points(&self) -> Result<Vec<GpsPoint>>;
}
