//! Cached access to the two warehouse datasets.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::cache::{ResultCache, Snapshot};
use crate::model::{GpsPoint, TripSummaryRecord};
use crate::services::warehouse::Warehouse;

/// Outcome of loading the map dataset. A failure here only disables the map.
#[derive(Debug, Clone)]
pub enum MapData {
    Loaded(Snapshot<Vec<GpsPoint>>),
    Failed(String),
}

impl MapData {
    /// Generation of the loaded data, or 0 when loading failed.
    pub fn generation(&self) -> u64 {
        match self {
            MapData::Loaded(snapshot) => snapshot.generation,
            MapData::Failed(_) => 0,
        }
    }
}

/// Wraps a [`Warehouse`] with one result cache per dataset.
pub struct DatasetService {
    warehouse: Arc<dyn Warehouse>,
    summaries: ResultCache<Vec<TripSummaryRecord>>,
    gps: ResultCache<Vec<GpsPoint>>,
}

impl DatasetService {
    pub fn new(warehouse: Arc<dyn Warehouse>, ttl: Option<Duration>) -> Self {
        Self {
            warehouse,
            summaries: ResultCache::new(ttl),
            gps: ResultCache::new(ttl),
        }
    }

    /// The summary dataset. Errors propagate: the dashboard cannot render without it.
    pub async fn summaries(&self) -> Result<Snapshot<Vec<TripSummaryRecord>>> {
        let key = self.warehouse.summary_key();
        self.summaries
            .get_or_load(&key, || self.warehouse.trip_summaries())
            .await
            .context("failed to load trip summaries")
    }

    /// The GPS dataset. Errors are logged and reported as [`MapData::Failed`].
    pub async fn gps(&self) -> MapData {
        let key = self.warehouse.gps_key();
        match self
            .gps
            .get_or_load(&key, || self.warehouse.gps_points())
            .await
        {
            Ok(snapshot) => MapData::Loaded(snapshot),
            Err(e) => {
                warn!(error = %format!("{e:#}"), "GPS query failed, map disabled");
                MapData::Failed(format!("{e:#}"))
            }
        }
    }

    /// Drops every cached result so the next request queries the warehouse again.
    pub async fn refresh(&self) {
        let summaries = self.summaries.invalidate_all().await;
        let gps = self.gps.invalidate_all().await;
        info!(summaries, gps, "Cached query results dropped");
    }
}
