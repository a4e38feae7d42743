//! Offline warehouse backed by CSV exports of the two query results.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::model::{GpsPoint, TripSummaryRecord};
use crate::services::warehouse::Warehouse;

/// Reads the summary and GPS datasets from CSV files whose headers match the
/// record field names.
pub struct CsvWarehouse {
    summary_path: PathBuf,
    gps_path: Option<PathBuf>,
}

impl CsvWarehouse {
    pub fn new(summary_path: impl Into<PathBuf>, gps_path: Option<PathBuf>) -> Self {
        Self {
            summary_path: summary_path.into(),
            gps_path,
        }
    }
}

fn load_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut rdr = csv::Reader::from_reader(file);
    let mut rows = Vec::new();

    for (i, result) in rdr.deserialize().enumerate() {
        let record: T = result.with_context(|| format!("{}: bad row {}", path.display(), i + 1))?;
        rows.push(record);
    }

    debug!(path = %path.display(), rows = rows.len(), "CSV loaded");
    Ok(rows)
}

#[async_trait::async_trait]
impl Warehouse for CsvWarehouse {
    fn summary_key(&self) -> String {
        format!("csv:{}", self.summary_path.display())
    }

    fn gps_key(&self) -> String {
        match &self.gps_path {
            Some(path) => format!("csv:{}", path.display()),
            None => "csv:<none>".to_string(),
        }
    }

    async fn trip_summaries(&self) -> Result<Vec<TripSummaryRecord>> {
        load_rows(&self.summary_path)
    }

    async fn gps_points(&self) -> Result<Vec<GpsPoint>> {
        let path = self
            .gps_path
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("no GPS CSV configured"))?;
        load_rows(path)
    }
}
