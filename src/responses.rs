//! Log of submitted questionnaires.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::info;

use crate::model::UserResponse;
use crate::output::append_record;

/// Keeps every submitted questionnaire in memory and, when configured, also
/// appends it to a CSV file.
pub struct ResponseLog {
    entries: Mutex<Vec<UserResponse>>,
    csv_path: Option<PathBuf>,
    // Serializes appends so only the first one writes the header.
    export: Mutex<()>,
}

impl ResponseLog {
    pub fn new(csv_path: Option<PathBuf>) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            csv_path,
            export: Mutex::new(()),
        }
    }

    pub async fn record(&self, response: &UserResponse) -> Result<()> {
        let total = {
            let mut entries = self.entries.lock().await;
            entries.push(response.clone());
            entries.len()
        };

        info!(
            total,
            rides_zone_buses = %response.rides_zone_buses,
            guessed = response.guess().is_some(),
            "Questionnaire response recorded"
        );

        if let Some(path) = self.csv_path.clone() {
            let _export = self.export.lock().await;
            let response = response.clone();
            tokio::task::spawn_blocking(move || append_record(&path, &response))
                .await
                .context("response export task failed")??;
        }
        Ok(())
    }

    pub async fn snapshot(&self) -> Vec<UserResponse> {
        self.entries.lock().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RidesZoneBuses;

    #[tokio::test]
    async fn test_responses_accumulate_in_memory() {
        let log = ResponseLog::new(None);
        log.record(&UserResponse::new(RidesZoneBuses::Yes, "917", "918"))
            .await
            .unwrap();
        log.record(&UserResponse::new(RidesZoneBuses::No, "", ""))
            .await
            .unwrap();

        let entries = log.snapshot().await;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].delay_guess, "918");
    }

    #[tokio::test]
    async fn test_responses_are_appended_to_csv() {
        let path = std::env::temp_dir().join("fundao_dashboard_test_log.csv");
        let _ = std::fs::remove_file(&path);

        let log = ResponseLog::new(Some(path.clone()));
        log.record(&UserResponse::new(RidesZoneBuses::Yes, "917", "321"))
            .await
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);

        std::fs::remove_file(&path).unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_exports_write_one_header() {
        let path = std::env::temp_dir().join("fundao_dashboard_test_concurrent_log.csv");
        let _ = std::fs::remove_file(&path);

        let log = std::sync::Arc::new(ResponseLog::new(Some(path.clone())));
        let tasks: Vec<_> = (0..8)
            .map(|i| {
                let log = log.clone();
                tokio::spawn(async move {
                    let line = format!("9{i}");
                    log.record(&UserResponse::new(RidesZoneBuses::Yes, &line, ""))
                        .await
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 9);
        assert_eq!(content.matches("submitted_at").count(), 1);
        assert_eq!(log.snapshot().await.len(), 8);

        std::fs::remove_file(&path).unwrap();
    }
}
