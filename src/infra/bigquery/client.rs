use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info};

use super::table::{JobReference, QueryResponse, ResultTable};
use crate::fetch::auth::{BearerAuth, ServiceAccountKey, ServiceAccountTokens};
use crate::fetch::{BasicClient, HttpClient, send_json};
use crate::model::{GpsPoint, TripSummaryRecord};
use crate::queries::QueryConfig;
use crate::services::warehouse::Warehouse;

pub const BIGQUERY_SCOPE: &str = "https://www.googleapis.com/auth/bigquery";
const API_BASE: &str = "https://bigquery.googleapis.com/bigquery/v2";

/// Server-side wait per call while a job is still running.
const POLL_TIMEOUT_MS: u64 = 30_000;
const PAGE_SIZE: u32 = 10_000;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    query: &'a str,
    use_legacy_sql: bool,
    timeout_ms: u64,
    max_results: u32,
}

/// Runs standard-SQL queries through the BigQuery REST API.
pub struct BigQueryClient<C> {
    http: C,
    builder: reqwest::Client,
    base_url: String,
    config: QueryConfig,
}

/// The production client: service-account bearer tokens over a plain client.
pub type AuthorizedBigQuery = BigQueryClient<BearerAuth<BasicClient, ServiceAccountTokens>>;

impl AuthorizedBigQuery {
    /// Builds a client authorized by `key`. Billing goes to `config.project`.
    pub fn connect(key: ServiceAccountKey, config: QueryConfig) -> Result<Self> {
        let tokens = ServiceAccountTokens::new(key, BIGQUERY_SCOPE)?;
        let http = BearerAuth::new(BasicClient::new()?, tokens);
        Ok(BigQueryClient::new(http, config))
    }
}

impl<C: HttpClient> BigQueryClient<C> {
    pub fn new(http: C, config: QueryConfig) -> Self {
        Self {
            http,
            builder: reqwest::Client::new(),
            base_url: API_BASE.to_string(),
            config,
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Runs `sql`, waits for the job to finish and reads every result page.
    #[tracing::instrument(skip(self, sql), fields(project = %self.config.project))]
    pub async fn query(&self, sql: &str) -> Result<ResultTable> {
        let url = format!("{}/projects/{}/queries", self.base_url, self.config.project);
        let body = QueryRequest {
            query: sql,
            use_legacy_sql: false,
            timeout_ms: POLL_TIMEOUT_MS,
            max_results: PAGE_SIZE,
        };
        let req = self.builder.post(&url).json(&body).build()?;

        let mut response: QueryResponse = send_json(&self.http, req)
            .await
            .context("BigQuery query request failed")?;

        let job = response
            .job_reference
            .clone()
            .ok_or_else(|| anyhow::anyhow!("BigQuery response has no jobReference"))?;

        while !response.job_complete {
            debug!(job_id = %job.job_id, "Job still running, waiting for results");
            response = self.get_results(&job, None).await?;
        }

        let fields = response
            .schema
            .take()
            .map(|s| s.fields)
            .unwrap_or_default();
        let mut table = ResultTable::new(fields);
        table.extend(std::mem::take(&mut response.rows))?;

        let mut page_token = response.page_token.take();
        while let Some(token) = page_token {
            let page = self.get_results(&job, Some(&token)).await?;
            debug!(rows = page.rows.len(), "Fetched result page");
            table.extend(page.rows)?;
            page_token = page.page_token;
        }

        info!(
            job_id = %job.job_id,
            rows = table.len(),
            total_rows = response.total_rows.as_deref().unwrap_or("?"),
            "Query finished"
        );
        Ok(table)
    }

    async fn get_results(&self, job: &JobReference, page_token: Option<&str>) -> Result<QueryResponse> {
        let url = format!(
            "{}/projects/{}/queries/{}",
            self.base_url, job.project_id, job.job_id
        );

        let mut params = vec![
            ("timeoutMs", POLL_TIMEOUT_MS.to_string()),
            ("maxResults", PAGE_SIZE.to_string()),
        ];
        if let Some(location) = &job.location {
            params.push(("location", location.clone()));
        }
        if let Some(token) = page_token {
            params.push(("pageToken", token.to_string()));
        }

        let req = self.builder.get(&url).query(&params).build()?;
        send_json(&self.http, req)
            .await
            .with_context(|| format!("BigQuery getQueryResults failed for job {}", job.job_id))
    }
}

#[async_trait]
impl<C: HttpClient> Warehouse for BigQueryClient<C> {
    fn summary_key(&self) -> String {
        format!("bigquery:{}", self.config.summary_sql())
    }

    fn gps_key(&self) -> String {
        format!("bigquery:{}", self.config.gps_sql())
    }

    async fn trip_summaries(&self) -> Result<Vec<TripSummaryRecord>> {
        self.query(&self.config.summary_sql())
            .await?
            .into_records()
            .context("summary query returned unexpected rows")
    }

    async fn gps_points(&self) -> Result<Vec<GpsPoint>> {
        self.query(&self.config.gps_sql())
            .await?
            .into_records()
            .context("GPS query returned unexpected rows")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned JSON bodies and records the requested URLs.
    struct Replay {
        bodies: Mutex<VecDeque<&'static str>>,
        urls: Mutex<Vec<String>>,
    }

    impl Replay {
        fn new(bodies: &[&'static str]) -> Self {
            Self {
                bodies: Mutex::new(bodies.iter().copied().collect()),
                urls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl HttpClient for Replay {
        async fn execute(&self, req: reqwest::Request) -> Result<reqwest::Response> {
            self.urls.lock().unwrap().push(req.url().to_string());
            let body = self
                .bodies
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected extra request");
            Ok(reqwest::Response::from(http::Response::new(body)))
        }
    }

    fn config() -> QueryConfig {
        QueryConfig::new("proj", "ds", NaiveDate::from_ymd_opt(2025, 10, 15).unwrap())
    }

    const RUNNING: &str =
        r#"{"jobReference": {"projectId": "proj", "jobId": "job_9", "location": "US"}, "jobComplete": false}"#;

    const PAGE_ONE: &str = r#"{
        "jobReference": {"projectId": "proj", "jobId": "job_9", "location": "US"},
        "jobComplete": true,
        "totalRows": "2",
        "pageToken": "tok-2",
        "schema": {"fields": [{"name": "line", "type": "STRING"}, {"name": "n", "type": "INTEGER"}]},
        "rows": [{"f": [{"v": "917"}, {"v": "1"}]}]
    }"#;

    const PAGE_TWO: &str = r#"{
        "jobReference": {"projectId": "proj", "jobId": "job_9", "location": "US"},
        "jobComplete": true,
        "schema": {"fields": [{"name": "line", "type": "STRING"}, {"name": "n", "type": "INTEGER"}]},
        "rows": [{"f": [{"v": "918"}, {"v": "2"}]}]
    }"#;

    #[derive(serde::Deserialize)]
    struct Row {
        line: String,
        n: i64,
    }

    #[tokio::test]
    async fn test_query_polls_and_pages() {
        let client = BigQueryClient::new(Replay::new(&[RUNNING, PAGE_ONE, PAGE_TWO]), config())
            .with_base_url("https://bq.test/v2/");

        let table = client.query("SELECT 1").await.unwrap();
        assert_eq!(table.len(), 2);

        let rows: Vec<Row> = table.into_records().unwrap();
        assert_eq!(rows[0].line, "917");
        assert_eq!(rows[1].n, 2);

        let urls = client.http.urls.lock().unwrap().clone();
        assert_eq!(urls[0], "https://bq.test/v2/projects/proj/queries");
        assert!(urls[1].starts_with("https://bq.test/v2/projects/proj/queries/job_9?"));
        assert!(urls[1].contains("location=US"));
        assert!(urls[2].contains("pageToken=tok-2"));
    }

    #[tokio::test]
    async fn test_http_error_is_reported() {
        struct Failing;

        #[async_trait]
        impl HttpClient for Failing {
            async fn execute(&self, _req: reqwest::Request) -> Result<reqwest::Response> {
                let response = http::Response::builder()
                    .status(403)
                    .body("access denied")
                    .unwrap();
                Ok(reqwest::Response::from(response))
            }
        }

        let client = BigQueryClient::new(Failing, config());
        let err = client.trip_summaries().await.unwrap_err();
        assert!(format!("{err:#}").contains("403"));
    }

    #[test]
    fn test_cache_keys_differ_per_query() {
        let client = BigQueryClient::new(Replay::new(&[]), config());
        assert_ne!(client.summary_key(), client.gps_key());
        assert!(client.summary_key().starts_with("bigquery:"));
    }
}
