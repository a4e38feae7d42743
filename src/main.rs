//! CLI entry point for the Fundão delay dashboard.
//!
//! `serve` runs the web dashboard. `ranking` loads the summary dataset once and
//! logs the delay ranking, which checks credentials and queries without a
//! browser.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use fundao_dashboard::analyzers::aggregate::{available_lines, summary_metrics};
use fundao_dashboard::analyzers::ranking::{MIN_OBSERVATIONS, RANKING_SIZE, delay_ranking};
use fundao_dashboard::infra::bigquery::AuthorizedBigQuery;
use fundao_dashboard::infra::csv_source::CsvWarehouse;
use fundao_dashboard::infra::keys::{SecretRef, load_service_account};
use fundao_dashboard::output::{print_json, write_records};
use fundao_dashboard::queries::{
    DEFAULT_BILLING_PROJECT, DEFAULT_DATASET, DEFAULT_MAP_DATE, QueryConfig, ZoneBounds,
};
use fundao_dashboard::responses::ResponseLog;
use fundao_dashboard::server::{AppState, serve};
use fundao_dashboard::services::dataset::DatasetService;
use fundao_dashboard::services::warehouse::Warehouse;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "fundao_dashboard")]
#[command(about = "Bus delay dashboard for the Fundão campus", long_about = None)]
struct Cli {
    #[command(flatten)]
    data: DataArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Source {
    /// Run the model-prediction queries on BigQuery
    Bigquery,
    /// Read both datasets from CSV files
    Csv,
}

#[derive(Args)]
struct DataArgs {
    /// Where the datasets come from
    #[arg(long, value_enum, env = "DASHBOARD_SOURCE", default_value = "bigquery", global = true)]
    source: Source,

    /// Project billed for the queries; also holds the dataset
    #[arg(long, env = "GCP_BILLING_PROJECT", default_value = DEFAULT_BILLING_PROJECT, global = true)]
    project: String,

    /// Dataset with the K-Means/PCA models and the summary table
    #[arg(long, env = "GCP_DATASET", default_value = DEFAULT_DATASET, global = true)]
    dataset: String,

    /// Day of GPS pings shown on the map
    #[arg(long, env = "DASHBOARD_MAP_DATE", default_value = DEFAULT_MAP_DATE, global = true)]
    map_date: NaiveDate,

    /// Service-account key location (env:NAME, file:PATH or ssm:/path)
    #[arg(
        long,
        env = "GCP_CREDENTIALS_REF",
        default_value = "env:GCP_SERVICE_ACCOUNT",
        global = true
    )]
    credentials: SecretRef,

    /// Expire cached query results after this many seconds (default: never)
    #[arg(long, env = "DASHBOARD_CACHE_TTL_SECS", global = true)]
    cache_ttl_secs: Option<u64>,

    /// Summary CSV, required with --source csv
    #[arg(long, env = "DASHBOARD_SUMMARY_CSV", global = true)]
    summary_csv: Option<PathBuf>,

    /// GPS CSV; without it the map shows an error panel
    #[arg(long, env = "DASHBOARD_GPS_CSV", global = true)]
    gps_csv: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the dashboard over HTTP
    Serve {
        /// Address to listen on
        #[arg(long, env = "DASHBOARD_BIND", default_value = "0.0.0.0:8080")]
        bind: String,

        /// Also append every questionnaire response to this CSV
        #[arg(long, env = "DASHBOARD_RESPONSES_CSV")]
        responses_csv: Option<PathBuf>,
    },
    /// Load the summary dataset once and log the delay ranking
    Ranking {
        /// CSV file to write the ranking to
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the ranking as JSON on stdout (logs stay on stderr)
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/fundao_dashboard.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("fundao_dashboard.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let ttl = cli.data.cache_ttl_secs.map(Duration::from_secs);
    // Credential problems end the process here, before anything is served.
    let warehouse = build_warehouse(&cli.data).await?;
    let datasets = DatasetService::new(warehouse, ttl);

    match cli.command {
        Commands::Serve {
            bind,
            responses_csv,
        } => {
            if let Some(path) = &responses_csv {
                info!(path = %path.display(), "Exporting questionnaire responses");
            }
            let state = AppState::new(datasets, ResponseLog::new(responses_csv), ZoneBounds::FUNDAO);
            serve(&bind, state).await?;
        }
        Commands::Ranking { output, json } => {
            ranking(&datasets, output.as_deref(), json).await?;
        }
    }

    Ok(())
}

/// Builds the configured warehouse. For BigQuery this loads the service-account key.
#[tracing::instrument(skip_all, fields(source = ?args.source))]
async fn build_warehouse(args: &DataArgs) -> Result<Arc<dyn Warehouse>> {
    match args.source {
        Source::Bigquery => {
            let key = load_service_account(&args.credentials).await?;
            let config = QueryConfig::new(&args.project, &args.dataset, args.map_date);
            info!(
                project = %config.project,
                dataset = %config.dataset,
                map_date = %config.map_date,
                "Using BigQuery"
            );
            Ok(Arc::new(AuthorizedBigQuery::connect(key, config)?))
        }
        Source::Csv => {
            let summary = args
                .summary_csv
                .clone()
                .context("--summary-csv is required with --source csv")?;
            info!(summary = %summary.display(), gps = ?args.gps_csv, "Using CSV files");
            Ok(Arc::new(CsvWarehouse::new(summary, args.gps_csv.clone())))
        }
    }
}

async fn ranking(datasets: &DatasetService, output: Option<&Path>, json: bool) -> Result<()> {
    let snapshot = datasets.summaries().await?;
    let metrics = summary_metrics(snapshot.data.iter());

    info!(
        records = snapshot.data.len(),
        lines = available_lines(&snapshot.data).len(),
        median_time_min = ?metrics.median_time_min,
        mean_delay_pct = ?metrics.mean_delay_pct,
        clusters = metrics.cluster_count,
        "Summary dataset loaded"
    );

    let ranking = delay_ranking(snapshot.data.iter(), MIN_OBSERVATIONS, RANKING_SIZE);
    if ranking.is_empty() {
        info!(min_observations = MIN_OBSERVATIONS, "No line qualifies for the ranking");
    }
    for entry in &ranking {
        info!(
            rank = entry.rank,
            line = %entry.line,
            delay_pct = %format!("{:.1}", entry.delay_pct()),
            observations = entry.observations,
            mean_time_min = %format!("{:.1}", entry.mean_time),
            "Ranking"
        );
    }

    if json {
        print_json(&ranking)?;
    }
    if let Some(path) = output {
        write_records(path, &ranking)?;
        info!(path = %path.display(), rows = ranking.len(), "Ranking written");
    }

    Ok(())
}
