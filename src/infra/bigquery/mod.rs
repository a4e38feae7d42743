//! BigQuery REST access for the prediction queries.

mod client;
mod table;

pub use client::{AuthorizedBigQuery, BIGQUERY_SCOPE, BigQueryClient};
pub use table::{FieldSchema, QueryResponse, ResultTable};
