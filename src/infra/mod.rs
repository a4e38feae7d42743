pub mod bigquery;
pub mod csv_source;
pub mod keys;
