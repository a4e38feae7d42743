//! Wire types of the BigQuery `jobs.query` / `jobs.getQueryResults` responses
//! and their conversion into typed records.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Number, Value};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    #[serde(default)]
    pub schema: Option<TableSchema>,
    #[serde(default)]
    pub job_reference: Option<JobReference>,
    #[serde(default)]
    pub rows: Vec<TableRow>,
    #[serde(default)]
    pub page_token: Option<String>,
    #[serde(default = "complete_by_default")]
    pub job_complete: bool,
    #[serde(default)]
    pub total_rows: Option<String>,
}

fn complete_by_default() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct TableSchema {
    #[serde(default)]
    pub fields: Vec<FieldSchema>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FieldSchema {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobReference {
    pub project_id: String,
    pub job_id: String,
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TableRow {
    #[serde(default)]
    pub f: Vec<Cell>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Cell {
    #[serde(default)]
    pub v: Value,
}

/// Rows accumulated across result pages, with the schema used to type them.
#[derive(Debug, Clone, Default)]
pub struct ResultTable {
    fields: Vec<FieldSchema>,
    rows: Vec<Vec<Value>>,
}

impl ResultTable {
    pub fn new(fields: Vec<FieldSchema>) -> Self {
        Self {
            fields,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn extend(&mut self, rows: Vec<TableRow>) -> Result<()> {
        for (i, row) in rows.into_iter().enumerate() {
            if row.f.len() != self.fields.len() {
                anyhow::bail!(
                    "row {} has {} cells but the schema has {} fields",
                    self.rows.len() + i,
                    row.f.len(),
                    self.fields.len()
                );
            }
            self.rows.push(row.f.into_iter().map(|c| c.v).collect());
        }
        Ok(())
    }

    /// Types each cell by its schema field and deserializes every row into `T`.
    pub fn into_records<T: DeserializeOwned>(self) -> Result<Vec<T>> {
        let fields = self.fields;
        self.rows
            .into_iter()
            .enumerate()
            .map(|(i, row)| {
                let mut object = Map::with_capacity(fields.len());
                for (field, cell) in fields.iter().zip(row) {
                    let value = typed_cell(&field.field_type, cell)
                        .with_context(|| format!("row {i}, column '{}'", field.name))?;
                    object.insert(field.name.clone(), value);
                }
                serde_json::from_value(Value::Object(object))
                    .with_context(|| format!("row {i} does not match the expected columns"))
            })
            .collect()
    }
}

/// BigQuery sends scalar cells as strings; convert them by declared type.
fn typed_cell(field_type: &str, cell: Value) -> Result<Value> {
    let raw = match cell {
        Value::String(s) => s,
        other => return Ok(other),
    };

    let value = match field_type.to_ascii_uppercase().as_str() {
        "FLOAT" | "FLOAT64" | "NUMERIC" | "BIGNUMERIC" => {
            let n: f64 = raw.parse().with_context(|| format!("'{raw}' is not a number"))?;
            // "NaN" and "Infinity" parse but have no JSON form.
            let n = Number::from_f64(n)
                .with_context(|| format!("non-finite value '{raw}' cannot be used"))?;
            Value::Number(n)
        }
        "INTEGER" | "INT64" => {
            let n: i64 = raw.parse().with_context(|| format!("'{raw}' is not an integer"))?;
            Value::Number(n.into())
        }
        "BOOLEAN" | "BOOL" => Value::Bool(raw.eq_ignore_ascii_case("true")),
        "TIMESTAMP" => {
            let seconds: f64 = raw
                .parse()
                .with_context(|| format!("'{raw}' is not an epoch timestamp"))?;
            let whole = seconds.floor();
            let nanos = ((seconds - whole) * 1e9).round() as u32;
            let ts = DateTime::from_timestamp(whole as i64, nanos.min(999_999_999))
                .ok_or_else(|| anyhow::anyhow!("timestamp '{raw}' is out of range"))?;
            Value::String(ts.to_rfc3339())
        }
        // Civil time without a zone, e.g. `2025-10-15T08:00:00.123`; read as UTC.
        "DATETIME" => {
            let naive = NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
                .or_else(|_| NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S%.f"))
                .with_context(|| format!("'{raw}' is not a datetime"))?;
            Value::String(naive.and_utc().to_rfc3339())
        }
        _ => Value::String(raw),
    };

    Ok(value)
}
