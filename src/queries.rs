//! SQL text for the two warehouse queries.
//!
//! The statements are fixed; only the identifiers below vary, and their
//! defaults point at the published analysis dataset.

use chrono::NaiveDate;

pub const DEFAULT_BILLING_PROJECT: &str = "profound-portal-480504-a2";
pub const DEFAULT_DATASET: &str = "analise_cocada";
pub const DEFAULT_MAP_DATE: &str = "2025-10-15";

/// Public GPS feed of Rio de Janeiro's municipal buses.
pub const GPS_TABLE: &str = "datario.transporte_rodoviario_municipal.gps_onibus";

/// Upper bound on the rows returned by the map query.
pub const MAP_ROW_LIMIT: usize = 5000;

/// Latitude/longitude box around the campus zone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneBounds {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl ZoneBounds {
    pub const FUNDAO: ZoneBounds = ZoneBounds {
        lat_min: -22.870,
        lat_max: -22.838,
        lon_min: -43.250,
        lon_max: -43.198,
    };

    pub fn center(&self) -> (f64, f64) {
        (
            (self.lat_min + self.lat_max) / 2.0,
            (self.lon_min + self.lon_max) / 2.0,
        )
    }
}

/// Identifiers the queries are built from.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryConfig {
    pub project: String,
    pub dataset: String,
    pub kmeans_model: String,
    pub pca_model: String,
    pub summary_table: String,
    pub map_date: NaiveDate,
    pub zone: ZoneBounds,
    pub map_row_limit: usize,
}

impl QueryConfig {
    pub fn new(project: &str, dataset: &str, map_date: NaiveDate) -> Self {
        Self {
            project: project.to_string(),
            dataset: dataset.to_string(),
            kmeans_model: "modelo_kmeans".to_string(),
            pca_model: "modelo_pca".to_string(),
            summary_table: "tabela_resumo".to_string(),
            map_date,
            zone: ZoneBounds::FUNDAO,
            map_row_limit: MAP_ROW_LIMIT,
        }
    }

    fn qualified(&self, name: &str) -> String {
        format!("`{}.{}.{}`", self.project, self.dataset, name)
    }

    /// Joins the K-Means and PCA predictions for every summary row.
    pub fn summary_sql(&self) -> String {
        let kmeans = self.qualified(&self.kmeans_model);
        let pca = self.qualified(&self.pca_model);
        let table = self.qualified(&self.summary_table);

        format!(
            r#"
WITH kmeans AS (
    SELECT * FROM ML.PREDICT(MODEL {kmeans},
        (SELECT * FROM {table} WHERE tempo_total_fundao IS NOT NULL))
),
pca AS (
    SELECT * FROM ML.PREDICT(MODEL {pca},
        (SELECT * FROM {table} WHERE tempo_total_fundao IS NOT NULL))
)
SELECT
    k.linha AS line,
    k.data AS date,
    k.tempo_total_fundao AS time_in_zone_min,
    k.prop_atrasadas AS delay_proportion,
    k.velocidade_media_fundao AS avg_speed,
    CAST(k.centroid_id AS STRING) AS cluster_id,
    p.principal_component_1 AS pc1,
    p.principal_component_2 AS pc2
FROM kmeans k
JOIN pca p
  ON k.linha = p.linha AND k.data = p.data
"#
        )
    }

    /// GPS pings in the zone on the map date, joined with that day's clusters.
    pub fn gps_sql(&self) -> String {
        let kmeans = self.qualified(&self.kmeans_model);
        let table = self.qualified(&self.summary_table);
        let date = self.map_date.format("%Y-%m-%d");
        let z = &self.zone;

        format!(
            r#"
WITH day_clusters AS (
    SELECT linha AS line, data AS date, centroid_id AS cluster_id
    FROM ML.PREDICT(MODEL {kmeans}, (SELECT * FROM {table}))
    WHERE data = '{date}'
),
gps AS (
    SELECT
        servico AS line,
        data AS date,
        latitude,
        longitude,
        timestamp_gps AS timestamp
    FROM `{gps_table}`
    WHERE data = '{date}'
      AND latitude BETWEEN {lat_min} AND {lat_max}
      AND longitude BETWEEN {lon_min} AND {lon_max}
)
SELECT
    g.line,
    g.latitude,
    g.longitude,
    g.timestamp,
    CAST(c.cluster_id AS STRING) AS cluster_id
FROM gps g
JOIN day_clusters c
  ON g.line = c.line AND g.date = c.date
LIMIT {limit}
"#,
            gps_table = GPS_TABLE,
            lat_min = z.lat_min,
            lat_max = z.lat_max,
            lon_min = z.lon_min,
            lon_max = z.lon_max,
            limit = self.map_row_limit,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> QueryConfig {
        QueryConfig::new(
            DEFAULT_BILLING_PROJECT,
            DEFAULT_DATASET,
            NaiveDate::parse_from_str(DEFAULT_MAP_DATE, "%Y-%m-%d").unwrap(),
        )
    }

    #[test]
    fn test_summary_sql_references_both_models() {
        let sql = config().summary_sql();
        assert!(sql.contains("`profound-portal-480504-a2.analise_cocada.modelo_kmeans`"));
        assert!(sql.contains("`profound-portal-480504-a2.analise_cocada.modelo_pca`"));
        assert!(sql.contains("AS delay_proportion"));
        assert!(sql.contains("ON k.linha = p.linha AND k.data = p.data"));
    }

    #[test]
    fn test_gps_sql_is_scoped_and_limited() {
        let sql = config().gps_sql();
        assert!(sql.contains("WHERE data = '2025-10-15'"));
        assert!(sql.contains("latitude BETWEEN -22.87 AND -22.838"));
        assert!(sql.contains("longitude BETWEEN -43.25 AND -43.198"));
        assert!(sql.trim_end().ends_with("LIMIT 5000"));
        assert!(sql.contains(GPS_TABLE));
    }

    #[test]
    fn test_zone_center() {
        let (lat, lon) = ZoneBounds::FUNDAO.center();
        assert!((lat + 22.854).abs() < 1e-9);
        assert!((lon + 43.224).abs() < 1e-9);
    }
}
