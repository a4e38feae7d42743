//! plotly.js figure specs for the chart views.
//!
//! Every builder splits its rows into one trace per cluster so that cluster
//! colors line up across charts.

use serde::Serialize;
use serde_json::{Value, json};

use crate::analyzers::aggregate::cluster_ids;
use crate::model::{GpsPoint, TripSummaryRecord};
use crate::queries::ZoneBounds;

/// plotly's "Bold" qualitative palette.
pub const BOLD: [&str; 11] = [
    "rgb(127, 60, 141)",
    "rgb(17, 165, 121)",
    "rgb(57, 105, 172)",
    "rgb(242, 183, 1)",
    "rgb(231, 63, 116)",
    "rgb(128, 186, 90)",
    "rgb(230, 131, 16)",
    "rgb(0, 134, 149)",
    "rgb(207, 28, 144)",
    "rgb(249, 123, 114)",
    "rgb(165, 170, 153)",
];

const MAX_MARKER_PX: f64 = 20.0;

#[derive(Debug, Clone, Serialize)]
pub struct Figure {
    pub data: Vec<Value>,
    pub layout: Value,
}

/// Assigns palette colors to cluster ids in a fixed order.
#[derive(Debug, Clone)]
pub struct ClusterColors {
    ids: Vec<String>,
}

impl ClusterColors {
    pub fn new<'a, I>(ids: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        Self {
            ids: cluster_ids(ids),
        }
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn color(&self, id: &str) -> &'static str {
        let index = self.ids.iter().position(|c| c == id).unwrap_or(0);
        BOLD[index % BOLD.len()]
    }
}

fn base_layout(title: &str, height: u32, x_title: &str, y_title: &str) -> Value {
    json!({
        "title": {"text": title},
        "height": height,
        "plot_bgcolor": "white",
        "legend": {"title": {"text": "Cluster"}},
        "xaxis": {"title": {"text": x_title}, "gridcolor": "#e5e7eb"},
        "yaxis": {"title": {"text": y_title}, "gridcolor": "#e5e7eb"},
    })
}

fn rows_in<'a>(
    records: &'a [&'a TripSummaryRecord],
    cluster: &'a str,
) -> impl Iterator<Item = &'a TripSummaryRecord> + 'a {
    records
        .iter()
        .copied()
        .filter(move |r| r.cluster_id == cluster)
}

/// Delay proportion against time in zone, marker area by average speed.
pub fn delay_scatter(records: &[&TripSummaryRecord], colors: &ClusterColors) -> Figure {
    let max_speed = records
        .iter()
        .map(|r| r.avg_speed)
        .fold(0.0_f64, f64::max);
    let sizeref = if max_speed > 0.0 {
        2.0 * max_speed / (MAX_MARKER_PX * MAX_MARKER_PX)
    } else {
        1.0
    };

    let data = colors
        .ids()
        .iter()
        .filter(|id| records.iter().any(|r| &r.cluster_id == *id))
        .map(|id| {
            let rows: Vec<&TripSummaryRecord> = rows_in(records, id).collect();
            json!({
                "type": "scatter",
                "mode": "markers",
                "name": id,
                "x": rows.iter().map(|r| r.time_in_zone_min).collect::<Vec<_>>(),
                "y": rows.iter().map(|r| r.delay_proportion).collect::<Vec<_>>(),
                "text": rows.iter().map(|r| format!("Line {} · {}", r.line, r.date)).collect::<Vec<_>>(),
                "hovertemplate": "%{text}<br>Time in zone: %{x:.1f} min<br>Delayed trips: %{y:.0%}<extra>Cluster %{fullData.name}</extra>",
                "marker": {
                    "color": colors.color(id),
                    "size": rows.iter().map(|r| r.avg_speed.max(0.0)).collect::<Vec<_>>(),
                    "sizemode": "area",
                    "sizeref": sizeref,
                    "sizemin": 2,
                    "line": {"width": 1, "color": "DarkSlateGrey"},
                },
            })
        })
        .collect();

    Figure {
        data,
        layout: base_layout(
            "Time in zone × share of delayed trips",
            600,
            "Total time in zone (minutes)",
            "Share of delayed trips",
        ),
    }
}

/// First two principal components.
pub fn pca_scatter(records: &[&TripSummaryRecord], colors: &ClusterColors) -> Figure {
    let data = colors
        .ids()
        .iter()
        .filter(|id| records.iter().any(|r| &r.cluster_id == *id))
        .map(|id| {
            let rows: Vec<&TripSummaryRecord> = rows_in(records, id).collect();
            json!({
                "type": "scatter",
                "mode": "markers",
                "name": id,
                "x": rows.iter().map(|r| r.pc1).collect::<Vec<_>>(),
                "y": rows.iter().map(|r| r.pc2).collect::<Vec<_>>(),
                "text": rows.iter().map(|r| format!(
                    "Line {}<br>Time in zone: {:.1} min<br>Delayed trips: {:.0}%",
                    r.line, r.time_in_zone_min, r.delay_proportion * 100.0
                )).collect::<Vec<_>>(),
                "hovertemplate": "%{text}<extra>Cluster %{fullData.name}</extra>",
                "marker": {
                    "color": colors.color(id),
                    "size": 10,
                    "line": {"width": 1, "color": "DarkSlateGrey"},
                },
            })
        })
        .collect();

    Figure {
        data,
        layout: base_layout(
            "Clusters in PCA space",
            600,
            "Principal component 1",
            "Principal component 2",
        ),
    }
}

/// Time-in-zone distribution per line, x axis in `line_order`.
pub fn time_box_plot(
    records: &[&TripSummaryRecord],
    colors: &ClusterColors,
    line_order: &[String],
) -> Figure {
    let data = colors
        .ids()
        .iter()
        .filter(|id| records.iter().any(|r| &r.cluster_id == *id))
        .map(|id| {
            let rows: Vec<&TripSummaryRecord> = rows_in(records, id).collect();
            json!({
                "type": "box",
                "name": id,
                "x": rows.iter().map(|r| r.line.as_str()).collect::<Vec<_>>(),
                "y": rows.iter().map(|r| r.time_in_zone_min).collect::<Vec<_>>(),
                "marker": {"color": colors.color(id)},
            })
        })
        .collect();

    let mut layout = base_layout(
        "Time in zone per line",
        600,
        "Line",
        "Total time in zone (minutes)",
    );
    layout["boxmode"] = json!("group");
    layout["xaxis"]["type"] = json!("category");
    layout["xaxis"]["categoryorder"] = json!("array");
    layout["xaxis"]["categoryarray"] = json!(line_order);

    Figure { data, layout }
}

/// GPS pings on an OpenStreetMap base layer centered on the zone.
pub fn gps_map(points: &[&GpsPoint], colors: &ClusterColors, zone: ZoneBounds) -> Figure {
    let (lat, lon) = zone.center();

    let data = colors
        .ids()
        .iter()
        .filter(|id| points.iter().any(|p| &p.cluster_id == *id))
        .map(|id| {
            let rows: Vec<&GpsPoint> = points
                .iter()
                .copied()
                .filter(|p| &p.cluster_id == id)
                .collect();
            json!({
                "type": "scattermapbox",
                "mode": "markers",
                "name": id,
                "lat": rows.iter().map(|p| p.latitude).collect::<Vec<_>>(),
                "lon": rows.iter().map(|p| p.longitude).collect::<Vec<_>>(),
                "text": rows.iter().map(|p| p.line.as_str()).collect::<Vec<_>>(),
                "customdata": rows.iter().map(|p| p.timestamp.format("%H:%M:%S").to_string()).collect::<Vec<_>>(),
                "hovertemplate": "<b>%{text}</b><br>%{customdata}<extra>Cluster %{fullData.name}</extra>",
                "marker": {"color": colors.color(id), "size": 7},
            })
        })
        .collect();

    Figure {
        data,
        layout: json!({
            "title": {"text": "Where each cluster circulates"},
            "height": 700,
            "legend": {"title": {"text": "Cluster"}},
            "mapbox": {
                "style": "open-street-map",
                "center": {"lat": lat, "lon": lon},
                "zoom": 13,
            },
            "margin": {"r": 0, "t": 40, "l": 0, "b": 0},
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::aggregate::tests::record;
    use crate::services::dataset::tests::gps_point;

    #[test]
    fn test_one_trace_per_present_cluster() {
        let rows = vec![
            record("917", 1, 10.0, 0.1, "1"),
            record("918", 1, 20.0, 0.2, "2"),
            record("918", 2, 30.0, 0.3, "2"),
        ];
        let refs: Vec<&TripSummaryRecord> = rows.iter().collect();
        let colors = ClusterColors::new(["1", "2", "3"]);

        let fig = delay_scatter(&refs, &colors);

        assert_eq!(fig.data.len(), 2);
        assert_eq!(fig.data[1]["name"], "2");
        assert_eq!(fig.data[1]["x"], json!([20.0, 30.0]));
        assert_eq!(fig.data[1]["marker"]["color"], BOLD[1]);
    }

    #[test]
    fn test_colors_are_stable_across_subsets() {
        let colors = ClusterColors::new(["0", "1", "2"]);
        assert_eq!(colors.color("2"), BOLD[2]);
        assert_eq!(colors.ids(), &["0", "1", "2"]);
    }

    #[test]
    fn test_box_plot_uses_line_order() {
        let rows = vec![record("917", 1, 10.0, 0.1, "1")];
        let refs: Vec<&TripSummaryRecord> = rows.iter().collect();
        let order = vec!["321".to_string(), "917".to_string()];

        let fig = time_box_plot(&refs, &ClusterColors::new(["1"]), &order);

        assert_eq!(fig.layout["xaxis"]["categoryarray"], json!(["321", "917"]));
        assert_eq!(fig.data[0]["type"], "box");
    }

    #[test]
    fn test_map_centers_on_zone() {
        let points = vec![gps_point("917", "1")];
        let refs: Vec<&GpsPoint> = points.iter().collect();

        let fig = gps_map(&refs, &ClusterColors::new(["1"]), ZoneBounds::FUNDAO);

        assert_eq!(fig.layout["mapbox"]["style"], "open-street-map");
        assert_eq!(fig.data[0]["customdata"], json!(["08:00:00"]));
    }

    #[test]
    fn test_empty_input_gives_empty_figure() {
        let fig = pca_scatter(&[], &ClusterColors::new(["1"]));
        assert!(fig.data.is_empty());
    }
}
