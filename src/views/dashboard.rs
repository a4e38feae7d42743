//! The dashboard screen: sidebar, guess banner, metric cards and the five tabs.
//!
//! Rendering is a pure function of [`RenderContext`]. Everything shown is
//! computed from the rows passed in, so the caller decides what to cache.

use std::collections::BTreeSet;
use std::fmt::Write;

use super::chrome::{TITLE, footer, hero};
use super::figures::{ClusterColors, delay_scatter, gps_map, pca_scatter, time_box_plot};
use super::html::{BoxKind, centered_box, escape, figure_block, message_box, page, table, thousands};
use crate::analyzers::aggregate::{
    available_lines, box_plot_order, filter_by_lines, line_comparison, summary_metrics,
};
use crate::analyzers::ranking::{
    GuessOutcome, MIN_OBSERVATIONS, RANKING_SIZE, RankingEntry, compare_guess, delay_ranking,
    worst_line,
};
use crate::model::{GpsPoint, TripSummaryRecord, UserResponse};
use crate::queries::ZoneBounds;
use crate::services::dataset::MapData;
use crate::session::LineSelection;

const NOT_ANSWERED: &str = "Not answered";

/// Everything the dashboard depends on.
pub struct RenderContext<'a> {
    pub answers: &'a UserResponse,
    pub selection: &'a LineSelection,
    pub summaries: &'a [TripSummaryRecord],
    pub map: &'a MapData,
    pub zone: ZoneBounds,
}

pub fn render_dashboard(ctx: &RenderContext<'_>) -> String {
    let available = available_lines(ctx.summaries);
    let selected = ctx.selection.resolve(&available);
    let filtered = filter_by_lines(ctx.summaries, &selected);
    let colors = ClusterColors::new(ctx.summaries.iter().map(|r| r.cluster_id.as_str()));
    // The ranking always covers the whole dataset, whatever the filter.
    let ranking = delay_ranking(ctx.summaries, MIN_OBSERVATIONS, RANKING_SIZE);

    let mut main = String::new();
    main.push_str(&message_box(
        BoxKind::Success,
        &format!(
            "✅ {} records loaded from the warehouse!",
            thousands(ctx.summaries.len() as i64)
        ),
    ));
    if let Some(banner) = ctx
        .answers
        .guess()
        .and_then(|guess| compare_guess(guess, &ranking))
        .map(|outcome| guess_banner(&outcome))
    {
        main.push_str(&banner);
    }
    main.push_str(&metric_cards(&filtered));

    let tabs = [
        ("tab-cause", "📉 Cause and effect", cause_and_effect_tab(&filtered, &colors)),
        ("tab-pca", "📌 PCA clusters", pca_tab(&filtered, &colors)),
        ("tab-compare", "📦 Direct comparison", comparison_tab(&filtered, &selected, &colors)),
        ("tab-map", "🗺️ Fundão map", map_tab(ctx.map, &selected, &colors, ctx.zone)),
        ("tab-ranking", "🏆 The slowness podium", ranking_tab(&ranking)),
    ];

    main.push_str("<nav class=\"tabs\">\n");
    for (i, (id, label, _)) in tabs.iter().enumerate() {
        let active = if i == 0 { " class=\"active\"" } else { "" };
        let _ = writeln!(main, "<button type=\"button\"{active} data-tab=\"{id}\">{label}</button>");
    }
    main.push_str("</nav>\n");
    for (i, (id, _, content)) in tabs.iter().enumerate() {
        let active = if i == 0 { " active" } else { "" };
        let _ = writeln!(main, "<section id=\"{id}\" class=\"tab-panel{active}\">\n{content}</section>");
    }
    main.push_str(footer());

    let body = format!(
        "{}<div class=\"layout\">\n{}<main>\n{}</main>\n</div>\n",
        hero(),
        sidebar(ctx.answers, &available, &selected),
        main
    );
    page(TITLE, &body)
}

fn answer_or_default(answer: &str) -> String {
    if answer.trim().is_empty() {
        NOT_ANSWERED.to_string()
    } else {
        escape(answer)
    }
}

fn sidebar(answers: &UserResponse, available: &[String], selected: &BTreeSet<String>) -> String {
    let mut out = String::from("<aside class=\"sidebar\">\n<h2>📝 Your answers</h2>\n");
    out.push_str(&message_box(
        BoxKind::Success,
        &format!(
            "<strong>🚌 Rides buses in Fundão:</strong> {}<br>\
             <strong>🎯 Most used line:</strong> {}<br>\
             <strong>🔮 Your guess (most delayed):</strong> {}",
            answers.rides_zone_buses,
            answer_or_default(&answers.most_used_line),
            answer_or_default(&answers.delay_guess),
        ),
    ));
    out.push_str(
        "<form method=\"post\" action=\"/reset\"><button type=\"submit\">🔄 Retake the questionnaire</button></form>\n",
    );

    out.push_str("<h2>⚙️ Analysis filters</h2>\n<form method=\"post\" action=\"/filter\">\n");
    out.push_str("<div class=\"line-list\">\n");
    for line in available {
        let checked = if selected.contains(line) { " checked" } else { "" };
        let line = escape(line);
        let _ = writeln!(
            out,
            "<label><input type=\"checkbox\" name=\"line\" value=\"{line}\"{checked}> {line}</label>"
        );
    }
    out.push_str("</div>\n<button type=\"submit\">📍 Apply</button>\n</form>\n");
    out.push_str(
        "<form method=\"post\" action=\"/filter\"><input type=\"hidden\" name=\"mode\" value=\"all\">\
         <button type=\"submit\">Select all lines</button></form>\n",
    );
    out.push_str(
        "<form method=\"post\" action=\"/refresh\"><button type=\"submit\">♻️ Reload data</button></form>\n",
    );
    out.push_str("</aside>\n");
    out
}

fn guess_banner(outcome: &GuessOutcome) -> String {
    match outcome {
        GuessOutcome::Match { line, delay_pct } => centered_box(
            BoxKind::Success,
            &format!(
                "🎉 <strong>CONGRATULATIONS!</strong> You got it! Line <strong>{}</strong> \
                 really is the most delayed, with {delay_pct:.1}% of trips delayed!",
                escape(line)
            ),
        ),
        GuessOutcome::Mismatch {
            guess,
            actual,
            delay_pct,
        } => centered_box(
            BoxKind::Info,
            &format!(
                "🤔 You guessed line <strong>{}</strong>, but the most delayed is \
                 <strong>{}</strong> with {delay_pct:.1}% of trips delayed. See the data below!",
                escape(guess),
                escape(actual)
            ),
        ),
    }
}

fn metric_cards(filtered: &[&TripSummaryRecord]) -> String {
    let metrics = summary_metrics(filtered.iter().copied());
    let median = metrics
        .median_time_min
        .map_or_else(|| "–".to_string(), |m| format!("{m:.1} min"));
    let delay = metrics
        .mean_delay_pct
        .map_or_else(|| "–".to_string(), |d| format!("{d:.1}%"));

    let mut out = String::from("<div class=\"metrics\">\n");
    for (value, label) in [
        (median, "Median time in Fundão"),
        (delay, "Mean trip delay"),
        (metrics.cluster_count.to_string(), "Clusters identified"),
    ] {
        let _ = writeln!(
            out,
            "<div class=\"metric-card\"><div class=\"value\">{value}</div><div class=\"label\">{label}</div></div>"
        );
    }
    out.push_str("</div>\n");
    out
}

fn cause_and_effect_tab(filtered: &[&TripSummaryRecord], colors: &ClusterColors) -> String {
    let mut out = String::from("<h2>📉 The cause and effect evidence</h2>\n");
    out.push_str(&message_box(
        BoxKind::Info,
        "<strong>💡 Reading the chart:</strong> each line's time inside Fundão (x axis) against \
         the share of delayed trips (y axis).<br>\
         <strong>Points in the upper right corner are problem lines</strong> (long time and many delays)",
    ));
    out.push_str(&figure_block("fig-delay", &delay_scatter(filtered, colors)));
    out.push_str(&message_box(
        BoxKind::Warning,
        "<strong>🎯 How to read it:</strong><br>\
         • Each point is one day of operation of one line<br>\
         • <strong>Upper right</strong>: bad days, long time and many delays<br>\
         • <strong>Lower left</strong>: good days, little time and few delays<br>\
         • The trend is clear: <strong>more time inside means more delays</strong>",
    ));
    out
}

fn pca_tab(filtered: &[&TripSummaryRecord], colors: &ClusterColors) -> String {
    let mut out = String::from("<h2>📌 Cluster map: PCA analysis</h2>\n");
    out.push_str(&message_box(
        BoxKind::Info,
        "<strong>🔬 Principal component analysis:</strong> time, speed and delays reduced to two \
         main dimensions, showing how the lines group together.",
    ));
    out.push_str(&figure_block("fig-pca", &pca_scatter(filtered, colors)));
    out
}

fn comparison_tab(
    filtered: &[&TripSummaryRecord],
    selected: &BTreeSet<String>,
    colors: &ClusterColors,
) -> String {
    let mut out = String::from("<h2>📦 Direct comparison between lines</h2>\n");
    out.push_str(&message_box(
        BoxKind::Info,
        "<strong>💡 Tip:</strong> select only two or three lines in the sidebar to see the gap \
         between a problem line (e.g. 321) and an efficient one (e.g. 945 or 635).",
    ));

    if selected.is_empty() {
        out.push_str(&message_box(
            BoxKind::Warning,
            "⚠️ Select at least one line in the sidebar filter!",
        ));
        return out;
    }

    let order = box_plot_order(filtered.iter().copied());
    out.push_str(&figure_block("fig-box", &time_box_plot(filtered, colors, &order)));

    if selected.len() >= 2 {
        out.push_str("<h3>📊 Statistical comparison</h3>\n");
        let rows: Vec<Vec<String>> = line_comparison(filtered.iter().copied())
            .into_iter()
            .map(|row| {
                vec![
                    row.line,
                    format!("{:.2}", row.min_time),
                    format!("{:.2}", row.median_time),
                    format!("{:.2}", row.max_time),
                    format!("{:.2}", row.total_time),
                    format!("{:.1}%", row.mean_delay * 100.0),
                ]
            })
            .collect();
        out.push_str(&table(
            &[
                "Line",
                "Minimum (min)",
                "Median (min)",
                "Maximum (min)",
                "Total (min)",
                "Delayed trips",
            ],
            &rows,
        ));
    }
    out
}

fn map_tab(
    map: &MapData,
    selected: &BTreeSet<String>,
    colors: &ClusterColors,
    zone: ZoneBounds,
) -> String {
    let mut out = String::from("<h2>🗺️ Circulation map by cluster</h2>\n");

    let snapshot = match map {
        MapData::Loaded(snapshot) => snapshot,
        MapData::Failed(error) => {
            out.push_str(&message_box(
                BoxKind::Danger,
                &format!("❌ Could not load the map: {}", escape(error)),
            ));
            return out;
        }
    };

    if selected.is_empty() {
        out.push_str(&message_box(
            BoxKind::Warning,
            "⚠️ Select at least one line in the sidebar filter!",
        ));
        return out;
    }

    let points: Vec<&GpsPoint> = snapshot
        .data
        .iter()
        .filter(|p| selected.contains(&p.line))
        .collect();
    if points.is_empty() {
        out.push_str(&message_box(
            BoxKind::Warning,
            "⚠️ No GPS data available for the selected date and lines.",
        ));
        return out;
    }

    out.push_str(&figure_block("fig-map", &gps_map(&points, colors, zone)));
    out.push_str(&message_box(
        BoxKind::Info,
        &format!("📍 Showing {} GPS points on the map", thousands(points.len() as i64)),
    ));
    out
}

fn ranking_tab(ranking: &[RankingEntry]) -> String {
    let mut out = String::from("<h2>🏆 The podium of shame: most delayed lines</h2>\n");
    out.push_str(&message_box(
        BoxKind::Info,
        &format!(
            "<strong>📊 Method:</strong> lines are ordered by their <strong>mean share of delayed \
             trips</strong>. Only lines with at least {MIN_OBSERVATIONS} observations are counted."
        ),
    ));

    let Some(worst) = worst_line(ranking) else {
        out.push_str(&message_box(
            BoxKind::Warning,
            &format!("⚠️ No line has at least {MIN_OBSERVATIONS} observations yet."),
        ));
        return out;
    };

    let _ = writeln!(out, "<h3>📋 Top {RANKING_SIZE} most delayed lines</h3>");
    let rows: Vec<Vec<String>> = ranking
        .iter()
        .map(|entry| {
            vec![
                entry.rank.to_string(),
                entry.line.clone(),
                format!("{:.1}%", entry.delay_pct()),
                entry.observations.to_string(),
                format!("{:.1} min", entry.mean_time),
                format!("{} min", thousands(entry.total_time.round() as i64)),
            ]
        })
        .collect();
    out.push_str(&table(
        &["🏆", "Line", "% delayed", "Observations", "Mean time", "Total time"],
        &rows,
    ));

    out.push_str(&centered_box(
        BoxKind::Danger,
        &format!(
            "🚨 <strong>RED ALERT: DELAY CHAMPION</strong> 🚨<br><br>\
             <span class=\"callout-line\">LINE {}</span><br><br>\
             <strong>{:.1}%</strong> of trips delayed (over {} observations)<br>\
             Mean of <strong>{:.1} minutes</strong> inside Fundão<br>\
             Accumulated time: <strong>{} minutes</strong><br><br>\
             <em>⚠️ Not an isolated reading: this is an average over many observations.</em>",
            escape(&worst.line),
            worst.delay_pct(),
            worst.observations,
            worst.mean_time,
            thousands(worst.total_time as i64),
        ),
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::aggregate::tests::record;
    use crate::cache::Snapshot;
    use crate::model::RidesZoneBuses;
    use crate::services::dataset::tests::gps_point;
    use chrono::Utc;
    use std::sync::Arc;

    fn sample() -> Vec<TripSummaryRecord> {
        let mut rows = vec![record("917", 1, 10.0, 0.1, "1")];
        for day in 2..=6 {
            rows.push(record("917", day, 20.0, 0.9, "2"));
        }
        rows.push(record("918", 1, 5.0, 0.2, "1"));
        rows.push(record("918", 2, 5.0, 0.2, "1"));
        rows
    }

    fn loaded(points: Vec<GpsPoint>) -> MapData {
        MapData::Loaded(Snapshot {
            data: Arc::new(points),
            generation: 1,
            loaded_at: Utc::now(),
        })
    }

    fn render(answers: &UserResponse, selection: &LineSelection, map: &MapData) -> String {
        let summaries = sample();
        render_dashboard(&RenderContext {
            answers,
            selection,
            summaries: &summaries,
            map,
            zone: ZoneBounds::FUNDAO,
        })
    }

    #[test]
    fn test_mismatch_banner_names_both_lines() {
        let answers = UserResponse::new(RidesZoneBuses::Yes, "918", "918");
        let html = render(&answers, &LineSelection::All, &loaded(vec![]));

        assert!(html.contains("You guessed line <strong>918</strong>"));
        assert!(html.contains("the most delayed is <strong>917</strong> with 76.7%"));
        assert!(html.contains("LINE 917"));
    }

    #[test]
    fn test_match_banner() {
        let answers = UserResponse::new(RidesZoneBuses::Yes, "", " 917 ");
        let html = render(&answers, &LineSelection::All, &loaded(vec![]));
        assert!(html.contains("CONGRATULATIONS"));
    }

    #[test]
    fn test_no_banner_without_guess() {
        let answers = UserResponse::new(RidesZoneBuses::No, "", "");
        let html = render(&answers, &LineSelection::All, &loaded(vec![]));

        assert!(!html.contains("CONGRATULATIONS"));
        assert!(!html.contains("You guessed"));
        assert!(html.contains(NOT_ANSWERED));
    }

    #[test]
    fn test_empty_selection_warns_and_blanks_metrics() {
        let answers = UserResponse::new(RidesZoneBuses::No, "", "");
        let selection = LineSelection::Only(BTreeSet::new());
        let html = render(&answers, &selection, &loaded(vec![gps_point("917", "1")]));

        assert!(html.contains("Select at least one line"));
        assert!(html.contains("<div class=\"value\">–</div>"));
        assert!(!html.contains("data-figure=\"fig-box\""));
        assert!(!html.contains("data-figure=\"fig-map\""));
        // The ranking ignores the filter.
        assert!(html.contains("LINE 917"));
    }

    #[test]
    fn test_comparison_table_needs_two_lines() {
        let answers = UserResponse::new(RidesZoneBuses::No, "", "");
        let one = LineSelection::Only(["917".to_string()].into());
        let html = render(&answers, &one, &loaded(vec![]));
        assert!(!html.contains("Statistical comparison"));

        let html = render(&answers, &LineSelection::All, &loaded(vec![]));
        assert!(html.contains("Statistical comparison"));
    }

    #[test]
    fn test_map_failure_shows_error_panel() {
        let answers = UserResponse::new(RidesZoneBuses::No, "", "");
        let map = MapData::Failed("access denied".to_string());
        let html = render(&answers, &LineSelection::All, &map);

        assert!(html.contains("Could not load the map: access denied"));
        assert!(html.contains("data-figure=\"fig-delay\""));
    }

    #[test]
    fn test_map_counts_selected_points() {
        let answers = UserResponse::new(RidesZoneBuses::No, "", "");
        let map = loaded(vec![
            gps_point("917", "1"),
            gps_point("917", "1"),
            gps_point("918", "2"),
        ]);
        let selection = LineSelection::Only(["917".to_string()].into());
        let html = render(&answers, &selection, &map);

        assert!(html.contains("Showing 2 GPS points"));
    }

    #[test]
    fn test_map_without_points_warns() {
        let answers = UserResponse::new(RidesZoneBuses::No, "", "");
        let html = render(&answers, &LineSelection::All, &loaded(vec![]));
        assert!(html.contains("No GPS data available"));
    }

    #[test]
    fn test_user_text_is_escaped() {
        let answers = UserResponse::new(RidesZoneBuses::Yes, "<script>", "<b>");
        let html = render(&answers, &LineSelection::All, &loaded(vec![]));

        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<b>"));
    }
}
