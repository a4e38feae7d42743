//! The "worst delay" ranking and the questionnaire guess check built on it.

use crate::analyzers::aggregate::group_by_line;
use crate::analyzers::utility::{mean, sample_stddev};
use crate::model::TripSummaryRecord;
use serde::Serialize;

/// Lines with fewer observations than this are left out of the ranking.
pub const MIN_OBSERVATIONS: usize = 5;

/// Number of rows kept in the ranking table.
pub const RANKING_SIZE: usize = 10;

/// One row of the ranking table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingEntry {
    pub rank: usize,
    pub line: String,
    pub mean_delay: f64,
    pub stddev_delay: Option<f64>,
    pub observations: usize,
    pub mean_time: f64,
    pub total_time: f64,
    pub mean_speed: f64,
}

impl RankingEntry {
    pub fn delay_pct(&self) -> f64 {
        self.mean_delay * 100.0
    }
}

/// Ranks lines by mean delay proportion, highest first.
///
/// Only lines with at least `min_observations` rows take part. Groups are
/// visited in ascending line order and the sort is stable, so lines with equal
/// mean delay stay in ascending line order.
pub fn delay_ranking<'a, I>(records: I, min_observations: usize, top: usize) -> Vec<RankingEntry>
where
    I: IntoIterator<Item = &'a TripSummaryRecord>,
{
    let mut entries: Vec<RankingEntry> = group_by_line(records)
        .into_iter()
        .filter(|(_, rows)| rows.len() >= min_observations)
        .filter_map(|(line, rows)| {
            let delays: Vec<f64> = rows.iter().map(|r| r.delay_proportion).collect();
            let times: Vec<f64> = rows.iter().map(|r| r.time_in_zone_min).collect();
            let speeds: Vec<f64> = rows.iter().map(|r| r.avg_speed).collect();

            let mean_delay = mean(&delays)?;
            Some(RankingEntry {
                rank: 0,
                line: line.to_string(),
                mean_delay,
                stddev_delay: sample_stddev(&delays, mean_delay),
                observations: rows.len(),
                mean_time: mean(&times)?,
                total_time: times.iter().sum(),
                mean_speed: mean(&speeds)?,
            })
        })
        .collect();

    entries.sort_by(|a, b| b.mean_delay.total_cmp(&a.mean_delay));
    entries.truncate(top);

    for (i, entry) in entries.iter_mut().enumerate() {
        entry.rank = i + 1;
    }

    entries
}

/// The single worst line: the first ranking row.
pub fn worst_line(ranking: &[RankingEntry]) -> Option<&RankingEntry> {
    ranking.first()
}

/// How the user's "most delayed line" guess compares with the data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum GuessOutcome {
    Match {
        line: String,
        delay_pct: f64,
    },
    Mismatch {
        guess: String,
        actual: String,
        delay_pct: f64,
    },
}

/// Compares a guess with the worst ranked line. `None` when there is no guess
/// or no line qualifies for the ranking.
pub fn compare_guess(guess: &str, ranking: &[RankingEntry]) -> Option<GuessOutcome> {
    let guess = guess.trim();
    if guess.is_empty() {
        return None;
    }

    let worst = worst_line(ranking)?;
    let outcome = if guess == worst.line {
        GuessOutcome::Match {
            line: worst.line.clone(),
            delay_pct: worst.delay_pct(),
        }
    } else {
        GuessOutcome::Mismatch {
            guess: guess.to_string(),
            actual: worst.line.clone(),
            delay_pct: worst.delay_pct(),
        }
    };

    Some(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::aggregate::tests::record;
    use pretty_assertions::assert_eq;

    fn sample() -> Vec<TripSummaryRecord> {
        let mut rows = vec![record("917", 1, 10.0, 0.1, "1")];
        for day in 2..=6 {
            rows.push(record("917", day, 20.0, 0.9, "2"));
        }
        rows.push(record("918", 1, 5.0, 0.2, "1"));
        rows.push(record("918", 2, 5.0, 0.2, "1"));
        rows
    }

    #[test]
    fn test_ranking_excludes_sparse_lines() {
        let ranking = delay_ranking(&sample(), MIN_OBSERVATIONS, RANKING_SIZE);

        assert_eq!(ranking.len(), 1);
        assert_eq!(ranking[0].line, "917");
        assert_eq!(ranking[0].rank, 1);
        assert_eq!(ranking[0].observations, 6);
        assert!((ranking[0].mean_delay - 0.7667).abs() < 1e-3);
        assert!(ranking.iter().all(|e| e.observations >= MIN_OBSERVATIONS));
    }

    #[test]
    fn test_ranking_sorted_descending_and_truncated() {
        let mut rows = Vec::new();
        for (line, delay) in [("100", 0.3), ("200", 0.8), ("300", 0.5)] {
            for day in 1..=5 {
                rows.push(record(line, day, 10.0, delay, "1"));
            }
        }

        let ranking = delay_ranking(&rows, MIN_OBSERVATIONS, 2);
        let lines: Vec<&str> = ranking.iter().map(|e| e.line.as_str()).collect();

        assert_eq!(lines, vec!["200", "300"]);
        assert_eq!(ranking[1].rank, 2);
        assert_eq!(ranking[0].total_time, 50.0);
        assert!(ranking[0].stddev_delay.unwrap() < 1e-9);
    }

    #[test]
    fn test_ranking_ties_keep_line_order() {
        let mut rows = Vec::new();
        for line in ["900", "100", "500"] {
            for day in 1..=5 {
                rows.push(record(line, day, 10.0, 0.5, "1"));
            }
        }

        let ranking = delay_ranking(&rows, MIN_OBSERVATIONS, RANKING_SIZE);
        let lines: Vec<&str> = ranking.iter().map(|e| e.line.as_str()).collect();

        assert_eq!(lines, vec!["100", "500", "900"]);
    }

    #[test]
    fn test_guess_mismatch_names_both_lines() {
        let ranking = delay_ranking(&sample(), MIN_OBSERVATIONS, RANKING_SIZE);

        match compare_guess("918", &ranking) {
            Some(GuessOutcome::Mismatch {
                guess,
                actual,
                delay_pct,
            }) => {
                assert_eq!(guess, "918");
                assert_eq!(actual, "917");
                assert!((delay_pct - 76.67).abs() < 0.01);
            }
            other => panic!("expected mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_guess_match_ignores_whitespace() {
        let ranking = delay_ranking(&sample(), MIN_OBSERVATIONS, RANKING_SIZE);
        let outcome = compare_guess(" 917 ", &ranking);

        assert!(matches!(outcome, Some(GuessOutcome::Match { ref line, .. }) if line == "917"));
        assert_eq!(
            worst_line(&ranking).map(|e| e.line.as_str()),
            Some("917")
        );
    }

    #[test]
    fn test_no_outcome_without_guess_or_ranking() {
        let ranking = delay_ranking(&sample(), MIN_OBSERVATIONS, RANKING_SIZE);
        assert_eq!(compare_guess("  ", &ranking), None);
        assert_eq!(compare_guess("917", &[]), None);
    }
}
