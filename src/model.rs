//! Row types returned by the warehouse queries and collected from the
//! questionnaire.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One (line, date) observation with its cluster assignment and PCA projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripSummaryRecord {
    pub line: String,
    pub date: NaiveDate,
    /// Total minutes spent inside the zone.
    pub time_in_zone_min: f64,
    /// Fraction of trips classified as delayed, 0.0–1.0.
    pub delay_proportion: f64,
    pub avg_speed: f64,
    pub cluster_id: String,
    pub pc1: f64,
    pub pc2: f64,
}

/// A single vehicle ping inside the zone on the map date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpsPoint {
    pub line: String,
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: DateTime<Utc>,
    pub cluster_id: String,
}

/// Answer to "do you ride a bus that passes through the zone?".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RidesZoneBuses {
    Yes,
    No,
}

impl RidesZoneBuses {
    pub fn label(self) -> &'static str {
        match self {
            RidesZoneBuses::Yes => "Yes",
            RidesZoneBuses::No => "No",
        }
    }
}

impl fmt::Display for RidesZoneBuses {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Questionnaire answers, captured once per submission.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserResponse {
    pub submitted_at: DateTime<Utc>,
    pub rides_zone_buses: RidesZoneBuses,
    pub most_used_line: String,
    pub delay_guess: String,
}

impl UserResponse {
    pub fn new(rides_zone_buses: RidesZoneBuses, most_used_line: &str, delay_guess: &str) -> Self {
        Self {
            submitted_at: Utc::now(),
            rides_zone_buses,
            most_used_line: most_used_line.trim().to_string(),
            delay_guess: delay_guess.trim().to_string(),
        }
    }

    /// The guess for the most delayed line, if the user typed one.
    pub fn guess(&self) -> Option<&str> {
        let guess = self.delay_guess.trim();
        (!guess.is_empty()).then_some(guess)
    }
}
