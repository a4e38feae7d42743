//! Descriptive statistics behind the dashboard views.
//!
//! Everything here is a pure function of the loaded trip summaries: per-line
//! grouping, the comparison table, the headline metrics, the box-plot order
//! and the delay ranking used by the podium tab and the guess banner.

pub mod aggregate;
pub mod ranking;
pub mod utility;
