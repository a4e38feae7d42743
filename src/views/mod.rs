//! Server-side HTML for the questionnaire and the dashboard.
//!
//! Charts are emitted as plotly.js figure JSON and drawn in the browser.

mod chrome;
pub mod dashboard;
pub mod figures;
pub mod html;
mod questionnaire;
mod style;

pub use chrome::render_error;
pub use dashboard::{RenderContext, render_dashboard};
pub use questionnaire::render_questionnaire;
