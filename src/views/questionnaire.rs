//! The questionnaire shown before the dashboard.

use super::chrome::{TITLE, footer, hero};
use super::html::page;

const LINE_PLACEHOLDER: &str = "e.g. 917, 918, 355, 321";

pub fn render_questionnaire() -> String {
    let body = format!(
        r#"<main class="layout single">
{hero}
<section class="quiz">
<h2>📋 Quick survey</h2>
<p>Before looking at the data, tell us about your experience with the Fundão buses!</p>
<form method="post" action="/questionnaire">
<div class="question">1️⃣ Do you ride a municipal bus that passes through Fundão?</div>
<label><input type="radio" name="rides_zone_buses" value="yes" checked> Yes</label>
<label><input type="radio" name="rides_zone_buses" value="no"> No</label>
<div class="question">2️⃣ Which municipal bus did you ride the most inside Fundão?</div>
<input type="text" name="most_used_line" placeholder="{LINE_PLACEHOLDER}">
<div class="question">3️⃣ What is your guess for the most delayed bus?</div>
<input type="text" name="delay_guess" placeholder="{LINE_PLACEHOLDER}">
<div class="actions"><button type="submit">🚀 See the results</button></div>
</form>
</section>
{footer}</main>
"#,
        hero = hero(),
        footer = footer(),
    );
    page(TITLE, &body)
}
