//! Header, footer and the error page shared by every screen.

use super::html::{BoxKind, escape, message_box, page};

pub const TITLE: &str = "Fundão Delay Dashboard";

pub fn hero() -> String {
    format!(
        "<header class=\"hero\">\n\
         <h1>🚌 {TITLE}</h1>\n\
         <p><strong>Bus lines crossing the Fundão campus</strong> | UFRJ</p>\n\
         <div class=\"chips\">\n\
         <span class=\"chip\">📊 K-Means + PCA analysis</span>\n\
         <span class=\"chip\">🗺️ Rio city hall GPS data (SMTR)</span>\n\
         <span class=\"chip\">📈 Interactive charts</span>\n\
         </div>\n\
         </header>\n"
    )
}

pub fn footer() -> &'static str {
    "<footer>\n\
     <p><strong>Fundão delay analysis</strong> · Universidade Federal do Rio de Janeiro</p>\n\
     <p>Data: BigQuery</p>\n\
     </footer>\n"
}

/// Full page shown when the dashboard cannot be built.
pub fn render_error(message: &str) -> String {
    let body = format!(
        "<main class=\"layout single\">\n{}\n{}{}</main>\n",
        hero(),
        message_box(
            BoxKind::Danger,
            &format!(
                "❌ <strong>The dashboard could not be loaded.</strong><br>{}<br><br>\
                 <a href=\"/\">Try again</a>",
                escape(message)
            ),
        ),
        footer(),
    );
    page(TITLE, &body)
}
