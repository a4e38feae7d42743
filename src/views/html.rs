//! Small HTML building blocks shared by the pages.

use serde::Serialize;
use std::fmt::Write;

use super::style::{PAGE_SCRIPT, STYLESHEET};

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

/// Escapes text for use in element content and quoted attributes.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// A figure container plus its JSON, picked up by the page script.
pub fn figure_block(id: &str, figure: &impl Serialize) -> String {
    // `</` would end the script element early.
    let json = serde_json::to_string(figure)
        .unwrap_or_else(|_| "{\"data\":[],\"layout\":{}}".to_string())
        .replace("</", "<\\/");
    format!(
        "<div id=\"{id}\" class=\"figure\"></div>\n\
         <script type=\"application/json\" data-figure=\"{id}\">{json}</script>\n"
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoxKind {
    Success,
    Warning,
    Info,
    Danger,
}

impl BoxKind {
    fn class(self) -> &'static str {
        match self {
            BoxKind::Success => "success",
            BoxKind::Warning => "warning",
            BoxKind::Info => "info",
            BoxKind::Danger => "danger",
        }
    }
}

/// A colored message box. `inner_html` is inserted as-is.
pub fn message_box(kind: BoxKind, inner_html: &str) -> String {
    format!("<div class=\"box {}\">{}</div>\n", kind.class(), inner_html)
}

pub fn centered_box(kind: BoxKind, inner_html: &str) -> String {
    format!("<div class=\"box {} centered\">{}</div>\n", kind.class(), inner_html)
}

/// A table with escaped header and cell text.
pub fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut out = String::from("<table class=\"data\">\n<thead><tr>");
    for header in headers {
        let _ = write!(out, "<th>{}</th>", escape(header));
    }
    out.push_str("</tr></thead>\n<tbody>\n");
    for row in rows {
        out.push_str("<tr>");
        for cell in row {
            let _ = write!(out, "<td>{}</td>", escape(cell));
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</tbody>\n</table>\n");
    out
}

/// Integer with comma thousands separators.
pub fn thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Wraps `body` in the full HTML document.
pub fn page(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{title}</title>
<script src="{PLOTLY_CDN}"></script>
<style>{STYLESHEET}</style>
</head>
<body>
{body}
<script>{PAGE_SCRIPT}</script>
</body>
</html>
"#,
        title = escape(title),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(
            escape("<b>\"917\" & 'x'</b>"),
            "&lt;b&gt;&quot;917&quot; &amp; &#39;x&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn test_thousands() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(1000), "1,000");
        assert_eq!(thousands(1234567), "1,234,567");
        assert_eq!(thousands(-45210), "-45,210");
    }

    #[test]
    fn test_figure_block_cannot_close_script() {
        let fig = serde_json::json!({"data": [{"text": ["</script><b>"]}], "layout": {}});
        let block = figure_block("fig-x", &fig);
        assert_eq!(block.matches("</script>").count(), 1);
        assert!(block.contains("data-figure=\"fig-x\""));
    }

    #[test]
    fn test_table_escapes_cells() {
        let html = table(&["Line"], &[vec!["<917>".to_string()]]);
        assert!(html.contains("<td>&lt;917&gt;</td>"));
    }
}
