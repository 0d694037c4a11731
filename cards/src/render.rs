//! Minimal SVG card rendering.
//!
//! Deliberately small: a titled frame with one text line per statistic.
//! The themed layout engine of the original project is out of scope.

const WIDTH: u32 = 400;
const LINE_HEIGHT: u32 = 22;
const TITLE_BASELINE: u32 = 32;
const BODY_START: u32 = 62;
const PADDING_BOTTOM: u32 = 18;

/// A titled card with plain text lines.
pub struct Card {
    title: String,
    lines: Vec<String>,
}

impl Card {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            lines: Vec::new(),
        }
    }

    pub fn line(mut self, line: impl Into<String>) -> Self {
        self.lines.push(line.into());
        self
    }

    /// Render the card as a standalone SVG document.
    pub fn render(&self) -> String {
        let height = BODY_START + self.lines.len() as u32 * LINE_HEIGHT + PADDING_BOTTOM;

        let mut svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{height}" viewBox="0 0 {WIDTH} {height}">"#
        );
        svg.push('\n');
        svg.push_str(&format!(
            r#"  <rect x="0.5" y="0.5" width="{}" height="{}" rx="4.5" fill="#fffefe" stroke="#e4e2e2"/>"#,
            WIDTH - 1,
            height - 1
        ));
        svg.push('\n');
        svg.push_str(&format!(
            r#"  <text x="25" y="{TITLE_BASELINE}" font-family="monospace" font-size="18" font-weight="600" fill="#2f80ed">{}</text>"#,
            escape_xml(&self.title)
        ));
        svg.push('\n');
        for (index, line) in self.lines.iter().enumerate() {
            let y = BODY_START + index as u32 * LINE_HEIGHT;
            svg.push_str(&format!(
                r#"  <text x="25" y="{y}" font-family="monospace" font-size="14" fill="#434d58">{}</text>"#,
                escape_xml(line)
            ));
            svg.push('\n');
        }
        svg.push_str("</svg>");
        svg
    }
}

/// Escape text interpolated into SVG markup.
pub fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
