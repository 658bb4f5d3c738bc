#![forbid(unsafe_code)]

//! Render-ready projections of a [`Session`].
//!
//! The web layer paints these directly; tests compare them as plain values.

use serde::Serialize;

use crate::event_log::LogRecord;
use crate::held::HeldKey;
use crate::pattern::RepeatCount;
use crate::session::Session;

/// Pattern region text while no repeat has been seen.
pub const PATTERN_PLACEHOLDER: &str = "Waiting for repeated events...";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeldKeyView {
    pub key: String,
    pub code: String,
    pub pressed_at: f64,
}

impl From<&HeldKey> for HeldKeyView {
    fn from(value: &HeldKey) -> Self {
        Self {
            key: value.key.clone(),
            code: value.code.clone(),
            pressed_at: value.pressed_at,
        }
    }
}

/// One event-log table row, every cell already formatted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogRowView {
    pub elapsed: String,
    pub delta: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub key: String,
    pub code: String,
    pub repeat: String,
}

impl From<&LogRecord> for LogRowView {
    fn from(value: &LogRecord) -> Self {
        Self {
            elapsed: value.elapsed_text(),
            delta: value.delta_text(),
            kind: value.phase.as_str().to_string(),
            key: value.key.clone(),
            code: value.code.clone(),
            repeat: if value.repeat { "yes" } else { "no" }.to_string(),
        }
    }
}

impl LogRowView {
    /// Inner HTML for a `<tr>`: six escaped `<td>` cells.
    #[must_use]
    pub fn to_html(&self) -> String {
        let mut html = String::with_capacity(96);
        for cell in [
            &self.elapsed,
            &self.delta,
            &self.kind,
            &self.key,
            &self.code,
            &self.repeat,
        ] {
            html.push_str("<td>");
            html.push_str(&escape_html(cell));
            html.push_str("</td>");
        }
        html
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepeatCountView {
    pub key: String,
    pub code: String,
    pub count: u32,
}

impl From<&RepeatCount> for RepeatCountView {
    fn from(value: &RepeatCount) -> Self {
        Self {
            key: value.key.clone(),
            code: value.code.clone(),
            count: value.count,
        }
    }
}

impl RepeatCountView {
    /// Secondary pill text, e.g. `"KeyA ×3"`.
    #[must_use]
    pub fn meta_text(&self) -> String {
        format!("{} ×{}", self.code, self.count)
    }
}

/// Everything the presentation layer shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub paused: bool,
    /// Oldest press first.
    pub held: Vec<HeldKeyView>,
    /// Newest first.
    pub log: Vec<LogRowView>,
    /// Pattern ring labels, oldest first.
    pub pattern: Vec<String>,
    /// Highest count first.
    pub repeat_counts: Vec<RepeatCountView>,
}

impl SessionSnapshot {
    pub(crate) fn capture(session: &Session) -> Self {
        Self {
            paused: session.is_paused(),
            held: session
                .held()
                .sorted()
                .into_iter()
                .map(HeldKeyView::from)
                .collect(),
            log: session.log().iter().map(LogRowView::from).collect(),
            pattern: session
                .patterns()
                .entries()
                .map(|entry| entry.label.clone())
                .collect(),
            repeat_counts: session
                .patterns()
                .ranked()
                .into_iter()
                .map(RepeatCountView::from)
                .collect(),
        }
    }

    /// Pattern line as displayed, including the empty-state placeholder.
    #[must_use]
    pub fn pattern_text(&self) -> String {
        if self.pattern.is_empty() {
            PATTERN_PLACEHOLDER.to_string()
        } else {
            self.pattern.join(crate::pattern::SEQUENCE_SEPARATOR)
        }
    }

    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Escape text for insertion into HTML markup.
#[must_use]
pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::KeyEvent;
    use pretty_assertions::assert_eq;

    #[test]
    fn escape_covers_markup_characters() {
        assert_eq!(
            escape_html("<a href=\"x\">'&'</a>"),
            "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;"
        );
        assert_eq!(escape_html("KeyA"), "KeyA");
    }

    #[test]
    fn log_row_html_escapes_key() {
        let mut session = Session::default();
        session.dispatch(&KeyEvent::down("<", "Comma", false, 1000.0));
        let snapshot = session.snapshot();
        assert_eq!(
            snapshot.log[0].to_html(),
            "<td>1.000</td><td>—</td><td>keydown</td><td>&lt;</td><td>Comma</td><td>no</td>"
        );
    }

    #[test]
    fn empty_snapshot_shows_placeholder() {
        let snapshot = Session::default().snapshot();
        assert!(snapshot.held.is_empty());
        assert!(snapshot.log.is_empty());
        assert_eq!(snapshot.pattern_text(), PATTERN_PLACEHOLDER);
    }

    #[test]
    fn snapshot_projects_every_region() {
        let mut session = Session::default();
        session.dispatch(&KeyEvent::down("Shift", "ShiftLeft", false, 0.0));
        session.dispatch(&KeyEvent::down("A", "KeyA", false, 20.0));
        session.dispatch(&KeyEvent::down("A", "KeyA", true, 520.0));
        session.dispatch(&KeyEvent::down("A", "KeyA", true, 553.0));

        let snapshot = session.snapshot();
        let held: Vec<&str> = snapshot.held.iter().map(|h| h.code.as_str()).collect();
        assert_eq!(held, vec!["ShiftLeft", "KeyA"]);
        assert_eq!(snapshot.log.len(), 4);
        assert_eq!(snapshot.log[0].delta, "33 ms");
        assert_eq!(snapshot.log[0].repeat, "yes");
        assert_eq!(snapshot.pattern_text(), "A → A");
        assert_eq!(
            snapshot.repeat_counts,
            vec![RepeatCountView {
                key: "A".to_string(),
                code: "KeyA".to_string(),
                count: 2,
            }]
        );
        assert_eq!(snapshot.repeat_counts[0].meta_text(), "KeyA ×2");
    }

    #[test]
    fn snapshot_json_uses_type_column_name() {
        let mut session = Session::default();
        session.dispatch(&KeyEvent::up("a", "KeyA", 0.0));
        let json = session.snapshot().to_json_string().expect("serialize");
        assert!(json.contains(r#""type":"keyup""#), "{json}");
        assert!(json.contains(r#""paused":false"#), "{json}");
    }
}
