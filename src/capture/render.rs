//! Text rendering shared by the console echo and the report.

/// Headers echoed to the console for every capture.
pub const ECHO_HEADERS: [&str; 5] = ["authorization", "token", "x-token", "cookie", "content-type"];

/// Headers listed per request in the report transcript.
pub const REPORT_HEADERS: [&str; 4] = ["authorization", "token", "x-token", "cookie"];

/// Header values longer than this are cut in both outputs.
pub const HEADER_PREVIEW_CHARS: usize = 100;

/// Bodies at or above this length are not pretty-printed.
pub const STRUCTURED_BODY_LIMIT: usize = 500;

/// Marker appended to truncated text.
pub const ELLIPSIS: &str = "...";

/// How a body is shown to a human.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyView {
    Empty,
    /// Short body that parsed as JSON, pretty-printed.
    Structured(String),
    /// Short body that is not JSON.
    Raw(String),
    /// Long body, only its length in characters.
    Oversized(usize),
}

impl BodyView {
    pub fn of(body: &str) -> Self {
        if body.is_empty() {
            return BodyView::Empty;
        }
        let chars = body.chars().count();
        if chars >= STRUCTURED_BODY_LIMIT {
            return BodyView::Oversized(chars);
        }
        match serde_json::from_str::<serde_json::Value>(body) {
            Ok(value) => match serde_json::to_string_pretty(&value) {
                Ok(pretty) => BodyView::Structured(pretty),
                Err(_) => BodyView::Raw(body.to_string()),
            },
            Err(_) => BodyView::Raw(body.to_string()),
        }
    }
}

/// Keep at most `max` characters, appending [`ELLIPSIS`] when cut.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}{}", &text[..idx], ELLIPSIS),
        None => text.to_string(),
    }
}

/// `x-token` → `X-Token`.
pub fn title_case(name: &str) -> String {
    name.split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join("-")
}

/// Indent every line after the first, so multi-line values line up under a label.
pub fn indent_continuation(text: &str, indent: &str) -> String {
    text.lines()
        .enumerate()
        .map(|(i, line)| {
            if i == 0 {
                line.to_string()
            } else {
                format!("{indent}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
