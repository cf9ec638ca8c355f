//! Shutdown report.
//!
//! # Responsibilities
//! - Count requests by method and by path
//! - Render a numbered transcript of every capture
//! - Write the report next to the snapshot
//!
//! # Design Decisions
//! - Computed once, from the full sequence, at drain time
//! - Pure rendering (`render`) is separate from the file write (`generate`)
//! - Output depends only on the input sequence

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::capture::record::CapturedRequest;
use crate::capture::render::{
    indent_continuation, title_case, truncate_chars, BodyView, HEADER_PREVIEW_CHARS,
    REPORT_HEADERS,
};

/// Body text kept per transcript entry.
pub const BODY_PREVIEW_CHARS: usize = 200;

const SNAPSHOT_SUFFIX: &str = ".json";
const REPORT_SUFFIX: &str = "_report.txt";

/// Error type for report writes.
#[derive(Debug, Error)]
#[error("failed to write report {path}: {source}")]
pub struct ReportError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Where the report for a given snapshot goes.
///
/// `out.json` becomes `out_report.txt`. A path without the `.json` suffix
/// gets `_report.txt` appended to its full name.
pub fn report_path(snapshot: &Path) -> PathBuf {
    let raw = snapshot.as_os_str().to_string_lossy();
    match raw.strip_suffix(SNAPSHOT_SUFFIX) {
        Some(stem) => PathBuf::from(format!("{stem}{REPORT_SUFFIX}")),
        None => PathBuf::from(format!("{raw}{REPORT_SUFFIX}")),
    }
}

/// Aggregate counts over a capture sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportStats<'a> {
    pub total: usize,
    /// Ascending by method name.
    pub by_method: Vec<(&'static str, usize)>,
    /// Descending by count, ties in first-seen order.
    pub by_path: Vec<(&'a str, usize)>,
}

impl<'a> ReportStats<'a> {
    pub fn collect(entries: &'a [CapturedRequest]) -> Self {
        let mut methods: BTreeMap<&'static str, usize> = BTreeMap::new();
        let mut paths: Vec<(&'a str, usize)> = Vec::new();
        let mut path_index: HashMap<&'a str, usize> = HashMap::new();

        for entry in entries {
            *methods.entry(entry.method.as_str()).or_default() += 1;

            match path_index.get(entry.path.as_str()) {
                Some(&i) => paths[i].1 += 1,
                None => {
                    path_index.insert(entry.path.as_str(), paths.len());
                    paths.push((entry.path.as_str(), 1));
                }
            }
        }

        // stable
        paths.sort_by(|a, b| b.1.cmp(&a.1));

        Self {
            total: entries.len(),
            by_method: methods.into_iter().collect(),
            by_path: paths,
        }
    }
}

/// Builds the human-readable report from a finished session.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReportGenerator;

impl ReportGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Render the report text.
    pub fn render(&self, entries: &[CapturedRequest]) -> String {
        let stats = ReportStats::collect(entries);
        let mut out = String::new();

        out.push_str("Network Capture Report\n");
        out.push_str(&"=".repeat(50));
        out.push_str("\n\n");

        out.push_str(&format!("Total requests: {}\n\n", stats.total));

        out.push_str("Requests by method:\n");
        for (method, count) in &stats.by_method {
            out.push_str(&format!("  {method}: {count}\n"));
        }
        out.push('\n');

        out.push_str("Requests by path:\n");
        for (path, count) in &stats.by_path {
            out.push_str(&format!("  {path}: {count}\n"));
        }
        out.push('\n');

        out.push_str("Request transcript:\n");
        out.push_str(&"-".repeat(50));
        out.push('\n');

        for (i, entry) in entries.iter().enumerate() {
            render_entry(&mut out, i + 1, entry);
        }

        out
    }

    /// Write the report for `entries` beside `snapshot`.
    ///
    /// Returns `Ok(None)` without touching the filesystem when nothing was captured.
    pub fn generate(
        &self,
        entries: &[CapturedRequest],
        snapshot: &Path,
    ) -> Result<Option<PathBuf>, ReportError> {
        if entries.is_empty() {
            return Ok(None);
        }

        let path = report_path(snapshot);
        fs::write(&path, self.render(entries)).map_err(|source| ReportError {
            path: path.clone(),
            source,
        })?;

        tracing::info!(report = %path.display(), entries = entries.len(), "Report written");
        Ok(Some(path))
    }
}

fn render_entry(out: &mut String, number: usize, entry: &CapturedRequest) {
    out.push_str(&format!(
        "{number}. [{}] {} {}\n",
        entry.timestamp, entry.method, entry.path
    ));

    if !entry.query.is_empty() {
        out.push_str(&format!("   Query: {}\n", entry.query));
    }

    for name in REPORT_HEADERS {
        if let Some(value) = entry.headers.get(name) {
            out.push_str(&format!(
                "   {}: {}\n",
                title_case(name),
                truncate_chars(value, HEADER_PREVIEW_CHARS)
            ));
        }
    }

    let body = match BodyView::of(&entry.body) {
        BodyView::Empty => None,
        BodyView::Structured(pretty) if entry.body.chars().count() <= BODY_PREVIEW_CHARS => {
            Some(pretty)
        }
        _ => Some(truncate_chars(&entry.body, BODY_PREVIEW_CHARS)),
    };
    if let Some(body) = body {
        out.push_str(&format!("   Body: {}\n", indent_continuation(&body, "   ")));
    }

    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::record::Method;

    fn entry(method: Method, path: &str, body: &str) -> CapturedRequest {
        CapturedRequest {
            timestamp: "2024-05-01T10:00:00.000000".to_string(),
            method,
            url: path.to_string(),
            path: path.to_string(),
            query: String::new(),
            headers: Default::default(),
            body: body.to_string(),
            client_ip: "127.0.0.1".to_string(),
        }
    }

    #[test]
    fn report_path_replaces_json_suffix() {
        assert_eq!(report_path(Path::new("out.json")), PathBuf::from("out_report.txt"));
        assert_eq!(
            report_path(Path::new("logs/run.1.json")),
            PathBuf::from("logs/run.1_report.txt")
        );
    }

    #[test]
    fn report_path_without_suffix_does_not_panic() {
        let _ = report_path(Path::new("capture"));
        let _ = report_path(Path::new(""));
    }

    #[test]
    fn method_counts_are_sorted_by_name() {
        let entries = vec![
            entry(Method::Put, "/a", ""),
            entry(Method::Get, "/a", ""),
            entry(Method::Post, "/a", ""),
            entry(Method::Get, "/a", ""),
        ];
        let stats = ReportStats::collect(&entries);
        assert_eq!(stats.by_method, vec![("GET", 2), ("POST", 1), ("PUT", 1)]);
    }

    #[test]
    fn path_counts_sorted_by_count_then_first_seen() {
        let entries = vec![
            entry(Method::Get, "/late", ""),
            entry(Method::Get, "/b", ""),
            entry(Method::Get, "/c", ""),
            entry(Method::Get, "/c", ""),
            entry(Method::Get, "/b", ""),
            entry(Method::Get, "/hot", ""),
            entry(Method::Get, "/hot", ""),
            entry(Method::Get, "/hot", ""),
        ];
        let stats = ReportStats::collect(&entries);
        assert_eq!(stats.total, 8);
        assert_eq!(
            stats.by_path,
            vec![("/hot", 3), ("/b", 2), ("/c", 2), ("/late", 1)]
        );
    }

    #[test]
    fn render_is_deterministic() {
        let entries = vec![
            entry(Method::Post, "/foo", "{\"a\":1}"),
            entry(Method::Get, "/bar", ""),
        ];
        let generator = ReportGenerator::new();
        assert_eq!(generator.render(&entries), generator.render(&entries));
    }

    #[test]
    fn transcript_truncates_long_body() {
        let body: String = ('a'..='z').cycle().take(501).collect();
        let entries = vec![entry(Method::Post, "/upload", &body)];

        let report = ReportGenerator::new().render(&entries);
        let expected = format!("   Body: {}...\n", &body[..200]);
        assert!(report.contains(&expected));
        assert!(!report.contains(&body[..201]));
    }

    #[test]
    fn short_json_body_is_shown_whole_even_when_pretty_form_is_longer() {
        let fields: Vec<String> = (0..22).map(|i| format!("\"k{i}\":{i}")).collect();
        let body = format!("{{{}}}", fields.join(","));
        assert!(body.len() < BODY_PREVIEW_CHARS);

        let report = ReportGenerator::new().render(&[entry(Method::Post, "/form", &body)]);
        assert!(!report.contains("..."));
        assert!(report.contains("     \"k0\": 0,\n"));
        assert!(report.contains("     \"k21\": 21\n   }\n"));
    }

    #[test]
    fn long_json_body_is_truncated_raw() {
        let fields: Vec<String> = (0..40).map(|i| format!("\"key{i}\":{i}")).collect();
        let body = format!("{{{}}}", fields.join(","));
        assert!(body.len() > BODY_PREVIEW_CHARS);

        let report = ReportGenerator::new().render(&[entry(Method::Post, "/form", &body)]);
        assert!(report.contains(&format!("   Body: {}...\n", &body[..BODY_PREVIEW_CHARS])));
    }

    #[test]
    fn transcript_lists_query_auth_headers_and_structured_body() {
        let mut req = entry(Method::Post, "/foo", "{\"a\":1}");
        req.query = "x=1".to_string();
        req.headers = [("Cookie", "sid=1"), ("Content-Type", "application/json")]
            .into_iter()
            .collect();

        let report = ReportGenerator::new().render(&[req]);
        assert!(report.starts_with("Network Capture Report\n"));
        assert!(report.contains("Total requests: 1\n"));
        assert!(report.contains("  POST: 1\n"));
        assert!(report.contains("  /foo: 1\n"));
        assert!(report.contains("1. [2024-05-01T10:00:00.000000] POST /foo\n"));
        assert!(report.contains("   Query: x=1\n"));
        assert!(report.contains("   Cookie: sid=1\n"));
        assert!(!report.contains("Content-Type"));
        assert!(report.contains("   Body: {\n     \"a\": 1\n   }\n"));
    }

    #[test]
    fn generate_skips_empty_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = dir.path().join("out.json");

        let written = ReportGenerator::new().generate(&[], &snapshot).unwrap();
        assert!(written.is_none());
        assert!(!dir.path().join("out_report.txt").exists());
    }

    #[test]
    fn generate_writes_identical_content_twice() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = dir.path().join("out.json");
        let entries = vec![entry(Method::Get, "/x", "")];
        let generator = ReportGenerator::new();

        let path = generator.generate(&entries, &snapshot).unwrap().unwrap();
        let first = std::fs::read(&path).unwrap();
        generator.generate(&entries, &snapshot).unwrap();
        let second = std::fs::read(&path).unwrap();

        assert_eq!(path, dir.path().join("out_report.txt"));
        assert_eq!(first, second);
    }
}
