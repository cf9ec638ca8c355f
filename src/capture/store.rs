//! The in-memory capture log.

use crate::capture::persist::Persister;
use crate::capture::record::CapturedRequest;
use crate::capture::render::{
    indent_continuation, title_case, truncate_chars, BodyView, ECHO_HEADERS, HEADER_PREVIEW_CHARS,
};

/// Ordered, append-only log of captured requests.
///
/// Owned by the service for the whole capture session and handed to the
/// connection handler by `&mut`, which makes it the only writer.
pub struct CaptureStore {
    entries: Vec<CapturedRequest>,
    persister: Box<dyn Persister>,
    echo: bool,
}

impl CaptureStore {
    pub fn new(persister: Box<dyn Persister>) -> Self {
        Self {
            entries: Vec::new(),
            persister,
            echo: true,
        }
    }

    /// Toggle the stdout summary printed for each capture.
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    /// Append a request, echo it, then rewrite the snapshot.
    ///
    /// A failed snapshot write is logged; the in-memory log stays authoritative.
    pub fn record(&mut self, request: CapturedRequest) -> &CapturedRequest {
        tracing::debug!(
            method = %request.method,
            path = %request.path,
            client_ip = %request.client_ip,
            index = self.entries.len(),
            "Request captured"
        );

        if self.echo {
            println!("{}", echo_summary(&request));
        }

        self.entries.push(request);
        self.flush();

        &self.entries[self.entries.len() - 1]
    }

    /// Write the current sequence to the persister, logging any failure.
    pub fn flush(&self) -> bool {
        match self.persister.flush(&self.entries) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    snapshot = %self.persister.location().display(),
                    "Failed to save snapshot"
                );
                false
            }
        }
    }

    pub fn entries(&self) -> &[CapturedRequest] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Console block for one capture.
pub fn echo_summary(request: &CapturedRequest) -> String {
    let mut lines = vec![format!(
        "\n[{}] {} {}",
        request.timestamp, request.method, request.path
    )];

    if !request.query.is_empty() {
        lines.push(format!("  Query: {}", request.query));
    }

    for name in ECHO_HEADERS {
        if let Some(value) = request.headers.get(name) {
            lines.push(format!(
                "  {}: {}",
                title_case(name),
                truncate_chars(value, HEADER_PREVIEW_CHARS)
            ));
        }
    }

    match BodyView::of(&request.body) {
        BodyView::Empty => {}
        BodyView::Structured(pretty) => {
            lines.push(format!("  Body: {}", indent_continuation(&pretty, "  ")))
        }
        BodyView::Raw(raw) => lines.push(format!("  Body: {raw}")),
        BodyView::Oversized(len) => lines.push(format!("  Body: [length: {len} characters]")),
    }

    lines.push("-".repeat(80));
    lines.join("\n")
}
