//! Capture subsystem.
//!
//! # Data Flow
//! ```text
//! ParsedRequest (http layer)
//!     → record.rs (CapturedRequest)
//!     → store.rs (append, console echo)
//!     → persist.rs (full snapshot rewrite)
//!
//! At drain:
//!     store.rs entries → report.rs (stats + transcript)
//! ```
//!
//! # Design Decisions
//! - The store is the single writer for both the log and the snapshot
//! - Entries are never mutated or removed once appended
//! - render.rs keeps console and report truncation rules in one place

pub mod persist;
pub mod record;
pub mod render;
pub mod report;
pub mod store;

pub use persist::{JsonSnapshot, PersistError, Persister};
pub use record::{CapturedRequest, HeaderFields, Method};
pub use report::{report_path, ReportError, ReportGenerator};
pub use store::CaptureStore;
