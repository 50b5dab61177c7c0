//! Calling-side session state: the capped scan log, its derived daily
//! total, and the active view it restores into.

pub mod quantity;
pub mod scan_log;
pub mod session;

pub use quantity::{MacroSplit, Quantity};
pub use scan_log::{compute_daily_total, ScanLog, ScanLogEntry, SCAN_LOG_CAPACITY};
pub use session::{ActiveUpload, AnalyzeOutcome, Session};
