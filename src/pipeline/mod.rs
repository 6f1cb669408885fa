//! Pipeline stages of a check run.
//!
//! - `filter`: Phase correction and date window filtering
//! - `snapshot`: Snapshot construction and canonical ordering
//! - `diff`: Snapshot comparison and the notify decision
//! - `render`: Markdown message for the push
//! - `check`: The whole cycle wired together

pub mod check;
pub mod diff;
pub mod filter;
pub mod render;
pub mod snapshot;

pub use check::{CheckContext, CheckOutcome, CheckReport, run_check};
pub use diff::{
    ChangeSummary, Decision, compare_snapshots, decide, detect_change, snapshots_equal,
    summarize_change,
};
pub use filter::{FilterOptions, apply_phase_shift, filter_airdrops};
pub use render::render_message;
pub use snapshot::{build_snapshot, sort_items};
