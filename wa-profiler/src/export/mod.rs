//! Run report export
//!
//! A successful run can be summarised as JSON for scripts that drive many
//! engine/module combinations and want to line runs up with profiler output.

pub mod report;

pub use report::RunReport;
