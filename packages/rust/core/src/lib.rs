//! Pipeline orchestration for Prospector: one harvest pass, one scoring pass,
//! one record per target, plus report assembly.

pub mod pipeline;
pub mod report;

pub use pipeline::{AnalysisRun, ProgressReporter, SilentProgress, run_analysis};
pub use report::{Report, ReportMetadata, ReportSummary, build_report};
