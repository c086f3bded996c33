//! Run results and statistics.

use serde::Serialize;

/// Lifecycle state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// Still consuming input. Kept for wire compatibility; a returned
    /// result is always `Completed` or `Failed`.
    Processing,
    /// The input was consumed to the end, or the run was cancelled.
    Completed,
    /// The underlying stream faulted; statistics are partial.
    Failed,
}

/// Counters accumulated over one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStats {
    /// Non-empty input lines seen.
    pub total_lines: u64,
    /// Schedules that passed classification.
    pub schedules_processed: u64,
    /// Schedules rejected by classification.
    pub schedules_filtered: u64,
    /// Schedules suppressed by the dedup set.
    pub duplicates_skipped: u64,
    /// Events accepted by the publisher.
    pub events_published: u64,
    /// Lines that failed to decode.
    pub parse_errors: u64,
    /// Wall-clock duration of the whole call, recorded regardless of
    /// outcome.
    pub processing_time_ms: u64,
}

/// Everything the caller gets back from one run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResult {
    /// Unique id of this invocation. Distinct from the caller's run id,
    /// which only appears in event metadata.
    pub process_id: String,
    pub status: RunStatus,
    pub statistics: RunStats,
    /// Non-fatal errors collected during the run (publish failures, and the
    /// stream fault on a failed run).
    pub errors: Vec<String>,
}
