use std::path::Path;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::monitor::MonitorError;

/// One instrumented call, as appended to the session's metrics log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    /// When the record was written.
    pub timestamp: DateTime<Local>,
    pub start_time: DateTime<Local>,
    pub end_time: DateTime<Local>,
    /// Seconds spent in the wrapped call.
    pub inference_time: f64,
    /// Resident memory in MB after the call.
    pub memory_usage: f64,
    pub input_chars: usize,
    pub output_chars: usize,
    pub total_chars: usize,
    pub input: String,
    pub output: String,
    pub session_id: String,
}

/// Aggregate view of a session, derived from the monitor's running totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub total_queries: u64,
    pub avg_inference_time: f64,
    pub total_chars: u64,
    pub avg_chars_per_query: f64,
    pub errors: u64,
    /// Seconds between session start and `end_time`.
    pub session_duration: f64,
    pub current_memory_usage_mb: f64,
    pub start_time: DateTime<Local>,
    pub end_time: DateTime<Local>,
}

/// Load a summary written by [`crate::Monitor::save_summary`].
pub fn read_summary(path: &Path) -> Result<SessionSummary, MonitorError> {
    let data = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

/// Load every record of a metrics log, in append order. Corrupt lines are
/// skipped with a warning; a missing file is an empty log.
pub fn read_metrics(path: &Path) -> Result<Vec<MetricRecord>, MonitorError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let data = std::fs::read_to_string(path)?;
    let mut records = Vec::new();
    for (i, line) in data.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<MetricRecord>(line) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::warn!(
                    file = %path.display(),
                    line = i + 1,
                    error = %e,
                    "skipping corrupt metrics line"
                );
            }
        }
    }
    Ok(records)
}
