use std::fmt::Display;
use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

use chrono::{DateTime, Local};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::memory::resident_memory_mb;
use crate::record::{MetricRecord, SessionSummary};

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Running totals, updated once per instrumented call.
#[derive(Debug, Default)]
struct Totals {
    total_queries: u64,
    total_inference_time: f64,
    total_chars: u64,
    errors: u64,
    current_memory_usage_mb: f64,
}

/// Session-scoped instrumentation. One per process, shared by reference.
///
/// The totals and the metrics file sit behind one lock, so records land
/// in the log in the order their calls completed.
pub struct Monitor {
    session_id: String,
    start_time: DateTime<Local>,
    log_dir: PathBuf,
    totals: Mutex<Totals>,
}

impl Monitor {
    /// Start a session whose artifacts live in `log_dir`.
    ///
    /// The session id is the start second (`%Y%m%d_%H%M%S`). Sessions that
    /// start in the same second in the same directory get `_1`, `_2`, ...
    /// appended; the id is claimed by creating its metrics file.
    pub fn new(log_dir: impl Into<PathBuf>) -> Result<Self, MonitorError> {
        let log_dir = log_dir.into();
        std::fs::create_dir_all(&log_dir)?;
        let start_time = Local::now();
        let session_id = claim_session_id(&log_dir, &start_time.format("%Y%m%d_%H%M%S").to_string())?;
        info!(session = %session_id, dir = %log_dir.display(), "monitor session started");
        Ok(Self {
            session_id,
            start_time,
            log_dir,
            totals: Mutex::new(Totals::default()),
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn start_time(&self) -> DateTime<Local> {
        self.start_time
    }

    pub fn metrics_path(&self) -> PathBuf {
        self.log_dir.join(format!("metrics_{}.jsonl", self.session_id))
    }

    pub fn summary_path(&self) -> PathBuf {
        self.log_dir.join(format!("summary_{}.json", self.session_id))
    }

    fn lock(&self) -> MutexGuard<'_, Totals> {
        self.totals.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Time `op`, then account for it.
    ///
    /// `input` is the text being answered; its length is the input
    /// character count. A failed call bumps the error counter and its error
    /// is handed back untouched; it is not counted as a query.
    pub async fn instrument<Fut, E>(&self, input: &str, op: Fut) -> Result<String, E>
    where
        Fut: Future<Output = Result<String, E>>,
        E: Display,
    {
        let start_time = Local::now();
        let start_memory = resident_memory_mb();
        let started = Instant::now();

        let output = match op.await {
            Ok(output) => output,
            Err(e) => {
                self.lock().errors += 1;
                warn!(error = %e, "instrumented call failed");
                return Err(e);
            }
        };

        // Monotonic clock: elapsed can never be negative.
        let inference_time = started.elapsed().as_secs_f64();
        let end_time = Local::now();
        let memory_usage = resident_memory_mb();
        debug!(start_memory, end_memory = memory_usage, "memory around call");

        let input_chars = input.chars().count();
        let output_chars = output.chars().count();

        let mut totals = self.lock();
        totals.total_queries += 1;
        totals.total_inference_time += inference_time;
        totals.total_chars += (input_chars + output_chars) as u64;
        totals.current_memory_usage_mb = memory_usage;

        let record = MetricRecord {
            timestamp: Local::now(),
            start_time,
            end_time,
            inference_time,
            memory_usage,
            input_chars,
            output_chars,
            total_chars: input_chars + output_chars,
            input: input.to_string(),
            output: output.clone(),
            session_id: self.session_id.clone(),
        };
        // Still holding the lock: appends stay in completion order.
        if let Err(e) = self.append(&record) {
            warn!(error = %e, path = %self.metrics_path().display(), "failed to append metric record");
        }
        drop(totals);

        Ok(output)
    }

    fn append(&self, record: &MetricRecord) -> Result<(), MonitorError> {
        let path = self.metrics_path();
        let mut file = std::fs::OpenOptions::new()
            .append(true)
            .create(true)
            .open(&path)?;
        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        file.write_all(line.as_bytes())?;
        Ok(())
    }

    /// Current aggregates. Averages are 0 until a query has succeeded.
    pub fn get_summary(&self) -> SessionSummary {
        let totals = self.lock();
        let end_time = Local::now();
        let per_query = |total: f64| {
            if totals.total_queries > 0 {
                total / totals.total_queries as f64
            } else {
                0.0
            }
        };

        SessionSummary {
            session_id: self.session_id.clone(),
            total_queries: totals.total_queries,
            avg_inference_time: per_query(totals.total_inference_time),
            total_chars: totals.total_chars,
            avg_chars_per_query: per_query(totals.total_chars as f64),
            errors: totals.errors,
            session_duration: (end_time - self.start_time).num_milliseconds().max(0) as f64 / 1000.0,
            current_memory_usage_mb: totals.current_memory_usage_mb,
            start_time: self.start_time,
            end_time,
        }
    }

    /// Write the current summary, replacing any earlier one for this session.
    /// Returns exactly what was written.
    pub fn save_summary(&self) -> Result<SessionSummary, MonitorError> {
        let summary = self.get_summary();
        let path = self.summary_path();
        write_replacing(&path, &serde_json::to_string_pretty(&summary)?)?;
        info!(path = %path.display(), queries = summary.total_queries, "session summary saved");
        Ok(summary)
    }
}

/// First of `base`, `base_1`, `base_2`, ... with no metrics file or summary
/// in `log_dir`. Creating the metrics file with `create_new` makes the claim
/// atomic across processes.
fn claim_session_id(log_dir: &Path, base: &str) -> std::io::Result<String> {
    for n in 0u32.. {
        let id = if n == 0 {
            base.to_string()
        } else {
            format!("{base}_{n}")
        };
        if log_dir.join(format!("summary_{id}.json")).exists() {
            continue;
        }
        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(log_dir.join(format!("metrics_{id}.jsonl")))
        {
            Ok(_) => return Ok(id),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e),
        }
    }
    Err(std::io::Error::new(
        std::io::ErrorKind::AlreadyExists,
        "no free session id",
    ))
}

/// Write through a sibling temp file so readers never see a half-written summary.
fn write_replacing(path: &Path, contents: &str) -> std::io::Result<()> {
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, contents)?;
    std::fs::rename(&tmp, path)
}
