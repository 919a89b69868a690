//! Per-session instrumentation of chat inference calls.
//!
//! Every call is timed, its characters counted and the process memory
//! sampled; one JSON line per call goes to `metrics_{session}.jsonl` and an
//! aggregate summary can be written to `summary_{session}.json` at any time.

pub mod guard;
pub mod handler;
pub mod memory;
pub mod monitor;
pub mod record;

pub use guard::SummaryGuard;
pub use handler::{Monitored, PromptHandler};
pub use monitor::{Monitor, MonitorError};
pub use record::{read_metrics, read_summary, MetricRecord, SessionSummary};
