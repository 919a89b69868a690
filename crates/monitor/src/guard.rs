use std::sync::Arc;

use tracing::error;

use crate::monitor::Monitor;

/// Saves the session summary when dropped, whichever way the session ends.
pub struct SummaryGuard {
    monitor: Arc<Monitor>,
}

impl SummaryGuard {
    pub fn new(monitor: Arc<Monitor>) -> Self {
        Self { monitor }
    }
}

impl Drop for SummaryGuard {
    fn drop(&mut self) {
        if let Err(e) = self.monitor.save_summary() {
            error!(error = %e, path = %self.monitor.summary_path().display(), "failed to save session summary");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::read_summary;
    use tempfile::TempDir;

    #[test]
    fn drop_writes_summary() {
        let tmp = TempDir::new().unwrap();
        let monitor = Arc::new(Monitor::new(tmp.path()).unwrap());
        let path = monitor.summary_path();

        {
            let _guard = SummaryGuard::new(monitor.clone());
            assert!(!path.exists());
        }

        let summary = read_summary(&path).unwrap();
        assert_eq!(summary.session_id, monitor.session_id());
        assert_eq!(summary.total_queries, 0);
    }
}
