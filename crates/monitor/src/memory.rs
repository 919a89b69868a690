const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Resident set size of this process in MB, or 0.0 where the platform
/// does not report it.
pub fn resident_memory_mb() -> f64 {
    memory_stats::memory_stats()
        .map(|stats| stats.physical_mem as f64 / BYTES_PER_MB)
        .unwrap_or(0.0)
}
