// Operation metrics module
//
// Lightweight counters for moves, presets and refreshes, logged on shutdown

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Operation counters for a session.
///
/// Uses atomic operations so move tasks and the controller can record
/// without locks.
#[derive(Debug)]
pub struct Metrics {
    /// Moves that reached Success
    pub moves_succeeded: AtomicUsize,

    /// Moves that ended in NotFound or IoFailure
    pub moves_failed: AtomicUsize,

    /// Total time spent in moves in milliseconds
    pub total_move_time_ms: AtomicU64,

    /// Presets applied
    pub presets_applied: AtomicUsize,

    /// Preset names reported missing while applying
    pub missing_mods_reported: AtomicUsize,

    /// Re-classifications of the mods roots
    pub refreshes: AtomicU64,

    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            moves_succeeded: AtomicUsize::new(0),
            moves_failed: AtomicUsize::new(0),
            total_move_time_ms: AtomicU64::new(0),
            presets_applied: AtomicUsize::new(0),
            missing_mods_reported: AtomicUsize::new(0),
            refreshes: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record a terminal move status and its duration
    pub fn record_move(&self, success: bool, duration: Duration) {
        if success {
            self.moves_succeeded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.moves_failed.fetch_add(1, Ordering::Relaxed);
        }
        self.total_move_time_ms
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn record_preset_applied(&self, missing: usize) {
        self.presets_applied.fetch_add(1, Ordering::Relaxed);
        self.missing_mods_reported
            .fetch_add(missing, Ordering::Relaxed);
    }

    pub fn record_refresh(&self) {
        self.refreshes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Average move time in milliseconds over all terminated moves
    pub fn avg_move_time_ms(&self) -> f64 {
        let total = self.total_move_time_ms.load(Ordering::Relaxed);
        let count = self.moves_succeeded.load(Ordering::Relaxed)
            + self.moves_failed.load(Ordering::Relaxed);
        if count > 0 {
            total as f64 / count as f64
        } else {
            0.0
        }
    }

    pub fn log_summary(&self) {
        tracing::info!("=== Session Summary ===");
        tracing::info!("Uptime: {:.2}s", self.uptime().as_secs_f64());
        tracing::info!(
            "Moves: {} succeeded, {} failed (avg: {:.2}ms)",
            self.moves_succeeded.load(Ordering::Relaxed),
            self.moves_failed.load(Ordering::Relaxed),
            self.avg_move_time_ms()
        );
        tracing::info!(
            "Presets applied: {}, missing mods reported: {}, refreshes: {}",
            self.presets_applied.load(Ordering::Relaxed),
            self.missing_mods_reported.load(Ordering::Relaxed),
            self.refreshes.load(Ordering::Relaxed)
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_moves() {
        let metrics = Metrics::new();

        metrics.record_move(true, Duration::from_millis(100));
        metrics.record_move(true, Duration::from_millis(200));
        metrics.record_move(false, Duration::from_millis(300));

        assert_eq!(metrics.moves_succeeded.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.moves_failed.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.avg_move_time_ms(), 200.0);
    }

    #[test]
    fn test_avg_move_time_no_moves() {
        assert_eq!(Metrics::new().avg_move_time_ms(), 0.0);
    }

    #[test]
    fn test_preset_and_refresh_counters() {
        let metrics = Metrics::new();

        metrics.record_preset_applied(2);
        metrics.record_preset_applied(0);
        metrics.record_refresh();

        assert_eq!(metrics.presets_applied.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.missing_mods_reported.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.refreshes.load(Ordering::Relaxed), 1);
    }
}
