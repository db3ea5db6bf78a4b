//! Progress tracking and callbacks for attack runs.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Progress information for one attack iteration.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// Completed iterations, starting at 1.
    pub iteration: usize,
    /// Total number of iterations, if the budget is fixed.
    pub total_iterations: Option<usize>,
    /// Loss observed in this iteration.
    pub loss: f64,
    /// Time elapsed since start.
    pub elapsed: Duration,
    /// Estimated remaining time.
    pub estimated_remaining: Option<Duration>,
}

impl ProgressInfo {
    pub fn new(
        iteration: usize,
        total_iterations: Option<usize>,
        loss: f64,
        elapsed: Duration,
    ) -> Self {
        Self {
            iteration,
            total_iterations,
            loss,
            elapsed,
            estimated_remaining: None,
        }
    }

    /// Calculate progress percentage.
    pub fn progress_percent(&self) -> Option<f64> {
        self.total_iterations
            .filter(|&total| total > 0)
            .map(|total| (self.iteration as f64 / total as f64) * 100.0)
    }

    /// Calculate estimated remaining time.
    pub fn calculate_remaining(&mut self) {
        if let Some(total) = self.total_iterations {
            if self.iteration > 0 {
                let avg_time_per_iter = self.elapsed.as_secs_f64() / self.iteration as f64;
                let remaining_iters = total.saturating_sub(self.iteration);
                self.estimated_remaining = Some(Duration::from_secs_f64(
                    avg_time_per_iter * remaining_iters as f64,
                ));
            }
        }
    }
}

/// Callback notified while an attack runs.
pub trait ProgressCallback: Send + Sync {
    /// Called after every iteration.
    fn on_progress(&self, info: &ProgressInfo);

    /// Called when the attack starts.
    fn on_start(&self) {}

    /// Called when the attack finishes.
    fn on_complete(&self, _info: &ProgressInfo) {}

    /// Called when the attack fails.
    fn on_error(&self, _error: &str) {}
}

/// Console progress callback that logs to tracing.
#[derive(Debug, Clone)]
pub struct ConsoleProgressCallback {
    /// Log interval (iterations).
    pub log_interval: usize,
}

impl Default for ConsoleProgressCallback {
    fn default() -> Self {
        Self { log_interval: 50 }
    }
}

impl ConsoleProgressCallback {
    pub fn new(log_interval: usize) -> Self {
        Self {
            log_interval: log_interval.max(1),
        }
    }
}

impl ProgressCallback for ConsoleProgressCallback {
    fn on_progress(&self, info: &ProgressInfo) {
        let interval = self.log_interval.max(1);
        if info.iteration % interval == 0 || info.total_iterations == Some(info.iteration) {
            let remaining = info
                .estimated_remaining
                .map(|d| format!("{:.2}s", d.as_secs_f64()))
                .unwrap_or_else(|| "N/A".to_string());

            tracing::info!(
                "Iter {}/{} ({:.1}%) | Loss: {:.6} | Elapsed: {:.2}s | ETA: {}",
                info.iteration,
                info.total_iterations.map(|n| n.to_string()).unwrap_or_else(|| "?".to_string()),
                info.progress_percent().unwrap_or(0.0),
                info.loss,
                info.elapsed.as_secs_f64(),
                remaining
            );
        }
    }

    fn on_start(&self) {
        tracing::info!("Attack started");
    }

    fn on_complete(&self, info: &ProgressInfo) {
        tracing::info!(
            "Attack finished after {} iterations in {:.2}s with loss {:.6}",
            info.iteration,
            info.elapsed.as_secs_f64(),
            info.loss
        );
    }

    fn on_error(&self, error: &str) {
        tracing::error!("Attack failed: {}", error);
    }
}

/// Records every progress update.
#[derive(Debug, Clone, Default)]
pub struct HistoryCallback {
    history: Arc<Mutex<Vec<ProgressInfo>>>,
}

impl HistoryCallback {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the recorded history.
    pub fn get_history(&self) -> Vec<ProgressInfo> {
        lock(&self.history).clone()
    }

    /// Recorded losses in order.
    pub fn losses(&self) -> Vec<f64> {
        lock(&self.history).iter().map(|info| info.loss).collect()
    }

    pub fn clear(&self) {
        lock(&self.history).clear();
    }
}

impl ProgressCallback for HistoryCallback {
    fn on_progress(&self, info: &ProgressInfo) {
        lock(&self.history).push(info.clone());
    }
}

/// Progress tracker that fans out to multiple callbacks.
///
/// The tracker itself holds no clock. Each [`ProgressTracker::start`] hands
/// out a [`ProgressRun`] with its own start instant, so one tracker can be
/// shared by concurrent runs.
#[derive(Clone, Default)]
pub struct ProgressTracker {
    callbacks: Vec<Arc<dyn ProgressCallback>>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a callback.
    pub fn add_callback(&mut self, callback: Arc<dyn ProgressCallback>) {
        self.callbacks.push(callback);
    }

    /// Builder form of [`ProgressTracker::add_callback`].
    pub fn with_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.add_callback(callback);
        self
    }

    /// Start tracking one run.
    pub fn start(&self) -> ProgressRun<'_> {
        for callback in &self.callbacks {
            callback.on_start();
        }
        ProgressRun {
            tracker: self,
            started: Instant::now(),
        }
    }

    /// Report error.
    pub fn error(&self, error: &str) {
        for callback in &self.callbacks {
            callback.on_error(error);
        }
    }

    fn notify(&self, info: &ProgressInfo) {
        for callback in &self.callbacks {
            callback.on_progress(info);
        }
    }
}

impl std::fmt::Debug for ProgressTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("callbacks", &self.callbacks.len())
            .finish()
    }
}

/// Progress of a single run, timed from its own start.
#[derive(Debug)]
pub struct ProgressRun<'a> {
    tracker: &'a ProgressTracker,
    started: Instant,
}

impl ProgressRun<'_> {
    /// Report a finished iteration.
    pub fn update(&self, iteration: usize, total_iterations: Option<usize>, loss: f64) {
        let mut info = ProgressInfo::new(iteration, total_iterations, loss, self.elapsed());
        info.calculate_remaining();
        self.tracker.notify(&info);
    }

    /// Complete tracking.
    pub fn complete(&self, iterations: usize, final_loss: f64) {
        let info = ProgressInfo::new(iterations, Some(iterations), final_loss, self.elapsed());
        for callback in &self.tracker.callbacks {
            callback.on_complete(&info);
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

// A panicking callback must not take the tracker down with it.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_info() {
        let info = ProgressInfo::new(10, Some(100), 0.5, Duration::from_secs(10));
        assert_eq!(info.iteration, 10);
        assert_eq!(info.progress_percent(), Some(10.0));
        assert_eq!(ProgressInfo::new(1, None, 0.5, Duration::ZERO).progress_percent(), None);
    }

    #[test]
    fn test_progress_info_remaining() {
        let mut info = ProgressInfo::new(10, Some(100), 0.5, Duration::from_secs(10));
        info.calculate_remaining();
        assert_eq!(info.estimated_remaining, Some(Duration::from_secs(90)));
    }

    #[test]
    fn test_history_callback() {
        let callback = HistoryCallback::new();
        callback.on_progress(&ProgressInfo::new(1, Some(10), 0.5, Duration::ZERO));
        callback.on_progress(&ProgressInfo::new(2, Some(10), 0.4, Duration::ZERO));

        let history = callback.get_history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].iteration, 2);
        assert_eq!(callback.losses(), vec![0.5, 0.4]);

        callback.clear();
        assert!(callback.get_history().is_empty());
    }

    #[test]
    fn test_progress_tracker() {
        let history = Arc::new(HistoryCallback::new());
        let tracker = ProgressTracker::new()
            .with_callback(history.clone())
            .with_callback(Arc::new(ConsoleProgressCallback::new(1)));
        let run = tracker.start();
        run.update(1, Some(2), 0.5);
        run.update(2, Some(2), 0.4);
        run.complete(2, 0.4);
        assert_eq!(history.losses(), vec![0.5, 0.4]);
    }

    #[test]
    fn test_runs_keep_their_own_clock() {
        let tracker = ProgressTracker::new();
        let first = tracker.start();
        std::thread::sleep(Duration::from_millis(20));
        let second = tracker.start();
        assert!(first.elapsed() >= Duration::from_millis(20));
        assert!(second.elapsed() < first.elapsed());
    }

    #[test]
    fn test_zero_log_interval_does_not_panic() {
        let callback = ConsoleProgressCallback { log_interval: 0 };
        callback.on_progress(&ProgressInfo::new(3, None, 0.5, Duration::ZERO));
    }
}
