//! Progress-callback trait for conversion-job events.
//!
//! Inject an [`Arc<dyn JobProgressCallback>`] via
//! [`crate::config::PipelineConfigBuilder::progress_callback`] to receive
//! events as the orchestrator walks the renderer chain for each job.
//!
//! # Why callbacks instead of channels?
//!
//! A callback is the least-invasive integration point: callers can forward
//! events to a channel, a log line, or a terminal spinner without the
//! library knowing how the host application communicates. The trait is
//! `Send + Sync` because jobs from one [`crate::convert::Pipeline`] run
//! concurrently.
//!
//! # Example
//!
//! ```rust
//! use guide2pdf::{JobProgressCallback, PipelineConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     failures: AtomicUsize,
//! }
//!
//! impl JobProgressCallback for CountingCallback {
//!     fn on_attempt_failed(&self, job_id: &str, renderer: &str, error: &str) {
//!         self.failures.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("[{job_id}] {renderer} failed: {error}");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback {
//!     failures: AtomicUsize::new(0),
//! });
//!
//! let config = PipelineConfig::builder()
//!     .progress_callback(counter as Arc<dyn JobProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the conversion orchestrator as a job progresses.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Events for different jobs may interleave.
pub trait JobProgressCallback: Send + Sync {
    /// Called once the job's input file has been written.
    ///
    /// # Arguments
    /// * `job_id`    — unique job identifier (the temp file stem)
    /// * `input_len` — size of the encoded document in bytes
    fn on_job_start(&self, job_id: &str, input_len: usize) {
        let _ = (job_id, input_len);
    }

    /// Called just before a renderer is invoked.
    ///
    /// # Arguments
    /// * `attempt` — 1-indexed position in the renderer chain
    /// * `total`   — length of the renderer chain
    fn on_attempt_start(&self, job_id: &str, renderer: &str, attempt: usize, total: usize) {
        let _ = (job_id, renderer, attempt, total);
    }

    /// Called when a renderer attempt fails and the chain moves on.
    fn on_attempt_failed(&self, job_id: &str, renderer: &str, error: &str) {
        let _ = (job_id, renderer, error);
    }

    /// Called when a renderer produced a readable output file.
    fn on_attempt_succeeded(&self, job_id: &str, renderer: &str, output_len: usize) {
        let _ = (job_id, renderer, output_len);
    }

    /// Called once per job after cleanup, whatever the outcome.
    fn on_job_complete(&self, job_id: &str, succeeded: bool) {
        let _ = (job_id, succeeded);
    }
}

/// A no-op implementation for callers that don't need progress events.
///
/// This is the default when no callback is configured.
pub struct NoopProgressCallback;

impl JobProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::PipelineConfig`].
pub type ProgressCallback = Arc<dyn JobProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct TrackingCallback {
        attempts: AtomicUsize,
        failures: Mutex<Vec<String>>,
        completed: AtomicUsize,
    }

    impl JobProgressCallback for TrackingCallback {
        fn on_attempt_start(&self, _job_id: &str, _renderer: &str, _attempt: usize, _total: usize) {
            self.attempts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_attempt_failed(&self, _job_id: &str, renderer: &str, _error: &str) {
            self.failures.lock().unwrap().push(renderer.to_string());
        }

        fn on_job_complete(&self, _job_id: &str, _succeeded: bool) {
            self.completed.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_job_start("job", 10);
        cb.on_attempt_start("job", "soffice", 1, 2);
        cb.on_attempt_failed("job", "soffice", "boom");
        cb.on_attempt_succeeded("job", "pandoc", 512);
        cb.on_job_complete("job", true);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_attempt_start("a", "soffice", 1, 2);
        tracker.on_attempt_failed("a", "soffice", "exit 1");
        tracker.on_attempt_start("a", "pandoc", 2, 2);
        tracker.on_attempt_succeeded("a", "pandoc", 100);
        tracker.on_job_complete("a", true);

        assert_eq!(tracker.attempts.load(Ordering::SeqCst), 2);
        assert_eq!(*tracker.failures.lock().unwrap(), vec!["soffice"]);
        assert_eq!(tracker.completed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_job_start("j", 1);
        cb.on_job_complete("j", false);
    }
}
