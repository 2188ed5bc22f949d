use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, timeout, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Run bookkeeping for one periodic worker
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskStatus {
    pub last_run: Option<DateTime<Utc>>,
    pub last_success: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub run_count: u64,
    pub success_count: u64,
    pub error_count: u64,
}

impl TaskStatus {
    fn record_run(&mut self, now: DateTime<Utc>) {
        self.last_run = Some(now);
        self.run_count += 1;
    }

    fn record_success(&mut self, now: DateTime<Utc>) {
        self.last_success = Some(now);
        self.success_count += 1;
        self.last_error = None;
    }

    fn record_error(&mut self, error: String) {
        self.error_count += 1;
        self.last_error = Some(error);
    }
}

/// Cancellable fixed-period background task.
///
/// The cancellation signal is only observed while waiting for the next tick,
/// so a tick's work always runs to completion. Late ticks are delayed rather
/// than bunched, which keeps executions strictly sequential.
pub struct PeriodicTask {
    name: &'static str,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
    status: Arc<RwLock<TaskStatus>>,
}

impl PeriodicTask {
    /// Spawn `work` on the current runtime, first run immediately.
    pub fn spawn<F, Fut, E>(name: &'static str, period: Duration, mut work: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let status = Arc::new(RwLock::new(TaskStatus::default()));

        let token = cancel.clone();
        let task_status = status.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = interval(period.max(Duration::from_millis(1)));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                let now = Utc::now();
                task_status.write().record_run(now);

                match work().await {
                    Ok(()) => task_status.write().record_success(now),
                    Err(e) => {
                        // The work itself logs the failure where it happens.
                        task_status.write().record_error(e.to_string());
                    }
                }
            }
            debug!(task = name, "periodic task exited");
        });

        info!(task = name, period_ms = period.as_millis() as u64, "periodic task started");
        Self {
            name,
            cancel,
            handle,
            status,
        }
    }

    pub fn status(&self) -> TaskStatus {
        self.status.read().clone()
    }

    /// Shared handle on the status, valid after the task is gone.
    pub fn status_handle(&self) -> Arc<RwLock<TaskStatus>> {
        self.status.clone()
    }

    /// Signal cancellation and wait up to `wait` for the task to exit.
    ///
    /// Returns `true` when the task exited in time. On timeout the task is
    /// left to observe the signal at its next tick; it is never aborted.
    pub async fn stop(self, wait: Duration) -> bool {
        self.cancel.cancel();
        match timeout(wait, self.handle).await {
            Ok(Ok(())) => {
                info!(task = self.name, "periodic task stopped");
                true
            }
            Ok(Err(e)) => {
                warn!(task = self.name, error = %e, "periodic task ended abnormally");
                true
            }
            Err(_) => {
                warn!(
                    task = self.name,
                    wait_ms = wait.as_millis() as u64,
                    "periodic task did not stop in time"
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[tokio::test]
    async fn test_runs_until_stopped() {
        let counter = Arc::new(AtomicU64::new(0));
        let c = counter.clone();
        let task = PeriodicTask::spawn("counter", Duration::from_millis(10), move || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok::<_, String>(())
            }
        });

        tokio::time::sleep(Duration::from_millis(55)).await;
        let status = task.status();
        assert!(task.stop(Duration::from_secs(1)).await);

        let runs = counter.load(Ordering::SeqCst);
        assert!(runs >= 2, "expected several runs, got {runs}");
        assert_eq!(status.error_count, 0);
        assert!(status.last_success.is_some());
    }

    #[tokio::test]
    async fn test_errors_are_counted() {
        let task = PeriodicTask::spawn("failing", Duration::from_millis(10), || async {
            Err::<(), _>("sink unavailable")
        });

        tokio::time::sleep(Duration::from_millis(35)).await;
        let status = task.status();
        assert!(task.stop(Duration::from_secs(1)).await);

        assert!(status.error_count >= 1);
        assert_eq!(status.success_count, 0);
        assert_eq!(status.last_error.as_deref(), Some("sink unavailable"));
    }

    #[tokio::test]
    async fn test_stop_interrupts_long_sleep() {
        let task = PeriodicTask::spawn("slow_period", Duration::from_secs(3600), || async {
            Ok::<_, String>(())
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        let started = std::time::Instant::now();
        assert!(task.stop(Duration::from_secs(2)).await);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_stop_times_out_on_busy_work() {
        let task = PeriodicTask::spawn("busy", Duration::from_millis(10), || async {
            tokio::time::sleep(Duration::from_millis(500)).await;
            Ok::<_, String>(())
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        let started = std::time::Instant::now();
        assert!(!task.stop(Duration::from_millis(50)).await);
        assert!(started.elapsed() < Duration::from_millis(400));
    }
}
