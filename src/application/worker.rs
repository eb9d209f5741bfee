use crate::application::executor::{JobOutcome, PaymentJobExecutor};
use std::ops::AddAssign;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Counters reported by the workers when they stop.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WorkerStats {
    pub paid: usize,
    pub failed: usize,
    pub skipped: usize,
    pub aborted: usize,
    pub polls: usize,
}

impl WorkerStats {
    pub fn executed(&self) -> usize {
        self.paid + self.failed + self.skipped + self.aborted
    }

    fn record(&mut self, outcome: &JobOutcome) {
        match outcome {
            JobOutcome::Paid => self.paid += 1,
            JobOutcome::Failed { .. } => self.failed += 1,
            JobOutcome::Skipped => self.skipped += 1,
            JobOutcome::Aborted => self.aborted += 1,
        }
    }
}

impl AddAssign for WorkerStats {
    fn add_assign(&mut self, other: Self) {
        self.paid += other.paid;
        self.failed += other.failed;
        self.skipped += other.skipped;
        self.aborted += other.aborted;
        self.polls += other.polls;
    }
}

/// Background tasks polling the job queue and executing payment jobs.
///
/// ```ignore
/// let pool = WorkerPool::spawn(executor, 4, Duration::from_millis(50));
/// // ... submit payments ...
/// let stats = pool.stop().await;
/// ```
pub struct WorkerPool {
    stop_tx: watch::Sender<bool>,
    handles: Vec<JoinHandle<WorkerStats>>,
}

impl WorkerPool {
    /// Starts `workers` tasks that keep polling until [`WorkerPool::stop`].
    pub fn spawn(executor: Arc<PaymentJobExecutor>, workers: usize, poll_interval: Duration) -> Self {
        let (stop_tx, stop_rx) = watch::channel(false);
        let handles = (0..workers.max(1))
            .map(|worker| {
                let executor = executor.clone();
                let mut stop_rx = stop_rx.clone();
                tokio::spawn(async move {
                    let mut stats = WorkerStats::default();
                    loop {
                        if *stop_rx.borrow() {
                            break;
                        }
                        stats.polls += 1;
                        match executor.run_next().await {
                            Ok(Some(outcome)) => {
                                stats.record(&outcome);
                                continue;
                            }
                            Ok(None) => {}
                            Err(e) => error!(worker, error = %e, "Job queue poll failed"),
                        }
                        tokio::select! {
                            _ = tokio::time::sleep(poll_interval) => {}
                            changed = stop_rx.changed() => {
                                if changed.is_err() {
                                    break;
                                }
                            }
                        }
                    }
                    debug!(worker, ?stats, "Worker stopped");
                    stats
                })
            })
            .collect();
        Self { stop_tx, handles }
    }

    /// Signals every worker to stop after its current job and waits for them.
    pub async fn stop(self) -> WorkerStats {
        let _ = self.stop_tx.send(true);
        join_all(self.handles).await
    }

    /// Runs `workers` tasks until the queue is empty, then returns.
    pub async fn drain(executor: Arc<PaymentJobExecutor>, workers: usize) -> WorkerStats {
        let handles = (0..workers.max(1))
            .map(|worker| {
                let executor = executor.clone();
                tokio::spawn(async move {
                    let mut stats = WorkerStats::default();
                    loop {
                        stats.polls += 1;
                        match executor.run_next().await {
                            Ok(Some(outcome)) => stats.record(&outcome),
                            Ok(None) => break,
                            Err(e) => {
                                error!(worker, error = %e, "Job queue poll failed");
                                break;
                            }
                        }
                    }
                    stats
                })
            })
            .collect();
        let stats = join_all(handles).await;
        info!(executed = stats.executed(), paid = stats.paid, failed = stats.failed, "Queue drained");
        stats
    }
}

async fn join_all(handles: Vec<JoinHandle<WorkerStats>>) -> WorkerStats {
    let mut total = WorkerStats::default();
    for handle in handles {
        match handle.await {
            Ok(stats) => total += stats,
            Err(e) => error!(error = %e, "Worker task panicked"),
        }
    }
    total
}
