use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info, warn};

use super::executor::{MonitoringExecutor, PipelineError};
use crate::store::CHECKS;

/// Ids whose pipeline is currently running
#[derive(Default)]
struct InFlight(Mutex<HashSet<String>>);

impl InFlight {
    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Mark `id` as running; `None` if it already is
    fn claim(self: &Arc<Self>, id: &str) -> Option<InFlightGuard> {
        if self.lock().insert(id.to_string()) {
            Some(InFlightGuard { set: self.clone(), id: id.to_string() })
        } else {
            None
        }
    }
}

struct InFlightGuard {
    set: Arc<InFlight>,
    id: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.set.lock().remove(&self.id);
    }
}

/// Monitoring scheduler - lists every check once per interval and runs an
/// independent pipeline for each
pub struct MonitoringScheduler {
    executor: Arc<MonitoringExecutor>,
    probe_interval: Duration,
    limit: Option<Arc<Semaphore>>,
    in_flight: Arc<InFlight>,
}

impl MonitoringScheduler {
    /// Create a new monitoring scheduler.
    ///
    /// `max_concurrent` caps running pipelines across overlapping cycles;
    /// `None` leaves fan-out unbounded.
    pub fn new(
        executor: Arc<MonitoringExecutor>,
        probe_interval: Duration,
        max_concurrent: Option<usize>,
    ) -> Self {
        Self {
            executor,
            probe_interval,
            limit: max_concurrent
                .map(|n| Arc::new(Semaphore::new(n.clamp(1, Semaphore::MAX_PERMITS)))),
            in_flight: Arc::new(InFlight::default()),
        }
    }

    /// Run one cycle: list all checks and spawn a pipeline per id.
    ///
    /// Returns without waiting for the pipelines; the handles are returned
    /// for callers that want to.
    pub async fn run_cycle(&self) -> Vec<JoinHandle<()>> {
        let ids = match self.executor.store().list(CHECKS).await {
            Ok(ids) => ids,
            Err(e) => {
                error!("Failed to list checks: {}", e);
                return Vec::new();
            }
        };

        if ids.is_empty() {
            info!("No checks to process");
            return Vec::new();
        }
        debug!(count = ids.len(), "Starting probe cycle");

        let mut handles = Vec::with_capacity(ids.len());
        for id in ids {
            let Some(guard) = self.in_flight.claim(&id) else {
                debug!(check_id = %id, "Previous pipeline still running, skipping");
                continue;
            };

            let executor = self.executor.clone();
            let limit = self.limit.clone();

            handles.push(tokio::spawn(async move {
                let _guard = guard;
                let _permit = match limit {
                    Some(semaphore) => match semaphore.acquire_owned().await {
                        Ok(permit) => Some(permit),
                        Err(_) => return,
                    },
                    None => None,
                };

                match executor.execute_check(&id).await {
                    Ok(report) => debug!(check_id = %report.check_id, state = %report.state, "Pipeline finished"),
                    Err(PipelineError::Invalid(e)) => {
                        warn!(check_id = %id, "Check is not properly formatted, skipping: {}", e)
                    }
                    Err(e) => error!(check_id = %id, "Check pipeline failed: {}", e),
                }
            }));
        }

        handles
    }

    /// Start the probe loop: one cycle now, then one per interval.
    ///
    /// Cycles are not awaited, so a slow cycle may overlap the next one.
    pub fn start(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut timer = interval(self.probe_interval);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                timer.tick().await;
                let _ = self.run_cycle().await;
            }
        })
    }
}
