// Crontab registry and background tick loop

use crate::clock::Snapshot;
use crate::errors::CrontabError;
use crate::job::{Job, JobFn};
use crate::schedule::{Granularity, Schedule};
use futures::FutureExt;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tracing::{debug, info, instrument};

type JobTable = HashMap<String, Arc<Job>>;

/// In-process crontab: named jobs evaluated against the wall clock by a
/// background tick loop, at minute or second granularity.
///
/// The tick loop starts at construction and runs until the registry is
/// shut down or dropped. `stop` only clears the job table; the loop
/// keeps ticking over an empty table until jobs are added again.
pub struct Crontab {
    granularity: Granularity,
    jobs: Arc<RwLock<JobTable>>,
    shutdown_tx: broadcast::Sender<()>,
    ticker: JoinHandle<()>,
}

impl Crontab {
    /// Create a registry and start its tick loop.
    ///
    /// Must be called from within a tokio runtime. The first tick fires
    /// one full period after construction.
    pub fn new(granularity: Granularity) -> Crontab {
        let jobs: Arc<RwLock<JobTable>> = Arc::new(RwLock::new(HashMap::new()));
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let ticker = tokio::spawn(tick_loop(granularity, Arc::clone(&jobs), shutdown_rx));

        info!(granularity = ?granularity, "Crontab started");

        Crontab {
            granularity,
            jobs,
            shutdown_tx,
            ticker,
        }
    }

    /// Register a job under a unique name.
    ///
    /// The schedule must have this registry's field count: five fields at
    /// minute granularity, six with a leading second field at second
    /// granularity. Arguments the callback needs are bound by capturing
    /// them in the closure. Registration failures are hard errors:
    /// nothing is registered and the error names the rejected input.
    #[instrument(skip(self, callback))]
    pub async fn add<F, Fut>(
        &self,
        name: &str,
        schedule: &str,
        callback: F,
    ) -> Result<(), CrontabError>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), anyhow::Error>> + Send + 'static,
    {
        let compiled = Schedule::compile(schedule, self.granularity)?;
        let callback: JobFn = Arc::new(move || callback().boxed());
        let job = Arc::new(Job {
            name: name.to_string(),
            schedule: compiled,
            callback,
        });

        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(name) {
            return Err(CrontabError::DuplicateName(name.to_string()));
        }
        jobs.insert(name.to_string(), job);
        drop(jobs);

        info!(job = %name, schedule = %schedule, "Job registered");
        Ok(())
    }

    /// Dispatch every registered job once, right now, ignoring schedules.
    ///
    /// Fire and forget: returns without waiting for any callback.
    pub async fn run(&self) {
        let due: Vec<Arc<Job>> = self.jobs.read().await.values().cloned().collect();
        debug!(count = due.len(), "Dispatching all jobs on demand");
        for job in due {
            job.dispatch();
        }
    }

    /// Discard every registered job.
    ///
    /// The tick loop keeps running and matches nothing until jobs are
    /// added again.
    pub async fn stop(&self) {
        let mut jobs = self.jobs.write().await;
        let dropped = jobs.len();
        jobs.clear();
        drop(jobs);

        info!(jobs_dropped = dropped, "All jobs cleared");
    }

    /// Stop the tick loop and wait for it to finish.
    ///
    /// Registered jobs are discarded with the registry. Callbacks already
    /// dispatched keep running to completion on the runtime.
    pub async fn shutdown(mut self) {
        let _ = self.shutdown_tx.send(());
        let _ = (&mut self.ticker).await;
        info!("Crontab shut down");
    }

    /// The tick resolution fixed at construction.
    pub fn granularity(&self) -> Granularity {
        self.granularity
    }
}

impl Drop for Crontab {
    fn drop(&mut self) {
        // Releases the timer when the registry is discarded without an
        // explicit shutdown.
        self.ticker.abort();
    }
}

/// Evaluate the job table against the wall clock once per period until
/// shut down.
async fn tick_loop(
    granularity: Granularity,
    jobs: Arc<RwLock<JobTable>>,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    let period = granularity.period();
    // First tick lands one full period after construction.
    let mut ticks = interval_at(Instant::now() + period, period);

    loop {
        tokio::select! {
            _ = ticks.tick() => {
                let now = Snapshot::now();
                // Snapshot the matching jobs, then dispatch with no lock
                // held so a slow callback cannot starve writers.
                let due: Vec<Arc<Job>> = jobs
                    .read()
                    .await
                    .values()
                    .filter(|job| job.schedule.matches(&now))
                    .cloned()
                    .collect();

                if !due.is_empty() {
                    debug!(due = due.len(), "Tick matched jobs");
                }
                for job in due {
                    job.dispatch();
                }
            }
            _ = shutdown_rx.recv() => {
                info!("Shutdown signal received, stopping tick loop");
                break;
            }
        }
    }
}
