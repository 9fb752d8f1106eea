pub mod session_retention;
pub mod stale_workout_sweep;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::config::{WorkerConfig, WorkoutConfig};
use crate::store::Store;
use crate::workouts::WorkoutRegistry;

/// 单次 worker 调用的超时
const WORKER_TIMEOUT: Duration = Duration::from_secs(300);

/// 关闭调度器前留给进行中任务的时间
#[cfg(test)]
const DRAIN_TIMEOUT: Duration = Duration::from_millis(10);
#[cfg(not(test))]
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerName {
    StaleWorkoutSweep,
    SessionRetention,
}

impl WorkerName {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::StaleWorkoutSweep => "stale_workout_sweep",
            Self::SessionRetention => "session_retention",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSpec {
    pub name: WorkerName,
    pub cron: &'static str,
    pub enabled: bool,
}

pub struct WorkerManager {
    store: Arc<Store>,
    workouts: Arc<WorkoutRegistry>,
    shutdown_rx: broadcast::Receiver<()>,
    config: WorkerConfig,
    idle_timeout_secs: u64,
}

impl WorkerManager {
    pub fn new(
        store: Arc<Store>,
        workouts: Arc<WorkoutRegistry>,
        shutdown_rx: broadcast::Receiver<()>,
        config: &WorkerConfig,
        workout_config: &WorkoutConfig,
    ) -> Self {
        Self {
            store,
            workouts,
            shutdown_rx,
            config: config.clone(),
            idle_timeout_secs: workout_config.idle_timeout_secs,
        }
    }

    /// 所有计划任务及其 cron 表达式的唯一来源
    pub fn planned_jobs(&self) -> Vec<JobSpec> {
        if !self.config.is_leader {
            return Vec::new();
        }

        vec![
            JobSpec {
                name: WorkerName::StaleWorkoutSweep,
                cron: "0 * * * * *",
                enabled: true,
            },
            JobSpec {
                name: WorkerName::SessionRetention,
                cron: "0 15 * * * *",
                enabled: self.config.session_retention_days > 0,
            },
        ]
    }

    pub async fn start(mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if !self.config.is_leader {
            tracing::info!("Worker leader disabled; skipping worker startup");
            return Ok(());
        }

        let mut scheduler = JobScheduler::new().await?;

        self.register_jobs(&scheduler).await;

        scheduler.start().await?;

        tracing::info!("Worker manager started");
        let _ = self.shutdown_rx.recv().await;

        tracing::info!(
            "Worker manager shutting down, draining for {}s",
            DRAIN_TIMEOUT.as_secs()
        );
        tokio::time::sleep(DRAIN_TIMEOUT).await;
        let _ = scheduler.shutdown().await;
        Ok(())
    }

    async fn register_jobs(&self, scheduler: &JobScheduler) {
        for spec in &self.planned_jobs() {
            if !spec.enabled {
                tracing::info!(name = spec.name.as_str(), "Skipping disabled worker");
                continue;
            }

            let store = self.store.clone();
            let name_str = spec.name.as_str();

            match spec.name {
                WorkerName::StaleWorkoutSweep => {
                    let workouts = self.workouts.clone();
                    let idle_timeout_secs = self.idle_timeout_secs;
                    add_job(scheduler, spec.cron, name_str, move || {
                        let store = store.clone();
                        let workouts = workouts.clone();
                        async move {
                            stale_workout_sweep::run(&store, &workouts, idle_timeout_secs).await;
                        }
                    })
                    .await;
                }
                WorkerName::SessionRetention => {
                    let retention_days = self.config.session_retention_days;
                    add_job(scheduler, spec.cron, name_str, move || {
                        let store = store.clone();
                        async move {
                            session_retention::run(&store, retention_days).await;
                        }
                    })
                    .await;
                }
            }
            tracing::info!(name = name_str, cron = spec.cron, "Registered worker");
        }
    }
}

/// 带重入保护和超时的任务注册
async fn add_job<Fut, F>(scheduler: &JobScheduler, cron: &str, name: &'static str, mut run: F)
where
    F: FnMut() -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = ()> + Send + 'static,
{
    let running = Arc::new(AtomicBool::new(false));

    let job = Job::new_async(cron, move |_uuid, _lock| {
        let guard = running.clone();

        if guard
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::warn!(
                worker = name,
                "Skipping worker invocation: previous run still in progress"
            );
            return Box::pin(async {});
        }

        let fut = run();
        Box::pin(async move {
            if tokio::time::timeout(WORKER_TIMEOUT, fut).await.is_err() {
                tracing::error!(
                    worker = name,
                    timeout_secs = WORKER_TIMEOUT.as_secs(),
                    "Worker timed out"
                );
            }
            guard.store(false, Ordering::SeqCst);
        })
    });

    match job {
        Ok(job) => {
            if let Err(err) = scheduler.add(job).await {
                tracing::error!(error=%err, cron, worker = name, "Failed to add worker job");
            }
        }
        Err(err) => tracing::error!(error=%err, cron, worker = name, "Failed to create worker job"),
    }
}
