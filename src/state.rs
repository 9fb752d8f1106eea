use std::sync::Arc;
use std::time::Instant;

use tokio::sync::broadcast;

use crate::config::Config;
use crate::pose::form::FormClassifier;
use crate::store::Store;
use crate::workouts::WorkoutRegistry;

#[derive(Clone)]
pub struct AppState {
    store: Arc<Store>,
    workouts: Arc<WorkoutRegistry>,
    classifier: Arc<FormClassifier>,
    config: Arc<Config>,
    shutdown_tx: broadcast::Sender<()>,
    started_at: Instant,
}

impl AppState {
    pub fn new(store: Arc<Store>, config: &Config, shutdown_tx: broadcast::Sender<()>) -> Self {
        let workouts = Arc::new(WorkoutRegistry::new(
            config.workouts.max_active,
            config.thresholds.clone(),
        ));
        let classifier = Arc::new(FormClassifier::new(config.thresholds.clone()));

        Self {
            store,
            workouts,
            classifier,
            config: Arc::new(config.clone()),
            shutdown_tx,
            started_at: Instant::now(),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn workouts(&self) -> &Arc<WorkoutRegistry> {
        &self.workouts
    }

    /// 无状态的单帧分类器，与训练使用同一组阈值
    pub fn classifier(&self) -> &FormClassifier {
        &self.classifier
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn shutdown_rx(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    pub fn shutdown_tx(&self) -> &broadcast::Sender<()> {
        &self.shutdown_tx
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
