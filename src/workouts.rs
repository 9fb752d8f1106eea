//! 进行中的训练
//!
//! 每个训练独占一个 `WorkoutTracker`，放在各自的异步互斥锁后面，同一训练的帧严格串行；
//! 不同训练之间互不影响。结束（显式或超时）时持久化为 `SessionRecord` 并移出注册表。

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};

use crate::pose::landmarks::LandmarkSet;
use crate::pose::session::SessionSummary;
use crate::pose::thresholds::FormThresholds;
use crate::pose::tracker::{FrameOutcome, TrackerSnapshot, WorkoutTracker};
use crate::services::summaries;
use crate::store::operations::session_records::SessionRecord;
use crate::store::{Store, StoreError};

#[derive(Debug, Error)]
pub enum WorkoutError {
    #[error("too many active workouts (limit {limit})")]
    Capacity { limit: usize },
    #[error("workout not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct LiveWorkout {
    pub id: String,
    pub user_id: Option<String>,
    pub started_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    tracker: WorkoutTracker,
}

impl LiveWorkout {
    pub fn process(
        &mut self,
        landmarks: &LandmarkSet,
        timestamp_ms: u64,
        now: DateTime<Utc>,
    ) -> FrameOutcome {
        self.last_activity = now;
        self.tracker.process(landmarks, timestamp_ms)
    }

    pub fn view(&self) -> WorkoutView {
        WorkoutView {
            id: self.id.clone(),
            user_id: self.user_id.clone(),
            started_at: self.started_at,
            last_activity: self.last_activity,
            tracker: self.tracker.snapshot(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutView {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub started_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    #[serde(flatten)]
    pub tracker: TrackerSnapshot,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinishedWorkout {
    pub session: SessionRecord,
    pub summary: SessionSummary,
}

pub struct WorkoutRegistry {
    workouts: RwLock<HashMap<String, Arc<Mutex<LiveWorkout>>>>,
    max_active: usize,
    thresholds: FormThresholds,
}

impl WorkoutRegistry {
    pub fn new(max_active: usize, thresholds: FormThresholds) -> Self {
        Self {
            workouts: RwLock::new(HashMap::new()),
            max_active,
            thresholds,
        }
    }

    pub fn thresholds(&self) -> &FormThresholds {
        &self.thresholds
    }

    pub async fn start(
        &self,
        user_id: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<WorkoutView, WorkoutError> {
        let mut workouts = self.workouts.write().await;
        if workouts.len() >= self.max_active {
            return Err(WorkoutError::Capacity {
                limit: self.max_active,
            });
        }

        let workout = LiveWorkout {
            id: uuid::Uuid::new_v4().to_string(),
            user_id,
            started_at: now,
            last_activity: now,
            tracker: WorkoutTracker::start(self.thresholds.clone(), now),
        };
        let view = workout.view();
        workouts.insert(workout.id.clone(), Arc::new(Mutex::new(workout)));
        tracing::info!(workout_id = %view.id, active = workouts.len(), "Workout started");
        Ok(view)
    }

    pub async fn get(&self, id: &str) -> Result<Arc<Mutex<LiveWorkout>>, WorkoutError> {
        self.workouts
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| WorkoutError::NotFound(id.to_string()))
    }

    pub async fn active_count(&self) -> usize {
        self.workouts.read().await.len()
    }

    /// 最近一次活动早于 `cutoff` 的训练
    pub async fn idle_since(&self, cutoff: DateTime<Utc>) -> Vec<String> {
        let handles: Vec<(String, Arc<Mutex<LiveWorkout>>)> = self
            .workouts
            .read()
            .await
            .iter()
            .map(|(id, w)| (id.clone(), w.clone()))
            .collect();

        let mut idle = Vec::new();
        for (id, workout) in handles {
            if workout.lock().await.last_activity < cutoff {
                idle.push(id);
            }
        }
        idle
    }

    /// 结束训练：冻结时长、持久化并计算汇总，成功后才移出注册表。
    /// 保存失败时训练仍在注册表中，可以重试。
    pub async fn finish(
        &self,
        store: &Store,
        id: &str,
        now: DateTime<Utc>,
    ) -> Result<FinishedWorkout, WorkoutError> {
        let handle = self.get(id).await?;
        let mut workout = handle.lock().await;

        // 并发的另一次 finish 可能已经先完成
        if !self.workouts.read().await.contains_key(id) {
            return Err(WorkoutError::NotFound(id.to_string()));
        }

        let (data, _) = workout.tracker.end(now);
        let record =
            SessionRecord::from_session(workout.id.clone(), workout.user_id.clone(), &data, now);
        store.create_session_record(&record)?;
        let summary = summaries::summarize_record(store, &record)?;

        // 持有训练锁期间移除，之后不会再有帧写入已结束的训练
        self.workouts.write().await.remove(id);

        tracing::info!(
            workout_id = %record.id,
            correct = record.correct_reps,
            incorrect = record.incorrect_reps,
            duration_secs = record.duration,
            "Workout finished"
        );

        Ok(FinishedWorkout {
            session: record,
            summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use tempfile::tempdir;

    use super::*;

    fn registry(max_active: usize) -> WorkoutRegistry {
        WorkoutRegistry::new(max_active, FormThresholds::default())
    }

    #[tokio::test]
    async fn capacity_is_enforced() {
        let reg = registry(1);
        reg.start(None, Utc::now()).await.unwrap();
        assert!(matches!(
            reg.start(None, Utc::now()).await,
            Err(WorkoutError::Capacity { limit: 1 })
        ));
    }

    #[tokio::test]
    async fn finish_persists_and_removes() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("db").to_str().unwrap()).unwrap();
        let reg = registry(4);
        let start = Utc::now();
        let view = reg.start(Some("u1".into()), start).await.unwrap();

        let finished = reg
            .finish(&store, &view.id, start + Duration::seconds(42))
            .await
            .unwrap();
        assert_eq!(finished.session.duration, 42);
        assert_eq!(finished.session.user_id.as_deref(), Some("u1"));
        assert!(store.get_session_record(&view.id).unwrap().is_some());
        assert_eq!(reg.active_count().await, 0);
        assert!(matches!(
            reg.finish(&store, &view.id, Utc::now()).await,
            Err(WorkoutError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn failed_save_keeps_workout_registered() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("db").to_str().unwrap()).unwrap();
        let reg = registry(4);
        let start = Utc::now();
        let view = reg.start(Some("u1".into()), start).await.unwrap();

        // 同 id 的记录已存在，保存会冲突
        let handle = reg.get(&view.id).await.unwrap();
        let data = handle.lock().await.tracker.snapshot().session;
        let existing = SessionRecord::from_session(view.id.clone(), None, &data, start);
        store.create_session_record(&existing).unwrap();

        let result = reg.finish(&store, &view.id, start + Duration::seconds(5)).await;
        assert!(matches!(
            result,
            Err(WorkoutError::Store(StoreError::Conflict { .. }))
        ));
        assert_eq!(reg.active_count().await, 1);
        assert!(reg.get(&view.id).await.is_ok());
        assert_eq!(reg.idle_since(Utc::now() + Duration::seconds(1)).await, vec![view.id.clone()]);

        store.delete_session_record(&view.id).unwrap();
        let finished = reg
            .finish(&store, &view.id, start + Duration::seconds(9))
            .await
            .unwrap();
        // 第一次尝试已冻结结束时间
        assert_eq!(finished.session.duration, 5);
        assert_eq!(reg.active_count().await, 0);
    }

    #[tokio::test]
    async fn idle_detection_uses_last_activity() {
        let reg = registry(4);
        let t0 = Utc::now() - Duration::minutes(30);
        let stale = reg.start(None, t0).await.unwrap();
        let fresh = reg.start(None, t0).await.unwrap();

        let handle = reg.get(&fresh.id).await.unwrap();
        handle
            .lock()
            .await
            .process(&LandmarkSet::default(), 1, Utc::now());

        let idle = reg.idle_since(Utc::now() - Duration::minutes(10)).await;
        assert_eq!(idle, vec![stale.id]);
    }
}
