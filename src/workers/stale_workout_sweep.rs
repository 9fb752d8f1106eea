use chrono::{DateTime, Duration, Utc};

use crate::store::Store;
use crate::workouts::{WorkoutError, WorkoutRegistry};

/// 超时上限 100 年，超出 chrono 可表示范围的配置值按此截断
const MAX_IDLE_TIMEOUT_SECS: u64 = 36_500 * 86_400;

/// 结束并保存空闲超时的训练，返回处理条数
pub async fn run(store: &Store, workouts: &WorkoutRegistry, idle_timeout_secs: u64) -> usize {
    sweep(store, workouts, idle_timeout_secs, Utc::now()).await
}

pub(crate) async fn sweep(
    store: &Store,
    workouts: &WorkoutRegistry,
    idle_timeout_secs: u64,
    now: DateTime<Utc>,
) -> usize {
    tracing::debug!("stale_workout_sweep: start");
    let cutoff = now - Duration::seconds(idle_timeout_secs.min(MAX_IDLE_TIMEOUT_SECS) as i64);
    let mut finished = 0usize;

    for id in workouts.idle_since(cutoff).await {
        match workouts.finish(store, &id, now).await {
            Ok(done) => {
                finished += 1;
                tracing::info!(
                    workout_id = %id,
                    correct = done.session.correct_reps,
                    "stale_workout_sweep: ended idle workout"
                );
            }
            // 扫描与显式结束之间的竞争，已被别处结束
            Err(WorkoutError::NotFound(_)) => {}
            Err(e) => tracing::error!(workout_id = %id, error = %e, "stale_workout_sweep failed"),
        }
    }

    tracing::info!(finished, "stale_workout_sweep: done");
    finished
}
