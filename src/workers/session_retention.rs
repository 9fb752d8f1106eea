use chrono::{DateTime, Duration, Utc};

use crate::store::Store;

pub async fn run(store: &Store, retention_days: u64) {
    let _ = purge(store, retention_days, Utc::now());
}

pub(crate) fn purge(store: &Store, retention_days: u64, now: DateTime<Utc>) -> usize {
    if retention_days == 0 {
        return 0;
    }
    tracing::debug!("session_retention: start");
    let cutoff = now - Duration::days(retention_days.min(36_500) as i64);
    match store.delete_session_records_before(cutoff) {
        Ok(count) => {
            tracing::info!(deleted = count, %cutoff, "session_retention: done");
            count
        }
        Err(e) => {
            tracing::error!(error = %e, "session_retention failed");
            0
        }
    }
}
