use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sled::transaction::{ConflictableTransactionError, TransactionError};
use sled::Transactional;

use crate::pose::form::FormErrorKind;
use crate::pose::session::SessionData;
use crate::store::keys;
use crate::store::{Store, StoreError};

/// 一次已结束训练的持久化记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub total_reps: u32,
    pub correct_reps: u32,
    pub incorrect_reps: u32,
    /// 秒
    pub duration: u64,
    pub errors: Vec<FormErrorKind>,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn from_session(
        id: String,
        user_id: Option<String>,
        data: &SessionData,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            total_reps: data.total_reps,
            correct_reps: data.correct_reps,
            incorrect_reps: data.incorrect_reps,
            duration: data.duration,
            errors: data.errors.clone(),
            started_at: data.start_time,
            ended_at: data.end_time,
            created_at,
        }
    }
}

fn abort_to_store_error(error: TransactionError<StoreError>) -> StoreError {
    match error {
        TransactionError::Abort(store_error) => store_error,
        TransactionError::Storage(storage_error) => StoreError::Sled(storage_error),
    }
}

impl Store {
    pub fn create_session_record(&self, record: &SessionRecord) -> Result<(), StoreError> {
        if let Some(ended_at) = record.ended_at {
            if ended_at < record.started_at {
                return Err(StoreError::Validation(
                    "endedAt must not be before startedAt".to_string(),
                ));
            }
        }

        let ts = record.created_at.timestamp_millis();
        let key = keys::session_record_key(&record.id)?;
        let time_key = keys::session_by_time_key(ts, &record.id)?;
        let user_key = record
            .user_id
            .as_deref()
            .map(|user_id| {
                keys::session_by_user_key(user_id, record.started_at.timestamp_millis(), &record.id)
            })
            .transpose()?;
        let bytes = Self::serialize(record)?;

        (
            &self.session_records,
            &self.session_records_by_user,
            &self.session_records_by_time,
        )
            .transaction(|(tx_records, tx_by_user, tx_by_time)| {
                if tx_records.get(key.as_bytes())?.is_some() {
                    return Err(ConflictableTransactionError::Abort(StoreError::Conflict {
                        entity: "session".to_string(),
                        key: key.clone(),
                    }));
                }
                tx_records.insert(key.as_bytes(), bytes.as_slice())?;
                if let Some(user_key) = &user_key {
                    tx_by_user.insert(user_key.as_bytes(), &[] as &[u8])?;
                }
                tx_by_time.insert(time_key.as_bytes(), &[] as &[u8])?;
                Ok(())
            })
            .map_err(abort_to_store_error)?;

        tracing::debug!(
            session_id = %record.id,
            total_reps = record.total_reps,
            "Session record stored"
        );
        Ok(())
    }

    pub fn get_session_record(&self, record_id: &str) -> Result<Option<SessionRecord>, StoreError> {
        let key = keys::session_record_key(record_id)?;
        match self.session_records.get(key.as_bytes())? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    /// 按开始时间倒序
    pub fn list_session_records_for_user(
        &self,
        user_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<SessionRecord>, StoreError> {
        let prefix = keys::session_by_user_prefix(user_id)?;
        let mut records = Vec::with_capacity(limit.min(64));
        for item in self
            .session_records_by_user
            .scan_prefix(prefix.as_bytes())
            .skip(offset)
            .take(limit)
        {
            let (k, _) = item?;
            let Some(id) = keys::trailing_id(&k) else {
                continue;
            };
            if let Some(record) = self.get_session_record(&id)? {
                records.push(record);
            }
        }
        Ok(records)
    }

    pub fn count_session_records_for_user(&self, user_id: &str) -> Result<u64, StoreError> {
        let prefix = keys::session_by_user_prefix(user_id)?;
        let mut count = 0u64;
        for item in self.session_records_by_user.scan_prefix(prefix.as_bytes()) {
            let _ = item?;
            count += 1;
        }
        Ok(count)
    }

    /// 用户其余记录中的最高标准动作数，没有其他记录时为 None
    pub fn best_correct_reps_for_user(
        &self,
        user_id: &str,
        exclude_id: &str,
    ) -> Result<Option<u32>, StoreError> {
        let prefix = keys::session_by_user_prefix(user_id)?;
        let mut best: Option<u32> = None;
        for item in self.session_records_by_user.scan_prefix(prefix.as_bytes()) {
            let (k, _) = item?;
            let Some(id) = keys::trailing_id(&k) else {
                continue;
            };
            if id == exclude_id {
                continue;
            }
            if let Some(record) = self.get_session_record(&id)? {
                best = Some(best.map_or(record.correct_reps, |b| b.max(record.correct_reps)));
            }
        }
        Ok(best)
    }

    pub fn delete_session_record(&self, record_id: &str) -> Result<bool, StoreError> {
        let Some(record) = self.get_session_record(record_id)? else {
            return Ok(false);
        };

        let ts = record.created_at.timestamp_millis();
        let key = keys::session_record_key(&record.id)?;
        let time_key = keys::session_by_time_key(ts, &record.id)?;
        let user_key = record
            .user_id
            .as_deref()
            .map(|user_id| {
                keys::session_by_user_key(user_id, record.started_at.timestamp_millis(), &record.id)
            })
            .transpose()?;

        (
            &self.session_records,
            &self.session_records_by_user,
            &self.session_records_by_time,
        )
            .transaction(|(tx_records, tx_by_user, tx_by_time)| {
                tx_records.remove(key.as_bytes())?;
                if let Some(user_key) = &user_key {
                    tx_by_user.remove(user_key.as_bytes())?;
                }
                tx_by_time.remove(time_key.as_bytes())?;
                Ok(())
            })
            .map_err(abort_to_store_error)?;
        Ok(true)
    }

    /// 删除创建时间早于 `cutoff` 的记录，返回删除条数
    pub fn delete_session_records_before(&self, cutoff: DateTime<Utc>) -> Result<usize, StoreError> {
        let upper = keys::session_by_time_upper_bound(cutoff.timestamp_millis());
        let mut expired = Vec::new();
        for item in self.session_records_by_time.range(..upper.as_bytes()) {
            let (k, _) = item?;
            if let Some(id) = keys::trailing_id(&k) {
                expired.push((k, id));
            }
        }

        let mut deleted = 0usize;
        for (index_key, id) in expired {
            if self.delete_session_record(&id)? {
                deleted += 1;
            } else {
                // 主记录已不存在，清掉悬空索引
                self.session_records_by_time.remove(index_key)?;
            }
        }
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use tempfile::tempdir;

    use super::*;

    fn store() -> (tempfile::TempDir, Store) {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("db").to_str().unwrap()).unwrap();
        (dir, store)
    }

    fn record(id: &str, user: Option<&str>, correct: u32, created_at: DateTime<Utc>) -> SessionRecord {
        SessionRecord {
            id: id.to_string(),
            user_id: user.map(str::to_string),
            total_reps: correct + 1,
            correct_reps: correct,
            incorrect_reps: 1,
            duration: 60,
            errors: vec![FormErrorKind::HandWidth],
            started_at: created_at - Duration::seconds(60),
            ended_at: Some(created_at),
            created_at,
        }
    }

    #[test]
    fn create_and_get_roundtrip() {
        let (_dir, store) = store();
        let r = record("s1", Some("u1"), 8, Utc::now());
        store.create_session_record(&r).unwrap();
        assert_eq!(store.get_session_record("s1").unwrap(), Some(r));
        assert!(store.get_session_record("missing").unwrap().is_none());
    }

    #[test]
    fn duplicate_id_conflicts() {
        let (_dir, store) = store();
        let r = record("s1", None, 3, Utc::now());
        store.create_session_record(&r).unwrap();
        assert!(matches!(
            store.create_session_record(&r),
            Err(StoreError::Conflict { .. })
        ));
    }

    #[test]
    fn end_before_start_is_rejected() {
        let (_dir, store) = store();
        let mut r = record("s1", None, 3, Utc::now());
        r.ended_at = Some(r.started_at - Duration::seconds(1));
        assert!(matches!(
            store.create_session_record(&r),
            Err(StoreError::Validation(_))
        ));
    }

    #[test]
    fn user_listing_is_newest_first_and_paged() {
        let (_dir, store) = store();
        let base = Utc::now();
        for i in 0..5 {
            let r = record(&format!("s{i}"), Some("u1"), i, base + Duration::seconds(i as i64));
            store.create_session_record(&r).unwrap();
        }
        store
            .create_session_record(&record("other", Some("u2"), 50, base))
            .unwrap();

        assert_eq!(store.count_session_records_for_user("u1").unwrap(), 5);
        let page = store.list_session_records_for_user("u1", 2, 1).unwrap();
        let ids: Vec<_> = page.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["s3", "s2"]);
    }

    #[test]
    fn best_excludes_current_record() {
        let (_dir, store) = store();
        let now = Utc::now();
        store.create_session_record(&record("a", Some("u1"), 10, now)).unwrap();
        store
            .create_session_record(&record("b", Some("u1"), 12, now + Duration::seconds(1)))
            .unwrap();
        assert_eq!(store.best_correct_reps_for_user("u1", "b").unwrap(), Some(10));
        assert_eq!(store.best_correct_reps_for_user("u1", "a").unwrap(), Some(12));
        assert_eq!(store.best_correct_reps_for_user("nobody", "a").unwrap(), None);
    }

    #[test]
    fn retention_deletes_old_records_and_indexes() {
        let (_dir, store) = store();
        let now = Utc::now();
        store
            .create_session_record(&record("old", Some("u1"), 1, now - Duration::days(40)))
            .unwrap();
        store.create_session_record(&record("new", Some("u1"), 2, now)).unwrap();

        let deleted = store
            .delete_session_records_before(now - Duration::days(30))
            .unwrap();
        assert_eq!(deleted, 1);
        assert!(store.get_session_record("old").unwrap().is_none());
        assert_eq!(store.count_session_records_for_user("u1").unwrap(), 1);
        assert_eq!(store.session_records_by_time.len(), 1);
    }

    #[test]
    fn invalid_user_id_is_validation_error() {
        let (_dir, store) = store();
        let r = record("s1", Some("bad:user"), 1, Utc::now());
        assert!(matches!(
            store.create_session_record(&r),
            Err(StoreError::Validation(_))
        ));
        assert!(store.get_session_record("s1").unwrap().is_none());
    }
}
