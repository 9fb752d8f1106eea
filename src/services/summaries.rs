use crate::pose::session::SessionSummary;
use crate::store::operations::session_records::SessionRecord;
use crate::store::{Store, StoreError};

/// 已存储记录的汇总；有用户且标准动作数严格高于该用户其余所有记录时为个人最佳
pub fn summarize_record(store: &Store, record: &SessionRecord) -> Result<SessionSummary, StoreError> {
    let summary = SessionSummary::compute(
        record.correct_reps,
        record.incorrect_reps,
        record.total_reps,
        record.duration,
        &record.errors,
    );

    let is_personal_best = match record.user_id.as_deref() {
        Some(user_id) if record.correct_reps > 0 => store
            .best_correct_reps_for_user(user_id, &record.id)?
            .map_or(true, |best| record.correct_reps > best),
        _ => false,
    };

    Ok(summary.with_personal_best(is_personal_best))
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use tempfile::tempdir;

    use super::*;
    use crate::pose::form::FormErrorKind;

    fn record(id: &str, user: Option<&str>, correct: u32, incorrect: u32) -> SessionRecord {
        let now = Utc::now();
        SessionRecord {
            id: id.to_string(),
            user_id: user.map(str::to_string),
            total_reps: correct + incorrect,
            correct_reps: correct,
            incorrect_reps: incorrect,
            duration: 90,
            errors: vec![FormErrorKind::BodyAlignment, FormErrorKind::BodyAlignment],
            started_at: now - Duration::seconds(90),
            ended_at: Some(now),
            created_at: now,
        }
    }

    #[test]
    fn first_record_with_reps_is_personal_best() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("db").to_str().unwrap()).unwrap();
        let r = record("a", Some("u1"), 8, 2);
        store.create_session_record(&r).unwrap();

        let summary = summarize_record(&store, &r).unwrap();
        assert_eq!(summary.success_rate, 80);
        assert_eq!(summary.error_breakdown.body_alignment, 2);
        assert!(summary.is_personal_best);
    }

    #[test]
    fn ties_and_anonymous_records_are_not_personal_best() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("db").to_str().unwrap()).unwrap();
        let a = record("a", Some("u1"), 8, 0);
        let b = record("b", Some("u1"), 8, 1);
        store.create_session_record(&a).unwrap();
        store.create_session_record(&b).unwrap();
        assert!(!summarize_record(&store, &b).unwrap().is_personal_best);

        let anon = record("c", None, 30, 0);
        store.create_session_record(&anon).unwrap();
        assert!(!summarize_record(&store, &anon).unwrap().is_personal_best);

        let zero = record("d", Some("u2"), 0, 3);
        store.create_session_record(&zero).unwrap();
        assert!(!summarize_record(&store, &zero).unwrap().is_personal_best);
    }
}
