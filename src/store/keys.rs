use crate::store::StoreError;

const MAX_KEY_COMPONENT_LEN: usize = 128;

/// 键的各段以 `:` 拼接，因此组成部分不能为空也不能包含分隔符
fn validate_component(field: &str, value: &str) -> Result<(), StoreError> {
    if value.is_empty() {
        return Err(StoreError::Validation(format!("{field} must not be empty")));
    }
    if value.len() > MAX_KEY_COMPONENT_LEN {
        return Err(StoreError::Validation(format!(
            "{field} must be at most {MAX_KEY_COMPONENT_LEN} bytes"
        )));
    }
    if value.contains(':') {
        return Err(StoreError::Validation(format!(
            "{field} must not contain ':'"
        )));
    }
    Ok(())
}

fn reverse_ts(timestamp_ms: i64) -> u64 {
    u64::MAX - timestamp_ms.max(0) as u64
}

pub fn session_record_key(record_id: &str) -> Result<String, StoreError> {
    validate_component("id", record_id)?;
    Ok(record_id.to_string())
}

/// `{user}:{reverse_ts}:{id}`，前缀扫描即按时间倒序
pub fn session_by_user_key(
    user_id: &str,
    timestamp_ms: i64,
    record_id: &str,
) -> Result<String, StoreError> {
    validate_component("userId", user_id)?;
    validate_component("id", record_id)?;
    Ok(format!(
        "{}:{:020}:{}",
        user_id,
        reverse_ts(timestamp_ms),
        record_id
    ))
}

pub fn session_by_user_prefix(user_id: &str) -> Result<String, StoreError> {
    validate_component("userId", user_id)?;
    Ok(format!("{}:", user_id))
}

/// `{ts}:{id}`，正序，用于按创建时间清理
pub fn session_by_time_key(timestamp_ms: i64, record_id: &str) -> Result<String, StoreError> {
    validate_component("id", record_id)?;
    Ok(format!("{:020}:{}", timestamp_ms.max(0) as u64, record_id))
}

/// 早于 `timestamp_ms` 的索引键都小于此上界
pub fn session_by_time_upper_bound(timestamp_ms: i64) -> String {
    format!("{:020}:", timestamp_ms.max(0) as u64)
}

/// 从 `…:{id}` 形式的索引键中取出记录 id
pub fn trailing_id(index_key: &[u8]) -> Option<String> {
    let key = std::str::from_utf8(index_key).ok()?;
    key.rsplit(':').next().map(str::to_string)
}
