/// 公共输入校验，供训练记录和实时训练路由共用。
use chrono::{DateTime, Utc};

use crate::constants::{DEFAULT_PAGE_SIZE, MAX_FRAMES_PER_BATCH, MAX_PAGE_SIZE};
use crate::pose::landmarks::{LandmarkSet, LANDMARK_COUNT};

/// 用户 id：1-64 字符，只允许字母、数字、下划线和连字符
pub fn validate_user_id(user_id: &str) -> Result<(), &'static str> {
    if user_id.is_empty() || user_id.len() > 64 {
        return Err("userId must be between 1 and 64 characters");
    }
    if !user_id
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
    {
        return Err("userId may only contain letters, digits, '_' and '-'");
    }
    Ok(())
}

pub fn validate_time_range(
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
) -> Result<(), &'static str> {
    match ended_at {
        Some(ended_at) if ended_at < started_at => Err("endedAt must not be before startedAt"),
        _ => Ok(()),
    }
}

/// 标准动作数和错误动作数都不能超过总数，否则成功率会超过 100%
pub fn validate_rep_counts(total: u32, correct: u32, incorrect: u32) -> Result<(), &'static str> {
    if correct > total {
        return Err("correctReps must not exceed totalReps");
    }
    if incorrect > total {
        return Err("incorrectReps must not exceed totalReps");
    }
    Ok(())
}

/// 单帧关键点：数量不超过模型输出，坐标与可见度为有限值且可见度在 [0,1]
pub fn validate_landmarks(landmarks: &LandmarkSet) -> Result<(), &'static str> {
    if landmarks.len() > LANDMARK_COUNT {
        return Err("landmarks must contain at most 33 points");
    }
    for point in landmarks.points() {
        if !(point.x.is_finite() && point.y.is_finite() && point.visibility.is_finite()) {
            return Err("landmark values must be finite numbers");
        }
        if !(0.0..=1.0).contains(&point.visibility) {
            return Err("landmark visibility must be within [0, 1]");
        }
    }
    Ok(())
}

pub fn validate_batch_size(frames: usize) -> Result<(), &'static str> {
    if frames == 0 {
        return Err("frames must not be empty");
    }
    if frames > MAX_FRAMES_PER_BATCH {
        return Err("too many frames in one batch");
    }
    Ok(())
}

/// 页码从 1 开始；每页数量限制在 [1, MAX_PAGE_SIZE]
pub fn normalize_pagination(page: Option<u64>, per_page: Option<u64>) -> (u64, u64) {
    let page = page.unwrap_or(1).max(1);
    let per_page = per_page
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    (page, per_page)
}
