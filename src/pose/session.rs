//! 单次训练的汇总
//!
//! 计数以 RepCounter 为准（每帧覆盖写入），错误标签逐帧追加、不去重。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::pose::form::FormErrorKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionData {
    pub total_reps: u32,
    pub correct_reps: u32,
    pub incorrect_reps: u32,
    /// 整秒
    pub duration: u64,
    pub errors: Vec<FormErrorKind>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
}

impl SessionData {
    fn empty(start_time: DateTime<Utc>) -> Self {
        Self {
            total_reps: 0,
            correct_reps: 0,
            incorrect_reps: 0,
            duration: 0,
            errors: Vec::new(),
            start_time,
            end_time: None,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.end_time.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBreakdown {
    pub elbow_angle: u32,
    pub hand_width: u32,
    pub body_alignment: u32,
    pub rom_incomplete: u32,
}

impl ErrorBreakdown {
    pub fn tally<'a>(errors: impl IntoIterator<Item = &'a FormErrorKind>) -> Self {
        let mut breakdown = Self::default();
        for kind in errors {
            match kind {
                FormErrorKind::ElbowAngle => breakdown.elbow_angle += 1,
                FormErrorKind::HandWidth => breakdown.hand_width += 1,
                FormErrorKind::BodyAlignment => breakdown.body_alignment += 1,
                FormErrorKind::RomIncomplete => breakdown.rom_incomplete += 1,
            }
        }
        breakdown
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub total_reps: u32,
    pub correct_reps: u32,
    pub incorrect_reps: u32,
    pub duration: u64,
    /// 0-100 的整数百分比
    pub success_rate: u32,
    pub error_breakdown: ErrorBreakdown,
    pub is_personal_best: bool,
}

impl SessionSummary {
    pub fn compute(
        correct_reps: u32,
        incorrect_reps: u32,
        total_reps: u32,
        duration: u64,
        errors: &[FormErrorKind],
    ) -> Self {
        Self {
            total_reps,
            correct_reps,
            incorrect_reps,
            duration,
            success_rate: success_rate(correct_reps, total_reps),
            error_breakdown: ErrorBreakdown::tally(errors),
            is_personal_best: false,
        }
    }

    pub fn with_personal_best(mut self, is_personal_best: bool) -> Self {
        self.is_personal_best = is_personal_best;
        self
    }
}

/// round(correct / total × 100)，total 为 0 时为 0
pub fn success_rate(correct: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    (f64::from(correct) / f64::from(total) * 100.0).round() as u32
}

#[derive(Debug, Clone)]
pub struct SessionAggregator {
    data: SessionData,
}

impl SessionAggregator {
    pub fn start(now: DateTime<Utc>) -> Self {
        Self {
            data: SessionData::empty(now),
        }
    }

    /// 重新开始；丢弃之前的一切
    pub fn restart(&mut self, now: DateTime<Utc>) {
        self.data = SessionData::empty(now);
    }

    pub fn update_reps(&mut self, correct: u32, incorrect: u32) {
        self.data.correct_reps = correct;
        self.data.incorrect_reps = incorrect;
        self.data.total_reps = correct + incorrect;
    }

    pub fn add_error(&mut self, kind: FormErrorKind) {
        self.data.errors.push(kind);
    }

    /// 结束训练并冻结结束时间，时长向下取整到秒。重复调用返回第一次的结果。
    pub fn end(&mut self, now: DateTime<Utc>) -> SessionData {
        if self.data.end_time.is_none() {
            let elapsed_ms = (now - self.data.start_time).num_milliseconds().max(0);
            self.data.duration = (elapsed_ms / 1000) as u64;
            self.data.end_time = Some(now);
        }
        self.data.clone()
    }

    pub fn snapshot(&self) -> SessionData {
        self.data.clone()
    }

    pub fn summary(&self) -> SessionSummary {
        let d = &self.data;
        SessionSummary::compute(
            d.correct_reps,
            d.incorrect_reps,
            d.total_reps,
            d.duration,
            &d.errors,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-05-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn update_reps_overwrites() {
        let mut agg = SessionAggregator::start(t0());
        agg.update_reps(3, 1);
        agg.update_reps(4, 1);
        let d = agg.snapshot();
        assert_eq!(d.correct_reps, 4);
        assert_eq!(d.incorrect_reps, 1);
        assert_eq!(d.total_reps, 5);
    }

    #[test]
    fn success_rate_rounds() {
        let mut agg = SessionAggregator::start(t0());
        agg.update_reps(8, 2);
        assert_eq!(agg.summary().success_rate, 80);
        agg.update_reps(2, 1);
        assert_eq!(agg.summary().success_rate, 67);
    }

    #[test]
    fn empty_session_has_zero_rate() {
        let agg = SessionAggregator::start(t0());
        let summary = agg.summary();
        assert_eq!(summary.total_reps, 0);
        assert_eq!(summary.success_rate, 0);
        assert_eq!(summary.error_breakdown, ErrorBreakdown::default());
    }

    #[test]
    fn errors_are_kept_per_frame() {
        let mut agg = SessionAggregator::start(t0());
        agg.add_error(FormErrorKind::HandWidth);
        agg.add_error(FormErrorKind::HandWidth);
        agg.add_error(FormErrorKind::RomIncomplete);
        assert_eq!(agg.snapshot().errors.len(), 3);
        let breakdown = agg.summary().error_breakdown;
        assert_eq!(breakdown.hand_width, 2);
        assert_eq!(breakdown.rom_incomplete, 1);
        assert_eq!(breakdown.body_alignment, 0);
    }

    #[test]
    fn end_floors_duration_and_freezes() {
        let mut agg = SessionAggregator::start(t0());
        let end = t0() + Duration::milliseconds(61_999);
        let data = agg.end(end);
        assert_eq!(data.duration, 61);
        assert_eq!(data.end_time, Some(end));

        let again = agg.end(end + Duration::seconds(30));
        assert_eq!(again.duration, 61);
        assert!(again.is_finished());
    }

    #[test]
    fn clock_going_backwards_yields_zero_duration() {
        let mut agg = SessionAggregator::start(t0());
        assert_eq!(agg.end(t0() - Duration::seconds(5)).duration, 0);
    }

    #[test]
    fn restart_discards_previous_data() {
        let mut agg = SessionAggregator::start(t0());
        agg.update_reps(5, 0);
        agg.add_error(FormErrorKind::BodyAlignment);
        agg.restart(t0() + Duration::minutes(1));
        let d = agg.snapshot();
        assert_eq!(d.total_reps, 0);
        assert!(d.errors.is_empty());
        assert_eq!(d.start_time, t0() + Duration::minutes(1));
    }
}
