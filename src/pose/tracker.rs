//! 单次训练的逐帧流水线
//!
//! landmarks → FormClassifier → RepCounter → SessionAggregator，单向传递。
//! 一个 `WorkoutTracker` 只能由一个调用方按时间顺序驱动。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::pose::form::{FormClassifier, FormVerdict};
use crate::pose::landmarks::LandmarkSet;
use crate::pose::rep_counter::{CounterState, RepCounter, RepCounterOutput, RepCounts};
use crate::pose::session::{SessionAggregator, SessionData, SessionSummary};
use crate::pose::source::{FrameClock, LandmarkSource, SourceError};
use crate::pose::thresholds::FormThresholds;

/// 一帧的处理结果：给 UI 的判定 + 计数与音效信号
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameOutcome {
    pub timestamp_ms: u64,
    pub verdict: FormVerdict,
    pub reps: RepCounterOutput,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerSnapshot {
    pub counter_state: CounterState,
    pub counts: RepCounts,
    pub frames_processed: u64,
    pub last_frame_ms: Option<u64>,
    pub session: SessionData,
}

#[derive(Debug, Clone)]
pub struct WorkoutTracker {
    classifier: FormClassifier,
    counter: RepCounter,
    aggregator: SessionAggregator,
    clock: FrameClock,
    frames_processed: u64,
    last_frame_ms: Option<u64>,
}

impl WorkoutTracker {
    pub fn start(thresholds: FormThresholds, now: DateTime<Utc>) -> Self {
        let counter = RepCounter::new(&thresholds);
        Self {
            classifier: FormClassifier::new(thresholds),
            counter,
            aggregator: SessionAggregator::start(now),
            clock: FrameClock::new(),
            frames_processed: 0,
            last_frame_ms: None,
        }
    }

    pub fn process(&mut self, landmarks: &LandmarkSet, timestamp_ms: u64) -> FrameOutcome {
        let verdict = self.classifier.classify(landmarks);
        self.counter.process_frame(&verdict, timestamp_ms);
        let reps = self.counter.output();

        self.aggregator
            .update_reps(reps.counts.correct_reps, reps.counts.incorrect_reps);
        for error in &verdict.errors {
            self.aggregator.add_error(error.kind);
        }

        self.frames_processed += 1;
        self.last_frame_ms = Some(timestamp_ms);

        FrameOutcome {
            timestamp_ms,
            verdict,
            reps,
        }
    }

    /// 从后端取一帧并处理。没有检测到人时按空关键点集处理（NOT_DETECTED）。
    pub fn pull_frame<S: LandmarkSource + ?Sized>(
        &mut self,
        source: &mut S,
        now_ms: u64,
    ) -> Result<FrameOutcome, SourceError> {
        let timestamp_ms = self.clock.next(now_ms);
        let landmarks = source.detect(timestamp_ms)?.unwrap_or_default();
        Ok(self.process(&landmarks, timestamp_ms))
    }

    pub fn snapshot(&self) -> TrackerSnapshot {
        TrackerSnapshot {
            counter_state: self.counter.state(),
            counts: self.counter.counts(),
            frames_processed: self.frames_processed,
            last_frame_ms: self.last_frame_ms,
            session: self.aggregator.snapshot(),
        }
    }

    pub fn end(&mut self, now: DateTime<Utc>) -> (SessionData, SessionSummary) {
        let data = self.aggregator.end(now);
        (data, self.aggregator.summary())
    }

    /// 丢弃进度，重新开始计数
    pub fn restart(&mut self, now: DateTime<Utc>) {
        self.counter.reset();
        self.aggregator.restart(now);
        self.clock.reset();
        self.frames_processed = 0;
        self.last_frame_ms = None;
    }

    pub fn thresholds(&self) -> &FormThresholds {
        self.classifier.thresholds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::form::fixtures::pushup_pose;
    use crate::pose::form::{FormErrorKind, FormState};
    use crate::pose::rep_counter::AudioTrigger;
    use crate::pose::source::ReplaySource;
    use chrono::Duration;

    fn tracker() -> WorkoutTracker {
        WorkoutTracker::start(FormThresholds::default(), Utc::now())
    }

    #[test]
    fn down_up_cycle_counts_and_aggregates() {
        let mut t = tracker();
        let down = pushup_pose(70.0, 1.0);
        let up = pushup_pose(170.0, 1.0);

        assert_eq!(t.process(&up, 1_000).verdict.state, FormState::ValidUp);
        assert_eq!(t.process(&down, 1_500).verdict.state, FormState::ValidDown);
        let outcome = t.process(&up, 2_000);
        assert_eq!(outcome.reps.counts.correct_reps, 1);

        let snap = t.snapshot();
        assert_eq!(snap.counter_state, CounterState::WaitingForDown);
        assert_eq!(snap.session.correct_reps, 1);
        assert_eq!(snap.session.total_reps, 1);
        assert_eq!(snap.frames_processed, 3);
        assert_eq!(snap.last_frame_ms, Some(2_000));
    }

    #[test]
    fn warnings_are_tagged_every_frame() {
        let mut t = tracker();
        let partial = pushup_pose(130.0, 2.0);
        t.process(&partial, 1_000);
        t.process(&partial, 1_100);
        let errors = t.snapshot().session.errors;
        assert_eq!(
            errors,
            vec![
                FormErrorKind::HandWidth,
                FormErrorKind::RomIncomplete,
                FormErrorKind::HandWidth,
                FormErrorKind::RomIncomplete,
            ]
        );
    }

    #[test]
    fn five_reps_fire_one_success_cue() {
        let mut t = tracker();
        let down = pushup_pose(80.0, 1.0);
        let up = pushup_pose(170.0, 1.0);
        let mut ts = 0;
        let mut cues = 0;
        for _ in 0..5 {
            ts += 1_500;
            t.process(&down, ts);
            ts += 1_500;
            if t.process(&up, ts).reps.audio_trigger == AudioTrigger::Success {
                cues += 1;
            }
        }
        assert_eq!(cues, 1);
        let (data, summary) = t.end(Utc::now() + Duration::seconds(20));
        assert_eq!(data.correct_reps, 5);
        assert_eq!(summary.success_rate, 100);
        assert!(data.duration >= 19);
    }

    #[test]
    fn pull_frame_uses_strictly_increasing_timestamps() {
        let mut t = tracker();
        let mut source = ReplaySource::new([
            Some(pushup_pose(70.0, 1.0)),
            None,
            Some(pushup_pose(170.0, 1.0)),
        ]);
        let a = t.pull_frame(&mut source, 0).unwrap();
        let b = t.pull_frame(&mut source, 0).unwrap();
        let c = t.pull_frame(&mut source, 0).unwrap();
        assert_eq!((a.timestamp_ms, b.timestamp_ms, c.timestamp_ms), (1, 2, 3));
        assert_eq!(b.verdict.state, FormState::NotDetected);
        // 间隔小于防抖窗口，上撑不计数
        assert_eq!(c.reps.counts.correct_reps, 0);
    }

    #[test]
    fn restart_clears_progress() {
        let mut t = tracker();
        t.process(&pushup_pose(70.0, 1.0), 1_000);
        t.restart(Utc::now());
        let snap = t.snapshot();
        assert_eq!(snap.counter_state, CounterState::WaitingForDown);
        assert_eq!(snap.frames_processed, 0);
        assert!(snap.session.errors.is_empty());
    }
}
