//! 俯卧撑计数状态机
//!
//! 两状态迟滞：WaitingForDown → (VALID_DOWN) → WaitingForUp → (VALID_UP) → 计一次标准动作。
//! 有效状态转换与 INVALID_FORM 计数共用同一个"上次状态变化时间"做防抖。
//!
//! 调用方必须按时间顺序串行调用 `process_frame`；时间戳倒退时视为零间隔，不做纠正。

use serde::{Deserialize, Serialize};

use crate::pose::form::{FormState, FormVerdict};
use crate::pose::thresholds::FormThresholds;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CounterState {
    #[default]
    WaitingForDown,
    WaitingForUp,
}

/// 音效触发信号，读取一次即清除
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AudioTrigger {
    Success,
    Failure,
    #[default]
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepCounts {
    pub correct_reps: u32,
    pub incorrect_reps: u32,
    pub total_attempts: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepCounterOutput {
    #[serde(flatten)]
    pub counts: RepCounts,
    pub audio_trigger: AudioTrigger,
}

#[derive(Debug, Clone)]
pub struct RepCounter {
    rep_debounce_ms: u64,
    audio_debounce_ms: u64,
    reps_per_success_cue: u32,
    state: CounterState,
    counts: RepCounts,
    last_state_change_ms: Option<u64>,
    last_audio_ms: Option<u64>,
    pending_audio: AudioTrigger,
}

impl Default for RepCounter {
    fn default() -> Self {
        Self::new(&FormThresholds::default())
    }
}

fn elapsed_since(last: Option<u64>, now: u64, window: u64) -> bool {
    match last {
        None => true,
        Some(last) => now.saturating_sub(last) >= window,
    }
}

impl RepCounter {
    pub fn new(thresholds: &FormThresholds) -> Self {
        Self {
            rep_debounce_ms: thresholds.rep_debounce_ms,
            audio_debounce_ms: thresholds.audio_debounce_ms,
            reps_per_success_cue: thresholds.reps_per_success_cue.max(1),
            state: CounterState::WaitingForDown,
            counts: RepCounts::default(),
            last_state_change_ms: None,
            last_audio_ms: None,
            pending_audio: AudioTrigger::None,
        }
    }

    pub fn state(&self) -> CounterState {
        self.state
    }

    pub fn counts(&self) -> RepCounts {
        self.counts
    }

    /// 不清除音效信号的查看
    pub fn pending_audio(&self) -> AudioTrigger {
        self.pending_audio
    }

    pub fn process_frame(&mut self, verdict: &FormVerdict, timestamp_ms: u64) {
        let debounced = !elapsed_since(self.last_state_change_ms, timestamp_ms, self.rep_debounce_ms);

        match (verdict.state, self.state) {
            (FormState::InvalidForm, _) => {
                if debounced {
                    return;
                }
                self.counts.incorrect_reps += 1;
                self.counts.total_attempts += 1;
                self.last_state_change_ms = Some(timestamp_ms);
                tracing::debug!(
                    incorrect = self.counts.incorrect_reps,
                    timestamp_ms,
                    "Incorrect rep attempt recorded"
                );
                self.arm_audio(AudioTrigger::Failure, timestamp_ms);
            }
            (FormState::ValidDown, CounterState::WaitingForDown) => {
                if debounced {
                    return;
                }
                self.state = CounterState::WaitingForUp;
                self.last_state_change_ms = Some(timestamp_ms);
                tracing::debug!(timestamp_ms, "Down phase reached");
            }
            (FormState::ValidUp, CounterState::WaitingForUp) => {
                if debounced {
                    return;
                }
                self.counts.correct_reps += 1;
                self.counts.total_attempts += 1;
                self.state = CounterState::WaitingForDown;
                self.last_state_change_ms = Some(timestamp_ms);
                tracing::debug!(
                    correct = self.counts.correct_reps,
                    timestamp_ms,
                    "Rep completed"
                );
                if self.counts.correct_reps % self.reps_per_success_cue == 0 {
                    self.arm_audio(AudioTrigger::Success, timestamp_ms);
                }
            }
            _ => {}
        }
    }

    fn arm_audio(&mut self, trigger: AudioTrigger, timestamp_ms: u64) {
        if elapsed_since(self.last_audio_ms, timestamp_ms, self.audio_debounce_ms) {
            self.pending_audio = trigger;
            self.last_audio_ms = Some(timestamp_ms);
        }
    }

    /// 当前计数与待播放音效；音效信号随之清除
    pub fn output(&mut self) -> RepCounterOutput {
        let audio_trigger = std::mem::take(&mut self.pending_audio);
        RepCounterOutput {
            counts: self.counts,
            audio_trigger,
        }
    }

    pub fn reset(&mut self) {
        self.state = CounterState::WaitingForDown;
        self.counts = RepCounts::default();
        self.last_state_change_ms = None;
        self.last_audio_ms = None;
        self.pending_audio = AudioTrigger::None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::geometry::ElbowAngles;

    fn verdict(state: FormState) -> FormVerdict {
        FormVerdict {
            state,
            elbow_angles: ElbowAngles::default(),
            hand_width_ratio: 1.0,
            hand_width_correct: true,
            body_alignment: 0.0,
            body_alignment_correct: true,
            errors: Vec::new(),
            confidence: 0.9,
        }
    }

    fn counter() -> RepCounter {
        RepCounter::new(&FormThresholds::default())
    }

    #[test]
    fn full_cycle_counts_one_rep() {
        let mut c = counter();
        c.process_frame(&verdict(FormState::ValidUp), 1_000);
        c.process_frame(&verdict(FormState::ValidDown), 1_400);
        assert_eq!(c.state(), CounterState::WaitingForUp);
        c.process_frame(&verdict(FormState::ValidUp), 1_800);
        assert_eq!(c.state(), CounterState::WaitingForDown);
        let counts = c.counts();
        assert_eq!(counts.correct_reps, 1);
        assert_eq!(counts.total_attempts, 1);
        assert_eq!(counts.incorrect_reps, 0);
    }

    #[test]
    fn transitions_inside_debounce_collapse() {
        let mut c = counter();
        c.process_frame(&verdict(FormState::ValidUp), 1_000);
        c.process_frame(&verdict(FormState::ValidDown), 1_100);
        c.process_frame(&verdict(FormState::ValidUp), 1_200);
        // 第一次下沉不受防抖限制，之后的上撑在窗口内被丢弃
        assert_eq!(c.counts().correct_reps, 0);
        assert_eq!(c.counts().total_attempts, 0);
    }

    #[test]
    fn first_transition_is_not_debounced_at_time_zero() {
        let mut c = counter();
        c.process_frame(&verdict(FormState::ValidDown), 0);
        assert_eq!(c.state(), CounterState::WaitingForUp);
    }

    #[test]
    fn exact_debounce_boundary_is_allowed() {
        let mut c = counter();
        c.process_frame(&verdict(FormState::ValidDown), 1_000);
        c.process_frame(&verdict(FormState::ValidUp), 1_300);
        assert_eq!(c.counts().correct_reps, 1);
    }

    #[test]
    fn invalid_form_counts_once_per_window() {
        let mut c = counter();
        c.process_frame(&verdict(FormState::ValidDown), 1_000);
        for t in [1_400, 1_450, 1_500, 1_650] {
            c.process_frame(&verdict(FormState::InvalidForm), t);
        }
        assert_eq!(c.state(), CounterState::WaitingForUp);
        assert_eq!(c.counts().incorrect_reps, 1);
        assert_eq!(c.counts().total_attempts, 1);

        c.process_frame(&verdict(FormState::InvalidForm), 1_700);
        assert_eq!(c.counts().incorrect_reps, 2);
        assert_eq!(c.state(), CounterState::WaitingForUp);
    }

    #[test]
    fn invalid_form_arms_failure_once() {
        let mut c = counter();
        c.process_frame(&verdict(FormState::InvalidForm), 500);
        assert_eq!(c.output().audio_trigger, AudioTrigger::Failure);
        assert_eq!(c.output().audio_trigger, AudioTrigger::None);

        // 计数间隔已过，音效间隔未过
        c.process_frame(&verdict(FormState::InvalidForm), 900);
        assert_eq!(c.counts().incorrect_reps, 2);
        assert_eq!(c.output().audio_trigger, AudioTrigger::None);
    }

    #[test]
    fn partial_and_missing_frames_are_ignored() {
        let mut c = counter();
        c.process_frame(&verdict(FormState::ValidDown), 1_000);
        c.process_frame(&verdict(FormState::PartialRep), 2_000);
        c.process_frame(&verdict(FormState::NotDetected), 3_000);
        assert_eq!(c.state(), CounterState::WaitingForUp);
        assert_eq!(c.counts(), RepCounts::default());
    }

    #[test]
    fn success_cue_every_fifth_rep() {
        let mut c = counter();
        let mut t = 0;
        let mut cues = Vec::new();
        for _ in 0..10 {
            t += 2_000;
            c.process_frame(&verdict(FormState::ValidDown), t);
            t += 2_000;
            c.process_frame(&verdict(FormState::ValidUp), t);
            cues.push(c.output().audio_trigger);
        }
        assert_eq!(c.counts().correct_reps, 10);
        let successes: Vec<usize> = cues
            .iter()
            .enumerate()
            .filter(|(_, a)| **a == AudioTrigger::Success)
            .map(|(i, _)| i + 1)
            .collect();
        assert_eq!(successes, vec![5, 10]);
        assert_eq!(c.output().audio_trigger, AudioTrigger::None);
    }

    #[test]
    fn backwards_timestamp_is_treated_as_tie() {
        let mut c = counter();
        c.process_frame(&verdict(FormState::ValidDown), 5_000);
        c.process_frame(&verdict(FormState::ValidUp), 4_000);
        assert_eq!(c.counts().correct_reps, 0);
        assert_eq!(c.state(), CounterState::WaitingForUp);
    }

    #[test]
    fn reset_clears_everything() {
        let mut c = counter();
        c.process_frame(&verdict(FormState::InvalidForm), 100);
        c.process_frame(&verdict(FormState::ValidDown), 1_000);
        c.reset();
        assert_eq!(c.state(), CounterState::WaitingForDown);
        assert_eq!(c.counts(), RepCounts::default());
        assert_eq!(c.pending_audio(), AudioTrigger::None);
        c.process_frame(&verdict(FormState::ValidDown), 1_001);
        assert_eq!(c.state(), CounterState::WaitingForUp);
    }

    #[test]
    fn output_serializes_flat() {
        let mut c = counter();
        c.process_frame(&verdict(FormState::InvalidForm), 0);
        let json = serde_json::to_value(c.output()).unwrap();
        assert_eq!(json["incorrectReps"], 1);
        assert_eq!(json["totalAttempts"], 1);
        assert_eq!(json["audioTrigger"], "FAILURE");
    }
}
