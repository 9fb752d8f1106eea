use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_AUDIO_DEBOUNCE_MS, DEFAULT_BODY_ALIGNMENT_THRESHOLD_DEG,
    DEFAULT_ELBOW_DOWN_THRESHOLD_DEG, DEFAULT_ELBOW_UP_THRESHOLD_DEG, DEFAULT_HAND_WIDTH_TOLERANCE,
    DEFAULT_REPS_PER_SUCCESS_CUE, DEFAULT_REP_DEBOUNCE_MS, DEFAULT_VISIBILITY_THRESHOLD,
};

/// Every push-up threshold the classifier and counter read. Nothing below is hard-coded
/// elsewhere; the service loads these from the environment at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormThresholds {
    /// Average elbow angle below this is the bottom of the rep.
    pub elbow_down_deg: f64,
    /// Average elbow angle above this is the top of the rep.
    pub elbow_up_deg: f64,
    /// Allowed deviation of wrist/shoulder width ratio from 1.0.
    pub hand_width_tolerance: f64,
    /// Allowed deviation of the torso line from vertical, in degrees.
    pub body_alignment_deg: f64,
    pub visibility: f64,
    pub rep_debounce_ms: u64,
    pub audio_debounce_ms: u64,
    pub reps_per_success_cue: u32,
    #[serde(default)]
    pub position: PositionThresholds,
}

impl Default for FormThresholds {
    fn default() -> Self {
        Self {
            elbow_down_deg: DEFAULT_ELBOW_DOWN_THRESHOLD_DEG,
            elbow_up_deg: DEFAULT_ELBOW_UP_THRESHOLD_DEG,
            hand_width_tolerance: DEFAULT_HAND_WIDTH_TOLERANCE,
            body_alignment_deg: DEFAULT_BODY_ALIGNMENT_THRESHOLD_DEG,
            visibility: DEFAULT_VISIBILITY_THRESHOLD,
            rep_debounce_ms: DEFAULT_REP_DEBOUNCE_MS,
            audio_debounce_ms: DEFAULT_AUDIO_DEBOUNCE_MS,
            reps_per_success_cue: DEFAULT_REPS_PER_SUCCESS_CUE,
            position: PositionThresholds::default(),
        }
    }
}

/// Camera-setup bounds, all in normalized frame units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionThresholds {
    pub shoulder_center_min: f64,
    pub shoulder_center_max: f64,
    pub shoulder_width_min: f64,
    pub shoulder_width_max: f64,
}

impl Default for PositionThresholds {
    fn default() -> Self {
        Self {
            shoulder_center_min: 0.3,
            shoulder_center_max: 0.7,
            shoulder_width_min: 0.15,
            shoulder_width_max: 0.35,
        }
    }
}

impl FormThresholds {
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=180.0).contains(&self.elbow_down_deg) {
            return Err("elbow_down_deg must be in [0,180]".to_string());
        }
        if !(0.0..=180.0).contains(&self.elbow_up_deg) {
            return Err("elbow_up_deg must be in [0,180]".to_string());
        }
        if self.elbow_down_deg >= self.elbow_up_deg {
            return Err("elbow_down_deg must be below elbow_up_deg".to_string());
        }
        if !(0.0..=1.0).contains(&self.hand_width_tolerance) {
            return Err("hand_width_tolerance must be in [0,1]".to_string());
        }
        if !(0.0..=90.0).contains(&self.body_alignment_deg) {
            return Err("body_alignment_deg must be in [0,90]".to_string());
        }
        if !(0.0..=1.0).contains(&self.visibility) {
            return Err("visibility must be in [0,1]".to_string());
        }
        if self.reps_per_success_cue == 0 {
            return Err("reps_per_success_cue must be >= 1".to_string());
        }
        let pos = &self.position;
        if pos.shoulder_center_min > pos.shoulder_center_max {
            return Err("position.shoulder_center_min must not exceed shoulder_center_max".to_string());
        }
        if pos.shoulder_width_min > pos.shoulder_width_max {
            return Err("position.shoulder_width_min must not exceed shoulder_width_max".to_string());
        }
        Ok(())
    }
}
