//! 俯卧撑动作分类
//!
//! 每帧独立判定，不跨帧保存状态：
//! - 肘角平均值决定处于底部 / 顶部 / 中间区间
//! - 手宽、躯干对齐只产生 WARNING，不阻止计数
//! - 只有 ERROR 级别的诊断才会把有效状态变成 INVALID_FORM

use serde::{Deserialize, Serialize};

use crate::pose::geometry::{self, ElbowAngles};
use crate::pose::landmarks::{Landmark, LandmarkSet, PoseLandmark};
use crate::pose::thresholds::FormThresholds;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FormState {
    NotDetected,
    PartialRep,
    ValidDown,
    ValidUp,
    InvalidForm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FormErrorKind {
    ElbowAngle,
    HandWidth,
    BodyAlignment,
    RomIncomplete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    /// 提示性，不影响状态
    Warning,
    /// 阻止 VALID_UP / VALID_DOWN
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormError {
    #[serde(rename = "type")]
    pub kind: FormErrorKind,
    pub severity: Severity,
    pub message: String,
}

impl FormError {
    pub fn warning(kind: FormErrorKind, message: &str) -> Self {
        Self {
            kind,
            severity: Severity::Warning,
            message: message.to_string(),
        }
    }

    pub fn error(kind: FormErrorKind, message: &str) -> Self {
        Self {
            kind,
            severity: Severity::Error,
            message: message.to_string(),
        }
    }

    pub fn is_blocking(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// 单帧判定结果，作为只读快照交给 UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormVerdict {
    pub state: FormState,
    pub elbow_angles: ElbowAngles,
    /// 腕距 / 肩宽
    pub hand_width_ratio: f64,
    pub hand_width_correct: bool,
    /// 躯干线偏离竖直方向的角度（度）
    pub body_alignment: f64,
    pub body_alignment_correct: bool,
    pub errors: Vec<FormError>,
    pub confidence: f64,
}

impl FormVerdict {
    fn not_detected(confidence: f64) -> Self {
        Self {
            state: FormState::NotDetected,
            elbow_angles: ElbowAngles::default(),
            hand_width_ratio: 0.0,
            hand_width_correct: false,
            body_alignment: 0.0,
            body_alignment_correct: false,
            errors: Vec::new(),
            confidence,
        }
    }
}

struct Check {
    value: f64,
    correct: bool,
    error: Option<FormError>,
}

/// 俯卧撑动作分类器
///
/// `classify` 是纯函数：相同输入总是得到相同的判定，从不失败。
#[derive(Debug, Clone, Default)]
pub struct FormClassifier {
    thresholds: FormThresholds,
}

impl FormClassifier {
    pub fn new(thresholds: FormThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &FormThresholds {
        &self.thresholds
    }

    pub fn classify(&self, landmarks: &LandmarkSet) -> FormVerdict {
        let t = &self.thresholds;
        let confidence = self.confidence(landmarks);

        let visible = |lm: PoseLandmark| landmarks.visible(lm, t.visibility);
        let (
            Some(left_shoulder),
            Some(right_shoulder),
            Some(_),
            Some(_),
            Some(left_wrist),
            Some(right_wrist),
        ) = (
            visible(PoseLandmark::LeftShoulder),
            visible(PoseLandmark::RightShoulder),
            visible(PoseLandmark::LeftElbow),
            visible(PoseLandmark::RightElbow),
            visible(PoseLandmark::LeftWrist),
            visible(PoseLandmark::RightWrist),
        )
        else {
            return FormVerdict::not_detected(confidence);
        };

        let elbow_angles = geometry::elbow_angles(landmarks, t.visibility);
        let hand = self.check_hand_width(left_shoulder, right_shoulder, left_wrist, right_wrist);
        let body = match (
            visible(PoseLandmark::LeftHip),
            visible(PoseLandmark::RightHip),
        ) {
            (Some(left_hip), Some(right_hip)) => {
                self.check_body_alignment(left_shoulder, right_shoulder, left_hip, right_hip)
            }
            // 髋部不可见不扣分
            _ => Check {
                value: 0.0,
                correct: true,
                error: None,
            },
        };

        let mut errors: Vec<FormError> = hand.error.into_iter().chain(body.error).collect();
        let state = self.resolve_state(elbow_angles.average, &mut errors);

        FormVerdict {
            state,
            elbow_angles,
            hand_width_ratio: hand.value,
            hand_width_correct: hand.correct,
            body_alignment: body.value,
            body_alignment_correct: body.correct,
            errors,
            confidence,
        }
    }

    /// 由平均肘角和 ERROR 级诊断决定状态；处于两阈值之间时追加 ROM_INCOMPLETE
    fn resolve_state(&self, average: f64, errors: &mut Vec<FormError>) -> FormState {
        let t = &self.thresholds;
        let blocked = errors.iter().any(FormError::is_blocking);

        if average == 0.0 {
            FormState::NotDetected
        } else if average < t.elbow_down_deg {
            if blocked {
                FormState::InvalidForm
            } else {
                FormState::ValidDown
            }
        } else if average > t.elbow_up_deg {
            if blocked {
                FormState::InvalidForm
            } else {
                FormState::ValidUp
            }
        } else {
            errors.push(FormError::warning(
                FormErrorKind::RomIncomplete,
                "Complete the full range of motion",
            ));
            FormState::PartialRep
        }
    }

    /// 腕距与肩宽之比应落在 1.0 ± tolerance 内
    fn check_hand_width(
        &self,
        left_shoulder: &Landmark,
        right_shoulder: &Landmark,
        left_wrist: &Landmark,
        right_wrist: &Landmark,
    ) -> Check {
        let shoulder_width = geometry::distance(left_shoulder, right_shoulder);
        if shoulder_width == 0.0 {
            return Check {
                value: 0.0,
                correct: false,
                error: None,
            };
        }

        let ratio = geometry::distance(left_wrist, right_wrist) / shoulder_width;
        let min_ratio = 1.0 - self.thresholds.hand_width_tolerance;
        let max_ratio = 1.0 + self.thresholds.hand_width_tolerance;
        let correct = ratio >= min_ratio && ratio <= max_ratio;

        let error = (!correct).then(|| {
            let message = if ratio < min_ratio {
                "Hands too close together"
            } else {
                "Hands too far apart"
            };
            FormError::warning(FormErrorKind::HandWidth, message)
        });

        Check {
            value: ratio,
            correct,
            error,
        }
    }

    /// 肩中点到髋中点连线与水平方向夹角，再取与 90° 的偏差
    fn check_body_alignment(
        &self,
        left_shoulder: &Landmark,
        right_shoulder: &Landmark,
        left_hip: &Landmark,
        right_hip: &Landmark,
    ) -> Check {
        let (shoulder_x, shoulder_y) = geometry::midpoint(left_shoulder, right_shoulder);
        let (hip_x, hip_y) = geometry::midpoint(left_hip, right_hip);

        let dx = (hip_x - shoulder_x).abs();
        let dy = (hip_y - shoulder_y).abs();
        let from_horizontal = dy.atan2(dx).to_degrees();
        let deviation = (90.0 - from_horizontal).abs();
        let correct = deviation <= self.thresholds.body_alignment_deg;

        Check {
            value: deviation,
            correct,
            error: (!correct)
                .then(|| FormError::warning(FormErrorKind::BodyAlignment, "Keep your body straight")),
        }
    }

    fn confidence(&self, landmarks: &LandmarkSet) -> f64 {
        let scores: Vec<f64> = PoseLandmark::TRACKED
            .iter()
            .filter_map(|lm| landmarks.visible(*lm, self.thresholds.visibility))
            .map(|p| p.visibility)
            .collect();
        if scores.is_empty() {
            return 0.0;
        }
        scores.iter().sum::<f64>() / scores.len() as f64
    }
}
