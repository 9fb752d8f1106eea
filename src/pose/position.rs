//! 开始训练前的机位检查：人是否居中、距离镜头是否合适

use serde::{Deserialize, Serialize};

use crate::pose::geometry;
use crate::pose::landmarks::{LandmarkSet, PoseLandmark};
use crate::pose::thresholds::PositionThresholds;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PositionQuality {
    Good,
    Poor,
    NotDetected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SetupStatus {
    Positioning,
    Ready,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionCheck {
    pub status: SetupStatus,
    pub quality: PositionQuality,
    pub message: String,
    pub can_proceed: bool,
    /// 双肩中点横坐标，未检测到时为 None
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shoulder_center_x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shoulder_width: Option<f64>,
}

pub fn check_position(
    landmarks: &LandmarkSet,
    thresholds: &PositionThresholds,
    visibility: f64,
) -> PositionCheck {
    let (Some(left), Some(right)) = (
        landmarks.visible(PoseLandmark::LeftShoulder, visibility),
        landmarks.visible(PoseLandmark::RightShoulder, visibility),
    ) else {
        return PositionCheck {
            status: SetupStatus::Positioning,
            quality: PositionQuality::NotDetected,
            message: "Position yourself in front of the camera".to_string(),
            can_proceed: false,
            shoulder_center_x: None,
            shoulder_width: None,
        };
    };

    let (center_x, _) = geometry::midpoint(left, right);
    let width = geometry::distance(left, right);
    let centered =
        center_x >= thresholds.shoulder_center_min && center_x <= thresholds.shoulder_center_max;
    let good_distance =
        width >= thresholds.shoulder_width_min && width <= thresholds.shoulder_width_max;

    if centered && good_distance {
        return PositionCheck {
            status: SetupStatus::Ready,
            quality: PositionQuality::Good,
            message: "Perfect! You're ready to start".to_string(),
            can_proceed: true,
            shoulder_center_x: Some(center_x),
            shoulder_width: Some(width),
        };
    }

    // 先纠正左右，再纠正远近
    let hint = if !centered {
        if center_x < thresholds.shoulder_center_min {
            "Move to the right"
        } else {
            "Move to the left"
        }
    } else if width < thresholds.shoulder_width_min {
        "Move closer to the camera"
    } else {
        "Move farther from the camera"
    };

    PositionCheck {
        status: SetupStatus::Positioning,
        quality: PositionQuality::Poor,
        message: format!("Adjust your position: {hint}"),
        can_proceed: false,
        shoulder_center_x: Some(center_x),
        shoulder_width: Some(width),
    }
}
