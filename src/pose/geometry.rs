//! 几何计算：关节角度与线段距离
//!
//! 全部为纯函数，无状态。角度为 0 表示"无法确定"，不是有效读数。

use serde::{Deserialize, Serialize};

use crate::pose::landmarks::{Landmark, LandmarkSet, PoseLandmark};

/// 左右肘角及其平均值（度）
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElbowAngles {
    pub left: f64,
    pub right: f64,
    pub average: f64,
}

impl ElbowAngles {
    /// 双侧均有效取均值，否则取有效的一侧，都无效为 0
    pub fn from_sides(left: f64, right: f64) -> Self {
        let average = if left > 0.0 && right > 0.0 {
            (left + right) / 2.0
        } else if left > 0.0 {
            left
        } else if right > 0.0 {
            right
        } else {
            0.0
        };
        Self {
            left,
            right,
            average,
        }
    }
}

/// 平面欧氏距离
pub fn distance(a: &Landmark, b: &Landmark) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    (dx * dx + dy * dy).sqrt()
}

pub fn midpoint(a: &Landmark, b: &Landmark) -> (f64, f64) {
    ((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
}

/// 余弦定理求 `vertex` 处的夹角（度，0-180）
///
/// 顶点与任一端点重合时返回 0。
pub fn angle(p1: &Landmark, vertex: &Landmark, p2: &Landmark) -> f64 {
    let a = distance(vertex, p1);
    let b = distance(vertex, p2);
    let c = distance(p1, p2);

    if a == 0.0 || b == 0.0 {
        return 0.0;
    }

    let cos_angle = ((a * a + b * b - c * c) / (2.0 * a * b)).clamp(-1.0, 1.0);
    cos_angle.acos().to_degrees()
}

fn side_angle(
    landmarks: &LandmarkSet,
    shoulder: PoseLandmark,
    elbow: PoseLandmark,
    wrist: PoseLandmark,
    threshold: f64,
) -> f64 {
    match (
        landmarks.visible(shoulder, threshold),
        landmarks.visible(elbow, threshold),
        landmarks.visible(wrist, threshold),
    ) {
        (Some(s), Some(e), Some(w)) => angle(s, e, w),
        _ => 0.0,
    }
}

/// 计算双侧肘角，任一关键点缺失或可见度不足的一侧记为 0
pub fn elbow_angles(landmarks: &LandmarkSet, visibility_threshold: f64) -> ElbowAngles {
    let left = side_angle(
        landmarks,
        PoseLandmark::LeftShoulder,
        PoseLandmark::LeftElbow,
        PoseLandmark::LeftWrist,
        visibility_threshold,
    );
    let right = side_angle(
        landmarks,
        PoseLandmark::RightShoulder,
        PoseLandmark::RightElbow,
        PoseLandmark::RightWrist,
        visibility_threshold,
    );
    ElbowAngles::from_sides(left, right)
}
