use serde_json::{json, Value};

use pushup_coach::pose::landmarks::{Landmark, LandmarkSet, PoseLandmark};

/// 对称俯卧撑姿态：肘角 `elbow_deg`，腕距为肩宽 `hand_ratio` 倍，躯干竖直
pub fn pushup_pose(elbow_deg: f64, hand_ratio: f64) -> LandmarkSet {
    let half_shoulder = 0.1;
    let shoulder_y = 0.3;
    let wrist_y = 0.6;

    let mut set = LandmarkSet::blank();
    for (sign, shoulder, elbow, wrist) in [
        (
            -1.0,
            PoseLandmark::LeftShoulder,
            PoseLandmark::LeftElbow,
            PoseLandmark::LeftWrist,
        ),
        (
            1.0,
            PoseLandmark::RightShoulder,
            PoseLandmark::RightElbow,
            PoseLandmark::RightWrist,
        ),
    ] {
        let sx = 0.5 + sign * half_shoulder;
        let wx = 0.5 + sign * half_shoulder * hand_ratio;
        let (vx, vy) = (wx - sx, wrist_y - shoulder_y);
        let d = (vx * vx + vy * vy).sqrt();
        let h = (d / 2.0) / (elbow_deg.to_radians() / 2.0).tan();
        let (mx, my) = ((sx + wx) / 2.0, (shoulder_y + wrist_y) / 2.0);
        set.set(shoulder, Landmark::new(sx, shoulder_y, 0.9));
        set.set(
            elbow,
            Landmark::new(mx + sign * h * vy / d, my - sign * h * vx / d, 0.9),
        );
        set.set(wrist, Landmark::new(wx, wrist_y, 0.9));
    }
    set.set(PoseLandmark::LeftHip, Landmark::new(0.4, 0.8, 0.8));
    set.set(PoseLandmark::RightHip, Landmark::new(0.6, 0.8, 0.8));
    set
}

pub fn up_pose() -> Value {
    serde_json::to_value(pushup_pose(170.0, 1.0)).expect("serialize pose")
}

pub fn down_pose() -> Value {
    serde_json::to_value(pushup_pose(80.0, 1.0)).expect("serialize pose")
}

pub fn frame(landmarks: Value, timestamp_ms: u64) -> Value {
    json!({ "landmarks": landmarks, "timestampMs": timestamp_ms })
}

pub fn session_payload(user_id: &str, correct: u32, incorrect: u32) -> Value {
    json!({
        "userId": user_id,
        "totalReps": correct + incorrect,
        "correctReps": correct,
        "incorrectReps": incorrect,
        "duration": 120,
        "errors": ["HAND_WIDTH", "ROM_INCOMPLETE", "HAND_WIDTH"],
        "startedAt": "2026-01-01T10:00:00Z",
        "endedAt": "2026-01-01T10:02:00Z",
    })
}
