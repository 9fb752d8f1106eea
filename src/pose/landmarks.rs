//! 人体关键点数据模型
//!
//! 关键点由外部姿态估计模型产生（MediaPipe 33 点编号）。本模块只负责承载数据，
//! 按固定解剖学编号读取，并在可见度低于阈值时将关键点视为缺失。

use serde::{Deserialize, Serialize};

/// MediaPipe Pose 输出的关键点总数
pub const LANDMARK_COUNT: usize = 33;

/// 俯卧撑分析用到的关键点编号
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PoseLandmark {
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
}

impl PoseLandmark {
    /// 分类所必需的六个上肢关键点
    pub const ARMS: [PoseLandmark; 6] = [
        PoseLandmark::LeftShoulder,
        PoseLandmark::RightShoulder,
        PoseLandmark::LeftElbow,
        PoseLandmark::RightElbow,
        PoseLandmark::LeftWrist,
        PoseLandmark::RightWrist,
    ];

    /// 参与置信度计算的八个关键点（上肢 + 双髋）
    pub const TRACKED: [PoseLandmark; 8] = [
        PoseLandmark::LeftShoulder,
        PoseLandmark::RightShoulder,
        PoseLandmark::LeftElbow,
        PoseLandmark::RightElbow,
        PoseLandmark::LeftWrist,
        PoseLandmark::RightWrist,
        PoseLandmark::LeftHip,
        PoseLandmark::RightHip,
    ];

    pub const fn index(self) -> usize {
        match self {
            Self::LeftShoulder => 11,
            Self::RightShoulder => 12,
            Self::LeftElbow => 13,
            Self::RightElbow => 14,
            Self::LeftWrist => 15,
            Self::RightWrist => 16,
            Self::LeftHip => 23,
            Self::RightHip => 24,
        }
    }
}

/// 单个关键点，坐标为画面归一化坐标 [0,1]
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    /// 相对深度，二维模型不提供
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f64>,
    /// 可见度 / 置信度 (0.0 - 1.0)
    #[serde(alias = "score")]
    pub visibility: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64, visibility: f64) -> Self {
        Self {
            x,
            y,
            z: None,
            visibility,
        }
    }

    pub fn is_visible(&self, threshold: f64) -> bool {
        self.visibility >= threshold
    }
}

/// 一帧的关键点集合，下标即稳定的解剖学编号
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LandmarkSet {
    points: Vec<Landmark>,
}

impl LandmarkSet {
    pub fn new(points: Vec<Landmark>) -> Self {
        Self { points }
    }

    /// 33 个不可见点组成的空骨架，测试和回放工具用它按编号逐个填充
    pub fn blank() -> Self {
        Self {
            points: vec![Landmark::default(); LANDMARK_COUNT],
        }
    }

    pub fn set(&mut self, landmark: PoseLandmark, point: Landmark) {
        let idx = landmark.index();
        if self.points.len() <= idx {
            self.points.resize(idx + 1, Landmark::default());
        }
        self.points[idx] = point;
    }

    pub fn get(&self, landmark: PoseLandmark) -> Option<&Landmark> {
        self.points.get(landmark.index())
    }

    /// 可见度达到阈值才返回，否则视为缺失
    pub fn visible(&self, landmark: PoseLandmark, threshold: f64) -> Option<&Landmark> {
        self.get(landmark).filter(|p| p.is_visible(threshold))
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Landmark] {
        &self.points
    }
}

impl From<Vec<Landmark>> for LandmarkSet {
    fn from(points: Vec<Landmark>) -> Self {
        Self::new(points)
    }
}
