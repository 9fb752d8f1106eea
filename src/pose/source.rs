//! 姿态估计后端抽象
//!
//! 分析核心只消费 `LandmarkSet`，不关心由哪个模型产生。`FallbackSource` 在主后端
//! 出错后永久切换到备用后端；`FrameClock` 为后端提供严格递增、非零的帧时间戳。

use std::collections::VecDeque;

use thiserror::Error;

use crate::pose::landmarks::LandmarkSet;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("pose backend unavailable: {0}")]
    Unavailable(String),
}

/// 一个姿态估计后端
pub trait LandmarkSource: Send {
    fn name(&self) -> &str;

    /// `Ok(None)` 表示本帧画面中没有人
    fn detect(&mut self, timestamp_ms: u64) -> Result<Option<LandmarkSet>, SourceError>;
}

impl<S: LandmarkSource + ?Sized> LandmarkSource for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn detect(&mut self, timestamp_ms: u64) -> Result<Option<LandmarkSet>, SourceError> {
        (**self).detect(timestamp_ms)
    }
}

/// 严格递增的帧时钟：`max(now, last + 1)`，首帧不小于 1
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    last_ms: u64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&mut self, now_ms: u64) -> u64 {
        let ts = now_ms.max(self.last_ms.saturating_add(1));
        self.last_ms = ts;
        ts
    }

    /// 后端实例重建后调用
    pub fn reset(&mut self) {
        self.last_ms = 0;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Active {
    Primary,
    Fallback,
}

pub struct FallbackSource<P, F> {
    primary: P,
    fallback: F,
    active: Active,
}

impl<P: LandmarkSource, F: LandmarkSource> FallbackSource<P, F> {
    pub fn new(primary: P, fallback: F) -> Self {
        Self {
            primary,
            fallback,
            active: Active::Primary,
        }
    }

    pub fn is_using_fallback(&self) -> bool {
        self.active == Active::Fallback
    }
}

impl<P: LandmarkSource, F: LandmarkSource> LandmarkSource for FallbackSource<P, F> {
    fn name(&self) -> &str {
        match self.active {
            Active::Primary => self.primary.name(),
            Active::Fallback => self.fallback.name(),
        }
    }

    fn detect(&mut self, timestamp_ms: u64) -> Result<Option<LandmarkSet>, SourceError> {
        if self.active == Active::Primary {
            match self.primary.detect(timestamp_ms) {
                Ok(frame) => return Ok(frame),
                Err(e) => {
                    tracing::warn!(
                        primary = self.primary.name(),
                        fallback = self.fallback.name(),
                        error = %e,
                        "Primary pose backend failed, switching to fallback"
                    );
                    self.active = Active::Fallback;
                }
            }
        }
        self.fallback.detect(timestamp_ms)
    }
}

/// 回放预先录制的帧序列，序列耗尽后返回 `Ok(None)`
#[derive(Debug, Clone, Default)]
pub struct ReplaySource {
    frames: VecDeque<Option<LandmarkSet>>,
}

impl ReplaySource {
    pub fn new(frames: impl IntoIterator<Item = Option<LandmarkSet>>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl LandmarkSource for ReplaySource {
    fn name(&self) -> &str {
        "replay"
    }

    fn detect(&mut self, _timestamp_ms: u64) -> Result<Option<LandmarkSet>, SourceError> {
        Ok(self.frames.pop_front().flatten())
    }
}
