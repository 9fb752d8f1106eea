//! 俯卧撑动作分析核心
//!
//! 同步、无 I/O。数据逐帧单向流动：
//! landmarks → geometry → form → rep_counter → session。

pub mod form;
pub mod geometry;
pub mod landmarks;
pub mod position;
pub mod rep_counter;
pub mod session;
pub mod source;
pub mod thresholds;
pub mod tracker;

pub use form::{FormClassifier, FormError, FormErrorKind, FormState, FormVerdict, Severity};
pub use geometry::ElbowAngles;
pub use landmarks::{Landmark, LandmarkSet, PoseLandmark};
pub use position::{check_position, PositionCheck, PositionQuality};
pub use rep_counter::{AudioTrigger, CounterState, RepCounter, RepCounterOutput, RepCounts};
pub use session::{ErrorBreakdown, SessionAggregator, SessionData, SessionSummary};
pub use source::{FallbackSource, FrameClock, LandmarkSource, ReplaySource, SourceError};
pub use thresholds::{FormThresholds, PositionThresholds};
pub use tracker::{FrameOutcome, TrackerSnapshot, WorkoutTracker};
