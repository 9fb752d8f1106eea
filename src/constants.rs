/// 底部判定阈值：平均肘角低于此值（度）
pub const DEFAULT_ELBOW_DOWN_THRESHOLD_DEG: f64 = 110.0;

/// 顶部判定阈值：平均肘角高于此值（度）
pub const DEFAULT_ELBOW_UP_THRESHOLD_DEG: f64 = 150.0;

/// 腕距/肩宽比允许偏离 1.0 的幅度
pub const DEFAULT_HAND_WIDTH_TOLERANCE: f64 = 0.25;

/// 躯干偏离竖直方向的最大角度（度）
pub const DEFAULT_BODY_ALIGNMENT_THRESHOLD_DEG: f64 = 25.0;

/// 关键点可见度低于此值视为缺失
pub const DEFAULT_VISIBILITY_THRESHOLD: f64 = 0.5;

/// 两次计数之间的最短间隔（毫秒）
pub const DEFAULT_REP_DEBOUNCE_MS: u64 = 300;

/// 两次音效之间的最短间隔（毫秒）
pub const DEFAULT_AUDIO_DEBOUNCE_MS: u64 = 1_000;

/// 每完成多少个标准动作播放一次成功音效
pub const DEFAULT_REPS_PER_SUCCESS_CUE: u32 = 5;

/// 同时进行中的训练数量上限
pub const DEFAULT_MAX_ACTIVE_WORKOUTS: usize = 256;

/// 训练无新帧超过此时长（秒）即被清理
pub const DEFAULT_WORKOUT_IDLE_TIMEOUT_SECS: u64 = 600;

/// 单次批量上传帧数上限
pub const MAX_FRAMES_PER_BATCH: usize = 600;

/// 列表接口默认分页大小
pub const DEFAULT_PAGE_SIZE: u64 = 20;

/// 列表接口最大分页大小
pub const MAX_PAGE_SIZE: u64 = 100;

/// 每天毫秒数
pub const MILLIS_PER_DAY: i64 = 86_400_000;
