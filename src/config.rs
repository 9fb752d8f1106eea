use std::env;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

use crate::constants::{DEFAULT_MAX_ACTIVE_WORKOUTS, DEFAULT_WORKOUT_IDLE_TIMEOUT_SECS};
use crate::pose::thresholds::FormThresholds;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    pub enable_file_logs: bool,
    pub log_dir: String,
    pub sled_path: String,
    pub cors_origin: String,
    pub worker: WorkerConfig,
    pub workouts: WorkoutConfig,
    pub thresholds: FormThresholds,
}

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub is_leader: bool,
    /// 0 表示永久保留
    pub session_retention_days: u64,
}

#[derive(Debug, Clone)]
pub struct WorkoutConfig {
    pub max_active: usize,
    pub idle_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            host: env_or_parse("HOST", IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))),
            port: env_or_parse("PORT", 3000_u16),
            log_level: env_or("RUST_LOG", "info"),
            enable_file_logs: env_or_bool("ENABLE_FILE_LOGS", false),
            log_dir: env_or("LOG_DIR", "./logs"),
            sled_path: env_or("SLED_PATH", "./data/pushup.sled"),
            cors_origin: env_or("CORS_ORIGIN", "http://localhost:3000"),
            worker: WorkerConfig {
                is_leader: env_or_bool("WORKER_LEADER", true),
                session_retention_days: env_or_parse("SESSION_RETENTION_DAYS", 0_u64),
            },
            workouts: WorkoutConfig {
                max_active: env_or_parse("MAX_ACTIVE_WORKOUTS", DEFAULT_MAX_ACTIVE_WORKOUTS),
                idle_timeout_secs: env_or_parse(
                    "WORKOUT_IDLE_TIMEOUT_SECS",
                    DEFAULT_WORKOUT_IDLE_TIMEOUT_SECS,
                ),
            },
            thresholds: thresholds_from_env(),
        }
    }
}

fn thresholds_from_env() -> FormThresholds {
    let d = FormThresholds::default();
    FormThresholds {
        elbow_down_deg: env_or_parse("ELBOW_DOWN_THRESHOLD_DEG", d.elbow_down_deg),
        elbow_up_deg: env_or_parse("ELBOW_UP_THRESHOLD_DEG", d.elbow_up_deg),
        hand_width_tolerance: env_or_parse("HAND_WIDTH_TOLERANCE", d.hand_width_tolerance),
        body_alignment_deg: env_or_parse("BODY_ALIGNMENT_THRESHOLD_DEG", d.body_alignment_deg),
        visibility: env_or_parse("LANDMARK_VISIBILITY_THRESHOLD", d.visibility),
        rep_debounce_ms: env_or_parse("REP_DEBOUNCE_MS", d.rep_debounce_ms),
        audio_debounce_ms: env_or_parse("AUDIO_DEBOUNCE_MS", d.audio_debounce_ms),
        reps_per_success_cue: env_or_parse("REPS_PER_SUCCESS_CUE", d.reps_per_success_cue),
        position: d.position,
    }
}

pub fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

pub fn env_or_parse<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy,
{
    match env::var(key) {
        Ok(raw) => match raw.parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(
                    key,
                    value = %raw,
                    "Failed to parse env var, using default"
                );
                default
            }
        },
        Err(_) => default,
    }
}

pub fn env_or_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}
