use std::sync::Arc;

use axum::Router;
use tempfile::TempDir;
use tokio::sync::broadcast;

use pushup_coach::config::{Config, WorkerConfig, WorkoutConfig};
use pushup_coach::pose::thresholds::FormThresholds;
use pushup_coach::routes::build_router;
use pushup_coach::state::AppState;
use pushup_coach::store::Store;

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub config: Config,
    _temp_dir: TempDir,
}

async fn spawn_with_capacity(max_active: usize) -> TestApp {
    let temp_dir = tempfile::tempdir().expect("tempdir");
    let sled_path = temp_dir.path().join("pushup-test.sled");

    // 直接构造 Config，避免 set_var 在多线程测试中竞态
    let config = Config {
        host: std::net::IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
        port: 3000,
        log_level: "info".to_string(),
        enable_file_logs: false,
        log_dir: "./logs".to_string(),
        sled_path: sled_path.to_string_lossy().to_string(),
        cors_origin: "http://localhost:3000".to_string(),
        worker: WorkerConfig {
            is_leader: false,
            session_retention_days: 0,
        },
        workouts: WorkoutConfig {
            max_active,
            idle_timeout_secs: 600,
        },
        thresholds: FormThresholds::default(),
    };

    let store = Arc::new(Store::open(&config.sled_path).expect("open store"));
    store.run_migrations().expect("run migrations");

    let (shutdown_tx, _) = broadcast::channel::<()>(8);
    let state = AppState::new(store, &config, shutdown_tx);
    let app = build_router(state.clone());

    TestApp {
        app,
        state,
        config,
        _temp_dir: temp_dir,
    }
}

pub async fn spawn_test_app() -> TestApp {
    spawn_with_capacity(16).await
}

pub async fn spawn_test_app_with_capacity(max_active: usize) -> TestApp {
    spawn_with_capacity(max_active).await
}
