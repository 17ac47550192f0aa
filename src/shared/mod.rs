/// 共有エラー型とエラーハンドリング
pub mod errors;

/// 共有データベース接続管理
pub mod database;

/// 共有設定管理
pub mod config;

/// HTTPレスポンスのユーティリティ
pub mod http;

// 便利な再エクスポート
pub use config::{
    initialize_application, initialize_logging_system, load_environment_variables,
    log_initialization_complete, AppConfig, Environment, EnvironmentConfig, ServerConfig,
};
pub use database::{create_tables, Database};
pub use errors::{AppError, AppResult, ErrorSeverity};
