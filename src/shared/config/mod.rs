/// 環境変数と設定値の管理
pub mod environment;

/// 起動時の初期化処理
pub mod initialization;

pub use environment::{
    get_database_filename, get_environment, initialize_logging_system,
    load_environment_variables, parse_duration, AppConfig, DatabaseConfig, Environment,
    EnvironmentConfig, ServerConfig,
};
pub use initialization::{initialize_application, log_initialization_complete, InitializationResult};
