use crate::shared::config::AppConfig;
use crate::shared::errors::{AppError, AppResult};
use std::fs;
use std::path::{Path, PathBuf};

/// アプリケーション初期化の結果を表す構造体
#[derive(Debug)]
pub struct InitializationResult {
    /// 初回起動かどうか
    pub is_first_run: bool,
    /// データベースファイルのパス
    pub database_path: PathBuf,
    /// 実行環境
    pub environment: String,
}

/// アプリケーションの初期化を実行する
///
/// # 引数
/// * `config` - 読み込み済みのアプリケーション設定
///
/// # 戻り値
/// 初期化結果、または失敗時はエラー
///
/// # 処理内容
/// 1. データベースファイルの親ディレクトリの作成
/// 2. 初回起動の判定
pub fn initialize_application(config: &AppConfig) -> AppResult<InitializationResult> {
    let database_path = config.database.path.clone();

    ensure_parent_directory(&database_path)?;

    // 初回起動かどうかを判定（データベースファイルの存在で判定）
    let is_first_run = !database_path.exists();

    if is_first_run {
        log::info!("=== 初回起動 ===");
        log::info!("実行環境: {}", config.environment.environment);
        log::info!("データベースファイル: {database_path:?}");
    }

    Ok(InitializationResult {
        is_first_run,
        database_path,
        environment: config.environment.environment.clone(),
    })
}

/// データベースファイルの親ディレクトリを確実に作成する
fn ensure_parent_directory(database_path: &Path) -> AppResult<()> {
    let Some(parent) = database_path.parent() else {
        return Ok(());
    };

    if parent.as_os_str().is_empty() || parent.exists() {
        return Ok(());
    }

    fs::create_dir_all(parent).map_err(|e| {
        AppError::configuration(format!("データディレクトリの作成に失敗: {e}"))
    })?;
    log::info!("データディレクトリを作成しました: {parent:?}");

    Ok(())
}

/// 初期化完了ログを出力する
///
/// # 引数
/// * `result` - 初期化結果
pub fn log_initialization_complete(result: &InitializationResult) {
    if result.is_first_run {
        log::info!("初回起動の初期化が正常に完了しました");
    } else {
        log::info!("アプリケーション起動完了（既存データベースを使用）");
    }
    log::info!("環境: {}", result.environment);
    log::info!("データベース: {:?}", result.database_path);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::config::{DatabaseConfig, EnvironmentConfig, ServerConfig};
    use tempfile::TempDir;

    fn config_with_path(path: PathBuf) -> AppConfig {
        AppConfig {
            environment: EnvironmentConfig {
                environment: "development".to_string(),
                log_level: "debug".to_string(),
            },
            server: ServerConfig::default(),
            database: DatabaseConfig { path },
        }
    }

    #[test]
    fn test_initialize_creates_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let database_path = temp_dir.path().join("nested").join("subs.db");
        let config = config_with_path(database_path.clone());

        let result = initialize_application(&config).unwrap();

        assert!(result.is_first_run);
        assert_eq!(result.database_path, database_path);
        assert!(temp_dir.path().join("nested").exists());
    }

    #[test]
    fn test_initialize_detects_existing_database() {
        let temp_dir = TempDir::new().unwrap();
        let database_path = temp_dir.path().join("subs.db");
        fs::write(&database_path, b"").unwrap();

        let result = initialize_application(&config_with_path(database_path)).unwrap();

        assert!(!result.is_first_run);
        log_initialization_complete(&result);
    }

    #[test]
    fn test_initialize_with_bare_filename() {
        let result =
            initialize_application(&config_with_path(PathBuf::from("never_created_subs.db")))
                .unwrap();
        assert_eq!(result.environment, "development");
    }
}
