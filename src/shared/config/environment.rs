use crate::shared::errors::{AppError, AppResult};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// HTTPサーバーのデフォルト待ち受けアドレス
const DEFAULT_HTTP_ADDRESS: &str = "localhost:8080";

/// リクエスト処理のデフォルトタイムアウト
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(4);

/// アイドル接続のデフォルトタイムアウト
const DEFAULT_HTTP_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// アプリケーションの実行環境を表す列挙型
#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    /// 開発環境
    Development,
    /// プロダクション環境
    Production,
}

/// 環境設定を管理する構造体
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    /// 実行環境
    pub environment: String,
    /// ログレベル
    pub log_level: String,
}

impl EnvironmentConfig {
    /// 環境変数から設定を読み込む
    ///
    /// # 戻り値
    /// 環境設定
    pub fn from_env() -> Self {
        let environment = get_environment();
        let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| {
            if environment == Environment::Development {
                "debug".to_string()
            } else {
                "info".to_string()
            }
        });

        Self {
            environment: format!("{environment:?}").to_lowercase(),
            log_level,
        }
    }

    /// 開発環境かどうかを判定
    ///
    /// # 戻り値
    /// 開発環境の場合はtrue
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

/// HTTPサーバーの設定を管理する構造体
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// 待ち受けアドレス（host:port）
    pub address: String,
    /// 1リクエストあたりの処理タイムアウト
    pub request_timeout: Duration,
    /// キープアライブ接続のアイドルタイムアウト
    pub idle_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_HTTP_ADDRESS.to_string(),
            request_timeout: DEFAULT_HTTP_TIMEOUT,
            idle_timeout: DEFAULT_HTTP_IDLE_TIMEOUT,
        }
    }
}

impl ServerConfig {
    /// 変数の取得元を指定して設定を読み込む
    ///
    /// # 引数
    /// * `lookup` - 変数名から値を返す関数
    ///
    /// # 戻り値
    /// サーバー設定、または値が解析できない場合はエラー
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let address = lookup("HTTP_ADDRESS").unwrap_or_else(|| DEFAULT_HTTP_ADDRESS.to_string());

        let request_timeout = match lookup("HTTP_TIMEOUT") {
            Some(value) => parse_duration(&value).map_err(|e| {
                AppError::configuration(format!("HTTP_TIMEOUT の解析に失敗: {e}"))
            })?,
            None => DEFAULT_HTTP_TIMEOUT,
        };

        let idle_timeout = match lookup("HTTP_IDLE_TIMEOUT") {
            Some(value) => parse_duration(&value).map_err(|e| {
                AppError::configuration(format!("HTTP_IDLE_TIMEOUT の解析に失敗: {e}"))
            })?,
            None => DEFAULT_HTTP_IDLE_TIMEOUT,
        };

        Ok(Self {
            address,
            request_timeout,
            idle_timeout,
        })
    }

    /// 設定の妥当性をチェック
    pub fn validate(&self) -> Result<(), String> {
        if self.address.trim().is_empty() {
            return Err("HTTP_ADDRESS が空です".to_string());
        }
        if self.request_timeout.is_zero() {
            return Err("HTTP_TIMEOUT は0より大きい必要があります".to_string());
        }
        if self.idle_timeout.is_zero() {
            return Err("HTTP_IDLE_TIMEOUT は0より大きい必要があります".to_string());
        }
        Ok(())
    }

    /// デバッグ情報を取得
    pub fn get_debug_info(&self) -> HashMap<String, String> {
        let mut info = HashMap::new();
        info.insert("address".to_string(), self.address.clone());
        info.insert(
            "request_timeout_ms".to_string(),
            self.request_timeout.as_millis().to_string(),
        );
        info.insert(
            "idle_timeout_ms".to_string(),
            self.idle_timeout.as_millis().to_string(),
        );
        info
    }
}

/// データベースの設定を管理する構造体
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// SQLiteデータベースファイルのパス
    pub path: PathBuf,
}

impl DatabaseConfig {
    /// 変数の取得元を指定して設定を読み込む
    ///
    /// DATABASE_PATH が未設定の場合は環境に応じたファイル名を使用する。
    pub fn from_lookup<F>(lookup: F, env: Environment) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = lookup("DATABASE_PATH")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(get_database_filename(env)));

        Self { path }
    }
}

/// アプリケーション全体の設定
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: EnvironmentConfig,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
}

impl AppConfig {
    /// 環境変数から設定を読み込む
    ///
    /// # 戻り値
    /// アプリケーション設定、または解析失敗時はエラー
    pub fn from_env() -> AppResult<Self> {
        let lookup = |key: &str| std::env::var(key).ok();

        Ok(Self {
            environment: EnvironmentConfig::from_env(),
            server: ServerConfig::from_lookup(lookup)?,
            database: DatabaseConfig::from_lookup(lookup, get_environment()),
        })
    }

    /// 設定全体の妥当性をチェック
    pub fn validate(&self) -> AppResult<()> {
        self.server.validate().map_err(AppError::Configuration)?;

        if self.database.path.as_os_str().is_empty() {
            return Err(AppError::configuration("DATABASE_PATH が空です"));
        }

        Ok(())
    }
}

/// 期間文字列を解析する
///
/// `"4s"`、`"500ms"`、`"1m 30s"` などの humantime 形式と、単位なしの秒数（`"60"`）を受け付ける。
///
/// # 引数
/// * `value` - 期間文字列
///
/// # 戻り値
/// 解析された期間、または形式が不正・範囲外の場合はエラーメッセージ
pub fn parse_duration(value: &str) -> Result<Duration, String> {
    let value = value.trim();

    if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
        return value
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| format!("秒数として解析できません: {value:?} ({e})"));
    }

    humantime::parse_duration(value)
        .map_err(|e| format!("期間として解析できません: {value:?} ({e})"))
}

/// 現在の実行環境を判定する
///
/// # 戻り値
/// 現在の実行環境（Development または Production）
///
/// # 判定ロジック
/// 1. 実行時環境変数 ENVIRONMENT を確認
/// 2. デバッグビルドの場合は Development
/// 3. リリースビルドの場合は Production
pub fn get_environment() -> Environment {
    if let Ok(env_var) = std::env::var("ENVIRONMENT") {
        let env = match env_var.as_str() {
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        };
        log::debug!("環境判定: 実行時環境変数を使用 -> {env_var} -> {env:?}");
        return env;
    }

    // フォールバック: ビルド設定に基づく判定
    let env = if cfg!(debug_assertions) {
        Environment::Development
    } else {
        Environment::Production
    };
    log::debug!(
        "環境判定: ビルド設定を使用 -> debug_assertions={} -> {env:?}",
        cfg!(debug_assertions)
    );
    env
}

/// 環境に応じたデータベースファイル名を取得する
///
/// # ファイル名の規則
/// - 開発環境: "dev_subscriptions.db"
/// - プロダクション環境: "subscriptions.db"
pub fn get_database_filename(env: Environment) -> &'static str {
    match env {
        Environment::Development => "dev_subscriptions.db",
        Environment::Production => "subscriptions.db",
    }
}

/// 環境に応じた.envファイルを読み込む
///
/// 環境固有のファイルがない場合はデフォルトの.envにフォールバックする。
/// どちらもない場合は直接設定された環境変数のみを使用する。
pub fn load_environment_variables() {
    let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

    let env_file = match environment.as_str() {
        "production" | "prod" => ".env.production",
        _ => ".env",
    };

    log::info!("環境: {environment}, 読み込み対象: {env_file}");

    match dotenv::from_filename(env_file) {
        Ok(_) => {
            log::info!("{env_file}ファイルを読み込みました");
        }
        Err(_) => {
            if env_file != ".env" && dotenv::dotenv().is_ok() {
                log::warn!("{env_file}が見つからないため、デフォルトの.envファイルを読み込みました");
            } else {
                log::warn!("環境変数ファイルが見つかりません。直接設定された環境変数を使用します。");
            }
        }
    }
}

/// ログシステムを初期化する
///
/// # 処理内容
/// 1. 環境設定を取得
/// 2. ログレベルを設定
/// 3. env_loggerを初期化（開発環境ではログターゲットも出力）
pub fn initialize_logging_system() {
    let env_config = EnvironmentConfig::from_env();

    let log_level = match env_config.log_level.to_lowercase().as_str() {
        "error" => log::LevelFilter::Error,
        "warn" => log::LevelFilter::Warn,
        "info" => log::LevelFilter::Info,
        "debug" => log::LevelFilter::Debug,
        "trace" => log::LevelFilter::Trace,
        _ => log::LevelFilter::Info,
    };

    // 二重初期化はエラーになるため try_init を使う
    let result = env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .format_timestamp_secs()
        .format_module_path(false)
        .format_target(env_config.is_development())
        .try_init();

    if result.is_ok() {
        log::info!(
            "ログシステムを初期化しました: level={}, environment={}",
            env_config.log_level,
            env_config.environment
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_get_database_filename() {
        assert_eq!(
            get_database_filename(Environment::Development),
            "dev_subscriptions.db"
        );
        assert_eq!(
            get_database_filename(Environment::Production),
            "subscriptions.db"
        );
    }

    #[test]
    fn test_get_environment() {
        // 実際の値はビルド設定に依存する
        let env = get_environment();
        assert!(matches!(
            env,
            Environment::Development | Environment::Production
        ));
    }

    #[test]
    fn test_environment_config_methods() {
        let dev_config = EnvironmentConfig {
            environment: "development".to_string(),
            log_level: "debug".to_string(),
        };

        let prod_config = EnvironmentConfig {
            environment: "production".to_string(),
            log_level: "info".to_string(),
        };

        assert!(dev_config.is_development());
        assert!(!prod_config.is_development());
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("4s"), Ok(Duration::from_secs(4)));
        assert_eq!(parse_duration("60"), Ok(Duration::from_secs(60)));
        assert_eq!(parse_duration("250ms"), Ok(Duration::from_millis(250)));
        assert_eq!(parse_duration("2m"), Ok(Duration::from_secs(120)));
        assert_eq!(parse_duration(" 5s "), Ok(Duration::from_secs(5)));

        assert_eq!(parse_duration("1m 30s"), Ok(Duration::from_secs(90)));

        assert!(parse_duration("").is_err());
        assert!(parse_duration("s").is_err());
        assert!(parse_duration("10x").is_err());
        assert!(parse_duration("-1s").is_err());
    }

    #[test]
    fn test_parse_duration_rejects_overflow() {
        // 桁あふれはパニックせずエラーになる
        assert!(parse_duration("999999999999999999m").is_err());
        assert!(parse_duration("99999999999999999999").is_err());

        let result = ServerConfig::from_lookup(lookup_from(&[(
            "HTTP_IDLE_TIMEOUT",
            "999999999999999999m",
        )]));
        assert!(matches!(result, Err(AppError::Configuration(_))));
    }

    #[test]
    fn test_server_config_defaults() {
        let config = ServerConfig::from_lookup(lookup_from(&[])).unwrap();

        assert_eq!(config.address, "localhost:8080");
        assert_eq!(config.request_timeout, Duration::from_secs(4));
        assert_eq!(config.idle_timeout, Duration::from_secs(60));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_server_config_overrides() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            ("HTTP_ADDRESS", "0.0.0.0:9000"),
            ("HTTP_TIMEOUT", "10s"),
            ("HTTP_IDLE_TIMEOUT", "2m"),
        ]))
        .unwrap();

        assert_eq!(config.address, "0.0.0.0:9000");
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.idle_timeout, Duration::from_secs(120));

        let info = config.get_debug_info();
        assert_eq!(info.get("request_timeout_ms").unwrap(), "10000");
    }

    #[test]
    fn test_server_config_invalid_values() {
        let result = ServerConfig::from_lookup(lookup_from(&[("HTTP_TIMEOUT", "abc")]));
        assert!(matches!(result, Err(AppError::Configuration(_))));

        let zero = ServerConfig::from_lookup(lookup_from(&[("HTTP_IDLE_TIMEOUT", "0s")])).unwrap();
        assert!(zero.validate().is_err());

        let empty = ServerConfig::from_lookup(lookup_from(&[("HTTP_ADDRESS", "  ")])).unwrap();
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_database_config() {
        let default_config = DatabaseConfig::from_lookup(lookup_from(&[]), Environment::Production);
        assert_eq!(default_config.path, PathBuf::from("subscriptions.db"));

        let custom = DatabaseConfig::from_lookup(
            lookup_from(&[("DATABASE_PATH", "/var/lib/subs/data.db")]),
            Environment::Development,
        );
        assert_eq!(custom.path, PathBuf::from("/var/lib/subs/data.db"));

        let blank = DatabaseConfig::from_lookup(
            lookup_from(&[("DATABASE_PATH", "")]),
            Environment::Development,
        );
        assert_eq!(blank.path, PathBuf::from("dev_subscriptions.db"));
    }

    #[test]
    fn test_load_environment_variables() {
        // パニックしないことを確認
        load_environment_variables();
    }
}
