pub mod features;
pub mod routes;
pub mod server;
pub mod shared;

use server::HttpServer;
use shared::config::{
    initialize_application, initialize_logging_system, load_environment_variables,
    log_initialization_complete, AppConfig,
};
use shared::database::Database;
use shared::errors::AppResult;

/// サーバーを起動し、シャットダウンシグナルを受け取るまで実行する
///
/// # 処理内容
/// 1. .envファイルの読み込みとログシステムの初期化
/// 2. 設定の読み込みと検証
/// 3. データベースの初期化
/// 4. HTTPサーバーの起動
pub async fn run() -> AppResult<()> {
    load_environment_variables();
    initialize_logging_system();

    log::info!("アプリケーション初期化を開始します...");

    let config = AppConfig::from_env()?;
    config.validate()?;
    log::info!("サーバー設定: {:?}", config.server.get_debug_info());

    let init = initialize_application(&config)?;
    let db = Database::open(&init.database_path).map_err(|e| {
        log::error!("データベースの初期化に失敗しました: {e}");
        e
    })?;
    log_initialization_complete(&init);

    let server = HttpServer::bind(config.server, db).await?;
    server.serve(shutdown_signal()).await?;

    log::info!("サーバーを停止しました");
    Ok(())
}

/// Ctrl-C を待機する
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("シャットダウンシグナルの待機に失敗しました: {e}");
        std::future::pending::<()>().await;
    }
}
