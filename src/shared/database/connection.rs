use crate::shared::errors::{AppError, AppResult};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// 書き込みロック待ちの上限時間
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// user_id 省略時に割り当てる UUID v4 形式の文字列を生成するSQL式
const RANDOM_UUID_SQL: &str = "(lower(hex(randomblob(4))) || '-' || lower(hex(randomblob(2))) || '-4' || substr(lower(hex(randomblob(2))), 2) || '-' || substr('89ab', 1 + (abs(random()) % 4), 1) || substr(lower(hex(randomblob(2))), 2) || '-' || lower(hex(randomblob(6))))";

/// 共有データベースハンドル
///
/// 起動時に一度だけ作成し、サーバーへ明示的に渡す。クローンは同じ接続を共有する。
/// rusqlite の呼び出しはブロッキングのため、[`Database::run`] で
/// tokio のブロッキングスレッドプール上で実行する。
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// ファイルデータベースを開き、テーブルを作成する
    ///
    /// # 引数
    /// * `path` - データベースファイルのパス
    ///
    /// # 戻り値
    /// データベースハンドル、または失敗時はエラー
    pub fn open(path: &Path) -> AppResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self::from_connection(conn)?;
        log::info!("データベースを初期化しました: {path:?}");
        Ok(db)
    }

    /// メモリデータベースを開き、テーブルを作成する
    pub fn open_in_memory() -> AppResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> AppResult<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        create_tables(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 接続をロックした状態でクロージャを実行する
    ///
    /// # 引数
    /// * `operation` - 接続を受け取るデータベース操作
    ///
    /// # 戻り値
    /// 操作の結果、またはロック・タスク失敗時はエラー
    pub async fn run<F, T>(&self, operation: F) -> AppResult<T>
    where
        F: FnOnce(&Connection) -> AppResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|e| AppError::concurrency(format!("データベースロックエラー: {e}")))?;
            operation(&guard)
        })
        .await
        .map_err(|e| AppError::concurrency(format!("データベースタスクの実行に失敗: {e}")))?
    }
}

/// データベーステーブルを作成する
///
/// 何度実行しても同じ結果になる。
///
/// # 引数
/// * `conn` - データベース接続
///
/// # 戻り値
/// 成功時はOk(())、失敗時はエラー
pub fn create_tables(conn: &Connection) -> AppResult<()> {
    create_subscriptions_table(conn)?;
    create_indexes(conn)?;
    Ok(())
}

/// サブスクリプションテーブルを作成する
fn create_subscriptions_table(conn: &Connection) -> AppResult<()> {
    let sql = format!(
        "CREATE TABLE IF NOT EXISTS subscriptions (
            id TEXT PRIMARY KEY NOT NULL,
            service_name TEXT NOT NULL,
            price INTEGER NOT NULL CHECK (price > 0),
            user_id TEXT NOT NULL DEFAULT {RANDOM_UUID_SQL},
            start_date TEXT NOT NULL,
            end_date TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )"
    );

    conn.execute(&sql, [])?;

    Ok(())
}

/// インデックスを作成する
fn create_indexes(conn: &Connection) -> AppResult<()> {
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_subscriptions_user_id ON subscriptions(user_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_subscriptions_service_name ON subscriptions(service_name)",
        [],
    )?;

    Ok(())
}
