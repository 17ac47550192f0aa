use hyper::StatusCode;
use thiserror::Error;

/// アプリケーション全体で使用される統一エラー型
#[derive(Debug, Error)]
pub enum AppError {
    /// 指定IDのレコードが存在しない
    #[error("リソースが見つかりません: {0}")]
    NotFound(String),

    /// 終了日が開始日より前になっている
    #[error("無効な期間: end_date が start_date より前です")]
    InvalidDateRange,

    /// ID・リクエストボディ・クエリの形式エラー
    #[error("入力形式エラー: {0}")]
    MalformedInput(String),

    /// データベース関連のエラー
    #[error("データベースエラー: {0}")]
    Database(String),

    /// 設定関連のエラー
    #[error("設定エラー: {0}")]
    Configuration(String),

    /// I/O関連のエラー
    #[error("I/Oエラー: {0}")]
    Io(#[from] std::io::Error),

    /// 並行処理関連のエラー
    #[error("並行処理エラー: {0}")]
    Concurrency(String),
}

/// エラーの重要度を表す列挙型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// 低重要度（ユーザー入力エラーなど）
    Low,
    /// 中重要度（I/Oの一時的エラーなど）
    Medium,
    /// 高重要度（データベースエラーなど）
    High,
}

impl AppError {
    /// クライアントに返すためのメッセージを取得
    ///
    /// 内部エラーの詳細は含めない。
    ///
    /// # 戻り値
    /// レスポンスボディに含めてよいエラーメッセージ
    pub fn user_message(&self) -> &str {
        match self {
            AppError::NotFound(_) => "subscription not found",
            AppError::InvalidDateRange => "end_date can not be earlier than start_date",
            AppError::MalformedInput(msg) => msg,
            AppError::Database(_)
            | AppError::Configuration(_)
            | AppError::Io(_)
            | AppError::Concurrency(_) => "internal server error",
        }
    }

    /// エラーの詳細情報を取得
    ///
    /// # 戻り値
    /// エラーの詳細情報（ログ出力用）
    pub fn details(&self) -> String {
        format!("{self}")
    }

    /// エラーの重要度を取得
    ///
    /// # 戻り値
    /// エラーの重要度レベル
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            AppError::NotFound(_) => ErrorSeverity::Low,
            AppError::InvalidDateRange => ErrorSeverity::Low,
            AppError::MalformedInput(_) => ErrorSeverity::Low,
            AppError::Database(_) => ErrorSeverity::High,
            AppError::Configuration(_) => ErrorSeverity::High,
            AppError::Io(_) => ErrorSeverity::Medium,
            AppError::Concurrency(_) => ErrorSeverity::High,
        }
    }

    /// 対応するHTTPステータスコードを取得
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidDateRange | AppError::MalformedInput(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 内部エラー（500系）かどうかを判定
    pub fn is_internal(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// リソース未発見エラーを作成するヘルパー関数
    ///
    /// # 引数
    /// * `resource` - 見つからなかったリソースの説明
    ///
    /// # 戻り値
    /// リソース未発見エラー
    pub fn not_found<S: Into<String>>(resource: S) -> Self {
        AppError::NotFound(format!("{}が見つかりません", resource.into()))
    }

    /// 入力形式エラーを作成するヘルパー関数
    ///
    /// # 引数
    /// * `message` - クライアントに返すメッセージ
    ///
    /// # 戻り値
    /// 入力形式エラー
    pub fn malformed<S: Into<String>>(message: S) -> Self {
        AppError::MalformedInput(message.into())
    }

    /// 設定エラーを作成するヘルパー関数
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        AppError::Configuration(message.into())
    }

    /// 並行処理エラーを作成するヘルパー関数
    pub fn concurrency<S: Into<String>>(message: S) -> Self {
        AppError::Concurrency(message.into())
    }
}

/// rusqlite::ErrorからAppErrorへの変換
impl From<rusqlite::Error> for AppError {
    fn from(error: rusqlite::Error) -> Self {
        AppError::Database(error.to_string())
    }
}

/// Result型のエイリアス（アプリケーション全体で使用）
pub type AppResult<T> = Result<T, AppError>;
