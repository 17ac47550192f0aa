use crate::shared::errors::{AppError, ErrorSeverity};
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Response, StatusCode};
use serde_json::{json, Value};

/// JSONレスポンスを作成する
///
/// # 引数
/// * `status` - HTTPステータスコード
/// * `body` - レスポンスボディ
pub fn json_response(status: StatusCode, body: Value) -> Response<String> {
    let mut response = Response::new(body.to_string());
    *response.status_mut() = status;
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("application/json; charset=utf-8"),
    );
    response
}

/// `{"error": message}` 形式のエラーレスポンスを作成する
pub fn error_body(status: StatusCode, message: &str) -> Response<String> {
    json_response(status, json!({ "error": message }))
}

/// AppErrorをHTTPレスポンスへ変換する
///
/// 内部エラーの場合は `internal_message` を返し、詳細はログにのみ出力する。
///
/// # 引数
/// * `error` - 発生したエラー
/// * `internal_message` - 500系の場合にクライアントへ返すメッセージ
pub fn error_response(error: &AppError, internal_message: &str) -> Response<String> {
    match error.severity() {
        ErrorSeverity::Low => log::warn!("リクエストを拒否しました: {}", error.details()),
        _ => log::error!("リクエスト処理に失敗しました: {}", error.details()),
    }

    let message = if error.is_internal() {
        internal_message
    } else {
        error.user_message()
    };

    error_body(error.status_code(), message)
}
