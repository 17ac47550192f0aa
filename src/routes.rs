use crate::features::subscriptions::handlers;
use crate::shared::database::Database;
use crate::shared::errors::{AppError, AppResult};
use crate::shared::http::error_body;
use http_body_util::{BodyExt, Limited};
use hyper::body::{Body, Bytes};
use hyper::{Method, Request, Response, StatusCode};

/// 受け付けるリクエストボディの最大サイズ
const MAX_BODY_BYTES: usize = 64 * 1024;

/// ルーティング結果
#[derive(Debug, PartialEq)]
enum Route<'a> {
    Create,
    Get(&'a str),
    Delete(&'a str),
    Update(&'a str),
    List,
}

/// メソッドとパスからルートを決定する
///
/// # 戻り値
/// 一致したルート、パスが未定義なら404、メソッド違いなら405
fn match_route<'a>(method: &Method, path: &'a str) -> Result<Route<'a>, StatusCode> {
    let (expected, route) = if path == "/new" {
        (Method::POST, Route::Create)
    } else if path == "/list" {
        (Method::GET, Route::List)
    } else if let Some(id) = path.strip_prefix("/get/") {
        (Method::GET, Route::Get(id))
    } else if let Some(id) = path.strip_prefix("/delete/") {
        (Method::DELETE, Route::Delete(id))
    } else if let Some(id) = path.strip_prefix("/update/") {
        (Method::PATCH, Route::Update(id))
    } else {
        return Err(StatusCode::NOT_FOUND);
    };

    if *method != expected {
        return Err(StatusCode::METHOD_NOT_ALLOWED);
    }

    Ok(route)
}

/// HTTPリクエストを対応するハンドラーへ振り分ける
///
/// # 引数
/// * `req` - HTTPリクエスト
/// * `db` - 共有データベースハンドル
///
/// # 戻り値
/// JSONレスポンス
pub async fn route<B>(req: Request<B>, db: &Database) -> Response<String>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(str::to_string);

    let route = match match_route(&method, &path) {
        Ok(route) => route,
        Err(StatusCode::METHOD_NOT_ALLOWED) => {
            log::debug!("未対応のメソッド: {method} {path}");
            return error_body(StatusCode::METHOD_NOT_ALLOWED, "method not allowed");
        }
        Err(status) => {
            log::debug!("未対応のリクエスト: {method} {path}");
            return error_body(status, "not found");
        }
    };

    match route {
        Route::Create => match read_body(req).await {
            Ok(body) => handlers::create_subscription(db, &body).await,
            Err(e) => error_body(e.status_code(), e.user_message()),
        },
        Route::Update(id) => match read_body(req).await {
            Ok(body) => handlers::update_subscription(db, id, &body).await,
            Err(e) => error_body(e.status_code(), e.user_message()),
        },
        Route::Get(id) => handlers::get_subscription(db, id).await,
        Route::Delete(id) => handlers::delete_subscription(db, id).await,
        Route::List => handlers::list_subscriptions(db, query.as_deref()).await,
    }
}

/// リクエストボディを上限サイズまで読み込む
async fn read_body<B>(req: Request<B>) -> AppResult<Bytes>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let collected = Limited::new(req.into_body(), MAX_BODY_BYTES)
        .collect()
        .await
        .map_err(|e| {
            log::warn!("リクエストボディの読み込みに失敗: {e}");
            AppError::malformed("failed to read request body")
        })?;

    Ok(collected.to_bytes())
}
