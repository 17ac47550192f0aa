use super::models::{
    CreateSubscriptionDto, ListFilter, Subscription, SubscriptionResponse, UpdateSubscriptionDto,
};
use super::repository;
use crate::shared::database::Database;
use crate::shared::errors::{AppError, AppResult};
use crate::shared::http::{error_response, json_response};
use hyper::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;
use uuid::Uuid;

/// サブスクリプションを作成する（POST /new）
///
/// # 引数
/// * `db` - 共有データベースハンドル
/// * `body` - JSONリクエストボディ
///
/// # 戻り値
/// 201 と作成されたID、または失敗時のエラーレスポンス
pub async fn create_subscription(db: &Database, body: &[u8]) -> Response<String> {
    match try_create(db, body).await {
        Ok(id) => {
            log::info!("サブスクリプションを作成しました: id={id}");
            json_response(
                StatusCode::CREATED,
                json!({ "status": "Success", "id": id }),
            )
        }
        Err(e) => error_response(&e, "failed to create new subscription"),
    }
}

/// IDでサブスクリプションを取得する（GET /get/{id}）
pub async fn get_subscription(db: &Database, raw_id: &str) -> Response<String> {
    match try_get(db, raw_id).await {
        Ok(sub) => {
            let body = SubscriptionResponse::from(&sub);
            log::debug!("サブスクリプションを取得しました: {body:?}");
            json_response(StatusCode::OK, json!({ "subscription": body }))
        }
        Err(e) => error_response(&e, "failed to get subscription, internal error"),
    }
}

/// サブスクリプションを削除する（DELETE /delete/{id}）
///
/// # 戻り値
/// 200 と削除されたサービス名、または失敗時のエラーレスポンス
pub async fn delete_subscription(db: &Database, raw_id: &str) -> Response<String> {
    match try_delete(db, raw_id).await {
        Ok(service_name) => {
            log::info!("サブスクリプションを削除しました: service_name={service_name}");
            json_response(
                StatusCode::OK,
                json!({ "status": "Success", "deleted_service": service_name }),
            )
        }
        Err(e) => error_response(&e, "internal server error"),
    }
}

/// サブスクリプションを部分更新する（PATCH /update/{id}）
pub async fn update_subscription(db: &Database, raw_id: &str, body: &[u8]) -> Response<String> {
    match try_update(db, raw_id, body).await {
        Ok(()) => {
            log::info!("サブスクリプションを更新しました: id={raw_id}");
            json_response(StatusCode::OK, json!({ "status": "success" }))
        }
        Err(e) => error_response(&e, "internal error"),
    }
}

/// サブスクリプション一覧を取得する（GET /list?user_id=&service_name=）
///
/// 該当なしの場合も200で空のリストを返す。
pub async fn list_subscriptions(db: &Database, query: Option<&str>) -> Response<String> {
    let filter = ListFilter::from_query(query);
    log::debug!("一覧取得のフィルター: {filter:?}");

    let result = db
        .run(move |conn| repository::find_all(conn, &filter))
        .await;

    match result {
        Ok(subs) => {
            log::info!("サブスクリプション一覧を取得しました: {}件", subs.len());
            let body: Vec<SubscriptionResponse> =
                subs.iter().map(SubscriptionResponse::from).collect();
            json_response(StatusCode::OK, json!({ "subscriptions": body }))
        }
        Err(e) => error_response(&e, "internal server error"),
    }
}

async fn try_create(db: &Database, body: &[u8]) -> AppResult<Uuid> {
    let dto: CreateSubscriptionDto = decode_body(body)?;
    dto.validate()?;
    log::debug!("リクエストボディを解析しました: {dto:?}");

    db.run(move |conn| repository::create(conn, dto)).await
}

async fn try_get(db: &Database, raw_id: &str) -> AppResult<Subscription> {
    let id = parse_id(raw_id)?;
    db.run(move |conn| repository::find_by_id(conn, id)).await
}

async fn try_delete(db: &Database, raw_id: &str) -> AppResult<String> {
    let id = parse_id(raw_id)?;
    db.run(move |conn| repository::delete(conn, id)).await
}

async fn try_update(db: &Database, raw_id: &str, body: &[u8]) -> AppResult<()> {
    let id = parse_id(raw_id)?;
    let dto: UpdateSubscriptionDto = decode_body(body)?;
    dto.validate()?;
    log::debug!("リクエストボディを解析しました: {dto:?}");

    db.run(move |conn| repository::update(conn, id, dto)).await
}

fn parse_id(raw_id: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw_id).map_err(|_| AppError::malformed("failed to parse id"))
}

fn decode_body<T: DeserializeOwned>(body: &[u8]) -> AppResult<T> {
    serde_json::from_slice(body).map_err(|e| {
        log::debug!("リクエストボディの解析に失敗: {e}");
        AppError::malformed("failed to decode request body")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn body_json(response: &Response<String>) -> Value {
        serde_json::from_str(response.body()).unwrap()
    }

    async fn create_netflix(db: &Database) -> String {
        let response = create_subscription(
            db,
            br#"{"service_name":"Netflix","price":500,"start_date":"2025-07"}"#,
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        body_json(&response)["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_create_then_get_round_trip() {
        let db = Database::open_in_memory().unwrap();
        let id = create_netflix(&db).await;

        let response = get_subscription(&db, &id).await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(&response);
        let sub = &json["subscription"];
        assert_eq!(sub["id"], id.as_str());
        assert_eq!(sub["service_name"], "Netflix");
        assert_eq!(sub["price"], 500);
        assert_eq!(sub["start_date"], "2025-07");
        assert_eq!(sub["end_date"], "2026-07");
        assert!(Uuid::parse_str(sub["user_id"].as_str().unwrap()).is_ok());
    }

    #[tokio::test]
    async fn test_create_error_mapping() {
        let db = Database::open_in_memory().unwrap();

        let malformed = create_subscription(&db, b"{not json").await;
        assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(&malformed)["error"], "failed to decode request body");

        let missing_field = create_subscription(&db, br#"{"service_name":"Netflix"}"#).await;
        assert_eq!(missing_field.status(), StatusCode::BAD_REQUEST);

        let zero_price = create_subscription(
            &db,
            br#"{"service_name":"Netflix","price":0,"start_date":"2025-07"}"#,
        )
        .await;
        assert_eq!(zero_price.status(), StatusCode::BAD_REQUEST);

        let inverted = create_subscription(
            &db,
            br#"{"service_name":"Netflix","price":500,"start_date":"2025-07","end_date":"2024-07"}"#,
        )
        .await;
        assert_eq!(inverted.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(&inverted)["error"],
            "end_date can not be earlier than start_date"
        );
    }

    #[tokio::test]
    async fn test_get_error_mapping() {
        let db = Database::open_in_memory().unwrap();

        let bad_id = get_subscription(&db, "123").await;
        assert_eq!(bad_id.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(&bad_id)["error"], "failed to parse id");

        let missing = get_subscription(&db, &Uuid::new_v4().to_string()).await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_then_get_not_found() {
        let db = Database::open_in_memory().unwrap();
        let id = create_netflix(&db).await;

        let response = delete_subscription(&db, &id).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(&response)["deleted_service"], "Netflix");

        assert_eq!(
            get_subscription(&db, &id).await.status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            delete_subscription(&db, &id).await.status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            delete_subscription(&db, "bad").await.status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn test_update_handler() {
        let db = Database::open_in_memory().unwrap();
        let id = create_netflix(&db).await;

        let ok = update_subscription(&db, &id, br#"{"price":650,"start_date":"2025-09"}"#).await;
        assert_eq!(ok.status(), StatusCode::OK);
        assert_eq!(body_json(&ok)["status"], "success");

        let sub = body_json(&get_subscription(&db, &id).await)["subscription"].clone();
        assert_eq!(sub["price"], 650);
        assert_eq!(sub["start_date"], "2025-09");
        assert_eq!(sub["end_date"], "2026-09");

        let inverted = update_subscription(&db, &id, br#"{"end_date":"2020-01"}"#).await;
        assert_eq!(inverted.status(), StatusCode::BAD_REQUEST);

        let bad_body = update_subscription(&db, &id, b"[]").await;
        assert_eq!(bad_body.status(), StatusCode::BAD_REQUEST);

        let bad_id = update_subscription(&db, "xyz", br#"{"price":1}"#).await;
        assert_eq!(bad_id.status(), StatusCode::BAD_REQUEST);

        let missing =
            update_subscription(&db, &Uuid::new_v4().to_string(), br#"{"price":1}"#).await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_list_handler() {
        let db = Database::open_in_memory().unwrap();

        let empty = list_subscriptions(&db, None).await;
        assert_eq!(empty.status(), StatusCode::OK);
        assert_eq!(body_json(&empty)["subscriptions"], json!([]));

        create_netflix(&db).await;
        create_netflix(&db).await;

        let all = list_subscriptions(&db, Some("user_id=&service_name=Netflix")).await;
        assert_eq!(all.status(), StatusCode::OK);
        let subs = body_json(&all)["subscriptions"].as_array().unwrap().clone();
        assert_eq!(subs.len(), 2);
        assert_eq!(subs[0]["end_date"], "2026-07");

        let bad = list_subscriptions(&db, Some("user_id=42")).await;
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(&bad)["error"], "invalid user_id");
    }
}
