use super::dates::{resolve_create_range, resolve_update_range};
use super::models::{CreateSubscriptionDto, ListFilter, Subscription, UpdateSubscriptionDto};
use crate::shared::errors::{AppError, AppResult};
use chrono::{NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection, Row};
use uuid::Uuid;

const SELECT_COLUMNS: &str =
    "SELECT id, service_name, price, user_id, start_date, end_date, updated_at FROM subscriptions";

/// サブスクリプションを作成する
///
/// # 引数
/// * `conn` - データベース接続
/// * `dto` - サブスクリプション作成用DTO
///
/// # 戻り値
/// 作成されたサブスクリプションのID、または失敗時はエラー
///
/// # 処理内容
/// 1. 開始日・終了日の解析（終了日が未指定なら開始日 + 1年）
/// 2. 期間の検証
/// 3. 挿入（user_id 未指定時はカラムを省略してテーブルのデフォルト値を使う）
pub fn create(conn: &Connection, dto: CreateSubscriptionDto) -> AppResult<Uuid> {
    let (start_date, end_date) = resolve_create_range(&dto.start_date, dto.end_date.as_deref())?;

    let id = Uuid::new_v4();
    let now = Utc::now().to_rfc3339();

    match dto.user_id.filter(|user_id| !user_id.is_nil()) {
        Some(user_id) => conn.execute(
            "INSERT INTO subscriptions (id, service_name, price, user_id, start_date, end_date, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                id.to_string(),
                dto.service_name,
                dto.price,
                user_id.to_string(),
                start_date,
                end_date,
                now
            ],
        )?,
        None => conn.execute(
            "INSERT INTO subscriptions (id, service_name, price, start_date, end_date, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![id.to_string(), dto.service_name, dto.price, start_date, end_date, now],
        )?,
    };

    Ok(id)
}

/// IDでサブスクリプションを取得する
///
/// # 戻り値
/// サブスクリプション、該当行がない場合は `NotFound`
pub fn find_by_id(conn: &Connection, id: Uuid) -> AppResult<Subscription> {
    conn.query_row(
        &format!("{SELECT_COLUMNS} WHERE id = ?1"),
        params![id.to_string()],
        map_subscription_row,
    )
    .map_err(|e| not_found_or_database(e, id))
}

/// サブスクリプションを削除する
///
/// # 戻り値
/// 削除前のサービス名、該当行がない場合は `NotFound`
pub fn delete(conn: &Connection, id: Uuid) -> AppResult<String> {
    let service_name: String = conn
        .query_row(
            "SELECT service_name FROM subscriptions WHERE id = ?1",
            params![id.to_string()],
            |row| row.get(0),
        )
        .map_err(|e| not_found_or_database(e, id))?;

    conn.execute(
        "DELETE FROM subscriptions WHERE id = ?1",
        params![id.to_string()],
    )?;

    Ok(service_name)
}

/// サブスクリプションを部分更新する
///
/// 指定されなかったフィールドは保存済みの値を維持し、updated_at は常に更新する。
///
/// # 引数
/// * `conn` - データベース接続
/// * `id` - サブスクリプションID
/// * `dto` - サブスクリプション更新用DTO
///
/// # 戻り値
/// 成功時はOk(())、期間が不正な場合は `InvalidDateRange`、該当行がない場合は `NotFound`
pub fn update(conn: &Connection, id: Uuid, dto: UpdateSubscriptionDto) -> AppResult<()> {
    let (start_date, end_date) =
        resolve_update_range(dto.start_date.as_deref(), dto.end_date.as_deref())?;

    // 終了日のみの更新は保存済みの開始日と比較する
    if let (None, Some(end)) = (start_date, end_date) {
        let stored_start = find_start_date(conn, id)?;
        if end < stored_start {
            return Err(AppError::InvalidDateRange);
        }
    }

    let now = Utc::now().to_rfc3339();

    let rows_affected = conn.execute(
        "UPDATE subscriptions SET
            service_name = COALESCE(?1, service_name),
            price = COALESCE(?2, price),
            start_date = COALESCE(?3, start_date),
            end_date = COALESCE(?4, end_date),
            updated_at = ?5
         WHERE id = ?6",
        params![
            dto.service_name,
            dto.price,
            start_date,
            end_date,
            now,
            id.to_string()
        ],
    )?;

    if rows_affected == 0 {
        return Err(AppError::not_found(format!("ID {id} のサブスクリプション")));
    }

    Ok(())
}

/// サブスクリプション一覧を取得する
///
/// # 引数
/// * `conn` - データベース接続
/// * `filter` - user_id / service_name によるフィルター
///
/// # 戻り値
/// サブスクリプションのリスト（該当なしの場合は空）、
/// user_id がUUIDとして不正な場合は `MalformedInput`
pub fn find_all(conn: &Connection, filter: &ListFilter) -> AppResult<Vec<Subscription>> {
    let mut query = format!("{SELECT_COLUMNS} WHERE 1 = 1");
    let mut args: Vec<String> = Vec::new();

    if let Some(user_id) = filter.parsed_user_id()? {
        args.push(user_id.to_string());
        query.push_str(&format!(" AND user_id = ?{}", args.len()));
    }

    if let Some(service_name) = filter.service_name() {
        args.push(service_name.to_string());
        query.push_str(&format!(" AND service_name = ?{}", args.len()));
    }

    query.push_str(" ORDER BY service_name, start_date, id");

    let mut stmt = conn.prepare(&query)?;
    let subscriptions = stmt.query_map(params_from_iter(args.iter()), map_subscription_row)?;

    subscriptions
        .collect::<Result<Vec<_>, _>>()
        .map_err(AppError::from)
}

fn find_start_date(conn: &Connection, id: Uuid) -> AppResult<NaiveDate> {
    conn.query_row(
        "SELECT start_date FROM subscriptions WHERE id = ?1",
        params![id.to_string()],
        |row| row.get(0),
    )
    .map_err(|e| not_found_or_database(e, id))
}

fn not_found_or_database(error: rusqlite::Error, id: Uuid) -> AppError {
    match error {
        rusqlite::Error::QueryReturnedNoRows => {
            AppError::not_found(format!("ID {id} のサブスクリプション"))
        }
        _ => AppError::Database(error.to_string()),
    }
}

fn map_subscription_row(row: &Row<'_>) -> rusqlite::Result<Subscription> {
    Ok(Subscription {
        id: get_uuid(row, 0)?,
        service_name: row.get(1)?,
        price: row.get(2)?,
        user_id: get_uuid(row, 3)?,
        start_date: row.get(4)?,
        end_date: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn get_uuid(row: &Row<'_>, index: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(index)?;
    Uuid::parse_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(e)))
}
