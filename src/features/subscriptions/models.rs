use super::dates::format_year_month;
use crate::shared::errors::{AppError, AppResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// サブスクリプションデータモデル（データベースの行）
#[derive(Debug, Clone, PartialEq)]
pub struct Subscription {
    pub id: Uuid,
    pub service_name: String,
    pub price: i64,
    pub user_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub updated_at: String,
}

/// APIで返すサブスクリプション表現（日付は YYYY-MM）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionResponse {
    pub id: Uuid,
    pub service_name: String,
    pub price: i64,
    pub user_id: Uuid,
    pub start_date: String,
    pub end_date: String,
}

impl From<&Subscription> for SubscriptionResponse {
    fn from(sub: &Subscription) -> Self {
        Self {
            id: sub.id,
            service_name: sub.service_name.clone(),
            price: sub.price,
            user_id: sub.user_id,
            start_date: format_year_month(sub.start_date),
            end_date: format_year_month(sub.end_date),
        }
    }
}

/// サブスクリプション作成用DTO
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSubscriptionDto {
    pub service_name: String,
    pub price: i64,
    /// 省略時はデータベース側で割り当てる
    #[serde(default)]
    pub user_id: Option<Uuid>,
    pub start_date: String,
    /// 省略時は start_date + 1年
    #[serde(default)]
    pub end_date: Option<String>,
}

impl CreateSubscriptionDto {
    /// 日付以外のフィールドを検証する
    ///
    /// 日付の解析と期間チェックはリポジトリで行う。
    pub fn validate(&self) -> AppResult<()> {
        validate_service_name(&self.service_name)?;
        validate_price(self.price)
    }
}

/// サブスクリプション更新用DTO
///
/// `None` のフィールドは保存済みの値を維持する。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSubscriptionDto {
    #[serde(default)]
    pub service_name: Option<String>,
    #[serde(default)]
    pub price: Option<i64>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

impl UpdateSubscriptionDto {
    /// 指定されたフィールドのみを検証する
    pub fn validate(&self) -> AppResult<()> {
        if let Some(name) = &self.service_name {
            validate_service_name(name)?;
        }
        if let Some(price) = self.price {
            validate_price(price)?;
        }
        Ok(())
    }
}

/// 一覧取得のフィルター条件
///
/// 空文字列は未指定として扱う。
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub user_id: Option<String>,
    pub service_name: Option<String>,
}

impl ListFilter {
    /// クエリ文字列からフィルターを作成する
    ///
    /// # 引数
    /// * `query` - `user_id=...&service_name=...` 形式のクエリ文字列
    pub fn from_query(query: Option<&str>) -> Self {
        let mut filter = Self::default();

        let Some(query) = query else {
            return filter;
        };

        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "user_id" => filter.user_id = Some(value.into_owned()),
                "service_name" => filter.service_name = Some(value.into_owned()),
                _ => {}
            }
        }

        filter
    }

    /// user_id フィルターを解析する
    ///
    /// # 戻り値
    /// 未指定または空の場合はNone、UUIDとして不正な場合はエラー
    pub fn parsed_user_id(&self) -> AppResult<Option<Uuid>> {
        match self.user_id.as_deref() {
            None | Some("") => Ok(None),
            Some(raw) => Uuid::parse_str(raw)
                .map(Some)
                .map_err(|_| AppError::malformed("invalid user_id")),
        }
    }

    /// service_name フィルターを取得する（空文字列は未指定）
    pub fn service_name(&self) -> Option<&str> {
        self.service_name.as_deref().filter(|name| !name.is_empty())
    }
}

fn validate_service_name(name: &str) -> AppResult<()> {
    if name.trim().is_empty() {
        return Err(AppError::malformed("service_name must not be empty"));
    }
    Ok(())
}

fn validate_price(price: i64) -> AppResult<()> {
    if price <= 0 {
        return Err(AppError::malformed("price must be a positive integer"));
    }
    Ok(())
}
