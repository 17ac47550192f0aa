//! API境界の年月文字列（`YYYY-MM`）と内部の日付型の相互変換
//!
//! 年月は内部的にその月の1日として扱う。

use crate::shared::errors::{AppError, AppResult};
use chrono::{Months, NaiveDate};

/// API境界で使用する日付フォーマット
pub const YEAR_MONTH_FORMAT: &str = "%Y-%m";

/// `YYYY-MM` 形式の文字列を月初の日付に変換する
///
/// # 引数
/// * `value` - 年月文字列（例: "2025-07"）
///
/// # 戻り値
/// 月初の日付、または形式が不正な場合は `MalformedInput`
pub fn parse_year_month(value: &str) -> AppResult<NaiveDate> {
    let bytes = value.as_bytes();
    let well_formed = bytes.len() == 7
        && bytes[4] == b'-'
        && bytes[..4].iter().all(u8::is_ascii_digit)
        && bytes[5..].iter().all(u8::is_ascii_digit);

    if !well_formed {
        return Err(AppError::malformed(format!(
            "invalid date {value:?}: expected YYYY-MM"
        )));
    }

    let year: i32 = value[..4]
        .parse()
        .map_err(|_| AppError::malformed(format!("invalid year in {value:?}")))?;
    let month: u32 = value[5..]
        .parse()
        .map_err(|_| AppError::malformed(format!("invalid month in {value:?}")))?;

    NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| AppError::malformed(format!("invalid month in {value:?}")))
}

/// 日付を `YYYY-MM` 形式に変換する（日は出力しない）
pub fn format_year_month(date: NaiveDate) -> String {
    date.format(YEAR_MONTH_FORMAT).to_string()
}

/// 1年後の日付を計算する
pub fn add_one_year(date: NaiveDate) -> AppResult<NaiveDate> {
    date.checked_add_months(Months::new(12))
        .ok_or_else(|| AppError::malformed(format!("date {date} is out of range")))
}

/// 作成時の期間を決定する
///
/// end_date が未指定の場合は start_date + 1年。
///
/// # 戻り値
/// (開始日, 終了日)、または終了日が開始日より前の場合は `InvalidDateRange`
pub fn resolve_create_range(
    start_date: &str,
    end_date: Option<&str>,
) -> AppResult<(NaiveDate, NaiveDate)> {
    let start = parse_field("start_date", start_date)?;
    let end = match end_date {
        Some(raw) => parse_field("end_date", raw)?,
        None => add_one_year(start)?,
    };

    if end < start {
        return Err(AppError::InvalidDateRange);
    }

    Ok((start, end))
}

/// 部分更新時の期間を決定する
///
/// start_date のみ指定された場合、end_date は start_date + 1年になる。
/// end_date のみ指定された場合は保存済みの開始日との比較が呼び出し側で必要。
///
/// # 戻り値
/// (開始日, 終了日) のうち更新対象のもの
pub fn resolve_update_range(
    start_date: Option<&str>,
    end_date: Option<&str>,
) -> AppResult<(Option<NaiveDate>, Option<NaiveDate>)> {
    let start = start_date
        .map(|raw| parse_field("start_date", raw))
        .transpose()?;

    let end = match (end_date, start) {
        (Some(raw), _) => Some(parse_field("end_date", raw)?),
        (None, Some(start)) => Some(add_one_year(start)?),
        (None, None) => None,
    };

    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            return Err(AppError::InvalidDateRange);
        }
    }

    Ok((start, end))
}

fn parse_field(field: &str, value: &str) -> AppResult<NaiveDate> {
    parse_year_month(value).map_err(|_| {
        AppError::malformed(format!("invalid {field} {value:?}: expected YYYY-MM"))
    })
}
