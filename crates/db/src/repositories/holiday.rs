use chrono::NaiveDate;
use eyre::Result;
use sqlx::{Pool, Postgres};

use crate::models::DbHoliday;

/// Holidays in `from..=to`, ordered by date.
pub async fn list_holidays_between(
    pool: &Pool<Postgres>,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<DbHoliday>> {
    let holidays = sqlx::query_as::<_, DbHoliday>(
        "SELECT date, name FROM holidays WHERE date BETWEEN $1 AND $2 ORDER BY date",
    )
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await?;

    Ok(holidays)
}

pub async fn get_holiday(pool: &Pool<Postgres>, date: NaiveDate) -> Result<Option<DbHoliday>> {
    let holiday = sqlx::query_as::<_, DbHoliday>("SELECT date, name FROM holidays WHERE date = $1")
        .bind(date)
        .fetch_optional(pool)
        .await?;

    Ok(holiday)
}
