use chrono::Utc;
use eyre::Result;
use sqlx::{Pool, Postgres};

use shiftboard_core::models::contract::UpsertContractRequest;

use crate::models::DbContract;

const CONTRACT_COLUMNS: &str = "staff_id, monday_hours, tuesday_hours, wednesday_hours, \
                                thursday_hours, friday_hours, saturday_hours, sunday_hours, updated_at";

pub async fn get_contract(pool: &Pool<Postgres>, staff_id: i32) -> Result<Option<DbContract>> {
    let contract = sqlx::query_as::<_, DbContract>(&format!(
        "SELECT {} FROM contracts WHERE staff_id = $1",
        CONTRACT_COLUMNS
    ))
    .bind(staff_id)
    .fetch_optional(pool)
    .await?;

    Ok(contract)
}

/// Contracts of active staff, for building the day grid.
pub async fn list_active_contracts(pool: &Pool<Postgres>) -> Result<Vec<DbContract>> {
    let contracts = sqlx::query_as::<_, DbContract>(&format!(
        r#"
        SELECT {}
        FROM contracts c
        WHERE EXISTS (SELECT 1 FROM staff s WHERE s.id = c.staff_id AND s.is_active = TRUE)
        "#,
        CONTRACT_COLUMNS
    ))
    .fetch_all(pool)
    .await?;

    Ok(contracts)
}

pub async fn upsert_contract(
    pool: &Pool<Postgres>,
    staff_id: i32,
    hours: &UpsertContractRequest,
) -> Result<DbContract> {
    tracing::debug!("Saving contract for staff {}", staff_id);

    let contract = sqlx::query_as::<_, DbContract>(&format!(
        r#"
        INSERT INTO contracts (staff_id, monday_hours, tuesday_hours, wednesday_hours,
                               thursday_hours, friday_hours, saturday_hours, sunday_hours, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ON CONFLICT (staff_id)
        DO UPDATE SET monday_hours = $2, tuesday_hours = $3, wednesday_hours = $4,
                      thursday_hours = $5, friday_hours = $6, saturday_hours = $7,
                      sunday_hours = $8, updated_at = $9
        RETURNING {}
        "#,
        CONTRACT_COLUMNS
    ))
    .bind(staff_id)
    .bind(hours.monday_hours.as_deref())
    .bind(hours.tuesday_hours.as_deref())
    .bind(hours.wednesday_hours.as_deref())
    .bind(hours.thursday_hours.as_deref())
    .bind(hours.friday_hours.as_deref())
    .bind(hours.saturday_hours.as_deref())
    .bind(hours.sunday_hours.as_deref())
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(contract)
}
