use chrono::Utc;
use eyre::Result;
use sqlx::{Pool, Postgres};

use shiftboard_core::import::StaffSyncPlan;
use shiftboard_core::models::import::ImportKind;
use shiftboard_core::models::staff::UpdateStaffRequest;

use crate::models::{DbImportBatch, DbStaff};
use crate::repositories::import_batch;

const STAFF_COLUMNS: &str =
    "id, employee_id, name, department, group_name, is_active, import_batch_id, created_at, updated_at";

pub async fn list_active_staff(pool: &Pool<Postgres>) -> Result<Vec<DbStaff>> {
    let staff = sqlx::query_as::<_, DbStaff>(&format!(
        "SELECT {} FROM staff WHERE is_active = TRUE ORDER BY department, group_name, employee_id",
        STAFF_COLUMNS
    ))
    .fetch_all(pool)
    .await?;

    Ok(staff)
}

/// Every staff row, active or not. Used to plan a sync.
pub async fn list_all_staff(pool: &Pool<Postgres>) -> Result<Vec<DbStaff>> {
    let staff = sqlx::query_as::<_, DbStaff>(&format!(
        "SELECT {} FROM staff ORDER BY id",
        STAFF_COLUMNS
    ))
    .fetch_all(pool)
    .await?;

    Ok(staff)
}

pub async fn get_staff_by_id(pool: &Pool<Postgres>, id: i32) -> Result<Option<DbStaff>> {
    let staff = sqlx::query_as::<_, DbStaff>(&format!(
        "SELECT {} FROM staff WHERE id = $1",
        STAFF_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(staff)
}

pub async fn get_staff_by_employee_id(
    pool: &Pool<Postgres>,
    employee_id: &str,
) -> Result<Option<DbStaff>> {
    let staff = sqlx::query_as::<_, DbStaff>(&format!(
        "SELECT {} FROM staff WHERE employee_id = $1",
        STAFF_COLUMNS
    ))
    .bind(employee_id)
    .fetch_optional(pool)
    .await?;

    Ok(staff)
}

pub async fn create_staff(
    pool: &Pool<Postgres>,
    employee_id: &str,
    name: &str,
    department: &str,
    group: &str,
) -> Result<DbStaff> {
    let now = Utc::now();

    tracing::debug!("Creating staff: employee_id={}, name={}", employee_id, name);

    let staff = sqlx::query_as::<_, DbStaff>(&format!(
        r#"
        INSERT INTO staff (employee_id, name, department, group_name, is_active, created_at, updated_at)
        VALUES ($1, $2, $3, $4, TRUE, $5, $5)
        RETURNING {}
        "#,
        STAFF_COLUMNS
    ))
    .bind(employee_id)
    .bind(name)
    .bind(department)
    .bind(group)
    .bind(now)
    .fetch_one(pool)
    .await?;

    Ok(staff)
}

pub async fn update_staff(
    pool: &Pool<Postgres>,
    id: i32,
    update: &UpdateStaffRequest,
) -> Result<Option<DbStaff>> {
    let staff = sqlx::query_as::<_, DbStaff>(&format!(
        r#"
        UPDATE staff
        SET name = COALESCE($2, name),
            department = COALESCE($3, department),
            group_name = COALESCE($4, group_name),
            is_active = COALESCE($5, is_active),
            updated_at = $6
        WHERE id = $1
        RETURNING {}
        "#,
        STAFF_COLUMNS
    ))
    .bind(id)
    .bind(update.name.as_deref())
    .bind(update.department.as_deref())
    .bind(update.group.as_deref())
    .bind(update.is_active)
    .bind(Utc::now())
    .fetch_optional(pool)
    .await?;

    Ok(staff)
}

/// Applies a sync plan in one transaction and records it as an import batch.
pub async fn apply_staff_sync(
    pool: &Pool<Postgres>,
    plan: &StaffSyncPlan,
    row_count: usize,
    created_by: Option<&str>,
) -> Result<DbImportBatch> {
    let now = Utc::now();
    let mut tx = pool.begin().await?;

    let batch =
        import_batch::insert_batch(&mut *tx, ImportKind::Staff, row_count, created_by).await?;

    for row in &plan.to_create {
        sqlx::query(
            r#"
            INSERT INTO staff (employee_id, name, department, group_name, is_active,
                               import_batch_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, TRUE, $5, $6, $6)
            "#,
        )
        .bind(&row.employee_id)
        .bind(&row.name)
        .bind(&row.department)
        .bind(&row.group)
        .bind(batch.id)
        .bind(now)
        .execute(&mut *tx)
        .await?;
    }

    for (id, row) in &plan.to_update {
        sqlx::query(
            r#"
            UPDATE staff
            SET name = $2, department = $3, group_name = $4, is_active = TRUE, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&row.name)
        .bind(&row.department)
        .bind(&row.group)
        .bind(now)
        .execute(&mut *tx)
        .await?;
    }

    if !plan.to_deactivate.is_empty() {
        sqlx::query("UPDATE staff SET is_active = FALSE, updated_at = $2 WHERE id = ANY($1)")
            .bind(&plan.to_deactivate)
            .bind(now)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    tracing::info!(
        "Staff sync {} applied: {} added, {} updated, {} deactivated",
        batch.id,
        plan.to_create.len(),
        plan.to_update.len(),
        plan.to_deactivate.len()
    );
    Ok(batch)
}

/// Staff numbers mapped to ids, for resolving import rows.
pub async fn staff_ids_by_employee_id(
    pool: &Pool<Postgres>,
    employee_ids: &[String],
) -> Result<Vec<(String, i32)>> {
    let rows = sqlx::query_as::<_, (String, i32)>(
        "SELECT employee_id, id FROM staff WHERE employee_id = ANY($1)",
    )
    .bind(employee_ids)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
