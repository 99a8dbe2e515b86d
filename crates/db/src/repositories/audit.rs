use chrono::Utc;
use eyre::Result;
use sqlx::{Pool, Postgres};

use shiftboard_core::models::audit::AuditEntry;

pub async fn insert_audit_log(pool: &Pool<Postgres>, entry: &AuditEntry) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO audit_logs (actor, action, resource, detail, success, error_message, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(entry.actor.as_deref())
    .bind(&entry.action)
    .bind(&entry.resource)
    .bind(&entry.detail)
    .bind(entry.success)
    .bind(entry.error_message.as_deref())
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(())
}
