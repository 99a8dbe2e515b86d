use eyre::Result;
use sqlx::{Pool, Postgres};
use tracing::info;

const TABLES: &[(&str, &str)] = &[
    (
        "import_batches",
        r#"
        CREATE TABLE IF NOT EXISTS import_batches (
            id UUID PRIMARY KEY,
            kind VARCHAR(32) NOT NULL,
            row_count INTEGER NOT NULL DEFAULT 0,
            created_by VARCHAR(255) NULL,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            rolled_back_at TIMESTAMP WITH TIME ZONE NULL
        );
        "#,
    ),
    (
        "staff",
        r#"
        CREATE TABLE IF NOT EXISTS staff (
            id SERIAL PRIMARY KEY,
            employee_id VARCHAR(64) NOT NULL UNIQUE,
            name VARCHAR(255) NOT NULL,
            department VARCHAR(255) NOT NULL DEFAULT '',
            group_name VARCHAR(255) NOT NULL DEFAULT '',
            is_active BOOLEAN NOT NULL DEFAULT TRUE,
            import_batch_id UUID NULL REFERENCES import_batches(id),
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        );
        "#,
    ),
    (
        "contracts",
        r#"
        CREATE TABLE IF NOT EXISTS contracts (
            staff_id INTEGER PRIMARY KEY REFERENCES staff(id) ON DELETE CASCADE,
            monday_hours VARCHAR(32) NULL,
            tuesday_hours VARCHAR(32) NULL,
            wednesday_hours VARCHAR(32) NULL,
            thursday_hours VARCHAR(32) NULL,
            friday_hours VARCHAR(32) NULL,
            saturday_hours VARCHAR(32) NULL,
            sunday_hours VARCHAR(32) NULL,
            updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        );
        "#,
    ),
    (
        "schedules",
        r#"
        CREATE TABLE IF NOT EXISTS schedules (
            id UUID PRIMARY KEY,
            staff_id INTEGER NOT NULL REFERENCES staff(id) ON DELETE CASCADE,
            date DATE NOT NULL,
            status VARCHAR(64) NOT NULL,
            start_hour DOUBLE PRECISION NOT NULL,
            end_hour DOUBLE PRECISION NOT NULL,
            memo TEXT NULL,
            layer VARCHAR(16) NOT NULL DEFAULT 'adjustment',
            import_batch_id UUID NULL REFERENCES import_batches(id),
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            CONSTRAINT valid_schedule_range CHECK (
                start_hour >= 8 AND end_hour <= 21 AND end_hour > start_hour
            )
        );
        "#,
    ),
    (
        "pending_schedules",
        r#"
        CREATE TABLE IF NOT EXISTS pending_schedules (
            id UUID PRIMARY KEY,
            staff_id INTEGER NOT NULL REFERENCES staff(id) ON DELETE CASCADE,
            date DATE NOT NULL,
            status VARCHAR(64) NOT NULL,
            start_hour DOUBLE PRECISION NOT NULL,
            end_hour DOUBLE PRECISION NOT NULL,
            memo TEXT NULL,
            pending_type VARCHAR(16) NOT NULL DEFAULT 'custom',
            approved_by VARCHAR(255) NULL,
            approved_at TIMESTAMP WITH TIME ZONE NULL,
            approval_note TEXT NULL,
            rejected_by VARCHAR(255) NULL,
            rejected_at TIMESTAMP WITH TIME ZONE NULL,
            rejection_reason TEXT NULL,
            unapproval_reason TEXT NULL,
            created_by VARCHAR(255) NULL,
            import_batch_id UUID NULL REFERENCES import_batches(id),
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            CONSTRAINT valid_pending_range CHECK (
                start_hour >= 8 AND end_hour <= 21 AND end_hour > start_hour
            )
        );
        "#,
    ),
    (
        "user_auth",
        r#"
        CREATE TABLE IF NOT EXISTS user_auth (
            id UUID PRIMARY KEY,
            email VARCHAR(255) NOT NULL UNIQUE,
            password_hash VARCHAR(255) NULL,
            role VARCHAR(16) NOT NULL DEFAULT 'staff',
            login_attempts INTEGER NOT NULL DEFAULT 0,
            locked_at TIMESTAMP WITH TIME ZONE NULL,
            last_login_at TIMESTAMP WITH TIME ZONE NULL,
            staff_id INTEGER NULL REFERENCES staff(id) ON DELETE SET NULL,
            is_active BOOLEAN NOT NULL DEFAULT TRUE,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        );
        "#,
    ),
    (
        "password_reset_tokens",
        r#"
        CREATE TABLE IF NOT EXISTS password_reset_tokens (
            token VARCHAR(64) PRIMARY KEY,
            token_type VARCHAR(32) NOT NULL,
            user_id UUID NOT NULL REFERENCES user_auth(id) ON DELETE CASCADE,
            expires_at TIMESTAMP WITH TIME ZONE NOT NULL,
            used BOOLEAN NOT NULL DEFAULT FALSE,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        );
        "#,
    ),
    (
        "audit_logs",
        r#"
        CREATE TABLE IF NOT EXISTS audit_logs (
            id BIGSERIAL PRIMARY KEY,
            actor VARCHAR(255) NULL,
            action VARCHAR(64) NOT NULL,
            resource VARCHAR(255) NOT NULL,
            detail JSONB NOT NULL DEFAULT '{}'::jsonb,
            success BOOLEAN NOT NULL,
            error_message TEXT NULL,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        );
        "#,
    ),
    (
        "holidays",
        r#"
        CREATE TABLE IF NOT EXISTS holidays (
            date DATE PRIMARY KEY,
            name VARCHAR(255) NOT NULL
        );
        "#,
    ),
    (
        "temporary_presets",
        r#"
        CREATE TABLE IF NOT EXISTS temporary_presets (
            key VARCHAR(255) PRIMARY KEY,
            preset JSONB NOT NULL,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        );
        "#,
    ),
];

const INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_schedules_date ON schedules(date)",
    "CREATE INDEX IF NOT EXISTS idx_schedules_staff_date ON schedules(staff_id, date)",
    "CREATE INDEX IF NOT EXISTS idx_schedules_import_batch ON schedules(import_batch_id)",
    "CREATE INDEX IF NOT EXISTS idx_pending_staff_date ON pending_schedules(staff_id, date)",
    "CREATE INDEX IF NOT EXISTS idx_pending_import_batch ON pending_schedules(import_batch_id)",
    "CREATE INDEX IF NOT EXISTS idx_staff_import_batch ON staff(import_batch_id)",
    "CREATE INDEX IF NOT EXISTS idx_reset_tokens_user ON password_reset_tokens(user_id)",
    "CREATE INDEX IF NOT EXISTS idx_audit_logs_created_at ON audit_logs(created_at)",
    "CREATE INDEX IF NOT EXISTS idx_temporary_presets_created_at ON temporary_presets(created_at)",
];

pub async fn initialize_database(pool: &Pool<Postgres>) -> Result<()> {
    info!("Initializing database schema...");

    for (table, ddl) in TABLES {
        tracing::debug!("Creating table {}", table);
        sqlx::query(ddl).execute(pool).await?;
    }

    for ddl in INDEXES {
        sqlx::query(ddl).execute(pool).await?;
    }

    info!("Database schema initialized successfully.");
    Ok(())
}
