use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::time::Duration;
use tracing::info;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS trips (
    id              UUID PRIMARY KEY,
    driver_id       TEXT NOT NULL,
    driver_name     TEXT,
    from_city       TEXT NOT NULL,
    to_city         TEXT NOT NULL,
    date            TEXT NOT NULL,
    time            TEXT NOT NULL,
    car_model       TEXT NOT NULL,
    car_color       TEXT NOT NULL,
    price           DOUBLE PRECISION NOT NULL,
    phone_number    TEXT NOT NULL,
    notes           TEXT,
    total_seats     INT NOT NULL,
    available_seats INT NOT NULL,
    booked_users    TEXT[] NOT NULL DEFAULT '{}',
    created_at      TIMESTAMPTZ NOT NULL,
    updated_at      TIMESTAMPTZ NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_trips_listing ON trips (created_at DESC, id DESC);
CREATE INDEX IF NOT EXISTS idx_trips_driver ON trips (driver_id);

CREATE TABLE IF NOT EXISTS user_push_tokens (
    user_id    TEXT NOT NULL,
    token      TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    PRIMARY KEY (user_id, token)
);
"#;

#[derive(Clone)]
pub struct DbClient {
    pub pool: Pool<Postgres>,
}

impl DbClient {
    pub async fn new(connection_string: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(connection_string)
            .await?;

        Ok(Self { pool })
    }

    /// Bootstrap the schema; every statement is idempotent.
    pub async fn ensure_schema(&self) -> Result<(), sqlx::Error> {
        info!("Ensuring database schema...");
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        info!("Database schema ready.");
        Ok(())
    }
}
