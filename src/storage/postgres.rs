use crate::{
    config::DbConfig,
    error::{MakeQuerySnafu, MigrateSnafu, OpenDatabaseSnafu, RosterResult},
    storage::KeyValueStorage,
};
use async_trait::async_trait;
use snafu::ResultExt;
use sqlx::{Pool, Postgres, postgres::PgPoolOptions};

#[derive(Debug, Clone)]
pub struct PostgresStorage {
    pool: Pool<Postgres>,
}

impl PostgresStorage {
    pub async fn new(options: PgPoolOptions, db_config: &DbConfig) -> RosterResult<Self> {
        let pool = options
            .connect(&db_config.get_db_path())
            .await
            .context(OpenDatabaseSnafu)?;

        sqlx::migrate!().run(&pool).await.context(MigrateSnafu)?;
        info!("Connected to postgres storage");

        Ok(Self { pool })
    }
}

#[async_trait]
impl KeyValueStorage for PostgresStorage {
    async fn get(&self, key: &str) -> RosterResult<Option<String>> {
        debug!(?key, "Reading from postgres storage");
        sqlx::query_scalar::<_, String>("SELECT value FROM key_value_store WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .context(MakeQuerySnafu)
    }

    async fn set(&self, key: &str, value: &str) -> RosterResult<()> {
        debug!(?key, bytes = value.len(), "Writing to postgres storage");
        sqlx::query("INSERT INTO key_value_store (key, value) VALUES ($1, $2) ON CONFLICT (key) DO UPDATE SET value = excluded.value")
            .bind(key)
            .bind(value)
            .execute(&self.pool)
            .await
            .context(MakeQuerySnafu)?;
        Ok(())
    }
}
