use crate::{config::QuillConfig, error::BackendResult};
use diesel::{
    PgConnection,
    r2d2::{ConnectionManager, Pool},
};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use std::env::var;

pub mod category;
pub mod comment;
pub mod post;
pub mod user;

pub type DbPool = Pool<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Handle to everything shared across requests: connection pool, config and
/// the outgoing http client. Constructed once at startup and passed to
/// handlers by reference, never accessed as global state.
#[derive(Clone)]
pub struct QuillContext {
    pub db_pool: DbPool,
    pub conf: QuillConfig,
    pub client: reqwest::Client,
}

impl QuillContext {
    pub fn init(config: QuillConfig, ignore_env: bool) -> BackendResult<Self> {
        let database_url = config.database.connection_url.clone();
        let database_url = if ignore_env {
            database_url
        } else {
            var("DATABASE_URL").unwrap_or(database_url)
        };
        let manager = ConnectionManager::<PgConnection>::new(database_url);
        let db_pool = Pool::builder()
            .max_size(config.database.pool_size)
            .build(manager)?;

        db_pool
            .get()?
            .run_pending_migrations(MIGRATIONS)
            .expect("run migrations");
        Ok(QuillContext {
            db_pool,
            conf: config,
            client: reqwest::Client::new(),
        })
    }
}
