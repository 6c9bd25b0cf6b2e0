use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager, PooledConnection};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

pub type DbPool = r2d2::Pool<ConnectionManager<PgConnection>>;
pub type DbConn = PooledConnection<ConnectionManager<PgConnection>>;

/// Handle to the bounded connection pool.
///
/// Constructed once at startup with [`Db::open`], injected into handlers
/// through the router state, and torn down with [`Db::close`] on shutdown.
/// There is no module-level pool; everything that talks to the database
/// borrows a connection from this handle for the duration of one request.
#[derive(Clone)]
pub struct Db {
    pool: DbPool,
}

impl Db {
    /// Build the pool and run pending migrations.
    pub fn open(database_url: &str, max_size: u32) -> Db {
        let manager = ConnectionManager::<PgConnection>::new(database_url);
        let pool = r2d2::Pool::builder()
            .max_size(max_size)
            .build(manager)
            .expect("Failed to create database pool");

        let mut conn = pool
            .get()
            .expect("Failed to get DB connection for migrations");
        conn.run_pending_migrations(MIGRATIONS)
            .expect("Failed to run database migrations");

        Db { pool }
    }

    /// Borrow a connection, blocking until one is free or the pool's
    /// acquire timeout elapses.
    pub fn conn(&self) -> Result<DbConn, diesel::r2d2::PoolError> {
        self.pool.get()
    }

    /// Drop the pool, closing idle connections. Checked-out connections
    /// close as their requests finish.
    pub fn close(self) {
        drop(self.pool);
    }
}

/// Borrow a pooled connection inside a handler, or bail out of the handler
/// with a 500 when the pool is exhausted or the database is unreachable.
#[macro_export]
macro_rules! get_conn {
    ($state:expr) => {
        match $state.db.conn() {
            Ok(conn) => conn,
            Err(e) => {
                tracing::error!(error = %e, "database connection failed");
                return (
                    axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                    axum::Json($crate::api::ErrorResponse {
                        error: "Database connection failed".to_string(),
                    }),
                )
                    .into_response();
            }
        }
    };
}
