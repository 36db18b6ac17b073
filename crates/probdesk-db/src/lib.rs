//! # probdesk-db
//!
//! Record storage for probdesk.
//!
//! This crate provides:
//! - Connection pool management
//! - [`PgRecordStore`], the PostgreSQL implementation of [`RecordStore`]
//! - [`MemoryRecordStore`], an in-process store with the same guarantees
//!
//! ## Example
//!
//! ```rust,ignore
//! use probdesk_db::{CreateRecordRequest, Database, RecordStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/probdesk").await?;
//!     db.migrate().await?;
//!
//!     let id = db.records.insert(CreateRecordRequest::titled("Disk full")).await?;
//!     println!("Created record: {}", id);
//!     Ok(())
//! }
//! ```
pub mod memory;
pub mod pool;
pub mod records;

// Test fixtures for integration tests
// Note: Always compiled so integration tests (in tests/) can use DEFAULT_TEST_DATABASE_URL
pub mod test_fixtures;

// Re-export core types
pub use probdesk_core::*;

pub use memory::MemoryRecordStore;
pub use pool::{create_pool, create_pool_with_config, PoolConfig};
pub use records::PgRecordStore;

/// Combined database context.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Problem record repository.
    pub records: PgRecordStore,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            records: PgRecordStore::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}
