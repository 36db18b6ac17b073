//! Core traits for probdesk abstractions.
//!
//! The backup subsystem only needs a bulk read and a bulk insert from the
//! record store, plus a narrow single-field update. Concrete stores live in
//! `probdesk-db`.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{AttachmentField, CreateRecordRequest, Record};

/// Repository for problem records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Every record, ordered by identity.
    async fn list_all(&self) -> Result<Vec<Record>>;

    /// Whether any stored record already uses this public token.
    async fn token_exists(&self, token: Uuid) -> Result<bool>;

    /// Insert a new record and return its freshly assigned identity.
    async fn insert(&self, req: CreateRecordRequest) -> Result<i64>;

    /// Insert multiple records in a single transaction.
    ///
    /// Either every record is stored or none is. Identities are returned in
    /// input order.
    async fn insert_bulk(&self, reqs: Vec<CreateRecordRequest>) -> Result<Vec<i64>>;

    /// Overwrite exactly one encoded attachment column of a record.
    ///
    /// Bypasses whole-record validation and does not touch any other column,
    /// including `updated_at_utc`.
    async fn update_attachment_field(
        &self,
        id: i64,
        field: AttachmentField,
        encoded: &str,
    ) -> Result<()>;

    /// Number of stored records.
    async fn count(&self) -> Result<i64>;
}
