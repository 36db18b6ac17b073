//! PostgreSQL record store.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row, Transaction};
use tracing::debug;
use uuid::Uuid;

use probdesk_core::{
    AttachmentField, CreateRecordRequest, EditorType, Error, Record, RecordStore, Result,
};

const RECORD_COLUMNS: &str = "id, key_words, title, \
     description, description_editor, root_cause, root_cause_editor, \
     solutions, solutions_editor, others, others_editor, \
     root_cause_files, solutions_files, others_files, uploaded_images, \
     is_public, public_token, created_by, created_at_utc, updated_at_utc";

/// PostgreSQL implementation of RecordStore.
#[derive(Clone)]
pub struct PgRecordStore {
    pool: Pool<Postgres>,
}

impl PgRecordStore {
    /// Create a new PgRecordStore with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Insert one record inside an existing transaction.
    pub async fn insert_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        req: CreateRecordRequest,
    ) -> Result<i64> {
        let row = sqlx::query(
            r#"
            INSERT INTO problem (
                key_words, title,
                description, description_editor, root_cause, root_cause_editor,
                solutions, solutions_editor, others, others_editor,
                root_cause_files, solutions_files, others_files, uploaded_images,
                is_public, public_token, created_by, created_at_utc, updated_at_utc
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17,
                    COALESCE($18, now()), now())
            RETURNING id
            "#,
        )
        .bind(&req.key_words)
        .bind(&req.title)
        .bind(&req.description)
        .bind(req.description_editor.as_str())
        .bind(&req.root_cause)
        .bind(req.root_cause_editor.as_str())
        .bind(&req.solutions)
        .bind(req.solutions_editor.as_str())
        .bind(&req.others)
        .bind(req.others_editor.as_str())
        .bind(&req.root_cause_files)
        .bind(&req.solutions_files)
        .bind(&req.others_files)
        .bind(&req.uploaded_images)
        .bind(req.is_public)
        .bind(req.public_token)
        .bind(req.created_by)
        .bind(req.created_at_utc)
        .fetch_one(&mut **tx)
        .await
        .map_err(map_insert_error)?;

        Ok(row.get("id"))
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn list_all(&self) -> Result<Vec<Record>> {
        let query = format!("SELECT {} FROM problem ORDER BY id", RECORD_COLUMNS);
        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        rows.iter().map(row_to_record).collect()
    }

    async fn token_exists(&self, token: Uuid) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM problem WHERE public_token = $1)")
                .bind(token)
                .fetch_one(&self.pool)
                .await
                .map_err(Error::Database)?;
        Ok(exists)
    }

    async fn insert(&self, req: CreateRecordRequest) -> Result<i64> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let id = self.insert_tx(&mut tx, req).await?;
        tx.commit().await.map_err(Error::Database)?;
        Ok(id)
    }

    async fn insert_bulk(&self, reqs: Vec<CreateRecordRequest>) -> Result<Vec<i64>> {
        if reqs.is_empty() {
            return Ok(Vec::new());
        }

        let total = reqs.len();
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let mut ids = Vec::with_capacity(total);
        for req in reqs {
            // Dropping `tx` on error rolls the whole batch back.
            ids.push(self.insert_tx(&mut tx, req).await?);
        }
        tx.commit().await.map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            component = "records",
            op = "insert_bulk",
            record_count = total,
            "Bulk insert committed"
        );
        Ok(ids)
    }

    async fn update_attachment_field(
        &self,
        id: i64,
        field: AttachmentField,
        encoded: &str,
    ) -> Result<()> {
        let query = format!("UPDATE problem SET {} = $1 WHERE id = $2", field.column());
        let result = sqlx::query(&query)
            .bind(encoded)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::RecordNotFound(id));
        }
        Ok(())
    }

    async fn count(&self) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM problem")
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)
    }
}

fn row_to_record(r: &PgRow) -> Result<Record> {
    Ok(Record {
        id: r.try_get("id")?,
        key_words: r.try_get("key_words")?,
        title: r.try_get("title")?,
        description: r.try_get("description")?,
        description_editor: editor(r, "description_editor")?,
        root_cause: r.try_get("root_cause")?,
        root_cause_editor: editor(r, "root_cause_editor")?,
        solutions: r.try_get("solutions")?,
        solutions_editor: editor(r, "solutions_editor")?,
        others: r.try_get("others")?,
        others_editor: editor(r, "others_editor")?,
        root_cause_files: r.try_get("root_cause_files")?,
        solutions_files: r.try_get("solutions_files")?,
        others_files: r.try_get("others_files")?,
        uploaded_images: r.try_get::<Vec<String>, _>("uploaded_images")?,
        is_public: r.try_get("is_public")?,
        public_token: r.try_get("public_token")?,
        created_by: r.try_get("created_by")?,
        created_at_utc: r.try_get("created_at_utc")?,
        updated_at_utc: r.try_get("updated_at_utc")?,
    })
}

fn editor(r: &PgRow, column: &str) -> Result<EditorType> {
    let value: String = r.try_get(column)?;
    value.parse()
}

fn map_insert_error(e: sqlx::Error) -> Error {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return Error::Conflict(format!(
                "public_token already in use ({})",
                db_err.constraint().unwrap_or("unique constraint")
            ));
        }
    }
    Error::Database(e)
}
