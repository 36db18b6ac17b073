//! In-memory record store.
//!
//! Mirrors the PostgreSQL store's guarantees: identities come from a
//! monotonically increasing counter and are never reused, public tokens are
//! unique, and bulk inserts are all-or-nothing.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use probdesk_core::{AttachmentField, CreateRecordRequest, Error, Record, RecordStore, Result};

#[derive(Debug)]
struct State {
    records: BTreeMap<i64, Record>,
    next_id: i64,
}

/// Record store held entirely in process memory.
#[derive(Debug)]
pub struct MemoryRecordStore {
    state: RwLock<State>,
}

impl Default for MemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// Empty store whose first assigned identity is `first_id`.
    pub fn starting_at(first_id: i64) -> Self {
        Self {
            state: RwLock::new(State {
                records: BTreeMap::new(),
                next_id: first_id,
            }),
        }
    }

    /// Fetch one record by identity.
    pub async fn get(&self, id: i64) -> Option<Record> {
        self.state.read().await.records.get(&id).cloned()
    }
}

fn token_conflict(token: Uuid) -> Error {
    Error::Conflict(format!("public_token already in use: {}", token))
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn list_all(&self) -> Result<Vec<Record>> {
        Ok(self.state.read().await.records.values().cloned().collect())
    }

    async fn token_exists(&self, token: Uuid) -> Result<bool> {
        let state = self.state.read().await;
        Ok(state.records.values().any(|r| r.public_token == token))
    }

    async fn insert(&self, req: CreateRecordRequest) -> Result<i64> {
        let mut ids = self.insert_bulk(vec![req]).await?;
        ids.pop()
            .ok_or_else(|| Error::Internal("insert returned no identity".to_string()))
    }

    async fn insert_bulk(&self, reqs: Vec<CreateRecordRequest>) -> Result<Vec<i64>> {
        let mut state = self.state.write().await;

        // Validate the whole batch before touching state.
        let mut existing: HashSet<Uuid> = state.records.values().map(|r| r.public_token).collect();
        for req in &reqs {
            if !existing.insert(req.public_token) {
                return Err(token_conflict(req.public_token));
            }
        }

        let now = Utc::now();
        let mut ids = Vec::with_capacity(reqs.len());
        for req in reqs {
            let id = state.next_id;
            state.next_id += 1;
            state.records.insert(id, req.into_record(id, now));
            ids.push(id);
        }
        Ok(ids)
    }

    async fn update_attachment_field(
        &self,
        id: i64,
        field: AttachmentField,
        encoded: &str,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        let record = state
            .records
            .get_mut(&id)
            .ok_or(Error::RecordNotFound(id))?;
        record.set_attachment(field, encoded);
        Ok(())
    }

    async fn count(&self) -> Result<i64> {
        Ok(self.state.read().await.records.len() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_identities_increase_from_start() {
        let store = MemoryRecordStore::starting_at(40);
        let a = store.insert(CreateRecordRequest::titled("A")).await.unwrap();
        let b = store.insert(CreateRecordRequest::titled("B")).await.unwrap();

        assert_eq!((a, b), (40, 41));
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_insert_bulk_preserves_input_order() {
        let store = MemoryRecordStore::new();
        let ids = store
            .insert_bulk(vec![
                CreateRecordRequest::titled("first"),
                CreateRecordRequest::titled("second"),
                CreateRecordRequest::titled("third"),
            ])
            .await
            .unwrap();

        assert_eq!(ids, vec![1, 2, 3]);
        let titles: Vec<String> = store
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.title)
            .collect();
        assert_eq!(titles, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_insert_bulk_is_all_or_nothing() {
        let store = MemoryRecordStore::new();
        let taken = store.insert(CreateRecordRequest::titled("existing")).await.unwrap();
        let token = store.get(taken).await.unwrap().public_token;

        let mut clash = CreateRecordRequest::titled("clash");
        clash.public_token = token;
        let result = store
            .insert_bulk(vec![CreateRecordRequest::titled("fine"), clash])
            .await;

        assert!(matches!(result, Err(Error::Conflict(_))));
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_insert_bulk_rejects_duplicate_tokens_within_batch() {
        let store = MemoryRecordStore::new();
        let a = CreateRecordRequest::titled("a");
        let mut b = CreateRecordRequest::titled("b");
        b.public_token = a.public_token;

        let result = store.insert_bulk(vec![a, b]).await;
        assert!(result.unwrap_err().is_unique_violation());
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_identities_not_reused_after_failed_batch() {
        let store = MemoryRecordStore::new();
        let one = CreateRecordRequest::titled("one");
        let mut dup = CreateRecordRequest::titled("dup");
        dup.public_token = one.public_token;
        store.insert(one).await.unwrap();
        assert!(store.insert(dup).await.is_err());

        let next = store.insert(CreateRecordRequest::titled("two")).await.unwrap();
        assert_eq!(next, 2);
    }

    #[tokio::test]
    async fn test_update_attachment_field_touches_one_column() {
        let store = MemoryRecordStore::new();
        let id = store.insert(CreateRecordRequest::titled("A")).await.unwrap();
        let before = store.get(id).await.unwrap();

        store
            .update_attachment_field(id, AttachmentField::Solutions, "x.txt|||y.txt")
            .await
            .unwrap();

        let after = store.get(id).await.unwrap();
        assert_eq!(after.solutions_files, "x.txt|||y.txt");
        assert_eq!(after.root_cause_files, before.root_cause_files);
        assert_eq!(after.updated_at_utc, before.updated_at_utc);
    }

    #[tokio::test]
    async fn test_update_attachment_field_missing_record() {
        let store = MemoryRecordStore::new();
        let result = store
            .update_attachment_field(99, AttachmentField::Others, "")
            .await;
        assert!(matches!(result, Err(Error::RecordNotFound(99))));
    }

    #[tokio::test]
    async fn test_token_exists() {
        let store = MemoryRecordStore::new();
        let req = CreateRecordRequest::titled("A");
        let token = req.public_token;
        assert!(!store.token_exists(token).await.unwrap());

        store.insert(req).await.unwrap();
        assert!(store.token_exists(token).await.unwrap());
    }
}
