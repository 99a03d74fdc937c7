//! In-memory backend for tests.
//!
//! `MemoryStore` implements both [`DataStore`] and [`BlobStore`], records
//! every call in order, and can be told to fail a class of operation.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{Duration, SecondsFormat, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::database::record::Record;
use crate::store::{BlobStore, DataStore, Query, Rpc, StoreError};

const USERS_VIEW: &str = "admin_users_view";
const ADMINS: &str = "admins";

/// One observed call against the store
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    Select { collection: String },
    Insert { collection: String, record: Record },
    Update { collection: String, id: String, record: Record },
    Delete { collection: String, id: String },
    Upsert { collection: String, conflict_key: String, record: Record },
    Call { procedure: &'static str },
    Upload { bucket: String, path: String },
}

impl StoreCall {
    pub fn collection(&self) -> Option<&str> {
        match self {
            StoreCall::Select { collection }
            | StoreCall::Insert { collection, .. }
            | StoreCall::Update { collection, .. }
            | StoreCall::Delete { collection, .. }
            | StoreCall::Upsert { collection, .. } => Some(collection),
            StoreCall::Call { .. } | StoreCall::Upload { .. } => None,
        }
    }
}

/// Operation classes that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailOn {
    Select,
    Insert,
    Update,
    Delete,
    Upsert,
    Call,
    Upload,
}

#[derive(Default)]
struct Inner {
    tables: HashMap<String, Vec<Record>>,
    /// Auth users as (id, email)
    users: Vec<(String, String)>,
    calls: Vec<StoreCall>,
    failures: Vec<FailOn>,
    procedures: HashMap<&'static str, Result<Value, StoreError>>,
    sequence: i64,
}

impl Inner {
    fn stamp(&mut self, record: &mut Record) {
        if record.id().is_none() {
            record.set("id", Uuid::new_v4().to_string());
        }
        if record.is_blank("created_at") {
            self.sequence += 1;
            let at = Utc::now() + Duration::microseconds(self.sequence);
            record.set("created_at", at.to_rfc3339_opts(SecondsFormat::Micros, true));
        }
    }

    fn failing(&self, op: FailOn) -> bool {
        self.failures.contains(&op)
    }

    /// Rows of `admin_users_view`: admins joined with auth users
    fn users_view(&self) -> Vec<Record> {
        self.tables
            .get(ADMINS)
            .map(|admins| {
                admins
                    .iter()
                    .map(|admin| {
                        let id = admin.id().unwrap_or_default();
                        let email = self
                            .users
                            .iter()
                            .find(|(uid, _)| *uid == id)
                            .map(|(_, email)| email.clone())
                            .unwrap_or_default();
                        let mut row = admin.clone();
                        row.set("email", email);
                        row
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Add rows directly, without recording calls. Missing ids and timestamps are filled in.
    pub fn seed(&self, collection: &str, rows: Vec<Value>) -> Vec<Record> {
        let mut inner = self.lock();
        let mut seeded = Vec::with_capacity(rows.len());
        for row in rows {
            let Ok(mut record) = Record::from_json(row) else { continue };
            inner.stamp(&mut record);
            seeded.push(record.clone());
            inner.tables.entry(collection.to_string()).or_default().push(record);
        }
        seeded
    }

    /// Register an auth user and return its id
    pub fn add_user(&self, email: &str) -> String {
        let id = Uuid::new_v4().to_string();
        self.lock().users.push((id.clone(), email.to_string()));
        id
    }

    pub fn user_id(&self, email: &str) -> Option<String> {
        self.lock().users.iter().find(|(_, e)| e == email).map(|(id, _)| id.clone())
    }

    /// Make every operation of this class fail from now on
    pub fn fail_on(&self, op: FailOn) {
        self.lock().failures.push(op);
    }

    pub fn recover(&self) {
        self.lock().failures.clear();
    }

    /// Fix the outcome of a stored procedure
    pub fn on_procedure(&self, name: &'static str, outcome: Result<Value, StoreError>) {
        self.lock().procedures.insert(name, outcome);
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Stored rows in insertion order
    pub fn rows(&self, collection: &str) -> Vec<Record> {
        let inner = self.lock();
        if collection == USERS_VIEW {
            return inner.users_view();
        }
        inner.tables.get(collection).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl DataStore for MemoryStore {
    async fn select(&self, collection: &str, query: &Query) -> Result<Vec<Record>, StoreError> {
        let mut inner = self.lock();
        inner.calls.push(StoreCall::Select { collection: collection.to_string() });
        query.validate()?;
        if inner.failing(FailOn::Select) {
            return Err(StoreError::query(collection, "injected failure"));
        }

        let rows = if collection == USERS_VIEW {
            inner.users_view()
        } else {
            inner.tables.get(collection).cloned().unwrap_or_default()
        };
        let mut rows: Vec<Record> = rows.into_iter().filter(|r| query.matches(r)).collect();
        query.sort(&mut rows);
        Ok(rows)
    }

    async fn insert(&self, collection: &str, record: Record) -> Result<Record, StoreError> {
        let mut inner = self.lock();
        inner.calls.push(StoreCall::Insert { collection: collection.to_string(), record: record.clone() });
        if inner.failing(FailOn::Insert) {
            return Err(StoreError::write(collection, "injected failure"));
        }

        let mut row = Record::from_map(record.insertable_fields());
        if let Some(id) = row.id() {
            let taken = inner
                .tables
                .get(collection)
                .map(|rows| rows.iter().any(|r| r.id().as_deref() == Some(id.as_str())))
                .unwrap_or(false);
            if taken {
                return Err(StoreError::constraint(collection, format!("duplicate key id={}", id)));
            }
        }
        inner.stamp(&mut row);
        inner.tables.entry(collection.to_string()).or_default().push(row.clone());
        Ok(row)
    }

    async fn update(&self, collection: &str, id: &str, record: Record) -> Result<Record, StoreError> {
        let mut inner = self.lock();
        inner.calls.push(StoreCall::Update {
            collection: collection.to_string(),
            id: id.to_string(),
            record: record.clone(),
        });
        if inner.failing(FailOn::Update) {
            return Err(StoreError::write(collection, "injected failure"));
        }

        let row = inner
            .tables
            .get_mut(collection)
            .and_then(|rows| rows.iter_mut().find(|r| r.id().as_deref() == Some(id)))
            .ok_or_else(|| StoreError::write(collection, format!("no row with id {}", id)))?;
        for (key, value) in record.writable_fields() {
            row.set(key, value);
        }
        Ok(row.clone())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let mut inner = self.lock();
        inner.calls.push(StoreCall::Delete { collection: collection.to_string(), id: id.to_string() });
        if inner.failing(FailOn::Delete) {
            return Err(StoreError::write(collection, "injected failure"));
        }
        if let Some(rows) = inner.tables.get_mut(collection) {
            rows.retain(|r| r.id().as_deref() != Some(id));
        }
        Ok(())
    }

    async fn upsert(&self, collection: &str, conflict_key: &str, record: Record) -> Result<Record, StoreError> {
        let mut inner = self.lock();
        inner.calls.push(StoreCall::Upsert {
            collection: collection.to_string(),
            conflict_key: conflict_key.to_string(),
            record: record.clone(),
        });
        if inner.failing(FailOn::Upsert) {
            return Err(StoreError::write(collection, "injected failure"));
        }

        let key = record
            .get(conflict_key)
            .cloned()
            .ok_or_else(|| StoreError::write(collection, format!("upsert requires '{}'", conflict_key)))?;
        let rows = inner.tables.entry(collection.to_string()).or_default();
        if let Some(row) = rows.iter_mut().find(|r| r.get(conflict_key) == Some(&key)) {
            for (k, v) in record.writable_fields() {
                row.set(k, v);
            }
            return Ok(row.clone());
        }

        let mut row = Record::from_map(record.insertable_fields());
        inner.stamp(&mut row);
        inner.tables.entry(collection.to_string()).or_default().push(row.clone());
        Ok(row)
    }

    async fn call(&self, rpc: Rpc) -> Result<Value, StoreError> {
        let mut inner = self.lock();
        inner.calls.push(StoreCall::Call { procedure: rpc.name() });
        if inner.failing(FailOn::Call) {
            return Err(StoreError::procedure(rpc.name(), "injected failure"));
        }
        if let Some(outcome) = inner.procedures.get(rpc.name()) {
            return outcome.clone();
        }

        match rpc {
            Rpc::CreateUserWithPassword { email, .. } => {
                if inner.users.iter().any(|(_, e)| *e == email) {
                    return Err(StoreError::procedure("create_user_with_password", "user already exists"));
                }
                let id = Uuid::new_v4().to_string();
                inner.users.push((id.clone(), email));
                Ok(Value::String(id))
            }
            Rpc::GetUserIdByEmail { email } => Ok(inner
                .users
                .iter()
                .find(|(_, e)| *e == email)
                .map(|(id, _)| Value::String(id.clone()))
                .unwrap_or(Value::Null)),
            Rpc::DeleteUserCompletely { user_id } => {
                inner.users.retain(|(id, _)| *id != user_id);
                if let Some(admins) = inner.tables.get_mut(ADMINS) {
                    admins.retain(|r| r.id().as_deref() != Some(user_id.as_str()));
                }
                Ok(Value::Null)
            }
            Rpc::IsSuperAdmin { user_id } => {
                let is_admin = inner
                    .tables
                    .get(ADMINS)
                    .map(|rows| {
                        rows.iter().any(|r| r.id().as_deref() == Some(user_id.as_str()) && r.text("role") == "admin")
                    })
                    .unwrap_or(false);
                Ok(json!(is_admin))
            }
        }
    }
}

#[async_trait]
impl BlobStore for MemoryStore {
    async fn upload_blob(&self, bucket: &str, path: &str, _bytes: Vec<u8>) -> Result<String, StoreError> {
        let mut inner = self.lock();
        inner.calls.push(StoreCall::Upload { bucket: bucket.to_string(), path: path.to_string() });
        if inner.failing(FailOn::Upload) {
            return Err(StoreError::Upload("injected failure".to_string()));
        }
        Ok(format!("memory://{}/{}", bucket, path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::OrderBy;

    #[tokio::test]
    async fn insert_keeps_only_insertable_fields() {
        let store = MemoryStore::new();
        let draft = json!({"id": " ", "created_at": "1999-01-01T00:00:00Z", "title": "x"});
        let row = store.insert("faqs", Record::from_json(draft).unwrap()).await.unwrap();
        assert!(row.id().is_some_and(|id| !id.trim().is_empty()));
        assert_ne!(row.text("created_at"), "1999-01-01T00:00:00Z");

        let admin = Record::from_json(json!({"id": "user-uuid", "role": "editor"})).unwrap();
        let row = store.insert(ADMINS, admin).await.unwrap();
        assert_eq!(row.id().as_deref(), Some("user-uuid"));
    }

    #[tokio::test]
    async fn insert_assigns_identity_and_rejects_duplicates() {
        let store = MemoryStore::new();
        let row = store.insert("faqs", Record::from_json(json!({"question": "Q"})).unwrap()).await.unwrap();
        assert!(row.id().is_some());
        assert!(row.created_at().is_some());

        let dup = Record::from_json(json!({"id": row.id()})).unwrap();
        let err = store.insert("faqs", dup).await.unwrap_err();
        assert!(err.is_constraint_violation());
    }

    #[tokio::test]
    async fn select_sorts_and_filters() {
        let store = MemoryStore::new();
        store.seed("company_values", vec![json!({"display_order": 2, "k": "b"}), json!({"display_order": 1, "k": "a"})]);
        let rows = store
            .select("company_values", &Query::new().order_by(OrderBy::asc("display_order")))
            .await
            .unwrap();
        assert_eq!(rows[0].text("k"), "a");

        let rows = store.select("company_values", &Query::new().eq("k", "b")).await.unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn users_view_joins_admins_with_emails() {
        let store = MemoryStore::new();
        let id = store.add_user("ola@rekordit.pl");
        store.insert(ADMINS, Record::from_json(json!({"id": id, "role": "editor"})).unwrap()).await.unwrap();
        let rows = store.select(USERS_VIEW, &Query::new()).await.unwrap();
        assert_eq!(rows[0].text("email"), "ola@rekordit.pl");

        store.call(Rpc::DeleteUserCompletely { user_id: id }).await.unwrap();
        assert!(store.rows(USERS_VIEW).is_empty());
    }

    #[tokio::test]
    async fn injected_failures_are_reported() {
        let store = MemoryStore::new();
        store.fail_on(FailOn::Select);
        assert!(matches!(store.select("faqs", &Query::new()).await, Err(StoreError::Query { .. })));
        store.recover();
        assert!(store.select("faqs", &Query::new()).await.is_ok());
        assert_eq!(store.calls().len(), 2);
    }
}
