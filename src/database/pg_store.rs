use async_trait::async_trait;
use serde_json::{json, Map, Value};
use sqlx::{PgPool, Row};
use tracing::{debug, error};

use crate::database::record::Record;
use crate::store::query::{quote_identifier, validate_identifier};
use crate::store::{DataStore, Query, Rpc, StoreError};

const UNIQUE_VIOLATION: &str = "23505";

/// `DataStore` over the hosted Postgres database.
///
/// Collections are addressed dynamically: rows come back through `row_to_json`
/// and drafts go in through `jsonb_populate_record`, so each column is cast by
/// Postgres from the draft's JSON text.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn columns(fields: &Map<String, Value>) -> Result<Vec<String>, StoreError> {
        let columns: Vec<String> = fields.keys().cloned().collect();
        for column in &columns {
            validate_identifier(column)?;
        }
        Ok(columns)
    }

    fn map_write_error(collection: &str, err: sqlx::Error) -> StoreError {
        if let sqlx::Error::Database(db) = &err {
            if db.code().as_deref() == Some(UNIQUE_VIOLATION) {
                return StoreError::constraint(collection, db.message());
            }
        }
        error!("Write on {} failed: {}", collection, err);
        StoreError::write(collection, err.to_string())
    }

    fn row_record(collection: &str, row: &sqlx::postgres::PgRow) -> Result<Record, StoreError> {
        let value: Value = row
            .try_get("row")
            .map_err(|e| StoreError::query(collection, e.to_string()))?;
        Record::from_json(value).map_err(|e| StoreError::query(collection, e.to_string()))
    }

    fn procedure_error(rpc: &Rpc, err: sqlx::Error) -> StoreError {
        error!("Procedure {} failed: {}", rpc.name(), err);
        StoreError::procedure(rpc.name(), err.to_string())
    }
}

#[async_trait]
impl DataStore for PgStore {
    async fn select(&self, collection: &str, query: &Query) -> Result<Vec<Record>, StoreError> {
        validate_identifier(collection)?;
        let (clause, params) = query.to_sql("t")?;
        let sql = format!(
            "SELECT row_to_json(t)::jsonb AS row FROM {} t{}",
            quote_identifier(collection),
            clause
        );
        debug!("select {}: {}", collection, sql);

        let mut q = sqlx::query(&sql);
        for param in params {
            q = q.bind(param);
        }
        let rows = q.fetch_all(&self.pool).await.map_err(|e| {
            error!("Query on {} failed: {}", collection, e);
            StoreError::query(collection, e.to_string())
        })?;

        rows.iter().map(|row| Self::row_record(collection, row)).collect()
    }

    async fn insert(&self, collection: &str, record: Record) -> Result<Record, StoreError> {
        validate_identifier(collection)?;
        let table = quote_identifier(collection);
        let fields = record.insertable_fields();
        let columns = Self::columns(&fields)?;

        let sql = if columns.is_empty() {
            format!("INSERT INTO {} AS t DEFAULT VALUES RETURNING row_to_json(t)::jsonb AS row", table)
        } else {
            let list = columns.iter().map(|c| quote_identifier(c)).collect::<Vec<_>>().join(", ");
            format!(
                "INSERT INTO {table} AS t ({list}) SELECT {list} FROM jsonb_populate_record(NULL::{table}, $1) \
                 RETURNING row_to_json(t)::jsonb AS row"
            )
        };
        debug!("insert {}: {} columns", collection, columns.len());

        let row = sqlx::query(&sql)
            .bind(Value::Object(fields))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| Self::map_write_error(collection, e))?;
        Self::row_record(collection, &row)
    }

    async fn update(&self, collection: &str, id: &str, record: Record) -> Result<Record, StoreError> {
        validate_identifier(collection)?;
        let table = quote_identifier(collection);
        let fields = record.writable_fields();
        let columns = Self::columns(&fields)?;
        if columns.is_empty() {
            return Err(StoreError::write(collection, "nothing to update"));
        }

        let list = columns.iter().map(|c| quote_identifier(c)).collect::<Vec<_>>().join(", ");
        let sql = format!(
            "UPDATE {table} AS t SET ({list}) = (SELECT {list} FROM jsonb_populate_record(NULL::{table}, $1)) \
             WHERE t.\"id\"::text = $2 RETURNING row_to_json(t)::jsonb AS row"
        );
        debug!("update {} id={}", collection, id);

        let row = sqlx::query(&sql)
            .bind(Value::Object(fields))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Self::map_write_error(collection, e))?
            .ok_or_else(|| StoreError::write(collection, format!("no row with id {}", id)))?;
        Self::row_record(collection, &row)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        validate_identifier(collection)?;
        let sql = format!("DELETE FROM {} WHERE \"id\"::text = $1", quote_identifier(collection));
        debug!("delete {} id={}", collection, id);

        sqlx::query(&sql)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| Self::map_write_error(collection, e))?;
        Ok(())
    }

    async fn upsert(&self, collection: &str, conflict_key: &str, record: Record) -> Result<Record, StoreError> {
        validate_identifier(collection)?;
        validate_identifier(conflict_key)?;
        let table = quote_identifier(collection);
        let fields = record.insertable_fields();
        let columns = Self::columns(&fields)?;
        if !columns.iter().any(|c| c == conflict_key) {
            return Err(StoreError::write(collection, format!("upsert requires '{}'", conflict_key)));
        }

        let list = columns.iter().map(|c| quote_identifier(c)).collect::<Vec<_>>().join(", ");
        let updates: Vec<String> = columns
            .iter()
            .filter(|c| c.as_str() != conflict_key && c.as_str() != "id")
            .map(|c| format!("{0} = EXCLUDED.{0}", quote_identifier(c)))
            .collect();
        let action = if updates.is_empty() {
            "DO NOTHING".to_string()
        } else {
            format!("DO UPDATE SET {}", updates.join(", "))
        };
        let sql = format!(
            "INSERT INTO {table} AS t ({list}) SELECT {list} FROM jsonb_populate_record(NULL::{table}, $1) \
             ON CONFLICT ({key}) {action} RETURNING row_to_json(t)::jsonb AS row",
            key = quote_identifier(conflict_key),
        );
        debug!("upsert {} on {}", collection, conflict_key);

        let row = sqlx::query(&sql)
            .bind(Value::Object(fields))
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Self::map_write_error(collection, e))?;
        match row {
            Some(row) => Self::row_record(collection, &row),
            None => Ok(record),
        }
    }

    async fn call(&self, rpc: Rpc) -> Result<Value, StoreError> {
        debug!("rpc {}", rpc.name());
        match &rpc {
            Rpc::CreateUserWithPassword { email, password } => {
                let row = sqlx::query(
                    "SELECT to_jsonb(create_user_with_password(email => $1, password => $2)) AS result",
                )
                .bind(email)
                .bind(password)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| Self::procedure_error(&rpc, e))?;
                row.try_get::<Option<Value>, _>("result")
                    .map(|v| v.unwrap_or(Value::Null))
                    .map_err(|e| Self::procedure_error(&rpc, e))
            }
            Rpc::GetUserIdByEmail { email } => {
                let row = sqlx::query("SELECT to_jsonb(get_user_id_by_email(user_email => $1)) AS result")
                    .bind(email)
                    .fetch_one(&self.pool)
                    .await
                    .map_err(|e| Self::procedure_error(&rpc, e))?;
                row.try_get::<Option<Value>, _>("result")
                    .map(|v| v.unwrap_or(Value::Null))
                    .map_err(|e| Self::procedure_error(&rpc, e))
            }
            Rpc::DeleteUserCompletely { user_id } => {
                sqlx::query("SELECT delete_user_completely(target_user_id => $1::uuid)")
                    .bind(user_id)
                    .execute(&self.pool)
                    .await
                    .map_err(|e| Self::procedure_error(&rpc, e))?;
                Ok(Value::Null)
            }
            Rpc::IsSuperAdmin { user_id } => {
                // is_super_admin() reads the caller from the request claims
                let mut tx = self.pool.begin().await.map_err(|e| Self::procedure_error(&rpc, e))?;
                sqlx::query("SELECT set_config('request.jwt.claims', $1, true)")
                    .bind(json!({"sub": user_id, "role": "authenticated"}).to_string())
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| Self::procedure_error(&rpc, e))?;
                let row = sqlx::query("SELECT COALESCE(is_super_admin(), false) AS result")
                    .fetch_one(&mut *tx)
                    .await
                    .map_err(|e| Self::procedure_error(&rpc, e))?;
                let is_admin: bool = row.try_get("result").map_err(|e| Self::procedure_error(&rpc, e))?;
                tx.commit().await.map_err(|e| Self::procedure_error(&rpc, e))?;
                Ok(Value::Bool(is_admin))
            }
        }
    }

    async fn ping(&self) -> Result<(), StoreError> {
        super::manager::DatabaseManager::health_check(&self.pool)
            .await
            .map_err(StoreError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::record::SYSTEM_FIELDS;

    #[test]
    fn update_columns_skip_system_fields() {
        let record = Record::from_json(json!({"id": "1", "created_at": "x", "title": "t"})).unwrap();
        assert_eq!(PgStore::columns(&record.writable_fields()).unwrap(), vec!["title".to_string()]);
        assert!(SYSTEM_FIELDS.contains(&"id"));
    }

    #[test]
    fn team_row_insert_keeps_the_user_id() {
        let mut row = Record::new();
        row.set("id", "user-uuid").set("role", "editor");

        let fields = row.insertable_fields();
        let columns = PgStore::columns(&fields).unwrap();
        assert!(columns.contains(&"id".to_string()));
        assert!(columns.contains(&"role".to_string()));
        assert_eq!(Value::Object(fields), json!({"id": "user-uuid", "role": "editor"}));
    }

    #[test]
    fn column_names_are_validated() {
        let record = Record::from_json(json!({"bad name": "t"})).unwrap();
        assert!(matches!(PgStore::columns(&record.insertable_fields()), Err(StoreError::InvalidIdentifier(_))));
    }
}
