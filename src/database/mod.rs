pub mod manager;
pub mod pg_store;
pub mod record;

pub use manager::{DatabaseError, DatabaseManager};
pub use pg_store::PgStore;
pub use record::{Record, RecordError, SYSTEM_FIELDS};
