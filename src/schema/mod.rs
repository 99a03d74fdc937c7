//! Static description of every content collection the admin panel manages.

pub mod catalog;
pub mod column;
pub mod field;
pub mod models;

pub use catalog::{collection, tab, CollectionSpec, Tab, TabKind, COLLECTIONS, TABS, TEAM_TAB};
pub use column::ColumnProjection;
pub use field::{FieldDescriptor, FieldKind};
