pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod editor;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod schema;
pub mod section;
pub mod settings;
pub mod shell;
pub mod store;
pub mod table;
pub mod team;
pub mod testing;
pub mod types;

pub use handlers::{app, AppState};
