//! Site-wide settings shared by the public pages and the admin shell.
//!
//! The recruitment flag lives in `app_settings` under `recruitment_status`.
//! Readers get the cached value or a `watch` receiver; only the admin
//! surfaces call [`SettingsStore::set`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::database::record::Record;
use crate::store::{DataStore, Query, StoreError};

pub const SETTINGS_TABLE: &str = "app_settings";
pub const RECRUITMENT_KEY: &str = "recruitment_status";

/// Whether applications are currently accepted. A missing row means closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RecruitmentFlag {
    #[serde(rename = "isOpen")]
    pub is_open: bool,
}

impl RecruitmentFlag {
    pub fn open() -> Self {
        Self { is_open: true }
    }

    pub fn closed() -> Self {
        Self { is_open: false }
    }
}

pub struct SettingsStore {
    store: Arc<dyn DataStore>,
    tx: watch::Sender<RecruitmentFlag>,
}

impl SettingsStore {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        let (tx, _rx) = watch::channel(RecruitmentFlag::default());
        Self { store, tx }
    }

    /// Last known value
    pub fn get(&self) -> RecruitmentFlag {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<RecruitmentFlag> {
        self.tx.subscribe()
    }

    /// Read the flag from the backend and publish it
    pub async fn refresh(&self) -> Result<RecruitmentFlag, StoreError> {
        let query = Query::new().eq("key", RECRUITMENT_KEY);
        let rows = self.store.select(SETTINGS_TABLE, &query).await?;

        let flag = match rows.first().and_then(|row| row.get("value")) {
            Some(value) => serde_json::from_value(value.clone()).unwrap_or_else(|e| {
                warn!("Malformed {} setting, treating as closed: {}", RECRUITMENT_KEY, e);
                RecruitmentFlag::closed()
            }),
            None => RecruitmentFlag::closed(),
        };
        self.tx.send_replace(flag);
        Ok(flag)
    }

    /// Persist the flag, then publish it to every subscriber
    pub async fn set(&self, flag: RecruitmentFlag) -> Result<(), StoreError> {
        let mut row = Record::new();
        row.set("key", RECRUITMENT_KEY).set("value", json!(flag));
        self.store.upsert(SETTINGS_TABLE, "key", row).await?;

        self.tx.send_replace(flag);
        info!("Recruitment is now {}", if flag.is_open { "open" } else { "closed" });
        Ok(())
    }

    /// Flip the stored value; reads the backend first so a stale cache is never inverted
    pub async fn toggle(&self) -> Result<RecruitmentFlag, StoreError> {
        let current = self.refresh().await?;
        let next = RecruitmentFlag { is_open: !current.is_open };
        self.set(next).await?;
        Ok(next)
    }
}
