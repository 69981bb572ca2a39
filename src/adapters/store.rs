//! In-memory persistence and settings adapters.
//!
//! [`MemoryStore`] implements [`PersistencePort`] for the host build and
//! the demo: accident records, alert records and the user directory live
//! as postcard blobs under namespaced keys (`ns::key`), the same layout a
//! remote document store would use.  [`MemorySettings`] implements
//! [`SettingsPort`] and validates values before accepting them.

use core::time::Duration;
use std::collections::BTreeMap;

use log::{debug, info, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::app::ports::{KEY_EMERGENCY_NUMBER, KEY_USER_NAME, PersistencePort, SettingsPort};
use crate::error::ProviderError;
use crate::model::{AccidentRecord, AlertRecord, Coordinate, ImpactEvent, UserDirectoryEntry};

const ACCIDENT_NS: &str = "accident_events";
const ALERT_NS: &str = "alerts";
const USER_NS: &str = "users";

/// Longest display name accepted by [`MemorySettings`].
const MAX_NAME_LEN: usize = 64;

fn composite_key(namespace: &str, key: &str) -> String {
    format!("{}::{}", namespace, key)
}

// ───────────────────────────────────────────────────────────────
// Persistence
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MemoryStore {
    blobs: BTreeMap<String, Vec<u8>>,
    next_accident: u32,
    next_alert: u32,
    /// Simulated outage: every call fails with `Unavailable`.
    offline: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        info!("MemoryStore: simulation backend");
        Self::default()
    }

    pub fn set_offline(&mut self, offline: bool) {
        self.offline = offline;
    }

    /// Add or replace a directory entry.
    pub fn register_user(&mut self, entry: &UserDirectoryEntry) -> Result<(), ProviderError> {
        self.put(USER_NS, &entry.user_id, entry)
    }

    pub fn accident_record(&self, record_id: &str) -> Option<AccidentRecord> {
        self.get(ACCIDENT_NS, record_id)
    }

    pub fn accident_count(&self) -> usize {
        self.list::<AccidentRecord>(ACCIDENT_NS).len()
    }

    /// Alerts addressed to `user_id`, oldest first.
    pub fn alerts_for(&self, user_id: &str) -> Vec<AlertRecord> {
        self.list::<AlertRecord>(ALERT_NS)
            .into_iter()
            .filter(|a| a.recipient_user_id == user_id)
            .collect()
    }

    fn check_online(&self) -> Result<(), ProviderError> {
        if self.offline {
            warn!("MemoryStore: offline");
            Err(ProviderError::Unavailable)
        } else {
            Ok(())
        }
    }

    fn put<T: Serialize>(&mut self, ns: &str, key: &str, value: &T) -> Result<(), ProviderError> {
        let bytes =
            postcard::to_allocvec(value).map_err(|_| ProviderError::Failed("encode failed"))?;
        self.blobs.insert(composite_key(ns, key), bytes);
        Ok(())
    }

    fn get<T: DeserializeOwned>(&self, ns: &str, key: &str) -> Option<T> {
        let bytes = self.blobs.get(&composite_key(ns, key))?;
        postcard::from_bytes(bytes).ok()
    }

    /// Every decodable value in `ns`, in key order.
    fn list<T: DeserializeOwned>(&self, ns: &str) -> Vec<T> {
        let prefix = composite_key(ns, "");
        self.blobs
            .range(prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(&prefix))
            .filter_map(|(k, bytes)| match postcard::from_bytes(bytes) {
                Ok(v) => Some(v),
                Err(_) => {
                    warn!("MemoryStore: corrupted blob at {}", k);
                    None
                }
            })
            .collect()
    }
}

impl PersistencePort for MemoryStore {
    fn create_accident_record(
        &mut self,
        event: &ImpactEvent,
        coordinate: Option<Coordinate>,
        created_at_ms: i64,
        timeout: Duration,
    ) -> Result<String, ProviderError> {
        self.check_online()?;
        self.next_accident += 1;
        let id = format!("acc-{:06}", self.next_accident);
        let record = AccidentRecord::from_event(id.clone(), event, coordinate, created_at_ms);
        self.put(ACCIDENT_NS, &id, &record)?;
        debug!("MemoryStore: {} written (budget {:?})", id, timeout);
        Ok(id)
    }

    fn create_alert_record(
        &mut self,
        record: &AlertRecord,
        _timeout: Duration,
    ) -> Result<(), ProviderError> {
        self.check_online()?;
        self.next_alert += 1;
        let key = format!("{:06}", self.next_alert);
        self.put(ALERT_NS, &key, record)
    }

    fn list_users(&mut self, _timeout: Duration) -> Result<Vec<UserDirectoryEntry>, ProviderError> {
        self.check_online()?;
        Ok(self.list(USER_NS))
    }
}

// ───────────────────────────────────────────────────────────────
// Settings
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MemorySettings {
    values: BTreeMap<String, String>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and store a setting.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ProviderError> {
        let value = value.trim();
        match key {
            KEY_EMERGENCY_NUMBER => validate_phone(value)?,
            KEY_USER_NAME => {
                if value.is_empty() || value.chars().count() > MAX_NAME_LEN {
                    return Err(ProviderError::Failed("user name must be 1–64 characters"));
                }
            }
            _ => return Err(ProviderError::Failed("unknown settings key")),
        }
        self.values.insert(key.to_owned(), value.to_owned());
        info!("MemorySettings: '{}' updated", key);
        Ok(())
    }

    pub fn remove(&mut self, key: &str) {
        self.values.remove(key);
    }
}

impl SettingsPort for MemorySettings {
    fn get(&self, key: &str) -> Result<Option<String>, ProviderError> {
        Ok(self.values.get(key).cloned())
    }
}

/// Optional leading `+`, then 3–20 digits; spaces and dashes ignored.
pub fn validate_phone(number: &str) -> Result<(), ProviderError> {
    let body = number.strip_prefix('+').unwrap_or(number);
    let mut digits = 0usize;
    for c in body.chars() {
        match c {
            '0'..='9' => digits += 1,
            ' ' | '-' => {}
            _ => return Err(ProviderError::Failed("phone number has invalid characters")),
        }
    }
    if !(3..=20).contains(&digits) {
        return Err(ProviderError::Failed("phone number must have 3–20 digits"));
    }
    Ok(())
}
