//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Wall-clock time (score timestamps)
//! - Calendar date (daily challenge, login streak)
//! - Default storage backend

use chrono::NaiveDate;

use crate::persistence::KeyValueStore;

/// Milliseconds since the Unix epoch
#[cfg(target_arch = "wasm32")]
pub fn now_ms() -> f64 {
    js_sys::Date::now()
}

/// Milliseconds since the Unix epoch
#[cfg(not(target_arch = "wasm32"))]
pub fn now_ms() -> f64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or(0.0)
}

/// Today's local calendar date
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// LocalStorage in the browser
#[cfg(target_arch = "wasm32")]
pub fn default_store() -> Box<dyn KeyValueStore> {
    Box::new(crate::persistence::LocalStore::new())
}

/// JSON files under `$PACHINKO_DATA_DIR` (default `./pachinko-data`)
#[cfg(not(target_arch = "wasm32"))]
pub fn default_store() -> Box<dyn KeyValueStore> {
    let dir = std::env::var("PACHINKO_DATA_DIR").unwrap_or_else(|_| "pachinko-data".to_string());
    log::info!("Using file storage at {}", dir);
    Box::new(crate::persistence::FileStore::new(dir))
}
