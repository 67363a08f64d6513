//! Save/load helpers on top of [`Storage`]
//!
//! Features:
//! - JSON payloads via serde
//! - Corruption/absence falls back to defaults (never surfaced to the player)
//! - Visit-level counter with session-storage and in-memory fallback

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::platform::Storage;
use crate::tuning::LEVEL_COUNT;

/// Key of the persisted visit-level counter
pub const LEVEL_COUNTER_KEY: &str = "control_room_tennis_level";

/// Load a JSON value, falling back to `T::default()` when missing or corrupt
pub fn load_json<T: DeserializeOwned + Default>(storage: &dyn Storage, key: &str) -> T {
    let Some(json) = storage.get_item(key) else {
        log::info!("No saved data under {}, starting fresh", key);
        return T::default();
    };

    match serde_json::from_str(&json) {
        Ok(value) => value,
        Err(e) => {
            log::warn!("Discarding corrupt data under {}: {}", key, e);
            T::default()
        }
    }
}

/// Save a JSON value. Returns false if serialization or the store failed.
pub fn save_json<T: Serialize>(storage: &mut dyn Storage, key: &str, value: &T) -> bool {
    match serde_json::to_string(value) {
        Ok(json) => {
            let stored = storage.set_item(key, &json);
            if !stored {
                log::warn!("Storage rejected write to {}", key);
            }
            stored
        }
        Err(e) => {
            log::warn!("Failed to serialize {}: {}", key, e);
            false
        }
    }
}

/// Advance the visit counter by one (1..=6, wrapping) and return the new level
///
/// Tries `primary`, then `fallback`; if neither can hold the counter the level
/// defaults to 1.
pub fn advance_visit_level(primary: &mut dyn Storage, fallback: Option<&mut dyn Storage>) -> u8 {
    if let Some(level) = advance_in(primary) {
        log::info!("Visit level {}", level);
        return level;
    }

    if let Some(store) = fallback {
        log::warn!("Level counter unavailable in primary storage, using session storage");
        if let Some(level) = advance_in(store) {
            log::info!("Visit level {} (session)", level);
            return level;
        }
    }

    log::warn!("No storage for level counter, defaulting to level 1");
    1
}

fn advance_in(store: &mut dyn Storage) -> Option<u8> {
    let current = store
        .get_item(LEVEL_COUNTER_KEY)
        .and_then(|v| v.trim().parse::<u8>().ok())
        .filter(|level| (1..=LEVEL_COUNT).contains(level))
        .unwrap_or(0);
    let next = current % LEVEL_COUNT + 1;

    store
        .set_item(LEVEL_COUNTER_KEY, &next.to_string())
        .then_some(next)
}
