//! Key/value storage
//!
//! LocalStorage/SessionStorage on web, an in-memory map everywhere else.

use std::collections::HashMap;

/// String key/value store the core persists into
pub trait Storage {
    fn get_item(&self, key: &str) -> Option<String>;

    /// Returns false when the store could not take the write
    fn set_item(&mut self, key: &str, value: &str) -> bool;
}

/// In-memory store (native builds, tests, last-resort fallback)
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: HashMap<String, String>,
    unavailable: bool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that rejects every read and write, like blocked browser storage
    pub fn unavailable() -> Self {
        Self {
            items: HashMap::new(),
            unavailable: true,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        if self.unavailable {
            return None;
        }
        self.items.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: &str) -> bool {
        if self.unavailable {
            return false;
        }
        self.items.insert(key.to_string(), value.to_string());
        true
    }
}

/// Browser Web Storage (WASM only)
#[cfg(target_arch = "wasm32")]
pub struct WebStorage {
    inner: Option<web_sys::Storage>,
}

#[cfg(target_arch = "wasm32")]
impl WebStorage {
    /// `window.localStorage`, if the browser allows it
    pub fn local() -> Self {
        let inner = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();
        if inner.is_none() {
            log::warn!("LocalStorage unavailable");
        }
        Self { inner }
    }

    /// `window.sessionStorage`, if the browser allows it
    pub fn session() -> Self {
        let inner = web_sys::window()
            .and_then(|w| w.session_storage().ok())
            .flatten();
        if inner.is_none() {
            log::warn!("SessionStorage unavailable");
        }
        Self { inner }
    }
}

#[cfg(target_arch = "wasm32")]
impl Storage for WebStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.inner.as_ref()?.get_item(key).ok().flatten()
    }

    fn set_item(&mut self, key: &str, value: &str) -> bool {
        self.inner
            .as_ref()
            .map(|s| s.set_item(key, value).is_ok())
            .unwrap_or(false)
    }
}
