use std::collections::HashMap;

use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("no asset registered under key '{key}'")]
    UnknownKey { key: String },
}

/// Opaque handle to a loaded asset. The simulation never touches pixel
/// data; a renderer maps handles to whatever it loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AssetHandle(u64);

/// Key-to-handle registry. Registering the same key twice returns the
/// original handle, so defs can name assets without caring who loaded
/// them first.
#[derive(Debug, Default)]
pub struct AssetLibrary {
    next_id: u64,
    by_key: HashMap<String, AssetHandle>,
}

impl AssetLibrary {
    pub fn new() -> Self {
        AssetLibrary::default()
    }

    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut library = AssetLibrary::new();
        for key in keys {
            library.register(key.into());
        }
        library
    }

    pub fn register(&mut self, key: impl Into<String>) -> AssetHandle {
        let key = key.into();
        if let Some(handle) = self.by_key.get(&key) {
            return *handle;
        }
        let handle = AssetHandle(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        debug!(key = %key, "asset_registered");
        self.by_key.insert(key, handle);
        handle
    }

    pub fn get(&self, key: &str) -> Option<AssetHandle> {
        self.by_key.get(key).copied()
    }

    pub fn require(&self, key: &str) -> Result<AssetHandle, AssetError> {
        self.get(key).ok_or_else(|| AssetError::UnknownKey {
            key: key.to_string(),
        })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.by_key.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_is_idempotent_per_key() {
        let mut library = AssetLibrary::new();
        let first = library.register("bg/street");
        let again = library.register("bg/street");
        let other = library.register("bg/bar");
        assert_eq!(first, again);
        assert_ne!(first, other);
        assert_eq!(library.len(), 2);
    }

    #[test]
    fn require_reports_the_missing_key() {
        let library = AssetLibrary::from_keys(["bg/street"]);
        assert!(library.require("bg/street").is_ok());
        let err = library
            .require("bg/missing")
            .expect_err("key was never registered");
        assert!(err.to_string().contains("bg/missing"));
    }
}
