//! Minimal string key/value configuration, layered by the application:
//! defaults first, then `ALBUM__…` environment overrides
//! (`ALBUM__HTTP__PORT=8080` → `http.port`).

use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct AlbumConfig {
    values: HashMap<String, String>,
}

impl AlbumConfig {
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    /// Set a configuration key to a string value.
    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.values.insert(key.into(), value.into());
    }

    /// Get a configuration value by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn snapshot(&self) -> AlbumConfigSnapshot {
        AlbumConfigSnapshot::new(self.values.clone())
    }

    /// Overlay environment variables carrying the given prefix.
    ///
    /// `ALBUM__IMAGES__FOLDER=/srv/photos` becomes `images.folder`.
    pub fn load_env(&mut self, prefix: &str) {
        for (key, value) in std::env::vars() {
            if let Some(stripped) = key.strip_prefix(prefix) {
                let normalized = stripped.to_lowercase().replace("__", ".");
                self.set(normalized, value);
            }
        }
    }
}

/// An immutable copy handed to request handlers and hooks.
#[derive(Debug, Clone, Default)]
pub struct AlbumConfigSnapshot {
    map: HashMap<String, String>,
}

impl AlbumConfigSnapshot {
    pub(crate) fn new(map: HashMap<String, String>) -> Self {
        Self { map }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(|s| s.as_str())
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    pub fn get_usize(&self, key: &str) -> Option<usize> {
        self.get(key).and_then(|v| v.parse::<usize>().ok())
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|v| v.parse::<bool>().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get() {
        let mut cfg = AlbumConfig::new();
        cfg.set("http.port", "3030");
        assert_eq!(cfg.get("http.port"), Some("3030"));
        assert!(cfg.has("http.port"));
        assert!(!cfg.has("http.host"));
    }

    #[test]
    fn env_overlay_normalizes_keys() {
        std::env::set_var("ALBUMTEST__IMAGES__FOLDER", "/srv/photos");
        let mut cfg = AlbumConfig::new();
        cfg.load_env("ALBUMTEST__");
        assert_eq!(cfg.get("images.folder"), Some("/srv/photos"));
        std::env::remove_var("ALBUMTEST__IMAGES__FOLDER");
    }

    #[test]
    fn snapshot_typed_getters() {
        let mut cfg = AlbumConfig::new();
        cfg.set("paginate.max", "50");
        cfg.set("photos.embedLocation", "true");
        let snap = cfg.snapshot();
        assert_eq!(snap.get_usize("paginate.max"), Some(50));
        assert_eq!(snap.get_bool("photos.embedLocation"), Some(true));
        assert_eq!(snap.get_string("missing"), None);
    }
}
