//! Shared params type for service calls.
//!
//! The REST adapter fills `query` from the request's query string; stores
//! read filters through the typed accessors. Internal callers (import, tests)
//! usually pass `AlbumParams::default()`.

use std::collections::HashMap;

use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct AlbumParams {
    /// "rest" for HTTP calls, empty for internal calls.
    pub provider: String,
    pub query: HashMap<String, String>,
}

impl AlbumParams {
    pub fn rest(query: HashMap<String, String>) -> Self {
        Self {
            provider: "rest".to_string(),
            query,
        }
    }

    /// A query value, trimmed; empty values count as absent.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.query
            .get(key)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }

    /// `searchText` filter, lowercased for case-insensitive matching.
    pub fn search_text(&self) -> Option<String> {
        self.get("searchText").map(|s| s.to_lowercase())
    }

    pub fn uuid_param(&self, key: &str) -> Option<Uuid> {
        self.get(key).and_then(|s| Uuid::parse_str(s).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_values_are_absent() {
        let mut query = HashMap::new();
        query.insert("searchText".to_string(), "  ".to_string());
        query.insert("locationId".to_string(), "not-a-uuid".to_string());
        let params = AlbumParams::rest(query);
        assert_eq!(params.search_text(), None);
        assert_eq!(params.uuid_param("locationId"), None);
        assert_eq!(params.uuid_param("missing"), None);
    }

    #[test]
    fn search_text_lowercases() {
        let mut query = HashMap::new();
        query.insert("searchText".to_string(), "Sunset".to_string());
        let params = AlbumParams::rest(query);
        assert_eq!(params.search_text().as_deref(), Some("sunset"));
    }
}
