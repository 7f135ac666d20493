//! Caller identity extraction.
//!
//! Supports bearer JWTs (HS256, `sub` carries the caller id, `name` the
//! optional display name) and, for simple deployments without an identity
//! provider, the `x-user-id` / `x-user-name` header pair. A request carrying
//! neither is anonymous and is rejected before any entity access.

use anyhow::Result;
use axum::http::HeaderMap;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use uuid::Uuid;

use album_core::errors::AlbumError;
use album_core::CallerIdentity;

#[derive(Clone, Debug, Default)]
pub struct AuthSettings {
    secret: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
    name: Option<String>,
}

impl AuthSettings {
    pub fn new(secret: Option<String>) -> Self {
        Self { secret }
    }

    pub fn caller_from_headers(&self, headers: &HeaderMap) -> Result<CallerIdentity> {
        if let Some(token) = extract_bearer_token(headers) {
            return self.verify(&token);
        }

        if let Some(raw) = headers.get("x-user-id").and_then(|v| v.to_str().ok()) {
            let id = Uuid::parse_str(raw.trim()).map_err(|_| {
                AlbumError::not_authenticated("x-user-id is not a valid uuid").into_anyhow()
            })?;
            let mut caller = CallerIdentity::new(id);
            if let Some(name) = headers
                .get("x-user-name")
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|s| !s.is_empty())
            {
                caller = caller.with_display_name(name);
            }
            return Ok(caller);
        }

        Err(AlbumError::not_authenticated("Authentication required").into_anyhow())
    }

    fn verify(&self, token: &str) -> Result<CallerIdentity> {
        let secret = self.secret.as_ref().ok_or_else(|| {
            AlbumError::not_authenticated("JWT secret is not configured").into_anyhow()
        })?;

        let validation = Validation::new(Algorithm::HS256);
        let decoded = decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &validation,
        )
        .map_err(|e| AlbumError::not_authenticated(e.to_string()).into_anyhow())?;

        let id = Uuid::parse_str(&decoded.claims.sub).map_err(|_| {
            AlbumError::not_authenticated("Token subject is not a valid uuid").into_anyhow()
        })?;

        let mut caller = CallerIdentity::new(id);
        if let Some(name) = decoded.claims.name.filter(|s| !s.trim().is_empty()) {
            caller = caller.with_display_name(name.trim());
        }
        Ok(caller)
    }
}

pub fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let v = headers.get("authorization")?.to_str().ok()?.trim();
    let prefix = "Bearer ";
    if v.len() <= prefix.len() || !v.starts_with(prefix) {
        return None;
    }
    Some(v[prefix.len()..].trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    fn token(secret: &str, sub: &str, name: Option<&str>) -> String {
        let exp = (unix_now() + 3600) as usize;
        let mut claims = json!({ "sub": sub, "exp": exp });
        if let Some(name) = name {
            claims["name"] = json!(name);
        }
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn unix_now() -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_secs()
    }

    fn kind(err: &anyhow::Error) -> album_core::ErrorKind {
        AlbumError::from_anyhow(err).unwrap().kind
    }

    #[test]
    fn valid_bearer_token_yields_the_subject() {
        let auth = AuthSettings::new(Some("s3cret".to_string()));
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(
            "authorization",
            HeaderValue::from_str(&format!(
                "Bearer {}",
                token("s3cret", &id.to_string(), Some("Ana"))
            ))
            .unwrap(),
        );

        let caller = auth.caller_from_headers(&headers).unwrap();
        assert_eq!(caller.id, id);
        assert_eq!(caller.display_name.as_deref(), Some("Ana"));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let auth = AuthSettings::new(Some("s3cret".to_string()));
        let mut headers = HeaderMap::new();
        headers.insert(
            "authorization",
            HeaderValue::from_str(&format!(
                "Bearer {}",
                token("other", &Uuid::new_v4().to_string(), None)
            ))
            .unwrap(),
        );

        let err = auth.caller_from_headers(&headers).unwrap_err();
        assert_eq!(kind(&err), album_core::ErrorKind::NotAuthenticated);
    }

    #[test]
    fn header_fallback_parses_id_and_name() {
        let auth = AuthSettings::default();
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert("x-user-id", HeaderValue::from_str(&id.to_string()).unwrap());
        headers.insert("x-user-name", HeaderValue::from_static("Rui"));

        let caller = auth.caller_from_headers(&headers).unwrap();
        assert_eq!(caller.id, id);
        assert_eq!(caller.display_name.as_deref(), Some("Rui"));
    }

    #[test]
    fn anonymous_requests_are_rejected() {
        let auth = AuthSettings::default();
        let err = auth.caller_from_headers(&HeaderMap::new()).unwrap_err();
        assert_eq!(kind(&err), album_core::ErrorKind::NotAuthenticated);
    }
}
