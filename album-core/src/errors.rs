//! # Errors
//!
//! Structured, transport-agnostic errors for the PhotoBook backend:
//! - consistent status codes + class names
//! - carried through `anyhow::Error` so they survive the hook pipeline
//! - the server crate decides how to serialize them
//!
//! Two situations from the tenant-isolation contract map onto these kinds:
//! a write referencing another partition's row is `Unprocessable` (422), and
//! a direct-by-id access to another partition's row is `NotFound` (404) —
//! indistinguishable from the row not existing at all.

use std::fmt;

use anyhow::Error as AnyError;

/// A convenience result type for album core APIs.
pub type AlbumResult<T> = std::result::Result<T, AnyError>;

/// Error class names + status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    BadRequest,       // 400
    NotAuthenticated, // 401
    Forbidden,        // 403
    NotFound,         // 404
    Conflict,         // 409
    Unprocessable,    // 422
    GeneralError,     // 500
    Unavailable,      // 503
}

impl ErrorKind {
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::BadRequest => 400,
            ErrorKind::NotAuthenticated => 401,
            ErrorKind::Forbidden => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::Unprocessable => 422,
            ErrorKind::GeneralError => 500,
            ErrorKind::Unavailable => 503,
        }
    }

    /// Error `name` (e.g. "NotFound")
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "BadRequest",
            ErrorKind::NotAuthenticated => "NotAuthenticated",
            ErrorKind::Forbidden => "Forbidden",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::Conflict => "Conflict",
            ErrorKind::Unprocessable => "Unprocessable",
            ErrorKind::GeneralError => "GeneralError",
            ErrorKind::Unavailable => "Unavailable",
        }
    }

    /// Error `className` (kebab-cased)
    pub fn class_name(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "bad-request",
            ErrorKind::NotAuthenticated => "not-authenticated",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::NotFound => "not-found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Unprocessable => "unprocessable",
            ErrorKind::GeneralError => "general-error",
            ErrorKind::Unavailable => "unavailable",
        }
    }
}

/// A structured error that can live inside `anyhow::Error`.
#[derive(Debug)]
pub struct AlbumError {
    pub kind: ErrorKind,
    pub message: String,
    pub data: Option<serde_json::Value>,
    pub errors: Option<serde_json::Value>,
    pub source: Option<AnyError>,
}

impl AlbumError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            data: None,
            errors: None,
            source: None,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_errors(mut self, errors: serde_json::Value) -> Self {
        self.errors = Some(errors);
        self
    }

    pub fn with_source(mut self, source: AnyError) -> Self {
        self.source = Some(source);
        self
    }

    pub fn code(&self) -> u16 {
        self.kind.status_code()
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn class_name(&self) -> &'static str {
        self.kind.class_name()
    }

    /// Convert into `anyhow::Error` so it flows through the hook pipeline.
    pub fn into_anyhow(self) -> AnyError {
        AnyError::new(self)
    }

    /// Downcast an `anyhow::Error` to an `AlbumError` if possible.
    pub fn from_anyhow(err: &AnyError) -> Option<&AlbumError> {
        err.downcast_ref::<AlbumError>()
    }

    /// Turn any error into an AlbumError:
    /// - if it's already one, keep it (lossless)
    /// - otherwise wrap as GeneralError
    pub fn normalize(err: AnyError) -> AlbumError {
        match err.downcast::<AlbumError>() {
            Ok(album) => album,
            Err(other) => {
                AlbumError::new(ErrorKind::GeneralError, other.to_string()).with_source(other)
            }
        }
    }

    /// A version suitable for returning to clients:
    /// keep kind/message/code/class_name/data/errors, drop the inner
    /// `source` (stack/secret details).
    pub fn sanitize_for_client(&self) -> AlbumError {
        AlbumError {
            kind: self.kind,
            message: self.message.clone(),
            data: self.data.clone(),
            errors: self.errors.clone(),
            source: None,
        }
    }

    /// JSON payload: `{ name, message, code, className, data?, errors? }`.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::json;

        let mut base = json!({
            "name": self.name(),
            "message": self.message,
            "code": self.code(),
            "className": self.class_name(),
        });

        if let Some(d) = &self.data {
            base["data"] = d.clone();
        }
        if let Some(e) = &self.errors {
            base["errors"] = e.clone();
        }
        base
    }

    // ---- Constructors ----

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, msg)
    }
    pub fn not_authenticated(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotAuthenticated, msg)
    }
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, msg)
    }
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, msg)
    }
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, msg)
    }
    pub fn unprocessable(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unprocessable, msg)
    }
    pub fn general_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::GeneralError, msg)
    }
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unavailable, msg)
    }
}

impl fmt::Display for AlbumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.name(), self.code(), self.message)
    }
}

impl std::error::Error for AlbumError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Convenience helper for "bail with AlbumError". Works in any function
/// whose error type converts from `anyhow::Error`.
#[macro_export]
macro_rules! bail_album {
    ($ctor:ident, $msg:expr) => {
        return Err($crate::errors::AlbumError::$ctor($msg).into_anyhow().into());
    };
    ($ctor:ident, $fmt:expr, $($arg:tt)*) => {
        return Err($crate::errors::AlbumError::$ctor(format!($fmt, $($arg)*)).into_anyhow().into());
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_keeps_album_errors_lossless() {
        let err = AlbumError::not_found("Photo not found").into_anyhow();
        let back = AlbumError::normalize(err);
        assert_eq!(back.kind, ErrorKind::NotFound);
        assert_eq!(back.message, "Photo not found");
    }

    #[test]
    fn normalize_wraps_foreign_errors_as_general() {
        let err = anyhow::anyhow!("boom");
        let back = AlbumError::normalize(err);
        assert_eq!(back.kind, ErrorKind::GeneralError);
        assert!(back.message.contains("boom"));
        assert!(back.source.is_some());
    }

    #[test]
    fn to_json_has_feathers_shape() {
        let err = AlbumError::unprocessable("Invalid")
            .with_errors(serde_json::json!({"locationId": ["not in this photobook"]}));
        let json = err.to_json();
        assert_eq!(json["name"], "Unprocessable");
        assert_eq!(json["code"], 422);
        assert_eq!(json["className"], "unprocessable");
        assert!(json["errors"].get("locationId").is_some());
    }

    #[test]
    fn sanitize_drops_source() {
        let err = AlbumError::unavailable("storage down").with_source(anyhow::anyhow!("io"));
        let safe = err.sanitize_for_client();
        assert!(safe.source.is_none());
        assert_eq!(safe.kind, ErrorKind::Unavailable);
    }
}
