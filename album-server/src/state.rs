use anyhow::Result;
use axum::http::HeaderMap;
use serde_json::Value;
use tracing::debug;

use album_core::{AlbumApp, AlbumParams, TenantContext};
use album_store::TenantResolver;

use crate::auth::AuthSettings;

/// Shared state behind every REST handler: the service container, the
/// partition resolver and the auth settings.
#[derive(Clone)]
pub struct ServerState {
    pub app: AlbumApp<Value, AlbumParams>,
    pub resolver: TenantResolver,
    pub auth: AuthSettings,
}

impl ServerState {
    pub fn new(app: AlbumApp<Value, AlbumParams>, resolver: TenantResolver, auth: AuthSettings) -> Self {
        Self {
            app,
            resolver,
            auth,
        }
    }

    /// Authenticate the request and resolve its partition. Runs once per
    /// request, before any service dispatch; an anonymous request never
    /// reaches a service.
    pub async fn tenant_context(&self, headers: &HeaderMap) -> Result<TenantContext> {
        let caller = self.auth.caller_from_headers(headers)?;
        let partition = self.resolver.resolve(&caller).await?;
        debug!(caller = %caller.id, partition = %partition, "resolved request partition");
        Ok(TenantContext::new(partition, caller.id))
    }
}
