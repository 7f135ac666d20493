use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use serde_json::Value;
use tokio::net::{TcpListener, ToSocketAddrs};
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use album_core::{AlbumApp, AlbumParams, AlbumService};

use crate::{rest, ServerState};

/// The wired HTTP application: service container plus the axum router.
#[derive(Clone)]
pub struct AxumApp {
    pub app: AlbumApp<Value, AlbumParams>,
    state: ServerState,
    router: Router<()>,
}

impl AxumApp {
    pub fn new(state: ServerState) -> Self {
        Self {
            app: state.app.clone(),
            state,
            router: Router::new(),
        }
    }

    /// Register a service under `path` and mount its CRUD router there.
    pub fn use_service(
        mut self,
        path: &'static str,
        service: Arc<dyn AlbumService<Value, AlbumParams>>,
    ) -> Self {
        let name = path.trim_start_matches('/');
        self.app.register_service(name, service);

        let router = rest::service_router(Arc::new(name.to_string()), self.state.clone());
        self.router = self.router.nest(path, router);
        self
    }

    pub fn use_router(mut self, path: &str, router: Router<()>) -> Self {
        self.router = self.router.nest(path, router);
        self
    }

    pub fn state(&self) -> ServerState {
        self.state.clone()
    }

    /// The finished router, with request-id and trace layers applied over
    /// everything mounted so far.
    pub fn router(&self) -> Router<()> {
        self.router.clone().layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
    }

    pub async fn listen<A>(self, addr: A) -> Result<()>
    where
        A: ToSocketAddrs,
    {
        let listener = TcpListener::bind(addr).await?;
        axum::serve(listener, self.router()).await?;
        Ok(())
    }
}
