use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::rejection::JsonRejection,
    extract::{Path, Query, State},
    http::HeaderMap,
    routing, Json, Router,
};
use serde_json::{json, Value};

use album_core::errors::AlbumError;
use album_core::AlbumParams;

use crate::{ServerError, ServerState};

fn map_json_rejection(rejection: JsonRejection) -> ServerError {
    AlbumError::bad_request("Failed to parse the request body as JSON")
        .with_errors(json!({"_schema": [rejection.to_string()]}))
        .into_anyhow()
        .into()
}

/// Generic CRUD router for one registered service. Every handler resolves the
/// caller's partition first, then dispatches through the hook pipeline.
pub fn service_router(service_name: Arc<String>, state: ServerState) -> Router<()> {
    Router::new()
        .route(
            "/",
            routing::get({
                let service_name = Arc::clone(&service_name);
                move |State(state): State<ServerState>,
                      headers: HeaderMap,
                      Query(query): Query<HashMap<String, String>>| async move {
                    let tenant = state.tenant_context(&headers).await?;
                    let params = AlbumParams::rest(query);

                    let svc = state.app.service(&service_name)?;
                    let res = svc.find(tenant, params).await?;
                    Ok::<_, ServerError>(Json(res))
                }
            })
            .post({
                let service_name = Arc::clone(&service_name);
                move |State(state): State<ServerState>,
                      headers: HeaderMap,
                      Query(query): Query<HashMap<String, String>>,
                      data: Result<Json<Value>, JsonRejection>| async move {
                    let tenant = state.tenant_context(&headers).await?;
                    let Json(data) = data.map_err(map_json_rejection)?;
                    let params = AlbumParams::rest(query);

                    let svc = state.app.service(&service_name)?;
                    let res = svc.create(tenant, data, params).await?;
                    Ok::<_, ServerError>(Json(res))
                }
            }),
        )
        .route(
            "/{id}",
            routing::get({
                let service_name = Arc::clone(&service_name);
                move |State(state): State<ServerState>,
                      headers: HeaderMap,
                      Query(query): Query<HashMap<String, String>>,
                      Path(id): Path<String>| async move {
                    let tenant = state.tenant_context(&headers).await?;
                    let params = AlbumParams::rest(query);

                    let svc = state.app.service(&service_name)?;
                    let res = svc.get(tenant, &id, params).await?;
                    Ok::<_, ServerError>(Json(res))
                }
            })
            .put({
                let service_name = Arc::clone(&service_name);
                move |State(state): State<ServerState>,
                      headers: HeaderMap,
                      Query(query): Query<HashMap<String, String>>,
                      Path(id): Path<String>,
                      data: Result<Json<Value>, JsonRejection>| async move {
                    let tenant = state.tenant_context(&headers).await?;
                    let Json(data) = data.map_err(map_json_rejection)?;
                    let params = AlbumParams::rest(query);

                    let svc = state.app.service(&service_name)?;
                    let res = svc.update(tenant, &id, data, params).await?;
                    Ok::<_, ServerError>(Json(res))
                }
            })
            .patch({
                let service_name = Arc::clone(&service_name);
                move |State(state): State<ServerState>,
                      headers: HeaderMap,
                      Query(query): Query<HashMap<String, String>>,
                      Path(id): Path<String>,
                      data: Result<Json<Value>, JsonRejection>| async move {
                    let tenant = state.tenant_context(&headers).await?;
                    let Json(data) = data.map_err(map_json_rejection)?;
                    let params = AlbumParams::rest(query);

                    let svc = state.app.service(&service_name)?;
                    let res = svc.patch(tenant, Some(&id), data, params).await?;
                    Ok::<_, ServerError>(Json(res))
                }
            })
            .delete({
                let service_name = Arc::clone(&service_name);
                move |State(state): State<ServerState>,
                      headers: HeaderMap,
                      Query(query): Query<HashMap<String, String>>,
                      Path(id): Path<String>| async move {
                    let tenant = state.tenant_context(&headers).await?;
                    let params = AlbumParams::rest(query);

                    let svc = state.app.service(&service_name)?;
                    let res = svc.remove(tenant, Some(&id), params).await?;
                    Ok::<_, ServerError>(Json(res))
                }
            }),
        )
        .with_state(state)
}
