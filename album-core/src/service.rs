use anyhow::Result;
use async_trait::async_trait;

use crate::errors::AlbumError;
use crate::tenant::TenantContext;

/// Standard service methods: find, get, create, update, patch, remove.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ServiceMethodKind {
    Find,
    Get,
    Create,
    Update,
    Patch,
    Remove,
}

impl ServiceMethodKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceMethodKind::Find => "find",
            ServiceMethodKind::Get => "get",
            ServiceMethodKind::Create => "create",
            ServiceMethodKind::Update => "update",
            ServiceMethodKind::Patch => "patch",
            ServiceMethodKind::Remove => "remove",
        }
    }
}

/// Capabilities describe which methods a service exposes. Dispatch rejects
/// calls to methods a service does not allow.
#[derive(Debug, Clone)]
pub struct ServiceCapabilities {
    pub allowed_methods: Vec<ServiceMethodKind>,
}

impl ServiceCapabilities {
    /// Full CRUD: find, get, create, update, patch, remove.
    pub fn standard_crud() -> Self {
        use ServiceMethodKind::*;
        Self {
            allowed_methods: vec![Find, Get, Create, Update, Patch, Remove],
        }
    }

    /// Helper for building from a list.
    pub fn from_methods(methods: Vec<ServiceMethodKind>) -> Self {
        Self {
            allowed_methods: methods,
        }
    }

    pub fn allows(&self, method: &ServiceMethodKind) -> bool {
        self.allowed_methods.contains(method)
    }
}

/// Core service trait for scoped entities.
///
/// Every method takes a [`TenantContext`]; implementations must filter reads
/// and stamp writes with `ctx.partition`, and treat rows outside the
/// partition exactly as missing rows.
///
/// All methods have default implementations that return "Method not
/// implemented", so a service can override only what it supports.
#[async_trait]
pub trait AlbumService<R, P = ()>: Send + Sync
where
    R: Send + 'static,
    P: Send + 'static,
{
    /// Describe which methods this service wants to expose.
    fn capabilities(&self) -> ServiceCapabilities {
        ServiceCapabilities::standard_crud()
    }

    /// Find many records (optionally filtered by params).
    async fn find(&self, _ctx: &TenantContext, _params: P) -> Result<Vec<R>> {
        Err(AlbumError::general_error("Method not implemented: find").into_anyhow())
    }

    /// Get a single record by id.
    async fn get(&self, _ctx: &TenantContext, _id: &str, _params: P) -> Result<R> {
        Err(AlbumError::general_error("Method not implemented: get").into_anyhow())
    }

    /// Create a new record.
    async fn create(&self, _ctx: &TenantContext, _data: R, _params: P) -> Result<R> {
        Err(AlbumError::general_error("Method not implemented: create").into_anyhow())
    }

    /// Fully replace an existing record.
    async fn update(&self, _ctx: &TenantContext, _id: &str, _data: R, _params: P) -> Result<R> {
        Err(AlbumError::general_error("Method not implemented: update").into_anyhow())
    }

    /// Partially update an existing record; only fields present in `data`
    /// are applied.
    async fn patch(
        &self,
        _ctx: &TenantContext,
        _id: Option<&str>,
        _data: R,
        _params: P,
    ) -> Result<R> {
        Err(AlbumError::general_error("Method not implemented: patch").into_anyhow())
    }

    /// Remove an existing record. Scoped entities are soft-disabled, never
    /// deleted.
    async fn remove(&self, _ctx: &TenantContext, _id: Option<&str>, _params: P) -> Result<R> {
        Err(AlbumError::general_error("Method not implemented: remove").into_anyhow())
    }
}
