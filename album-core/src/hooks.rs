//! Hook pipeline: before → service call → after, with error hooks on
//! failure. Hooks run global-first, then per-service; after hooks run in
//! reverse registration order.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::service::ServiceMethodKind;
use crate::tenant::TenantContext;

/// Result slot of a service call: one record or many.
#[derive(Debug)]
pub enum HookResult<R> {
    One(R),
    Many(Vec<R>),
}

/// Context passed to hooks.
///
/// R = record type, P = params type.
#[derive(Debug)]
pub struct HookContext<R, P> {
    pub tenant: TenantContext,
    pub service_name: String,
    pub method: ServiceMethodKind,
    pub params: P,
    /// Input payload (create/update/patch).
    pub data: Option<R>,
    /// Output, populated by the service call, visible to after hooks.
    pub result: Option<HookResult<R>>,
    /// Populated before error hooks run; an error hook may `take()` it to
    /// swallow the error.
    pub error: Option<anyhow::Error>,
}

impl<R, P> HookContext<R, P> {
    pub fn new(
        tenant: TenantContext,
        service_name: impl Into<String>,
        method: ServiceMethodKind,
        params: P,
    ) -> Self {
        Self {
            tenant,
            service_name: service_name.into(),
            method,
            params,
            data: None,
            result: None,
            error: None,
        }
    }
}

#[async_trait]
pub trait BeforeHook<R, P>: Send + Sync {
    async fn run(&self, ctx: &mut HookContext<R, P>) -> Result<()>;
}

#[async_trait]
pub trait AfterHook<R, P>: Send + Sync {
    async fn run(&self, ctx: &mut HookContext<R, P>) -> Result<()>;
}

#[async_trait]
pub trait ErrorHook<R, P>: Send + Sync {
    async fn run(&self, ctx: &mut HookContext<R, P>) -> Result<()>;
}

/// Hooks registered for a service (or globally for the whole app).
pub struct ServiceHooks<R, P> {
    pub before_all: Vec<Arc<dyn BeforeHook<R, P>>>,
    pub before_by_method: HashMap<ServiceMethodKind, Vec<Arc<dyn BeforeHook<R, P>>>>,
    pub after_all: Vec<Arc<dyn AfterHook<R, P>>>,
    pub after_by_method: HashMap<ServiceMethodKind, Vec<Arc<dyn AfterHook<R, P>>>>,
    pub error_all: Vec<Arc<dyn ErrorHook<R, P>>>,
    pub error_by_method: HashMap<ServiceMethodKind, Vec<Arc<dyn ErrorHook<R, P>>>>,
}

impl<R, P> Default for ServiceHooks<R, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R, P> ServiceHooks<R, P> {
    pub fn new() -> Self {
        Self {
            before_all: Vec::new(),
            before_by_method: HashMap::new(),
            after_all: Vec::new(),
            after_by_method: HashMap::new(),
            error_all: Vec::new(),
            error_by_method: HashMap::new(),
        }
    }

    pub fn before(&mut self, hook: Arc<dyn BeforeHook<R, P>>) -> &mut Self {
        self.before_all.push(hook);
        self
    }

    pub fn before_on(
        &mut self,
        method: ServiceMethodKind,
        hook: Arc<dyn BeforeHook<R, P>>,
    ) -> &mut Self {
        self.before_by_method.entry(method).or_default().push(hook);
        self
    }

    pub fn after(&mut self, hook: Arc<dyn AfterHook<R, P>>) -> &mut Self {
        self.after_all.push(hook);
        self
    }

    pub fn after_on(
        &mut self,
        method: ServiceMethodKind,
        hook: Arc<dyn AfterHook<R, P>>,
    ) -> &mut Self {
        self.after_by_method.entry(method).or_default().push(hook);
        self
    }

    pub fn error(&mut self, hook: Arc<dyn ErrorHook<R, P>>) -> &mut Self {
        self.error_all.push(hook);
        self
    }

    pub fn error_on(
        &mut self,
        method: ServiceMethodKind,
        hook: Arc<dyn ErrorHook<R, P>>,
    ) -> &mut Self {
        self.error_by_method.entry(method).or_default().push(hook);
        self
    }
}

/// "All" hooks first, then method-specific ones.
pub(crate) fn collect_method_hooks<H: ?Sized>(
    all: &[Arc<H>],
    by_method: &HashMap<ServiceMethodKind, Vec<Arc<H>>>,
    method: &ServiceMethodKind,
) -> Vec<Arc<H>> {
    let mut out: Vec<Arc<H>> = all.to_vec();
    if let Some(hooks) = by_method.get(method) {
        out.extend(hooks.iter().cloned());
    }
    out
}
