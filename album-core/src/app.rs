use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use anyhow::Result;

use crate::errors::AlbumError;
use crate::hooks::{
    collect_method_hooks, AfterHook, BeforeHook, ErrorHook, HookContext, HookResult, ServiceHooks,
};
use crate::{AlbumConfig, AlbumService, ServiceMethodKind, ServiceRegistry, TenantContext};

struct AlbumAppInner<R, P>
where
    R: Send + 'static,
    P: Send + Clone + 'static,
{
    registry: RwLock<ServiceRegistry<R, P>>,
    global_hooks: RwLock<ServiceHooks<R, P>>,
    service_hooks: RwLock<HashMap<String, ServiceHooks<R, P>>>,
    config: RwLock<AlbumConfig>,
}

/// Central application container.
///
/// Transport-agnostic. Holds the service registry, app-level hooks,
/// per-service hooks, and configuration. Every call dispatched through a
/// [`ServiceHandle`] runs before → service → after, with error hooks on
/// failure.
pub struct AlbumApp<R, P = ()>
where
    R: Send + 'static,
    P: Send + Clone + 'static,
{
    inner: Arc<AlbumAppInner<R, P>>,
}

impl<R, P> Default for AlbumApp<R, P>
where
    R: Send + 'static,
    P: Send + Clone + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<R, P> Clone for AlbumApp<R, P>
where
    R: Send + 'static,
    P: Send + Clone + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R, P> AlbumApp<R, P>
where
    R: Send + 'static,
    P: Send + Clone + 'static,
{
    pub fn new() -> Self {
        Self {
            inner: Arc::new(AlbumAppInner {
                registry: RwLock::new(ServiceRegistry::new()),
                global_hooks: RwLock::new(ServiceHooks::new()),
                service_hooks: RwLock::new(HashMap::new()),
                config: RwLock::new(AlbumConfig::new()),
            }),
        }
    }

    pub fn register_service<S>(&self, name: S, service: Arc<dyn AlbumService<R, P>>)
    where
        S: Into<String>,
    {
        self.inner
            .registry
            .write()
            .unwrap()
            .register(name.into(), service);
    }

    /// App-level hooks, applied to every service.
    pub fn hooks<F>(&self, f: F)
    where
        F: FnOnce(&mut ServiceHooks<R, P>),
    {
        let mut g = self.inner.global_hooks.write().unwrap();
        f(&mut g);
    }

    pub(crate) fn configure_service_hooks<F>(&self, service_name: &str, f: F)
    where
        F: FnOnce(&mut ServiceHooks<R, P>),
    {
        let mut map = self.inner.service_hooks.write().unwrap();
        let hooks = map.entry(service_name.to_string()).or_default();
        f(hooks);
    }

    pub fn service(&self, name: &str) -> Result<ServiceHandle<R, P>> {
        let svc = self
            .inner
            .registry
            .read()
            .unwrap()
            .get(name)
            .ok_or_else(|| {
                AlbumError::general_error(format!("Service not found: {name}")).into_anyhow()
            })?
            .clone();

        Ok(ServiceHandle {
            app: self.clone(),
            name: name.to_string(),
            service: svc,
        })
    }

    pub fn set<K, V>(&self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.inner.config.write().unwrap().set(key, value);
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let cfg = self.inner.config.read().unwrap();
        cfg.get(key).map(|v| v.to_string())
    }

    pub fn config_snapshot(&self) -> crate::AlbumConfigSnapshot {
        let cfg = self.inner.config.read().unwrap();
        cfg.snapshot()
    }

    /// Overlay `ALBUM__…`-style environment variables onto the config.
    pub fn load_env_config(&self, prefix: &str) {
        self.inner.config.write().unwrap().load_env(prefix);
    }
}

type MethodHooks<R, P> = (
    Vec<Arc<dyn BeforeHook<R, P>>>,
    Vec<Arc<dyn AfterHook<R, P>>>,
    Vec<Arc<dyn ErrorHook<R, P>>>,
);

/// A named service plus its surrounding pipeline.
pub struct ServiceHandle<R, P>
where
    R: Send + 'static,
    P: Send + Clone + 'static,
{
    app: AlbumApp<R, P>,
    name: String,
    service: Arc<dyn AlbumService<R, P>>,
}

impl<R, P> ServiceHandle<R, P>
where
    R: Send + 'static,
    P: Send + Clone + 'static,
{
    pub fn hooks<F>(self, f: F) -> Self
    where
        F: FnOnce(&mut ServiceHooks<R, P>),
    {
        self.app.configure_service_hooks(&self.name, f);
        self
    }

    pub fn inner(&self) -> &Arc<dyn AlbumService<R, P>> {
        &self.service
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn ensure_allowed(&self, method: &ServiceMethodKind) -> Result<()> {
        if self.service.capabilities().allows(method) {
            return Ok(());
        }
        Err(AlbumError::bad_request(format!(
            "Method not allowed: {} on {}",
            method.as_str(),
            self.name
        ))
        .into_anyhow())
    }

    /// Global hooks first, then service hooks.
    fn collect_hooks_for_method(&self, method: &ServiceMethodKind) -> MethodHooks<R, P> {
        let g = self.app.inner.global_hooks.read().unwrap();
        let map = self.app.inner.service_hooks.read().unwrap();
        let s = map.get(&self.name);

        let mut before = collect_method_hooks(&g.before_all, &g.before_by_method, method);
        let mut after = collect_method_hooks(&g.after_all, &g.after_by_method, method);
        let mut error = collect_method_hooks(&g.error_all, &g.error_by_method, method);

        if let Some(h) = s {
            before.extend(collect_method_hooks(
                &h.before_all,
                &h.before_by_method,
                method,
            ));
            after.extend(collect_method_hooks(
                &h.after_all,
                &h.after_by_method,
                method,
            ));
            error.extend(collect_method_hooks(
                &h.error_all,
                &h.error_by_method,
                method,
            ));
        }

        (before, after, error)
    }

    /// Run the error stage: error hooks see `ctx.error` and may take it to
    /// swallow the failure.
    async fn finish(
        &self,
        mut ctx: HookContext<R, P>,
        hooks: &[Arc<dyn ErrorHook<R, P>>],
        outcome: Result<()>,
    ) -> Result<HookContext<R, P>> {
        if let Err(e) = outcome {
            ctx.error = Some(e);
            for h in hooks {
                let _ = h.run(&mut ctx).await;
            }
            if let Some(err) = ctx.error.take() {
                return Err(err);
            }
        }
        Ok(ctx)
    }

    pub async fn find(&self, tenant: TenantContext, params: P) -> Result<Vec<R>> {
        let method = ServiceMethodKind::Find;
        self.ensure_allowed(&method)?;
        let (before, after, error) = self.collect_hooks_for_method(&method);
        let mut ctx = HookContext::new(tenant, self.name.clone(), method, params);

        let mut outcome = run_before(&before, &mut ctx).await;
        if outcome.is_ok() {
            outcome = match self.service.find(&ctx.tenant, ctx.params.clone()).await {
                Ok(records) => {
                    ctx.result = Some(HookResult::Many(records));
                    Ok(())
                }
                Err(e) => Err(e),
            };
        }
        if outcome.is_ok() {
            outcome = run_after(&after, &mut ctx).await;
        }

        let ctx = self.finish(ctx, &error, outcome).await?;
        match ctx.result {
            Some(HookResult::Many(v)) => Ok(v),
            Some(HookResult::One(_)) => Err(AlbumError::general_error(
                "find() produced a single record unexpectedly",
            )
            .into_anyhow()),
            None => Ok(vec![]),
        }
    }

    pub async fn get(&self, tenant: TenantContext, id: &str, params: P) -> Result<R> {
        let method = ServiceMethodKind::Get;
        self.ensure_allowed(&method)?;
        let (before, after, error) = self.collect_hooks_for_method(&method);
        let mut ctx = HookContext::new(tenant, self.name.clone(), method, params);

        let mut outcome = run_before(&before, &mut ctx).await;
        if outcome.is_ok() {
            outcome = match self.service.get(&ctx.tenant, id, ctx.params.clone()).await {
                Ok(record) => {
                    ctx.result = Some(HookResult::One(record));
                    Ok(())
                }
                Err(e) => Err(e),
            };
        }
        if outcome.is_ok() {
            outcome = run_after(&after, &mut ctx).await;
        }

        let ctx = self.finish(ctx, &error, outcome).await?;
        expect_one(ctx.result, "get")
    }

    pub async fn create(&self, tenant: TenantContext, data: R, params: P) -> Result<R> {
        let method = ServiceMethodKind::Create;
        self.ensure_allowed(&method)?;
        let (before, after, error) = self.collect_hooks_for_method(&method);
        let mut ctx = HookContext::new(tenant, self.name.clone(), method, params);
        ctx.data = Some(data);

        let mut outcome = run_before(&before, &mut ctx).await;
        if outcome.is_ok() {
            outcome = match ctx.data.take() {
                Some(data) => match self
                    .service
                    .create(&ctx.tenant, data, ctx.params.clone())
                    .await
                {
                    Ok(created) => {
                        ctx.result = Some(HookResult::One(created));
                        Ok(())
                    }
                    Err(e) => Err(e),
                },
                None => Err(AlbumError::general_error("create() requires data").into_anyhow()),
            };
        }
        if outcome.is_ok() {
            outcome = run_after(&after, &mut ctx).await;
        }

        let ctx = self.finish(ctx, &error, outcome).await?;
        expect_one(ctx.result, "create")
    }

    pub async fn update(&self, tenant: TenantContext, id: &str, data: R, params: P) -> Result<R> {
        let method = ServiceMethodKind::Update;
        self.ensure_allowed(&method)?;
        let (before, after, error) = self.collect_hooks_for_method(&method);
        let mut ctx = HookContext::new(tenant, self.name.clone(), method, params);
        ctx.data = Some(data);

        let mut outcome = run_before(&before, &mut ctx).await;
        if outcome.is_ok() {
            outcome = match ctx.data.take() {
                Some(data) => match self
                    .service
                    .update(&ctx.tenant, id, data, ctx.params.clone())
                    .await
                {
                    Ok(updated) => {
                        ctx.result = Some(HookResult::One(updated));
                        Ok(())
                    }
                    Err(e) => Err(e),
                },
                None => Err(AlbumError::general_error("update() requires data").into_anyhow()),
            };
        }
        if outcome.is_ok() {
            outcome = run_after(&after, &mut ctx).await;
        }

        let ctx = self.finish(ctx, &error, outcome).await?;
        expect_one(ctx.result, "update")
    }

    pub async fn patch(
        &self,
        tenant: TenantContext,
        id: Option<&str>,
        data: R,
        params: P,
    ) -> Result<R> {
        let method = ServiceMethodKind::Patch;
        self.ensure_allowed(&method)?;
        let (before, after, error) = self.collect_hooks_for_method(&method);
        let mut ctx = HookContext::new(tenant, self.name.clone(), method, params);
        ctx.data = Some(data);

        let mut outcome = run_before(&before, &mut ctx).await;
        if outcome.is_ok() {
            outcome = match ctx.data.take() {
                Some(data) => match self
                    .service
                    .patch(&ctx.tenant, id, data, ctx.params.clone())
                    .await
                {
                    Ok(patched) => {
                        ctx.result = Some(HookResult::One(patched));
                        Ok(())
                    }
                    Err(e) => Err(e),
                },
                None => Err(AlbumError::general_error("patch() requires data").into_anyhow()),
            };
        }
        if outcome.is_ok() {
            outcome = run_after(&after, &mut ctx).await;
        }

        let ctx = self.finish(ctx, &error, outcome).await?;
        expect_one(ctx.result, "patch")
    }

    pub async fn remove(&self, tenant: TenantContext, id: Option<&str>, params: P) -> Result<R> {
        let method = ServiceMethodKind::Remove;
        self.ensure_allowed(&method)?;
        let (before, after, error) = self.collect_hooks_for_method(&method);
        let mut ctx = HookContext::new(tenant, self.name.clone(), method, params);

        let mut outcome = run_before(&before, &mut ctx).await;
        if outcome.is_ok() {
            outcome = match self
                .service
                .remove(&ctx.tenant, id, ctx.params.clone())
                .await
            {
                Ok(removed) => {
                    ctx.result = Some(HookResult::One(removed));
                    Ok(())
                }
                Err(e) => Err(e),
            };
        }
        if outcome.is_ok() {
            outcome = run_after(&after, &mut ctx).await;
        }

        let ctx = self.finish(ctx, &error, outcome).await?;
        expect_one(ctx.result, "remove")
    }
}

async fn run_before<R, P>(
    hooks: &[Arc<dyn BeforeHook<R, P>>],
    ctx: &mut HookContext<R, P>,
) -> Result<()> {
    for h in hooks {
        h.run(ctx).await?;
    }
    Ok(())
}

/// After hooks run in reverse registration order.
async fn run_after<R, P>(
    hooks: &[Arc<dyn AfterHook<R, P>>],
    ctx: &mut HookContext<R, P>,
) -> Result<()> {
    for h in hooks.iter().rev() {
        h.run(ctx).await?;
    }
    Ok(())
}

fn expect_one<R>(result: Option<HookResult<R>>, method: &str) -> Result<R> {
    match result {
        Some(HookResult::One(v)) => Ok(v),
        Some(HookResult::Many(_)) => Err(AlbumError::general_error(format!(
            "{method}() produced many records unexpectedly"
        ))
        .into_anyhow()),
        None => {
            Err(AlbumError::general_error(format!("{method}() produced no result")).into_anyhow())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ServiceCapabilities;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    fn tenant() -> TenantContext {
        TenantContext::new(crate::PartitionId(Uuid::new_v4()), Uuid::new_v4())
    }

    struct Echo;

    #[async_trait]
    impl AlbumService<String, ()> for Echo {
        async fn get(&self, _ctx: &TenantContext, id: &str, _params: ()) -> Result<String> {
            Ok(id.to_string())
        }

        async fn find(&self, _ctx: &TenantContext, _params: ()) -> Result<Vec<String>> {
            Ok(vec!["a".to_string(), "b".to_string()])
        }
    }

    struct Counter(AtomicUsize);

    #[async_trait]
    impl BeforeHook<String, ()> for Counter {
        async fn run(&self, _ctx: &mut HookContext<String, ()>) -> Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Upcase;

    #[async_trait]
    impl AfterHook<String, ()> for Upcase {
        async fn run(&self, ctx: &mut HookContext<String, ()>) -> Result<()> {
            if let Some(HookResult::One(v)) = ctx.result.take() {
                ctx.result = Some(HookResult::One(v.to_uppercase()));
            } else if let Some(r) = ctx.result.take() {
                ctx.result = Some(r);
            }
            Ok(())
        }
    }

    struct Deny;

    #[async_trait]
    impl BeforeHook<String, ()> for Deny {
        async fn run(&self, _ctx: &mut HookContext<String, ()>) -> Result<()> {
            Err(AlbumError::forbidden("nope").into_anyhow())
        }
    }

    #[tokio::test]
    async fn pipeline_runs_before_and_after_hooks() {
        let app: AlbumApp<String, ()> = AlbumApp::new();
        app.register_service("echo", Arc::new(Echo));

        let counter = Arc::new(Counter(AtomicUsize::new(0)));
        app.hooks(|h| {
            h.before(counter.clone());
        });
        app.service("echo").unwrap().hooks(|h| {
            h.after_on(ServiceMethodKind::Get, Arc::new(Upcase));
        });

        let got = app
            .service("echo")
            .unwrap()
            .get(tenant(), "hello", ())
            .await
            .unwrap();
        assert_eq!(got, "HELLO");
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);

        let found = app.service("echo").unwrap().find(tenant(), ()).await.unwrap();
        assert_eq!(found, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(counter.0.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn before_hook_error_short_circuits() {
        let app: AlbumApp<String, ()> = AlbumApp::new();
        app.register_service("echo", Arc::new(Echo));
        app.service("echo").unwrap().hooks(|h| {
            h.before(Arc::new(Deny));
        });

        let err = app
            .service("echo")
            .unwrap()
            .get(tenant(), "hello", ())
            .await
            .unwrap_err();
        let album = AlbumError::from_anyhow(&err).unwrap();
        assert_eq!(album.kind, crate::ErrorKind::Forbidden);
    }

    struct ReadOnly;

    #[async_trait]
    impl AlbumService<String, ()> for ReadOnly {
        fn capabilities(&self) -> ServiceCapabilities {
            ServiceCapabilities::from_methods(vec![ServiceMethodKind::Get])
        }

        async fn get(&self, _ctx: &TenantContext, id: &str, _params: ()) -> Result<String> {
            Ok(id.to_string())
        }
    }

    #[tokio::test]
    async fn disallowed_method_is_rejected_before_dispatch() {
        let app: AlbumApp<String, ()> = AlbumApp::new();
        app.register_service("readonly", Arc::new(ReadOnly));

        let handle = app.service("readonly").unwrap();
        assert!(handle.get(tenant(), "x", ()).await.is_ok());

        let err = app
            .service("readonly")
            .unwrap()
            .create(tenant(), "data".to_string(), ())
            .await
            .unwrap_err();
        let album = AlbumError::from_anyhow(&err).unwrap();
        assert_eq!(album.kind, crate::ErrorKind::BadRequest);
    }

    #[tokio::test]
    async fn unknown_service_is_an_error() {
        let app: AlbumApp<String, ()> = AlbumApp::new();
        assert!(app.service("missing").is_err());
    }
}
