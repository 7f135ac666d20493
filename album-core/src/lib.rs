//! album-core: framework-agnostic core for the PhotoBook backend.
//!
//! Everything tenant-scoped flows through here: the resolved partition is
//! carried explicitly in a [`TenantContext`], services implement
//! [`AlbumService`], and the app container runs each call through its hook
//! pipeline.

pub mod app;
pub mod config;
pub mod errors;
pub mod hooks;
pub mod params;
pub mod registry;
pub mod service;
pub mod tenant;

pub use app::AlbumApp;
pub use config::{AlbumConfig, AlbumConfigSnapshot};
pub use errors::{AlbumError, ErrorKind};
pub use hooks::{AfterHook, BeforeHook, ErrorHook, HookContext, HookResult, ServiceHooks};
pub use params::AlbumParams;
pub use registry::ServiceRegistry;
pub use service::{AlbumService, ServiceCapabilities, ServiceMethodKind};
pub use tenant::{CallerIdentity, PartitionId, TenantContext};
