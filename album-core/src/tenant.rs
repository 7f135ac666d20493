//! Core multi-tenant types for the PhotoBook backend.

use uuid::Uuid;

/// Identifier of a photobook partition.
///
/// One partition exists per owning caller identity; every scoped entity row
/// carries this id as its `tenant_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PartitionId(pub Uuid);

impl std::fmt::Display for PartitionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// The authenticated subject behind a request, as extracted by the transport
/// layer. `display_name` is an optional claim used to title a freshly
/// provisioned photobook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub id: Uuid,
    pub display_name: Option<String>,
}

impl CallerIdentity {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            display_name: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

/// Context carried with every service operation.
///
/// The partition is resolved once per request, before any entity access, and
/// passed explicitly. There is no ambient "current tenant" anywhere.
#[derive(Debug, Clone)]
pub struct TenantContext {
    pub partition: PartitionId,
    pub caller: Uuid,
}

impl TenantContext {
    pub fn new(partition: PartitionId, caller: Uuid) -> Self {
        Self { partition, caller }
    }
}
