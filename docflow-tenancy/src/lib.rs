#![deny(clippy::print_stdout, clippy::print_stderr)]

use std::collections::HashMap;
use std::fmt::Display;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use docflow_common::TenantId;
use docflow_common::UserId;
use thiserror::Error;

mod auth_guard;
mod in_memory;

pub use crate::auth_guard::AuthGuard;
pub use crate::auth_guard::Claims;
pub use crate::auth_guard::JwtAuthGuard;
pub use crate::auth_guard::PublicKeyCache;
pub use crate::auth_guard::PublicKeyStore;
pub use crate::in_memory::InMemoryTenancyService;

pub type TenancyResult<T> = Result<T, TenancyError>;

#[derive(Debug, Error)]
pub enum TenancyError {
    #[error("resource not found: {0}")]
    NotFound(String),
    #[error("resource already exists: {0}")]
    Conflict(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("operation rejected: {0}")]
    Rejected(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<TenancyError> for docflow_common::ApiError {
    fn from(err: TenancyError) -> Self {
        match err {
            TenancyError::NotFound(message) => docflow_common::ApiError::not_found(message),
            TenancyError::Conflict(message) => docflow_common::ApiError::conflict(message),
            TenancyError::Validation(message) => docflow_common::ApiError::validation(message),
            TenancyError::Rejected(message) => docflow_common::ApiError::authorization(message),
            TenancyError::Internal(message) => docflow_common::ApiError::internal(message),
        }
    }
}

/// `{tenant-id, subject-id, roles}`, produced only by the auth guard and
/// required by every tenant-scoped call from that point on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantContext {
    pub tenant_id: TenantId,
    pub subject_id: UserId,
    pub roles: Vec<Role>,
}

impl TenantContext {
    #[must_use]
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.roles.iter().any(|role| role.grants(permission))
    }

    /// Fails closed with `Authorization` unless the context's tenant
    /// matches `expected` — the guard that every core call applies so a
    /// caller can never act outside the tenant its token names.
    pub fn require_tenant(&self, expected: &TenantId) -> TenancyResult<()> {
        if &self.tenant_id != expected {
            return Err(TenancyError::Rejected(
                "token tenant does not match requested tenant".into(),
            ));
        }
        Ok(())
    }

    pub fn require_permission(&self, permission: Permission) -> TenancyResult<()> {
        if self.has_permission(permission) {
            Ok(())
        } else {
            Err(TenancyError::Rejected(format!(
                "missing permission {permission}"
            )))
        }
    }
}

/// `{id, name, status, settings}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tenant {
    pub id: TenantId,
    pub name: String,
    pub status: TenantStatus,
    pub settings: HashMap<String, String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TenantStatus {
    Active,
    Suspended,
    Deleted,
}

impl Display for TenantStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TenantStatus::Active => write!(f, "active"),
            TenantStatus::Suspended => write!(f, "suspended"),
            TenantStatus::Deleted => write!(f, "deleted"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTenantRequest {
    pub name: String,
    pub settings: HashMap<String, String>,
}

impl CreateTenantRequest {
    pub fn normalize(mut self) -> TenancyResult<Self> {
        if self.name.trim().is_empty() {
            return Err(TenancyError::Validation(
                "tenant name cannot be empty".into(),
            ));
        }
        self.name = self.name.trim().to_string();
        Ok(self)
    }
}

/// Roles are additive: a user may hold several.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Reader,
    Contributor,
    Editor,
    Administrator,
}

/// The fine-grained capabilities a role can grant over a resource
/// (`resource_type`, `permission_type`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    Read,
    Write,
    Delete,
    ManageFolders,
    Admin,
}

impl Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Permission::Read => "read",
            Permission::Write => "write",
            Permission::Delete => "delete",
            Permission::ManageFolders => "manage-folders",
            Permission::Admin => "admin",
        };
        write!(f, "{label}")
    }
}

impl Role {
    #[must_use]
    pub fn grants(self, permission: Permission) -> bool {
        match permission {
            Permission::Read => matches!(
                self,
                Role::Reader | Role::Contributor | Role::Editor | Role::Administrator
            ),
            Permission::Write => {
                matches!(self, Role::Contributor | Role::Editor | Role::Administrator)
            }
            Permission::Delete | Permission::ManageFolders => {
                matches!(self, Role::Editor | Role::Administrator)
            }
            Permission::Admin => matches!(self, Role::Administrator),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserStatus {
    Active,
    Locked,
    Disabled,
}

impl UserStatus {
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, UserStatus::Active)
    }
}

/// `{id, tenant-id, username, email, password-hash, roles, status,
/// settings}`. Username and email uniqueness is scoped to the tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub tenant_id: TenantId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub roles: Vec<Role>,
    pub status: UserStatus,
    pub settings: HashMap<String, String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    #[must_use]
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateUserRequest {
    pub tenant_id: TenantId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub roles: Vec<Role>,
}

impl CreateUserRequest {
    pub fn normalize(mut self) -> TenancyResult<Self> {
        if self.username.trim().is_empty() {
            return Err(TenancyError::Validation(
                "username cannot be empty".into(),
            ));
        }
        self.email = self.email.trim().to_ascii_lowercase();
        if !self.email.contains('@') {
            return Err(TenancyError::Validation("email must include '@'".into()));
        }
        if self.roles.is_empty() {
            return Err(TenancyError::Validation(
                "at least one role is required".into(),
            ));
        }
        self.username = self.username.trim().to_string();
        Ok(self)
    }
}

#[async_trait]
pub trait TenancyService: Send + Sync {
    async fn create_tenant(&self, request: CreateTenantRequest) -> TenancyResult<Tenant>;

    async fn get_tenant(&self, tenant_id: &TenantId) -> TenancyResult<Tenant>;

    async fn set_tenant_status(
        &self,
        tenant_id: &TenantId,
        status: TenantStatus,
    ) -> TenancyResult<Tenant>;

    async fn create_user(&self, request: CreateUserRequest) -> TenancyResult<User>;

    async fn get_user(&self, tenant_id: &TenantId, user_id: &UserId) -> TenancyResult<User>;

    async fn list_users(&self, tenant_id: &TenantId) -> TenancyResult<Vec<User>>;
}
