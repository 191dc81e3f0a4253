use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use docflow_common::TenantId;
use docflow_common::UserId;
use docflow_common::generate_id;
use tokio::sync::RwLock;

use crate::CreateTenantRequest;
use crate::CreateUserRequest;
use crate::Tenant;
use crate::TenancyError;
use crate::TenancyResult;
use crate::TenancyService;
use crate::TenantStatus;
use crate::User;

#[derive(Default)]
struct TenancyState {
    tenants: HashMap<TenantId, Tenant>,
    users: HashMap<UserId, User>,
}

pub struct InMemoryTenancyService {
    state: RwLock<TenancyState>,
}

impl Default for InMemoryTenancyService {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryTenancyService {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: RwLock::new(TenancyState::default()),
        }
    }

    fn ensure_unique_tenant_name(state: &TenancyState, name: &str) -> TenancyResult<()> {
        let normalized = name.trim().to_ascii_lowercase();
        if state
            .tenants
            .values()
            .any(|tenant| tenant.name.trim().to_ascii_lowercase() == normalized)
        {
            return Err(TenancyError::Conflict(format!(
                "tenant {name} already exists"
            )));
        }
        Ok(())
    }

    fn ensure_unique_user(
        state: &TenancyState,
        tenant_id: &TenantId,
        username: &str,
        email: &str,
    ) -> TenancyResult<()> {
        let conflict = state.users.values().any(|user| {
            user.tenant_id == *tenant_id
                && (user.username.eq_ignore_ascii_case(username) || user.email == email)
        });
        if conflict {
            return Err(TenancyError::Conflict(format!(
                "username or email already in use within tenant {tenant_id}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl TenancyService for InMemoryTenancyService {
    async fn create_tenant(&self, request: CreateTenantRequest) -> TenancyResult<Tenant> {
        let request = request.normalize()?;
        let mut guard = self.state.write().await;
        Self::ensure_unique_tenant_name(&guard, &request.name)?;

        let tenant = Tenant {
            id: generate_id(),
            name: request.name,
            status: TenantStatus::Active,
            settings: request.settings,
            created_at: Utc::now(),
        };
        guard.tenants.insert(tenant.id.clone(), tenant.clone());
        Ok(tenant)
    }

    async fn get_tenant(&self, tenant_id: &TenantId) -> TenancyResult<Tenant> {
        let guard = self.state.read().await;
        guard
            .tenants
            .get(tenant_id)
            .cloned()
            .ok_or_else(|| TenancyError::NotFound(format!("tenant {tenant_id}")))
    }

    async fn set_tenant_status(
        &self,
        tenant_id: &TenantId,
        status: TenantStatus,
    ) -> TenancyResult<Tenant> {
        let mut guard = self.state.write().await;
        let tenant = guard
            .tenants
            .get_mut(tenant_id)
            .ok_or_else(|| TenancyError::NotFound(format!("tenant {tenant_id}")))?;
        tenant.status = status;
        Ok(tenant.clone())
    }

    async fn create_user(&self, request: CreateUserRequest) -> TenancyResult<User> {
        let request = request.normalize()?;
        let mut guard = self.state.write().await;
        if !guard.tenants.contains_key(&request.tenant_id) {
            return Err(TenancyError::NotFound(format!(
                "tenant {}",
                request.tenant_id
            )));
        }
        Self::ensure_unique_user(&guard, &request.tenant_id, &request.username, &request.email)?;

        let user = User {
            id: generate_id(),
            tenant_id: request.tenant_id,
            username: request.username,
            email: request.email,
            password_hash: request.password_hash,
            roles: request.roles,
            status: crate::UserStatus::Active,
            settings: HashMap::new(),
            created_at: Utc::now(),
        };
        guard.users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn get_user(&self, tenant_id: &TenantId, user_id: &UserId) -> TenancyResult<User> {
        let guard = self.state.read().await;
        guard
            .users
            .get(user_id)
            .filter(|user| &user.tenant_id == tenant_id)
            .cloned()
            .ok_or_else(|| TenancyError::NotFound(format!("user {user_id}")))
    }

    async fn list_users(&self, tenant_id: &TenantId) -> TenancyResult<Vec<User>> {
        let guard = self.state.read().await;
        let mut users: Vec<User> = guard
            .users
            .values()
            .filter(|user| &user.tenant_id == tenant_id)
            .cloned()
            .collect();
        users.sort_by(|left, right| left.created_at.cmp(&right.created_at));
        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Role;
    use pretty_assertions::assert_eq;

    fn sample_tenant_request() -> CreateTenantRequest {
        CreateTenantRequest {
            name: "Acme Corp".into(),
            settings: HashMap::new(),
        }
    }

    #[tokio::test]
    async fn creates_and_fetches_tenant() {
        let service = InMemoryTenancyService::new();
        let tenant = service
            .create_tenant(sample_tenant_request())
            .await
            .expect("create tenant");
        let fetched = service.get_tenant(&tenant.id).await.expect("get tenant");
        assert_eq!(fetched.name, "Acme Corp");
        assert_eq!(fetched.status, TenantStatus::Active);
    }

    #[tokio::test]
    async fn rejects_duplicate_tenant_name() {
        let service = InMemoryTenancyService::new();
        service
            .create_tenant(sample_tenant_request())
            .await
            .expect("first tenant");
        let err = service
            .create_tenant(sample_tenant_request())
            .await
            .unwrap_err();
        assert!(matches!(err, TenancyError::Conflict(_)));
    }

    #[tokio::test]
    async fn user_scoped_to_tenant() {
        let service = InMemoryTenancyService::new();
        let tenant_a = service
            .create_tenant(sample_tenant_request())
            .await
            .expect("tenant a");
        let tenant_b = service
            .create_tenant(CreateTenantRequest {
                name: "Other Corp".into(),
                settings: HashMap::new(),
            })
            .await
            .expect("tenant b");

        let user = service
            .create_user(CreateUserRequest {
                tenant_id: tenant_a.id.clone(),
                username: "alice".into(),
                email: "alice@example.com".into(),
                password_hash: "hash".into(),
                roles: vec![Role::Contributor],
            })
            .await
            .expect("create user");

        assert!(service.get_user(&tenant_a.id, &user.id).await.is_ok());
        let err = service.get_user(&tenant_b.id, &user.id).await.unwrap_err();
        assert!(matches!(err, TenancyError::NotFound(_)));
    }
}
