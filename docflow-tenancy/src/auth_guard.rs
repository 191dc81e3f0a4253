use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use async_trait::async_trait;
use docflow_common::TenantId;
use docflow_common::UserId;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::Validation;
use jsonwebtoken::decode;
use serde::Deserialize;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::Role;
use crate::TenancyError;
use crate::TenancyResult;
use crate::TenantContext;

const PUBLIC_KEY_TTL: Duration = Duration::from_secs(60);

/// Claims carried by the bearer token: `{sub, tenant_id, roles, iss,
/// iat, exp}`. jsonwebtoken rejects an expired/malformed
/// token before this struct is even populated; missing required claims
/// fail at `Deserialize` time, giving the "rejects tokens with missing
/// required claims" behavior for free.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: UserId,
    pub tenant_id: TenantId,
    pub roles: Vec<String>,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

/// Loads the RS256 public key used to verify tokens. Out of core scope is
/// *where* the key comes from (file, KMS, JWKS endpoint) — only the
/// refresh contract matters here.
#[async_trait]
pub trait PublicKeyStore: Send + Sync {
    async fn load(&self) -> TenancyResult<Vec<u8>>;
}

/// Single-flight, TTL-refreshed cache over a `PublicKeyStore`. Keys are
/// loaded once, kept immutable, and refreshed via a single-flight loader
/// on rotation rather than reparsed per request.
pub struct PublicKeyCache {
    store: Arc<dyn PublicKeyStore>,
    state: Mutex<Option<(Instant, Arc<DecodingKey>)>>,
}

impl PublicKeyCache {
    #[must_use]
    pub fn new(store: Arc<dyn PublicKeyStore>) -> Self {
        Self {
            store,
            state: Mutex::new(None),
        }
    }

    /// Returns the cached key, reloading at most once per TTL window even
    /// under concurrent callers — they serialize on the mutex and the
    /// first one through refreshes the cache for everyone behind it.
    pub async fn get(&self) -> TenancyResult<Arc<DecodingKey>> {
        let mut guard = self.state.lock().await;
        if let Some((loaded_at, key)) = guard.as_ref()
            && loaded_at.elapsed() < PUBLIC_KEY_TTL
        {
            return Ok(key.clone());
        }

        let pem = self.store.load().await?;
        let key = DecodingKey::from_rsa_pem(&pem)
            .map_err(|err| TenancyError::Internal(format!("invalid public key pem: {err}")))?;
        let key = Arc::new(key);
        *guard = Some((Instant::now(), key.clone()));
        Ok(key)
    }
}

#[async_trait]
pub trait AuthGuard: Send + Sync {
    /// Verifies an `Authorization: Bearer <jwt>` value and returns the
    /// `TenantContext` to thread through every subsequent core call.
    async fn authenticate(&self, bearer_token: &str) -> TenancyResult<TenantContext>;
}

pub struct JwtAuthGuard {
    keys: Arc<PublicKeyCache>,
    expected_issuer: String,
}

impl JwtAuthGuard {
    #[must_use]
    pub fn new(keys: Arc<PublicKeyCache>, expected_issuer: impl Into<String>) -> Self {
        Self {
            keys,
            expected_issuer: expected_issuer.into(),
        }
    }

    fn parse_roles(raw: &[String]) -> TenancyResult<Vec<Role>> {
        raw.iter()
            .map(|role| match role.as_str() {
                "reader" => Ok(Role::Reader),
                "contributor" => Ok(Role::Contributor),
                "editor" => Ok(Role::Editor),
                "administrator" => Ok(Role::Administrator),
                other => Err(TenancyError::Validation(format!(
                    "unrecognized role claim {other}"
                ))),
            })
            .collect()
    }
}

#[async_trait]
impl AuthGuard for JwtAuthGuard {
    async fn authenticate(&self, bearer_token: &str) -> TenancyResult<TenantContext> {
        let key = self.keys.get().await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[self.expected_issuer.clone()]);
        validation.set_required_spec_claims(&["sub", "exp", "iss"]);

        let data = decode::<Claims>(bearer_token, &key, &validation)
            .map_err(|err| TenancyError::Rejected(format!("invalid bearer token: {err}")))?;

        let roles = Self::parse_roles(&data.claims.roles)?;
        if roles.is_empty() {
            return Err(TenancyError::Rejected(
                "token carries no recognized roles".into(),
            ));
        }

        Ok(TenantContext {
            tenant_id: data.claims.tenant_id,
            subject_id: data.claims.sub,
            roles,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use jsonwebtoken::EncodingKey;
    use jsonwebtoken::Header;
    use jsonwebtoken::encode;

    use super::*;

    const TEST_PRIVATE_KEY: &str = include_str!("../tests/fixtures/test_rsa_private.pem");
    const TEST_PUBLIC_KEY: &str = include_str!("../tests/fixtures/test_rsa_public.pem");

    struct StaticKeyStore;

    #[async_trait]
    impl PublicKeyStore for StaticKeyStore {
        async fn load(&self) -> TenancyResult<Vec<u8>> {
            Ok(TEST_PUBLIC_KEY.as_bytes().to_vec())
        }
    }

    fn sign_claims(claims: &Claims) -> String {
        let key = EncodingKey::from_rsa_pem(TEST_PRIVATE_KEY.as_bytes()).expect("load private key");
        encode(&Header::new(Algorithm::RS256), claims, &key).expect("sign token")
    }

    fn valid_claims() -> Claims {
        let now = Utc::now().timestamp();
        Claims {
            sub: "user-1".into(),
            tenant_id: "tenant-a".into(),
            roles: vec!["contributor".into()],
            iss: "docflow-auth".into(),
            iat: now,
            exp: now + 3600,
        }
    }

    #[tokio::test]
    async fn accepts_valid_token() {
        let guard = JwtAuthGuard::new(
            Arc::new(PublicKeyCache::new(Arc::new(StaticKeyStore))),
            "docflow-auth",
        );
        let token = sign_claims(&valid_claims());
        let context = guard.authenticate(&token).await.expect("should verify");
        assert_eq!(context.tenant_id, "tenant-a");
        assert_eq!(context.subject_id, "user-1");
        assert_eq!(context.roles, vec![Role::Contributor]);
    }

    #[tokio::test]
    async fn rejects_wrong_issuer() {
        let guard = JwtAuthGuard::new(
            Arc::new(PublicKeyCache::new(Arc::new(StaticKeyStore))),
            "docflow-auth",
        );
        let mut claims = valid_claims();
        claims.iss = "someone-else".into();
        let token = sign_claims(&claims);
        let err = guard.authenticate(&token).await.unwrap_err();
        assert!(matches!(err, TenancyError::Rejected(_)));
    }

    #[tokio::test]
    async fn rejects_expired_token() {
        let guard = JwtAuthGuard::new(
            Arc::new(PublicKeyCache::new(Arc::new(StaticKeyStore))),
            "docflow-auth",
        );
        let mut claims = valid_claims();
        claims.exp = Utc::now().timestamp() - 10;
        let token = sign_claims(&claims);
        let err = guard.authenticate(&token).await.unwrap_err();
        assert!(matches!(err, TenancyError::Rejected(_)));
    }

    #[tokio::test]
    async fn rejects_unrecognized_role() {
        let guard = JwtAuthGuard::new(
            Arc::new(PublicKeyCache::new(Arc::new(StaticKeyStore))),
            "docflow-auth",
        );
        let mut claims = valid_claims();
        claims.roles = vec!["superuser".into()];
        let token = sign_claims(&claims);
        let err = guard.authenticate(&token).await.unwrap_err();
        assert!(matches!(err, TenancyError::Validation(_)));
    }

    #[tokio::test]
    async fn key_cache_reuses_within_ttl() {
        let cache = PublicKeyCache::new(Arc::new(StaticKeyStore));
        let first = cache.get().await.expect("first load");
        let second = cache.get().await.expect("second load");
        assert!(Arc::ptr_eq(&first, &second));
    }
}
