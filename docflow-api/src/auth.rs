use axum::extract::Request;
use axum::extract::State;
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use docflow_common::ApiError;

use crate::error::HttpError;
use crate::state::AppState;

/// Verifies the `Authorization: Bearer <jwt>` header via the configured
/// [`docflow_tenancy::AuthGuard`] and stashes the resulting
/// [`TenantContext`] in request extensions for handlers to pull out.
/// Everything downstream of this layer can assume a context is present.
pub async fn require_tenant_context(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, HttpError> {
    let token = extract_bearer_token(&request)
        .ok_or_else(|| ApiError::authentication("missing or malformed Authorization header"))?;

    let context = state.auth.authenticate(&token).await?;
    request.extensions_mut().insert(context);

    Ok(next.run(request).await)
}

fn extract_bearer_token(request: &Request) -> Option<String> {
    let raw = request.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    raw.strip_prefix("Bearer ").map(str::to_string)
}
