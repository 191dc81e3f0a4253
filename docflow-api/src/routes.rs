use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::get;
use axum::routing::patch;
use axum::routing::post;

use crate::auth::require_tenant_context;
use crate::handlers;
use crate::state::AppState;

/// Assembles the full `/api/v1` router. Every route sits behind
/// [`require_tenant_context`]; handlers receive an already-verified
/// [`docflow_tenancy::TenantContext`] via `Extension` and delegate
/// straight into the orchestrator, search indexer, or folder repository.
pub fn build_router(state: AppState) -> Router {
    let api = api_v1_router().layer(from_fn_with_state(state.clone(), require_tenant_context));
    Router::new().nest("/api/v1", api).with_state(state)
}

fn api_v1_router() -> Router<AppState> {
    Router::new()
        .route("/documents", post(handlers::upload_document))
        .route("/documents/batch", post(handlers::batch_documents))
        .route(
            "/documents/{id}",
            get(handlers::get_document).delete(handlers::delete_document),
        )
        .route("/documents/{id}/content", get(handlers::download_document))
        .route("/search/content", post(handlers::search_content))
        .route("/search/metadata", post(handlers::search_metadata))
        .route("/search/combined", post(handlers::search_combined))
        .route("/search/folder", post(handlers::search_folder))
        .route("/folders", post(handlers::create_folder))
        .route("/folders/{id}/children", get(handlers::list_folder_children))
        .route("/folders/{id}/move", patch(handlers::move_folder))
}
