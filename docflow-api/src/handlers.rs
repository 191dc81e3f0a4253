use axum::Json;
use axum::extract::Extension;
use axum::extract::Multipart;
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use docflow_common::ApiError;
use docflow_metadata_store::NewFolder;
use docflow_orchestrator::DownloadPreference;
use docflow_orchestrator::DownloadResponse;
use docflow_orchestrator::UploadRequest;
use docflow_tenancy::Permission;
use docflow_tenancy::TenantContext;

use crate::dto::BatchItemResult;
use crate::dto::BatchOperation;
use crate::dto::BatchRequest;
use crate::dto::BatchResponse;
use crate::dto::CombinedSearchRequest;
use crate::dto::ContentSearchRequest;
use crate::dto::CreateFolderRequest;
use crate::dto::FolderSearchRequest;
use crate::dto::MetadataSearchRequest;
use crate::dto::MoveFolderRequest;
use crate::dto::SearchResultDto;
use crate::dto::UploadAccepted;
use crate::dto::UploadMetadata;
use crate::dto::is_allowed_content_type;
use crate::dto::ALLOWED_CONTENT_TYPES;
use crate::dto::MAX_UPLOAD_BYTES;
use crate::error::HttpError;
use crate::error::HttpResult;
use crate::state::AppState;

/// Either returns the `presigned` query toggle as a [`DownloadPreference`]
/// or defaults to streaming the bytes directly.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct DownloadQuery {
    #[serde(default)]
    pub presigned: bool,
    #[serde(default = "default_presign_ttl")]
    pub ttl_secs: u64,
}

fn default_presign_ttl() -> u64 {
    300
}

pub async fn upload_document(
    State(state): State<AppState>,
    Extension(context): Extension<TenantContext>,
    mut multipart: Multipart,
) -> HttpResult<Response> {
    let mut metadata: Option<UploadMetadata> = None;
    let mut payload: Option<Vec<u8>> = None;
    let mut content_type: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::validation(format!("malformed multipart body: {err}")))?
    {
        match field.name() {
            Some("metadata") => {
                let raw = field
                    .text()
                    .await
                    .map_err(|err| ApiError::validation(format!("invalid metadata part: {err}")))?;
                metadata = Some(
                    serde_json::from_str(&raw)
                        .map_err(|err| ApiError::validation(format!("invalid metadata json: {err}")))?,
                );
            }
            Some("file") => {
                content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|err| ApiError::validation(format!("invalid file part: {err}")))?;
                payload = Some(bytes.to_vec());
            }
            _ => {}
        }
    }

    let metadata = metadata.ok_or_else(|| ApiError::validation("missing metadata part"))?;
    let payload = payload.ok_or_else(|| ApiError::validation("missing file part"))?;
    let content_type = content_type.unwrap_or_else(|| "application/octet-stream".to_string());

    if payload.len() > MAX_UPLOAD_BYTES {
        return Err(HttpError(ApiError::Payload {
            message: format!("upload exceeds the {MAX_UPLOAD_BYTES}-byte limit"),
        }));
    }
    if !is_allowed_content_type(&content_type) {
        return Err(HttpError(ApiError::Unsupported {
            message: format!(
                "content type {content_type} is not in the allowed list ({} types)",
                ALLOWED_CONTENT_TYPES.len()
            ),
        }));
    }

    let metadata_entries = metadata.metadata;
    let document = state
        .orchestrator
        .upload(
            &context,
            &context.tenant_id,
            UploadRequest {
                folder_id: metadata.folder_id,
                name: metadata.name,
                content_type,
                payload,
                sse_key_id: state.sse_key_id.clone(),
            },
        )
        .await?;

    for (key, value) in metadata_entries {
        state
            .metadata_kv
            .upsert(&context.tenant_id, &document.id, key, value)
            .await?;
    }

    let body = UploadAccepted {
        id: document.id,
        status: document.status.to_string(),
    };
    Ok((StatusCode::ACCEPTED, Json(body)).into_response())
}

pub async fn get_document(
    State(state): State<AppState>,
    Extension(context): Extension<TenantContext>,
    Path(document_id): Path<String>,
) -> HttpResult<Json<docflow_metadata_store::Document>> {
    context.require_permission(Permission::Read)?;
    let document = state.documents.get(&context.tenant_id, &document_id).await?;
    Ok(Json(document))
}

pub async fn download_document(
    State(state): State<AppState>,
    Extension(context): Extension<TenantContext>,
    Path(document_id): Path<String>,
    Query(query): Query<DownloadQuery>,
) -> HttpResult<Response> {
    let preference = if query.presigned {
        DownloadPreference::Presigned {
            ttl_secs: query.ttl_secs,
        }
    } else {
        DownloadPreference::Stream
    };

    let response = state
        .orchestrator
        .download(&context, &context.tenant_id, &document_id, preference)
        .await?;

    Ok(match response {
        DownloadResponse::Stream {
            content_type,
            payload,
        } => ([(axum::http::header::CONTENT_TYPE, content_type)], payload).into_response(),
        DownloadResponse::Presigned { url } => (
            StatusCode::FOUND,
            [(axum::http::header::LOCATION, url)],
        )
            .into_response(),
    })
}

pub async fn delete_document(
    State(state): State<AppState>,
    Extension(context): Extension<TenantContext>,
    Path(document_id): Path<String>,
) -> HttpResult<StatusCode> {
    state
        .orchestrator
        .delete(&context, &context.tenant_id, &document_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn batch_documents(
    State(state): State<AppState>,
    Extension(context): Extension<TenantContext>,
    Json(request): Json<BatchRequest>,
) -> HttpResult<(StatusCode, Json<BatchResponse>)> {
    let mut results = Vec::with_capacity(request.operations.len());
    for operation in request.operations {
        let BatchOperation::Delete { document_id } = operation;
        let outcome = state
            .orchestrator
            .delete(&context, &context.tenant_id, &document_id)
            .await;
        results.push(match outcome {
            Ok(()) => BatchItemResult {
                document_id,
                success: true,
                error: None,
            },
            Err(err) => BatchItemResult {
                document_id,
                success: false,
                error: Some(err.to_string()),
            },
        });
    }
    Ok((StatusCode::MULTI_STATUS, Json(BatchResponse { results })))
}

pub async fn search_content(
    State(state): State<AppState>,
    Extension(context): Extension<TenantContext>,
    Json(request): Json<ContentSearchRequest>,
) -> HttpResult<Json<SearchResultDto>> {
    context.require_permission(Permission::Read)?;
    let page = request.page.validated()?;
    let result = state
        .indexer
        .search_content(&context.tenant_id, &request.query, page)
        .await?;
    Ok(Json(to_dto(result, page)))
}

pub async fn search_metadata(
    State(state): State<AppState>,
    Extension(context): Extension<TenantContext>,
    Json(request): Json<MetadataSearchRequest>,
) -> HttpResult<Json<SearchResultDto>> {
    context.require_permission(Permission::Read)?;
    let page = request.page.validated()?;
    let result = state
        .indexer
        .search_metadata(&context.tenant_id, request.metadata, page)
        .await?;
    Ok(Json(to_dto(result, page)))
}

pub async fn search_combined(
    State(state): State<AppState>,
    Extension(context): Extension<TenantContext>,
    Json(request): Json<CombinedSearchRequest>,
) -> HttpResult<Json<SearchResultDto>> {
    context.require_permission(Permission::Read)?;
    let page = request.page.validated()?;
    let result = state
        .indexer
        .search_combined(&context.tenant_id, &request.query, request.metadata, page)
        .await?;
    Ok(Json(to_dto(result, page)))
}

pub async fn search_folder(
    State(state): State<AppState>,
    Extension(context): Extension<TenantContext>,
    Json(request): Json<FolderSearchRequest>,
) -> HttpResult<Json<SearchResultDto>> {
    context.require_permission(Permission::Read)?;
    let page = request.page.validated()?;
    let result = state
        .indexer
        .search_in_folder(&context.tenant_id, &request.folder_id, &request.query, page)
        .await?;
    Ok(Json(to_dto(result, page)))
}

fn to_dto(page: docflow_search_indexer::SearchPage, valid: docflow_common::ValidPage) -> SearchResultDto {
    SearchResultDto {
        document_ids: page.document_ids,
        total: page.total,
        page: valid.page,
        page_size: valid.page_size,
    }
}

pub async fn create_folder(
    State(state): State<AppState>,
    Extension(context): Extension<TenantContext>,
    Json(request): Json<CreateFolderRequest>,
) -> HttpResult<(StatusCode, Json<docflow_metadata_store::Folder>)> {
    context.require_permission(Permission::ManageFolders)?;
    let folder = state
        .folders
        .create(
            &context.tenant_id,
            NewFolder {
                parent_id: request.parent_id,
                name: request.name,
                owner_id: context.subject_id.clone(),
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(folder)))
}

pub async fn list_folder_children(
    State(state): State<AppState>,
    Extension(context): Extension<TenantContext>,
    Path(folder_id): Path<String>,
    Query(page): Query<docflow_common::PageRequest>,
) -> HttpResult<Json<docflow_common::Paginated<docflow_metadata_store::Folder>>> {
    context.require_permission(Permission::Read)?;
    let page = page.validated()?;
    let children = state
        .folders
        .list_children(&context.tenant_id, Some(&folder_id), page)
        .await?;
    Ok(Json(children))
}

pub async fn move_folder(
    State(state): State<AppState>,
    Extension(context): Extension<TenantContext>,
    Path(folder_id): Path<String>,
    Json(request): Json<MoveFolderRequest>,
) -> HttpResult<Json<docflow_metadata_store::Folder>> {
    context.require_permission(Permission::ManageFolders)?;
    let folder = state
        .folders
        .move_folder(&context.tenant_id, &folder_id, request.new_parent_id)
        .await?;
    Ok(Json(folder))
}
