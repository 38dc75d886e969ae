use axum::body::Body;
use axum::extract::Path;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use tokio_util::io::ReaderStream;
use uuid::Uuid;

use crate::database::DatabaseManager;
use crate::error::ApiError;
use crate::services::{AnalyticsService, HierarchyService, ResourceService};
use crate::storage::{local, FileStore};
use crate::types::ActivityKind;

/// GET /download/:id - stream an approved resource's file and log the
/// download.
pub async fn download(Path(id): Path<Uuid>) -> Result<Response, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let store = local::store();

    let resource = ResourceService::new(pool.clone(), store.clone()).get_approved(id).await?;
    let reader = store.open_file(&resource.file_path).await?;

    let chain = HierarchyService::new(pool.clone()).module_chain(resource.module_id).await?;
    AnalyticsService::record_event(
        pool,
        ActivityKind::Download,
        Some(chain.field_id),
        Some(resource.module_id),
        None,
    );

    let file_name = std::path::Path::new(&resource.file_path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("download")
        .to_string();
    let content_type = resource
        .mime_type
        .unwrap_or_else(|| "application/octet-stream".to_string());

    // Stream from disk; files up to the upload cap never sit in memory.
    let body = Body::from_stream(ReaderStream::new(reader));

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_LENGTH, resource.size_bytes.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        body,
    )
        .into_response())
}
