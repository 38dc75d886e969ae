use axum::extract::{Multipart, Path, Query};
use axum::response::Json;
use axum::Extension;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::database::DatabaseManager;
use crate::error::ApiError;
use crate::middleware::AuthContext;
use crate::scope::resolve_scope;
use crate::services::resource::NewResource;
use crate::services::ResourceService;
use crate::storage::local;
use crate::types::{ResourceStatus, ResourceType};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<ResourceStatus>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateResourceRequest {
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub resource_type: Option<ResourceType>,
    /// Absent keeps the current description; explicit `null` clears it.
    #[serde(default, deserialize_with = "crate::handlers::nullable_update")]
    pub description: Option<Option<String>>,
}

/// GET /api/admin/resources?status=pending
pub async fn list(
    Extension(ctx): Extension<AuthContext>,
    Query(params): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let scope = resolve_scope(&ctx, &pool).await;
    let resources = ResourceService::new(pool, local::store())
        .list_admin(&scope, params.status)
        .await?;
    Ok(Json(json!({ "success": true, "data": resources })))
}

/// POST /api/admin/resources - multipart upload.
///
/// Expected parts: `title`, `type`, `module_id`, `file` (required) plus
/// `description` and `submodule_id` (optional).
pub async fn create(
    Extension(ctx): Extension<AuthContext>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let scope = resolve_scope(&ctx, &pool).await;

    let mut title: Option<String> = None;
    let mut resource_type: Option<ResourceType> = None;
    let mut description: Option<String> = None;
    let mut module_id: Option<Uuid> = None;
    let mut submodule_id: Option<Uuid> = None;
    let mut file: Option<(String, Option<String>, Vec<u8>)> = None;

    while let Some(part) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Malformed multipart body: {}", e)))?
    {
        let name = part.name().unwrap_or_default().to_string();
        match name.as_str() {
            "title" => title = Some(read_text(part).await?),
            "type" => {
                let raw = read_text(part).await?;
                let parsed: ResourceType = serde_json::from_value(Value::String(raw.clone()))
                    .map_err(|_| {
                        ApiError::bad_request(format!("Unknown resource type: {}", raw))
                    })?;
                resource_type = Some(parsed);
            }
            "description" => description = Some(read_text(part).await?),
            "module_id" => module_id = Some(read_uuid(part, "module_id").await?),
            "submodule_id" => submodule_id = Some(read_uuid(part, "submodule_id").await?),
            "file" => {
                let original_name = part
                    .file_name()
                    .map(|n| n.to_string())
                    .ok_or_else(|| ApiError::bad_request("File part is missing a file name"))?;
                let mime_type = part.content_type().map(|m| m.to_string());
                let bytes = part
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read file: {}", e)))?;
                file = Some((original_name, mime_type, bytes.to_vec()));
            }
            other => {
                return Err(ApiError::bad_request(format!("Unexpected form field: {}", other)))
            }
        }
    }

    let title = title.ok_or_else(|| ApiError::bad_request("Missing form field: title"))?;
    let resource_type =
        resource_type.ok_or_else(|| ApiError::bad_request("Missing form field: type"))?;
    let module_id =
        module_id.ok_or_else(|| ApiError::bad_request("Missing form field: module_id"))?;
    let (original_name, mime_type, bytes) =
        file.ok_or_else(|| ApiError::bad_request("Missing form field: file"))?;

    let new = NewResource {
        title,
        resource_type,
        description,
        module_id,
        submodule_id,
        original_name,
        mime_type,
        bytes,
    };
    let resource = ResourceService::new(pool, local::store()).create(&scope, &ctx, new).await?;
    Ok(Json(json!({ "success": true, "data": resource })))
}

/// PUT /api/admin/resources/:id - metadata only; the file is immutable.
pub async fn update(
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateResourceRequest>,
) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let scope = resolve_scope(&ctx, &pool).await;
    let resource = ResourceService::new(pool, local::store())
        .update(
            &scope,
            id,
            payload.title.as_deref(),
            payload.resource_type,
            payload.description.as_ref().map(|d| d.as_deref()),
        )
        .await?;
    Ok(Json(json!({ "success": true, "data": resource })))
}

/// DELETE /api/admin/resources/:id
pub async fn remove(
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let scope = resolve_scope(&ctx, &pool).await;
    ResourceService::new(pool, local::store()).delete(&scope, id).await?;
    Ok(Json(json!({ "success": true, "data": { "deleted": id } })))
}

/// POST /api/admin/resources/:id/approve
pub async fn approve(
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let scope = resolve_scope(&ctx, &pool).await;
    let resource = ResourceService::new(pool, local::store()).approve(&scope, id).await?;
    Ok(Json(json!({ "success": true, "data": resource })))
}

/// POST /api/admin/resources/:id/reject
pub async fn reject(
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let scope = resolve_scope(&ctx, &pool).await;
    let resource = ResourceService::new(pool, local::store()).reject(&scope, id).await?;
    Ok(Json(json!({ "success": true, "data": resource })))
}

async fn read_text(part: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
    part.text()
        .await
        .map_err(|e| ApiError::bad_request(format!("Malformed multipart body: {}", e)))
}

async fn read_uuid(
    part: axum::extract::multipart::Field<'_>,
    field: &str,
) -> Result<Uuid, ApiError> {
    let raw = read_text(part).await?;
    Uuid::parse_str(raw.trim())
        .map_err(|_| ApiError::bad_request(format!("Invalid UUID in form field: {}", field)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_payload_distinguishes_absent_from_null_description() {
        let absent: UpdateResourceRequest =
            serde_json::from_str(r#"{"title": "Final exam 2024"}"#).unwrap();
        assert_eq!(absent.description, None);

        let cleared: UpdateResourceRequest =
            serde_json::from_str(r#"{"description": null}"#).unwrap();
        assert_eq!(cleared.description, Some(None));
    }
}
