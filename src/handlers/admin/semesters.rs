use axum::extract::Path;
use axum::response::Json;
use axum::Extension;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::database::DatabaseManager;
use crate::error::ApiError;
use crate::middleware::AuthContext;
use crate::scope::resolve_scope;
use crate::services::HierarchyService;

#[derive(Debug, Deserialize)]
pub struct SemesterNumber {
    pub number: i16,
}

/// GET /api/admin/fields/:id/semesters
pub async fn list(
    Extension(ctx): Extension<AuthContext>,
    Path(field_id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let scope = resolve_scope(&ctx, &pool).await;
    let semesters = HierarchyService::new(pool).list_semesters(&scope, field_id).await?;
    Ok(Json(json!({ "success": true, "data": semesters })))
}

/// POST /api/admin/fields/:id/semesters
pub async fn create(
    Extension(ctx): Extension<AuthContext>,
    Path(field_id): Path<Uuid>,
    Json(payload): Json<SemesterNumber>,
) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let scope = resolve_scope(&ctx, &pool).await;
    let semester = HierarchyService::new(pool)
        .create_semester(&scope, field_id, payload.number)
        .await?;
    Ok(Json(json!({ "success": true, "data": semester })))
}

/// PUT /api/admin/semesters/:id
pub async fn update(
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SemesterNumber>,
) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let scope = resolve_scope(&ctx, &pool).await;
    let semester = HierarchyService::new(pool).update_semester(&scope, id, payload.number).await?;
    Ok(Json(json!({ "success": true, "data": semester })))
}

/// DELETE /api/admin/semesters/:id - cascades to modules and below
pub async fn remove(
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let scope = resolve_scope(&ctx, &pool).await;
    HierarchyService::new(pool).delete_semester(&scope, id).await?;
    Ok(Json(json!({ "success": true, "data": { "deleted": id } })))
}
