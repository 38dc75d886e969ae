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
pub struct ModuleName {
    pub name: String,
}

/// GET /api/admin/semesters/:id/modules
pub async fn list(
    Extension(ctx): Extension<AuthContext>,
    Path(semester_id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let scope = resolve_scope(&ctx, &pool).await;
    let modules = HierarchyService::new(pool).list_modules(&scope, semester_id).await?;
    Ok(Json(json!({ "success": true, "data": modules })))
}

/// POST /api/admin/semesters/:id/modules
pub async fn create(
    Extension(ctx): Extension<AuthContext>,
    Path(semester_id): Path<Uuid>,
    Json(payload): Json<ModuleName>,
) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let scope = resolve_scope(&ctx, &pool).await;
    let module = HierarchyService::new(pool).create_module(&scope, semester_id, &payload.name).await?;
    Ok(Json(json!({ "success": true, "data": module })))
}

/// PUT /api/admin/modules/:id - renames regenerate the slug within the
/// semester namespace
pub async fn update(
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ModuleName>,
) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let scope = resolve_scope(&ctx, &pool).await;
    let module = HierarchyService::new(pool).update_module(&scope, id, &payload.name).await?;
    Ok(Json(json!({ "success": true, "data": module })))
}

/// DELETE /api/admin/modules/:id - cascades to submodules and resources
pub async fn remove(
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let scope = resolve_scope(&ctx, &pool).await;
    HierarchyService::new(pool).delete_module(&scope, id).await?;
    Ok(Json(json!({ "success": true, "data": { "deleted": id } })))
}
