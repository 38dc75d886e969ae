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
pub struct SubmoduleName {
    pub name: String,
}

/// GET /api/admin/modules/:id/submodules
pub async fn list(
    Extension(ctx): Extension<AuthContext>,
    Path(module_id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let scope = resolve_scope(&ctx, &pool).await;
    let submodules = HierarchyService::new(pool).list_submodules(&scope, module_id).await?;
    Ok(Json(json!({ "success": true, "data": submodules })))
}

/// POST /api/admin/modules/:id/submodules
pub async fn create(
    Extension(ctx): Extension<AuthContext>,
    Path(module_id): Path<Uuid>,
    Json(payload): Json<SubmoduleName>,
) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let scope = resolve_scope(&ctx, &pool).await;
    let submodule =
        HierarchyService::new(pool).create_submodule(&scope, module_id, &payload.name).await?;
    Ok(Json(json!({ "success": true, "data": submodule })))
}

/// PUT /api/admin/submodules/:id
pub async fn update(
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SubmoduleName>,
) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let scope = resolve_scope(&ctx, &pool).await;
    let submodule = HierarchyService::new(pool).update_submodule(&scope, id, &payload.name).await?;
    Ok(Json(json!({ "success": true, "data": submodule })))
}

/// DELETE /api/admin/submodules/:id
pub async fn remove(
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let scope = resolve_scope(&ctx, &pool).await;
    HierarchyService::new(pool).delete_submodule(&scope, id).await?;
    Ok(Json(json!({ "success": true, "data": { "deleted": id } })))
}
