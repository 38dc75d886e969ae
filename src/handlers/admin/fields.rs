//! Field administration. Fields sit above every (field, semester) grant,
//! so mutations here are super-admin territory; class-admins still see the
//! fields their grants touch in listings.

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
pub struct CreateField {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateField {
    pub name: Option<String>,
    /// Absent keeps the current description; explicit `null` clears it.
    #[serde(default, deserialize_with = "crate::handlers::nullable_update")]
    pub description: Option<Option<String>>,
}

/// GET /api/admin/fields
pub async fn list(Extension(ctx): Extension<AuthContext>) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let scope = resolve_scope(&ctx, &pool).await;
    let fields = HierarchyService::new(pool).list_fields(&scope).await?;
    Ok(Json(json!({ "success": true, "data": fields })))
}

/// POST /api/admin/fields
pub async fn create(
    Extension(ctx): Extension<AuthContext>,
    Json(payload): Json<CreateField>,
) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let scope = resolve_scope(&ctx, &pool).await;
    let field = HierarchyService::new(pool)
        .create_field(&scope, &payload.name, payload.description.as_deref())
        .await?;
    Ok(Json(json!({ "success": true, "data": field })))
}

/// PUT /api/admin/fields/:id
pub async fn update(
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateField>,
) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let scope = resolve_scope(&ctx, &pool).await;
    let field = HierarchyService::new(pool)
        .update_field(
            &scope,
            id,
            payload.name.as_deref(),
            payload.description.as_ref().map(|d| d.as_deref()),
        )
        .await?;
    Ok(Json(json!({ "success": true, "data": field })))
}

/// DELETE /api/admin/fields/:id - cascades through the entire subtree
pub async fn remove(
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let scope = resolve_scope(&ctx, &pool).await;
    HierarchyService::new(pool).delete_field(&scope, id).await?;
    Ok(Json(json!({ "success": true, "data": { "deleted": id } })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_payload_distinguishes_absent_from_null_description() {
        let absent: UpdateField = serde_json::from_str(r#"{"name": "Maths"}"#).unwrap();
        assert_eq!(absent.description, None);

        let cleared: UpdateField = serde_json::from_str(r#"{"description": null}"#).unwrap();
        assert_eq!(cleared.description, Some(None));

        let replaced: UpdateField =
            serde_json::from_str(r#"{"description": "Applied mathematics"}"#).unwrap();
        assert_eq!(replaced.description, Some(Some("Applied mathematics".to_string())));
    }
}
