use axum::response::Json;
use axum::Extension;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::database::models::AdminScope;
use crate::database::DatabaseManager;
use crate::error::ApiError;
use crate::middleware::AuthContext;
use crate::types::Role;

#[derive(Debug, Deserialize)]
pub struct GrantRequest {
    pub user_id: Uuid,
    pub field_id: Uuid,
    pub semester_id: Uuid,
}

fn require_super_admin(ctx: &AuthContext) -> Result<(), ApiError> {
    if ctx.role != Role::SuperAdmin {
        return Err(ApiError::forbidden("Scope grants are managed by super-admins only"));
    }
    Ok(())
}

/// GET /api/admin/scopes - every grant, newest first.
pub async fn list(Extension(ctx): Extension<AuthContext>) -> Result<Json<Value>, ApiError> {
    require_super_admin(&ctx)?;
    let pool = DatabaseManager::pool().await?;
    let grants = sqlx::query_as::<_, AdminScope>(
        "SELECT * FROM admin_scopes ORDER BY created_at DESC",
    )
    .fetch_all(&pool)
    .await?;
    Ok(Json(json!({ "success": true, "data": grants })))
}

/// POST /api/admin/scopes - grant a (field, semester) pair to a user.
pub async fn grant(
    Extension(ctx): Extension<AuthContext>,
    Json(payload): Json<GrantRequest>,
) -> Result<Json<Value>, ApiError> {
    require_super_admin(&ctx)?;
    let pool = DatabaseManager::pool().await?;

    // The pair must be coherent: the semester has to belong to the field,
    // otherwise the grant would never match anything.
    let belongs: Option<(i32,)> =
        sqlx::query_as("SELECT 1 FROM semesters WHERE id = $1 AND field_id = $2")
            .bind(payload.semester_id)
            .bind(payload.field_id)
            .fetch_optional(&pool)
            .await?;
    if belongs.is_none() {
        return Err(ApiError::bad_request("Semester does not belong to the given field"));
    }

    let target_role: Option<(Role,)> = sqlx::query_as("SELECT role FROM users WHERE id = $1")
        .bind(payload.user_id)
        .fetch_optional(&pool)
        .await?;
    match target_role {
        None => return Err(ApiError::not_found("User not found")),
        Some((Role::ClassAdmin,)) => {}
        Some(_) => {
            return Err(ApiError::bad_request("Scope grants apply to class-admin users only"))
        }
    }

    // Re-granting an existing pair is a no-op, not an error.
    sqlx::query(
        "INSERT INTO admin_scopes (user_id, field_id, semester_id) VALUES ($1, $2, $3) \
         ON CONFLICT (user_id, field_id, semester_id) DO NOTHING",
    )
    .bind(payload.user_id)
    .bind(payload.field_id)
    .bind(payload.semester_id)
    .execute(&pool)
    .await?;

    let grant = sqlx::query_as::<_, AdminScope>(
        "SELECT * FROM admin_scopes WHERE user_id = $1 AND field_id = $2 AND semester_id = $3",
    )
    .bind(payload.user_id)
    .bind(payload.field_id)
    .bind(payload.semester_id)
    .fetch_one(&pool)
    .await?;
    Ok(Json(json!({ "success": true, "data": grant })))
}

/// DELETE /api/admin/scopes - revoke a grant.
pub async fn revoke(
    Extension(ctx): Extension<AuthContext>,
    Json(payload): Json<GrantRequest>,
) -> Result<Json<Value>, ApiError> {
    require_super_admin(&ctx)?;
    let pool = DatabaseManager::pool().await?;

    let result = sqlx::query(
        "DELETE FROM admin_scopes WHERE user_id = $1 AND field_id = $2 AND semester_id = $3",
    )
    .bind(payload.user_id)
    .bind(payload.field_id)
    .bind(payload.semester_id)
    .execute(&pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Scope grant not found"));
    }
    Ok(Json(json!({ "success": true, "data": { "revoked": true } })))
}
