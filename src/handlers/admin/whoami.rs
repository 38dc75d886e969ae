use axum::response::Json;
use axum::Extension;
use serde_json::{json, Value};

use crate::database::DatabaseManager;
use crate::error::ApiError;
use crate::middleware::AuthContext;
use crate::scope::{resolve_scope, Scope};

/// GET /api/admin/whoami - the caller's identity and effective scope.
pub async fn whoami(Extension(ctx): Extension<AuthContext>) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let scope = resolve_scope(&ctx, &pool).await;

    let scope_json = match scope {
        Scope::Unrestricted => json!("unrestricted"),
        Scope::Empty => json!("empty"),
        Scope::Restricted(pairs) => json!(pairs
            .iter()
            .map(|p| json!({ "field_id": p.field_id, "semester_id": p.semester_id }))
            .collect::<Vec<_>>()),
    };

    Ok(Json(json!({
        "success": true,
        "data": {
            "user_id": ctx.user_id,
            "email": ctx.email,
            "role": ctx.role,
            "scope": scope_json,
        }
    })))
}
