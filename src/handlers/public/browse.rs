//! Public hierarchy browsing. Students see everything; only approved
//! resources are listed. View events are logged best-effort.

use axum::extract::Path;
use axum::response::Json;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::database::DatabaseManager;
use crate::error::ApiError;
use crate::scope::Scope;
use crate::services::{AnalyticsService, HierarchyService, ResourceService};
use crate::storage::local;
use crate::types::ActivityKind;

/// GET /browse/fields - all fields
pub async fn list_fields() -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let fields = HierarchyService::new(pool).list_fields(&Scope::Unrestricted).await?;
    Ok(Json(json!({ "success": true, "data": fields })))
}

/// GET /browse/fields/:slug - one field with its semesters
pub async fn field_detail(Path(slug): Path<String>) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let hierarchy = HierarchyService::new(pool.clone());

    let field = hierarchy.get_field_by_slug(&slug).await?;
    let semesters = hierarchy.list_semesters(&Scope::Unrestricted, field.id).await?;

    AnalyticsService::record_event(pool, ActivityKind::FieldView, Some(field.id), None, None);

    Ok(Json(json!({
        "success": true,
        "data": { "field": field, "semesters": semesters }
    })))
}

/// GET /browse/fields/:slug/semesters/:number - modules of one semester
pub async fn semester_modules(
    Path((slug, number)): Path<(String, i16)>,
) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let hierarchy = HierarchyService::new(pool);

    let field = hierarchy.get_field_by_slug(&slug).await?;
    let semesters = hierarchy.list_semesters(&Scope::Unrestricted, field.id).await?;
    let semester = semesters
        .into_iter()
        .find(|s| s.number == number)
        .ok_or_else(|| ApiError::not_found("Semester not found"))?;

    let modules = hierarchy.list_modules(&Scope::Unrestricted, semester.id).await?;

    Ok(Json(json!({
        "success": true,
        "data": { "field": field, "semester": semester, "modules": modules }
    })))
}

/// GET /browse/modules/:id - module page with submodules and approved
/// resources
pub async fn module_detail(Path(id): Path<Uuid>) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let hierarchy = HierarchyService::new(pool.clone());

    let module = hierarchy.get_module(&Scope::Unrestricted, id).await?;
    let chain = hierarchy.module_chain(id).await?;
    let submodules = hierarchy.list_submodules(&Scope::Unrestricted, id).await?;
    let resources = ResourceService::new(pool.clone(), local::store())
        .list_approved_for_module(id)
        .await?;

    AnalyticsService::record_event(
        pool,
        ActivityKind::ModuleView,
        Some(chain.field_id),
        Some(id),
        None,
    );

    Ok(Json(json!({
        "success": true,
        "data": {
            "module": module,
            "submodules": submodules,
            "resources": resources
        }
    })))
}
