use axum::extract::Query;
use axum::response::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::database::DatabaseManager;
use crate::error::ApiError;
use crate::services::resource::ResourceSearch;
use crate::services::{AnalyticsService, ResourceService};
use crate::storage::local;
use crate::types::{ActivityKind, ResourceType};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// Free text matched against title and description.
    pub q: Option<String>,
    /// Field slug filter.
    pub field: Option<String>,
    /// Semester number filter (1..6).
    pub semester: Option<i16>,
    #[serde(rename = "type")]
    pub resource_type: Option<ResourceType>,
    pub uploader: Option<Uuid>,
}

/// GET /search/resources - public search over approved resources, ordered
/// by recency then title, capped server-side.
pub async fn search_resources(Query(query): Query<SearchQuery>) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;

    let params = ResourceSearch {
        q: query.q.clone(),
        field: query.field,
        semester: query.semester,
        resource_type: query.resource_type,
        uploader: query.uploader,
    };
    let results = ResourceService::new(pool.clone(), local::store()).search(params).await?;

    if let Some(q) = query.q.filter(|q| !q.trim().is_empty()) {
        AnalyticsService::record_event(pool, ActivityKind::Search, None, None, Some(q));
    }

    Ok(Json(json!({ "success": true, "data": results })))
}
