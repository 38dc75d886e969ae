use axum::extract::Query;
use axum::response::Json;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::database::DatabaseManager;
use crate::error::ApiError;
use crate::services::AnalyticsService;
use crate::types::ActivityKind;

const DEFAULT_WINDOW_DAYS: i64 = 30;
const DEFAULT_TOP_LIMIT: i64 = 20;

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub kind: Option<ActivityKind>,
    pub limit: Option<i64>,
}

impl ReportQuery {
    fn window(&self) -> Result<(DateTime<Utc>, DateTime<Utc>), ApiError> {
        let to = self.to.unwrap_or_else(Utc::now);
        let from = self.from.unwrap_or(to - Duration::days(DEFAULT_WINDOW_DAYS));
        if from > to {
            return Err(ApiError::bad_request("Report window start is after its end"));
        }
        Ok((from, to))
    }
}

/// GET /api/admin/analytics/top-searches
pub async fn top_searches(Query(params): Query<ReportQuery>) -> Result<Json<Value>, ApiError> {
    let (from, to) = params.window()?;
    let limit = params.limit.unwrap_or(DEFAULT_TOP_LIMIT).clamp(1, 100);
    let pool = DatabaseManager::pool().await?;
    let rows = AnalyticsService::new(pool).top_search_queries(from, to, limit).await?;
    Ok(Json(json!({ "success": true, "data": rows })))
}

/// GET /api/admin/analytics/by-field
pub async fn by_field(Query(params): Query<ReportQuery>) -> Result<Json<Value>, ApiError> {
    let (from, to) = params.window()?;
    let kind = params.kind.unwrap_or(ActivityKind::FieldView);
    let pool = DatabaseManager::pool().await?;
    let rows = AnalyticsService::new(pool).counts_by_field(kind, from, to).await?;
    Ok(Json(json!({ "success": true, "data": rows })))
}

/// GET /api/admin/analytics/by-module
pub async fn by_module(Query(params): Query<ReportQuery>) -> Result<Json<Value>, ApiError> {
    let (from, to) = params.window()?;
    let kind = params.kind.unwrap_or(ActivityKind::ModuleView);
    let pool = DatabaseManager::pool().await?;
    let rows = AnalyticsService::new(pool).counts_by_module(kind, from, to).await?;
    Ok(Json(json!({ "success": true, "data": rows })))
}

/// GET /api/admin/analytics/heatmap - day-of-week x hour activity buckets.
pub async fn heatmap(Query(params): Query<ReportQuery>) -> Result<Json<Value>, ApiError> {
    let (from, to) = params.window()?;
    let kind = params.kind.unwrap_or(ActivityKind::Download);
    let pool = DatabaseManager::pool().await?;
    let rows = AnalyticsService::new(pool).heatmap(kind, from, to).await?;
    Ok(Json(json!({ "success": true, "data": rows })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_defaults_to_thirty_days() {
        let q = ReportQuery { from: None, to: None, kind: None, limit: None };
        let (from, to) = q.window().unwrap();
        assert_eq!(to - from, Duration::days(DEFAULT_WINDOW_DAYS));
    }

    #[test]
    fn inverted_window_is_rejected() {
        let now = Utc::now();
        let q = ReportQuery {
            from: Some(now),
            to: Some(now - Duration::hours(1)),
            kind: None,
            limit: None,
        };
        assert!(q.window().is_err());
    }
}
