//! Best-effort activity logging and read-only reporting rollups.
//!
//! Event writes must never block or fail a primary operation: callers spawn
//! them and any error only produces a warning. Reports are plain GROUP BY
//! aggregations recomputed per request.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::ApiError;
use crate::types::ActivityKind;

pub struct AnalyticsService {
    pool: PgPool,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DimensionCount {
    pub label: String,
    pub count: i64,
}

/// One day-of-week x hour-of-day bucket (dow: 0 = Sunday, Postgres DOW).
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct HeatmapBucket {
    pub dow: i32,
    pub hour: i32,
    pub count: i64,
}

impl AnalyticsService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fire-and-forget event write. Spawned so the primary operation's
    /// response never waits on it.
    pub fn record_event(
        pool: PgPool,
        kind: ActivityKind,
        field_id: Option<Uuid>,
        module_id: Option<Uuid>,
        query_text: Option<String>,
    ) {
        tokio::spawn(async move {
            let result = sqlx::query(
                "INSERT INTO activity_events (kind, field_id, module_id, query_text) \
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(kind)
            .bind(field_id)
            .bind(module_id)
            .bind(query_text)
            .execute(&pool)
            .await;

            if let Err(e) = result {
                tracing::warn!("Failed to record {:?} event: {}", kind, e);
            }
        });
    }

    /// Most frequent search query texts within the range.
    pub async fn top_search_queries(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<DimensionCount>, ApiError> {
        Ok(sqlx::query_as::<_, DimensionCount>(
            "SELECT query_text AS label, COUNT(*) AS count \
             FROM activity_events \
             WHERE kind = 'search' AND query_text IS NOT NULL \
               AND occurred_at BETWEEN $1 AND $2 \
             GROUP BY query_text ORDER BY count DESC, label ASC LIMIT $3",
        )
        .bind(from)
        .bind(to)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?)
    }

    /// Events of one kind grouped by field, labelled with the field name.
    /// Fields deleted since the events were logged are grouped under a
    /// placeholder label.
    pub async fn counts_by_field(
        &self,
        kind: ActivityKind,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<DimensionCount>, ApiError> {
        Ok(sqlx::query_as::<_, DimensionCount>(
            "SELECT COALESCE(f.name, '(deleted field)') AS label, COUNT(*) AS count \
             FROM activity_events e \
             LEFT JOIN fields f ON f.id = e.field_id \
             WHERE e.kind = $1 AND e.occurred_at BETWEEN $2 AND $3 \
             GROUP BY f.name ORDER BY count DESC, label ASC",
        )
        .bind(kind)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?)
    }

    /// Events of one kind grouped by module.
    pub async fn counts_by_module(
        &self,
        kind: ActivityKind,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<DimensionCount>, ApiError> {
        Ok(sqlx::query_as::<_, DimensionCount>(
            "SELECT COALESCE(m.name, '(deleted module)') AS label, COUNT(*) AS count \
             FROM activity_events e \
             LEFT JOIN modules m ON m.id = e.module_id \
             WHERE e.kind = $1 AND e.occurred_at BETWEEN $2 AND $3 \
             GROUP BY m.name ORDER BY count DESC, label ASC",
        )
        .bind(kind)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?)
    }

    /// Day-of-week x hour-of-day buckets for one event kind.
    pub async fn heatmap(
        &self,
        kind: ActivityKind,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<HeatmapBucket>, ApiError> {
        Ok(sqlx::query_as::<_, HeatmapBucket>(
            "SELECT EXTRACT(DOW FROM occurred_at)::int AS dow, \
                    EXTRACT(HOUR FROM occurred_at)::int AS hour, \
                    COUNT(*) AS count \
             FROM activity_events \
             WHERE kind = $1 AND occurred_at BETWEEN $2 AND $3 \
             GROUP BY 1, 2 ORDER BY 1, 2",
        )
        .bind(kind)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?)
    }
}
