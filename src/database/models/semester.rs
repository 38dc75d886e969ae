use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One of six semesters under a field. Unique on (field_id, number).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Semester {
    pub id: Uuid,
    pub number: i16,
    pub field_id: Uuid,
    pub created_at: DateTime<Utc>,
}
