use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Grants a class-admin authority over one (field, semester) pair.
/// A user may hold any number of these; a super-admin stores none.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AdminScope {
    pub user_id: Uuid,
    pub field_id: Uuid,
    pub semester_id: Uuid,
    pub created_at: DateTime<Utc>,
}
