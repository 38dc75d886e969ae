use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Module {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub semester_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Read-side view of a module's resolved parent chain. Used for storage
/// path composition and write authorization; never persisted.
#[derive(Debug, Clone, FromRow)]
pub struct ModuleChain {
    pub module_id: Uuid,
    pub module_slug: String,
    pub semester_id: Uuid,
    pub semester_number: i16,
    pub field_id: Uuid,
    pub field_slug: String,
}
