use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::types::{ResourceStatus, ResourceType};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Resource {
    pub id: Uuid,
    pub title: String,
    pub resource_type: ResourceType,
    pub description: Option<String>,
    pub file_url: String,
    /// Storage-relative path; needed for moderation moves and deletes.
    #[serde(skip_serializing)]
    pub file_path: String,
    pub file_ext: Option<String>,
    pub mime_type: Option<String>,
    pub size_bytes: i64,
    pub sha256: String,
    pub module_id: Uuid,
    pub submodule_id: Option<Uuid>,
    pub uploaded_by_user_id: Uuid,
    pub status: ResourceStatus,
    pub created_at: DateTime<Utc>,
}

/// Search/browse row with display fields joined from the parent chain.
/// Write-side models keep parent ids only; this struct exists purely for
/// presentation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResourceListing {
    pub id: Uuid,
    pub title: String,
    pub resource_type: ResourceType,
    pub description: Option<String>,
    pub file_url: String,
    pub file_ext: Option<String>,
    pub mime_type: Option<String>,
    pub size_bytes: i64,
    pub created_at: DateTime<Utc>,
    pub module_id: Uuid,
    pub module_name: String,
    pub submodule_name: Option<String>,
    pub semester_number: i16,
    pub field_name: String,
    pub field_slug: String,
}
