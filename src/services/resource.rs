//! Resource lifecycle: upload with content-hash deduplication, metadata
//! updates, public search, and the pending -> approved/rejected moderation
//! transition.
//!
//! Moderation follows a two-phase pattern: the storage-side move/delete runs
//! first, then the database update; a database failure triggers a
//! compensating storage rollback, and a failed compensation is logged rather
//! than propagated.

use sha2::{Digest, Sha256};
use sqlx::{PgPool, QueryBuilder};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::config;
use crate::database::models::{Resource, ResourceListing};
use crate::error::ApiError;
use crate::middleware::AuthContext;
use crate::scope::{Scope, ScopedEntity};
use crate::services::hierarchy::HierarchyService;
use crate::storage::{compose_path, pending_path, FileStore};
use crate::types::{ResourceStatus, ResourceType};

pub struct ResourceService {
    pool: PgPool,
    store: Arc<dyn FileStore>,
}

/// Upload payload, transport-agnostic (the handler unpacks multipart).
pub struct NewResource {
    pub title: String,
    pub resource_type: ResourceType,
    pub description: Option<String>,
    pub module_id: Uuid,
    pub submodule_id: Option<Uuid>,
    pub original_name: String,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Default)]
pub struct ResourceSearch {
    pub q: Option<String>,
    pub field: Option<String>,
    pub semester: Option<i16>,
    pub resource_type: Option<ResourceType>,
    pub uploader: Option<Uuid>,
}

/// Outcome of requesting a moderation transition from `current` to `target`.
#[derive(Debug, PartialEq, Eq)]
enum Moderation {
    Proceed,
    /// Repeating an already-applied transition.
    NoOp,
    /// Crossing from one terminal state to the other.
    Refused(&'static str),
}

fn check_transition(current: ResourceStatus, target: ResourceStatus) -> Moderation {
    match (current, target) {
        (ResourceStatus::Pending, _) => Moderation::Proceed,
        (ResourceStatus::Approved, ResourceStatus::Approved) => Moderation::NoOp,
        (ResourceStatus::Rejected, ResourceStatus::Rejected) => Moderation::NoOp,
        (ResourceStatus::Approved, _) => Moderation::Refused("Resource was already approved"),
        (ResourceStatus::Rejected, _) => Moderation::Refused("Resource was already rejected"),
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

fn file_extension(name: &str) -> Option<String> {
    std::path::Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

impl ResourceService {
    pub fn new(pool: PgPool, store: Arc<dyn FileStore>) -> Self {
        Self { pool, store }
    }

    fn hierarchy(&self) -> HierarchyService {
        HierarchyService::new(self.pool.clone())
    }

    // ---- create / update / delete ----

    pub async fn create(
        &self,
        scope: &Scope,
        ctx: &AuthContext,
        new: NewResource,
    ) -> Result<Resource, ApiError> {
        Self::validate_new(&new)?;

        let chain = self.hierarchy().ensure_module_write(scope, new.module_id).await?;
        let submodule_slug = match new.submodule_id {
            Some(sub_id) => Some(self.submodule_slug_in_module(sub_id, new.module_id).await?),
            None => None,
        };

        // Content hash is the deduplication key: identical bytes are
        // rejected no matter what the upload is titled.
        let sha256 = sha256_hex(&new.bytes);
        let duplicate: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM resources WHERE sha256 = $1")
                .bind(&sha256)
                .fetch_optional(&self.pool)
                .await?;
        if duplicate.is_some() {
            return Err(ApiError::conflict("A file with identical content has already been uploaded"));
        }

        let dir = pending_path(
            &chain.field_slug,
            chain.semester_number,
            &chain.module_slug,
            submodule_slug.as_deref(),
        );
        let stored = self.store.save_file(&new.bytes, &new.original_name, &dir).await?;

        let inserted = sqlx::query_as::<_, Resource>(
            "INSERT INTO resources \
             (title, resource_type, description, file_url, file_path, file_ext, mime_type, \
              size_bytes, sha256, module_id, submodule_id, uploaded_by_user_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) RETURNING *",
        )
        .bind(&new.title)
        .bind(new.resource_type)
        .bind(&new.description)
        .bind(&stored.url)
        .bind(&stored.path)
        .bind(file_extension(&new.original_name))
        .bind(&new.mime_type)
        .bind(new.bytes.len() as i64)
        .bind(&sha256)
        .bind(new.module_id)
        .bind(new.submodule_id)
        .bind(ctx.user_id)
        .fetch_one(&self.pool)
        .await;

        match inserted {
            Ok(resource) => Ok(resource),
            Err(e) => {
                // The file is already on disk; roll it back so the store does
                // not accumulate orphans for failed inserts.
                if let Err(cleanup) = self.store.delete_file(&stored.path).await {
                    tracing::warn!(
                        "Compensating file removal failed after insert error ({}): {}",
                        stored.path,
                        cleanup
                    );
                }
                Err(e.into())
            }
        }
    }

    fn validate_new(new: &NewResource) -> Result<(), ApiError> {
        let mut field_errors = HashMap::new();
        if new.title.trim().is_empty() {
            field_errors.insert("title".to_string(), "This field is required".to_string());
        }
        if new.bytes.is_empty() {
            field_errors.insert("file".to_string(), "An uploaded file is required".to_string());
        }
        if new.bytes.len() > config::config().api.max_upload_size_bytes {
            field_errors.insert("file".to_string(), "Uploaded file is too large".to_string());
        }
        if field_errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation_error("Invalid resource upload", Some(field_errors)))
        }
    }

    async fn submodule_slug_in_module(&self, submodule_id: Uuid, module_id: Uuid) -> Result<String, ApiError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT slug FROM submodules WHERE id = $1 AND module_id = $2")
                .bind(submodule_id)
                .bind(module_id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(|(slug,)| slug)
            .ok_or_else(|| ApiError::not_found("Submodule not found in this module"))
    }

    /// `description`: outer `None` keeps the stored value, `Some(None)`
    /// clears it. Title and type are NOT NULL, so plain absence suffices.
    pub async fn update(
        &self,
        scope: &Scope,
        id: Uuid,
        title: Option<&str>,
        resource_type: Option<ResourceType>,
        description: Option<Option<&str>>,
    ) -> Result<Resource, ApiError> {
        let existing = self.get(id).await?;
        self.hierarchy().ensure_module_write(scope, existing.module_id).await?;

        if let Some(t) = title {
            if t.trim().is_empty() {
                let mut field_errors = HashMap::new();
                field_errors.insert("title".to_string(), "This field is required".to_string());
                return Err(ApiError::validation_error("Invalid resource update", Some(field_errors)));
            }
        }

        Ok(sqlx::query_as::<_, Resource>(
            "UPDATE resources SET \
                title = COALESCE($2, title), \
                resource_type = COALESCE($3, resource_type), \
                description = CASE WHEN $4 THEN $5 ELSE description END \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(title)
        .bind(resource_type)
        .bind(description.is_some())
        .bind(description.flatten())
        .fetch_one(&self.pool)
        .await?)
    }

    pub async fn delete(&self, scope: &Scope, id: Uuid) -> Result<(), ApiError> {
        let existing = self.get(id).await?;
        self.hierarchy().ensure_module_write(scope, existing.module_id).await?;

        // Storage first, then the row; a missing file only gets a warning
        // so a prior partial failure cannot wedge the delete.
        match self.store.delete_file(&existing.file_path).await {
            Ok(()) => {}
            Err(crate::storage::StorageError::NotFound(path)) => {
                tracing::warn!("Deleting resource {} with no stored file at {}", id, path);
            }
            Err(e) => return Err(e.into()),
        }

        sqlx::query("DELETE FROM resources WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(())
    }

    // ---- reads ----

    pub async fn get(&self, id: Uuid) -> Result<Resource, ApiError> {
        sqlx::query_as::<_, Resource>("SELECT * FROM resources WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ApiError::not_found("Resource not found"))
    }

    pub async fn get_approved(&self, id: Uuid) -> Result<Resource, ApiError> {
        sqlx::query_as::<_, Resource>(
            "SELECT * FROM resources WHERE id = $1 AND status = 'approved'",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Resource not found"))
    }

    /// Admin listing: includes pending/rejected rows, restricted to scope.
    pub async fn list_admin(
        &self,
        scope: &Scope,
        status: Option<ResourceStatus>,
    ) -> Result<Vec<Resource>, ApiError> {
        let rows = match status {
            Some(status) => {
                let pred = scope.predicate(ScopedEntity::Resource, "r", 2);
                let sql = format!(
                    "SELECT r.* FROM resources r WHERE r.status = $1 AND {} \
                     ORDER BY r.created_at DESC, r.title ASC",
                    pred.sql
                );
                let mut q = sqlx::query_as::<_, Resource>(&sql).bind(status);
                for p in &pred.params {
                    q = q.bind(*p);
                }
                q.fetch_all(&self.pool).await?
            }
            None => {
                let pred = scope.predicate(ScopedEntity::Resource, "r", 1);
                let sql = format!(
                    "SELECT r.* FROM resources r WHERE {} \
                     ORDER BY r.created_at DESC, r.title ASC",
                    pred.sql
                );
                let mut q = sqlx::query_as::<_, Resource>(&sql);
                for p in &pred.params {
                    q = q.bind(*p);
                }
                q.fetch_all(&self.pool).await?
            }
        };
        Ok(rows)
    }

    /// Public module page: approved resources of one module.
    pub async fn list_approved_for_module(&self, module_id: Uuid) -> Result<Vec<ResourceListing>, ApiError> {
        Ok(sqlx::query_as::<_, ResourceListing>(&format!(
            "{} WHERE r.module_id = $1 AND r.status = 'approved' \
             ORDER BY r.created_at DESC, r.title ASC",
            LISTING_SELECT
        ))
        .bind(module_id)
        .fetch_all(&self.pool)
        .await?)
    }

    /// Public search: free text plus optional filters, approved only,
    /// ordered by recency then title, capped at the configured limit.
    pub async fn search(&self, params: ResourceSearch) -> Result<Vec<ResourceListing>, ApiError> {
        let mut qb: QueryBuilder<sqlx::Postgres> =
            QueryBuilder::new(format!("{} WHERE r.status = ", LISTING_SELECT));
        qb.push_bind(ResourceStatus::Approved);

        if let Some(q) = params.q.as_deref().filter(|q| !q.trim().is_empty()) {
            let pattern = format!("%{}%", q.trim());
            qb.push(" AND (r.title ILIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" OR r.description ILIKE ");
            qb.push_bind(pattern);
            qb.push(")");
        }
        if let Some(field_slug) = params.field.as_deref() {
            qb.push(" AND f.slug = ");
            qb.push_bind(field_slug.to_string());
        }
        if let Some(number) = params.semester {
            qb.push(" AND s.number = ");
            qb.push_bind(number);
        }
        if let Some(rt) = params.resource_type {
            qb.push(" AND r.resource_type = ");
            qb.push_bind(rt);
        }
        if let Some(uploader) = params.uploader {
            qb.push(" AND r.uploaded_by_user_id = ");
            qb.push_bind(uploader);
        }

        qb.push(" ORDER BY r.created_at DESC, r.title ASC LIMIT ");
        qb.push_bind(config::config().api.search_result_limit);

        Ok(qb.build_query_as::<ResourceListing>().fetch_all(&self.pool).await?)
    }

    // ---- moderation ----

    pub async fn approve(&self, scope: &Scope, id: Uuid) -> Result<Resource, ApiError> {
        let resource = self.get(id).await?;
        let chain = self.hierarchy().ensure_module_write(scope, resource.module_id).await?;

        match check_transition(resource.status, ResourceStatus::Approved) {
            Moderation::NoOp => return Ok(resource),
            Moderation::Refused(msg) => return Err(ApiError::conflict(msg)),
            Moderation::Proceed => {}
        }

        let submodule_slug = match resource.submodule_id {
            Some(sub_id) => Some(self.submodule_slug_in_module(sub_id, resource.module_id).await?),
            None => None,
        };
        let public_dir = compose_path(
            &chain.field_slug,
            chain.semester_number,
            &chain.module_slug,
            submodule_slug.as_deref(),
        );
        let pending_dir = pending_path(
            &chain.field_slug,
            chain.semester_number,
            &chain.module_slug,
            submodule_slug.as_deref(),
        );

        // Phase 1: storage move out of the moderation queue.
        let moved = self.store.move_file(&resource.file_path, &public_dir).await?;

        // Phase 2: persist the transition.
        let updated = sqlx::query_as::<_, Resource>(
            "UPDATE resources SET status = 'approved', file_url = $2, file_path = $3 \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(&moved.url)
        .bind(&moved.path)
        .fetch_one(&self.pool)
        .await;

        match updated {
            Ok(resource) => Ok(resource),
            Err(e) => {
                if let Err(rollback) = self.store.move_file(&moved.path, &pending_dir).await {
                    tracing::warn!(
                        "Compensating move back to {} failed for resource {}: {}",
                        pending_dir,
                        id,
                        rollback
                    );
                }
                Err(e.into())
            }
        }
    }

    pub async fn reject(&self, scope: &Scope, id: Uuid) -> Result<Resource, ApiError> {
        let resource = self.get(id).await?;
        self.hierarchy().ensure_module_write(scope, resource.module_id).await?;

        match check_transition(resource.status, ResourceStatus::Rejected) {
            Moderation::NoOp => return Ok(resource),
            Moderation::Refused(msg) => return Err(ApiError::conflict(msg)),
            Moderation::Proceed => {}
        }

        // Phase 1: remove the pending file. A missing file is tolerated so
        // a retried rejection can still complete.
        match self.store.delete_file(&resource.file_path).await {
            Ok(()) => {}
            Err(crate::storage::StorageError::NotFound(path)) => {
                tracing::warn!("Rejecting resource {} with no stored file at {}", id, path);
            }
            Err(e) => return Err(e.into()),
        }

        // Phase 2: persist the transition. There is no file to restore if
        // this fails; the inconsistency is logged and surfaced.
        let updated = sqlx::query_as::<_, Resource>(
            "UPDATE resources SET status = 'rejected' WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await;

        match updated {
            Ok(resource) => Ok(resource),
            Err(e) => {
                tracing::warn!(
                    "Resource {} file was deleted but the status update failed; row remains pending",
                    id
                );
                Err(e.into())
            }
        }
    }
}

const LISTING_SELECT: &str =
    "SELECT r.id, r.title, r.resource_type, r.description, r.file_url, r.file_ext, \
            r.mime_type, r.size_bytes, r.created_at, r.module_id, \
            m.name AS module_name, sm.name AS submodule_name, \
            s.number AS semester_number, f.name AS field_name, f.slug AS field_slug \
     FROM resources r \
     JOIN modules m ON m.id = r.module_id \
     JOIN semesters s ON s.id = m.semester_id \
     JOIN fields f ON f.id = s.field_id \
     LEFT JOIN submodules sm ON sm.id = r.submodule_id";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_bytes_hash_identically() {
        let a = sha256_hex(b"lecture notes");
        let b = sha256_hex(b"lecture notes");
        let c = sha256_hex(b"different notes");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn extension_is_lowercased() {
        assert_eq!(file_extension("Exam_2024.PDF"), Some("pdf".to_string()));
        assert_eq!(file_extension("archive.tar.gz"), Some("gz".to_string()));
        assert_eq!(file_extension("README"), None);
    }

    #[test]
    fn pending_resources_may_transition() {
        assert_eq!(
            check_transition(ResourceStatus::Pending, ResourceStatus::Approved),
            Moderation::Proceed
        );
        assert_eq!(
            check_transition(ResourceStatus::Pending, ResourceStatus::Rejected),
            Moderation::Proceed
        );
    }

    #[test]
    fn repeated_transitions_are_noops() {
        assert_eq!(
            check_transition(ResourceStatus::Approved, ResourceStatus::Approved),
            Moderation::NoOp
        );
        assert_eq!(
            check_transition(ResourceStatus::Rejected, ResourceStatus::Rejected),
            Moderation::NoOp
        );
    }

    #[test]
    fn crossing_terminal_states_is_refused() {
        assert!(matches!(
            check_transition(ResourceStatus::Approved, ResourceStatus::Rejected),
            Moderation::Refused(_)
        ));
        assert!(matches!(
            check_transition(ResourceStatus::Rejected, ResourceStatus::Approved),
            Moderation::Refused(_)
        ));
    }
}
