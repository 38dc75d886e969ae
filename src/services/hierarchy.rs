//! CRUD over the Field -> Semester -> Module -> Submodule tree.
//!
//! Every read is filtered through the caller's [`Scope`] and every mutation
//! is authorized against it before touching the store. Slugs are
//! regenerated when a name changes; the database unique constraints remain
//! the authoritative guard against slug races, with one retry on create.

use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use crate::database::models::{Field, Module, ModuleChain, Semester, Submodule};
use crate::error::ApiError;
use crate::scope::{Scope, ScopedEntity};
use crate::slug::generate_unique_slug;

pub struct HierarchyService {
    pool: PgPool,
}

fn require_unrestricted(scope: &Scope) -> Result<(), ApiError> {
    match scope {
        Scope::Unrestricted => Ok(()),
        Scope::Restricted(_) | Scope::Empty => {
            Err(ApiError::forbidden("Super-admin access required"))
        }
    }
}

fn validate_name(name: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        let mut field_errors = HashMap::new();
        field_errors.insert("name".to_string(), "This field is required".to_string());
        return Err(ApiError::validation_error("Missing required fields", Some(field_errors)));
    }
    Ok(())
}

fn is_conflict(err: &ApiError) -> bool {
    matches!(err, ApiError::Conflict(_))
}

impl HierarchyService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---- fields ----

    pub async fn list_fields(&self, scope: &Scope) -> Result<Vec<Field>, ApiError> {
        let pred = scope.predicate(ScopedEntity::Field, "f", 1);
        let sql = format!("SELECT f.* FROM fields f WHERE {} ORDER BY f.name", pred.sql);
        let mut q = sqlx::query_as::<_, Field>(&sql);
        for p in &pred.params {
            q = q.bind(*p);
        }
        Ok(q.fetch_all(&self.pool).await?)
    }

    pub async fn get_field(&self, scope: &Scope, id: Uuid) -> Result<Field, ApiError> {
        let pred = scope.predicate(ScopedEntity::Field, "f", 2);
        let sql = format!("SELECT f.* FROM fields f WHERE f.id = $1 AND {}", pred.sql);
        let mut q = sqlx::query_as::<_, Field>(&sql).bind(id);
        for p in &pred.params {
            q = q.bind(*p);
        }
        q.fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ApiError::not_found("Field not found"))
    }

    pub async fn get_field_by_slug(&self, slug: &str) -> Result<Field, ApiError> {
        sqlx::query_as::<_, Field>("SELECT * FROM fields WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ApiError::not_found("Field not found"))
    }

    pub async fn create_field(
        &self,
        scope: &Scope,
        name: &str,
        description: Option<&str>,
    ) -> Result<Field, ApiError> {
        require_unrestricted(scope)?;
        validate_name(name)?;

        let siblings = self.field_slugs(None).await?;
        let slug = generate_unique_slug(name, &siblings);
        match self.insert_field(name, &slug, description).await {
            Err(e) if is_conflict(&e) => {
                // Lost the check-then-insert race: regenerate against the
                // fresh sibling set and try once more.
                let siblings = self.field_slugs(None).await?;
                let slug = generate_unique_slug(name, &siblings);
                self.insert_field(name, &slug, description).await
            }
            other => other,
        }
    }

    async fn insert_field(
        &self,
        name: &str,
        slug: &str,
        description: Option<&str>,
    ) -> Result<Field, ApiError> {
        Ok(sqlx::query_as::<_, Field>(
            "INSERT INTO fields (name, slug, description) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(name)
        .bind(slug)
        .bind(description)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn field_slugs(&self, exclude: Option<Uuid>) -> Result<Vec<String>, ApiError> {
        let rows: Vec<(String,)> = match exclude {
            Some(id) => {
                sqlx::query_as("SELECT slug FROM fields WHERE id <> $1")
                    .bind(id)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => sqlx::query_as("SELECT slug FROM fields").fetch_all(&self.pool).await?,
        };
        Ok(rows.into_iter().map(|(slug,)| slug).collect())
    }

    /// `description`: outer `None` keeps the stored value, `Some(None)`
    /// clears it.
    pub async fn update_field(
        &self,
        scope: &Scope,
        id: Uuid,
        name: Option<&str>,
        description: Option<Option<&str>>,
    ) -> Result<Field, ApiError> {
        require_unrestricted(scope)?;
        let existing = self.get_field(scope, id).await?;

        let (name, slug) = match name {
            Some(new_name) if new_name != existing.name => {
                validate_name(new_name)?;
                let siblings = self.field_slugs(Some(id)).await?;
                (new_name.to_string(), generate_unique_slug(new_name, &siblings))
            }
            _ => (existing.name.clone(), existing.slug.clone()),
        };
        let description = match description {
            Some(d) => d.map(str::to_string),
            None => existing.description,
        };

        Ok(sqlx::query_as::<_, Field>(
            "UPDATE fields SET name = $2, slug = $3, description = $4, updated_at = now() \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(name)
        .bind(slug)
        .bind(description)
        .fetch_one(&self.pool)
        .await?)
    }

    /// Deletes the field and, via FK cascade, every semester, module,
    /// submodule and resource row beneath it. Stored files are not swept
    /// here (see resource moderation for the storage side).
    pub async fn delete_field(&self, scope: &Scope, id: Uuid) -> Result<(), ApiError> {
        require_unrestricted(scope)?;
        let result = sqlx::query("DELETE FROM fields WHERE id = $1").bind(id).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(ApiError::not_found("Field not found"));
        }
        Ok(())
    }

    // ---- semesters ----

    pub async fn list_semesters(&self, scope: &Scope, field_id: Uuid) -> Result<Vec<Semester>, ApiError> {
        let pred = scope.predicate(ScopedEntity::Semester, "s", 2);
        let sql = format!(
            "SELECT s.* FROM semesters s WHERE s.field_id = $1 AND {} ORDER BY s.number",
            pred.sql
        );
        let mut q = sqlx::query_as::<_, Semester>(&sql).bind(field_id);
        for p in &pred.params {
            q = q.bind(*p);
        }
        Ok(q.fetch_all(&self.pool).await?)
    }

    pub async fn create_semester(
        &self,
        scope: &Scope,
        field_id: Uuid,
        number: i16,
    ) -> Result<Semester, ApiError> {
        require_unrestricted(scope)?;
        validate_semester_number(number)?;
        // Surface a missing parent as 404 before the insert
        self.get_field(scope, field_id).await?;

        Ok(sqlx::query_as::<_, Semester>(
            "INSERT INTO semesters (field_id, number) VALUES ($1, $2) RETURNING *",
        )
        .bind(field_id)
        .bind(number)
        .fetch_one(&self.pool)
        .await?)
    }

    pub async fn update_semester(&self, scope: &Scope, id: Uuid, number: i16) -> Result<Semester, ApiError> {
        require_unrestricted(scope)?;
        validate_semester_number(number)?;
        sqlx::query_as::<_, Semester>(
            "UPDATE semesters SET number = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(number)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Semester not found"))
    }

    pub async fn delete_semester(&self, scope: &Scope, id: Uuid) -> Result<(), ApiError> {
        require_unrestricted(scope)?;
        let result = sqlx::query("DELETE FROM semesters WHERE id = $1").bind(id).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(ApiError::not_found("Semester not found"));
        }
        Ok(())
    }

    async fn semester_pair(&self, semester_id: Uuid) -> Result<(Uuid, Uuid), ApiError> {
        let row: Option<(Uuid, Uuid)> =
            sqlx::query_as("SELECT field_id, id FROM semesters WHERE id = $1")
                .bind(semester_id)
                .fetch_optional(&self.pool)
                .await?;
        row.ok_or_else(|| ApiError::not_found("Semester not found"))
    }

    // ---- modules ----

    pub async fn list_modules(&self, scope: &Scope, semester_id: Uuid) -> Result<Vec<Module>, ApiError> {
        let pred = scope.predicate(ScopedEntity::Module, "m", 2);
        let sql = format!(
            "SELECT m.* FROM modules m WHERE m.semester_id = $1 AND {} ORDER BY m.name",
            pred.sql
        );
        let mut q = sqlx::query_as::<_, Module>(&sql).bind(semester_id);
        for p in &pred.params {
            q = q.bind(*p);
        }
        Ok(q.fetch_all(&self.pool).await?)
    }

    pub async fn get_module(&self, scope: &Scope, id: Uuid) -> Result<Module, ApiError> {
        let pred = scope.predicate(ScopedEntity::Module, "m", 2);
        let sql = format!("SELECT m.* FROM modules m WHERE m.id = $1 AND {}", pred.sql);
        let mut q = sqlx::query_as::<_, Module>(&sql).bind(id);
        for p in &pred.params {
            q = q.bind(*p);
        }
        q.fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ApiError::not_found("Module not found"))
    }

    pub async fn create_module(
        &self,
        scope: &Scope,
        semester_id: Uuid,
        name: &str,
    ) -> Result<Module, ApiError> {
        validate_name(name)?;
        let (field_id, semester_id) = self.semester_pair(semester_id).await?;
        if !scope.allows_pair(field_id, semester_id) {
            return Err(ApiError::forbidden("Semester is outside your administrative scope"));
        }

        let siblings = self.module_slugs(semester_id, None).await?;
        let slug = generate_unique_slug(name, &siblings);
        match self.insert_module(semester_id, name, &slug).await {
            Err(e) if is_conflict(&e) => {
                let siblings = self.module_slugs(semester_id, None).await?;
                let slug = generate_unique_slug(name, &siblings);
                self.insert_module(semester_id, name, &slug).await
            }
            other => other,
        }
    }

    async fn insert_module(&self, semester_id: Uuid, name: &str, slug: &str) -> Result<Module, ApiError> {
        Ok(sqlx::query_as::<_, Module>(
            "INSERT INTO modules (semester_id, name, slug) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(semester_id)
        .bind(name)
        .bind(slug)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn module_slugs(&self, semester_id: Uuid, exclude: Option<Uuid>) -> Result<Vec<String>, ApiError> {
        let rows: Vec<(String,)> = match exclude {
            Some(id) => {
                sqlx::query_as("SELECT slug FROM modules WHERE semester_id = $1 AND id <> $2")
                    .bind(semester_id)
                    .bind(id)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                sqlx::query_as("SELECT slug FROM modules WHERE semester_id = $1")
                    .bind(semester_id)
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(rows.into_iter().map(|(slug,)| slug).collect())
    }

    pub async fn update_module(&self, scope: &Scope, id: Uuid, name: &str) -> Result<Module, ApiError> {
        validate_name(name)?;
        let chain = self.ensure_module_write(scope, id).await?;

        let existing = self.get_module(scope, id).await?;
        let slug = if name != existing.name {
            let siblings = self.module_slugs(chain.semester_id, Some(id)).await?;
            generate_unique_slug(name, &siblings)
        } else {
            existing.slug
        };

        Ok(sqlx::query_as::<_, Module>(
            "UPDATE modules SET name = $2, slug = $3, updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(name)
        .bind(slug)
        .fetch_one(&self.pool)
        .await?)
    }

    pub async fn delete_module(&self, scope: &Scope, id: Uuid) -> Result<(), ApiError> {
        self.ensure_module_write(scope, id).await?;
        sqlx::query("DELETE FROM modules WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(())
    }

    /// Resolve a module's full parent chain: slugs for path composition plus
    /// the (field, semester) pair for authorization.
    pub async fn module_chain(&self, module_id: Uuid) -> Result<ModuleChain, ApiError> {
        sqlx::query_as::<_, ModuleChain>(
            "SELECT m.id AS module_id, m.slug AS module_slug, \
                    s.id AS semester_id, s.number AS semester_number, \
                    f.id AS field_id, f.slug AS field_slug \
             FROM modules m \
             JOIN semesters s ON s.id = m.semester_id \
             JOIN fields f ON f.id = s.field_id \
             WHERE m.id = $1",
        )
        .bind(module_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Module not found"))
    }

    /// Authorization check before any mutation targeting a module subtree.
    pub async fn ensure_module_write(&self, scope: &Scope, module_id: Uuid) -> Result<ModuleChain, ApiError> {
        let chain = self.module_chain(module_id).await?;
        if !scope.allows_pair(chain.field_id, chain.semester_id) {
            return Err(ApiError::forbidden("Module is outside your administrative scope"));
        }
        Ok(chain)
    }

    // ---- submodules ----

    pub async fn list_submodules(&self, scope: &Scope, module_id: Uuid) -> Result<Vec<Submodule>, ApiError> {
        let pred = scope.predicate(ScopedEntity::Submodule, "sm", 2);
        let sql = format!(
            "SELECT sm.* FROM submodules sm WHERE sm.module_id = $1 AND {} ORDER BY sm.name",
            pred.sql
        );
        let mut q = sqlx::query_as::<_, Submodule>(&sql).bind(module_id);
        for p in &pred.params {
            q = q.bind(*p);
        }
        Ok(q.fetch_all(&self.pool).await?)
    }

    pub async fn create_submodule(
        &self,
        scope: &Scope,
        module_id: Uuid,
        name: &str,
    ) -> Result<Submodule, ApiError> {
        validate_name(name)?;
        self.ensure_module_write(scope, module_id).await?;

        let siblings = self.submodule_slugs(module_id, None).await?;
        let slug = generate_unique_slug(name, &siblings);
        match self.insert_submodule(module_id, name, &slug).await {
            Err(e) if is_conflict(&e) => {
                let siblings = self.submodule_slugs(module_id, None).await?;
                let slug = generate_unique_slug(name, &siblings);
                self.insert_submodule(module_id, name, &slug).await
            }
            other => other,
        }
    }

    async fn insert_submodule(&self, module_id: Uuid, name: &str, slug: &str) -> Result<Submodule, ApiError> {
        Ok(sqlx::query_as::<_, Submodule>(
            "INSERT INTO submodules (module_id, name, slug) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(module_id)
        .bind(name)
        .bind(slug)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn submodule_slugs(&self, module_id: Uuid, exclude: Option<Uuid>) -> Result<Vec<String>, ApiError> {
        let rows: Vec<(String,)> = match exclude {
            Some(id) => {
                sqlx::query_as("SELECT slug FROM submodules WHERE module_id = $1 AND id <> $2")
                    .bind(module_id)
                    .bind(id)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                sqlx::query_as("SELECT slug FROM submodules WHERE module_id = $1")
                    .bind(module_id)
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(rows.into_iter().map(|(slug,)| slug).collect())
    }

    pub async fn update_submodule(&self, scope: &Scope, id: Uuid, name: &str) -> Result<Submodule, ApiError> {
        validate_name(name)?;
        let existing: Submodule =
            sqlx::query_as("SELECT * FROM submodules WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?
                .ok_or_else(|| ApiError::not_found("Submodule not found"))?;
        self.ensure_module_write(scope, existing.module_id).await?;

        let slug = if name != existing.name {
            let siblings = self.submodule_slugs(existing.module_id, Some(id)).await?;
            generate_unique_slug(name, &siblings)
        } else {
            existing.slug
        };

        Ok(sqlx::query_as::<_, Submodule>(
            "UPDATE submodules SET name = $2, slug = $3, updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(name)
        .bind(slug)
        .fetch_one(&self.pool)
        .await?)
    }

    pub async fn delete_submodule(&self, scope: &Scope, id: Uuid) -> Result<(), ApiError> {
        let existing: Option<(Uuid,)> =
            sqlx::query_as("SELECT module_id FROM submodules WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        let (module_id,) = existing.ok_or_else(|| ApiError::not_found("Submodule not found"))?;
        self.ensure_module_write(scope, module_id).await?;

        sqlx::query("DELETE FROM submodules WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(())
    }
}

fn validate_semester_number(number: i16) -> Result<(), ApiError> {
    if !(1..=6).contains(&number) {
        let mut field_errors = HashMap::new();
        field_errors.insert("number".to_string(), "Semester number must be between 1 and 6".to_string());
        return Err(ApiError::validation_error("Invalid semester number", Some(field_errors)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn semester_number_bounds() {
        assert!(validate_semester_number(1).is_ok());
        assert!(validate_semester_number(6).is_ok());
        assert!(validate_semester_number(0).is_err());
        assert!(validate_semester_number(7).is_err());
    }

    #[test]
    fn blank_names_are_rejected_before_reaching_the_store() {
        assert!(validate_name("Algorithms").is_ok());
        assert!(matches!(validate_name("   "), Err(ApiError::ValidationError { .. })));
    }

    #[test]
    fn only_unrestricted_scope_may_manage_fields() {
        assert!(require_unrestricted(&Scope::Unrestricted).is_ok());
        assert!(matches!(require_unrestricted(&Scope::Empty), Err(ApiError::Forbidden(_))));
        assert!(matches!(
            require_unrestricted(&Scope::restricted([])),
            Err(ApiError::Forbidden(_))
        ));
    }
}
