//! Bootstrap DDL for the hierarchy store.
//!
//! Applied idempotently at startup. Constraint names are relied upon by the
//! conflict mapping in `crate::error`, and every parent/child edge carries
//! `ON DELETE CASCADE` so deleting a field removes its entire subtree.

use sqlx::PgPool;

use crate::database::manager::DatabaseError;

const ENUM_TYPES: &[&str] = &[
    "DO $$ BEGIN
        CREATE TYPE user_role AS ENUM ('super_admin', 'class_admin', 'user');
    EXCEPTION WHEN duplicate_object THEN NULL; END $$",
    "DO $$ BEGIN
        CREATE TYPE resource_type AS ENUM
            ('course', 'exam', 'tp_exercise', 'project', 'presentation', 'report', 'other');
    EXCEPTION WHEN duplicate_object THEN NULL; END $$",
    "DO $$ BEGIN
        CREATE TYPE resource_status AS ENUM ('pending', 'approved', 'rejected');
    EXCEPTION WHEN duplicate_object THEN NULL; END $$",
    "DO $$ BEGIN
        CREATE TYPE activity_kind AS ENUM ('search', 'download', 'field_view', 'module_view');
    EXCEPTION WHEN duplicate_object THEN NULL; END $$",
];

const TABLES: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        email TEXT NOT NULL,
        display_name TEXT NOT NULL,
        password_sha256 TEXT NOT NULL,
        role user_role NOT NULL DEFAULT 'user',
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        CONSTRAINT users_email_key UNIQUE (email)
    )",
    "CREATE TABLE IF NOT EXISTS fields (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        name TEXT NOT NULL,
        slug TEXT NOT NULL,
        description TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        CONSTRAINT fields_slug_key UNIQUE (slug)
    )",
    "CREATE TABLE IF NOT EXISTS semesters (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        number SMALLINT NOT NULL CHECK (number BETWEEN 1 AND 6),
        field_id UUID NOT NULL REFERENCES fields(id) ON DELETE CASCADE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        CONSTRAINT semesters_field_id_number_key UNIQUE (field_id, number)
    )",
    "CREATE TABLE IF NOT EXISTS modules (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        name TEXT NOT NULL,
        slug TEXT NOT NULL,
        semester_id UUID NOT NULL REFERENCES semesters(id) ON DELETE CASCADE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        CONSTRAINT modules_semester_id_slug_key UNIQUE (semester_id, slug)
    )",
    "CREATE TABLE IF NOT EXISTS submodules (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        name TEXT NOT NULL,
        slug TEXT NOT NULL,
        module_id UUID NOT NULL REFERENCES modules(id) ON DELETE CASCADE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        CONSTRAINT submodules_module_id_slug_key UNIQUE (module_id, slug)
    )",
    "CREATE TABLE IF NOT EXISTS resources (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        title TEXT NOT NULL,
        resource_type resource_type NOT NULL,
        description TEXT,
        file_url TEXT NOT NULL,
        file_path TEXT NOT NULL,
        file_ext TEXT,
        mime_type TEXT,
        size_bytes BIGINT NOT NULL,
        sha256 TEXT NOT NULL,
        module_id UUID NOT NULL REFERENCES modules(id) ON DELETE CASCADE,
        submodule_id UUID REFERENCES submodules(id) ON DELETE CASCADE,
        uploaded_by_user_id UUID NOT NULL REFERENCES users(id),
        status resource_status NOT NULL DEFAULT 'pending',
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        CONSTRAINT resources_sha256_key UNIQUE (sha256)
    )",
    "CREATE TABLE IF NOT EXISTS admin_scopes (
        user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        field_id UUID NOT NULL REFERENCES fields(id) ON DELETE CASCADE,
        semester_id UUID NOT NULL REFERENCES semesters(id) ON DELETE CASCADE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        PRIMARY KEY (user_id, field_id, semester_id)
    )",
    // Analytics log rows keep plain ids (no FK) so hierarchy deletes never
    // touch historical events.
    "CREATE TABLE IF NOT EXISTS activity_events (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        kind activity_kind NOT NULL,
        field_id UUID,
        module_id UUID,
        query_text TEXT,
        occurred_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE INDEX IF NOT EXISTS activity_events_kind_occurred_at_idx
        ON activity_events (kind, occurred_at)",
];

/// Apply the schema. Safe to run on every startup.
pub async fn migrate(pool: &PgPool) -> Result<(), DatabaseError> {
    for stmt in ENUM_TYPES.iter().chain(TABLES.iter()) {
        sqlx::query(stmt).execute(pool).await?;
    }
    tracing::info!("Database schema is up to date");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_ddl(name: &str) -> &'static str {
        TABLES
            .iter()
            .find(|t| t.contains(&format!("CREATE TABLE IF NOT EXISTS {}", name)))
            .unwrap_or_else(|| panic!("no DDL for table {}", name))
    }

    /// Deleting a field must take its entire subtree with it, so every
    /// parent/child edge in the hierarchy has to cascade.
    #[test]
    fn every_hierarchy_edge_cascades_on_parent_delete() {
        let edges = [
            ("semesters", "REFERENCES fields(id)"),
            ("modules", "REFERENCES semesters(id)"),
            ("submodules", "REFERENCES modules(id)"),
            ("resources", "REFERENCES modules(id)"),
            ("resources", "REFERENCES submodules(id)"),
            ("admin_scopes", "REFERENCES users(id)"),
            ("admin_scopes", "REFERENCES fields(id)"),
            ("admin_scopes", "REFERENCES semesters(id)"),
        ];
        for (child, fk) in edges {
            let ddl = table_ddl(child);
            let after_fk = ddl
                .split(fk)
                .nth(1)
                .unwrap_or_else(|| panic!("{} has no {}", child, fk));
            assert!(
                after_fk.trim_start().starts_with("ON DELETE CASCADE"),
                "{} edge {} does not cascade",
                child,
                fk
            );
        }
    }

    /// The uploader edge is the one deliberate exception: deleting a user
    /// must not silently drop their uploads.
    #[test]
    fn uploader_edge_does_not_cascade() {
        let after_fk = table_ddl("resources")
            .split("REFERENCES users(id)")
            .nth(1)
            .expect("resources has an uploader FK");
        assert!(!after_fk.trim_start().starts_with("ON DELETE CASCADE"));
    }
}
