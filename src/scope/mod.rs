//! Access scope resolution for admin operations.
//!
//! A scope is recomputed from persisted `admin_scopes` rows on every call.
//! There is deliberately no caching: grants can be edited at any time by a
//! super-admin and must take effect on the next request.

pub mod query;

use sqlx::PgPool;
use std::collections::BTreeSet;
use uuid::Uuid;

use crate::middleware::AuthContext;
use crate::types::Role;

pub use query::{ScopePredicate, ScopedEntity};

/// One (field, semester) grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ScopePair {
    pub field_id: Uuid,
    pub semester_id: Uuid,
}

/// What a user may act upon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Super-admin: no restriction.
    Unrestricted,
    /// Class-admin: the granted (field, semester) pairs.
    Restricted(BTreeSet<ScopePair>),
    /// Everyone else, including a class-admin with zero grants.
    Empty,
}

impl Scope {
    pub fn restricted(pairs: impl IntoIterator<Item = ScopePair>) -> Self {
        Scope::Restricted(pairs.into_iter().collect())
    }

    /// Whether this scope covers a specific (field, semester) pair.
    pub fn allows_pair(&self, field_id: Uuid, semester_id: Uuid) -> bool {
        match self {
            Scope::Unrestricted => true,
            Scope::Empty => false,
            Scope::Restricted(pairs) => pairs.contains(&ScopePair { field_id, semester_id }),
        }
    }
}

/// Resolve the scope for the authenticated identity.
///
/// Absence of an explicit grant never implies access: a class-admin with no
/// rows resolves to `Empty`, and a store failure during resolution also
/// fails closed to `Empty` (logged, never surfaced as `Unrestricted`).
pub async fn resolve_scope(ctx: &AuthContext, pool: &PgPool) -> Scope {
    match ctx.role {
        Role::SuperAdmin => Scope::Unrestricted,
        Role::User => Scope::Empty,
        Role::ClassAdmin => {
            let rows: Result<Vec<(Uuid, Uuid)>, sqlx::Error> = sqlx::query_as(
                "SELECT field_id, semester_id FROM admin_scopes WHERE user_id = $1",
            )
            .bind(ctx.user_id)
            .fetch_all(pool)
            .await;

            match rows {
                Ok(rows) if rows.is_empty() => Scope::Empty,
                Ok(rows) => Scope::restricted(
                    rows.into_iter()
                        .map(|(field_id, semester_id)| ScopePair { field_id, semester_id }),
                ),
                Err(e) => {
                    tracing::warn!("Scope resolution failed, failing closed: {}", e);
                    Scope::Empty
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_scope_allows_nothing() {
        let scope = Scope::Empty;
        assert!(!scope.allows_pair(Uuid::new_v4(), Uuid::new_v4()));
    }

    #[test]
    fn unrestricted_scope_allows_everything() {
        let scope = Scope::Unrestricted;
        assert!(scope.allows_pair(Uuid::new_v4(), Uuid::new_v4()));
    }

    #[test]
    fn restricted_scope_contains_exactly_its_pairs() {
        let field = Uuid::new_v4();
        let semester = Uuid::new_v4();
        let scope = Scope::restricted([ScopePair { field_id: field, semester_id: semester }]);

        assert!(scope.allows_pair(field, semester));
        // Same field, different semester: excluded.
        assert!(!scope.allows_pair(field, Uuid::new_v4()));
        assert!(!scope.allows_pair(Uuid::new_v4(), semester));
    }
}
