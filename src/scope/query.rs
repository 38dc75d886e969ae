//! Translate a resolved [`Scope`] into a SQL predicate.
//!
//! The membership test is always the same: the row's resolved
//! (field_id, semester_id) pair must be granted. What differs per entity is
//! the join path used to reach its owning semester, so the predicate is
//! generated against a table alias and a starting parameter index, in the
//! same style the rest of the query assembles its own placeholders.

use uuid::Uuid;

use super::Scope;

/// Entities a scope filter can be applied to. Each knows how to walk up to
/// its owning semester.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopedEntity {
    Field,
    Semester,
    Module,
    Submodule,
    Resource,
}

/// A SQL fragment plus the parameters it binds, ready to be appended to a
/// WHERE clause. Parameters are numbered from the caller-supplied start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopePredicate {
    pub sql: String,
    pub params: Vec<Uuid>,
}

impl ScopePredicate {
    fn match_all() -> Self {
        Self { sql: "1=1".to_string(), params: vec![] }
    }

    fn match_none() -> Self {
        Self { sql: "1=0".to_string(), params: vec![] }
    }
}

impl Scope {
    /// Build the predicate restricting `entity` rows (aliased as `alias`)
    /// to this scope. `first_param` is the next free `$n` placeholder index.
    ///
    /// `Unrestricted` passes the base query through unchanged (`1=1`, no
    /// parameters); `Empty` matches zero rows regardless of the base query.
    pub fn predicate(&self, entity: ScopedEntity, alias: &str, first_param: usize) -> ScopePredicate {
        let pairs = match self {
            Scope::Unrestricted => return ScopePredicate::match_all(),
            Scope::Empty => return ScopePredicate::match_none(),
            Scope::Restricted(pairs) => pairs,
        };
        if pairs.is_empty() {
            return ScopePredicate::match_none();
        }

        let mut params: Vec<Uuid> = Vec::with_capacity(pairs.len() * 2);
        let mut next = first_param;

        match entity {
            // A field is visible when any of its semesters is granted.
            ScopedEntity::Field => {
                let mut field_ids: Vec<Uuid> = pairs.iter().map(|p| p.field_id).collect();
                field_ids.dedup();
                let placeholders: Vec<String> = field_ids
                    .iter()
                    .map(|id| {
                        params.push(*id);
                        let p = format!("${}", next);
                        next += 1;
                        p
                    })
                    .collect();
                ScopePredicate {
                    sql: format!("{}.id IN ({})", alias, placeholders.join(", ")),
                    params,
                }
            }
            ScopedEntity::Semester => {
                let list = pair_list(pairs.iter().copied(), &mut params, &mut next);
                ScopePredicate {
                    sql: format!("({a}.field_id, {a}.id) IN ({list})", a = alias, list = list),
                    params,
                }
            }
            ScopedEntity::Module => {
                let list = pair_list(pairs.iter().copied(), &mut params, &mut next);
                ScopePredicate {
                    sql: format!(
                        "EXISTS (SELECT 1 FROM semesters sc \
                         WHERE sc.id = {a}.semester_id \
                         AND (sc.field_id, sc.id) IN ({list}))",
                        a = alias,
                        list = list
                    ),
                    params,
                }
            }
            // Submodules and resources both reach their semester via the
            // owning module.
            ScopedEntity::Submodule | ScopedEntity::Resource => {
                let list = pair_list(pairs.iter().copied(), &mut params, &mut next);
                ScopePredicate {
                    sql: format!(
                        "EXISTS (SELECT 1 FROM modules mc \
                         JOIN semesters sc ON sc.id = mc.semester_id \
                         WHERE mc.id = {a}.module_id \
                         AND (sc.field_id, sc.id) IN ({list}))",
                        a = alias,
                        list = list
                    ),
                    params,
                }
            }
        }
    }
}

fn pair_list(
    pairs: impl Iterator<Item = super::ScopePair>,
    params: &mut Vec<Uuid>,
    next: &mut usize,
) -> String {
    let mut parts = vec![];
    for pair in pairs {
        params.push(pair.field_id);
        params.push(pair.semester_id);
        parts.push(format!("(${}, ${})", *next, *next + 1));
        *next += 2;
    }
    parts.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::ScopePair;

    fn pair() -> ScopePair {
        ScopePair { field_id: Uuid::new_v4(), semester_id: Uuid::new_v4() }
    }

    #[test]
    fn unrestricted_adds_no_filter_and_no_params() {
        for entity in [
            ScopedEntity::Field,
            ScopedEntity::Semester,
            ScopedEntity::Module,
            ScopedEntity::Submodule,
            ScopedEntity::Resource,
        ] {
            let pred = Scope::Unrestricted.predicate(entity, "t", 1);
            assert_eq!(pred.sql, "1=1");
            assert!(pred.params.is_empty());
        }
    }

    #[test]
    fn empty_scope_matches_zero_rows() {
        for entity in [ScopedEntity::Field, ScopedEntity::Module, ScopedEntity::Resource] {
            let pred = Scope::Empty.predicate(entity, "t", 1);
            assert_eq!(pred.sql, "1=0");
            assert!(pred.params.is_empty());
        }
    }

    #[test]
    fn restricted_with_no_pairs_also_matches_zero_rows() {
        let pred = Scope::restricted([]).predicate(ScopedEntity::Module, "m", 1);
        assert_eq!(pred.sql, "1=0");
    }

    #[test]
    fn semester_predicate_tests_direct_pair_membership() {
        let p = pair();
        let pred = Scope::restricted([p]).predicate(ScopedEntity::Semester, "s", 1);
        assert_eq!(pred.sql, "(s.field_id, s.id) IN (($1, $2))");
        assert_eq!(pred.params, vec![p.field_id, p.semester_id]);
    }

    #[test]
    fn module_predicate_walks_to_owning_semester() {
        let p = pair();
        let pred = Scope::restricted([p]).predicate(ScopedEntity::Module, "m", 1);
        assert!(pred.sql.contains("sc.id = m.semester_id"));
        assert!(pred.sql.contains("(sc.field_id, sc.id) IN (($1, $2))"));
        assert_eq!(pred.params, vec![p.field_id, p.semester_id]);
    }

    #[test]
    fn resource_predicate_joins_through_module() {
        let p = pair();
        let pred = Scope::restricted([p]).predicate(ScopedEntity::Resource, "r", 3);
        assert!(pred.sql.contains("mc.id = r.module_id"));
        assert!(pred.sql.contains("JOIN semesters sc ON sc.id = mc.semester_id"));
        // Placeholder numbering starts at the caller-supplied index.
        assert!(pred.sql.contains("($3, $4)"));
    }

    #[test]
    fn field_predicate_lists_granted_field_ids() {
        let p1 = pair();
        let p2 = pair();
        let pred = Scope::restricted([p1, p2]).predicate(ScopedEntity::Field, "f", 1);
        assert!(pred.sql.starts_with("f.id IN ("));
        assert_eq!(pred.params.len(), 2);
        assert!(pred.params.contains(&p1.field_id));
        assert!(pred.params.contains(&p2.field_id));
    }

    #[test]
    fn multiple_pairs_number_placeholders_sequentially() {
        let p1 = pair();
        let p2 = pair();
        let pred = Scope::restricted([p1, p2]).predicate(ScopedEntity::Semester, "s", 1);
        assert!(pred.sql.contains("($1, $2), ($3, $4)"));
        assert_eq!(pred.params.len(), 4);
    }
}
