//! Deterministic storage paths derived from the resolved hierarchy chain.
//!
//! Files awaiting moderation live under a parallel `pending/` prefix and
//! move to the public path on approval. Renaming a parent entity changes
//! future paths only; already-stored files stay where they are.

/// Prefix for resources awaiting moderation.
pub const PENDING_PREFIX: &str = "pending";

/// Compose the public directory for a resource:
/// `{field_slug}/S{semester_number}/{module_slug}[/{submodule_slug}]`.
pub fn compose_path(
    field_slug: &str,
    semester_number: i16,
    module_slug: &str,
    submodule_slug: Option<&str>,
) -> String {
    match submodule_slug {
        Some(sub) => format!("{}/S{}/{}/{}", field_slug, semester_number, module_slug, sub),
        None => format!("{}/S{}/{}", field_slug, semester_number, module_slug),
    }
}

/// Compose the moderation-queue directory for the same resource.
pub fn pending_path(
    field_slug: &str,
    semester_number: i16,
    module_slug: &str,
    submodule_slug: Option<&str>,
) -> String {
    format!(
        "{}/{}",
        PENDING_PREFIX,
        compose_path(field_slug, semester_number, module_slug, submodule_slug)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composes_full_chain() {
        assert_eq!(compose_path("cs", 3, "algorithms", Some("labs")), "cs/S3/algorithms/labs");
    }

    #[test]
    fn omits_missing_submodule_segment() {
        assert_eq!(compose_path("cs", 3, "algorithms", None), "cs/S3/algorithms");
    }

    #[test]
    fn pending_variant_is_prefixed() {
        assert_eq!(
            pending_path("cs", 3, "algorithms", Some("labs")),
            "pending/cs/S3/algorithms/labs"
        );
        assert_eq!(pending_path("math", 1, "analysis", None), "pending/math/S1/analysis");
    }

    #[test]
    fn same_submodule_always_composes_to_same_directory() {
        let a = compose_path("cs", 5, "compilers", Some("project"));
        let b = compose_path("cs", 5, "compilers", Some("project"));
        assert_eq!(a, b);
    }
}
