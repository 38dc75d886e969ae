//! URL-safe slug derivation with sibling-scoped collision avoidance.

/// Fallback stem when a name normalizes to nothing (e.g. all punctuation).
const FALLBACK_STEM: &str = "item";

/// Normalize a human-readable name to a lowercase, ASCII, hyphen-separated
/// base slug. Diacritics fold to their ASCII base letter; any other
/// non-alphanumeric character acts as a separator, and separators collapse.
pub fn slugify(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
        } else if let Some(folded) = fold_diacritic(ch) {
            out.push_str(folded);
        } else if !out.ends_with('-') && !out.is_empty() {
            out.push('-');
        }
    }
    let trimmed = out.trim_matches('-');
    if trimmed.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Fold a common accented character to its lowercase ASCII base.
/// Covers the Latin-1 range, which is what course names actually use.
fn fold_diacritic(ch: char) -> Option<&'static str> {
    let folded = match ch.to_lowercase().next().unwrap_or(ch) {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => "a",
        'ç' => "c",
        'è' | 'é' | 'ê' | 'ë' => "e",
        'ì' | 'í' | 'î' | 'ï' => "i",
        'ñ' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' => "o",
        'ù' | 'ú' | 'û' | 'ü' => "u",
        'ý' | 'ÿ' => "y",
        'æ' => "ae",
        'œ' => "oe",
        'ß' => "ss",
        _ => return None,
    };
    Some(folded)
}

/// Derive a slug for `name` that does not collide with any of `siblings`
/// (the slugs already present in the parent's namespace, with the entity
/// being updated already excluded by the caller).
///
/// Deterministic: the base slug is tried first, then `-1`, `-2`, ...
/// The caller's insert remains guarded by the database unique constraint;
/// losing a check-then-insert race surfaces as a Conflict there.
pub fn generate_unique_slug(name: &str, siblings: &[String]) -> String {
    let base = slugify(name);
    if !siblings.iter().any(|s| s == &base) {
        return base;
    }
    let mut n: u32 = 1;
    loop {
        let candidate = format!("{}-{}", base, n);
        if !siblings.iter().any(|s| s == &candidate) {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_to_lowercase_ascii_hyphens() {
        assert_eq!(slugify("Data Structures & Algorithms"), "data-structures-algorithms");
        assert_eq!(slugify("  Réseaux   Électroniques  "), "reseaux-electroniques");
        assert_eq!(slugify("C++ (Advanced)"), "c-advanced");
        assert_eq!(slugify("Théorie des Graphes"), "theorie-des-graphes");
    }

    #[test]
    fn empty_or_symbolic_names_get_fallback_stem() {
        assert_eq!(slugify(""), "item");
        assert_eq!(slugify("!!!"), "item");
    }

    #[test]
    fn slugify_is_deterministic() {
        assert_eq!(slugify("Génie Logiciel"), slugify("Génie Logiciel"));
    }

    #[test]
    fn avoids_collisions_with_incrementing_suffix() {
        let siblings = vec!["algorithms".to_string(), "algorithms-1".to_string()];
        assert_eq!(generate_unique_slug("Algorithms", &siblings), "algorithms-2");
    }

    #[test]
    fn no_collision_returns_base() {
        let siblings = vec!["networks".to_string()];
        assert_eq!(generate_unique_slug("Algorithms", &siblings), "algorithms");
    }

    #[test]
    fn sequential_generation_never_repeats() {
        // Simulate two inserts of the same name against a growing sibling set.
        let mut siblings: Vec<String> = vec![];
        for _ in 0..5 {
            let slug = generate_unique_slug("Operating Systems", &siblings);
            assert!(!siblings.contains(&slug));
            siblings.push(slug);
        }
        assert_eq!(
            siblings,
            vec![
                "operating-systems",
                "operating-systems-1",
                "operating-systems-2",
                "operating-systems-3",
                "operating-systems-4"
            ]
        );
    }
}
