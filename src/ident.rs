//! Entity identifier generation and resolution.
//!
//! Every entity id is `<prefix>-<suffix>` where the suffix is the lowercase
//! tail of a fresh ULID. One generator and one prefix-resolver serve all
//! stores, so id handling cannot drift between entity types.

use std::collections::HashSet;

use ulid::Ulid;

use crate::error::{Error, Result};

pub const ORG_PREFIX: &str = "org";
pub const GROUP_PREFIX: &str = "grp";
pub const PROJECT_PREFIX: &str = "prj";
pub const BOARD_PREFIX: &str = "brd";
pub const SPRINT_PREFIX: &str = "spr";
pub const COLUMN_PREFIX: &str = "col";

const ID_SUFFIX_LEN: usize = 8;

/// Generate a fresh `<prefix>-<suffix>` id not present in `existing`.
pub fn generate_id(prefix: &str, existing: &HashSet<String>) -> String {
    loop {
        let raw = Ulid::new().to_string().to_ascii_lowercase();
        let candidate = format!("{prefix}-{}", &raw[raw.len() - ID_SUFFIX_LEN..]);
        if !existing.contains(&candidate) {
            return candidate;
        }
    }
}

/// Resolve user input against a set of known ids.
///
/// Accepts the full id or any unambiguous prefix, case-insensitively.
/// Returns `Ok(None)` when nothing matches; ambiguity is an error rather
/// than a guess.
pub fn resolve_id<'a, I>(input: &str, candidates: I) -> Result<Option<String>>
where
    I: IntoIterator<Item = &'a str>,
{
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidArgument("id cannot be empty".to_string()));
    }
    let needle = trimmed.to_ascii_lowercase();

    let mut exact = Vec::new();
    let mut prefix = Vec::new();
    for candidate in candidates {
        let lowered = candidate.to_ascii_lowercase();
        if lowered == needle {
            exact.push(candidate.to_string());
            continue;
        }
        if lowered.starts_with(&needle) {
            prefix.push(candidate.to_string());
        }
    }

    if exact.len() == 1 {
        return Ok(Some(exact.remove(0)));
    }
    if exact.len() > 1 {
        return Err(Error::InvalidArgument(format!(
            "ambiguous id '{}': {}",
            trimmed,
            exact.join(", ")
        )));
    }

    prefix.sort();
    prefix.dedup();
    if prefix.len() > 1 {
        return Err(Error::InvalidArgument(format!(
            "ambiguous id '{}': {}",
            trimmed,
            prefix.join(", ")
        )));
    }
    Ok(prefix.into_iter().next())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_carry_prefix_and_avoid_collisions() {
        let mut existing = HashSet::new();
        for _ in 0..64 {
            let id = generate_id(ORG_PREFIX, &existing);
            assert!(id.starts_with("org-"));
            assert_eq!(id.len(), "org-".len() + 8);
            assert!(existing.insert(id));
        }
    }

    #[test]
    fn resolve_prefers_exact_match() {
        let ids = ["brd-abc12345", "brd-abc99999"];
        let resolved = resolve_id("brd-abc12345", ids).expect("resolve");
        assert_eq!(resolved.as_deref(), Some("brd-abc12345"));
    }

    #[test]
    fn resolve_accepts_unambiguous_prefix() {
        let ids = ["brd-abc12345", "brd-xyz99999"];
        let resolved = resolve_id("brd-x", ids).expect("resolve");
        assert_eq!(resolved.as_deref(), Some("brd-xyz99999"));
    }

    #[test]
    fn resolve_rejects_ambiguous_prefix() {
        let ids = ["brd-abc12345", "brd-abc99999"];
        let err = resolve_id("brd-a", ids).expect_err("ambiguous");
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn resolve_is_case_insensitive() {
        let ids = ["org-abc12345"];
        let resolved = resolve_id("ORG-ABC12345", ids).expect("resolve");
        assert_eq!(resolved.as_deref(), Some("org-abc12345"));
    }

    #[test]
    fn resolve_returns_none_for_unknown() {
        let ids = ["org-abc12345"];
        assert!(resolve_id("grp-zzz", ids).expect("resolve").is_none());
    }
}
