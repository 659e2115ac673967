//! File path normalization and hashing for root table lookups

use crate::jenkins::Jenkins96;

/// Canonical form of an archive path: ASCII uppercase with `\` separators
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' => '\\',
            c => c.to_ascii_uppercase(),
        })
        .collect()
}

/// 64-bit root table hash of an archive path
///
/// The path is normalized first, so `"foo/bar.dbc"` and `"FOO\\BAR.DBC"`
/// hash identically.
pub fn name_hash(name: &str) -> u64 {
    Jenkins96::hash(normalize_name(name).as_bytes()).hash64
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_normalize() {
        assert_eq!(
            normalize_name("DBFilesClient/Item.dbc"),
            "DBFILESCLIENT\\ITEM.DBC"
        );
        assert_eq!(normalize_name("already\\UPPER"), "ALREADY\\UPPER");
    }

    #[test]
    fn test_case_and_separator_insensitive() {
        assert_eq!(name_hash("foo/bar.dbc"), name_hash("FOO\\BAR.DBC"));
        assert_eq!(name_hash("Item.dbc"), name_hash("ITEM.DBC"));
        assert_ne!(name_hash("Item.dbc"), name_hash("Item.db2"));
    }

    #[test]
    fn test_hash_of_normalized_bytes() {
        let expected = Jenkins96::hash(b"INTERFACE\\ICONS\\INV_MISC_QUESTIONMARK.BLP").hash64;
        assert_eq!(
            name_hash("Interface/Icons/INV_Misc_QuestionMark.blp"),
            expected
        );
    }

    proptest! {
        #[test]
        fn normalization_is_idempotent(name in "[a-zA-Z0-9_./\\\\]{0,48}") {
            let once = normalize_name(&name);
            prop_assert_eq!(normalize_name(&once), once.clone());
            prop_assert_eq!(name_hash(&name), name_hash(&once));
        }

        #[test]
        fn lowercase_and_slashes_do_not_matter(name in "[a-z0-9_./]{1,48}") {
            let upper = name.to_ascii_uppercase().replace('/', "\\");
            prop_assert_eq!(name_hash(&name), name_hash(&upper));
        }
    }
}
