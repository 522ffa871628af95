//! Display order for category and author names
//!
//! Both stores sort with [`cmp_names`] after loading, so listings come back
//! in the same order whatever the database collation is.

use std::cmp::Ordering;

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Accent- and case-folded form used as the primary sort key
pub fn fold(name: &str) -> String {
    name.trim()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Folded comparison; names equal after folding fall back to raw order
pub fn cmp_names(a: &str, b: &str) -> Ordering {
    fold(a).cmp(&fold(b)).then_with(|| a.cmp(b))
}
