//! Locale-aware ordering of display text.

use std::cmp::Ordering;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::models::CategoryRecord;

/// Base letters only, lower-cased: accents and case are secondary differences.
fn collation_key(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| a.cmp(b))
}

pub fn sort_by_text(records: &mut [CategoryRecord]) {
    records.sort_by(|a, b| locale_cmp(&a.text, &b.text).then_with(|| a.category.cmp(&b.category)));
}
