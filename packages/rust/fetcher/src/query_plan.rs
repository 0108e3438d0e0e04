//! The fixed list of search terms used to approximate a full catalog listing.
//!
//! The API has no listing endpoint, only keyword search. These broad 2-char
//! terms together surface nearly every skill; they are ordered by yield so the
//! queries that add the most unseen skills run first. Coverage is a heuristic,
//! so the resulting total is approximate.

/// Search terms, highest expected yield first.
pub const SEARCH_QUERIES: &[&str] = &[
    "sk", "in", "er", "re", "an", "es", "ai", "co", "th", "or",
    "on", "ti", "at", "en", "de", "ou", "it", "is", "al", "ar",
    "st", "le", "ng", "io", "us", "ab", "op", "gu", "hy", "ux",
    "ex", "ph", "qu", "zy", "mu", "py", "go", "ja", "sw", "wo",
];
