//! Minimal `SKILL.md` frontmatter reader.
//!
//! Only flat `key: value` lines are understood. Nested YAML, lists, and
//! comments are skipped rather than parsed.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

static FRONTMATTER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\A---\n(.*?)\n---\n").expect("valid regex"));

/// Extract top-level fields from the leading `---` block.
///
/// Returns `None` when the text does not start with a closed frontmatter block.
/// Later duplicates of a key replace earlier ones.
pub fn parse_frontmatter(text: &str) -> Option<BTreeMap<String, String>> {
    let block = FRONTMATTER_RE.captures(text)?.get(1)?.as_str();

    let mut fields = BTreeMap::new();
    for line in block.lines() {
        if line.is_empty() || line.trim_start().starts_with('#') {
            continue;
        }
        if line.starts_with(' ') || line.starts_with('\t') {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        fields.insert(key.trim().to_string(), strip_quotes(value).to_string());
    }
    Some(fields)
}

/// Trim, then drop one pair of matching surrounding quotes.
pub fn strip_quotes(value: &str) -> &str {
    let value = value.trim();
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_flat_fields() {
        let text = "---\nname: pdf-tools\ndescription: \"Work with PDFs: split, merge\"\n---\n# Body\n";
        let fields = parse_frontmatter(text).unwrap();

        assert_eq!(fields["name"], "pdf-tools");
        assert_eq!(fields["description"], "Work with PDFs: split, merge");
    }

    #[test]
    fn skips_nested_comment_and_bare_lines() {
        let text = "---\n# comment\nname: a\nmetadata:\n  author: someone\n\tversion: 2\njust words\n\nlicense: 'MIT'\n---\n";
        let fields = parse_frontmatter(text).unwrap();

        assert_eq!(fields.len(), 3);
        assert_eq!(fields["metadata"], "");
        assert_eq!(fields["license"], "MIT");
        assert!(!fields.contains_key("author"));
    }

    #[test]
    fn unquoted_colon_in_value_is_kept() {
        let text = "---\nname: a\ndescription: a: b\n---\n";
        let fields = parse_frontmatter(text).unwrap();
        assert_eq!(fields["description"], "a: b");
    }

    #[test]
    fn requires_leading_closed_block() {
        assert!(parse_frontmatter("# Title\n---\nname: a\n---\n").is_none());
        assert!(parse_frontmatter("---\nname: a\n").is_none());
        assert!(parse_frontmatter("").is_none());
    }

    #[test]
    fn strip_quotes_only_matching_pairs() {
        assert_eq!(strip_quotes("  \"quoted\" "), "quoted");
        assert_eq!(strip_quotes("'single'"), "single");
        assert_eq!(strip_quotes("\"mismatched'"), "\"mismatched'");
        assert_eq!(strip_quotes("\""), "\"");
        assert_eq!(strip_quotes("plain"), "plain");
    }
}
