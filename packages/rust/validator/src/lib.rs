//! Skill bundle validation.
//!
//! Every immediate subdirectory of the skills root is a bundle that must carry
//! a `SKILL.md` with a frontmatter block. Violations are collected across all
//! bundles and reported together rather than stopping at the first one.

pub mod frontmatter;

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info};

use skillscope_shared::{Result, SkillscopeError};

pub use frontmatter::{parse_frontmatter, strip_quotes};

/// Bundle manifest file name.
pub const SKILL_FILE: &str = "SKILL.md";

pub const MAX_NAME_LEN: usize = 64;
pub const MAX_DESCRIPTION_LEN: usize = 1024;
pub const MAX_COMPATIBILITY_LEN: usize = 500;
pub const MAX_LINES: usize = 500;

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("valid regex"));

/// A single rule failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// The bundle directory or manifest the failure refers to.
    pub path: PathBuf,
    pub message: String,
}

impl Violation {
    fn new(path: &Path, message: impl Into<String>) -> Self {
        Self {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.message)
    }
}

/// Outcome of [`validate_dir`].
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// Bundles inspected, sorted by path.
    pub bundles: Vec<PathBuf>,
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Validate every bundle under `root`.
///
/// A missing `root` is an error. A `root` with no bundles is reported as a
/// violation.
pub fn validate_dir(root: &Path) -> Result<ValidationReport> {
    if !root.is_dir() {
        return Err(SkillscopeError::validation(format!(
            "skills directory not found: {}",
            root.display()
        )));
    }

    let entries = std::fs::read_dir(root).map_err(|e| SkillscopeError::io(root, e))?;
    let mut bundles = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| SkillscopeError::io(root, e))?;
        let path = entry.path();
        if path.is_dir() {
            bundles.push(path);
        }
    }
    bundles.sort();

    let mut violations = Vec::new();
    if bundles.is_empty() {
        violations.push(Violation::new(root, "no skills found"));
    }

    for bundle in &bundles {
        let found = validate_skill(bundle);
        debug!(bundle = %bundle.display(), violations = found.len(), "validated bundle");
        violations.extend(found);
    }

    info!(
        bundles = bundles.len(),
        violations = violations.len(),
        "validation finished"
    );
    Ok(ValidationReport {
        bundles,
        violations,
    })
}

/// Check one bundle directory. An empty result means it passed.
pub fn validate_skill(dir: &Path) -> Vec<Violation> {
    let mut violations = Vec::new();
    let file = dir.join(SKILL_FILE);

    let text = match std::fs::read_to_string(&file) {
        Ok(text) => text.replace("\r\n", "\n"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            violations.push(Violation::new(dir, format!("missing {SKILL_FILE}")));
            return violations;
        }
        Err(e) => {
            violations.push(Violation::new(&file, format!("unreadable: {e}")));
            return violations;
        }
    };

    let Some(fields) = parse_frontmatter(&text) else {
        violations.push(Violation::new(&file, "missing YAML frontmatter block"));
        return violations;
    };

    let name = field(&fields, "name");
    let description = field(&fields, "description");
    let compatibility = field(&fields, "compatibility");
    let dir_name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    if name.is_empty() {
        violations.push(Violation::new(&file, "required field 'name' is missing"));
    } else {
        if name.chars().count() > MAX_NAME_LEN {
            violations.push(Violation::new(
                &file,
                format!("name must be <= {MAX_NAME_LEN} characters"),
            ));
        }
        if !NAME_RE.is_match(name) {
            violations.push(Violation::new(
                &file,
                format!("name must match {}", NAME_RE.as_str()),
            ));
        }
        if name != dir_name {
            violations.push(Violation::new(
                &file,
                format!("name '{name}' must match directory '{dir_name}'"),
            ));
        }
    }

    if description.is_empty() {
        violations.push(Violation::new(
            &file,
            "required field 'description' is missing",
        ));
    } else if description.chars().count() > MAX_DESCRIPTION_LEN {
        violations.push(Violation::new(
            &file,
            format!("description must be <= {MAX_DESCRIPTION_LEN} characters"),
        ));
    }

    if compatibility.chars().count() > MAX_COMPATIBILITY_LEN {
        violations.push(Violation::new(
            &file,
            format!("compatibility must be <= {MAX_COMPATIBILITY_LEN} characters"),
        ));
    }

    if text.lines().count() > MAX_LINES {
        violations.push(Violation::new(
            &file,
            format!("{SKILL_FILE} should stay under {MAX_LINES} lines"),
        ));
    }

    violations
}

fn field<'a>(fields: &'a BTreeMap<String, String>, key: &str) -> &'a str {
    fields.get(key).map(|v| v.trim()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn temp_root() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("skillscope-validator-test-{}", Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_bundle(root: &Path, dir: &str, contents: &str) -> PathBuf {
        let bundle = root.join(dir);
        std::fs::create_dir_all(&bundle).unwrap();
        std::fs::write(bundle.join(SKILL_FILE), contents).unwrap();
        bundle
    }

    fn manifest(name: &str, description: &str) -> String {
        format!("---\nname: {name}\ndescription: {description}\n---\n\n# {name}\n")
    }

    #[test]
    fn valid_bundle_passes() {
        let root = temp_root();
        write_bundle(&root, "pdf-tools", &manifest("pdf-tools", "Split and merge PDFs"));

        let report = validate_dir(&root).unwrap();
        assert!(report.is_valid(), "{:?}", report.violations);
        assert_eq!(report.bundles.len(), 1);

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn name_rules() {
        let root = temp_root();
        let bundle = write_bundle(&root, "pdf-tools", &manifest("PDF_Tools", "desc"));

        let messages: Vec<String> = validate_skill(&bundle)
            .into_iter()
            .map(|v| v.message)
            .collect();
        assert_eq!(messages.len(), 2);
        assert!(messages[0].starts_with("name must match"));
        assert!(messages[1].contains("must match directory 'pdf-tools'"));

        let long = "a".repeat(MAX_NAME_LEN + 1);
        let bundle = write_bundle(&root, &long, &manifest(&long, "desc"));
        let violations = validate_skill(&bundle);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("<= 64"));

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn missing_fields_and_frontmatter() {
        let root = temp_root();

        let no_fields = write_bundle(&root, "empty", "---\nlicense: MIT\n---\n");
        let messages: Vec<String> = validate_skill(&no_fields)
            .into_iter()
            .map(|v| v.message)
            .collect();
        assert_eq!(
            messages,
            vec![
                "required field 'name' is missing".to_string(),
                "required field 'description' is missing".to_string(),
            ]
        );

        let no_block = write_bundle(&root, "plain", "# Just markdown\n");
        let violations = validate_skill(&no_block);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("frontmatter"));

        let missing = root.join("no-manifest");
        std::fs::create_dir_all(&missing).unwrap();
        let violations = validate_skill(&missing);
        assert_eq!(violations[0].message, "missing SKILL.md");

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn length_limits() {
        let root = temp_root();
        let long_description = "d".repeat(MAX_DESCRIPTION_LEN + 1);
        let body = "line\n".repeat(MAX_LINES);
        let contents = format!(
            "---\nname: big\ndescription: {long_description}\ncompatibility: {}\n---\n{body}",
            "c".repeat(MAX_COMPATIBILITY_LEN + 1)
        );
        let bundle = write_bundle(&root, "big", &contents);

        let messages: Vec<String> = validate_skill(&bundle)
            .into_iter()
            .map(|v| v.message)
            .collect();
        assert_eq!(messages.len(), 3);
        assert!(messages[0].starts_with("description must be"));
        assert!(messages[1].starts_with("compatibility must be"));
        assert!(messages[2].contains("500 lines"));

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn collects_across_bundles() {
        let root = temp_root();
        write_bundle(&root, "good", &manifest("good", "fine"));
        write_bundle(&root, "bad-one", &manifest("other", "fine"));
        write_bundle(&root, "bad-two", "no frontmatter");
        std::fs::write(root.join("README.md"), "not a bundle").unwrap();

        let report = validate_dir(&root).unwrap();
        assert_eq!(report.bundles.len(), 3);
        assert_eq!(report.violations.len(), 2);
        assert!(!report.is_valid());

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn empty_and_missing_roots() {
        let root = temp_root();
        let report = validate_dir(&root).unwrap();
        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.violations[0].message, "no skills found");

        assert!(matches!(
            validate_dir(&root.join("nope")),
            Err(SkillscopeError::Validation { .. })
        ));

        let _ = std::fs::remove_dir_all(&root);
    }
}
