//! JSON export and dashboard file output.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use skillscope_shared::{PublisherAggregate, Result, Skill, SkillscopeError};
use skillscope_storage::write_atomic;

/// File name of the raw skill list.
pub const SKILLS_FILE: &str = "skills_raw.json";
/// File name of the publisher aggregates.
pub const OWNERS_FILE: &str = "skills_owners.json";

/// Paths written by [`export_json`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonExport {
    pub skills_path: PathBuf,
    pub owners_path: PathBuf,
}

/// Write `skills_raw.json` and `skills_owners.json` (pretty-printed) into `dir`.
pub fn export_json(
    dir: &Path,
    skills: &[Skill],
    publishers: &[PublisherAggregate],
) -> Result<JsonExport> {
    let skills_path = dir.join(SKILLS_FILE);
    let owners_path = dir.join(OWNERS_FILE);

    write_atomic(&skills_path, &pretty(skills)?)?;
    write_atomic(&owners_path, &pretty(publishers)?)?;

    info!(
        skills = %skills_path.display(),
        owners = %owners_path.display(),
        "exported JSON"
    );
    Ok(JsonExport {
        skills_path,
        owners_path,
    })
}

/// Write the rendered dashboard to `path`. Returns the number of bytes written.
pub fn write_dashboard(path: &Path, html: &str) -> Result<usize> {
    write_atomic(path, html.as_bytes())?;
    info!(path = %path.display(), bytes = html.len(), "wrote dashboard");
    Ok(html.len())
}

fn pretty<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec_pretty(value)
        .map_err(|e| SkillscopeError::Render(format!("failed to serialize JSON export: {e}")))
}
