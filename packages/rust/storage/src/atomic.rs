//! Crash-safe file replacement.

use std::io::Write;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use skillscope_shared::{Result, SkillscopeError};

/// Replace `path` with `bytes` without ever exposing a partially written file.
///
/// The data goes to a uniquely named sibling temp file, is synced, and is then
/// renamed over `path`. If any step fails the temp file is removed and the
/// previous contents of `path` are left as they were.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(|e| SkillscopeError::io(&dir, e))?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "snapshot".into());
    let tmp = dir.join(format!(".{file_name}.{}.tmp", Uuid::now_v7()));

    let result = write_and_rename(&tmp, path, bytes);
    if result.is_err() {
        let _ = std::fs::remove_file(&tmp);
    }
    result
}

fn write_and_rename(tmp: &Path, path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = std::fs::File::create(tmp).map_err(|e| SkillscopeError::io(tmp, e))?;
    file.write_all(bytes).map_err(|e| SkillscopeError::io(tmp, e))?;
    file.sync_all().map_err(|e| SkillscopeError::io(tmp, e))?;
    drop(file);

    std::fs::rename(tmp, path).map_err(|e| SkillscopeError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!("skillscope-{label}-{}", Uuid::now_v7()))
    }

    #[test]
    fn creates_parent_and_replaces_contents() {
        let dir = temp_dir("atomic");
        let path = dir.join("nested").join("out.json");

        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"second");

        let leftovers: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn failed_rename_keeps_target_and_cleans_temp() {
        let dir = temp_dir("atomic-fail");
        // A non-empty directory cannot be replaced by a file.
        let target = dir.join("occupied");
        std::fs::create_dir_all(target.join("inner")).unwrap();

        assert!(write_atomic(&target, b"data").is_err());
        assert!(target.join("inner").is_dir());

        let leftovers = std::fs::read_dir(&dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .count();
        assert_eq!(leftovers, 0);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
