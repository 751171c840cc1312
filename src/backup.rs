//! Backup-before-write safety
//!
//! Every destructive overwrite is preceded by a write-once sibling backup
//! holding the original content verbatim. The tool never deletes a backup
//! it creates.

use anyhow::Context;
use chrono::Utc;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Write a sibling backup of `path` containing `original`. The name carries
/// a UTC timestamp plus a random suffix so concurrent runs cannot collide,
/// and the file is opened with `create_new` so an existing backup is never
/// overwritten.
pub fn write_backup(path: &Path, original: &str) -> anyhow::Result<PathBuf> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("path has no usable file name: {}", path.display()))?;

    let stamp = Utc::now().format("%Y%m%d%H%M%S");
    let suffix = Uuid::new_v4().simple().to_string();
    let backup_name = format!("{}.{}.{}.bak", file_name, stamp, &suffix[..8]);
    let backup_path = path.with_file_name(backup_name);

    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&backup_path)
        .with_context(|| format!("failed to create backup {}", backup_path.display()))?;
    file.write_all(original.as_bytes())
        .with_context(|| format!("failed to write backup {}", backup_path.display()))?;

    Ok(backup_path)
}
