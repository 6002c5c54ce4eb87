//! Export files.

use crate::error::StorageError;
use bicfg_core::{ConfigDocument, Workspace, WorkspaceConfig};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Summary of a written export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportMeta {
    pub path: PathBuf,
    pub size_bytes: u64,
    /// CRC32C of the file contents, lowercase hex.
    pub checksum: String,
    pub variables: usize,
    pub elements: usize,
    pub events: usize,
    pub states: usize,
}

/// Writes a document to `path`, replacing any existing file.
///
/// The document is written to a sibling temp file first and renamed into
/// place, so a failed export never leaves a truncated file behind.
pub fn write_export(
    path: impl AsRef<Path>,
    doc: &ConfigDocument,
    pretty: bool,
) -> Result<ExportMeta, StorageError> {
    let path = path.as_ref();
    let data = if pretty {
        serde_json::to_vec_pretty(doc)?
    } else {
        serde_json::to_vec(doc)?
    };
    let checksum = checksum(&data);

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
    }

    let tmp_path = tmp_path_for(path);
    if let Err(e) = write_and_rename(&tmp_path, path, &data) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }

    let meta = ExportMeta {
        path: path.to_path_buf(),
        size_bytes: data.len() as u64,
        checksum,
        variables: doc.variables.len(),
        elements: doc.elements.len(),
        events: doc.events.len(),
        states: doc.states.len(),
    };

    tracing::info!(
        "Exported configuration to {} ({} bytes, checksum {})",
        path.display(),
        meta.size_bytes,
        meta.checksum
    );

    Ok(meta)
}

/// Reads a document from `path`.
///
/// Malformed condition strings fail the import.
pub fn read_export(path: impl AsRef<Path>) -> Result<ConfigDocument, StorageError> {
    let path = path.as_ref();
    let data = fs::read(path).map_err(|e| StorageError::io(path, e))?;
    let doc: ConfigDocument = serde_json::from_slice(&data)?;

    tracing::info!(
        "Imported configuration from {} (exported {})",
        path.display(),
        doc.timestamp.to_rfc3339()
    );
    Ok(doc)
}

/// Reads a document and checks it against the checksum reported when it was
/// written.
pub fn read_export_verified(
    path: impl AsRef<Path>,
    expected_checksum: &str,
) -> Result<ConfigDocument, StorageError> {
    let path = path.as_ref();
    let data = fs::read(path).map_err(|e| StorageError::io(path, e))?;

    let actual = checksum(&data);
    if !actual.eq_ignore_ascii_case(expected_checksum) {
        return Err(StorageError::Corruption(format!(
            "{} checksum mismatch: expected {}, found {}",
            path.display(),
            expected_checksum,
            actual
        )));
    }

    Ok(serde_json::from_slice(&data)?)
}

/// Reads a document and builds a workspace from it.
pub fn load_workspace(
    path: impl AsRef<Path>,
    config: WorkspaceConfig,
) -> Result<Workspace, StorageError> {
    let doc = read_export(path)?;
    Ok(Workspace::from_document(doc, config)?)
}

fn checksum(data: &[u8]) -> String {
    format!("{:08x}", crc32c::crc32c(data))
}

fn write_and_rename(tmp_path: &Path, path: &Path, data: &[u8]) -> Result<(), StorageError> {
    {
        let mut file = File::create(tmp_path).map_err(|e| StorageError::io(tmp_path, e))?;
        file.write_all(data)
            .map_err(|e| StorageError::io(tmp_path, e))?;
        file.sync_all().map_err(|e| StorageError::io(tmp_path, e))?;
    }
    fs::rename(tmp_path, path).map_err(|e| StorageError::io(path, e))
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bicfg_core::{ConfigDocument, CoreError};
    use tempfile::TempDir;

    #[test]
    fn test_export_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let doc = ConfigDocument::sample();

        let meta = write_export(&path, &doc, true).unwrap();
        assert_eq!(meta.variables, 3);
        assert_eq!(meta.elements, 2);
        assert_eq!(meta.events, 1);
        assert_eq!(meta.states, 1);
        assert_eq!(meta.size_bytes, fs::metadata(&path).unwrap().len());
        assert!(!tmp_path_for(&path).exists());

        let loaded = read_export(&path).unwrap();
        assert_eq!(loaded, doc);
    }

    #[test]
    fn test_failed_export_removes_temp_file() {
        let dir = TempDir::new().unwrap();
        // A non-empty directory at the destination makes the rename fail
        let path = dir.path().join("config.json");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep"), b"x").unwrap();

        let result = write_export(&path, &ConfigDocument::sample(), true);
        assert!(matches!(result, Err(StorageError::Io { .. })));
        assert!(!tmp_path_for(&path).exists());
    }

    #[test]
    fn test_verified_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let meta = write_export(&path, &ConfigDocument::sample(), false).unwrap();

        assert!(read_export_verified(&path, &meta.checksum).is_ok());

        fs::write(&path, b"{}").unwrap();
        let result = read_export_verified(&path, &meta.checksum);
        assert!(matches!(result, Err(StorageError::Corruption(_))));
    }

    #[test]
    fn test_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/out/config.json");
        write_export(&path, &ConfigDocument::empty(), true).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = read_export(dir.path().join("absent.json"));
        assert!(matches!(result, Err(StorageError::Io { .. })));
    }

    #[test]
    fn test_malformed_condition_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(
            &path,
            r#"{"states": [{"id": "s", "name": "S", "condition": "x"}], "timestamp": "2024-10-18T00:00:00Z"}"#,
        )
        .unwrap();

        assert!(matches!(read_export(&path), Err(StorageError::Json(_))));
    }

    #[test]
    fn test_load_workspace_rejects_duplicate_ids() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dup.json");
        let mut doc = ConfigDocument::sample();
        doc.variables.push(doc.variables[0].clone());
        write_export(&path, &doc, true).unwrap();

        let result = load_workspace(&path, WorkspaceConfig::default());
        assert!(matches!(
            result,
            Err(StorageError::Core(CoreError::DuplicateId { .. }))
        ));
    }
}
