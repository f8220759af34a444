/// Catalog import
///
/// Loads JSON record files into the catalog. A file holds either an array
/// of records or a single record object. This is the only path that writes
/// to the catalog; the search core never does.

use super::data::{ImportResult, Record};
use super::library::Library;
use crate::error::{CatalogError, ImportError};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Deserialize)]
#[serde(untagged)]
enum RecordFile {
    Many(Vec<Record>),
    One(Record),
}

/// Parse the contents of one record file.
pub fn parse_records(json: &str, path: &Path) -> Result<Vec<Record>, ImportError> {
    let records = match serde_json::from_str(json) {
        Ok(RecordFile::Many(records)) => records,
        Ok(RecordFile::One(record)) => vec![record],
        Err(source) => {
            return Err(ImportError::Parse {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    if let Some(bad) = records
        .iter()
        .position(|r| r.brand.trim().is_empty() || r.model.trim().is_empty())
    {
        return Err(ImportError::Invalid {
            path: path.to_path_buf(),
            reason: format!("record {bad} has an empty brand or model"),
        });
    }

    Ok(records)
}

/// Read and parse one record file from disk.
pub fn read_record_file(path: &Path) -> Result<Vec<Record>, ImportError> {
    let json = std::fs::read_to_string(path).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_records(&json, path)
}

/// Import every `*.json` file under `folder`.
pub fn import_folder(library: &Library, folder: &Path) -> ImportResult {
    let mut result = ImportResult::default();

    tracing::info!("Scanning folder: {}", folder.display());

    // Walk the directory tree recursively
    for entry in WalkDir::new(folder)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();

        // Only JSON files
        let is_json = path.is_file()
            && path
                .extension()
                .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case("json"))
                .unwrap_or(false);
        if !is_json {
            continue;
        }

        // One transaction per file: a failed file leaves nothing behind
        let outcome = read_record_file(path)
            .and_then(|records| library.insert_batch(&records).map_err(ImportError::from));

        match outcome {
            Ok((imported, skipped)) => {
                result.imported_count += imported;
                result.skipped_count += skipped;
                tracing::debug!("{}: {} new, {} skipped", path.display(), imported, skipped);
            }
            Err(err) => {
                result.failed_files += 1;
                tracing::warn!("Skipping file: {err}");
            }
        }
    }

    tracing::info!(
        "Import complete: {} new, {} skipped, {} failed files",
        result.imported_count,
        result.skipped_count,
        result.failed_files
    );

    result
}

/// Async folder import for the UI.
/// Runs on a blocking thread with its own connection.
pub async fn import_folder_async(
    folder: PathBuf,
    db_path: PathBuf,
) -> Result<ImportResult, CatalogError> {
    let outcome = tokio::task::spawn_blocking(move || {
        Library::open(&db_path).map(|library| import_folder(&library, &folder))
    })
    .await
    .map_err(|e| CatalogError::Transport(format!("import task failed: {e}")))?;

    if let Err(err) = &outcome {
        tracing::error!("Import aborted, catalog unavailable: {err}");
    }
    outcome
}
