// src/storage/mod.rs
use crate::schedule::DocumentResult;
use crate::utils::error::StorageError;
use std::fs;
use std::path::{Path, PathBuf};

/// Pretty JSON for a document result, `{ "funds": [...] }`.
pub fn to_json(result: &DocumentResult) -> Result<String, StorageError> {
    serde_json::to_string_pretty(result).map_err(|e| StorageError::SerializationError(e.to_string()))
}

/// Writes the result to `path`, creating parent directories as needed.
pub fn save_result<P: AsRef<Path>>(path: P, result: &DocumentResult) -> Result<PathBuf, StorageError> {
    let file_path = path.as_ref().to_path_buf();

    if let Some(parent) = file_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(StorageError::IoError)?;
        }
    }

    let json = to_json(result)?;
    fs::write(&file_path, json).map_err(StorageError::IoError)?;

    tracing::info!("Saved {} funds to {}", result.funds.len(), file_path.display());
    Ok(file_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::models::{FundRecord, Holding};

    #[test]
    fn test_save_result_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("funds.json");
        let result = DocumentResult {
            funds: vec![FundRecord {
                fund_name: Some("International Fund".to_string()),
                report_date: None,
                holdings: vec![Holding {
                    security_name: Some("Nestle SA".to_string()),
                    country: Some("Switzerland".to_string()),
                    ..Holding::default()
                }],
            }],
        };

        let written = save_result(&path, &result).unwrap();
        assert_eq!(written, path);

        let contents = fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(value["funds"][0]["Schedule of Investments"][0]["Country"], "Switzerland");
        let decoded: DocumentResult = serde_json::from_str(&contents).unwrap();
        assert_eq!(decoded, result);
    }

    #[test]
    fn test_empty_result_json() {
        let json = to_json(&DocumentResult::default()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value, serde_json::json!({ "funds": [] }));
    }
}
