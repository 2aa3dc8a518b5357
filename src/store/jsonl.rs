//! Line-delimited JSON persistence.
//!
//! Results files are append-only and double as the resume checkpoint: a
//! record is only considered produced once its line is fully on disk, so
//! every append flushes and syncs before returning.

use crate::models::{HanbenchError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Load all records from a JSONL file. Blank lines are skipped; a malformed
/// line fails with its line number and path.
pub fn load_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file = File::open(path)
        .map_err(|e| HanbenchError::io(format!("opening {}", path.display()), e))?;
    let reader = BufReader::new(file);
    let mut records = Vec::new();

    for (line_num, line) in reader.lines().enumerate() {
        let line =
            line.map_err(|e| HanbenchError::io(format!("reading {}", path.display()), e))?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line).map_err(|e| HanbenchError::DataFormat {
            path: path.to_owned(),
            line: line_num + 1,
            source: e,
        })?;
        records.push(record);
    }

    Ok(records)
}

/// Load records if the file exists, otherwise an empty vec. This is the
/// resume entry point: a missing results file means a fresh run.
pub fn load_jsonl_or_default<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if path.exists() {
        load_jsonl(path)
    } else {
        Ok(Vec::new())
    }
}

/// Count the records already present (non-blank lines).
pub fn count_jsonl_records(path: &Path) -> Result<usize> {
    let file = File::open(path)
        .map_err(|e| HanbenchError::io(format!("opening {}", path.display()), e))?;
    let reader = BufReader::new(file);

    let mut count = 0;
    for line in reader.lines() {
        let line =
            line.map_err(|e| HanbenchError::io(format!("reading {}", path.display()), e))?;
        if !line.trim().is_empty() {
            count += 1;
        }
    }
    Ok(count)
}

/// Append one record durably: write the line, flush, fsync. Parent
/// directories are created on first use.
pub fn append_jsonl<T: Serialize>(path: &Path, record: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|e| HanbenchError::io(format!("creating {}", parent.display()), e))?;
        }
    }

    let json = serde_json::to_string(record)
        .map_err(|e| HanbenchError::Internal(format!("serializing record: {e}")))?;

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| HanbenchError::io(format!("opening {} for append", path.display()), e))?;

    writeln!(file, "{json}")
        .map_err(|e| HanbenchError::io(format!("appending to {}", path.display()), e))?;
    file.sync_all()
        .map_err(|e| HanbenchError::io(format!("syncing {}", path.display()), e))?;

    Ok(())
}

/// Write a whole-document JSON file, pretty-printed, UTF-8 with non-ASCII
/// characters preserved.
pub fn save_json_pretty<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|e| HanbenchError::io(format!("creating {}", parent.display()), e))?;
        }
    }

    let file = File::create(path)
        .map_err(|e| HanbenchError::io(format!("creating {}", path.display()), e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)
        .map_err(|e| HanbenchError::Internal(format!("serializing {}: {e}", path.display())))?;
    writer
        .flush()
        .map_err(|e| HanbenchError::io(format!("flushing {}", path.display()), e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Row {
        question: String,
        answer: String,
    }

    fn row(q: &str, a: &str) -> Row {
        Row {
            question: q.to_string(),
            answer: a.to_string(),
        }
    }

    #[test]
    fn test_append_then_load_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out.jsonl");

        let rows = vec![row("问题一", "A"), row("问题二", "B"), row("问题三", "C")];
        for r in &rows {
            append_jsonl(&path, r).unwrap();
        }

        let loaded: Vec<Row> = load_jsonl(&path).unwrap();
        assert_eq!(loaded, rows);
        assert_eq!(count_jsonl_records(&path).unwrap(), 3);
    }

    #[test]
    fn test_load_missing_file_errors_with_path() {
        let err = load_jsonl::<Row>(Path::new("/nonexistent/data.jsonl")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/data.jsonl"));
    }

    #[test]
    fn test_load_or_default_missing_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("absent.jsonl");
        let loaded: Vec<Row> = load_jsonl_or_default(&path).unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_malformed_line_reports_line_number() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad.jsonl");
        std::fs::write(&path, "{\"question\": \"q\", \"answer\": \"A\"}\nnot json\n").unwrap();

        let err = load_jsonl::<Row>(&path).unwrap_err();
        assert!(matches!(
            err,
            crate::models::HanbenchError::DataFormat { line: 2, .. }
        ));
    }

    #[test]
    fn test_blank_lines_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("gaps.jsonl");
        std::fs::write(
            &path,
            "{\"question\": \"q\", \"answer\": \"A\"}\n\n{\"question\": \"r\", \"answer\": \"B\"}\n",
        )
        .unwrap();

        let loaded: Vec<Row> = load_jsonl(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(count_jsonl_records(&path).unwrap(), 2);
    }

    #[test]
    fn test_save_json_pretty_preserves_unicode() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("scores/score.json");

        save_json_pretty(&path, &row("声调", "A")).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("声调"));
        assert!(!content.contains("\\u"));
    }
}
