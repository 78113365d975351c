//! Bridge to the optical mark recognition script. The script is handed one
//! scanned image, runs inside a scratch directory and leaves a single CSV
//! behind; columns named `q1`, `q2`, ... carry the detected letter for each
//! printed question number, an empty cell meaning the bubble was left blank.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::TempDir;
use tokio::process::Command;

use crate::core::config::OmrSettings;

/// Placeholder the script emits (and we normalize empty cells to) when no
/// bubble could be read for a question.
pub(crate) const BLANK_MARK: &str = "?";

#[derive(Debug, thiserror::Error)]
pub(crate) enum OmrError {
    #[error("OMR script not found at {0}")]
    ScriptMissing(String),
    #[error("OMR script timed out after {0}s")]
    Timeout(u64),
    #[error("OMR script failed (exit code {exit_code:?}): {stderr}")]
    ScriptFailed { exit_code: Option<i32>, stderr: String },
    #[error("OMR script produced no results")]
    NoOutput,
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Writes `image_bytes` into a scratch directory, runs the detection script
/// over it and returns the detected mark per printed question number.
pub(crate) async fn run_omr(
    image_bytes: &[u8],
    image_filename: &str,
    settings: &OmrSettings,
) -> Result<BTreeMap<usize, String>, OmrError> {
    let script = match tokio::fs::canonicalize(&settings.script_path).await {
        Ok(path) => path,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(OmrError::ScriptMissing(settings.script_path.clone()));
        }
        Err(err) => return Err(OmrError::Io(err)),
    };

    let workdir = TempDir::new()?;
    // Keep only the final component of the client-supplied name.
    let image_name = Path::new(image_filename)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload.png".to_string());
    let image_path = workdir.path().join(image_name);
    tokio::fs::write(&image_path, image_bytes).await?;

    let invocation = Command::new("bash")
        .arg(&script)
        .arg(&image_path)
        .current_dir(workdir.path())
        .output();

    let output =
        match tokio::time::timeout(Duration::from_secs(settings.timeout_seconds), invocation).await
        {
            Ok(Ok(output)) => output,
            Ok(Err(err)) => return Err(OmrError::Io(err)),
            Err(_) => {
                tracing::warn!(script = %script.display(), "OMR script timed out");
                return Err(OmrError::Timeout(settings.timeout_seconds));
            }
        };

    if !output.status.success() {
        return Err(OmrError::ScriptFailed {
            exit_code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    let results_path = find_results_csv(workdir.path()).await?.ok_or(OmrError::NoOutput)?;
    let contents = tokio::fs::read(&results_path).await?;
    let detected = parse_detected_marks(contents.as_slice())?;
    tracing::info!(questions = detected.len(), "OMR detection finished");
    Ok(detected)
}

async fn find_results_csv(workdir: &Path) -> Result<Option<PathBuf>, OmrError> {
    let mut candidates = Vec::new();
    let mut entries = tokio::fs::read_dir(workdir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) == Some("csv") {
            candidates.push(path);
        }
    }
    candidates.sort();
    Ok(candidates.into_iter().next())
}

/// Reads the first data record of the script's CSV. Only columns named
/// `q<digits>` are taken; anything else (student id fields, diagnostics) is
/// ignored. Empty cells become [`BLANK_MARK`].
fn parse_detected_marks(input: impl std::io::Read) -> Result<BTreeMap<usize, String>, OmrError> {
    let mut reader = csv::Reader::from_reader(input);
    let headers = reader.headers()?.clone();
    let record = match reader.records().next() {
        Some(record) => record?,
        None => return Err(OmrError::NoOutput),
    };

    let mut detected = BTreeMap::new();
    for (name, value) in headers.iter().zip(record.iter()) {
        let Some(digits) = name.strip_prefix('q') else {
            continue;
        };
        let Ok(numero) = digits.parse::<usize>() else {
            continue;
        };
        let mark = value.trim();
        let mark = if mark.is_empty() { BLANK_MARK.to_string() } else { mark.to_string() };
        detected.insert(numero, mark);
    }
    Ok(detected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_question_columns_and_ignores_the_rest() {
        let csv = "aluno,q1,q2,q10\njoao,A,b,E\n";
        let detected = parse_detected_marks(csv.as_bytes()).unwrap();
        assert_eq!(detected.len(), 3);
        assert_eq!(detected[&1], "A");
        assert_eq!(detected[&2], "b");
        assert_eq!(detected[&10], "E");
    }

    #[test]
    fn empty_cells_become_blank_marks() {
        let csv = "q1,q2,q3\nA,,C\n";
        let detected = parse_detected_marks(csv.as_bytes()).unwrap();
        assert_eq!(detected[&2], BLANK_MARK);
    }

    #[test]
    fn non_numeric_question_headers_are_skipped() {
        let csv = "qx,q3,quality\nZ,C,ok\n";
        let detected = parse_detected_marks(csv.as_bytes()).unwrap();
        assert_eq!(detected.len(), 1);
        assert_eq!(detected[&3], "C");
    }

    #[test]
    fn csv_without_data_rows_is_no_output() {
        let csv = "q1,q2\n";
        let err = parse_detected_marks(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, OmrError::NoOutput));
    }
}
