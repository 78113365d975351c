//! Turns LaTeX source into PDF bytes by driving `pdflatex` in a scoped
//! temporary directory. The directory is dropped on every exit path, so no
//! intermediate artifacts survive the call; the only thing kept on failure
//! is the offending `.tex`, copied into the configured debug directory.

use std::path::Path;
use std::process::Output;
use std::time::Duration;

use tempfile::TempDir;
use time::macros::format_description;
use tokio::process::Command;

use crate::core::config::LatexSettings;
use crate::core::time::primitive_now_utc;

#[derive(Debug, thiserror::Error)]
pub(crate) enum LatexError {
    #[error("pdflatex timed out after {0}s")]
    Timeout(u64),
    #[error("pdflatex not found; install a TeX distribution (TeX Live, MiKTeX)")]
    CompilerMissing,
    #[error("LaTeX compilation failed (exit code {exit_code:?})")]
    Failed { exit_code: Option<i32>, logs: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Runs `compile_runs` pdflatex passes over `source` and returns the PDF
/// bytes. Each pass gets its own timeout. On failure the compiler log file,
/// stdout and stderr are returned verbatim inside the error.
pub(crate) async fn compile_pdf(
    source: &str,
    filename: &str,
    settings: &LatexSettings,
) -> Result<Vec<u8>, LatexError> {
    let workdir = TempDir::new()?;
    let tex_path = workdir.path().join(format!("{filename}.tex"));
    tokio::fs::write(&tex_path, source).await?;

    let mut last_output: Option<Output> = None;
    for run in 0..settings.compile_runs {
        let invocation = Command::new("pdflatex")
            .arg("-interaction=nonstopmode")
            .arg("-output-directory")
            .arg(workdir.path())
            .arg(&tex_path)
            .output();

        let output =
            match tokio::time::timeout(Duration::from_secs(settings.timeout_seconds), invocation)
                .await
            {
                Ok(Ok(output)) => output,
                Ok(Err(err)) if err.kind() == std::io::ErrorKind::NotFound => {
                    return Err(LatexError::CompilerMissing);
                }
                Ok(Err(err)) => return Err(LatexError::Io(err)),
                Err(_) => {
                    tracing::warn!(filename, run = run + 1, "pdflatex run timed out");
                    return Err(LatexError::Timeout(settings.timeout_seconds));
                }
            };

        tracing::debug!(filename, run = run + 1, total = settings.compile_runs, "pdflatex pass done");
        last_output = Some(output);
    }

    let pdf_path = workdir.path().join(format!("{filename}.pdf"));
    match tokio::fs::read(&pdf_path).await {
        Ok(bytes) => {
            tracing::info!(filename, size = bytes.len(), "LaTeX compiled");
            Ok(bytes)
        }
        Err(_) => {
            let exit_code = last_output.as_ref().and_then(|output| output.status.code());
            let logs = collect_failure_logs(workdir.path(), filename, last_output.as_ref()).await;
            persist_failed_source(source, filename, settings).await;
            tracing::warn!(filename, ?exit_code, "LaTeX compilation produced no PDF");
            Err(LatexError::Failed { exit_code, logs })
        }
    }
}

async fn collect_failure_logs(workdir: &Path, filename: &str, output: Option<&Output>) -> String {
    let mut logs = String::new();

    let log_path = workdir.join(format!("{filename}.log"));
    if let Ok(contents) = tokio::fs::read(&log_path).await {
        logs.push_str("=== LOG FILE ===\n");
        logs.push_str(&String::from_utf8_lossy(&contents));
    }

    if let Some(output) = output {
        if !output.stdout.is_empty() {
            logs.push_str("\n=== STDOUT ===\n");
            logs.push_str(&String::from_utf8_lossy(&output.stdout));
        }
        if !output.stderr.is_empty() {
            logs.push_str("\n=== STDERR ===\n");
            logs.push_str(&String::from_utf8_lossy(&output.stderr));
        }
    }

    if logs.is_empty() {
        logs.push_str("No compilation output available");
    }
    logs
}

/// Best effort; losing the debug copy must not mask the compilation error.
async fn persist_failed_source(source: &str, filename: &str, settings: &LatexSettings) {
    let stamp_format = format_description!("[year][month][day]_[hour][minute][second]");
    let stamp =
        primitive_now_utc().format(&stamp_format).unwrap_or_else(|_| "unknown".to_string());

    let dir = Path::new(&settings.sources_dir);
    if let Err(err) = tokio::fs::create_dir_all(dir).await {
        tracing::warn!(error = %err, dir = %dir.display(), "could not create LaTeX debug directory");
        return;
    }

    let path = dir.join(format!("failed_{filename}_{stamp}.tex"));
    match tokio::fs::write(&path, source).await {
        Ok(()) => tracing::debug!(path = %path.display(), "failed LaTeX source saved"),
        Err(err) => tracing::warn!(error = %err, "could not save failed LaTeX source"),
    }
}
