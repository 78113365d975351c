//! Shared plumbing for endpoints that return a freshly compiled PDF or an
//! archive of them.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::api::errors::ApiError;
use crate::services::latex_compiler::LatexError;

pub(crate) fn pdf_response(bytes: Vec<u8>, disposition: &str) -> Response {
    let mut response = (StatusCode::OK, bytes).into_response();
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/pdf"));
    response.headers_mut().insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(disposition).unwrap_or_else(|_| HeaderValue::from_static("inline")),
    );
    response
}

pub(crate) fn zip_response(bytes: Vec<u8>, disposition: &str) -> Response {
    let mut response = (StatusCode::OK, bytes).into_response();
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/zip"));
    response.headers_mut().insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(disposition)
            .unwrap_or_else(|_| HeaderValue::from_static("attachment")),
    );
    response
}

pub(crate) fn map_latex_error(error: LatexError) -> ApiError {
    match error {
        LatexError::CompilerMissing => {
            ApiError::ServiceUnavailable("pdflatex is not installed on the server".to_string())
        }
        LatexError::Timeout(seconds) => {
            metrics::counter!("latex_compile_failures_total", "kind" => "timeout".to_string())
                .increment(1);
            ApiError::Internal(format!("LaTeX compilation timed out after {seconds}s"))
        }
        LatexError::Failed { exit_code, logs } => {
            metrics::counter!("latex_compile_failures_total", "kind" => "failed".to_string())
                .increment(1);
            tracing::error!(?exit_code, logs, "LaTeX compilation failed");
            ApiError::Internal("LaTeX compilation failed".to_string())
        }
        LatexError::Io(err) => ApiError::internal(err, "LaTeX compilation failed"),
    }
}
