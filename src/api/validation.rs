use crate::api::errors::ApiError;
use std::path::Path;

/// Checks an uploaded answer-card scan against the configured extension
/// allow-list and verifies the declared MIME type matches the extension.
pub(crate) fn validate_scan_upload(
    filename: &str,
    content_type: &str,
    allowed_extensions: &[String],
) -> Result<(), ApiError> {
    let extension = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .ok_or_else(|| ApiError::BadRequest("Scan file must have an extension".to_string()))?;

    if !allowed_extensions.iter().any(|allowed| allowed == &extension) {
        return Err(ApiError::BadRequest(format!(
            "Scan extension '{extension}' is not allowed"
        )));
    }

    let mime = content_type.trim().to_ascii_lowercase();
    if mime_allowed_for_extension(&mime, &extension) {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!(
            "MIME type '{mime}' does not match extension '.{extension}'"
        )))
    }
}

fn mime_allowed_for_extension(mime: &str, extension: &str) -> bool {
    match extension {
        "jpg" | "jpeg" => matches!(mime, "image/jpeg" | "image/jpg"),
        "png" => mime == "image/png",
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::validate_scan_upload;

    fn allowed() -> Vec<String> {
        vec!["jpg".to_string(), "jpeg".to_string(), "png".to_string()]
    }

    #[test]
    fn accepts_matching_extension_and_mime() {
        assert!(validate_scan_upload("cartao.jpg", "image/jpeg", &allowed()).is_ok());
        assert!(validate_scan_upload("CARTAO.PNG", "image/png", &allowed()).is_ok());
    }

    #[test]
    fn rejects_missing_extension() {
        assert!(validate_scan_upload("cartao", "image/jpeg", &allowed()).is_err());
    }

    #[test]
    fn rejects_extension_outside_allow_list() {
        assert!(validate_scan_upload("cartao.pdf", "application/pdf", &allowed()).is_err());
    }

    #[test]
    fn rejects_mime_mismatch() {
        assert!(validate_scan_upload("cartao.png", "image/jpeg", &allowed()).is_err());
        assert!(validate_scan_upload("cartao.jpg", "application/octet-stream", &allowed()).is_err());
    }
}
