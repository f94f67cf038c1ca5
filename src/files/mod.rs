use std::path::PathBuf;
use std::time::Duration;

use crate::error::{FillError, Result};

/// Scratch directory for downloaded documents.
fn scratch_dir() -> PathBuf {
    std::env::temp_dir().join("formpilot")
}

/// File name for a downloaded document: last URL path segment, query stripped,
/// with an extension inferred from the response content type when missing.
fn document_file_name(url: &str, content_type: Option<&str>) -> String {
    let base = url
        .rsplit('/')
        .next()
        .unwrap_or("document")
        .split('?')
        .next()
        .unwrap_or("document");
    let base = if base.is_empty() { "document" } else { base };

    if base.contains('.') {
        return base.to_string();
    }

    let ext = content_type
        .and_then(|ct| mime_guess::get_mime_extensions_str(ct))
        .and_then(|exts| exts.first())
        .copied()
        .unwrap_or("pdf");
    format!("{base}.{ext}")
}

/// Fetch a remote document into the scratch area and return its local path.
///
/// The caller owns deleting the file; `schedule_cleanup` does that on a short
/// delay so the upload has time to finish. Failures are surfaced so the
/// specific file field can be abandoned while the run proceeds.
pub async fn download_document(url: &str) -> Result<PathBuf> {
    let dir = scratch_dir();
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| FillError::Download(format!("Failed to create scratch dir: {e}")))?;

    tracing::info!("Downloading document from {}", url);

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .map_err(|e| FillError::Download(e.to_string()))?;

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| FillError::Download(format!("Request failed: {e}")))?
        .error_for_status()
        .map_err(|e| FillError::Download(format!("Bad response: {e}")))?;

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(';').next().unwrap_or(v).trim().to_string());

    let file_name = document_file_name(url, content_type.as_deref());
    // Unique prefix so concurrent runs never collide on a shared name
    let path = dir.join(format!("{}-{}", uuid::Uuid::new_v4(), file_name));

    let bytes = response
        .bytes()
        .await
        .map_err(|e| FillError::Download(format!("Failed to read body: {e}")))?;

    if bytes.is_empty() {
        return Err(FillError::Download("Downloaded file is empty".to_string()));
    }

    if let Err(e) = tokio::fs::write(&path, &bytes).await {
        // Remove any partial file before reporting
        let _ = tokio::fs::remove_file(&path).await;
        return Err(FillError::Download(format!("Failed to write file: {e}")));
    }

    tracing::info!("Downloaded {} bytes to {}", bytes.len(), path.display());
    Ok(path)
}

/// Best-effort delayed deletion of a scratch file, leaving the upload a moment
/// to be processed first.
pub fn schedule_cleanup(path: PathBuf) {
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(3)).await;
        if let Err(e) = tokio::fs::remove_file(&path).await {
            tracing::warn!("Failed to remove scratch file {}: {}", path.display(), e);
        }
    });
}
