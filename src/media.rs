use std::path::Path;

use anyhow::{Context, Result};
use uuid::Uuid;

const AD_IMAGE_DIR: &str = "ads";

/// Writes an uploaded ad image below `media_root` and returns its path
/// relative to the root, e.g. `ads/1b4e..._photo.jpg`.
pub async fn store_ad_image(media_root: &Path, file_name: &str, data: &[u8]) -> Result<String> {
    let directory = media_root.join(AD_IMAGE_DIR);
    tokio::fs::create_dir_all(&directory)
        .await
        .with_context(|| format!("Failed to create {}", directory.display()))?;

    let relative = format!(
        "{}/{}_{}",
        AD_IMAGE_DIR,
        Uuid::new_v4().simple(),
        sanitize_file_name(file_name)
    );
    let target = media_root.join(&relative);
    tokio::fs::write(&target, data)
        .await
        .with_context(|| format!("Failed to write {}", target.display()))?;
    Ok(relative)
}

const IMAGE_SIGNATURES: &[&[u8]] = &[
    b"\x89PNG\r\n\x1a\n",
    b"\xff\xd8\xff",
    b"GIF87a",
    b"GIF89a",
    b"BM",
];

/// Accepts uploads whose declared content type, if any, is `image/*` and
/// whose leading bytes match a PNG, JPEG, GIF, WebP or BMP header.
pub fn is_supported_image(content_type: Option<&str>, data: &[u8]) -> bool {
    if let Some(content_type) = content_type {
        if !content_type.trim().to_ascii_lowercase().starts_with("image/") {
            return false;
        }
    }
    let is_webp = data.len() >= 12 && &data[..4] == b"RIFF" && &data[8..12] == b"WEBP";
    is_webp || IMAGE_SIGNATURES.iter().any(|signature| data.starts_with(signature))
}

/// Best-effort removal of a stored file; a missing file is not an error.
pub async fn remove_media_file(media_root: &Path, relative: &str) {
    let target = media_root.join(relative);
    if let Err(e) = tokio::fs::remove_file(&target).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(path = %target.display(), error = %e, "could not remove media file");
        }
    }
}

/// Keeps the last path component and replaces anything outside
/// `[A-Za-z0-9._-]`.
fn sanitize_file_name(file_name: &str) -> String {
    let base = file_name
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.').to_string();
    if cleaned.is_empty() {
        "image".to_string()
    } else {
        cleaned
    }
}
