use crate::error::{ImaginError, Result};
use base64::{engine::general_purpose::STANDARD, Engine};
use std::path::{Path, PathBuf};

const FILE_PREFIX: &str = "imaginai_";
const FALLBACK_STEM: &str = "generated_image";
const MAX_STEM_CHARS: usize = 30;

/// `imaginai_<prompt>.png`, with everything outside `[A-Za-z0-9_]` turned
/// into `_` and the prompt part capped at 30 characters. Replacement is per
/// UTF-16 code unit, so a character outside the BMP becomes `__`.
pub fn suggested_file_name(original_prompt: &str) -> String {
    let stem: String = original_prompt
        .chars()
        .flat_map(|c| {
            let (replacement, count) = if c.is_ascii_alphanumeric() || c == '_' {
                (c, 1)
            } else {
                ('_', c.len_utf16())
            };
            std::iter::repeat(replacement).take(count)
        })
        .take(MAX_STEM_CHARS)
        .collect();

    let stem = if stem.is_empty() {
        FALLBACK_STEM
    } else {
        stem.as_str()
    };
    format!("{}{}.png", FILE_PREFIX, stem)
}

/// Decodes a `data:<mime>;base64,<payload>` URI.
pub fn decode_data_uri(uri: &str) -> Result<Vec<u8>> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| ImaginError::DownloadError("not a data URI".into()))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| ImaginError::DownloadError("data URI has no payload".into()))?;

    if !meta.ends_with(";base64") {
        return Err(ImaginError::DownloadError(format!(
            "unsupported data URI encoding: {}",
            meta
        )));
    }

    STANDARD
        .decode(payload.trim())
        .map_err(|e| ImaginError::DownloadError(format!("invalid base64 payload: {}", e)))
}

async fn fetch_remote(url: &str) -> Result<Vec<u8>> {
    let response = reqwest::get(url)
        .await
        .map_err(|e| ImaginError::DownloadError(format!("request failed: {}", e)))?;

    if !response.status().is_success() {
        return Err(ImaginError::DownloadError(format!(
            "{} returned HTTP {}",
            url,
            response.status()
        )));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| ImaginError::DownloadError(e.to_string()))?;
    Ok(bytes.to_vec())
}

/// Resolves an image reference (data URI or http(s) URL) to raw bytes.
pub async fn load_image(image_ref: &str) -> Result<Vec<u8>> {
    if image_ref.starts_with("data:") {
        decode_data_uri(image_ref)
    } else if image_ref.starts_with("http://") || image_ref.starts_with("https://") {
        fetch_remote(image_ref).await
    } else {
        Err(ImaginError::DownloadError(format!(
            "unsupported image reference: {}",
            image_ref.chars().take(40).collect::<String>()
        )))
    }
}

/// Saves the image under `dir`, named after the original prompt, and returns
/// the written path.
pub async fn save_image(image_ref: &str, original_prompt: &str, dir: &Path) -> Result<PathBuf> {
    let bytes = load_image(image_ref).await?;

    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| ImaginError::DownloadError(format!("cannot create {}: {}", dir.display(), e)))?;

    let path = dir.join(suggested_file_name(original_prompt));
    tokio::fs::write(&path, &bytes)
        .await
        .map_err(|e| ImaginError::DownloadError(format!("cannot write {}: {}", path.display(), e)))?;

    log::info!("💾 Saved {} bytes to {}", bytes.len(), path.display());
    Ok(path)
}
