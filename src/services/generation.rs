//! Generation service — image generation, reference uploads, download and
//! fullscreen view.
//!
//! DESIGN
//! ======
//! `generate_image` shares the busy token with the assistant operations, so
//! an image call never overlaps a text call. The request is assembled from
//! prompt, style, negative prompt and reference images under the lock that
//! starts the operation; later edits do not leak into an in-flight call.

use std::path::{Path, PathBuf};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Local};
use tracing::{info, warn};

use crate::llm::types::{ImageRequest, ReferenceImage};
use crate::state::{OperationKind, OperationOutput, SessionState, Studio, StudioError};

const REFERENCE_ONLY_TEXT: &str = "Create an image based on the reference images.";

/// Mime types accepted as reference images, from files or data URIs.
const REFERENCE_MIME_TYPES: [&str; 4] = ["image/png", "image/jpeg", "image/webp", "image/gif"];

// =============================================================================
// IMAGE GENERATION
// =============================================================================

/// Generate one image from the current fields.
///
/// # Errors
///
/// Returns [`StudioError::Busy`] if any operation is running,
/// [`StudioError::NothingToGenerate`] with neither prompt nor references, or
/// [`StudioError::Operation`] mirroring the shared error message.
pub async fn generate_image(studio: &Studio) -> Result<(), StudioError> {
    let (guard, request) = studio.begin(OperationKind::GenerateImage, build_image_request)?;
    info!(
        text_len = request.text.len(),
        references = request.references.len(),
        "generation: started"
    );

    match studio.image.generate_image(&request).await {
        Ok(data_uri) => {
            info!(data_len = data_uri.len(), "generation: succeeded");
            guard.succeed(OperationOutput::Image(data_uri));
            Ok(())
        }
        Err(e) => {
            warn!(code = e.error_code(), error = %e, "generation: failed");
            Err(guard.fail(e.to_string()))
        }
    }
}

/// Fold prompt, style and exclusions into one instruction.
///
/// # Errors
///
/// Returns [`StudioError::NothingToGenerate`] when the prompt is blank and
/// there are no reference images.
pub fn build_image_request(state: &SessionState) -> Result<ImageRequest, StudioError> {
    let prompt = state.prompt().trim();
    let references = state.reference_images().to_vec();
    if prompt.is_empty() && references.is_empty() {
        return Err(StudioError::NothingToGenerate);
    }

    let mut sections = vec![if prompt.is_empty() { REFERENCE_ONLY_TEXT.to_string() } else { prompt.to_string() }];
    if let Some(style) = state.style() {
        sections.push(format!("Style: {style}."));
    }
    let negative = state.negative_prompt().trim();
    if !negative.is_empty() {
        sections.push(format!("Avoid the following elements: {negative}."));
    }

    Ok(ImageRequest { text: sections.join("\n\n"), references })
}

// =============================================================================
// FULLSCREEN
// =============================================================================

/// Flip the fullscreen flag and return the new value.
pub fn toggle_fullscreen(studio: &Studio) -> bool {
    studio.transition(|s| {
        let next = !s.is_fullscreen();
        s.set_fullscreen(next);
        next
    })
}

pub fn set_fullscreen(studio: &Studio, on: bool) {
    studio.transition(|s| s.set_fullscreen(on));
}

// =============================================================================
// DOWNLOAD
// =============================================================================

/// Save the current image as `<dir>/<prefix>_YYYY-MM-DD_HH-MM-SS.png`.
/// Returns `Ok(None)` without touching the filesystem when there is no image.
///
/// # Errors
///
/// Returns [`StudioError::InvalidDataUri`] or [`StudioError::Decode`] for a
/// malformed image, and [`StudioError::Io`] if the file cannot be written.
pub async fn download_image(studio: &Studio, dir: &Path) -> Result<Option<PathBuf>, StudioError> {
    let Some(data_uri) = studio.snapshot().image().map(str::to_string) else {
        return Ok(None);
    };

    let image = parse_data_uri(&data_uri)?;
    let bytes = BASE64.decode(image.data.as_bytes())?;

    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(download_file_name(studio.download_prefix(), Local::now()));
    tokio::fs::write(&path, &bytes).await?;

    info!(path = %path.display(), bytes = bytes.len(), "generation: image saved");
    Ok(Some(path))
}

#[must_use]
pub fn download_file_name(prefix: &str, at: DateTime<Local>) -> String {
    format!("{prefix}_{}.png", at.format("%Y-%m-%d_%H-%M-%S"))
}

// =============================================================================
// REFERENCE IMAGES
// =============================================================================

/// Read, encode and install a batch of reference images, replacing the
/// previous set. A failing file aborts the batch and keeps the old set.
///
/// # Errors
///
/// Returns [`StudioError::ReferenceImage`] naming the first bad file.
pub async fn upload_reference_images(studio: &Studio, paths: &[PathBuf]) -> Result<usize, StudioError> {
    let mut images = Vec::with_capacity(paths.len());
    for path in paths {
        let mime_type = mime_for_path(path).ok_or_else(|| StudioError::ReferenceImage {
            path: path.clone(),
            reason: "unsupported image type".into(),
        })?;
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| StudioError::ReferenceImage { path: path.clone(), reason: e.to_string() })?;
        images.push(ReferenceImage { mime_type: mime_type.to_string(), data: BASE64.encode(bytes) });
    }

    let count = images.len();
    studio.transition(|s| s.set_reference_images(images));
    info!(count, "generation: reference images replaced");
    Ok(count)
}

/// Install reference images given as `data:<mime>;base64,<data>` URIs.
///
/// # Errors
///
/// Returns [`StudioError::InvalidDataUri`] for the first malformed URI; the
/// previous set is kept.
pub fn set_reference_images_from_data_uris(studio: &Studio, uris: &[&str]) -> Result<usize, StudioError> {
    let images = uris
        .iter()
        .map(|uri| parse_data_uri(uri))
        .collect::<Result<Vec<_>, _>>()?;
    let count = images.len();
    studio.transition(|s| s.set_reference_images(images));
    Ok(count)
}

pub fn clear_reference_images(studio: &Studio) {
    studio.transition(|s| s.set_reference_images(Vec::new()));
}

/// Split a base64 data URI into mime type and bare payload.
///
/// # Errors
///
/// Returns [`StudioError::InvalidDataUri`] unless the input looks like
/// `data:<mime>;base64,<data>` with a non-empty payload and a png, jpeg,
/// webp or gif mime type.
pub fn parse_data_uri(uri: &str) -> Result<ReferenceImage, StudioError> {
    let invalid = || StudioError::InvalidDataUri(uri.chars().take(48).collect());
    let rest = uri.trim().strip_prefix("data:").ok_or_else(invalid)?;
    let (header, data) = rest.split_once(',').ok_or_else(invalid)?;
    let mime_type = header.strip_suffix(";base64").ok_or_else(invalid)?.to_ascii_lowercase();
    if !REFERENCE_MIME_TYPES.contains(&mime_type.as_str()) || data.is_empty() {
        return Err(invalid());
    }
    Ok(ReferenceImage { mime_type, data: data.to_string() })
}

fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}

#[cfg(test)]
#[path = "generation_test.rs"]
mod tests;
