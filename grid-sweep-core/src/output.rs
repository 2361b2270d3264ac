//! Correlates returned images with fragment filenames and writes them to disk.
//!
//! Layout: `<root>/CLIP-skip_<clip>/seed_<seed>/<folder>/<fragment stem>.png`.

use std::fs;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use tracing::{debug, error, info};

use crate::contract::GenerationResponse;
use crate::jobs::Job;

pub const DEFAULT_OUTPUT_ROOT: &str = "Results";

#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("image for {filename} is not valid base64: {source}")]
    Decode {
        filename: String,
        #[source]
        source: base64::DecodeError,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub fn job_output_dir(root: &Path, clip_skip: u32, seed: i64, folder: &str) -> PathBuf {
    root.join(format!("CLIP-skip_{clip_skip}"))
        .join(format!("seed_{seed}"))
        .join(folder)
}

/// `a-1.txt` -> `a-1.png`.
pub fn output_filename(fragment_filename: &str) -> String {
    let stem = Path::new(fragment_filename)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| fragment_filename.to_string());
    format!("{stem}.png")
}

/// Pairs images with filenames positionally after dropping the composite at
/// index 0, stopping at whichever list runs out first. No cardinality check:
/// missing images leave trailing filenames without output, surplus images are
/// dropped.
pub fn correlate<'a>(
    images: &'a [String],
    filenames: &'a [String],
) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
    images
        .iter()
        .skip(1)
        .zip(filenames.iter())
        .map(|(image, filename)| (image.as_str(), filename.as_str()))
}

/// Decodes one image, tolerating a `data:<mime>;base64,` prefix.
pub fn decode_image(data: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let payload = match data.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => data,
    };
    BASE64_STANDARD.decode(payload.trim())
}

/// Writes every correlated image of `response` for `job` and returns the written
/// paths in filename order.
///
/// All images are decoded before any file is created, so an undecodable image
/// fails the whole job and leaves nothing of it on disk.
pub fn write_job_output(
    root: &Path,
    job: &Job<'_>,
    response: &GenerationResponse,
) -> Result<Vec<PathBuf>, OutputError> {
    let decoded = correlate(&response.images, &job.prompt_set.filenames)
        .map(|(image, filename)| {
            decode_image(image)
                .map(|bytes| (filename, bytes))
                .map_err(|source| {
                    error!(file = filename, error = %source, "Failed to decode image");
                    OutputError::Decode {
                        filename: filename.to_string(),
                        source,
                    }
                })
        })
        .collect::<Result<Vec<_>, _>>()?;
    if decoded.is_empty() {
        info!(
            folder = job.folder(),
            returned = response.images.len(),
            "Response carries no per-prompt images, nothing to save"
        );
        return Ok(Vec::new());
    }

    let dir = job_output_dir(root, job.clip_skip, job.seed, job.folder());
    fs::create_dir_all(&dir).map_err(|source| {
        error!(error = ?source, path = %dir.display(), "Failed to create output directory");
        OutputError::Io {
            path: dir.clone(),
            source,
        }
    })?;

    let mut written = Vec::with_capacity(decoded.len());
    for (filename, bytes) in decoded {
        let path = dir.join(output_filename(filename));
        fs::write(&path, &bytes).map_err(|source| {
            error!(error = ?source, path = %path.display(), "Failed to write image");
            OutputError::Io {
                path: path.clone(),
                source,
            }
        })?;
        debug!(path = %path.display(), size = bytes.len(), "Saved image");
        written.push(path);
    }

    Ok(written)
}
