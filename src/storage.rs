//! Upload and result image persistence under the static directory.

use crate::error::AppError;
use image::{ImageFormat, RgbImage};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

const UPLOAD_SUBDIR: &str = "uploads";
const RESULT_SUBDIR: &str = "results";
const RESULT_PREFIX: &str = "result_";
const MAX_EXTENSION_LEN: usize = 10;

/// A file written by the store, with the URL it is served under.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredImage {
    pub filename: String,
    pub path: PathBuf,
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct ImageStore {
    upload_dir: PathBuf,
    result_dir: PathBuf,
    url_prefix: String,
}

impl ImageStore {
    /// Create the store, making `uploads/` and `results/` under `static_dir`.
    /// Files are served from `url_prefix` (e.g. `/static`).
    pub fn open(static_dir: &Path, url_prefix: &str) -> Result<Self, AppError> {
        let store = Self {
            upload_dir: static_dir.join(UPLOAD_SUBDIR),
            result_dir: static_dir.join(RESULT_SUBDIR),
            url_prefix: url_prefix.trim_end_matches('/').to_string(),
        };
        std::fs::create_dir_all(&store.upload_dir)?;
        std::fs::create_dir_all(&store.result_dir)?;
        Ok(store)
    }

    /// Persist the uploaded bytes under a fresh random name that keeps the
    /// original extension.
    pub async fn save_upload(
        &self,
        original_filename: &str,
        data: &[u8],
    ) -> Result<StoredImage, AppError> {
        let filename = stored_filename(original_filename);
        let path = self.upload_dir.join(&filename);

        tokio::fs::write(&path, data).await.map_err(|e| {
            AppError::Storage(format!("Failed to save upload {}: {e}", path.display()))
        })?;
        debug!(path = %path.display(), bytes = data.len(), "Saved upload");

        Ok(StoredImage {
            url: format!("{}/{UPLOAD_SUBDIR}/{filename}", self.url_prefix),
            filename,
            path,
        })
    }

    /// Blocking: encode and write the annotated image as
    /// `result_<stored filename>`. Extensions without a usable RGB encoder,
    /// or whose encoder rejects the image, are written as PNG.
    pub fn save_result(&self, upload: &StoredImage, image: &RgbImage) -> Result<StoredImage, AppError> {
        let filename = format!("{RESULT_PREFIX}{}", upload.filename);
        let path = self.result_dir.join(&filename);
        let format = ImageFormat::from_path(&path)
            .ok()
            .filter(|f| f.writing_enabled())
            .unwrap_or(ImageFormat::Png);

        let (bytes, format) = match encode(image, format) {
            Ok(bytes) => (bytes, format),
            Err(e) if format != ImageFormat::Png => {
                debug!(?format, error = %e, "Encoder rejected result image, writing PNG");
                (encode(image, ImageFormat::Png)?, ImageFormat::Png)
            }
            Err(e) => return Err(e),
        };

        std::fs::write(&path, bytes).map_err(|e| {
            AppError::Storage(format!("Failed to write result {}: {e}", path.display()))
        })?;
        debug!(path = %path.display(), ?format, "Saved result image");

        Ok(StoredImage {
            url: format!("{}/{RESULT_SUBDIR}/{filename}", self.url_prefix),
            filename,
            path,
        })
    }
}

fn encode(image: &RgbImage, format: ImageFormat) -> Result<Vec<u8>, AppError> {
    let mut buf = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buf), format)
        .map_err(|e| AppError::Storage(format!("Failed to encode result as {format:?}: {e}")))?;
    Ok(buf)
}

/// Random collision-free name, `<uuid hex>.<ext>`. Extensions that are not
/// short ASCII alphanumerics are dropped.
pub fn stored_filename(original_filename: &str) -> String {
    let id = Uuid::new_v4().simple().to_string();
    match safe_extension(original_filename) {
        Some(ext) => format!("{id}.{ext}"),
        None => id,
    }
}

fn safe_extension(filename: &str) -> Option<&str> {
    // Browsers may send a full client path
    let name = filename
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or(filename);
    let (stem, ext) = name.rsplit_once('.')?;
    let valid = !stem.is_empty()
        && !ext.is_empty()
        && ext.len() <= MAX_EXTENSION_LEN
        && ext.chars().all(|c| c.is_ascii_alphanumeric());
    valid.then_some(ext)
}
