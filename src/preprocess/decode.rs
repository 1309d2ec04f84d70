//! Image decoding for uploaded files.

use image::RgbImage;

/// Decode image bytes into an RGB buffer. The format is sniffed from the
/// content, not from the upload's filename.
pub fn decode_image(data: &[u8]) -> Result<RgbImage, String> {
    if data.is_empty() {
        return Err("Image decode: empty file".to_string());
    }

    let img = image::load_from_memory(data).map_err(|e| format!("Image decode: {e}"))?;
    Ok(img.to_rgb8())
}
