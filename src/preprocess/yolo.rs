//! YOLO letterbox preprocessing.
//!
//! 1. scale = min(size/h, size/w).min(1.0) (no upscale)
//! 2. new_w = round(w * scale), new_h = round(h * scale)
//! 3. Resize with bilinear interpolation
//! 4. Center padding with value 114, Ultralytics rounding for the split
//! 5. Normalize /255.0, HWC -> CHW

use crate::error::AppError;
use fast_image_resize as fr;
use image::RgbImage;

const PAD_VALUE: u8 = 114;

pub struct LetterboxResult {
    /// CHW tensor, FP32, normalized [0,1], shape [3, size, size]
    pub tensor: Vec<f32>,
    pub input_size: u32,
    pub scale: f64,
    pub pad_w: f64,
    pub pad_h: f64,
    pub orig_w: u32,
    pub orig_h: u32,
}

pub fn letterbox(img: &RgbImage, target_size: u32) -> Result<LetterboxResult, AppError> {
    let (orig_w, orig_h) = img.dimensions();
    if orig_w == 0 || orig_h == 0 {
        return Err(AppError::ImageDecode("Image has no pixels".to_string()));
    }
    let target = target_size as f64;

    let scale = (target / orig_h as f64).min(target / orig_w as f64).min(1.0);

    let new_w = ((orig_w as f64 * scale).round() as u32).max(1);
    let new_h = ((orig_h as f64 * scale).round() as u32).max(1);

    let resized = if new_w != orig_w || new_h != orig_h {
        resize_bilinear(img.as_raw(), orig_w, orig_h, new_w, new_h)?
    } else {
        img.as_raw().clone()
    };

    let pad_w = (target - new_w as f64) / 2.0;
    let pad_h = (target - new_h as f64) / 2.0;
    let top = (pad_h - 0.1).round().max(0.0) as u32;
    let bottom = (pad_h + 0.1).round().max(0.0) as u32;
    let left = (pad_w - 0.1).round().max(0.0) as u32;
    let right = (pad_w + 0.1).round().max(0.0) as u32;

    let padded_w = (left + new_w + right) as usize;
    let padded_h = (top + new_h + bottom) as usize;

    let mut padded = vec![PAD_VALUE; padded_h * padded_w * 3];

    let row_bytes = new_w as usize * 3;
    for y in 0..new_h as usize {
        let src_offset = y * row_bytes;
        let dst_offset = ((y + top as usize) * padded_w + left as usize) * 3;
        padded[dst_offset..dst_offset + row_bytes]
            .copy_from_slice(&resized[src_offset..src_offset + row_bytes]);
    }

    // Rounding may leave the canvas one pixel off the target size
    let final_data = if padded_w != target_size as usize || padded_h != target_size as usize {
        resize_bilinear(&padded, padded_w as u32, padded_h as u32, target_size, target_size)?
    } else {
        padded
    };

    let ts = target_size as usize;
    let plane = ts * ts;
    let mut tensor = vec![0.0f32; 3 * plane];

    for (idx, px) in final_data.chunks_exact(3).enumerate() {
        tensor[idx] = px[0] as f32 / 255.0;
        tensor[plane + idx] = px[1] as f32 / 255.0;
        tensor[2 * plane + idx] = px[2] as f32 / 255.0;
    }

    Ok(LetterboxResult {
        tensor,
        input_size: target_size,
        scale,
        pad_w,
        pad_h,
        orig_w,
        orig_h,
    })
}

/// SIMD bilinear resize for packed RGB buffers.
fn resize_bilinear(
    src: &[u8],
    src_w: u32,
    src_h: u32,
    dst_w: u32,
    dst_h: u32,
) -> Result<Vec<u8>, AppError> {
    let src_image = fr::images::Image::from_vec_u8(src_w, src_h, src.to_vec(), fr::PixelType::U8x3)
        .map_err(|e| AppError::Internal(format!("Resize source buffer: {e}")))?;

    let mut dst_image = fr::images::Image::new(dst_w, dst_h, fr::PixelType::U8x3);

    let mut resizer = fr::Resizer::new();
    resizer
        .resize(
            &src_image,
            &mut dst_image,
            &fr::ResizeOptions::new()
                .resize_alg(fr::ResizeAlg::Interpolation(fr::FilterType::Bilinear)),
        )
        .map_err(|e| AppError::Internal(format!("Resize failed: {e}")))?;

    Ok(dst_image.into_vec())
}
