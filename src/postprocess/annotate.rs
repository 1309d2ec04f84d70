//! Bounding box and label drawing on the result image.

use crate::detector::BoundingBox;
use ab_glyph::{FontArc, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use std::path::Path;
use tracing::{info, warn};

const BOX_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const BOX_THICKNESS: i32 = 2;
const LABEL_FONT_SIZE: f32 = 18.0;
/// Gap between the label baseline and the top edge of the box.
const LABEL_OFFSET: i32 = 5;

pub struct Annotator {
    font: Option<FontArc>,
    scale: PxScale,
    color: Rgb<u8>,
    thickness: i32,
}

impl Annotator {
    pub fn new(font: Option<FontArc>) -> Self {
        Self {
            font,
            scale: PxScale::from(LABEL_FONT_SIZE),
            color: BOX_COLOR,
            thickness: BOX_THICKNESS,
        }
    }

    /// Load the label font. A missing or invalid font is not fatal: boxes are
    /// still drawn, only the text is skipped.
    pub fn from_font_file(path: Option<&Path>) -> Self {
        let font = path.and_then(|path| {
            let data = match std::fs::read(path) {
                Ok(data) => data,
                Err(e) => {
                    warn!("Label font {} unavailable ({e}), drawing boxes only", path.display());
                    return None;
                }
            };
            match FontArc::try_from_vec(data) {
                Ok(font) => {
                    info!("Loaded label font {}", path.display());
                    Some(font)
                }
                Err(e) => {
                    warn!("Label font {} is invalid ({e}), drawing boxes only", path.display());
                    None
                }
            }
        });
        Self::new(font)
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Draw the box outline and, above it, the label text.
    pub fn draw_detection(&self, image: &mut RgbImage, bbox: &BoundingBox, text: &str) {
        // Outline grows inward, one pixel per thickness step
        for t in 0..self.thickness {
            let width = bbox.x2 - bbox.x1 + 1 - 2 * t;
            let height = bbox.y2 - bbox.y1 + 1 - 2 * t;
            if width <= 0 || height <= 0 {
                break;
            }
            let rect = Rect::at(bbox.x1 + t, bbox.y1 + t).of_size(width as u32, height as u32);
            draw_hollow_rect_mut(image, rect, self.color);
        }

        if let Some(font) = &self.font {
            let (_, text_height) = text_size(self.scale, font, text);
            let x = bbox.x1.max(0);
            let y = (bbox.y1 - LABEL_OFFSET - text_height as i32).max(0);
            draw_text_mut(image, self.color, x, y, self.scale, font, text);
        }
    }
}
