use eframe::egui::ColorImage;
use image::imageops::FilterType;

use crate::error::AppError;

/// Size the thumbnail is scaled to for the preview panel
pub const THUMBNAIL_SIZE: (u32, u32) = (200, 120);

/// Downloads and decodes a video thumbnail. Blocking; run it off the UI thread.
pub fn fetch_thumbnail(url: &str) -> Result<ColorImage, AppError> {
    // Perform a blocking HTTP GET request
    let bytes = reqwest::blocking::get(url)
        .and_then(|resp| resp.error_for_status())
        .and_then(|resp| resp.bytes())
        .map_err(|e| AppError::Thumbnail(e.to_string()))?;
    decode_thumbnail(&bytes)
}

/// Decodes image bytes into a preview-sized RGBA image for egui
pub fn decode_thumbnail(bytes: &[u8]) -> Result<ColorImage, AppError> {
    let (w, h) = THUMBNAIL_SIZE;
    let img = image::load_from_memory(bytes)
        .map_err(|e| AppError::Thumbnail(e.to_string()))?
        .resize_exact(w, h, FilterType::Lanczos3)
        .to_rgba8();
    let size = [img.width() as usize, img.height() as usize];
    // Create a ColorImage from the raw RGBA bytes without premultiplying alpha
    Ok(ColorImage::from_rgba_unmultiplied(size, img.as_raw()))
}
