//! I/O helpers for cost images, layout visualisations and JSON reports.
//!
//! - `load_grayscale_f32`: read a PNG/JPEG/etc. into an `ImageF32` in [0, 1].
//! - `save_grayscale_f32`: write an `ImageF32` to a grayscale PNG.
//! - `save_depth_png`: write a depth buffer rescaled to its finite range.
//! - `save_label_png`: write an orientation label map as a colour PNG.
//! - `write_json_file`: pretty-print a serializable value to disk.
use super::{ImageF32, ImageView, LabelMap};
use image::{GrayImage, Luma, Rgb, RgbImage};
use serde::Serialize;
use std::fs;
use std::path::Path;

const LABEL_COLORS: [[u8; 3]; 3] = [[220, 60, 60], [60, 170, 60], [70, 90, 220]];

/// Load an image from disk as 8-bit grayscale and scale it to [0, 1].
pub fn load_grayscale_f32(path: &Path) -> Result<ImageF32, String> {
    let img = image::open(path)
        .map_err(|e| format!("Failed to open {}: {e}", path.display()))?
        .into_luma8();
    let width = img.width() as usize;
    let height = img.height() as usize;
    let data = img
        .into_raw()
        .into_iter()
        .map(|px| px as f32 / 255.0)
        .collect();
    ImageF32::from_vec(width, height, data)
        .ok_or_else(|| format!("Unexpected buffer size in {}", path.display()))
}

/// Save a float image to a grayscale PNG, clamping values in [0, 255].
pub fn save_grayscale_f32(image: &ImageF32, path: &Path) -> Result<(), String> {
    ensure_parent_dir(path)?;
    let mut out = GrayImage::new(image.w as u32, image.h as u32);
    for (y, row) in image.rows().enumerate() {
        for (x, &px) in row.iter().enumerate() {
            let v = (px * 255.0).clamp(0.0, 255.0);
            out.put_pixel(x as u32, y as u32, Luma([v as u8]));
        }
    }
    out.save(path)
        .map_err(|e| format!("Failed to save {}: {e}", path.display()))
}

/// Save a depth buffer, mapping the finite depth range to [0, 1]. Non-finite
/// pixels are written black.
pub fn save_depth_png(depth: &ImageF32, path: &Path) -> Result<(), String> {
    let (lo, hi) = depth
        .data
        .iter()
        .filter(|v| v.is_finite())
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let span = if hi > lo { hi - lo } else { 1.0 };
    let mut scaled = ImageF32::new(depth.w, depth.h);
    for (dst, &src) in scaled.data.iter_mut().zip(depth.data.iter()) {
        *dst = if src.is_finite() { (src - lo) / span } else { 0.0 };
    }
    save_grayscale_f32(&scaled, path)
}

/// Save an orientation label map as a colour PNG (one colour per label).
pub fn save_label_png(labels: &LabelMap, path: &Path) -> Result<(), String> {
    ensure_parent_dir(path)?;
    let mut out = RgbImage::new(labels.w as u32, labels.h as u32);
    for (y, row) in labels.rows().enumerate() {
        for (x, &label) in row.iter().enumerate() {
            let color = LABEL_COLORS
                .get(label as usize)
                .copied()
                .unwrap_or([0, 0, 0]);
            out.put_pixel(x as u32, y as u32, Rgb(color));
        }
    }
    out.save(path)
        .map_err(|e| format!("Failed to save {}: {e}", path.display()))
}

/// Serialize a value as pretty JSON to `path`, creating parent directories.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<(), String> {
    ensure_parent_dir(path)?;
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Failed to serialize JSON for {}: {e}", path.display()))?;
    fs::write(path, json).map_err(|e| format!("Failed to write JSON {}: {e}", path.display()))
}

fn ensure_parent_dir(path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create {}: {e}", parent.display()))?;
        }
    }
    Ok(())
}
