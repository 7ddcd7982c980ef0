//! Watermark sizing, placement and blending.
//!
//! Everything in here is pure: images in, new images out, no I/O. The batch
//! scheduler, the preview command and any headless caller all go through
//! [`render`], so the sizing rules cannot drift between call sites.

use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, RgbaImage};

use crate::config::{Anchor, HAlign, ProcessingConfig, VAlign};

/// Smallest watermark width the sizing heuristic will ask for.
pub const MIN_TARGET_WIDTH: u32 = 40;

/// Smallest watermark width [`composite`] will scale down to, whatever the caller asked for.
pub const MIN_COMPOSITE_WIDTH: u32 = 30;

/// Portrait images get a larger mark in manual mode so it does not look lost.
const PORTRAIT_BOOST: f64 = 1.5;

/// Fraction of the width used for portrait images in auto mode.
const AUTO_PORTRAIT_FRACTION: f64 = 0.5;

/// Shrink `image` so its longer side is at most `max_dimension`.
///
/// Returns a copy when no shrinking is needed. The shorter side is truncated,
/// never rounded up, so the aspect ratio stays within one pixel of the source.
pub fn resize_to_fit(image: &DynamicImage, max_dimension: u32) -> DynamicImage {
    let (width, height) = image.dimensions();
    if width.max(height) <= max_dimension || max_dimension == 0 {
        return image.clone();
    }

    let (new_width, new_height) = if width >= height {
        let h = (max_dimension as u64 * height as u64 / width as u64) as u32;
        (max_dimension, h.max(1))
    } else {
        let w = (max_dimension as u64 * width as u64 / height as u64) as u32;
        (w.max(1), max_dimension)
    };

    image.resize_exact(new_width, new_height, FilterType::Lanczos3)
}

/// Watermark width for a base image of the given size.
///
/// Portrait means strictly taller than wide; squares are landscape.
///
/// | mode   | portrait                  | landscape                           |
/// |--------|---------------------------|-------------------------------------|
/// | auto   | `w * 0.5`                 | `min(w, h) * scale / 100`           |
/// | manual | `w * scale / 100 * 1.5`   | `w * scale / 100`                   |
///
/// Each result is rounded and floored at [`MIN_TARGET_WIDTH`].
pub fn target_watermark_width(
    base_width: u32,
    base_height: u32,
    scale_percent: u32,
    auto_scale: bool,
) -> u32 {
    let portrait = base_height > base_width;
    let width = base_width as f64;
    let scale = scale_percent as f64 / 100.0;

    let target = match (auto_scale, portrait) {
        (true, true) => width * AUTO_PORTRAIT_FRACTION,
        (true, false) => base_width.min(base_height) as f64 * scale,
        (false, true) => width * scale * PORTRAIT_BOOST,
        (false, false) => width * scale,
    };

    (target.round() as u32).max(MIN_TARGET_WIDTH)
}

/// Top-left offset of a `wm_width` x `wm_height` mark on the base image.
///
/// Margin only applies to the edges the anchor touches. Offsets can be
/// negative when the mark is larger than the free space.
pub fn anchor_offset(
    base_width: u32,
    base_height: u32,
    wm_width: u32,
    wm_height: u32,
    anchor: Anchor,
    margin: u32,
) -> (i64, i64) {
    let (bw, bh) = (base_width as i64, base_height as i64);
    let (ww, wh) = (wm_width as i64, wm_height as i64);
    let margin = margin as i64;

    let x = match anchor.horizontal() {
        HAlign::Left => margin,
        HAlign::Right => bw - ww - margin,
        HAlign::Center => (bw - ww).div_euclid(2),
    };
    let y = match anchor.vertical() {
        VAlign::Top => margin,
        VAlign::Bottom => bh - wh - margin,
        VAlign::Center => (bh - wh).div_euclid(2),
    };
    (x, y)
}

/// Multiply every alpha value by `opacity / 100`, truncating.
///
/// Opacity 100 (or more) leaves the buffer as is.
pub fn apply_opacity(watermark: &mut RgbaImage, opacity: u8) {
    if opacity >= 100 {
        return;
    }
    let factor = opacity as u32;
    for pixel in watermark.pixels_mut() {
        pixel[3] = (pixel[3] as u32 * factor / 100) as u8;
    }
}

/// Scale the watermark down to `target_width` (never up), keeping its aspect.
///
/// The shared watermark is only read; a new buffer is returned.
pub fn scale_watermark(watermark: &RgbaImage, target_width: u32) -> RgbaImage {
    let target_width = target_width.max(MIN_COMPOSITE_WIDTH);
    let (width, height) = watermark.dimensions();
    if width <= target_width {
        return watermark.clone();
    }
    let new_height = (height as u64 * target_width as u64 / width as u64).max(1) as u32;
    imageops::resize(watermark, target_width, new_height, FilterType::Lanczos3)
}

/// Blend `watermark` onto a copy of `base`.
///
/// The mark is scaled down to `target_width` (floored at
/// [`MIN_COMPOSITE_WIDTH`]), faded to `opacity` percent and placed at
/// `anchor`. The result keeps the base's alpha-ness: bases without an alpha
/// channel come back as RGB.
pub fn composite(
    base: &DynamicImage,
    watermark: &RgbaImage,
    anchor: Anchor,
    opacity: u8,
    margin: u32,
    target_width: u32,
) -> DynamicImage {
    let mut mark = scale_watermark(watermark, target_width);
    apply_opacity(&mut mark, opacity);

    let (base_width, base_height) = base.dimensions();
    let (x, y) = anchor_offset(
        base_width,
        base_height,
        mark.width(),
        mark.height(),
        anchor,
        margin,
    );

    let mut canvas = base.to_rgba8();
    imageops::overlay(&mut canvas, &mark, x, y);

    if base.color().has_alpha() {
        DynamicImage::ImageRgba8(canvas)
    } else {
        DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(canvas).to_rgb8())
    }
}

/// The full per-image transform: fit to `max_dimension`, size the mark from
/// the fitted image, and composite.
pub fn render(base: &DynamicImage, watermark: &RgbaImage, config: &ProcessingConfig) -> DynamicImage {
    let fitted = resize_to_fit(base, config.max_dimension);
    let (width, height) = fitted.dimensions();
    let target = target_watermark_width(width, height, config.scale_percent, config.auto_scale);
    composite(
        &fitted,
        watermark,
        config.anchor,
        config.opacity,
        config.margin,
        target,
    )
}
