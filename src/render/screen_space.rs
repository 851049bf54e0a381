//! Crop/pad a layer's bounded raster into canvas coordinates.
//!
//! Layers carry their own rect; compositing needs canvas-sized rasters. The
//! transform crops away anything outside the canvas and pads the remainder
//! with a fill value (0 for color rasters, the mask's default color for
//! masks) so the output is always exactly (canvas_h × canvas_w).

use crate::error::PsdError;
use crate::psd_channel::ChannelKind;
use crate::rect::Rect;
use crate::sections::layer_and_mask_information_section::layer::Layer;

/// A layer's RGBA raster in screen space.
pub(crate) fn layer_to_screen_space(
    layer: &Layer,
    canvas_width: u32,
    canvas_height: u32,
) -> Result<Vec<u8>, PsdError> {
    let rgba = if layer.width() == 0 || layer.height() == 0 {
        vec![]
    } else {
        layer.rgba()?
    };

    Ok(to_screen_space(
        &rgba,
        4,
        layer.rect(),
        canvas_width,
        canvas_height,
        0,
    ))
}

/// A layer's mask in screen space: a single-channel plane filled with the
/// mask's default color outside its rect.
pub(crate) fn mask_to_screen_space(
    layer: &Layer,
    canvas_width: u32,
    canvas_height: u32,
) -> Result<Vec<u8>, PsdError> {
    let mask = layer.mask().ok_or_else(|| PsdError::MaskMissing {
        layer: layer.name().to_string(),
    })?;

    let data = layer
        .channel(ChannelKind::UserSuppliedLayerMask)
        .map(|channel| channel.data())
        .unwrap_or(&[]);

    // A mask whose raster never made it into the file is all default color.
    let expected = (mask.rect().width() * mask.rect().height()) as usize;
    let rect = if data.len() == expected {
        mask.rect()
    } else {
        Rect::default()
    };

    Ok(to_screen_space(
        data,
        1,
        rect,
        canvas_width,
        canvas_height,
        mask.default_color(),
    ))
}

/// Crop `data` (a rect-sized raster with `channels` bytes per pixel) to the
/// canvas bounding box and pad with `fill` out to canvas dimensions.
///
/// Crop coordinates are clamped into the raster; the pad widths then make up
/// whatever the crop removed, so the output size is invariant even for rects
/// entirely off canvas.
fn to_screen_space(
    data: &[u8],
    channels: usize,
    rect: Rect,
    canvas_width: u32,
    canvas_height: u32,
    fill: u8,
) -> Vec<u8> {
    let canvas_width = canvas_width as usize;
    let canvas_height = canvas_height as usize;
    let raster_width = rect.width() as i32;
    let raster_height = rect.height() as i32;

    // The crop region, in raster coordinates.
    let crop_left = (-rect.left).clamp(0, raster_width) as usize;
    let crop_right = (canvas_width as i32 - rect.left).clamp(0, raster_width) as usize;
    let crop_top = (-rect.top).clamp(0, raster_height) as usize;
    let crop_bottom = (canvas_height as i32 - rect.top).clamp(0, raster_height) as usize;

    let crop_width = crop_right.saturating_sub(crop_left);
    let crop_height = crop_bottom.saturating_sub(crop_top);

    // Where the cropped region lands on the canvas.
    let pad_left = rect.left.max(0).min(canvas_width as i32) as usize;
    let pad_top = rect.top.max(0).min(canvas_height as i32) as usize;

    let mut out = vec![fill; canvas_height * canvas_width * channels];

    for row in 0..crop_height {
        let src_start = ((crop_top + row) * raster_width as usize + crop_left) * channels;
        let src_end = src_start + crop_width * channels;

        let dst_start = ((pad_top + row) * canvas_width + pad_left) * channels;
        let dst_end = dst_start + crop_width * channels;

        out[dst_start..dst_end].copy_from_slice(&data[src_start..src_end]);
    }

    out
}
