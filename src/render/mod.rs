//! The tree renderer: flattens the parsed layer forest into one RGBA canvas.

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use crate::blend_mode::BlendMode;
use crate::error::PsdError;
use crate::render::compositing::composite_over;
use crate::render::screen_space::{layer_to_screen_space, mask_to_screen_space};
use crate::sections::file_header_section::ColorMode;
use crate::Psd;

pub(crate) mod blend_modes;
pub(crate) mod compositing;
pub(crate) mod pixels;
pub(crate) mod screen_space;

/// Dissolve draws from an RNG reseeded with this at the start of every
/// render, so repeated renders of the same document are byte-identical.
const DISSOLVE_SEED: u64 = 0x70736466_6c617400;

/// Flatten the whole document into an (height × width × 4) RGBA raster.
///
/// Children composite bottom-up onto the running background. A group whose
/// blend mode is pass-through flattens its children straight onto the
/// caller's background; any other group flattens onto a fresh transparent
/// canvas and the result is composited with the group's blend mode, opacity
/// and mask. Hidden layers and bounding section dividers contribute nothing.
pub(crate) fn flatten(psd: &Psd) -> Result<Vec<u8>, PsdError> {
    match psd.color_mode() {
        ColorMode::Indexed | ColorMode::Multichannel | ColorMode::Duotone => {
            return Err(PsdError::UnsupportedColorMode {
                color_mode: psd.color_mode(),
            });
        }
        _ => {}
    }

    info!(
        width = psd.width(),
        height = psd.height(),
        layers = psd.layers().len(),
        "flattening document"
    );

    let mut rng = StdRng::seed_from_u64(DISSOLVE_SEED);
    let canvas = transparent_canvas(psd);

    flatten_children(psd, psd.top_level(), canvas, &mut rng)
}

fn flatten_children(
    psd: &Psd,
    children: &[usize],
    background: Vec<u8>,
    rng: &mut StdRng,
) -> Result<Vec<u8>, PsdError> {
    let mut background = background;

    // `children` is visually top-down; composite bottom-up.
    for &idx in children.iter().rev() {
        let layer = &psd.layers()[idx];

        if !layer.visible() || layer.is_bounding_section_divider() {
            continue;
        }

        let opacity = layer.opacity() as f32 / 255.0;

        if layer.is_group() {
            if layer.blend_mode() == BlendMode::PassThrough {
                // Pass-through groups merge into the enclosing stack: their
                // children see and replace the caller's background.
                debug!(group = layer.name(), "flattening pass-through group");
                background = flatten_children(psd, layer.children(), background, rng)?;
            } else {
                debug!(group = layer.name(), "flattening isolated group");
                let flattened =
                    flatten_children(psd, layer.children(), transparent_canvas(psd), rng)?;
                let mask = screen_space_mask(psd, layer)?;

                background = composite_over(
                    layer.blend_mode(),
                    &flattened,
                    &background,
                    mask.as_deref(),
                    opacity,
                    rng,
                );
            }
        } else {
            let fg = layer_to_screen_space(layer, psd.width(), psd.height())?;
            let mask = screen_space_mask(psd, layer)?;

            background = composite_over(
                layer.blend_mode(),
                &fg,
                &background,
                mask.as_deref(),
                opacity,
                rng,
            );
        }
    }

    Ok(background)
}

fn screen_space_mask(psd: &Psd, layer: &crate::Layer) -> Result<Option<Vec<u8>>, PsdError> {
    match layer.mask() {
        Some(_) => Ok(Some(mask_to_screen_space(
            layer,
            psd.width(),
            psd.height(),
        )?)),
        None => Ok(None),
    }
}

fn transparent_canvas(psd: &Psd) -> Vec<u8> {
    vec![0; (psd.width() * psd.height() * 4) as usize]
}

/// The merged image from the file's final section, repacked for an image
/// writer: (data, channels per pixel).
///
/// Grayscale maps to a single luma channel and RGB to 3, or 4 when the
/// document carries an alpha channel. Every other color mode is unsupported
/// by the renderer.
pub(crate) fn merged_image(psd: &Psd) -> Result<(Vec<u8>, u8), PsdError> {
    let stored = psd.channel_count() as usize;

    let keep = match psd.color_mode() {
        ColorMode::Grayscale => 1usize,
        ColorMode::Rgb if stored >= 4 => 4,
        ColorMode::Rgb if stored == 3 => 3,
        _ => {
            return Err(PsdError::UnsupportedColorMode {
                color_mode: psd.color_mode(),
            });
        }
    };

    let data = psd.merged_image_data();
    if keep == stored {
        return Ok((data.to_vec(), keep as u8));
    }

    let pixel_count = (psd.width() * psd.height()) as usize;
    let mut repacked = Vec::with_capacity(pixel_count * keep);
    for pixel in 0..pixel_count {
        repacked.extend_from_slice(&data[pixel * stored..pixel * stored + keep]);
    }

    Ok((repacked, keep as u8))
}
