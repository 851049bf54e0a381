//! Scalar pixel math over normalized floats.
//!
//! All compositing happens on 0–1 floats; these are the conversions and the
//! HSL-space operators the non-separable blend modes are built from.

/// Luminosity weights for the red, green and blue channels.
const LUMA: [f32; 3] = [0.30, 0.59, 0.11];

#[inline(always)]
pub(crate) fn to_float(byte: u8) -> f32 {
    byte as f32 / 255.0
}

/// Scale back to a byte, rounding half-to-even before the cast. Rounding
/// before casting avoids 1-ULP errors on pure colors.
#[inline(always)]
pub(crate) fn to_byte(value: f32) -> u8 {
    (value * 255.0).round_ties_even().clamp(0.0, 255.0) as u8
}

#[inline(always)]
pub(crate) fn clamp01(value: f32) -> f32 {
    value.clamp(0.0, 1.0)
}

#[allow(dead_code)]
pub(crate) fn premultiply(rgba: [f32; 4]) -> [f32; 4] {
    let [r, g, b, a] = rgba;
    [r * a, g * a, b * a, a]
}

/// Invert a premultiply. A fully transparent pixel yields zeros, not NaN.
pub(crate) fn unpremultiply(rgba: [f32; 4]) -> [f32; 4] {
    let [r, g, b, a] = rgba;
    if a == 0.0 {
        [0.0, 0.0, 0.0, 0.0]
    } else {
        [r / a, g / a, b / a, a]
    }
}

#[inline(always)]
pub(crate) fn luminosity(rgb: [f32; 3]) -> f32 {
    rgb[0] * LUMA[0] + rgb[1] * LUMA[1] + rgb[2] * LUMA[2]
}

#[inline(always)]
pub(crate) fn saturation(rgb: [f32; 3]) -> f32 {
    max3(rgb) - min3(rgb)
}

/// Pull a color whose channels may lie outside 0–1 back into range, toward
/// its luminosity.
pub(crate) fn clip_color(rgb: [f32; 3]) -> [f32; 3] {
    let l = luminosity(rgb);
    let n = min3(rgb);
    let x = max3(rgb);

    if n < 0.0 {
        rgb.map(|c| l + ((c - l) * l) / (l - n))
    } else if x > 1.0 {
        rgb.map(|c| l + ((c - l) * (1.0 - l)) / (x - l))
    } else {
        rgb
    }
}

/// Shift a color to the target luminosity, clipping back into range.
pub(crate) fn set_luminosity(rgb: [f32; 3], target: f32) -> [f32; 3] {
    let d = target - luminosity(rgb);
    clip_color(rgb.map(|c| c + d))
}

/// Rescale a color to the target saturation, keeping the per-channel
/// ordering: the minimum channel maps to 0, the maximum to `target`, and the
/// middle channel keeps its relative position. A gray input stays all-zero.
pub(crate) fn set_saturation(rgb: [f32; 3], target: f32) -> [f32; 3] {
    let x = max3(rgb);
    let n = min3(rgb);

    if x <= n {
        return [0.0, 0.0, 0.0];
    }

    rgb.map(|c| {
        if c == x {
            target
        } else if c == n {
            0.0
        } else {
            (c - n) * target / (x - n)
        }
    })
}

#[inline(always)]
fn max3(rgb: [f32; 3]) -> f32 {
    rgb[0].max(rgb[1]).max(rgb[2])
}

#[inline(always)]
fn min3(rgb: [f32; 3]) -> f32 {
    rgb[0].min(rgb[1]).min(rgb[2])
}
