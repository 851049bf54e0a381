//! Flatten tiny two-layer documents, one per blend mode branch worth
//! pinning down, and assert the exact output pixel.

mod common;

use anyhow::Result;
use common::{build_psd, TestLayer};
use flatpsd::Psd;

/// A 1x1 document: `bg` composited normally, then `fg` with `blend_key`.
fn blend_pixel(fg: [u8; 4], bg: [u8; 4], blend_key: [u8; 4]) -> Result<[u8; 4]> {
    let layers = vec![
        TestLayer::solid("bg", (0, 0, 1, 1), bg, *b"norm"),
        TestLayer::solid("fg", (0, 0, 1, 1), fg, blend_key),
    ];
    let psd = Psd::from_bytes(&build_psd(1, 1, 3, 3, &layers, None))?;

    let image = psd.flatten()?;
    Ok([image[0], image[1], image[2], image[3]])
}

#[test]
fn multiply_by_white_returns_the_background() -> Result<()> {
    let out = blend_pixel([255, 255, 255, 255], [64, 128, 191, 255], *b"mul ")?;
    assert_eq!(out, [64, 128, 191, 255]);
    Ok(())
}

#[test]
fn multiply() -> Result<()> {
    // 0.8 * 0.4 = 0.32 -> 81.6 -> 82
    let out = blend_pixel([204, 204, 204, 255], [102, 102, 102, 255], *b"mul ")?;
    assert_eq!(out, [82, 82, 82, 255]);
    Ok(())
}

#[test]
fn overlay_multiply_branch() -> Result<()> {
    // bg 0.4 < 0.5: 2 * 0.8 * 0.4 = 0.64 -> 163.2 -> 163
    let out = blend_pixel([204, 204, 204, 255], [102, 102, 102, 255], *b"over")?;
    assert_eq!(out, [163, 163, 163, 255]);
    Ok(())
}

#[test]
fn overlay_screen_branch() -> Result<()> {
    // bg 128/255 is the first byte value past the branch point:
    // 1 - 2 * 0.2 * (127/255) = 0.8008 -> 204
    let out = blend_pixel([204, 204, 204, 255], [128, 128, 128, 255], *b"over")?;
    assert_eq!(out, [204, 204, 204, 255]);
    Ok(())
}

#[test]
fn darken_and_lighten() -> Result<()> {
    assert_eq!(
        blend_pixel([10, 200, 30, 255], [90, 40, 30, 255], *b"dark")?,
        [10, 40, 30, 255]
    );
    assert_eq!(
        blend_pixel([10, 200, 30, 255], [90, 40, 30, 255], *b"lite")?,
        [90, 200, 30, 255]
    );
    Ok(())
}

#[test]
fn screen() -> Result<()> {
    // 1 - 0.6 * 0.6 = 0.64 -> 163
    let out = blend_pixel([102, 102, 102, 255], [102, 102, 102, 255], *b"scrn")?;
    assert_eq!(out, [163, 163, 163, 255]);
    Ok(())
}

#[test]
fn difference() -> Result<()> {
    let out = blend_pixel([200, 50, 0, 255], [50, 200, 0, 255], *b"diff")?;
    assert_eq!(out, [150, 150, 0, 255]);
    Ok(())
}

#[test]
fn linear_dodge_saturates() -> Result<()> {
    let out = blend_pixel([200, 200, 200, 255], [100, 100, 100, 255], *b"lddg")?;
    assert_eq!(out, [255, 255, 255, 255]);
    Ok(())
}

#[test]
fn subtract_clamps_at_zero() -> Result<()> {
    let out = blend_pixel([200, 10, 0, 255], [100, 250, 0, 255], *b"fsub")?;
    assert_eq!(out, [0, 240, 0, 255]);
    Ok(())
}

#[test]
fn color_keeps_foreground_chroma_at_background_luminosity() -> Result<()> {
    // Pure red recolored to the gray background's luminosity. The red
    // channel clips to white; green and blue land at
    // L - 0.3 * L' / 0.7 where L = 128/255.
    let out = blend_pixel([255, 0, 0, 255], [128, 128, 128, 255], *b"colr")?;
    assert_eq!(out, [255, 74, 74, 255]);
    Ok(())
}

#[test]
fn luminosity_takes_the_foreground_lightness() -> Result<()> {
    // Gray fg over gray bg: the result is just the foreground's gray.
    let out = blend_pixel([51, 51, 51, 255], [204, 204, 204, 255], *b"lum ")?;
    assert_eq!(out, [51, 51, 51, 255]);
    Ok(())
}

#[test]
fn hue_of_a_gray_foreground_desaturates() -> Result<()> {
    // A gray fg has zero saturation, so hue blending grays the background
    // at its own luminosity.
    let out = blend_pixel([100, 100, 100, 255], [255, 0, 0, 255], *b"hue ")?;

    // luminosity of pure red = 0.3 -> 76.5 -> 76
    assert_eq!(out, [76, 76, 76, 255]);
    Ok(())
}

#[test]
fn hard_mix_thresholds() -> Result<()> {
    assert_eq!(
        blend_pixel([178, 76, 128, 255], [102, 102, 0, 255], *b"hMix")?,
        [255, 0, 0, 255]
    );
    Ok(())
}

#[test]
fn every_blend_mode_renders() -> Result<()> {
    for key in [
        *b"norm", *b"diss", *b"dark", *b"mul ", *b"idiv", *b"lbrn", *b"dkCl", *b"lite", *b"scrn",
        *b"div ", *b"lddg", *b"lgCl", *b"over", *b"sLit", *b"hLit", *b"vLit", *b"lLit", *b"pLit",
        *b"hMix", *b"diff", *b"smud", *b"fsub", *b"fdiv", *b"hue ", *b"sat ", *b"colr", *b"lum ",
    ] {
        let out = blend_pixel([200, 100, 50, 255], [50, 100, 200, 255], key)?;
        assert_eq!(out[3], 255, "mode {:?} lost alpha", key);
    }
    Ok(())
}
