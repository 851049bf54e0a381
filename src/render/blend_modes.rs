//! The per-pixel blend kernels.
//!
//! Every kernel maps a normalized foreground and background color to the
//! "both covered" color used inside the over operator. Kernels are pure;
//! guarded branch ordering keeps the division-based modes away from their
//! degenerate inputs.

use crate::blend_mode::BlendMode;
use crate::render::pixels::{clamp01, luminosity, saturation, set_luminosity, set_saturation};

pub(crate) type BlendFn = fn([f32; 3], [f32; 3]) -> [f32; 3];

/// The kernel for a blend mode.
///
/// Pass-through is only meaningful at group level, where the renderer never
/// reaches a kernel; on a single layer it degrades to normal. Dissolve is
/// intercepted by the compositor before kernel dispatch since it is not a
/// per-channel function.
pub(crate) fn kernel(blend_mode: BlendMode) -> BlendFn {
    match blend_mode {
        BlendMode::PassThrough => normal,
        BlendMode::Normal => normal,
        BlendMode::Dissolve => normal,
        BlendMode::Darken => darken,
        BlendMode::Multiply => multiply,
        BlendMode::ColorBurn => color_burn,
        BlendMode::LinearBurn => linear_burn,
        BlendMode::DarkerColor => darker_color,
        BlendMode::Lighten => lighten,
        BlendMode::Screen => screen,
        BlendMode::ColorDodge => color_dodge,
        BlendMode::LinearDodge => linear_dodge,
        BlendMode::LighterColor => lighter_color,
        BlendMode::Overlay => overlay,
        BlendMode::SoftLight => soft_light,
        BlendMode::HardLight => hard_light,
        BlendMode::VividLight => vivid_light,
        BlendMode::LinearLight => linear_light,
        BlendMode::PinLight => pin_light,
        BlendMode::HardMix => hard_mix,
        BlendMode::Difference => difference,
        BlendMode::Exclusion => exclusion,
        BlendMode::Subtract => subtract,
        BlendMode::Divide => divide,
        BlendMode::Hue => hue,
        BlendMode::Saturation => saturation_mode,
        BlendMode::Color => color,
        BlendMode::Luminosity => luminosity_mode,
    }
}

#[inline(always)]
fn map2(fg: [f32; 3], bg: [f32; 3], f: fn(f32, f32) -> f32) -> [f32; 3] {
    [f(fg[0], bg[0]), f(fg[1], bg[1]), f(fg[2], bg[2])]
}

fn normal(fg: [f32; 3], _bg: [f32; 3]) -> [f32; 3] {
    fg
}

fn darken(fg: [f32; 3], bg: [f32; 3]) -> [f32; 3] {
    map2(fg, bg, |f, b| f.min(b))
}

fn multiply(fg: [f32; 3], bg: [f32; 3]) -> [f32; 3] {
    map2(fg, bg, |f, b| f * b)
}

/// White background stays white; black foreground burns to black.
fn color_burn(fg: [f32; 3], bg: [f32; 3]) -> [f32; 3] {
    map2(fg, bg, |f, b| {
        if b == 1.0 {
            b
        } else if f == 0.0 {
            f
        } else {
            1.0 - clamp01((1.0 - b) / f)
        }
    })
}

fn linear_burn(fg: [f32; 3], bg: [f32; 3]) -> [f32; 3] {
    map2(fg, bg, |f, b| if f + b < 1.0 { 0.0 } else { f + b - 1.0 })
}

/// Whole-color comparison, not per channel.
fn darker_color(fg: [f32; 3], bg: [f32; 3]) -> [f32; 3] {
    if luminosity(fg) < luminosity(bg) {
        fg
    } else {
        bg
    }
}

fn lighten(fg: [f32; 3], bg: [f32; 3]) -> [f32; 3] {
    map2(fg, bg, |f, b| f.max(b))
}

fn screen(fg: [f32; 3], bg: [f32; 3]) -> [f32; 3] {
    map2(fg, bg, |f, b| 1.0 - ((1.0 - b) * (1.0 - f)))
}

fn color_dodge(fg: [f32; 3], bg: [f32; 3]) -> [f32; 3] {
    map2(fg, bg, |f, b| {
        if b == 0.0 {
            0.0
        } else if f == 1.0 {
            1.0
        } else {
            clamp01(b / (1.0 - f))
        }
    })
}

fn linear_dodge(fg: [f32; 3], bg: [f32; 3]) -> [f32; 3] {
    map2(fg, bg, |f, b| clamp01(f + b))
}

/// Whole-color comparison, not per channel.
fn lighter_color(fg: [f32; 3], bg: [f32; 3]) -> [f32; 3] {
    if luminosity(fg) > luminosity(bg) {
        fg
    } else {
        bg
    }
}

/// Hard light with the roles reversed: the background picks the branch.
fn overlay(fg: [f32; 3], bg: [f32; 3]) -> [f32; 3] {
    map2(fg, bg, |f, b| {
        if b < 0.5 {
            2.0 * f * b
        } else {
            1.0 - 2.0 * ((1.0 - f) * (1.0 - b))
        }
    })
}

fn soft_light(fg: [f32; 3], bg: [f32; 3]) -> [f32; 3] {
    map2(fg, bg, |f, b| {
        if f <= 0.5 {
            b - (1.0 - 2.0 * f) * b * (1.0 - b)
        } else if b <= 0.25 {
            b + (2.0 * f - 1.0) * ((4.0 * b) * (4.0 * b + 1.0) * (b - 1.0) + 7.0 * b)
        } else {
            b + (2.0 * f - 1.0) * (b.sqrt() - b)
        }
    })
}

fn hard_light(fg: [f32; 3], bg: [f32; 3]) -> [f32; 3] {
    map2(fg, bg, |f, b| {
        if f <= 0.5 {
            2.0 * f * b
        } else {
            1.0 - 2.0 * ((1.0 - f) * (1.0 - b))
        }
    })
}

/// Color burn below the half point, color dodge above it, with the
/// foreground rescaled to cover each half range.
fn vivid_light(fg: [f32; 3], bg: [f32; 3]) -> [f32; 3] {
    map2(fg, bg, |f, b| {
        if f == 0.0 || f == 1.0 {
            f
        } else if f <= 0.5 {
            let burn_fg = clamp01(2.0 * f);
            clamp01(1.0 - clamp01((1.0 - b) / burn_fg))
        } else {
            let dodge_fg = clamp01(2.0 * (f - 0.5));
            clamp01(b / (1.0 - dodge_fg))
        }
    })
}

fn linear_light(fg: [f32; 3], bg: [f32; 3]) -> [f32; 3] {
    map2(fg, bg, |f, b| {
        if f <= 0.5 {
            clamp01(clamp01(2.0 * f) + b - 1.0)
        } else {
            clamp01(clamp01(2.0 * (f - 0.5)) + b)
        }
    })
}

fn pin_light(fg: [f32; 3], bg: [f32; 3]) -> [f32; 3] {
    map2(fg, bg, |f, b| {
        if f <= 0.5 {
            clamp01(clamp01(2.0 * f).min(b))
        } else {
            clamp01(clamp01(2.0 * (f - 0.5)).max(b))
        }
    })
}

/// Compared at 3-decimal rounding. This yields occasional false positives
/// that Photoshop would otherwise ignore.
fn hard_mix(fg: [f32; 3], bg: [f32; 3]) -> [f32; 3] {
    map2(fg, bg, |f, b| {
        if b == 0.0 {
            0.0
        } else if round3(f) + round3(b) >= 1.0 {
            1.0
        } else {
            0.0
        }
    })
}

#[inline(always)]
fn round3(value: f32) -> f32 {
    (value * 1000.0).round_ties_even() / 1000.0
}

fn difference(fg: [f32; 3], bg: [f32; 3]) -> [f32; 3] {
    map2(fg, bg, |f, b| (f - b).abs())
}

fn exclusion(fg: [f32; 3], bg: [f32; 3]) -> [f32; 3] {
    map2(fg, bg, |f, b| clamp01((f + b) - (2.0 * f * b)))
}

fn subtract(fg: [f32; 3], bg: [f32; 3]) -> [f32; 3] {
    map2(fg, bg, |f, b| clamp01(b - f))
}

fn divide(fg: [f32; 3], bg: [f32; 3]) -> [f32; 3] {
    map2(fg, bg, |f, b| {
        if b == 0.0 {
            0.0
        } else if f == 0.0 {
            1.0
        } else {
            clamp01(b / f)
        }
    })
}

fn hue(fg: [f32; 3], bg: [f32; 3]) -> [f32; 3] {
    set_luminosity(set_saturation(fg, saturation(bg)), luminosity(bg))
}

fn saturation_mode(fg: [f32; 3], bg: [f32; 3]) -> [f32; 3] {
    set_luminosity(set_saturation(bg, saturation(fg)), luminosity(bg))
}

fn color(fg: [f32; 3], bg: [f32; 3]) -> [f32; 3] {
    set_luminosity(fg, luminosity(bg))
}

fn luminosity_mode(fg: [f32; 3], bg: [f32; 3]) -> [f32; 3] {
    set_luminosity(bg, luminosity(fg))
}
