use serde::Serialize;

use crate::error::PsdError;

/// A layer or group blend mode.
///
/// The set is closed: these are the 4-byte keys Photoshop writes into layer
/// records and section dividers. Keys are compared as ASCII including
/// trailing spaces (`"mul "`, `"hue "`, `"sat "`, `"lum "`, `"div "`).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize)]
#[allow(missing_docs)]
pub enum BlendMode {
    PassThrough,
    Normal,
    Dissolve,
    Darken,
    Multiply,
    ColorBurn,
    LinearBurn,
    DarkerColor,
    Lighten,
    Screen,
    ColorDodge,
    LinearDodge,
    LighterColor,
    Overlay,
    SoftLight,
    HardLight,
    VividLight,
    LinearLight,
    PinLight,
    HardMix,
    Difference,
    Exclusion,
    Subtract,
    Divide,
    Hue,
    Saturation,
    Color,
    Luminosity,
}

impl BlendMode {
    /// Look a blend mode up by its 4-byte wire key.
    pub fn from_key(key: [u8; 4]) -> Result<BlendMode, PsdError> {
        match &key {
            b"pass" => Ok(BlendMode::PassThrough),
            b"norm" => Ok(BlendMode::Normal),
            b"diss" => Ok(BlendMode::Dissolve),
            b"dark" => Ok(BlendMode::Darken),
            b"mul " => Ok(BlendMode::Multiply),
            b"idiv" => Ok(BlendMode::ColorBurn),
            b"lbrn" => Ok(BlendMode::LinearBurn),
            b"dkCl" => Ok(BlendMode::DarkerColor),
            b"lite" => Ok(BlendMode::Lighten),
            b"scrn" => Ok(BlendMode::Screen),
            b"div " => Ok(BlendMode::ColorDodge),
            b"lddg" => Ok(BlendMode::LinearDodge),
            b"lgCl" => Ok(BlendMode::LighterColor),
            b"over" => Ok(BlendMode::Overlay),
            b"sLit" => Ok(BlendMode::SoftLight),
            b"hLit" => Ok(BlendMode::HardLight),
            b"vLit" => Ok(BlendMode::VividLight),
            b"lLit" => Ok(BlendMode::LinearLight),
            b"pLit" => Ok(BlendMode::PinLight),
            b"hMix" => Ok(BlendMode::HardMix),
            b"diff" => Ok(BlendMode::Difference),
            b"smud" => Ok(BlendMode::Exclusion),
            b"fsub" => Ok(BlendMode::Subtract),
            b"fdiv" => Ok(BlendMode::Divide),
            b"hue " => Ok(BlendMode::Hue),
            b"sat " => Ok(BlendMode::Saturation),
            b"colr" => Ok(BlendMode::Color),
            b"lum " => Ok(BlendMode::Luminosity),
            _ => Err(PsdError::UnknownBlendMode { key }),
        }
    }

    /// The 4-byte wire key for this blend mode.
    pub fn key(&self) -> &'static [u8; 4] {
        match self {
            BlendMode::PassThrough => b"pass",
            BlendMode::Normal => b"norm",
            BlendMode::Dissolve => b"diss",
            BlendMode::Darken => b"dark",
            BlendMode::Multiply => b"mul ",
            BlendMode::ColorBurn => b"idiv",
            BlendMode::LinearBurn => b"lbrn",
            BlendMode::DarkerColor => b"dkCl",
            BlendMode::Lighten => b"lite",
            BlendMode::Screen => b"scrn",
            BlendMode::ColorDodge => b"div ",
            BlendMode::LinearDodge => b"lddg",
            BlendMode::LighterColor => b"lgCl",
            BlendMode::Overlay => b"over",
            BlendMode::SoftLight => b"sLit",
            BlendMode::HardLight => b"hLit",
            BlendMode::VividLight => b"vLit",
            BlendMode::LinearLight => b"lLit",
            BlendMode::PinLight => b"pLit",
            BlendMode::HardMix => b"hMix",
            BlendMode::Difference => b"diff",
            BlendMode::Exclusion => b"smud",
            BlendMode::Subtract => b"fsub",
            BlendMode::Divide => b"fdiv",
            BlendMode::Hue => b"hue ",
            BlendMode::Saturation => b"sat ",
            BlendMode::Color => b"colr",
            BlendMode::Luminosity => b"lum ",
        }
    }

    /// The human name Photoshop shows for this blend mode.
    pub fn name(&self) -> &'static str {
        match self {
            BlendMode::PassThrough => "pass through",
            BlendMode::Normal => "normal",
            BlendMode::Dissolve => "dissolve",
            BlendMode::Darken => "darken",
            BlendMode::Multiply => "multiply",
            BlendMode::ColorBurn => "color burn",
            BlendMode::LinearBurn => "linear burn",
            BlendMode::DarkerColor => "darker color",
            BlendMode::Lighten => "lighten",
            BlendMode::Screen => "screen",
            BlendMode::ColorDodge => "color dodge",
            BlendMode::LinearDodge => "linear dodge",
            BlendMode::LighterColor => "lighter color",
            BlendMode::Overlay => "overlay",
            BlendMode::SoftLight => "soft light",
            BlendMode::HardLight => "hard light",
            BlendMode::VividLight => "vivid light",
            BlendMode::LinearLight => "linear light",
            BlendMode::PinLight => "pin light",
            BlendMode::HardMix => "hard mix",
            BlendMode::Difference => "difference",
            BlendMode::Exclusion => "exclusion",
            BlendMode::Subtract => "subtract",
            BlendMode::Divide => "divide",
            BlendMode::Hue => "hue",
            BlendMode::Saturation => "saturation",
            BlendMode::Color => "color",
            BlendMode::Luminosity => "luminosity",
        }
    }

    /// All blend modes, ordered like the Photoshop UI.
    pub const ALL: [BlendMode; 28] = [
        BlendMode::PassThrough,
        BlendMode::Normal,
        BlendMode::Dissolve,
        BlendMode::Darken,
        BlendMode::Multiply,
        BlendMode::ColorBurn,
        BlendMode::LinearBurn,
        BlendMode::DarkerColor,
        BlendMode::Lighten,
        BlendMode::Screen,
        BlendMode::ColorDodge,
        BlendMode::LinearDodge,
        BlendMode::LighterColor,
        BlendMode::Overlay,
        BlendMode::SoftLight,
        BlendMode::HardLight,
        BlendMode::VividLight,
        BlendMode::LinearLight,
        BlendMode::PinLight,
        BlendMode::HardMix,
        BlendMode::Difference,
        BlendMode::Exclusion,
        BlendMode::Subtract,
        BlendMode::Divide,
        BlendMode::Hue,
        BlendMode::Saturation,
        BlendMode::Color,
        BlendMode::Luminosity,
    ];
}
