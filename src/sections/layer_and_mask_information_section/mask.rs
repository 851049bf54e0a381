use serde::Serialize;

use crate::error::PsdError;
use crate::rect::Rect;
use crate::sections::PsdCursor;

const FLAG_POSITION_RELATIVE: u8 = 1 << 0;
const FLAG_MASK_DISABLED: u8 = 1 << 1;
const FLAG_INVERT_WHEN_BLENDING: u8 = 1 << 2;
/// The user mask actually came from rendering other data
const FLAG_MASK_FROM_RENDERING: u8 = 1 << 3;
/// The user and/or vector masks have parameters applied to them
const FLAG_PARAMETERS_APPLIED: u8 = 1 << 4;

/// A layer's mask: a single-channel raster whose rect can differ from the
/// layer's rect. Outside the rect the mask takes its default color.
///
/// # [Adobe Docs](https://www.adobe.com/devnet-apps/photoshop/fileformatashtml/)
///
/// Layer mask / adjustment layer data. Can be 40 bytes, 24 bytes, or 4 bytes
/// if no layer mask.
///
/// | Length | Description                                                     |
/// |--------|-----------------------------------------------------------------|
/// | 16     | Rectangle enclosing layer mask: Top, left, bottom, right        |
/// | 1      | Default color. 0 or 255                                         |
/// | 1      | Flags                                                           |
/// | ...    | 2 padding bytes in the 20-byte form; otherwise real flags, real user mask background and the rectangle enclosing the real mask |
#[derive(Debug, Serialize)]
pub struct LayerMask {
    pub(crate) rect: Rect,
    pub(crate) default_color: u8,
    pub(crate) flags: u8,
    pub(crate) real_flags: Option<u8>,
    pub(crate) real_background: Option<u8>,
    pub(crate) real_rect: Option<Rect>,
}

impl LayerMask {
    /// Read a layer mask from the layer-mask subsection of a layer record's
    /// extra data. `data_length` is the subsection's declared length, which
    /// determines whether the "real" mask fields are present.
    pub(crate) fn read(cursor: &mut PsdCursor, data_length: u32) -> Result<LayerMask, PsdError> {
        let rect = read_rect(cursor)?;
        let default_color = cursor.read_u8()?;
        let flags = cursor.read_u8()?;

        let (real_flags, real_background, real_rect) = if data_length == 20 {
            cursor.read(2)?; // padding
            (None, None, None)
        } else {
            let real_flags = cursor.read_u8()?;
            let real_background = cursor.read_u8()?;
            let real_rect = read_rect(cursor)?;
            (Some(real_flags), Some(real_background), Some(real_rect))
        };

        Ok(LayerMask {
            rect,
            default_color,
            flags,
            real_flags,
            real_background,
            real_rect,
        })
    }

    /// The rectangle enclosing the mask's pixels.
    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// The fill value outside the mask's rect: 0 hides, 255 reveals.
    pub fn default_color(&self) -> u8 {
        self.default_color
    }

    /// The mask position is relative to the layer.
    pub fn position_relative(&self) -> bool {
        self.flags & FLAG_POSITION_RELATIVE != 0
    }

    /// The mask is disabled.
    pub fn disabled(&self) -> bool {
        self.flags & FLAG_MASK_DISABLED != 0
    }

    /// Invert the mask when blending.
    pub fn invert_when_blending(&self) -> bool {
        self.flags & FLAG_INVERT_WHEN_BLENDING != 0
    }

    /// The mask came from rendering other data.
    pub fn from_rendering(&self) -> bool {
        self.flags & FLAG_MASK_FROM_RENDERING != 0
    }

    /// The mask has parameters applied to it.
    pub fn parameters_applied(&self) -> bool {
        self.flags & FLAG_PARAMETERS_APPLIED != 0
    }
}

pub(crate) fn read_rect(cursor: &mut PsdCursor) -> Result<Rect, PsdError> {
    let top = cursor.read_i32()?;
    let left = cursor.read_i32()?;
    let bottom = cursor.read_i32()?;
    let right = cursor.read_i32()?;

    Ok(Rect::new(top, left, bottom, right))
}
