use serde::Serialize;

use crate::blend_mode::BlendMode;
use crate::error::PsdError;
use crate::psd_channel::ChannelKind;
use crate::rect::Rect;
use crate::sections::layer_and_mask_information_section::blending_ranges::BlendingRanges;
use crate::sections::layer_and_mask_information_section::layer_info::{
    DividerType, LayerInfo, SectionDivider,
};
use crate::sections::layer_and_mask_information_section::mask::LayerMask;

const FLAG_TRANSPARENCY_PROTECTED: u8 = 1 << 0;
/// Set when the layer is NOT visible.
const FLAG_HIDDEN: u8 = 1 << 1;
/// Tells whether bit 4 carries useful information (Photoshop 5.0 and later).
const FLAG_HAS_USEFUL_INFORMATION: u8 = 1 << 3;
const FLAG_PIXEL_DATA_IRRELEVANT: u8 = 1 << 4;

/// A layer's fill factor scales its implicit alpha. The factor is referenced
/// by Photoshop's UI but never read from the file; fixed at fully opaque.
const LAYER_FILL: f32 = 1.0;

/// One channel of a layer: its kind plus a row-major uint8 raster.
///
/// Color and transparency channels are sized to the layer's rect; mask
/// channels are sized to the layer-mask rect. The channel list preserves the
/// order in which the layer record declared them.
#[derive(Debug, Serialize)]
pub struct LayerChannel {
    pub(crate) kind: ChannelKind,
    #[serde(skip)]
    pub(crate) data: Vec<u8>,
}

impl LayerChannel {
    /// Which channel this is.
    pub fn kind(&self) -> ChannelKind {
        self.kind
    }

    /// The raster, one byte per pixel, rows from the top.
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// A layer parsed from the layer and mask information section.
///
/// Group markers are layers too: a folder layer carries a section divider
/// info block, and the end of a group's contents is marked by a bounding
/// section divider layer below them.
#[derive(Debug, Serialize)]
pub struct Layer {
    pub(crate) name: String,
    pub(crate) rect: Rect,
    pub(crate) channels: Vec<LayerChannel>,
    pub(crate) blend_mode: BlendMode,
    pub(crate) opacity: u8,
    pub(crate) clipping_base: bool,
    pub(crate) flags: u8,
    pub(crate) mask: Option<LayerMask>,
    pub(crate) blending_ranges: BlendingRanges,
    pub(crate) info: Vec<LayerInfo>,
    /// Index of the parent group in the document's layer list.
    #[serde(skip)]
    pub(crate) parent: Option<usize>,
    /// Indices of child layers, visually top-down.
    #[serde(skip)]
    pub(crate) children: Vec<usize>,
}

impl Layer {
    /// The layer's name from its Pascal-string field.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The rectangle enclosing the layer's pixels, in canvas coordinates.
    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// Width of the layer's raster in pixels.
    pub fn width(&self) -> u32 {
        self.rect.width()
    }

    /// Height of the layer's raster in pixels.
    pub fn height(&self) -> u32 {
        self.rect.height()
    }

    /// The layer's channels, in declaration order.
    pub fn channels(&self) -> &[LayerChannel] {
        &self.channels
    }

    /// Look up a channel by kind.
    pub fn channel(&self, kind: ChannelKind) -> Option<&LayerChannel> {
        self.channels.iter().find(|channel| channel.kind == kind)
    }

    /// How this layer blends into the composite below it.
    pub fn blend_mode(&self) -> BlendMode {
        self.blend_mode
    }

    /// 0 = transparent ... 255 = opaque.
    pub fn opacity(&self) -> u8 {
        self.opacity
    }

    /// Whether other layers may clip against this one.
    pub fn clipping_base(&self) -> bool {
        self.clipping_base
    }

    /// The layer's transparency is locked.
    pub fn transparency_protected(&self) -> bool {
        self.flags & FLAG_TRANSPARENCY_PROTECTED != 0
    }

    /// Whether the layer is shown. The flag bit is inverted: set means
    /// hidden.
    pub fn visible(&self) -> bool {
        self.flags & FLAG_HIDDEN == 0
    }

    /// The pixel data is irrelevant to the appearance of the document.
    /// Only honored when bit 3 says bit 4 is meaningful.
    pub fn pixel_data_irrelevant(&self) -> bool {
        self.flags & FLAG_HAS_USEFUL_INFORMATION != 0
            && self.flags & FLAG_PIXEL_DATA_IRRELEVANT != 0
    }

    /// The layer's mask, if any.
    pub fn mask(&self) -> Option<&LayerMask> {
        self.mask.as_ref()
    }

    /// The layer's blending ranges.
    pub fn blending_ranges(&self) -> &BlendingRanges {
        &self.blending_ranges
    }

    /// All additional-layer-information blocks attached to this layer.
    pub fn info(&self) -> &[LayerInfo] {
        &self.info
    }

    /// The section divider block, when this layer is a group marker.
    pub fn section_divider(&self) -> Option<&SectionDivider> {
        self.info.iter().find_map(|info| match info {
            LayerInfo::SectionDivider(divider) => Some(divider),
            _ => None,
        })
    }

    /// True when this layer is an open or closed folder marker.
    pub fn is_group(&self) -> bool {
        matches!(
            self.section_divider().map(SectionDivider::divider_type),
            Some(DividerType::OpenFolder) | Some(DividerType::ClosedFolder)
        )
    }

    /// True when this layer terminates a group's contents.
    pub fn is_bounding_section_divider(&self) -> bool {
        self.section_divider().map(SectionDivider::divider_type)
            == Some(DividerType::BoundingSectionDivider)
    }

    /// Index of this layer's parent group in `Psd::layers`, if any.
    pub fn parent(&self) -> Option<usize> {
        self.parent
    }

    /// Indices of this layer's children in `Psd::layers`, visually top-down.
    /// Empty unless the layer is a group.
    pub fn children(&self) -> &[usize] {
        &self.children
    }

    /// Interleave this layer's channels into an RGBA raster of
    /// (height × width × 4) bytes.
    ///
    /// When the transparency channel is absent the layer is opaque and the
    /// alpha plane is filled with 255, scaled by the layer fill factor.
    pub fn rgba(&self) -> Result<Vec<u8>, PsdError> {
        let red = self.require_channel(ChannelKind::Red)?;
        let green = self.require_channel(ChannelKind::Green)?;
        let blue = self.require_channel(ChannelKind::Blue)?;
        let alpha = self.channel(ChannelKind::TransparencyMask);

        let pixel_count = (self.width() * self.height()) as usize;
        let mut rgba = Vec::with_capacity(pixel_count * 4);

        for idx in 0..pixel_count {
            rgba.push(red.data[idx]);
            rgba.push(green.data[idx]);
            rgba.push(blue.data[idx]);

            let a = alpha.map(|alpha| alpha.data[idx]).unwrap_or(255);
            rgba.push(scale_alpha(a, LAYER_FILL));
        }

        Ok(rgba)
    }

    /// Whether the layer carries its own transparency channel.
    pub fn has_alpha(&self) -> bool {
        self.channel(ChannelKind::TransparencyMask).is_some()
    }

    fn require_channel(&self, kind: ChannelKind) -> Result<&LayerChannel, PsdError> {
        self.channel(kind).ok_or_else(|| PsdError::ChannelMissing {
            layer: self.name.clone(),
            channel: kind,
        })
    }
}

fn scale_alpha(alpha: u8, fill: f32) -> u8 {
    if fill >= 1.0 {
        alpha
    } else {
        (alpha as f32 * fill).round_ties_even() as u8
    }
}
