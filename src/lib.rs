//! Data structures and methods for parsing PSD files and flattening them to
//! RGBA rasters.
//!
//! You are encouraged to read the PSD specification before contributing to
//! this codebase. This will help you better understand the current approach
//! and discover ways to improve it.
//!
//! psd spec: https://www.adobe.com/devnet-apps/photoshop/fileformatashtml/

#![deny(missing_docs)]

pub use crate::blend_mode::BlendMode;
pub use crate::error::PsdError;
pub use crate::psd_channel::{ChannelCompression, ChannelKind};
pub use crate::rect::Rect;
pub use crate::sections::file_header_section::ColorMode;
pub use crate::sections::image_resources_section::ImageResource;
pub use crate::sections::layer_and_mask_information_section::blending_ranges::{
    BlendRange, BlendingRanges, Csdr,
};
pub use crate::sections::layer_and_mask_information_section::layer::{Layer, LayerChannel};
pub use crate::sections::layer_and_mask_information_section::layer_info::{
    DividerType, LayerInfo, SectionDivider, SubType,
};
pub use crate::sections::layer_and_mask_information_section::mask::LayerMask;

use std::path::Path;

use serde::Serialize;
use tracing::debug;

use crate::sections::file_header_section::FileHeaderSection;
use crate::sections::image_data_section::ImageDataSection;
use crate::sections::image_resources_section::read_image_resources;
use crate::sections::layer_and_mask_information_section::{
    build_layer_tree, LayerAndMaskInformationSection,
};
use crate::sections::PsdCursor;

mod blend_mode;
mod compression;
mod error;
mod psd_channel;
mod rect;
mod render;
mod sections;

/// A parsed PSD document.
///
/// Decoding is one-shot and produces an immutable model; rendering only
/// reads it and can be invoked any number of times.
///
/// ## PSB Support
///
/// PSB (the large-document variant) is not supported; parsing one returns
/// [`PsdError::UnsupportedVersion`].
#[derive(Debug, Serialize)]
pub struct Psd {
    #[serde(flatten)]
    header: FileHeaderSection,
    image_resources: Vec<ImageResource>,
    layers: Vec<Layer>,
    merged_alpha: bool,
    #[serde(skip)]
    image_data: ImageDataSection,
    #[serde(skip)]
    top_level: Vec<usize>,
}

impl Psd {
    /// Parse a Psd from a byte slice.
    ///
    /// You'll typically get these bytes from a PSD file.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let psd_bytes = include_bytes!("./my-psd-file.psd");
    ///
    /// let psd = Psd::from_bytes(psd_bytes)?;
    /// ```
    pub fn from_bytes(bytes: &[u8]) -> Result<Psd, PsdError> {
        let mut cursor = PsdCursor::new(bytes);

        let header = FileHeaderSection::read(&mut cursor)?;

        // Color mode data. Only indexed and duotone color carry a payload
        // here, and we decode neither; the section is skipped wholly.
        cursor.section(|_, _| Ok(()))?;

        let image_resources = read_image_resources(&mut cursor)?;

        let layer_section = LayerAndMaskInformationSection::read(&mut cursor)?;

        let image_data = ImageDataSection::read(
            &mut cursor,
            header.width,
            header.height,
            header.channel_count,
        )?;

        let mut layers = layer_section.layers;
        let top_level = build_layer_tree(&mut layers);

        debug!(
            width = header.width,
            height = header.height,
            layers = layers.len(),
            "parsed document"
        );

        Ok(Psd {
            header,
            image_resources,
            layers,
            merged_alpha: layer_section.merged_alpha,
            image_data,
            top_level,
        })
    }

    /// Read and parse a PSD file from disk. The file is released before this
    /// returns; rendering never touches it again.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Psd, PsdError> {
        let bytes = std::fs::read(path)?;
        Psd::from_bytes(&bytes)
    }
}

// Methods for working with the file header.
impl Psd {
    /// The width of the canvas in pixels.
    pub fn width(&self) -> u32 {
        self.header.width
    }

    /// The height of the canvas in pixels.
    pub fn height(&self) -> u32 {
        self.header.height
    }

    /// The number of channels in the merged image, including any alpha.
    pub fn channel_count(&self) -> u16 {
        self.header.channel_count
    }

    /// The number of bits per channel. Always 8.
    pub fn depth(&self) -> u16 {
        self.header.depth
    }

    /// The color mode of the file.
    pub fn color_mode(&self) -> ColorMode {
        self.header.color_mode
    }
}

// Methods for working with layers.
impl Psd {
    /// All layers in file order: the bottom of the stack first. Group
    /// markers and bounding section dividers are layers too.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Indices of the top-level layers and groups, visually top-down.
    pub fn top_level(&self) -> &[usize] {
        &self.top_level
    }

    /// Find a layer by name.
    pub fn layer_by_name(&self, name: &str) -> Result<&Layer, PsdError> {
        self.layers
            .iter()
            .find(|layer| layer.name() == name)
            .ok_or_else(|| PsdError::LayerNotFound {
                name: name.to_string(),
            })
    }

    /// Iterate the pixel-bearing layers, skipping group markers and
    /// bounding section dividers.
    pub fn iter_layers(&self) -> impl Iterator<Item = &Layer> {
        self.layers
            .iter()
            .filter(|layer| !layer.is_group() && !layer.is_bounding_section_divider())
    }

    /// Iterate the group marker layers.
    pub fn iter_groups(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter().filter(|layer| layer.is_group())
    }

    /// The image resource blocks, payloads skipped.
    pub fn image_resources(&self) -> &[ImageResource] {
        &self.image_resources
    }

    /// Whether the merged image's first alpha channel holds its
    /// transparency (signalled by a negative layer count in the file).
    pub fn merged_alpha(&self) -> bool {
        self.merged_alpha
    }
}

// Rendering.
impl Psd {
    /// Flatten the layer tree into an (height × width × 4) RGBA raster.
    ///
    /// Renders are deterministic: flattening the same document twice yields
    /// byte-identical output, dissolve layers included (their RNG is
    /// reseeded per render).
    pub fn flatten(&self) -> Result<Vec<u8>, PsdError> {
        render::flatten(self)
    }

    /// The merged image stored in the file's final section, repacked for an
    /// image writer. Returns the pixel data and the number of channels per
    /// pixel (1, 3 or 4).
    pub fn merged_image(&self) -> Result<(Vec<u8>, u8), PsdError> {
        render::merged_image(self)
    }

    /// The raw merged image data: (height × width × channel_count)
    /// interleaved bytes.
    pub fn merged_image_data(&self) -> &[u8] {
        &self.image_data.data
    }

    /// The compression method of the merged image data.
    pub fn compression(&self) -> ChannelCompression {
        self.image_data.compression
    }
}
