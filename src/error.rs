use std::path::PathBuf;

use thiserror::Error;

use crate::psd_channel::{ChannelCompression, ChannelKind};
use crate::sections::file_header_section::ColorMode;

/// Everything that can go wrong while decoding a PSD file or rendering it.
///
/// Decode errors abort the one-shot parse and drop the partial document.
/// Render errors abort the current render; the parsed document is read-only,
/// so prior state is untouched and rendering can be retried.
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum PsdError {
    #[error("bad {location} signature: expected {expected:?}, found {found:?}")]
    BadSignature {
        location: &'static str,
        expected: &'static str,
        found: [u8; 4],
    },
    #[error("unsupported PSD version {version}. Only version 1 is supported (version 2 is PSB)")]
    UnsupportedVersion { version: u16 },
    #[error("unsupported bit depth {depth}. Only 8 bits per channel is supported")]
    UnsupportedDepth { depth: u16 },
    #[error("{color_mode} is not a known color mode. Must be 0, 1, 2, 3, 4, 7, 8 or 9")]
    UnknownColorMode { color_mode: u16 },
    #[error("the {color_mode:?} color mode cannot be rendered")]
    UnsupportedColorMode { color_mode: ColorMode },
    #[error("{compression} is not a known channel compression. Must be 0, 1, 2 or 3")]
    UnknownCompression { compression: u16 },
    #[error("{compression:?} channel compression is not supported")]
    UnsupportedCompression { compression: ChannelCompression },
    #[error("{key:?} is not a known blend mode key")]
    UnknownBlendMode { key: [u8; 4] },
    #[error("{channel_id} is not a valid channel id. Must be 0, 1, 2, -1, -2 or -3")]
    UnknownChannelId { channel_id: i16 },
    #[error("{value} is not a valid section divider {field}")]
    UnknownSectionDivider { field: &'static str, value: u32 },
    #[error("PackBits scanline decoded to {actual} bytes, expected {expected}")]
    MalformedPackBits { expected: usize, actual: usize },
    #[error("unexpected end of PSD data at offset {offset}: wanted {wanted} more bytes, {remaining} remain")]
    UnexpectedEof {
        offset: u64,
        wanted: usize,
        remaining: usize,
    },
    #[error("no layer named '{name}'")]
    LayerNotFound { name: String },
    #[error("layer '{layer}' is missing its {channel:?} channel")]
    ChannelMissing { layer: String, channel: ChannelKind },
    #[error("layer '{layer}' has no layer mask")]
    MaskMissing { layer: String },
    #[error("output path already exists: {path}")]
    OutputExists { path: PathBuf },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
