use serde::Serialize;

use crate::error::PsdError;

/// The different kinds of channels a layer can declare (red, green, blue,
/// transparency and the two mask variants).
#[derive(Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Copy, Clone, Serialize)]
#[allow(missing_docs)]
pub enum ChannelKind {
    Red,
    Green,
    Blue,
    TransparencyMask,
    UserSuppliedLayerMask,
    RealUserSuppliedLayerMask,
}

impl ChannelKind {
    /// Decode a channel id from a layer record.
    pub fn new(channel_id: i16) -> Result<ChannelKind, PsdError> {
        match channel_id {
            0 => Ok(ChannelKind::Red),
            1 => Ok(ChannelKind::Green),
            2 => Ok(ChannelKind::Blue),
            -1 => Ok(ChannelKind::TransparencyMask),
            -2 => Ok(ChannelKind::UserSuppliedLayerMask),
            -3 => Ok(ChannelKind::RealUserSuppliedLayerMask),
            _ => Err(PsdError::UnknownChannelId { channel_id }),
        }
    }

    /// The wire id of this channel kind.
    pub fn id(&self) -> i16 {
        match self {
            ChannelKind::Red => 0,
            ChannelKind::Green => 1,
            ChannelKind::Blue => 2,
            ChannelKind::TransparencyMask => -1,
            ChannelKind::UserSuppliedLayerMask => -2,
            ChannelKind::RealUserSuppliedLayerMask => -3,
        }
    }

    /// Mask channels are rastered against the layer-mask rect instead of the
    /// layer rect.
    pub fn is_mask(&self) -> bool {
        matches!(
            self,
            ChannelKind::UserSuppliedLayerMask | ChannelKind::RealUserSuppliedLayerMask
        )
    }
}

/// How a channel's scanlines are compressed.
#[derive(Debug, Eq, PartialEq, Copy, Clone, Serialize)]
pub enum ChannelCompression {
    /// Not compressed
    Raw,
    /// Compressed with [PackBits RLE](https://en.wikipedia.org/wiki/PackBits)
    Rle,
    /// Unsupported
    ZipWithoutPrediction,
    /// Unsupported
    ZipWithPrediction,
}

impl ChannelCompression {
    /// Decode a 2-byte compression code.
    pub fn new(compression: u16) -> Result<ChannelCompression, PsdError> {
        match compression {
            0 => Ok(ChannelCompression::Raw),
            1 => Ok(ChannelCompression::Rle),
            2 => Ok(ChannelCompression::ZipWithoutPrediction),
            3 => Ok(ChannelCompression::ZipWithPrediction),
            _ => Err(PsdError::UnknownCompression { compression }),
        }
    }
}
