use serde::Serialize;

use crate::error::PsdError;
use crate::sections::PsdCursor;

/// A blend range: black and white points, each a soft pair.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Serialize)]
#[allow(missing_docs)]
pub struct BlendRange {
    pub black_low: u8,
    pub black_high: u8,
    pub white_low: u8,
    pub white_high: u8,
}

impl BlendRange {
    fn read(cursor: &mut PsdCursor) -> Result<BlendRange, PsdError> {
        Ok(BlendRange {
            black_low: cursor.read_u8()?,
            black_high: cursor.read_u8()?,
            white_low: cursor.read_u8()?,
            white_high: cursor.read_u8()?,
        })
    }
}

/// A channel source/destination range pair.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Serialize)]
pub struct Csdr {
    /// Range applied to the source (this layer).
    pub source: BlendRange,
    /// Range applied to the destination (the composite below).
    pub destination: BlendRange,
}

impl Csdr {
    fn read(cursor: &mut PsdCursor) -> Result<Csdr, PsdError> {
        Ok(Csdr {
            source: BlendRange::read(cursor)?,
            destination: BlendRange::read(cursor)?,
        })
    }
}

/// A layer's blending ranges: the composite gray pair followed by one pair
/// per channel, read until the subsection boundary.
#[derive(Debug, Default, Serialize)]
pub struct BlendingRanges {
    /// The composite gray blend pair.
    pub gray: Csdr,
    /// Per-channel pairs, in channel order.
    pub channels: Vec<Csdr>,
}

impl BlendingRanges {
    /// Read blending ranges up to `section_end`. An empty subsection yields
    /// the all-zero default.
    pub(crate) fn read(cursor: &mut PsdCursor, section_end: u64) -> Result<BlendingRanges, PsdError> {
        if cursor.position() + 8 > section_end {
            return Ok(BlendingRanges::default());
        }

        let gray = Csdr::read(cursor)?;

        let mut channels = vec![];
        while cursor.position() + 8 <= section_end {
            channels.push(Csdr::read(cursor)?);
        }

        Ok(BlendingRanges { gray, channels })
    }
}
