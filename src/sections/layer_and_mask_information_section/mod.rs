use tracing::debug;

use crate::blend_mode::BlendMode;
use crate::compression::unpack_bits_exact;
use crate::error::PsdError;
use crate::psd_channel::{ChannelCompression, ChannelKind};
use crate::rect::Rect;
use crate::sections::layer_and_mask_information_section::blending_ranges::BlendingRanges;
use crate::sections::layer_and_mask_information_section::layer::{Layer, LayerChannel};
use crate::sections::layer_and_mask_information_section::layer_info::{read_layer_info, LayerInfo};
use crate::sections::layer_and_mask_information_section::mask::{read_rect, LayerMask};
use crate::sections::PsdCursor;

pub(crate) mod blending_ranges;
pub(crate) mod layer;
pub(crate) mod layer_info;
pub(crate) mod mask;

/// Bytes representing the string "8BIM".
const SIGNATURE_EIGHT_BIM: [u8; 4] = [56, 66, 73, 77];

/// The fourth major section of a PSD: everything there is to know about its
/// layers.
///
/// # [Adobe Docs](https://www.adobe.com/devnet-apps/photoshop/fileformatashtml/)
///
/// | Length   | Description                                                       |
/// |----------|-------------------------------------------------------------------|
/// | 4        | Length of the layer and mask information section                  |
/// | Variable | Layer info                                                        |
/// | Variable | Global layer mask info                                            |
/// | Variable | Series of tagged blocks containing various types of data          |
///
/// If there are no layers or masks, this section is just 4 bytes: the length
/// field, which is set to zero. The global layer mask info and the trailing
/// tagged blocks are skipped by the enclosing section scope.
#[derive(Debug)]
pub(crate) struct LayerAndMaskInformationSection {
    /// Layers in file order: bottom of the stack first.
    pub(crate) layers: Vec<Layer>,
    /// The first alpha channel of the merged image holds its transparency.
    pub(crate) merged_alpha: bool,
}

impl LayerAndMaskInformationSection {
    /// Read the layer and mask information section at the cursor.
    pub fn read(cursor: &mut PsdCursor) -> Result<LayerAndMaskInformationSection, PsdError> {
        cursor.section(|cursor, scope| {
            if scope.length == 0 {
                return Ok(LayerAndMaskInformationSection {
                    layers: vec![],
                    merged_alpha: false,
                });
            }

            read_layer_info_subsection(cursor)
        })
    }
}

/// Read the layer info subsection: a signed layer count, that many layer
/// records, then every layer's channel data in layer order.
///
/// # [Adobe Docs](https://www.adobe.com/devnet-apps/photoshop/fileformatashtml/)
///
/// Layer count. If it is a negative number, its absolute value is the number
/// of layers and the first alpha channel contains the transparency data for
/// the merged result.
fn read_layer_info_subsection(
    cursor: &mut PsdCursor,
) -> Result<LayerAndMaskInformationSection, PsdError> {
    cursor.section(|cursor, _| {
        let layer_count = cursor.read_i16()?;
        let merged_alpha = layer_count < 0;
        let layer_count = layer_count.unsigned_abs();

        let mut records = Vec::with_capacity(layer_count as usize);
        for _ in 0..layer_count {
            records.push(read_layer_record(cursor)?);
        }

        debug!(layer_count, merged_alpha, "read layer records");

        // Channel data follows the records: all channels of the first layer
        // in their declared order, then the second layer's, and so on.
        let mut layers = Vec::with_capacity(records.len());
        for record in records {
            layers.push(read_layer_channels(cursor, record)?);
        }

        Ok(LayerAndMaskInformationSection {
            layers,
            merged_alpha,
        })
    })
}

/// An intermediate layer record: everything but the channel rasters, which
/// are stored after all records and filled in by a second pass.
struct LayerRecord {
    name: String,
    rect: Rect,
    /// (kind, declared byte length) per channel, in declaration order. The
    /// declared length is not used for positioning; channel data is located
    /// by sequential reads.
    channels: Vec<(ChannelKind, u32)>,
    blend_mode: BlendMode,
    opacity: u8,
    clipping_base: bool,
    flags: u8,
    mask: Option<LayerMask>,
    blending_ranges: BlendingRanges,
    info: Vec<LayerInfo>,
}

/// Read one layer record.
///
/// # [Adobe Docs](https://www.adobe.com/devnet-apps/photoshop/fileformatashtml/)
///
/// | Length                 | Description                                                                                       |
/// |------------------------|---------------------------------------------------------------------------------------------------|
/// | 4 * 4                  | Rectangle containing the contents of the layer: top, left, bottom, right                          |
/// | 2                      | Number of channels in the layer                                                                   |
/// | 6 * number of channels | Channel information: 2 bytes for channel id, 4 bytes for the length of the channel data           |
/// | 4                      | Blend mode signature: '8BIM'                                                                      |
/// | 4                      | Blend mode key                                                                                    |
/// | 1                      | Opacity. 0 = transparent ... 255 = opaque                                                         |
/// | 1                      | Clipping: 0 = base, 1 = non-base                                                                  |
/// | 1                      | Flags                                                                                             |
/// | 1                      | Filler (zero)                                                                                     |
/// | 4                      | Length of the extra data field (the total length of the next five fields)                         |
/// | Variable               | Layer mask data                                                                                   |
/// | Variable               | Layer blending ranges                                                                             |
/// | Variable               | Layer name: Pascal string, padded to a multiple of 4 bytes                                        |
/// | Variable               | Additional layer information: tagged blocks until the end of the extra data                       |
fn read_layer_record(cursor: &mut PsdCursor) -> Result<LayerRecord, PsdError> {
    let rect = read_rect(cursor)?;

    let channel_count = cursor.read_u16()?;
    let mut channels = Vec::with_capacity(channel_count as usize);
    for _ in 0..channel_count {
        let kind = ChannelKind::new(cursor.read_i16()?)?;
        let declared_length = cursor.read_u32()?;
        channels.push((kind, declared_length));
    }

    let signature = cursor.read_4()?;
    if signature != SIGNATURE_EIGHT_BIM {
        return Err(PsdError::BadSignature {
            location: "layer record blend mode",
            expected: "8BIM",
            found: signature,
        });
    }
    let blend_mode = BlendMode::from_key(cursor.read_4()?)?;

    let opacity = cursor.read_u8()?;
    let clipping_base = cursor.read_u8()? == 0;
    let flags = cursor.read_u8()?;
    cursor.read_u8()?; // filler

    cursor.section(|cursor, extra| {
        let mask = cursor.section(|cursor, scope| {
            if scope.length == 0 {
                Ok(None)
            } else {
                LayerMask::read(cursor, scope.length).map(Some)
            }
        })?;

        let blending_ranges =
            cursor.section(|cursor, scope| BlendingRanges::read(cursor, scope.end))?;

        let name = cursor.read_pascal_string(4)?;

        let mut info = vec![];
        while cursor.position() < extra.end {
            info.push(read_layer_info(cursor)?);
        }

        Ok(LayerRecord {
            name,
            rect,
            channels,
            blend_mode,
            opacity,
            clipping_base,
            flags,
            mask,
            blending_ranges,
            info,
        })
    })
}

/// Read the channel data for one layer and produce the finished `Layer`.
fn read_layer_channels(cursor: &mut PsdCursor, record: LayerRecord) -> Result<Layer, PsdError> {
    let mask_rect = record.mask.as_ref().map(LayerMask::rect).unwrap_or_default();

    let mut channels = Vec::with_capacity(record.channels.len());
    for &(kind, _declared_length) in &record.channels {
        let (width, height) = if kind.is_mask() {
            (mask_rect.width(), mask_rect.height())
        } else {
            (record.rect.width(), record.rect.height())
        };

        let data = read_channel_scanlines(cursor, width, height)?;
        channels.push(LayerChannel { kind, data });
    }

    Ok(Layer {
        name: record.name,
        rect: record.rect,
        channels,
        blend_mode: record.blend_mode,
        opacity: record.opacity,
        clipping_base: record.clipping_base,
        flags: record.flags,
        mask: record.mask,
        blending_ranges: record.blending_ranges,
        info: record.info,
        parent: None,
        children: vec![],
    })
}

/// Read one channel's raster: a 2-byte compression code followed by
/// width × height bytes of scanlines.
///
/// # [Adobe Docs](https://www.adobe.com/devnet-apps/photoshop/fileformatashtml/)
///
/// 0 = raw data; 1 = RLE compressed, starting with the byte counts for all
/// the scan lines, each count stored as a two-byte value, followed by the RLE
/// compressed data with each scan line compressed separately; 2 and 3 = ZIP.
pub(crate) fn read_channel_scanlines(
    cursor: &mut PsdCursor,
    width: u32,
    height: u32,
) -> Result<Vec<u8>, PsdError> {
    let compression = ChannelCompression::new(cursor.read_u16()?)?;

    match compression {
        ChannelCompression::Raw => Ok(cursor.read((width * height) as usize)?.to_vec()),
        ChannelCompression::Rle => {
            let mut scanline_lengths = Vec::with_capacity(height as usize);
            for _ in 0..height {
                scanline_lengths.push(cursor.read_u16()?);
            }

            let mut data = Vec::with_capacity((width * height) as usize);
            for length in scanline_lengths {
                let compressed = cursor.read(length as usize)?;
                data.extend(unpack_bits_exact(compressed, width as usize)?);
            }

            Ok(data)
        }
        ChannelCompression::ZipWithoutPrediction | ChannelCompression::ZipWithPrediction => {
            Err(PsdError::UnsupportedCompression { compression })
        }
    }
}

/// Link the flat layer list into a parent/child forest and return the
/// top-level layer indices, visually top-down.
///
/// Photoshop stores layers bottom-to-top. A group's members sit between a
/// bounding section divider (below them) and the folder layer (above them),
/// so a single reverse walk (top-down visually) recovers the nesting:
/// folder layers push a new parent, bounding dividers pop back out, and
/// ordinary layers attach to whatever group is open. Appending during the
/// top-down walk leaves every `children` list in visual top-down order.
/// Bounding dividers are attached to no list.
pub(crate) fn build_layer_tree(layers: &mut [Layer]) -> Vec<usize> {
    let mut top_level = vec![];
    let mut parent: Option<usize> = None;

    for idx in (0..layers.len()).rev() {
        if layers[idx].is_bounding_section_divider() {
            // A divider with no open group means the nesting is malformed;
            // fall back to the top level rather than panicking.
            parent = parent.and_then(|open| layers[open].parent);
            continue;
        }

        layers[idx].parent = parent;
        match parent {
            Some(open) => layers[open].children.push(idx),
            None => top_level.push(idx),
        }

        if layers[idx].is_group() {
            parent = Some(idx);
        }
    }

    top_level
}
