use crate::compression::unpack_bits_exact;
use crate::error::PsdError;
use crate::psd_channel::ChannelCompression;
use crate::sections::PsdCursor;

/// The final section of a PSD: the merged/composite image as it looked the
/// last time the document was saved.
///
/// # [Adobe Docs](https://www.adobe.com/devnet-apps/photoshop/fileformatashtml/)
///
/// The last section of a Photoshop file contains the image pixel data.
/// Image data is stored in planar order: first all the red data, then all the
/// green data, etc. Each plane is stored in scan-line order, with no pad
/// bytes.
///
/// | Length   | Description                                                                        |
/// |----------|------------------------------------------------------------------------------------|
/// | 2        | Compression method: 0 = raw, 1 = RLE (byte counts for all scanlines first), 2/3 = ZIP |
/// | Variable | The image data. Planar order = RRR GGG BBB, etc.                                   |
#[derive(Debug)]
pub(crate) struct ImageDataSection {
    pub(crate) compression: ChannelCompression,
    /// (height × width × channels) interleaved, rows from the top.
    pub(crate) data: Vec<u8>,
}

impl ImageDataSection {
    /// Read the merged image data at the cursor. Unlike the other variable
    /// sections this one has no length marker; it runs to the end of the
    /// file.
    pub fn read(
        cursor: &mut PsdCursor,
        width: u32,
        height: u32,
        channel_count: u16,
    ) -> Result<ImageDataSection, PsdError> {
        let compression = ChannelCompression::new(cursor.read_u16()?)?;
        let channels = channel_count as usize;
        let (width, height) = (width as usize, height as usize);

        let mut data = vec![0; height * width * channels];

        match compression {
            ChannelCompression::Raw => {
                for channel in 0..channels {
                    for row in 0..height {
                        let scanline = cursor.read(width)?;
                        interleave_scanline(&mut data, scanline, row, channel, channels, width);
                    }
                }
            }
            ChannelCompression::Rle => {
                // channels × height scanline byte counts come first.
                let mut scanline_lengths = Vec::with_capacity(channels * height);
                for _ in 0..channels * height {
                    scanline_lengths.push(cursor.read_u16()?);
                }

                for (idx, length) in scanline_lengths.into_iter().enumerate() {
                    let channel = idx / height;
                    let row = idx % height;

                    let compressed = cursor.read(length as usize)?;
                    let scanline = unpack_bits_exact(compressed, width)?;
                    interleave_scanline(&mut data, &scanline, row, channel, channels, width);
                }
            }
            ChannelCompression::ZipWithoutPrediction | ChannelCompression::ZipWithPrediction => {
                return Err(PsdError::UnsupportedCompression { compression });
            }
        }

        Ok(ImageDataSection { compression, data })
    }
}

fn interleave_scanline(
    data: &mut [u8],
    scanline: &[u8],
    row: usize,
    channel: usize,
    channels: usize,
    width: usize,
) {
    for (x, &byte) in scanline.iter().enumerate() {
        data[(row * width + x) * channels + channel] = byte;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_planar_data_is_interleaved() {
        // 2x1 canvas, 3 channels, planar RR GG BB.
        let mut bytes = vec![0, 0];
        bytes.extend_from_slice(&[1, 2, 3, 4, 5, 6]);

        let section = ImageDataSection::read(&mut PsdCursor::new(&bytes), 2, 1, 3).unwrap();

        assert_eq!(section.compression, ChannelCompression::Raw);
        assert_eq!(section.data, vec![1, 3, 5, 2, 4, 6]);
    }

    #[test]
    fn rle_scanlines_decode_to_the_canvas_width() {
        // 4x2 canvas, 1 channel. Each scanline: literal header 3 + 4 bytes.
        let mut bytes = vec![0, 1];
        bytes.extend_from_slice(&5u16.to_be_bytes());
        bytes.extend_from_slice(&5u16.to_be_bytes());
        bytes.extend_from_slice(&[3, 1, 2, 3, 4]);
        bytes.extend_from_slice(&[3, 5, 6, 7, 8]);

        let section = ImageDataSection::read(&mut PsdCursor::new(&bytes), 4, 2, 1).unwrap();

        assert_eq!(section.data, vec![1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn zip_compression_is_unsupported() {
        let bytes = [0, 2];

        assert!(matches!(
            ImageDataSection::read(&mut PsdCursor::new(&bytes), 1, 1, 1),
            Err(PsdError::UnsupportedCompression { .. })
        ));
    }

    #[test]
    fn rle_scanline_with_the_wrong_width_is_malformed() {
        let mut bytes = vec![0, 1];
        bytes.extend_from_slice(&2u16.to_be_bytes());
        bytes.extend_from_slice(&[253, 9]); // decodes to 4 bytes, width is 3

        assert!(matches!(
            ImageDataSection::read(&mut PsdCursor::new(&bytes), 3, 1, 1),
            Err(PsdError::MalformedPackBits { .. })
        ));
    }
}
