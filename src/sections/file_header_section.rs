use serde::Serialize;

use crate::error::PsdError;
use crate::sections::PsdCursor;

/// Bytes representing the string "8BPS".
const EXPECTED_PSD_SIGNATURE: [u8; 4] = [56, 66, 80, 83];

/// The FileHeaderSection comes from the first 26 bytes in the PSD file.
///
/// # [Adobe Docs](https://www.adobe.com/devnet-apps/photoshop/fileformatashtml/)
///
/// The file header contains the basic properties of the image.
///
/// | Length | Description                                                                                                                                          |
/// |--------|------------------------------------------------------------------------------------------------------------------------------------------------------|
/// | 4      | Signature: always equal to '8BPS'. Do not try to read the file if the signature does not match this value.                                           |
/// | 2      | Version: always equal to 1. Do not try to read the file if the version does not match this value.<br> (**PSB** version is 2.)                        |
/// | 6      | Reserved: must be zero.                                                                                                                              |
/// | 2      | The number of channels in the image, including any alpha channels. Supported range is 1 to 56.                                                       |
/// | 4      | The height of the image in pixels. Supported range is 1 to 30,000.                                                                                   |
/// | 4      | The width of the image in pixels. Supported range is 1 to 30,000.                                                                                    |
/// | 2      | Depth: the number of bits per channel. Supported values are 1, 8, 16 and 32.                                                                         |
/// | 2      | The color mode of the file. Supported values are: Bitmap = 0; Grayscale = 1; Indexed = 2; RGB = 3; CMYK = 4; Multichannel = 7; Duotone = 8; Lab = 9. |
#[derive(Debug, Serialize)]
pub(crate) struct FileHeaderSection {
    pub(crate) channel_count: u16,
    pub(crate) height: u32,
    pub(crate) width: u32,
    pub(crate) depth: u16,
    pub(crate) color_mode: ColorMode,
}

impl FileHeaderSection {
    /// Read the file header at the start of a PSD.
    ///
    /// Note that height comes before width.
    pub fn read(cursor: &mut PsdCursor) -> Result<FileHeaderSection, PsdError> {
        let signature = cursor.read_4()?;
        if signature != EXPECTED_PSD_SIGNATURE {
            return Err(PsdError::BadSignature {
                location: "file header",
                expected: "8BPS",
                found: signature,
            });
        }

        let version = cursor.read_u16()?;
        if version != 1 {
            return Err(PsdError::UnsupportedVersion { version });
        }

        // 6 reserved bytes
        cursor.read(6)?;

        let channel_count = cursor.read_u16()?;
        let height = cursor.read_u32()?;
        let width = cursor.read_u32()?;

        let depth = cursor.read_u16()?;
        if depth != 8 {
            return Err(PsdError::UnsupportedDepth { depth });
        }

        let color_mode = ColorMode::new(cursor.read_u16()?)?;

        Ok(FileHeaderSection {
            channel_count,
            height,
            width,
            depth,
            color_mode,
        })
    }
}

/// # [Adobe Docs](https://www.adobe.com/devnet-apps/photoshop/fileformatashtml/)
///
/// The color mode of the file. Supported values are: Bitmap = 0; Grayscale = 1;
/// Indexed = 2; RGB = 3; CMYK = 4; Multichannel = 7; Duotone = 8; Lab = 9.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize)]
#[allow(missing_docs)]
pub enum ColorMode {
    Bitmap = 0,
    Grayscale = 1,
    Indexed = 2,
    Rgb = 3,
    Cmyk = 4,
    Multichannel = 7,
    Duotone = 8,
    Lab = 9,
}

impl ColorMode {
    /// Decode a color mode code from the file header.
    pub fn new(color_mode: u16) -> Result<ColorMode, PsdError> {
        match color_mode {
            0 => Ok(ColorMode::Bitmap),
            1 => Ok(ColorMode::Grayscale),
            2 => Ok(ColorMode::Indexed),
            3 => Ok(ColorMode::Rgb),
            4 => Ok(ColorMode::Cmyk),
            7 => Ok(ColorMode::Multichannel),
            8 => Ok(ColorMode::Duotone),
            9 => Ok(ColorMode::Lab),
            _ => Err(PsdError::UnknownColorMode { color_mode }),
        }
    }
}
