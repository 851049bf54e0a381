use serde::Serialize;

use crate::error::PsdError;
use crate::sections::PsdCursor;

/// Bytes representing the string "8BIM".
const EXPECTED_RESOURCE_SIGNATURE: [u8; 4] = [56, 66, 73, 77];

/// One image resource block. Image resources store non-pixel data associated
/// with an image, such as pen tool paths; we record the block's identity and
/// skip its payload.
///
/// # [Adobe Docs](https://www.adobe.com/devnet-apps/photoshop/fileformatashtml/)
///
/// | Length   | Description                                                              |
/// |----------|--------------------------------------------------------------------------|
/// | 4        | Signature: '8BIM'                                                        |
/// | 2        | Unique identifier for the resource                                       |
/// | Variable | Name: Pascal string, padded to make the size even (a null name consists of two bytes of 0) |
/// | 4        | Actual size of resource data that follows                                |
/// | Variable | The resource data. It is padded to make the size even                    |
#[derive(Debug, Serialize)]
pub struct ImageResource {
    /// The resource's numeric identifier.
    pub id: u16,
    /// The resource's name; usually empty.
    pub name: String,
}

/// Read the image resources section: a length-prefixed sequence of resource
/// blocks. Payloads are skipped.
pub(crate) fn read_image_resources(cursor: &mut PsdCursor) -> Result<Vec<ImageResource>, PsdError> {
    cursor.section(|cursor, scope| {
        let mut resources = vec![];

        while cursor.position() < scope.end {
            resources.push(read_resource_block(cursor)?);
        }

        Ok(resources)
    })
}

fn read_resource_block(cursor: &mut PsdCursor) -> Result<ImageResource, PsdError> {
    let signature = cursor.read_4()?;
    if signature != EXPECTED_RESOURCE_SIGNATURE {
        return Err(PsdError::BadSignature {
            location: "image resource block",
            expected: "8BIM",
            found: signature,
        });
    }

    let id = cursor.read_u16()?;
    let name = cursor.read_pascal_string(2)?;

    // Resource data is skipped. It is padded to make the total size even,
    // and the pad byte is not included in the length field.
    let data_length = cursor.read_u32()?;
    cursor.read(data_length as usize)?;
    if data_length % 2 == 1 {
        cursor.read(1)?;
    }

    Ok(ImageResource { id, name })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_payloads_and_odd_padding() {
        let mut bytes = vec![];
        let mut blocks = vec![];

        // Resource 1005 with an odd-length payload.
        blocks.extend_from_slice(b"8BIM");
        blocks.extend_from_slice(&1005u16.to_be_bytes());
        blocks.extend_from_slice(&[0, 0]); // null name
        blocks.extend_from_slice(&3u32.to_be_bytes());
        blocks.extend_from_slice(&[1, 2, 3, 0]); // payload + pad

        // Resource 1036 with an even-length payload and a name.
        blocks.extend_from_slice(b"8BIM");
        blocks.extend_from_slice(&1036u16.to_be_bytes());
        blocks.extend_from_slice(&[3, b'a', b'b', b'c']); // "abc", even total
        blocks.extend_from_slice(&2u32.to_be_bytes());
        blocks.extend_from_slice(&[9, 9]);

        bytes.extend_from_slice(&(blocks.len() as u32).to_be_bytes());
        bytes.extend_from_slice(&blocks);
        bytes.push(0xEE);

        let mut cursor = PsdCursor::new(&bytes);
        let resources = read_image_resources(&mut cursor).unwrap();

        assert_eq!(resources.len(), 2);
        assert_eq!(resources[0].id, 1005);
        assert_eq!(resources[0].name, "");
        assert_eq!(resources[1].id, 1036);
        assert_eq!(resources[1].name, "abc");
        assert_eq!(cursor.read_u8().unwrap(), 0xEE);
    }
}
