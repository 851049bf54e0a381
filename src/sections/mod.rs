use std::io::Cursor;

use crate::error::PsdError;

pub(crate) mod file_header_section;
pub(crate) mod image_data_section;
pub(crate) mod image_resources_section;
pub(crate) mod layer_and_mask_information_section;

/// A cursor wrapping the bytes of a PSD file.
///
/// All multi-byte integers in a PSD are big-endian. Reads past the end of the
/// underlying bytes never panic; they surface [`PsdError::UnexpectedEof`] so a
/// truncated file fails the decode instead of desynchronizing it.
pub(crate) struct PsdCursor<'a> {
    cursor: Cursor<&'a [u8]>,
}

/// A handle to one length-prefixed section, yielded by [`PsdCursor::section`].
///
/// `end` is the absolute offset of the first byte after the section body.
pub(crate) struct SectionScope {
    pub length: u32,
    pub end: u64,
}

impl<'a> PsdCursor<'a> {
    pub fn new(bytes: &'a [u8]) -> PsdCursor<'a> {
        PsdCursor {
            cursor: Cursor::new(bytes),
        }
    }

    /// The current offset into the underlying bytes.
    pub fn position(&self) -> u64 {
        self.cursor.position()
    }

    pub fn seek(&mut self, position: u64) {
        self.cursor.set_position(position);
    }

    fn remaining(&self) -> usize {
        let len = self.cursor.get_ref().len() as u64;
        len.saturating_sub(self.cursor.position()) as usize
    }

    /// Read `count` bytes, advancing the cursor.
    pub fn read(&mut self, count: usize) -> Result<&'a [u8], PsdError> {
        if self.remaining() < count {
            return Err(PsdError::UnexpectedEof {
                offset: self.position(),
                wanted: count,
                remaining: self.remaining(),
            });
        }

        let underlying: &'a [u8] = *self.cursor.get_ref();
        let start = self.position() as usize;
        self.cursor.set_position((start + count) as u64);

        Ok(&underlying[start..start + count])
    }

    /// Read 4 bytes as a fixed-size array. Signatures and blend mode keys are
    /// all 4 bytes long.
    pub fn read_4(&mut self) -> Result<[u8; 4], PsdError> {
        let bytes = self.read(4)?;
        let mut four = [0; 4];
        four.copy_from_slice(bytes);
        Ok(four)
    }

    pub fn peek_4(&mut self) -> Result<[u8; 4], PsdError> {
        let position = self.position();
        let four = self.read_4()?;
        self.seek(position);
        Ok(four)
    }

    pub fn read_u8(&mut self) -> Result<u8, PsdError> {
        Ok(self.read(1)?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8, PsdError> {
        Ok(self.read(1)?[0] as i8)
    }

    pub fn read_u16(&mut self) -> Result<u16, PsdError> {
        let bytes = self.read(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_i16(&mut self) -> Result<i16, PsdError> {
        let bytes = self.read(2)?;
        Ok(i16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_u32(&mut self) -> Result<u32, PsdError> {
        Ok(u32::from_be_bytes(self.read_4()?))
    }

    pub fn read_i32(&mut self) -> Result<i32, PsdError> {
        Ok(i32::from_be_bytes(self.read_4()?))
    }

    /// Enter a length-prefixed section.
    ///
    /// Reads the 4-byte length marker, hands a [`SectionScope`] to the
    /// closure, and seeks to the end of the section when the closure
    /// returns, no matter how many bytes the closure actually consumed.
    /// Unread
    /// payload in unknown extension blocks is skipped and over-reads are
    /// rewound, which is what keeps the outer stream synchronized. Nested
    /// sections compose.
    pub fn section<T, F>(&mut self, f: F) -> Result<T, PsdError>
    where
        F: FnOnce(&mut PsdCursor<'a>, &SectionScope) -> Result<T, PsdError>,
    {
        let length = self.read_u32()?;

        if self.remaining() < length as usize {
            return Err(PsdError::UnexpectedEof {
                offset: self.position(),
                wanted: length as usize,
                remaining: self.remaining(),
            });
        }

        let scope = SectionScope {
            length,
            end: self.position() + length as u64,
        };

        let result = f(self, &scope);
        self.seek(scope.end);

        result
    }

    /// Read a Pascal string: one length byte, that many bytes of UTF-8, then
    /// zero padding so the total (length byte included) is a multiple of
    /// `alignment`. A zero length byte is legal and yields the empty string
    /// while still consuming the padding.
    pub fn read_pascal_string(&mut self, alignment: usize) -> Result<String, PsdError> {
        let count = self.read_u8()? as usize;
        let value = String::from_utf8_lossy(self.read(count)?).to_string();

        let padding = (alignment - (1 + count) % alignment) % alignment;
        self.read(padding)?;

        Ok(value)
    }

    /// Read a Unicode string: a 4-byte code unit count followed by that many
    /// UTF-16 big-endian code units.
    pub fn read_unicode_string(&mut self) -> Result<String, PsdError> {
        let count = self.read_u32()? as usize;
        let bytes = self.read(count * 2)?;

        let units: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();

        Ok(String::from_utf16_lossy(&units))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // A section body that under-consumes must still leave the cursor at
    // section start + 4 + length.
    #[test]
    fn section_skips_unread_bytes() {
        let bytes = [0, 0, 0, 4, 0xAA, 0xBB, 0xCC, 0xDD, 0xEE];
        let mut cursor = PsdCursor::new(&bytes);

        cursor
            .section(|cursor, scope| {
                assert_eq!(scope.length, 4);
                cursor.read_u8()?;
                Ok(())
            })
            .unwrap();

        assert_eq!(cursor.position(), 8);
        assert_eq!(cursor.read_u8().unwrap(), 0xEE);
    }

    #[test]
    fn section_rewinds_overread() {
        let bytes = [0, 0, 0, 2, 1, 2, 3, 4];
        let mut cursor = PsdCursor::new(&bytes);

        cursor
            .section(|cursor, _| {
                cursor.read_u32()?;
                Ok(())
            })
            .unwrap();

        assert_eq!(cursor.position(), 6);
    }

    #[test]
    fn nested_sections_compose() {
        // Outer section of 10 bytes containing an inner section of 2 bytes.
        let bytes = [0, 0, 0, 10, 0, 0, 0, 2, 7, 7, 9, 9, 9, 9];
        let mut cursor = PsdCursor::new(&bytes);

        cursor
            .section(|cursor, outer| {
                cursor.section(|_, inner| {
                    assert_eq!(inner.length, 2);
                    Ok(())
                })?;
                assert_eq!(cursor.position(), 10);
                assert_eq!(outer.end, 14);
                Ok(())
            })
            .unwrap();

        assert_eq!(cursor.position(), 14);
    }

    #[test]
    fn section_longer_than_input_is_an_error() {
        let bytes = [0, 0, 0, 200, 1, 2];
        let mut cursor = PsdCursor::new(&bytes);

        assert!(matches!(
            cursor.section(|_, _| Ok(())),
            Err(PsdError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn pascal_string_padded_to_four() {
        // "abc" -> 1 length byte + 3 data bytes, already a multiple of 4.
        let bytes = [3, b'a', b'b', b'c', 0xFF];
        let mut cursor = PsdCursor::new(&bytes);
        assert_eq!(cursor.read_pascal_string(4).unwrap(), "abc");
        assert_eq!(cursor.position(), 4);

        // "abcd" -> 5 bytes, padded with 3 to reach 8.
        let bytes = [4, b'a', b'b', b'c', b'd', 0, 0, 0, 0xFF];
        let mut cursor = PsdCursor::new(&bytes);
        assert_eq!(cursor.read_pascal_string(4).unwrap(), "abcd");
        assert_eq!(cursor.position(), 8);
    }

    #[test]
    fn empty_pascal_string_consumes_padding() {
        let bytes = [0, 0, 0, 0, 0xFF];
        let mut cursor = PsdCursor::new(&bytes);
        assert_eq!(cursor.read_pascal_string(4).unwrap(), "");
        assert_eq!(cursor.position(), 4);

        // With an alignment of 2 the empty name is two bytes total.
        let bytes = [0, 0, 0xFF];
        let mut cursor = PsdCursor::new(&bytes);
        assert_eq!(cursor.read_pascal_string(2).unwrap(), "");
        assert_eq!(cursor.position(), 2);
    }

    #[test]
    fn unicode_string() {
        let bytes = [0, 0, 0, 2, 0, b'h', 0, b'i'];
        let mut cursor = PsdCursor::new(&bytes);
        assert_eq!(cursor.read_unicode_string().unwrap(), "hi");
    }

    #[test]
    fn read_past_eof_is_an_error() {
        let bytes = [1, 2];
        let mut cursor = PsdCursor::new(&bytes);
        cursor.read(2).unwrap();

        assert!(matches!(
            cursor.read_u16(),
            Err(PsdError::UnexpectedEof { .. })
        ));
    }
}
