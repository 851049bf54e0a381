//! PackBits run-length decoding.
//!
//! PSD channel data uses the same byte-oriented RLE scheme as the Macintosh
//! ROM routine PackBits and the TIFF standard.

use crate::error::PsdError;

/// Decompress a PackBits byte stream.
///
/// For each header byte `H`:
/// - `H == -128`: skip.
/// - `H >= 0`: copy the next `H + 1` bytes literally.
/// - `H < 0`: repeat the next byte `1 - H` times.
///
/// https://en.wikipedia.org/wiki/PackBits
pub(crate) fn unpack_bits(compressed: &[u8]) -> Vec<u8> {
    let mut decompressed = Vec::with_capacity(compressed.len() * 2);
    let mut position = 0;

    while position < compressed.len() {
        let header = compressed[position] as i8;
        position += 1;

        if header == -128 {
            continue;
        } else if header >= 0 {
            let literal = header as usize + 1;
            let end = (position + literal).min(compressed.len());
            decompressed.extend_from_slice(&compressed[position..end]);
            position = end;
        } else {
            let repeat = 1 - header as isize;
            if let Some(&byte) = compressed.get(position) {
                position += 1;
                decompressed.extend(std::iter::repeat(byte).take(repeat as usize));
            }
        }
    }

    decompressed
}

/// Decompress one scanline and insist on its decoded width.
///
/// Every RLE scanline in a PSD must decode to exactly the channel's row
/// width; anything else means the stream is corrupt.
pub(crate) fn unpack_bits_exact(compressed: &[u8], expected: usize) -> Result<Vec<u8>, PsdError> {
    let decompressed = unpack_bits(compressed);

    if decompressed.len() != expected {
        return Err(PsdError::MalformedPackBits {
            expected,
            actual: decompressed.len(),
        });
    }

    Ok(decompressed)
}
