use serde::Serialize;

use crate::blend_mode::BlendMode;
use crate::error::PsdError;
use crate::sections::PsdCursor;

/// One of the possible additional layer block signatures
const SIGNATURE_EIGHT_BIM: [u8; 4] = [56, 66, 73, 77];
/// One of the possible additional layer block signatures
const SIGNATURE_EIGHT_B64: [u8; 4] = [56, 66, 54, 52];

/// A tagged additional-layer-information block.
///
/// Photoshop attaches an open-ended set of these to each layer record,
/// dispatched on a 4-byte key. We interpret the section divider (`lsct`,
/// which is what turns flat layer lists into groups) and the Unicode layer
/// name (`luni`); every other key is retained opaquely with its payload so
/// that skipping it cannot desynchronize the stream.
#[derive(Debug, Serialize)]
pub enum LayerInfo {
    /// `lsct`: marks group boundaries in the flat layer list.
    SectionDivider(SectionDivider),
    /// `luni`: the layer's name as UTF-16, uncapped by the Pascal name's
    /// 255-byte limit.
    UnicodeName(String),
    /// Any key we don't interpret.
    Opaque {
        /// The block's 4-byte key.
        key: [u8; 4],
        /// The undecoded payload.
        #[serde(skip)]
        data: Vec<u8>,
    },
}

/// What kind of section boundary a divider marks.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize)]
#[allow(missing_docs)]
pub enum DividerType {
    Other = 0,
    OpenFolder = 1,
    ClosedFolder = 2,
    BoundingSectionDivider = 3,
}

impl DividerType {
    fn new(divider_type: u32) -> Result<DividerType, PsdError> {
        match divider_type {
            0 => Ok(DividerType::Other),
            1 => Ok(DividerType::OpenFolder),
            2 => Ok(DividerType::ClosedFolder),
            3 => Ok(DividerType::BoundingSectionDivider),
            _ => Err(PsdError::UnknownSectionDivider {
                field: "type",
                value: divider_type,
            }),
        }
    }
}

/// A divider's sub type. Scene groups affect the animation timeline.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize)]
#[allow(missing_docs)]
pub enum SubType {
    Normal = 0,
    SceneGroup = 1,
}

impl SubType {
    fn new(sub_type: u32) -> Result<SubType, PsdError> {
        match sub_type {
            0 => Ok(SubType::Normal),
            1 => Ok(SubType::SceneGroup),
            _ => Err(PsdError::UnknownSectionDivider {
                field: "sub type",
                value: sub_type,
            }),
        }
    }
}

/// An `lsct` section divider block.
///
/// | Length | Description                                                    |
/// |--------|----------------------------------------------------------------|
/// | 4      | Type. 0 = any other type of layer, 1 = open folder, 2 = closed folder, 3 = bounding section divider (hidden in the UI) |
/// | 4+4    | Signature `8BIM` and blend mode key. Only present if length >= 12 |
/// | 4      | Sub type. 0 = normal, 1 = scene group. Only present if length >= 16 |
#[derive(Debug, Copy, Clone, Serialize)]
pub struct SectionDivider {
    pub(crate) divider_type: DividerType,
    pub(crate) blend_mode_override: Option<BlendMode>,
    pub(crate) sub_type: SubType,
}

impl SectionDivider {
    /// The kind of boundary this divider marks.
    pub fn divider_type(&self) -> DividerType {
        self.divider_type
    }

    /// The group blend mode the divider carries, when present. The layer
    /// record's own blend mode field is what rendering consults.
    pub fn blend_mode_override(&self) -> Option<BlendMode> {
        self.blend_mode_override
    }

    /// Normal or scene group.
    pub fn sub_type(&self) -> SubType {
        self.sub_type
    }

    fn read(cursor: &mut PsdCursor) -> Result<SectionDivider, PsdError> {
        cursor.section(|cursor, scope| {
            let divider_type = DividerType::new(cursor.read_u32()?)?;

            let mut blend_mode_override = None;
            let mut sub_type = SubType::Normal;

            if scope.length >= 12 {
                let signature = cursor.read_4()?;
                if signature != SIGNATURE_EIGHT_BIM {
                    return Err(PsdError::BadSignature {
                        location: "section divider",
                        expected: "8BIM",
                        found: signature,
                    });
                }
                blend_mode_override = Some(BlendMode::from_key(cursor.read_4()?)?);

                if scope.length >= 16 {
                    sub_type = SubType::new(cursor.read_u32()?)?;
                }
            }

            Ok(SectionDivider {
                divider_type,
                blend_mode_override,
                sub_type,
            })
        })
    }
}

/// Read one additional-layer-information block: signature, key, then a
/// length-prefixed body dispatched on the key.
pub(crate) fn read_layer_info(cursor: &mut PsdCursor) -> Result<LayerInfo, PsdError> {
    let signature = cursor.read_4()?;
    if signature != SIGNATURE_EIGHT_BIM && signature != SIGNATURE_EIGHT_B64 {
        return Err(PsdError::BadSignature {
            location: "additional layer information",
            expected: "8BIM or 8B64",
            found: signature,
        });
    }

    let key = cursor.read_4()?;

    match &key {
        b"lsct" => Ok(LayerInfo::SectionDivider(SectionDivider::read(cursor)?)),
        b"luni" => cursor.section(|cursor, _| {
            Ok(LayerInfo::UnicodeName(cursor.read_unicode_string()?))
        }),
        _ => cursor.section(|cursor, scope| {
            Ok(LayerInfo::Opaque {
                key,
                data: cursor.read(scope.length as usize)?.to_vec(),
            })
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn divider_with_blend_override_and_sub_type() {
        let mut bytes = vec![];
        bytes.extend_from_slice(b"8BIM");
        bytes.extend_from_slice(b"lsct");
        bytes.extend_from_slice(&16u32.to_be_bytes());
        bytes.extend_from_slice(&1u32.to_be_bytes()); // open folder
        bytes.extend_from_slice(b"8BIM");
        bytes.extend_from_slice(b"mul ");
        bytes.extend_from_slice(&1u32.to_be_bytes()); // scene group

        let info = read_layer_info(&mut PsdCursor::new(&bytes)).unwrap();

        match info {
            LayerInfo::SectionDivider(divider) => {
                assert_eq!(divider.divider_type(), DividerType::OpenFolder);
                assert_eq!(divider.blend_mode_override(), Some(BlendMode::Multiply));
                assert_eq!(divider.sub_type(), SubType::SceneGroup);
            }
            other => panic!("expected a section divider, got {:?}", other),
        }
    }

    #[test]
    fn short_divider_body() {
        let mut bytes = vec![];
        bytes.extend_from_slice(b"8BIM");
        bytes.extend_from_slice(b"lsct");
        bytes.extend_from_slice(&4u32.to_be_bytes());
        bytes.extend_from_slice(&3u32.to_be_bytes());

        let info = read_layer_info(&mut PsdCursor::new(&bytes)).unwrap();

        match info {
            LayerInfo::SectionDivider(divider) => {
                assert_eq!(divider.divider_type(), DividerType::BoundingSectionDivider);
                assert_eq!(divider.blend_mode_override(), None);
                assert_eq!(divider.sub_type(), SubType::Normal);
            }
            other => panic!("expected a section divider, got {:?}", other),
        }
    }

    #[test]
    fn unicode_name_block() {
        let mut bytes = vec![];
        bytes.extend_from_slice(b"8BIM");
        bytes.extend_from_slice(b"luni");
        bytes.extend_from_slice(&8u32.to_be_bytes());
        bytes.extend_from_slice(&2u32.to_be_bytes());
        bytes.extend_from_slice(&[0, b'o', 0, b'k']);

        let info = read_layer_info(&mut PsdCursor::new(&bytes)).unwrap();

        match info {
            LayerInfo::UnicodeName(name) => assert_eq!(name, "ok"),
            other => panic!("expected a unicode name, got {:?}", other),
        }
    }

    #[test]
    fn unknown_keys_are_retained_and_skipped_by_length() {
        let mut bytes = vec![];
        bytes.extend_from_slice(b"8B64");
        bytes.extend_from_slice(b"lyid");
        bytes.extend_from_slice(&4u32.to_be_bytes());
        bytes.extend_from_slice(&7u32.to_be_bytes());
        bytes.push(0xEE);

        let mut cursor = PsdCursor::new(&bytes);
        let info = read_layer_info(&mut cursor).unwrap();

        match info {
            LayerInfo::Opaque { key, data } => {
                assert_eq!(&key, b"lyid");
                assert_eq!(data, vec![0, 0, 0, 7]);
            }
            other => panic!("expected an opaque block, got {:?}", other),
        }
        assert_eq!(cursor.read_u8().unwrap(), 0xEE);
    }
}
