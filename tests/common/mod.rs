//! A small in-test PSD writer.
//!
//! The fixtures these tests parse are synthesized here byte by byte, so each
//! test states exactly the wire layout it exercises: header, skipped color
//! mode data and image resources, layer records with channel data, and the
//! merged image data section.

#![allow(dead_code)]

/// One channel of a test layer: a wire id, a raw raster and how to encode it.
pub struct ChannelSpec {
    pub id: i16,
    pub raster: Vec<u8>,
    /// 0 = raw, 1 = RLE, 2/3 = ZIP (written with no payload).
    pub compression: u16,
}

/// A mask for a test layer, written in the 20-byte short form.
pub struct MaskSpec {
    /// (top, left, bottom, right)
    pub rect: (i32, i32, i32, i32),
    pub default_color: u8,
    pub flags: u8,
}

/// An `lsct` block for a test layer.
pub struct DividerSpec {
    pub divider_type: u32,
    pub blend_key: Option<[u8; 4]>,
}

pub struct TestLayer {
    pub name: String,
    /// (top, left, bottom, right)
    pub rect: (i32, i32, i32, i32),
    pub channels: Vec<ChannelSpec>,
    pub blend_key: [u8; 4],
    pub opacity: u8,
    pub flags: u8,
    pub mask: Option<MaskSpec>,
    pub divider: Option<DividerSpec>,
}

impl TestLayer {
    /// A solid-color RGBA layer covering `rect`.
    pub fn solid(name: &str, rect: (i32, i32, i32, i32), rgba: [u8; 4], blend_key: [u8; 4]) -> TestLayer {
        let (top, left, bottom, right) = rect;
        let pixels = ((bottom - top) * (right - left)).max(0) as usize;

        let channels = [0i16, 1, 2, -1]
            .iter()
            .zip(rgba.iter())
            .map(|(&id, &value)| ChannelSpec {
                id,
                raster: vec![value; pixels],
                compression: 0,
            })
            .collect();

        TestLayer {
            name: name.to_string(),
            rect,
            channels,
            blend_key,
            opacity: 255,
            flags: 0,
            mask: None,
            divider: None,
        }
    }

    /// An open-folder marker layer.
    pub fn group(name: &str, blend_key: [u8; 4]) -> TestLayer {
        TestLayer {
            name: name.to_string(),
            rect: (0, 0, 0, 0),
            channels: vec![],
            blend_key,
            opacity: 255,
            flags: 0,
            mask: None,
            divider: Some(DividerSpec {
                divider_type: 1,
                blend_key: Some(blend_key),
            }),
        }
    }

    /// The hidden marker layer that terminates a group's contents.
    pub fn bounding_divider() -> TestLayer {
        TestLayer {
            name: "</Layer group>".to_string(),
            rect: (0, 0, 0, 0),
            channels: vec![],
            blend_key: *b"norm",
            opacity: 255,
            flags: 0,
            mask: None,
            divider: Some(DividerSpec {
                divider_type: 3,
                blend_key: None,
            }),
        }
    }

    pub fn hidden(mut self) -> TestLayer {
        self.flags |= 1 << 1;
        self
    }

    pub fn with_opacity(mut self, opacity: u8) -> TestLayer {
        self.opacity = opacity;
        self
    }

    pub fn with_mask(mut self, mask: MaskSpec, data: Vec<u8>) -> TestLayer {
        self.channels.push(ChannelSpec {
            id: -2,
            raster: data,
            compression: 0,
        });
        self.mask = Some(mask);
        self
    }

    fn channel_dimensions(&self, id: i16) -> (usize, usize) {
        let (top, left, bottom, right) = if id == -2 || id == -3 {
            self.mask.as_ref().map(|mask| mask.rect).unwrap_or((0, 0, 0, 0))
        } else {
            self.rect
        };

        (
            (right - left).max(0) as usize,
            (bottom - top).max(0) as usize,
        )
    }
}

/// Serialize a full PSD: header, empty color mode data and image resources,
/// the layer and mask information section, and raw merged image data (one
/// plane per header channel, zero-filled when not supplied).
pub fn build_psd(
    width: u32,
    height: u32,
    channel_count: u16,
    color_mode: u16,
    layers: &[TestLayer],
    merged_planes: Option<Vec<Vec<u8>>>,
) -> Vec<u8> {
    let mut bytes = vec![];

    // File header.
    bytes.extend_from_slice(b"8BPS");
    bytes.extend_from_slice(&1u16.to_be_bytes());
    bytes.extend_from_slice(&[0; 6]);
    bytes.extend_from_slice(&channel_count.to_be_bytes());
    bytes.extend_from_slice(&height.to_be_bytes());
    bytes.extend_from_slice(&width.to_be_bytes());
    bytes.extend_from_slice(&8u16.to_be_bytes());
    bytes.extend_from_slice(&color_mode.to_be_bytes());

    // Color mode data and image resources: empty.
    bytes.extend_from_slice(&0u32.to_be_bytes());
    bytes.extend_from_slice(&0u32.to_be_bytes());

    // Layer and mask information section.
    let layer_and_mask = layer_and_mask_section(layers);
    bytes.extend_from_slice(&(layer_and_mask.len() as u32).to_be_bytes());
    bytes.extend_from_slice(&layer_and_mask);

    // Merged image data: raw compression, channel-planar.
    bytes.extend_from_slice(&0u16.to_be_bytes());
    let plane_size = (width * height) as usize;
    let planes =
        merged_planes.unwrap_or_else(|| vec![vec![0; plane_size]; channel_count as usize]);
    assert_eq!(planes.len(), channel_count as usize);
    for plane in planes {
        assert_eq!(plane.len(), plane_size);
        bytes.extend_from_slice(&plane);
    }

    bytes
}

fn layer_and_mask_section(layers: &[TestLayer]) -> Vec<u8> {
    if layers.is_empty() {
        return vec![];
    }

    let mut layer_info = vec![];
    layer_info.extend_from_slice(&(layers.len() as i16).to_be_bytes());

    for layer in layers {
        layer_info.extend_from_slice(&layer_record(layer));
    }
    for layer in layers {
        for channel in &layer.channels {
            let (width, height) = layer.channel_dimensions(channel.id);
            layer_info.extend_from_slice(&channel_payload(channel, width, height));
        }
    }

    let mut section = vec![];
    section.extend_from_slice(&(layer_info.len() as u32).to_be_bytes());
    section.extend_from_slice(&layer_info);
    // Global layer mask info: empty.
    section.extend_from_slice(&0u32.to_be_bytes());

    section
}

fn layer_record(layer: &TestLayer) -> Vec<u8> {
    let mut record = vec![];

    for value in [layer.rect.0, layer.rect.1, layer.rect.2, layer.rect.3] {
        record.extend_from_slice(&value.to_be_bytes());
    }

    record.extend_from_slice(&(layer.channels.len() as u16).to_be_bytes());
    for channel in &layer.channels {
        let (width, height) = layer.channel_dimensions(channel.id);
        let payload_len = channel_payload(channel, width, height).len() as u32;
        record.extend_from_slice(&channel.id.to_be_bytes());
        record.extend_from_slice(&payload_len.to_be_bytes());
    }

    record.extend_from_slice(b"8BIM");
    record.extend_from_slice(&layer.blend_key);
    record.push(layer.opacity);
    record.push(0); // clipping: base
    record.push(layer.flags);
    record.push(0); // filler

    // Extra data: mask, blending ranges, name, info blocks.
    let mut extra = vec![];

    match &layer.mask {
        Some(mask) => {
            extra.extend_from_slice(&20u32.to_be_bytes());
            for value in [mask.rect.0, mask.rect.1, mask.rect.2, mask.rect.3] {
                extra.extend_from_slice(&value.to_be_bytes());
            }
            extra.push(mask.default_color);
            extra.push(mask.flags);
            extra.extend_from_slice(&[0, 0]); // padding
        }
        None => extra.extend_from_slice(&0u32.to_be_bytes()),
    }

    // Blending ranges: the composite gray pair, all zeroes.
    extra.extend_from_slice(&8u32.to_be_bytes());
    extra.extend_from_slice(&[0; 8]);

    extra.extend_from_slice(&pascal_string(&layer.name));

    if let Some(divider) = &layer.divider {
        extra.extend_from_slice(b"8BIM");
        extra.extend_from_slice(b"lsct");
        match divider.blend_key {
            Some(key) => {
                extra.extend_from_slice(&12u32.to_be_bytes());
                extra.extend_from_slice(&divider.divider_type.to_be_bytes());
                extra.extend_from_slice(b"8BIM");
                extra.extend_from_slice(&key);
            }
            None => {
                extra.extend_from_slice(&4u32.to_be_bytes());
                extra.extend_from_slice(&divider.divider_type.to_be_bytes());
            }
        }
    }

    record.extend_from_slice(&(extra.len() as u32).to_be_bytes());
    record.extend_from_slice(&extra);

    record
}

/// A Pascal string padded to a multiple of 4, as layer names are.
fn pascal_string(value: &str) -> Vec<u8> {
    let mut bytes = vec![value.len() as u8];
    bytes.extend_from_slice(value.as_bytes());
    while bytes.len() % 4 != 0 {
        bytes.push(0);
    }
    bytes
}

/// A channel's wire payload: the compression code plus encoded scanlines.
fn channel_payload(channel: &ChannelSpec, width: usize, height: usize) -> Vec<u8> {
    let mut payload = vec![];
    payload.extend_from_slice(&channel.compression.to_be_bytes());

    match channel.compression {
        0 => payload.extend_from_slice(&channel.raster),
        1 => {
            assert!(width >= 1 && width <= 128, "test RLE encoder wants short rows");
            let rows: Vec<&[u8]> = channel.raster.chunks(width).collect();
            assert_eq!(rows.len(), height);

            // Each row becomes one literal run: header byte (width - 1),
            // then the row itself.
            for _ in &rows {
                payload.extend_from_slice(&((width + 1) as u16).to_be_bytes());
            }
            for row in &rows {
                payload.push((width - 1) as u8);
                payload.extend_from_slice(row);
            }
        }
        _ => {} // ZIP: the parser must reject it before reading a payload
    }

    payload
}
