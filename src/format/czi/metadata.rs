//! Metadata segment and XML image dimensions.
//!
//! The `ZISRAWMETADATA` body starts with a 256-byte header part:
//!
//! ```text
//! Bytes 0-3  : XmlSize (u32)
//! Bytes 4-7  : AttachmentSize (u32)
//! Bytes 8-255: Spare
//! ```
//!
//! followed by `XmlSize` bytes of UTF-8 XML. The XML is large (instrument,
//! acquisition and display settings) but skim only needs the image sizes,
//! the voxel scaling and the pixel type.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::Serialize;

use super::types::PixelType;
use crate::error::CziError;
use crate::io::read_u32_le;

/// Size of the metadata segment header part in bytes.
pub const METADATA_HEADER_SIZE: usize = 256;

// =============================================================================
// MetadataSegmentHeader
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetadataSegmentHeader {
    pub xml_size: u32,
    pub attachment_size: u32,
}

impl MetadataSegmentHeader {
    pub fn parse(bytes: &[u8]) -> Result<Self, CziError> {
        if bytes.len() < 8 {
            return Err(CziError::Truncated {
                what: "metadata segment header",
                required: 8,
                actual: bytes.len(),
            });
        }
        Ok(Self {
            xml_size: read_u32_le(&bytes[0..4]),
            attachment_size: read_u32_le(&bytes[4..8]),
        })
    }

    pub fn to_bytes(&self) -> [u8; METADATA_HEADER_SIZE] {
        let mut out = [0u8; METADATA_HEADER_SIZE];
        out[0..4].copy_from_slice(&self.xml_size.to_le_bytes());
        out[4..8].copy_from_slice(&self.attachment_size.to_le_bytes());
        out
    }
}

// =============================================================================
// ImageDims
// =============================================================================

/// Image geometry pulled out of the XML metadata.
///
/// Scaling values are in meters per pixel, as stored by the acquisition
/// software.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageDims {
    pub size_x: usize,
    pub size_y: usize,
    pub size_z: usize,
    pub size_c: usize,
    pub size_t: usize,
    pub scaling_x: f64,
    pub scaling_y: f64,
    pub scaling_z: f64,
    pub pixel_type: PixelType,
}

impl Default for ImageDims {
    fn default() -> Self {
        Self {
            size_x: 0,
            size_y: 0,
            size_z: 0,
            size_c: 0,
            size_t: 0,
            scaling_x: 0.0,
            scaling_y: 0.0,
            scaling_z: 0.0,
            pixel_type: PixelType::Undefined,
        }
    }
}

/// Elements whose text we pick up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    SizeX,
    SizeY,
    SizeZ,
    SizeC,
    SizeT,
    ScalingX,
    ScalingY,
    ScalingZ,
    PixelType,
    DistanceValue,
}

impl Field {
    fn from_name(name: &[u8]) -> Option<Self> {
        Some(match name {
            b"SizeX" => Field::SizeX,
            b"SizeY" => Field::SizeY,
            b"SizeZ" => Field::SizeZ,
            b"SizeC" => Field::SizeC,
            b"SizeT" => Field::SizeT,
            b"ScalingX" => Field::ScalingX,
            b"ScalingY" => Field::ScalingY,
            b"ScalingZ" => Field::ScalingZ,
            b"PixelType" => Field::PixelType,
            _ => return None,
        })
    }
}

/// Scaling as given by `<Distance Id="X"><Value>..</Value></Distance>`.
#[derive(Debug, Default)]
struct DistanceScaling {
    x: Option<f64>,
    y: Option<f64>,
    z: Option<f64>,
}

impl ImageDims {
    /// Parse dimensions from the metadata XML.
    ///
    /// Every matching element in the document is visited; if an element
    /// appears more than once, the last one wins. Numbers that do not parse
    /// read as zero.
    pub fn from_xml(xml: &str) -> Result<Self, CziError> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut dims = ImageDims::default();
        let mut explicit = [false; 3];
        let mut distances = DistanceScaling::default();

        // Current capture target and the element depth it started at
        let mut capture: Option<(Field, usize)> = None;
        let mut text = String::new();
        let mut depth = 0usize;
        // Id of the innermost open <Distance>, with its depth
        let mut distance: Option<(String, usize)> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) => {
                    depth += 1;
                    let name = e.local_name();
                    let name = name.as_ref();

                    if name == b"Distance" {
                        distance = distance_id(e)?.map(|id| (id, depth));
                    }

                    if capture.is_none() {
                        let field = Field::from_name(name).or_else(|| {
                            let in_distance =
                                matches!(distance, Some((_, d)) if d + 1 == depth);
                            (name == b"Value" && in_distance).then_some(Field::DistanceValue)
                        });
                        if let Some(field) = field {
                            capture = Some((field, depth));
                            text.clear();
                        }
                    }
                }
                Ok(Event::Empty(ref e)) => {
                    // <SizeZ/> is an empty value, which atoi reads as zero
                    if let Some(field) = Field::from_name(e.local_name().as_ref()) {
                        if capture.is_none() {
                            dims.assign(field, "", &mut explicit);
                        }
                    }
                }
                Ok(Event::Text(ref e)) => {
                    if capture.is_some() {
                        let value = e.unescape().map_err(|e| CziError::Xml(e.to_string()))?;
                        text.push_str(&value);
                    }
                }
                Ok(Event::CData(ref e)) => {
                    if capture.is_some() {
                        text.push_str(&String::from_utf8_lossy(e));
                    }
                }
                Ok(Event::End(_)) => {
                    if let Some((field, d)) = capture {
                        if d == depth {
                            if field == Field::DistanceValue {
                                if let Some((ref id, _)) = distance {
                                    distances.set(id, parse_float(&text));
                                }
                            } else {
                                dims.assign(field, &text, &mut explicit);
                            }
                            capture = None;
                        }
                    }
                    if matches!(distance, Some((_, d)) if d == depth) {
                        distance = None;
                    }
                    depth = depth.saturating_sub(1);
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => {
                    return Err(CziError::Xml(format!(
                        "at position {}: {}",
                        reader.buffer_position(),
                        e
                    )))
                }
            }
        }

        if depth != 0 {
            return Err(CziError::Xml("unexpected end of document".to_string()));
        }

        if !explicit[0] {
            dims.scaling_x = distances.x.unwrap_or(0.0);
        }
        if !explicit[1] {
            dims.scaling_y = distances.y.unwrap_or(0.0);
        }
        if !explicit[2] {
            dims.scaling_z = distances.z.unwrap_or(0.0);
        }

        Ok(dims)
    }

    fn assign(&mut self, field: Field, text: &str, explicit: &mut [bool; 3]) {
        match field {
            Field::SizeX => self.size_x = parse_size(text),
            Field::SizeY => self.size_y = parse_size(text),
            Field::SizeZ => self.size_z = parse_size(text),
            Field::SizeC => self.size_c = parse_size(text),
            Field::SizeT => self.size_t = parse_size(text),
            Field::ScalingX => {
                self.scaling_x = parse_float(text);
                explicit[0] = true;
            }
            Field::ScalingY => {
                self.scaling_y = parse_float(text);
                explicit[1] = true;
            }
            Field::ScalingZ => {
                self.scaling_z = parse_float(text);
                explicit[2] = true;
            }
            Field::PixelType => self.pixel_type = PixelType::from_name(text),
            Field::DistanceValue => {}
        }
    }

    /// Bytes per pixel of the declared pixel type.
    pub fn pixel_size(&self) -> usize {
        self.pixel_type.bytes_per_pixel()
    }

    /// Pixels in one (X, Y) plane, or `None` if the count overflows.
    pub fn plane_pixels(&self) -> Option<usize> {
        self.size_x.checked_mul(self.size_y)
    }

    /// Bytes of one raw (X, Y) plane, or `None` if the count overflows.
    pub fn plane_bytes(&self) -> Option<usize> {
        self.plane_pixels()?.checked_mul(self.pixel_size())
    }

    /// Number of planes a complete acquisition holds. Missing channel or
    /// slice counts mean one.
    pub fn expected_planes(&self) -> Option<usize> {
        self.size_c.max(1).checked_mul(self.size_z.max(1))
    }
}

impl DistanceScaling {
    fn set(&mut self, id: &str, value: f64) {
        match id {
            "X" => self.x = Some(value),
            "Y" => self.y = Some(value),
            "Z" => self.z = Some(value),
            _ => {}
        }
    }
}

fn distance_id(e: &BytesStart<'_>) -> Result<Option<String>, CziError> {
    let attr = e
        .try_get_attribute("Id")
        .map_err(|e| CziError::Xml(e.to_string()))?;
    match attr {
        Some(attr) => {
            let value = attr
                .unescape_value()
                .map_err(|e| CziError::Xml(e.to_string()))?;
            Ok(Some(value.into_owned()))
        }
        None => Ok(None),
    }
}

/// Leading-integer parse: "512 px" reads 512, junk and negatives read 0.
fn parse_size(text: &str) -> usize {
    let text = text.trim_start();
    let digits = text
        .char_indices()
        .take_while(|(i, c)| c.is_ascii_digit() || (*i == 0 && *c == '+'))
        .count();
    text[..digits].parse().unwrap_or(0)
}

/// Leading-float parse; accepts exponents like "1.3E-07".
fn parse_float(text: &str) -> f64 {
    let text = text.trim();
    if let Ok(value) = text.parse() {
        return value;
    }
    // Longest prefix that parses
    (1..=text.len())
        .rev()
        .filter(|&end| text.is_char_boundary(end))
        .find_map(|end| text[..end].parse().ok())
        .unwrap_or(0.0)
}
