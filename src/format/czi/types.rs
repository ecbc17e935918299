//! Enumerations stored as integer codes in CZI directory entries.

use std::fmt;

use serde::Serialize;

// =============================================================================
// PixelType
// =============================================================================

/// Pixel data type of a sub-block.
///
/// The numeric codes are fixed by the file format; gaps (5, 6, 7) are unused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PixelType {
    Undefined,
    /// 8 bit unsigned
    Gray8,
    /// 16 bit unsigned
    Gray16,
    /// 32 bit IEEE float
    Gray32Float,
    /// 8 bit blue, green, red triples
    Bgr24,
    /// 16 bit blue, green, red triples
    Bgr48,
    /// 32 bit float blue, green, red triples
    Bgr96Float,
    /// 8 bit blue, green, red, alpha
    Bgra32,
    /// Real and imaginary 32 bit floats
    Gray64ComplexFloat,
    /// Complex float triple
    Bgr192ComplexFloat,
    /// 32 bit integer
    Gray32,
    /// Double precision float
    Gray64,
}

impl PixelType {
    /// Decode a pixel type code. Unknown codes map to `Undefined`.
    pub const fn from_code(code: i32) -> Self {
        match code {
            0 => PixelType::Gray8,
            1 => PixelType::Gray16,
            2 => PixelType::Gray32Float,
            3 => PixelType::Bgr24,
            4 => PixelType::Bgr48,
            8 => PixelType::Bgr96Float,
            9 => PixelType::Bgra32,
            10 => PixelType::Gray64ComplexFloat,
            11 => PixelType::Bgr192ComplexFloat,
            12 => PixelType::Gray32,
            13 => PixelType::Gray64,
            _ => PixelType::Undefined,
        }
    }

    /// The on-disk code, or -1 for `Undefined`.
    pub const fn code(&self) -> i32 {
        match self {
            PixelType::Undefined => -1,
            PixelType::Gray8 => 0,
            PixelType::Gray16 => 1,
            PixelType::Gray32Float => 2,
            PixelType::Bgr24 => 3,
            PixelType::Bgr48 => 4,
            PixelType::Bgr96Float => 8,
            PixelType::Bgra32 => 9,
            PixelType::Gray64ComplexFloat => 10,
            PixelType::Bgr192ComplexFloat => 11,
            PixelType::Gray32 => 12,
            PixelType::Gray64 => 13,
        }
    }

    /// Parse the name used in the XML metadata (`<PixelType>Gray16</PixelType>`).
    pub fn from_name(name: &str) -> Self {
        match name.trim() {
            "Gray8" => PixelType::Gray8,
            "Gray16" => PixelType::Gray16,
            "Gray32Float" => PixelType::Gray32Float,
            "Bgr24" => PixelType::Bgr24,
            "Bgr48" => PixelType::Bgr48,
            "Bgr96Float" => PixelType::Bgr96Float,
            "Bgra32" => PixelType::Bgra32,
            "Gray64ComplexFloat" => PixelType::Gray64ComplexFloat,
            "Bgr192ComplexFloat" => PixelType::Bgr192ComplexFloat,
            "Gray32" => PixelType::Gray32,
            "Gray64" => PixelType::Gray64,
            _ => PixelType::Undefined,
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            PixelType::Undefined => "Undefined",
            PixelType::Gray8 => "Gray8",
            PixelType::Gray16 => "Gray16",
            PixelType::Gray32Float => "Gray32Float",
            PixelType::Bgr24 => "Bgr24",
            PixelType::Bgr48 => "Bgr48",
            PixelType::Bgr96Float => "Bgr96Float",
            PixelType::Bgra32 => "Bgra32",
            PixelType::Gray64ComplexFloat => "Gray64ComplexFloat",
            PixelType::Bgr192ComplexFloat => "Bgr192ComplexFloat",
            PixelType::Gray32 => "Gray32",
            PixelType::Gray64 => "Gray64",
        }
    }

    /// Bytes per pixel, 0 for `Undefined`.
    pub const fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelType::Undefined => 0,
            PixelType::Gray8 => 1,
            PixelType::Gray16 => 2,
            PixelType::Gray32Float => 4,
            PixelType::Bgr24 => 3,
            PixelType::Bgr48 => 6,
            PixelType::Bgr96Float => 12,
            PixelType::Bgra32 => 4,
            PixelType::Gray64ComplexFloat => 8,
            PixelType::Bgr192ComplexFloat => 24,
            PixelType::Gray32 => 4,
            PixelType::Gray64 => 8,
        }
    }

    /// NRRD type name for the single-channel types skim can point at directly.
    pub const fn nrrd_type(&self) -> Option<&'static str> {
        match self {
            PixelType::Gray8 => Some("uchar"),
            PixelType::Gray16 => Some("ushort"),
            PixelType::Gray32Float => Some("float"),
            _ => None,
        }
    }
}

impl fmt::Display for PixelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Compression
// =============================================================================

/// Compression scheme of a sub-block's pixel data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Compression {
    Raw,
    JpgFile,
    Lzw,
    JpegXrFile,
    Unknown(i32),
}

impl Compression {
    pub const fn from_code(code: i32) -> Self {
        match code {
            0 => Compression::Raw,
            1 => Compression::JpgFile,
            2 => Compression::Lzw,
            3 => Compression::JpegXrFile,
            other => Compression::Unknown(other),
        }
    }

    pub const fn code(&self) -> i32 {
        match self {
            Compression::Raw => 0,
            Compression::JpgFile => 1,
            Compression::Lzw => 2,
            Compression::JpegXrFile => 3,
            Compression::Unknown(code) => *code,
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Compression::Raw => f.write_str("Raw"),
            Compression::JpgFile => f.write_str("JpgFile"),
            Compression::Lzw => f.write_str("Lzw"),
            Compression::JpegXrFile => f.write_str("JpegXrFile"),
            Compression::Unknown(code) => write!(f, "Unknown({})", code),
        }
    }
}

// =============================================================================
// PyramidType
// =============================================================================

/// Whether a sub-block belongs to an image pyramid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PyramidType {
    None,
    SingleSubBlock,
    MultiSubBlock,
    Unknown(u8),
}

impl PyramidType {
    pub const fn from_code(code: u8) -> Self {
        match code {
            0 => PyramidType::None,
            1 => PyramidType::SingleSubBlock,
            2 => PyramidType::MultiSubBlock,
            other => PyramidType::Unknown(other),
        }
    }
}
