use thiserror::Error;

/// I/O errors that can occur when reading from a file
#[derive(Debug, Clone, Error)]
pub enum IoError {
    /// Error from the underlying file system
    #[error("File error: {0}")]
    File(String),

    /// Requested range exceeds resource bounds
    #[error("Range out of bounds: requested {requested} bytes at offset {offset}, size is {size}")]
    RangeOutOfBounds {
        offset: u64,
        requested: u64,
        size: u64,
    },

    /// File not found
    #[error("File not found: {0}")]
    NotFound(String),
}

impl From<std::io::Error> for IoError {
    fn from(err: std::io::Error) -> Self {
        IoError::File(err.to_string())
    }
}

/// Errors related to format detection
#[derive(Debug, Clone, Error)]
pub enum FormatError {
    /// I/O error while reading the file
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// File format is not supported
    #[error("Unsupported format: {reason}")]
    UnsupportedFormat { reason: String },
}

/// Errors that can occur when parsing CZI files
#[derive(Debug, Clone, Error)]
pub enum CziError {
    /// I/O error while reading the file
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// Not enough bytes to decode a structure
    #[error("Truncated {what}: need {required} bytes, got {actual}")]
    Truncated {
        what: &'static str,
        required: usize,
        actual: usize,
    },

    /// No ZISRAWFILE segment anywhere in the file
    #[error("No ZISRAWFILE segment found")]
    MissingFileHeader,

    /// A segment with a different id sits where one was expected
    #[error("Expected {expected} segment at offset {offset}, found {found}")]
    UnexpectedSegment {
        expected: String,
        found: String,
        offset: u64,
    },

    /// Directory entry schema is not "DV"
    #[error("Unsupported directory entry schema: {0:?}")]
    UnsupportedSchema(String),

    /// Directory entry declares more dimensions than the format allows
    #[error("Too many dimensions: {0} (at most 12)")]
    TooManyDimensions(i32),

    /// Plane pixels cannot be widened to f32
    #[error("Cannot decode planes of pixel type {0}")]
    UnsupportedPlaneType(String),

    /// Plane byte count does not fit in memory
    #[error("Plane of {size_x}x{size_y} pixels is too large")]
    PlaneTooLarge { size_x: usize, size_y: usize },

    /// Metadata XML could not be parsed
    #[error("Could not parse XML metadata: {0}")]
    Xml(String),
}

/// Errors raised while writing NRRD output
#[derive(Debug, Clone, Error)]
pub enum NrrdError {
    /// Pixel type has no NRRD equivalent we can emit
    #[error("Unsupported NRRD pixel type: {0}")]
    UnsupportedType(String),

    /// Axis sizes do not describe the data buffer
    #[error("NRRD size mismatch: axes describe {expected} samples, buffer has {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// Labels must be given per axis
    #[error("NRRD label count {labels} does not match dimension {dimension}")]
    LabelMismatch { labels: usize, dimension: usize },

    /// Sample count overflows or cannot be allocated
    #[error("NRRD volume with sizes {sizes:?} is too large")]
    TooLarge { sizes: Vec<usize> },

    /// Writing the output file failed
    #[error("I/O error: {0}")]
    Io(#[from] IoError),
}

/// Errors from the skim pipeline and the nhdr check
#[derive(Debug, Clone, Error)]
pub enum SkimError {
    /// CZI parsing failed
    #[error("CZI error: {0}")]
    Czi(#[from] CziError),

    /// NRRD output failed
    #[error("NRRD error: {0}")]
    Nrrd(#[from] NrrdError),

    /// Output file could not be written
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// Input does not carry the .czi suffix
    #[error("Input file {0} does not end with .czi")]
    NotCzi(String),

    /// XML metadata declares a pixel type we cannot extract
    #[error("XML indicates non-supported PixelType: {0}")]
    UnsupportedPixelType(String),

    /// Sub-block pixel type disagrees with the metadata
    #[error("Sub-block at offset {offset} has pixel type {found}, XML says {expected}")]
    PixelTypeMismatch {
        offset: u64,
        expected: String,
        found: String,
    },

    /// Sub-block is compressed
    #[error("Sub-block at offset {offset} uses unsupported compression {compression}")]
    UnsupportedCompression { offset: u64, compression: String },

    /// Image dimensions in the metadata are unusable
    #[error("Invalid image dimensions: {0}")]
    InvalidDimensions(String),

    /// A plane addresses a channel or slice outside the metadata sizes
    #[error("Plane c={c} z={z} is outside {size_c} channels x {size_z} slices")]
    PlaneOutOfRange {
        c: i32,
        z: i32,
        size_c: usize,
        size_z: usize,
    },

    /// The file contains no image sub-blocks
    #[error("No image sub-blocks found in {0}")]
    NoSubBlocks(String),

    /// Path given to the nhdr check is not a directory
    #[error("{0} does not exist or is not a directory")]
    NotADirectory(String),
}
