use std::path::PathBuf;

/// Why a load failed. No partial bitmap is ever handed back alongside one.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Cannot open `{}`", .path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Resource `{0}` not found")]
    ResourceNotFound(String),

    #[error("Decoder could not be set up: {0}")]
    DecoderInitFailed(String),

    #[error("Malformed PNG data")]
    Decode(#[source] png::DecodingError),

    #[error("Destination bitmap is {}x{}, image needs {}x{}", .actual.0, .actual.1, .expected.0, .expected.1)]
    DestinationSizeMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error("Destination bitmap storage holds {available} bytes, {required} required")]
    DestinationStorage { required: usize, available: usize },

    #[error("Data does not start with a PNG signature")]
    UnsupportedSignature,

    #[error("No loader accepts `{}`", .0.display())]
    UnsupportedExtension(PathBuf),

    #[error("Decoder produced unsupported pixel layout {0}")]
    UnsupportedFormat(String),
}

/// Coarse classification of [`LoadError`], for callers that only branch on it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    SourceUnavailable,
    DecoderInitFailed,
    DecodeError,
    DestinationSizeMismatch,
    UnsupportedSignature,
    UnsupportedExtension,
    UnsupportedFormat,
}

impl LoadError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LoadError::SourceUnavailable { .. } | LoadError::ResourceNotFound(_) => {
                ErrorKind::SourceUnavailable
            }
            LoadError::DecoderInitFailed(_) => ErrorKind::DecoderInitFailed,
            LoadError::Decode(_) => ErrorKind::DecodeError,
            LoadError::DestinationSizeMismatch { .. } | LoadError::DestinationStorage { .. } => {
                ErrorKind::DestinationSizeMismatch
            }
            LoadError::UnsupportedSignature => ErrorKind::UnsupportedSignature,
            LoadError::UnsupportedExtension(_) => ErrorKind::UnsupportedExtension,
            LoadError::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
        }
    }
}

impl From<png::DecodingError> for LoadError {
    fn from(e: png::DecodingError) -> Self {
        match e {
            png::DecodingError::LimitsExceeded => {
                LoadError::DecoderInitFailed("memory limit exceeded".to_string())
            }
            e => LoadError::Decode(e),
        }
    }
}

#[test]
fn limits_map_to_init_failure() {
    let err = LoadError::from(png::DecodingError::LimitsExceeded);
    assert_eq!(err.kind(), ErrorKind::DecoderInitFailed);

    let io = std::io::Error::from(std::io::ErrorKind::UnexpectedEof);
    let err = LoadError::from(png::DecodingError::from(io));
    assert_eq!(err.kind(), ErrorKind::DecodeError);
}
