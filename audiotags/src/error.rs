use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The native engine could not recognise or open the input.
    #[error("cannot process {0}")]
    BadFile(String),

    #[error("unsupported image format: {0:?}")]
    UnsupportedFormat(image::ImageFormat),

    #[error("can't write empty image")]
    EmptyPayload,

    #[error("image codec error: {0}")]
    Codec(#[from] image::ImageError),

    /// The native engine reported failure; it gives no further detail.
    #[error("native write failed: {0}")]
    WriteFailure(&'static str),

    /// Text that cannot cross the boundary (interior NUL or the value separator).
    #[error("invalid text for {0:?}")]
    InvalidText(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
