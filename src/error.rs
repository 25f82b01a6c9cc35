//! Crate-wide error type.

/// A specialized [`Result`](std::result::Result) for QSH decoding.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can arise while opening or decoding a QSH stream.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Neither the gzip-decompressed nor the raw byte stream started with the
    /// QSH signature.
    #[error("unsupported file format: signature mismatch")]
    UnsupportedFormat,

    /// A primitive read needed more bytes than remained in the stream. Not
    /// recoverable on the same decoder instance.
    #[error("unexpected end of stream")]
    EndOfStream,

    /// An I/O failure that is not itself a short read (file not found,
    /// permission denied, ...).
    #[error("i/o error: {0}")]
    Io(std::io::Error),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::UnexpectedEof => Error::EndOfStream,
            _ => Error::Io(err),
        }
    }
}

impl From<leb128::read::Error> for Error {
    fn from(err: leb128::read::Error) -> Self {
        match err {
            leb128::read::Error::IoError(io_err) => io_err.into(),
            leb128::read::Error::Overflow => Error::EndOfStream,
        }
    }
}

impl From<std::string::FromUtf8Error> for Error {
    fn from(_: std::string::FromUtf8Error) -> Self {
        Error::EndOfStream
    }
}
