pub mod tools;
pub mod huff;

/// Broad classification of `Error` values
#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub enum ErrorKind {
    /// storage could not be read or written
    Io,
    /// compressed data is malformed or truncated
    Format,
    /// input exceeds what the file format can describe
    Capacity
}

/// Codec Errors
#[derive(thiserror::Error,Debug)]
pub enum Error {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("input changed between passes")]
    InputChanged,
    #[error("file format mismatch")]
    FileFormatMismatch,
    #[error("frequency header is truncated")]
    TruncatedHeader,
    #[error("payload ended after {decoded} of {expected} symbols")]
    TruncatedPayload { decoded: u64, expected: u64 },
    #[error("payload contains a code that is not in the tree")]
    InvalidCode,
    #[error("unexpected data after payload")]
    TrailingData,
    #[error("file too large")]
    FileTooLarge
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Io(_) | Error::InputChanged => ErrorKind::Io,
            Error::FileTooLarge => ErrorKind::Capacity,
            _ => ErrorKind::Format
        }
    }
}

/// Options controlling compression
#[derive(Clone)]
pub struct Options {
    /// starting position in the input file
    pub in_offset: u64,
    /// starting position in the output file
    pub out_offset: u64,
    /// return error if file is larger, cannot usefully exceed u32::MAX
    pub max_file_size: u64
}

pub const STD_OPTIONS: Options = Options {
    in_offset: 0,
    out_offset: 0,
    max_file_size: u32::MAX as u64
};

#[test]
fn error_kinds() {
    let denied = std::io::Error::new(std::io::ErrorKind::PermissionDenied,"denied");
    assert_eq!(Error::from(denied).kind(),ErrorKind::Io);
    assert_eq!(Error::InputChanged.kind(),ErrorKind::Io);
    assert_eq!(Error::TruncatedHeader.kind(),ErrorKind::Format);
    assert_eq!(Error::TruncatedPayload { decoded: 1, expected: 2 }.kind(),ErrorKind::Format);
    assert_eq!(Error::FileTooLarge.kind(),ErrorKind::Capacity);
}
