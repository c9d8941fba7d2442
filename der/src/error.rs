use thiserror::Error;

/// Errors produced while parsing DER tag-length-value structures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// A declared length exceeds the remaining input, or the input ends
    /// mid-field.
    #[error("truncated input: declared length exceeds remaining data")]
    Truncated,

    /// A long-form length field is wider than this codec supports.
    #[error("unsupported length field width")]
    InvalidLength,

    /// Any other parser failure.
    #[error("parser error {0:?}")]
    Parser(nom::error::ErrorKind),
}

impl Error {
    pub(crate) fn from_nom(err: nom::Err<nom::error::Error<&[u8]>>) -> Self {
        match err {
            nom::Err::Incomplete(_) => Error::Truncated,
            nom::Err::Error(e) | nom::Err::Failure(e) => match e.code {
                nom::error::ErrorKind::Eof => Error::Truncated,
                nom::error::ErrorKind::TooLarge => Error::InvalidLength,
                kind => Error::Parser(kind),
            },
        }
    }
}
