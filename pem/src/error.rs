use base64::DecodeError;
use thiserror::Error;

/// Errors that can occur when stripping a PEM block.
///
/// The framer is deliberately lenient about boundary markers (see the crate
/// docs); the only hard failure is a body that does not decode as base64.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// Failed to decode the base64 body
    #[error("base64 decode: {0}")]
    Base64Decode(DecodeError),
}
