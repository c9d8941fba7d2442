//! Error types for ASN.1 element parsing and encoding.

use thiserror::Error;

/// Errors that can occur while converting between TLV nodes and typed
/// elements.
#[derive(Debug, Error)]
pub enum Error {
    // Integer errors
    #[error("INTEGER: no data")]
    IntegerNoData,

    // BitString errors
    #[error("BIT STRING: no data")]
    BitStringNoData,
    #[error("BIT STRING: unused bits {0} out of range (must be 0-7)")]
    BitStringUnusedBitsOutOfRange(u8),

    // ObjectIdentifier errors
    #[error("OBJECT IDENTIFIER: no data")]
    ObjectIdentifierNoData,
    #[error("OBJECT IDENTIFIER: incomplete encoding")]
    ObjectIdentifierIncompleteEncoding,
    #[error("OBJECT IDENTIFIER: too few components (need at least 2)")]
    ObjectIdentifierTooFewComponents,
    #[error("OBJECT IDENTIFIER: invalid component '{0}'")]
    ObjectIdentifierInvalidComponent(String),

    /// A tag outside the subset this codec represents
    #[error("unsupported tag 0x{0:02x}")]
    UnsupportedTag(u8),

    // DER errors
    #[error("invalid DER encoding: {0}")]
    FailedToDecodeDer(#[source] rsakit_der::error::Error),
}
