//! Encoder trait for type-safe conversions.
//!
//! The mirror image of [`crate::decoder`]: `Encoder<T, E>` converts a value
//! back toward the wire, one pipeline step at a time
//! (`ASN1Object → Der → Vec<u8>`), with `EncodableTo` marking the valid
//! steps.

/// Encoder trait for converting type `T` into type `E`.
///
/// Implemented by the source type `T` (usually `Self`). The destination type
/// must implement `EncodableTo<T>`.
pub trait Encoder<T, E: EncodableTo<T>> {
    /// The error type returned when encoding fails.
    type Error;

    /// Encodes `self` into type `E`.
    ///
    /// # Errors
    ///
    /// Returns an error if the conversion fails.
    fn encode(&self) -> Result<E, Self::Error>;
}

/// Marker trait indicating that type `T` can be encoded into type `E`.
///
/// No methods; exists only to close the conversion graph at compile time.
pub trait EncodableTo<T> {}
