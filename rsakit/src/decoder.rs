//! Decoder trait for type-safe conversions.
//!
//! `Decoder<T, D>` converts a source type `T` into a destination type `D`.
//! The destination must be marked `DecodableFrom<T>`, which restricts the
//! conversion graph to the steps of the key-material pipeline.
//!
//! # Implementation Guide
//!
//! To add a new decodable type, implement both traits:
//!
//! ```no_run
//! use rsakit::decoder::{DecodableFrom, Decoder};
//!
//! struct Wire(Vec<u8>);
//! struct Parsed(String);
//!
//! #[derive(Debug)]
//! struct MyError;
//!
//! // 1. Mark the destination type as decodable from the source type
//! impl DecodableFrom<Wire> for Parsed {}
//!
//! // 2. Implement the decoder on the source type
//! impl Decoder<Wire, Parsed> for Wire {
//!     type Error = MyError;
//!
//!     fn decode(&self) -> Result<Parsed, Self::Error> {
//!         Ok(Parsed(String::from_utf8_lossy(&self.0).to_string()))
//!     }
//! }
//! ```

/// Decoder trait for converting from type `T` to type `D`.
///
/// Implemented by the source type `T`. The destination type must implement
/// `DecodableFrom<T>`, which keeps the set of conversions closed.
///
/// A single source type may decode into several destinations (a `Pem` block
/// decodes into raw bytes or into a `Der` document); the caller selects one
/// with a type annotation or turbofish.
pub trait Decoder<T, D: DecodableFrom<T>> {
    /// The error type returned when decoding fails.
    type Error;

    /// Decodes `self` into type `D`.
    ///
    /// # Errors
    ///
    /// Returns an error if the conversion fails. The specific error
    /// conditions depend on the implementing type.
    fn decode(&self) -> Result<D, Self::Error>;
}

/// Marker trait indicating that type `D` can be decoded from type `T`.
///
/// This trait has no methods. Implement it for every destination type that a
/// source type may decode into; `Decoder` bounds on it so that conversions
/// outside the pipeline do not exist at compile time.
pub trait DecodableFrom<T> {}
