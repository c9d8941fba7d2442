//! # rsakit
//!
//! Core traits for encoding and decoding in the rsakit RSA key codec.
//!
//! This crate defines the `Decoder` and `Encoder` traits that establish a
//! type-safe conversion pattern used throughout rsakit.
//!
//! ## Overview
//!
//! The conversion pattern flows like this:
//! ```text
//! PEM text → Pem → Der → ASN1Object → RsaPublicKey / RsaPrivateKey
//! ```
//!
//! Each step uses the `Decoder` trait to convert from one type to the next,
//! and the `Encoder` trait to convert in the reverse direction. The marker
//! traits (`DecodableFrom` and `EncodableTo`) constrain which conversions
//! exist, so an invalid step in the pipeline fails to compile instead of
//! failing at run time.

#![forbid(unsafe_code)]

pub mod decoder;
pub mod encoder;
