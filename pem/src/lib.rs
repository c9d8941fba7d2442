//! PEM framing for RSA key material.
//!
//! Strips and rebuilds the `-----BEGIN X-----` / `-----END X-----` framing
//! around a base64-encoded DER body. Six boundary labels are recognized,
//! including two OpenPGP armor variants whose BEGIN line is followed by a
//! `Version:` header.
//!
//! Stripping intentionally keeps two legacy quirks:
//!
//! - BEGIN and END markers are matched independently against their tables,
//!   not as a pair, so a block with mismatched boundaries is still accepted.
//! - Spaces are removed before marker matching but CR/LF only after, with a
//!   secondary cut discarding the version value line of a detected OpenPGP
//!   preamble.
//!
//! Input without any recognized marker passes straight to the base64
//! decoder; the only error the framer itself raises is a base64 failure.

pub mod error;

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use base64::{Engine, engine::general_purpose::STANDARD};

use rsakit::decoder::{DecodableFrom, Decoder};

use error::Error;

const PUBLIC_KEY_LABEL: &str = "PUBLIC KEY";
const RSA_PRIVATE_KEY_LABEL: &str = "RSA PRIVATE KEY";
const RSA_PUBLIC_KEY_LABEL: &str = "RSA PUBLIC KEY";
const PRIVATE_KEY_LABEL: &str = "PRIVATE KEY";
const PGP_PUBLIC_KEY_LABEL: &str = "PGP PUBLIC KEY BLOCK";
const PGP_PRIVATE_KEY_LABEL: &str = "PGP PRIVATE KEY BLOCK";

/// Recognized BEGIN markers, space-stripped, in match order. The OpenPGP
/// entries embed the armor preamble up to the `Version:` header.
const BEGIN_MARKERS: [&str; 6] = [
    "-----BEGINPUBLICKEY-----",
    "-----BEGINRSAPRIVATEKEY-----",
    "-----BEGINRSAPUBLICKEY-----",
    "-----BEGINPRIVATEKEY-----",
    "-----BEGINPGPPUBLICKEYBLOCK-----\r\nVersion:",
    "-----BEGINPGPPRIVATEKEYBLOCK-----\r\nVersion:",
];

/// Recognized END markers, space-stripped, in the same order.
const END_MARKERS: [&str; 6] = [
    "-----ENDPUBLICKEY-----",
    "-----ENDRSAPRIVATEKEY-----",
    "-----ENDRSAPUBLICKEY-----",
    "-----ENDPRIVATEKEY-----",
    "-----ENDPGPPUBLICKEYBLOCK-----",
    "-----ENDPGPPRIVATEKEYBLOCK-----",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    /// X.509 SubjectPublicKeyInfo
    PublicKey,
    /// PKCS#1 RSA private key
    RSAPrivateKey,
    /// PKCS#1 RSA public key
    RSAPublicKey,
    /// PKCS#8 private key (non-encrypted)
    PrivateKey,
    /// OpenPGP armored public key
    PgpPublicKey,
    /// OpenPGP armored private key
    PgpPrivateKey,
    /// No recognized BEGIN marker matched
    Unknown,
}

/// The recognized labels in marker-table order.
const RECOGNIZED: [Label; 6] = [
    Label::PublicKey,
    Label::RSAPrivateKey,
    Label::RSAPublicKey,
    Label::PrivateKey,
    Label::PgpPublicKey,
    Label::PgpPrivateKey,
];

impl Label {
    /// Whether this label is an OpenPGP armor variant with a header
    /// preamble after the BEGIN line.
    fn is_armored(&self) -> bool {
        matches!(self, Label::PgpPublicKey | Label::PgpPrivateKey)
    }
}

impl Display for Label {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Label::PublicKey => write!(f, "{}", PUBLIC_KEY_LABEL),
            Label::RSAPrivateKey => write!(f, "{}", RSA_PRIVATE_KEY_LABEL),
            Label::RSAPublicKey => write!(f, "{}", RSA_PUBLIC_KEY_LABEL),
            Label::PrivateKey => write!(f, "{}", PRIVATE_KEY_LABEL),
            Label::PgpPublicKey => write!(f, "{}", PGP_PUBLIC_KEY_LABEL),
            Label::PgpPrivateKey => write!(f, "{}", PGP_PRIVATE_KEY_LABEL),
            Label::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// One stripped PEM block: the label of the BEGIN marker that matched (or
/// [`Label::Unknown`]) and the decoded DER payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pem {
    label: Label,
    der: Vec<u8>,
}

impl Pem {
    pub fn new(label: Label, der: Vec<u8>) -> Self {
        Pem { label, der }
    }

    pub fn from_bytes(label: Label, data: &[u8]) -> Self {
        Pem {
            label,
            der: data.to_vec(),
        }
    }

    pub fn label(&self) -> Label {
        self.label
    }

    pub fn der_bytes(&self) -> &[u8] {
        &self.der
    }
}

impl FromStr for Pem {
    type Err = Error;

    /// Strips PEM framing and decodes the base64 body.
    ///
    /// Stage one removes spaces only, so the BEGIN match still sees CR/LF;
    /// that is what lets the OpenPGP markers (which span the BEGIN line and
    /// the `Version:` header) match, after which the version value line is
    /// cut at the first remaining CR/LF. Stage two removes CR/LF and strips
    /// whichever END marker matches as a suffix. The two matches are
    /// independent by design.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let despaced = s.replace(' ', "");
        let mut body = despaced.as_str();
        let mut label = Label::Unknown;
        for (candidate, marker) in RECOGNIZED.into_iter().zip(BEGIN_MARKERS) {
            if let Some(rest) = body.strip_prefix(marker) {
                body = rest;
                if candidate.is_armored() {
                    if let Some(pos) = body.find("\r\n") {
                        body = &body[pos + 2..];
                    }
                }
                label = candidate;
                break;
            }
        }

        let mut compact: String = body.chars().filter(|c| !matches!(c, '\r' | '\n')).collect();
        for marker in END_MARKERS {
            if compact.ends_with(marker) {
                compact.truncate(compact.len() - marker.len());
                break;
            }
        }

        let der = STANDARD.decode(&compact).map_err(Error::Base64Decode)?;
        Ok(Pem { label, der })
    }
}

impl Display for Pem {
    /// Rebuilds the framed form: CRLF after the BEGIN line and before the
    /// END line, base64 body on a single unwrapped line.
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "-----BEGIN {}-----\r\n{}\r\n-----END {}-----",
            self.label,
            STANDARD.encode(&self.der),
            self.label
        )
    }
}

/// Trait for types that can be rendered to PEM format
pub trait ToPem {
    /// The error type returned by to_pem
    type Error;

    /// Get the PEM label for this type
    fn pem_label(&self) -> Label;

    /// Convert to PEM format
    fn to_pem(&self) -> Result<Pem, Self::Error>;
}

impl DecodableFrom<Pem> for Vec<u8> {}

impl Decoder<Pem, Vec<u8>> for Pem {
    type Error = Error;

    fn decode(&self) -> Result<Vec<u8>, Self::Error> {
        // This discards label information from the Pem block.
        Ok(self.der.clone())
    }
}

impl DecodableFrom<String> for Pem {}

impl Decoder<String, Pem> for String {
    type Error = Error;

    fn decode(&self) -> Result<Pem, Self::Error> {
        Pem::from_str(self)
    }
}

impl DecodableFrom<&str> for Pem {}

impl Decoder<&str, Pem> for &str {
    type Error = Error;

    fn decode(&self) -> Result<Pem, Self::Error> {
        Pem::from_str(self)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use std::str::FromStr;

    use crate::{Label, Pem};

    const PKCS1_PUBLIC: &str =
        "-----BEGIN RSA PUBLIC KEY-----\r\nAAECAwQF\r\n-----END RSA PUBLIC KEY-----";
    const PKCS1_PUBLIC_UNWRAPPED: &str = "-----BEGIN RSA PUBLIC KEY-----
AAEC
AwQF
-----END RSA PUBLIC KEY-----
";
    const MISMATCHED_PAIR: &str =
        "-----BEGIN RSA PUBLIC KEY-----\r\nAAECAwQF\r\n-----END PRIVATE KEY-----";
    const PGP_PUBLIC: &str = "-----BEGIN PGP PUBLIC KEY BLOCK-----\r\nVersion: BCPG v1.58\r\n\r\nAAECAwQF\r\n-----END PGP PUBLIC KEY BLOCK-----";
    const SPACED_OUT: &str =
        "----- BEGIN RSA PUBLIC KEY -----\r\n AAEC AwQF \r\n----- END RSA PUBLIC KEY -----";

    #[rstest(input, expected_label,
        case(PKCS1_PUBLIC, Label::RSAPublicKey),
        case(PKCS1_PUBLIC_UNWRAPPED, Label::RSAPublicKey),
        case(MISMATCHED_PAIR, Label::RSAPublicKey),
        case(PGP_PUBLIC, Label::PgpPublicKey),
        case(SPACED_OUT, Label::RSAPublicKey),
    )]
    fn test_strip(input: &str, expected_label: Label) {
        let pem = Pem::from_str(input).unwrap();
        assert_eq!(expected_label, pem.label());
        assert_eq!(&[0x00, 0x01, 0x02, 0x03, 0x04, 0x05], pem.der_bytes());
    }

    #[test]
    fn test_strip_without_markers_passes_through() {
        let pem = Pem::from_str("AAECAwQF").unwrap();
        assert_eq!(Label::Unknown, pem.label());
        assert_eq!(&[0x00, 0x01, 0x02, 0x03, 0x04, 0x05], pem.der_bytes());
    }

    #[test]
    fn test_strip_empty_input() {
        let pem = Pem::from_str("").unwrap();
        assert_eq!(Label::Unknown, pem.label());
        assert!(pem.der_bytes().is_empty());
    }

    #[test]
    fn test_strip_invalid_base64() {
        let input = "-----BEGIN RSA PUBLIC KEY-----\r\n!!!\r\n-----END RSA PUBLIC KEY-----";
        assert!(Pem::from_str(input).is_err());
    }

    #[test]
    fn test_pgp_comment_line_is_not_discarded() {
        // only the version value line is cut by the secondary CR/LF
        // truncation; a Comment header bleeds into the body and breaks the
        // base64 decode
        let input = "-----BEGIN PGP PUBLIC KEY BLOCK-----\r\nVersion: BCPG v1.58\r\nComment: noise\r\n\r\nAAECAwQF\r\n-----END PGP PUBLIC KEY BLOCK-----";
        assert!(Pem::from_str(input).is_err());
    }

    #[test]
    fn test_wrap_single_line() {
        let pem = Pem::from_bytes(Label::RSAPublicKey, &[0x00, 0x01, 0x02, 0x03, 0x04, 0x05]);
        assert_eq!(PKCS1_PUBLIC, pem.to_string());
    }

    #[rstest(label, expected,
        case(Label::PublicKey, "PUBLIC KEY"),
        case(Label::RSAPrivateKey, "RSA PRIVATE KEY"),
        case(Label::PgpPrivateKey, "PGP PRIVATE KEY BLOCK"),
        case(Label::Unknown, "UNKNOWN"),
    )]
    fn test_label_display(label: Label, expected: &str) {
        assert_eq!(expected, label.to_string());
    }

    #[test]
    fn test_wrap_strip_roundtrip() {
        let data: Vec<u8> = (0..=255).collect();
        let pem = Pem::from_bytes(Label::RSAPrivateKey, &data);
        let reparsed = Pem::from_str(&pem.to_string()).unwrap();
        assert_eq!(pem, reparsed);
    }
}
