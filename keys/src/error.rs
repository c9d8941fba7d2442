use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid PEM: {0}")]
    Pem(#[from] rsakit_pem::error::Error),

    #[error("Invalid DER: {0}")]
    Der(#[from] rsakit_der::error::Error),

    #[error("ASN.1 error: {0}")]
    Asn1(#[from] rsakit_asn1::error::Error),

    #[error("expected SEQUENCE")]
    ExpectedSequence,

    #[error("expected {expected} elements, got {actual}")]
    InvalidElementCount {
        expected: &'static str,
        actual: usize,
    },

    #[error("expected INTEGER for {field}")]
    ExpectedInteger { field: &'static str },

    #[error("expected BIT STRING for subjectPublicKey")]
    ExpectedBitString,

    #[error("expected OCTET STRING for privateKey")]
    ExpectedOctetString,

    #[error("empty ASN1Object")]
    EmptyAsn1Object,

    #[error("{field} must be positive")]
    NegativeInteger { field: &'static str },

    #[error("invalid key: {0}")]
    InvalidKey(&'static str),

    #[error("no modular inverse: arguments are not coprime")]
    NotInvertible,

    #[error("RSA engine: {0}")]
    Engine(#[from] rsa::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
