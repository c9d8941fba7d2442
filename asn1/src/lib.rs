//! Typed ASN.1 elements over the TLV layer.
//!
//! [`Element`] models the subset of ASN.1 needed to represent RSA key
//! material: INTEGER, BIT STRING, OCTET STRING, NULL, OBJECT IDENTIFIER and
//! SEQUENCE. A TLV carrying any other tag fails to convert.

use std::fmt::Display;
use std::str::FromStr;

use num_bigint::{BigInt, BigUint};
use num_traits::ToPrimitive;

use rsakit::decoder::{DecodableFrom, Decoder};
use rsakit::encoder::{EncodableTo, Encoder};
use rsakit_der::{Der, Tag, Tlv};

pub mod error;

use error::Error;

/// The ordered top-level elements of one DER document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ASN1Object {
    elements: Vec<Element>,
}

impl ASN1Object {
    pub fn new(elements: Vec<Element>) -> Self {
        ASN1Object { elements }
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }
}

impl DecodableFrom<Der> for ASN1Object {}

impl Decoder<Der, ASN1Object> for Der {
    type Error = Error;

    fn decode(&self) -> Result<ASN1Object, Error> {
        let mut elements = Vec::new();
        for tlv in self.elements() {
            elements.push(Element::try_from(tlv)?);
        }
        Ok(ASN1Object { elements })
    }
}

impl EncodableTo<ASN1Object> for Der {}

impl Encoder<ASN1Object, Der> for ASN1Object {
    type Error = Error;

    fn encode(&self) -> Result<Der, Self::Error> {
        let mut tlvs = Vec::new();
        for element in &self.elements {
            tlvs.push(element.encode()?);
        }
        Ok(Der::new(tlvs))
    }
}

// Nested DER payloads: a PKCS#8 envelope hides the actual key structure
// inside an OCTET STRING (private) or BIT STRING (public) and these are the
// re-parse entry points for both.
impl TryFrom<&OctetString> for ASN1Object {
    type Error = Error;

    fn try_from(value: &OctetString) -> Result<Self, Self::Error> {
        let der: Der = value.as_bytes().decode().map_err(Error::FailedToDecodeDer)?;
        der.decode()
    }
}

impl TryFrom<&BitString> for ASN1Object {
    type Error = Error;

    fn try_from(value: &BitString) -> Result<Self, Self::Error> {
        let der: Der = value.as_bytes().decode().map_err(Error::FailedToDecodeDer)?;
        der.decode()
    }
}

/// One parsed ASN.1 node. SEQUENCE owns its children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
    Integer(Integer),
    BitString(BitString),
    OctetString(OctetString),
    Null,
    ObjectIdentifier(ObjectIdentifier),
    Sequence(Vec<Element>),
}

impl TryFrom<&Tlv> for Element {
    type Error = Error;

    fn try_from(tlv: &Tlv) -> Result<Self, Self::Error> {
        match tlv.tag() {
            Tag::Integer => match tlv.data() {
                Some(data) if !data.is_empty() => Ok(Element::Integer(Integer::from(data))),
                _ => Err(Error::IntegerNoData),
            },
            Tag::BitString => match tlv.data() {
                Some(data) => Ok(Element::BitString(BitString::try_from(data)?)),
                None => Err(Error::BitStringNoData),
            },
            Tag::OctetString => {
                let data = tlv.data().unwrap_or_default();
                Ok(Element::OctetString(OctetString::from(data)))
            }
            Tag::Null => Ok(Element::Null),
            Tag::ObjectIdentifier => match tlv.data() {
                Some(data) => Ok(Element::ObjectIdentifier(ObjectIdentifier::try_from(data)?)),
                None => Err(Error::ObjectIdentifierNoData),
            },
            Tag::Sequence => {
                let mut elements = Vec::new();
                for sub_tlv in tlv.tlvs().unwrap_or_default() {
                    elements.push(Element::try_from(sub_tlv)?);
                }
                Ok(Element::Sequence(elements))
            }
            Tag::Unimplemented(b) => Err(Error::UnsupportedTag(b)),
        }
    }
}

impl TryFrom<&Element> for Tlv {
    type Error = Error;

    fn try_from(element: &Element) -> Result<Self, Self::Error> {
        match element {
            Element::Integer(i) => Ok(Tlv::new_primitive(
                Tag::Integer,
                i.as_bigint().to_signed_bytes_be(),
            )),
            Element::BitString(bs) => {
                let mut data = Vec::with_capacity(bs.as_bytes().len() + 1);
                data.push(bs.unused_bits());
                data.extend_from_slice(bs.as_bytes());
                Ok(Tlv::new_primitive(Tag::BitString, data))
            }
            Element::OctetString(os) => {
                Ok(Tlv::new_primitive(Tag::OctetString, os.as_bytes().to_vec()))
            }
            Element::Null => Ok(Tlv::new_primitive(Tag::Null, vec![])),
            Element::ObjectIdentifier(oid) => Ok(Tlv::new_primitive(
                Tag::ObjectIdentifier,
                Vec::try_from(oid)?,
            )),
            Element::Sequence(elements) => {
                let tlvs = elements
                    .iter()
                    .map(Tlv::try_from)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Tlv::new_constructed(Tag::Sequence, tlvs))
            }
        }
    }
}

impl EncodableTo<Element> for Tlv {}

impl Encoder<Element, Tlv> for Element {
    type Error = Error;

    fn encode(&self) -> Result<Tlv, Self::Error> {
        Tlv::try_from(self)
    }
}

/// ASN.1 INTEGER: an arbitrary-precision signed value carried as minimal
/// two's-complement big-endian bytes on the wire.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Integer {
    inner: BigInt,
}

impl Integer {
    /// Returns a reference to the inner BigInt
    pub fn as_bigint(&self) -> &BigInt {
        &self.inner
    }

    /// Converts to BigUint; `None` for negative values
    pub fn to_biguint(&self) -> Option<BigUint> {
        self.inner.to_biguint()
    }

    /// Converts to u64 if the value fits the range
    pub fn to_u64(&self) -> Option<u64> {
        self.inner.to_u64()
    }

    /// Minimal number of bits needed to represent the magnitude
    pub fn bits(&self) -> u64 {
        self.inner.bits()
    }
}

impl From<&[u8]> for Integer {
    fn from(value: &[u8]) -> Self {
        Integer {
            inner: BigInt::from_signed_bytes_be(value),
        }
    }
}

impl From<BigInt> for Integer {
    fn from(value: BigInt) -> Self {
        Integer { inner: value }
    }
}

impl From<&BigUint> for Integer {
    fn from(value: &BigUint) -> Self {
        Integer {
            inner: BigInt::from(value.clone()),
        }
    }
}

impl From<i64> for Integer {
    fn from(value: i64) -> Self {
        Integer {
            inner: BigInt::from(value),
        }
    }
}

impl Display for Integer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

/// ASN.1 BIT STRING: payload bytes plus the count of unused trailing bits in
/// the last byte (the first content byte on the wire).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitString {
    unused: u8,
    data: Vec<u8>,
}

impl BitString {
    pub fn new(unused: u8, data: Vec<u8>) -> Self {
        BitString { unused, data }
    }

    /// Returns the number of unused bits in the last byte
    pub fn unused_bits(&self) -> u8 {
        self.unused
    }

    /// Returns the payload, unused-bit count stripped
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the BitString and returns the payload
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Returns the total number of bits (excluding unused bits)
    pub fn bit_len(&self) -> usize {
        if self.data.is_empty() {
            0
        } else {
            self.data.len() * 8 - self.unused as usize
        }
    }
}

impl TryFrom<&[u8]> for BitString {
    type Error = Error;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        match value.first() {
            Some(&unused) if unused <= 7 => Ok(BitString {
                unused,
                data: value[1..].to_vec(),
            }),
            Some(&unused) => Err(Error::BitStringUnusedBitsOutOfRange(unused)),
            None => Err(Error::BitStringNoData),
        }
    }
}

/// ASN.1 OCTET STRING: raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OctetString {
    inner: Vec<u8>,
}

impl OctetString {
    /// Returns the inner bytes as a slice
    pub fn as_bytes(&self) -> &[u8] {
        &self.inner
    }

    /// Consumes self and returns the inner bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.inner
    }
}

impl From<Vec<u8>> for OctetString {
    fn from(value: Vec<u8>) -> Self {
        OctetString { inner: value }
    }
}

impl From<&[u8]> for OctetString {
    fn from(value: &[u8]) -> Self {
        OctetString {
            inner: value.to_vec(),
        }
    }
}

/// ASN.1 OBJECT IDENTIFIER as its dotted numeric components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectIdentifier {
    inner: Vec<u64>,
}

impl TryFrom<&[u8]> for ObjectIdentifier {
    type Error = Error;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        if value.is_empty() {
            return Err(Error::ObjectIdentifierNoData);
        }

        let mut values = Vec::new();
        // The first byte packs the first two components as 40 * X + Y.
        let first = value[0] as u64;
        values.push(first / 40);
        values.push(first % 40);

        let mut val = 0u64;
        let mut pending = false;
        for v in value[1..].iter() {
            val = (val << 7) | (*v as u64 & 0x7f);
            pending = true;
            if *v & 0x80 == 0 {
                values.push(val);
                val = 0;
                pending = false;
            }
        }
        if pending {
            // the last byte still had its continuation bit set
            return Err(Error::ObjectIdentifierIncompleteEncoding);
        }

        Ok(ObjectIdentifier { inner: values })
    }
}

impl TryFrom<&ObjectIdentifier> for Vec<u8> {
    type Error = Error;

    fn try_from(oid: &ObjectIdentifier) -> Result<Self, Self::Error> {
        if oid.inner.len() < 2 {
            return Err(Error::ObjectIdentifierTooFewComponents);
        }

        let mut result = Vec::new();
        result.push((oid.inner[0] * 40 + oid.inner[1]) as u8);

        // base-128, high bit marking continuation
        for v in oid.inner[2..].iter() {
            let mut encoded = Vec::new();
            let mut value = *v;
            loop {
                encoded.push(value as u8 & 0x7f);
                value >>= 7;
                if value == 0 {
                    break;
                }
            }
            while let Some(b) = encoded.pop() {
                if encoded.is_empty() {
                    result.push(b);
                } else {
                    result.push(b | 0x80);
                }
            }
        }

        Ok(result)
    }
}

impl FromStr for ObjectIdentifier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values = s
            .split('.')
            .map(|c| {
                c.parse::<u64>()
                    .map_err(|_| Error::ObjectIdentifierInvalidComponent(c.to_string()))
            })
            .collect::<Result<Vec<u64>, Error>>()?;
        Ok(ObjectIdentifier { inner: values })
    }
}

impl Display for ObjectIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self.inner.first() {
            Some(n) => self.inner[1..]
                .iter()
                .fold(n.to_string(), |s, n| s + "." + &n.to_string()),
            None => String::new(),
        };
        write!(f, "{}", s)
    }
}
