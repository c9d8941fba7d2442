//! DER tag-length-value layer.
//!
//! Parses raw bytes into [`Tlv`] trees and serializes them back. Only the
//! tags needed to represent RSA key material are recognized; everything else
//! is carried as [`Tag::Unimplemented`] and rejected by the typed element
//! layer above.

use nom::{IResult, Parser};

use rsakit::decoder::{DecodableFrom, Decoder};
use rsakit::encoder::{EncodableTo, Encoder};
use rsakit_pem::Pem;

pub mod error;

use error::Error;

/// ASN.1 tag bytes this codec understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Integer,
    BitString,
    OctetString,
    Null,
    ObjectIdentifier,
    Sequence,
    Unimplemented(u8),
}

impl From<u8> for Tag {
    fn from(value: u8) -> Self {
        match value {
            0x02 => Self::Integer,
            0x03 => Self::BitString,
            0x04 => Self::OctetString,
            0x05 => Self::Null,
            0x06 => Self::ObjectIdentifier,
            0x30 => Self::Sequence,
            _ => Tag::Unimplemented(value),
        }
    }
}

impl Tag {
    /// The raw identifier byte, constructed bit included where it applies.
    pub fn raw(&self) -> u8 {
        match self {
            Tag::Integer => 0x02,
            Tag::BitString => 0x03,
            Tag::OctetString => 0x04,
            Tag::Null => 0x05,
            Tag::ObjectIdentifier => 0x06,
            Tag::Sequence => 0x30,
            Tag::Unimplemented(b) => *b,
        }
    }
}

/// One tag-length-value node. SEQUENCE nodes own their children; every other
/// tag carries raw content bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tlv {
    tag: Tag,
    value: Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Tlv(Vec<Tlv>),
    Data(Vec<u8>),
}

impl Tlv {
    pub fn new_primitive(tag: Tag, data: Vec<u8>) -> Self {
        Tlv {
            tag,
            value: Value::Data(data),
        }
    }

    pub fn new_constructed(tag: Tag, tlvs: Vec<Tlv>) -> Self {
        Tlv {
            tag,
            value: Value::Tlv(tlvs),
        }
    }

    pub fn tag(&self) -> Tag {
        self.tag
    }

    /// Content bytes of a primitive node.
    pub fn data(&self) -> Option<&[u8]> {
        match &self.value {
            Value::Data(data) => Some(data),
            Value::Tlv(_) => None,
        }
    }

    /// Child nodes of a constructed node.
    pub fn tlvs(&self) -> Option<&[Tlv]> {
        match &self.value {
            Value::Tlv(tlvs) => Some(tlvs),
            Value::Data(_) => None,
        }
    }

    fn parse(input: &[u8]) -> IResult<&[u8], Tlv> {
        let (input, tag) = parse_tag(input)?;
        let (input, length) = parse_length(input)?;
        let (input, data) = nom::bytes::complete::take(length).parse(input)?;

        if tag.eq(&Tag::Sequence) {
            // parse TLV recursively.
            let mut tlvs = Vec::new();
            let mut data = data;
            while !data.is_empty() {
                let (new_input, v) = Self::parse(data)?;
                data = new_input;
                tlvs.push(v);
            }

            return Ok((
                input,
                Tlv {
                    tag,
                    value: Value::Tlv(tlvs),
                },
            ));
        }

        Ok((
            input,
            Tlv {
                tag,
                value: Value::Data(data.to_vec()),
            },
        ))
    }

    /// Serializes this node, recomputing all length fields in minimal form.
    pub fn to_bytes(&self) -> Vec<u8> {
        let content = match &self.value {
            Value::Data(data) => data.clone(),
            Value::Tlv(tlvs) => {
                let mut buf = Vec::new();
                for tlv in tlvs {
                    buf.extend_from_slice(&tlv.to_bytes());
                }
                buf
            }
        };
        let mut out = Vec::with_capacity(content.len() + 4);
        out.push(self.tag.raw());
        encode_length(&mut out, content.len());
        out.extend_from_slice(&content);
        out
    }
}

fn parse_tag(input: &[u8]) -> IResult<&[u8], Tag> {
    let (input, n) = nom::number::be_u8().parse(input)?;
    Ok((input, Tag::from(n)))
}

fn parse_length(input: &[u8]) -> IResult<&[u8], u64> {
    let (input, n) = nom::number::be_u8().parse(input)?;
    if n & 0x80 == 0x80 {
        // long form
        // First 1 bit is a marker for long form.
        // Other bits represent bytes length of the length field.
        let width = n & 0x7f;
        if width > 8 {
            // would not fit a u64 length
            return Err(nom::Err::Failure(nom::error::Error::new(
                input,
                nom::error::ErrorKind::TooLarge,
            )));
        }
        let (input, bs) = nom::bytes::complete::take(width).parse(input)?;
        let n = bs.iter().fold(0u64, |n, &b| (n << 8) | b as u64);
        return Ok((input, n));
    }
    // short form: 0-127
    Ok((input, n as u64))
}

fn encode_length(out: &mut Vec<u8>, len: usize) {
    if len < 128 {
        out.push(len as u8);
        return;
    }
    let bytes = len.to_be_bytes();
    let skip = bytes.iter().take_while(|b| **b == 0).count();
    out.push(0x80 | (bytes.len() - skip) as u8);
    out.extend_from_slice(&bytes[skip..]);
}

/// One DER document: the ordered top-level TLV nodes of a byte buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Der {
    tlvs: Vec<Tlv>,
}

impl Der {
    pub fn new(tlvs: Vec<Tlv>) -> Self {
        Der { tlvs }
    }

    pub fn elements(&self) -> &[Tlv] {
        &self.tlvs
    }

    fn parse(bytes: &[u8]) -> Result<Der, Error> {
        let mut tlvs = Vec::new();
        let mut rest = bytes;
        while !rest.is_empty() {
            let (next, tlv) = Tlv::parse(rest).map_err(Error::from_nom)?;
            rest = next;
            tlvs.push(tlv);
        }
        Ok(Der { tlvs })
    }
}

impl DecodableFrom<Vec<u8>> for Der {}

impl Decoder<Vec<u8>, Der> for Vec<u8> {
    type Error = Error;

    fn decode(&self) -> Result<Der, Self::Error> {
        Der::parse(self)
    }
}

impl<'a> DecodableFrom<&'a [u8]> for Der {}

impl<'a> Decoder<&'a [u8], Der> for &'a [u8] {
    type Error = Error;

    fn decode(&self) -> Result<Der, Self::Error> {
        Der::parse(self)
    }
}

impl DecodableFrom<Pem> for Der {}

impl Decoder<Pem, Der> for Pem {
    type Error = Error;

    fn decode(&self) -> Result<Der, Self::Error> {
        Der::parse(self.der_bytes())
    }
}

impl EncodableTo<Der> for Vec<u8> {}

impl Encoder<Der, Vec<u8>> for Der {
    type Error = Error;

    fn encode(&self) -> Result<Vec<u8>, Self::Error> {
        let mut out = Vec::new();
        for tlv in &self.tlvs {
            out.extend_from_slice(&tlv.to_bytes());
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use rsakit::decoder::Decoder;
    use rsakit::encoder::Encoder;

    use crate::error::Error as DerError;
    use crate::{Der, Tag, Tlv, Value, encode_length, parse_length, parse_tag};

    #[rstest(input, expected,
        case(vec![0x02], Tag::Integer),
        case(vec![0x02, 0x01], Tag::Integer),
        case(vec![0x30, 0x01], Tag::Sequence),
        case(vec![0x06, 0x03], Tag::ObjectIdentifier),
        case(vec![0xa0, 0x03], Tag::Unimplemented(0xa0)),
    )]
    fn test_parse_tag(input: Vec<u8>, expected: Tag) {
        let actual = parse_tag(&input).unwrap();
        assert_eq!(expected, actual.1);
    }

    #[rstest(input, expected,
        case(vec![0x02], 0x02),
        case(vec![0x7f], 0x7f),
        case(vec![0x81, 0x80], 0x80),
        case(vec![0x82, 0x02, 0x10], 256 * 0x02 + 0x10),
        case(vec![0x83, 0x01, 0x00, 0x00], 256 * 256),
        case(vec![0x82, 0xff, 0xff], 256 * 0xff + 0xff),
    )]
    fn test_parse_length(input: Vec<u8>, expected: u64) {
        let actual = parse_length(&input).unwrap();
        assert_eq!(expected, actual.1);
    }

    #[test]
    fn test_parse_length_too_wide() {
        let input = vec![0x89, 0, 0, 0, 0, 0, 0, 0, 0, 1];
        assert!(parse_length(&input).is_err());
    }

    #[rstest(len, expected,
        case(0, vec![0x00]),
        case(127, vec![0x7f]),
        case(128, vec![0x81, 0x80]),
        case(256, vec![0x82, 0x01, 0x00]),
        case(65536, vec![0x83, 0x01, 0x00, 0x00]),
    )]
    fn test_encode_length(len: usize, expected: Vec<u8>) {
        let mut out = Vec::new();
        encode_length(&mut out, len);
        assert_eq!(expected, out);
    }

    #[rstest(input, expected,
        case(vec![0x02, 0x01, 0x01], Tlv::new_primitive(Tag::Integer, vec![0x01])),
        case(
            vec![0x02, 0x09, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01],
            Tlv::new_primitive(Tag::Integer, vec![0x00, 0x80, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01]),
        ),
        case(vec![0x05, 0x00], Tlv::new_primitive(Tag::Null, vec![])),
        case(
            vec![0x06, 0x09, 0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01, 0x0b],
            Tlv::new_primitive(Tag::ObjectIdentifier, vec![0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01, 0x0b]),
        ),
        case(vec![0x04, 0x04, 0x03, 0x02, 0x06, 0xa0], Tlv::new_primitive(Tag::OctetString, vec![0x03, 0x02, 0x06, 0xa0])),
        case(vec![0x03, 0x04, 0x06, 0x6e, 0x5d, 0xc0], Tlv::new_primitive(Tag::BitString, vec![0x06, 0x6e, 0x5d, 0xc0])),
    )]
    fn test_tlv_parse_primitive(input: Vec<u8>, expected: Tlv) {
        let (rest, actual) = Tlv::parse(&input).unwrap();
        assert!(rest.is_empty());
        assert_eq!(expected, actual);
    }

    #[test]
    fn test_tlv_parse_structured() {
        let input = vec![
            0x30, 0x09, 0x02, 0x01, 0x07, 0x02, 0x01, 0x08, 0x02, 0x01, 0x09,
        ];
        let (_, actual) = Tlv::parse(&input).unwrap();
        let expected = Tlv::new_constructed(
            Tag::Sequence,
            vec![
                Tlv::new_primitive(Tag::Integer, vec![0x07]),
                Tlv::new_primitive(Tag::Integer, vec![0x08]),
                Tlv::new_primitive(Tag::Integer, vec![0x09]),
            ],
        );
        assert_eq!(expected, actual);
    }

    #[rstest(input,
        // content shorter than the declared length
        case(vec![0x30, 0x05, 0x02, 0x01]),
        // length field itself truncated
        case(vec![0x02, 0x84, 0x01]),
        // bare tag, nothing else
        case(vec![0x02]),
    )]
    fn test_der_decode_truncated(input: Vec<u8>) {
        let result: Result<Der, DerError> = input.decode();
        assert_eq!(Err(DerError::Truncated), result);
    }

    #[test]
    fn test_der_roundtrip() {
        // SEQUENCE { INTEGER 65537, OCTET STRING 0xdead }
        let input = vec![0x30, 0x09, 0x02, 0x03, 0x01, 0x00, 0x01, 0x04, 0x02, 0xde, 0xad];
        let der: Der = input.decode().unwrap();
        let out: Vec<u8> = der.encode().unwrap();
        assert_eq!(input, out);
    }

    #[test]
    fn test_der_long_form_roundtrip() {
        // a 200-byte OCTET STRING forces a long-form length on re-encode
        let mut input = vec![0x04, 0x81, 0xc8];
        input.extend(std::iter::repeat_n(0xab, 200));
        let der: Der = input.decode().unwrap();
        let out: Vec<u8> = der.encode().unwrap();
        assert_eq!(input, out);
    }

    #[test]
    fn test_value_accessors() {
        let prim = Tlv::new_primitive(Tag::Integer, vec![0x01]);
        assert_eq!(Some(&[0x01u8][..]), prim.data());
        assert!(prim.tlvs().is_none());

        let cons = Tlv::new_constructed(Tag::Sequence, vec![prim.clone()]);
        assert!(cons.data().is_none());
        assert_eq!(Some(&[prim][..]), cons.tlvs());
        assert!(matches!(cons.value, Value::Tlv(_)));
    }
}
