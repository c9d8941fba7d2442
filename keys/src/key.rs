//! Semantic RSA key types and format-dispatching decoders.
//!
//! [`RsaPublicKey`] and [`RsaPrivateKey`] hold the key material itself, free
//! of any wire-format detail. Decoding dispatches on the parsed ASN.1 shape:
//! a public key whose first element is an INTEGER is flat PKCS#1, anything
//! else is a PKCS#8 SubjectPublicKeyInfo envelope; a private key SEQUENCE of
//! exactly three elements is a PKCS#8 PrivateKeyInfo envelope, any other
//! count is flat PKCS#1.

use num_bigint::{BigInt, BigUint};
use num_integer::Integer as _;
use num_traits::{One, Zero};

use rsakit::decoder::{DecodableFrom, Decoder};
use rsakit_asn1::{ASN1Object, Element};
use rsakit_der::Der;
use rsakit_pem::Pem;

use crate::error::{Error, Result};
use crate::{pkcs1, pkcs8};

/// An RSA public key: modulus and public exponent.
///
/// Construction validates the material: both values positive, modulus odd,
/// exponent greater than one. Instances are immutable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RsaPublicKey {
    modulus: BigUint,
    exponent: BigUint,
}

impl RsaPublicKey {
    pub fn new(modulus: BigUint, exponent: BigUint) -> Result<Self> {
        if modulus.is_even() {
            return Err(Error::InvalidKey("modulus must be odd"));
        }
        if exponent <= BigUint::one() {
            return Err(Error::InvalidKey("public exponent must be greater than 1"));
        }
        Ok(RsaPublicKey { modulus, exponent })
    }

    pub fn modulus(&self) -> &BigUint {
        &self.modulus
    }

    pub fn exponent(&self) -> &BigUint {
        &self.exponent
    }

    /// Key size in bits (modulus bit length)
    pub fn key_size(&self) -> u64 {
        self.modulus.bits()
    }
}

/// An RSA private key: modulus, private exponent and the two prime factors.
///
/// Construction validates `p * q == modulus` and that every field is
/// positive. The public exponent and the CRT values dP, dQ and qInv are not
/// stored; they are derived on demand and recomputed identically on every
/// encode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RsaPrivateKey {
    modulus: BigUint,
    private_exponent: BigUint,
    p: BigUint,
    q: BigUint,
}

impl RsaPrivateKey {
    pub fn new(modulus: BigUint, private_exponent: BigUint, p: BigUint, q: BigUint) -> Result<Self> {
        if modulus.is_zero() {
            return Err(Error::InvalidKey("modulus must be positive"));
        }
        if private_exponent.is_zero() {
            return Err(Error::InvalidKey("private exponent must be positive"));
        }
        if &p * &q != modulus {
            return Err(Error::InvalidKey("p * q must equal the modulus"));
        }
        Ok(RsaPrivateKey {
            modulus,
            private_exponent,
            p,
            q,
        })
    }

    pub fn modulus(&self) -> &BigUint {
        &self.modulus
    }

    pub fn private_exponent(&self) -> &BigUint {
        &self.private_exponent
    }

    pub fn p(&self) -> &BigUint {
        &self.p
    }

    pub fn q(&self) -> &BigUint {
        &self.q
    }

    /// Key size in bits (modulus bit length)
    pub fn key_size(&self) -> u64 {
        self.modulus.bits()
    }

    /// Derives the public exponent as d⁻¹ mod lcm(p-1, q-1).
    ///
    /// The stored exponent of a parsed key is deliberately ignored (the
    /// primes and private exponent are the trusted inputs); for every
    /// well-formed key this derivation reproduces it.
    pub fn public_exponent(&self) -> Result<BigUint> {
        let one = BigUint::one();
        let lambda = num_integer::lcm(&self.p - &one, &self.q - &one);
        mod_inverse(&self.private_exponent, &lambda)
    }

    /// Derives the paired public key.
    pub fn public_key(&self) -> Result<RsaPublicKey> {
        RsaPublicKey::new(self.modulus.clone(), self.public_exponent()?)
    }
}

/// Inverse of `a` modulo `m`, normalized into `[0, m)`.
///
/// Fails with [`Error::NotInvertible`] when `gcd(a, m) != 1`.
pub(crate) fn mod_inverse(a: &BigUint, m: &BigUint) -> Result<BigUint> {
    let a = BigInt::from(a.clone());
    let m = BigInt::from(m.clone());
    let ext = a.extended_gcd(&m);
    if !ext.gcd.is_one() {
        return Err(Error::NotInvertible);
    }
    let inv = ((ext.x % &m) + &m) % &m;
    inv.to_biguint().ok_or(Error::NotInvertible)
}

impl DecodableFrom<Element> for RsaPublicKey {}

impl Decoder<Element, RsaPublicKey> for Element {
    type Error = Error;

    fn decode(&self) -> Result<RsaPublicKey> {
        let Element::Sequence(elements) = self else {
            return Err(Error::ExpectedSequence);
        };
        match elements.first() {
            // flat PKCS#1: SEQUENCE { modulus, publicExponent }
            Some(Element::Integer(_)) => pkcs1::public_key_from_elements(elements),
            // PKCS#8 SubjectPublicKeyInfo: the key structure nests inside
            // the BIT STRING payload
            Some(_) => {
                let inner = pkcs8::subject_public_key(elements)?;
                let Element::Sequence(inner) = &inner else {
                    return Err(Error::ExpectedSequence);
                };
                pkcs1::public_key_from_elements(inner)
            }
            None => Err(Error::InvalidElementCount {
                expected: "at least 2",
                actual: 0,
            }),
        }
    }
}

impl DecodableFrom<Element> for RsaPrivateKey {}

impl Decoder<Element, RsaPrivateKey> for Element {
    type Error = Error;

    fn decode(&self) -> Result<RsaPrivateKey> {
        let Element::Sequence(elements) = self else {
            return Err(Error::ExpectedSequence);
        };
        if elements.len() == 3 {
            // PKCS#8 PrivateKeyInfo: { version, algorithm, OCTET STRING }
            let inner = pkcs8::private_key_payload(elements)?;
            let Element::Sequence(inner) = &inner else {
                return Err(Error::ExpectedSequence);
            };
            pkcs1::private_key_from_elements(inner)
        } else {
            pkcs1::private_key_from_elements(elements)
        }
    }
}

impl DecodableFrom<Pem> for RsaPublicKey {}

impl Decoder<Pem, RsaPublicKey> for Pem {
    type Error = Error;

    fn decode(&self) -> Result<RsaPublicKey> {
        let der: Der = Decoder::<Pem, Der>::decode(self)?;
        let obj: ASN1Object = der.decode()?;
        let element = obj.elements().first().ok_or(Error::EmptyAsn1Object)?;
        element.decode()
    }
}

impl DecodableFrom<Pem> for RsaPrivateKey {}

impl Decoder<Pem, RsaPrivateKey> for Pem {
    type Error = Error;

    fn decode(&self) -> Result<RsaPrivateKey> {
        let der: Der = Decoder::<Pem, Der>::decode(self)?;
        let obj: ASN1Object = der.decode()?;
        let element = obj.elements().first().ok_or(Error::EmptyAsn1Object)?;
        element.decode()
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use num_bigint::BigUint;

    use super::{RsaPrivateKey, RsaPublicKey, mod_inverse};
    use crate::error::Error;

    fn uint(n: u64) -> BigUint {
        BigUint::from(n)
    }

    #[test]
    fn test_public_key_invariants() {
        assert!(RsaPublicKey::new(uint(3233), uint(17)).is_ok());
        // even modulus
        assert!(RsaPublicKey::new(uint(3232), uint(17)).is_err());
        // exponent too small
        assert!(RsaPublicKey::new(uint(3233), uint(1)).is_err());
    }

    #[test]
    fn test_private_key_invariants() {
        // p = 61, q = 53, n = 3233, d = 413 (e = 17)
        assert!(RsaPrivateKey::new(uint(3233), uint(413), uint(61), uint(53)).is_ok());
        assert!(matches!(
            RsaPrivateKey::new(uint(3234), uint(413), uint(61), uint(53)),
            Err(Error::InvalidKey(_))
        ));
        assert!(RsaPrivateKey::new(uint(3233), uint(0), uint(61), uint(53)).is_err());
    }

    #[rstest(a, m, expected,
        case(3, 7, 5),
        case(17, 3120, 2753),
        case(53, 61, 38),
    )]
    fn test_mod_inverse(a: u64, m: u64, expected: u64) {
        let inv = mod_inverse(&uint(a), &uint(m)).unwrap();
        assert_eq!(uint(expected), inv);
        assert_eq!(uint(1), (uint(a) * inv) % uint(m));
    }

    #[test]
    fn test_mod_inverse_not_coprime() {
        assert!(matches!(
            mod_inverse(&uint(6), &uint(9)),
            Err(Error::NotInvertible)
        ));
    }

    #[test]
    fn test_public_exponent_derivation() {
        let key = RsaPrivateKey::new(uint(3233), uint(413), uint(61), uint(53)).unwrap();
        assert_eq!(uint(17), key.public_exponent().unwrap());

        let public = key.public_key().unwrap();
        assert_eq!(&uint(3233), public.modulus());
        assert_eq!(&uint(17), public.exponent());
    }

    #[test]
    fn test_key_size() {
        let key = RsaPublicKey::new(uint(3233), uint(17)).unwrap();
        assert_eq!(12, key.key_size());
    }
}
