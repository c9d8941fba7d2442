//! Narrow adapter over the external RSA engine.
//!
//! Key generation, PKCS#1 v1.5 encryption/decryption and SHA-256 signing are
//! delegated to the `rsa` crate; this module only converts between the
//! codec's key types and the engine's. The caller supplies the CSPRNG
//! (`OsRng` in practice) and owns seeding discipline. Key generation is the
//! one long-running operation here; interactive callers should dispatch it
//! off their primary execution context.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use num_bigint::BigUint;
use rsa::rand_core::CryptoRngCore;
use rsa::traits::{PrivateKeyParts, PublicKeyParts};
use rsa::{Pkcs1v15Encrypt, Pkcs1v15Sign};
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use crate::key::{RsaPrivateKey, RsaPublicKey};

/// Generates a fresh two-prime RSA keypair of the given modulus size.
pub fn generate_keypair<R: CryptoRngCore>(
    rng: &mut R,
    bit_strength: usize,
    public_exponent: &BigUint,
) -> Result<(RsaPublicKey, RsaPrivateKey)> {
    let engine_key =
        rsa::RsaPrivateKey::new_with_exp(rng, bit_strength, &to_engine_uint(public_exponent))?;

    let primes = engine_key.primes();
    let (Some(p), Some(q)) = (primes.first(), primes.get(1)) else {
        return Err(Error::InvalidKey("engine returned fewer than two primes"));
    };

    let public = RsaPublicKey::new(
        from_engine_uint(engine_key.n()),
        from_engine_uint(engine_key.e()),
    )?;
    let private = RsaPrivateKey::new(
        from_engine_uint(engine_key.n()),
        from_engine_uint(engine_key.d()),
        from_engine_uint(p),
        from_engine_uint(q),
    )?;
    Ok((public, private))
}

/// PKCS#1 v1.5 encryption under the public key.
pub fn encrypt<R: CryptoRngCore>(
    rng: &mut R,
    plaintext: &[u8],
    key: &RsaPublicKey,
) -> Result<Vec<u8>> {
    let engine_key = to_engine_public(key)?;
    Ok(engine_key.encrypt(rng, Pkcs1v15Encrypt, plaintext)?)
}

/// PKCS#1 v1.5 decryption under the private key.
pub fn decrypt(ciphertext: &[u8], key: &RsaPrivateKey) -> Result<Vec<u8>> {
    let engine_key = to_engine_private(key)?;
    Ok(engine_key.decrypt(Pkcs1v15Encrypt, ciphertext)?)
}

/// Signs a message with SHA-256 / PKCS#1 v1.5 and returns the signature as
/// base64 text.
///
/// The message is interpreted as UTF-8 with invalid sequences replaced
/// rather than rejected; the signature covers the bytes of that lenient
/// decoding.
pub fn sign(message: &[u8], key: &RsaPrivateKey) -> Result<String> {
    let text = String::from_utf8_lossy(message);
    let digest = Sha256::digest(text.as_bytes());
    let engine_key = to_engine_private(key)?;
    let signature = engine_key.sign(Pkcs1v15Sign::new::<Sha256>(), &digest)?;
    Ok(STANDARD.encode(signature))
}

fn to_engine_uint(value: &BigUint) -> rsa::BigUint {
    rsa::BigUint::from_bytes_be(&value.to_bytes_be())
}

fn from_engine_uint(value: &rsa::BigUint) -> BigUint {
    BigUint::from_bytes_be(&value.to_bytes_be())
}

fn to_engine_public(key: &RsaPublicKey) -> Result<rsa::RsaPublicKey> {
    Ok(rsa::RsaPublicKey::new(
        to_engine_uint(key.modulus()),
        to_engine_uint(key.exponent()),
    )?)
}

fn to_engine_private(key: &RsaPrivateKey) -> Result<rsa::RsaPrivateKey> {
    let public_exponent = key.public_exponent()?;
    Ok(rsa::RsaPrivateKey::from_components(
        to_engine_uint(key.modulus()),
        to_engine_uint(&public_exponent),
        to_engine_uint(key.private_exponent()),
        vec![to_engine_uint(key.p()), to_engine_uint(key.q())],
    )?)
}
