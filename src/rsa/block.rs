// RSA Block Codec
// Fixed-width transform of a single block with the raw RSA primitive

use super::bigint::{from_bytes, mod_pow, to_fixed_be, RsaBigInt};
use super::keygen::RsaKeyPair;
use crate::error::{CipherError, Result};

/// Encrypt the integer value of a block body.
///
/// Returns `value^e mod n` serialized to exactly `block_length` bytes.
pub fn encode_value(value: &RsaBigInt, key: &RsaKeyPair) -> Result<Vec<u8>> {
    let c = mod_pow(value, &key.public_exponent, &key.modulus);
    to_fixed_be(&c, key.block_length())
}

/// Encrypt one plaintext body of at most `block_length - 1` bytes.
pub fn encode_block(body: &[u8], key: &RsaKeyPair) -> Result<Vec<u8>> {
    if body.len() > key.body_length() {
        return Err(CipherError::InvalidLength {
            expected: key.body_length(),
            actual: body.len(),
            context: "plaintext block body too long",
        });
    }

    encode_value(&from_bytes(body), key)
}

/// Decrypt one ciphertext block to its integer value.
pub fn decode_value(block: &[u8], key: &RsaKeyPair) -> Result<RsaBigInt> {
    if block.len() != key.block_length() {
        return Err(CipherError::InvalidLength {
            expected: key.block_length(),
            actual: block.len(),
            context: "ciphertext block",
        });
    }

    Ok(mod_pow(&from_bytes(block), &key.private_exponent, &key.modulus))
}

/// Decrypt one ciphertext block into exactly `output_length` bytes.
///
/// The length is not recoverable from the block itself; the caller derives
/// it from the block position and the original plaintext length.
pub fn decode_block(block: &[u8], key: &RsaKeyPair, output_length: usize) -> Result<Vec<u8>> {
    let m = decode_value(block, key)?;
    fit_output(&m, output_length)
}

/// Serialize a recovered value, reporting a wider-than-expected value as a mismatch.
pub(crate) fn fit_output(value: &RsaBigInt, output_length: usize) -> Result<Vec<u8>> {
    to_fixed_be(value, output_length).map_err(|_| CipherError::DecodingMismatch {
        original_len: output_length,
        reason: "recovered block value exceeds its output length",
    })
}
