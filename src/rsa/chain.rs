// RSA Chaining Modes
// Runs the block codec over a whole message in ECB or CBC mode

use std::fmt;
use std::str::FromStr;

use log::trace;
use rand::Rng;

use super::bigint::{from_bytes, random_bits, to_fixed_be, RsaBigInt};
use super::block::{decode_block, decode_value, encode_block, encode_value, fit_output};
use super::keygen::RsaKeyPair;
use crate::error::{CipherError, Result};

/// How consecutive blocks relate to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChainMode {
    /// Every block is enciphered on its own.
    Ecb,
    /// Every block is XORed with the previous ciphertext (or the IV) first.
    #[default]
    Cbc,
}

impl fmt::Display for ChainMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainMode::Ecb => write!(f, "ecb"),
            ChainMode::Cbc => write!(f, "cbc"),
        }
    }
}

impl FromStr for ChainMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ecb" | "independent" => Ok(ChainMode::Ecb),
            "cbc" | "chained" => Ok(ChainMode::Cbc),
            other => Err(format!("unknown chaining mode: {}", other)),
        }
    }
}

/// Number of blocks a plaintext of `len` bytes occupies.
pub fn block_count(len: usize, body_length: usize) -> usize {
    len.div_ceil(body_length)
}

/// Encrypt a message with independent blocks.
pub fn encode_ecb(plaintext: &[u8], key: &RsaKeyPair) -> Result<Vec<u8>> {
    let blocks = block_count(plaintext.len(), key.body_length());
    let mut ciphertext = Vec::with_capacity(blocks * key.block_length());

    for (i, body) in plaintext.chunks(key.body_length()).enumerate() {
        trace!("ecb encode block {} ({} bytes)", i, body.len());
        ciphertext.extend(encode_block(body, key)?);
    }

    Ok(ciphertext)
}

/// Decrypt an ECB stream back into `original_len` bytes.
pub fn decode_ecb(ciphertext: &[u8], key: &RsaKeyPair, original_len: usize) -> Result<Vec<u8>> {
    check_geometry(ciphertext, key, original_len)?;

    let mut plaintext = Vec::with_capacity(original_len);
    for (i, block) in ciphertext.chunks(key.block_length()).enumerate() {
        let output_length = next_output_length(key, original_len, plaintext.len());
        trace!("ecb decode block {} -> {} bytes", i, output_length);
        plaintext.extend(decode_block(block, key, output_length)?);
    }

    Ok(plaintext)
}

/// Encrypt a message in CBC mode with a freshly drawn IV.
///
/// The IV is uniform in `[0, 2^bit_size)` and must be kept for decryption.
pub fn encode_cbc<R: Rng + ?Sized>(
    plaintext: &[u8],
    key: &RsaKeyPair,
    rng: &mut R,
) -> Result<(Vec<u8>, RsaBigInt)> {
    let iv = random_bits(u64::from(key.bit_size), rng);
    let ciphertext = encode_cbc_with_iv(plaintext, key, &iv)?;
    Ok((ciphertext, iv))
}

/// Encrypt a message in CBC mode with a caller supplied IV.
pub fn encode_cbc_with_iv(
    plaintext: &[u8],
    key: &RsaKeyPair,
    iv: &RsaBigInt,
) -> Result<Vec<u8>> {
    let blocks = block_count(plaintext.len(), key.body_length());
    let mut ciphertext = Vec::with_capacity(blocks * key.block_length());
    let mut prev = iv.clone();

    for (i, body) in plaintext.chunks(key.body_length()).enumerate() {
        let mask = leading_bytes(&prev, key.block_length(), body.len())?;
        let block = encode_value(&(from_bytes(body) ^ mask), key)?;
        trace!("cbc encode block {} ({} bytes)", i, body.len());

        prev = from_bytes(&block);
        ciphertext.extend(block);
    }

    Ok(ciphertext)
}

/// Decrypt a CBC stream back into `original_len` bytes.
///
/// Feedback for the next block is the received ciphertext block, never the
/// recovered plaintext.
pub fn decode_cbc(
    ciphertext: &[u8],
    key: &RsaKeyPair,
    original_len: usize,
    iv: &RsaBigInt,
) -> Result<Vec<u8>> {
    check_geometry(ciphertext, key, original_len)?;

    let mut plaintext = Vec::with_capacity(original_len);
    let mut prev = iv.clone();

    for (i, block) in ciphertext.chunks(key.block_length()).enumerate() {
        let output_length = next_output_length(key, original_len, plaintext.len());
        let decrypted = decode_value(block, key)?;
        let mask = leading_bytes(&prev, key.block_length(), output_length)?;
        trace!("cbc decode block {} -> {} bytes", i, output_length);

        prev = from_bytes(block);
        plaintext.extend(fit_output(&(decrypted ^ mask), output_length)?);
    }

    Ok(plaintext)
}

/// Read the first `len` bytes of `value` serialized at `block_length` width.
fn leading_bytes(value: &RsaBigInt, block_length: usize, len: usize) -> Result<RsaBigInt> {
    let bytes = to_fixed_be(value, block_length)?;
    Ok(from_bytes(&bytes[..len]))
}

fn next_output_length(key: &RsaKeyPair, original_len: usize, decoded: usize) -> usize {
    key.body_length().min(original_len - decoded)
}

fn check_geometry(ciphertext: &[u8], key: &RsaKeyPair, original_len: usize) -> Result<()> {
    if ciphertext.len() % key.block_length() != 0 {
        return Err(CipherError::InvalidLength {
            expected: key.block_length(),
            actual: ciphertext.len(),
            context: "ciphertext is not a whole number of blocks",
        });
    }

    let blocks = ciphertext.len() / key.block_length();
    if blocks != block_count(original_len, key.body_length()) {
        return Err(CipherError::DecodingMismatch {
            original_len,
            reason: "block count does not cover the original length",
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rsa::bigint::from_u64;
    use crate::rsa::keygen::generate_keypair;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    const MESSAGE: &[u8] = b"The quick brown fox jumps over the lazy dog";

    fn keypair() -> RsaKeyPair {
        generate_keypair(128, 20, &mut ChaCha20Rng::seed_from_u64(11)).unwrap()
    }

    #[test]
    fn test_block_count() {
        assert_eq!(block_count(0, 15), 0);
        assert_eq!(block_count(1, 15), 1);
        assert_eq!(block_count(15, 15), 1);
        assert_eq!(block_count(16, 15), 2);
    }

    #[test]
    fn test_ecb_roundtrip() {
        let key = keypair();
        let ciphertext = encode_ecb(MESSAGE, &key).unwrap();
        assert_eq!(ciphertext.len(), 3 * 16);
        assert_eq!(decode_ecb(&ciphertext, &key, MESSAGE.len()).unwrap(), MESSAGE);
    }

    #[test]
    fn test_ecb_trailing_zeros_survive() {
        let key = keypair();
        let message = [0x41, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        let ciphertext = encode_ecb(&message, &key).unwrap();
        assert_eq!(decode_ecb(&ciphertext, &key, message.len()).unwrap(), message);
    }

    #[test]
    fn test_ecb_identical_blocks_repeat() {
        let key = keypair();
        let ciphertext = encode_ecb(&[7u8; 30], &key).unwrap();
        assert_eq!(ciphertext[..16], ciphertext[16..]);
    }

    #[test]
    fn test_cbc_roundtrip() {
        let key = keypair();
        let mut rng = ChaCha20Rng::seed_from_u64(5);
        let (ciphertext, iv) = encode_cbc(MESSAGE, &key, &mut rng).unwrap();
        assert!(iv.bits() <= 128);
        assert_eq!(decode_cbc(&ciphertext, &key, MESSAGE.len(), &iv).unwrap(), MESSAGE);
    }

    #[test]
    fn test_cbc_identical_blocks_differ() {
        let key = keypair();
        let ciphertext = encode_cbc_with_iv(&[7u8; 30], &key, &from_u64(0x1234_5678)).unwrap();
        assert_ne!(ciphertext[..16], ciphertext[16..]);
    }

    #[test]
    fn test_cbc_masks_with_leading_iv_bytes() {
        let key = keypair();
        // a 16-byte IV whose first byte is 0x05 and the rest zero
        let iv = from_u64(5) << 120;
        let ciphertext = encode_cbc_with_iv(&[0x03], &key, &iv).unwrap();
        assert_eq!(ciphertext, encode_block(&[0x06], &key).unwrap());
    }

    #[test]
    fn test_cbc_wrong_iv_does_not_recover_first_block() {
        let key = keypair();
        let ciphertext = encode_cbc_with_iv(MESSAGE, &key, &(from_u64(99) << 100)).unwrap();
        let wrong_iv = from_u64(98) << 100;
        let decoded = decode_cbc(&ciphertext, &key, MESSAGE.len(), &wrong_iv).unwrap();
        assert_ne!(decoded[..15], MESSAGE[..15]);
        // feedback comes from ciphertext, so later blocks still decode
        assert_eq!(decoded[15..], MESSAGE[15..]);
    }

    #[test]
    fn test_empty_message() {
        let key = keypair();
        assert!(encode_ecb(b"", &key).unwrap().is_empty());
        assert!(decode_ecb(&[], &key, 0).unwrap().is_empty());
        assert!(encode_cbc_with_iv(b"", &key, &from_u64(1)).unwrap().is_empty());
    }

    #[test]
    fn test_partial_block_stream_rejected() {
        let key = keypair();
        assert!(matches!(
            decode_ecb(&[0u8; 20], &key, 10),
            Err(CipherError::InvalidLength { .. })
        ));
    }

    #[test]
    fn test_block_count_mismatch_rejected() {
        let key = keypair();
        let ciphertext = encode_ecb(MESSAGE, &key).unwrap();
        assert!(matches!(
            decode_ecb(&ciphertext, &key, 10),
            Err(CipherError::DecodingMismatch { .. })
        ));
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("ECB".parse::<ChainMode>().unwrap(), ChainMode::Ecb);
        assert_eq!("chained".parse::<ChainMode>().unwrap(), ChainMode::Cbc);
        assert!("ctr".parse::<ChainMode>().is_err());
        assert_eq!(ChainMode::default().to_string(), "cbc");
    }
}
