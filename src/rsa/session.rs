// Encryption Session
// End-to-end pipeline: chain-encode then split, recombine then chain-decode

use log::debug;
use rand::Rng;

use super::bigint::RsaBigInt;
use super::chain::{block_count, decode_cbc, decode_ecb, encode_cbc, encode_ecb, ChainMode};
use super::keygen::{generate_keypair, RsaKeyPair};
use super::split::{recombine, split};
use crate::config::CipherConfig;
use crate::error::{CipherError, Result};

/// Everything the container writer and the later decryption need.
///
/// `main` goes into the container's data region and `spill` into its trailing
/// region. `original_len` and `iv` are not recoverable from the streams and
/// must be stored alongside the private key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedPayload {
    pub main: Vec<u8>,
    pub spill: Vec<u8>,
    pub modulus: RsaBigInt,
    pub public_exponent: RsaBigInt,
    pub original_len: usize,
    pub iv: Option<RsaBigInt>,
}

/// A key pair bound to a chaining mode.
#[derive(Debug, Clone)]
pub struct EncryptionSession {
    key_pair: RsaKeyPair,
    mode: ChainMode,
}

impl EncryptionSession {
    pub fn new(key_pair: RsaKeyPair, mode: ChainMode) -> Self {
        Self { key_pair, mode }
    }

    /// Generate a fresh key pair as described by `config`.
    pub fn generate<R: Rng + ?Sized>(config: &CipherConfig, rng: &mut R) -> Result<Self> {
        let key_pair = generate_keypair(config.bit_size, config.prime_rounds, rng)?;
        Ok(Self::new(key_pair, config.mode))
    }

    pub fn key_pair(&self) -> &RsaKeyPair {
        &self.key_pair
    }

    pub fn mode(&self) -> ChainMode {
        self.mode
    }

    /// Encrypt `plaintext` and split the ciphertext into main and spill streams.
    pub fn encrypt<R: Rng + ?Sized>(
        &self,
        plaintext: &[u8],
        rng: &mut R,
    ) -> Result<EncryptedPayload> {
        let key = &self.key_pair;
        key.validate()?;

        let (ciphertext, iv) = match self.mode {
            ChainMode::Ecb => (encode_ecb(plaintext, key)?, None),
            ChainMode::Cbc => {
                let (ciphertext, iv) = encode_cbc(plaintext, key, rng)?;
                (ciphertext, Some(iv))
            }
        };

        let stream = split(&ciphertext, key.block_length());
        debug!(
            "{} encrypted {} bytes into {} main + {} spill bytes",
            self.mode,
            plaintext.len(),
            stream.main.len(),
            stream.spill.len()
        );

        Ok(EncryptedPayload {
            main: stream.main,
            spill: stream.spill,
            modulus: key.modulus.clone(),
            public_exponent: key.public_exponent.clone(),
            original_len: plaintext.len(),
            iv,
        })
    }

    /// Decrypt a payload produced by [`EncryptionSession::encrypt`].
    pub fn decrypt(&self, payload: &EncryptedPayload) -> Result<Vec<u8>> {
        self.recover(
            &payload.main,
            &payload.spill,
            payload.original_len,
            payload.iv.as_ref(),
        )
    }

    /// Recombine main and spill streams and decode them.
    pub fn recover(
        &self,
        main: &[u8],
        spill: &[u8],
        original_len: usize,
        iv: Option<&RsaBigInt>,
    ) -> Result<Vec<u8>> {
        let key = &self.key_pair;
        key.validate()?;

        let blocks = block_count(original_len, key.body_length());
        let expected_spill = blocks.saturating_sub(1);

        if spill.len() != expected_spill {
            return Err(CipherError::InvalidLength {
                expected: expected_spill,
                actual: spill.len(),
                context: "spill byte count",
            });
        }
        if main.len() != blocks * key.block_length() - expected_spill {
            return Err(CipherError::InvalidLength {
                expected: blocks * key.block_length() - expected_spill,
                actual: main.len(),
                context: "main stream length",
            });
        }

        let ciphertext = recombine(main, spill, key.block_length());
        let plaintext = match self.mode {
            ChainMode::Ecb => decode_ecb(&ciphertext, key, original_len)?,
            ChainMode::Cbc => {
                let iv = iv.ok_or(CipherError::MissingIv)?;
                decode_cbc(&ciphertext, key, original_len, iv)?
            }
        };

        if plaintext.len() != original_len {
            return Err(CipherError::DecodingMismatch {
                original_len,
                reason: "recovered length differs",
            });
        }

        debug!("{} recovered {} bytes", self.mode, plaintext.len());
        Ok(plaintext)
    }
}
