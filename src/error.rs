// Error Types
// Failure modes of key generation, block coding and stream splitting

use thiserror::Error;

/// Errors raised by the cipher core.
///
/// Every error is reported by the component that first observes the
/// inconsistency; nothing is corrected or retried on the caller's behalf.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CipherError {
    /// Requested modulus size cannot hold two primes and a usable block.
    #[error("invalid key size: {bits} bits ({reason})")]
    InvalidKeySize { bits: u32, reason: &'static str },

    /// No public exponent coprime with the totient was found.
    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    /// A stream or block does not have the length its geometry requires.
    #[error("invalid length: expected {expected}, got {actual} ({context})")]
    InvalidLength {
        expected: usize,
        actual: usize,
        context: &'static str,
    },

    /// Decoding produced output inconsistent with the recorded plaintext length.
    #[error("decoded data does not match the original length of {original_len} bytes ({reason})")]
    DecodingMismatch {
        original_len: usize,
        reason: &'static str,
    },

    /// Chained mode was asked to decode without its initialization vector.
    #[error("chained mode requires an initialization vector")]
    MissingIv,
}

/// Result type for cipher operations
pub type Result<T> = std::result::Result<T, CipherError>;
