// Cipher Configuration
// Key size, chaining mode and primality effort for a session

use crate::rsa::chain::ChainMode;
use crate::rsa::keygen::DEFAULT_PRIME_ROUNDS;

/// Configuration for key generation and encryption
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CipherConfig {
    /// Modulus size in bits; the block length is `bit_size / 8`.
    pub bit_size: u32,
    pub mode: ChainMode,
    /// Miller-Rabin rounds per prime candidate.
    pub prime_rounds: u32,
}

impl Default for CipherConfig {
    fn default() -> Self {
        Self {
            bit_size: 512,
            mode: ChainMode::Cbc,
            prime_rounds: DEFAULT_PRIME_ROUNDS,
        }
    }
}

impl CipherConfig {
    pub fn with_bit_size(mut self, bit_size: u32) -> Self {
        self.bit_size = bit_size;
        self
    }

    pub fn with_mode(mut self, mode: ChainMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_prime_rounds(mut self, rounds: u32) -> Self {
        self.prime_rounds = rounds;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_builders() {
        let config = CipherConfig::default();
        assert_eq!(config.bit_size, 512);
        assert_eq!(config.mode, ChainMode::Cbc);

        let config = config.with_bit_size(1024).with_mode(ChainMode::Ecb).with_prime_rounds(5);
        assert_eq!(config.bit_size, 1024);
        assert_eq!(config.mode, ChainMode::Ecb);
        assert_eq!(config.prime_rounds, 5);
    }
}
