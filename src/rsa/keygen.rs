// RSA Key Generation
// Implements RSA key pair generation with an ascending public exponent search

use log::debug;
use num_traits::One;
use rand::Rng;

use super::bigint::{gcd, mod_inverse, random_prime, RsaBigInt};
use crate::error::{CipherError, Result};

/// Smallest modulus size that still leaves room for a one byte block body.
pub const MIN_KEY_BITS: u32 = 32;

/// Default number of Miller-Rabin rounds per prime candidate.
pub const DEFAULT_PRIME_ROUNDS: u32 = 20;

/// RSA Key Pair
///
/// `modulus = p * q` for two distinct primes, `public_exponent` is the smallest
/// exponent from 2 upward coprime with `(p-1)(q-1)`, and `private_exponent` is
/// its inverse modulo that totient. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RsaKeyPair {
    pub modulus: RsaBigInt,
    pub public_exponent: RsaBigInt,
    pub private_exponent: RsaBigInt,
    pub bit_size: u32,
}

impl RsaKeyPair {
    /// Build a key pair from two known primes.
    ///
    /// Used directly by tests with fixed primes; [`generate_keypair`] routes
    /// its random primes through here as well.
    pub fn from_primes(p: &RsaBigInt, q: &RsaBigInt, bit_size: u32) -> Result<Self> {
        validate_bit_size(bit_size)?;
        if p == q {
            return Err(CipherError::InvalidKeySize {
                bits: bit_size,
                reason: "primes must be distinct",
            });
        }

        let modulus = p * q;
        check_modulus_bits(&modulus, bit_size)?;

        let totient = (p - 1u8) * (q - 1u8);
        let public_exponent = find_public_exponent(&totient)?;
        let private_exponent = mod_inverse(&public_exponent, &totient).ok_or_else(|| {
            CipherError::KeyGeneration("public exponent has no inverse modulo the totient".into())
        })?;

        Ok(Self {
            modulus,
            public_exponent,
            private_exponent,
            bit_size,
        })
    }

    /// Check that the size and modulus admit the block geometry.
    ///
    /// Fields are public, so a pair read from storage or built by hand must
    /// pass this before it is used for coding.
    pub fn validate(&self) -> Result<()> {
        validate_bit_size(self.bit_size)?;
        check_modulus_bits(&self.modulus, self.bit_size)
    }

    /// Length in bytes of every ciphertext block.
    pub fn block_length(&self) -> usize {
        (self.bit_size / 8) as usize
    }

    /// Length in bytes of a full plaintext block body.
    pub fn body_length(&self) -> usize {
        self.block_length() - 1
    }
}

/// Scan exponents 2, 3, 4, ... below the totient and return the first coprime one.
fn find_public_exponent(totient: &RsaBigInt) -> Result<RsaBigInt> {
    let mut e = RsaBigInt::from(2u8);
    while &e < totient {
        if gcd(&e, totient).is_one() {
            return Ok(e);
        }
        e += 1u8;
    }

    Err(CipherError::KeyGeneration(
        "no exponent below the totient is coprime with it".into(),
    ))
}

/// The modulus must have more than `bit_size - 8` and at most `bit_size` bits.
fn check_modulus_bits(modulus: &RsaBigInt, bit_size: u32) -> Result<()> {
    let bits = modulus.bits();
    if bits > u64::from(bit_size) || bits <= u64::from(bit_size) - 8 {
        return Err(CipherError::InvalidKeySize {
            bits: bit_size,
            reason: "modulus does not match the block geometry",
        });
    }
    Ok(())
}

fn validate_bit_size(bit_size: u32) -> Result<()> {
    if bit_size < MIN_KEY_BITS {
        return Err(CipherError::InvalidKeySize {
            bits: bit_size,
            reason: "must be at least 32",
        });
    }
    if bit_size % 8 != 0 {
        return Err(CipherError::InvalidKeySize {
            bits: bit_size,
            reason: "must be a multiple of 8",
        });
    }
    Ok(())
}

/// Draw two distinct primes whose bit lengths add up to `bit_size`.
pub fn generate_prime_pair<R: Rng + ?Sized>(
    bit_size: u32,
    rounds: u32,
    rng: &mut R,
) -> Result<(RsaBigInt, RsaBigInt)> {
    validate_bit_size(bit_size)?;

    let p_bits = u64::from(bit_size / 2);
    let q_bits = u64::from(bit_size) - p_bits;

    let p = random_prime(p_bits, rounds, rng);
    loop {
        let q = random_prime(q_bits, rounds, rng);
        if q != p {
            return Ok((p, q));
        }
    }
}

/// Generate RSA key pair with specified modulus size in bits
pub fn generate_keypair<R: Rng + ?Sized>(
    bit_size: u32,
    rounds: u32,
    rng: &mut R,
) -> Result<RsaKeyPair> {
    let (p, q) = generate_prime_pair(bit_size, rounds, rng)?;
    let keypair = RsaKeyPair::from_primes(&p, &q, bit_size)?;

    debug!(
        "generated {}-bit key: n={:x} e={}",
        bit_size, keypair.modulus, keypair.public_exponent
    );

    Ok(keypair)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rsa::bigint::{from_u64, mod_pow};
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    // 65521 * 65519 = 4_292_870_399, a 32-bit modulus
    fn fixed_keypair() -> RsaKeyPair {
        RsaKeyPair::from_primes(&from_u64(65_521), &from_u64(65_519), 32).unwrap()
    }

    #[test]
    fn test_from_primes_exponent_search() {
        let keypair = fixed_keypair();
        assert_eq!(keypair.modulus, from_u64(4_292_870_399));

        // totient = 65520 * 65518 is divisible by 2, 3, 5, 7 and 13; 11 is the first coprime
        assert_eq!(keypair.public_exponent, from_u64(11));

        let totient = from_u64(65_520 * 65_518);
        let product = &keypair.public_exponent * &keypair.private_exponent;
        assert_eq!(product % totient, from_u64(1));
    }

    #[test]
    fn test_block_geometry() {
        let keypair = fixed_keypair();
        assert_eq!(keypair.block_length(), 4);
        assert_eq!(keypair.body_length(), 3);
    }

    #[test]
    fn test_invalid_key_sizes() {
        let mut rng = ChaCha20Rng::seed_from_u64(0);
        assert!(matches!(
            generate_keypair(16, 10, &mut rng),
            Err(CipherError::InvalidKeySize { bits: 16, .. })
        ));
        assert!(matches!(
            generate_keypair(100, 10, &mut rng),
            Err(CipherError::InvalidKeySize { bits: 100, .. })
        ));
    }

    #[test]
    fn test_identical_primes_rejected() {
        let p = from_u64(65_521);
        assert!(matches!(
            RsaKeyPair::from_primes(&p, &p, 32),
            Err(CipherError::InvalidKeySize { .. })
        ));
    }

    #[test]
    fn test_modulus_outside_block_geometry() {
        // 251 * 241 is a 16-bit modulus, far too small for a 32-bit block
        assert!(RsaKeyPair::from_primes(&from_u64(251), &from_u64(241), 32).is_err());
    }

    #[test]
    fn test_validate() {
        let keypair = fixed_keypair();
        assert!(keypair.validate().is_ok());

        for bits in [0, 8, 31, 36] {
            let broken = RsaKeyPair { bit_size: bits, ..keypair.clone() };
            assert!(matches!(broken.validate(), Err(CipherError::InvalidKeySize { .. })));
        }

        // a 32-bit modulus cannot back 64-bit blocks
        let oversized = RsaKeyPair { bit_size: 64, ..keypair };
        assert!(matches!(oversized.validate(), Err(CipherError::InvalidKeySize { .. })));
    }

    #[test]
    fn test_key_generation() {
        let mut rng = ChaCha20Rng::seed_from_u64(42);
        let keypair = generate_keypair(128, DEFAULT_PRIME_ROUNDS, &mut rng).unwrap();

        assert_eq!(keypair.modulus.bits(), 128);
        assert_eq!(keypair.block_length(), 16);

        for m in [0u64, 1, 2, 0xABCD, u64::MAX] {
            let m = from_u64(m);
            let c = mod_pow(&m, &keypair.public_exponent, &keypair.modulus);
            assert_eq!(mod_pow(&c, &keypair.private_exponent, &keypair.modulus), m);
        }
    }

    #[test]
    fn test_key_generation_is_reproducible_with_seed() {
        let a = generate_keypair(64, 10, &mut ChaCha20Rng::seed_from_u64(9)).unwrap();
        let b = generate_keypair(64, 10, &mut ChaCha20Rng::seed_from_u64(9)).unwrap();
        assert_eq!(a, b);
    }
}
