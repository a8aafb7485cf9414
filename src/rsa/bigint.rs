// RSA Big Integer Operations
// Wrapper around num-bigint for RSA-specific operations

use num_bigint::{BigInt, BigUint, RandBigInt, Sign};
use num_integer::Integer;
use num_traits::{One, Zero};
use rand::Rng;

use crate::error::{CipherError, Result};

/// RSA Big Integer type alias
pub type RsaBigInt = BigUint;

/// Small primes used to reject most candidates before Miller-Rabin.
const SMALL_PRIMES: [u32; 24] = [
    3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89, 97,
];

/// Create a big integer from u64
pub fn from_u64(n: u64) -> RsaBigInt {
    RsaBigInt::from(n)
}

/// Create a big integer from bytes (big-endian)
pub fn from_bytes(bytes: &[u8]) -> RsaBigInt {
    RsaBigInt::from_bytes_be(bytes)
}

/// Serialize `n` as exactly `width` big-endian bytes, left-padded with zeros.
///
/// Fails when `n` needs more than `width` bytes. Zero serializes to `width`
/// zero bytes, including the empty slice for `width == 0`.
pub fn to_fixed_be(n: &RsaBigInt, width: usize) -> Result<Vec<u8>> {
    if n.is_zero() {
        return Ok(vec![0u8; width]);
    }

    let bytes = n.to_bytes_be();
    if bytes.len() > width {
        return Err(CipherError::InvalidLength {
            expected: width,
            actual: bytes.len(),
            context: "integer does not fit its byte width",
        });
    }

    let mut result = vec![0u8; width];
    result[width - bytes.len()..].copy_from_slice(&bytes);
    Ok(result)
}

/// Modular exponentiation: base^exp mod modulus
/// Uses square-and-multiply algorithm
pub fn mod_pow(base: &RsaBigInt, exp: &RsaBigInt, modulus: &RsaBigInt) -> RsaBigInt {
    if modulus.is_one() {
        return RsaBigInt::zero();
    }

    let mut result = RsaBigInt::one();
    let mut base = base % modulus;
    let mut exp = exp.clone();

    while !exp.is_zero() {
        if exp.is_odd() {
            result = (&result * &base) % modulus;
        }
        base = (&base * &base) % modulus;
        exp >>= 1;
    }

    result
}

/// Extended Euclidean Algorithm
/// Returns (gcd, x, y) such that a*x + b*y = gcd = gcd(a, b)
pub fn extended_gcd(a: &BigInt, b: &BigInt) -> (BigInt, BigInt, BigInt) {
    let (mut old_r, mut r) = (a.clone(), b.clone());
    let (mut old_s, mut s) = (BigInt::one(), BigInt::zero());
    let (mut old_t, mut t) = (BigInt::zero(), BigInt::one());

    while !r.is_zero() {
        let q = &old_r / &r;
        let next_r = &old_r - &q * &r;
        old_r = std::mem::replace(&mut r, next_r);
        let next_s = &old_s - &q * &s;
        old_s = std::mem::replace(&mut s, next_s);
        let next_t = &old_t - &q * &t;
        old_t = std::mem::replace(&mut t, next_t);
    }

    (old_r, old_s, old_t)
}

/// Greatest common divisor through the extended Euclidean algorithm
pub fn gcd(a: &RsaBigInt, b: &RsaBigInt) -> RsaBigInt {
    let (g, _, _) = extended_gcd(&signed(a), &signed(b));
    g.magnitude().clone()
}

/// Compute modular inverse: a^(-1) mod m
/// Returns None if inverse doesn't exist
pub fn mod_inverse(a: &RsaBigInt, m: &RsaBigInt) -> Option<RsaBigInt> {
    if m.is_zero() {
        return None;
    }

    let (g, x, _) = extended_gcd(&signed(a), &signed(m));
    if !g.is_one() {
        return None;
    }

    // mod_floor keeps the result in [0, m) for negative coefficients
    x.mod_floor(&signed(m)).to_biguint()
}

fn signed(n: &RsaBigInt) -> BigInt {
    BigInt::from_biguint(Sign::Plus, n.clone())
}

/// Miller-Rabin primality test
/// Returns true if n is probably prime
pub fn is_probable_prime<R: Rng + ?Sized>(n: &RsaBigInt, iterations: u32, rng: &mut R) -> bool {
    let two = RsaBigInt::from(2u8);
    if n < &two {
        return false;
    }
    if n == &two {
        return true;
    }
    if n.is_even() {
        return false;
    }

    for &p in SMALL_PRIMES.iter() {
        let p = RsaBigInt::from(p);
        if n == &p {
            return true;
        }
        if (n % &p).is_zero() {
            return false;
        }
    }

    // Write n-1 as d * 2^s with d odd
    let n_minus_one = n - 1u8;
    let mut d = n_minus_one.clone();
    let mut s = 0u32;
    while d.is_even() {
        d >>= 1;
        s += 1;
    }

    'witness: for _ in 0..iterations {
        // Pick random witness a in [2, n-1)
        let a = rng.gen_biguint_range(&two, &n_minus_one);
        let mut x = mod_pow(&a, &d, n);

        if x.is_one() || x == n_minus_one {
            continue;
        }

        for _ in 1..s {
            x = mod_pow(&x, &two, n);
            if x == n_minus_one {
                continue 'witness;
            }
        }

        // Composite
        return false;
    }

    // Probably prime
    true
}

/// Generate a random prime of exactly `bit_length` bits.
///
/// The two most significant bits are forced on, so the product of two such
/// primes has exactly the sum of their bit lengths.
pub fn random_prime<R: Rng + ?Sized>(bit_length: u64, rounds: u32, rng: &mut R) -> RsaBigInt {
    debug_assert!(bit_length >= 3);

    loop {
        let mut candidate = rng.gen_biguint(bit_length);
        candidate.set_bit(bit_length - 1, true);
        candidate.set_bit(bit_length - 2, true);
        candidate.set_bit(0, true);

        if is_probable_prime(&candidate, rounds, rng) {
            return candidate;
        }
    }
}

/// Generate a random big integer in range [0, 2^bits)
pub fn random_bits<R: Rng + ?Sized>(bits: u64, rng: &mut R) -> RsaBigInt {
    rng.gen_biguint(bits)
}
