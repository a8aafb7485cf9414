// RSA Module - Main module file
// Exports key generation, block coding, chaining and stream splitting

pub mod bigint;
pub mod keygen;
pub mod block;
pub mod chain;
pub mod split;
pub mod session;

pub use keygen::{generate_keypair, generate_prime_pair, RsaKeyPair};
pub use block::{decode_block, encode_block};
pub use chain::{
    block_count, decode_cbc, decode_ecb, encode_cbc, encode_cbc_with_iv, encode_ecb, ChainMode,
};
pub use split::{recombine, separate_regions, split, CipherStream};
pub use session::{EncryptedPayload, EncryptionSession};
