//! Textbook RSA block cipher for hiding a payload inside an image container.
//!
//! A payload is enciphered block by block (ECB or CBC), then the ciphertext is
//! split into a main stream for the container's data region and a one byte per
//! block spill stream for the trailing region the container format ignores.
//! Key sizes are demonstration sized; this is not a general purpose RSA library.

pub mod config;
pub mod error;
pub mod rsa;
pub mod util;

pub use config::CipherConfig;
pub use error::{CipherError, Result};
pub use rsa::{ChainMode, CipherStream, EncryptedPayload, EncryptionSession, RsaKeyPair};
