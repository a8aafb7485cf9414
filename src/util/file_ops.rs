// File Operations for the command line driver
// Persists the main/spill streams and the key file needed to decrypt them

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::error::CipherError;
use crate::rsa::bigint::{from_bytes, RsaBigInt};
use crate::rsa::{ChainMode, EncryptedPayload, RsaKeyPair};

pub const MAIN_FILE: &str = "main.bin";
pub const SPILL_FILE: &str = "spill.bin";
pub const KEY_FILE: &str = "key.txt";

/// Errors that can occur during file operations
#[derive(Debug, Error)]
pub enum FileError {
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("key file is missing field `{0}`")]
    MissingField(&'static str),
    #[error("key file field `{field}` is invalid: {value}")]
    InvalidField { field: &'static str, value: String },
    #[error("key file holds an unusable key: {0}")]
    InvalidKey(#[from] CipherError),
}

/// Result type for file operations
pub type FileResult<T> = Result<T, FileError>;

/// Everything besides the two streams that decryption needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyFile {
    pub key_pair: RsaKeyPair,
    pub mode: ChainMode,
    pub original_len: usize,
    pub iv: Option<RsaBigInt>,
}

impl KeyFile {
    /// Render as `name=value` lines; big integers are hex encoded.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("bits={}\n", self.key_pair.bit_size));
        out.push_str(&format!("mode={}\n", self.mode));
        out.push_str(&format!("n={}\n", hex_int(&self.key_pair.modulus)));
        out.push_str(&format!("e={}\n", hex_int(&self.key_pair.public_exponent)));
        out.push_str(&format!("d={}\n", hex_int(&self.key_pair.private_exponent)));
        out.push_str(&format!("len={}\n", self.original_len));
        if let Some(iv) = &self.iv {
            out.push_str(&format!("iv={}\n", hex_int(iv)));
        }
        out
    }

    pub fn parse(text: &str) -> FileResult<Self> {
        let field = |name: &'static str| lookup(text, name);

        let bit_size = parse_number(field("bits")?, "bits")?;
        let mode = field("mode")?
            .parse::<ChainMode>()
            .map_err(|value| FileError::InvalidField { field: "mode", value })?;
        let original_len = parse_number(field("len")?, "len")?;
        let iv = match field("iv") {
            Ok(value) => Some(parse_int(value, "iv")?),
            Err(_) => None,
        };

        let key_pair = RsaKeyPair {
            modulus: parse_int(field("n")?, "n")?,
            public_exponent: parse_int(field("e")?, "e")?,
            private_exponent: parse_int(field("d")?, "d")?,
            bit_size,
        };
        key_pair.validate()?;

        Ok(Self {
            key_pair,
            mode,
            original_len,
            iv,
        })
    }
}

fn lookup<'a>(text: &'a str, name: &'static str) -> FileResult<&'a str> {
    text.lines()
        .filter_map(|line| line.split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim())
        .ok_or(FileError::MissingField(name))
}

fn hex_int(n: &RsaBigInt) -> String {
    hex::encode(n.to_bytes_be())
}

fn parse_int(value: &str, field: &'static str) -> FileResult<RsaBigInt> {
    hex::decode(value)
        .map(|bytes| from_bytes(&bytes))
        .map_err(|e| FileError::InvalidField { field, value: e.to_string() })
}

fn parse_number<T: std::str::FromStr>(value: &str, field: &'static str) -> FileResult<T> {
    value.parse().map_err(|_| FileError::InvalidField {
        field,
        value: value.to_string(),
    })
}

/// Read entire file into memory
pub fn read_file(path: &Path) -> FileResult<Vec<u8>> {
    fs::read(path).map_err(|source| FileError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Write data to file
pub fn write_file(path: &Path, data: &[u8]) -> FileResult<()> {
    fs::write(path, data).map_err(|source| FileError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Write the streams and key file of an encryption into `dir`.
pub fn write_payload(dir: &Path, payload: &EncryptedPayload, key: &KeyFile) -> FileResult<()> {
    fs::create_dir_all(dir).map_err(|source| FileError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    write_file(&dir.join(MAIN_FILE), &payload.main)?;
    write_file(&dir.join(SPILL_FILE), &payload.spill)?;
    write_file(&dir.join(KEY_FILE), key.render().as_bytes())
}

/// Read back what [`write_payload`] produced: `(main, spill, key file)`.
pub fn read_payload(dir: &Path) -> FileResult<(Vec<u8>, Vec<u8>, KeyFile)> {
    let main = read_file(&dir.join(MAIN_FILE))?;
    let spill = read_file(&dir.join(SPILL_FILE))?;
    let key_path = dir.join(KEY_FILE);
    let text = String::from_utf8(read_file(&key_path)?).map_err(|e| FileError::InvalidField {
        field: "key file",
        value: e.to_string(),
    })?;
    Ok((main, spill, KeyFile::parse(&text)?))
}

/// Format byte count for display
pub fn format_file_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
