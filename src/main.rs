use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use rsa_steg::rsa::{ChainMode, EncryptionSession};
use rsa_steg::util::file_ops::{
    format_file_size, read_file, read_payload, write_file, write_payload, KeyFile,
};
use rsa_steg::CipherConfig;

#[derive(Parser)]
#[command(name = "rsa_steg", about = "Encrypt a payload into main and spill streams")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a key and encrypt INPUT into OUT/main.bin, OUT/spill.bin and OUT/key.txt
    Encrypt {
        input: PathBuf,
        #[arg(long)]
        out: PathBuf,
        #[arg(long, default_value_t = 512)]
        bits: u32,
        #[arg(long, default_value = "cbc")]
        mode: ChainMode,
    },
    /// Decrypt the streams stored in DIR into OUT
    Decrypt {
        dir: PathBuf,
        #[arg(long)]
        out: PathBuf,
    },
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Encrypt { input, out, bits, mode } => {
            let plaintext = read_file(&input)?;
            let config = CipherConfig::default().with_bit_size(bits).with_mode(mode);
            let mut rng = rand::thread_rng();

            let session = EncryptionSession::generate(&config, &mut rng)
                .context("key generation failed")?;
            let payload = session
                .encrypt(&plaintext, &mut rng)
                .context("encryption failed")?;

            let key = KeyFile {
                key_pair: session.key_pair().clone(),
                mode,
                original_len: payload.original_len,
                iv: payload.iv.clone(),
            };
            write_payload(&out, &payload, &key)?;

            info!(
                "encrypted {} into {} main + {} spill",
                format_file_size(plaintext.len() as u64),
                format_file_size(payload.main.len() as u64),
                format_file_size(payload.spill.len() as u64)
            );
            println!("n={:x}", payload.modulus);
            println!("e={}", payload.public_exponent);
        }
        Command::Decrypt { dir, out } => {
            let (main, spill, key) = read_payload(&dir)?;
            let session = EncryptionSession::new(key.key_pair, key.mode);
            let plaintext = session
                .recover(&main, &spill, key.original_len, key.iv.as_ref())
                .context("decryption failed")?;

            write_file(&out, &plaintext)?;
            info!("recovered {}", format_file_size(plaintext.len() as u64));
        }
    }

    Ok(())
}

fn main() {
    env_logger::init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}
