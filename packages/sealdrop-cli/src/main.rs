//! Sealdrop command-line tool
//!
//! Generates recipient and signing keys, encrypts and decrypts files as JSON
//! ciphertext bundles, and signs or verifies one-time passcodes.
//!
//! ```bash
//! sealdrop keygen --out-dir keys/
//! sealdrop encrypt --recipient keys/public.pem --input report.pdf --output report.json
//! sealdrop decrypt --key keys/private.pem --input report.json --output report.pdf
//! ```

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use sealdrop_core::EngineConfig;

// ── CLI Arguments ─────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "sealdrop", version, about = "Sealdrop file encryption and OTP tool")]
struct Args {
    /// Engine configuration file (TOML)
    #[arg(long, global = true, env = "SEALDROP_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a recipient RSA key pair
    Keygen {
        /// Directory to write public.pem and private.pem into
        #[arg(long)]
        out_dir: PathBuf,

        /// RSA modulus size (defaults to the configured size)
        #[arg(long, env = "SEALDROP_RSA_BITS")]
        bits: Option<usize>,

        /// Overwrite existing key files
        #[arg(long)]
        force: bool,
    },

    /// Encrypt a file for a recipient
    Encrypt {
        /// Recipient public key (PEM)
        #[arg(long)]
        recipient: PathBuf,

        /// File to encrypt
        #[arg(long)]
        input: PathBuf,

        /// Where to write the JSON bundle
        #[arg(long)]
        output: PathBuf,
    },

    /// Decrypt a JSON bundle
    Decrypt {
        /// Recipient private key (PEM)
        #[arg(long)]
        key: PathBuf,

        /// JSON bundle to decrypt
        #[arg(long)]
        input: PathBuf,

        /// Where to write the plaintext
        #[arg(long)]
        output: PathBuf,
    },

    /// Generate an Ed25519 OTP signing key pair
    SigningKeygen {
        /// Directory to write signing.pem and verify.pem into
        #[arg(long)]
        out_dir: PathBuf,

        /// Overwrite existing key files
        #[arg(long)]
        force: bool,
    },

    /// Sign an OTP code and print the hex signature
    OtpSign {
        /// Signing key (PKCS#8 PEM)
        #[arg(long, env = "SEALDROP_SIGNING_KEY")]
        signing_key: PathBuf,

        /// Code to sign
        #[arg(long)]
        code: String,
    },

    /// Verify an OTP signature; exits 1 when invalid
    OtpVerify {
        /// Verify key (PEM)
        #[arg(long)]
        verify_key: PathBuf,

        /// Code to check
        #[arg(long)]
        code: String,

        /// Hex signature
        #[arg(long)]
        signature: String,
    },
}

// ── Entry Point ───────────────────────────────────────────────────────────────

fn load_config(path: Option<&PathBuf>) -> Result<EngineConfig> {
    match path {
        Some(path) => Ok(EngineConfig::from_file(path)?),
        None => Ok(EngineConfig::default()),
    }
}

fn run(args: Args) -> Result<ExitCode> {
    let config = load_config(args.config.as_ref())?;

    match args.command {
        Command::Keygen {
            out_dir,
            bits,
            force,
        } => {
            let keys = commands::keygen(&config, &out_dir, bits, force)?;
            println!("{}", keys.public.display());
            println!("{}", keys.private.display());
        }
        Command::Encrypt {
            recipient,
            input,
            output,
        } => commands::encrypt_file(&config, &recipient, &input, &output)?,
        Command::Decrypt { key, input, output } => commands::decrypt_file(&key, &input, &output)?,
        Command::SigningKeygen { out_dir, force } => {
            let keys = commands::signing_keygen(&out_dir, force)?;
            println!("{}", keys.public.display());
            println!("{}", keys.private.display());
        }
        Command::OtpSign { signing_key, code } => {
            println!("{}", commands::otp_sign(&signing_key, &code)?);
        }
        Command::OtpVerify {
            verify_key,
            code,
            signature,
        } => {
            if commands::otp_verify(&verify_key, &code, &signature)? {
                println!("valid");
            } else {
                println!("invalid");
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn main() -> Result<ExitCode> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sealdrop=info,sealdrop_core=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    run(Args::parse())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_otp_verify() {
        let args = Args::try_parse_from([
            "sealdrop",
            "otp-verify",
            "--verify-key",
            "verify.pem",
            "--code",
            "482913",
            "--signature",
            "abcd",
        ])
        .unwrap();

        match args.command {
            Command::OtpVerify { code, .. } => assert_eq!(code, "482913"),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_missing_config_file_fails() {
        let path = PathBuf::from("/nonexistent/sealdrop.toml");
        assert!(load_config(Some(&path)).is_err());
        assert!(load_config(None).is_ok());
    }
}
