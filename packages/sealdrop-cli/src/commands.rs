//! Subcommand implementations.
//!
//! Each function takes paths and returns plain values so `main` stays a thin
//! dispatcher. Private keys are written with owner-only permissions and never
//! overwrite an existing file unless `force` is set.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use color_eyre::eyre::{Result, WrapErr};
use sealdrop_core::crypto::{
    self, AsymmetricKeyPair, CiphertextBundle, OtpSignature, SigningKeyPair, VerifyKey,
};
use sealdrop_core::EngineConfig;
use zeroize::Zeroizing;

/// File names written by `keygen`
pub const PUBLIC_KEY_FILE: &str = "public.pem";
/// Private half written by `keygen`
pub const PRIVATE_KEY_FILE: &str = "private.pem";
/// Signing key written by `signing-keygen`
pub const SIGNING_KEY_FILE: &str = "signing.pem";
/// Verify key written by `signing-keygen`
pub const VERIFY_KEY_FILE: &str = "verify.pem";

/// Paths of a freshly written key pair
#[derive(Debug)]
pub struct WrittenKeys {
    pub public: PathBuf,
    pub private: PathBuf,
}

impl WrittenKeys {
    /// Refuse to start if either half is already on disk
    fn ensure_absent(&self, force: bool) -> Result<()> {
        if force {
            return Ok(());
        }
        for path in [&self.public, &self.private] {
            if path.exists() {
                color_eyre::eyre::bail!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                );
            }
        }
        Ok(())
    }
}

fn write_public(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).wrap_err_with(|| format!("Cannot write {}", path.display()))
}

fn write_secret(path: &Path, contents: &str, force: bool) -> Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true);
    if force {
        options.create(true).truncate(true);
    } else {
        options.create_new(true);
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options
        .open(path)
        .wrap_err_with(|| format!("Cannot create {} (use --force to overwrite)", path.display()))?;
    file.write_all(contents.as_bytes())
        .wrap_err_with(|| format!("Cannot write {}", path.display()))
}

fn read_secret(path: &Path) -> Result<Zeroizing<String>> {
    fs::read_to_string(path)
        .map(Zeroizing::new)
        .wrap_err_with(|| format!("Cannot read {}", path.display()))
}

fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).wrap_err_with(|| format!("Cannot read {}", path.display()))
}

/// Generate a recipient RSA key pair into `out_dir`
pub fn keygen(
    config: &EngineConfig,
    out_dir: &Path,
    bits: Option<usize>,
    force: bool,
) -> Result<WrittenKeys> {
    let bits = bits.unwrap_or(config.rsa_key_bits);
    fs::create_dir_all(out_dir)
        .wrap_err_with(|| format!("Cannot create {}", out_dir.display()))?;

    let keys = WrittenKeys {
        public: out_dir.join(PUBLIC_KEY_FILE),
        private: out_dir.join(PRIVATE_KEY_FILE),
    };
    keys.ensure_absent(force)?;

    let pair = AsymmetricKeyPair::generate(bits)?;
    write_secret(&keys.private, &crypto::export_private(&pair.private)?, force)?;
    write_public(&keys.public, &crypto::export_public(&pair.public)?)?;

    tracing::info!(bits, dir = %out_dir.display(), "Wrote recipient key pair");
    Ok(keys)
}

/// Encrypt `input` for the holder of the key in `recipient`, writing a JSON bundle
pub fn encrypt_file(
    config: &EngineConfig,
    recipient: &Path,
    input: &Path,
    output: &Path,
) -> Result<()> {
    let recipient_pem = read_text(recipient)?;
    let plaintext =
        Zeroizing::new(fs::read(input).wrap_err_with(|| format!("Cannot read {}", input.display()))?);

    let len = plaintext.len() as u64;
    if len > config.max_upload_bytes {
        return Err(sealdrop_core::Error::PlaintextTooLarge {
            len,
            max: config.max_upload_bytes,
        }
        .into());
    }

    let bundle = crypto::encrypt_for_pem(&plaintext, &recipient_pem)?;
    fs::write(output, bundle.to_json()?)
        .wrap_err_with(|| format!("Cannot write {}", output.display()))?;

    tracing::info!(size = len, output = %output.display(), "Encrypted file");
    Ok(())
}

/// Decrypt a JSON bundle with the private key in `key`
pub fn decrypt_file(key: &Path, input: &Path, output: &Path) -> Result<()> {
    let private_pem = read_secret(key)?;
    let private = crypto::import_private(&private_pem)?;

    let bundle = CiphertextBundle::from_json(&read_text(input)?)
        .wrap_err_with(|| format!("{} is not a ciphertext bundle", input.display()))?;
    let plaintext = Zeroizing::new(crypto::decrypt(&bundle, &private)?);

    fs::write(output, plaintext.as_slice())
        .wrap_err_with(|| format!("Cannot write {}", output.display()))?;

    tracing::info!(size = plaintext.len(), output = %output.display(), "Decrypted file");
    Ok(())
}

/// Generate an OTP signing key pair into `out_dir`
pub fn signing_keygen(out_dir: &Path, force: bool) -> Result<WrittenKeys> {
    fs::create_dir_all(out_dir)
        .wrap_err_with(|| format!("Cannot create {}", out_dir.display()))?;

    let keys = WrittenKeys {
        public: out_dir.join(VERIFY_KEY_FILE),
        private: out_dir.join(SIGNING_KEY_FILE),
    };
    keys.ensure_absent(force)?;

    let signing_key = SigningKeyPair::generate();
    write_secret(&keys.private, &signing_key.to_pem()?, force)?;
    write_public(&keys.public, &signing_key.verify_key().to_pem()?)?;

    tracing::info!(dir = %out_dir.display(), "Wrote OTP signing key pair");
    Ok(keys)
}

/// Sign `code`, returning the hex signature
pub fn otp_sign(signing_key: &Path, code: &str) -> Result<String> {
    let signing_key = SigningKeyPair::from_pem_file(signing_key)?;
    Ok(crypto::sign_otp(code, &signing_key).to_hex())
}

/// Verify a hex signature over `code`
///
/// Undecodable hex counts as an invalid signature.
pub fn otp_verify(verify_key: &Path, code: &str, signature_hex: &str) -> Result<bool> {
    let verify_key = VerifyKey::from_pem(&read_text(verify_key)?)?;

    let Ok(signature) = OtpSignature::from_hex(signature_hex) else {
        tracing::warn!("Signature is not valid hex");
        return Ok(false);
    };

    Ok(crypto::verify_otp(code, &signature, &verify_key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig::default();
        let keys = keygen(&config, dir.path(), None, false).unwrap();

        let input = dir.path().join("invoice.txt");
        let bundle = dir.path().join("invoice.json");
        let output = dir.path().join("invoice.out");
        fs::write(&input, b"Invoice #1042: 4,200.00 EUR").unwrap();

        encrypt_file(&config, &keys.public, &input, &bundle).unwrap();
        let json = fs::read_to_string(&bundle).unwrap();
        assert!(!json.contains("Invoice"));

        decrypt_file(&keys.private, &bundle, &output).unwrap();
        assert_eq!(fs::read(&output).unwrap(), fs::read(&input).unwrap());

        // Existing keys are not overwritten
        assert!(keygen(&config, dir.path(), None, false).is_err());

        // Tampered bundle is rejected
        let mut parsed = CiphertextBundle::from_json(&json).unwrap();
        parsed.authentication_tag[0] ^= 1;
        fs::write(&bundle, parsed.to_json().unwrap()).unwrap();
        assert!(decrypt_file(&keys.private, &bundle, &output).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_private_key_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let keys = signing_keygen(dir.path(), false).unwrap();
        let mode = fs::metadata(&keys.private).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_otp_sign_verify() {
        let dir = tempfile::tempdir().unwrap();
        let keys = signing_keygen(dir.path(), false).unwrap();

        let signature = otp_sign(&keys.private, "482913").unwrap();
        assert_eq!(signature.len(), 128);

        assert!(otp_verify(&keys.public, "482913", &signature).unwrap());
        assert!(!otp_verify(&keys.public, "482914", &signature).unwrap());
        assert!(!otp_verify(&keys.public, "482913", "zz-not-hex").unwrap());
        assert!(!otp_verify(&keys.public, "482913", &signature[..64]).unwrap());
    }

    #[test]
    fn test_force_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let first = signing_keygen(dir.path(), false).unwrap();
        let before = fs::read_to_string(&first.public).unwrap();

        assert!(signing_keygen(dir.path(), false).is_err());
        let second = signing_keygen(dir.path(), true).unwrap();
        assert_ne!(fs::read_to_string(&second.public).unwrap(), before);
    }

    #[test]
    fn test_existing_public_half_blocks_keygen() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig::default();
        let keys = keygen(&config, dir.path(), None, false).unwrap();
        let public_before = fs::read_to_string(&keys.public).unwrap();
        fs::remove_file(&keys.private).unwrap();

        assert!(keygen(&config, dir.path(), None, false).is_err());
        assert!(!keys.private.exists());
        assert_eq!(fs::read_to_string(&keys.public).unwrap(), public_before);

        let signing = signing_keygen(dir.path(), false).unwrap();
        fs::remove_file(&signing.private).unwrap();
        assert!(signing_keygen(dir.path(), false).is_err());
        assert!(!signing.private.exists());
    }

    #[test]
    fn test_encrypt_respects_upload_limit() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("big.bin");
        fs::write(&input, vec![0u8; 32]).unwrap();

        let config = EngineConfig {
            max_upload_bytes: 16,
            ..EngineConfig::default()
        };
        // The size check runs before the key is parsed
        fs::write(dir.path().join("pub.pem"), "unused").unwrap();
        let result = encrypt_file(
            &config,
            &dir.path().join("pub.pem"),
            &input,
            &dir.path().join("out.json"),
        );
        assert!(result.is_err());
    }
}
