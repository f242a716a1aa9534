//! Engine configuration.
//!
//! Every field has a default, so an empty TOML document is a valid config.
//!
//! ```toml
//! rsa_key_bits = 2048
//! max_upload_bytes = 104857600
//! signing_key_path = "/run/secrets/otp-signing.pem"
//!
//! [otp]
//! digits = 6
//! ttl_secs = 300
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::crypto::{DEFAULT_RSA_BITS, MAX_PLAINTEXT_LEN, SUPPORTED_RSA_BITS};
use crate::error::{Error, Result};

/// Default upload size cap (100 MiB).
const DEFAULT_MAX_UPLOAD_BYTES: u64 = 100 * 1024 * 1024;

/// Default number of OTP digits.
const DEFAULT_OTP_DIGITS: u32 = 6;

/// Default OTP lifetime in seconds (5 minutes).
const DEFAULT_OTP_TTL_SECS: i64 = 300;

/// Accepted OTP lengths.
const OTP_DIGITS_RANGE: std::ops::RangeInclusive<u32> = 4..=10;

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// RSA modulus size for newly enrolled recipients
    pub rsa_key_bits: usize,
    /// Largest file the vault accepts for upload
    pub max_upload_bytes: u64,
    /// PKCS#8 PEM file holding the OTP signing key.
    /// When unset, the bootstrapping service must supply a key itself.
    pub signing_key_path: Option<PathBuf>,
    /// One-time passcode settings
    pub otp: OtpConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rsa_key_bits: DEFAULT_RSA_BITS,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            signing_key_path: None,
            otp: OtpConfig::default(),
        }
    }
}

/// One-time passcode settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OtpConfig {
    /// Number of decimal digits per code
    pub digits: u32,
    /// Seconds a challenge stays valid after issuance
    pub ttl_secs: i64,
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            digits: DEFAULT_OTP_DIGITS,
            ttl_secs: DEFAULT_OTP_TTL_SECS,
        }
    }
}

impl OtpConfig {
    /// Check the OTP settings
    pub fn validate(&self) -> Result<()> {
        if !OTP_DIGITS_RANGE.contains(&self.digits) {
            return Err(Error::Config(format!(
                "otp.digits must be between {} and {}, got {}",
                OTP_DIGITS_RANGE.start(),
                OTP_DIGITS_RANGE.end(),
                self.digits
            )));
        }
        if self.ttl_secs <= 0 {
            return Err(Error::Config(format!(
                "otp.ttl_secs must be positive, got {}",
                self.ttl_secs
            )));
        }
        Ok(())
    }
}

impl EngineConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Cannot read {}: {}", path.display(), e)))?;

        tracing::debug!(path = %path.display(), "Loading engine configuration");
        Self::from_toml_str(&contents)
    }

    /// Check every field for consistency
    pub fn validate(&self) -> Result<()> {
        if !SUPPORTED_RSA_BITS.contains(&self.rsa_key_bits) {
            return Err(Error::Config(format!(
                "rsa_key_bits must be one of {:?}, got {}",
                SUPPORTED_RSA_BITS, self.rsa_key_bits
            )));
        }
        if self.max_upload_bytes == 0 || self.max_upload_bytes > MAX_PLAINTEXT_LEN {
            return Err(Error::Config(format!(
                "max_upload_bytes must be between 1 and {}, got {}",
                MAX_PLAINTEXT_LEN, self.max_upload_bytes
            )));
        }
        self.otp.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        assert_eq!(config.rsa_key_bits, 2048);
        assert_eq!(config.otp.digits, 6);
        assert_eq!(config.otp.ttl_secs, 300);
        config.validate().unwrap();
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_partial_toml() {
        let config = EngineConfig::from_toml_str(
            r#"
            rsa_key_bits = 3072

            [otp]
            digits = 8
            "#,
        )
        .unwrap();

        assert_eq!(config.rsa_key_bits, 3072);
        assert_eq!(config.otp.digits, 8);
        assert_eq!(config.otp.ttl_secs, 300);
    }

    #[test]
    fn test_invalid_values_rejected() {
        for doc in [
            "rsa_key_bits = 1024",
            "max_upload_bytes = 0",
            "[otp]\ndigits = 3",
            "[otp]\nttl_secs = 0",
            "unknown_field = true",
        ] {
            let err = EngineConfig::from_toml_str(doc).unwrap_err();
            assert!(matches!(err, Error::Config(_)), "accepted: {doc}");
        }
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "signing_key_path = \"/run/secrets/otp.pem\"").unwrap();

        let config = EngineConfig::from_file(file.path()).unwrap();
        assert_eq!(
            config.signing_key_path,
            Some(PathBuf::from("/run/secrets/otp.pem"))
        );
    }

    #[test]
    fn test_missing_file() {
        let err = EngineConfig::from_file("/nonexistent/sealdrop.toml").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
