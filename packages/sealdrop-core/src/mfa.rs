//! # Multi-Factor Authentication
//!
//! Issues and checks signed one-time passcodes.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         OTP LIFECYCLE                                   │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  issue(user)                                                            │
//! │    code      ← OsRng, N decimal digits                                  │
//! │    signature ← Ed25519(SHA-256(code))                                   │
//! │    store OtpChallenge { signature, expires_at = now + ttl }             │
//! │    return code ──► delivered out of band (SMS, email)                   │
//! │                                                                         │
//! │  check(user, submitted)                                                 │
//! │    take latest challenge (consumed, even on failure)                    │
//! │    none / expired / signature mismatch ──► false                        │
//! │    otherwise ──► true                                                   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The issued code is never persisted. Only its signature is.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::config::{EngineConfig, OtpConfig};
use crate::crypto::{self, SigningKeyPair, VerifyKey};
use crate::error::{Error, Result};
use crate::storage::{ChallengeStore, OtpChallenge};

/// A freshly generated passcode
///
/// Zeroized on drop; `Debug` never prints the digits.
#[derive(Clone, PartialEq, Eq)]
pub struct OtpCode(Zeroizing<String>);

impl OtpCode {
    /// The code as a string of decimal digits
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for OtpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OtpCode(<{} digits>)", self.0.len())
    }
}

/// Result of [`OtpAuthenticator::issue`]
#[derive(Debug, Clone)]
pub struct IssuedOtp {
    /// ID of the stored challenge
    pub challenge_id: Uuid,
    /// Code to deliver to the user
    pub code: OtpCode,
    /// When the code stops being accepted
    pub expires_at: DateTime<Utc>,
}

/// Issues and checks OTP challenges for a signing key
pub struct OtpAuthenticator<C> {
    signing_key: Arc<SigningKeyPair>,
    verify_key: VerifyKey,
    challenges: Arc<C>,
    config: OtpConfig,
}

impl<C: ChallengeStore> OtpAuthenticator<C> {
    /// Create an authenticator
    pub fn new(
        signing_key: Arc<SigningKeyPair>,
        challenges: Arc<C>,
        config: OtpConfig,
    ) -> Result<Self> {
        config.validate()?;
        let verify_key = signing_key.verify_key();
        Ok(Self {
            signing_key,
            verify_key,
            challenges,
            config,
        })
    }

    /// Create an authenticator whose signing key is loaded from
    /// `signing_key_path`
    pub fn from_engine_config(config: &EngineConfig, challenges: Arc<C>) -> Result<Self> {
        let path = config
            .signing_key_path
            .as_ref()
            .ok_or_else(|| Error::Config("signing_key_path is not set".into()))?;

        let signing_key = SigningKeyPair::from_pem_file(path)?;
        tracing::info!(path = %path.display(), "Loaded OTP signing key");

        Self::new(Arc::new(signing_key), challenges, config.otp)
    }

    /// Public half of the signing key
    pub fn verify_key(&self) -> &VerifyKey {
        &self.verify_key
    }

    /// Generate a uniformly random code of the configured length
    pub fn generate_code(&self) -> OtpCode {
        let digits = self.config.digits as usize;
        let bound = 10u64.pow(self.config.digits);
        let value = rand::rngs::OsRng.gen_range(0..bound);
        OtpCode(Zeroizing::new(format!("{:0width$}", value, width = digits)))
    }

    /// Issue a new challenge for `user_id`
    pub async fn issue(&self, user_id: &str) -> Result<IssuedOtp> {
        self.issue_at(user_id, Utc::now()).await
    }

    /// [`issue`](Self::issue) with an explicit clock
    pub async fn issue_at(&self, user_id: &str, now: DateTime<Utc>) -> Result<IssuedOtp> {
        if user_id.is_empty() {
            return Err(Error::InvalidInput("User ID must not be empty".into()));
        }

        let code = self.generate_code();
        let signature = crypto::sign_otp(code.as_str(), &self.signing_key);

        let challenge = OtpChallenge {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            signature,
            issued_at: now,
            expires_at: now + Duration::seconds(self.config.ttl_secs),
        };
        let issued = IssuedOtp {
            challenge_id: challenge.id,
            code,
            expires_at: challenge.expires_at,
        };

        self.challenges.put(challenge).await?;

        tracing::info!(user_id, challenge_id = %issued.challenge_id, "Issued OTP challenge");
        Ok(issued)
    }

    /// Check `submitted_code` against the latest challenge for `user_id`
    ///
    /// The challenge is consumed whatever the outcome. Returns `Ok(false)`
    /// when there is no challenge, it has expired, or the code does not
    /// match; errors come only from the challenge store.
    pub async fn check(&self, user_id: &str, submitted_code: &str) -> Result<bool> {
        self.check_at(user_id, submitted_code, Utc::now()).await
    }

    /// [`check`](Self::check) with an explicit clock
    pub async fn check_at(
        &self,
        user_id: &str,
        submitted_code: &str,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let Some(challenge) = self.challenges.take_latest(user_id).await? else {
            tracing::debug!(user_id, "No pending OTP challenge");
            return Ok(false);
        };

        if challenge.is_expired_at(now) {
            tracing::debug!(user_id, challenge_id = %challenge.id, "OTP challenge expired");
            return Ok(false);
        }

        let valid = crypto::verify_otp(submitted_code, &challenge.signature, &self.verify_key);
        if !valid {
            tracing::warn!(user_id, challenge_id = %challenge.id, "OTP mismatch");
        }
        Ok(valid)
    }
}
