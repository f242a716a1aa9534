//! # OTP Demo
//!
//! Signs and verifies one-time passcodes, then runs a full issue/check
//! cycle through the authenticator.
//!
//! ## Run
//!
//! ```bash
//! cargo run --example otp_demo
//! ```

use std::sync::Arc;

use sealdrop_core::crypto::{sign_otp, verify_otp, SigningKeyPair};
use sealdrop_core::storage::MemoryChallengeStore;
use sealdrop_core::{OtpAuthenticator, OtpConfig};

#[tokio::main]
async fn main() {
    println!("=== Sealdrop Core: OTP Signing Demo ===\n");

    // Step 1: Signing key
    println!("Step 1: Generating the service signing key (Ed25519)...");
    let signing_key = Arc::new(SigningKeyPair::generate());
    let verify_key = signing_key.verify_key();
    println!("  Verify key: {}", hex::encode(verify_key.to_bytes()));
    println!();

    // Step 2: Sign and verify
    println!("Step 2: Signing code 482913...");
    let signature = sign_otp("482913", &signing_key);
    println!("  Signature: {}...", &signature.to_hex()[..32]);
    println!("  verify(482913) = {}", verify_otp("482913", &signature, &verify_key));
    println!("  verify(482914) = {}", verify_otp("482914", &signature, &verify_key));
    println!();

    // Step 3: Issue and check
    println!("Step 3: Issuing a challenge for alice...");
    let auth = OtpAuthenticator::new(
        signing_key,
        Arc::new(MemoryChallengeStore::new()),
        OtpConfig::default(),
    )
    .expect("Invalid OTP config");

    let issued = auth.issue("alice").await.expect("Issue failed");
    println!("  Code sent out of band: {}", issued.code.as_str());
    println!("  Expires at: {}", issued.expires_at);

    let first = auth
        .check("alice", issued.code.as_str())
        .await
        .expect("Check failed");
    let second = auth
        .check("alice", issued.code.as_str())
        .await
        .expect("Check failed");
    println!("  First check:  {}", first);
    println!("  Second check: {} (challenge already consumed)", second);
    println!();

    println!("=== Demo Complete ===");
}
