//! # Hybrid Encryption Demo
//!
//! Encrypts a file for a recipient, stores it through the vault and reads
//! it back with the recipient's private key.
//!
//! ## Run
//!
//! ```bash
//! cargo run --example hybrid_demo
//! ```

use std::sync::Arc;

use sealdrop_core::crypto::{decrypt, encrypt, generate_encryption_keypair, import_private};
use sealdrop_core::storage::{MemoryBlobStore, MemoryFileRecordStore};
use sealdrop_core::{EngineConfig, FileVault};

#[tokio::main]
async fn main() {
    println!("=== Sealdrop Core: Hybrid Encryption Demo ===\n");

    // Step 1: Recipient key pair
    println!("Step 1: Generating a 2048-bit RSA key pair for the recipient...");
    let pair = generate_encryption_keypair(2048).expect("Failed to generate key pair");
    println!("  Wrapped key size will be {} bytes", pair.public.wrapped_key_len());
    println!();

    // Step 2: Encrypt directly
    println!("Step 2: Encrypting an invoice...");
    println!();
    println!("  ┌─────────────────────────────────────────────────────────────┐");
    println!("  │                    HYBRID ENCRYPTION                        │");
    println!("  ├─────────────────────────────────────────────────────────────┤");
    println!("  │                                                             │");
    println!("  │   plaintext ──AES-256-GCM(session key)──► ciphertext + tag  │");
    println!("  │   session key ──RSA-OAEP(public key)────► wrapped key       │");
    println!("  │                                                             │");
    println!("  └─────────────────────────────────────────────────────────────┘");
    println!();

    let invoice = b"Invoice #1042: 4,200.00 EUR";
    let bundle = encrypt(invoice, &pair.public).expect("Encryption failed");
    println!("  ciphertext:  {} bytes", bundle.ciphertext.len());
    println!("  nonce:       {}", hex::encode(bundle.nonce));
    println!("  tag:         {}", hex::encode(bundle.authentication_tag));
    println!("  wrapped key: {} bytes", bundle.wrapped_key.len());
    println!();

    let recovered = decrypt(&bundle, &pair.private).expect("Decryption failed");
    println!("  Decrypted: {}", String::from_utf8_lossy(&recovered));
    println!();

    // Step 3: Tamper detection
    println!("Step 3: Flipping one ciphertext bit...");
    let mut tampered = bundle.clone();
    tampered.ciphertext[0] ^= 0x01;
    match decrypt(&tampered, &pair.private) {
        Ok(_) => println!("  Unexpected: tampered bundle decrypted"),
        Err(e) => println!("  Rejected: {} (code {})", e, e.code()),
    }
    println!();

    // Step 4: Through the vault
    println!("Step 4: Upload and download through the vault...");
    let vault = FileVault::new(
        Arc::new(MemoryBlobStore::new("demo")),
        Arc::new(MemoryFileRecordStore::new()),
        EngineConfig::default(),
    )
    .expect("Invalid config");

    let keys = vault.enroll_recipient().await.expect("Enrollment failed");
    let record = vault
        .upload("alice", "invoice.txt", invoice.to_vec(), &keys.public_pem)
        .await
        .expect("Upload failed");
    println!("  Stored {} at {}", record.filename, record.locator);

    let private = import_private(&keys.private_pem).expect("Bad private key");
    let downloaded = vault
        .download(&record.id, &private)
        .await
        .expect("Download failed");
    println!("  Downloaded: {}", String::from_utf8_lossy(&downloaded));
    println!();

    println!("=== Demo Complete ===");
}
