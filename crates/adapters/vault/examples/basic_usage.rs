//! Basic usage example for vaultonic-vault
//!
//! Run with:
//! ```bash
//! export VAULT_ADDR=http://127.0.0.1:8200
//! export APPROLE_ROLE_ID=your-role-id
//! export APPROLE_SECRET_ID=your-secret-id
//! cargo run -p vaultonic-vault --example basic_usage
//! ```

use vaultonic_vault::{Session, VaultConfigBuilder};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    println!("=== Vaultonic Session Basic Usage Example ===\n");

    // 1. Create configuration from environment variables
    println!("1. Creating session configuration...");
    let config = VaultConfigBuilder::new(
        std::env::var("VAULT_ADDR").unwrap_or_else(|_| "http://127.0.0.1:8200".to_string()),
    )
    .with_approle(
        std::env::var("APPROLE_ROLE_ID")?,
        std::env::var("APPROLE_SECRET_ID")?,
    )
    .with_key_name("test-key")
    .with_kv("secret", "examples")
    .build();

    println!("   Vault address: {}", config.address);
    println!("   Transit key: {}", config.key_name);

    // 2. Log in
    println!("\n2. Logging in with AppRole...");
    let session = Session::connect(config).await?;
    println!("   ✓ Session state: {:?}", session.state());

    // 3. Encrypt
    println!("\n3. Encrypting data...");
    let ciphertext = session.encrypt(b"hello").await?;
    println!("   ✓ Ciphertext: {}", ciphertext);

    // 4. Write a secret
    println!("\n4. Writing secret...");
    let ack = session.put_secret("credentials", "password", "12345").await?;
    println!("   ✓ Written as version {}", ack.version);

    // 5. Read it back
    println!("\n5. Reading secret...");
    let secret = session.get_secret("credentials").await?;
    println!("   ✓ Fields: {:?}", secret.keys().collect::<Vec<_>>());

    println!("\n=== Example completed successfully ===");
    Ok(())
}
