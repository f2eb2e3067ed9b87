//! Integration tests for the Vault session
//!
//! These tests require a running Vault server with the following setup:
//! - Vault running at VAULT_ADDR (default http://127.0.0.1:8200)
//! - AppRole authentication enabled, transit key `test-key`, KV v2 at `secret`
//! - Environment variables: APPROLE_ROLE_ID, APPROLE_W_SECRET (wrapped secret id)
//!
//! Create the wrapped secret id with:
//! vault write -wrap-ttl=300s -f auth/approle/role/<role>/secret-id

use vaultonic_vault::{Session, SessionState, VaultConfigBuilder};

fn live_config() -> vaultonic_vault::VaultConfig {
    let address = std::env::var("VAULT_ADDR").unwrap_or_else(|_| "http://127.0.0.1:8200".to_string());
    VaultConfigBuilder::new(address)
        .with_wrapped_approle(
            std::env::var("APPROLE_ROLE_ID").expect("APPROLE_ROLE_ID not set"),
            std::env::var("APPROLE_W_SECRET").expect("APPROLE_W_SECRET not set"),
        )
        .with_key_name("test-key")
        .with_kv("secret", "/go-test")
        .build()
}

#[tokio::test]
#[ignore] // Requires running Vault server
async fn test_full_session_lifecycle() {
    let _ = tracing_subscriber::fmt().with_env_filter("debug").try_init();

    let session = Session::connect(live_config())
        .await
        .expect("Failed to establish Vault session");
    assert_eq!(session.state(), SessionState::Authenticated);

    // Encrypt
    let ciphertext = session
        .encrypt(b"this-is-a-test")
        .await
        .expect("Failed to encrypt");
    assert!(ciphertext.starts_with("vault:v"));

    // Write then read
    session
        .put_secret("mysecret", "password", "122345234523434")
        .await
        .expect("Failed to write secret");

    let secret = session
        .get_secret("mysecret")
        .await
        .expect("Failed to read secret");
    assert_eq!(secret.get("password").unwrap(), "122345234523434");

    // Missing secret
    let result = session.get_secret("integration-never-written").await;
    assert!(matches!(result, Err(vaultonic_errors::AppError::NotFound(_))));
}
