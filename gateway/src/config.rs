//! Gateway 配置

use serde::Deserialize;
use vaultonic_config::{ConfigError, ServerConfig, TelemetryConfig};
use vaultonic_vault::VaultConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_app_name")]
    pub app_name: String,
    #[serde(default = "vaultonic_config::app_env")]
    pub app_env: String,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    pub vault: VaultConfig,
}

fn default_app_name() -> String {
    "vaultonic-gateway".to_string()
}

impl GatewayConfig {
    /// 从配置目录和 `VAULTONIC_*` 环境变量加载
    pub fn load(config_dir: &str) -> Result<Self, ConfigError> {
        vaultonic_config::load(config_dir)
    }

    /// 是否为生产环境
    pub fn is_production(&self) -> bool {
        self.app_env == "production"
    }

    /// 生产环境或显式开启时输出 JSON 日志
    pub fn json_logs(&self) -> bool {
        self.telemetry.json || self.is_production()
    }
}

/// 配置目录，`CONFIG_DIR` 未设置时为 `config`
pub fn config_dir() -> String {
    std::env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use secrecy::ExposeSecret;
    use vaultonic_vault::SecretIdKind;

    const DEFAULT_TOML: &str = r#"
        [server]
        port = 8080

        [vault]
        address = "http://127.0.0.1:8200"
        role_id = "r1"
        secret_id = "placeholder"
        key_name = "test-key"

        [vault.kv]
        mount = "secret"
        secret_path = "/go-test"
    "#;

    #[test]
    fn test_load_from_file_and_env() {
        Jail::expect_with(|jail| {
            jail.create_file("default.toml", DEFAULT_TOML)?;
            jail.set_env("VAULTONIC_VAULT__SECRET_ID", "hvs.wrapped-from-env");
            jail.set_env("VAULTONIC_VAULT__ROLE_ID", "role-from-env");

            let config = GatewayConfig::load(".").map_err(|e| e.to_string())?;
            assert_eq!(config.app_name, "vaultonic-gateway");
            assert_eq!(config.vault.role_id, "role-from-env");
            assert_eq!(config.vault.secret_id.expose_secret(), "hvs.wrapped-from-env");
            assert_eq!(config.vault.secret_id_kind, SecretIdKind::Wrapped);
            assert_eq!(config.vault.kv.as_ref().map(|kv| kv.secret_path.as_str()), Some("/go-test"));
            assert!(config.vault.validate().is_ok());
            Ok(())
        });
    }

    #[test]
    fn test_production_forces_json_logs() {
        Jail::expect_with(|jail| {
            jail.create_file("default.toml", DEFAULT_TOML)?;
            jail.set_env("APP_ENV", "production");

            let config = GatewayConfig::load(".").map_err(|e| e.to_string())?;
            assert!(config.is_production());
            assert!(config.json_logs());
            Ok(())
        });
    }

    #[test]
    fn test_vault_section_is_required() {
        Jail::expect_with(|jail| {
            jail.create_file("default.toml", "[server]\nport = 8080\n")?;

            assert!(GatewayConfig::load(".").is_err());
            Ok(())
        });
    }
}
