//! Check-config command - validates configuration without starting the server

use anyhow::Context;

use crate::api::middleware::GatekeeperHeaders;
use crate::config::AppConfig;

/// Load and validate configuration, then print the effective gatekeeper settings
pub fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    print!("{}", render(&config)?);

    Ok(())
}

fn render(config: &AppConfig) -> anyhow::Result<String> {
    let policy = config.bypass_policy()?;
    let headers = GatekeeperHeaders::from_config(&config.gatekeeper)?;
    let storage = config.storage_config()?;
    config.secret_generator()?;

    let mut out = String::new();
    out.push_str(&format!("storage backend: {:?}\n", storage.storage_type()));
    out.push_str(&format!(
        "lookup timeout: {}ms\n",
        config.storage.lookup_timeout_ms
    ));
    out.push_str(&format!(
        "secret bytes: {}\n",
        config.generator.secret_bytes
    ));
    out.push_str(&format!("api key header: {}\n", headers.api_key));
    out.push_str(&format!("client secret header: {}\n", headers.client_secret));
    out.push_str(&format!("client header: {}\n", headers.client));
    out.push_str(&format!(
        "admin api: {}\n",
        if config.admin.token.is_some() {
            "enabled"
        } else {
            "disabled (no admin.token)"
        }
    ));
    out.push_str(&format!("bypass rules ({}):\n", policy.rules().len()));

    for (i, rule) in policy.rules().iter().enumerate() {
        let rendered = toml::to_string(rule).context("Failed to render bypass rule")?;
        let rendered = rendered.lines().collect::<Vec<_>>().join(", ");
        out.push_str(&format!("  {}. {}\n", i + 1, rendered));
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_default_config() {
        let out = render(&AppConfig::default()).unwrap();

        assert!(out.contains("storage backend: InMemory"));
        assert!(out.contains("api key header: x-api-key"));
        assert!(out.contains("admin api: disabled"));
        assert!(out.contains("bypass rules (4):"));
        assert!(out.contains(r#"rule = "method""#));
    }

    #[test]
    fn test_render_rejects_short_secrets() {
        let mut config = AppConfig::default();
        config.generator.secret_bytes = 4;

        assert!(render(&config).is_err());
    }

    #[test]
    fn test_render_rejects_bad_rule() {
        let mut config = AppConfig::default();
        config.gatekeeper.bypass = vec![crate::domain::BypassRule::PathLacks {
            marker: String::new(),
        }];

        assert!(render(&config).is_err());
    }
}
