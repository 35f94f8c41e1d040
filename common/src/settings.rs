use dotenvy::dotenv;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const BACKEND_URL_ENV: &str = "PGIP_BACKEND_URL";
const CONFIG_PATH_ENV: &str = "PGIP_CONFIG_PATH";

#[derive(Debug, Default)]
struct Cli {
    port: Option<u16>,
    config: Option<String>,
}

fn parse_cli_from_args<I, S>(args: I) -> Cli
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut cli = Cli::default();
    let mut iter = args.into_iter().map(Into::into);

    // Skip binary name
    let _ = iter.next();

    while let Some(arg) = iter.next() {
        if let Some(raw_port) = arg.strip_prefix("--port=") {
            if let Ok(port) = raw_port.parse::<u16>() {
                cli.port = Some(port);
            }
            continue;
        }

        if arg == "--port" {
            if let Some(raw_port) = iter.next() {
                if let Ok(port) = raw_port.parse::<u16>() {
                    cli.port = Some(port);
                }
            }
            continue;
        }

        if let Some(raw_config) = arg.strip_prefix("--config=") {
            if !raw_config.is_empty() {
                cli.config = Some(raw_config.to_string());
            }
            continue;
        }

        if arg == "--config" {
            if let Some(config) = iter.next() {
                if !config.is_empty() {
                    cli.config = Some(config);
                }
            }
        }
    }

    cli
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Settings {
    pub port: u16,
    #[serde(default)]
    pub debug: bool,
    pub api: ApiSettings,
    #[serde(default)]
    pub cache: CacheSettings,
}

/// Where the registry backend lives and how long to wait for it.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ApiSettings {
    pub base_url: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl ApiSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_timeout_ms() -> u64 {
    8_000
}

/// Freshness windows of the request-result store, per endpoint.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CacheSettings {
    #[serde(default = "default_plugin_list_stale_ms")]
    pub plugin_list_stale_ms: u64,
    #[serde(default)]
    pub plugin_detail_stale_ms: u64,
}

fn default_plugin_list_stale_ms() -> u64 {
    30_000
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            plugin_list_stale_ms: default_plugin_list_stale_ms(),
            plugin_detail_stale_ms: 0,
        }
    }
}

impl Settings {
    #[allow(clippy::result_large_err)]
    pub fn new() -> Result<Self, figment::Error> {
        dotenv().ok();
        Self::from_args(std::env::args())
    }

    #[allow(clippy::result_large_err)]
    fn from_args<I, S>(args: I) -> Result<Self, figment::Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let cli = parse_cli_from_args(args);

        let mut figment = Figment::from(Serialized::defaults(Settings::default()));

        figment = figment.merge(Toml::file("/etc/pgip/dashboard.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            figment = figment.merge(Toml::file(config_dir.join("pgip/dashboard.toml")));
        }

        figment = figment.merge(Toml::file("pgip-dashboard.toml"));

        let config_path = cli.config.or_else(|| std::env::var(CONFIG_PATH_ENV).ok());
        if let Some(config_path) = config_path {
            figment = figment.merge(Toml::file(config_path));
        }

        figment = figment.merge(Env::prefixed("PGIP_").split("__").ignore(&[
            "BACKEND_URL",
            "CONFIG_PATH",
        ]));

        if let Some(base_url) = std::env::var(BACKEND_URL_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
        {
            figment = figment.merge(("api.base_url", base_url));
        }

        if let Some(port) = cli.port {
            figment = figment.merge(("port", port));
        }

        figment.extract()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            port: 5173,
            debug: false,
            api: ApiSettings {
                base_url: "http://localhost:8000".to_string(),
                timeout_ms: default_timeout_ms(),
            },
            cache: CacheSettings::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_cli_from_args, Settings};
    use figment::Jail;

    #[test]
    fn parse_cli_ignores_unknown_flags() {
        let cli = parse_cli_from_args(["dashboard", "--quiet", "--nocapture", "--port", "4010"]);

        assert_eq!(cli.port, Some(4010));
        assert_eq!(cli.config, None);
    }

    #[test]
    fn parse_cli_supports_equals_syntax() {
        let cli = parse_cli_from_args(["dashboard", "--config=local.toml", "--port=3111"]);

        assert_eq!(cli.port, Some(3111));
        assert_eq!(cli.config.as_deref(), Some("local.toml"));
    }

    #[test]
    fn parse_cli_ignores_invalid_port_values() {
        let cli = parse_cli_from_args(["dashboard", "--port", "invalid"]);

        assert_eq!(cli.port, None);
        assert_eq!(cli.config, None);
    }

    #[test]
    fn defaults_match_documented_values() {
        let settings = Settings::default();

        assert_eq!(settings.api.base_url, "http://localhost:8000");
        assert_eq!(settings.api.timeout_ms, 8_000);
        assert_eq!(settings.cache.plugin_list_stale_ms, 30_000);
        assert_eq!(settings.cache.plugin_detail_stale_ms, 0);
    }

    #[test]
    fn env_and_config_file_layers_override_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "pgip-dashboard.toml",
                r#"
                    port = 9000

                    [api]
                    base_url = "http://registry.internal:8000"
                "#,
            )?;
            jail.set_env("PGIP_API__TIMEOUT_MS", "1500");

            let settings = Settings::from_args(["dashboard"])?;

            assert_eq!(settings.port, 9000);
            assert_eq!(settings.api.base_url, "http://registry.internal:8000");
            assert_eq!(settings.api.timeout_ms, 1500);
            Ok(())
        });
    }

    #[test]
    fn backend_url_variable_and_cli_port_win() {
        Jail::expect_with(|jail| {
            jail.set_env("PGIP_API__BASE_URL", "http://from-nested-env");
            jail.set_env("PGIP_BACKEND_URL", "http://from-backend-url");

            let settings = Settings::from_args(["dashboard", "--port", "7001"])?;

            assert_eq!(settings.api.base_url, "http://from-backend-url");
            assert_eq!(settings.port, 7001);
            Ok(())
        });
    }
}
