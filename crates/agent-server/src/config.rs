//! Server Configuration
//!
//! Everything is read from the environment once at startup. A missing model
//! credential is a startup error.

use anyhow::Context;

use agent_core::reasoning::DEFAULT_MAX_ITERATIONS;
use agent_runtime::GeminiConfig;
use stock_quotes::market::YahooConfig;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Listen address
    pub bind_addr: String,

    /// Model provider settings
    pub gemini: GeminiConfig,

    /// Market data settings
    pub market: YahooConfig,

    /// Bound on model completions per question
    pub max_iterations: usize,

    /// Allowed CORS origins; `None` allows any origin
    pub cors_origins: Option<Vec<String>>,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let gemini = GeminiConfig::from_vars(&get).context("model provider configuration")?;
        let market = YahooConfig::from_vars(&get).context("market data configuration")?;

        let bind_addr = get("BIND_ADDR")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.into());

        let max_iterations = match get("AGENT_MAX_ITERATIONS") {
            Some(raw) => {
                let max: usize = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("AGENT_MAX_ITERATIONS is not a number: {}", raw))?;
                anyhow::ensure!(max > 0, "AGENT_MAX_ITERATIONS must be at least 1");
                max
            }
            None => DEFAULT_MAX_ITERATIONS,
        };

        let cors_origins = get("CORS_ALLOWED_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|origins| !origins.is_empty());

        Ok(Self {
            bind_addr,
            gemini,
            market,
            max_iterations,
            cors_origins,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> anyhow::Result<ServerConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_vars(|k| vars.get(k).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[("GEMINI_API_KEY", "k")]).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:5000");
        assert_eq!(config.max_iterations, DEFAULT_MAX_ITERATIONS);
        assert_eq!(config.gemini.model, "gemini-2.5-flash");
        assert!(config.cors_origins.is_none());
    }

    #[test]
    fn test_missing_credential_fails_fast() {
        let err = config_from(&[("BIND_ADDR", "127.0.0.1:8080")]).unwrap_err();
        assert!(format!("{:#}", err).contains("GEMINI_API_KEY"));
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("GEMINI_API_KEY", "k"),
            ("BIND_ADDR", "127.0.0.1:8080"),
            ("AGENT_MAX_ITERATIONS", "3"),
            ("CORS_ALLOWED_ORIGINS", "https://quantsumode.in, http://localhost:3000,"),
        ])
        .unwrap();

        assert_eq!(config.bind_addr, "127.0.0.1:8080");
        assert_eq!(config.max_iterations, 3);
        assert_eq!(
            config.cors_origins.unwrap(),
            vec!["https://quantsumode.in", "http://localhost:3000"]
        );
    }

    #[test]
    fn test_invalid_iterations() {
        assert!(config_from(&[("GEMINI_API_KEY", "k"), ("AGENT_MAX_ITERATIONS", "0")]).is_err());
        assert!(config_from(&[("GEMINI_API_KEY", "k"), ("AGENT_MAX_ITERATIONS", "many")]).is_err());
    }
}
