use crate::datasource::hyperliquid::{DEFAULT_API_URL, DEFAULT_EXPLORER_URL};
use crate::domain::{Address, Decimal};
use crate::engine::{EngineConfig, DEFAULT_LEVERAGE};
use crate::export::ExportFormat;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub users: Vec<Address>,
    pub hyperliquid_api_url: String,
    pub hyperliquid_explorer_url: String,
    pub cache_dir: String,
    pub refresh: bool,
    pub output_dir: String,
    pub export_format: ExportFormat,
    pub default_leverage: Decimal,
    pub aggregate_fills_by_time: bool,
    pub skip_twap_fills: bool,
    pub symbols_from_meta: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let users = parse_users_from_map(&env_map)?;

        let hyperliquid_api_url = string_or(&env_map, "HYPERLIQUID_API_URL", DEFAULT_API_URL);
        let hyperliquid_explorer_url =
            string_or(&env_map, "HYPERLIQUID_EXPLORER_URL", DEFAULT_EXPLORER_URL);
        let cache_dir = string_or(&env_map, "CACHE_DIR", ".cache");
        let output_dir = string_or(&env_map, "OUTPUT_DIR", "output");

        let export_format = env_map
            .get("EXPORT_FORMAT")
            .map(|s| s.as_str())
            .unwrap_or("both")
            .parse::<ExportFormat>()
            .map_err(|msg| ConfigError::InvalidValue("EXPORT_FORMAT".to_string(), msg))?;

        let default_leverage = match env_map.get("DEFAULT_LEVERAGE") {
            None => Decimal::from_i64(DEFAULT_LEVERAGE),
            Some(raw) => Decimal::from_str_canonical(raw)
                .ok()
                .filter(Decimal::is_positive)
                .ok_or_else(|| {
                    ConfigError::InvalidValue(
                        "DEFAULT_LEVERAGE".to_string(),
                        "must be a positive number".to_string(),
                    )
                })?,
        };

        Ok(Config {
            users,
            hyperliquid_api_url,
            hyperliquid_explorer_url,
            cache_dir,
            refresh: bool_or(&env_map, "REFRESH", false)?,
            output_dir,
            export_format,
            default_leverage,
            aggregate_fills_by_time: bool_or(&env_map, "AGGREGATE_FILLS_BY_TIME", true)?,
            skip_twap_fills: bool_or(&env_map, "SKIP_TWAP_FILLS", false)?,
            symbols_from_meta: bool_or(&env_map, "SYMBOLS_FROM_META", true)?,
        })
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            default_leverage: self.default_leverage,
            skip_twap_fills: self.skip_twap_fills,
            ..EngineConfig::default()
        }
    }
}

fn string_or(env_map: &HashMap<String, String>, key: &str, default: &str) -> String {
    env_map
        .get(key)
        .cloned()
        .unwrap_or_else(|| default.to_string())
}

fn bool_or(env_map: &HashMap<String, String>, key: &str, default: bool) -> Result<bool, ConfigError> {
    match env_map.get(key).map(|s| s.trim().to_ascii_lowercase()) {
        None => Ok(default),
        Some(v) => match v.as_str() {
            "1" | "true" | "yes" => Ok(true),
            "0" | "false" | "no" => Ok(false),
            _ => Err(ConfigError::InvalidValue(
                key.to_string(),
                format!("must be true or false, got {}", v),
            )),
        },
    }
}

fn parse_users_from_map(env_map: &HashMap<String, String>) -> Result<Vec<Address>, ConfigError> {
    let raw: Vec<String> = if let Some(users_str) = env_map.get("USERS") {
        users_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    } else if let Some(file_path) = env_map.get("USERS_FILE") {
        let content = std::fs::read_to_string(file_path).map_err(|_| {
            ConfigError::InvalidValue(
                "USERS_FILE".to_string(),
                "file not found or unreadable".to_string(),
            )
        })?;
        content
            .lines()
            .map(|line| line.trim().to_string())
            .filter(|s| !s.is_empty() && !s.starts_with('#'))
            .collect()
    } else {
        return Err(ConfigError::MissingEnv("USERS".to_string()));
    };

    if raw.is_empty() {
        return Err(ConfigError::InvalidValue(
            "USERS".to_string(),
            "no addresses given".to_string(),
        ));
    }
    Ok(raw.into_iter().map(Address::new).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn setup_required_env() -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert("USERS".to_string(), "0xabc, 0xdef".to_string());
        map
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_env_map(setup_required_env()).unwrap();
        assert_eq!(config.users, vec![Address::new("0xabc"), Address::new("0xdef")]);
        assert_eq!(config.hyperliquid_api_url, DEFAULT_API_URL);
        assert_eq!(config.cache_dir, ".cache");
        assert!(!config.refresh);
        assert_eq!(config.export_format, ExportFormat::Both);
        assert_eq!(config.default_leverage, Decimal::from_i64(10));
        assert!(config.aggregate_fills_by_time);
        assert!(!config.skip_twap_fills);
        assert!(config.symbols_from_meta);
    }

    #[test]
    fn test_missing_users() {
        let result = Config::from_env_map(HashMap::new());
        match result {
            Err(ConfigError::MissingEnv(s)) => assert_eq!(s, "USERS"),
            _ => panic!("Expected MissingEnv error"),
        }
    }

    #[test]
    fn test_users_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "0x111\n\n# comment\n0x222").unwrap();

        let mut env_map = HashMap::new();
        env_map.insert(
            "USERS_FILE".to_string(),
            file.path().display().to_string(),
        );
        let config = Config::from_env_map(env_map).unwrap();
        assert_eq!(config.users, vec![Address::new("0x111"), Address::new("0x222")]);
    }

    #[test]
    fn test_invalid_default_leverage() {
        for bad in ["0", "-2", "ten"] {
            let mut env_map = setup_required_env();
            env_map.insert("DEFAULT_LEVERAGE".to_string(), bad.to_string());
            match Config::from_env_map(env_map) {
                Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "DEFAULT_LEVERAGE"),
                _ => panic!("Expected InvalidValue error for {}", bad),
            }
        }
    }

    #[test]
    fn test_invalid_export_format() {
        let mut env_map = setup_required_env();
        env_map.insert("EXPORT_FORMAT".to_string(), "xml".to_string());
        match Config::from_env_map(env_map) {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "EXPORT_FORMAT"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_invalid_bool() {
        let mut env_map = setup_required_env();
        env_map.insert("REFRESH".to_string(), "maybe".to_string());
        match Config::from_env_map(env_map) {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "REFRESH"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_engine_config() {
        let mut env_map = setup_required_env();
        env_map.insert("DEFAULT_LEVERAGE".to_string(), "5".to_string());
        env_map.insert("SKIP_TWAP_FILLS".to_string(), "true".to_string());
        let engine = Config::from_env_map(env_map).unwrap().engine_config();
        assert_eq!(engine.default_leverage, Decimal::from_i64(5));
        assert!(engine.skip_twap_fills);
        assert_eq!(engine.usdc_symbol.as_str(), "USDC");
    }
}
