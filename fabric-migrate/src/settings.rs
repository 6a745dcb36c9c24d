//! Migration settings: object naming, transit patterns and fabric defaults.
//!
//! Settings come from a TOML file. When none is given the copy embedded from
//! `config/defaults.toml` is used, and if that cannot be read the built-in
//! [`Default`] values apply.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use switch_config_core::ParseOptions;
use thiserror::Error;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct MigrationConfig {
    pub naming: NamingConfig,
    pub parser: ParserConfig,
    pub fabric: FabricConfig,
}

/// Suffixes appended when a row leaves an object name blank.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct NamingConfig {
    pub bd_suffix: String,
    pub epg_suffix: String,
    pub app_profile_suffix: String,
    pub subnet_suffix: String,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            bd_suffix: "_BD".to_string(),
            epg_suffix: "_EPG".to_string(),
            app_profile_suffix: "_ANP".to_string(),
            subnet_suffix: "_subnet".to_string(),
        }
    }
}

impl NamingConfig {
    pub fn bridge_domain(&self, l2_name: &str) -> String {
        format!("{l2_name}{}", self.bd_suffix)
    }

    pub fn epg(&self, l2_name: &str) -> String {
        format!("{l2_name}{}", self.epg_suffix)
    }

    /// Application profiles are shared per VRF unless a row names one.
    pub fn app_profile(&self, vrf: &str) -> String {
        format!("{vrf}{}", self.app_profile_suffix)
    }

    pub fn subnet(&self, l2_name: &str) -> String {
        format!("{l2_name}{}", self.subnet_suffix)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ParserConfig {
    pub transit_prefix: String,
    pub transit_keyword: String,
}

impl Default for ParserConfig {
    fn default() -> Self {
        let opts = ParseOptions::default();
        Self {
            transit_prefix: opts.transit_prefix,
            transit_keyword: opts.transit_keyword,
        }
    }
}

impl ParserConfig {
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            transit_prefix: self.transit_prefix.clone(),
            transit_keyword: self.transit_keyword.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct FabricConfig {
    /// Policy enforcement preference for new VRFs.
    pub vrf_enforcement: String,
    /// Deployment immediacy for static path bindings.
    pub deploy_immediacy: String,
    pub subnet_preferred: bool,
}

impl Default for FabricConfig {
    fn default() -> Self {
        Self {
            vrf_enforcement: "enforced".to_string(),
            deploy_immediacy: "immediate".to_string(),
            subnet_preferred: true,
        }
    }
}

/// Errors returned when loading a settings file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
}

/// Load settings from a TOML file; omitted keys keep their defaults.
pub fn load_config(path: &Path) -> Result<MigrationConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_config(&raw, path.display().to_string())
}

/// Settings embedded at build time.
pub fn default_config() -> MigrationConfig {
    let embedded = include_str!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/config/defaults.toml"
    ));
    parse_config(embedded, "embedded config".to_string()).unwrap_or_default()
}

fn parse_config(raw: &str, path: String) -> Result<MigrationConfig, ConfigError> {
    toml::from_str(raw).map_err(|source| ConfigError::Parse { path, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_defaults_match_builtin_defaults() {
        assert_eq!(default_config(), MigrationConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let cfg = parse_config(
            "[naming]\nbd_suffix = \"-bd\"\n[parser]\ntransit_prefix = \"XC_\"\n",
            "inline".to_string(),
        )
        .expect("parse");
        assert_eq!(cfg.naming.bridge_domain("USERS"), "USERS-bd");
        assert_eq!(cfg.naming.epg("USERS"), "USERS_EPG");
        assert_eq!(cfg.parser.parse_options().transit_prefix, "XC_");
        assert_eq!(cfg.parser.transit_keyword, "transit");
        assert_eq!(cfg.fabric, FabricConfig::default());
    }

    #[test]
    fn malformed_file_reports_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("broken.toml");
        fs::write(&path, "[naming\nbd_suffix = 1").expect("write");
        let err = load_config(&path).expect_err("should fail");
        assert!(err.to_string().contains("broken.toml"));
    }
}
