// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Configuration for launchpad-environment.

use std::ops::Range;
use std::path::PathBuf;

/// Default project store.
pub const DEFAULT_DATABASE_URL: &str = "sqlite:.data/launchpad.db?mode=rwc";

/// Default parent domain for project subdomains.
pub const DEFAULT_DOMAIN: &str = "launch.me";

/// Default host port range for serverside projects (end exclusive).
pub const DEFAULT_PORT_RANGE: Range<u16> = 10000..20000;

/// Environment configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Database URL; `postgres://` selects PostgreSQL, anything else SQLite.
    pub database_url: String,
    /// Parent domain; projects are served at `<subdomain>.<domain>`.
    pub domain: String,
    /// Parent directory of the per-project working directories.
    pub projects_dir: PathBuf,
    /// Directory nginx loads `<subdomain>.conf` files from.
    pub nginx_config_dir: PathBuf,
    /// nginx executable used to validate and reload.
    pub nginx_bin: String,
    /// Treat a missing nginx binary as a development host and skip reloads.
    pub nginx_optional: bool,
    /// docker executable.
    pub docker_bin: String,
    /// git executable.
    pub git_bin: String,
    /// Host ports handed out to serverside projects.
    pub port_range: Range<u16>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            domain: DEFAULT_DOMAIN.to_string(),
            projects_dir: PathBuf::from(".data/projects"),
            nginx_config_dir: PathBuf::from("/etc/nginx/sites-enabled"),
            nginx_bin: "nginx".to_string(),
            nginx_optional: true,
            docker_bin: "docker".to_string(),
            git_bin: "git".to_string(),
            port_range: DEFAULT_PORT_RANGE,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, falling back to defaults for
    /// unset or empty variables.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let port_start = parse_port(&var, "LAUNCHPAD_PORT_RANGE_START", defaults.port_range.start)?;
        let port_end = parse_port(&var, "LAUNCHPAD_PORT_RANGE_END", defaults.port_range.end)?;
        if port_start == 0 || port_start >= port_end {
            return Err(ConfigError::InvalidPortRange {
                start: port_start,
                end: port_end,
            });
        }

        let nginx_optional = var("LAUNCHPAD_NGINX_OPTIONAL")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
            .unwrap_or(defaults.nginx_optional);

        Ok(Self {
            database_url: var("LAUNCHPAD_DATABASE_URL").unwrap_or(defaults.database_url),
            domain: var("LAUNCHPAD_DOMAIN").unwrap_or(defaults.domain),
            projects_dir: var("LAUNCHPAD_PROJECTS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.projects_dir),
            nginx_config_dir: var("LAUNCHPAD_NGINX_CONFIG_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.nginx_config_dir),
            nginx_bin: var("LAUNCHPAD_NGINX_BIN").unwrap_or(defaults.nginx_bin),
            nginx_optional,
            docker_bin: var("LAUNCHPAD_DOCKER_BIN").unwrap_or(defaults.docker_bin),
            git_bin: var("LAUNCHPAD_GIT_BIN").unwrap_or(defaults.git_bin),
            port_range: port_start..port_end,
        })
    }
}

fn parse_port<F>(var: &F, key: &'static str, default: u16) -> Result<u16, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidPort { var: key, value }),
        None => Ok(default),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A port variable is not a number in `0..=65535`.
    #[error("Invalid port number in {var}: {value:?}")]
    InvalidPort {
        /// Variable name.
        var: &'static str,
        /// Offending value.
        value: String,
    },
    /// The port range is empty or starts at 0.
    #[error("Invalid port range {start}..{end}")]
    InvalidPortRange {
        /// Range start (inclusive).
        start: u16,
        /// Range end (exclusive).
        end: u16,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.domain, "launch.me");
        assert_eq!(config.port_range, 10000..20000);
        assert!(config.nginx_optional);
        assert_eq!(config.docker_bin, "docker");
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("LAUNCHPAD_DOMAIN", "apps.example.com"),
            ("LAUNCHPAD_PORT_RANGE_START", "30000"),
            ("LAUNCHPAD_PORT_RANGE_END", "30010"),
            ("LAUNCHPAD_NGINX_OPTIONAL", "false"),
            ("LAUNCHPAD_PROJECTS_DIR", "/srv/launchpad"),
        ])
        .unwrap();
        assert_eq!(config.domain, "apps.example.com");
        assert_eq!(config.port_range, 30000..30010);
        assert!(!config.nginx_optional);
        assert_eq!(config.projects_dir, PathBuf::from("/srv/launchpad"));
    }

    #[test]
    fn test_empty_values_fall_back_to_defaults() {
        let config = load(&[("LAUNCHPAD_DOMAIN", "  ")]).unwrap();
        assert_eq!(config.domain, "launch.me");
    }

    #[test]
    fn test_invalid_port() {
        let err = load(&[("LAUNCHPAD_PORT_RANGE_START", "70000")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPort { var: "LAUNCHPAD_PORT_RANGE_START", .. }));
    }

    #[test]
    fn test_inverted_range() {
        let err = load(&[
            ("LAUNCHPAD_PORT_RANGE_START", "20000"),
            ("LAUNCHPAD_PORT_RANGE_END", "20000"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPortRange { .. }));
    }
}
