//! Helpdesk configuration.
//!
//! Loaded from `~/.helpdesk/config.toml`. Every key is optional and a missing
//! file is the same as an empty one:
//!
//! ```toml
//! actor = "agent@example.com"
//! database = "/srv/helpdesk/helpdesk.sqlite"
//! ```
//!
//! Triage policy (threshold, auto-close, SLA) is not here: it lives in the
//! database so every client sees the same values.

use std::fs;
use std::io;
use std::path::PathBuf;

use serde::Deserialize;

use crate::storage::Storage;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    /// Who is acting when neither `--as` nor `HELPDESK_ACTOR` is given.
    pub actor: Option<String>,

    /// Database path, overriding the default location.
    pub database: Option<PathBuf>,
}

impl Config {
    /// Load config from `~/.helpdesk/config.toml`.
    pub fn load() -> Result<Self, String> {
        let Some(path) = Self::path() else {
            return Ok(Self::default());
        };

        let contents = match fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(format!("failed to read {}: {e}", path.display())),
        };

        Self::parse(&contents).map_err(|e| format!("invalid config at {}: {e}", path.display()))
    }

    fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        let mut config: Self = toml::from_str(contents)?;
        config.actor = config.actor.filter(|a| !a.is_empty());
        Ok(config)
    }

    /// The config file path: `~/.helpdesk/config.toml`.
    pub fn path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".helpdesk").join("config.toml"))
    }

    /// The database to open: the configured path, else the default.
    pub fn database_path(&self) -> Option<PathBuf> {
        self.database.clone().or_else(Storage::default_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_default() {
        let config = Config::parse("").unwrap();
        assert!(config.actor.is_none());
        assert!(config.database.is_none());
    }

    #[test]
    fn reads_kebab_case_keys() {
        let config = Config::parse(
            "actor = \"agent@example.com\"\ndatabase = \"/tmp/helpdesk.sqlite\"\n",
        )
        .unwrap();

        assert_eq!(config.actor.as_deref(), Some("agent@example.com"));
        assert_eq!(
            config.database_path(),
            Some(PathBuf::from("/tmp/helpdesk.sqlite"))
        );
    }

    #[test]
    fn empty_actor_counts_as_unset() {
        let config = Config::parse("actor = \"\"").unwrap();
        assert!(config.actor.is_none());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Config::parse("default-identity = \"x\"").is_err());
    }
}
