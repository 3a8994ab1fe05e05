//! Application-level configuration loading, including the sport profiles
//! that decide which stat columns a game tracks and how many players are on
//! the court at once.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "SCOREBOOK_BACK_CONFIG_PATH";

/// Stat-tracking profile for one sport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SportProfile {
    /// Sport key, matched case-insensitively against a game's sport.
    pub name: String,
    /// Stat columns tracked for both teams, lowercase.
    pub stat_columns: Vec<String>,
    /// Number of players on the court/field at once.
    pub lineup_size: usize,
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    sports: Vec<SportProfile>,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to the
    /// built-in sport profiles.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        count = app_config.sports.len(),
                        "loaded sport profiles from config"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Look up the profile for `sport` (case-insensitive). Unknown sports
    /// fall back to the first configured profile so game creation never
    /// fails on an unexpected label.
    pub fn sport_profile(&self, sport: &str) -> &SportProfile {
        self.sports
            .iter()
            .find(|profile| profile.name.eq_ignore_ascii_case(sport))
            .unwrap_or(&self.sports[0])
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            sports: default_sports(),
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    sports: Vec<RawSport>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let mut sports: Vec<SportProfile> = value.sports.into_iter().map(Into::into).collect();
        if sports.is_empty() {
            // An empty profile list would leave game creation without a
            // fallback, so treat it like a missing file.
            sports = default_sports();
        }
        Self { sports }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of a single sport profile inside the configuration file.
struct RawSport {
    name: String,
    stat_columns: Vec<String>,
    lineup_size: usize,
}

impl From<RawSport> for SportProfile {
    fn from(value: RawSport) -> Self {
        Self {
            name: value.name,
            stat_columns: value
                .stat_columns
                .into_iter()
                .map(|column| column.to_lowercase())
                .collect(),
            lineup_size: value.lineup_size,
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

fn columns(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| (*value).to_owned()).collect()
}

/// Built-in sport profiles shipped with the binary.
fn default_sports() -> Vec<SportProfile> {
    vec![
        SportProfile {
            name: "basketball".to_owned(),
            stat_columns: columns(&["pts", "reb", "ast", "stl", "blk", "to", "fouls"]),
            lineup_size: 5,
        },
        SportProfile {
            name: "soccer".to_owned(),
            stat_columns: columns(&["goals", "assists", "shots", "saves", "fouls"]),
            lineup_size: 11,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_sports_fall_back_to_the_first_profile() {
        let config = AppConfig::default();
        assert_eq!(config.sport_profile("Basketball").name, "basketball");
        assert_eq!(config.sport_profile("SOCCER").lineup_size, 11);
        assert_eq!(config.sport_profile("tee-ball").name, "basketball");
    }

    #[test]
    fn raw_profiles_lowercase_their_columns() {
        let profile: SportProfile = RawSport {
            name: "hockey".into(),
            stat_columns: vec!["Goals".into(), "SAVES".into()],
            lineup_size: 6,
        }
        .into();
        assert_eq!(profile.stat_columns, columns(&["goals", "saves"]));
    }
}
