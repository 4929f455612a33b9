use std::time::Duration;

use thiserror::Error;
use tracing::warn;

use crate::game::country::{Country, CountryPool};

pub const ROUNDS_PER_SESSION: u32 = 10;
pub const OPTIONS_PER_ROUND: usize = 3;
pub const FEEDBACK_DELAY: Duration = Duration::from_millis(2500);

/// Reference catalog, `CODE=Name` pairs.
pub const COUNTRY_POOL: [(&str, &str); 12] = [
    ("EE", "Estonia"),
    ("FR", "France"),
    ("DE", "Germany"),
    ("IE", "Ireland"),
    ("IT", "Italy"),
    ("MC", "Monaco"),
    ("NG", "Nigeria"),
    ("PL", "Poland"),
    ("RU", "Russia"),
    ("ES", "Spain"),
    ("GB", "UK"),
    ("US", "USA"),
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("country pool has {available} distinct entries, {required} are needed per round")]
    PoolTooSmall { available: usize, required: usize },
    #[error("a session needs at least one round")]
    NoRounds,
    #[error("a round needs at least two options, got {0}")]
    TooFewOptions(usize),
    #[error("'{0}' is not an ISO 3166-1 alpha-2 code")]
    InvalidCountryCode(String),
    #[error("expected CODE=Name, got '{0}'")]
    MalformedCountry(String),
    #[error("{key} must be a non-negative integer, got '{value}'")]
    InvalidNumber { key: &'static str, value: String },
}

/// Session shape shared by every game in the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rules {
    pub rounds_per_session: u32,
    pub options_per_round: usize,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            rounds_per_session: ROUNDS_PER_SESSION,
            options_per_round: OPTIONS_PER_ROUND,
        }
    }
}

impl Rules {
    pub fn validate(&self, pool: &CountryPool) -> Result<(), ConfigError> {
        if self.rounds_per_session == 0 {
            return Err(ConfigError::NoRounds);
        }
        if self.options_per_round < 2 {
            return Err(ConfigError::TooFewOptions(self.options_per_round));
        }
        if pool.len() < self.options_per_round {
            return Err(ConfigError::PoolTooSmall {
                available: pool.len(),
                required: self.options_per_round,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct GameConfig {
    pub pool: CountryPool,
    pub rules: Rules,
    pub feedback_delay: Duration,
}

impl Default for GameConfig {
    fn default() -> Self {
        let countries = COUNTRY_POOL
            .iter()
            .filter_map(|(code, name)| Country::new(*code, *name).ok());

        Self {
            pool: CountryPool::new(countries),
            rules: Rules::default(),
            feedback_delay: FEEDBACK_DELAY,
        }
    }
}

impl GameConfig {
    /// Reads `QUIZ_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(rounds) = lookup("QUIZ_ROUNDS") {
            config.rules.rounds_per_session = parse_number("QUIZ_ROUNDS", &rounds)?;
        }
        if let Some(options) = lookup("QUIZ_OPTIONS") {
            config.rules.options_per_round = parse_number("QUIZ_OPTIONS", &options)?;
        }
        if let Some(delay) = lookup("QUIZ_FEEDBACK_DELAY_MS") {
            config.feedback_delay =
                Duration::from_millis(parse_number("QUIZ_FEEDBACK_DELAY_MS", &delay)?);
        }
        if let Some(countries) = lookup("QUIZ_COUNTRIES") {
            config.pool = parse_countries(&countries)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rules.validate(&self.pool)
    }
}

fn parse_number<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidNumber {
        key,
        value: value.to_owned(),
    })
}

/// Parses `EE=Estonia, FR=France`. Repeated codes keep their first name.
fn parse_countries(raw: &str) -> Result<CountryPool, ConfigError> {
    let mut countries = Vec::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (code, name) = entry
            .split_once('=')
            .ok_or_else(|| ConfigError::MalformedCountry(entry.to_owned()))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(ConfigError::MalformedCountry(entry.to_owned()));
        }
        countries.push(Country::new(code.trim(), name)?);
    }

    let pool = CountryPool::new(countries.iter().cloned());
    if pool.len() < countries.len() {
        warn!(
            "QUIZ_COUNTRIES lists {} entries, {} are distinct",
            countries.len(),
            pool.len()
        );
    }
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_match_reference_build() {
        let config = GameConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.rules.rounds_per_session, 10);
        assert_eq!(config.rules.options_per_round, 3);
        assert_eq!(config.feedback_delay, Duration::from_millis(2500));
        assert_eq!(config.pool.len(), 12);
        assert_eq!(config.pool.get(10).map(Country::name), Some("UK"));
    }

    #[test]
    fn overrides_are_read() {
        let config = GameConfig::from_lookup(lookup(&[
            ("QUIZ_ROUNDS", "5"),
            ("QUIZ_FEEDBACK_DELAY_MS", " 100 "),
            ("QUIZ_COUNTRIES", "FR=France, es=Spain,JP=Japan"),
        ]))
        .unwrap();
        assert_eq!(config.rules.rounds_per_session, 5);
        assert_eq!(config.feedback_delay, Duration::from_millis(100));
        assert_eq!(config.pool.len(), 3);
        assert_eq!(config.pool.get(1).map(Country::code), Some("ES"));
    }

    #[test]
    fn duplicate_countries_do_not_count_towards_pool_size() {
        let err = GameConfig::from_lookup(lookup(&[(
            "QUIZ_COUNTRIES",
            "FR=France,FR=Francia,ES=Spain",
        )]))
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::PoolTooSmall {
                available: 2,
                required: 3
            }
        );
    }

    #[test]
    fn rejects_bad_values() {
        assert_eq!(
            GameConfig::from_lookup(lookup(&[("QUIZ_ROUNDS", "0")])).unwrap_err(),
            ConfigError::NoRounds
        );
        assert_eq!(
            GameConfig::from_lookup(lookup(&[("QUIZ_OPTIONS", "1")])).unwrap_err(),
            ConfigError::TooFewOptions(1)
        );
        assert!(matches!(
            GameConfig::from_lookup(lookup(&[("QUIZ_ROUNDS", "ten")])),
            Err(ConfigError::InvalidNumber { key: "QUIZ_ROUNDS", .. })
        ));
        assert!(matches!(
            GameConfig::from_lookup(lookup(&[("QUIZ_COUNTRIES", "France")])),
            Err(ConfigError::MalformedCountry(_))
        ));
        assert!(matches!(
            GameConfig::from_lookup(lookup(&[("QUIZ_COUNTRIES", "FRA=France")])),
            Err(ConfigError::InvalidCountryCode(_))
        ));
    }
}
