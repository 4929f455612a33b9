use std::fmt;

use crate::config::ConfigError;

const REGIONAL_INDICATOR_A: u32 = 0x1F1E6;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Country {
    code: String,
    name: String,
}

impl Country {
    /// `code` is an ISO 3166-1 alpha-2 code, case-insensitive.
    pub fn new(code: &str, name: impl Into<String>) -> Result<Self, ConfigError> {
        let code = code.to_ascii_uppercase();
        if code.len() != 2 || !code.bytes().all(|b| b.is_ascii_uppercase()) {
            return Err(ConfigError::InvalidCountryCode(code));
        }

        Ok(Self {
            code,
            name: name.into(),
        })
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Flag emoji built from the regional indicator symbols of the code.
    pub fn flag(&self) -> String {
        self.code
            .bytes()
            .filter_map(|b| char::from_u32(REGIONAL_INDICATOR_A + u32::from(b - b'A')))
            .collect()
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.flag(), self.name)
    }
}

/// Immutable catalog the rounds draw from. Entries are unique by code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountryPool {
    countries: Vec<Country>,
}

impl CountryPool {
    pub fn new(countries: impl IntoIterator<Item = Country>) -> Self {
        let mut unique: Vec<Country> = Vec::new();
        for country in countries {
            if !unique.iter().any(|c| c.code == country.code) {
                unique.push(country);
            }
        }

        Self { countries: unique }
    }

    pub fn len(&self) -> usize {
        self.countries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&Country> {
        self.countries.get(idx)
    }
}
