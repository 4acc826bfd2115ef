use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Auto24Error;

/// Translated editions of autoscout24.ch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Fr,
    De,
    It,
}

impl Locale {
    pub const ALL: [Locale; 3] = [Locale::Fr, Locale::De, Locale::It];

    pub fn code(&self) -> &'static str {
        match self {
            Locale::Fr => "fr",
            Locale::De => "de",
            Locale::It => "it",
        }
    }

    /// Path segment of the car listing section, e.g. `fr/voitures`
    pub fn listing_path(&self) -> &'static str {
        match self {
            Locale::Fr => "fr/voitures",
            Locale::De => "de/autos",
            Locale::It => "it/automobili",
        }
    }

    pub fn accept_language(&self) -> &'static str {
        match self {
            Locale::Fr => "fr-CH,fr;q=0.9,en;q=0.8",
            Locale::De => "de-CH,de;q=0.9,en;q=0.8",
            Locale::It => "it-CH,it;q=0.9,en;q=0.8",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Locale {
    type Err = Auto24Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fr" => Ok(Locale::Fr),
            "de" => Ok(Locale::De),
            "it" => Ok(Locale::It),
            other => Err(Auto24Error::InvalidArgs(format!(
                "the provided lang '{}' is invalid, choose from 'fr', 'de' and 'it'",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_supported_codes() {
        for locale in Locale::ALL {
            assert_eq!(locale.code().parse::<Locale>().unwrap(), locale);
        }
    }

    #[test]
    fn test_rejects_unsupported_codes() {
        for code in ["en", "FR", "", "fr ", "ch", "rm"] {
            let err = code.parse::<Locale>().unwrap_err();
            assert!(matches!(err, Auto24Error::InvalidArgs(_)), "{code:?} accepted");
        }
    }

    #[test]
    fn test_listing_paths() {
        assert_eq!(Locale::Fr.listing_path(), "fr/voitures");
        assert_eq!(Locale::De.listing_path(), "de/autos");
        assert_eq!(Locale::It.listing_path(), "it/automobili");
    }
}
