//! Light/dark color tokens handed to presentation layers.
//!
//! The active scheme is plain configuration passed into whoever renders;
//! core keeps no process-wide theme state.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorScheme {
    #[default]
    Light,
    Dark,
}

impl ColorScheme {
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    pub fn is_dark(self) -> bool {
        self == Self::Dark
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    /// Returns the color tokens for this scheme.
    pub fn tokens(self) -> ThemeTokens {
        match self {
            Self::Light => ThemeTokens {
                background: "#ffffff",
                text: "#333333",
                button: "#333333",
            },
            Self::Dark => ThemeTokens {
                background: "#000000",
                text: "#ffffff",
                button: "#ffffff",
            },
        }
    }
}

impl Display for ColorScheme {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColorScheme {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => Err(format!("unsupported color scheme `{other}`; expected light|dark")),
        }
    }
}

/// Color tokens consumed read-only by presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ThemeTokens {
    pub background: &'static str,
    pub text: &'static str,
    pub button: &'static str,
}

#[cfg(test)]
mod tests {
    use super::ColorScheme;

    #[test]
    fn toggle_is_an_involution() {
        assert_eq!(ColorScheme::Light.toggled(), ColorScheme::Dark);
        assert_eq!(ColorScheme::Dark.toggled().toggled(), ColorScheme::Dark);
    }

    #[test]
    fn schemes_have_distinct_backgrounds() {
        assert_ne!(
            ColorScheme::Light.tokens().background,
            ColorScheme::Dark.tokens().background
        );
    }

    #[test]
    fn parses_case_insensitively() {
        assert_eq!(" DARK ".parse::<ColorScheme>(), Ok(ColorScheme::Dark));
        assert!("sepia".parse::<ColorScheme>().is_err());
    }
}
