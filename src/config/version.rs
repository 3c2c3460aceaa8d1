//! Admin API version used for authenticated store calls.

use crate::error::ConfigError;
use std::fmt;
use std::str::FromStr;

/// Admin API version.
///
/// Shopify releases dated versions quarterly (`YYYY-MM`); `unstable` tracks
/// unreleased changes. The bridge pins one version at startup and uses it for
/// every Admin API path it builds.
///
/// # Example
///
/// ```rust
/// use shopify_bridge::ApiVersion;
///
/// let version: ApiVersion = "2024-10".parse().unwrap();
/// assert_eq!(version.to_string(), "2024-10");
/// assert_eq!(ApiVersion::default().to_string(), "2024-01");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ApiVersion {
    /// A dated release such as `2024-01`.
    Dated {
        /// Four-digit release year.
        year: u16,
        /// Release month (1-12).
        month: u8,
    },
    /// The unstable channel.
    Unstable,
}

impl ApiVersion {
    /// The version the price rule and discount code payloads were written against.
    pub const DEFAULT: Self = Self::Dated {
        year: 2024,
        month: 1,
    };
}

impl Default for ApiVersion {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dated { year, month } => write!(f, "{year:04}-{month:02}"),
            Self::Unstable => f.write_str("unstable"),
        }
    }
}

impl FromStr for ApiVersion {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        if s == "unstable" {
            return Ok(Self::Unstable);
        }

        let invalid = || ConfigError::InvalidApiVersion { version: s.clone() };

        let (year, month) = s.split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        if !year.chars().chain(month.chars()).all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let year: u16 = year.parse().map_err(|_| invalid())?;
        let month: u8 = month.parse().map_err(|_| invalid())?;
        if !(1..=12).contains(&month) {
            return Err(invalid());
        }

        Ok(Self::Dated { year, month })
    }
}
