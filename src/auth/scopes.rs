//! OAuth scope sets.

use crate::error::ConfigError;
use serde::{Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// A set of OAuth access scopes.
///
/// Scopes are kept sorted so the `scope` query parameter and the persisted
/// grant string are deterministic. Shopify joins scopes with commas in both
/// directions; whitespace-separated input is accepted as well.
///
/// # Implied Scopes
///
/// A write scope grants the matching read scope, so parsing expands:
/// - `write_orders` to `read_orders`
/// - `unauthenticated_write_checkouts` to `unauthenticated_read_checkouts`
///
/// [`AuthScopes::requested`] builds a set without the expansion, for the
/// authorization URL, where only what the app asks for should be listed.
///
/// # Example
///
/// ```rust
/// use shopify_bridge::AuthScopes;
///
/// let granted: AuthScopes = "write_discounts, read_orders".parse().unwrap();
/// assert_eq!(granted.to_string(), "read_discounts,read_orders,write_discounts");
///
/// let required: AuthScopes = "read_orders".parse().unwrap();
/// assert!(granted.covers(&required));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct AuthScopes {
    scopes: BTreeSet<String>,
}

impl AuthScopes {
    /// Creates an empty scope set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses scopes exactly as written, without implied scope expansion.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidScopes`] if a scope contains characters
    /// other than ASCII letters, digits and underscores.
    pub fn requested(s: &str) -> Result<Self, ConfigError> {
        let scopes = s
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|scope| !scope.is_empty())
            .map(|scope| {
                if scope.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                    Ok(scope.to_string())
                } else {
                    Err(ConfigError::InvalidScopes {
                        reason: format!("Invalid characters in scope: '{scope}'"),
                    })
                }
            })
            .collect::<Result<BTreeSet<_>, _>>()?;

        Ok(Self { scopes })
    }

    /// Returns `true` if the scope set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Returns the number of scopes in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    /// Returns `true` if every scope in `other` is also in this set.
    #[must_use]
    pub fn covers(&self, other: &Self) -> bool {
        other.scopes.is_subset(&self.scopes)
    }

    /// Returns an iterator over the scopes in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.scopes.iter().map(String::as_str)
    }

    fn with_implied_scopes(mut self) -> Self {
        let implied: Vec<String> = self
            .scopes
            .iter()
            .filter_map(|scope| Self::implied_scope(scope))
            .collect();
        self.scopes.extend(implied);
        self
    }

    fn implied_scope(scope: &str) -> Option<String> {
        scope
            .strip_prefix("unauthenticated_write_")
            .map(|rest| format!("unauthenticated_read_{rest}"))
            .or_else(|| {
                scope
                    .strip_prefix("write_")
                    .map(|rest| format!("read_{rest}"))
            })
    }
}

impl FromStr for AuthScopes {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::requested(s).map(Self::with_implied_scopes)
    }
}

impl fmt::Display for AuthScopes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<&str> = self.iter().collect();
        f.write_str(&joined.join(","))
    }
}

impl Serialize for AuthScopes {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
