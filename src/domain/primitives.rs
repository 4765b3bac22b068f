//! Domain primitives: TimeMs, Address, Coin, Side.

use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Time in milliseconds since Unix epoch.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TimeMs(pub i64);

impl TimeMs {
    /// Create a TimeMs from milliseconds.
    pub fn new(ms: i64) -> Self {
        TimeMs(ms)
    }

    /// Create a TimeMs from whole seconds.
    pub fn from_secs(secs: i64) -> Self {
        TimeMs(secs.saturating_mul(1000))
    }

    /// Get the underlying milliseconds value.
    pub fn as_ms(&self) -> i64 {
        self.0
    }

    /// RFC 3339 rendering in UTC, or `None` if chrono cannot represent the instant.
    pub fn to_rfc3339(&self) -> Option<String> {
        Utc.timestamp_millis_opt(self.0)
            .single()
            .map(|dt| dt.to_rfc3339())
    }
}

impl std::fmt::Display for TimeMs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Wallet or vault address (hex string).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(pub String);

impl Address {
    /// Create an Address from a string.
    pub fn new(addr: impl Into<String>) -> Self {
        Address(addr.into())
    }

    /// Get the address as a string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compare two addresses ignoring hex checksum casing.
    pub fn matches(&self, other: &Address) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }

    /// Lowercased form used for cache and output paths.
    pub fn to_lowercase(&self) -> String {
        self.0.to_lowercase()
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Coin/asset symbol, either as the exchange reports it (`"@107"`, `"159"`)
/// or in canonical form (`"HYPE"`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Coin(pub String);

impl Coin {
    /// Create a Coin from a string.
    pub fn new(coin: impl Into<String>) -> Self {
        Coin(coin.into())
    }

    /// Get the coin as a string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Spot markets are addressed as `@<index>` by the exchange.
    pub fn is_spot_market_id(&self) -> bool {
        self.0.starts_with('@')
    }

    /// Whether this identifier names a spot market: an `@<index>` id or a
    /// `BASE/QUOTE` pair name.
    pub fn is_spot_market(&self) -> bool {
        self.is_spot_market_id() || self.0.contains('/')
    }
}

impl std::fmt::Display for Coin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Trade side: Buy or Sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Buy side (bid).
    Buy,
    /// Sell side (ask).
    Sell,
}

impl Side {
    /// Parse the exchange's wire form: `B` (bid) is a buy, `A` (ask) is a sell.
    pub fn from_wire(s: &str) -> Option<Side> {
        match s.trim().to_ascii_lowercase().as_str() {
            "b" | "buy" => Some(Side::Buy),
            "a" | "sell" => Some(Side::Sell),
            _ => None,
        }
    }

    /// Get the signed multiplier for this side (+1 for Buy, -1 for Sell).
    pub fn sign(&self) -> i32 {
        match self {
            Side::Buy => 1,
            Side::Sell => -1,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_sign() {
        assert_eq!(Side::Buy.sign(), 1);
        assert_eq!(Side::Sell.sign(), -1);
    }

    #[test]
    fn test_side_from_wire() {
        assert_eq!(Side::from_wire("B"), Some(Side::Buy));
        assert_eq!(Side::from_wire("b"), Some(Side::Buy));
        assert_eq!(Side::from_wire("A"), Some(Side::Sell));
        assert_eq!(Side::from_wire("sell"), Some(Side::Sell));
        assert_eq!(Side::from_wire("x"), None);
    }

    #[test]
    fn test_side_serialization() {
        assert_eq!(serde_json::to_string(&Side::Buy).unwrap(), "\"buy\"");
        assert_eq!(serde_json::to_string(&Side::Sell).unwrap(), "\"sell\"");
    }

    #[test]
    fn test_address_matches_ignores_case() {
        let a = Address::new("0xAbC123");
        let b = Address::new("0xabc123");
        assert!(a.matches(&b));
        assert_ne!(a, b);
        assert!(!a.matches(&Address::new("0xabc124")));
        assert_eq!(a.to_lowercase(), "0xabc123");
    }

    #[test]
    fn test_coin_spot_market_id() {
        assert!(Coin::new("@107").is_spot_market_id());
        assert!(!Coin::new("HYPE").is_spot_market_id());
        assert!(Coin::new("PURR/USDC").is_spot_market());
        assert!(Coin::new("@107").is_spot_market());
        assert!(!Coin::new("BTC").is_spot_market());
    }

    #[test]
    fn test_timems_conversions() {
        assert!(TimeMs::new(1000) < TimeMs::new(2000));
        assert_eq!(TimeMs::from_secs(1_700_000_000).as_ms(), 1_700_000_000_000);
        assert_eq!(
            TimeMs::new(0).to_rfc3339().as_deref(),
            Some("1970-01-01T00:00:00+00:00")
        );
    }
}
