//! Fill type representing a single trade execution.

use crate::domain::{Coin, Decimal, Side, TimeMs};
use serde::{Deserialize, Serialize};

/// Direction label the exchange attaches to every fill.
///
/// Serialized as the exchange's own string. Labels outside the known set
/// are kept verbatim in `Other` and treated as spot trades.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Direction {
    OpenLong,
    OpenShort,
    CloseLong,
    CloseShort,
    LongToShort,
    ShortToLong,
    AutoDeleveraging,
    Buy,
    Sell,
    Other(String),
}

impl Direction {
    /// Parse the exchange's `dir` string. Never fails.
    pub fn from_wire(s: &str) -> Direction {
        match s.trim() {
            "Open Long" => Direction::OpenLong,
            "Open Short" => Direction::OpenShort,
            "Close Long" => Direction::CloseLong,
            "Close Short" => Direction::CloseShort,
            "Long > Short" => Direction::LongToShort,
            "Short > Long" => Direction::ShortToLong,
            "Auto-Deleveraging" => Direction::AutoDeleveraging,
            "Buy" => Direction::Buy,
            "Sell" => Direction::Sell,
            other => Direction::Other(other.to_string()),
        }
    }

    /// Whether fills with this direction move a perpetual position.
    pub fn is_perp(&self) -> bool {
        !matches!(
            self,
            Direction::Buy | Direction::Sell | Direction::Other(_)
        )
    }

    pub fn as_str(&self) -> &str {
        match self {
            Direction::OpenLong => "Open Long",
            Direction::OpenShort => "Open Short",
            Direction::CloseLong => "Close Long",
            Direction::CloseShort => "Close Short",
            Direction::LongToShort => "Long > Short",
            Direction::ShortToLong => "Short > Long",
            Direction::AutoDeleveraging => "Auto-Deleveraging",
            Direction::Buy => "Buy",
            Direction::Sell => "Sell",
            Direction::Other(label) => label,
        }
    }
}

impl From<String> for Direction {
    fn from(value: String) -> Self {
        Direction::from_wire(&value)
    }
}

impl From<Direction> for String {
    fn from(value: Direction) -> Self {
        value.as_str().to_string()
    }
}

/// A single trade fill/execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fill {
    /// Time of the fill in milliseconds since Unix epoch.
    pub time_ms: TimeMs,
    /// Coin/asset being traded, as reported (`"HYPE"`, `"@107"`).
    pub coin: Coin,
    /// Trade side (Buy or Sell).
    pub side: Side,
    /// Price per unit.
    pub px: Decimal,
    /// Size/quantity traded (unsigned).
    pub sz: Decimal,
    /// Signed position size before this fill.
    pub start_position: Decimal,
    /// Direction label.
    pub dir: Direction,
    /// Closed PnL from this fill (if any).
    pub closed_pnl: Decimal,
    /// Fee paid for this fill.
    pub fee: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee_token: Option<Coin>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    /// Trade ID (preferred stable key).
    pub tid: Option<i64>,
    /// Order ID.
    pub oid: Option<i64>,
    /// Parent TWAP order, when the fill is a TWAP slice.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twap_id: Option<i64>,
}

impl Fill {
    /// Create a Fill with the fields the replay engine needs; the rest default.
    pub fn new(
        time_ms: TimeMs,
        coin: Coin,
        side: Side,
        px: Decimal,
        sz: Decimal,
        start_position: Decimal,
        dir: Direction,
    ) -> Self {
        Fill {
            time_ms,
            coin,
            side,
            px,
            sz,
            start_position,
            dir,
            closed_pnl: Decimal::zero(),
            fee: Decimal::zero(),
            fee_token: None,
            hash: None,
            tid: None,
            oid: None,
            twap_id: None,
        }
    }

    pub fn with_tid(mut self, tid: i64) -> Self {
        self.tid = Some(tid);
        self
    }

    pub fn with_twap_id(mut self, twap_id: i64) -> Self {
        self.twap_id = Some(twap_id);
        self
    }

    /// Signed size: `+sz` for buys, `-sz` for sells.
    pub fn signed_size(&self) -> Decimal {
        match self.side {
            Side::Buy => self.sz,
            Side::Sell => -self.sz,
        }
    }

    /// Traded notional (`px * sz`).
    pub fn notional(&self) -> Decimal {
        self.px * self.sz
    }

    /// Generate a stable unique key for this fill.
    ///
    /// Priority: `tid` (if present) > hash of deterministic fields.
    pub fn fill_key(&self) -> String {
        if let Some(tid) = self.tid {
            return format!("tid:{}", tid);
        }

        use sha2::{Digest, Sha256};

        let mut hasher = Sha256::new();
        hasher.update(self.coin.as_str());
        hasher.update(self.time_ms.as_ms().to_le_bytes());
        hasher.update(if self.side == Side::Buy { b"B" } else { b"S" });
        hasher.update(self.px.to_canonical_string());
        hasher.update(self.sz.to_canonical_string());
        hasher.update(self.start_position.to_canonical_string());
        if let Some(oid) = self.oid {
            hasher.update(oid.to_le_bytes());
        }
        let hash = hasher.finalize();
        format!("hash:{}", hex::encode(&hash[..16]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    fn make_fill(side: Side, dir: Direction) -> Fill {
        Fill::new(
            TimeMs::new(1000),
            Coin::new("HYPE"),
            side,
            d("20"),
            d("10"),
            Decimal::zero(),
            dir,
        )
    }

    #[test]
    fn test_direction_routing() {
        for dir in [
            Direction::OpenLong,
            Direction::OpenShort,
            Direction::CloseLong,
            Direction::CloseShort,
            Direction::AutoDeleveraging,
            Direction::LongToShort,
            Direction::ShortToLong,
        ] {
            assert!(dir.is_perp(), "{} should be perp", dir.as_str());
        }
        assert!(!Direction::Buy.is_perp());
        assert!(!Direction::Sell.is_perp());
    }

    #[test]
    fn test_direction_wire_roundtrip() {
        for s in ["Open Long", "Close Short", "Auto-Deleveraging", "Buy", "Long > Short"] {
            let dir = Direction::from_wire(s);
            assert_eq!(dir.as_str(), s);
            assert_eq!(serde_json::to_value(&dir).unwrap(), serde_json::json!(s));
        }
    }

    #[test]
    fn test_unlisted_direction_is_spot() {
        let dir = Direction::from_wire("Spot Dust Conversion");
        assert_eq!(dir, Direction::Other("Spot Dust Conversion".to_string()));
        assert!(!dir.is_perp());
        assert_eq!(dir.as_str(), "Spot Dust Conversion");

        let json = serde_json::to_value(&dir).unwrap();
        assert_eq!(json, serde_json::json!("Spot Dust Conversion"));
        let back: Direction = serde_json::from_value(json).unwrap();
        assert_eq!(back, dir);
    }

    #[test]
    fn test_signed_size_and_notional() {
        let buy = make_fill(Side::Buy, Direction::OpenLong);
        assert_eq!(buy.signed_size(), d("10"));
        assert_eq!(buy.notional(), d("200"));

        let sell = make_fill(Side::Sell, Direction::OpenShort);
        assert_eq!(sell.signed_size(), d("-10"));
    }

    #[test]
    fn test_fill_key_with_tid() {
        let fill = make_fill(Side::Buy, Direction::Buy).with_tid(12345);
        assert_eq!(fill.fill_key(), "tid:12345");
    }

    #[test]
    fn test_fill_key_without_tid_uses_hash() {
        let fill = make_fill(Side::Buy, Direction::Buy);
        let key = fill.fill_key();
        assert!(key.starts_with("hash:"));
        assert_eq!(key.len(), 5 + 32);
        assert_eq!(key, fill.clone().fill_key(), "Same inputs must produce same key");
    }

    #[test]
    fn test_fill_key_different_for_different_fills() {
        let a = make_fill(Side::Buy, Direction::Buy);
        let mut b = a.clone();
        b.px = d("21");
        assert_ne!(a.fill_key(), b.fill_key());
    }
}
