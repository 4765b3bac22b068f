//! Mapping of exchange asset identifiers to canonical token symbols.
//!
//! The exchange refers to the same token in several ways: perp asset indices
//! (`"159"`), spot market ids (`"@107"`), spot pair names (`"PURR/USDC"`) and
//! the plain symbol (`"HYPE"`). Every state-map key goes through
//! [`SymbolTable::normalize`] so these never fragment into separate entries.

use crate::domain::Coin;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SymbolTableError {
    #[error("meta response is missing `{0}`")]
    MissingField(&'static str),
}

/// Alias → canonical symbol table.
///
/// Invariant: no alias is itself a canonical symbol, so `normalize` is
/// idempotent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolTable {
    aliases: BTreeMap<String, String>,
    canonical: BTreeSet<String>,
}

impl SymbolTable {
    /// An empty table; `normalize` is the identity.
    pub fn new() -> Self {
        Self::default()
    }

    /// The small table of well-known identifiers shipped with the crate.
    pub fn builtin() -> Self {
        let mut table = Self::new();
        table.insert("0", "BTC");
        table.insert("1", "ETH");
        table.insert("159", "HYPE");
        table.insert("@107", "HYPE");
        table.insert("PURR/USDC", "PURR");
        table
    }

    /// Build a table from the exchange's `meta` and `spotMeta` responses.
    ///
    /// Perp universe entries map their position index to the asset name;
    /// spot universe entries map both `@<index>` and their pair name to the
    /// base token's name.
    pub fn from_meta(perp_meta: &Value, spot_meta: &Value) -> Result<Self, SymbolTableError> {
        let mut table = Self::new();

        let perp_universe = perp_meta
            .get("universe")
            .and_then(Value::as_array)
            .ok_or(SymbolTableError::MissingField("universe"))?;
        for (index, asset) in perp_universe.iter().enumerate() {
            if let Some(name) = asset.get("name").and_then(Value::as_str) {
                table.insert(&index.to_string(), name);
            }
        }

        let tokens = spot_meta
            .get("tokens")
            .and_then(Value::as_array)
            .ok_or(SymbolTableError::MissingField("tokens"))?;
        let token_names: BTreeMap<u64, &str> = tokens
            .iter()
            .filter_map(|t| {
                let index = t.get("index").and_then(Value::as_u64)?;
                let name = t.get("name").and_then(Value::as_str)?;
                Some((index, name))
            })
            .collect();

        let spot_universe = spot_meta
            .get("universe")
            .and_then(Value::as_array)
            .ok_or(SymbolTableError::MissingField("universe"))?;
        for pair in spot_universe {
            let Some(index) = pair.get("index").and_then(Value::as_u64) else {
                continue;
            };
            let Some(base) = pair
                .get("tokens")
                .and_then(Value::as_array)
                .and_then(|t| t.first())
                .and_then(Value::as_u64)
                .and_then(|i| token_names.get(&i))
            else {
                continue;
            };

            table.insert(&format!("@{}", index), base);
            if let Some(name) = pair.get("name").and_then(Value::as_str) {
                table.insert(name, base);
            }
        }

        Ok(table)
    }

    /// Register `alias` as another name for `symbol`.
    ///
    /// Aliases that equal a known canonical symbol are ignored, and a
    /// `symbol` that is itself an alias is resolved first, which keeps
    /// `normalize` idempotent.
    pub fn insert(&mut self, alias: &str, symbol: &str) {
        let symbol = self
            .aliases
            .get(symbol)
            .cloned()
            .unwrap_or_else(|| symbol.to_string());
        if alias == symbol || self.canonical.contains(alias) {
            return;
        }
        self.aliases.insert(alias.to_string(), symbol.clone());
        self.canonical.insert(symbol);
    }

    /// Merge another table's entries into this one. Existing aliases win.
    pub fn extend(&mut self, other: &SymbolTable) {
        for (alias, symbol) in &other.aliases {
            if !self.aliases.contains_key(alias) {
                self.insert(alias, symbol);
            }
        }
    }

    /// Map an identifier to its canonical symbol; unknown identifiers are
    /// returned unchanged.
    pub fn normalize(&self, coin: &Coin) -> Coin {
        match self.aliases.get(coin.as_str()) {
            Some(symbol) => Coin::new(symbol.clone()),
            None => coin.clone(),
        }
    }

    pub fn normalize_str(&self, id: &str) -> Coin {
        self.normalize(&Coin::new(id))
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}
