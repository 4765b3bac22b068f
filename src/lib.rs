pub mod config;
pub mod datasource;
pub mod domain;
pub mod engine;
pub mod error;
pub mod export;
pub mod orchestration;
pub mod state;
pub mod symbols;

pub use config::Config;
pub use datasource::{CachedDataSource, DataSource, DataSourceError, HyperliquidDataSource, MockDataSource};
pub use domain::{Address, Coin, Decimal, Event, EventKind, Side, TimeMs};
pub use engine::{EngineConfig, Replay, ReplayEngine, ReplayStats, ReplayStep};
pub use error::AppError;
pub use state::{AccountState, StateDelta};
pub use symbols::SymbolTable;
