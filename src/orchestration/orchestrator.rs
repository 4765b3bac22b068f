use crate::datasource::DataSource;
use crate::domain::{Address, TimeMs};
use crate::engine::{EngineConfig, ReplayEngine, ReplayStats};
use crate::export::{ExportError, Exporter};
use crate::orchestration::loader::{EventLoader, LoadError, LoadReport};
use crate::state::AccountState;
use crate::symbols::SymbolTable;
use futures::future::try_join_all;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Outcome of replaying one account.
#[derive(Debug, Clone)]
pub struct AccountReport {
    pub user: Address,
    pub load: LoadReport,
    pub stats: ReplayStats,
    pub final_state: AccountState,
    pub files: Vec<PathBuf>,
}

#[derive(Clone)]
pub struct Orchestrator {
    source: Arc<dyn DataSource>,
    loader: EventLoader,
    engine_config: EngineConfig,
    exporter: Exporter,
    symbols_from_meta: bool,
}

impl Orchestrator {
    pub fn new(
        source: Arc<dyn DataSource>,
        engine_config: EngineConfig,
        exporter: Exporter,
        aggregate_fills_by_time: bool,
        symbols_from_meta: bool,
    ) -> Self {
        Self {
            loader: EventLoader::new(source.clone(), aggregate_fills_by_time),
            source,
            engine_config,
            exporter,
            symbols_from_meta,
        }
    }

    /// Symbol table for a run: exchange metadata first, built-in entries for
    /// anything it does not cover. Falls back to the built-in table alone if
    /// metadata is unavailable.
    pub async fn symbols(&self) -> SymbolTable {
        if !self.symbols_from_meta {
            return SymbolTable::builtin();
        }

        let meta = futures::try_join!(self.source.perp_meta(), self.source.spot_meta());
        let table = match meta {
            Ok((perp, spot)) => SymbolTable::from_meta(&perp, &spot).map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };

        match table {
            Ok(mut table) => {
                table.extend(&SymbolTable::builtin());
                info!(symbols = table.len(), "loaded symbol table from exchange metadata");
                table
            }
            Err(error) => {
                warn!(error = %error, "exchange metadata unavailable, using built-in symbols");
                SymbolTable::builtin()
            }
        }
    }

    pub async fn run_account(&self, user: &Address) -> Result<AccountReport, OrchestrationError> {
        let engine = ReplayEngine::new(self.engine_config.clone(), self.symbols().await);
        self.run_with(&engine, user).await
    }

    /// Replay every account independently; the first failure aborts the run.
    pub async fn run_all(&self, users: &[Address]) -> Result<Vec<AccountReport>, OrchestrationError> {
        let engine = ReplayEngine::new(self.engine_config.clone(), self.symbols().await);
        try_join_all(users.iter().map(|user| self.run_with(&engine, user))).await
    }

    async fn run_with(
        &self,
        engine: &ReplayEngine,
        user: &Address,
    ) -> Result<AccountReport, OrchestrationError> {
        let loaded = self.loader.load(user).await?;
        let start = loaded
            .events
            .first()
            .map(|e| e.time())
            .unwrap_or(TimeMs::new(0));

        let replay = engine.replay(AccountState::new(user.clone(), start), loaded.events);

        // csv and std::fs writes block; keep them off the runtime threads.
        let exporter = self.exporter.clone();
        let export_user = user.clone();
        let (replay, exported) = tokio::task::spawn_blocking(move || {
            let exported = exporter.export(&export_user, &replay);
            (replay, exported)
        })
        .await?;
        let files = exported?;

        info!(
            user = %user,
            applied = replay.stats.applied,
            skipped_unknown = replay.stats.skipped_unknown,
            skipped_filtered = replay.stats.skipped_filtered,
            records_skipped = loaded.report.skipped(),
            "account replayed"
        );

        Ok(AccountReport {
            user: user.clone(),
            load: loaded.report,
            stats: replay.stats,
            final_state: replay.final_state().clone(),
            files,
        })
    }
}

#[derive(Debug, Error)]
pub enum OrchestrationError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("export task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
