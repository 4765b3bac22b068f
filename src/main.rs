use hypestate::export::Exporter;
use hypestate::orchestration::Orchestrator;
use hypestate::{AppError, CachedDataSource, Config, DataSource, HyperliquidDataSource};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    let config = Config::from_env().map_err(AppError::from)?;

    let http = HyperliquidDataSource::new(
        config.hyperliquid_api_url.clone(),
        config.hyperliquid_explorer_url.clone(),
    );
    let source: Arc<dyn DataSource> =
        Arc::new(CachedDataSource::new(http, &config.cache_dir, !config.refresh));

    let orchestrator = Orchestrator::new(
        source,
        config.engine_config(),
        Exporter::new(&config.output_dir, config.export_format),
        config.aggregate_fills_by_time,
        config.symbols_from_meta,
    );

    let reports = orchestrator
        .run_all(&config.users)
        .await
        .map_err(AppError::from)?;

    for report in &reports {
        let state = &report.final_state;
        tracing::info!(
            user = %report.user,
            events = report.stats.applied,
            unparsed = report.load.skipped(),
            spot_usdc = %state.spot_usdc,
            perp_usdc = %state.perp_usdc,
            perp_positions = state.perp_positions.len(),
            spot_positions = state.spot_positions.len(),
            files = report.files.len(),
            "account summary"
        );
    }

    Ok(())
}
