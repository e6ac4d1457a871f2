//! ARBWATCH: live soccer odds reconciliation and arbitrage scanner.
//!
//! Entry point. Loads configuration, initialises structured logging,
//! starts one poll task per enabled source, and runs the reconcile loop
//! with graceful shutdown.

use anyhow::Result;
use std::sync::Arc;
use tracing::{error, info, warn};

use arbwatch::config;
use arbwatch::dashboard::{self, render, routes::DashboardState};
use arbwatch::engine::arbitrage::ArbitrageCalculator;
use arbwatch::engine::supervisor::SourceSupervisor;
use arbwatch::engine::{CycleOutcome, Engine};
use arbwatch::sources::FileFeed;
use arbwatch::storage;

const BANNER: &str = r#"
    _    ____  ______        ___  _____ ____ _   _
   / \  |  _ \| __ ) \      / / \|_   _/ ___| | | |
  / _ \ | |_) |  _ \\ \ /\ / / _ \ | || |   | |_| |
 / ___ \|  _ <| |_) |\ V  V / ___ \| || |___|  _  |
/_/   \_\_| \_\____/  \_/\_/_/   \_\_| \____|_| |_|

  Live odds reconciliation & back/lay arbitrage
  v0.1.0
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let cfg = config::AppConfig::load("config.toml")?;

    init_logging();

    println!("{BANNER}");
    info!(
        name = %cfg.engine.name,
        reconcile_interval_secs = cfg.engine.reconcile_interval_secs,
        stake = %cfg.engine.stake,
        "ARBWATCH starting up"
    );

    // -- Sources ---------------------------------------------------------

    let mut supervisor = SourceSupervisor::new();
    let enabled = cfg.sources.enabled();
    if enabled.is_empty() {
        warn!("No sources enabled, the board will stay empty");
    }
    for (source, source_cfg) in enabled {
        let feed = FileFeed::new(source, &source_cfg.path);
        info!(source = %source, path = %feed.path().display(), "Watching snapshot");
        supervisor.start(Arc::new(feed), source_cfg.poll_interval());
    }

    // -- Dashboard -------------------------------------------------------

    let dashboard_state = Arc::new(DashboardState::new(cfg.engine.name.clone()));
    if cfg.dashboard.enabled {
        dashboard::spawn_dashboard(dashboard_state.clone(), cfg.dashboard.port).await?;
    }

    // -- Reconcile loop --------------------------------------------------

    let mut engine = Engine::new(ArbitrageCalculator::new(cfg.engine.stake));
    let mut interval = tokio::time::interval(cfg.engine.reconcile_interval());
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!(
        interval_secs = cfg.engine.reconcile_interval_secs,
        "Entering reconcile loop. Press Ctrl+C to stop."
    );

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let outcome = run_cycle(&mut engine, &supervisor, &cfg);
                outcome.report.log();

                let rows = render::board_rows(&outcome);
                if let Some(path) = &cfg.dashboard.board_file {
                    if let Err(e) = storage::save_json(&rows, path) {
                        error!(error = %e, path = %path.display(), "Failed to write board file");
                    }
                }
                dashboard_state
                    .update(rows, supervisor.status(), outcome.report)
                    .await;
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received.");
                break;
            }
        }
    }

    supervisor.stop_all().await;
    info!(cycles = engine.cycle_count(), "ARBWATCH shut down cleanly.");

    Ok(())
}

/// Reconcile whatever fresh snapshots the sources currently hold.
fn run_cycle(engine: &mut Engine, supervisor: &SourceSupervisor, cfg: &config::AppConfig) -> CycleOutcome {
    let inputs = supervisor.collect(cfg.engine.max_snapshot_age());
    for source in supervisor.running() {
        if !inputs.contains_key(&source) {
            warn!(source = %source, "No fresh snapshot this cycle");
        }
    }

    let outcome = engine.run_cycle(&inputs);
    for entry in &outcome.board.has_exchange {
        for opp in outcome.opportunities_for(&entry.canonical_key) {
            info!(
                event = %entry,
                outcome = %opp.outcome,
                back = %opp.best_back,
                back_source = %opp.back_source,
                lay = %opp.lay_price,
                profit = format!("${:.2}", opp.profit),
                "Arbitrage opportunity"
            );
        }
    }
    outcome
}

/// Initialise structured logging. JSON output when `ARBWATCH_LOG_JSON` is set.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("arbwatch=info"));

    if std::env::var("ARBWATCH_LOG_JSON").is_ok() {
        fmt().json().with_env_filter(filter).with_target(true).init();
    } else {
        fmt().with_env_filter(filter).with_target(false).init();
    }
}
