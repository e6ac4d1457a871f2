//! End-to-end cycle over fixture snapshots written to disk.

use rust_decimal_macros::dec;
use std::path::PathBuf;

use arbwatch::dashboard::render::{board_rows, render_text};
use arbwatch::engine::arbitrage::ArbitrageCalculator;
use arbwatch::engine::reconciler::SourceRecords;
use arbwatch::engine::Engine;
use arbwatch::sources::{FileFeed, SnapshotFeed};
use arbwatch::storage;
use arbwatch::types::{Outcome, PriorityClass, SourceId};

const WINBET: &str = include_str!("../fixtures/winbet.json");
const BETANO: &str = include_str!("../fixtures/betano.json");
const EFBET: &str = include_str!("../fixtures/efbet.json");
const ORBITX: &str = include_str!("../fixtures/orbitx.jsonl");

struct FixtureDir(PathBuf);

impl FixtureDir {
    fn new() -> Self {
        let mut dir = std::env::temp_dir();
        dir.push(format!("arbwatch_it_{}", uuid::Uuid::new_v4()));
        Self(dir)
    }

    fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.0.join(name);
        storage::write_snapshot(&path, contents).unwrap();
        path
    }
}

impl Drop for FixtureDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}

async fn load_all(dir: &FixtureDir) -> SourceRecords {
    let feeds = [
        FileFeed::new(SourceId::WinBet, dir.write("winbet.json", WINBET)),
        FileFeed::new(SourceId::Betano, dir.write("betano.json", BETANO)),
        FileFeed::new(SourceId::Efbet, dir.write("efbet.json", EFBET)),
        FileFeed::new(SourceId::OrbitX, dir.write("orbitx.jsonl", ORBITX)),
    ];

    let mut inputs = SourceRecords::new();
    for feed in &feeds {
        inputs.insert(feed.source(), feed.fetch().await.unwrap().records);
    }
    inputs
}

#[tokio::test]
async fn test_adapters_drop_malformed_records() {
    let dir = FixtureDir::new();
    let inputs = load_all(&dir).await;

    assert_eq!(inputs[&SourceId::WinBet].len(), 3, "single-team record dropped");
    assert_eq!(inputs[&SourceId::Betano].len(), 3);
    assert_eq!(inputs[&SourceId::Efbet].len(), 2, "carousel item dropped");
    assert_eq!(inputs[&SourceId::OrbitX].len(), 2, "garbage line dropped");
}

#[tokio::test]
async fn test_full_cycle_buckets_and_order() {
    let dir = FixtureDir::new();
    let inputs = load_all(&dir).await;
    let mut engine = Engine::new(ArbitrageCalculator::new(dec!(1000)));
    let outcome = engine.run_cycle(&inputs);
    let board = &outcome.board;

    // Exchange-covered matches first; more bookmakers ranks higher.
    assert_eq!(board.has_exchange.len(), 2);
    let clasico = &board.has_exchange[0];
    assert_eq!(clasico.display_teams[0], "Real Madrid CF");
    assert_eq!(clasico.provider_count, 2);
    assert_eq!(clasico.minutes_elapsed, 68);
    assert_eq!(board.has_exchange[1].display_teams[0], "Lokomotiv Plovdiv");

    // Levski is on all three bookmakers but not the exchange.
    assert_eq!(board.all_providers.len(), 1);
    assert_eq!(board.all_providers[0].minutes_elapsed, 31);

    assert!(board.two_providers.is_empty());

    // Abbreviated Efbet names do not join and land on their own.
    let singles: Vec<&str> = board
        .single_provider
        .iter()
        .map(|e| e.display_teams[0].as_str())
        .collect();
    assert_eq!(singles, vec!["R. Madrid", "Arsenal", "Ludogorets"]);
    assert_eq!(board.single_provider[1].minutes_elapsed, 47);
}

#[tokio::test]
async fn test_full_cycle_arbitrage() {
    let dir = FixtureDir::new();
    let inputs = load_all(&dir).await;
    let outcome = Engine::new(ArbitrageCalculator::new(dec!(1000))).run_cycle(&inputs);

    let clasico = &outcome.board.has_exchange[0];
    let opps = outcome.opportunities_for(&clasico.canonical_key);
    assert_eq!(opps.len(), 1, "draw is equal and away is below the lay");

    let home = &opps[0];
    assert_eq!(home.outcome, Outcome::Home);
    assert_eq!(home.back_source, SourceId::WinBet);
    assert_eq!(home.best_back, dec!(2.10));
    assert_eq!(home.lay_price, dec!(1.90));
    assert_eq!(home.lay_size, "250");
    assert!((home.profit - dec!(105.26)).abs() < dec!(0.01));

    assert_eq!(outcome.report.opportunities, 1);
    assert_eq!(outcome.report.records_in, 10);
}

#[tokio::test]
async fn test_rendered_board() {
    let dir = FixtureDir::new();
    let inputs = load_all(&dir).await;
    let outcome = Engine::new(ArbitrageCalculator::new(dec!(1000))).run_cycle(&inputs);
    let rows = board_rows(&outcome);

    assert_eq!(rows.len(), outcome.board.len());
    assert_eq!(rows[0].bucket, PriorityClass::HasExchange);
    assert_eq!(rows[0].match_label, "Real Madrid CF vs FC Barcelona (68')\nScore: 2-1");
    assert_eq!(rows[0].bookmakers[&SourceId::WinBet], "1: 2.10\nX: 3.40\n2: 3.60");
    assert_eq!(rows[0].bookmakers[&SourceId::Efbet], "N/A");
    assert_eq!(rows[0].exchange, "1: 1.88/1.90\nX: 3.45/3.50\n2: 3.75/3.80");
    assert_eq!(rows[0].arbitrage, "1: $105.26");
    assert_eq!(rows[1].arbitrage, "N/A");

    let text = render_text(&rows);
    let exchange_at = text.find("== Exchange ==").unwrap();
    let single_at = text.find("== Single provider ==").unwrap();
    assert!(exchange_at < single_at);
    assert!(!text.contains("== Two providers =="));
}

#[tokio::test]
async fn test_missing_and_corrupt_sources_do_not_abort() {
    let dir = FixtureDir::new();
    let winbet = FileFeed::new(SourceId::WinBet, dir.write("winbet.json", WINBET));
    let betano = FileFeed::new(SourceId::Betano, dir.write("betano.json", "{\"half\": "));
    let efbet = FileFeed::new(SourceId::Efbet, dir.0.join("never_written.json"));

    assert!(betano.fetch().await.is_err());
    assert!(efbet.fetch().await.is_err());

    let mut inputs = SourceRecords::new();
    inputs.insert(SourceId::WinBet, winbet.fetch().await.unwrap().records);
    let outcome = Engine::default().run_cycle(&inputs);

    assert_eq!(outcome.board.len(), 3);
    assert!(outcome.board.entries().all(|e| e.priority_class == PriorityClass::SingleProvider));
    assert!(outcome.opportunities.is_empty());
}
