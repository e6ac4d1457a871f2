//! Supervisor behaviour with live poll tasks.

use std::sync::Arc;
use std::time::Duration;

use arbwatch::engine::supervisor::{SourceSlot, SourceSupervisor};
use arbwatch::engine::Engine;
use arbwatch::sources::FileFeed;
use arbwatch::storage;
use arbwatch::types::{PriorityClass, SourceId};
use tokio::sync::watch;

use crate::memory_feed::{bookmaker_record, MemoryFeed};

async fn wait_until<F>(rx: &mut watch::Receiver<SourceSlot>, mut done: F)
where
    F: FnMut(&SourceSlot) -> bool,
{
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if done(&rx.borrow_and_update()) {
                break;
            }
            rx.changed().await.unwrap();
        }
    })
    .await
    .expect("slot never reached the expected state");
}

#[tokio::test]
async fn test_sources_feed_the_reconciler() {
    let mut sup = SourceSupervisor::new();
    let mut wb_rx = sup.subscribe(SourceId::WinBet);
    let mut bt_rx = sup.subscribe(SourceId::Betano);

    sup.start(
        Arc::new(MemoryFeed::new(
            SourceId::WinBet,
            vec![bookmaker_record(SourceId::WinBet, "Levski Sofia", "CSKA Sofia", 20)],
        )),
        Duration::from_millis(10),
    );
    sup.start(
        Arc::new(MemoryFeed::new(
            SourceId::Betano,
            vec![bookmaker_record(SourceId::Betano, "CSKA Sofia", "Levski Sofia", 22)],
        )),
        Duration::from_millis(10),
    );
    wait_until(&mut wb_rx, |s| s.snapshot.is_some()).await;
    wait_until(&mut bt_rx, |s| s.snapshot.is_some()).await;

    let outcome = Engine::default().run_cycle(&sup.collect(Duration::from_secs(60)));
    assert_eq!(outcome.board.two_providers.len(), 1);
    assert_eq!(outcome.board.two_providers[0].minutes_elapsed, 22);

    sup.stop_all().await;
}

#[tokio::test]
async fn test_failing_source_is_isolated() {
    let mut sup = SourceSupervisor::new();
    let mut ef_rx = sup.subscribe(SourceId::Efbet);
    let mut ox_rx = sup.subscribe(SourceId::OrbitX);

    let broken = Arc::new(MemoryFeed::new(SourceId::OrbitX, Vec::new()));
    broken.set_error("exchange page did not load");

    sup.start(
        Arc::new(MemoryFeed::new(
            SourceId::Efbet,
            vec![bookmaker_record(SourceId::Efbet, "Roma", "Lazio", 5)],
        )),
        Duration::from_millis(10),
    );
    sup.start(broken.clone(), Duration::from_millis(10));

    wait_until(&mut ef_rx, |s| s.snapshot.is_some()).await;
    wait_until(&mut ox_rx, |s| s.last_error.is_some()).await;
    assert!(broken.fetch_count() >= 1);

    let inputs = sup.collect(Duration::from_secs(60));
    assert!(!inputs.contains_key(&SourceId::OrbitX));

    let outcome = Engine::default().run_cycle(&inputs);
    assert_eq!(outcome.board.len(), 1);
    assert_eq!(outcome.board.single_provider[0].priority_class, PriorityClass::SingleProvider);

    // Stopping the broken source leaves the healthy one running.
    assert!(sup.stop(SourceId::OrbitX).await);
    assert!(sup.is_running(SourceId::Efbet));
    assert!(!sup.stop(SourceId::OrbitX).await);

    sup.stop_all().await;
    assert!(sup.running().is_empty());
}

#[tokio::test]
async fn test_abandoned_snapshot_file_goes_stale() {
    let mut path = std::env::temp_dir();
    path.push(format!("arbwatch_it_stale_{}.json", uuid::Uuid::new_v4()));
    storage::write_snapshot(
        &path,
        r#"[{"teams": ["Levski Sofia", "CSKA Sofia"], "score": "0-0", "minutes": 30,
            "odds": ["2.10", "3.20", "3.60"]}]"#,
    )
    .unwrap();
    // The scraper wrote this an hour ago and has not touched it since.
    std::fs::File::options()
        .write(true)
        .open(&path)
        .unwrap()
        .set_modified(std::time::SystemTime::now() - Duration::from_secs(3600))
        .unwrap();

    let mut sup = SourceSupervisor::new();
    let mut rx = sup.subscribe(SourceId::WinBet);
    sup.start(Arc::new(FileFeed::new(SourceId::WinBet, &path)), Duration::from_millis(10));
    wait_until(&mut rx, |s| s.snapshot.is_some()).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    let inputs = sup.collect(Duration::from_secs(60));
    assert!(!inputs.contains_key(&SourceId::WinBet));
    assert!(Engine::default().run_cycle(&inputs).board.is_empty());

    // A fresh write from the scraper brings the source back.
    storage::write_snapshot(
        &path,
        r#"[{"teams": ["Levski Sofia", "CSKA Sofia"], "score": "1-0", "minutes": 61,
            "odds": ["1.70", "3.60", "5.00"]}]"#,
    )
    .unwrap();
    tokio::time::timeout(Duration::from_secs(2), async {
        while !sup.collect(Duration::from_secs(60)).contains_key(&SourceId::WinBet) {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("rewritten snapshot never became fresh");

    sup.stop_all().await;
    storage::delete_snapshot(&path).unwrap();
}
