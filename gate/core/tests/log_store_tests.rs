// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Integration tests for the versioned activity log store
//!
//! Exercises the persistence contract over both store backends:
//! round-trips, destructive version migration, quota recovery and
//! cross-instance change propagation.

use std::sync::Arc;

use gate_core::application::log_store::{
    LogStore, STORAGE_KEY, STORAGE_VERSION, STORAGE_VERSION_KEY,
};
use gate_core::domain::log::ExecutionLog;
use gate_core::domain::policy::PolicyEvaluator;
use gate_core::domain::request::{ContractDraft, ContractRequest};
use gate_core::domain::storage::{KeyValueStore, WriterId};
use gate_core::infrastructure::event_bus::EventBus;
use gate_core::infrastructure::kv::{FileKv, MemoryKv};

fn make_log(method: &str) -> ExecutionLog {
    let draft = ContractDraft::new(
        format!("0x{}", "0".repeat(40)),
        method,
        "{}",
        "test request long enough",
    );
    let policy = PolicyEvaluator::new().evaluate(&draft);
    let request = ContractRequest::freeze(&draft, policy);
    ExecutionLog::success(&request, format!("tx-{}", method))
}

fn make_store(kv: Arc<dyn KeyValueStore>) -> LogStore {
    LogStore::new(kv, Arc::new(EventBus::with_default_capacity()))
}

#[tokio::test]
async fn test_round_trip_prepends_new_entry() {
    let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryKv::new());
    let store = make_store(kv);

    let before = store.load().await;
    store.append(make_log("transfer")).await.unwrap();

    let after = store.load().await;
    assert_eq!(after.len(), before.len() + 1);
    assert_eq!(after[0].method, "transfer");
}

#[tokio::test]
async fn test_clear_then_load_is_empty_regardless_of_prior_state() {
    let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryKv::new());
    let store = make_store(kv);
    store.load().await;

    for i in 0..5 {
        store.append(make_log(&format!("m{}", i))).await.unwrap();
    }
    store.clear().await.unwrap();
    assert!(store.load().await.is_empty());

    // Idempotent on an already-empty store
    store.clear().await.unwrap();
    assert!(store.load().await.is_empty());
}

#[tokio::test]
async fn test_version_mismatch_discards_collection() {
    let kv = Arc::new(MemoryKv::new());
    let seeder = WriterId::new();

    // Seed a valid-looking collection under an outdated version marker
    let stale = serde_json::to_string(&vec![make_log("stale")]).unwrap();
    kv.put(STORAGE_KEY, &stale, seeder).await.unwrap();
    kv.put(STORAGE_VERSION_KEY, "v0", seeder).await.unwrap();

    let store = make_store(kv.clone());
    assert!(store.load().await.is_empty());
    assert_eq!(
        kv.get(STORAGE_VERSION_KEY).await.as_deref(),
        Some(STORAGE_VERSION)
    );
}

#[tokio::test]
async fn test_quota_pressure_halves_instead_of_faulting() {
    let entry_bytes = serde_json::to_string(&vec![make_log("transfer")])
        .unwrap()
        .len() as u64;
    let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryKv::with_quota(entry_bytes * 8));
    let store = make_store(kv);
    store.load().await;

    for i in 0..20 {
        store
            .append(make_log(&format!("m{}", i % 10)))
            .await
            .expect("append must recover from quota pressure");
    }

    let kept = store.load().await;
    assert!(kept.len() < 20);
    assert!(!kept.is_empty());
    // The newest entry always survives a trim
    assert_eq!(kept[0].method, "m9");
}

#[tokio::test]
async fn test_file_backed_store_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gate-store.json");

    {
        let kv: Arc<dyn KeyValueStore> = Arc::new(FileKv::open(&path, None).unwrap());
        let store = make_store(kv);
        store.load().await;
        store.append(make_log("transfer")).await.unwrap();
        store.append(make_log("mint")).await.unwrap();
    }

    let kv: Arc<dyn KeyValueStore> = Arc::new(FileKv::open(&path, None).unwrap());
    let store = make_store(kv);
    let logs = store.load().await;
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0].method, "mint");
    assert_eq!(logs[1].method, "transfer");
}

#[tokio::test]
async fn test_corrupt_file_store_recovers_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gate-store.json");
    std::fs::write(&path, "garbage, not a document").unwrap();

    let kv: Arc<dyn KeyValueStore> = Arc::new(FileKv::open(&path, None).unwrap());
    let store = make_store(kv);
    assert!(store.load().await.is_empty());

    // And the store is usable again immediately
    store.append(make_log("transfer")).await.unwrap();
    assert_eq!(store.load().await.len(), 1);
}

#[tokio::test]
async fn test_foreign_writer_propagates_via_change_channel() {
    let kv = Arc::new(MemoryKv::new());
    let writer_store = Arc::new(make_store(kv.clone()));
    let observer_store = Arc::new(make_store(kv.clone()));
    writer_store.load().await;
    observer_store.load().await;

    let _sync = observer_store.spawn_sync();
    writer_store.append(make_log("transfer")).await.unwrap();

    let mut synced = false;
    for _ in 0..100 {
        if observer_store.logs().len() == 1 {
            synced = true;
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    }
    assert!(synced, "observer must reload after a foreign write");

    // Clearing in the writer empties the observer too
    writer_store.clear().await.unwrap();
    for _ in 0..100 {
        if observer_store.logs().is_empty() {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    }
    panic!("observer must observe the foreign clear");
}
