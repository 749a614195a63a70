#![allow(clippy::unwrap_used)]

mod common;

use std::time::Duration;

use farmsync_core::{
    Farm, FarmRepository, RecordStore, RefreshError, RepositoryOptions, StoredFarm, WriteMode,
};
use futures_util::StreamExt;
use pretty_assertions::assert_eq;
use tokio_util::sync::CancellationToken;

use common::{BrokenStore, ScriptedRemote, dto, memory_store, names, t1};

#[tokio::test]
async fn scenario_a_single_record_is_translated() {
    let remote = ScriptedRemote::ok(vec![dto(1, "Ridge Farm")]);
    let repo = FarmRepository::new(remote, memory_store());
    let mut records = repo.records();

    let report = repo.refresh().await.unwrap();
    assert_eq!(report.fetched, 1);

    let farms = records.changed().await.unwrap();
    assert_eq!(
        farms,
        vec![Farm {
            id: 1,
            name: "Ridge Farm".into(),
            licensed_area: Some(12.5),
            updated_at: t1(),
        }]
    );
}

#[tokio::test]
async fn scenario_b_records_are_sorted_by_name() {
    let remote = ScriptedRemote::ok(vec![dto(1, "B Farm"), dto(2, "A Farm")]);
    let repo = FarmRepository::new(remote, memory_store());

    repo.refresh().await.unwrap();

    assert_eq!(names(&repo.records().current()), vec!["A Farm", "B Farm"]);
}

#[tokio::test]
async fn scenario_d_upsert_keeps_previously_stored_ids() {
    let store = memory_store();
    store
        .replace_all(vec![StoredFarm::from(dto(1, "Old Farm"))])
        .await
        .unwrap();
    let repo = FarmRepository::new(ScriptedRemote::ok(vec![dto(2, "New Farm")]), store);

    repo.refresh().await.unwrap();

    let ids: Vec<i64> = repo.snapshot().iter().map(|f| f.id).collect();
    assert_eq!(ids, vec![2, 1]);
}

#[tokio::test]
async fn mirror_mode_prunes_ids_the_server_dropped() {
    let store = memory_store();
    store
        .replace_all(vec![StoredFarm::from(dto(1, "Old Farm"))])
        .await
        .unwrap();
    let options = RepositoryOptions {
        write_mode: WriteMode::Mirror,
        ..RepositoryOptions::default()
    };
    let repo = FarmRepository::with_options(
        ScriptedRemote::ok(vec![dto(2, "New Farm")]),
        store,
        options,
    );

    repo.refresh().await.unwrap();

    assert_eq!(names(&repo.snapshot()), vec!["New Farm"]);
}

#[tokio::test]
async fn refresh_is_idempotent() {
    let store = memory_store();
    let repo = FarmRepository::new(
        ScriptedRemote::ok(vec![dto(3, "Creek"), dto(4, "Ridge")]),
        store.clone(),
    );

    repo.refresh().await.unwrap();
    let first = repo.snapshot();
    repo.refresh().await.unwrap();

    assert_eq!(repo.snapshot(), first);
    assert_eq!(store.write_count(), 2);
}

#[tokio::test]
async fn failed_fetch_never_writes() {
    let store = memory_store();
    let remote = ScriptedRemote::new(vec![
        Ok(vec![dto(1, "Ridge Farm")]),
        Err("timeout".into()),
    ]);
    let repo = FarmRepository::new(remote, store.clone());

    repo.refresh().await.unwrap();
    let before = repo.snapshot();

    let err = repo.refresh().await.unwrap_err();
    assert!(err.is_network());
    assert_eq!(err.to_string(), "timeout");
    assert_eq!(repo.snapshot(), before);
    assert_eq!(store.write_count(), 1);
}

#[tokio::test]
async fn storage_failure_is_reported() {
    let repo = FarmRepository::new(ScriptedRemote::ok(vec![dto(1, "A")]), BrokenStore::new());

    let err = repo.refresh().await.unwrap_err();
    assert!(err.is_storage());
    assert_eq!(err.to_string(), "storage connection lock poisoned");
}

#[tokio::test]
async fn last_refresh_is_set_only_on_success() {
    let remote = ScriptedRemote::new(vec![Err("offline".into()), Ok(vec![dto(1, "A")])]);
    let repo = FarmRepository::new(remote, memory_store());
    let last = repo.last_refresh();

    repo.refresh().await.unwrap_err();
    assert!(last.borrow().is_none());

    let report = repo.refresh().await.unwrap();
    assert_eq!(*last.borrow(), Some(report.completed_at));
}

#[tokio::test(start_paused = true)]
async fn overlapping_refreshes_share_one_fetch() {
    let remote = ScriptedRemote::delayed(vec![dto(1, "A")], Duration::from_millis(200));
    let repo = FarmRepository::new(remote.clone(), memory_store());

    let (a, b) = tokio::join!(repo.refresh(), repo.refresh());

    assert_eq!(a.unwrap(), b.unwrap());
    assert_eq!(remote.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn overlapping_refreshes_run_twice_without_single_flight() {
    let remote = ScriptedRemote::delayed(vec![dto(1, "A")], Duration::from_millis(200));
    let options = RepositoryOptions {
        single_flight: false,
        ..RepositoryOptions::default()
    };
    let repo = FarmRepository::with_options(remote.clone(), memory_store(), options);

    let (a, b) = tokio::join!(repo.refresh(), repo.refresh());

    assert!(a.is_ok() && b.is_ok());
    assert_eq!(remote.calls(), 2);
}

#[tokio::test]
async fn sequential_refreshes_each_fetch() {
    let remote = ScriptedRemote::ok(vec![dto(1, "A")]);
    let repo = FarmRepository::new(remote.clone(), memory_store());

    repo.refresh().await.unwrap();
    repo.refresh().await.unwrap();

    assert_eq!(remote.calls(), 2);
}

#[tokio::test]
async fn cancelled_before_start_does_nothing() {
    let remote = ScriptedRemote::ok(vec![dto(1, "A")]);
    let store = memory_store();
    let repo = FarmRepository::new(remote.clone(), store.clone());

    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = repo.refresh_with_cancel(&cancel).await.unwrap_err();

    assert!(matches!(err, RefreshError::Cancelled));
    assert_eq!(remote.calls(), 0);
    assert_eq!(store.write_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn cancel_during_fetch_skips_the_write() {
    let remote = ScriptedRemote::delayed(vec![dto(1, "A")], Duration::from_secs(60));
    let store = memory_store();
    let repo = FarmRepository::new(remote.clone(), store.clone());

    let cancel = CancellationToken::new();
    let task = {
        let repo = repo.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { repo.refresh_with_cancel(&cancel).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    cancel.cancel();

    let result = task.await.unwrap();
    assert!(matches!(result, Err(RefreshError::Cancelled)));
    assert_eq!(store.write_count(), 0);

    // A cancelled cycle is not handed to the next caller.
    repo.refresh().await.unwrap();
    assert_eq!(remote.calls(), 2);
    assert_eq!(store.write_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn periodic_refresh_ticks_until_cancelled() {
    let remote = ScriptedRemote::ok(vec![dto(1, "A")]);
    let repo = FarmRepository::new(remote.clone(), memory_store());
    let cancel = CancellationToken::new();

    let handle = repo.spawn_periodic_refresh(Duration::from_secs(10), cancel.clone());
    tokio::time::sleep(Duration::from_secs(25)).await;
    cancel.cancel();
    handle.await.unwrap();

    let calls = remote.calls();
    assert_eq!(calls, 2);
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(remote.calls(), calls);
}

#[tokio::test]
async fn record_stream_adapts_to_futures_stream() {
    let repo = FarmRepository::new(ScriptedRemote::ok(vec![dto(1, "A")]), memory_store());
    let mut stream = repo.records().into_stream();

    assert!(stream.next().await.unwrap().is_empty());
    repo.refresh().await.unwrap();
    assert_eq!(names(&stream.next().await.unwrap()), vec!["A"]);
}
