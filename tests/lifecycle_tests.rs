//! End-to-end lifecycle tests over in-process adapters
//!
//! Upload, lookup, rename and expiration driven through the public use
//! cases with a manual clock.

mod test_fixtures;

use std::collections::HashSet;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use filekeeper::application::errors::{DownloadError, LookupError, RenameError, UploadError};
use filekeeper::application::expiration::{ExpirationOutcome, SweepRun, SweeperPhase};
use filekeeper::application::ports::FileRepository;
use filekeeper::domain::value_objects::{DisplayName, FileId, FileState};
use test_fixtures::*;

#[tokio::test]
async fn test_upload_then_cold_lookup_returns_record_with_blob() {
    let env = TestEnvironment::new();

    let record = env.upload("u1", "a.png", b"png bytes").await.unwrap();

    assert!(!env
        .cache
        .contains_key(&format!("file_metadata:{}", record.id())));
    let dto = env.get(record.id()).await.expect("uploaded file should be found");
    assert_eq!(dto.display_name, "a.png");
    assert_eq!(dto.state, FileState::Active);
    assert!(dto.storage_key.starts_with("uploads/"));
    assert_eq!(dto.public_url, format!("https://files.test/{}", dto.storage_key));
    assert!(env.blob_store.contains(&dto.storage_key));
    assert_eq!(env.download(record.id()).await.unwrap(), b"png bytes");
}

#[tokio::test]
async fn test_blob_write_failure_creates_no_record() {
    let env = TestEnvironment::new();
    env.blob_store.fail_puts(true);

    let result = env.upload("u1", "a.png", b"data").await;

    assert!(matches!(result, Err(UploadError::StorageWriteFailed(_))));
    assert!(env.file_repo.inner.is_empty());
    assert!(env.blob_store.inner.is_empty());
    assert!(env.listing("u1").await.is_empty());
}

#[tokio::test]
async fn test_metadata_failure_removes_blob_before_returning() {
    let env = TestEnvironment::new();
    env.file_repo.fail_inserts(true);

    let result = env.upload("u1", "a.png", b"data").await;

    assert!(matches!(result, Err(UploadError::MetadataWriteFailed(_))));
    assert!(env.blob_store.inner.is_empty());
    assert_eq!(env.blob_store.delete_calls.load(Ordering::SeqCst), 1);
    assert!(env.listing("u1").await.is_empty());
}

#[tokio::test]
async fn test_payload_limit_is_inclusive() {
    let env = TestEnvironment::new();
    let at_limit = vec![7u8; UPLOAD_LIMIT as usize];
    let over_limit = vec![7u8; UPLOAD_LIMIT as usize + 1];

    assert!(env.upload("u1", "exact.bin", &at_limit).await.is_ok());

    let result = env.upload("u1", "over.bin", &over_limit).await;
    assert!(matches!(
        result,
        Err(UploadError::PayloadTooLarge { limit }) if limit == UPLOAD_LIMIT
    ));
    assert_eq!(env.blob_store.inner.len(), 1);
    assert_eq!(env.file_repo.inner.len(), 1);
}

#[tokio::test]
async fn test_invalid_upload_request_is_rejected() {
    let env = TestEnvironment::new();

    let result = env.upload("u1", "../etc/passwd", b"x").await;
    assert!(matches!(result, Err(UploadError::InvalidRequest(_))));

    let result = env.upload("", "a.png", b"x").await;
    assert!(matches!(result, Err(UploadError::InvalidRequest(_))));

    assert!(env.blob_store.inner.is_empty());
}

#[tokio::test]
async fn test_upload_publishes_notification() {
    let env = TestEnvironment::new();
    let mut events = env.app.notifier.subscribe();

    let record = env.upload("u1", "a.png", b"data").await.unwrap();

    let event = events.recv().await.unwrap();
    assert_eq!(event.file_id, record.id());
    assert_eq!(event.owner_id.as_str(), "u1");
    assert_eq!(event.display_name, "a.png");
    assert_eq!(event.storage_key, record.storage_key());
}

#[tokio::test]
async fn test_upload_invalidates_stale_listing_and_search() {
    let env = TestEnvironment::new();
    env.upload("u1", "first.txt", b"1").await.unwrap();

    // Warm both caches
    assert_eq!(env.listing("u1").await.len(), 1);
    assert_eq!(env.search("txt").await.len(), 1);

    env.upload("u1", "second.txt", b"2").await.unwrap();

    let listing = env.listing("u1").await;
    let names: Vec<_> = listing.iter().map(|f| f.display_name.as_str()).collect();
    assert_eq!(names, vec!["second.txt", "first.txt"]);
    assert_eq!(env.search("txt").await.len(), 2);
}

#[tokio::test]
async fn test_cache_hit_returns_stored_payload_unchanged() {
    let env = TestEnvironment::new();
    let record = env.upload("u1", "a.png", b"data").await.unwrap();

    let first = env.app.lookup.get_by_id(record.id()).await.unwrap();
    let second = env.app.lookup.get_by_id(record.id()).await.unwrap();

    assert_eq!(first.as_str(), second.as_str());
    assert!(env
        .cache
        .contains_key(&format!("file_metadata:{}", record.id())));
}

#[tokio::test]
async fn test_lookup_of_unknown_id_is_not_found_and_not_cached() {
    let env = TestEnvironment::new();

    let result = env.app.lookup.get_by_id(FileId::new(404)).await;

    assert!(matches!(result, Err(LookupError::NotFound(id)) if id == FileId::new(404)));
    assert!(env.cache.is_empty());
}

#[tokio::test]
async fn test_search_is_case_insensitive_and_literal() {
    let env = TestEnvironment::new();
    env.upload("u1", "Holiday Photo.PNG", b"1").await.unwrap();
    env.upload("u2", "100% done.txt", b"2").await.unwrap();
    env.upload("u2", "1000 done.txt", b"3").await.unwrap();

    let hits = env.search("  holiday ").await;
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].display_name, "Holiday Photo.PNG");

    let hits = env.search("100%").await;
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].display_name, "100% done.txt");

    assert!(env.search("no such file").await.is_empty());

    let blank = env.app.lookup.search("   ").await;
    assert!(matches!(blank, Err(LookupError::InvalidRequest(_))));
}

#[tokio::test]
async fn test_shareable_url_uses_public_base() {
    let env = TestEnvironment::new();
    let record = env.upload("u1", "a.png", b"data").await.unwrap();

    let url = env.app.lookup.shareable_url(record.id()).await.unwrap();

    assert_eq!(url, format!("https://files.test/{}", record.storage_key()));
}

#[tokio::test]
async fn test_rename_is_visible_through_warm_caches() {
    let env = TestEnvironment::new();
    let record = env.upload("u1", "draft.txt", b"data").await.unwrap();

    // Warm record, listing and search caches with the old name
    assert_eq!(env.get(record.id()).await.unwrap().display_name, "draft.txt");
    assert_eq!(env.listing("u1").await[0].display_name, "draft.txt");
    assert_eq!(env.search("draft").await.len(), 1);

    let renamed = env.app.rename.execute(record.id(), "final.txt").await.unwrap();
    assert_eq!(renamed.display_name().as_str(), "final.txt");

    assert_eq!(env.get(record.id()).await.unwrap().display_name, "final.txt");
    assert_eq!(env.listing("u1").await[0].display_name, "final.txt");
    assert!(env.search("draft").await.is_empty());
    assert_eq!(env.search("final").await.len(), 1);
}

#[tokio::test]
async fn test_rename_rejects_bad_names_and_missing_files() {
    let env = TestEnvironment::new();
    let record = env.upload("u1", "a.txt", b"data").await.unwrap();

    let result = env.app.rename.execute(record.id(), "a/b.txt").await;
    assert!(matches!(result, Err(RenameError::InvalidRequest(_))));

    let result = env.app.rename.execute(FileId::new(999), "b.txt").await;
    assert!(matches!(result, Err(RenameError::NotFound(_))));
}

#[tokio::test]
async fn test_upload_then_expire_scenario() {
    let env = TestEnvironment::new();
    let record = env.upload("u1", "a.png", b"png").await.unwrap();

    assert_eq!(env.get(record.id()).await.unwrap().state, FileState::Active);
    assert_eq!(env.listing("u1").await.len(), 1);
    assert_eq!(env.download(record.id()).await.unwrap(), b"png");

    // Still within retention: nothing happens
    env.clock.advance(Duration::from_secs(60));
    let run = env.app.sweeper.sweep_once().await;
    assert_eq!(run.result().unwrap().candidates, 0);

    env.expire_everything();
    let run = env.app.sweeper.sweep_once().await;
    let result = run.result().unwrap();
    assert_eq!(result.candidates, 1);
    assert_eq!(result.deleted, 1);
    assert!(result.is_success());

    assert!(!env.blob_store.contains(record.storage_key()));
    assert!(env.file_repo.row(record.id()).is_none());
    assert!(matches!(
        env.app.lookup.get_by_id(record.id()).await,
        Err(LookupError::NotFound(_))
    ));
    assert!(env.listing("u1").await.is_empty());
    assert!(env.search("a.png").await.is_empty());
    assert!(matches!(
        env.download(record.id()).await,
        Err(DownloadError::NotFound(_))
    ));
    assert_eq!(env.app.sweeper.phase(), SweeperPhase::Idle);
}

#[tokio::test]
async fn test_download_of_expiring_file_is_not_found() {
    let env = TestEnvironment::new();
    let record = env.upload("u1", "a.png", b"png").await.unwrap();

    env.file_repo
        .update_state(record.id(), FileState::Deleting)
        .await
        .unwrap();

    assert!(env.blob_store.contains(record.storage_key()));
    assert!(matches!(
        env.download(record.id()).await,
        Err(DownloadError::NotFound(_))
    ));
    assert!(matches!(
        env.download(FileId::new(999)).await,
        Err(DownloadError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_expiring_record_twice_is_a_noop() {
    let env = TestEnvironment::new();
    let record = env.upload("u1", "a.png", b"png").await.unwrap();
    let other = env.upload("u1", "b.png", b"png").await.unwrap();

    let first = env.app.sweeper.expire_record(&record).await;
    assert_eq!(first, ExpirationOutcome::Deleted);
    let deletes_after_first = env.blob_store.delete_calls.load(Ordering::SeqCst);

    let second = env.app.sweeper.expire_record(&record).await;
    assert_eq!(second, ExpirationOutcome::AlreadyGone);

    assert_eq!(
        env.blob_store.delete_calls.load(Ordering::SeqCst),
        deletes_after_first
    );
    assert!(env.file_repo.row(other.id()).is_some());
    assert!(env.blob_store.contains(other.storage_key()));
}

#[tokio::test]
async fn test_blob_delete_failure_leaves_record_deleting_until_retry() {
    let env = TestEnvironment::new();
    let record = env.upload("u1", "a.png", b"png").await.unwrap();
    env.expire_everything();

    env.blob_store.fail_deletes(true);
    let run = env.app.sweeper.sweep_once().await;
    let result = run.result().unwrap();
    assert_eq!(result.left_deleting, 1);
    assert_eq!(result.errors.len(), 1);

    let row = env.file_repo.row(record.id()).unwrap();
    assert_eq!(row.state(), FileState::Deleting);
    assert!(env.blob_store.contains(record.storage_key()));
    // Deleting records are no longer served
    assert!(env.get(record.id()).await.is_none());
    assert!(env.listing("u1").await.is_empty());

    env.blob_store.fail_deletes(false);
    let run = env.app.sweeper.sweep_once().await;
    assert_eq!(run.result().unwrap().deleted, 1);
    assert!(env.file_repo.row(record.id()).is_none());
    assert!(!env.blob_store.contains(record.storage_key()));
}

#[tokio::test]
async fn test_malformed_storage_key_is_skipped_without_aborting_batch() {
    let env = TestEnvironment::new();
    env.file_repo
        .inner
        .seed(legacy_record(1, "u1", "/uploads/../etc/passwd", start_time()));
    let good = env.upload("u1", "good.txt", b"ok").await.unwrap();
    env.expire_everything();

    let run = env.app.sweeper.sweep_once().await;
    let result = run.result().unwrap();

    assert_eq!(result.candidates, 1);
    assert_eq!(result.skipped_malformed, 1);
    assert_eq!(result.deleted, 1);
    assert!(env.file_repo.row(FileId::new(1)).is_some());
    assert!(env.file_repo.row(good.id()).is_none());
}

#[tokio::test]
async fn test_malformed_rows_never_starve_the_batch() {
    let mut config = test_config();
    config.sweep_batch_size = 2;
    let env = TestEnvironment::with_config(config);

    // Oldest rows, enough to fill a whole batch on their own
    env.file_repo
        .inner
        .seed(legacy_record(1, "u1", "", start_time()));
    env.file_repo
        .inner
        .seed(legacy_record(2, "u1", "/bad/../key", start_time()));
    let good = env.upload("u1", "good.txt", b"ok").await.unwrap();
    env.expire_everything();

    let run = env.app.sweeper.sweep_once().await;
    let result = run.result().unwrap();
    assert_eq!(result.skipped_malformed, 2);
    assert_eq!(result.candidates, 1);
    assert_eq!(result.deleted, 1);
    assert!(env.file_repo.row(good.id()).is_none());
    assert!(!env.blob_store.contains(good.storage_key()));

    // Later passes keep skipping the same rows without failing
    let run = env.app.sweeper.sweep_once().await;
    let result = run.result().unwrap();
    assert_eq!(result.skipped_malformed, 2);
    assert_eq!(result.candidates, 0);
    assert!(result.is_success());
    assert_eq!(env.file_repo.inner.len(), 2);
}

#[tokio::test]
async fn test_sweep_respects_batch_size() {
    let mut config = test_config();
    config.sweep_batch_size = 2;
    let env = TestEnvironment::with_config(config);

    for i in 0..5 {
        env.upload("u1", &format!("f{}.txt", i), b"x").await.unwrap();
    }
    env.expire_everything();

    let run = env.app.sweeper.sweep_once().await;
    assert_eq!(run.result().unwrap().deleted, 2);
    assert_eq!(env.file_repo.inner.len(), 3);

    // Oldest first
    assert!(env.file_repo.row(FileId::new(1)).is_none());
    assert!(env.file_repo.row(FileId::new(2)).is_none());
    assert!(env.file_repo.row(FileId::new(3)).is_some());
}

#[tokio::test]
async fn test_overlapping_sweep_is_skipped() {
    let env = TestEnvironment::new();
    env.upload("u1", "a.png", b"png").await.unwrap();
    env.expire_everything();

    let gate = env.blob_store.hold_deletes();
    let sweeper = Arc::clone(&env.app.sweeper);
    let first = tokio::spawn(async move { sweeper.sweep_once().await });

    for _ in 0..1000 {
        if env.blob_store.delete_calls.load(Ordering::SeqCst) > 0 {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert_eq!(env.app.sweeper.phase(), SweeperPhase::Deleting);

    let second = env.app.sweeper.sweep_once().await;
    assert_eq!(second, SweepRun::SkippedInFlight);

    gate.add_permits(10);
    let first = first.await.unwrap();
    assert_eq!(first.result().unwrap().deleted, 1);
    assert_eq!(env.app.sweeper.phase(), SweeperPhase::Idle);
}

#[tokio::test]
async fn test_concurrent_uploads_with_same_name_do_not_collide() {
    let env = TestEnvironment::new();

    let (a, b) = tokio::join!(
        env.upload("u1", "same.txt", b"first"),
        env.upload("u1", "same.txt", b"second")
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_ne!(a.id(), b.id());
    assert_ne!(a.storage_key(), b.storage_key());
    assert_eq!(env.blob_store.inner.get(a.storage_key()).unwrap().as_ref(), b"first");
    assert_eq!(env.blob_store.inner.get(b.storage_key()).unwrap().as_ref(), b"second");
    assert_eq!(env.listing("u1").await.len(), 2);
}

#[tokio::test]
async fn test_many_concurrent_uploads_get_distinct_keys() {
    let env = Arc::new(TestEnvironment::new());

    let handles: Vec<_> = (0..20)
        .map(|i| {
            let env = Arc::clone(&env);
            tokio::spawn(async move { env.upload("u1", "same.txt", &[i as u8]).await })
        })
        .collect();

    let mut keys = HashSet::new();
    for handle in handles {
        let record = handle.await.unwrap().unwrap();
        assert!(keys.insert(record.storage_key().to_string()));
    }
    assert_eq!(env.file_repo.inner.len(), 20);
}

#[tokio::test]
async fn test_sweep_overlapping_rename_never_resurrects() {
    let env = TestEnvironment::new();
    let record = env.upload("u1", "old.txt", b"data").await.unwrap();
    env.expire_everything();

    let (run, renamed) = tokio::join!(
        env.app.sweeper.sweep_once(),
        env.app.rename.execute(record.id(), "new.txt")
    );
    assert!(run.result().is_some());

    match env.file_repo.row(record.id()) {
        None => {
            assert!(!env.blob_store.contains(record.storage_key()));
            assert!(env.get(record.id()).await.is_none());
            assert!(env.listing("u1").await.is_empty());
        }
        Some(row) => {
            // Only reachable if the rename won and the sweep saw nothing
            assert_eq!(row.state(), FileState::Active);
            assert_eq!(row.display_name().as_str(), "new.txt");
            assert!(renamed.is_ok());
        }
    }

    if let Err(e) = renamed {
        assert!(matches!(e, RenameError::NotFound(_)));
    }
}

#[tokio::test]
async fn test_cached_record_is_stale_for_at_most_its_ttl() {
    let env = TestEnvironment::new();
    let record = env.upload("u1", "a.png", b"png").await.unwrap();
    env.get(record.id()).await.unwrap();

    // A write that skips invalidation is only hidden until the entry ages out
    env.file_repo
        .inner
        .rename(record.id(), &DisplayName::new("b.png").unwrap())
        .await
        .unwrap();
    assert_eq!(env.get(record.id()).await.unwrap().display_name, "a.png");

    env.clock.advance(Duration::from_secs(301));

    assert_eq!(env.get(record.id()).await.unwrap().display_name, "b.png");
}
