use filestore_core::{FileStorage, SearchQuery, StorageError, StorageService};
use std::fs;

#[tokio::test]
async fn handle_round_trips_every_operation() {
    let temp = tempfile::tempdir().unwrap();
    let src = temp.path().join("report.txt");
    fs::write(&src, "quarterly numbers").unwrap();
    let store = FileStorage::open(temp.path().join("storage"), "file_index.json").unwrap();
    let handle = StorageService::spawn(store);

    let dest = handle
        .store(&src, None, vec!["demo".to_string()])
        .await
        .unwrap();
    assert!(dest.ends_with("report.txt"));

    let again = handle
        .store(&src, Some("report.txt".to_string()), vec!["secondary".to_string()])
        .await
        .unwrap();
    assert!(again.ends_with("report_1.txt"));

    let hits = handle
        .search_files(SearchQuery::new().with_tags(["demo"]))
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);

    assert_eq!(
        handle.load_file_content("report_1.txt").await.unwrap(),
        b"quarterly numbers"
    );
    assert!(handle.add_tags("report.txt", vec!["final".to_string()]).await.unwrap());
    assert_eq!(
        handle.get_all_tags().await.unwrap(),
        vec!["demo", "final", "secondary"]
    );
    assert!(handle.get_record("report.txt").await.unwrap().is_some());
    assert!(handle.delete("report.txt").await.unwrap());
    assert!(handle.get_file_path("report.txt").await.unwrap().is_none());
    assert_eq!(handle.list_all_files().await.unwrap().len(), 1);
    assert!(handle.audit().await.unwrap().is_clean());

    let err = handle
        .store(temp.path().join("missing.txt"), None, vec![])
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::SourceNotFound(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_taggers_lose_no_update() {
    let temp = tempfile::tempdir().unwrap();
    let src = temp.path().join("shared.txt");
    fs::write(&src, "shared").unwrap();
    let store = FileStorage::open(temp.path().join("storage"), "file_index.json").unwrap();
    let handle = StorageService::spawn(store);
    handle.store(&src, None, vec![]).await.unwrap();

    let mut tasks = Vec::new();
    for i in 0..16 {
        let h = handle.clone();
        tasks.push(tokio::spawn(async move {
            h.add_tags("shared.txt", vec![format!("tag-{i:02}")]).await.unwrap()
        }));
    }
    for t in tasks {
        assert!(t.await.unwrap());
    }

    assert_eq!(handle.get_all_tags().await.unwrap().len(), 16);
    drop(handle);

    // The index on disk carries every tag too.
    let reopened = FileStorage::open(temp.path().join("storage"), "file_index.json").unwrap();
    assert_eq!(reopened.get_record("shared.txt").unwrap().tags.len(), 16);
}
