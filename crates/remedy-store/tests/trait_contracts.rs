//! Contract tests shared by every `ObjectStore` backend.

use std::sync::Arc;
use std::time::Duration;

use remedy_store::fakes::{MemoryObjectStore, UnavailableObjectStore};
use remedy_store::{FsObjectStore, ObjectStore, StoreError};

async fn assert_put_then_locate(store: Arc<dyn ObjectStore>) {
    store
        .put(
            "results",
            "demo/main/1700000000_results.json",
            br#"{"file_analysis":[]}"#.to_vec(),
            "application/json",
        )
        .await
        .expect("put");

    let url = store
        .presigned_get(
            "results",
            "demo/main/1700000000_results.json",
            Duration::from_secs(3600),
        )
        .await
        .expect("presign");
    assert!(url.contains("demo/main/1700000000_results.json"));
}

async fn assert_missing_is_not_found(store: Arc<dyn ObjectStore>) {
    let err = store
        .presigned_get("results", "nope.json", Duration::from_secs(1))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }), "got {err:?}");
}

async fn assert_rejects_escape(store: Arc<dyn ObjectStore>) {
    let err = store
        .put("results", "../outside.json", Vec::new(), "application/json")
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidKey { .. }), "got {err:?}");
}

#[tokio::test]
async fn memory_store_satisfies_contract() {
    let store: Arc<dyn ObjectStore> = Arc::new(MemoryObjectStore::new());
    assert_put_then_locate(Arc::clone(&store)).await;
    assert_missing_is_not_found(Arc::clone(&store)).await;
    assert_rejects_escape(store).await;
}

#[tokio::test]
async fn fs_store_satisfies_contract() {
    let dir = tempfile::tempdir().unwrap();
    let store: Arc<dyn ObjectStore> = Arc::new(FsObjectStore::new(dir.path()).unwrap());
    assert_put_then_locate(Arc::clone(&store)).await;
    assert_missing_is_not_found(Arc::clone(&store)).await;
    assert_rejects_escape(store).await;
}

#[tokio::test]
async fn memory_store_records_content_type() {
    let store = MemoryObjectStore::new();
    store
        .put("archives", "r/b/x.zip", vec![0x50, 0x4b], "application/zip")
        .await
        .unwrap();

    let object = store.object("archives", "r/b/x.zip").expect("stored");
    assert_eq!(object.content_type, "application/zip");
    assert_eq!(store.keys("archives"), vec!["r/b/x.zip".to_string()]);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn unavailable_store_fails_every_call() {
    let store = UnavailableObjectStore::new("bucket offline");
    let put = store.put("b", "k", Vec::new(), "text/plain").await;
    assert!(matches!(put, Err(StoreError::Backend(ref m)) if m == "bucket offline"));
    assert!(store
        .presigned_get("b", "k", Duration::from_secs(1))
        .await
        .is_err());
}
