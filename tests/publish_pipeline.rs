use std::fs::{create_dir_all, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::tempdir;

use treelink::config::Limits;
use treelink::contract::{BatchReceipt, MockAssetStore, MockNoteSink, UploadBlob};
use treelink::publish::{PublishError, PublishStatus, Publisher};
use treelink::validate::{PathValidator, ValidationError};

fn write_file(path: &PathBuf, content: &[u8]) {
    let mut f = File::create(path).expect("create fixture file");
    f.write_all(content).expect("write fixture file");
}

fn accept_all(blobs: &[UploadBlob]) -> BatchReceipt {
    BatchReceipt {
        urls: blobs
            .iter()
            .map(|b| (b.name.clone(), format!("/assets/{}", b.name)))
            .collect(),
    }
}

#[tokio::test]
async fn full_pipeline_uploads_inserts_and_reports_complete() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("project");
    create_dir_all(root.join("docs")).unwrap();
    write_file(&root.join("readme.txt"), b"hello");
    write_file(&root.join("docs/guide.md"), b"guide");

    let mut store = MockAssetStore::new();
    store
        .expect_upload_batch()
        .times(1)
        .returning(|_, blobs| Ok(accept_all(&blobs)));

    let mut sink = MockNoteSink::new();
    sink.expect_insert_after()
        .withf(|anchor, markup| {
            anchor == "anchor-1"
                && markup.starts_with("- 📁 **project**\n")
                && markup.contains("[readme.txt](/assets/readme.txt)")
                && markup.contains("[guide.md](/assets/guide.md)")
        })
        .times(1)
        .returning(|_, _| Ok(()));

    let publisher = Publisher::new(
        Limits::default(),
        PathValidator::new(None),
        "folder-1",
        store,
        sink,
    );
    let report = publisher
        .run(&root, "anchor-1")
        .await
        .expect("pipeline should succeed");

    match report.status {
        PublishStatus::Complete { uploaded, .. } => assert_eq!(uploaded, 2),
        other => panic!("expected Complete, got {other:?}"),
    }
    assert!(report.failed_paths.is_empty());
    assert!(report.markup.contains("  - 📁 **docs**"));
}

#[tokio::test]
async fn rejected_files_render_unlinked_and_report_partial() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("project");
    create_dir_all(&root).unwrap();
    write_file(&root.join("good.txt"), b"g");
    write_file(&root.join("bad.txt"), b"b");

    let mut store = MockAssetStore::new();
    store.expect_upload_batch().times(1).returning(|_, blobs| {
        Ok(BatchReceipt {
            urls: blobs
                .iter()
                .filter(|b| b.name != "bad.txt")
                .map(|b| (b.name.clone(), format!("/assets/{}", b.name)))
                .collect(),
        })
    });
    let mut sink = MockNoteSink::new();
    sink.expect_insert_after().times(1).returning(|_, _| Ok(()));

    let publisher = Publisher::new(
        Limits::default(),
        PathValidator::new(None),
        "folder-1",
        store,
        sink,
    );
    let report = publisher.run(&root, "anchor-1").await.unwrap();

    match report.status {
        PublishStatus::Partial {
            uploaded,
            total,
            failed,
            ..
        } => {
            assert_eq!(uploaded, 1);
            assert_eq!(total, 2);
            assert_eq!(failed, 1);
        }
        other => panic!("expected Partial, got {other:?}"),
    }
    assert_eq!(report.failed_paths, vec![root.join("bad.txt")]);
    assert!(report.markup.contains("- `bad.txt`"));
    assert!(report.markup.contains("[good.txt](/assets/good.txt)"));
}

#[tokio::test]
async fn invalid_root_fails_before_any_scanning() {
    let store = MockAssetStore::new();
    let sink = MockNoteSink::new();
    let publisher = Publisher::new(
        Limits::default(),
        PathValidator::new(None),
        "folder-1",
        store,
        sink,
    );

    let err = publisher
        .run(Path::new("../somewhere"), "anchor-1")
        .await
        .expect_err("traversal token must be fatal");
    let PublishError::Validation(reason) = err;
    assert_eq!(reason, ValidationError::TraversalToken);
}

#[tokio::test]
async fn protected_root_ancestor_is_rejected() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("outer");
    create_dir_all(root.join("vault")).unwrap();

    let store = MockAssetStore::new();
    let sink = MockNoteSink::new();
    let publisher = Publisher::new(
        Limits::default(),
        PathValidator::new(Some(root.join("vault"))),
        "folder-1",
        store,
        sink,
    );

    let err = publisher.run(&root, "anchor-1").await.unwrap_err();
    let PublishError::Validation(reason) = err;
    assert_eq!(reason, ValidationError::AncestorOfProtectedRoot);
}

#[tokio::test]
async fn insertion_failure_is_absorbed_not_surfaced() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("project");
    create_dir_all(&root).unwrap();
    write_file(&root.join("a.txt"), b"a");

    let mut store = MockAssetStore::new();
    store
        .expect_upload_batch()
        .times(1)
        .returning(|_, blobs| Ok(accept_all(&blobs)));
    let mut sink = MockNoteSink::new();
    sink.expect_insert_after()
        .times(1)
        .returning(|_, _| Err("sink offline".into()));

    let publisher = Publisher::new(
        Limits::default(),
        PathValidator::new(None),
        "folder-1",
        store,
        sink,
    );
    let report = publisher
        .run(&root, "anchor-1")
        .await
        .expect("insertion failure never fails the pipeline");
    assert!(matches!(report.status, PublishStatus::Complete { .. }));
}

#[tokio::test]
async fn empty_folder_reports_without_touching_the_transports() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("empty");
    create_dir_all(&root).unwrap();

    // No expectations: any transport call would panic the test.
    let store = MockAssetStore::new();
    let sink = MockNoteSink::new();
    let publisher = Publisher::new(
        Limits::default(),
        PathValidator::new(None),
        "folder-1",
        store,
        sink,
    );

    let report = publisher.run(&root, "anchor-1").await.unwrap();
    assert_eq!(report.status, PublishStatus::EmptyFolder);
    assert!(report.failed_paths.is_empty());
    assert_eq!(report.markup, "- 📁 **empty**\n");
}

#[tokio::test]
async fn cancelled_before_start_yields_partial_work_without_error() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("project");
    create_dir_all(&root).unwrap();
    write_file(&root.join("a.txt"), b"a");

    let cancel_slot: std::sync::Arc<std::sync::Mutex<Option<treelink::cancel::CancelFlag>>> =
        std::sync::Arc::new(std::sync::Mutex::new(None));
    let slot = cancel_slot.clone();

    let mut store = MockAssetStore::new();
    // The flag is set while the first (and only) batch uploads, so the
    // operation completes this batch and reports only finished work.
    store.expect_upload_batch().times(1).returning(move |_, blobs| {
        if let Some(flag) = slot.lock().unwrap().as_ref() {
            flag.cancel();
        }
        Ok(accept_all(&blobs))
    });
    let mut sink = MockNoteSink::new();
    sink.expect_insert_after().times(1).returning(|_, _| Ok(()));

    let publisher = Publisher::new(
        Limits::default(),
        PathValidator::new(None),
        "folder-1",
        store,
        sink,
    );
    *cancel_slot.lock().unwrap() = Some(publisher.cancel_flag());

    let report = publisher
        .run(&root, "anchor-1")
        .await
        .expect("cancellation never raises");
    assert!(matches!(report.status, PublishStatus::Complete { .. }));
}
