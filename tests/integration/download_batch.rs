//! End-to-end batch downloads against the mock catalog

use catalog_data_downloader::client::ClientError;
use catalog_data_downloader::config::ClientConfig;
use catalog_data_downloader::resolver::ResolveError;
use catalog_data_downloader::{DataClient, DownloadRequest, PartitionMode};

use crate::common::{MockCatalog, BROKEN_MEMBER, SLOW_MEMBER};

#[tokio::test]
async fn test_range_download_preserves_order() {
    let server = MockCatalog::start().await;
    let dir = tempfile::tempdir().unwrap();
    let client = DataClient::new(server.config(dir.path())).unwrap();

    let request = DownloadRequest::new("FX")
        .with_dt("2020-01-02:2020-01-04")
        .with_return_paths(true);
    let outcomes = client.download(&request).await.unwrap().unwrap();

    let names: Vec<String> = outcomes
        .iter()
        .map(|o| o.path().file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        vec![
            "FX__common__2020-01-02.csv",
            "FX__common__2020-01-03.csv",
            "FX__common__2020-01-04.csv",
        ]
    );
    assert!(outcomes.iter().all(|o| o.is_success()));
    assert_eq!(server.distribution_hits(), 3);

    let body = std::fs::read_to_string(outcomes[0].path()).unwrap();
    assert!(body.starts_with("date,rate\n2020-01-02,"));
}

#[tokio::test]
async fn test_latest_picks_most_recent_member() {
    let server = MockCatalog::start().await;
    let dir = tempfile::tempdir().unwrap();
    let client = DataClient::new(server.config(dir.path())).unwrap();

    let outcomes = client
        .download(&DownloadRequest::new("FX").with_return_paths(true))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].path().ends_with("FX__common__2020-01-05.csv"));
}

#[tokio::test]
async fn test_failed_member_does_not_abort_batch() {
    let server = MockCatalog::start().await;
    let dir = tempfile::tempdir().unwrap();
    let client = DataClient::new(server.config(dir.path())).unwrap();

    let request = DownloadRequest::new("BROKEN").with_dt(":").with_return_paths(true);
    let outcomes = client.download(&request).await.unwrap().unwrap();

    assert_eq!(outcomes.len(), 3);
    assert!(outcomes[0].is_success());
    assert!(!outcomes[1].is_success());
    assert!(outcomes[2].is_success());

    let failure = &outcomes[1];
    assert!(failure.path().to_string_lossy().contains(BROKEN_MEMBER));
    assert!(failure.error().unwrap().contains("500"));
    // No partial file left at the failed destination
    assert!(!failure.path().exists());
}

#[tokio::test]
async fn test_timed_out_member_fails_alone() {
    let server = MockCatalog::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = ClientConfig {
        request_timeout_secs: 1,
        ..server.config(dir.path())
    };
    let client = DataClient::new(config).unwrap();

    let request = DownloadRequest::new("SLOW").with_dt(":").with_return_paths(true);
    let outcomes = client.download(&request).await.unwrap().unwrap();

    assert_eq!(outcomes.len(), 3);
    assert!(outcomes[0].is_success());
    assert!(!outcomes[1].is_success());
    assert!(outcomes[2].is_success());
    assert!(outcomes[1].path().to_string_lossy().contains(SLOW_MEMBER));
    assert!(
        outcomes[1].error().unwrap().contains("timed out"),
        "unexpected reason: {:?}",
        outcomes[1].error()
    );
    assert!(!outcomes[1].path().exists());
}

#[tokio::test]
async fn test_repeated_listing_entry_downloads_once() {
    let server = MockCatalog::start().await;
    let dir = tempfile::tempdir().unwrap();
    let client = DataClient::new(server.config(dir.path())).unwrap();

    let request = DownloadRequest::new("DUP").with_dt(":").with_return_paths(true);
    let outcomes = client.download(&request).await.unwrap().unwrap();

    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].is_success());
    assert!(outcomes[0].path().ends_with("DUP__common__2020-01-01.csv"));
    assert_eq!(server.distribution_hits(), 1);
}

#[tokio::test]
async fn test_rerun_reuses_existing_files() {
    let server = MockCatalog::start().await;
    let dir = tempfile::tempdir().unwrap();
    let client = DataClient::new(server.config(dir.path())).unwrap();
    let request = DownloadRequest::new("FX").with_dt(":").with_return_paths(true);

    let first = client.download(&request).await.unwrap().unwrap();
    assert_eq!(server.distribution_hits(), 5);

    let second = client.download(&request).await.unwrap().unwrap();
    assert_eq!(server.distribution_hits(), 5);
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_overwrite_fetches_again() {
    let server = MockCatalog::start().await;
    let dir = tempfile::tempdir().unwrap();
    let client = DataClient::new(server.config(dir.path())).unwrap();
    let request = DownloadRequest::new("FX").with_dt("2020-01-01:2020-01-02");

    client.download(&request).await.unwrap();
    client
        .download(&request.clone().with_overwrite(true))
        .await
        .unwrap();
    assert_eq!(server.distribution_hits(), 4);
}

#[tokio::test]
async fn test_empty_file_is_refetched() {
    let server = MockCatalog::start().await;
    let dir = tempfile::tempdir().unwrap();
    let client = DataClient::new(server.config(dir.path())).unwrap();

    let stale = dir.path().join("FX__common__2020-01-05.csv");
    std::fs::write(&stale, b"").unwrap();

    client.download(&DownloadRequest::new("FX")).await.unwrap();
    assert_eq!(server.distribution_hits(), 1);
    assert!(std::fs::metadata(&stale).unwrap().len() > 0);
}

#[tokio::test]
async fn test_sample_skips_listing_and_always_fetches() {
    let server = MockCatalog::start().await;
    let dir = tempfile::tempdir().unwrap();
    let client = DataClient::new(server.config(dir.path())).unwrap();
    let request = DownloadRequest::new("FX").with_dt("sample").with_return_paths(true);

    let outcomes = client.download(&request).await.unwrap().unwrap();
    client.download(&request).await.unwrap();

    assert_eq!(server.listing_hits(), 0);
    assert_eq!(server.distribution_hits(), 2);
    assert!(outcomes[0].path().ends_with("FX__common__sample.csv"));
}

#[tokio::test]
async fn test_hive_layout_on_disk() {
    let server = MockCatalog::start().await;
    let dir = tempfile::tempdir().unwrap();
    let client = DataClient::new(server.config(dir.path())).unwrap();

    let request = DownloadRequest::new("FX")
        .with_dt("20200101:20200102")
        .with_partitioning(PartitionMode::Hive);
    client.download(&request).await.unwrap();

    for day in ["2020-01-01", "2020-01-02"] {
        let path = dir
            .path()
            .join("dataset=FX")
            .join("catalog=common")
            .join(format!("series={day}"))
            .join("data.csv");
        assert!(path.is_file(), "missing {}", path.display());
    }
}

#[tokio::test]
async fn test_request_download_dir_overrides_config() {
    let server = MockCatalog::start().await;
    let configured = tempfile::tempdir().unwrap();
    let requested = tempfile::tempdir().unwrap();
    let client = DataClient::new(server.config(configured.path())).unwrap();

    let request = DownloadRequest::new("FX").with_download_dir(requested.path());
    client.download(&request).await.unwrap();

    assert!(requested.path().join("FX__common__2020-01-05.csv").is_file());
    assert!(!configured.path().join("FX__common__2020-01-05.csv").exists());
}

#[tokio::test]
async fn test_no_matching_member_is_error() {
    let server = MockCatalog::start().await;
    let dir = tempfile::tempdir().unwrap();
    let client = DataClient::new(server.config(dir.path())).unwrap();

    let err = client
        .download(&DownloadRequest::new("FX").with_dt("2021-01-01"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ClientError::Resolve(ResolveError::NoMatchingSeries(_))
    ));
    assert_eq!(server.distribution_hits(), 0);
}

#[tokio::test]
async fn test_empty_dataset_is_error() {
    let server = MockCatalog::start().await;
    let dir = tempfile::tempdir().unwrap();
    let client = DataClient::new(server.config(dir.path())).unwrap();

    let err = client
        .download(&DownloadRequest::new("EMPTY"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ClientError::Resolve(ResolveError::EmptySeries { .. })
    ));
}

#[tokio::test]
async fn test_unknown_dataset_listing_fails() {
    let server = MockCatalog::start().await;
    let dir = tempfile::tempdir().unwrap();
    let client = DataClient::new(server.config(dir.path())).unwrap();

    let err = client
        .download(&DownloadRequest::new("NOPE"))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Catalog(_)));
    assert!(err.to_string().contains("404"));
}
