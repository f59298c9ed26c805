//! Downloading and decoding into one table, per distribution format

use catalog_data_downloader::client::ClientError;
use catalog_data_downloader::table::{materialize, Cell, TableError};
use catalog_data_downloader::{DataClient, DistributionFormat, DownloadRequest};

use crate::common::{rate_for, MockCatalog};

fn dates(table: &catalog_data_downloader::Table) -> Vec<String> {
    table
        .column("date")
        .unwrap()
        .into_iter()
        .map(|cell| cell.to_string())
        .collect()
}

#[tokio::test]
async fn test_csv_range_to_table() {
    let server = MockCatalog::start().await;
    let dir = tempfile::tempdir().unwrap();
    let client = DataClient::new(server.config(dir.path())).unwrap();

    let table = client
        .to_table("FX", Some("2020-01-01:2020-01-03"), DistributionFormat::Csv, None, None)
        .await
        .unwrap();

    assert_eq!(table.columns(), &["date", "rate"]);
    assert_eq!(table.num_rows(), 3);
    assert_eq!(dates(&table), vec!["2020-01-01", "2020-01-02", "2020-01-03"]);
    assert_eq!(table.rows()[1][1], Cell::Float(rate_for("2020-01-02")));
}

#[tokio::test]
async fn test_parquet_to_table() {
    let server = MockCatalog::start().await;
    let dir = tempfile::tempdir().unwrap();
    let client = DataClient::new(server.config(dir.path())).unwrap();

    let table = client
        .to_table("FX", Some("2020-01-04:"), DistributionFormat::Parquet, None, None)
        .await
        .unwrap();

    assert_eq!(table.num_rows(), 2);
    assert_eq!(dates(&table), vec!["2020-01-04", "2020-01-05"]);
    assert_eq!(table.rows()[0][1], Cell::Float(rate_for("2020-01-04")));
    assert!(dir.path().join("FX__common__2020-01-04.parquet").is_file());
}

#[tokio::test]
async fn test_json_and_psv_to_table() {
    let server = MockCatalog::start().await;
    let dir = tempfile::tempdir().unwrap();
    let client = DataClient::new(server.config(dir.path())).unwrap();

    for format in [DistributionFormat::Json, DistributionFormat::Psv] {
        let table = client
            .to_table("FX", Some(":2020-01-02"), format.clone(), None, None)
            .await
            .unwrap();
        assert_eq!(table.num_rows(), 2, "format {format}");
        assert_eq!(dates(&table), vec!["2020-01-01", "2020-01-02"]);
    }
}

#[tokio::test]
async fn test_column_projection() {
    let server = MockCatalog::start().await;
    let dir = tempfile::tempdir().unwrap();
    let client = DataClient::new(server.config(dir.path())).unwrap();
    let columns = vec!["rate".to_string()];

    let table = client
        .to_table("FX", Some(":"), DistributionFormat::Csv, None, Some(&columns))
        .await
        .unwrap();
    assert_eq!(table.columns(), &["rate"]);
    assert_eq!(table.num_rows(), 5);

    let missing = vec!["volume".to_string()];
    let err = client
        .to_table("FX", Some(":"), DistributionFormat::Csv, None, Some(&missing))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Table(TableError::UnknownColumn(_))));
}

#[tokio::test]
async fn test_failed_members_are_left_out() {
    let server = MockCatalog::start().await;
    let dir = tempfile::tempdir().unwrap();
    let client = DataClient::new(server.config(dir.path())).unwrap();

    let table = client
        .to_table("BROKEN", None, DistributionFormat::Csv, None, None)
        .await
        .unwrap();
    assert_eq!(table.num_rows(), 1);

    let table = client
        .to_table("BROKEN", Some(":"), DistributionFormat::Csv, None, None)
        .await
        .unwrap();
    assert_eq!(dates(&table), vec!["2020-01-01", "2020-01-03"]);
}

#[tokio::test]
async fn test_materialize_outcomes_from_download() {
    let server = MockCatalog::start().await;
    let dir = tempfile::tempdir().unwrap();
    let client = DataClient::new(server.config(dir.path())).unwrap();

    let outcomes = client
        .download(
            &DownloadRequest::new("FX")
                .with_dt("2020-01-02:2020-01-03")
                .with_return_paths(true),
        )
        .await
        .unwrap()
        .unwrap();
    let table = materialize(&outcomes).unwrap();
    assert_eq!(table.num_rows(), 2);
}

#[tokio::test]
async fn test_to_bytes() {
    let server = MockCatalog::start().await;
    let dir = tempfile::tempdir().unwrap();
    let client = DataClient::new(server.config(dir.path())).unwrap();

    let bytes = client
        .to_bytes(None, "FX", "2020-01-03", DistributionFormat::Csv)
        .await
        .unwrap();
    assert_eq!(&bytes[..], format!("date,rate\n2020-01-03,{}\n", rate_for("2020-01-03")).as_bytes());

    let sample = client
        .to_bytes(None, "FX", "sample", DistributionFormat::Parquet)
        .await
        .unwrap();
    assert!(sample.starts_with(b"date,rate\nsample"));

    let err = client
        .to_bytes(None, "FX", "1999-01-01", DistributionFormat::Csv)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Fetch(_)));
    // Nothing written for in-memory fetches
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}
