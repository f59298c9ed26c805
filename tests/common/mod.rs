//! Shared helpers for integration tests: an in-process mock catalog service.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path as UrlPath, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use parquet::data_type::{ByteArray, ByteArrayType, DoubleType};
use parquet::file::properties::WriterProperties;
use parquet::file::writer::SerializedFileWriter;
use parquet::schema::parser::parse_message_type;
use serde_json::json;
use tokio::net::TcpListener;

use catalog_data_downloader::config::ClientConfig;

/// Path prefix the mock service is mounted under
pub const API_PREFIX: &str = "/api/v1";

/// Members published for `FX` (listed out of order on purpose)
pub const FX_SERIES: &[&str] = &[
    "2020-01-03",
    "2020-01-01",
    "2020-01-05",
    "2020-01-02",
    "2020-01-04",
];

/// Members published for `BROKEN`; the middle one always answers 500
pub const BROKEN_SERIES: &[&str] = &["2020-01-01", "2020-01-02", "2020-01-03"];
pub const BROKEN_MEMBER: &str = "2020-01-02";

/// Members published for `SLOW`; the middle one stalls for [`SLOW_DELAY`]
pub const SLOW_SERIES: &[&str] = &["2020-01-01", "2020-01-02", "2020-01-03"];
pub const SLOW_MEMBER: &str = "2020-01-02";
pub const SLOW_DELAY: Duration = Duration::from_secs(5);

#[derive(Default)]
pub struct Hits {
    pub listings: AtomicUsize,
    pub distributions: AtomicUsize,
}

/// Handle to a running mock catalog
pub struct MockCatalog {
    pub addr: SocketAddr,
    pub hits: Arc<Hits>,
    handle: tokio::task::JoinHandle<()>,
}

impl MockCatalog {
    /// Bind an ephemeral port and serve until dropped
    pub async fn start() -> Self {
        let hits = Arc::new(Hits::default());
        let app = Router::new()
            .route(
                &format!("{API_PREFIX}/catalogs/:catalog/datasets/:dataset/datasetseries"),
                get(listing),
            )
            .route(
                &format!(
                    "{API_PREFIX}/catalogs/:catalog/datasets/:dataset/datasetseries/:series/distributions/:format"
                ),
                get(distribution),
            )
            .route(
                &format!("{API_PREFIX}/catalogs/:catalog/datasets/:dataset/sample/distributions/csv"),
                get(sample),
            )
            .with_state(hits.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self { addr, hits, handle }
    }

    pub fn root_url(&self) -> String {
        format!("http://{}{}/", self.addr, API_PREFIX)
    }

    /// Client config pointed at this service and `download_dir`
    pub fn config(&self, download_dir: &Path) -> ClientConfig {
        ClientConfig {
            root_url: self.root_url(),
            download_dir: download_dir.to_path_buf(),
            concurrency: 4,
            ..ClientConfig::default()
        }
    }

    pub fn distribution_hits(&self) -> usize {
        self.hits.distributions.load(Ordering::SeqCst)
    }

    pub fn listing_hits(&self) -> usize {
        self.hits.listings.load(Ordering::SeqCst)
    }
}

impl Drop for MockCatalog {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn series_for(dataset: &str) -> Option<&'static [&'static str]> {
    match dataset {
        "FX" => Some(FX_SERIES),
        "BROKEN" => Some(BROKEN_SERIES),
        "SLOW" => Some(SLOW_SERIES),
        "DUP" => Some(&["2020-01-01", "2020-01-01"]),
        "EMPTY" => Some(&[]),
        _ => None,
    }
}

async fn listing(
    State(hits): State<Arc<Hits>>,
    UrlPath((catalog, dataset)): UrlPath<(String, String)>,
) -> Response {
    hits.listings.fetch_add(1, Ordering::SeqCst);
    let Some(series) = series_for(&dataset) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let resources: Vec<_> = series
        .iter()
        .map(|id| {
            json!({
                "identifier": id,
                "createdDate": format!("{id}T06:00:00Z"),
                "dataset": dataset,
                "catalog": catalog,
            })
        })
        .collect();
    Json(json!({ "resources": resources })).into_response()
}

async fn distribution(
    State(hits): State<Arc<Hits>>,
    UrlPath((_catalog, dataset, series, format)): UrlPath<(String, String, String, String)>,
) -> Response {
    hits.distributions.fetch_add(1, Ordering::SeqCst);
    let known = series_for(&dataset).is_some_and(|s| s.contains(&series.as_str()));
    if !known {
        return StatusCode::NOT_FOUND.into_response();
    }
    if dataset == "BROKEN" && series == BROKEN_MEMBER {
        return (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response();
    }
    if dataset == "SLOW" && series == SLOW_MEMBER {
        tokio::time::sleep(SLOW_DELAY).await;
    }
    let rate = rate_for(&series);
    match format.as_str() {
        "csv" => format!("date,rate\n{series},{rate}\n").into_response(),
        "psv" => format!("date|rate\n{series}|{rate}\n").into_response(),
        "json" => Json(json!([{ "date": series, "rate": rate }])).into_response(),
        "parquet" => parquet_bytes(&series, rate).into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn sample(State(hits): State<Arc<Hits>>) -> Response {
    hits.distributions.fetch_add(1, Ordering::SeqCst);
    "date,rate\nsample,0.5\n".into_response()
}

/// Deterministic non-integer rate derived from the day of month
pub fn rate_for(series: &str) -> f64 {
    let day: f64 = series
        .rsplit('-')
        .next()
        .and_then(|d| d.parse().ok())
        .unwrap_or(0.0);
    day + 0.25
}

/// One-row parquet file with a UTF8 `date` and a DOUBLE `rate` column
pub fn parquet_bytes(series: &str, rate: f64) -> Vec<u8> {
    let schema = Arc::new(
        parse_message_type(
            "message schema { REQUIRED BYTE_ARRAY date (UTF8); REQUIRED DOUBLE rate; }",
        )
        .unwrap(),
    );
    let props = Arc::new(WriterProperties::builder().build());
    let mut buffer = Vec::new();
    {
        let mut writer = SerializedFileWriter::new(&mut buffer, schema, props).unwrap();
        let mut row_group = writer.next_row_group().unwrap();
        if let Some(mut column) = row_group.next_column().unwrap() {
            column
                .typed::<ByteArrayType>()
                .write_batch(&[ByteArray::from(series)], None, None)
                .unwrap();
            column.close().unwrap();
        }
        if let Some(mut column) = row_group.next_column().unwrap() {
            column
                .typed::<DoubleType>()
                .write_batch(&[rate], None, None)
                .unwrap();
            column.close().unwrap();
        }
        row_group.close().unwrap();
        writer.close().unwrap();
    }
    buffer
}
