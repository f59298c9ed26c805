//! Unit tests for destination path planning

use catalog_data_downloader::output::{is_reusable, plan, PartitionMode};
use catalog_data_downloader::{DistributionFormat, ResolutionTuple};
use std::path::{Path, PathBuf};

#[test]
fn test_flat_path_per_format() {
    let root = Path::new("downloads");
    for (format, ext) in [
        (DistributionFormat::Csv, "csv"),
        (DistributionFormat::Parquet, "parquet"),
        (DistributionFormat::Other("xlsx".to_string()), "xlsx"),
    ] {
        let tuple = ResolutionTuple::new("common", "FX", "2020-01-01", format);
        assert_eq!(
            plan(&tuple, root, PartitionMode::Flat),
            PathBuf::from(format!("downloads/FX__common__2020-01-01.{ext}"))
        );
    }
}

#[test]
fn test_distinct_tuples_get_distinct_paths() {
    let root = Path::new("out");
    let a = ResolutionTuple::new("common", "FX", "2020-01-01", DistributionFormat::Csv);
    let b = ResolutionTuple::new("other", "FX", "2020-01-01", DistributionFormat::Csv);
    let c = ResolutionTuple::new("common", "FX", "2020-01-02", DistributionFormat::Csv);

    for mode in [PartitionMode::Flat, PartitionMode::Hive] {
        let paths = [plan(&a, root, mode), plan(&b, root, mode), plan(&c, root, mode)];
        assert_ne!(paths[0], paths[1]);
        assert_ne!(paths[0], paths[2]);
        assert_ne!(paths[1], paths[2]);
    }
}

#[test]
fn test_sample_paths() {
    let tuple = ResolutionTuple::sample("common", "FX");
    assert_eq!(
        plan(&tuple, Path::new("d"), PartitionMode::Hive),
        PathBuf::from("d/dataset=FX/catalog=common/series=sample/data.csv")
    );
}

#[test]
fn test_plan_stays_under_root() {
    let root = Path::new("/data/root");
    let tuple = ResolutionTuple::new("../etc", "a/b", "..", DistributionFormat::Csv);
    for mode in [PartitionMode::Flat, PartitionMode::Hive] {
        let path = plan(&tuple, root, mode);
        assert!(path.starts_with(root), "{} escaped root", path.display());
        assert!(!path.components().any(|c| c.as_os_str() == ".."));
    }
}

#[test]
fn test_reusable_requires_nonempty_file() {
    let dir = tempfile::tempdir().unwrap();
    let empty = dir.path().join("empty.csv");
    let full = dir.path().join("full.csv");
    std::fs::write(&empty, b"").unwrap();
    std::fs::write(&full, b"a\n1\n").unwrap();

    assert!(!is_reusable(&empty));
    assert!(is_reusable(&full));
    assert!(!is_reusable(&dir.path().join("missing.csv")));
    assert!(!is_reusable(dir.path()));
}

#[test]
fn test_partition_mode_parsing() {
    assert_eq!(PartitionMode::parse_optional(None).unwrap(), PartitionMode::Flat);
    assert_eq!(PartitionMode::parse_optional(Some("HIVE")).unwrap(), PartitionMode::Hive);
    assert!(PartitionMode::parse_optional(Some("nested")).is_err());
}
