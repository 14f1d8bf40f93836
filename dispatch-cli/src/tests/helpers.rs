//! Test helpers for writing request files and serving stub legs.

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use dispatch_engine::{FallbackEstimator, LegError, LegProvider, RouteLeg};
use geo::Coord;
use std::fs;
use tempfile::TempDir;

use crate::CliError;
use crate::optimize::{LegProviderBuilder, OptimizeConfig};

pub(super) fn write_utf8(path: &Utf8Path, contents: &[u8]) {
    fs::write(path.as_std_path(), contents).expect("write test file");
}

/// A temporary directory with a UTF-8 path.
pub(super) fn utf8_tempdir() -> (TempDir, Utf8PathBuf) {
    let tmp = TempDir::new().expect("tempdir");
    let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf-8 workspace");
    (tmp, root)
}

/// Three 40 kg orders a few kilometres north-east of the default depot.
pub(super) const THREE_ORDERS_JSON: &str = r#"{
  "orders": [
    { "id": "A", "lat": 36.17, "lng": -86.77, "weight_kg": 40.0 },
    { "id": "B", "lat": 36.18, "lng": -86.76, "weight": 40.0 },
    { "id": "C", "lat": 36.19, "lng": -86.75, "weight_kg": 40.0 }
  ],
  "num_trucks": 1
}"#;

/// Provider answering with straight-line legs that count as road legs.
#[derive(Debug, Default)]
pub(super) struct RoadLikeProvider;

#[async_trait]
impl LegProvider for RoadLikeProvider {
    async fn fetch_leg(&self, from: Coord<f64>, to: Coord<f64>) -> Result<RouteLeg, LegError> {
        Ok(RouteLeg {
            is_fallback: false,
            ..FallbackEstimator::default().estimate(from, to)
        })
    }
}

/// Hands out a [`RoadLikeProvider`] whatever the configuration says.
#[derive(Debug, Default)]
pub(super) struct StubLegProviderBuilder;

impl LegProviderBuilder for StubLegProviderBuilder {
    fn build(&self, _config: &OptimizeConfig) -> Result<Box<dyn LegProvider>, CliError> {
        Ok(Box::new(RoadLikeProvider))
    }
}
