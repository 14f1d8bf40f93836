//! Test utilities for leg providers.
//!
//! These doubles stand in for a routing service so the stitcher and the
//! planner can be exercised without network access.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use dispatch_core::{LegError, LegProvider, RouteLeg};
use geo::Coord;
use parking_lot::Mutex;

use crate::FallbackEstimator;

/// Provider answering with the straight-line estimate, unflagged.
///
/// Useful wherever a deterministic "road" network is needed.
#[derive(Debug, Clone, Copy, Default)]
pub struct StraightLineProvider;

#[async_trait]
impl LegProvider for StraightLineProvider {
    async fn fetch_leg(&self, from: Coord<f64>, to: Coord<f64>) -> Result<RouteLeg, LegError> {
        let estimate = FallbackEstimator::default().estimate(from, to);
        Ok(RouteLeg {
            is_fallback: false,
            ..estimate
        })
    }
}

/// Provider that fails every request with a network error.
#[derive(Debug, Default)]
pub struct FailingProvider {
    calls: AtomicUsize,
}

impl FailingProvider {
    /// Number of requests received so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LegProvider for FailingProvider {
    async fn fetch_leg(&self, _from: Coord<f64>, _to: Coord<f64>) -> Result<RouteLeg, LegError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(LegError::NetworkError {
            url: "http://routing.invalid/route".to_owned(),
            message: "connection refused".to_owned(),
        })
    }
}

/// Provider replaying scripted failures before answering like
/// [`StraightLineProvider`], and counting every call.
#[derive(Debug, Default)]
pub struct StubLegProvider {
    failures: Mutex<VecDeque<LegError>>,
    calls: AtomicUsize,
}

impl StubLegProvider {
    /// Queue an error to return on the next unanswered request.
    #[must_use]
    pub fn fail_next(self, error: LegError) -> Self {
        self.failures.lock().push_back(error);
        self
    }

    /// Number of requests received so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LegProvider for StubLegProvider {
    async fn fetch_leg(&self, from: Coord<f64>, to: Coord<f64>) -> Result<RouteLeg, LegError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self.failures.lock().pop_front();
        match scripted {
            Some(error) => Err(error),
            None => StraightLineProvider.fetch_leg(from, to).await,
        }
    }
}
