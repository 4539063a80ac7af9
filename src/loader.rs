/// Background execution for the blocking feed fetch.
///
/// The fetch is a synchronous network call and must stay off any
/// interactive thread. `FeedLoader` runs one fetch at a time on a worker
/// thread and delivers the outcome exactly once through `join`. A
/// `CancelToken` lets the caller abandon a fetch that a newer one has
/// superseded; the fetcher checks it before every redirect hop and once
/// more before parsing.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use crate::config::PipelineConfig;
use crate::ingest::usgs;
use crate::model::{EarthquakeRecord, FeedError};

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

/// Shared cancellation flag. Cloning hands out another handle to the
/// same flag; cancellation is one-way and permanent for a given fetch.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        CancelToken(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// ---------------------------------------------------------------------------
// Loader
// ---------------------------------------------------------------------------

/// One in-flight background fetch.
pub struct FeedLoader {
    handle: JoinHandle<Result<Vec<EarthquakeRecord>, FeedError>>,
    cancel: CancelToken,
}

impl FeedLoader {
    /// Starts fetching `url` on a worker thread.
    ///
    /// An empty URL resolves immediately to an empty batch, mirroring the
    /// fetcher's nothing-to-fetch contract.
    pub fn spawn(url: String, config: PipelineConfig) -> Self {
        let cancel = CancelToken::new();
        Self::spawn_with_token(url, config, cancel)
    }

    /// `spawn` with a caller-held token, for callers that keep the token
    /// around to cancel a stale fetch when they start a fresh one.
    pub fn spawn_with_token(url: String, config: PipelineConfig, cancel: CancelToken) -> Self {
        let token = cancel.clone();
        let handle = thread::spawn(move || {
            let client = usgs::build_http_client(&config.fetch)?;
            usgs::fetch_earthquake_data(&client, &url, &config, &token)
        });
        FeedLoader { handle, cancel }
    }

    /// Flags this fetch as superseded. The worker winds down at its next
    /// cancellation check and `join` reports `Cancelled`.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// A handle to this fetch's cancellation flag.
    pub fn token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Blocks until the fetch completes and returns its outcome.
    /// Delivered exactly once; the loader is consumed.
    pub fn join(self) -> Result<Vec<EarthquakeRecord>, FeedError> {
        match self.handle.join() {
            Ok(outcome) => outcome,
            // A panic on the worker must not cross the pipeline boundary.
            Err(_) => Err(FeedError::ConnectionFailure(
                "fetch worker thread panicked".to_string(),
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_url_loads_empty_batch() {
        let loader = FeedLoader::spawn(String::new(), PipelineConfig::default());
        let records = loader.join().expect("empty URL is not an error");
        assert!(records.is_empty());
    }

    #[test]
    fn test_pre_cancelled_fetch_reports_cancelled_without_network() {
        let token = CancelToken::new();
        token.cancel();
        // Port 9 is the discard service; the worker must bail out before
        // any request goes on the wire.
        let loader = FeedLoader::spawn_with_token(
            "http://127.0.0.1:9/".to_string(),
            PipelineConfig::default(),
            token,
        );
        assert_eq!(loader.join(), Err(FeedError::Cancelled));
    }

    #[test]
    fn test_token_is_shared_between_handles() {
        let token = CancelToken::new();
        let other = token.clone();
        assert!(!other.is_cancelled());
        token.cancel();
        assert!(other.is_cancelled());
    }
}
