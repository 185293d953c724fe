//! # Detection Engines
//!
//! A detection engine turns camera frames into candidate barcode strings.
//! Recognition itself is a black box; the session only sees a channel of
//! candidates.
//!
//! ## Feed Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  engine.start(&lease, &config)                                          │
//! │       │                                                                 │
//! │       ├── Err(EngineError) ──► ScanError::Initialization (lease freed)  │
//! │       │                                                                 │
//! │       └── Ok(CandidateFeed)                                             │
//! │              │   "880…890", "880…890", "490…891", …                     │
//! │              ▼   any number, any order, duplicates allowed              │
//! │         ScanSession loop                                                │
//! │                                                                         │
//! │  The engine stops producing when the receiver is dropped or the         │
//! │  source runs dry (channel closes → StopReason::FeedClosed).             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Provided Engines
//! - [`ChannelEngine`] - candidates pushed by the embedding application
//! - [`LineReaderEngine`] - one candidate per line from a reader; a
//!   keyboard-wedge scanner on stdin is the common case

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, warn};

use fieldscan_core::ScanConfig;

use crate::camera::CameraLease;
use crate::error::EngineError;

/// Capacity of the candidate channel between engine and session.
pub const FEED_CAPACITY: usize = 64;

/// Stream of candidate codes for one session.
pub type CandidateFeed = mpsc::Receiver<String>;

/// A barcode recognition capability.
#[async_trait]
pub trait DetectionEngine: Send + Sync {
    /// Engine name for logs and errors.
    fn name(&self) -> &str;

    /// Starts detection on the leased camera.
    ///
    /// The lease is borrowed to prove ownership; the session keeps it.
    async fn start(
        &self,
        lease: &CameraLease,
        config: &ScanConfig,
    ) -> Result<CandidateFeed, EngineError>;
}

// =============================================================================
// Channel Engine
// =============================================================================

/// Engine fed directly by the embedding application.
///
/// The feed can be handed out once; a second `start` fails.
pub struct ChannelEngine {
    feed: Mutex<Option<CandidateFeed>>,
}

impl ChannelEngine {
    /// Creates the engine and the sender that feeds it.
    pub fn new() -> (Self, mpsc::Sender<String>) {
        let (tx, rx) = mpsc::channel(FEED_CAPACITY);
        let engine = ChannelEngine {
            feed: Mutex::new(Some(rx)),
        };
        (engine, tx)
    }
}

#[async_trait]
impl DetectionEngine for ChannelEngine {
    fn name(&self) -> &str {
        "channel"
    }

    async fn start(
        &self,
        lease: &CameraLease,
        _config: &ScanConfig,
    ) -> Result<CandidateFeed, EngineError> {
        let feed = self
            .feed
            .lock()
            .await
            .take()
            .ok_or_else(|| EngineError::new("candidate feed already consumed"))?;

        debug!(camera = %lease.device(), "Channel engine started");
        Ok(feed)
    }
}

// =============================================================================
// Line Reader Engine
// =============================================================================

/// Engine reading one candidate per line.
///
/// Hand-held scanners in keyboard mode type the code followed by Enter, so
/// stdin is a detection source. Blank lines are forwarded and dropped by the
/// session.
pub struct LineReaderEngine<R> {
    reader: Mutex<Option<R>>,
}

impl<R> LineReaderEngine<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    pub fn new(reader: R) -> Self {
        LineReaderEngine {
            reader: Mutex::new(Some(reader)),
        }
    }
}

impl LineReaderEngine<BufReader<Stdin>> {
    /// Reads candidates from standard input.
    pub fn stdin() -> Self {
        LineReaderEngine::new(BufReader::new(tokio::io::stdin()))
    }
}

#[async_trait]
impl<R> DetectionEngine for LineReaderEngine<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    fn name(&self) -> &str {
        "line-reader"
    }

    async fn start(
        &self,
        lease: &CameraLease,
        _config: &ScanConfig,
    ) -> Result<CandidateFeed, EngineError> {
        let reader = self
            .reader
            .lock()
            .await
            .take()
            .ok_or_else(|| EngineError::new("input already consumed by an earlier session"))?;

        let (tx, rx) = mpsc::channel(FEED_CAPACITY);
        let camera = lease.device().to_string();

        tokio::spawn(async move {
            let mut lines = reader.lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if tx.send(line).await.is_err() {
                            // Session gone
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        warn!(camera = %camera, error = %e, "Line reader failed");
                        break;
                    }
                }
            }
            debug!(camera = %camera, "Line reader stopped");
        });

        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::CameraDevice;

    #[tokio::test]
    async fn test_channel_engine_hands_out_feed_once() {
        let camera = CameraDevice::new("test");
        let lease = camera.try_acquire().unwrap();
        let (engine, tx) = ChannelEngine::new();

        let mut feed = engine.start(&lease, &ScanConfig::default()).await.unwrap();
        tx.send("111".to_string()).await.unwrap();
        assert_eq!(feed.recv().await.as_deref(), Some("111"));

        assert!(engine.start(&lease, &ScanConfig::default()).await.is_err());
    }

    #[tokio::test]
    async fn test_line_reader_emits_lines_then_closes() {
        let camera = CameraDevice::new("test");
        let lease = camera.try_acquire().unwrap();
        let engine = LineReaderEngine::new(&b"111\n222\r\n\n111\n"[..]);

        let mut feed = engine.start(&lease, &ScanConfig::default()).await.unwrap();

        let mut lines = Vec::new();
        while let Some(line) = feed.recv().await {
            lines.push(line);
        }
        assert_eq!(lines, vec!["111", "222", "", "111"]);
    }
}
