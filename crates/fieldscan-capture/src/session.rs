//! # Scan Controller
//!
//! Runs one bounded scanning session from "open camera" to "list of distinct
//! codes".
//!
//! ## Session Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         ScanSession Lifecycle                           │
//! │                                                                         │
//! │  controller.start(config)                                               │
//! │       │  validate config → acquire CameraLease → engine.start()         │
//! │       ▼                                                                 │
//! │  ┌──────────┐   run()    ┌──────────────────────────────────────────┐   │
//! │  │  OPEN    │──────────►│ select! {                                 │   │
//! │  │          │◄──────────│   candidate  → DedupSet::insert → counter │   │
//! │  │ lease +  │ StopReason│   cancel     → Cancelled                  │   │
//! │  │ DedupSet │           │   deadline   → TimedOut                   │   │
//! │  └────┬─────┘           │ } until SingleScan / CapacityReached /    │   │
//! │       │                 │   FeedClosed                              │   │
//! │       │                 └──────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ├── complete() ── empty ──► Err(EmptyScan), still OPEN            │
//! │       ├── complete() ── codes ──► Ok(Vec<String>), CLOSED, camera free  │
//! │       └── cancel()   ─────────────► (), CLOSED, camera free             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Events
//! Each newly inserted code updates a `watch` counter (see
//! [`ScanHandle::count`]) and is reported through the [`ScanEventEmitter`].

use std::fmt;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use fieldscan_core::validation::normalize_barcode;
use fieldscan_core::{DedupSet, ScanConfig};

use crate::camera::{CameraDevice, CameraLease};
use crate::engine::{CandidateFeed, DetectionEngine};
use crate::error::{ScanError, ScanResult};

// =============================================================================
// Stop Reason
// =============================================================================

/// Why a [`ScanSession::run`] call returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Single-scan mode got its code.
    SingleScan,
    /// `maxMultiScanCount` distinct codes are held.
    CapacityReached,
    /// `multiScanTimeout` elapsed.
    TimedOut,
    /// The engine stopped producing candidates.
    FeedClosed,
    /// Cancel was requested through a [`ScanHandle`].
    Cancelled,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::SingleScan => write!(f, "single_scan"),
            StopReason::CapacityReached => write!(f, "capacity_reached"),
            StopReason::TimedOut => write!(f, "timed_out"),
            StopReason::FeedClosed => write!(f, "feed_closed"),
            StopReason::Cancelled => write!(f, "cancelled"),
        }
    }
}

// =============================================================================
// Event Emitter Trait
// =============================================================================

/// Receives scan progress for display.
pub trait ScanEventEmitter: Send + Sync {
    /// A code was seen for the first time in this session.
    fn emit_detected(&self, session_id: Uuid, code: &str, count: usize);

    /// The session loop stopped.
    fn emit_stopped(&self, session_id: Uuid, reason: StopReason, count: usize);
}

/// Emitter that discards every event.
pub struct NoOpEmitter;

impl ScanEventEmitter for NoOpEmitter {
    fn emit_detected(&self, _session_id: Uuid, _code: &str, _count: usize) {}
    fn emit_stopped(&self, _session_id: Uuid, _reason: StopReason, _count: usize) {}
}

// =============================================================================
// Scan Controller
// =============================================================================

/// Starts scan sessions on one camera with one detection engine.
pub struct ScanController {
    camera: CameraDevice,
    engine: Arc<dyn DetectionEngine>,
    emitter: Arc<dyn ScanEventEmitter>,
}

impl ScanController {
    pub fn new(camera: CameraDevice, engine: Arc<dyn DetectionEngine>) -> Self {
        Self::with_emitter(camera, engine, Arc::new(NoOpEmitter))
    }

    pub fn with_emitter(
        camera: CameraDevice,
        engine: Arc<dyn DetectionEngine>,
        emitter: Arc<dyn ScanEventEmitter>,
    ) -> Self {
        ScanController {
            camera,
            engine,
            emitter,
        }
    }

    pub fn camera(&self) -> &CameraDevice {
        &self.camera
    }

    /// Opens a session.
    ///
    /// ## Errors
    /// - [`ScanError::InvalidConfig`] before the camera is touched
    /// - [`ScanError::CameraBusy`] if another session holds the camera
    /// - [`ScanError::Initialization`] if the engine fails; the camera is
    ///   released before this returns
    pub async fn start(&self, config: ScanConfig) -> ScanResult<ScanSession> {
        config
            .validate()
            .map_err(|e| ScanError::InvalidConfig(e.to_string()))?;

        let lease = self.camera.try_acquire()?;

        let feed = match self.engine.start(&lease, &config).await {
            Ok(feed) => feed,
            Err(e) => {
                drop(lease);
                error!(
                    engine = %self.engine.name(),
                    camera = %self.camera.name(),
                    error = %e,
                    "Detection engine failed to start"
                );
                return Err(ScanError::Initialization {
                    engine: self.engine.name().to_string(),
                    reason: e.to_string(),
                });
            }
        };

        let session = ScanSession::new(config, lease, feed, self.emitter.clone());

        info!(
            session_id = %session.id(),
            engine = %self.engine.name(),
            camera = %self.camera.name(),
            multi_scan = session.config().enable_multi_scan,
            capacity = session.config().capacity(),
            "Scan session started"
        );

        Ok(session)
    }
}

// =============================================================================
// Scan Session
// =============================================================================

enum Next {
    Candidate(String),
    FeedClosed,
    Cancelled,
    TimedOut,
}

/// One live scanning session. Holds the camera until completed, cancelled or
/// dropped.
pub struct ScanSession {
    id: Uuid,
    config: ScanConfig,
    codes: DedupSet,
    lease: Option<CameraLease>,
    feed: Option<CandidateFeed>,
    cancel_tx: mpsc::Sender<()>,
    cancel_rx: mpsc::Receiver<()>,
    count_tx: watch::Sender<usize>,
    emitter: Arc<dyn ScanEventEmitter>,
    last_stop: Option<StopReason>,
}

impl ScanSession {
    fn new(
        config: ScanConfig,
        lease: CameraLease,
        feed: CandidateFeed,
        emitter: Arc<dyn ScanEventEmitter>,
    ) -> Self {
        let (cancel_tx, cancel_rx) = mpsc::channel(1);
        let (count_tx, _) = watch::channel(0);

        ScanSession {
            id: Uuid::new_v4(),
            config,
            codes: DedupSet::new(),
            lease: Some(lease),
            feed: Some(feed),
            cancel_tx,
            cancel_rx,
            count_tx,
            emitter,
            last_stop: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Number of distinct codes held.
    pub fn count(&self) -> usize {
        self.codes.len()
    }

    /// Codes held so far, in first-seen order.
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.codes.iter()
    }

    /// True until `complete` succeeds or `cancel` is called.
    pub fn is_open(&self) -> bool {
        self.lease.is_some()
    }

    /// Reason the last `run` returned, if it has returned.
    pub fn last_stop(&self) -> Option<StopReason> {
        self.last_stop
    }

    /// Returns a handle for cancelling and watching from another task.
    pub fn handle(&self) -> ScanHandle {
        ScanHandle {
            session_id: self.id,
            cancel_tx: self.cancel_tx.clone(),
            count_rx: self.count_tx.subscribe(),
        }
    }

    /// Handles one candidate from the engine.
    ///
    /// Returns true if the code was new. Blank or malformed candidates,
    /// re-detections and codes beyond capacity are dropped.
    pub fn on_candidate(&mut self, raw: &str) -> bool {
        if !self.is_open() {
            return false;
        }

        let code = match normalize_barcode(raw) {
            Ok(code) => code,
            Err(e) => {
                debug!(session_id = %self.id, error = %e, "Ignoring candidate");
                return false;
            }
        };

        if self.codes.contains(&code) {
            return false;
        }

        if self.codes.len() >= self.config.capacity() {
            debug!(session_id = %self.id, code = %code, "Session full, dropping code");
            return false;
        }

        self.codes.insert(code.as_str());
        let count = self.codes.len();
        self.count_tx.send_replace(count);
        self.emitter.emit_detected(self.id, &code, count);

        debug!(session_id = %self.id, code = %code, count, "Barcode detected");
        true
    }

    /// Consumes candidates until a stop condition holds.
    ///
    /// Returning does not finish the session: the caller still decides
    /// between `complete` and `cancel`, and may call `run` again to keep
    /// scanning. The timeout counts from the start of each call.
    pub async fn run(&mut self) -> ScanResult<StopReason> {
        if !self.is_open() {
            return Err(ScanError::SessionClosed);
        }

        let deadline = self.config.timeout().map(|timeout| Instant::now() + timeout);

        let reason = loop {
            if self.cancel_rx.try_recv().is_ok() {
                break StopReason::Cancelled;
            }
            if let Some(reason) = self.limit_reached() {
                break reason;
            }

            let Some(feed) = self.feed.as_mut() else {
                break StopReason::FeedClosed;
            };

            let next = tokio::select! {
                candidate = feed.recv() => candidate.map_or(Next::FeedClosed, Next::Candidate),
                _ = self.cancel_rx.recv() => Next::Cancelled,
                _ = wait_until(deadline) => Next::TimedOut,
            };

            match next {
                Next::Candidate(code) => {
                    self.on_candidate(&code);
                }
                Next::FeedClosed => {
                    self.feed = None;
                    break StopReason::FeedClosed;
                }
                Next::Cancelled => break StopReason::Cancelled,
                Next::TimedOut => break StopReason::TimedOut,
            }
        };

        self.last_stop = Some(reason);
        self.emitter.emit_stopped(self.id, reason, self.codes.len());
        info!(session_id = %self.id, reason = %reason, count = self.codes.len(), "Scan loop stopped");

        Ok(reason)
    }

    /// Finishes the session and returns the distinct codes in first-seen
    /// order.
    ///
    /// With nothing scanned this fails with [`ScanError::EmptyScan`] and the
    /// session stays open with the camera held.
    pub fn complete(&mut self) -> ScanResult<Vec<String>> {
        if !self.is_open() {
            return Err(ScanError::SessionClosed);
        }

        if self.codes.is_empty() {
            warn!(session_id = %self.id, "Completion requested with no codes");
            return Err(ScanError::EmptyScan);
        }

        let codes = std::mem::take(&mut self.codes).into_vec();
        self.release();

        info!(session_id = %self.id, count = codes.len(), "Scan session completed");
        Ok(codes)
    }

    /// Abandons the session. Detected codes are discarded.
    pub fn cancel(mut self) {
        let discarded = self.codes.len();
        self.codes = DedupSet::new();
        self.release();
        info!(session_id = %self.id, discarded, "Scan session cancelled");
    }

    fn limit_reached(&self) -> Option<StopReason> {
        if self.codes.is_empty() {
            return None;
        }
        if !self.config.enable_multi_scan {
            return Some(StopReason::SingleScan);
        }
        if self.codes.len() >= self.config.capacity() {
            return Some(StopReason::CapacityReached);
        }
        None
    }

    fn release(&mut self) {
        // Dropping the feed stops the engine's producer task.
        self.feed = None;
        self.lease = None;
        self.count_tx.send_replace(0);
    }
}

impl fmt::Debug for ScanSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanSession")
            .field("id", &self.id)
            .field("config", &self.config)
            .field("count", &self.codes.len())
            .field("open", &self.is_open())
            .field("last_stop", &self.last_stop)
            .finish()
    }
}

impl Drop for ScanSession {
    fn drop(&mut self) {
        if self.is_open() {
            debug!(session_id = %self.id, "Open session dropped, releasing camera");
        }
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

// =============================================================================
// Scan Handle
// =============================================================================

/// Cancels and observes a session from another task.
#[derive(Clone)]
pub struct ScanHandle {
    session_id: Uuid,
    cancel_tx: mpsc::Sender<()>,
    count_rx: watch::Receiver<usize>,
}

impl ScanHandle {
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Asks the running loop to stop with [`StopReason::Cancelled`].
    ///
    /// A cancel sent while no `run` is in progress stays pending: the next
    /// `run` call returns `Cancelled` without reading the feed.
    pub fn cancel(&self) {
        // A full channel already carries a pending cancel.
        let _ = self.cancel_tx.try_send(());
    }

    /// Current distinct-code count.
    pub fn count(&self) -> usize {
        *self.count_rx.borrow()
    }

    /// Waits for the next counter change. Returns false once the session is
    /// gone.
    pub async fn changed(&mut self) -> bool {
        self.count_rx.changed().await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ChannelEngine;
    use crate::error::EngineError;
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    struct FailingEngine;

    #[async_trait]
    impl DetectionEngine for FailingEngine {
        fn name(&self) -> &str {
            "failing"
        }

        async fn start(
            &self,
            _lease: &CameraLease,
            _config: &ScanConfig,
        ) -> Result<CandidateFeed, EngineError> {
            Err(EngineError::new("vision model missing"))
        }
    }

    #[derive(Default)]
    struct RecordingEmitter {
        detected: StdMutex<Vec<(String, usize)>>,
        stopped: StdMutex<Vec<StopReason>>,
    }

    impl ScanEventEmitter for RecordingEmitter {
        fn emit_detected(&self, _session_id: Uuid, code: &str, count: usize) {
            self.detected.lock().unwrap().push((code.to_string(), count));
        }

        fn emit_stopped(&self, _session_id: Uuid, reason: StopReason, _count: usize) {
            self.stopped.lock().unwrap().push(reason);
        }
    }

    fn controller() -> (ScanController, mpsc::Sender<String>) {
        let (engine, tx) = ChannelEngine::new();
        (ScanController::new(CameraDevice::new("test"), Arc::new(engine)), tx)
    }

    async fn feed(tx: &mpsc::Sender<String>, codes: &[&str]) {
        for code in codes {
            tx.send(code.to_string()).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_redetections_collapse_in_first_seen_order() {
        let (controller, tx) = controller();
        let mut session = controller.start(ScanConfig::default()).await.unwrap();

        feed(&tx, &["8801234567890", "8801234567890", "4901234567891"]).await;
        drop(tx);

        assert_eq!(session.run().await.unwrap(), StopReason::FeedClosed);
        assert_eq!(
            session.complete().unwrap(),
            vec!["8801234567890", "4901234567891"]
        );
        assert!(!controller.camera().is_busy());
    }

    #[tokio::test]
    async fn test_many_redetections_keep_each_code_once() {
        let (controller, tx) = controller();
        let mut session = controller.start(ScanConfig::default()).await.unwrap();

        feed(&tx, &["c", "a", "c", "b", "a", " c ", "", "b", "d"]).await;
        drop(tx);
        session.run().await.unwrap();

        assert_eq!(session.complete().unwrap(), vec!["c", "a", "b", "d"]);
    }

    #[tokio::test]
    async fn test_empty_complete_keeps_session_open() {
        let (controller, tx) = controller();
        let mut session = controller.start(ScanConfig::default()).await.unwrap();

        let err = session.complete().unwrap_err();
        assert!(matches!(err, ScanError::EmptyScan));
        assert!(session.is_open());
        assert!(controller.camera().is_busy());

        // Still scanning after the failed completion
        feed(&tx, &["111"]).await;
        drop(tx);
        session.run().await.unwrap();
        assert_eq!(session.complete().unwrap(), vec!["111"]);
        assert!(matches!(session.complete(), Err(ScanError::SessionClosed)));
    }

    #[tokio::test]
    async fn test_cancel_releases_camera() {
        let (controller, tx) = controller();
        let mut session = controller.start(ScanConfig::default()).await.unwrap();
        feed(&tx, &["111"]).await;
        drop(tx);
        session.run().await.unwrap();

        session.cancel();
        assert!(!controller.camera().is_busy());
    }

    #[tokio::test]
    async fn test_second_session_is_refused_while_first_is_open() {
        let (controller, _tx) = controller();
        let session = controller.start(ScanConfig::default()).await.unwrap();

        let err = controller.start(ScanConfig::default()).await.unwrap_err();
        assert!(matches!(err, ScanError::CameraBusy { .. }));

        drop(session);
        assert!(!controller.camera().is_busy());
    }

    #[tokio::test]
    async fn test_engine_failure_leaves_camera_free() {
        let camera = CameraDevice::new("test");
        let controller = ScanController::new(camera.clone(), Arc::new(FailingEngine));

        let err = controller.start(ScanConfig::default()).await.unwrap_err();
        assert!(matches!(err, ScanError::Initialization { ref engine, .. } if engine == "failing"));
        assert!(!camera.is_busy());
    }

    #[tokio::test]
    async fn test_invalid_config_does_not_touch_camera() {
        let (controller, _tx) = controller();
        let config = ScanConfig {
            max_multi_scan_count: 0,
            ..ScanConfig::default()
        };

        let err = controller.start(config).await.unwrap_err();
        assert!(matches!(err, ScanError::InvalidConfig(_)));
        assert!(!controller.camera().is_busy());
    }

    #[tokio::test]
    async fn test_single_scan_stops_after_first_code() {
        let (controller, tx) = controller();
        let mut session = controller.start(ScanConfig::single()).await.unwrap();

        feed(&tx, &["111", "222"]).await;

        assert_eq!(session.run().await.unwrap(), StopReason::SingleScan);
        assert_eq!(session.complete().unwrap(), vec!["111"]);
    }

    #[tokio::test]
    async fn test_capacity_stops_loop() {
        let (controller, tx) = controller();
        let config = ScanConfig {
            max_multi_scan_count: 2,
            ..ScanConfig::default()
        };
        let mut session = controller.start(config).await.unwrap();

        feed(&tx, &["1", "1", "2", "3"]).await;

        assert_eq!(session.run().await.unwrap(), StopReason::CapacityReached);
        assert!(!session.on_candidate("3"));
        assert_eq!(session.complete().unwrap(), vec!["1", "2"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_stops_loop() {
        let (controller, tx) = controller();
        let config = ScanConfig {
            multi_scan_timeout_ms: 5_000,
            ..ScanConfig::default()
        };
        let mut session = controller.start(config).await.unwrap();
        feed(&tx, &["111"]).await;

        let started = Instant::now();
        assert_eq!(session.run().await.unwrap(), StopReason::TimedOut);
        assert!(started.elapsed() >= Duration::from_secs(5));
        assert_eq!(session.count(), 1);

        // Sender still alive: the feed was open the whole time
        drop(tx);
    }

    #[tokio::test]
    async fn test_handle_cancels_running_loop() {
        let (controller, tx) = controller();
        let mut session = controller.start(ScanConfig::default()).await.unwrap();
        let mut handle = session.handle();

        let producer = tokio::spawn(async move {
            tx.send("111".to_string()).await.unwrap();
            assert!(handle.changed().await);
            assert_eq!(handle.count(), 1);
            handle.cancel();
            tx
        });

        assert_eq!(session.run().await.unwrap(), StopReason::Cancelled);
        let _tx = producer.await.unwrap();

        session.cancel();
        assert!(!controller.camera().is_busy());
    }

    #[tokio::test]
    async fn test_cancel_before_run_is_honoured_by_next_run() {
        let (controller, tx) = controller();
        let mut session = controller.start(ScanConfig::default()).await.unwrap();

        feed(&tx, &["111", "222"]).await;
        session.handle().cancel();

        assert_eq!(session.run().await.unwrap(), StopReason::Cancelled);
        assert_eq!(session.count(), 0);

        // The pending cancel is consumed; the next run reads the feed
        drop(tx);
        assert_eq!(session.run().await.unwrap(), StopReason::FeedClosed);
        assert_eq!(session.complete().unwrap(), vec!["111", "222"]);
    }

    #[tokio::test]
    async fn test_session_debug_omits_internals() {
        let (controller, _tx) = controller();
        let session = controller.start(ScanConfig::default()).await.unwrap();

        let text = format!("{:?}", session);
        assert!(text.starts_with("ScanSession"));
        assert!(text.contains("open: true"));
        assert!(text.contains("count: 0"));
    }

    #[tokio::test]
    async fn test_emitter_sees_each_new_code() {
        let (engine, tx) = ChannelEngine::new();
        let emitter = Arc::new(RecordingEmitter::default());
        let controller = ScanController::with_emitter(
            CameraDevice::new("test"),
            Arc::new(engine),
            emitter.clone(),
        );
        let mut session = controller.start(ScanConfig::default()).await.unwrap();

        feed(&tx, &["a", "a", "b"]).await;
        drop(tx);
        session.run().await.unwrap();

        assert_eq!(
            *emitter.detected.lock().unwrap(),
            vec![("a".to_string(), 1), ("b".to_string(), 2)]
        );
        assert_eq!(*emitter.stopped.lock().unwrap(), vec![StopReason::FeedClosed]);
    }
}
