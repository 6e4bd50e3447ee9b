//! Basket video-scan session.
//!
//! ```text
//! idle ──start──▶ scanning ──progress 100──▶ completed
//!                    │                          │
//!                    └──────────stop────────────┘
//! completed ──start──▶ scanning (all session fields reset)
//! scanning ──shutdown/drop──▶ idle (scan abandoned, no result)
//! ```
//!
//! While scanning, one ticker task advances progress. It is the only
//! background task the session owns and it ends on every exit from
//! `scanning`: on completion it returns by itself, `stop`, `shutdown` and
//! `Drop` abort it. The capture stream is released only by `stop` and
//! `shutdown`/`Drop`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use cartcheck_core::{BasketRepository, ChecklistItem, Detection};
use cartcheck_recon::{reconcile, Detector, ReconResult};

use crate::capture::{CaptureDevice, StreamHandle};
use crate::error::SessionError;
use crate::overlay::{random_overlay, OverlayBox};

pub const ACTIVITY_COMPLETED: &str = "Completed basket video scan";
pub const ACTIVITY_STOPPED: &str = "Stopped basket video scan";
pub const ACTIVITY_CONFIRMED: &str = "Confirmed scan report";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanState {
    Idle,
    Scanning,
    Completed,
}

impl std::fmt::Display for ScanState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Scanning => write!(f, "scanning"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

/// Shopper's answer to "Is this correct?" on a missing or extra entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Confirmed,
    Disputed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub tick_interval: Duration,
    /// Upper bound of the random per-tick progress increment (percent).
    pub max_progress_step: f64,
    pub max_overlays: usize,
    pub overlay_probability: f64,
    /// Seed for progress and overlay randomness.
    pub seed: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(400),
            max_progress_step: 18.0,
            max_overlays: 7,
            overlay_probability: 0.4,
            seed: None,
        }
    }
}

/// Observable state, published on every tick and transition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub state: ScanState,
    pub progress: u8,
    pub checklist: Vec<ChecklistItem>,
    pub detections: Vec<Detection>,
    pub overlays: Vec<OverlayBox>,
    pub result: Option<ReconResult>,
}

impl SessionSnapshot {
    fn idle() -> Self {
        Self {
            state: ScanState::Idle,
            progress: 0,
            checklist: Vec::new(),
            detections: Vec::new(),
            overlays: Vec::new(),
            result: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Shared core
// ---------------------------------------------------------------------------

struct Core {
    snapshot: SessionSnapshot,
    /// Unrounded progress; `snapshot.progress` is its rounded value.
    progress_raw: f64,
    feedback: HashMap<String, Verdict>,
    rng: StdRng,
}

/// State reachable from both the session handle and its ticker task.
struct Shared {
    core: Mutex<Core>,
    basket: Arc<dyn BasketRepository>,
    detector: Arc<dyn Detector>,
    config: SessionConfig,
    tx: watch::Sender<SessionSnapshot>,
}

impl Shared {
    fn publish(&self, core: &Core) {
        self.tx.send_replace(core.snapshot.clone());
    }

    /// One progress step. Returns false once the ticker should exit.
    fn advance(&self) -> bool {
        let mut core = self.core.lock().unwrap();
        if core.snapshot.state != ScanState::Scanning {
            return false;
        }

        let step = core.rng.gen::<f64>() * self.config.max_progress_step;
        core.progress_raw = (core.progress_raw + step).min(100.0);
        core.snapshot.progress = core.progress_raw.round() as u8;

        if core.snapshot.overlays.len() < self.config.max_overlays
            && core.rng.gen_bool(self.config.overlay_probability)
        {
            let overlay = random_overlay(&mut core.rng);
            core.snapshot.overlays.push(overlay);
        }

        if core.progress_raw >= 100.0 {
            self.finish(core, ACTIVITY_COMPLETED);
            return false;
        }

        log::trace!("scan progress {}%", core.snapshot.progress);
        self.publish(&core);
        true
    }

    /// Run the detector and reconciliation, enter `completed`, emit `activity`.
    fn finish(&self, mut core: std::sync::MutexGuard<'_, Core>, activity: &str) {
        let checklist = core.snapshot.checklist.clone();
        let mut detections = std::mem::take(&mut core.snapshot.detections);
        detections.extend(self.detector.detect(&checklist));

        let result = reconcile(&checklist, &detections);
        log::info!(
            "scan finished at {}%: {} matched, {} missing, {} extra",
            core.snapshot.progress,
            result.matched.len(),
            result.missing.len(),
            result.extra.len(),
        );

        core.snapshot.detections = detections;
        core.snapshot.result = Some(result);
        core.snapshot.state = ScanState::Completed;
        self.publish(&core);
        drop(core);

        self.basket.add_activity(activity);
    }
}

async fn run_ticker(shared: Arc<Shared>) {
    let period = shared.config.tick_interval;
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        if !shared.advance() {
            break;
        }
    }
    log::debug!("scan ticker exited");
}

// ---------------------------------------------------------------------------
// Session handle
// ---------------------------------------------------------------------------

/// A single basket scan. At most one should exist per basket at a time.
pub struct ScanSession {
    shared: Arc<Shared>,
    capture: Arc<dyn CaptureDevice>,
    stream: Option<StreamHandle>,
    ticker: Option<JoinHandle<()>>,
}

impl ScanSession {
    pub fn new(
        basket: Arc<dyn BasketRepository>,
        capture: Arc<dyn CaptureDevice>,
        detector: Arc<dyn Detector>,
        config: SessionConfig,
    ) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let config = SessionConfig {
            overlay_probability: config.overlay_probability.clamp(0.0, 1.0),
            max_progress_step: config.max_progress_step.max(0.0),
            ..config
        };
        let (tx, _rx) = watch::channel(SessionSnapshot::idle());

        Self {
            shared: Arc::new(Shared {
                core: Mutex::new(Core {
                    snapshot: SessionSnapshot::idle(),
                    progress_raw: 0.0,
                    feedback: HashMap::new(),
                    rng,
                }),
                basket,
                detector,
                config,
                tx,
            }),
            capture,
            stream: None,
            ticker: None,
        }
    }

    pub fn state(&self) -> ScanState {
        self.shared.core.lock().unwrap().snapshot.state
    }

    pub fn progress(&self) -> u8 {
        self.shared.core.lock().unwrap().snapshot.progress
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.shared.core.lock().unwrap().snapshot.clone()
    }

    pub fn result(&self) -> Option<ReconResult> {
        self.shared.core.lock().unwrap().snapshot.result.clone()
    }

    /// Receive a snapshot after every tick and transition.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.shared.tx.subscribe()
    }

    /// True while a capture stream is held.
    pub fn has_stream(&self) -> bool {
        self.stream.is_some()
    }

    /// True while the progress ticker task is alive.
    pub fn ticker_active(&self) -> bool {
        self.ticker.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Begin a scan from `idle` or `completed`.
    ///
    /// On capture failure nothing changes and the error is returned.
    pub async fn start(&mut self) -> Result<(), SessionError> {
        if self.state() == ScanState::Scanning {
            return Err(SessionError::AlreadyScanning);
        }

        // A completed scan keeps its stream until stop; hand it back first.
        self.release_stream();
        self.cancel_ticker();

        let handle = self.capture.acquire().await.map_err(|e| {
            log::warn!("camera init failed: {e}");
            SessionError::Capture(e)
        })?;
        self.stream = Some(handle);

        let checklist = self.shared.basket.checklist();
        {
            let mut core = self.shared.core.lock().unwrap();
            core.progress_raw = 0.0;
            core.feedback.clear();
            core.snapshot = SessionSnapshot {
                state: ScanState::Scanning,
                progress: 0,
                checklist,
                detections: Vec::new(),
                overlays: Vec::new(),
                result: None,
            };
            log::info!(
                "scan started on stream {} with {} checklist lines",
                handle.id(),
                core.snapshot.checklist.len()
            );
            self.shared.publish(&core);
        }

        self.ticker = Some(tokio::spawn(run_ticker(Arc::clone(&self.shared))));
        Ok(())
    }

    /// Stop the camera. A running scan is finalized immediately with whatever
    /// the detector reports now. From `idle` this does nothing.
    pub fn stop(&mut self) {
        self.cancel_ticker();
        self.release_stream();

        let core = self.shared.core.lock().unwrap();
        if core.snapshot.state == ScanState::Scanning {
            self.shared.finish(core, ACTIVITY_STOPPED);
        }
    }

    /// Append live detections from a streaming detector. Only while scanning.
    pub fn record_detections(&self, batch: Vec<Detection>) -> Result<(), SessionError> {
        let mut core = self.shared.core.lock().unwrap();
        if core.snapshot.state != ScanState::Scanning {
            return Err(SessionError::NotScanning);
        }
        core.snapshot.detections.extend(batch);
        self.shared.publish(&core);
        Ok(())
    }

    /// Mark a missing or extra entry of the finished report as right or wrong.
    pub fn record_feedback(&self, id: &str, verdict: Verdict) -> Result<(), SessionError> {
        let mut core = self.shared.core.lock().unwrap();
        let Some(result) = core.snapshot.result.as_ref() else {
            return Err(SessionError::NotCompleted);
        };
        let known = result
            .missing
            .iter()
            .chain(&result.extra)
            .any(|e| e.id == id);
        if !known {
            return Err(SessionError::UnknownEntry(id.to_string()));
        }
        core.feedback.insert(id.to_string(), verdict);
        Ok(())
    }

    pub fn feedback(&self) -> HashMap<String, Verdict> {
        self.shared.core.lock().unwrap().feedback.clone()
    }

    /// Accept the finished report.
    pub fn confirm_report(&self) -> Result<(), SessionError> {
        if self.state() != ScanState::Completed {
            return Err(SessionError::NotCompleted);
        }
        self.shared.basket.add_activity(ACTIVITY_CONFIRMED);
        Ok(())
    }

    /// Teardown: cancel the ticker and release the camera. Safe to repeat.
    ///
    /// Unlike `stop`, a running scan is abandoned without a result and the
    /// session returns to `idle`. A completed scan keeps its result.
    pub fn shutdown(&mut self) {
        self.cancel_ticker();
        self.release_stream();

        let mut core = self.shared.core.lock().unwrap();
        if core.snapshot.state == ScanState::Scanning {
            log::info!("scan abandoned at {}%", core.snapshot.progress);
            core.snapshot = SessionSnapshot::idle();
            core.progress_raw = 0.0;
            core.feedback.clear();
            self.shared.publish(&core);
        }
    }

    fn cancel_ticker(&mut self) {
        if let Some(handle) = self.ticker.take() {
            if !handle.is_finished() {
                log::debug!("cancelling scan ticker");
            }
            handle.abort();
        }
    }

    fn release_stream(&mut self) {
        if let Some(handle) = self.stream.take() {
            log::debug!("releasing capture stream {}", handle.id());
            self.capture.release(handle);
        }
    }
}

impl Drop for ScanSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}
