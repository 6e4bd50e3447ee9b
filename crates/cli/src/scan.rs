//! `cartcheck scan` — run one video-scan session headlessly.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use cartcheck_config::Settings;
use cartcheck_core::{estimate_with_capacity, BasketItem, BasketRepository, InMemoryBasket};
use cartcheck_recon::{build_report, Detector, SimulatedDetector};
use cartcheck_session::{
    CaptureDevice, CaptureError, ScanSession, ScanState, SessionConfig, SessionError,
    VirtualCamera,
};

use crate::predictions::PredictionsFile;
use crate::{emit_report, model_detector, read_checklist, simulator_config, CameraSource, CliError};

pub struct ScanOptions {
    pub seed: Option<u64>,
    pub stop_after_ms: Option<u64>,
    pub predictions: Option<PathBuf>,
    pub camera: CameraSource,
    pub json: bool,
    pub csv: Option<PathBuf>,
}

pub fn cmd_scan(
    settings: &Settings,
    checklist_path: &Path,
    opts: ScanOptions,
) -> Result<(), CliError> {
    let checklist = read_checklist(checklist_path)?;
    let items = checklist
        .into_iter()
        .map(|c| BasketItem {
            qty: c.qty,
            size: c.size,
            ..BasketItem::new(c.id, c.name, 0.0)
        })
        .collect();
    let basket = Arc::new(
        InMemoryBasket::from_items(items)
            .map_err(|e| CliError::parse(format!("{}: {e}", checklist_path.display())))?,
    );

    let seed = opts.seed.or(settings.seed);
    let detector: Arc<dyn Detector> = match (opts.predictions, seed) {
        (Some(path), _) => {
            if !path.is_file() {
                return Err(CliError::io(format!("cannot read {}", path.display())));
            }
            Arc::new(model_detector(settings, PredictionsFile::new(path)))
        }
        (None, Some(seed)) => {
            Arc::new(SimulatedDetector::seeded(simulator_config(settings), seed))
        }
        (None, None) => Arc::new(SimulatedDetector::new(simulator_config(settings))),
    };
    let config = SessionConfig {
        tick_interval: Duration::from_millis(settings.tick_interval_ms),
        max_progress_step: settings.max_progress_step,
        max_overlays: settings.max_overlays,
        overlay_probability: settings.overlay_probability,
        seed,
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .map_err(|e| CliError::io(format!("cannot start runtime: {e}")))?;

    let camera: Arc<dyn CaptureDevice> = match opts.camera {
        CameraSource::Virtual => Arc::new(VirtualCamera::new()),
        CameraSource::Absent => Arc::new(VirtualCamera::refusing(
            CaptureError::DeviceUnavailable("no camera attached".into()),
        )),
    };
    let snapshot = runtime.block_on(run_session(
        Arc::clone(&basket) as Arc<dyn BasketRepository>,
        camera,
        detector,
        config,
        opts.stop_after_ms.map(Duration::from_millis),
    ))?;

    for message in basket.recent_activity().iter().rev() {
        log::info!("activity: {message}");
    }

    let Some(result) = snapshot.result else {
        return Err(CliError::io("scan ended without a result"));
    };
    let capacity = estimate_with_capacity(&snapshot.checklist, settings.capacity_liters);
    let report = build_report(&snapshot.checklist, &snapshot.detections, result, Some(capacity));
    emit_report(&report, settings, opts.json, opts.csv)
}

async fn run_session(
    basket: Arc<dyn BasketRepository>,
    camera: Arc<dyn CaptureDevice>,
    detector: Arc<dyn Detector>,
    config: SessionConfig,
    stop_after: Option<Duration>,
) -> Result<cartcheck_session::SessionSnapshot, CliError> {
    let mut session = ScanSession::new(basket, camera, detector, config);
    let mut rx = session.subscribe();

    session.start().await.map_err(|e| match e {
        SessionError::Capture(_) => {
            CliError::capture(e.to_string())
                .with_hint("check that a camera is attached and permission is granted")
        }
        other => CliError::usage(other.to_string()),
    })?;

    let deadline = tokio::time::sleep(stop_after.unwrap_or(Duration::from_secs(24 * 60 * 60)));
    tokio::pin!(deadline);
    let mut last_reported = 0u8;

    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let (state, progress) = {
                    let snap = rx.borrow_and_update();
                    (snap.state, snap.progress)
                };
                if progress >= last_reported.saturating_add(10) || state == ScanState::Completed {
                    eprintln!("scanning... {progress}%");
                    last_reported = progress;
                }
                if state == ScanState::Completed {
                    break;
                }
            }
            _ = &mut deadline, if stop_after.is_some() => {
                eprintln!("stopping scan at {}%", session.progress());
                session.stop();
                break;
            }
        }
    }

    let snapshot = session.snapshot();
    session.shutdown();
    Ok(snapshot)
}
