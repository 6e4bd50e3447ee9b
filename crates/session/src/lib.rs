//! `cartcheck-session` — basket video-scan session.
//!
//! Owns the camera stream and the progress ticker for one scan, and hands the
//! finished checklist/detections pair to the reconciliation engine.

pub mod capture;
pub mod error;
pub mod overlay;
pub mod session;

pub use capture::{CaptureDevice, CaptureError, StreamHandle, VirtualCamera};
pub use error::SessionError;
pub use overlay::{random_overlay, OverlayBox, OverlayStatus};
pub use session::{
    ScanSession, ScanState, SessionConfig, SessionSnapshot, Verdict, ACTIVITY_COMPLETED,
    ACTIVITY_CONFIRMED, ACTIVITY_STOPPED,
};
