//! Camera access seen from the scan session.

use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

/// Opaque handle to an acquired video stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamHandle(u64);

impl StreamHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// The user or platform refused camera access.
    PermissionDenied,
    /// No usable camera (absent, busy, or failed to start).
    DeviceUnavailable(String),
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PermissionDenied => write!(f, "camera permission denied"),
            Self::DeviceUnavailable(msg) => write!(f, "camera unavailable: {msg}"),
        }
    }
}

impl std::error::Error for CaptureError {}

/// A video source the session holds exclusively while scanning.
#[async_trait]
pub trait CaptureDevice: Send + Sync {
    async fn acquire(&self) -> Result<StreamHandle, CaptureError>;

    /// Release a stream. Releasing an already-released handle is a no-op.
    fn release(&self, handle: StreamHandle);
}

/// In-process camera for headless runs and tests.
///
/// Can be configured to refuse acquisition, and tracks which handles are open.
#[derive(Debug, Default)]
pub struct VirtualCamera {
    refuse_with: Option<CaptureError>,
    next_id: AtomicU64,
    open: Mutex<HashSet<StreamHandle>>,
    acquired: AtomicU64,
    released: AtomicU64,
}

impl VirtualCamera {
    pub fn new() -> Self {
        Self::default()
    }

    /// A camera whose every `acquire` fails with `error`.
    pub fn refusing(error: CaptureError) -> Self {
        Self {
            refuse_with: Some(error),
            ..Self::default()
        }
    }

    pub fn open_streams(&self) -> usize {
        self.open.lock().unwrap().len()
    }

    /// Successful acquisitions so far.
    pub fn acquire_count(&self) -> u64 {
        self.acquired.load(Ordering::SeqCst)
    }

    /// Releases that actually closed an open stream.
    pub fn release_count(&self) -> u64 {
        self.released.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CaptureDevice for VirtualCamera {
    async fn acquire(&self) -> Result<StreamHandle, CaptureError> {
        if let Some(err) = &self.refuse_with {
            return Err(err.clone());
        }
        let handle = StreamHandle::new(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.open.lock().unwrap().insert(handle);
        self.acquired.fetch_add(1, Ordering::SeqCst);
        log::debug!("virtual camera: stream {} opened", handle.id());
        Ok(handle)
    }

    fn release(&self, handle: StreamHandle) {
        if self.open.lock().unwrap().remove(&handle) {
            self.released.fetch_add(1, Ordering::SeqCst);
            log::debug!("virtual camera: stream {} closed", handle.id());
        }
    }
}
