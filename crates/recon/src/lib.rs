//! `cartcheck-recon` — checklist vs. detection reconciliation engine.
//!
//! Pure engine crate: receives a checklist snapshot and detections, returns
//! matched / missing / extra entries. CSV helpers load inputs and export reports.

pub mod aggregate;
pub mod detector;
pub mod engine;
pub mod error;
pub mod export;
pub mod model;
pub mod summary;

pub use detector::{Detector, ModelDetector, SimulatedDetector, SimulatorConfig};
pub use engine::{load_checklist_csv, load_detections_csv, reconcile};
pub use error::ReconError;
pub use export::{parse_report_csv, serialize_rows, to_rows, write_report_csv};
pub use model::{EntryKind, ReconEntry, ReconResult, ReconSummary, ReportRow, ScanReport};
pub use summary::{alert_lines, build_report, compute_summary};
