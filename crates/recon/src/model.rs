use serde::{Deserialize, Serialize};

use cartcheck_core::CapacityEstimate;

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// All detections sharing one product id, quantities summed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedTotal {
    pub id: String,
    /// Name from the first detection seen for this id.
    pub name: String,
    pub qty: u32,
    pub detection_count: usize,
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    Matched,
    Missing,
    Extra,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Matched => "Matched",
            Self::Missing => "Missing",
            Self::Extra => "Extra",
        }
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconEntry {
    pub id: String,
    pub name: String,
    pub qty: u32,
}

/// Outcome of comparing a checklist with detections.
///
/// Each list holds at most one entry per id and never a zero-qty entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconResult {
    pub matched: Vec<ReconEntry>,
    pub missing: Vec<ReconEntry>,
    pub extra: Vec<ReconEntry>,
}

impl ReconResult {
    pub fn entries(&self, kind: EntryKind) -> &[ReconEntry] {
        match kind {
            EntryKind::Matched => &self.matched,
            EntryKind::Missing => &self.missing,
            EntryKind::Extra => &self.extra,
        }
    }

    /// True when nothing is missing and nothing unexpected was seen.
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.extra.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconSummary {
    pub total_expected: u64,
    pub total_detected: u64,
    pub matched_units: u64,
    pub missing_units: u64,
    pub extra_units: u64,
    pub all_matched: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportMeta {
    pub engine_version: String,
    pub generated_at: String,
}

/// Serializable envelope for a finished scan.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub meta: ReportMeta,
    pub summary: ReconSummary,
    pub result: ReconResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<CapacityEstimate>,
}

/// One line of the tabular export. Field order is the CSV column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub id: String,
    pub name: String,
    pub qty: u32,
}
