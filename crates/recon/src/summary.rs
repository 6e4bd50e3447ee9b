use cartcheck_core::{CapacityEstimate, ChecklistItem, Detection};

use crate::model::{ReconEntry, ReconResult, ReconSummary, ReportMeta, ScanReport};

/// Compute unit totals for display ("Scan finished. 5/6 items matched.").
pub fn compute_summary(
    checklist: &[ChecklistItem],
    detected: &[Detection],
    result: &ReconResult,
) -> ReconSummary {
    let units = |entries: &[ReconEntry]| entries.iter().map(|e| u64::from(e.qty)).sum::<u64>();

    ReconSummary {
        total_expected: checklist.iter().map(|c| u64::from(c.qty)).sum(),
        total_detected: detected.iter().map(|d| u64::from(d.qty)).sum(),
        matched_units: units(&result.matched),
        missing_units: units(&result.missing),
        extra_units: units(&result.extra),
        all_matched: result.is_clean(),
    }
}

/// Human-readable alert lines for a finished reconciliation.
pub fn alert_lines(result: &ReconResult) -> Vec<String> {
    let describe = |entries: &[ReconEntry]| {
        entries
            .iter()
            .map(|e| format!("{} ×{}", e.name, e.qty))
            .collect::<Vec<_>>()
            .join(", ")
    };

    let mut lines = Vec::new();
    if !result.missing.is_empty() {
        lines.push(format!("Missing: {}", describe(&result.missing)));
    }
    if !result.extra.is_empty() {
        lines.push(format!("Extra/Unknown: {}", describe(&result.extra)));
    }
    if lines.is_empty() {
        lines.push("All items matched.".to_string());
    }
    lines
}

/// Wrap a result with summary, optional capacity estimate and run metadata.
pub fn build_report(
    checklist: &[ChecklistItem],
    detected: &[Detection],
    result: ReconResult,
    capacity: Option<CapacityEstimate>,
) -> ScanReport {
    let summary = compute_summary(checklist, detected, &result);
    ScanReport {
        meta: ReportMeta {
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            generated_at: chrono::Utc::now().to_rfc3339(),
        },
        summary,
        result,
        capacity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::reconcile;

    #[test]
    fn summary_counts() {
        let checklist = vec![
            ChecklistItem::new("a", "Apples", 3),
            ChecklistItem::new("b", "Bread", 1),
        ];
        let detected = vec![Detection::new("a", "Apples", 2), Detection::new("z", "Unknown Item", 1)];
        let result = reconcile(&checklist, &detected);
        let summary = compute_summary(&checklist, &detected, &result);

        assert_eq!(summary.total_expected, 4);
        assert_eq!(summary.total_detected, 3);
        assert_eq!(summary.matched_units, 2);
        assert_eq!(summary.missing_units, 2);
        assert_eq!(summary.extra_units, 1);
        assert!(!summary.all_matched);
    }

    #[test]
    fn alerts_for_clean_result() {
        assert_eq!(alert_lines(&ReconResult::default()), vec!["All items matched."]);
    }

    #[test]
    fn alerts_list_missing_and_extra() {
        let checklist = vec![ChecklistItem::new("a", "Apples", 2)];
        let detected = vec![Detection::new("x", "Unknown Item", 1)];
        let lines = alert_lines(&reconcile(&checklist, &detected));
        assert_eq!(lines, vec!["Missing: Apples ×2", "Extra/Unknown: Unknown Item ×1"]);
    }

    #[test]
    fn report_carries_version() {
        let report = build_report(&[], &[], ReconResult::default(), None);
        assert_eq!(report.meta.engine_version, env!("CARGO_PKG_VERSION"));
        assert!(report.summary.all_matched);
    }
}
