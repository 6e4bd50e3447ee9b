use std::collections::{HashMap, HashSet};

use cartcheck_core::{ChecklistItem, Detection};

use crate::aggregate::aggregate_detections;
use crate::error::ReconError;
use crate::model::{ReconEntry, ReconResult};

/// Compare the expected checklist against what the detector reported.
///
/// Detections are summed per id first. For every checklist line the detected
/// units up to the expected qty are `matched` and the shortfall is `missing`;
/// both can be emitted for the same id. Detected ids that are not on the
/// checklist go to `extra` with their full summed qty. Surplus units of a
/// checklist id are absorbed, not reported.
///
/// Total over its inputs: never fails, never emits a zero-qty entry.
pub fn reconcile(checklist: &[ChecklistItem], detected: &[Detection]) -> ReconResult {
    let totals = aggregate_detections(detected);
    let detected_qty: HashMap<&str, u32> = totals.iter().map(|t| (t.id.as_str(), t.qty)).collect();

    let expected = merge_checklist(checklist);
    let expected_ids: HashSet<&str> = expected.iter().map(|e| e.id.as_str()).collect();

    let mut result = ReconResult::default();

    for item in &expected {
        let seen = detected_qty.get(item.id.as_str()).copied().unwrap_or(0);
        if seen > 0 {
            result.matched.push(ReconEntry {
                id: item.id.clone(),
                name: item.name.clone(),
                qty: seen.min(item.qty),
            });
        }
        if seen < item.qty {
            result.missing.push(ReconEntry {
                id: item.id.clone(),
                name: item.name.clone(),
                qty: item.qty - seen,
            });
        }
    }

    for total in totals {
        if total.qty > 0 && !expected_ids.contains(total.id.as_str()) {
            result.extra.push(ReconEntry {
                id: total.id,
                name: total.name,
                qty: total.qty,
            });
        }
    }

    log::debug!(
        "reconciled {} checklist lines against {} detections: {} matched, {} missing, {} extra",
        expected.len(),
        detected.len(),
        result.matched.len(),
        result.missing.len(),
        result.extra.len(),
    );

    result
}

/// Collapse repeated checklist ids and drop zero-qty lines, keeping first-seen order.
fn merge_checklist(checklist: &[ChecklistItem]) -> Vec<ReconEntry> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut merged: Vec<ReconEntry> = Vec::new();

    for item in checklist.iter().filter(|c| c.qty > 0) {
        match index.get(item.id.as_str()) {
            Some(&i) => merged[i].qty = merged[i].qty.saturating_add(item.qty),
            None => {
                index.insert(&item.id, merged.len());
                merged.push(ReconEntry {
                    id: item.id.clone(),
                    name: item.name.clone(),
                    qty: item.qty,
                });
            }
        }
    }

    merged
}

// ---------------------------------------------------------------------------
// CSV loading
// ---------------------------------------------------------------------------

/// Load a checklist from CSV with columns `id,name,qty` and optional `size`.
pub fn load_checklist_csv(csv_data: &str) -> Result<Vec<ChecklistItem>, ReconError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_reader(csv_data.as_bytes());

    let headers = header_names(&mut reader)?;
    let idx = |name: &str| column_index(&headers, "checklist", name);

    let id_idx = idx("id")?;
    let name_idx = idx("name")?;
    let qty_idx = idx("qty")?;
    let size_idx = headers.iter().position(|h| h == "size");

    let mut items = Vec::new();
    for record in reader.records() {
        let record = record?;
        let id = record.get(id_idx).unwrap_or("").to_string();
        let qty = parse_qty("checklist", &id, record.get(qty_idx).unwrap_or(""))?;
        let size = size_idx
            .and_then(|i| record.get(i))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        items.push(ChecklistItem {
            name: record.get(name_idx).unwrap_or("").to_string(),
            id,
            qty,
            size,
        });
    }

    Ok(items)
}

/// Load detections from CSV with columns `id,name,qty`.
pub fn load_detections_csv(csv_data: &str) -> Result<Vec<Detection>, ReconError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_reader(csv_data.as_bytes());

    let headers = header_names(&mut reader)?;
    let idx = |name: &str| column_index(&headers, "detections", name);

    let id_idx = idx("id")?;
    let name_idx = idx("name")?;
    let qty_idx = idx("qty")?;

    let mut detections = Vec::new();
    for record in reader.records() {
        let record = record?;
        let id = record.get(id_idx).unwrap_or("").to_string();
        let qty = parse_qty("detections", &id, record.get(qty_idx).unwrap_or(""))?;
        detections.push(Detection {
            name: record.get(name_idx).unwrap_or("").to_string(),
            id,
            qty,
        });
    }

    Ok(detections)
}

fn header_names(reader: &mut csv::Reader<&[u8]>) -> Result<Vec<String>, ReconError> {
    Ok(reader.headers()?.iter().map(|h| h.to_string()).collect())
}

fn column_index(headers: &[String], input: &str, name: &str) -> Result<usize, ReconError> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| ReconError::MissingColumn {
            input: input.into(),
            column: name.into(),
        })
}

fn parse_qty(input: &str, id: &str, value: &str) -> Result<u32, ReconError> {
    match value.trim().parse::<u32>() {
        Ok(qty) if qty >= 1 => Ok(qty),
        _ => Err(ReconError::InvalidQuantity {
            input: input.into(),
            id: id.into(),
            value: value.into(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, qty: u32) -> ChecklistItem {
        ChecklistItem::new(id, format!("Item {id}"), qty)
    }

    fn det(id: &str, qty: u32) -> Detection {
        Detection::new(id, format!("Item {id}"), qty)
    }

    fn entry(id: &str, qty: u32) -> ReconEntry {
        ReconEntry {
            id: id.into(),
            name: format!("Item {id}"),
            qty,
        }
    }

    #[test]
    fn partial_detection_splits_into_matched_and_missing() {
        let result = reconcile(&[item("a", 3)], &[det("a", 1)]);
        assert_eq!(result.matched, vec![entry("a", 1)]);
        assert_eq!(result.missing, vec![entry("a", 2)]);
        assert!(result.extra.is_empty());
    }

    #[test]
    fn undetected_item_is_fully_missing() {
        let result = reconcile(&[item("a", 2), item("b", 1)], &[det("b", 1)]);
        assert_eq!(result.matched, vec![entry("b", 1)]);
        assert_eq!(result.missing, vec![entry("a", 2)]);
    }

    #[test]
    fn full_match_has_no_missing_record() {
        let result = reconcile(&[item("a", 2)], &[det("a", 2)]);
        assert_eq!(result.matched, vec![entry("a", 2)]);
        assert!(result.missing.is_empty());
        assert!(result.is_clean());
    }

    #[test]
    fn over_detection_caps_matched_at_expected() {
        let result = reconcile(&[item("a", 2)], &[det("a", 5)]);
        assert_eq!(result.matched, vec![entry("a", 2)]);
        assert!(result.missing.is_empty());
        assert!(result.extra.is_empty());
    }

    #[test]
    fn duplicate_detections_are_aggregated() {
        let result = reconcile(&[item("a", 3)], &[det("a", 1), det("a", 1), det("a", 1)]);
        assert_eq!(result.matched, vec![entry("a", 3)]);
        assert!(result.missing.is_empty());
    }

    #[test]
    fn unknown_ids_are_extra_once_with_summed_qty() {
        let result = reconcile(
            &[item("a", 1)],
            &[det("a", 1), det("x", 1), det("x", 2)],
        );
        assert_eq!(result.extra, vec![entry("x", 3)]);
    }

    #[test]
    fn zero_qty_checklist_line_is_ignored() {
        let result = reconcile(&[item("a", 0)], &[det("a", 1)]);
        assert!(result.matched.is_empty());
        assert!(result.missing.is_empty());
        assert_eq!(result.extra, vec![entry("a", 1)]);
    }

    #[test]
    fn repeated_checklist_ids_are_merged() {
        let result = reconcile(&[item("a", 1), item("a", 2)], &[det("a", 2)]);
        assert_eq!(result.matched, vec![entry("a", 2)]);
        assert_eq!(result.missing, vec![entry("a", 1)]);
    }

    #[test]
    fn load_checklist_basic() {
        let csv = "\
id,name,qty,size
sku-1,Milk,2,1l
sku-2,\"Chips, salted\",1,
";
        let items = load_checklist_csv(csv).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].size.as_deref(), Some("1l"));
        assert_eq!(items[1].name, "Chips, salted");
        assert_eq!(items[1].size, None);
    }

    #[test]
    fn load_checklist_without_size_column() {
        let items = load_checklist_csv("id,name,qty\nsku-1,Milk,2\n").unwrap();
        assert_eq!(items[0].qty, 2);
        assert_eq!(items[0].size, None);
    }

    #[test]
    fn load_checklist_rejects_zero_qty() {
        let err = load_checklist_csv("id,name,qty\nsku-1,Milk,0\n").unwrap_err();
        assert!(matches!(err, ReconError::InvalidQuantity { .. }));
    }

    #[test]
    fn load_checklist_rejects_negative_qty() {
        let err = load_checklist_csv("id,name,qty\nsku-1,Milk,-2\n").unwrap_err();
        assert!(matches!(err, ReconError::InvalidQuantity { .. }));
    }

    #[test]
    fn load_detections_missing_column() {
        let err = load_detections_csv("id,name\nsku-1,Milk\n").unwrap_err();
        match err {
            ReconError::MissingColumn { column, .. } => assert_eq!(column, "qty"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
