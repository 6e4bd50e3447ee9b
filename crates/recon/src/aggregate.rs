use std::collections::HashMap;

use cartcheck_core::Detection;

use crate::model::DetectedTotal;

/// Group detections by id and sum quantities. Output keeps first-seen order.
pub fn aggregate_detections(detections: &[Detection]) -> Vec<DetectedTotal> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut totals: Vec<DetectedTotal> = Vec::new();

    for d in detections {
        match index.get(d.id.as_str()) {
            Some(&i) => {
                let total = &mut totals[i];
                total.qty = total.qty.saturating_add(d.qty);
                total.detection_count += 1;
            }
            None => {
                index.insert(&d.id, totals.len());
                totals.push(DetectedTotal {
                    id: d.id.clone(),
                    name: d.name.clone(),
                    qty: d.qty,
                    detection_count: 1,
                });
            }
        }
    }

    totals
}
