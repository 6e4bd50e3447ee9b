use serde::Serialize;

use crate::model::ChecklistItem;
use crate::size::parse_size_liters;

/// Usable volume of a standard hand basket.
pub const BASKET_CAPACITY_LITERS: f64 = 40.0;

/// Fill level above which the basket is reported as nearly full.
pub const NEAR_FULL_PERCENT: u8 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CapacityEstimate {
    pub used_liters: f64,
    pub capacity_liters: f64,
    /// Rounded and clamped to 0..=100.
    pub fill_percent: u8,
}

impl CapacityEstimate {
    pub fn near_full(&self, threshold_percent: u8) -> bool {
        self.fill_percent > threshold_percent
    }
}

/// Estimate basket fill against [`BASKET_CAPACITY_LITERS`].
pub fn estimate(checklist: &[ChecklistItem]) -> CapacityEstimate {
    estimate_with_capacity(checklist, BASKET_CAPACITY_LITERS)
}

/// Estimate basket fill against a configured capacity.
pub fn estimate_with_capacity(checklist: &[ChecklistItem], capacity_liters: f64) -> CapacityEstimate {
    let used_liters: f64 = checklist
        .iter()
        .map(|item| parse_size_liters(item.size.as_deref()) * f64::from(item.qty))
        .sum();

    let fill_percent = if capacity_liters > 0.0 {
        (used_liters / capacity_liters * 100.0).min(100.0).round() as u8
    } else {
        100
    };

    CapacityEstimate {
        used_liters,
        capacity_liters,
        fill_percent,
    }
}
