//! Live bounding-box decoration shown while scanning. Purely visual:
//! reconciliation never reads overlays.

use rand::Rng;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayStatus {
    Match,
    Extra,
    Missing,
}

/// Box geometry in percent of the video frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayBox {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    pub label: String,
    pub status: OverlayStatus,
}

pub fn random_overlay(rng: &mut impl Rng) -> OverlayBox {
    OverlayBox {
        x: rng.gen_range(5.0..75.0),
        y: rng.gen_range(5.0..55.0),
        w: rng.gen_range(10.0..30.0),
        h: rng.gen_range(8.0..23.0),
        label: if rng.gen_bool(0.7) { "Item" } else { "Unknown" }.to_string(),
        status: OverlayStatus::Match,
    }
}
