//! Free-text package size → liters.
//!
//! Recognized units, tried in this order: `ml`, `l`, `g`, `kg`. The first
//! pattern that matches anywhere in the string wins, so "1l 500ml" reads as
//! 0.5 L. Weights are converted with an assumed density of 0.8 kg/L.

use std::sync::OnceLock;

use regex::Regex;

/// Average-volume default for missing or unreadable sizes.
pub const FALLBACK_LITERS: f64 = 0.75;

/// Assumed density (kg per liter) for weight-labelled goods.
pub const ASSUMED_DENSITY_KG_PER_L: f64 = 0.8;

#[derive(Debug, Clone, Copy)]
enum Unit {
    Milliliter,
    Liter,
    Gram,
    Kilogram,
}

impl Unit {
    fn to_liters(self, magnitude: f64) -> f64 {
        match self {
            Self::Milliliter => magnitude / 1000.0,
            Self::Liter => magnitude,
            Self::Gram => magnitude / 1000.0 * ASSUMED_DENSITY_KG_PER_L,
            Self::Kilogram => magnitude * ASSUMED_DENSITY_KG_PER_L,
        }
    }
}

fn patterns() -> &'static [(Unit, Regex)] {
    static PATTERNS: OnceLock<Vec<(Unit, Regex)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            (Unit::Milliliter, r"([0-9]+(?:\.[0-9]+)?)\s*ml"),
            (Unit::Liter, r"([0-9]+(?:\.[0-9]+)?)\s*l"),
            (Unit::Gram, r"([0-9]+(?:\.[0-9]+)?)\s*g"),
            (Unit::Kilogram, r"([0-9]+(?:\.[0-9]+)?)\s*kg"),
        ]
        .into_iter()
        .map(|(unit, pat)| (unit, Regex::new(pat).unwrap()))
        .collect()
    })
}

/// Parse a package size into liters. Never fails: anything unreadable
/// (including a zero magnitude) yields [`FALLBACK_LITERS`].
pub fn parse_size_liters(size: Option<&str>) -> f64 {
    let Some(raw) = size else {
        return FALLBACK_LITERS;
    };
    let s = raw.trim().to_lowercase();
    if s.is_empty() {
        return FALLBACK_LITERS;
    }

    for (unit, re) in patterns() {
        let Some(caps) = re.captures(&s) else {
            continue;
        };
        let liters = caps
            .get(1)
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .map(|magnitude| unit.to_liters(magnitude));
        return match liters {
            Some(l) if l > 0.0 && l.is_finite() => l,
            _ => FALLBACK_LITERS,
        };
    }

    log::debug!("unrecognized package size {raw:?}, using {FALLBACK_LITERS} L");
    FALLBACK_LITERS
}
