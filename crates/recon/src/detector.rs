//! Detection sources.
//!
//! Reconciliation only ever sees `Vec<Detection>`; which [`Detector`] produced
//! it is invisible to the engine.

use std::collections::HashSet;
use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;

use cartcheck_core::{ChecklistItem, Detection};

use crate::aggregate::aggregate_detections;

/// Produces detections for a finished (or stopped) scan.
pub trait Detector: Send + Sync {
    fn detect(&self, checklist: &[ChecklistItem]) -> Vec<Detection>;
}

// ---------------------------------------------------------------------------
// Simulated
// ---------------------------------------------------------------------------

pub const UNKNOWN_ITEM_NAME: &str = "Unknown Item";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulatorConfig {
    /// Chance of dropping one unit of each checklist line.
    pub miss_probability: f64,
    /// Chance of adding a single unknown item.
    pub extra_probability: f64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            miss_probability: 0.2,
            extra_probability: 0.35,
        }
    }
}

/// Noisy stand-in for a vision model, for demos and tests.
pub struct SimulatedDetector {
    config: SimulatorConfig,
    rng: Mutex<StdRng>,
}

impl SimulatedDetector {
    pub fn new(config: SimulatorConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Deterministic output for a given seed.
    pub fn seeded(config: SimulatorConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: SimulatorConfig, rng: StdRng) -> Self {
        Self {
            config: SimulatorConfig {
                miss_probability: config.miss_probability.clamp(0.0, 1.0),
                extra_probability: config.extra_probability.clamp(0.0, 1.0),
            },
            rng: Mutex::new(rng),
        }
    }
}

impl Detector for SimulatedDetector {
    fn detect(&self, checklist: &[ChecklistItem]) -> Vec<Detection> {
        let mut rng = self.rng.lock().unwrap();
        let mut detections = Vec::with_capacity(checklist.len() + 1);

        for item in checklist {
            let missed = rng.gen_bool(self.config.miss_probability);
            let qty = item.qty.saturating_sub(u32::from(missed));
            if qty > 0 {
                detections.push(Detection::new(item.id.clone(), item.name.clone(), qty));
            }
        }

        if rng.gen_bool(self.config.extra_probability) {
            let taken: HashSet<&str> = checklist.iter().map(|c| c.id.as_str()).collect();
            let id = loop {
                let candidate = format!("extra-{}", random_suffix(&mut *rng, 4));
                if !taken.contains(candidate.as_str()) {
                    break candidate;
                }
            };
            detections.push(Detection::new(id, UNKNOWN_ITEM_NAME, 1));
        }

        log::debug!(
            "simulated {} detections for {} checklist lines",
            detections.len(),
            checklist.len()
        );
        detections
    }
}

fn random_suffix(rng: &mut impl Rng, len: usize) -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    (0..len)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

// ---------------------------------------------------------------------------
// Model-backed
// ---------------------------------------------------------------------------

/// One classifier output: a product label and its confidence.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Prediction {
    /// Product id the model was trained on.
    pub label: String,
    pub confidence: f32,
}

/// Inference runtime behind [`ModelDetector`].
pub trait InferenceBackend: Send + Sync {
    /// Predictions accumulated over the captured frames, one per sighted unit.
    fn predictions(&self) -> Result<Vec<Prediction>, String>;
}

/// Production detector: filters model predictions by confidence and
/// collapses them into one detection per product.
pub struct ModelDetector<B: InferenceBackend> {
    backend: B,
    min_confidence: f32,
}

impl<B: InferenceBackend> ModelDetector<B> {
    pub fn new(backend: B, min_confidence: f32) -> Self {
        Self {
            backend,
            min_confidence,
        }
    }
}

impl<B: InferenceBackend> Detector for ModelDetector<B> {
    fn detect(&self, checklist: &[ChecklistItem]) -> Vec<Detection> {
        let predictions = match self.backend.predictions() {
            Ok(p) => p,
            Err(e) => {
                log::warn!("inference failed, reporting no detections: {e}");
                return Vec::new();
            }
        };

        let sightings: Vec<Detection> = predictions
            .into_iter()
            .filter(|p| p.confidence >= self.min_confidence)
            .map(|p| {
                let name = checklist
                    .iter()
                    .find(|c| c.id == p.label)
                    .map(|c| c.name.clone())
                    .unwrap_or_else(|| UNKNOWN_ITEM_NAME.to_string());
                Detection::new(p.label, name, 1)
            })
            .collect();

        aggregate_detections(&sightings)
            .into_iter()
            .map(|t| Detection::new(t.id, t.name, t.qty))
            .collect()
    }
}
