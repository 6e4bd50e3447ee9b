//! Recorded classifier output replayed as an inference backend.
//!
//! File format: `label,confidence`, one row per sighted unit.

use std::path::PathBuf;

use cartcheck_recon::detector::{InferenceBackend, Prediction};

pub struct PredictionsFile {
    path: PathBuf,
}

impl PredictionsFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl InferenceBackend for PredictionsFile {
    fn predictions(&self) -> Result<Vec<Prediction>, String> {
        let mut rdr = csv::Reader::from_path(&self.path)
            .map_err(|e| format!("{}: {e}", self.path.display()))?;
        rdr.deserialize()
            .collect::<Result<Vec<Prediction>, _>>()
            .map_err(|e| format!("{}: {e}", self.path.display()))
    }
}
