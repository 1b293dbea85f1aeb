use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::models::enums::{ScreenResult, Substance, TestType};
use crate::models::SnapshotMedication;

/// Everything the engine needs to classify one screen. Built fresh per
/// call from the draft under review or the persisted record; never
/// mutated, so repeated "preview" calls cannot go stale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreeningInput {
    pub detected: BTreeSet<Substance>,
    pub test_type: TestType,
    pub is_dilute: bool,
    pub breathalyzer_taken: bool,
    pub breathalyzer_result: Option<f64>,
    pub medications: Vec<SnapshotMedication>,
}

impl ScreeningInput {
    /// A breath alcohol reading above 0.000 counts as a detection.
    pub fn breath_alcohol_detected(&self) -> bool {
        self.breathalyzer_taken && self.breathalyzer_result.is_some_and(|r| r > 0.0)
    }
}

/// The engine's verdict for one screen. Derived, recomputed on demand;
/// persisted only alongside the record it was computed for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationOutcome {
    pub initial_screen_result: ScreenResult,
    pub expected_positives: Vec<Substance>,
    pub unexpected_positives: Vec<Substance>,
    /// Critical and warning negatives merged for display.
    pub unexpected_negatives: Vec<Substance>,
    /// Severity split retained for the final-status recompute.
    pub critical_negatives: Vec<Substance>,
    pub warning_negatives: Vec<Substance>,
    pub auto_accept: bool,
}
