//! Screening classification: expected substances from the medication
//! snapshot, panel coverage, and the six-category result engine.

pub mod classify;
pub mod expected;
pub mod panel;
pub mod types;

pub use classify::{classify, evaluate};
pub use expected::{expected_substances, ExpectedSubstances};
pub use panel::{panel, panel_covers, validate_detected};
pub use types::{ClassificationOutcome, ScreeningInput};

use thiserror::Error;

use crate::models::enums::{Substance, TestType};

#[derive(Error, Debug)]
pub enum ScreeningError {
    /// A detected substance falls outside the selected test type's panel.
    /// Admitting it silently would manufacture incorrect "unexpected"
    /// findings, so intake rejects it instead.
    #[error("Substances not covered by the {test_type:?} panel: {substances:?}")]
    PanelMismatch {
        test_type: TestType,
        substances: Vec<Substance>,
    },
}
