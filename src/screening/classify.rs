//! The classification engine: detected vs expected substances to one of
//! six mutually exclusive screen results, plus the auto-accept signal.
//!
//! Pure and total: identical inputs always produce identical outcomes, so
//! the same call serves live previews during review and the persisted
//! classification at record creation.

use std::collections::BTreeSet;

use crate::models::enums::{ScreenResult, Substance};

use super::expected::expected_substances;
use super::panel::panel_covers;
use super::types::{ClassificationOutcome, ScreeningInput};

/// Classify a screen from its substance sets.
///
/// Category priority, first match wins:
/// 1. nothing detected, nothing expected -> negative
/// 2. no unexpected positives, nothing missing -> expected positive
/// 3. unexpected positives and missing expected -> mixed unexpected
/// 4. unexpected positives only -> unexpected positive
/// 5. critical missing expected -> critical unexpected negative
/// 6. warning missing expected -> warning unexpected negative
///
/// Only unexpected positives force a human decision: a client testing
/// positive for something unprescribed is the compliance risk, while a
/// prescribed drug that fails to show is informational.
pub fn classify(
    detected: &BTreeSet<Substance>,
    expected: &BTreeSet<Substance>,
    critical: &BTreeSet<Substance>,
) -> ClassificationOutcome {
    let expected_positives: BTreeSet<Substance> =
        detected.intersection(expected).copied().collect();
    let unexpected_positives: BTreeSet<Substance> =
        detected.difference(expected).copied().collect();

    let missing_expected: BTreeSet<Substance> = expected.difference(detected).copied().collect();
    let critical_negatives: BTreeSet<Substance> =
        missing_expected.intersection(critical).copied().collect();
    let warning_negatives: BTreeSet<Substance> =
        missing_expected.difference(critical).copied().collect();

    let initial_screen_result = if detected.is_empty() && expected.is_empty() {
        ScreenResult::Negative
    } else if unexpected_positives.is_empty() && missing_expected.is_empty() {
        ScreenResult::ExpectedPositive
    } else if !unexpected_positives.is_empty() && !missing_expected.is_empty() {
        ScreenResult::MixedUnexpected
    } else if !unexpected_positives.is_empty() {
        ScreenResult::UnexpectedPositive
    } else if !critical_negatives.is_empty() {
        ScreenResult::UnexpectedNegativeCritical
    } else {
        ScreenResult::UnexpectedNegativeWarning
    };

    let auto_accept = unexpected_positives.is_empty();

    ClassificationOutcome {
        initial_screen_result,
        expected_positives: expected_positives.into_iter().collect(),
        unexpected_positives: unexpected_positives.into_iter().collect(),
        unexpected_negatives: missing_expected.into_iter().collect(),
        critical_negatives: critical_negatives.into_iter().collect(),
        warning_negatives: warning_negatives.into_iter().collect(),
        auto_accept,
    }
}

/// Classify a full screening input: sanitize detections to the panel,
/// fold in a detectable breath alcohol reading, resolve expected
/// substances from the medication snapshot, and classify.
///
/// Off-panel detections are dropped here so previews stay total; intake
/// rejects them loudly before a record is persisted.
pub fn evaluate(input: &ScreeningInput) -> ClassificationOutcome {
    let mut detected: BTreeSet<Substance> = input
        .detected
        .iter()
        .filter(|s| !s.is_sentinel() && panel_covers(input.test_type, **s))
        .copied()
        .collect();

    // Breath alcohol is its own instrument: a detectable reading is a
    // detection regardless of the urine panel in use.
    if input.breath_alcohol_detected() {
        detected.insert(Substance::Ethanol);
    }

    let expected = expected_substances(&input.medications, input.test_type);
    classify(&detected, &expected.expected, &expected.critical)
}
