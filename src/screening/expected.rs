//! Expected-substance resolution from the medication snapshot.

use std::collections::BTreeSet;

use crate::models::enums::{Substance, TestType};
use crate::models::SnapshotMedication;

use super::panel::panel_covers;

/// Substances a client should test positive for, and the subset whose
/// absence is a critical finding rather than an informational one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExpectedSubstances {
    pub expected: BTreeSet<Substance>,
    pub critical: BTreeSet<Substance>,
}

/// Derive expected/critical substances from the snapshot of medications
/// active at collection time. Snapshot capture already filtered to active
/// prescriptions; this does not re-check status.
///
/// Both sets are restricted to the test type's panel: a substance the test
/// never screens for must not appear, or it would manufacture a spurious
/// unexpected-negative finding.
pub fn expected_substances(
    medications: &[SnapshotMedication],
    test_type: TestType,
) -> ExpectedSubstances {
    let mut result = ExpectedSubstances::default();

    for med in medications {
        for substance in &med.detected_as {
            if substance.is_sentinel() || !panel_covers(test_type, *substance) {
                continue;
            }
            result.expected.insert(*substance);
            if med.require_confirmation {
                result.critical.insert(*substance);
            }
        }
    }

    result
}
