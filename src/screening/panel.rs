//! Panel coverage: the fixed substance set each test type screens for.

use crate::models::enums::{Substance, TestType};

use super::ScreeningError;

const FIVE_PANEL: &[Substance] = &[
    Substance::Amphetamines,
    Substance::Cocaine,
    Substance::Opiates,
    Substance::Pcp,
    Substance::Thc,
];

const TEN_PANEL: &[Substance] = &[
    Substance::Amphetamines,
    Substance::Barbiturates,
    Substance::Benzodiazepines,
    Substance::Cocaine,
    Substance::Methadone,
    Substance::Methamphetamine,
    Substance::Opiates,
    Substance::Oxycodone,
    Substance::Pcp,
    Substance::Thc,
];

const ELEVEN_PANEL: &[Substance] = &[
    Substance::Amphetamines,
    Substance::Barbiturates,
    Substance::Benzodiazepines,
    Substance::Buprenorphine,
    Substance::Cocaine,
    Substance::Methadone,
    Substance::Methamphetamine,
    Substance::Opiates,
    Substance::Oxycodone,
    Substance::Pcp,
    Substance::Thc,
];

const FIFTEEN_PANEL: &[Substance] = &[
    Substance::Amphetamines,
    Substance::Barbiturates,
    Substance::Benzodiazepines,
    Substance::Buprenorphine,
    Substance::Cocaine,
    Substance::Fentanyl,
    Substance::Mdma,
    Substance::Methadone,
    Substance::Methamphetamine,
    Substance::Opiates,
    Substance::Oxycodone,
    Substance::Pcp,
    Substance::Propoxyphene,
    Substance::Thc,
    Substance::Tramadol,
];

/// The substances a test type is capable of detecting. Breath alcohol is
/// measured by its own instrument and belongs to no urine panel.
pub fn panel(test_type: TestType) -> &'static [Substance] {
    match test_type {
        TestType::FivePanelInstant => FIVE_PANEL,
        TestType::TenPanelInstant => TEN_PANEL,
        TestType::ElevenPanelLab => ELEVEN_PANEL,
        TestType::FifteenPanelLab => FIFTEEN_PANEL,
    }
}

pub fn panel_covers(test_type: TestType, substance: Substance) -> bool {
    panel(test_type).contains(&substance)
}

/// Reject detected substances the selected panel cannot report.
pub fn validate_detected(
    test_type: TestType,
    detected: &[Substance],
) -> Result<(), ScreeningError> {
    let outside: Vec<Substance> = detected
        .iter()
        .filter(|s| !s.is_sentinel() && !panel_covers(test_type, **s))
        .copied()
        .collect();

    if outside.is_empty() {
        Ok(())
    } else {
        Err(ScreeningError::PanelMismatch {
            test_type,
            substances: outside,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panel_sizes_match_names() {
        assert_eq!(panel(TestType::FivePanelInstant).len(), 5);
        assert_eq!(panel(TestType::TenPanelInstant).len(), 10);
        assert_eq!(panel(TestType::ElevenPanelLab).len(), 11);
        assert_eq!(panel(TestType::FifteenPanelLab).len(), 15);
    }

    #[test]
    fn wider_panels_contain_narrower_ones() {
        for s in panel(TestType::FivePanelInstant) {
            assert!(panel_covers(TestType::TenPanelInstant, *s));
        }
        for s in panel(TestType::TenPanelInstant) {
            assert!(panel_covers(TestType::ElevenPanelLab, *s));
        }
        for s in panel(TestType::ElevenPanelLab) {
            assert!(panel_covers(TestType::FifteenPanelLab, *s));
        }
    }

    #[test]
    fn no_panel_reports_ethanol_or_the_sentinel() {
        for t in [
            TestType::FivePanelInstant,
            TestType::TenPanelInstant,
            TestType::ElevenPanelLab,
            TestType::FifteenPanelLab,
        ] {
            assert!(!panel_covers(t, Substance::Ethanol));
            assert!(!panel_covers(t, Substance::None));
        }
    }

    #[test]
    fn validate_rejects_off_panel_detections() {
        let err = validate_detected(
            TestType::FivePanelInstant,
            &[Substance::Cocaine, Substance::Oxycodone],
        )
        .unwrap_err();
        match err {
            ScreeningError::PanelMismatch {
                test_type,
                substances,
            } => {
                assert_eq!(test_type, TestType::FivePanelInstant);
                assert_eq!(substances, vec![Substance::Oxycodone]);
            }
        }
    }

    #[test]
    fn validate_accepts_covered_detections() {
        assert!(validate_detected(
            TestType::ElevenPanelLab,
            &[Substance::Oxycodone, Substance::Buprenorphine]
        )
        .is_ok());
        assert!(validate_detected(TestType::FivePanelInstant, &[]).is_ok());
    }
}
