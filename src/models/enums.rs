use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// Serde renames match the stored strings so JSON columns and plain
/// columns round-trip through the same spelling.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

// Substances a screen can report. `None` is a sentinel used by prescription
// entries that do not show up on any screen; it is never a real finding and
// is filtered out during snapshot capture and expected-substance resolution.
str_enum!(Substance {
    Amphetamines => "amphetamines",
    Barbiturates => "barbiturates",
    Benzodiazepines => "benzodiazepines",
    Buprenorphine => "buprenorphine",
    Cocaine => "cocaine",
    Ethanol => "ethanol",
    Fentanyl => "fentanyl",
    Mdma => "mdma",
    Methadone => "methadone",
    Methamphetamine => "methamphetamine",
    Opiates => "opiates",
    Oxycodone => "oxycodone",
    Pcp => "pcp",
    Propoxyphene => "propoxyphene",
    Thc => "thc",
    Tramadol => "tramadol",
    None => "none",
});

impl Substance {
    /// True for the `none` sentinel carried by prescriptions that no
    /// screen detects.
    pub fn is_sentinel(&self) -> bool {
        matches!(self, Self::None)
    }
}

str_enum!(TestType {
    FivePanelInstant => "5_panel_instant",
    TenPanelInstant => "10_panel_instant",
    ElevenPanelLab => "11_panel_lab",
    FifteenPanelLab => "15_panel_lab",
});

// Initial screening classification, six mutually exclusive categories.
str_enum!(ScreenResult {
    Negative => "negative",
    ExpectedPositive => "expected_positive",
    UnexpectedPositive => "unexpected_positive",
    UnexpectedNegativeCritical => "unexpected_negative_critical",
    UnexpectedNegativeWarning => "unexpected_negative_warning",
    MixedUnexpected => "mixed_unexpected",
});

// Compliance status derived once per stage (immediately for accepted or
// auto-accepted records, after lab confirmation otherwise).
str_enum!(FinalStatus {
    ConfirmedNegative => "confirmed_negative",
    ExpectedPositive => "expected_positive",
    UnexpectedPositive => "unexpected_positive",
    UnexpectedNegativeCritical => "unexpected_negative_critical",
    UnexpectedNegativeWarning => "unexpected_negative_warning",
    MixedUnexpected => "mixed_unexpected",
    Inconclusive => "inconclusive",
});

str_enum!(ConfirmationDecision {
    Accept => "accept",
    RequestConfirmation => "request_confirmation",
    PendingDecision => "pending_decision",
});

// Per-substance result of the secondary lab assay.
str_enum!(ConfirmationOutcome {
    ConfirmedPositive => "confirmed_positive",
    ConfirmedNegative => "confirmed_negative",
    Inconclusive => "inconclusive",
});

// Lifecycle of a test record. `AwaitingScreen` covers lab records created
// at collection time before the report PDF arrives; the remaining states
// follow the confirmation decision flow.
str_enum!(WorkflowState {
    AwaitingScreen => "awaiting_screen",
    NoDecisionNeeded => "no_decision_needed",
    DecisionPending => "decision_pending",
    Accepted => "accepted",
    AwaitingLabConfirmation => "awaiting_lab_confirmation",
    Deferred => "deferred",
    Finalized => "finalized",
});

str_enum!(MedicationStatus {
    Active => "active",
    Stopped => "stopped",
    Paused => "paused",
});

// Presentation band for a record-match score.
str_enum!(MatchConfidence {
    High => "high",
    Medium => "medium",
    Low => "low",
    None => "none",
});

// Self-reported confidence of the external PDF extraction stage.
str_enum!(ExtractionConfidence {
    High => "high",
    Medium => "medium",
    Low => "low",
});

// Notification dispatch stages, ranked so a stage can be claimed at most
// once and never re-claimed after a later stage went out.
str_enum!(NotificationStage {
    InitialResult => "initial_result",
    FinalResult => "final_result",
});

impl NotificationStage {
    pub fn rank(&self) -> i64 {
        match self {
            Self::InitialResult => 1,
            Self::FinalResult => 2,
        }
    }

    pub fn from_rank(rank: i64) -> Option<Self> {
        match rank {
            1 => Some(Self::InitialResult),
            2 => Some(Self::FinalResult),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn substance_round_trip() {
        for (variant, s) in [
            (Substance::Amphetamines, "amphetamines"),
            (Substance::Buprenorphine, "buprenorphine"),
            (Substance::Oxycodone, "oxycodone"),
            (Substance::Thc, "thc"),
            (Substance::None, "none"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(Substance::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn substance_serde_matches_as_str() {
        let json = serde_json::to_string(&Substance::Methamphetamine).unwrap();
        assert_eq!(json, "\"methamphetamine\"");
        let back: Substance = serde_json::from_str("\"oxycodone\"").unwrap();
        assert_eq!(back, Substance::Oxycodone);
    }

    #[test]
    fn sentinel_is_only_none() {
        assert!(Substance::None.is_sentinel());
        assert!(!Substance::Ethanol.is_sentinel());
        assert!(!Substance::Oxycodone.is_sentinel());
    }

    #[test]
    fn screen_result_round_trip() {
        for (variant, s) in [
            (ScreenResult::Negative, "negative"),
            (ScreenResult::ExpectedPositive, "expected_positive"),
            (ScreenResult::UnexpectedPositive, "unexpected_positive"),
            (
                ScreenResult::UnexpectedNegativeCritical,
                "unexpected_negative_critical",
            ),
            (
                ScreenResult::UnexpectedNegativeWarning,
                "unexpected_negative_warning",
            ),
            (ScreenResult::MixedUnexpected, "mixed_unexpected"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(ScreenResult::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn workflow_state_round_trip() {
        for (variant, s) in [
            (WorkflowState::AwaitingScreen, "awaiting_screen"),
            (WorkflowState::NoDecisionNeeded, "no_decision_needed"),
            (WorkflowState::DecisionPending, "decision_pending"),
            (WorkflowState::Accepted, "accepted"),
            (
                WorkflowState::AwaitingLabConfirmation,
                "awaiting_lab_confirmation",
            ),
            (WorkflowState::Deferred, "deferred"),
            (WorkflowState::Finalized, "finalized"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(WorkflowState::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn notification_stage_ranks_ordered() {
        assert!(NotificationStage::InitialResult.rank() < NotificationStage::FinalResult.rank());
        assert_eq!(
            NotificationStage::from_rank(2),
            Some(NotificationStage::FinalResult)
        );
        assert_eq!(NotificationStage::from_rank(0), None);
    }

    #[test]
    fn invalid_enum_returns_error() {
        assert!(Substance::from_str("caffeine").is_err());
        assert!(TestType::from_str("4_panel").is_err());
        assert!(ScreenResult::from_str("").is_err());
        assert!(ConfirmationDecision::from_str("maybe").is_err());
    }
}
