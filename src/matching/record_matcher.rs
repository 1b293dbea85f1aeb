//! Pending-record matching for the lab workflow.
//!
//! A lab report PDF arrives days after collection; the matcher scores every
//! pending record against the extracted donor name and collection date so
//! the right record can be auto-selected or offered for manual confirmation.

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::enums::MatchConfidence;
use crate::models::TestRecord;

/// Top candidate is applied automatically at or above this score.
pub const AUTO_SELECT_THRESHOLD: u8 = 60;

/// Candidates shown for manual confirmation (expandable in the UI).
pub const SUGGESTION_LIMIT: usize = 3;

#[derive(Debug, Clone, Serialize)]
pub struct RecordMatch {
    pub record: TestRecord,
    pub score: u8,
    pub confidence: MatchConfidence,
}

/// Score a candidate record against extracted report data, 0-100.
///
/// Name contributes up to 60, date up to 40; absent inputs contribute 0 to
/// their component. Never fails.
pub fn match_score(
    extracted_name: Option<&str>,
    extracted_date: Option<NaiveDate>,
    candidate_name: &str,
    candidate_date: NaiveDate,
) -> u8 {
    let name = extracted_name.map_or(0, |n| name_points(n, candidate_name));
    let date = extracted_date.map_or(0, |d| date_points(d, candidate_date));
    name + date
}

/// Name component: one band only, highest first.
/// Exact (trimmed, case-insensitive) 60; substring containment either
/// direction 40; any shared whitespace token (e.g. a shared last name) 30.
fn name_points(extracted: &str, candidate: &str) -> u8 {
    let a = extracted.trim().to_lowercase();
    let b = candidate.trim().to_lowercase();
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    if a == b {
        return 60;
    }
    if a.contains(&b) || b.contains(&a) {
        return 40;
    }
    if a.split_whitespace().any(|tok| b.split_whitespace().any(|c| c == tok)) {
        return 30;
    }
    0
}

/// Date component from whole-day difference: same day 40, within 1 day 30,
/// within 3 days 20, within 7 days 10.
fn date_points(extracted: NaiveDate, candidate: NaiveDate) -> u8 {
    let days = (extracted - candidate).num_days().abs();
    match days {
        0 => 40,
        1 => 30,
        2..=3 => 20,
        4..=7 => 10,
        _ => 0,
    }
}

/// Presentation band for a score.
pub fn confidence_band(score: u8) -> MatchConfidence {
    match score {
        80.. => MatchConfidence::High,
        60..=79 => MatchConfidence::Medium,
        1..=59 => MatchConfidence::Low,
        0 => MatchConfidence::None,
    }
}

/// Score and rank pending records, best first. Ties keep fetch order.
pub fn rank_pending_records(
    records: Vec<TestRecord>,
    extracted_name: Option<&str>,
    extracted_date: Option<NaiveDate>,
) -> Vec<RecordMatch> {
    let mut matches: Vec<RecordMatch> = records
        .into_iter()
        .map(|record| {
            let score = match_score(
                extracted_name,
                extracted_date,
                &record.client_name,
                record.collection_date,
            );
            RecordMatch {
                record,
                score,
                confidence: confidence_band(score),
            }
        })
        .collect();

    matches.sort_by(|a, b| b.score.cmp(&a.score));
    matches
}

/// The auto-select policy: the top-ranked candidate, when its score clears
/// the threshold. Below it, callers present `suggestions` instead.
pub fn auto_select(matches: &[RecordMatch]) -> Option<&RecordMatch> {
    matches.first().filter(|m| m.score >= AUTO_SELECT_THRESHOLD)
}

/// Top candidates for manual confirmation.
pub fn suggestions(matches: &[RecordMatch]) -> &[RecordMatch] {
    &matches[..matches.len().min(SUGGESTION_LIMIT)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enums::{TestType, WorkflowState};
    use crate::models::SnapshotMedication;
    use uuid::Uuid;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn pending(name: &str, collected: &str) -> TestRecord {
        TestRecord {
            id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            client_name: name.into(),
            test_type: TestType::ElevenPanelLab,
            collection_date: date(collected),
            is_dilute: false,
            breathalyzer_taken: false,
            breathalyzer_result: None,
            detected_substances: Vec::new(),
            medications: Vec::<SnapshotMedication>::new(),
            outcome: None,
            workflow_state: WorkflowState::AwaitingScreen,
            decision: None,
            confirmation_substances: Vec::new(),
            confirmation_results: Vec::new(),
            final_status: None,
            notification_stage: None,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }

    #[test]
    fn exact_name_and_date_scores_full() {
        let score = match_score(
            Some(" John Doe "),
            Some(date("2026-03-15")),
            "john doe",
            date("2026-03-15"),
        );
        assert_eq!(score, 100);
    }

    #[test]
    fn name_bands_do_not_stack() {
        // Substring containment also shares tokens; only the higher band counts.
        assert_eq!(name_points("John Doe Jr", "John Doe"), 40);
        assert_eq!(name_points("Jane Doe", "John Doe"), 30);
        assert_eq!(name_points("Jane Roe", "John Doe"), 0);
    }

    #[test]
    fn date_bands_follow_day_difference() {
        let base = date("2026-03-15");
        assert_eq!(date_points(base, date("2026-03-15")), 40);
        assert_eq!(date_points(base, date("2026-03-16")), 30);
        assert_eq!(date_points(base, date("2026-03-12")), 20);
        assert_eq!(date_points(base, date("2026-03-22")), 10);
        assert_eq!(date_points(base, date("2026-03-23")), 0);
        // Symmetric: direction of the difference is irrelevant.
        assert_eq!(date_points(date("2026-03-16"), base), 30);
    }

    #[test]
    fn absent_inputs_contribute_zero() {
        assert_eq!(match_score(None, None, "John Doe", date("2026-03-15")), 0);
        assert_eq!(
            match_score(None, Some(date("2026-03-15")), "John Doe", date("2026-03-15")),
            40
        );
        assert_eq!(
            match_score(Some("John Doe"), None, "John Doe", date("2026-03-15")),
            60
        );
    }

    #[test]
    fn empty_extracted_name_scores_zero() {
        assert_eq!(name_points("   ", "John Doe"), 0);
    }

    #[test]
    fn confidence_bands() {
        assert_eq!(confidence_band(100), MatchConfidence::High);
        assert_eq!(confidence_band(80), MatchConfidence::High);
        assert_eq!(confidence_band(79), MatchConfidence::Medium);
        assert_eq!(confidence_band(60), MatchConfidence::Medium);
        assert_eq!(confidence_band(59), MatchConfidence::Low);
        assert_eq!(confidence_band(1), MatchConfidence::Low);
        assert_eq!(confidence_band(0), MatchConfidence::None);
    }

    #[test]
    fn ranking_puts_best_candidate_first() {
        let records = vec![
            pending("Jane Roe", "2026-03-01"),
            pending("John Doe", "2026-03-15"),
            pending("John Doe", "2026-03-10"),
        ];

        let ranked = rank_pending_records(records, Some("John Doe"), Some(date("2026-03-15")));
        assert_eq!(ranked[0].score, 100);
        assert_eq!(ranked[0].record.collection_date, date("2026-03-15"));
        assert_eq!(ranked[1].score, 70); // exact name, 5 days off
        assert!(ranked[2].score < 60);
    }

    #[test]
    fn auto_select_requires_threshold() {
        let records = vec![pending("John Doe", "2026-03-15")];
        let ranked = rank_pending_records(records, Some("John Doe"), Some(date("2026-03-15")));
        assert!(auto_select(&ranked).is_some());

        let records = vec![pending("Jane Roe", "2026-02-01")];
        let ranked = rank_pending_records(records, Some("John Doe"), Some(date("2026-03-15")));
        assert!(auto_select(&ranked).is_none());
    }

    #[test]
    fn suggestions_capped_at_three() {
        let records = vec![
            pending("John Doe", "2026-03-15"),
            pending("John Doe", "2026-03-14"),
            pending("John Doe", "2026-03-13"),
            pending("John Doe", "2026-03-12"),
        ];
        let ranked = rank_pending_records(records, Some("John Doe"), Some(date("2026-03-15")));
        assert_eq!(suggestions(&ranked).len(), 3);

        let one = rank_pending_records(
            vec![pending("John Doe", "2026-03-15")],
            Some("John Doe"),
            None,
        );
        assert_eq!(suggestions(&one).len(), 1);
    }
}
