//! Notification boundary.
//!
//! The core hands the external notification collaborator a summary whose
//! fields are internally consistent with the persisted record, and guards
//! dispatch so each notification stage fires at most once per record even
//! under concurrent finalization.

use rusqlite::Connection;
use serde::Serialize;
use uuid::Uuid;

use crate::db::{repository, DatabaseError};
use crate::models::enums::{FinalStatus, NotificationStage, Substance};
use crate::models::TestRecord;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Record {record_id} has no final status to notify about")]
    NotFinalized { record_id: Uuid },

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

/// Payload for the notification collaborator. Substance lists mirror the
/// persisted classification outcome verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationSummary {
    pub record_id: Uuid,
    pub client_name: String,
    pub final_status: FinalStatus,
    pub expected_positives: Vec<Substance>,
    pub unexpected_positives: Vec<Substance>,
    pub unexpected_negatives: Vec<Substance>,
    pub is_dilute: bool,
}

/// Build the final-result summary for a finalized record. The status is
/// read from the persisted field, never re-derived from prose elsewhere.
pub fn summarize_final(record: &TestRecord) -> Result<NotificationSummary, NotifyError> {
    let final_status = record.final_status.ok_or(NotifyError::NotFinalized {
        record_id: record.id,
    })?;
    let outcome = record.outcome.as_ref().ok_or(NotifyError::NotFinalized {
        record_id: record.id,
    })?;

    Ok(NotificationSummary {
        record_id: record.id,
        client_name: record.client_name.clone(),
        final_status,
        expected_positives: outcome.expected_positives.clone(),
        unexpected_positives: outcome.unexpected_positives.clone(),
        unexpected_negatives: outcome.unexpected_negatives.clone(),
        is_dilute: record.is_dilute,
    })
}

/// Claim a notification stage before dispatch. Returns true exactly once
/// per record and stage; callers skip dispatch on false. The claim is
/// written with a single UPDATE so two concurrent finalizers cannot both
/// win it.
pub fn begin_stage(
    conn: &Connection,
    record_id: &Uuid,
    stage: NotificationStage,
) -> Result<bool, NotifyError> {
    let claimed = repository::claim_notification_stage(conn, record_id, stage)?;
    if !claimed {
        tracing::debug!(
            record_id = %record_id,
            stage = stage.as_str(),
            "Notification stage already dispatched; skipping"
        );
    }
    Ok(claimed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confirmation;
    use crate::db::repository::insert_client;
    use crate::db::sqlite::open_memory_database;
    use crate::intake;
    use crate::models::enums::{ExtractionConfidence, Substance, TestType};
    use crate::models::{Client, ExtractedReport, Identity};

    fn finalized_record(conn: &Connection) -> TestRecord {
        let client = Client {
            id: Uuid::new_v4(),
            identity: Identity::new("John", "Doe", None),
            created_at: chrono::Utc::now().naive_utc(),
        };
        insert_client(conn, &client).unwrap();

        let mut record = intake::process_instant(
            conn,
            &client.id,
            TestType::TenPanelInstant,
            &ExtractedReport {
                donor_name: Some("John Doe".into()),
                collection_date: Some("2026-03-15".parse().unwrap()),
                detected_substances: vec![Substance::Cocaine],
                is_dilute: true,
                confidence: ExtractionConfidence::High,
            },
            false,
            None,
        )
        .unwrap();

        confirmation::apply_decision(
            &mut record,
            crate::models::enums::ConfirmationDecision::Accept,
            &[],
        )
        .unwrap();
        confirmation::finalize(&mut record, Vec::new()).unwrap();
        repository::update_workflow(conn, &record).unwrap();
        record
    }

    #[test]
    fn summary_mirrors_persisted_outcome() {
        let conn = open_memory_database().unwrap();
        let record = finalized_record(&conn);

        let summary = summarize_final(&record).unwrap();
        assert_eq!(summary.final_status, FinalStatus::UnexpectedPositive);
        assert_eq!(summary.unexpected_positives, vec![Substance::Cocaine]);
        assert!(summary.expected_positives.is_empty());
        assert!(summary.is_dilute);
        assert_eq!(summary.client_name, "John Doe");
    }

    #[test]
    fn unfinalized_record_has_no_summary() {
        let conn = open_memory_database().unwrap();
        let mut record = finalized_record(&conn);
        record.final_status = None;

        let err = summarize_final(&record).unwrap_err();
        assert!(matches!(err, NotifyError::NotFinalized { .. }));
    }

    #[test]
    fn stage_fires_at_most_once() {
        let conn = open_memory_database().unwrap();
        let record = finalized_record(&conn);

        assert!(begin_stage(&conn, &record.id, NotificationStage::FinalResult).unwrap());
        assert!(!begin_stage(&conn, &record.id, NotificationStage::FinalResult).unwrap());
    }

    #[test]
    fn summary_serializes_with_stored_spellings() {
        let conn = open_memory_database().unwrap();
        let record = finalized_record(&conn);
        let summary = summarize_final(&record).unwrap();

        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"unexpected_positive\""));
        assert!(json.contains("\"cocaine\""));
    }
}
