//! Intake orchestrator.
//!
//! Single entry point that drives an uploaded report through the pipeline:
//! resolve the donor, select the test record, capture the medication
//! snapshot, classify, persist. Instant tests create and screen a record
//! in one step; lab tests create the record at collection time and attach
//! the screen when the report PDF arrives.

use std::time::Instant;

use chrono::NaiveDate;
use rusqlite::Connection;
use uuid::Uuid;

use crate::confirmation;
use crate::db::{repository, DatabaseError};
use crate::matching::{
    parse_extracted_name, rank_pending_records, resolve_client, ClientSearch, LookupError,
    RecordMatch,
};
use crate::models::enums::{ExtractionConfidence, TestType};
use crate::models::{ExtractedReport, SnapshotMedication, TestRecord};
use crate::screening::{evaluate, validate_detected, ClassificationOutcome, ScreeningError, ScreeningInput};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("Lookup failed: {0}")]
    Lookup(#[from] LookupError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Screening rejected: {0}")]
    Screening(#[from] ScreeningError),

    #[error("Client {client_id} not found")]
    UnknownClient { client_id: Uuid },

    #[error("Test record {record_id} not found")]
    UnknownRecord { record_id: Uuid },

    #[error("Extracted report carries no donor name")]
    MissingDonorName,

    #[error("Extracted report carries no collection date")]
    MissingCollectionDate,
}

// ---------------------------------------------------------------------------
// Donor and record selection
// ---------------------------------------------------------------------------

/// Resolve the donor name extracted from a report against the client
/// registry. The caller decides what to do with zero matches (prompt
/// manual registration) or several (operator pick).
pub fn resolve_donor(
    conn: &Connection,
    report: &ExtractedReport,
    deadline: Option<Instant>,
) -> Result<ClientSearch, IntakeError> {
    let identity = report
        .donor_name
        .as_deref()
        .and_then(parse_extracted_name)
        .ok_or(IntakeError::MissingDonorName)?;

    Ok(resolve_client(conn, &identity, deadline)?)
}

/// Score pending lab records against the report's donor name and
/// collection date, best first. An empty list is a valid outcome.
pub fn match_pending(
    conn: &Connection,
    report: &ExtractedReport,
    deadline: Option<Instant>,
) -> Result<Vec<RecordMatch>, IntakeError> {
    check_deadline(deadline)?;
    let pending = repository::list_pending_records(conn)?;
    check_deadline(deadline)?;

    Ok(rank_pending_records(
        pending,
        report.donor_name.as_deref(),
        report.collection_date,
    ))
}

fn check_deadline(deadline: Option<Instant>) -> Result<(), IntakeError> {
    match deadline {
        Some(d) if Instant::now() > d => Err(LookupError::Timeout.into()),
        _ => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Record creation and screening
// ---------------------------------------------------------------------------

/// Create a test record at collection time. The client's active
/// medications are snapshotted here, so later list edits never reach this
/// record's classification.
pub fn register_collection(
    conn: &Connection,
    client_id: &Uuid,
    test_type: TestType,
    collection_date: NaiveDate,
    breathalyzer_taken: bool,
    breathalyzer_result: Option<f64>,
) -> Result<TestRecord, IntakeError> {
    let client = repository::get_client(conn, client_id)?
        .ok_or(IntakeError::UnknownClient { client_id: *client_id })?;
    let medications = repository::get_client_medications(conn, client_id)?;
    let snapshot = SnapshotMedication::capture(&medications, collection_date);

    let record = TestRecord {
        id: Uuid::new_v4(),
        client_id: client.id,
        client_name: client.identity.full_name(),
        test_type,
        collection_date,
        is_dilute: false,
        breathalyzer_taken,
        breathalyzer_result,
        detected_substances: Vec::new(),
        medications: snapshot,
        outcome: None,
        workflow_state: crate::models::enums::WorkflowState::AwaitingScreen,
        decision: None,
        confirmation_substances: Vec::new(),
        confirmation_results: Vec::new(),
        final_status: None,
        notification_stage: None,
        created_at: chrono::Utc::now().naive_utc(),
    };
    repository::insert_test_record(conn, &record)?;

    tracing::info!(
        record_id = %record.id,
        client = %record.client_name,
        test_type = test_type.as_str(),
        snapshot_size = record.medications.len(),
        "Test record registered"
    );
    Ok(record)
}

/// Attach an uploaded screen to a record and classify it.
///
/// Detections outside the record's panel are rejected, not silently
/// admitted; the sentinel is sanitized away before the engine sees it.
pub fn attach_screen(
    conn: &Connection,
    record_id: &Uuid,
    report: &ExtractedReport,
) -> Result<TestRecord, IntakeError> {
    let mut record = repository::get_test_record(conn, record_id)?
        .ok_or(IntakeError::UnknownRecord { record_id: *record_id })?;

    if report.confidence == ExtractionConfidence::Low {
        tracing::warn!(
            record_id = %record.id,
            "Low-confidence extraction attached; review carefully"
        );
    }

    let detected: Vec<_> = report
        .detected_substances
        .iter()
        .filter(|s| !s.is_sentinel())
        .copied()
        .collect();
    validate_detected(record.test_type, &detected)?;

    record.detected_substances = detected;
    record.is_dilute = report.is_dilute;

    let outcome = evaluate(&screening_input(&record));
    record.workflow_state = confirmation::initial_state(&outcome);
    tracing::info!(
        record_id = %record.id,
        result = outcome.initial_screen_result.as_str(),
        auto_accept = outcome.auto_accept,
        "Screen classified"
    );
    record.outcome = Some(outcome);
    repository::update_screen(conn, &record)?;
    Ok(record)
}

/// Instant-test workflow: register and screen in one step. The report
/// must carry a collection date.
pub fn process_instant(
    conn: &Connection,
    client_id: &Uuid,
    test_type: TestType,
    report: &ExtractedReport,
    breathalyzer_taken: bool,
    breathalyzer_result: Option<f64>,
) -> Result<TestRecord, IntakeError> {
    let collection_date = report
        .collection_date
        .ok_or(IntakeError::MissingCollectionDate)?;

    let record = register_collection(
        conn,
        client_id,
        test_type,
        collection_date,
        breathalyzer_taken,
        breathalyzer_result,
    )?;
    attach_screen(conn, &record.id, report)
}

/// Classification preview for the review screen: the engine called fresh
/// on the current draft, no persistence, no cached state.
pub fn preview_screen(record: &TestRecord, report: &ExtractedReport) -> ClassificationOutcome {
    let mut draft = record.clone();
    draft.detected_substances = report
        .detected_substances
        .iter()
        .filter(|s| !s.is_sentinel())
        .copied()
        .collect();
    draft.is_dilute = report.is_dilute;
    evaluate(&screening_input(&draft))
}

fn screening_input(record: &TestRecord) -> ScreeningInput {
    ScreeningInput {
        detected: record.detected_substances.iter().copied().collect(),
        test_type: record.test_type,
        is_dilute: record.is_dilute,
        breathalyzer_taken: record.breathalyzer_taken,
        breathalyzer_result: record.breathalyzer_result,
        medications: record.medications.clone(),
    }
}
