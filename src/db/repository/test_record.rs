use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::{
    ConfirmationDecision, FinalStatus, NotificationStage, Substance, TestType, WorkflowState,
};
use crate::models::{ConfirmationResult, SnapshotMedication, TestRecord};
use crate::screening::ClassificationOutcome;

use super::{from_json, parse_uuid, to_json};

const COLUMNS: &str = "id, client_id, client_name, test_type, collection_date, is_dilute,
    breathalyzer_taken, breathalyzer_result, detected_substances, medication_snapshot,
    outcome, workflow_state, decision, confirmation_substances, confirmation_results,
    final_status, notification_stage, created_at";

pub fn insert_test_record(conn: &Connection, record: &TestRecord) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO test_records (id, client_id, client_name, test_type, collection_date,
         is_dilute, breathalyzer_taken, breathalyzer_result, detected_substances,
         medication_snapshot, outcome, workflow_state, decision, confirmation_substances,
         confirmation_results, final_status, notification_stage, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
        params![
            record.id.to_string(),
            record.client_id.to_string(),
            record.client_name,
            record.test_type.as_str(),
            record.collection_date,
            record.is_dilute as i32,
            record.breathalyzer_taken as i32,
            record.breathalyzer_result,
            to_json("detected_substances", &record.detected_substances)?,
            to_json("medication_snapshot", &record.medications)?,
            record
                .outcome
                .as_ref()
                .map(|o| to_json("outcome", o))
                .transpose()?,
            record.workflow_state.as_str(),
            record.decision.map(|d| d.as_str()),
            to_json("confirmation_substances", &record.confirmation_substances)?,
            to_json("confirmation_results", &record.confirmation_results)?,
            record.final_status.map(|s| s.as_str()),
            record.notification_stage.map(|s| s.rank()).unwrap_or(0),
            record.created_at,
        ],
    )?;
    Ok(())
}

pub fn get_test_record(conn: &Connection, id: &Uuid) -> Result<Option<TestRecord>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM test_records WHERE id = ?1"
    ))?;

    let result = stmt.query_row(params![id.to_string()], record_row);

    match result {
        Ok(row) => Ok(Some(record_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Lab records created at collection time that have not yet received their
/// uploaded screen, most recent collection first.
pub fn list_pending_records(conn: &Connection) -> Result<Vec<TestRecord>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM test_records
         WHERE outcome IS NULL ORDER BY collection_date DESC, created_at DESC"
    ))?;

    let rows = stmt.query_map([], record_row)?;

    let mut records = Vec::new();
    for row in rows {
        records.push(record_from_row(row?)?);
    }
    Ok(records)
}

/// Persist an attached screen: detected substances, dilution flag,
/// classification outcome, and the resulting workflow state.
pub fn update_screen(conn: &Connection, record: &TestRecord) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE test_records
         SET detected_substances = ?2, is_dilute = ?3, outcome = ?4, workflow_state = ?5
         WHERE id = ?1",
        params![
            record.id.to_string(),
            to_json("detected_substances", &record.detected_substances)?,
            record.is_dilute as i32,
            record
                .outcome
                .as_ref()
                .map(|o| to_json("outcome", o))
                .transpose()?,
            record.workflow_state.as_str(),
        ],
    )?;

    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "test_record".into(),
            id: record.id.to_string(),
        });
    }
    Ok(())
}

/// Persist a confirmation-workflow transition: decision, confirmation
/// substances/results, final status, and workflow state.
pub fn update_workflow(conn: &Connection, record: &TestRecord) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE test_records
         SET workflow_state = ?2, decision = ?3, confirmation_substances = ?4,
             confirmation_results = ?5, final_status = ?6
         WHERE id = ?1",
        params![
            record.id.to_string(),
            record.workflow_state.as_str(),
            record.decision.map(|d| d.as_str()),
            to_json("confirmation_substances", &record.confirmation_substances)?,
            to_json("confirmation_results", &record.confirmation_results)?,
            record.final_status.map(|s| s.as_str()),
        ],
    )?;

    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "test_record".into(),
            id: record.id.to_string(),
        });
    }
    Ok(())
}

/// Atomically claim a notification stage for a record. Returns true when
/// this caller won the claim; false when the stage (or a later one) was
/// already dispatched. A single UPDATE keeps the check-and-set race-free.
pub fn claim_notification_stage(
    conn: &Connection,
    id: &Uuid,
    stage: NotificationStage,
) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "UPDATE test_records SET notification_stage = ?2
         WHERE id = ?1 AND notification_stage < ?2",
        params![id.to_string(), stage.rank()],
    )?;
    Ok(changed == 1)
}

// ---------------------------------------------------------------------------
// Row conversion
// ---------------------------------------------------------------------------

struct TestRecordRow {
    id: String,
    client_id: String,
    client_name: String,
    test_type: String,
    collection_date: NaiveDate,
    is_dilute: i32,
    breathalyzer_taken: i32,
    breathalyzer_result: Option<f64>,
    detected_substances: String,
    medication_snapshot: String,
    outcome: Option<String>,
    workflow_state: String,
    decision: Option<String>,
    confirmation_substances: String,
    confirmation_results: String,
    final_status: Option<String>,
    notification_stage: i64,
    created_at: NaiveDateTime,
}

fn record_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<TestRecordRow> {
    Ok(TestRecordRow {
        id: row.get(0)?,
        client_id: row.get(1)?,
        client_name: row.get(2)?,
        test_type: row.get(3)?,
        collection_date: row.get(4)?,
        is_dilute: row.get(5)?,
        breathalyzer_taken: row.get(6)?,
        breathalyzer_result: row.get(7)?,
        detected_substances: row.get(8)?,
        medication_snapshot: row.get(9)?,
        outcome: row.get(10)?,
        workflow_state: row.get(11)?,
        decision: row.get(12)?,
        confirmation_substances: row.get(13)?,
        confirmation_results: row.get(14)?,
        final_status: row.get(15)?,
        notification_stage: row.get(16)?,
        created_at: row.get(17)?,
    })
}

fn record_from_row(row: TestRecordRow) -> Result<TestRecord, DatabaseError> {
    Ok(TestRecord {
        id: parse_uuid("test_records.id", &row.id)?,
        client_id: parse_uuid("test_records.client_id", &row.client_id)?,
        client_name: row.client_name,
        test_type: TestType::from_str(&row.test_type)?,
        collection_date: row.collection_date,
        is_dilute: row.is_dilute != 0,
        breathalyzer_taken: row.breathalyzer_taken != 0,
        breathalyzer_result: row.breathalyzer_result,
        detected_substances: from_json::<Vec<Substance>>(
            "detected_substances",
            &row.detected_substances,
        )?,
        medications: from_json::<Vec<SnapshotMedication>>(
            "medication_snapshot",
            &row.medication_snapshot,
        )?,
        outcome: row
            .outcome
            .as_deref()
            .map(|raw| from_json::<ClassificationOutcome>("outcome", raw))
            .transpose()?,
        workflow_state: WorkflowState::from_str(&row.workflow_state)?,
        decision: row
            .decision
            .as_deref()
            .map(ConfirmationDecision::from_str)
            .transpose()?,
        confirmation_substances: from_json::<Vec<Substance>>(
            "confirmation_substances",
            &row.confirmation_substances,
        )?,
        confirmation_results: from_json::<Vec<ConfirmationResult>>(
            "confirmation_results",
            &row.confirmation_results,
        )?,
        final_status: row
            .final_status
            .as_deref()
            .map(FinalStatus::from_str)
            .transpose()?,
        notification_stage: NotificationStage::from_rank(row.notification_stage),
        created_at: row.created_at,
    })
}
