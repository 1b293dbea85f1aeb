use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::screening::ClassificationOutcome;

use super::enums::{
    ConfirmationDecision, ConfirmationOutcome, ExtractionConfidence, FinalStatus,
    NotificationStage, Substance, TestType, WorkflowState,
};
use super::medication::SnapshotMedication;

/// A single drug test: created at collection time, screened when results
/// come in (immediately for instant tests, on PDF upload for lab tests),
/// then driven through the confirmation workflow to a final status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestRecord {
    pub id: Uuid,
    pub client_id: Uuid,
    /// Client display name frozen at creation, used for record matching
    /// against extracted donor names.
    pub client_name: String,
    pub test_type: TestType,
    pub collection_date: NaiveDate,
    pub is_dilute: bool,
    pub breathalyzer_taken: bool,
    pub breathalyzer_result: Option<f64>,
    pub detected_substances: Vec<Substance>,
    /// Medications active on the collection date, frozen at creation.
    pub medications: Vec<SnapshotMedication>,
    /// Present once a screen has been attached and classified.
    pub outcome: Option<ClassificationOutcome>,
    pub workflow_state: WorkflowState,
    pub decision: Option<ConfirmationDecision>,
    pub confirmation_substances: Vec<Substance>,
    pub confirmation_results: Vec<ConfirmationResult>,
    pub final_status: Option<FinalStatus>,
    pub notification_stage: Option<NotificationStage>,
    pub created_at: NaiveDateTime,
}

impl TestRecord {
    /// A lab record that has not yet received its uploaded screen.
    pub fn is_pending(&self) -> bool {
        self.outcome.is_none()
    }
}

/// Outcome of the secondary lab assay for one substance under confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationResult {
    pub substance: Substance,
    pub outcome: ConfirmationOutcome,
    pub notes: Option<String>,
}

/// Output of the external PDF extraction stage. Donor name and collection
/// date are untrusted and possibly absent; they feed the matchers, never a
/// classification directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedReport {
    pub donor_name: Option<String>,
    pub collection_date: Option<NaiveDate>,
    pub detected_substances: Vec<Substance>,
    pub is_dilute: bool,
    pub confidence: ExtractionConfidence,
}
