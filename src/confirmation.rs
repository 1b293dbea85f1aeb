//! Confirmation decision workflow.
//!
//! When a screen finds unexpected positives, a human decides whether to
//! accept the result, send specific substances for lab confirmation, or
//! defer. This module validates those decisions, drives the record's
//! workflow state, and recomputes the final compliance status once
//! confirmation results arrive. Persistence stays with the caller; every
//! transition here is a pure function of the record and its inputs.

use std::collections::BTreeSet;

use thiserror::Error;
use uuid::Uuid;

use crate::models::enums::{
    ConfirmationDecision, ConfirmationOutcome, FinalStatus, ScreenResult, Substance, WorkflowState,
};
use crate::models::{ConfirmationResult, TestRecord};
use crate::screening::ClassificationOutcome;

#[derive(Error, Debug)]
pub enum WorkflowError {
    /// Finalize attempted while a decision is required and absent.
    #[error("A confirmation decision is required before this record can be finalized")]
    MissingConfirmationDecision,

    /// Confirmation requested with an empty selection or substances that
    /// are not among the unexpected positives.
    #[error("Invalid confirmation selection: {substances:?}")]
    InvalidConfirmationSelection { substances: Vec<Substance> },

    /// Confirmation results are missing for substances under confirmation.
    #[error("Missing confirmation results for: {missing:?}")]
    IncompleteConfirmationResults { missing: Vec<Substance> },

    /// A confirmation result arrived for a substance never sent for
    /// confirmation.
    #[error("Confirmation result for {substance:?} was never requested")]
    UnexpectedConfirmationResult { substance: Substance },

    #[error("Duplicate confirmation result for {substance:?}")]
    DuplicateConfirmationResult { substance: Substance },

    #[error("Record {record_id} has no classified screen yet")]
    NotScreened { record_id: Uuid },

    #[error("Record {record_id} is already finalized")]
    AlreadyFinalized { record_id: Uuid },

    #[error("No decision applies in workflow state {from:?}")]
    InvalidTransition { from: WorkflowState },
}

/// Workflow state a freshly classified record enters: auto-accepted
/// screens need no decision, everything else waits for one.
pub fn initial_state(outcome: &ClassificationOutcome) -> WorkflowState {
    if outcome.auto_accept {
        WorkflowState::NoDecisionNeeded
    } else {
        WorkflowState::DecisionPending
    }
}

/// Default confirmation selection: every unexpected positive.
pub fn default_confirmation_substances(outcome: &ClassificationOutcome) -> Vec<Substance> {
    outcome.unexpected_positives.clone()
}

/// Apply an operator decision to a record awaiting one.
///
/// `selection` is only meaningful for `RequestConfirmation`, where it must
/// be a non-empty subset of the unexpected positives (auto-population uses
/// `default_confirmation_substances`). A deferred record may be decided
/// again; any other state rejects the decision.
pub fn apply_decision(
    record: &mut TestRecord,
    decision: ConfirmationDecision,
    selection: &[Substance],
) -> Result<(), WorkflowError> {
    let outcome = screened_outcome(record)?;

    match record.workflow_state {
        WorkflowState::DecisionPending | WorkflowState::Deferred => {}
        WorkflowState::Finalized => {
            return Err(WorkflowError::AlreadyFinalized {
                record_id: record.id,
            })
        }
        from => return Err(WorkflowError::InvalidTransition { from }),
    }

    match decision {
        ConfirmationDecision::Accept => {
            record.workflow_state = WorkflowState::Accepted;
            record.confirmation_substances.clear();
        }
        ConfirmationDecision::RequestConfirmation => {
            let selection = validate_selection(&outcome, selection)?;
            record.confirmation_substances = selection;
            record.workflow_state = WorkflowState::AwaitingLabConfirmation;
        }
        ConfirmationDecision::PendingDecision => {
            record.workflow_state = WorkflowState::Deferred;
        }
    }

    record.decision = Some(decision);
    tracing::info!(
        record_id = %record.id,
        decision = decision.as_str(),
        state = record.workflow_state.as_str(),
        "Confirmation decision applied"
    );
    Ok(())
}

/// Finalize a record: derive its final status exactly once and enter the
/// terminal state.
///
/// Entry guard: a record with unexpected positives and no decision never
/// finalizes; that must fail loudly, not default. Records awaiting lab
/// confirmation must present a result for each substance under
/// confirmation, and nothing else.
pub fn finalize(
    record: &mut TestRecord,
    results: Vec<ConfirmationResult>,
) -> Result<FinalStatus, WorkflowError> {
    let outcome = screened_outcome(record)?;
    let initial = outcome.initial_screen_result;

    let status = match record.workflow_state {
        WorkflowState::Finalized => {
            return Err(WorkflowError::AlreadyFinalized {
                record_id: record.id,
            })
        }
        WorkflowState::AwaitingScreen => {
            return Err(WorkflowError::NotScreened {
                record_id: record.id,
            })
        }
        WorkflowState::DecisionPending | WorkflowState::Deferred => {
            if !outcome.unexpected_positives.is_empty() {
                return Err(WorkflowError::MissingConfirmationDecision);
            }
            final_status_from_initial(initial)
        }
        WorkflowState::NoDecisionNeeded | WorkflowState::Accepted => {
            final_status_from_initial(initial)
        }
        WorkflowState::AwaitingLabConfirmation => {
            validate_results(&record.confirmation_substances, &results)?;
            let status = compute_final_status(
                initial,
                &outcome.expected_positives,
                &results,
                record.breathalyzer_taken,
                record.breathalyzer_result,
            );
            record.confirmation_results = results;
            status
        }
    };

    record.final_status = Some(status);
    record.workflow_state = WorkflowState::Finalized;
    tracing::info!(
        record_id = %record.id,
        final_status = status.as_str(),
        "Record finalized"
    );
    Ok(status)
}

/// Recompute the final status from confirmation results. Pure; every input
/// comes from persisted fields so the result is reproducible later.
///
/// Any inconclusive confirmation blocks a clean pass/fail outright. A
/// confirmed positive keeps the record failing; whether it reads as mixed
/// depends on the initial classification having missing-expected findings.
/// All-negative confirmations clear the screen's false alarms, but a
/// critical missing medication still fails and a detectable breath
/// alcohol reading (unless itself confirmed negative) still bars a clean
/// pass.
pub fn compute_final_status(
    initial: ScreenResult,
    expected_positives: &[Substance],
    results: &[ConfirmationResult],
    breathalyzer_taken: bool,
    breathalyzer_result: Option<f64>,
) -> FinalStatus {
    if results
        .iter()
        .any(|r| r.outcome == ConfirmationOutcome::Inconclusive)
    {
        return FinalStatus::Inconclusive;
    }

    let confirmed_positives = results
        .iter()
        .filter(|r| r.outcome == ConfirmationOutcome::ConfirmedPositive)
        .count();

    let status = if confirmed_positives > 0 {
        match initial {
            ScreenResult::MixedUnexpected
            | ScreenResult::UnexpectedNegativeCritical
            | ScreenResult::UnexpectedNegativeWarning => FinalStatus::MixedUnexpected,
            _ => FinalStatus::UnexpectedPositive,
        }
    } else {
        match initial {
            ScreenResult::UnexpectedNegativeCritical | ScreenResult::MixedUnexpected => {
                FinalStatus::UnexpectedNegativeCritical
            }
            ScreenResult::UnexpectedNegativeWarning => FinalStatus::UnexpectedNegativeWarning,
            _ if !expected_positives.is_empty() => FinalStatus::ExpectedPositive,
            _ => FinalStatus::ConfirmedNegative,
        }
    };

    let alcohol_detected = breathalyzer_taken && breathalyzer_result.is_some_and(|r| r > 0.0);
    let alcohol_cleared = results.iter().any(|r| {
        r.substance == Substance::Ethanol && r.outcome == ConfirmationOutcome::ConfirmedNegative
    });
    if alcohol_detected
        && !alcohol_cleared
        && matches!(
            status,
            FinalStatus::ConfirmedNegative | FinalStatus::ExpectedPositive
        )
    {
        return FinalStatus::UnexpectedPositive;
    }

    status
}

/// Final status for records finalized without lab confirmation (accepted
/// or auto-accepted): the initial classification carries over, with a
/// clean negative screen reading as confirmed negative.
pub fn final_status_from_initial(initial: ScreenResult) -> FinalStatus {
    match initial {
        ScreenResult::Negative => FinalStatus::ConfirmedNegative,
        ScreenResult::ExpectedPositive => FinalStatus::ExpectedPositive,
        ScreenResult::UnexpectedPositive => FinalStatus::UnexpectedPositive,
        ScreenResult::UnexpectedNegativeCritical => FinalStatus::UnexpectedNegativeCritical,
        ScreenResult::UnexpectedNegativeWarning => FinalStatus::UnexpectedNegativeWarning,
        ScreenResult::MixedUnexpected => FinalStatus::MixedUnexpected,
    }
}

fn screened_outcome(record: &TestRecord) -> Result<ClassificationOutcome, WorkflowError> {
    record
        .outcome
        .clone()
        .ok_or(WorkflowError::NotScreened {
            record_id: record.id,
        })
}

fn validate_selection(
    outcome: &ClassificationOutcome,
    selection: &[Substance],
) -> Result<Vec<Substance>, WorkflowError> {
    let unexpected: BTreeSet<Substance> = outcome.unexpected_positives.iter().copied().collect();
    let selected: BTreeSet<Substance> = selection.iter().copied().collect();

    if selected.is_empty() || !selected.is_subset(&unexpected) {
        return Err(WorkflowError::InvalidConfirmationSelection {
            substances: selection.to_vec(),
        });
    }

    Ok(selected.into_iter().collect())
}

fn validate_results(
    under_confirmation: &[Substance],
    results: &[ConfirmationResult],
) -> Result<(), WorkflowError> {
    let requested: BTreeSet<Substance> = under_confirmation.iter().copied().collect();
    let mut seen = BTreeSet::new();

    for result in results {
        if !requested.contains(&result.substance) {
            return Err(WorkflowError::UnexpectedConfirmationResult {
                substance: result.substance,
            });
        }
        if !seen.insert(result.substance) {
            return Err(WorkflowError::DuplicateConfirmationResult {
                substance: result.substance,
            });
        }
    }

    let missing: Vec<Substance> = requested.difference(&seen).copied().collect();
    if !missing.is_empty() {
        return Err(WorkflowError::IncompleteConfirmationResults { missing });
    }

    Ok(())
}
