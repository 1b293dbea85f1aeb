pub mod client;
pub mod enums;
pub mod medication;
pub mod test_record;

pub use client::{Client, Identity};
pub use medication::{Medication, SnapshotMedication};
pub use test_record::{ConfirmationResult, ExtractedReport, TestRecord};
