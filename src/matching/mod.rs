//! Identity and record matching: who does an uploaded report belong to,
//! and which pending test record does it complete.

pub mod client_resolver;
pub mod record_matcher;
pub mod similarity;

pub use client_resolver::{
    parse_extracted_name, resolve_client, ClientMatch, ClientSearch, MatchType,
};
pub use record_matcher::{
    auto_select, confidence_band, match_score, rank_pending_records, suggestions, RecordMatch,
    AUTO_SELECT_THRESHOLD, SUGGESTION_LIMIT,
};
pub use similarity::{name_similarity, string_similarity};

use thiserror::Error;

use crate::db::DatabaseError;

/// Failures of the record-store lookups behind the matchers. "No results"
/// is a valid outcome and never reported through this type.
#[derive(Error, Debug)]
pub enum LookupError {
    #[error("Record store query failed: {0}")]
    Store(#[from] DatabaseError),

    #[error("Lookup exceeded its deadline")]
    Timeout,
}
