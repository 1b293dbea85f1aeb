//! Client resolution: exact lookup first, fuzzy fallback second.
//!
//! Resolution never fails on "no match": an empty result list is a valid
//! outcome and the caller decides whether to prompt manual registration.
//! Store failures and deadline overruns surface as `LookupError`.

use std::time::Instant;

use rusqlite::Connection;
use serde::Serialize;

use crate::db::repository;
use crate::models::{Client, Identity};

use super::similarity::name_similarity;
use super::LookupError;

/// Cap on exact matches returned, natural fetch order.
const EXACT_MATCH_LIMIT: usize = 5;

/// Cap on fuzzy matches returned, best first.
const FUZZY_MATCH_LIMIT: usize = 10;

/// Fuzzy candidates at or below this score are discarded.
const FUZZY_SCORE_FLOOR: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    Exact,
    Fuzzy,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClientMatch {
    pub client: Client,
    pub score: f64,
    pub match_type: MatchType,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClientSearch {
    pub matches: Vec<ClientMatch>,
    pub search_term: String,
}

/// Resolve the best-matching client records for a name.
///
/// Step 1: exact case-insensitive first/last lookup (middle initial only
/// when supplied), capped at 5. Step 2, only when step 1 is empty: score
/// the whole candidate pool with the weighted name similarity, keep scores
/// above 0.5, best first, capped at 10.
///
/// `deadline` bounds the blocking store work; exceeding it returns
/// `LookupError::Timeout` rather than a silently empty result.
pub fn resolve_client(
    conn: &Connection,
    query: &Identity,
    deadline: Option<Instant>,
) -> Result<ClientSearch, LookupError> {
    let search_term = query.full_name();

    check_deadline(deadline)?;
    let exact = repository::find_clients_by_name(conn, query, EXACT_MATCH_LIMIT)?;
    if !exact.is_empty() {
        tracing::debug!(term = %search_term, count = exact.len(), "Exact client match");
        let matches = exact
            .into_iter()
            .map(|client| ClientMatch {
                client,
                score: 1.0,
                match_type: MatchType::Exact,
            })
            .collect();
        return Ok(ClientSearch {
            matches,
            search_term,
        });
    }

    check_deadline(deadline)?;
    let pool = repository::list_clients(conn)?;

    check_deadline(deadline)?;
    let mut scored: Vec<ClientMatch> = pool
        .into_iter()
        .map(|client| {
            let score = name_similarity(query, &client.identity);
            ClientMatch {
                client,
                score,
                match_type: MatchType::Fuzzy,
            }
        })
        .filter(|m| m.score > FUZZY_SCORE_FLOOR)
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    scored.truncate(FUZZY_MATCH_LIMIT);

    tracing::debug!(term = %search_term, count = scored.len(), "Fuzzy client match");
    Ok(ClientSearch {
        matches: scored,
        search_term,
    })
}

fn check_deadline(deadline: Option<Instant>) -> Result<(), LookupError> {
    match deadline {
        Some(d) if Instant::now() > d => Err(LookupError::Timeout),
        _ => Ok(()),
    }
}

/// Parse an extracted donor name into an identity for resolution.
///
/// Accepts "Last, First [Middle]" and "First [Middle] Last" forms. A
/// middle token is kept as a single-letter initial. A lone token is taken
/// as a last name (the dominant component); whitespace-only input yields
/// nothing.
pub fn parse_extracted_name(raw: &str) -> Option<Identity> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Some((last, rest)) = raw.split_once(',') {
        let mut tokens = rest.split_whitespace();
        let first = tokens.next().unwrap_or("");
        let middle = tokens.next().map(initial);
        return Some(Identity::new(first, last, middle.as_deref()));
    }

    let tokens: Vec<&str> = raw.split_whitespace().collect();
    match tokens.as_slice() {
        [] => None,
        [last] => Some(Identity::new("", last, None)),
        [first, last] => Some(Identity::new(first, last, None)),
        [first, middle, .., last] => {
            Some(Identity::new(first, last, Some(initial(middle).as_str())))
        }
    }
}

fn initial(token: &str) -> String {
    token
        .trim_matches('.')
        .chars()
        .next()
        .map(|c| c.to_uppercase().to_string())
        .unwrap_or_default()
}
