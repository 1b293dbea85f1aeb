//! Name similarity scoring for client resolution.
//!
//! Extracted donor names carry OCR noise, nicknames, and typos, so exact
//! lookup is backed by a normalized edit-distance score. Last names dominate
//! the combined score: in this population they collide far less often than
//! first names, and an exact last-name match alone clears the acceptance
//! threshold.

use crate::models::Identity;

/// Weight of the last-name score in the combined name score.
const LAST_NAME_WEIGHT: f64 = 0.85;

/// Weight of the first-name score in the combined name score.
const FIRST_NAME_WEIGHT: f64 = 0.15;

/// Boost factor applied to the first-name score when both middle initials
/// are present and agree.
const MIDDLE_INITIAL_BOOST: f64 = 0.1;

/// Normalized similarity between two strings in `[0, 1]`.
/// Case-insensitive; `(max_len - levenshtein) / max_len`, with two empty
/// strings identical by convention.
pub fn string_similarity(a: &str, b: &str) -> f64 {
    let a = a.to_lowercase();
    let b = b.to_lowercase();

    let a_len = a.chars().count();
    let b_len = b.chars().count();
    let max_len = a_len.max(b_len);
    if max_len == 0 {
        return 1.0;
    }

    let distance = levenshtein(&a, &b);
    (max_len - distance) as f64 / max_len as f64
}

/// Weighted name similarity between a search name and a candidate in
/// `[0, 1]`. Last name carries 85% of the score, first name 15%; matching
/// middle initials nudge the first-name component up by a tenth of their
/// own similarity.
pub fn name_similarity(search: &Identity, candidate: &Identity) -> f64 {
    let last_score = string_similarity(&search.last_name, &candidate.last_name);
    let mut first_score = string_similarity(&search.first_name, &candidate.first_name);

    if let (Some(search_mid), Some(candidate_mid)) =
        (&search.middle_initial, &candidate.middle_initial)
    {
        let middle = string_similarity(search_mid, candidate_mid);
        first_score = (first_score + middle * MIDDLE_INITIAL_BOOST).min(1.0);
    }

    last_score * LAST_NAME_WEIGHT + first_score * FIRST_NAME_WEIGHT
}

/// Compute Levenshtein edit distance between two strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let m = a_chars.len();
    let n = b_chars.len();

    if m == 0 {
        return n;
    }
    if n == 0 {
        return m;
    }

    let mut prev: Vec<usize> = (0..=n).collect();
    let mut curr = vec![0usize; n + 1];

    for (i, &a_ch) in a_chars.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &b_ch) in b_chars.iter().enumerate() {
            let cost = usize::from(a_ch != b_ch);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[n]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(first: &str, last: &str, middle: Option<&str>) -> Identity {
        Identity::new(first, last, middle)
    }

    #[test]
    fn levenshtein_basic() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", "abc"), 0);
    }

    #[test]
    fn identical_strings_score_one() {
        assert_eq!(string_similarity("Doe", "Doe"), 1.0);
        assert_eq!(string_similarity("doe", "DOE"), 1.0);
    }

    #[test]
    fn both_empty_strings_score_one() {
        assert_eq!(string_similarity("", ""), 1.0);
    }

    #[test]
    fn similarity_stays_in_unit_interval() {
        for (a, b) in [
            ("", "Doe"),
            ("Doe", ""),
            ("John", "Jonathan"),
            ("completely", "different"),
            ("a", "zzzzzzzzzz"),
        ] {
            let score = string_similarity(a, b);
            assert!((0.0..=1.0).contains(&score), "{a:?} vs {b:?} -> {score}");
        }
    }

    #[test]
    fn similarity_is_symmetric() {
        for (a, b) in [("John", "Jon"), ("Doe", "Dough"), ("", "x")] {
            assert_eq!(string_similarity(a, b), string_similarity(b, a));
        }
    }

    #[test]
    fn exact_name_scores_one() {
        let score = name_similarity(
            &identity("John", "Doe", None),
            &identity("John", "Doe", None),
        );
        assert!((score - 1.0).abs() < 1e-12, "got {score}");
    }

    #[test]
    fn first_name_typo_stays_high_confidence() {
        // Last-name-dominant weighting keeps a first-name typo well above
        // the fuzzy acceptance threshold.
        let score = name_similarity(
            &identity("Jon", "Doe", None),
            &identity("John", "Doe", None),
        );
        assert!(score > 0.85, "got {score}");
    }

    #[test]
    fn last_name_mismatch_dominates() {
        let same_first = name_similarity(
            &identity("John", "Doe", None),
            &identity("John", "Smithfield", None),
        );
        assert!(same_first < 0.5, "got {same_first}");
    }

    #[test]
    fn matching_middle_initial_boosts_score() {
        let without = name_similarity(
            &identity("Jon", "Doe", None),
            &identity("John", "Doe", None),
        );
        let with = name_similarity(
            &identity("Jon", "Doe", Some("Q")),
            &identity("John", "Doe", Some("Q")),
        );
        assert!(with > without, "{with} <= {without}");
    }

    #[test]
    fn middle_initial_boost_caps_first_component() {
        // An already exact first name cannot exceed 1.0 through the boost.
        let score = name_similarity(
            &identity("John", "Doe", Some("Q")),
            &identity("John", "Doe", Some("Q")),
        );
        assert!(score <= 1.0, "got {score}");
        assert!((score - 1.0).abs() < 1e-12, "got {score}");
    }
}
