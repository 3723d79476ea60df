//! Answer matching.
//!
//! A submission matches when, after trimming surrounding whitespace and
//! lower-casing, it equals any accepted answer normalized the same way.

/// Normalize a submitted or accepted answer for comparison.
pub fn normalize_answer(answer: &str) -> String {
    answer.trim().to_lowercase()
}

/// Check a submission against the accepted answers.
///
/// A non-match is an ordinary negative result, never an error. Blank accepted
/// answers never match.
pub fn answer_matches(submitted: &str, accepted: &[String]) -> bool {
    let submitted = normalize_answer(submitted);
    if submitted.is_empty() {
        return false;
    }
    accepted.iter().any(|a| normalize_answer(a) == submitted)
}
