//! Education text normalisation, rank encoding and education similarity.

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use crate::features::degree::DegreeCode;
use crate::features::similarity::tfidf_cosine;

/// Abbreviation expansions, applied in order to lower-cased text.
const EXPANSIONS: &[(&str, &str)] = &[
    (r"\bb[\s\.-]*sc\b", "bachelor of science"),
    (r"\bm[\s\.-]*sc\b", "master of science"),
    (r"\bb[\s\.-]*tech\b", "bachelor of technology"),
    (r"\bm[\s\.-]*tech\b", "master of technology"),
    (r"\bb[\s\.-]*e\b", "bachelor of engineering"),
    (r"\bm[\s\.-]*e\b", "master of engineering"),
    (r"\bb[\s\.-]*a\b", "bachelor of arts"),
    (r"\bm[\s\.-]*a\b", "master of arts"),
    (r"\bb[\s\.-]*com\b", "bachelor of commerce"),
    (r"\bm[\s\.-]*com\b", "master of commerce"),
    (r"\bb[\s\.-]*ba\b", "bachelor of business administration"),
    (r"\bm[\s\.-]*ba\b", "master of business administration"),
    (r"\bmba\b", "master of business administration"),
    (r"\bbba\b", "bachelor of business administration"),
    (r"\bph[\s\.-]*d\b", "doctor of philosophy"),
    (r"\bd[\s\.-]*phil\b", "doctor of philosophy"),
    (r"\bbachelor/honors\b", "bachelor degree"),
    (r"\bdiploma\b", "diploma"),
    (r"\bmasters?\b", "master degree"),
];

static EXPANSION_RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    EXPANSIONS
        .iter()
        .map(|(pattern, replacement)| {
            (
                Regex::new(pattern).expect("education expansion pattern is valid"),
                *replacement,
            )
        })
        .collect()
});

/// Lower-cases `text` and expands degree abbreviations.
pub fn normalize_education_text(text: &str) -> String {
    EXPANSION_RULES
        .iter()
        .fold(text.to_lowercase(), |acc, (pattern, replacement)| {
            pattern.replace_all(&acc, *replacement).into_owned()
        })
}

/// Highest rank among every rank-table key found as a substring of the
/// space-joined `parts`. No match (or no text) is rank 0.
///
/// Keys are matched against the lower-cased text and its normalised form:
/// "doctor of philosophy" contains no rank key, so "phd" must be seen raw.
pub fn encode_education_rank<S: AsRef<str>>(parts: &[S]) -> u8 {
    let joined = parts
        .iter()
        .map(|p| p.as_ref())
        .collect::<Vec<_>>()
        .join(" ");
    let haystack = format!(
        "{}\n{}",
        joined.to_lowercase(),
        normalize_education_text(&joined)
    );

    DegreeCode::ALL
        .iter()
        .filter(|code| haystack.contains(code.key().as_str()))
        .map(|code| code.rank())
        .max()
        .unwrap_or(0)
}

/// TF-IDF cosine between candidate and required education text.
///
/// Each side is `degree + major` joined and normalised. Empty text on either
/// side, or a vectorizer failure, yields 0.0.
pub fn compute_education_similarity<S: AsRef<str>>(candidate: &[S], required: &[S]) -> f64 {
    let join = |parts: &[S]| {
        normalize_education_text(
            &parts
                .iter()
                .map(|p| p.as_ref())
                .collect::<Vec<_>>()
                .join(" "),
        )
    };
    let candidate_text = join(candidate);
    let required_text = join(required);

    if candidate_text.trim().is_empty() || required_text.trim().is_empty() {
        return 0.0;
    }

    match tfidf_cosine(&candidate_text, &required_text) {
        Ok(similarity) => similarity,
        Err(e) => {
            warn!(error = %e, "education similarity failed; using 0.0");
            0.0
        }
    }
}
