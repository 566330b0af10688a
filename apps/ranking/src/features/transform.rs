//! Feature Transformer: turns a candidate and a job into the 6-field vector
//! the scoring model consumes.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::features::degree::DegreeCode;
use crate::features::education::{compute_education_similarity, encode_education_rank};
use crate::features::similarity::tfidf_cosine;

/// Feature names in the order the model was trained on.
pub const FEATURE_NAMES: [&str; 6] = [
    "education_similarity",
    "experience_years",
    "cosine_similarity_skills",
    "highest_degree",
    "ed_req_encoded",
    "exp_req_encoded",
];

/// The only artifact passed to the scoring model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub education_similarity: f64,
    pub experience_years: f64,
    pub cosine_similarity_skills: f64,
    pub highest_degree: u8,
    pub ed_req_encoded: u8,
    pub exp_req_encoded: f64,
}

impl FeatureVector {
    /// Values in `FEATURE_NAMES` order.
    pub fn to_model_input(&self) -> [f64; 6] {
        [
            self.education_similarity,
            self.experience_years,
            self.cosine_similarity_skills,
            f64::from(self.highest_degree),
            f64::from(self.ed_req_encoded),
            self.exp_req_encoded,
        ]
    }
}

#[derive(Debug, Clone, Default)]
pub struct CandidateRecord {
    /// Raw text of the education entry chosen as the highest degree.
    pub highest_degree_text: Option<String>,
    pub degree_code: Option<DegreeCode>,
    /// Code plus qualifier, e.g. "BSC (Hons)".
    pub degree_label: Option<String>,
    pub major: String,
    pub experience_years: f64,
    pub skills: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct JobRecord {
    pub required_degree_text: String,
    pub required_degree_label: Option<String>,
    pub required_major: String,
    pub required_experience: f64,
    pub required_skills: Vec<String>,
}

/// Builds the feature vector. Pure apart from per-call TF-IDF fitting.
pub fn transform(candidate: &CandidateRecord, job: &JobRecord) -> FeatureVector {
    let candidate_education = non_empty(&[
        candidate.degree_label.as_deref(),
        Some(candidate.major.as_str()),
    ]);
    let required_education = non_empty(&[
        job.required_degree_label.as_deref(),
        Some(job.required_major.as_str()),
    ]);

    FeatureVector {
        education_similarity: compute_education_similarity(
            &candidate_education,
            &required_education,
        ),
        experience_years: candidate.experience_years,
        cosine_similarity_skills: compute_skill_similarity(
            &candidate.skills,
            &job.required_skills,
        ),
        highest_degree: encode_education_rank(&rank_input(
            candidate.degree_label.as_deref(),
            candidate.highest_degree_text.as_deref(),
        )),
        ed_req_encoded: encode_education_rank(&rank_input(
            job.required_degree_label.as_deref(),
            Some(job.required_degree_text.as_str()),
        )),
        exp_req_encoded: job.required_experience,
    }
}

/// TF-IDF cosine of the space-joined skill lists; 0.0 when either list is
/// empty or the vectorizer fails.
pub fn compute_skill_similarity(candidate_skills: &[String], required_skills: &[String]) -> f64 {
    if candidate_skills.is_empty() || required_skills.is_empty() {
        return 0.0;
    }

    let candidate_text = candidate_skills.join(" ");
    let required_text = required_skills.join(" ");
    if candidate_text.is_empty() || required_text.is_empty() {
        return 0.0;
    }

    match tfidf_cosine(&candidate_text, &required_text) {
        Ok(similarity) => similarity,
        Err(e) => {
            warn!(error = %e, "skill similarity failed; using 0.0");
            0.0
        }
    }
}

fn non_empty<'a>(parts: &[Option<&'a str>]) -> Vec<&'a str> {
    parts
        .iter()
        .flatten()
        .copied()
        .filter(|p| !p.is_empty())
        .collect()
}

/// The parsed label when there is one, otherwise the raw degree text.
fn rank_input<'a>(label: Option<&'a str>, raw: Option<&'a str>) -> Vec<&'a str> {
    label.or(raw).into_iter().collect()
}
