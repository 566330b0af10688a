//! Ranking Orchestrator: fetch, transform, score, persist.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::features::degree::{split_degree, DegreeSplit};
use crate::features::experience::total_experience;
use crate::features::transform::{transform, CandidateRecord, FeatureVector, JobRecord};
use crate::models::job::JobRow;
use crate::models::resume::{EducationEntry, ParsedResumeRow};
use crate::ranking::bias::{
    detect_bias, group_stats, grouped_mean, reweigh, BiasConfig, BiasReport,
};
use crate::ranking::model::ScoringModel;
use crate::store::RankingStore;

#[derive(Clone)]
pub struct RankingService {
    store: Arc<dyn RankingStore>,
    model: Arc<dyn ScoringModel>,
}

/// The education entry chosen as the candidate's highest degree.
#[derive(Debug, Clone, PartialEq)]
pub struct HighestDegree {
    pub text: String,
    pub split: DegreeSplit,
}

impl RankingService {
    pub fn new(store: Arc<dyn RankingStore>, model: Arc<dyn ScoringModel>) -> Self {
        Self { store, model }
    }

    pub fn model_backend(&self) -> &'static str {
        self.model.backend()
    }

    /// Scores one resume against its job and stores the result, replacing
    /// any earlier score.
    pub async fn rank(&self, resume_id: Uuid) -> Result<f64, AppError> {
        let resume = self
            .store
            .fetch_resume(resume_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No resume found for resumeID {resume_id}")))?;
        let job = self
            .store
            .fetch_job(resume.job_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No job found for jobID {}", resume.job_id)))?;

        let candidate = build_candidate_record(&resume);
        let job_record = build_job_record(&job);
        let features = transform(&candidate, &job_record);

        let score = self.model.predict(&features).await?;
        info!(
            %resume_id,
            job_id = %job.id,
            degree = ?candidate.degree_code,
            highest_degree = features.highest_degree,
            score,
            "Predicted ranking score"
        );

        self.store
            .update_score(resume_id, score, features.highest_degree)
            .await?;
        Ok(score)
    }

    /// Scores a caller-supplied feature vector without touching storage.
    pub async fn predict(&self, features: &FeatureVector) -> Result<f64, AppError> {
        self.model.predict(features).await
    }

    /// Runs the bias check over a job's ranked candidates and persists the
    /// reweighed scores of flagged groups.
    pub async fn audit_job(&self, job_id: Uuid, config: &BiasConfig) -> Result<BiasReport, AppError> {
        self.store
            .fetch_job(job_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No job found for jobID {job_id}")))?;

        let records = self.store.scored_candidates(job_id).await?;
        let biased_groups = detect_bias(&records, config);
        let adjusted = reweigh(&records, &biased_groups);

        let changed: Vec<_> = adjusted
            .into_iter()
            .zip(&records)
            .filter(|(after, before)| after.ranking_score != before.ranking_score)
            .map(|(after, _)| after)
            .collect();
        if !changed.is_empty() {
            self.store.update_scores(&changed).await?;
        }

        let groups = group_stats(&records);
        info!(
            %job_id,
            sample_size = records.len(),
            biased = ?biased_groups,
            adjusted = changed.len(),
            "Bias audit complete"
        );

        Ok(BiasReport {
            job_id,
            sample_size: records.len(),
            global_mean: grouped_mean(&groups),
            groups,
            biased_groups,
            adjusted: changed.len(),
        })
    }
}

/// Entry with the highest-ranked parsed degree; the first one wins ties.
/// When nothing parses, the first entry is used as-is.
pub fn select_highest_degree(education: &[EducationEntry]) -> Option<HighestDegree> {
    let mut best: Option<(u8, HighestDegree)> = None;
    for entry in education {
        let split = split_degree(&entry.degree);
        let Some(code) = split.code else {
            continue;
        };
        if best.as_ref().map_or(true, |(rank, _)| code.rank() > *rank) {
            best = Some((
                code.rank(),
                HighestDegree {
                    text: entry.degree.clone(),
                    split,
                },
            ));
        }
    }

    best.map(|(_, highest)| highest).or_else(|| {
        education.first().map(|entry| HighestDegree {
            text: entry.degree.clone(),
            split: split_degree(&entry.degree),
        })
    })
}

pub fn build_candidate_record(resume: &ParsedResumeRow) -> CandidateRecord {
    let highest = select_highest_degree(&resume.education);
    CandidateRecord {
        degree_code: highest.as_ref().and_then(|h| h.split.code),
        degree_label: highest.as_ref().and_then(|h| h.split.label()),
        major: highest
            .as_ref()
            .map(|h| h.split.field.clone())
            .unwrap_or_default(),
        highest_degree_text: highest.map(|h| h.text),
        experience_years: total_experience(&resume.work_experience),
        skills: resume.skills.technical_skills.clone(),
    }
}

pub fn build_job_record(job: &JobRow) -> JobRecord {
    let split = split_degree(&job.required_education);
    JobRecord {
        required_degree_text: job.required_education.clone(),
        required_degree_label: split.label(),
        required_major: split.field,
        required_experience: job.required_experience,
        required_skills: job.required_skills.clone(),
    }
}
