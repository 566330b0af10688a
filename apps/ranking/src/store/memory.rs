use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::job::JobRow;
use crate::models::resume::ParsedResumeRow;
use crate::ranking::bias::ScoredCandidate;
use crate::store::RankingStore;

/// `RankingStore` backed by hash maps, for service and router tests.
#[derive(Default)]
pub struct MemoryStore {
    resumes: Mutex<HashMap<Uuid, ParsedResumeRow>>,
    jobs: Mutex<HashMap<Uuid, JobRow>>,
}

impl MemoryStore {
    pub fn insert_resume(&self, resume: ParsedResumeRow) {
        self.resumes.lock().unwrap().insert(resume.id, resume);
    }

    pub fn insert_job(&self, job: JobRow) {
        self.jobs.lock().unwrap().insert(job.id, job);
    }

    pub fn resume(&self, resume_id: Uuid) -> Option<ParsedResumeRow> {
        self.resumes.lock().unwrap().get(&resume_id).cloned()
    }
}

#[async_trait]
impl RankingStore for MemoryStore {
    async fn fetch_resume(&self, resume_id: Uuid) -> Result<Option<ParsedResumeRow>, AppError> {
        Ok(self.resume(resume_id))
    }

    async fn fetch_job(&self, job_id: Uuid) -> Result<Option<JobRow>, AppError> {
        Ok(self.jobs.lock().unwrap().get(&job_id).cloned())
    }

    async fn update_score(
        &self,
        resume_id: Uuid,
        score: f64,
        highest_degree: u8,
    ) -> Result<(), AppError> {
        let mut resumes = self.resumes.lock().unwrap();
        let resume = resumes
            .get_mut(&resume_id)
            .ok_or_else(|| AppError::NotFound(format!("Resume {resume_id} not found")))?;
        resume.ranking_score = Some(score);
        resume.highest_degree = Some(i16::from(highest_degree));
        resume.ranked_at = Some(chrono::Utc::now());
        Ok(())
    }

    async fn scored_candidates(&self, job_id: Uuid) -> Result<Vec<ScoredCandidate>, AppError> {
        let mut candidates: Vec<ScoredCandidate> = self
            .resumes
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.job_id == job_id && r.ranking_score.is_some())
            .map(|r| ScoredCandidate {
                resume_id: r.id,
                highest_degree: r.highest_degree.and_then(|d| u8::try_from(d).ok()),
                ranking_score: r.ranking_score,
            })
            .collect();
        candidates.sort_by_key(|c| c.resume_id);
        Ok(candidates)
    }

    async fn update_scores(&self, candidates: &[ScoredCandidate]) -> Result<(), AppError> {
        let mut resumes = self.resumes.lock().unwrap();
        for candidate in candidates {
            if let Some(resume) = resumes.get_mut(&candidate.resume_id) {
                resume.ranking_score = candidate.ranking_score;
            }
        }
        Ok(())
    }
}
