//! Resume / job access and score persistence.
//!
//! `RankingService` only sees `Arc<dyn RankingStore>`; production uses
//! `PgRankingStore`, tests use the in-memory store.

pub mod postgres;

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::job::JobRow;
use crate::models::resume::ParsedResumeRow;
use crate::ranking::bias::ScoredCandidate;

#[async_trait]
pub trait RankingStore: Send + Sync {
    async fn fetch_resume(&self, resume_id: Uuid) -> Result<Option<ParsedResumeRow>, AppError>;

    async fn fetch_job(&self, job_id: Uuid) -> Result<Option<JobRow>, AppError>;

    /// Overwrites any previous score; no history is kept.
    async fn update_score(
        &self,
        resume_id: Uuid,
        score: f64,
        highest_degree: u8,
    ) -> Result<(), AppError>;

    /// Every resume of the job that has been ranked.
    async fn scored_candidates(&self, job_id: Uuid) -> Result<Vec<ScoredCandidate>, AppError>;

    /// Writes all given scores atomically.
    async fn update_scores(&self, candidates: &[ScoredCandidate]) -> Result<(), AppError>;
}
