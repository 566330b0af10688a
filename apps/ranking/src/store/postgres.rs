use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::job::JobRow;
use crate::models::resume::ParsedResumeRow;
use crate::ranking::bias::ScoredCandidate;
use crate::store::RankingStore;

#[derive(Clone)]
pub struct PgRankingStore {
    pool: PgPool,
}

impl PgRankingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ScoredRow {
    id: Uuid,
    highest_degree: Option<i16>,
    ranking_score: Option<f64>,
}

impl From<ScoredRow> for ScoredCandidate {
    fn from(row: ScoredRow) -> Self {
        ScoredCandidate {
            resume_id: row.id,
            highest_degree: row.highest_degree.and_then(|d| u8::try_from(d).ok()),
            ranking_score: row.ranking_score,
        }
    }
}

#[async_trait]
impl RankingStore for PgRankingStore {
    async fn fetch_resume(&self, resume_id: Uuid) -> Result<Option<ParsedResumeRow>, AppError> {
        Ok(sqlx::query_as::<_, ParsedResumeRow>(
            r#"
            SELECT id, job_id, education, work_experience, skills,
                   ranking_score, highest_degree, ranked_at
            FROM parsed_resumes
            WHERE id = $1
            "#,
        )
        .bind(resume_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn fetch_job(&self, job_id: Uuid) -> Result<Option<JobRow>, AppError> {
        Ok(sqlx::query_as::<_, JobRow>(
            r#"
            SELECT id, required_education, required_experience, required_skills
            FROM jobs
            WHERE id = $1
            "#,
        )
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn update_score(
        &self,
        resume_id: Uuid,
        score: f64,
        highest_degree: u8,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE parsed_resumes
            SET ranking_score = $1, highest_degree = $2, ranked_at = NOW()
            WHERE id = $3
            "#,
        )
        .bind(score)
        .bind(i16::from(highest_degree))
        .bind(resume_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn scored_candidates(&self, job_id: Uuid) -> Result<Vec<ScoredCandidate>, AppError> {
        let rows = sqlx::query_as::<_, ScoredRow>(
            r#"
            SELECT id, highest_degree, ranking_score
            FROM parsed_resumes
            WHERE job_id = $1 AND ranking_score IS NOT NULL
            ORDER BY id
            "#,
        )
        .bind(job_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ScoredCandidate::from).collect())
    }

    async fn update_scores(&self, candidates: &[ScoredCandidate]) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        for candidate in candidates {
            sqlx::query("UPDATE parsed_resumes SET ranking_score = $1 WHERE id = $2")
                .bind(candidate.ranking_score)
                .bind(candidate.resume_id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}
