use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct JobRow {
    pub id: Uuid,
    pub required_education: String,
    /// Years.
    pub required_experience: f64,
    pub required_skills: Vec<String>,
}
