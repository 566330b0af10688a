use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// One education line as produced by the resume parser. Institution and
/// year are stored alongside but play no part in ranking.
#[derive(Debug, Clone, Deserialize)]
pub struct EducationEntry {
    pub degree: String,
}

/// One work-experience line. Either `duration` ("2 years 3 months") or
/// `dates` ("Jan 2020 - Present") carries the length of the role.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkExperience {
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub dates: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResumeSkills {
    #[serde(default)]
    pub technical_skills: Vec<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ParsedResumeRow {
    pub id: Uuid,
    pub job_id: Uuid,
    pub education: Json<Vec<EducationEntry>>,
    pub work_experience: Json<Vec<WorkExperience>>,
    pub skills: Json<ResumeSkills>,
    pub ranking_score: Option<f64>,
    /// Education rank of the candidate's highest degree; the bias group key.
    pub highest_degree: Option<i16>,
    pub ranked_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parser_payload_with_extra_fields_deserializes() {
        let education: Vec<EducationEntry> = serde_json::from_str(
            r#"[{"degree": "BSc in Physics", "institution": "University of Colombo", "year": "2019"}]"#,
        )
        .unwrap();
        assert_eq!(education[0].degree, "BSc in Physics");

        let work: WorkExperience = serde_json::from_str(
            r#"{"title": "Engineer", "company": "Acme", "dates": "Jan 2020 - Present"}"#,
        )
        .unwrap();
        assert_eq!(work.duration, None);
        assert_eq!(work.dates.as_deref(), Some("Jan 2020 - Present"));

        let skills: ResumeSkills = serde_json::from_str(
            r#"{"technical_skills": ["Rust"], "soft_skills": ["Teamwork"]}"#,
        )
        .unwrap();
        assert_eq!(skills.technical_skills, vec!["Rust"]);
    }
}
