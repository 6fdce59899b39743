use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Vacancy {
    pub id: Uuid,
    pub title: String,
    pub requirements: String,
    pub responsibilities: String,
    pub region: String,
    pub city: String,
    pub employment_type: String,
    pub work_schedule: String,
    pub experience: String,
    pub education: String,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
    pub languages: String,
    pub skills: String,
    pub created_at: DateTime<Utc>,
}

/// Client-supplied vacancy fields. Everything except `title` may be omitted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewVacancy {
    pub title: String,
    pub requirements: String,
    pub responsibilities: String,
    pub region: String,
    pub city: String,
    pub employment_type: String,
    pub work_schedule: String,
    pub experience: String,
    pub education: String,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
    pub languages: String,
    pub skills: String,
}

impl From<NewVacancy> for Vacancy {
    fn from(v: NewVacancy) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: v.title,
            requirements: v.requirements,
            responsibilities: v.responsibilities,
            region: v.region,
            city: v.city,
            employment_type: v.employment_type,
            work_schedule: v.work_schedule,
            experience: v.experience,
            education: v.education,
            salary_min: v.salary_min,
            salary_max: v.salary_max,
            languages: v.languages,
            skills: v.skills,
            created_at: Utc::now(),
        }
    }
}
