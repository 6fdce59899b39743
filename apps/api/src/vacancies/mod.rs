use tracing::info;

use crate::errors::AppError;
use crate::models::vacancy::{NewVacancy, Vacancy};
use crate::repository::Repository;

pub mod handlers;

/// Validates and persists a submitted vacancy.
pub async fn create_vacancy(
    repo: &dyn Repository,
    submission: NewVacancy,
) -> Result<Vacancy, AppError> {
    if submission.title.trim().is_empty() {
        return Err(AppError::Validation("title cannot be empty".to_string()));
    }
    check_lengths(&submission)?;
    for (field, value) in [
        ("salary_min", submission.salary_min),
        ("salary_max", submission.salary_max),
    ] {
        if value.is_some_and(|v| v < 0) {
            return Err(AppError::Validation(format!("{field} cannot be negative")));
        }
    }
    if let (Some(min), Some(max)) = (submission.salary_min, submission.salary_max) {
        if min > max {
            return Err(AppError::Validation(format!(
                "salary_min ({min}) exceeds salary_max ({max})"
            )));
        }
    }

    let vacancy = Vacancy::from(submission);
    repo.create_vacancy(&vacancy).await?;
    info!(vacancy_id = %vacancy.id, "Stored vacancy '{}'", vacancy.title);
    Ok(vacancy)
}

/// Column widths from the `vacancies` table; `None` is unbounded TEXT.
fn check_lengths(v: &NewVacancy) -> Result<(), AppError> {
    let fields = [
        ("title", &v.title, Some(255)),
        ("requirements", &v.requirements, None),
        ("responsibilities", &v.responsibilities, None),
        ("region", &v.region, Some(100)),
        ("city", &v.city, Some(100)),
        ("employment_type", &v.employment_type, Some(50)),
        ("work_schedule", &v.work_schedule, Some(50)),
        ("experience", &v.experience, Some(50)),
        ("education", &v.education, Some(100)),
        ("languages", &v.languages, None),
        ("skills", &v.skills, None),
    ];

    for (field, value, limit) in fields {
        if value.contains('\0') {
            return Err(AppError::Validation(format!(
                "{field} cannot contain NUL characters"
            )));
        }
        if let Some(limit) = limit {
            let len = value.chars().count();
            if len > limit {
                return Err(AppError::Validation(format!(
                    "{field} is {len} characters long; at most {limit} allowed"
                )));
            }
        }
    }
    Ok(())
}
