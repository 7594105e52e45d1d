//! Course model - training programmes offered on the platform.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::models::Lifecycle;

/// Course entity. Soft-deleted; read queries filter on the active
/// lifecycle state.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub r#type: String,
    pub duration: Option<String>,
    pub description: Option<String>,
    pub trainer_id: Option<i64>,
    pub target_audiences: Option<Vec<String>>,
    pub thumbnail: Option<String>,
    pub level: Option<String>,
    pub last_date: Option<DateTime<Utc>>,
    pub show_feedback: bool,
    pub feedback_question: Option<String>,
    pub status: Option<String>,
    pub created_by: Option<i64>,
    pub updated_by: Option<i64>,
    pub deleted_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Course {
    pub fn lifecycle(&self) -> Lifecycle {
        Lifecycle::from_deleted_at(self.deleted_at)
    }
}

/// Insertable course fields; ids and timestamps come from the database.
#[derive(Debug, Clone)]
pub struct CourseDraft {
    pub name: String,
    pub r#type: String,
    pub duration: Option<String>,
    pub description: Option<String>,
    pub trainer_id: Option<i64>,
    pub target_audiences: Option<Vec<String>>,
    pub thumbnail: Option<String>,
    pub level: Option<String>,
    pub last_date: Option<DateTime<Utc>>,
    pub show_feedback: bool,
    pub feedback_question: Option<String>,
    pub status: Option<String>,
    pub created_by: Option<i64>,
}

/// Request body for POST /api/courses.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCourseRequest {
    #[validate(length(min = 1, max = 200, message = "name is required"))]
    pub name: String,
    #[serde(rename = "type")]
    #[validate(length(min = 1, max = 100, message = "type is required"))]
    pub r#type: String,
    pub duration: Option<String>,
    pub description: Option<String>,
    pub trainer_id: Option<i64>,
    pub target_audiences: Option<Vec<String>>,
    pub thumbnail: Option<String>,
    pub level: Option<String>,
    /// RFC 3339 timestamp; garbage is rejected with a validation error.
    pub last_date: Option<String>,
    #[serde(default)]
    pub show_feedback: bool,
    pub feedback_question: Option<String>,
    pub status: Option<String>,
}

/// Request body for PUT /api/courses/:id. Absent fields keep their stored
/// value.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCourseRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[serde(rename = "type")]
    #[validate(length(min = 1, max = 100))]
    pub r#type: Option<String>,
    pub duration: Option<String>,
    pub description: Option<String>,
    pub trainer_id: Option<i64>,
    pub target_audiences: Option<Vec<String>>,
    pub thumbnail: Option<String>,
    pub level: Option<String>,
    pub last_date: Option<String>,
    pub show_feedback: Option<bool>,
    pub feedback_question: Option<String>,
    pub status: Option<String>,
}

/// Parse an optional RFC 3339 date field from a request body.
pub fn parse_date(value: Option<&str>) -> Result<Option<DateTime<Utc>>, service_core::error::AppError> {
    match value {
        None => Ok(None),
        Some(raw) => raw
            .parse::<DateTime<Utc>>()
            .map(Some)
            .map_err(|_| {
                service_core::error::AppError::Validation(
                    "Invalid date format provided.".to_string(),
                )
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_accepts_rfc3339() {
        let parsed = parse_date(Some("2026-03-01T10:00:00Z")).unwrap();
        assert!(parsed.is_some());
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert!(parse_date(Some("next tuesday")).is_err());
    }

    #[test]
    fn test_parse_date_passes_through_none() {
        assert_eq!(parse_date(None).unwrap(), None);
    }

    #[test]
    fn test_course_lifecycle() {
        let now = Utc::now();
        let mut course = Course {
            id: 1,
            name: "Rust 101".to_string(),
            r#type: "online".to_string(),
            duration: None,
            description: None,
            trainer_id: None,
            target_audiences: None,
            thumbnail: None,
            level: None,
            last_date: None,
            show_feedback: false,
            feedback_question: None,
            status: Some("draft".to_string()),
            created_by: None,
            updated_by: None,
            deleted_by: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        assert!(course.lifecycle().is_active());
        course.deleted_at = Some(now);
        assert_eq!(course.lifecycle(), Lifecycle::Deleted);
    }
}
