//! Course CRUD endpoints. Token-gated; no capability requirement beyond
//! authentication.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::handlers::ApiResponse;
use crate::middleware::AuthUser;
use crate::models::course::{parse_date, Course, CourseDraft, CreateCourseRequest, UpdateCourseRequest};
use crate::utils::ValidatedJson;
use crate::AppState;
use service_core::error::AppError;

/// POST /api/courses
pub async fn create_course(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    ValidatedJson(req): ValidatedJson<CreateCourseRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Course>>), AppError> {
    let last_date = parse_date(req.last_date.as_deref())?;

    let draft = CourseDraft {
        name: req.name,
        r#type: req.r#type,
        duration: req.duration,
        description: req.description,
        trainer_id: req.trainer_id,
        target_audiences: req.target_audiences,
        thumbnail: req.thumbnail,
        level: req.level,
        last_date,
        show_feedback: req.show_feedback,
        feedback_question: req.feedback_question,
        status: Some(req.status.unwrap_or_else(|| "draft".to_string())),
        created_by: Some(current.user.id),
    };

    let course = state.db.insert_course(&draft).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new("Course created successfully.", course)),
    ))
}

/// GET /api/courses
pub async fn get_courses(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Result<Json<ApiResponse<Vec<Course>>>, AppError> {
    let courses = state.db.list_courses().await?;

    Ok(Json(ApiResponse::new(
        "Courses fetched successfully.",
        courses,
    )))
}

/// GET /api/courses/:id
pub async fn get_course_by_id(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Course>>, AppError> {
    let course = state
        .db
        .find_course_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Course not found.".to_string()))?;

    Ok(Json(ApiResponse::new(
        "Course fetched successfully.",
        course,
    )))
}

/// PUT /api/courses/:id
pub async fn update_course(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    Path(id): Path<i64>,
    ValidatedJson(req): ValidatedJson<UpdateCourseRequest>,
) -> Result<Json<ApiResponse<Course>>, AppError> {
    let mut course = state
        .db
        .find_course_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Course not found.".to_string()))?;

    if let Some(name) = req.name {
        course.name = name;
    }
    if let Some(r#type) = req.r#type {
        course.r#type = r#type;
    }
    if let Some(last_date) = req.last_date {
        course.last_date = parse_date(Some(&last_date))?;
    }
    if req.duration.is_some() {
        course.duration = req.duration;
    }
    if req.description.is_some() {
        course.description = req.description;
    }
    if req.trainer_id.is_some() {
        course.trainer_id = req.trainer_id;
    }
    if req.target_audiences.is_some() {
        course.target_audiences = req.target_audiences;
    }
    if req.thumbnail.is_some() {
        course.thumbnail = req.thumbnail;
    }
    if req.level.is_some() {
        course.level = req.level;
    }
    if let Some(show_feedback) = req.show_feedback {
        course.show_feedback = show_feedback;
    }
    if req.feedback_question.is_some() {
        course.feedback_question = req.feedback_question;
    }
    if req.status.is_some() {
        course.status = req.status;
    }
    course.updated_by = Some(current.user.id);

    let updated = state.db.update_course(&course).await?;

    Ok(Json(ApiResponse::new(
        "Course updated successfully.",
        updated,
    )))
}

/// DELETE /api/courses/:id
pub async fn delete_course(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    if !state.db.soft_delete_course(id, Some(current.user.id)).await? {
        return Err(AppError::NotFound("Course not found.".to_string()));
    }

    Ok(Json(ApiResponse::message_only(
        "Course deleted successfully.",
    )))
}
