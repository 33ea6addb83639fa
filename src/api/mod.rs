use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::{Router, http::StatusCode, routing::get};
use serde::Serialize;
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::models::*;
use crate::state::AppState;

#[derive(Debug, Serialize)]
struct MessageResponse {
    message: &'static str,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        .route("/courses", get(list_courses).post(create_course))
        .route("/courses/", get(list_courses).post(create_course))
        .route(
            "/courses/{id}",
            get(get_course).put(update_course).delete(delete_course),
        )
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn home() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Flask is working!",
    })
}

async fn health(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    state.courses.ping().await?;
    Ok(Json(json!({ "status": "ok" })))
}

async fn not_found() -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "not found" })))
}

/// Ids that do not parse as integers can never match a course.
fn course_id(path: Result<Path<i64>, PathRejection>) -> Result<i64, AppError> {
    path.map(|Path(id)| id).map_err(|_| AppError::NotFound)
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(req)| req)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

async fn list_courses(State(state): State<AppState>) -> Result<Json<Vec<Course>>, AppError> {
    let courses = state.courses.list().await?;
    Ok(Json(courses))
}

async fn get_course(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Course>, AppError> {
    let course = state.courses.get(course_id(path)?).await?;
    Ok(Json(course))
}

async fn create_course(
    State(state): State<AppState>,
    payload: Result<Json<CreateCourseRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Course>), AppError> {
    let new = NewCourse::try_from(body(payload)?)?;
    let course = state.courses.create(new).await?;
    Ok((StatusCode::CREATED, Json(course)))
}

async fn update_course(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateCourseRequest>, JsonRejection>,
) -> Result<Json<Course>, AppError> {
    let id = course_id(path)?;
    let req = body(payload)?;
    // a missing course answers 404 even when the body is invalid
    state.courses.get(id).await?;
    let changes = CourseChanges::try_from(req)?;
    let course = state.courses.update(id, changes).await?;
    Ok(Json(course))
}

async fn delete_course(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    state.courses.delete(course_id(path)?).await?;
    Ok(Json(MessageResponse {
        message: "course deleted",
    }))
}
