//! Task CRUD handlers.
//!
//! Create and update accept `multipart/form-data` so an image file can
//! travel alongside the task fields. The attachment lifecycle itself is
//! owned by [`TaskService`]; handlers only decode the request and shape
//! the response envelope.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use tracing::info;

use tareas_db::{ImageUpload, Priority, TaskFilter, UpdateTaskFields};

use crate::query_types::FlexibleDateTime;
use crate::{ApiError, AppState};

/// Query parameters for task listing.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTasksQuery {
    /// Case-insensitive substring match on the description.
    pub search: Option<String>,
    pub priority: Option<Priority>,
    /// Inclusive lower bound on the deadline.
    pub date_from: Option<FlexibleDateTime>,
    /// Inclusive upper bound on the deadline.
    pub date_to: Option<FlexibleDateTime>,
}

/// GET /tasks - list tasks, optionally filtered, newest first.
pub async fn list_tasks(
    State(state): State<AppState>,
    Query(query): Query<ListTasksQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = TaskFilter {
        search: query.search,
        priority: query.priority,
        date_from: query.date_from.map(|d| d.0),
        date_to: query.date_to.map(|d| d.0),
    };

    let tasks = state.service.list(&filter).await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "count": tasks.len(),
        "data": tasks,
    })))
}

/// GET /tasks/:id - fetch a single task.
pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let task = state.service.get(id).await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "data": task,
    })))
}

/// Decoded multipart form for create and update.
#[derive(Debug, Default)]
struct TaskForm {
    description: Option<String>,
    deadline: Option<FlexibleDateTime>,
    priority: Option<Priority>,
    completed: Option<bool>,
    image: Option<ImageUpload>,
}

/// Read a multipart form into a [`TaskForm`].
///
/// Unknown fields are ignored. An `image` part with an empty body is
/// treated as absent, which is what browsers send for an untouched
/// file input.
async fn read_task_form(mut multipart: Multipart) -> Result<TaskForm, ApiError> {
    let mut form = TaskForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart data: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "description" => {
                form.description = Some(read_text(field, &name).await?);
            }
            "deadline" => {
                let raw = read_text(field, &name).await?;
                let parsed: FlexibleDateTime = raw
                    .parse()
                    .map_err(|e: String| ApiError::BadRequest(e))?;
                form.deadline = Some(parsed);
            }
            "priority" => {
                let raw = read_text(field, &name).await?;
                if !raw.trim().is_empty() {
                    let parsed = raw.parse::<Priority>().map_err(|_| {
                        ApiError::BadRequest(format!(
                            "Invalid priority '{}': expected baja, media or alta",
                            raw.trim()
                        ))
                    })?;
                    form.priority = Some(parsed);
                }
            }
            "completed" => {
                let raw = read_text(field, &name).await?;
                form.completed = Some(parse_completed(&raw)?);
            }
            "image" => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let data = field.bytes().await.map_err(|e| {
                    ApiError::BadRequest(format!("Failed to read image data: {}", e))
                })?;
                if !data.is_empty() {
                    form.image = Some(ImageUpload {
                        filename,
                        data: data.to_vec(),
                    });
                }
            }
            _ => {
                // Skip unknown fields rather than failing the request
                let _ = field.bytes().await;
            }
        }
    }

    Ok(form)
}

async fn read_text(field: axum::extract::multipart::Field<'_>, name: &str) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Failed to read field '{}': {}", name, e)))
}

/// Accepts the boolean spellings HTML forms and JS clients produce.
fn parse_completed(raw: &str) -> Result<bool, ApiError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "on" => Ok(true),
        "false" | "0" | "off" | "" => Ok(false),
        other => Err(ApiError::BadRequest(format!(
            "Invalid completed value '{}': expected true or false",
            other
        ))),
    }
}

/// POST /tasks - create a task, optionally with an image attachment.
pub async fn create_task(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let form = read_task_form(multipart).await?;

    let task = state
        .service
        .create(
            form.description,
            form.deadline.map(|d| d.0),
            form.priority,
            form.image,
        )
        .await?;

    info!(task_id = task.id, "task created");

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "success": true,
            "message": "Task created successfully",
            "data": task,
        })),
    ))
}

/// PUT /tasks/:id - partially update a task.
///
/// Absent fields keep their prior values. Supplying a new image
/// replaces the old one; the old file is removed only after the row
/// update succeeds.
pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let form = read_task_form(multipart).await?;

    let fields = UpdateTaskFields {
        description: form.description,
        deadline: form.deadline.map(|d| d.0),
        priority: form.priority,
        completed: form.completed,
    };

    let task = state.service.update(id, fields, form.image).await?;

    info!(task_id = id, "task updated");

    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Task updated successfully",
        "data": task,
    })))
}

/// DELETE /tasks/:id - delete a task and its attachment, if any.
pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.service.delete(id).await?;

    info!(task_id = id, "task deleted");

    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Task deleted successfully",
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_completed_accepts_form_spellings() {
        assert!(parse_completed("true").unwrap());
        assert!(parse_completed("1").unwrap());
        assert!(parse_completed("on").unwrap());
        assert!(!parse_completed("false").unwrap());
        assert!(!parse_completed("0").unwrap());
        assert!(!parse_completed("").unwrap());
    }

    #[test]
    fn test_parse_completed_rejects_garbage() {
        assert!(parse_completed("maybe").is_err());
    }

    #[test]
    fn test_list_query_deserializes_camel_case() {
        let query: ListTasksQuery =
            serde_urlencoded::from_str("search=report&priority=alta&dateFrom=2026-01-01")
                .unwrap();
        assert_eq!(query.search.as_deref(), Some("report"));
        assert_eq!(query.priority, Some(Priority::Alta));
        assert!(query.date_from.is_some());
        assert!(query.date_to.is_none());
    }

    #[test]
    fn test_list_query_empty_is_empty_filter() {
        let query: ListTasksQuery = serde_urlencoded::from_str("").unwrap();
        let filter = TaskFilter {
            search: query.search,
            priority: query.priority,
            date_from: query.date_from.map(|d| d.0),
            date_to: query.date_to.map(|d| d.0),
        };
        assert!(filter.is_empty());
    }
}
