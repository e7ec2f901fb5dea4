//! HTTP client for the tareas task service.
//!
//! Thin wrapper over the REST API: list/fetch/create/update/delete
//! tasks, with multipart upload support for image attachments. Server
//! responses use a `{success, data, count}` envelope; failures carry a
//! `message` which this client surfaces in [`ClientError::Api`].

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::multipart::{Form, Part};
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use tracing::debug;

use tareas_core::{ImageUpload, Priority, Task, TaskFilter, UpdateTaskFields};

/// Client-side errors.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Connection, timeout, or protocol-level failure.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("server returned {status}: {message}")]
    Api { status: StatusCode, message: String },

    /// The server answered 2xx but the body did not match the
    /// expected envelope.
    #[error("unexpected response body: {0}")]
    Decode(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Deserialize)]
struct ListEnvelope {
    data: Vec<Task>,
}

#[derive(Debug, Deserialize)]
struct TaskEnvelope {
    data: Task,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    message: Option<String>,
}

/// Client for the tareas REST API.
#[derive(Debug, Clone)]
pub struct TasksClient {
    base_url: String,
    http: reqwest::Client,
}

impl TasksClient {
    /// Create a client for the given base URL (e.g. `http://localhost:3000`).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    /// Create a client with a preconfigured [`reqwest::Client`], for
    /// callers that need custom timeouts or proxies.
    pub fn with_client(base_url: impl Into<String>, http: reqwest::Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, http }
    }

    /// The base URL this client talks to, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a task's image, given the relative path stored
    /// on the task (`/images/<name>`).
    pub fn image_url(&self, image_path: &str) -> String {
        format!("{}{}", self.base_url, image_path)
    }

    /// List tasks, optionally filtered. Results come newest first.
    pub async fn list(&self, filter: &TaskFilter) -> Result<Vec<Task>> {
        let url = format!("{}/tasks", self.base_url);
        let query = filter_query(filter);
        debug!(%url, params = query.len(), "listing tasks");

        let response = self.http.get(&url).query(&query).send().await?;
        let envelope: ListEnvelope = decode(response).await?;
        Ok(envelope.data)
    }

    /// Fetch a single task by id.
    pub async fn get(&self, id: i64) -> Result<Task> {
        let url = format!("{}/tasks/{}", self.base_url, id);
        let response = self.http.get(&url).send().await?;
        let envelope: TaskEnvelope = decode(response).await?;
        Ok(envelope.data)
    }

    /// Create a task, optionally attaching an image.
    pub async fn create(
        &self,
        description: &str,
        deadline: DateTime<Utc>,
        priority: Option<Priority>,
        image: Option<ImageUpload>,
    ) -> Result<Task> {
        let url = format!("{}/tasks", self.base_url);

        let mut form = Form::new()
            .text("description", description.to_string())
            .text("deadline", rfc3339(deadline));
        if let Some(priority) = priority {
            form = form.text("priority", priority.as_str().to_string());
        }
        if let Some(image) = image {
            form = form.part("image", image_part(image));
        }

        let response = self.http.post(&url).multipart(form).send().await?;
        let envelope: TaskEnvelope = decode(response).await?;
        Ok(envelope.data)
    }

    /// Update a task. Absent fields keep their prior values; a new
    /// image replaces the old one.
    pub async fn update(
        &self,
        id: i64,
        fields: &UpdateTaskFields,
        image: Option<ImageUpload>,
    ) -> Result<Task> {
        let url = format!("{}/tasks/{}", self.base_url, id);

        let mut form = Form::new();
        if let Some(description) = &fields.description {
            form = form.text("description", description.clone());
        }
        if let Some(deadline) = fields.deadline {
            form = form.text("deadline", rfc3339(deadline));
        }
        if let Some(priority) = fields.priority {
            form = form.text("priority", priority.as_str().to_string());
        }
        if let Some(completed) = fields.completed {
            form = form.text("completed", completed.to_string());
        }
        if let Some(image) = image {
            form = form.part("image", image_part(image));
        }

        let response = self.http.put(&url).multipart(form).send().await?;
        let envelope: TaskEnvelope = decode(response).await?;
        Ok(envelope.data)
    }

    /// Delete a task and its attachment, if any.
    pub async fn delete(&self, id: i64) -> Result<()> {
        let url = format!("{}/tasks/{}", self.base_url, id);
        let response = self.http.delete(&url).send().await?;
        check_status(response).await?;
        Ok(())
    }
}

fn rfc3339(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn image_part(image: ImageUpload) -> Part {
    Part::bytes(image.data).file_name(image.filename)
}

/// Query pairs for the list endpoint. Only present filters become
/// parameters; the server treats the keys as camelCase.
fn filter_query(filter: &TaskFilter) -> Vec<(&'static str, String)> {
    let mut query = Vec::new();
    if let Some(search) = &filter.search {
        query.push(("search", search.clone()));
    }
    if let Some(priority) = filter.priority {
        query.push(("priority", priority.as_str().to_string()));
    }
    if let Some(from) = filter.date_from {
        query.push(("dateFrom", rfc3339(from)));
    }
    if let Some(to) = filter.date_to {
        query.push(("dateTo", rfc3339(to)));
    }
    query
}

/// Turn a non-success response into [`ClientError::Api`], surfacing
/// the server's `message` when one is present.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorEnvelope>(&body)
        .ok()
        .and_then(|e| e.message)
        .unwrap_or_else(|| {
            if body.is_empty() {
                status.to_string()
            } else {
                body
            }
        });

    Err(ClientError::Api { status, message })
}

async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> Result<T> {
    let response = check_status(response).await?;
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| ClientError::Decode(e.to_string()))
}
