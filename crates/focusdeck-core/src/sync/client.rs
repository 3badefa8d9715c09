//! Client for the bulk task persistence API.
//!
//! The remote boundary exposes list / replace-all / delete-all over a task
//! collection under bearer auth, with server-side upsert-by-id and
//! all-or-nothing replacement. Sync is last-write-wins in both directions;
//! the pomodoro engine has no dependency on any of this.

use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::error::ApiError;
use crate::task::Task;

/// Server acknowledgement of a replace-all request.
#[derive(Debug, Clone, Deserialize)]
pub struct ReplaceSummary {
    pub ok: bool,
    pub count: u64,
}

pub struct TaskApiClient {
    base_url: Url,
    token: String,
    client: Client,
}

impl TaskApiClient {
    /// # Errors
    /// Returns an error if `base_url` is not a valid URL.
    pub fn new(base_url: &str, token: impl Into<String>) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| ApiError::InvalidBaseUrl(e.to_string()))?;
        Ok(Self {
            base_url,
            token: token.into(),
            client: Client::new(),
        })
    }

    fn todos_url(&self) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push("todos");
        Ok(url)
    }

    /// Fetch the full remote collection.
    pub async fn fetch_all(&self) -> Result<Vec<Task>, ApiError> {
        let resp = self
            .client
            .get(self.todos_url()?)
            .bearer_auth(&self.token)
            .send()
            .await?;
        let resp = check_status(resp).await?;
        resp.json::<Vec<Task>>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Replace the remote collection wholesale (all-or-nothing on the
    /// server side).
    pub async fn replace_all(&self, tasks: &[Task]) -> Result<ReplaceSummary, ApiError> {
        let resp = self
            .client
            .put(self.todos_url()?)
            .bearer_auth(&self.token)
            .json(&tasks)
            .send()
            .await?;
        let resp = check_status(resp).await?;
        resp.json::<ReplaceSummary>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Delete every remote task.
    pub async fn clear_remote(&self) -> Result<(), ApiError> {
        let resp = self
            .client
            .delete(self.todos_url()?)
            .bearer_auth(&self.token)
            .send()
            .await?;
        check_status(resp).await?;
        Ok(())
    }
}

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(ApiError::Status {
        status: status.as_u16(),
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fetch_all_sends_bearer_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/todos")
            .match_header("authorization", "Bearer sekrit")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"id":"t1","text":"buy milk","priority":"high"}]"#)
            .create_async()
            .await;

        let client = TaskApiClient::new(&server.url(), "sekrit").unwrap();
        let tasks = client.fetch_all().await.unwrap();

        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].text, "buy milk");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn replace_all_puts_the_full_set() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/todos")
            .match_header("authorization", "Bearer sekrit")
            .match_header("content-type", "application/json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"ok":true,"count":2}"#)
            .create_async()
            .await;

        let client = TaskApiClient::new(&server.url(), "sekrit").unwrap();
        let tasks = vec![Task::new("one"), Task::new("two")];
        let summary = client.replace_all(&tasks).await.unwrap();

        assert!(summary.ok);
        assert_eq!(summary.count, 2);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn clear_remote_deletes() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("DELETE", "/todos")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"ok":true}"#)
            .create_async()
            .await;

        let client = TaskApiClient::new(&server.url(), "sekrit").unwrap();
        client.clear_remote().await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn server_error_maps_to_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/todos")
            .with_status(500)
            .with_body("Failed to load todos")
            .create_async()
            .await;

        let client = TaskApiClient::new(&server.url(), "sekrit").unwrap();
        match client.fetch_all().await {
            Err(ApiError::Status { status, body }) => {
                assert_eq!(status, 500);
                assert_eq!(body, "Failed to load todos");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_malformed_base_url() {
        assert!(matches!(
            TaskApiClient::new("not a url", "t"),
            Err(ApiError::InvalidBaseUrl(_))
        ));
    }
}
