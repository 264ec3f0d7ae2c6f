use std::time::Duration;

use async_trait::async_trait;
use axum::http::HeaderName;
use octocrab::Octocrab;
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::platform::Platform;

const API_VERSION: &str = "2022-11-28";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const PER_PAGE: usize = 100;

#[derive(Serialize)]
struct AlertQuery {
    state: &'static str,
    per_page: usize,
    page: u32,
}

pub struct GitHubPlatform {
    client: Octocrab,
    repo_full_name: String,
}

impl GitHubPlatform {
    pub fn new(repo_full_name: &str, token: &str) -> Result<Self> {
        Self::connect(repo_full_name, token, None)
    }

    /// Same as [`GitHubPlatform::new`] against a different API root, e.g.
    /// GitHub Enterprise Server.
    pub fn with_base_uri(repo_full_name: &str, token: &str, base_uri: &str) -> Result<Self> {
        Self::connect(repo_full_name, token, Some(base_uri))
    }

    fn connect(repo_full_name: &str, token: &str, base_uri: Option<&str>) -> Result<Self> {
        Self::parse_repo(repo_full_name)?;

        let mut builder = Octocrab::builder()
            .personal_token(token.to_string())
            .add_header(
                HeaderName::from_static("x-github-api-version"),
                API_VERSION.to_string(),
            )
            .set_connect_timeout(Some(REQUEST_TIMEOUT))
            .set_read_timeout(Some(REQUEST_TIMEOUT));
        if let Some(uri) = base_uri {
            builder = builder
                .base_uri(uri)
                .map_err(|e| AppError::GitHubApi(format!("Invalid API base URI {uri}: {e}")))?;
        }

        let client = builder
            .build()
            .map_err(|e| AppError::GitHubApi(format!("Failed to build octocrab client: {e}")))?;

        Ok(Self {
            client,
            repo_full_name: repo_full_name.to_string(),
        })
    }

    fn parse_repo(repo_full_name: &str) -> Result<(&str, &str)> {
        match repo_full_name.split_once('/') {
            Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
                Ok((owner, repo))
            }
            _ => Err(AppError::GitHubApi(format!(
                "Invalid repo name (expected owner/name): {repo_full_name}"
            ))),
        }
    }
}

#[async_trait]
impl Platform for GitHubPlatform {
    async fn list_open_alerts(&self) -> Result<Vec<serde_json::Value>> {
        let route = format!("/repos/{}/dependabot/alerts", self.repo_full_name);
        let mut alerts = Vec::new();
        let mut page = 1;

        loop {
            let query = AlertQuery {
                state: "open",
                per_page: PER_PAGE,
                page,
            };
            let payload: serde_json::Value = self
                .client
                .get(&route, Some(&query))
                .await
                .map_err(|e| AppError::GitHubApi(format!("Failed to fetch Dependabot alerts: {e}")))?;

            let serde_json::Value::Array(items) = payload else {
                tracing::warn!(page, "Unexpected alerts payload, stopping pagination");
                break;
            };

            let received = items.len();
            alerts.extend(items);
            tracing::debug!(page, received, "Fetched Dependabot alerts page");

            if received < PER_PAGE {
                break;
            }
            page += 1;
        }

        tracing::info!(
            repo = %self.repo_full_name,
            count = alerts.len(),
            "Fetched open Dependabot alerts"
        );

        Ok(alerts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use axum::extract::{Query, State};
    use axum::http::StatusCode;
    use axum::response::{IntoResponse, Response};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;

    type PageLog = Arc<Mutex<Vec<String>>>;

    /// Serve a fake alerts API whose page bodies come from `respond`, and
    /// return its base URL plus the `page` values it was asked for.
    async fn spawn_api(respond: fn(u32) -> Response) -> (String, PageLog) {
        let pages: PageLog = Arc::default();
        let app = Router::new()
            .route(
                "/repos/:owner/:repo/dependabot/alerts",
                get(
                    move |State(pages): State<PageLog>,
                          Query(query): Query<HashMap<String, String>>| async move {
                        assert_eq!(query.get("state").map(String::as_str), Some("open"));
                        assert_eq!(query.get("per_page").map(String::as_str), Some("100"));
                        let page = query.get("page").cloned().unwrap_or_default();
                        pages.lock().unwrap().push(page.clone());
                        respond(page.parse().unwrap_or(0))
                    },
                ),
            )
            .with_state(pages.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}"), pages)
    }

    fn alerts(count: usize, offset: usize) -> Response {
        let items: Vec<_> = (0..count).map(|i| json!({"number": offset + i + 1})).collect();
        Json(items).into_response()
    }

    #[tokio::test]
    async fn test_list_open_alerts_pages_until_short_page() {
        let (base, pages) = spawn_api(|page| match page {
            1 => alerts(100, 0),
            2 => alerts(3, 100),
            _ => alerts(0, 0),
        })
        .await;

        let platform = GitHubPlatform::with_base_uri("octo-org/app", "token", &base).unwrap();
        let fetched = platform.list_open_alerts().await.unwrap();

        assert_eq!(fetched.len(), 103);
        assert_eq!(fetched[102]["number"], 103);
        assert_eq!(*pages.lock().unwrap(), vec!["1", "2"]);
    }

    #[tokio::test]
    async fn test_list_open_alerts_stops_on_non_array_payload() {
        let (base, pages) = spawn_api(|page| match page {
            1 => alerts(100, 0),
            _ => Json(json!({"message": "unexpected"})).into_response(),
        })
        .await;

        let platform = GitHubPlatform::with_base_uri("octo-org/app", "token", &base).unwrap();
        let fetched = platform.list_open_alerts().await.unwrap();

        assert_eq!(fetched.len(), 100);
        assert_eq!(*pages.lock().unwrap(), vec!["1", "2"]);
    }

    #[tokio::test]
    async fn test_list_open_alerts_client_error_is_github_api_error() {
        let (base, _) = spawn_api(|_| {
            (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "message": "Not Found",
                    "documentation_url": "https://docs.github.com/rest"
                })),
            )
                .into_response()
        })
        .await;

        let platform = GitHubPlatform::with_base_uri("octo-org/app", "token", &base).unwrap();
        let err = platform.list_open_alerts().await.unwrap_err();

        assert!(matches!(err, AppError::GitHubApi(_)), "got {err:?}");
    }

    #[test]
    fn test_parse_repo_accepts_owner_and_name() {
        assert_eq!(
            GitHubPlatform::parse_repo("octo-org/phrase-pulse").unwrap(),
            ("octo-org", "phrase-pulse")
        );
    }

    #[test]
    fn test_parse_repo_rejects_malformed_names() {
        assert!(GitHubPlatform::parse_repo("phrase-pulse").is_err());
        assert!(GitHubPlatform::parse_repo("/phrase-pulse").is_err());
        assert!(GitHubPlatform::parse_repo("octo-org/").is_err());
        assert!(GitHubPlatform::parse_repo("a/b/c").is_err());
    }
}
