pub mod download;
pub mod toc;
pub mod tree;

use std::sync::Arc;

use reqwest::StatusCode;
use reqwest::cookie::Jar;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use crate::auth::Credentials;
use crate::error::{CmsError, Result};
use toc::TocDocument;

pub use download::DownloadOutcome;

/// Known `le` API versions, newest first. The server does not say which one
/// it speaks, so they are probed in order.
pub const API_VERSIONS: [&str; 5] = ["1.82", "1.74", "1.70", "1.67", "1.50"];

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

pub struct CmsClient {
    client: reqwest::Client,
    root_url: String,
}

impl CmsClient {
    pub fn new(root_url: &str, credentials: &Credentials) -> Result<Self> {
        let jar = Jar::default();
        for cookie in &credentials.cookies {
            let domain = cookie.domain.trim_start_matches('.');
            match Url::parse(&format!("https://{domain}")) {
                Ok(origin) => jar.add_cookie_str(
                    &format!("{}={}; Domain={}", cookie.name, cookie.value, domain),
                    &origin,
                ),
                Err(e) => warn!(cookie = %cookie.name, domain = %cookie.domain, "Ignoring cookie: {e}"),
            }
        }

        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", credentials.token))
            .map_err(|e| CmsError::Authorization(format!("unusable bearer token: {e}")))?;
        bearer.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, bearer);

        let client = reqwest::Client::builder()
            .cookie_provider(Arc::new(jar))
            .default_headers(headers)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            root_url: root_url.trim_end_matches('/').to_string(),
        })
    }

    /// GET a JSON endpoint relative to the root URL.
    ///
    /// `Ok(None)` means the endpoint does not exist (404).
    pub async fn get_json(&self, endpoint: &str) -> Result<Option<Value>> {
        let url = format!("{}{}", self.root_url, endpoint);
        debug!(%url, "GET");
        let response = self.client.get(&url).send().await?;

        match response.status() {
            StatusCode::FORBIDDEN => Err(CmsError::Authorization(format!("403 Forbidden from {url}"))),
            StatusCode::NOT_FOUND => Ok(None),
            status if !status.is_success() => Err(CmsError::Transport { status, url }),
            _ => {
                let body = response.text().await?;
                match serde_json::from_str(&body) {
                    Ok(value) => Ok(Some(value)),
                    Err(e) => {
                        warn!(%url, "Response is not JSON: {e}");
                        Ok(None)
                    }
                }
            }
        }
    }

    /// Fetch the table of contents, probing [`API_VERSIONS`] until one answers.
    pub async fn fetch_toc(&self, course_id: &str) -> Result<TocDocument> {
        for version in API_VERSIONS {
            info!("Trying API v{version}...");
            let endpoint =
                format!("/d2l/api/le/{version}/{course_id}/content/toc?ignoreDateRestrictions=true");

            let Some(value) = self.get_json(&endpoint).await? else {
                continue;
            };
            if value.as_object().is_none_or(|o| o.is_empty()) {
                debug!(version, "Empty table of contents");
                continue;
            }
            match serde_json::from_value::<TocDocument>(value) {
                Ok(toc) => {
                    info!("Success with API v{version}");
                    return Ok(toc);
                }
                Err(e) => warn!(version, "Unexpected table of contents shape: {e}"),
            }
        }

        Err(CmsError::Discovery {
            course_id: course_id.to_string(),
            tried: API_VERSIONS.join(", "),
        })
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::client;
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, header_regex, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn toc_path(version: &str) -> String {
        format!("/d2l/api/le/{version}/42/content/toc")
    }

    fn toc_body(title: &str) -> Value {
        json!({ "Modules": [{ "Title": title, "Modules": [], "Topics": [] }] })
    }

    #[tokio::test]
    async fn discovers_first_working_version() {
        let server = MockServer::start().await;
        for version in ["1.82", "1.74"] {
            Mock::given(method("GET"))
                .and(path(toc_path(version)))
                .respond_with(ResponseTemplate::new(404))
                .expect(1)
                .mount(&server)
                .await;
        }
        Mock::given(method("GET"))
            .and(path(toc_path("1.70")))
            .and(query_param("ignoreDateRestrictions", "true"))
            .and(header("authorization", "Bearer test-token"))
            .and(header_regex("cookie", "d2lSessionVal=abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(toc_body("Week 1")))
            .expect(1)
            .mount(&server)
            .await;
        for version in ["1.67", "1.50"] {
            Mock::given(method("GET"))
                .and(path(toc_path(version)))
                .respond_with(ResponseTemplate::new(200).set_body_json(toc_body("Too late")))
                .expect(0)
                .mount(&server)
                .await;
        }

        let toc = client(&server.uri()).fetch_toc("42").await.unwrap();
        assert_eq!(toc.modules[0].title.as_deref(), Some("Week 1"));
    }

    #[tokio::test]
    async fn forbidden_stops_discovery() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(toc_path("1.82")))
            .respond_with(ResponseTemplate::new(403))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(toc_path("1.74")))
            .respond_with(ResponseTemplate::new(200).set_body_json(toc_body("Week 1")))
            .expect(0)
            .mount(&server)
            .await;

        let err = client(&server.uri()).fetch_toc("42").await.unwrap_err();
        assert!(matches!(err, CmsError::Authorization(_)));
    }

    #[tokio::test]
    async fn server_error_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(toc_path("1.82")))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = client(&server.uri()).fetch_toc("42").await.unwrap_err();
        match err {
            CmsError::Transport { status, .. } => assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR),
            other => panic!("expected transport error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_or_garbled_bodies_try_next_version() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(toc_path("1.82")))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(toc_path("1.74")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(toc_path("1.70")))
            .respond_with(ResponseTemplate::new(200).set_body_json(toc_body("Week 3")))
            .mount(&server)
            .await;

        let toc = client(&server.uri()).fetch_toc("42").await.unwrap();
        assert_eq!(toc.modules[0].title.as_deref(), Some("Week 3"));
    }

    #[tokio::test]
    async fn exhausted_versions_is_discovery_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(API_VERSIONS.len() as u64)
            .mount(&server)
            .await;

        let err = client(&server.uri()).fetch_toc("42").await.unwrap_err();
        assert!(matches!(err, CmsError::Discovery { .. }));
    }

    #[tokio::test]
    async fn odd_topic_does_not_discard_course() {
        let server = MockServer::start().await;
        let body = json!({
            "Modules": [{
                "Title": "Week 1",
                "Topics": [
                    { "Title": "Slides", "Url": "/content/slides.pdf", "ActivityType": 1 },
                    { "Title": "Survey", "Url": "/d2l/survey", "ActivityType": "7" }
                ]
            }]
        });
        Mock::given(method("GET"))
            .and(path(toc_path("1.82")))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(0)
            .mount(&server)
            .await;

        let toc = client(&server.uri()).fetch_toc("42").await.unwrap();
        let topics = &toc.modules[0].topics;
        assert_eq!(topics.len(), 2);
        assert_eq!(topics[0].activity_type, Some(toc::ACTIVITY_FILE));
        assert_eq!(topics[1].activity_type, None);
    }
}
