//! HTTP implementation of [`AgentPlatform`].
//!
//! ### Protocol
//!
//! - **Endpoint**: project base URL, e.g. `https://<host>/api/projects/<project>`.
//! - **Authentication**: `Authorization: Bearer <api key>` when a key is configured.
//! - **Versioning**: every request carries `api-version=<version>`.
//! - **Agent lookup**: `GET /assistants/{id}`, then a name match over
//!   `GET /assistants` so agents created by this client (named after their
//!   stable id) are found again.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode, header};
use serde::de::DeserializeOwned;
use sitealias_core::AppConfig;
use url::Url;

use super::wire::{
    AgentObject, CreateAgentRequest, CreateMessageRequest, CreateRunRequest, IdObject, ListResponse, MessageObject,
};
use super::{Agent, AgentDefinition, AgentPlatform, PlatformError, Run, ThreadMessage};

/// Default API version query parameter.
const DEFAULT_API_VERSION: &str = "v1";

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default user agent.
const DEFAULT_USER_AGENT: &str = "sitealias/0.1";

/// Page size for list calls.
const PAGE_LIMIT: &str = "100";

/// Agent platform client configuration.
#[derive(Debug, Clone)]
pub struct PlatformConfig {
    /// Project endpoint base URL.
    pub endpoint: String,
    /// Bearer credential, if the platform requires one.
    pub api_key: Option<String>,
    /// `api-version` query parameter (default: v1).
    pub api_version: String,
    /// Per-request timeout (default: 30s).
    pub timeout: Duration,
    /// User-agent string (default: sitealias/0.x).
    pub user_agent: String,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: None,
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl PlatformConfig {
    /// Build from application configuration.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, PlatformError> {
        let endpoint = config.require_endpoint().map_err(|_| PlatformError::MissingEndpoint)?;
        Ok(Self {
            endpoint: endpoint.to_string(),
            api_key: config.api_key.clone(),
            api_version: config.api_version.clone(),
            user_agent: config.user_agent.clone(),
            ..Default::default()
        })
    }
}

/// Agent platform over HTTP.
#[derive(Debug, Clone)]
pub struct HttpPlatform {
    http: reqwest::Client,
    base: Url,
    config: PlatformConfig,
}

impl HttpPlatform {
    /// Create a new client with the given configuration.
    pub fn new(config: PlatformConfig) -> Result<Self, PlatformError> {
        if config.endpoint.trim().is_empty() {
            return Err(PlatformError::MissingEndpoint);
        }

        let mut base = Url::parse(config.endpoint.trim()).map_err(|e| PlatformError::InvalidEndpoint(e.to_string()))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| PlatformError::Network(Arc::new(e)))?;

        Ok(Self { http, base, config })
    }

    pub fn config(&self) -> &PlatformConfig {
        &self.config
    }

    /// Request for the endpoint path extended by `segments`.
    ///
    /// Each segment is percent-encoded on its own, so an id holding `/`, `?`
    /// or `#` stays one path segment.
    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, PlatformError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| PlatformError::InvalidEndpoint(self.config.endpoint.clone()))?
            .pop_if_empty()
            .extend(segments);

        let mut request = self
            .http
            .request(method, url)
            .query(&[("api-version", self.config.api_version.as_str())])
            .header(header::ACCEPT, "application/json");

        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }
        Ok(request)
    }

    async fn send(&self, request: RequestBuilder, what: &str) -> Result<Response, PlatformError> {
        let response = request.send().await?;
        let status = response.status();
        tracing::debug!(%status, what, "agent platform response");

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(PlatformError::AuthError),
            StatusCode::NOT_FOUND => Err(PlatformError::NotFound(what.to_string())),
            StatusCode::TOO_MANY_REQUESTS => Err(PlatformError::RateLimited),
            s if s.is_client_error() || s.is_server_error() => Err(PlatformError::HttpError { status: s.as_u16() }),
            _ => Ok(response),
        }
    }

    async fn json<T: DeserializeOwned>(&self, request: RequestBuilder, what: &str) -> Result<T, PlatformError> {
        let bytes = self.send(request, what).await?.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| PlatformError::Parse(format!("{what}: {e}")))
    }
}

#[async_trait]
impl AgentPlatform for HttpPlatform {
    async fn find_agent(&self, id: &str) -> Result<Option<Agent>, PlatformError> {
        let by_id = self.request(Method::GET, &["assistants", id])?;
        match self.json::<AgentObject>(by_id, "agent").await {
            Ok(agent) => return Ok(Some(agent.into())),
            Err(PlatformError::NotFound(_)) => {}
            Err(e) => return Err(e),
        }

        let list = self
            .request(Method::GET, &["assistants"])?
            .query(&[("limit", PAGE_LIMIT), ("order", "desc")]);
        let agents: ListResponse<AgentObject> = self.json(list, "agent list").await?;
        if agents.has_more {
            tracing::debug!(id, "agent list is paged; only the first page was searched");
        }

        Ok(agents
            .data
            .into_iter()
            .find(|agent| agent.name.as_deref() == Some(id))
            .map(Agent::from))
    }

    async fn create_agent(&self, id: &str, definition: &AgentDefinition) -> Result<Agent, PlatformError> {
        let request = self
            .request(Method::POST, &["assistants"])?
            .json(&CreateAgentRequest::new(id, definition));
        let agent: AgentObject = self.json(request, "create agent").await?;
        tracing::info!(id, agent_id = %agent.id, model = %agent.model, "created agent");
        Ok(agent.into())
    }

    async fn create_thread(&self) -> Result<String, PlatformError> {
        let request = self.request(Method::POST, &["threads"])?.json(&serde_json::json!({}));
        let thread: IdObject = self.json(request, "create thread").await?;
        Ok(thread.id)
    }

    async fn post_message(&self, thread_id: &str, content: &str) -> Result<(), PlatformError> {
        let request = self
            .request(Method::POST, &["threads", thread_id, "messages"])?
            .json(&CreateMessageRequest { role: "user", content });
        let _: IdObject = self.json(request, "post message").await?;
        Ok(())
    }

    async fn create_run(&self, thread_id: &str, agent_id: &str) -> Result<Run, PlatformError> {
        let request = self
            .request(Method::POST, &["threads", thread_id, "runs"])?
            .json(&CreateRunRequest { assistant_id: agent_id });
        self.json(request, "create run").await
    }

    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<Run, PlatformError> {
        let request = self.request(Method::GET, &["threads", thread_id, "runs", run_id])?;
        self.json(request, "run").await
    }

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>, PlatformError> {
        let request = self
            .request(Method::GET, &["threads", thread_id, "messages"])?
            .query(&[("order", "asc"), ("limit", PAGE_LIMIT)]);
        let list: ListResponse<MessageObject> = self.json(request, "messages").await?;
        Ok(list.data.into_iter().map(ThreadMessage::from).collect())
    }

    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<(), PlatformError> {
        let request = self.request(Method::POST, &["threads", thread_id, "runs", run_id, "cancel"])?;
        self.send(request, "cancel run").await?;
        Ok(())
    }

    async fn delete_thread(&self, thread_id: &str) -> Result<(), PlatformError> {
        let request = self.request(Method::DELETE, &["threads", thread_id])?;
        self.send(request, "delete thread").await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::MessageRole;
    use mockito::{Matcher, Server, ServerGuard};

    async fn mock_platform() -> (ServerGuard, HttpPlatform) {
        let server = Server::new_async().await;
        let config = PlatformConfig { endpoint: server.url(), api_key: Some("secret".into()), ..Default::default() };
        let platform = HttpPlatform::new(config).unwrap();
        (server, platform)
    }

    fn api_version() -> Matcher {
        Matcher::UrlEncoded("api-version".into(), "v1".into())
    }

    const AGENT_LIST: &str = r#"{"object": "list", "has_more": false, "data": [
        {"id": "asst_9", "name": "url-validator", "model": "gpt-4o"},
        {"id": "asst_7", "name": "url-resolver", "model": "gpt-4o"}
    ]}"#;

    #[test]
    fn test_new_missing_endpoint() {
        let result = HttpPlatform::new(PlatformConfig::default());
        assert!(matches!(result, Err(PlatformError::MissingEndpoint)));
    }

    #[test]
    fn test_new_invalid_endpoint() {
        let config = PlatformConfig { endpoint: "not a url".into(), ..Default::default() };
        assert!(matches!(HttpPlatform::new(config), Err(PlatformError::InvalidEndpoint(_))));
    }

    #[test]
    fn test_request_url_keeps_project_path() {
        let config =
            PlatformConfig { endpoint: "https://agents.example.net/api/projects/demo".into(), ..Default::default() };
        let platform = HttpPlatform::new(config).unwrap();

        let request = platform.request(Method::GET, &["threads", "t1", "runs", "r1"]).unwrap().build().unwrap();
        assert_eq!(
            request.url().as_str(),
            "https://agents.example.net/api/projects/demo/threads/t1/runs/r1?api-version=v1"
        );
    }

    #[test]
    fn test_bearer_header_only_with_key() {
        let config = PlatformConfig { endpoint: "https://agents.example.net/".into(), ..Default::default() };
        let platform = HttpPlatform::new(config).unwrap();
        let request = platform.request(Method::POST, &["threads"]).unwrap().build().unwrap();
        assert!(request.headers().get(header::AUTHORIZATION).is_none());

        let config = PlatformConfig {
            endpoint: "https://agents.example.net/".into(),
            api_key: Some("secret".into()),
            ..Default::default()
        };
        let platform = HttpPlatform::new(config).unwrap();
        let request = platform.request(Method::POST, &["threads"]).unwrap().build().unwrap();
        assert_eq!(request.headers()[header::AUTHORIZATION], "Bearer secret");
    }

    #[test]
    fn test_from_app_config_requires_endpoint() {
        let result = PlatformConfig::from_app_config(&AppConfig::default());
        assert!(matches!(result, Err(PlatformError::MissingEndpoint)));

        let app = AppConfig { endpoint: Some("https://agents.example.net".into()), ..Default::default() };
        let config = PlatformConfig::from_app_config(&app).unwrap();
        assert_eq!(config.endpoint, "https://agents.example.net");
        assert_eq!(config.api_version, "v1");
    }

    #[test]
    fn test_ids_are_encoded_as_single_segments() {
        let config =
            PlatformConfig { endpoint: "https://agents.example.net/api/projects/demo".into(), ..Default::default() };
        let platform = HttpPlatform::new(config).unwrap();

        let request = platform.request(Method::DELETE, &["threads", "a/b?c#d"]).unwrap().build().unwrap();
        assert_eq!(
            request.url().as_str(),
            "https://agents.example.net/api/projects/demo/threads/a%2Fb%3Fc%23d?api-version=v1"
        );
    }

    #[tokio::test]
    async fn test_find_agent_by_id() {
        let (mut server, platform) = mock_platform().await;
        let by_id = server
            .mock("GET", "/assistants/asst_7")
            .match_query(api_version())
            .match_header("authorization", "Bearer secret")
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": "asst_7", "object": "assistant", "name": "url-resolver", "model": "gpt-4o"}"#)
            .create_async()
            .await;
        let list = server
            .mock("GET", "/assistants")
            .match_query(Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let agent = platform.find_agent("asst_7").await.unwrap().unwrap();

        assert_eq!(agent.id, "asst_7");
        assert_eq!(agent.name.as_deref(), Some("url-resolver"));
        by_id.assert_async().await;
        list.assert_async().await;
    }

    #[tokio::test]
    async fn test_find_agent_falls_back_to_name() {
        let (mut server, platform) = mock_platform().await;
        server
            .mock("GET", "/assistants/url-resolver")
            .match_query(Matcher::Any)
            .with_status(404)
            .create_async()
            .await;
        let list = server
            .mock("GET", "/assistants")
            .match_query(Matcher::AllOf(vec![api_version(), Matcher::UrlEncoded("limit".into(), "100".into())]))
            .with_body(AGENT_LIST)
            .create_async()
            .await;

        let agent = platform.find_agent("url-resolver").await.unwrap().unwrap();

        assert_eq!(agent.id, "asst_7");
        list.assert_async().await;
    }

    #[tokio::test]
    async fn test_find_agent_not_found() {
        let (mut server, platform) = mock_platform().await;
        server
            .mock("GET", "/assistants/phrase-generator")
            .match_query(Matcher::Any)
            .with_status(404)
            .create_async()
            .await;
        server
            .mock("GET", "/assistants")
            .match_query(Matcher::Any)
            .with_body(AGENT_LIST)
            .create_async()
            .await;

        assert_eq!(platform.find_agent("phrase-generator").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_find_agent_server_error_skips_fallback() {
        let (mut server, platform) = mock_platform().await;
        server
            .mock("GET", "/assistants/url-resolver")
            .match_query(Matcher::Any)
            .with_status(500)
            .create_async()
            .await;
        let list = server
            .mock("GET", "/assistants")
            .match_query(Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let err = platform.find_agent("url-resolver").await.unwrap_err();

        assert!(matches!(err, PlatformError::HttpError { status: 500 }));
        assert!(err.is_transient());
        list.assert_async().await;
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let (mut server, platform) = mock_platform().await;
        server
            .mock("POST", "/threads/thread_1/runs")
            .match_query(api_version())
            .match_body(Matcher::PartialJsonString(r#"{"assistant_id": "asst_7"}"#.into()))
            .with_status(503)
            .create_async()
            .await;
        server
            .mock("POST", "/threads/thread_2/runs")
            .match_query(Matcher::Any)
            .with_status(429)
            .create_async()
            .await;
        server
            .mock("POST", "/threads/thread_3/runs")
            .match_query(Matcher::Any)
            .with_status(401)
            .create_async()
            .await;

        let unavailable = platform.create_run("thread_1", "asst_7").await.unwrap_err();
        assert!(matches!(unavailable, PlatformError::HttpError { status: 503 }));
        assert!(unavailable.is_transient());

        let limited = platform.create_run("thread_2", "asst_7").await.unwrap_err();
        assert!(matches!(limited, PlatformError::RateLimited));
        assert!(limited.is_transient());

        let denied = platform.create_run("thread_3", "asst_7").await.unwrap_err();
        assert!(matches!(denied, PlatformError::AuthError));
        assert!(!denied.is_transient());
    }

    #[tokio::test]
    async fn test_list_messages_ascending() {
        let (mut server, platform) = mock_platform().await;
        let messages = server
            .mock("GET", "/threads/thread_1/messages")
            .match_query(Matcher::AllOf(vec![api_version(), Matcher::UrlEncoded("order".into(), "asc".into())]))
            .with_body(
                r#"{"object": "list", "has_more": false, "data": [
                    {"id": "msg_1", "role": "user", "content": [{"type": "text", "text": {"value": "open apple"}}]},
                    {"id": "msg_2", "role": "tool", "content": []},
                    {"id": "msg_3", "role": "assistant", "run_id": "run_1",
                     "content": [{"type": "text", "text": {"value": "{\"url\": \"https://apple.com\"}"}}]}
                ]}"#,
            )
            .create_async()
            .await;

        let list = platform.list_messages("thread_1").await.unwrap();

        let roles: Vec<MessageRole> = list.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![MessageRole::User, MessageRole::Other, MessageRole::Assistant]);
        assert_eq!(list[2].joined_text().as_deref(), Some(r#"{"url": "https://apple.com"}"#));
        messages.assert_async().await;
    }

    #[tokio::test]
    async fn test_malformed_body_is_parse_error() {
        let (mut server, platform) = mock_platform().await;
        server
            .mock("GET", "/threads/thread_1/runs/run_1")
            .match_query(Matcher::Any)
            .with_body("<html>gateway</html>")
            .create_async()
            .await;

        let err = platform.get_run("thread_1", "run_1").await.unwrap_err();
        assert!(matches!(err, PlatformError::Parse(_)));
    }
}
