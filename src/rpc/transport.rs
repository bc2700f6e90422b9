// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Services that carry out requests in the CMS window

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use url::Url;

use super::envelope::{HttpMethod, OperationType, OutgoingEnvelope};
use super::responder::Reply;
use crate::error::Result;
use crate::ui::{CookieJar, Preferences};

/// User agent of the CMS transport
pub const DEFAULT_USER_AGENT: &str = concat!("krang-xwin/", env!("CARGO_PKG_VERSION"));

/// Turns a request into the replies posted back to the caller
#[async_trait]
pub trait RequestService: Send + Sync {
    /// Replies in posting order; failures are replies too
    async fn handle(&self, request: &OutgoingEnvelope) -> Vec<Reply>;
}

/// HTTP transport configuration
#[derive(Debug, Clone)]
pub struct HttpServiceConfig {
    /// Per-request timeout
    pub timeout: Duration,
    pub user_agent: String,
    /// Parameters added to every request
    pub default_params: Vec<(String, String)>,
}

impl Default for HttpServiceConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            default_params: vec![("ajax".to_string(), "1".to_string())],
        }
    }
}

impl HttpServiceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Add a parameter sent with every request
    pub fn default_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_params.push((name.into(), value.into()));
        self
    }
}

/// AJAX transport: forwards requests to the CMS over HTTP
#[derive(Clone)]
pub struct HttpRequestService {
    client: Client,
    config: HttpServiceConfig,
    cookie_jar: CookieJar,
    prefs: Preferences,
    cms_config: Value,
}

impl fmt::Debug for HttpRequestService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpRequestService")
            .field("config", &self.config)
            .field("cookies", &self.cookie_jar.len())
            .finish()
    }
}

impl HttpRequestService {
    pub fn new() -> Result<Self> {
        Self::with_config(HttpServiceConfig::default())
    }

    pub fn with_config(config: HttpServiceConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .cookie_store(false) // cookies go through the shared jar
            .build()?;

        Ok(Self {
            client,
            config,
            cookie_jar: CookieJar::new(),
            prefs: Preferences::default(),
            cms_config: json!({}),
        })
    }

    /// Share a cookie jar (e.g. the one holding the CMS session)
    pub fn with_cookie_jar(mut self, jar: CookieJar) -> Self {
        self.cookie_jar = jar;
        self
    }

    /// Preferences sent along with every reply
    pub fn with_prefs(mut self, prefs: Preferences) -> Self {
        self.prefs = prefs;
        self
    }

    /// CMS configuration sent along with every reply
    pub fn with_cms_config(mut self, config: Value) -> Self {
        self.cms_config = config;
        self
    }

    pub fn cookie_jar(&self) -> &CookieJar {
        &self.cookie_jar
    }

    /// `cmsURL/cmsApp`
    pub fn endpoint(request: &OutgoingEnvelope) -> Result<Url> {
        let base = request.options.cms_url.trim_end_matches('/');
        let url = match request.options.cms_app.as_deref() {
            Some(app) if !app.is_empty() => format!("{}/{}", base, app.trim_start_matches('/')),
            _ => format!("{}/", base),
        };
        Ok(Url::parse(&url)?)
    }

    fn params(&self, request: &OutgoingEnvelope) -> Vec<(String, String)> {
        let mut params = Vec::new();
        for (name, value) in &request.options.params {
            match value {
                Value::Array(items) => {
                    params.extend(items.iter().map(|v| (name.clone(), param_value(v))));
                }
                other => params.push((name.clone(), param_value(other))),
            }
        }
        params.extend(self.config.default_params.iter().cloned());
        params
    }

    async fn send(&self, request: &OutgoingEnvelope) -> Result<(StatusCode, String)> {
        let url = Self::endpoint(request)?;
        let params = self.params(request);
        let method = request.options.method.unwrap_or_default();

        let mut builder = match method {
            HttpMethod::Get => self.client.get(url.clone()).query(&params),
            HttpMethod::Post => self.client.post(url.clone()).form(&params),
        };
        builder = builder.header("x-requested-with", "XMLHttpRequest");
        if let Some(cookies) = self.cookie_jar.get_cookie_header(&url) {
            builder = builder.header("cookie", cookies);
        }

        tracing::debug!(%url, ?method, params = params.len(), "Sending CMS request");
        let response = builder.send().await?;
        let status = response.status();
        let final_url = response.url().clone();
        for cookie in response.headers().get_all("set-cookie") {
            if let Ok(header) = cookie.to_str() {
                self.cookie_jar.add_from_header(header, &final_url);
            }
        }

        Ok((status, response.text().await?))
    }

    fn decorate(&self, reply: Reply) -> Reply {
        reply
            .with_prefs(serde_json::to_value(&self.prefs).unwrap_or_else(|_| json!({})))
            .with_config(self.cms_config.clone())
    }
}

fn param_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[async_trait]
impl RequestService for HttpRequestService {
    async fn handle(&self, request: &OutgoingEnvelope) -> Vec<Reply> {
        let reply = match self.send(request).await {
            Ok((status, body)) if status.is_success() => {
                if body.trim().is_empty() {
                    Reply::complete(json!({}))
                } else {
                    match serde_json::from_str::<Value>(&body) {
                        Ok(payload) => Reply::complete(payload),
                        Err(e) => {
                            tracing::warn!(error = %e, "CMS response is not JSON");
                            Reply::exception(format!("Malformed CMS response: {}", e))
                        }
                    }
                }
            }
            Ok((status, body)) => {
                tracing::warn!(status = status.as_u16(), "CMS request failed");
                Reply::failure(json!({
                    "status": status.as_u16(),
                    "statusText": status.canonical_reason().unwrap_or_default(),
                    "body": body,
                }))
            }
            Err(e) => {
                tracing::warn!(error = %e, "CMS request raised an error");
                Reply::exception(e.to_string())
            }
        };

        vec![self.decorate(reply)]
    }
}

/// Answers info queries with a closure
pub struct WindowInfoService {
    answer: Box<dyn Fn(&str) -> Value + Send + Sync>,
}

impl WindowInfoService {
    pub fn new<F>(answer: F) -> Self
    where
        F: Fn(&str) -> Value + Send + Sync + 'static,
    {
        Self {
            answer: Box::new(answer),
        }
    }
}

impl fmt::Debug for WindowInfoService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowInfoService").finish_non_exhaustive()
    }
}

#[async_trait]
impl RequestService for WindowInfoService {
    async fn handle(&self, request: &OutgoingEnvelope) -> Vec<Reply> {
        let question = request.options.question.as_deref().unwrap_or_default();
        let answer = (self.answer)(question);
        tracing::debug!(question, %answer, "Answering info query");
        vec![Reply::response(answer), Reply::finish()]
    }
}

/// Routes requests to the HTTP transport and info queries to a [`WindowInfoService`]
#[derive(Debug)]
pub struct CmsService {
    http: HttpRequestService,
    info: WindowInfoService,
}

impl CmsService {
    pub fn new(http: HttpRequestService, info: WindowInfoService) -> Self {
        Self { http, info }
    }
}

#[async_trait]
impl RequestService for CmsService {
    async fn handle(&self, request: &OutgoingEnvelope) -> Vec<Reply> {
        match request.operation {
            OperationType::Request | OperationType::Update => self.http.handle(request).await,
            OperationType::InfoQuery => self.info.handle(request).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::envelope::{RequestOptions, ResponseTag};
    use wiremock::matchers::{body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn envelope(operation: OperationType, options: RequestOptions) -> OutgoingEnvelope {
        OutgoingEnvelope {
            operation,
            call_id: None,
            options,
        }
    }

    #[test]
    fn test_endpoint() {
        let req = envelope(
            OperationType::Request,
            RequestOptions::new("https://cms.example.com/krang/").app("story.pl"),
        );
        assert_eq!(
            HttpRequestService::endpoint(&req).unwrap().as_str(),
            "https://cms.example.com/krang/story.pl"
        );
    }

    #[tokio::test]
    async fn test_get_request_completes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/story.pl"))
            .and(query_param("rm", "pe_get_status"))
            .and(query_param("story_id", "42"))
            .and(query_param("ajax", "1"))
            .and(header("x-requested-with", "XMLHttpRequest"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("set-cookie", "KRANG_SESSION=s1; Path=/")
                    .set_body_json(json!({"status": "ok", "checkedOutBy": "me"})),
            )
            .mount(&server)
            .await;

        let service = HttpRequestService::new().unwrap();
        let req = envelope(
            OperationType::Request,
            RequestOptions::new(server.uri())
                .app("story.pl")
                .method(HttpMethod::Get)
                .param("rm", "pe_get_status")
                .param("story_id", 42),
        );

        let replies = service.handle(&req).await;
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].tag, ResponseTag::OnComplete);
        assert_eq!(replies[0].payload["checkedOutBy"], "me");
        assert_eq!(replies[0].prefs["message_timeout"], 5);
        assert_eq!(service.cookie_jar().len(), 1);
    }

    #[tokio::test]
    async fn test_post_form_and_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/story.pl"))
            .and(body_string_contains("rm=pe_checkout_and_edit"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let service = HttpRequestService::new().unwrap();
        let req = envelope(
            OperationType::Update,
            RequestOptions::new(server.uri())
                .app("story.pl")
                .param("rm", "pe_checkout_and_edit"),
        );

        let replies = service.handle(&req).await;
        assert_eq!(replies[0].tag, ResponseTag::OnFailure);
        assert_eq!(replies[0].payload["status"], 500);
    }

    #[tokio::test]
    async fn test_shared_jar_and_configured_params() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("lang", "de"))
            .and(query_param("ajax", "1"))
            .and(header("cookie", "KRANG_SESSION=abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
            .mount(&server)
            .await;

        let jar = CookieJar::new();
        let base = Url::parse(&server.uri()).unwrap();
        jar.add_from_header("KRANG_SESSION=abc; Path=/", &base);

        let service = HttpRequestService::with_config(HttpServiceConfig::new().default_param("lang", "de"))
            .unwrap()
            .with_cookie_jar(jar)
            .with_cms_config(json!({"charset": "UTF-8"}));
        let req = envelope(
            OperationType::Request,
            RequestOptions::new(server.uri()).method(HttpMethod::Get),
        );

        let replies = service.handle(&req).await;
        assert_eq!(replies[0].tag, ResponseTag::OnComplete);
        assert_eq!(replies[0].config["charset"], "UTF-8");
    }

    #[tokio::test]
    async fn test_non_json_body_is_exception() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
            .mount(&server)
            .await;

        let service = HttpRequestService::new().unwrap();
        let req = envelope(OperationType::Request, RequestOptions::new(server.uri()));
        let replies = service.handle(&req).await;
        assert_eq!(replies[0].tag, ResponseTag::OnException);
    }

    #[tokio::test]
    async fn test_cms_service_routes_info_queries() {
        let service = CmsService::new(
            HttpRequestService::new().unwrap(),
            WindowInfoService::new(|_| json!(false)),
        );
        let req = envelope(
            OperationType::InfoQuery,
            RequestOptions::new("https://cms.example.com").question("isStoryOnEditScreen"),
        );

        let tags: Vec<_> = service.handle(&req).await.iter().map(|r| r.tag).collect();
        assert_eq!(tags, vec![ResponseTag::Response, ResponseTag::Finish]);
    }
}
