//! Single-attempt API client.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::multipart::Form;
use reqwest::{Client, Method};
use serde::Serialize;
use serde_json::Value;
use tokio::task::JoinHandle;

use crate::environment::EnvironmentResolver;
use crate::error::{AppError, Result};
use crate::http::response::{Outcome, classify};
use crate::models::{Config, SessionConfig};
use crate::notify::{Notice, Notifier};
use crate::session::SessionStore;
use crate::utils::http::create_async_client;
use crate::utils::url::{is_http_url, join_api_url};

/// Request payload.
#[derive(Debug, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    Multipart(Form),
}

impl RequestBody {
    pub fn is_multipart(&self) -> bool {
        matches!(self, RequestBody::Multipart(_))
    }
}

/// Everything about a request except its path.
#[derive(Debug)]
pub struct RequestOptions {
    pub method: Method,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
    pub headers: HeaderMap,
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            query: Vec::new(),
            body: RequestBody::Empty,
            headers: HeaderMap::new(),
        }
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    pub fn multipart(mut self, form: Form) -> Self {
        self.body = RequestBody::Multipart(form);
        self
    }

    pub fn query(mut self, pairs: Vec<(String, String)>) -> Self {
        self.query = pairs;
        self
    }

    pub fn header(mut self, name: reqwest::header::HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self::new(Method::GET)
    }
}

/// Assemble request headers.
///
/// JSON content type unless the body is multipart (the boundary-carrying
/// multipart type is set by the form itself), a bearer token when one is
/// stored, then caller headers on top.
pub fn build_headers(token: Option<&str>, multipart: bool, extra: &HeaderMap) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    if !multipart {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    }
    if let Some(token) = token.filter(|t| !t.is_empty()) {
        let value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| AppError::validation("stored token is not a valid header value"))?;
        headers.insert(AUTHORIZATION, value);
    }
    for (name, value) in extra {
        headers.insert(name.clone(), value.clone());
    }
    Ok(headers)
}

/// Flatten a serializable object into query pairs, skipping nulls.
pub fn query_pairs<Q: Serialize + ?Sized>(query: &Q) -> Result<Vec<(String, String)>> {
    let value = serde_json::to_value(query)?;
    let Value::Object(map) = value else {
        return match value {
            Value::Null => Ok(Vec::new()),
            _ => Err(AppError::validation("query parameters must be an object")),
        };
    };

    let mut pairs = Vec::with_capacity(map.len());
    for (key, value) in map {
        match value {
            Value::Null => {}
            Value::String(s) => pairs.push((key, s)),
            Value::Bool(_) | Value::Number(_) => pairs.push((key, value.to_string())),
            Value::Array(items) => {
                for item in items {
                    match item {
                        Value::String(s) => pairs.push((key.clone(), s)),
                        other => pairs.push((key.clone(), other.to_string())),
                    }
                }
            }
            Value::Object(_) => {
                return Err(AppError::validation(format!(
                    "query parameter '{key}' cannot be a nested object"
                )));
            }
        }
    }
    Ok(pairs)
}

/// Client for the diary backend.
///
/// One network attempt per call. Failures are surfaced as a notice and an
/// error; a 401 additionally ends the local session and schedules a
/// redirect to the login screen.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    env: EnvironmentResolver,
    session: SessionStore,
    notifier: Arc<dyn Notifier>,
    session_config: SessionConfig,
    pending_redirect: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl ApiClient {
    pub fn new(
        http: Client,
        env: EnvironmentResolver,
        session: SessionStore,
        notifier: Arc<dyn Notifier>,
        session_config: SessionConfig,
    ) -> Self {
        Self {
            http,
            env,
            session,
            notifier,
            session_config,
            pending_redirect: Arc::new(Mutex::new(None)),
        }
    }

    /// Build a client with a fresh transport from configuration.
    pub fn from_config(
        config: &Config,
        env: EnvironmentResolver,
        session: SessionStore,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        let http = create_async_client(&config.api)?;
        Ok(Self::new(http, env, session, notifier, config.session.clone()))
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    pub fn environment(&self) -> &EnvironmentResolver {
        &self.env
    }

    /// Full URL for `path` under the current API base.
    pub fn url_for(&self, path: &str) -> Result<String> {
        let url = join_api_url(&self.env.resolve_api_base(), self.env.api_prefix(), path);
        if is_http_url(&url) {
            return Ok(url);
        }
        // Relative bases are served through the page origin's proxy.
        match self.env.origin() {
            Some(origin) => Ok(format!("{origin}{url}")),
            None => Err(AppError::config(format!(
                "cannot send '{url}': relative API base and no host origin"
            ))),
        }
    }

    /// Send one request and classify the answer.
    pub async fn request(&self, path: &str, options: RequestOptions) -> Result<Value> {
        let url = self.url_for(path)?;
        let token = self.session.get_token().await?;
        let headers = build_headers(token.as_deref(), options.body.is_multipart(), &options.headers)?;

        let method = options.method;
        let mut builder = self.http.request(method.clone(), &url).headers(headers);
        if !options.query.is_empty() {
            builder = builder.query(&options.query);
        }
        builder = match options.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.body(serde_json::to_vec(&value)?),
            RequestBody::Multipart(form) => builder.multipart(form),
        };

        log::debug!("{} {}", method, url);

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => return Err(self.transport_failure(&method, &url, e)),
        };
        let status = response.status();
        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => return Err(self.transport_failure(&method, &url, e)),
        };

        match classify(status, &body) {
            Outcome::Success(value) => Ok(value),
            Outcome::Unauthorized => {
                log::warn!("{} {} answered 401, ending session", method, url);
                self.expire_session().await?;
                Err(AppError::SessionExpired)
            }
            Outcome::Rejected { status, message } => {
                log::warn!("{} {} failed with {}: {}", method, url, status, message);
                self.notifier.notify(Notice::error(message.clone()));
                Err(AppError::server(status, message))
            }
        }
    }

    /// GET with query parameters.
    pub async fn get<Q: Serialize + ?Sized>(&self, path: &str, query: &Q) -> Result<Value> {
        let options = RequestOptions::new(Method::GET).query(query_pairs(query)?);
        self.request(path, options).await
    }

    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value> {
        let options = RequestOptions::new(Method::POST).json(serde_json::to_value(body)?);
        self.request(path, options).await
    }

    pub async fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value> {
        let options = RequestOptions::new(Method::PUT).json(serde_json::to_value(body)?);
        self.request(path, options).await
    }

    pub async fn delete(&self, path: &str) -> Result<Value> {
        self.request(path, RequestOptions::new(Method::DELETE)).await
    }

    pub async fn post_multipart(&self, path: &str, form: Form) -> Result<Value> {
        self.request(path, RequestOptions::new(Method::POST).multipart(form))
            .await
    }

    fn transport_failure(&self, method: &Method, url: &str, e: reqwest::Error) -> AppError {
        log::error!("{} {} got no response: {}", method, url, e);
        let err = AppError::network(e);
        self.notifier.notify(Notice::error(err.user_message()));
        err
    }

    async fn expire_session(&self) -> Result<()> {
        self.session.clear().await?;
        self.notifier
            .notify(Notice::error(AppError::SessionExpired.user_message()));
        self.schedule_login_redirect();
        Ok(())
    }

    /// Navigate to the login screen once the configured delay has passed,
    /// leaving time for the last notice to be read.
    ///
    /// A newer redirect replaces one still waiting.
    pub fn schedule_login_redirect(&self) {
        let notifier = Arc::clone(&self.notifier);
        let route = self.session_config.login_route.clone();
        let delay = Duration::from_millis(self.session_config.redirect_delay_ms);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            notifier.navigate(&route);
        });

        let previous = self
            .pending_redirect
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .replace(handle);
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    /// Wait for a scheduled login redirect to fire. Returns at once when
    /// none is pending.
    pub async fn finish_redirect(&self) {
        let handle = self
            .pending_redirect
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                log::debug!("Login redirect did not run: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::StaticProbe;
    use crate::models::ApiConfig;
    use crate::notify::RecordingNotifier;
    use crate::storage::MemoryStore;
    use reqwest::header::ACCEPT;
    use serde_json::json;

    fn client(probe: StaticProbe) -> ApiClient {
        let env = EnvironmentResolver::new(ApiConfig::default(), Arc::new(probe));
        let session = SessionStore::new(Arc::new(MemoryStore::new()));
        ApiClient::new(
            Client::new(),
            env,
            session,
            Arc::new(RecordingNotifier::new()),
            SessionConfig::default(),
        )
    }

    #[test]
    fn test_headers_json_with_token() {
        let headers = build_headers(Some("abc"), false, &HeaderMap::new()).unwrap();
        assert_eq!(headers[CONTENT_TYPE], "application/json");
        assert_eq!(headers[AUTHORIZATION], "Bearer abc");
    }

    #[test]
    fn test_headers_multipart_without_token() {
        let headers = build_headers(None, true, &HeaderMap::new()).unwrap();
        assert!(headers.get(CONTENT_TYPE).is_none());
        assert!(headers.get(AUTHORIZATION).is_none());

        let headers = build_headers(Some(""), false, &HeaderMap::new()).unwrap();
        assert!(headers.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn test_headers_caller_overrides() {
        let mut extra = HeaderMap::new();
        extra.insert(ACCEPT, HeaderValue::from_static("text/plain"));
        let headers = build_headers(Some("t"), false, &extra).unwrap();
        assert_eq!(headers[ACCEPT], "text/plain");
    }

    #[test]
    fn test_headers_reject_bad_token() {
        assert!(build_headers(Some("bad\ntoken"), false, &HeaderMap::new()).is_err());
    }

    #[test]
    fn test_query_pairs() {
        let pairs = query_pairs(&json!({"page": 2, "keyword": "kyoto", "status": null, "tags": ["a", 1]}))
            .unwrap();
        assert!(pairs.contains(&("page".into(), "2".into())));
        assert!(pairs.contains(&("keyword".into(), "kyoto".into())));
        assert!(pairs.contains(&("tags".into(), "a".into())));
        assert!(pairs.contains(&("tags".into(), "1".into())));
        assert_eq!(pairs.len(), 4);

        assert!(query_pairs(&()).unwrap().is_empty());
        assert!(query_pairs(&json!({"x": {"y": 1}})).is_err());
        assert!(query_pairs(&json!([1])).is_err());
    }

    #[test]
    fn test_url_for_backend_host() {
        let c = client(StaticProbe::web("10.1.1.1", Some(8000)));
        assert_eq!(c.url_for("diaries").unwrap(), "http://10.1.1.1:5000/api/diaries");
        assert_eq!(
            c.url_for("/api/diaries/3").unwrap(),
            "http://10.1.1.1:5000/api/diaries/3"
        );
        assert_eq!(c.url_for("https://x.y/z").unwrap(), "https://x.y/z");
    }

    #[test]
    fn test_url_for_dev_proxy_uses_origin() {
        let c = client(StaticProbe::web("localhost", Some(10086)));
        assert_eq!(
            c.url_for("/diaries").unwrap(),
            "http://localhost:10086/api/diaries"
        );
    }

    #[tokio::test]
    async fn test_finish_redirect_waits_for_navigation() {
        let notifier = Arc::new(RecordingNotifier::new());
        let env = EnvironmentResolver::new(
            ApiConfig::default(),
            Arc::new(StaticProbe::web("localhost", None)),
        );
        let c = ApiClient::new(
            Client::new(),
            env,
            SessionStore::new(Arc::new(MemoryStore::new())),
            notifier.clone(),
            SessionConfig {
                redirect_delay_ms: 20,
                ..SessionConfig::default()
            },
        );

        c.finish_redirect().await;
        assert!(notifier.routes().is_empty());

        c.schedule_login_redirect();
        c.schedule_login_redirect();
        c.finish_redirect().await;
        assert_eq!(notifier.routes(), vec!["/pages/login/index"]);
    }
}
