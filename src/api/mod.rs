use async_trait::async_trait;
use reqwest::{
    header::COOKIE,
    multipart::{Form, Part},
    RequestBuilder, Response,
};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::Config;

pub mod cookies;
mod types;

pub use types::*;

const CSRF_HEADER: &str = "X-CSRFToken";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected response (HTTP {status}): {source}")]
    Decode {
        status: u16,
        source: serde_json::Error,
    },
    #[error("no {} cookie configured", cookies::CSRF_COOKIE)]
    MissingCsrfToken,
}

/// Server endpoints used by the composer.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn saved_groups(&self) -> Result<SavedGroupsResponse, ApiError>;
    async fn recent_posts(&self) -> Result<RecentPostsResponse, ApiError>;
    async fn save_vk_group(&self, req: &SaveVkGroupRequest) -> Result<ActionResponse, ApiError>;
    async fn remove_vk_group(&self, req: &RemoveVkGroupRequest)
        -> Result<ActionResponse, ApiError>;
    async fn save_tg_channel(&self, req: &SaveTgChannelRequest)
        -> Result<ActionResponse, ApiError>;
    async fn remove_tg_channel(
        &self,
        req: &RemoveTgChannelRequest,
    ) -> Result<ActionResponse, ApiError>;
    async fn publish_post(&self, req: &PublishRequest) -> Result<ActionResponse, ApiError>;
    async fn tg_send_code(&self, req: &TgSendCodeRequest) -> Result<ActionResponse, ApiError>;
    async fn tg_verify_code(&self, req: &TgVerifyCodeRequest) -> Result<ActionResponse, ApiError>;
}

/// HTTP client for the OmniPost server.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    /// Sent verbatim as the `Cookie` header.
    cookies: Option<String>,
    csrf_token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, cookies: Option<String>) -> Self {
        let csrf_token = cookies
            .as_deref()
            .and_then(|raw| cookies::get_cookie(raw, cookies::CSRF_COOKIE));

        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            cookies,
            csrf_token,
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(cfg.base_url.clone(), cfg.cookies.clone())
    }

    pub fn csrf_token(&self) -> Option<&str> {
        self.csrf_token.as_deref()
    }

    /// `{base}/api/{endpoint}/`
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/api/{}/", self.base_url, endpoint)
    }

    fn session(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.cookies {
            Some(raw) => builder.header(COOKIE, raw.clone()),
            None => builder,
        }
    }

    fn mutating(&self, endpoint: &str) -> Result<RequestBuilder, ApiError> {
        let token = self.csrf_token.as_deref().ok_or(ApiError::MissingCsrfToken)?;
        let builder = self.http.post(self.endpoint_url(endpoint));

        Ok(self.session(builder).header(CSRF_HEADER, token))
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ApiError> {
        debug!(endpoint, "GET");
        let res = self.session(self.http.get(self.endpoint_url(endpoint))).send().await?;

        decode(res).await
    }

    async fn post_json<B: Serialize + Sync>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<ActionResponse, ApiError> {
        debug!(endpoint, "POST");
        let res = self.mutating(endpoint)?.json(body).send().await?;

        decode(res).await
    }
}

/// Multipart body for `publish-post`: the text fields, then one `files` part
/// per attachment.
pub fn publish_form(req: &PublishRequest) -> Form {
    let mut form = Form::new();
    for (name, value) in req.fields() {
        form = form.text(name, value);
    }
    for file in &req.files {
        let part = Part::bytes(file.bytes.clone()).file_name(file.name.clone());
        form = form.part("files", part);
    }
    form
}

async fn decode<T: DeserializeOwned>(res: Response) -> Result<T, ApiError> {
    let status = res.status().as_u16();
    let text = res.text().await?;

    serde_json::from_str(&text).map_err(|source| ApiError::Decode { status, source })
}

#[async_trait]
impl Backend for ApiClient {
    async fn saved_groups(&self) -> Result<SavedGroupsResponse, ApiError> {
        self.get("get-saved-groups").await
    }

    async fn recent_posts(&self) -> Result<RecentPostsResponse, ApiError> {
        self.get("get-recent-posts").await
    }

    async fn save_vk_group(&self, req: &SaveVkGroupRequest) -> Result<ActionResponse, ApiError> {
        self.post_json("save-vk-group-token", req).await
    }

    async fn remove_vk_group(
        &self,
        req: &RemoveVkGroupRequest,
    ) -> Result<ActionResponse, ApiError> {
        self.post_json("remove-vk-group-token", req).await
    }

    async fn save_tg_channel(
        &self,
        req: &SaveTgChannelRequest,
    ) -> Result<ActionResponse, ApiError> {
        self.post_json("save-tg-channel", req).await
    }

    async fn remove_tg_channel(
        &self,
        req: &RemoveTgChannelRequest,
    ) -> Result<ActionResponse, ApiError> {
        self.post_json("remove-tg-channel", req).await
    }

    async fn publish_post(&self, req: &PublishRequest) -> Result<ActionResponse, ApiError> {
        debug!(
            files = req.files.len(),
            scheduled = req.scheduled_time.is_some(),
            "POST publish-post"
        );
        let res = self
            .mutating("publish-post")?
            .multipart(publish_form(req))
            .send()
            .await?;

        decode(res).await
    }

    async fn tg_send_code(&self, req: &TgSendCodeRequest) -> Result<ActionResponse, ApiError> {
        self.post_json("tg-send-code", req).await
    }

    async fn tg_verify_code(
        &self,
        req: &TgVerifyCodeRequest,
    ) -> Result<ActionResponse, ApiError> {
        self.post_json("tg-verify-code", req).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        extract::{Multipart, State},
        http::HeaderMap,
        routing::post,
        Json, Router,
    };
    use serde_json::json;
    use tokio::{
        net::TcpListener,
        sync::{oneshot, Mutex},
    };

    use super::*;
    use crate::draft::Attachment;

    /// What the server saw of one publish request.
    #[derive(Debug)]
    struct Received {
        csrf: Option<String>,
        cookie: Option<String>,
        /// (field name, file name, body)
        parts: Vec<(String, Option<String>, Vec<u8>)>,
    }

    type Slot = Arc<Mutex<Option<oneshot::Sender<Received>>>>;

    async fn handle_publish(
        State(slot): State<Slot>,
        headers: HeaderMap,
        mut multipart: Multipart,
    ) -> Json<serde_json::Value> {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned)
        };
        let mut received = Received {
            csrf: header(CSRF_HEADER),
            cookie: header("cookie"),
            parts: vec![],
        };

        while let Some(field) = multipart.next_field().await.unwrap() {
            let name = field.name().unwrap_or_default().to_owned();
            let file_name = field.file_name().map(str::to_owned);
            let data = field.bytes().await.unwrap().to_vec();
            received.parts.push((name, file_name, data));
        }

        if let Some(tx) = slot.lock().await.take() {
            let _ = tx.send(received);
        }
        Json(json!({ "success": true }))
    }

    async fn spawn_publish_server() -> (String, oneshot::Receiver<Received>) {
        std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel();

        let app = Router::new()
            .route("/api/publish-post/", post(handle_publish))
            .with_state(Arc::new(Mutex::new(Some(tx))));
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        (format!("http://{addr}"), rx)
    }

    fn scheduled_request() -> PublishRequest {
        PublishRequest {
            text: "hello".into(),
            vk_groups: "1,2".into(),
            tg_channels: "@news".into(),
            scheduled_time: Some("2099-01-01T10:00:00.000Z".into()),
            files: vec![
                Attachment::new("a.png", vec![1, 2, 3]),
                Attachment::new("b.jpg", vec![4]),
            ],
        }
    }

    #[test]
    fn endpoint_urls_keep_django_trailing_slash() {
        let client = ApiClient::new("http://localhost:8000/", None);
        assert_eq!(
            client.endpoint_url("publish-post"),
            "http://localhost:8000/api/publish-post/"
        );
    }

    #[test]
    fn csrf_token_comes_from_cookies() {
        let client = ApiClient::new("http://x", Some("sessionid=s; csrftoken=abc".into()));
        assert_eq!(client.csrf_token(), Some("abc"));
    }

    #[test]
    fn mutating_call_without_csrf_token_is_refused() {
        let client = ApiClient::new("http://x", Some("sessionid=s".into()));
        assert!(matches!(client.mutating("save-tg-channel"), Err(ApiError::MissingCsrfToken)));
    }

    #[test]
    fn mutating_call_carries_csrf_header() {
        let client = ApiClient::new("http://x", Some("csrftoken=abc".into()));
        let req = client.mutating("remove-tg-channel").unwrap().build().unwrap();

        assert_eq!(req.method(), reqwest::Method::POST);
        assert_eq!(req.headers()[CSRF_HEADER], "abc");
        assert_eq!(req.headers()[COOKIE], "csrftoken=abc");
    }

    #[test]
    fn publish_request_is_multipart() {
        let client = ApiClient::new("http://x", Some("csrftoken=abc".into()));
        let req = client
            .mutating("publish-post")
            .unwrap()
            .multipart(publish_form(&scheduled_request()))
            .build()
            .unwrap();

        assert_eq!(req.url().as_str(), "http://x/api/publish-post/");
        let content_type = req.headers()[reqwest::header::CONTENT_TYPE].to_str().unwrap();
        assert!(content_type.starts_with("multipart/form-data; boundary="));
        assert_eq!(req.headers()[CSRF_HEADER], "abc");
    }

    #[tokio::test]
    async fn publish_post_sends_fields_and_one_part_per_file() {
        let (base_url, received) = spawn_publish_server().await;
        let client = ApiClient::new(base_url, Some("sessionid=s; csrftoken=abc".into()));

        let res = client.publish_post(&scheduled_request()).await.unwrap();
        assert!(res.success);

        let received = received.await.unwrap();
        assert_eq!(received.csrf.as_deref(), Some("abc"));
        assert_eq!(received.cookie.as_deref(), Some("sessionid=s; csrftoken=abc"));

        let text = |name: &str| {
            received
                .parts
                .iter()
                .find(|(n, file, _)| n == name && file.is_none())
                .map(|(_, _, data)| String::from_utf8(data.clone()).unwrap())
        };
        assert_eq!(text("text").as_deref(), Some("hello"));
        assert_eq!(text("vk_groups").as_deref(), Some("1,2"));
        assert_eq!(text("tg_channels").as_deref(), Some("@news"));
        assert_eq!(text("scheduled_time").as_deref(), Some("2099-01-01T10:00:00.000Z"));

        let files: Vec<_> = received
            .parts
            .iter()
            .filter(|(name, _, _)| name == "files")
            .map(|(_, file, data)| (file.clone(), data.clone()))
            .collect();
        assert_eq!(
            files,
            [
                (Some("a.png".to_string()), vec![1, 2, 3]),
                (Some("b.jpg".to_string()), vec![4]),
            ]
        );
    }
}
