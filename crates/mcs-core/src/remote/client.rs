//! reqwest-backed implementation of the backend gateway.

use std::time::Duration;

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::dto::{
    ChatMessageDto, ChatReplyDto, GuideArticleDto, MaintenanceRecordDto, MaintenanceTaskDto,
    UserProfileDto, VehicleDto, WarningLightDto,
};
use super::RemoteGateway;
use crate::error::{Error, Result};
use crate::models::ConversationId;
use crate::util::{compact_text, is_http_url};

const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// HTTP client for the MyCarSetting REST API.
#[derive(Clone)]
pub struct HttpGateway {
    base_url: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl std::fmt::Debug for HttpGateway {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("HttpGateway")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}

impl HttpGateway {
    /// Builds a client for an explicit API base URL.
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Result<Self> {
        Self::with_timeout(base_url, token, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Builds a client with a custom per-request timeout.
    pub fn with_timeout(
        base_url: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let base_url = normalize_base_url(&base_url.into())?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url,
            token: token
                .map(|token| token.trim().to_string())
                .filter(|token| !token.is_empty()),
            client,
        })
    }

    /// Returns the base URL this client was configured with.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, route: &str) -> String {
        format!("{}/api{route}", self.base_url)
    }

    fn request(&self, method: Method, route: &str) -> RequestBuilder {
        let request = self
            .client
            .request(method, self.url(route))
            .header("Accept", "application/json");
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder, route: &str) -> Result<T> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(api_error(status, &body));
        }
        if body.trim().is_empty() {
            return Err(Error::EmptyResponse(route.to_string()));
        }
        Ok(serde_json::from_str(&body)?)
    }

    async fn get<T: DeserializeOwned>(&self, route: &str) -> Result<T> {
        tracing::debug!("GET {route}");
        self.fetch(self.request(Method::GET, route), route).await
    }

    async fn send<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        method: Method,
        route: &str,
        body: &B,
    ) -> Result<T> {
        tracing::debug!("{method} {route}");
        self.fetch(self.request(method, route).json(body), route)
            .await
    }

    async fn execute(&self, method: Method, route: &str) -> Result<()> {
        tracing::debug!("{method} {route}");
        let response = self.request(method, route).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status, &body));
        }
        Ok(())
    }
}

fn segment(id: &str) -> String {
    urlencoding::encode(id).into_owned()
}

impl RemoteGateway for HttpGateway {
    async fn list_vehicles(&self) -> Result<Vec<VehicleDto>> {
        self.get("/vehicles").await
    }

    async fn create_vehicle(&self, vehicle: &VehicleDto) -> Result<VehicleDto> {
        self.send(Method::POST, "/vehicles", vehicle).await
    }

    async fn update_vehicle(&self, remote_id: &str, vehicle: &VehicleDto) -> Result<VehicleDto> {
        self.send(Method::PUT, &format!("/vehicles/{}", segment(remote_id)), vehicle)
            .await
    }

    async fn delete_vehicle(&self, remote_id: &str) -> Result<()> {
        self.execute(Method::DELETE, &format!("/vehicles/{}", segment(remote_id)))
            .await
    }

    async fn set_current_vehicle(&self, remote_id: &str) -> Result<()> {
        self.execute(
            Method::POST,
            &format!("/vehicles/{}/current", segment(remote_id)),
        )
        .await
    }

    async fn list_tasks(&self, vehicle_remote_id: &str) -> Result<Vec<MaintenanceTaskDto>> {
        self.get(&format!(
            "/vehicles/{}/maintenance-tasks",
            segment(vehicle_remote_id)
        ))
        .await
    }

    async fn create_task(&self, task: &MaintenanceTaskDto) -> Result<MaintenanceTaskDto> {
        self.send(Method::POST, "/maintenance-tasks", task).await
    }

    async fn update_task(
        &self,
        remote_id: &str,
        task: &MaintenanceTaskDto,
    ) -> Result<MaintenanceTaskDto> {
        self.send(
            Method::PUT,
            &format!("/maintenance-tasks/{}", segment(remote_id)),
            task,
        )
        .await
    }

    async fn delete_task(&self, remote_id: &str) -> Result<()> {
        self.execute(
            Method::DELETE,
            &format!("/maintenance-tasks/{}", segment(remote_id)),
        )
        .await
    }

    async fn list_history(&self, vehicle_remote_id: &str) -> Result<Vec<MaintenanceRecordDto>> {
        self.get(&format!(
            "/vehicles/{}/maintenance-history",
            segment(vehicle_remote_id)
        ))
        .await
    }

    async fn create_record(&self, record: &MaintenanceRecordDto) -> Result<MaintenanceRecordDto> {
        self.send(Method::POST, "/maintenance-history", record).await
    }

    async fn delete_record(&self, remote_id: &str) -> Result<()> {
        self.execute(
            Method::DELETE,
            &format!("/maintenance-history/{}", segment(remote_id)),
        )
        .await
    }

    async fn list_warning_lights(&self) -> Result<Vec<WarningLightDto>> {
        self.get("/warning-lights").await
    }

    async fn list_guides(&self) -> Result<Vec<GuideArticleDto>> {
        self.get("/guides").await
    }

    async fn chat_reply(
        &self,
        conversation: &ConversationId,
        messages: &[ChatMessageDto],
    ) -> Result<String> {
        #[derive(Serialize)]
        struct ChatRequest<'a> {
            messages: &'a [ChatMessageDto],
        }

        let route = format!("/chat/{conversation}/reply");
        let reply: ChatReplyDto = self
            .send(Method::POST, &route, &ChatRequest { messages })
            .await?;
        let content = reply.content.trim();
        if content.is_empty() {
            return Err(Error::EmptyResponse(route));
        }
        Ok(content.to_string())
    }

    async fn profile(&self) -> Result<UserProfileDto> {
        self.get("/users/me").await
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
    message: Option<String>,
}

/// Map a non-success response to [`Error::Api`].
fn api_error(status: StatusCode, body: &str) -> Error {
    let from_json = serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|payload| payload.message.or(payload.error))
        .map(|message| message.trim().to_string())
        .filter(|message| !message.is_empty());

    let message = from_json.unwrap_or_else(|| {
        let compact = compact_text(body);
        if compact.is_empty() {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        } else {
            compact
        }
    });

    Error::Api {
        status: status.as_u16(),
        message,
    }
}

fn normalize_base_url(raw: &str) -> Result<String> {
    let base = raw.trim().trim_end_matches('/').to_string();
    if base.is_empty() {
        return Err(Error::InvalidInput("API base URL must not be empty".into()));
    }
    if !is_http_url(&base) {
        return Err(Error::InvalidInput(
            "API base URL must include http:// or https://".into(),
        ));
    }
    Ok(base)
}
