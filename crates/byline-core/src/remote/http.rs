//! HTTP client for the hosted draft API.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::models::{DraftFields, DraftId};
use crate::util::{compact_text, normalize_text_option};

use super::{DraftRepository, RemoteError, RemoteResult};

/// Draft repository backed by the Byline data service's JSON API.
#[derive(Clone)]
pub struct HttpDraftRepository {
    base_url: String,
    auth_token: Option<String>,
    client: reqwest::Client,
}

impl HttpDraftRepository {
    /// Create a client for the given API base URL.
    pub fn new(base_url: impl Into<String>) -> RemoteResult<Self> {
        let base_url = normalize_base_url(base_url.into())?;
        let client = reqwest::Client::builder()
            .build()
            .map_err(|error| RemoteError::Transient(error.to_string()))?;
        Ok(Self {
            base_url,
            auth_token: None,
            client,
        })
    }

    /// Attach a bearer token for authenticated requests.
    #[must_use]
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    fn drafts_url(&self) -> String {
        format!("{}/v1/drafts", self.base_url)
    }

    fn draft_url(&self, id: &DraftId) -> String {
        format!("{}/v1/drafts/{id}", self.base_url)
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let builder = builder.header("Accept", "application/json");
        match &self.auth_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

#[async_trait]
impl DraftRepository for HttpDraftRepository {
    async fn create(&self, fields: &DraftFields) -> RemoteResult<DraftId> {
        let response = self
            .request(self.client.post(self.drafts_url()))
            .json(&DraftPayload::from(fields))
            .send()
            .await
            .map_err(transport_error)?;

        let response = check_status(response).await?;
        let payload = response
            .json::<CreateDraftResponse>()
            .await
            .map_err(transport_error)?;
        payload
            .id
            .parse()
            .map_err(|_| RemoteError::Transient(format!("invalid draft id: {}", payload.id)))
    }

    async fn update(&self, id: &DraftId, fields: &DraftFields) -> RemoteResult<()> {
        let response = self
            .request(self.client.put(self.draft_url(id)))
            .json(&DraftPayload::from(fields))
            .send()
            .await
            .map_err(transport_error)?;

        check_status(response).await?;
        Ok(())
    }

    async fn fetch(&self, id: &DraftId) -> RemoteResult<DraftFields> {
        let response = self
            .request(self.client.get(self.draft_url(id)))
            .send()
            .await
            .map_err(transport_error)?;

        let response = check_status(response).await?;
        let payload = response
            .json::<DraftPayload>()
            .await
            .map_err(transport_error)?;
        Ok(payload.into())
    }
}

/// Wire shape of a draft record.
#[derive(Debug, Serialize, Deserialize)]
struct DraftPayload {
    title: String,
    description: String,
    body: String,
    category: String,
    tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image_url: Option<String>,
    #[serde(default)]
    published: bool,
}

impl From<&DraftFields> for DraftPayload {
    fn from(fields: &DraftFields) -> Self {
        Self {
            title: fields.title.clone(),
            description: fields.description.clone(),
            body: fields.content.clone(),
            category: fields.category.clone(),
            tags: fields.tags.clone(),
            image_url: fields.image_reference.clone(),
            published: false,
        }
    }
}

impl From<DraftPayload> for DraftFields {
    fn from(payload: DraftPayload) -> Self {
        Self {
            title: payload.title,
            description: payload.description,
            content: payload.body,
            category: payload.category,
            tags: payload.tags,
            image_reference: payload.image_url,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreateDraftResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
    message: Option<String>,
}

fn transport_error(error: reqwest::Error) -> RemoteError {
    RemoteError::Transient(error.to_string())
}

async fn check_status(response: reqwest::Response) -> RemoteResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = parse_api_error(status, &body);
    if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
        Err(RemoteError::NotFound(message))
    } else {
        Err(RemoteError::Transient(message))
    }
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.message.or(payload.error) {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", compact_text(trimmed), status.as_u16())
    }
}

fn normalize_base_url(raw: String) -> RemoteResult<String> {
    let url = normalize_text_option(Some(raw))
        .ok_or_else(|| RemoteError::Transient("base URL must not be empty".to_string()))?;
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(url.trim_end_matches('/').to_string())
    } else {
        Err(RemoteError::Transient(
            "base URL must include http:// or https://".to_string(),
        ))
    }
}
