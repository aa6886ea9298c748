use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{StatusCode, Url};

use crate::{GatewayError, JobId, JobRecord};

#[derive(Debug, Clone)]
pub struct GatewaySettings {
    pub base_url: String,
    /// Sent as a bearer token when present.
    pub api_token: Option<String>,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            api_token: None,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Remote job queries consumed by the monitor.
#[async_trait::async_trait]
pub trait JobGateway: Send + Sync {
    async fn fetch_job(&self, job_id: JobId) -> Result<JobRecord, GatewayError>;

    /// Asks the server to cancel; `Conflict` means the job already finished.
    async fn cancel_job(&self, job_id: JobId) -> Result<(), GatewayError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestGateway {
    settings: GatewaySettings,
    base_url: Url,
    client: reqwest::Client,
}

impl ReqwestGateway {
    pub fn new(settings: GatewaySettings) -> Result<Self, GatewayError> {
        let base_url = Url::parse(settings.base_url.trim_end_matches('/'))
            .map_err(|err| GatewayError::InvalidUrl(err.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(GatewayError::InvalidUrl(settings.base_url.clone()));
        }
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| GatewayError::Network(err.to_string()))?;
        Ok(Self {
            settings,
            base_url,
            client,
        })
    }

    fn job_url(&self, job_id: JobId, action: Option<&str>) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("jobs").push(&job_id.to_string());
            if let Some(action) = action {
                segments.push(action);
            }
        }
        url
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.settings.api_token.as_deref() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait::async_trait]
impl JobGateway for ReqwestGateway {
    async fn fetch_job(&self, job_id: JobId) -> Result<JobRecord, GatewayError> {
        let request = self
            .client
            .get(self.job_url(job_id, None))
            .header(ACCEPT, "application/json");
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        check_status(response.status(), job_id)?;

        let body = response.bytes().await.map_err(map_reqwest_error)?;
        serde_json::from_slice(&body).map_err(|err| GatewayError::Decode(err.to_string()))
    }

    async fn cancel_job(&self, job_id: JobId) -> Result<(), GatewayError> {
        let request = self
            .client
            .post(self.job_url(job_id, Some("cancel")))
            .header(CONTENT_TYPE, "application/json")
            .body("{}");
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        check_status(response.status(), job_id)
    }
}

fn check_status(status: StatusCode, job_id: JobId) -> Result<(), GatewayError> {
    if status.is_success() {
        return Ok(());
    }
    Err(match status {
        StatusCode::NOT_FOUND => GatewayError::NotFound(job_id),
        StatusCode::CONFLICT => GatewayError::Conflict(job_id),
        other => GatewayError::HttpStatus(other.as_u16()),
    })
}

fn map_reqwest_error(err: reqwest::Error) -> GatewayError {
    if err.is_timeout() {
        return GatewayError::Network(format!("timeout: {err}"));
    }
    GatewayError::Network(err.to_string())
}
