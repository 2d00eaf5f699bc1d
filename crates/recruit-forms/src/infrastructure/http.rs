//! reqwest adapter for the recruitment API

use async_trait::async_trait;
use reqwest::multipart::{Form, Part as FormPart};
use reqwest::{header, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::ClientConfig;
use crate::domain::records::{Agency, ApplicationDetail, ApplicationId, ApplicationReceipt, JobPostId, JobPostSummary};
use crate::domain::schema::FormSchema;
use crate::domain::submission::{MultipartPayload, PartBody};
use crate::ports::outbound::{ApiError, RecruitmentApi};

/// HTTP client for the recruitment backend
#[derive(Clone, Debug)]
pub struct HttpRecruitmentApi {
    base_url: Url,
    http: reqwest::Client,
}

impl HttpRecruitmentApi {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(config.user_agent.clone())
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        Self::with_client(&config.normalized_base_url(), http)
    }

    /// Use a preconfigured client; `base_url` should end with `/`
    pub fn with_client(base_url: &str, http: reqwest::Client) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", path, e)))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.endpoint(path)?;
        tracing::debug!(%url, "GET");
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        read_json(url, response).await
    }
}

async fn read_json<T: DeserializeOwned>(url: Url, response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status();
    let body = response.bytes().await.map_err(|e| ApiError::Transport(e.to_string()))?;

    if status == StatusCode::NOT_FOUND {
        return Err(ApiError::NotFound(url.path().to_string()));
    }
    if !status.is_success() {
        return Err(ApiError::Status {
            status: status.as_u16(),
            body: String::from_utf8_lossy(&body).into_owned(),
        });
    }
    serde_json::from_slice(&body).map_err(|e| ApiError::Decode(e.to_string()))
}

/// Convert an encoded payload into a reqwest multipart form
pub fn to_multipart(payload: MultipartPayload) -> Result<Form, ApiError> {
    let mut form = Form::new();
    for part in payload.into_parts() {
        form = match part.body {
            PartBody::Text(text) => form.text(part.name, text),
            PartBody::File(blob) => {
                let file_part = FormPart::bytes(blob.bytes.to_vec())
                    .file_name(blob.file_name)
                    .mime_str(&blob.content_type)
                    .map_err(|e| ApiError::Transport(e.to_string()))?;
                form.part(part.name, file_part)
            }
        };
    }
    Ok(form)
}

#[async_trait]
impl RecruitmentApi for HttpRecruitmentApi {
    async fn agency(&self, code: &str) -> Result<Agency, ApiError> {
        self.get_json(&format!("agencies/{}/", code)).await
    }

    async fn job_posts(&self, agency_code: &str) -> Result<Vec<JobPostSummary>, ApiError> {
        self.get_json(&format!("agencies/{}/job_posts/", agency_code)).await
    }

    async fn form_schema(&self, job_post: JobPostId) -> Result<FormSchema, ApiError> {
        let raw: serde_json::Value = self.get_json(&format!("job-posts/{}/form_schema/", job_post)).await?;
        FormSchema::from_value(raw).map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn submit_application(&self, payload: MultipartPayload) -> Result<ApplicationReceipt, ApiError> {
        let url = self.endpoint("applications/")?;
        let parts = payload.parts().len();
        let form = to_multipart(payload)?;
        tracing::debug!(%url, parts, "POST multipart");
        let response = self
            .http
            .post(url.clone())
            .multipart(form)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        read_json(url, response).await
    }

    async fn application(&self, id: ApplicationId) -> Result<ApplicationDetail, ApiError> {
        self.get_json(&format!("applications/{}/", id)).await
    }
}
