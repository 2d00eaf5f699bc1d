//! Outbound ports
//!
//! Hexagonal architecture: the recruitment backend as seen by the form engine.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::records::{Agency, ApplicationDetail, ApplicationId, ApplicationReceipt, JobPostId, JobPostSummary};
use crate::domain::schema::FormSchema;
use crate::domain::submission::MultipartPayload;

/// Recruitment backend port
#[async_trait]
pub trait RecruitmentApi: Send + Sync {
    /// Agency record, including its optional default schema
    async fn agency(&self, code: &str) -> Result<Agency, ApiError>;

    /// Job posts open under an agency
    async fn job_posts(&self, agency_code: &str) -> Result<Vec<JobPostSummary>, ApiError>;

    /// Form schema of one job post
    async fn form_schema(&self, job_post: JobPostId) -> Result<FormSchema, ApiError>;

    /// Submit an encoded application
    async fn submit_application(&self, payload: MultipartPayload) -> Result<ApplicationReceipt, ApiError>;

    /// Submitted application
    async fn application(&self, id: ApplicationId) -> Result<ApplicationDetail, ApiError>;
}

/// Backend call failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("transport error: {0}")]
    Transport(String),

    /// Non-2xx response
    #[error("server responded {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not decode response: {0}")]
    Decode(String),

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("not found: {0}")]
    NotFound(String),
}
