//! In-memory recruitment API (for testing)

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Map;
use std::collections::HashMap;

use crate::domain::records::{Agency, ApplicationDetail, ApplicationId, ApplicationReceipt, JobPostId, JobPostSummary};
use crate::domain::schema::FormSchema;
use crate::domain::submission::MultipartPayload;
use crate::ports::outbound::{ApiError, RecruitmentApi};

#[derive(Default)]
struct State {
    agencies: HashMap<String, Agency>,
    job_posts: HashMap<String, Vec<JobPostSummary>>,
    schemas: HashMap<JobPostId, FormSchema>,
    submissions: Vec<MultipartPayload>,
    applications: HashMap<ApplicationId, ApplicationDetail>,
    fail_next_submission: Option<ApiError>,
    unavailable: bool,
}

/// Seeded in-memory backend
#[derive(Default)]
pub struct InMemoryRecruitmentApi {
    state: RwLock<State>,
}

impl InMemoryRecruitmentApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_agency(self, agency: Agency, posts: Vec<JobPostSummary>) -> Self {
        {
            let mut state = self.state.write();
            state.job_posts.insert(agency.code.clone(), posts);
            state.agencies.insert(agency.code.clone(), agency);
        }
        self
    }

    pub fn with_schema(self, job_post: JobPostId, schema: FormSchema) -> Self {
        self.state.write().schemas.insert(job_post, schema);
        self
    }

    /// Make the next submission fail with `error`
    pub fn fail_next_submission(&self, error: ApiError) {
        self.state.write().fail_next_submission = Some(error);
    }

    /// Make every read fail with a transport error
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.write().unavailable = unavailable;
    }

    /// Payloads accepted so far
    pub fn submissions(&self) -> Vec<MultipartPayload> {
        self.state.read().submissions.clone()
    }

    fn check_available(&self) -> Result<(), ApiError> {
        if self.state.read().unavailable {
            return Err(ApiError::Transport("connection refused".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl RecruitmentApi for InMemoryRecruitmentApi {
    async fn agency(&self, code: &str) -> Result<Agency, ApiError> {
        self.check_available()?;
        self.state
            .read()
            .agencies
            .get(code)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("agency {}", code)))
    }

    async fn job_posts(&self, agency_code: &str) -> Result<Vec<JobPostSummary>, ApiError> {
        self.check_available()?;
        self.state
            .read()
            .job_posts
            .get(agency_code)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("agency {}", agency_code)))
    }

    async fn form_schema(&self, job_post: JobPostId) -> Result<FormSchema, ApiError> {
        self.check_available()?;
        self.state
            .read()
            .schemas
            .get(&job_post)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("job post {}", job_post)))
    }

    async fn submit_application(&self, payload: MultipartPayload) -> Result<ApplicationReceipt, ApiError> {
        let mut state = self.state.write();
        if let Some(error) = state.fail_next_submission.take() {
            return Err(error);
        }

        let id = ApplicationId(state.submissions.len() as u64 + 1);
        let job_post = payload.text("job_post").and_then(|s| s.parse().ok());
        let agency_code = job_post.and_then(|post: JobPostId| {
            state
                .job_posts
                .iter()
                .find(|(_, posts)| posts.iter().any(|p| p.id == post))
                .map(|(code, _)| code.clone())
        });
        let custom_application_id = agency_code
            .as_ref()
            .map(|code| format!("{}-{:03}", code.to_uppercase(), id.0));

        let detail = ApplicationDetail {
            id,
            custom_application_id: custom_application_id.clone(),
            agency_code: agency_code.clone(),
            job_post,
            full_name: payload.text("full_name").unwrap_or_default().to_string(),
            email: payload.text("email").unwrap_or_default().to_string(),
            phone: payload.text("phone").unwrap_or_default().to_string(),
            form_data: payload
                .form_data()
                .and_then(|v| v.as_object().cloned())
                .unwrap_or_default(),
            photo: None,
            signature: None,
            status: "pending".into(),
            documents: Vec::new(),
            created_at: Some(chrono::Utc::now()),
        };
        state.applications.insert(id, detail);
        state.submissions.push(payload);

        Ok(ApplicationReceipt { id, custom_application_id, agency_code, extra: Map::new() })
    }

    async fn application(&self, id: ApplicationId) -> Result<ApplicationDetail, ApiError> {
        self.check_available()?;
        self.state
            .read()
            .applications
            .get(&id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("application {}", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn agency() -> Agency {
        serde_json::from_value(json!({"code": "ssc", "name": "Staff Selection"})).unwrap()
    }

    #[tokio::test]
    async fn test_submission_round_trip() {
        let api = InMemoryRecruitmentApi::new()
            .with_agency(agency(), vec![JobPostSummary { id: JobPostId(2), title: "Clerk".into(), description: String::new() }]);

        let mut payload = MultipartPayload::new();
        payload.push_text("job_post", "2");
        payload.push_text("form_data", r#"{"full_name":"Anil"}"#);
        payload.push_text("full_name", "Anil");

        let receipt = api.submit_application(payload).await.unwrap();
        assert_eq!(receipt.custom_application_id.as_deref(), Some("SSC-001"));

        let detail = api.application(receipt.id).await.unwrap();
        assert_eq!(detail.full_name, "Anil");
        assert_eq!(detail.form_data["full_name"], "Anil");
        assert_eq!(api.submissions().len(), 1);
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let api = InMemoryRecruitmentApi::new().with_agency(agency(), Vec::new());
        api.fail_next_submission(ApiError::Status { status: 502, body: String::new() });
        assert!(api.submit_application(MultipartPayload::new()).await.is_err());
        assert!(api.submit_application(MultipartPayload::new()).await.is_ok());

        api.set_unavailable(true);
        assert!(matches!(api.agency("ssc").await, Err(ApiError::Transport(_))));
    }
}
