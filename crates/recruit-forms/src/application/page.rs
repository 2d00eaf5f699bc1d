//! Application page flow
//!
//! Loads an agency, its job posts and the schema for the selected post, owns
//! the [`FormSession`] and drives submission. Schema fetches carry a
//! generation number so a response for a superseded selection is dropped.

use chrono::NaiveDate;
use serde::Serialize;

use super::routes::Route;
use super::session::FormSession;
use super::view::{render, FormView, RenderContext};
use crate::domain::records::{Agency, JobPostId, JobPostSummary};
use crate::domain::schema::FormSchema;
use crate::error::{FormsError, Result};
use crate::ports::outbound::{ApiError, RecruitmentApi};

pub const PAGE_TITLE: &str = "Application Form";
pub const INITIAL_LOAD_FAILED: &str = "Could not fetch initial data.";
pub const NO_JOB_POSTS: &str = "No job posts found for this agency.";
pub const SCHEMA_LOAD_FAILED: &str = "Could not load the form schema.";

/// Ticket for an in-flight schema fetch
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SchemaRequest {
    pub job_post: JobPostId,
    generation: u64,
}

/// What the page currently shows
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PageView {
    Loading,
    Error { message: String },
    Form {
        title: String,
        form: FormView,
        submit_error: Option<String>,
    },
}

/// Form page of one agency
pub struct ApplicationPage<A: RecruitmentApi> {
    api: A,
    agency_code: String,
    agency: Option<Agency>,
    job_posts: Vec<JobPostSummary>,
    selected: Option<JobPostId>,
    session: Option<FormSession>,
    loading: bool,
    error: Option<String>,
    submit_error: Option<String>,
    generation: u64,
}

impl<A: RecruitmentApi> ApplicationPage<A> {
    pub fn new(api: A, agency_code: impl Into<String>) -> Self {
        Self {
            api,
            agency_code: agency_code.into(),
            agency: None,
            job_posts: Vec::new(),
            selected: None,
            session: None,
            loading: true,
            error: None,
            submit_error: None,
            generation: 0,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn agency(&self) -> Option<&Agency> {
        self.agency.as_ref()
    }

    pub fn job_posts(&self) -> &[JobPostSummary] {
        &self.job_posts
    }

    pub fn selected_job_post(&self) -> Option<JobPostId> {
        self.selected
    }

    pub fn session(&self) -> Option<&FormSession> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut FormSession> {
        self.session.as_mut()
    }

    /// Page-level error, if any
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn submit_error(&self) -> Option<&str> {
        self.submit_error.as_deref()
    }

    /// Fetch the agency (for its default schema) and its job posts
    pub async fn load(&mut self) -> Result<()> {
        self.loading = true;
        self.error = None;
        let outcome = self.load_initial().await;
        self.loading = false;

        let posts = match outcome {
            Ok(posts) => posts,
            Err(e) => {
                tracing::warn!(agency = %self.agency_code, error = %e, "initial load failed");
                self.error = Some(INITIAL_LOAD_FAILED.to_string());
                return Err(e);
            }
        };

        tracing::info!(agency = %self.agency_code, posts = posts.len(), "agency loaded");
        let single = match posts.as_slice() {
            [only] => Some(only.id),
            _ => None,
        };
        if posts.is_empty() {
            self.error = Some(NO_JOB_POSTS.to_string());
        }
        self.job_posts = posts;
        match single {
            Some(job_post) => self.select_job_post(job_post).await,
            None => Ok(()),
        }
    }

    async fn load_initial(&mut self) -> Result<Vec<JobPostSummary>> {
        let agency = self.api.agency(&self.agency_code).await?;
        if let Some(schema) = agency.default_schema()? {
            self.install_schema(schema);
        }
        self.agency = Some(agency);
        Ok(self.api.job_posts(&self.agency_code).await?)
    }

    fn install_schema(&mut self, schema: FormSchema) {
        match self.session.as_mut() {
            Some(session) => session.replace_schema(schema),
            None => self.session = Some(FormSession::new(schema)),
        }
    }

    /// Record a new selection; the returned ticket must accompany its response
    pub fn begin_schema_request(&mut self, job_post: JobPostId) -> SchemaRequest {
        self.generation += 1;
        self.selected = Some(job_post);
        SchemaRequest { job_post, generation: self.generation }
    }

    /// Apply a schema response; returns false when it was stale and dropped.
    /// A fresh schema clears an earlier page error.
    pub fn apply_schema_response(
        &mut self,
        request: SchemaRequest,
        response: std::result::Result<FormSchema, ApiError>,
    ) -> bool {
        if request.generation != self.generation {
            tracing::debug!(job_post = %request.job_post, "discarding stale schema response");
            return false;
        }
        match response {
            Ok(schema) => {
                tracing::info!(job_post = %request.job_post, fields = schema.fields().len(), "schema loaded");
                self.error = None;
                self.install_schema(schema);
            }
            Err(error) => {
                tracing::warn!(job_post = %request.job_post, %error, "schema fetch failed");
                self.error = Some(SCHEMA_LOAD_FAILED.to_string());
                self.session = None;
            }
        }
        true
    }

    /// Select a job post and load its schema
    pub async fn select_job_post(&mut self, job_post: JobPostId) -> Result<()> {
        let request = self.begin_schema_request(job_post);
        let response = self.api.form_schema(job_post).await;
        let failure = response.as_ref().err().cloned();
        self.apply_schema_response(request, response);
        match failure {
            Some(error) => Err(error.into()),
            None => Ok(()),
        }
    }

    /// Validate, encode and post the form; on success the session ends
    pub async fn submit(&mut self) -> Result<Route> {
        let session = self.session.as_mut().ok_or(FormsError::NoSchema)?;
        let payload = session.begin_submission(self.selected)?;
        self.submit_error = None;

        match self.api.submit_application(payload).await {
            Ok(receipt) => {
                session.finish_submission(Ok(receipt.id));
                self.session = None;
                Ok(Route::Success { id: receipt.id })
            }
            Err(error) => {
                session.finish_submission(Err(&error));
                self.submit_error = Some(format!("Submission failed: {}", error));
                Err(error.into())
            }
        }
    }

    pub fn view(&self, today: NaiveDate) -> PageView {
        if self.loading {
            return PageView::Loading;
        }
        if let Some(message) = &self.error {
            return PageView::Error { message: message.clone() };
        }
        match &self.session {
            Some(session) => {
                let ctx = RenderContext {
                    job_posts: &self.job_posts,
                    selected_job_post: self.selected,
                    today,
                };
                PageView::Form {
                    title: PAGE_TITLE.to_string(),
                    form: render(session, &ctx),
                    submit_error: self.submit_error.clone(),
                }
            }
            None => PageView::Loading,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::records::ApplicationId;
    use crate::infrastructure::memory::InMemoryRecruitmentApi;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn agency(default_schema: serde_json::Value) -> Agency {
        serde_json::from_value(json!({"code": "abc", "name": "ABC Board", "default_form_schema": default_schema})).unwrap()
    }

    fn post(id: u64, title: &str) -> JobPostSummary {
        JobPostSummary { id: JobPostId(id), title: title.into(), description: String::new() }
    }

    fn default_schema() -> serde_json::Value {
        json!({"fields": [
            {"name": "full_name", "label": "Full Name", "type": "text", "required": true},
            {"name": "email", "label": "Email", "type": "email", "required": true}
        ]})
    }

    fn clerk_schema() -> FormSchema {
        FormSchema::from_value(json!({"fields": [
            {"name": "full_name", "label": "Full Name", "type": "text", "required": true},
            {"name": "typing_speed", "label": "Typing speed", "type": "number"}
        ]}))
        .unwrap()
    }

    #[tokio::test]
    async fn test_single_post_is_selected_automatically() {
        let api = InMemoryRecruitmentApi::new()
            .with_agency(agency(default_schema()), vec![post(1, "Clerk")])
            .with_schema(JobPostId(1), clerk_schema());
        let mut page = ApplicationPage::new(api, "abc");
        page.load().await.unwrap();

        assert_eq!(page.selected_job_post(), Some(JobPostId(1)));
        let session = page.session().unwrap();
        assert!(session.schema().field("typing_speed").is_some());
        assert!(matches!(page.view(today()), PageView::Form { .. }));
    }

    #[tokio::test]
    async fn test_no_posts_is_a_page_error() {
        let api = InMemoryRecruitmentApi::new().with_agency(agency(json!({})), Vec::new());
        let mut page = ApplicationPage::new(api, "abc");
        page.load().await.unwrap();
        assert_eq!(page.view(today()), PageView::Error { message: NO_JOB_POSTS.to_string() });
    }

    #[tokio::test]
    async fn test_unreachable_backend() {
        let api = InMemoryRecruitmentApi::new();
        api.set_unavailable(true);
        let mut page = ApplicationPage::new(api, "abc");
        assert!(page.load().await.is_err());
        assert_eq!(page.error(), Some(INITIAL_LOAD_FAILED));
    }

    #[tokio::test]
    async fn test_default_schema_then_hot_swap_keeps_answers() {
        let api = InMemoryRecruitmentApi::new()
            .with_agency(agency(default_schema()), vec![post(1, "Clerk"), post(2, "Typist")])
            .with_schema(JobPostId(1), clerk_schema());
        let mut page = ApplicationPage::new(api, "abc");
        page.load().await.unwrap();
        assert_eq!(page.selected_job_post(), None);

        page.session_mut()
            .unwrap()
            .set_text(&"full_name".parse().unwrap(), "Rohan")
            .unwrap();
        page.select_job_post(JobPostId(1)).await.unwrap();

        let session = page.session().unwrap();
        assert_eq!(session.values().text(&"full_name".parse().unwrap()), Some("Rohan"));
        assert!(session.values().get("email").is_none());
        assert_eq!(session.values().text(&"typing_speed".parse().unwrap()), Some(""));
    }

    #[tokio::test]
    async fn test_stale_schema_response_is_dropped() {
        let api = InMemoryRecruitmentApi::new().with_agency(agency(default_schema()), vec![post(1, "A"), post(2, "B")]);
        let mut page = ApplicationPage::new(api, "abc");
        page.load().await.unwrap();

        let first = page.begin_schema_request(JobPostId(1));
        let second = page.begin_schema_request(JobPostId(2));
        assert!(page.apply_schema_response(second, Ok(clerk_schema())));
        assert!(!page.apply_schema_response(first, Err(ApiError::Transport("late".into()))));
        assert!(page.error().is_none());
        assert!(page.session().unwrap().schema().field("typing_speed").is_some());
    }

    #[tokio::test]
    async fn test_schema_failure_clears_form() {
        let api = InMemoryRecruitmentApi::new().with_agency(agency(default_schema()), vec![post(1, "A"), post(2, "B")]);
        let mut page = ApplicationPage::new(api, "abc");
        page.load().await.unwrap();
        assert!(page.select_job_post(JobPostId(9)).await.is_err());
        assert_eq!(page.error(), Some(SCHEMA_LOAD_FAILED));
        assert!(page.session().is_none());
    }

    #[tokio::test]
    async fn test_schema_success_after_failure_restores_form() {
        let api = InMemoryRecruitmentApi::new()
            .with_agency(agency(default_schema()), vec![post(1, "A"), post(2, "B")])
            .with_schema(JobPostId(1), clerk_schema());
        let mut page = ApplicationPage::new(api, "abc");
        page.load().await.unwrap();

        assert!(page.select_job_post(JobPostId(2)).await.is_err());
        assert!(matches!(page.view(today()), PageView::Error { .. }));

        page.select_job_post(JobPostId(1)).await.unwrap();
        assert!(page.error().is_none());
        assert!(matches!(page.view(today()), PageView::Form { .. }));
        assert!(page.session().unwrap().schema().field("typing_speed").is_some());
    }

    #[tokio::test]
    async fn test_submit_failure_keeps_values_then_succeeds() {
        let api = InMemoryRecruitmentApi::new()
            .with_agency(agency(default_schema()), vec![post(1, "Clerk")])
            .with_schema(JobPostId(1), clerk_schema());
        let mut page = ApplicationPage::new(api, "abc");
        page.load().await.unwrap();
        page.session_mut()
            .unwrap()
            .set_text(&"full_name".parse().unwrap(), "Rohan")
            .unwrap();

        page.api().fail_next_submission(ApiError::Status { status: 503, body: "busy".into() });
        assert!(page.submit().await.is_err());
        assert!(page.submit_error().unwrap().contains("503"));
        let session = page.session().unwrap();
        assert!(!session.is_submitting());
        assert_eq!(session.values().text(&"full_name".parse().unwrap()), Some("Rohan"));

        let route = page.submit().await.unwrap();
        assert_eq!(route, Route::Success { id: ApplicationId(1) });
        assert!(page.session().is_none());
        assert_eq!(page.api().submissions()[0].text("full_name"), Some("Rohan"));
    }

    #[tokio::test]
    async fn test_submit_without_selection() {
        let api = InMemoryRecruitmentApi::new().with_agency(agency(default_schema()), vec![post(1, "A"), post(2, "B")]);
        let mut page = ApplicationPage::new(api, "abc");
        page.load().await.unwrap();
        {
            let session = page.session_mut().unwrap();
            session.set_text(&"full_name".parse().unwrap(), "Rohan").unwrap();
            session.set_text(&"email".parse().unwrap(), "rohan@example.com").unwrap();
        }
        assert!(matches!(page.submit().await, Err(FormsError::NoJobPostSelected)));
    }
}
