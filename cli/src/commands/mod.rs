//! CLI Commands

pub mod agency;
pub mod applications;
pub mod apply;
pub mod config;
pub mod form;
pub mod jobs;

use recruit_forms::{ApplicationPage, ClientConfig, HttpRecruitmentApi, JobPostId};

use crate::output::OutputFormat;

/// Resolved settings shared by the API-backed commands
pub struct Context {
    pub client: ClientConfig,
    pub format: OutputFormat,
}

impl Context {
    /// Layer `api_url` and `agency` over the profile's client settings
    pub fn new(
        mut client: ClientConfig,
        api_url: Option<String>,
        agency: Option<String>,
        format: OutputFormat,
    ) -> Self {
        if let Some(url) = api_url {
            client.api_base_url = url;
        }
        if agency.is_some() {
            client.default_agency = agency;
        }
        Self { client, format }
    }

    pub fn api(&self) -> Result<HttpRecruitmentApi, String> {
        HttpRecruitmentApi::new(&self.client).map_err(|e| e.to_string())
    }

    pub fn agency(&self) -> Result<&str, String> {
        self.client
            .default_agency
            .as_deref()
            .ok_or_else(|| "No agency given; pass --agency or set RECRUIT_AGENCY".to_string())
    }

    /// Load the agency page and, if asked, the schema of one job post
    pub async fn open_page(&self, job: Option<u64>) -> Result<ApplicationPage<HttpRecruitmentApi>, String> {
        let mut page = ApplicationPage::new(self.api()?, self.agency()?);
        page.load().await.map_err(|e| e.to_string())?;
        if let Some(message) = page.error() {
            return Err(message.to_string());
        }

        if let Some(job) = job {
            let job = JobPostId(job);
            if !page.job_posts().iter().any(|p| p.id == job) {
                return Err(format!("Job post {} is not open at this agency", job));
            }
            page.select_job_post(job).await.map_err(|e| e.to_string())?;
        }
        if page.session().is_none() {
            return Err("This agency has no default form; pass --job".to_string());
        }
        Ok(page)
    }
}
