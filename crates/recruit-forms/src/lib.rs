//! Recruit Forms
//!
//! Schema-driven job application forms. A recruiting agency publishes a JSON
//! form schema per job post; this crate turns it into an editable form with
//! validation, derived age and experience lines, and a multipart submission.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │ application   ApplicationPage ─ FormSession   │
//! │               render() ─ Route                │
//! ├───────────────────────────────────────────────┤
//! │ domain        FormSchema  FormValues  RuleSet │
//! │               Span  MultipartPayload          │
//! ├───────────────────────────────────────────────┤
//! │ ports         RecruitmentApi                  │
//! ├───────────────────────────────────────────────┤
//! │ infrastructure  HttpRecruitmentApi (reqwest)  │
//! │                 InMemoryRecruitmentApi        │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! ## Features
//!
//! - Nested groups and repeatable arrays with per-row file uploads
//! - Role inference for identity, address and declaration fields
//! - Permanent/communication address mirroring
//! - Hot-swapping the schema when the job post changes, keeping answers
//! - Age and total experience lines computed from dates

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod ports;

// Re-exports for convenience
pub use application::{ApplicationPage, FormSession, FormView, PageView, Route};
pub use config::ClientConfig;
pub use domain::{FieldPath, FieldSpec, FieldValue, FormSchema, FormValues, JobPostId, Span};
pub use error::{FormsError, Result};
pub use infrastructure::{HttpRecruitmentApi, InMemoryRecruitmentApi};
pub use ports::{ApiError, RecruitmentApi};
