//! Domain Events
//!
//! Events raised by a form session to communicate state changes.

use chrono::{DateTime, Utc};

use super::path::FieldPath;
use super::records::{ApplicationId, JobPostId};

/// Events in the application form bounded context
#[derive(Clone, Debug, PartialEq)]
pub enum FormEvent {
    /// Schema hot-swapped; counts are top-level fields
    SchemaReplaced {
        retained: usize,
        dropped: usize,
        introduced: usize,
    },

    RowAdded {
        array: FieldPath,
        index: usize,
    },

    RowRemoved {
        array: FieldPath,
        index: usize,
    },

    /// Same-as-permanent toggled
    AddressMirrored {
        enabled: bool,
    },

    SubmissionStarted {
        job_post: JobPostId,
        started_at: DateTime<Utc>,
    },

    SubmissionSucceeded {
        application: ApplicationId,
        completed_at: DateTime<Utc>,
    },

    SubmissionFailed {
        reason: String,
        failed_at: DateTime<Utc>,
    },
}
