//! Domain module
//!
//! Schema model, form values, validation rules, derived durations and
//! submission encoding. Nothing here performs I/O.

pub mod duration;
pub mod events;
pub mod path;
pub mod records;
pub mod roles;
pub mod schema;
pub mod submission;
pub mod validation;
pub mod values;

pub use duration::{age_line, compute_duration, parse_iso_date, sum_durations, Span};
pub use events::FormEvent;
pub use path::{FieldPath, PathSegment};
pub use records::{
    Agency, ApplicationDetail, ApplicationDocument, ApplicationId, ApplicationReceipt, JobPostId,
    JobPostSummary,
};
pub use roles::FieldRole;
pub use schema::{DateFormat, FieldKind, FieldSpec, FieldType, FormSchema};
pub use submission::{encode, MultipartPayload, Part, PartBody};
pub use validation::{build_validation_rules, FieldErrors, FieldRule, RuleSet};
pub use values::{FieldValue, FileBlob, FormValues, Record};
