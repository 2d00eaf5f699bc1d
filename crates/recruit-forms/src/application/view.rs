//! Form view
//!
//! [`render`] is a pure function of a [`FormSession`]: it produces an ordered
//! list of blocks describing what to draw. Front ends (the CLI, a web shell)
//! only interpret the view; they never read the schema themselves.

use chrono::NaiveDate;
use serde::Serialize;

use super::session::FormSession;
use crate::domain::path::FieldPath;
use crate::domain::records::{JobPostId, JobPostSummary};
use crate::domain::roles::FieldRole;
use crate::domain::schema::{FieldKind, FieldSpec};
use crate::domain::values::FieldValue;

pub const SUBMIT_LABEL: &str = "Submit Application";
pub const JOB_SELECTOR_LABEL: &str = "Select Job Post";

/// Inputs the session does not own
#[derive(Clone, Copy, Debug)]
pub struct RenderContext<'a> {
    pub job_posts: &'a [JobPostSummary],
    pub selected_job_post: Option<JobPostId>,
    pub today: NaiveDate,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FormView {
    pub blocks: Vec<Block>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "block", rename_all = "snake_case")]
pub enum Block {
    Field(FieldView),
    JobSelector(JobSelectorView),
    Submit { label: String, disabled: bool },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct JobSelectorView {
    pub label: String,
    pub options: Vec<JobOption>,
    pub selected: Option<JobPostId>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct JobOption {
    pub id: JobPostId,
    pub title: String,
}

/// One field, whatever its kind
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FieldView {
    pub path: FieldPath,
    pub label: String,
    pub required: bool,
    pub disabled: bool,
    /// Present only once the path is touched
    pub error: Option<String>,
    pub widget: Widget,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "widget", rename_all = "snake_case")]
pub enum Widget {
    Input {
        input_type: &'static str,
        multiline: bool,
        rows: u8,
        value: String,
    },
    DatePicker {
        views: Vec<&'static str>,
        display_format: &'static str,
        value: String,
        /// Age line beside a birth date
        age: Option<String>,
    },
    File {
        accept: Vec<String>,
        file_name: Option<String>,
    },
    Checkbox {
        checked: bool,
    },
    Declaration {
        checked: bool,
    },
    Signature {
        signed: bool,
    },
    Group {
        fields: Vec<FieldView>,
    },
    Array {
        rows: Vec<RowView>,
        add_label: String,
        total_experience: Option<String>,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RowView {
    pub index: usize,
    pub fields: Vec<FieldView>,
    pub experience: Option<String>,
}

/// Build the view of `session`
pub fn render(session: &FormSession, ctx: &RenderContext<'_>) -> FormView {
    let fields = session.schema().fields();
    let is_trailing = |f: &FieldSpec| f.role().map_or(false, |r| FieldRole::TRAILING.contains(&r));
    let mut blocks = Vec::new();
    // shown once, after the first birth date
    let mut selector_pending = ctx.job_posts.len() > 1;

    for field in fields.iter().filter(|f| !is_trailing(*f)) {
        blocks.push(Block::Field(field_view(session, field, FieldPath::field(&field.name), ctx)));
        if selector_pending && field.role() == Some(FieldRole::DateOfBirth) {
            blocks.push(Block::JobSelector(job_selector(ctx)));
            selector_pending = false;
        }
    }
    for role in FieldRole::TRAILING {
        if let Some(field) = fields.iter().find(|f| f.role() == Some(role)) {
            blocks.push(Block::Field(field_view(session, field, FieldPath::field(&field.name), ctx)));
        }
    }
    blocks.push(Block::Submit { label: SUBMIT_LABEL.to_string(), disabled: session.is_submitting() });

    FormView { blocks }
}

fn job_selector(ctx: &RenderContext<'_>) -> JobSelectorView {
    JobSelectorView {
        label: JOB_SELECTOR_LABEL.to_string(),
        options: ctx
            .job_posts
            .iter()
            .map(|p| JobOption { id: p.id, title: p.title.clone() })
            .collect(),
        selected: ctx.selected_job_post,
    }
}

fn field_view(session: &FormSession, spec: &FieldSpec, path: FieldPath, ctx: &RenderContext<'_>) -> FieldView {
    let value = session.values().get_path(&path);
    let text = value.and_then(FieldValue::as_text).unwrap_or_default().to_string();
    let checked = value.and_then(FieldValue::as_bool).unwrap_or(false);

    let widget = match &spec.kind {
        FieldKind::Text | FieldKind::Email | FieldKind::Number | FieldKind::Textarea => {
            let multiline = matches!(spec.kind, FieldKind::Textarea);
            Widget::Input {
                input_type: match spec.kind {
                    FieldKind::Email => "email",
                    FieldKind::Number => "number",
                    _ => "text",
                },
                multiline,
                rows: if multiline { 4 } else { 1 },
                value: text,
            }
        }
        FieldKind::Date { .. } | FieldKind::MonthYear { .. } => {
            let month = spec.kind.is_month_granular();
            let age = (path.len() == 1 && spec.role() == Some(FieldRole::DateOfBirth))
                .then(|| session.age_line(&spec.name, ctx.today))
                .filter(|line| !line.is_empty());
            Widget::DatePicker {
                views: if month { vec!["year", "month"] } else { vec!["year", "month", "day"] },
                display_format: if month { "MM/yyyy" } else { "dd/MM/yyyy" },
                value: text,
                age,
            }
        }
        FieldKind::File { accept } => Widget::File {
            accept: accept.clone(),
            file_name: value.and_then(FieldValue::as_file).map(|b| b.file_name.clone()),
        },
        FieldKind::Checkbox => Widget::Checkbox { checked },
        FieldKind::Declaration => Widget::Declaration { checked },
        FieldKind::Signature => Widget::Signature { signed: !text.is_empty() },
        FieldKind::Group { fields } => Widget::Group {
            fields: fields
                .iter()
                .map(|sub| field_view(session, sub, path.clone().key(&sub.name), ctx))
                .collect(),
        },
        FieldKind::Array { fields, item_label, .. } => {
            let work_history = path.len() == 1 && spec.role() == Some(FieldRole::WorkHistory);
            let row_count = value.and_then(FieldValue::as_rows).map_or(0, <[_]>::len);
            let rows = (0..row_count)
                .map(|index| RowView {
                    index,
                    fields: fields
                        .iter()
                        .map(|sub| field_view(session, sub, path.clone().index(index).key(&sub.name), ctx))
                        .collect(),
                    experience: work_history
                        .then(|| session.row_experience(&spec.name, index))
                        .flatten()
                        .map(|span| format!("Experience: {}", span.format_full())),
                })
                .collect();
            Widget::Array {
                rows,
                add_label: format!("Add {}", item_label.as_deref().unwrap_or("Item")),
                total_experience: work_history
                    .then(|| session.total_experience(&spec.name))
                    .flatten()
                    .map(|span| format!("Total Experience: {}", span.format_full())),
            }
        }
    };

    FieldView {
        label: spec.label.clone(),
        required: spec.required,
        disabled: session.is_disabled(&path),
        error: session.visible_error(&path).map(str::to_string),
        path,
        widget,
    }
}
