//! Form session
//!
//! [`FormSession`] owns the schema, the compiled rules, the values and the
//! validation state of one form. Every mutation is an explicit call that
//! checks the target's kind, writes the value and recomputes validation for
//! the affected field. Errors are kept for every path but are only meant to
//! be shown once the path has been touched.

use base64::Engine as _;
use chrono::{Datelike, NaiveDate, Utc};
use serde_json::Value;
use std::collections::{BTreeSet, HashSet};

use crate::domain::duration::{self, compute_duration, parse_iso_date, sum_durations, Span};
use crate::domain::events::FormEvent;
use crate::domain::path::{FieldPath, PathSegment};
use crate::domain::records::{ApplicationId, JobPostId};
use crate::domain::roles::FieldRole;
use crate::domain::schema::{FieldKind, FieldSpec, FormSchema};
use crate::domain::submission::{encode, MultipartPayload};
use crate::domain::validation::{build_validation_rules, FieldErrors, RuleSet};
use crate::domain::values::{FieldValue, FileBlob, FormValues, Record};
use crate::error::{FormsError, Result};
use crate::ports::outbound::ApiError;

/// Controller state of one application form
#[derive(Clone, Debug)]
pub struct FormSession {
    schema: FormSchema,
    rules: RuleSet,
    values: FormValues,
    touched: BTreeSet<FieldPath>,
    errors: FieldErrors,
    submitting: bool,
    events: Vec<FormEvent>,
}

impl FormSession {
    pub fn new(schema: FormSchema) -> Self {
        let rules = build_validation_rules(schema.fields());
        let values = FormValues::defaults(&schema);
        let errors = rules.validate(&values);
        Self {
            schema,
            rules,
            values,
            touched: BTreeSet::new(),
            errors,
            submitting: false,
            events: vec![],
        }
    }

    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    pub fn values(&self) -> &FormValues {
        &self.values
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// All current errors, touched or not
    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn is_touched(&self, path: &FieldPath) -> bool {
        self.touched.contains(path)
    }

    /// Error for `path`, only once it has been touched
    pub fn visible_error(&self, path: &FieldPath) -> Option<&str> {
        if !self.is_touched(path) {
            return None;
        }
        self.errors.get(path).map(String::as_str)
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Get and clear accumulated domain events
    pub fn take_events(&mut self) -> Vec<FormEvent> {
        std::mem::take(&mut self.events)
    }

    fn raise_event(&mut self, event: FormEvent) {
        self.events.push(event);
    }

    // =========================================================================
    // Address mirroring
    // =========================================================================

    fn role_field(&self, role: FieldRole) -> Option<&str> {
        self.schema.field_with_role(role).map(|f| f.name.as_str())
    }

    fn mirroring(&self) -> bool {
        self.role_field(FieldRole::SameAsPermanent)
            .and_then(|name| self.values.get(name))
            .and_then(FieldValue::as_bool)
            .unwrap_or(false)
    }

    /// Whether `path` is read-only because the address is mirrored
    pub fn is_disabled(&self, path: &FieldPath) -> bool {
        self.role_field(FieldRole::CommunicationAddress) == Some(path.root()) && self.mirroring()
    }

    /// Copy the permanent address into the communication address
    fn mirror_address(&mut self) {
        let (Some(permanent), Some(communication)) = (
            self.schema.field_with_role(FieldRole::PermanentAddress),
            self.schema.field_with_role(FieldRole::CommunicationAddress),
        ) else {
            return;
        };
        let FieldKind::Group { fields } = &communication.kind else {
            return;
        };
        let source = self.values.get(&permanent.name).and_then(FieldValue::as_record);
        let mirrored: Record = fields
            .iter()
            .map(|sub| {
                let value = FieldValue::merged(sub, source.and_then(|r| r.get(&sub.name)));
                (sub.name.clone(), value)
            })
            .collect();
        let name = communication.name.clone();
        self.values.insert(name, FieldValue::Group(mirrored));
    }

    fn clear_communication_address(&mut self) {
        if let Some(communication) = self.schema.field_with_role(FieldRole::CommunicationAddress) {
            let name = communication.name.clone();
            let value = FieldValue::default_for(&communication.kind);
            self.values.insert(name, value);
        }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    fn spec(&self, path: &FieldPath) -> Result<&FieldSpec> {
        self.schema
            .resolve(path)
            .ok_or_else(|| FormsError::UnknownField(path.to_string()))
    }

    fn writable_spec(&self, path: &FieldPath) -> Result<&FieldSpec> {
        let spec = self.spec(path)?;
        if self.is_disabled(path) {
            return Err(FormsError::FieldDisabled(path.to_string()));
        }
        Ok(spec)
    }

    fn write(&mut self, path: &FieldPath, value: FieldValue) -> Result<()> {
        let slot = self.values.get_path_mut(path).ok_or_else(|| out_of_range(path))?;
        *slot = value;
        if self.mirroring() && self.role_field(FieldRole::PermanentAddress) == Some(path.root()) {
            self.mirror_address();
        }
        self.recompute_validation(path);
        Ok(())
    }

    /// Set a text-like field (text, email, number, textarea, date, signature)
    pub fn set_text(&mut self, path: &FieldPath, text: impl Into<String>) -> Result<()> {
        let spec = self.writable_spec(path)?;
        let holds_text = match spec.kind {
            FieldKind::Text
            | FieldKind::Email
            | FieldKind::Number
            | FieldKind::Textarea
            | FieldKind::Date { .. }
            | FieldKind::MonthYear { .. }
            | FieldKind::Signature => true,
            FieldKind::File { .. }
            | FieldKind::Checkbox
            | FieldKind::Declaration
            | FieldKind::Group { .. }
            | FieldKind::Array { .. } => false,
        };
        if !holds_text {
            return Err(mismatch(path, spec));
        }
        self.write(path, FieldValue::Text(text.into()))
    }

    /// Set a date field; month pickers store the first day of the month
    pub fn set_date(&mut self, path: &FieldPath, date: Option<NaiveDate>) -> Result<()> {
        let spec = self.writable_spec(path)?;
        if !spec.kind.is_date() {
            return Err(mismatch(path, spec));
        }
        let stored = match date {
            Some(date) if spec.kind.is_month_granular() => {
                let first = date.with_day(1).ok_or_else(|| FormsError::InvalidDate(date.to_string()))?;
                first.format("%Y-%m-%d").to_string()
            }
            Some(date) => date.format("%Y-%m-%d").to_string(),
            None => String::new(),
        };
        self.write(path, FieldValue::Text(stored))
    }

    /// Toggle a checkbox or declaration
    pub fn set_checked(&mut self, path: &FieldPath, checked: bool) -> Result<()> {
        let spec = self.writable_spec(path)?;
        if !matches!(spec.kind, FieldKind::Checkbox | FieldKind::Declaration) {
            return Err(mismatch(path, spec));
        }
        let is_switch = path.len() == 1 && spec.role() == Some(FieldRole::SameAsPermanent);
        let slot = self.values.get_path_mut(path).ok_or_else(|| out_of_range(path))?;
        *slot = FieldValue::Bool(checked);

        if is_switch {
            if checked {
                self.mirror_address();
            } else {
                self.clear_communication_address();
            }
            tracing::debug!(enabled = checked, "communication address mirroring toggled");
            self.raise_event(FormEvent::AddressMirrored { enabled: checked });
        }
        self.recompute_validation(path);
        Ok(())
    }

    /// Attach or clear a file
    pub fn set_file(&mut self, path: &FieldPath, blob: Option<FileBlob>) -> Result<()> {
        let spec = self.writable_spec(path)?;
        if !matches!(spec.kind, FieldKind::File { .. }) {
            return Err(mismatch(path, spec));
        }
        let value = match blob {
            Some(blob) => FieldValue::File(blob),
            None => FieldValue::Text(String::new()),
        };
        self.write(path, value)
    }

    /// Store a signature data URI; `None` clears the pad
    pub fn set_signature(&mut self, path: &FieldPath, data_uri: Option<String>) -> Result<()> {
        let spec = self.writable_spec(path)?;
        if !matches!(spec.kind, FieldKind::Signature) {
            return Err(mismatch(path, spec));
        }
        self.write(path, FieldValue::Text(data_uri.unwrap_or_default()))
    }

    /// Store PNG bytes as a `data:image/png;base64,` signature
    pub fn set_signature_png(&mut self, path: &FieldPath, png: &[u8]) -> Result<()> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(png);
        self.set_signature(path, Some(format!("data:image/png;base64,{}", encoded)))
    }

    /// Append a defaulted row; returns its index
    pub fn add_row(&mut self, array: &FieldPath) -> Result<usize> {
        let spec = self.writable_spec(array)?;
        let FieldKind::Array { fields, .. } = &spec.kind else {
            return Err(mismatch(array, spec));
        };
        let row = FieldValue::empty_row(fields);
        let rows = self
            .values
            .get_path_mut(array)
            .and_then(FieldValue::as_rows_mut)
            .ok_or_else(|| FormsError::UnknownField(array.to_string()))?;
        rows.push(row);
        let index = rows.len() - 1;

        self.raise_event(FormEvent::RowAdded { array: array.clone(), index });
        self.recompute_validation(array);
        Ok(index)
    }

    /// Remove row `index`; touched paths of later rows shift down
    pub fn remove_row(&mut self, array: &FieldPath, index: usize) -> Result<()> {
        let spec = self.writable_spec(array)?;
        if !matches!(spec.kind, FieldKind::Array { .. }) {
            return Err(mismatch(array, spec));
        }
        let rows = self
            .values
            .get_path_mut(array)
            .and_then(FieldValue::as_rows_mut)
            .ok_or_else(|| FormsError::UnknownField(array.to_string()))?;
        if index >= rows.len() {
            return Err(FormsError::RowOutOfRange { array: array.to_string(), index });
        }
        rows.remove(index);

        self.touched = std::mem::take(&mut self.touched)
            .into_iter()
            .filter_map(|p| p.reindexed(array, index))
            .collect();
        self.raise_event(FormEvent::RowRemoved { array: array.clone(), index });
        self.recompute_validation(array);
        Ok(())
    }

    /// Mark `path` touched so its error becomes visible
    pub fn blur(&mut self, path: &FieldPath) -> Result<()> {
        self.spec(path)?;
        if self.values.get_path(path).is_none() {
            return Err(out_of_range(path));
        }
        self.touched.insert(path.clone());
        self.recompute_validation(path);
        Ok(())
    }

    // =========================================================================
    // Validation
    // =========================================================================

    /// Recompute errors for the top-level field owning `path`
    pub fn recompute_validation(&mut self, path: &FieldPath) {
        let root = path.root().to_string();
        self.refresh_field(&root);

        let affects_communication = self
            .schema
            .field(&root)
            .and_then(FieldSpec::role)
            .map_or(false, |role| matches!(role, FieldRole::SameAsPermanent | FieldRole::PermanentAddress));
        if affects_communication {
            if let Some(name) = self.role_field(FieldRole::CommunicationAddress).map(str::to_string) {
                self.refresh_field(&name);
            }
        }
    }

    fn refresh_field(&mut self, name: &str) {
        self.errors.retain(|p, _| p.root() != name);
        let fresh = self.rules.validate_field(name, &self.values);
        tracing::trace!(field = name, errors = fresh.len(), "revalidated");
        self.errors.extend(fresh);
    }

    /// Touch every path and validate the whole form; true when valid
    pub fn validate_all(&mut self) -> bool {
        self.touched.extend(self.values.paths(&self.schema));
        self.errors = self.rules.validate(&self.values);
        self.errors.is_empty()
    }

    // =========================================================================
    // Schema hot-swap
    // =========================================================================

    /// Swap in a new schema, keeping answers for fields that survive
    pub fn replace_schema(&mut self, schema: FormSchema) {
        let old: HashSet<&str> = self.schema.fields().iter().map(|f| f.name.as_str()).collect();
        let new: HashSet<&str> = schema.fields().iter().map(|f| f.name.as_str()).collect();
        let retained = new.intersection(&old).count();
        let dropped = old.difference(&new).count();
        let introduced = new.difference(&old).count();

        let values = FormValues::merge_onto_defaults(&schema, &self.values);
        self.rules = build_validation_rules(schema.fields());
        self.values = values;
        self.schema = schema;
        if self.mirroring() {
            self.mirror_address();
        }

        let (schema, values) = (&self.schema, &self.values);
        self.touched
            .retain(|p| schema.resolve(p).is_some() && values.get_path(p).is_some());
        self.errors = self.rules.validate(&self.values);

        tracing::info!(retained, dropped, introduced, "form schema replaced");
        self.raise_event(FormEvent::SchemaReplaced { retained, dropped, introduced });
    }

    /// Load answers from a JSON document
    pub fn fill_from_json(&mut self, answers: &Value) -> Result<()> {
        self.values.fill_from_json(&self.schema, answers)?;
        if self.mirroring() {
            self.mirror_address();
        }
        self.errors = self.rules.validate(&self.values);
        Ok(())
    }

    // =========================================================================
    // Derived values
    // =========================================================================

    /// Age line for a birth date field, empty when no date is set
    pub fn age_line(&self, name: &str, today: NaiveDate) -> String {
        let Some(spec) = self.schema.field(name) else {
            return String::new();
        };
        let birth = self.values.get(name).and_then(FieldValue::as_text).unwrap_or_default();
        let as_on = spec.kind.age_as_on().or(self.schema.as_on_date());
        duration::age_line(birth, as_on, today)
    }

    fn experience_keys(&self, array: &str) -> Option<(String, String)> {
        let children = self.schema.field(array)?.kind.children()?;
        let find = |role| children.iter().find(|f| f.role() == Some(role)).map(|f| f.name.clone());
        Some((find(FieldRole::ExperienceStart)?, find(FieldRole::ExperienceEnd)?))
    }

    /// Duration of one work history row, when both dates are set
    pub fn row_experience(&self, array: &str, row: usize) -> Option<Span> {
        let (start_key, end_key) = self.experience_keys(array)?;
        let row = self.values.get(array)?.as_rows()?.get(row)?;
        let start = parse_iso_date(row.get(&start_key)?.as_text()?)?;
        let end = parse_iso_date(row.get(&end_key)?.as_text()?)?;
        Some(compute_duration(start, end))
    }

    /// Total across all rows with both dates set
    pub fn total_experience(&self, array: &str) -> Option<Span> {
        let (start_key, end_key) = self.experience_keys(array)?;
        let rows = self.values.get(array)?.as_rows()?;
        let text = |row: &Record, key: &str| -> String {
            row.get(key).and_then(FieldValue::as_text).unwrap_or_default().to_string()
        };
        let pairs: Vec<(String, String)> = rows.iter().map(|r| (text(r, &start_key), text(r, &end_key))).collect();
        Some(sum_durations(pairs.iter().map(|(s, e)| (s.as_str(), e.as_str()))))
    }

    // =========================================================================
    // Submission
    // =========================================================================

    /// Validate and encode; the session stays busy until [`finish_submission`](Self::finish_submission)
    pub fn begin_submission(&mut self, job_post: Option<JobPostId>) -> Result<MultipartPayload> {
        if self.submitting {
            return Err(FormsError::SubmissionInProgress);
        }
        if !self.validate_all() {
            return Err(FormsError::Validation(self.errors.clone()));
        }
        let job_post = job_post.ok_or(FormsError::NoJobPostSelected)?;

        self.submitting = true;
        self.raise_event(FormEvent::SubmissionStarted { job_post, started_at: Utc::now() });
        tracing::info!(%job_post, "submitting application");
        Ok(encode(&self.values, &self.schema, job_post))
    }

    /// Clear the busy flag; values are kept whatever the outcome
    pub fn finish_submission(&mut self, outcome: std::result::Result<ApplicationId, &ApiError>) {
        self.submitting = false;
        let now = Utc::now();
        match outcome {
            Ok(application) => {
                tracing::info!(%application, "application submitted");
                self.raise_event(FormEvent::SubmissionSucceeded { application, completed_at: now });
            }
            Err(error) => {
                tracing::warn!(%error, "application submission failed");
                self.raise_event(FormEvent::SubmissionFailed { reason: error.to_string(), failed_at: now });
            }
        }
    }
}

fn mismatch(path: &FieldPath, spec: &FieldSpec) -> FormsError {
    FormsError::KindMismatch { path: path.to_string(), kind: spec.kind.field_type().as_str() }
}

fn out_of_range(path: &FieldPath) -> FormsError {
    let index = path.segments().iter().find_map(|s| match s {
        PathSegment::Index(i) => Some(*i),
        PathSegment::Key(_) => None,
    });
    match index {
        Some(index) => FormsError::RowOutOfRange { array: path.root().to_string(), index },
        None => FormsError::UnknownField(path.to_string()),
    }
}
