//! Multipart submission encoding
//!
//! Files travel as binary parts; everything else goes into a single
//! `form_data` JSON part. Files inside array rows are replaced in the JSON by
//! the name of the part that carries them.

use serde_json::{Map, Value};

use super::records::JobPostId;
use super::schema::{FieldKind, FormSchema};
use super::values::{FieldValue, FileBlob, FormValues, Record};

/// Fields duplicated as standalone parts when present
const ECHOED_FIELDS: [&str; 3] = ["full_name", "email", "phone"];

#[derive(Clone, Debug, PartialEq)]
pub enum PartBody {
    Text(String),
    File(FileBlob),
}

/// Named multipart part
#[derive(Clone, Debug, PartialEq)]
pub struct Part {
    pub name: String,
    pub body: PartBody,
}

/// Ordered multipart body, independent of any HTTP client
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MultipartPayload {
    parts: Vec<Part>,
}

impl MultipartPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_text(&mut self, name: impl Into<String>, text: impl Into<String>) {
        self.parts.push(Part { name: name.into(), body: PartBody::Text(text.into()) });
    }

    pub fn push_file(&mut self, name: impl Into<String>, blob: FileBlob) {
        self.parts.push(Part { name: name.into(), body: PartBody::File(blob) });
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn into_parts(self) -> Vec<Part> {
        self.parts
    }

    /// First text part named `name`
    pub fn text(&self, name: &str) -> Option<&str> {
        self.parts.iter().find(|p| p.name == name).and_then(|p| match &p.body {
            PartBody::Text(s) => Some(s.as_str()),
            PartBody::File(_) => None,
        })
    }

    /// First file part named `name`
    pub fn file(&self, name: &str) -> Option<&FileBlob> {
        self.parts.iter().find(|p| p.name == name).and_then(|p| match &p.body {
            PartBody::File(blob) => Some(blob),
            PartBody::Text(_) => None,
        })
    }

    /// Decoded `form_data` part
    pub fn form_data(&self) -> Option<Value> {
        self.text("form_data").and_then(|s| serde_json::from_str(s).ok())
    }
}

/// Encode form values for `POST applications/`
pub fn encode(values: &FormValues, schema: &FormSchema, job_post: JobPostId) -> MultipartPayload {
    let mut payload = MultipartPayload::new();
    payload.push_text("job_post", job_post.to_string());

    let mut form_data = Map::new();
    for field in schema.fields() {
        let Some(value) = values.get(&field.name) else {
            continue;
        };
        match (&field.kind, value) {
            (_, FieldValue::File(blob)) => payload.push_file(&field.name, blob.clone()),
            (FieldKind::Array { fields, .. }, FieldValue::Rows(rows)) => {
                let file_subs: Vec<&str> = fields
                    .iter()
                    .filter(|f| matches!(f.kind, FieldKind::File { .. }))
                    .map(|f| f.name.as_str())
                    .collect();
                let rows_json = rows
                    .iter()
                    .enumerate()
                    .map(|(i, row)| encode_row(&field.name, i, row, &file_subs, &mut payload))
                    .collect();
                form_data.insert(field.name.clone(), Value::Array(rows_json));
            }
            _ => {
                form_data.insert(field.name.clone(), value.to_json());
            }
        }
    }

    payload.push_text("form_data", Value::Object(form_data.clone()).to_string());

    for name in ECHOED_FIELDS {
        if let Some(Value::String(s)) = form_data.get(name) {
            if !s.is_empty() {
                payload.push_text(name, s.clone());
            }
        }
    }
    payload
}

fn encode_row(array: &str, index: usize, row: &Record, file_subs: &[&str], payload: &mut MultipartPayload) -> Value {
    let mut cells = Map::new();
    for (sub, value) in row {
        let cell = match value {
            FieldValue::File(blob) if file_subs.contains(&sub.as_str()) => {
                let part_name = format!("{}_{}_{}", array, index, sub);
                payload.push_file(part_name.clone(), blob.clone());
                Value::String(part_name)
            }
            other => other.to_json(),
        };
        cells.insert(sub.clone(), cell);
    }
    Value::Object(cells)
}
