//! Form values
//!
//! Value shapes mirror the schema tree: one entry per top-level field, groups
//! hold a record of their sub-fields and arrays hold one record per row.

use bytes::Bytes;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use super::path::{FieldPath, PathSegment};
use super::schema::{FieldKind, FieldSpec, FormSchema};
use crate::error::{FormsError, Result};

/// Sub-field values of a group or array row
pub type Record = BTreeMap<String, FieldValue>;

/// Picked file, held in memory until submission
#[derive(Clone, PartialEq, Eq)]
pub struct FileBlob {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl FileBlob {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self { file_name: file_name.into(), content_type: content_type.into(), bytes: bytes.into() }
    }

    /// Read a file from disk, guessing its content type from the extension
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let content_type = content_type_for(&file_name).to_string();
        Ok(Self { file_name, content_type, bytes: Bytes::from(bytes) })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for FileBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileBlob")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// MIME type for a file name
pub fn content_type_for(file_name: &str) -> &'static str {
    let ext = file_name.rsplit_once('.').map(|(_, e)| e.to_ascii_lowercase()).unwrap_or_default();
    match ext.as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => "application/octet-stream",
    }
}

/// Value held by one field
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Text(String),
    Bool(bool),
    File(FileBlob),
    Group(Record),
    Rows(Vec<Record>),
}

impl FieldValue {
    /// Initial value for a field of this kind
    pub fn default_for(kind: &FieldKind) -> Self {
        match kind {
            FieldKind::Checkbox | FieldKind::Declaration => Self::Bool(false),
            FieldKind::Group { fields } => Self::Group(Self::empty_row(fields)),
            FieldKind::Array { fields, .. } => Self::Rows(vec![Self::empty_row(fields)]),
            FieldKind::Text
            | FieldKind::Email
            | FieldKind::Number
            | FieldKind::Textarea
            | FieldKind::Date { .. }
            | FieldKind::MonthYear { .. }
            | FieldKind::File { .. }
            | FieldKind::Signature => Self::Text(String::new()),
        }
    }

    /// Record with every sub-field at its default
    pub fn empty_row(fields: &[FieldSpec]) -> Record {
        fields.iter().map(|f| (f.name.clone(), Self::default_for(&f.kind))).collect()
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_file(&self) -> Option<&FileBlob> {
        match self {
            Self::File(blob) => Some(blob),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Self::Group(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_rows(&self) -> Option<&[Record]> {
        match self {
            Self::Rows(rows) => Some(rows),
            _ => None,
        }
    }

    pub fn as_rows_mut(&mut self) -> Option<&mut Vec<Record>> {
        match self {
            Self::Rows(rows) => Some(rows),
            _ => None,
        }
    }

    /// Empty for presence checks; a picked file is never blank
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Text(s) => s.is_empty(),
            Self::Bool(_) | Self::File(_) => false,
            Self::Group(record) => record.values().all(Self::is_blank),
            Self::Rows(rows) => rows.is_empty(),
        }
    }

    /// Whether this value has the shape `kind` stores
    pub fn conforms_to(&self, kind: &FieldKind) -> bool {
        match (kind, self) {
            (FieldKind::Checkbox | FieldKind::Declaration, Self::Bool(_)) => true,
            (FieldKind::File { .. }, Self::File(_) | Self::Text(_)) => true,
            (FieldKind::Group { .. }, Self::Group(_)) => true,
            (FieldKind::Array { .. }, Self::Rows(_)) => true,
            (
                FieldKind::Text
                | FieldKind::Email
                | FieldKind::Number
                | FieldKind::Textarea
                | FieldKind::Date { .. }
                | FieldKind::MonthYear { .. }
                | FieldKind::Signature,
                Self::Text(_),
            ) => true,
            _ => false,
        }
    }

    /// Value for `spec` after a schema swap, keeping `previous` where it still fits
    pub fn merged(spec: &FieldSpec, previous: Option<&FieldValue>) -> Self {
        let Some(previous) = previous.filter(|v| v.conforms_to(&spec.kind)) else {
            return Self::default_for(&spec.kind);
        };
        match (&spec.kind, previous) {
            (FieldKind::Group { fields }, Self::Group(record)) => Self::Group(merge_record(fields, record)),
            (FieldKind::Array { fields, .. }, Self::Rows(rows)) => {
                Self::Rows(rows.iter().map(|row| merge_record(fields, row)).collect())
            }
            _ => previous.clone(),
        }
    }

    /// JSON rendition; files are represented by their file name
    pub fn to_json(&self) -> Value {
        match self {
            Self::Text(s) => Value::String(s.clone()),
            Self::Bool(b) => Value::Bool(*b),
            Self::File(blob) => Value::String(blob.file_name.clone()),
            Self::Group(record) => record_to_json(record),
            Self::Rows(rows) => Value::Array(rows.iter().map(record_to_json).collect()),
        }
    }

    /// Read a value for `spec` from an answers document
    pub fn from_json(spec: &FieldSpec, value: &Value) -> Result<Self> {
        let mismatch = || FormsError::KindMismatch {
            path: spec.name.clone(),
            kind: spec.kind.field_type().as_str(),
        };
        match &spec.kind {
            FieldKind::Checkbox | FieldKind::Declaration => match value {
                Value::Bool(b) => Ok(Self::Bool(*b)),
                Value::Null => Ok(Self::Bool(false)),
                _ => Err(mismatch()),
            },
            FieldKind::Group { fields } => match value {
                Value::Object(map) => Ok(Self::Group(record_from_json(fields, map)?)),
                _ => Err(mismatch()),
            },
            FieldKind::Array { fields, .. } => match value {
                Value::Array(items) => items
                    .iter()
                    .map(|item| match item {
                        Value::Object(map) => record_from_json(fields, map),
                        _ => Err(mismatch()),
                    })
                    .collect::<Result<Vec<_>>>()
                    .map(Self::Rows),
                _ => Err(mismatch()),
            },
            FieldKind::Text
            | FieldKind::Email
            | FieldKind::Number
            | FieldKind::Textarea
            | FieldKind::Date { .. }
            | FieldKind::MonthYear { .. }
            | FieldKind::File { .. }
            | FieldKind::Signature => match value {
                Value::String(s) => Ok(Self::Text(s.clone())),
                Value::Number(n) => Ok(Self::Text(n.to_string())),
                Value::Null => Ok(Self::Text(String::new())),
                _ => Err(mismatch()),
            },
        }
    }
}

fn merge_record(fields: &[FieldSpec], previous: &Record) -> Record {
    fields
        .iter()
        .map(|f| (f.name.clone(), FieldValue::merged(f, previous.get(&f.name))))
        .collect()
}

fn record_to_json(record: &Record) -> Value {
    Value::Object(record.iter().map(|(k, v)| (k.clone(), v.to_json())).collect())
}

fn record_from_json(fields: &[FieldSpec], map: &Map<String, Value>) -> Result<Record> {
    fields
        .iter()
        .map(|f| {
            let value = match map.get(&f.name) {
                Some(v) => FieldValue::from_json(f, v)?,
                None => FieldValue::default_for(&f.kind),
            };
            Ok((f.name.clone(), value))
        })
        .collect()
}

/// Values for a whole form, keyed by top-level field name
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FormValues(BTreeMap<String, FieldValue>);

impl FormValues {
    /// One default entry per top-level field
    pub fn defaults(schema: &FormSchema) -> Self {
        Self(
            schema
                .fields()
                .iter()
                .map(|f| (f.name.clone(), FieldValue::default_for(&f.kind)))
                .collect(),
        )
    }

    /// Shape of `schema` with `previous` answers carried over where they still fit
    pub fn merge_onto_defaults(schema: &FormSchema, previous: &FormValues) -> Self {
        Self(
            schema
                .fields()
                .iter()
                .map(|f| (f.name.clone(), FieldValue::merged(f, previous.get(&f.name))))
                .collect(),
        )
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.0.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut FieldValue> {
        self.0.get_mut(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) {
        self.0.insert(name.into(), value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get_path(&self, path: &FieldPath) -> Option<&FieldValue> {
        let mut segments = path.segments().iter();
        let mut current = match segments.next()? {
            PathSegment::Key(name) => self.0.get(name)?,
            PathSegment::Index(_) => return None,
        };
        let mut row: Option<&Record> = None;
        for segment in segments {
            match (segment, row.take()) {
                (PathSegment::Index(i), None) => row = Some(current.as_rows()?.get(*i)?),
                (PathSegment::Key(name), Some(record)) => current = record.get(name)?,
                (PathSegment::Key(name), None) => current = current.as_record()?.get(name)?,
                (PathSegment::Index(_), Some(_)) => return None,
            }
        }
        match row {
            Some(_) => None,
            None => Some(current),
        }
    }

    pub fn get_path_mut(&mut self, path: &FieldPath) -> Option<&mut FieldValue> {
        let mut segments = path.segments().iter();
        let mut current = match segments.next()? {
            PathSegment::Key(name) => self.0.get_mut(name)?,
            PathSegment::Index(_) => return None,
        };
        let mut pending_index: Option<usize> = None;
        for segment in segments {
            current = match (segment, pending_index.take()) {
                (PathSegment::Index(i), None) => {
                    pending_index = Some(*i);
                    continue;
                }
                (PathSegment::Key(name), Some(i)) => current.as_rows_mut()?.get_mut(i)?.get_mut(name)?,
                (PathSegment::Key(name), None) => match current {
                    FieldValue::Group(record) => record.get_mut(name)?,
                    _ => return None,
                },
                (PathSegment::Index(_), Some(_)) => return None,
            };
        }
        match pending_index {
            Some(_) => None,
            None => Some(current),
        }
    }

    /// Text at `path`, if it holds text
    pub fn text(&self, path: &FieldPath) -> Option<&str> {
        self.get_path(path)?.as_text()
    }

    /// Every addressable path under `schema`: top-level fields, group
    /// sub-fields, arrays and their cells
    pub fn paths(&self, schema: &FormSchema) -> Vec<FieldPath> {
        let mut paths = Vec::new();
        for field in schema.fields() {
            let root = FieldPath::field(&field.name);
            match &field.kind {
                FieldKind::Group { fields } => {
                    paths.extend(fields.iter().map(|sub| root.clone().key(&sub.name)));
                    paths.push(root);
                }
                FieldKind::Array { fields, .. } => {
                    let rows = self.get(&field.name).and_then(FieldValue::as_rows).map_or(0, <[_]>::len);
                    for i in 0..rows {
                        paths.extend(fields.iter().map(|sub| FieldPath::cell(&field.name, i, &sub.name)));
                    }
                    paths.push(root);
                }
                _ => paths.push(root),
            }
        }
        paths
    }

    /// JSON object of all values; files appear as their file name
    pub fn to_json(&self) -> Value {
        Value::Object(self.0.iter().map(|(k, v)| (k.clone(), v.to_json())).collect())
    }

    /// Overwrite values from an answers document; keys outside the schema are ignored
    pub fn fill_from_json(&mut self, schema: &FormSchema, answers: &Value) -> Result<()> {
        let Value::Object(map) = answers else {
            return Err(FormsError::Schema("answers must be a JSON object".into()));
        };
        for (name, value) in map {
            match schema.field(name) {
                Some(spec) => {
                    self.0.insert(name.clone(), FieldValue::from_json(spec, value)?);
                }
                None => tracing::warn!(field = %name, "ignoring answer for field not in schema"),
            }
        }
        Ok(())
    }
}
