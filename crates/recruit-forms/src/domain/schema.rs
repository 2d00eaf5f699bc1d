//! Form schema
//!
//! The schema is a tree: `group` and `array` fields own their child lists.
//! Field types form a closed set, so every dispatch over them is an
//! exhaustive `match` on [`FieldKind`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::duration::parse_iso_date;
use super::path::{FieldPath, PathSegment};
use super::roles::FieldRole;
use crate::error::{FormsError, Result};

/// Wire value of `format` selecting month/year granularity
const MONTH_YEAR_FORMAT: &str = "month-year";

/// Date picker granularity
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateFormat {
    /// Year, month and day
    #[default]
    Day,
    /// Year and month only
    MonthYear,
}

/// Field type plus the extras that only make sense for that type
#[derive(Clone, Debug, PartialEq)]
pub enum FieldKind {
    Text,
    Email,
    Number,
    Textarea,
    Date { format: DateFormat, age_as_on: Option<NaiveDate> },
    MonthYear { age_as_on: Option<NaiveDate> },
    File { accept: Vec<String> },
    Checkbox,
    Declaration,
    Signature,
    Group { fields: Vec<FieldSpec> },
    Array { fields: Vec<FieldSpec>, min_items: usize, item_label: Option<String> },
}

/// Payload-free discriminant of [`FieldKind`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldType {
    Text,
    Email,
    Number,
    Textarea,
    Date,
    MonthYear,
    File,
    Checkbox,
    Declaration,
    Signature,
    Group,
    Array,
}

impl FieldType {
    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Email => "email",
            Self::Number => "number",
            Self::Textarea => "textarea",
            Self::Date => "date",
            Self::MonthYear => "month_year",
            Self::File => "file",
            Self::Checkbox => "checkbox",
            Self::Declaration => "declaration",
            Self::Signature => "signature",
            Self::Group => "group",
            Self::Array => "array",
        }
    }
}

impl FieldKind {
    pub fn field_type(&self) -> FieldType {
        match self {
            Self::Text => FieldType::Text,
            Self::Email => FieldType::Email,
            Self::Number => FieldType::Number,
            Self::Textarea => FieldType::Textarea,
            Self::Date { .. } => FieldType::Date,
            Self::MonthYear { .. } => FieldType::MonthYear,
            Self::File { .. } => FieldType::File,
            Self::Checkbox => FieldType::Checkbox,
            Self::Declaration => FieldType::Declaration,
            Self::Signature => FieldType::Signature,
            Self::Group { .. } => FieldType::Group,
            Self::Array { .. } => FieldType::Array,
        }
    }

    /// Child fields of a group or array
    pub fn children(&self) -> Option<&[FieldSpec]> {
        match self {
            Self::Group { fields } | Self::Array { fields, .. } => Some(fields),
            _ => None,
        }
    }

    pub fn is_date(&self) -> bool {
        matches!(self, Self::Date { .. } | Self::MonthYear { .. })
    }

    /// Whether the picker only resolves year and month
    pub fn is_month_granular(&self) -> bool {
        match self {
            Self::Date { format, .. } => *format == DateFormat::MonthYear,
            Self::MonthYear { .. } => true,
            _ => false,
        }
    }

    /// Per-field reference date for age computation
    pub fn age_as_on(&self) -> Option<NaiveDate> {
        match self {
            Self::Date { age_as_on, .. } | Self::MonthYear { age_as_on } => *age_as_on,
            _ => None,
        }
    }
}

/// One schema entry
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawFieldSpec", into = "RawFieldSpec")]
pub struct FieldSpec {
    pub name: String,
    pub label: String,
    pub required: bool,
    pub kind: FieldKind,
    tagged_role: Option<FieldRole>,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        Self { name: name.into(), label: label.into(), required: false, kind, tagged_role: None }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Attach an explicit role tag
    pub fn with_role(mut self, role: FieldRole) -> Self {
        self.tagged_role = Some(role);
        self
    }

    /// Explicit role tag, or the role implied by the field name
    pub fn role(&self) -> Option<FieldRole> {
        self.tagged_role.or_else(|| FieldRole::infer(&self.name, &self.kind))
    }

    /// Direct child by name
    pub fn child(&self, name: &str) -> Option<&FieldSpec> {
        self.kind.children()?.iter().find(|f| f.name == name)
    }
}

/// Top-level form definition
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawFormSchema", into = "RawFormSchema")]
pub struct FormSchema {
    fields: Vec<FieldSpec>,
    as_on_date: Option<NaiveDate>,
}

impl FormSchema {
    pub fn new(fields: Vec<FieldSpec>, as_on_date: Option<NaiveDate>) -> Result<Self> {
        ensure_unique(&fields, "form")?;
        for field in &fields {
            check_children(field)?;
        }
        Ok(Self { fields, as_on_date })
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| FormsError::Schema(e.to_string()))
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| FormsError::Schema(e.to_string()))
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Schema-level reference date for age computation
    pub fn as_on_date(&self) -> Option<NaiveDate> {
        self.as_on_date
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// First top-level field carrying `role`
    pub fn field_with_role(&self, role: FieldRole) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.role() == Some(role))
    }

    /// Field addressed by `path`; row indices are not bounds-checked here
    pub fn resolve(&self, path: &FieldPath) -> Option<&FieldSpec> {
        let mut segments = path.segments().iter();
        let mut spec = match segments.next()? {
            PathSegment::Key(name) => self.field(name)?,
            PathSegment::Index(_) => return None,
        };
        let mut in_row = false;
        for segment in segments {
            spec = match (segment, &spec.kind) {
                (PathSegment::Index(_), FieldKind::Array { .. }) if !in_row => {
                    in_row = true;
                    continue;
                }
                (PathSegment::Key(name), FieldKind::Array { .. }) if in_row => spec.child(name)?,
                (PathSegment::Key(name), FieldKind::Group { .. }) => spec.child(name)?,
                _ => return None,
            };
            in_row = false;
        }
        (!in_row).then_some(spec)
    }
}

fn ensure_unique(fields: &[FieldSpec], scope: &str) -> Result<()> {
    let mut seen = HashSet::new();
    for field in fields {
        if !seen.insert(field.name.as_str()) {
            return Err(FormsError::Schema(format!(
                "duplicate field name `{}` in {}",
                field.name, scope
            )));
        }
    }
    Ok(())
}

fn check_children(field: &FieldSpec) -> Result<()> {
    match &field.kind {
        FieldKind::Group { fields } | FieldKind::Array { fields, .. } => {
            if fields.is_empty() {
                return Err(FormsError::Schema(format!(
                    "{} field `{}` has no sub-fields",
                    field.kind.field_type().as_str(),
                    field.name
                )));
            }
            ensure_unique(fields, &field.name)
        }
        _ => Ok(()),
    }
}

// =============================================================================
// Wire format
// =============================================================================

#[derive(Clone, Debug, Serialize, Deserialize)]
struct RawFieldSpec {
    name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    label: String,
    #[serde(rename = "type")]
    field_type: String,
    #[serde(default)]
    required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fields: Option<Vec<FieldSpec>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    min_items: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    age_as_on: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    item_label: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    accept: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<FieldRole>,
}

impl TryFrom<RawFieldSpec> for FieldSpec {
    type Error = FormsError;

    fn try_from(raw: RawFieldSpec) -> Result<Self> {
        if raw.name.is_empty() {
            return Err(FormsError::Schema("field without a name".into()));
        }
        let age_as_on = raw.age_as_on.as_deref().and_then(lenient_date);
        let children = raw.fields.unwrap_or_default();
        let is_container = matches!(raw.field_type.as_str(), "group" | "array");
        if !is_container && !children.is_empty() {
            return Err(FormsError::Schema(format!(
                "{} field `{}` cannot have sub-fields",
                raw.field_type, raw.name
            )));
        }

        let kind = match raw.field_type.as_str() {
            "text" => FieldKind::Text,
            "email" => FieldKind::Email,
            "number" => FieldKind::Number,
            "textarea" => FieldKind::Textarea,
            "date" => FieldKind::Date {
                format: match raw.format.as_deref() {
                    Some(MONTH_YEAR_FORMAT) => DateFormat::MonthYear,
                    _ => DateFormat::Day,
                },
                age_as_on,
            },
            "month_year" => FieldKind::MonthYear { age_as_on },
            "file" => FieldKind::File { accept: raw.accept },
            "checkbox" => FieldKind::Checkbox,
            "declaration" => FieldKind::Declaration,
            "signature" => FieldKind::Signature,
            "group" => FieldKind::Group { fields: children },
            "array" => FieldKind::Array {
                fields: children,
                min_items: raw.min_items.unwrap_or(0),
                item_label: raw.item_label,
            },
            other => {
                return Err(FormsError::Schema(format!(
                    "field `{}` has unknown type `{}`",
                    raw.name, other
                )))
            }
        };

        let label = if raw.label.is_empty() { raw.name.clone() } else { raw.label };
        let field = FieldSpec { name: raw.name, label, required: raw.required, kind, tagged_role: raw.role };
        check_children(&field)?;
        Ok(field)
    }
}

fn lenient_date(value: &str) -> Option<NaiveDate> {
    let parsed = parse_iso_date(value);
    if parsed.is_none() && !value.trim().is_empty() {
        tracing::warn!(value, "ignoring unparsable reference date in schema");
    }
    parsed
}

impl From<FieldSpec> for RawFieldSpec {
    fn from(field: FieldSpec) -> Self {
        let field_type = field.kind.field_type().as_str().to_string();
        let mut raw = RawFieldSpec {
            name: field.name,
            label: field.label,
            field_type,
            required: field.required,
            fields: None,
            min_items: None,
            format: None,
            age_as_on: None,
            item_label: None,
            accept: Vec::new(),
            role: field.tagged_role,
        };
        match field.kind {
            FieldKind::Date { format, age_as_on } => {
                if format == DateFormat::MonthYear {
                    raw.format = Some(MONTH_YEAR_FORMAT.into());
                }
                raw.age_as_on = age_as_on.map(|d| d.format("%Y-%m-%d").to_string());
            }
            FieldKind::MonthYear { age_as_on } => {
                raw.age_as_on = age_as_on.map(|d| d.format("%Y-%m-%d").to_string());
            }
            FieldKind::File { accept } => raw.accept = accept,
            FieldKind::Group { fields } => raw.fields = Some(fields),
            FieldKind::Array { fields, min_items, item_label } => {
                raw.fields = Some(fields);
                raw.min_items = Some(min_items);
                raw.item_label = item_label;
            }
            FieldKind::Text
            | FieldKind::Email
            | FieldKind::Number
            | FieldKind::Textarea
            | FieldKind::Checkbox
            | FieldKind::Declaration
            | FieldKind::Signature => {}
        }
        raw
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct RawFormSchema {
    #[serde(default)]
    fields: Vec<FieldSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    as_on_date: Option<String>,
}

impl TryFrom<RawFormSchema> for FormSchema {
    type Error = FormsError;

    fn try_from(raw: RawFormSchema) -> Result<Self> {
        let as_on_date = raw.as_on_date.as_deref().and_then(lenient_date);
        FormSchema::new(raw.fields, as_on_date)
    }
}

impl From<FormSchema> for RawFormSchema {
    fn from(schema: FormSchema) -> Self {
        RawFormSchema {
            fields: schema.fields,
            as_on_date: schema.as_on_date.map(|d| d.format("%Y-%m-%d").to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn application_schema() -> FormSchema {
        FormSchema::from_value(json!({
            "as_on_date": "2024-01-01",
            "fields": [
                {"name": "full_name", "label": "Full Name", "type": "text", "required": true},
                {"name": "date_of_birth", "label": "Date of Birth", "type": "date", "age_as_on": "2023-12-31"},
                {"name": "permanent_address", "label": "Permanent Address", "type": "group", "fields": [
                    {"name": "city", "label": "City", "type": "text", "required": true}
                ]},
                {"name": "work_experience", "label": "Work Experience", "type": "array", "min_items": 1,
                 "item_label": "Experience", "fields": [
                    {"name": "from_date", "label": "From", "type": "month_year"},
                    {"name": "certificate", "label": "Certificate", "type": "file", "accept": [".pdf"]}
                ]}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_parses_nested_schema() {
        let schema = application_schema();
        assert_eq!(schema.fields().len(), 4);
        assert_eq!(schema.as_on_date(), NaiveDate::from_ymd_opt(2024, 1, 1));

        let dob = schema.field("date_of_birth").unwrap();
        assert_eq!(dob.kind.age_as_on(), NaiveDate::from_ymd_opt(2023, 12, 31));
        assert_eq!(dob.role(), Some(FieldRole::DateOfBirth));

        match &schema.field("work_experience").unwrap().kind {
            FieldKind::Array { fields, min_items, item_label } => {
                assert_eq!(fields.len(), 2);
                assert_eq!(*min_items, 1);
                assert_eq!(item_label.as_deref(), Some("Experience"));
            }
            other => panic!("unexpected kind {:?}", other),
        }
    }

    #[test]
    fn test_month_year_format_on_date() {
        let schema = FormSchema::from_value(json!({"fields": [
            {"name": "passing", "label": "Passing", "type": "date", "format": "month-year"}
        ]}))
        .unwrap();
        assert!(schema.fields()[0].kind.is_month_granular());
    }

    #[test]
    fn test_rejects_unknown_type() {
        let err = FormSchema::from_value(json!({"fields": [
            {"name": "x", "label": "X", "type": "slider"}
        ]}))
        .unwrap_err();
        assert!(err.to_string().contains("unknown type"));
    }

    #[test]
    fn test_rejects_empty_group() {
        let err = FormSchema::from_value(json!({"fields": [
            {"name": "addr", "label": "Address", "type": "group", "fields": []}
        ]}));
        assert!(err.is_err());
    }

    #[test]
    fn test_rejects_children_on_leaf() {
        let err = FormSchema::from_value(json!({"fields": [
            {"name": "x", "label": "X", "type": "text", "fields": [{"name": "y", "label": "Y", "type": "text"}]}
        ]}));
        assert!(err.is_err());
    }

    #[test]
    fn test_rejects_duplicate_siblings() {
        let top = FormSchema::from_value(json!({"fields": [
            {"name": "a", "label": "A", "type": "text"},
            {"name": "a", "label": "A", "type": "email"}
        ]}));
        assert!(top.is_err());

        let nested = FormSchema::from_value(json!({"fields": [
            {"name": "g", "label": "G", "type": "group", "fields": [
                {"name": "a", "label": "A", "type": "text"},
                {"name": "a", "label": "A", "type": "text"}
            ]}
        ]}));
        assert!(nested.is_err());
    }

    #[test]
    fn test_explicit_role_wins() {
        let schema = FormSchema::from_value(json!({"fields": [
            {"name": "home", "label": "Home", "type": "group", "role": "permanent_address",
             "fields": [{"name": "city", "label": "City", "type": "text"}]}
        ]}))
        .unwrap();
        assert_eq!(schema.field_with_role(FieldRole::PermanentAddress).unwrap().name, "home");
    }

    #[test]
    fn test_resolve_paths() {
        let schema = application_schema();
        let city: FieldPath = "permanent_address.city".parse().unwrap();
        assert_eq!(schema.resolve(&city).unwrap().label, "City");

        let cell: FieldPath = "work_experience[3].certificate".parse().unwrap();
        assert_eq!(schema.resolve(&cell).unwrap().kind.field_type(), FieldType::File);

        let missing_index: FieldPath = "work_experience.certificate".parse().unwrap();
        assert!(schema.resolve(&missing_index).is_none());
        let dangling: FieldPath = "work_experience[0]".parse().unwrap();
        assert!(schema.resolve(&dangling).is_none());
    }

    #[test]
    fn test_round_trips_wire_shape() {
        let schema = application_schema();
        let value = serde_json::to_value(&schema).unwrap();
        assert_eq!(value["fields"][3]["type"], "array");
        assert_eq!(value["fields"][3]["fields"][1]["accept"], json!([".pdf"]));
        assert_eq!(FormSchema::from_value(value).unwrap(), schema);
    }

    #[test]
    fn test_missing_label_falls_back_to_name() {
        let schema = FormSchema::from_value(json!({"fields": [{"name": "resume", "type": "file"}]})).unwrap();
        assert_eq!(schema.fields()[0].label, "resume");
    }
}
