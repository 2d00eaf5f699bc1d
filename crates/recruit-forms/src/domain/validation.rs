//! Validation rules compiled from a schema
//!
//! [`build_validation_rules`] turns the top-level field list into a
//! [`RuleSet`]. Each field gets exactly one rule, picked by precedence:
//! email, phone, file, group, array, then plain text. Required-ness is
//! layered on top for leaf fields; a required checkbox must be checked.

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

use super::path::FieldPath;
use super::roles::FieldRole;
use super::schema::{FieldKind, FieldSpec};
use super::values::{FieldValue, FormValues, Record};

/// Error message per offending path
pub type FieldErrors = BTreeMap<FieldPath, String>;

const REQUIRED: &str = "This field is required";
const MUST_BE_CHECKED: &str = "This field must be checked";
const INVALID_EMAIL: &str = "Invalid email address";
const INVALID_PHONE: &str = "Phone number must be at least 10 digits";

const EMAIL_PATTERN: &str = r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$";
const PHONE_PATTERN: &str = r"^[0-9]{10,}$";

fn email_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(EMAIL_PATTERN).ok()).as_ref()
}

fn phone_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(PHONE_PATTERN).ok()).as_ref()
}

/// Communication address sub-fields that become mandatory while the
/// same-as-permanent switch is off; only those the group declares apply
const COMMUNICATION_OVERRIDES: [(&str, &str, Format); 5] = [
    ("address_line_1", "Address Line 1", Format::Plain),
    ("city", "City", Format::Plain),
    ("district", "District", Format::Plain),
    ("state", "State", Format::Plain),
    ("pincode", "Pincode", Format::Number),
];

/// Shape check on a non-empty value
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    /// Any string
    Plain,
    Email,
    Phone,
    /// Parses as a finite number
    Number,
    /// Anything, including file blobs
    Any,
}

/// Presence requirement
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Requirement {
    Optional,
    Present,
    /// Value must be exactly `true`
    Checked,
}

/// Rule for a single scalar value
#[derive(Clone, Debug, PartialEq)]
pub struct LeafRule {
    pub format: Format,
    pub requirement: Requirement,
    required_message: String,
    format_message: String,
}

impl LeafRule {
    fn new(format: Format, requirement: Requirement) -> Self {
        let format_message = match format {
            Format::Email => INVALID_EMAIL,
            Format::Phone => INVALID_PHONE,
            Format::Number | Format::Plain | Format::Any => "",
        };
        let required_message = match requirement {
            Requirement::Checked => MUST_BE_CHECKED,
            Requirement::Present | Requirement::Optional => REQUIRED,
        };
        Self {
            format,
            requirement,
            required_message: required_message.to_string(),
            format_message: format_message.to_string(),
        }
    }

    /// Sub-field rule with label-specific messages
    fn labelled(label: &str, format: Format, requirement: Requirement) -> Self {
        let mut rule = Self::new(format, requirement);
        if requirement == Requirement::Present {
            rule.required_message = format!("{} is required", label);
        }
        if format == Format::Number {
            rule.format_message = format!("{} must be a number", label);
        }
        rule
    }

    /// Error message for `value`, if any
    pub fn check(&self, value: Option<&FieldValue>) -> Option<String> {
        if self.requirement == Requirement::Checked {
            return match value.and_then(FieldValue::as_bool) {
                Some(true) => None,
                _ => Some(self.required_message.clone()),
            };
        }
        let blank = value.map_or(true, FieldValue::is_blank);
        if blank {
            return match self.requirement {
                Requirement::Present => Some(self.required_message.clone()),
                _ => None,
            };
        }
        let text = value.and_then(FieldValue::as_text);
        let valid = match (self.format, text) {
            (Format::Plain | Format::Any, _) => true,
            (_, None) => true,
            (Format::Email, Some(s)) => email_regex().map_or(false, |re| re.is_match(s)),
            (Format::Phone, Some(s)) => phone_regex().map_or(false, |re| re.is_match(s)),
            (Format::Number, Some(s)) => s.parse::<f64>().map_or(false, f64::is_finite),
        };
        (!valid).then(|| self.format_message.clone())
    }
}

/// Rule attached to one top-level field
#[derive(Clone, Debug, PartialEq)]
pub enum FieldRule {
    Leaf(LeafRule),
    Group {
        fields: Vec<(String, LeafRule)>,
        /// Checkbox whose `true` value exempts the whole group
        exempt_when: Option<String>,
    },
    Array {
        fields: Vec<(String, LeafRule)>,
        min_items: usize,
    },
}

impl FieldRule {
    fn check_into(&self, name: &str, values: &FormValues, errors: &mut FieldErrors) {
        let value = values.get(name);
        match self {
            FieldRule::Leaf(rule) => {
                if let Some(message) = rule.check(value) {
                    errors.insert(FieldPath::field(name), message);
                }
            }
            FieldRule::Group { fields, exempt_when } => {
                let exempt = exempt_when
                    .as_deref()
                    .and_then(|switch| values.get(switch))
                    .and_then(FieldValue::as_bool)
                    .unwrap_or(false);
                if exempt {
                    return;
                }
                let record = value.and_then(FieldValue::as_record);
                check_record(fields, record, &FieldPath::field(name), errors);
            }
            FieldRule::Array { fields, min_items } => {
                let rows = value.and_then(FieldValue::as_rows).unwrap_or_default();
                if rows.len() < *min_items {
                    errors.insert(FieldPath::field(name), format!("At least {} item(s) required", min_items));
                }
                for (i, row) in rows.iter().enumerate() {
                    check_record(fields, Some(row), &FieldPath::field(name).index(i), errors);
                }
            }
        }
    }
}

fn check_record(fields: &[(String, LeafRule)], record: Option<&Record>, base: &FieldPath, errors: &mut FieldErrors) {
    for (sub, rule) in fields {
        if let Some(message) = rule.check(record.and_then(|r| r.get(sub))) {
            errors.insert(base.clone().key(sub), message);
        }
    }
}

/// Compiled rules for a whole form
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RuleSet {
    rules: Vec<(String, FieldRule)>,
}

impl RuleSet {
    pub fn rule(&self, name: &str) -> Option<&FieldRule> {
        self.rules.iter().find(|(n, _)| n == name).map(|(_, r)| r)
    }

    /// Every error in the form
    pub fn validate(&self, values: &FormValues) -> FieldErrors {
        let mut errors = FieldErrors::new();
        for (name, rule) in &self.rules {
            rule.check_into(name, values, &mut errors);
        }
        errors
    }

    /// Errors under one top-level field
    pub fn validate_field(&self, name: &str, values: &FormValues) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if let Some(rule) = self.rule(name) {
            rule.check_into(name, values, &mut errors);
        }
        errors
    }
}

/// Compile the top-level fields of a schema into a [`RuleSet`]
pub fn build_validation_rules(fields: &[FieldSpec]) -> RuleSet {
    let same_as_permanent = fields
        .iter()
        .find(|f| f.role() == Some(FieldRole::SameAsPermanent))
        .map(|f| f.name.as_str());

    let rules = fields
        .iter()
        .map(|field| (field.name.clone(), field_rule(field, same_as_permanent)))
        .collect();
    RuleSet { rules }
}

fn field_rule(field: &FieldSpec, same_as_permanent: Option<&str>) -> FieldRule {
    let format = match &field.kind {
        FieldKind::Email => Format::Email,
        _ if field.role() == Some(FieldRole::Phone) => Format::Phone,
        FieldKind::File { .. } => Format::Any,
        FieldKind::Group { fields } => return group_rule(field, fields, same_as_permanent),
        FieldKind::Array { fields, min_items, .. } => {
            let fields = fields
                .iter()
                .map(|sub| {
                    let format = if matches!(sub.kind, FieldKind::File { .. }) { Format::Any } else { Format::Plain };
                    (sub.name.clone(), LeafRule::new(format, presence(sub.required)))
                })
                .collect();
            return FieldRule::Array { fields, min_items: *min_items };
        }
        FieldKind::Text
        | FieldKind::Number
        | FieldKind::Textarea
        | FieldKind::Date { .. }
        | FieldKind::MonthYear { .. }
        | FieldKind::Checkbox
        | FieldKind::Declaration
        | FieldKind::Signature => Format::Plain,
    };

    let requirement = match (&field.kind, field.required) {
        (FieldKind::Checkbox | FieldKind::Declaration, true) => Requirement::Checked,
        (_, required) => presence(required),
    };
    FieldRule::Leaf(LeafRule::new(format, requirement))
}

fn group_rule(field: &FieldSpec, subs: &[FieldSpec], same_as_permanent: Option<&str>) -> FieldRule {
    let mut fields: Vec<(String, LeafRule)> = subs
        .iter()
        .map(|sub| {
            let format = match sub.kind {
                FieldKind::Number => Format::Number,
                _ => Format::Plain,
            };
            let requirement = match (&sub.kind, sub.required) {
                (FieldKind::Checkbox | FieldKind::Declaration, true) => Requirement::Checked,
                (_, required) => presence(required),
            };
            (sub.name.clone(), LeafRule::labelled(&sub.label, format, requirement))
        })
        .collect();

    let switch = match same_as_permanent {
        Some(switch) if field.role() == Some(FieldRole::CommunicationAddress) => switch,
        _ => return FieldRule::Group { fields, exempt_when: None },
    };

    for (name, label, format) in COMMUNICATION_OVERRIDES {
        if let Some((_, existing)) = fields.iter_mut().find(|(n, _)| n == name) {
            *existing = LeafRule::labelled(label, format, Requirement::Present);
        }
    }
    FieldRule::Group { fields, exempt_when: Some(switch.to_string()) }
}

fn presence(required: bool) -> Requirement {
    if required {
        Requirement::Present
    } else {
        Requirement::Optional
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::schema::FormSchema;
    use crate::domain::values::FileBlob;
    use serde_json::json;

    fn schema() -> FormSchema {
        FormSchema::from_value(json!({"fields": [
            {"name": "full_name", "label": "Full Name", "type": "text", "required": true},
            {"name": "email", "label": "Email", "type": "email", "required": true},
            {"name": "alt_email", "label": "Alternate Email", "type": "email"},
            {"name": "phone", "label": "Phone", "type": "text"},
            {"name": "resume", "label": "Resume", "type": "file", "required": true},
            {"name": "same_as_permanent", "label": "Same as permanent", "type": "checkbox"},
            {"name": "communication_address", "label": "Communication Address", "type": "group", "fields": [
                {"name": "address_line_1", "label": "Line 1", "type": "text"},
                {"name": "city", "label": "City", "type": "text"},
                {"name": "district", "label": "District", "type": "text"},
                {"name": "state", "label": "State", "type": "text"},
                {"name": "pincode", "label": "PIN", "type": "number"},
                {"name": "landmark", "label": "Landmark", "type": "text"}
            ]},
            {"name": "education", "label": "Education", "type": "group", "fields": [
                {"name": "degree", "label": "Degree", "type": "text", "required": true},
                {"name": "year", "label": "Year", "type": "number"}
            ]},
            {"name": "documents", "label": "Documents", "type": "array", "min_items": 2, "fields": [
                {"name": "title", "label": "Title", "type": "text", "required": true},
                {"name": "file", "label": "File", "type": "file", "required": true}
            ]},
            {"name": "declaration", "label": "I declare", "type": "declaration", "required": true},
            {"name": "terms", "label": "Terms", "type": "checkbox", "required": true}
        ]}))
        .unwrap()
    }

    fn set(values: &mut FormValues, path: &str, value: FieldValue) {
        *values.get_path_mut(&path.parse().unwrap()).unwrap() = value;
    }

    fn text(s: &str) -> FieldValue {
        FieldValue::Text(s.to_string())
    }

    fn error<'a>(errors: &'a FieldErrors, path: &str) -> Option<&'a str> {
        errors.get(&path.parse::<FieldPath>().unwrap()).map(String::as_str)
    }

    #[test]
    fn test_required_text_fields() {
        let schema = schema();
        let rules = build_validation_rules(schema.fields());
        let mut values = FormValues::defaults(&schema);

        let errors = rules.validate(&values);
        assert_eq!(error(&errors, "full_name"), Some("This field is required"));
        assert_eq!(error(&errors, "email"), Some("This field is required"));

        // only the empty string counts as missing
        set(&mut values, "full_name", text("   "));
        assert!(rules.validate_field("full_name", &values).is_empty());
        set(&mut values, "full_name", text("Meera"));
        assert!(rules.validate_field("full_name", &values).is_empty());
    }

    #[test]
    fn test_email_and_phone_formats() {
        let schema = schema();
        let rules = build_validation_rules(schema.fields());
        let mut values = FormValues::defaults(&schema);

        // empty optional values skip format checks
        assert!(rules.validate_field("alt_email", &values).is_empty());
        assert!(rules.validate_field("phone", &values).is_empty());

        set(&mut values, "alt_email", text("not-an-email"));
        set(&mut values, "phone", text("98765"));
        let errors = rules.validate(&values);
        assert_eq!(error(&errors, "alt_email"), Some("Invalid email address"));
        assert_eq!(error(&errors, "phone"), Some("Phone number must be at least 10 digits"));

        set(&mut values, "alt_email", text("meera@example.co.in"));
        set(&mut values, "phone", text("98765432101"));
        let errors = rules.validate(&values);
        assert_eq!(error(&errors, "alt_email"), None);
        assert_eq!(error(&errors, "phone"), None);

        set(&mut values, "phone", text("98765-43210"));
        assert!(!rules.validate_field("phone", &values).is_empty());

        // formats see the value as typed
        set(&mut values, "phone", text(" 9876543210"));
        assert!(!rules.validate_field("phone", &values).is_empty());
        set(&mut values, "alt_email", text("meera@example.co.in "));
        assert!(!rules.validate_field("alt_email", &values).is_empty());
    }

    #[test]
    fn test_required_file_accepts_blob() {
        let schema = schema();
        let rules = build_validation_rules(schema.fields());
        let mut values = FormValues::defaults(&schema);
        assert!(!rules.validate_field("resume", &values).is_empty());
        set(&mut values, "resume", FieldValue::File(FileBlob::new("cv.pdf", "application/pdf", Vec::new())));
        assert!(rules.validate_field("resume", &values).is_empty());
    }

    #[test]
    fn test_required_checkboxes_must_be_checked() {
        let schema = schema();
        let rules = build_validation_rules(schema.fields());
        let mut values = FormValues::defaults(&schema);

        let errors = rules.validate(&values);
        assert_eq!(error(&errors, "terms"), Some("This field must be checked"));
        assert_eq!(error(&errors, "declaration"), Some("This field must be checked"));

        set(&mut values, "terms", FieldValue::Bool(true));
        set(&mut values, "declaration", FieldValue::Bool(true));
        let errors = rules.validate(&values);
        assert_eq!(error(&errors, "terms"), None);
        assert_eq!(error(&errors, "declaration"), None);
    }

    #[test]
    fn test_group_sub_field_messages() {
        let schema = schema();
        let rules = build_validation_rules(schema.fields());
        let mut values = FormValues::defaults(&schema);
        set(&mut values, "education.year", text("twenty"));

        let errors = rules.validate_field("education", &values);
        assert_eq!(error(&errors, "education.degree"), Some("Degree is required"));
        assert_eq!(error(&errors, "education.year"), Some("Year must be a number"));

        set(&mut values, "education.degree", text("B.Sc"));
        set(&mut values, "education.year", text("2019"));
        assert!(rules.validate_field("education", &values).is_empty());
    }

    #[test]
    fn test_communication_address_follows_same_as_permanent() {
        let schema = schema();
        let rules = build_validation_rules(schema.fields());
        let mut values = FormValues::defaults(&schema);

        let errors = rules.validate_field("communication_address", &values);
        assert_eq!(error(&errors, "communication_address.address_line_1"), Some("Address Line 1 is required"));
        assert_eq!(error(&errors, "communication_address.city"), Some("City is required"));
        assert_eq!(error(&errors, "communication_address.district"), Some("District is required"));
        assert_eq!(error(&errors, "communication_address.state"), Some("State is required"));
        assert_eq!(error(&errors, "communication_address.pincode"), Some("Pincode is required"));
        assert_eq!(error(&errors, "communication_address.landmark"), None);

        set(&mut values, "communication_address.pincode", text("68a"));
        let errors = rules.validate_field("communication_address", &values);
        assert_eq!(error(&errors, "communication_address.pincode"), Some("Pincode must be a number"));

        set(&mut values, "same_as_permanent", FieldValue::Bool(true));
        assert!(rules.validate_field("communication_address", &values).is_empty());
    }

    #[test]
    fn test_communication_address_without_switch_is_a_plain_group() {
        let schema = FormSchema::from_value(json!({"fields": [
            {"name": "communication_address", "label": "Communication Address", "type": "group", "fields": [
                {"name": "city", "label": "City", "type": "text"}
            ]}
        ]}))
        .unwrap();
        let rules = build_validation_rules(schema.fields());
        assert_eq!(
            rules.rule("communication_address"),
            Some(&FieldRule::Group {
                fields: vec![("city".to_string(), LeafRule::new(Format::Plain, Requirement::Optional))],
                exempt_when: None,
            })
        );
        assert!(rules.validate(&FormValues::defaults(&schema)).is_empty());
    }

    #[test]
    fn test_communication_overrides_skip_undeclared_sub_fields() {
        let schema = FormSchema::from_value(json!({"fields": [
            {"name": "same_as_permanent", "label": "Same", "type": "checkbox"},
            {"name": "communication_address", "label": "Communication Address", "type": "group", "fields": [
                {"name": "city", "label": "City", "type": "text"}
            ]}
        ]}))
        .unwrap();
        let rules = build_validation_rules(schema.fields());
        let mut values = FormValues::defaults(&schema);

        let errors = rules.validate(&values);
        assert_eq!(errors.len(), 1);
        assert_eq!(error(&errors, "communication_address.city"), Some("City is required"));

        set(&mut values, "communication_address.city", text("Pune"));
        assert!(rules.validate(&values).is_empty());
    }

    #[test]
    fn test_array_min_items_and_cells() {
        let schema = schema();
        let rules = build_validation_rules(schema.fields());
        let mut values = FormValues::defaults(&schema);
        set(&mut values, "documents[0].title", text("Degree"));

        let errors = rules.validate_field("documents", &values);
        assert_eq!(error(&errors, "documents"), Some("At least 2 item(s) required"));
        assert_eq!(error(&errors, "documents[0].file"), Some("This field is required"));
        assert_eq!(error(&errors, "documents[0].title"), None);

        let blob = FieldValue::File(FileBlob::new("d.pdf", "application/pdf", Vec::new()));
        let mut row = Record::new();
        row.insert("title".into(), text("Marksheet"));
        row.insert("file".into(), blob.clone());
        values.get_mut("documents").unwrap().as_rows_mut().unwrap().push(row);
        set(&mut values, "documents[0].file", blob);
        assert!(rules.validate_field("documents", &values).is_empty());
    }

    #[test]
    fn test_optional_fields_pass_when_empty() {
        let schema = FormSchema::from_value(json!({"fields": [
            {"name": "notes", "label": "Notes", "type": "textarea"},
            {"name": "newsletter", "label": "Newsletter", "type": "checkbox"},
            {"name": "dob", "label": "DOB", "type": "date"}
        ]}))
        .unwrap();
        let rules = build_validation_rules(schema.fields());
        assert!(rules.validate(&FormValues::defaults(&schema)).is_empty());
    }

    #[test]
    fn test_required_ignored_on_containers() {
        let schema = FormSchema::from_value(json!({"fields": [
            {"name": "refs", "label": "Refs", "type": "array", "required": true, "fields": [
                {"name": "name", "label": "Name", "type": "text"}
            ]},
            {"name": "extra", "label": "Extra", "type": "group", "required": true, "fields": [
                {"name": "a", "label": "A", "type": "text"}
            ]}
        ]}))
        .unwrap();
        let rules = build_validation_rules(schema.fields());
        assert!(rules.validate(&FormValues::defaults(&schema)).is_empty());
    }
}
