//! Backend records exchanged with the recruitment API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use super::schema::FormSchema;
use crate::error::Result;

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                s.trim().parse().map(Self)
            }
        }
    };
}

numeric_id!(
    /// Job post identifier
    JobPostId
);
numeric_id!(
    /// Application identifier
    ApplicationId
);

/// Recruiting agency
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Agency {
    #[serde(default)]
    pub id: Option<u64>,
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub instructions: String,
    /// Raw schema shared by every post; `{}` when the agency has none
    #[serde(default)]
    pub default_form_schema: Option<Value>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

impl Agency {
    /// Parsed default schema; `None` when absent, null or without `fields`
    pub fn default_schema(&self) -> Result<Option<FormSchema>> {
        match &self.default_form_schema {
            Some(value @ Value::Object(map)) if map.contains_key("fields") => {
                FormSchema::from_value(value.clone()).map(Some)
            }
            _ => Ok(None),
        }
    }
}

/// Job post as listed for an agency
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JobPostSummary {
    pub id: JobPostId,
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// Response to a successful submission
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApplicationReceipt {
    pub id: ApplicationId,
    #[serde(default)]
    pub custom_application_id: Option<String>,
    #[serde(default)]
    pub agency_code: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Supporting document attached to an application
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApplicationDocument {
    #[serde(default)]
    pub id: Option<u64>,
    pub document_type: String,
    pub file: String,
    #[serde(default)]
    pub uploaded_at: Option<DateTime<Utc>>,
}

/// Submitted application as returned by the detail endpoint
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApplicationDetail {
    pub id: ApplicationId,
    #[serde(default)]
    pub custom_application_id: Option<String>,
    #[serde(default)]
    pub agency_code: Option<String>,
    #[serde(default)]
    pub job_post: Option<JobPostId>,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub form_data: Map<String, Value>,
    #[serde(default)]
    pub photo: Option<String>,
    #[serde(default)]
    pub signature: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub documents: Vec<ApplicationDocument>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl ApplicationDetail {
    /// Form data with display labels derived from the keys, in key order
    pub fn form_data_entries(&self) -> Vec<(String, String)> {
        self.form_data
            .iter()
            .map(|(key, value)| (humanize_key(key), display_value(value)))
            .collect()
    }
}

/// `date_of_birth` -> `Date Of Birth`
pub fn humanize_key(key: &str) -> String {
    key.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(true) => "Yes".to_string(),
        Value::Bool(false) => "No".to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_agency_default_schema() {
        let mut agency: Agency = serde_json::from_value(json!({
            "id": 3, "code": "upsc", "name": "UPSC",
            "default_form_schema": {"fields": [{"name": "full_name", "label": "Full Name", "type": "text"}]}
        }))
        .unwrap();
        assert!(agency.is_active);
        assert_eq!(agency.default_schema().unwrap().unwrap().fields().len(), 1);

        agency.default_form_schema = Some(json!({}));
        assert!(agency.default_schema().unwrap().is_none());
        agency.default_form_schema = None;
        assert!(agency.default_schema().unwrap().is_none());

        agency.default_form_schema = Some(json!({"fields": [{"name": "x", "type": "bogus"}]}));
        assert!(agency.default_schema().is_err());
    }

    #[test]
    fn test_receipt_keeps_extra_fields() {
        let receipt: ApplicationReceipt = serde_json::from_value(json!({
            "id": 41, "custom_application_id": "UPSC-007", "status": "pending"
        }))
        .unwrap();
        assert_eq!(receipt.id, ApplicationId(41));
        assert_eq!(receipt.custom_application_id.as_deref(), Some("UPSC-007"));
        assert_eq!(receipt.extra["status"], "pending");
    }

    #[test]
    fn test_detail_entries_are_humanized() {
        let detail: ApplicationDetail = serde_json::from_value(json!({
            "id": 1,
            "form_data": {"date_of_birth": "1999-02-03", "same_as_permanent": true, "marks": 71},
            "documents": [{"document_type": "photo", "file": "/media/p.png"}]
        }))
        .unwrap();
        assert_eq!(
            detail.form_data_entries(),
            vec![
                ("Date Of Birth".to_string(), "1999-02-03".to_string()),
                ("Marks".to_string(), "71".to_string()),
                ("Same As Permanent".to_string(), "Yes".to_string()),
            ]
        );
        assert_eq!(detail.documents.len(), 1);
    }

    #[test]
    fn test_ids_parse_and_display() {
        assert_eq!(" 12 ".parse::<JobPostId>().unwrap(), JobPostId(12));
        assert!("abc".parse::<ApplicationId>().is_err());
        assert_eq!(ApplicationId(9).to_string(), "9");
    }
}
