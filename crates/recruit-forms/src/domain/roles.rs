//! Field roles
//!
//! Behaviour attached to particular schema entries (address mirroring, work
//! history totals, age lines, ...) is keyed by role rather than by literal
//! field name. Backends may tag a field with `"role": "..."`; untagged fields
//! get the role their conventional name implies.

use serde::{Deserialize, Serialize};

use super::schema::FieldKind;

/// Named role of a schema entry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldRole {
    /// Group holding the applicant's permanent address
    PermanentAddress,
    /// Group holding the communication address
    CommunicationAddress,
    /// Checkbox mirroring the permanent address into the communication address
    SameAsPermanent,
    /// Array of employment rows with start/end dates
    WorkHistory,
    /// Start date inside a work history row
    ExperienceStart,
    /// End date inside a work history row
    ExperienceEnd,
    /// Date field that gets an age line
    DateOfBirth,
    /// Phone number (digits only, at least 10)
    Phone,
    /// Passport photo, placed after the main fields
    Photo,
    /// Signature pad, placed after the main fields
    Signature,
    /// Final declaration, placed last
    Declaration,
}

impl FieldRole {
    /// Role implied by a field's conventional name
    pub fn infer(name: &str, kind: &FieldKind) -> Option<Self> {
        let role = match name {
            "permanent_address" => Self::PermanentAddress,
            "communication_address" => Self::CommunicationAddress,
            "same_as_permanent" => Self::SameAsPermanent,
            "work_experience" => Self::WorkHistory,
            "from_date" => Self::ExperienceStart,
            "to_date" => Self::ExperienceEnd,
            "phone" => Self::Phone,
            "photo" => Self::Photo,
            "signature" => Self::Signature,
            "declaration" => Self::Declaration,
            _ if kind.is_date() && names_birth_date(name) => Self::DateOfBirth,
            _ => return None,
        };
        Some(role)
    }

    /// Roles rendered after every other field, in this order
    pub const TRAILING: [FieldRole; 3] = [Self::Photo, Self::Signature, Self::Declaration];
}

fn names_birth_date(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.contains("birth") || lower.contains("dob")
}
