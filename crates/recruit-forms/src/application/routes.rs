//! Navigation targets around the form

use std::fmt;

use crate::domain::records::ApplicationId;

/// Page a user can be sent to
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Route {
    /// Agency landing page
    Landing { agency: String },
    /// Application form of an agency
    Form { agency: String },
    /// Detail view of a submitted application
    ApplicationDetail { id: ApplicationId },
    /// Confirmation after a successful submission
    Success { id: ApplicationId },
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Self::Landing { agency } => format!("/apply/{}", agency),
            Self::Form { agency } => format!("/apply/{}/form", agency),
            Self::ApplicationDetail { id } => format!("/applications/{}", id),
            Self::Success { id } => format!("/success/{}", id),
        }
    }

    /// Inverse of [`path`](Self::path); trailing slashes are ignored
    pub fn parse(path: &str) -> Option<Self> {
        let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
        match segments.as_slice() {
            ["apply", agency] if !agency.is_empty() => Some(Self::Landing { agency: agency.to_string() }),
            ["apply", agency, "form"] if !agency.is_empty() => Some(Self::Form { agency: agency.to_string() }),
            ["applications", id] => id.parse().ok().map(|id| Self::ApplicationDetail { id }),
            ["success", id] => id.parse().ok().map(|id| Self::Success { id }),
            _ => None,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}
