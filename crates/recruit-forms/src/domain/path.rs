//! Field paths
//!
//! A [`FieldPath`] addresses one value inside [`FormValues`](super::values::FormValues):
//! `full_name`, `permanent_address.city`, `work_experience[0].from_date`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::FormsError;

/// One step of a path
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// Path from the form root to a value; always starts with a key
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldPath(Vec<PathSegment>);

impl FieldPath {
    /// Path to a top-level field
    pub fn field(name: impl Into<String>) -> Self {
        Self(vec![PathSegment::Key(name.into())])
    }

    /// Extend with a sub-field key
    pub fn key(mut self, name: impl Into<String>) -> Self {
        self.0.push(PathSegment::Key(name.into()));
        self
    }

    /// Extend with a row index
    pub fn index(mut self, index: usize) -> Self {
        self.0.push(PathSegment::Index(index));
        self
    }

    /// Shorthand for `array[row].sub`
    pub fn cell(array: &str, row: usize, sub: &str) -> Self {
        Self::field(array).index(row).key(sub)
    }

    /// Top-level field name
    pub fn root(&self) -> &str {
        match self.0.first() {
            Some(PathSegment::Key(name)) => name,
            _ => "",
        }
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn starts_with(&self, prefix: &FieldPath) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// Path after removing row `removed` from the array at `array`.
    ///
    /// Paths inside the removed row vanish; paths in later rows shift down.
    pub fn reindexed(&self, array: &FieldPath, removed: usize) -> Option<FieldPath> {
        if !self.starts_with(array) {
            return Some(self.clone());
        }
        match self.0.get(array.len()) {
            Some(PathSegment::Index(i)) if *i == removed => None,
            Some(PathSegment::Index(i)) if *i > removed => {
                let mut segments = self.0.clone();
                segments[array.len()] = PathSegment::Index(i - 1);
                Some(FieldPath(segments))
            }
            _ => Some(self.clone()),
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Key(name) if i == 0 => write!(f, "{}", name)?,
                PathSegment::Key(name) => write!(f, ".{}", name)?,
                PathSegment::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

impl FromStr for FieldPath {
    type Err = FormsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || FormsError::InvalidPath(s.to_string());
        let mut segments = Vec::new();
        let mut rest = s;

        while !rest.is_empty() {
            if let Some(after) = rest.strip_prefix('[') {
                let end = after.find(']').ok_or_else(invalid)?;
                let index = after[..end].parse::<usize>().map_err(|_| invalid())?;
                segments.push(PathSegment::Index(index));
                rest = &after[end + 1..];
                continue;
            }
            let body = if segments.is_empty() {
                rest
            } else {
                rest.strip_prefix('.').ok_or_else(invalid)?
            };
            let end = body.find(['.', '[']).unwrap_or(body.len());
            let key = &body[..end];
            if key.is_empty() || key.contains(']') {
                return Err(invalid());
            }
            segments.push(PathSegment::Key(key.to_string()));
            rest = &body[end..];
        }

        match segments.first() {
            Some(PathSegment::Key(_)) => Ok(FieldPath(segments)),
            _ => Err(invalid()),
        }
    }
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FieldPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        for raw in ["full_name", "permanent_address.city", "work_experience[2].from_date", "documents[0]"] {
            let path: FieldPath = raw.parse().unwrap();
            assert_eq!(path.to_string(), raw);
        }
        let path: FieldPath = "documents[1].file".parse().unwrap();
        assert_eq!(path, FieldPath::cell("documents", 1, "file"));
        assert_eq!(path.root(), "documents");
    }

    #[test]
    fn test_rejects_malformed() {
        for raw in ["", "[0]", "a..b", "a.", "a[x]", "a[1", "a]b", "a[0]b"] {
            assert!(raw.parse::<FieldPath>().is_err(), "{raw} should not parse");
        }
    }

    #[test]
    fn test_reindex_after_row_removal() {
        let array = FieldPath::field("work_experience");
        let before = FieldPath::cell("work_experience", 0, "employer");
        let removed = FieldPath::cell("work_experience", 1, "employer");
        let after = FieldPath::cell("work_experience", 3, "employer");
        let other = FieldPath::field("full_name");

        assert_eq!(before.reindexed(&array, 1), Some(before.clone()));
        assert_eq!(removed.reindexed(&array, 1), None);
        assert_eq!(after.reindexed(&array, 1), Some(FieldPath::cell("work_experience", 2, "employer")));
        assert_eq!(other.reindexed(&array, 1), Some(other.clone()));
        assert_eq!(array.reindexed(&array, 1), Some(array.clone()));
    }

    #[test]
    fn test_serializes_as_string() {
        let path = FieldPath::field("permanent_address").key("pincode");
        assert_eq!(serde_json::to_string(&path).unwrap(), "\"permanent_address.pincode\"");
        let back: FieldPath = serde_json::from_str("\"permanent_address.pincode\"").unwrap();
        assert_eq!(back, path);
    }
}
