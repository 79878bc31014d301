// ABOUTME: Validated project name used to key deployment records.
// ABOUTME: Accepts DNS-label-like names so result URLs stay well-formed.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProjectNameError {
    #[error("project name cannot be empty")]
    Empty,

    #[error("project name exceeds maximum length of 63 characters")]
    TooLong,

    #[error("project name cannot start or end with a separator")]
    BoundarySeparator,

    #[error("invalid character in project name: '{0}'")]
    InvalidChar(char),
}

/// Name under which a deployment is recorded and its result URL is minted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectName(String);

impl ProjectName {
    pub fn new(value: &str) -> Result<Self, ProjectNameError> {
        if value.is_empty() {
            return Err(ProjectNameError::Empty);
        }

        if value.len() > 63 {
            return Err(ProjectNameError::TooLong);
        }

        if value.starts_with(['-', '_', '.']) || value.ends_with(['-', '_', '.']) {
            return Err(ProjectNameError::BoundarySeparator);
        }

        for c in value.chars() {
            if !c.is_ascii_alphanumeric() && c != '-' && c != '_' && c != '.' {
                return Err(ProjectNameError::InvalidChar(c));
            }
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ProjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_typical_names() {
        assert!(ProjectName::new("demo").is_ok());
        assert!(ProjectName::new("my-dapp_v2.1").is_ok());
        assert!(ProjectName::new("Token").is_ok());
    }

    #[test]
    fn rejects_empty() {
        assert!(matches!(ProjectName::new(""), Err(ProjectNameError::Empty)));
    }

    #[test]
    fn rejects_boundary_separators() {
        assert!(matches!(
            ProjectName::new("-demo"),
            Err(ProjectNameError::BoundarySeparator)
        ));
        assert!(matches!(
            ProjectName::new("demo."),
            Err(ProjectNameError::BoundarySeparator)
        ));
    }

    #[test]
    fn rejects_invalid_characters() {
        assert!(matches!(
            ProjectName::new("demo app"),
            Err(ProjectNameError::InvalidChar(' '))
        ));
        assert!(matches!(
            ProjectName::new("demo/app"),
            Err(ProjectNameError::InvalidChar('/'))
        ));
    }

    #[test]
    fn rejects_overlong_names() {
        let long = "a".repeat(64);
        assert!(matches!(
            ProjectName::new(&long),
            Err(ProjectNameError::TooLong)
        ));
    }
}
