// Identity newtypes

use super::error::{DomainError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a reusable pipeline definition; the unit of mutual exclusion
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PipelineConfigKey(String);

impl PipelineConfigKey {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Validated constructor for keys coming from outside the process
    pub fn parse(s: impl Into<String>) -> Result<Self> {
        let s = s.into();
        if s.trim().is_empty() {
            return Err(DomainError::Validation(
                "pipeline config key cannot be empty".to_string(),
            ));
        }
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PipelineConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PipelineConfigKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for PipelineConfigKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for PipelineConfigKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Identifier of a pipeline execution held by the execution repository
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionId(String);

impl ExecutionId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ExecutionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ExecutionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for ExecutionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rejects_blank_key() {
        assert!(PipelineConfigKey::parse("").is_err());
        assert!(PipelineConfigKey::parse("   ").is_err());
        assert_eq!(
            PipelineConfigKey::parse("deploy-prod").unwrap().as_str(),
            "deploy-prod"
        );
    }

    #[test]
    fn test_key_serializes_as_plain_string() {
        let key = PipelineConfigKey::from("cfg-1");
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"cfg-1\"");
    }
}
