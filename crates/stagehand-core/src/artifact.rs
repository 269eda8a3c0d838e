//! Artifacts passed between pipeline stages.

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Name of the artifact produced by the pull stage.
pub const SOURCE_ARTIFACT_NAME: &str = "source";
/// Name of the primary artifact produced by the build stage.
pub const BUILD_OUTPUT_ARTIFACT_NAME: &str = "build-output";

/// A named, opaque bundle flowing from the stage that produces it to any
/// stage that consumes it.
///
/// Artifacts are plain values: the producing and consuming actions each hold
/// their own clone and compare by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[display("{_0}")]
#[serde(into = "String", try_from = "String")]
pub struct Artifact(String);

impl TryFrom<String> for Artifact {
    type Error = Error;

    fn try_from(name: String) -> Result<Self> {
        Self::new(name)
    }
}

impl From<Artifact> for String {
    fn from(artifact: Artifact) -> Self {
        artifact.0
    }
}

impl Artifact {
    /// Create an artifact reference. Fails on an empty or blank name.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(Error::configuration("artifact name must not be empty"));
        }
        Ok(Self(name))
    }

    pub(crate) fn named(name: &'static str) -> Self {
        Self(name.to_string())
    }

    /// The artifact produced by the pull stage.
    pub fn source() -> Self {
        Self::named(SOURCE_ARTIFACT_NAME)
    }

    /// The primary artifact produced by the build stage.
    pub fn build_output() -> Self {
        Self::named(BUILD_OUTPUT_ARTIFACT_NAME)
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conventional_names() {
        assert_eq!(Artifact::source().name(), "source");
        assert_eq!(Artifact::build_output().name(), "build-output");
    }

    #[test]
    fn test_blank_name_rejected() {
        assert!(matches!(Artifact::new(""), Err(Error::Configuration(_))));
        assert!(matches!(Artifact::new("  "), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_deserialize_rejects_blank_name() {
        assert!(serde_json::from_str::<Artifact>(r#""""#).is_err());
        assert!(serde_json::from_str::<Artifact>(r#""   ""#).is_err());
        let artifact: Artifact = serde_json::from_str(r#""siteAssets""#).unwrap();
        assert_eq!(artifact.name(), "siteAssets");
    }

    #[test]
    fn test_serializes_as_plain_name() {
        let artifact = Artifact::new("siteAssets").unwrap();
        assert_eq!(serde_json::to_string(&artifact).unwrap(), r#""siteAssets""#);
    }
}
