//! Start a pipeline when its repository branch changes.

use serde::{Deserialize, Serialize};
use serde_json::json;
use stagehand_core::resource::{DEFAULT_BRANCH, SourceRepository};
use stagehand_core::{Error, Result};

/// Event rule matching reference creations and updates on one CodeCommit
/// branch, targeting a pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryChangeTriggerRule {
    pub name: String,
    pub enabled: bool,
    pub description: String,
    /// Pipeline started when the pattern matches.
    pub target_pipeline: String,
    pub event_pattern: serde_json::Value,
}

impl RepositoryChangeTriggerRule {
    /// Only CodeCommit repositories publish change events; other providers
    /// are rejected.
    pub fn new(
        name: impl Into<String>,
        repository: &SourceRepository,
        branch: Option<&str>,
        pipeline_name: impl Into<String>,
    ) -> Result<Self> {
        let repository_name = match repository {
            SourceRepository::CodeCommit { name } => name,
            SourceRepository::GitHub { .. } => {
                return Err(Error::configuration(format!(
                    "repository '{}' does not publish change events",
                    repository.identifier()
                )));
            }
        };

        Ok(Self {
            name: name.into(),
            enabled: true,
            description: "Triggers when changes occur on the codecommit repository".to_string(),
            target_pipeline: pipeline_name.into(),
            event_pattern: json!({
                "source": ["aws.codecommit"],
                "detail-type": ["CodeCommit Repository State Change"],
                "resources": [repository_name],
                "detail": {
                    "event": ["referenceCreated", "referenceUpdated"],
                    "referenceType": ["branch"],
                    "referenceName": [branch.unwrap_or(DEFAULT_BRANCH)]
                }
            }),
        })
    }
}
