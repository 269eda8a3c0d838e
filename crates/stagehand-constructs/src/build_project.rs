//! Build projects with compact defaults.

use serde::{Deserialize, Serialize};
use serde_json::json;
use stagehand_core::resource::{BucketRef, BuildProjectRef};
use std::collections::BTreeMap;

/// Image every compact build runs in.
pub const BUILD_IMAGE: &str = "aws/codebuild/amazonlinux2-x86_64-standard:3.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComputeType {
    Small,
    Medium,
    Large,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildEnvironment {
    pub image: String,
    pub compute_type: ComputeType,
    /// Needed to run a container daemon inside the build.
    pub privileged: bool,
}

#[derive(Debug, Clone)]
pub struct BuildProjectProps {
    /// Build specification document handed to the build environment as is.
    pub build_spec: serde_json::Value,
    /// Bucket caching dependency directories between builds.
    pub cache_bucket: Option<BucketRef>,
    pub environment_variables: BTreeMap<String, String>,
}

impl Default for BuildProjectProps {
    fn default() -> Self {
        Self {
            build_spec: default_build_spec(),
            cache_bucket: None,
            environment_variables: BTreeMap::new(),
        }
    }
}

/// A build project limited to one build at a time on small compute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompactBuildProject {
    pub name: String,
    pub build_spec: serde_json::Value,
    pub queued_timeout_minutes: u32,
    pub timeout_minutes: u32,
    pub concurrent_build_limit: u32,
    pub environment: BuildEnvironment,
    pub cache_bucket: Option<BucketRef>,
    pub environment_variables: BTreeMap<String, String>,
}

impl CompactBuildProject {
    pub fn new(name: impl Into<String>, props: BuildProjectProps) -> Self {
        Self {
            name: name.into(),
            build_spec: props.build_spec,
            queued_timeout_minutes: 5,
            timeout_minutes: 10,
            concurrent_build_limit: 1,
            environment: BuildEnvironment {
                image: BUILD_IMAGE.to_string(),
                compute_type: ComputeType::Small,
                privileged: true,
            },
            cache_bucket: props.cache_bucket,
            environment_variables: props.environment_variables,
        }
    }

    pub fn reference(&self) -> BuildProjectRef {
        BuildProjectRef::new(self.name.clone())
    }
}

/// Build specification for a single page application built with npm into
/// `dist`.
pub fn default_build_spec() -> serde_json::Value {
    json!({
        "version": "0.2",
        "phases": {
            "install": {
                "runtime-versions": { "nodejs": "20" }
            },
            "build": {
                "commands": ["npm ci", "npm run build"]
            }
        },
        "artifacts": {
            "files": ["**/*"],
            "base-directory": "dist"
        },
        "cache": {
            "paths": ["/root/.npm/**/*"]
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compact_defaults() {
        let project = CompactBuildProject::new("site-build", BuildProjectProps::default());
        assert_eq!(project.queued_timeout_minutes, 5);
        assert_eq!(project.timeout_minutes, 10);
        assert_eq!(project.concurrent_build_limit, 1);
        assert_eq!(project.environment.compute_type, ComputeType::Small);
        assert!(project.environment.privileged);
        assert!(project.cache_bucket.is_none());
        assert_eq!(project.build_spec["artifacts"]["base-directory"], "dist");
    }

    #[test]
    fn test_props_pass_through() {
        let mut env = BTreeMap::new();
        env.insert("WebhostingBucket".to_string(), "site-hosting".to_string());
        let project = CompactBuildProject::new(
            "site-build",
            BuildProjectProps {
                cache_bucket: Some(BucketRef::new("site-cache")),
                environment_variables: env,
                ..Default::default()
            },
        );
        assert_eq!(project.cache_bucket.as_ref().unwrap().name, "site-cache");
        assert_eq!(project.environment_variables["WebhostingBucket"], "site-hosting");
        assert_eq!(project.reference().name, "site-build");
    }
}
