//! Single page application served from a bucket behind a distribution.

use serde::Serialize;
use serde_json::json;
use stagehand_core::resource::SourceRepository;
use stagehand_core::{Error, Result};
use stagehand_pipeline::{CompactPipeline, InvalidationOptions, StorageDeployOptions};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::info;

use crate::build_project::{BuildProjectProps, CompactBuildProject};
use crate::distribution::{Distribution, Origin};
use crate::notification::SlackNotificationRule;
use crate::secure_bucket::SecureBucket;
use crate::trigger::RepositoryChangeTriggerRule;

/// Cache lifetime of deployed site files.
pub const SITE_MAX_AGE: Duration = Duration::from_secs(31 * 24 * 60 * 60);

#[derive(Debug, Clone)]
pub struct StaticSiteProps {
    /// Prefix for every resource name.
    pub description: String,
    pub repository: SourceRepository,
    pub branch: Option<String>,
    pub domain_names: Vec<String>,
    pub certificate_arn: Option<String>,
    /// Chat configuration receiving pipeline notifications.
    pub slack_channel_arn: Option<String>,
    /// Replaces the default npm build.
    pub build_spec: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StaticSiteTopology {
    pub hosting_bucket: SecureBucket,
    pub artifacts_bucket: SecureBucket,
    pub cache_bucket: SecureBucket,
    pub distribution: Distribution,
    pub build_project: CompactBuildProject,
    pub pipeline: CompactPipeline,
    pub trigger: Option<RepositoryChangeTriggerRule>,
    pub notifications: Option<SlackNotificationRule>,
}

impl StaticSiteTopology {
    pub fn new(props: StaticSiteProps) -> Result<Self> {
        let description = props.description.trim();
        if description.is_empty() {
            return Err(Error::configuration("topology description must not be empty"));
        }

        let hosting_bucket = SecureBucket::new(format!("{}-webhosting", description));
        let artifacts_bucket = SecureBucket::new(format!("{}-artifacts", description));
        let cache_bucket = SecureBucket::new(format!("{}-build-cache", description));

        let distribution = Distribution::new(
            format!("{}-distribution", description),
            Origin::Bucket {
                bucket: hosting_bucket.reference(),
            },
        )
        .with_domain_names(props.domain_names)
        .with_certificate(props.certificate_arn);

        let mut environment_variables = BTreeMap::new();
        environment_variables.insert("WebhostingBucket".to_string(), hosting_bucket.name.clone());
        let build_project = CompactBuildProject::new(
            format!("{}-build", description),
            BuildProjectProps {
                build_spec: props.build_spec.unwrap_or_else(site_build_spec),
                cache_bucket: Some(cache_bucket.reference()),
                environment_variables,
            },
        );

        let mut builder = CompactPipeline::builder(format!("{}-pipeline", description))
            .source(props.repository.clone())
            .build_project(build_project.reference())
            .artifact_store(artifacts_bucket.reference());
        if let Some(branch) = &props.branch {
            builder = builder.branch(branch.clone());
        }
        let mut pipeline = builder.build()?;

        pipeline.add_deployment_to_storage(
            "deploy-public-assets",
            hosting_bucket.reference(),
            StorageDeployOptions {
                max_age: SITE_MAX_AGE,
                run_order: Some(1),
                ..Default::default()
            },
        )?;
        pipeline.add_cdn_invalidation(
            "invalidate-cloudfront",
            distribution.reference(),
            InvalidationOptions {
                run_order: Some(2),
                ..Default::default()
            },
        )?;

        let trigger = super::change_trigger(
            description,
            &props.repository,
            props.branch.as_deref(),
            &pipeline,
        )?;
        let notifications =
            super::notifications(description, &pipeline, props.slack_channel_arn.as_deref());

        info!(
            topology = "static-site",
            description,
            pipeline = pipeline.name(),
            "assembled topology"
        );

        Ok(Self {
            hosting_bucket,
            artifacts_bucket,
            cache_bucket,
            distribution,
            build_project,
            pipeline,
            trigger,
            notifications,
        })
    }
}

/// npm build into `dist` that empties the hosting bucket before deployment.
fn site_build_spec() -> serde_json::Value {
    json!({
        "version": "0.2",
        "phases": {
            "install": {
                "runtime-versions": { "nodejs": "20" }
            },
            "build": {
                "commands": ["npm ci", "npm run build"]
            },
            "post_build": {
                "commands": ["aws s3 rm s3://$WebhostingBucket --recursive"]
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
