//! Server-rendered application on a function behind an HTTP API, with its
//! static assets served from a bucket.

use serde::Serialize;
use serde_json::{Map, Value, json};
use stagehand_core::artifact::BUILD_OUTPUT_ARTIFACT_NAME;
use stagehand_core::function::{FunctionCode, FunctionSpec, Runtime};
use stagehand_core::resource::{FunctionRef, SourceRepository};
use stagehand_core::{Artifact, Error, Result};
use stagehand_pipeline::{
    CompactPipeline, DeployOptions, InvalidationOptions, StorageDeployOptions,
};
use std::collections::BTreeMap;
use tracing::info;

use crate::build_project::{BuildProjectProps, CompactBuildProject};
use crate::distribution::{Distribution, Origin};
use crate::notification::SlackNotificationRule;
use crate::secure_bucket::SecureBucket;
use crate::trigger::RepositoryChangeTriggerRule;

use super::static_site::SITE_MAX_AGE;

/// Artifact carrying the static assets split out of the build output.
pub const SITE_ASSETS_ARTIFACT_NAME: &str = "siteAssets";

/// Stage name of the HTTP API, also the path prefix the distribution adds.
pub const API_STAGE_NAME: &str = "prod";

#[derive(Debug, Clone)]
pub struct ServerAppProps {
    /// Prefix for every resource name.
    pub description: String,
    pub repository: SourceRepository,
    pub branch: Option<String>,
    /// Entry point of the application function.
    pub handler: String,
    pub domain_names: Vec<String>,
    pub certificate_arn: Option<String>,
    /// Chat configuration receiving pipeline notifications.
    pub slack_channel_arn: Option<String>,
    /// Replaces the default .NET build.
    pub build_spec: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointType {
    Regional,
    Edge,
}

/// HTTP API proxying every request to one function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HttpApi {
    pub name: String,
    pub handler: FunctionRef,
    pub endpoint_type: EndpointType,
    pub stage_name: String,
    pub binary_media_types: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServerAppTopology {
    pub static_assets_bucket: SecureBucket,
    pub artifacts_bucket: SecureBucket,
    pub cache_bucket: SecureBucket,
    pub function: FunctionSpec,
    pub api: HttpApi,
    pub distribution: Distribution,
    pub build_project: CompactBuildProject,
    pub pipeline: CompactPipeline,
    pub trigger: Option<RepositoryChangeTriggerRule>,
    pub notifications: Option<SlackNotificationRule>,
}

impl ServerAppTopology {
    pub fn new(props: ServerAppProps) -> Result<Self> {
        let description = props.description.trim();
        if description.is_empty() {
            return Err(Error::configuration("topology description must not be empty"));
        }
        if props.handler.trim().is_empty() {
            return Err(Error::configuration("server app handler must not be empty"));
        }

        let static_assets_bucket = SecureBucket::new(format!("{}-static-assets", description));
        let artifacts_bucket = SecureBucket::new(format!("{}-artifacts", description));
        let cache_bucket = SecureBucket::new(format!("{}-build-cache", description));

        let function = FunctionSpec {
            name: format!("{}-app", description),
            handler: props.handler.clone(),
            runtime: Runtime::Dotnet8,
            code: FunctionCode::Asset {
                path: "./dist".to_string(),
            },
            timeout_seconds: 10,
            memory_mb: Some(2048),
            reserved_concurrency: Some(2),
            log_retention_days: Some(1),
            destroy_log_group: false,
        };

        let api = HttpApi {
            name: format!("{}-api", description),
            handler: function.reference(),
            endpoint_type: EndpointType::Regional,
            stage_name: API_STAGE_NAME.to_string(),
            binary_media_types: vec!["*/*".to_string()],
        };

        let mut distribution = Distribution::new(
            format!("{}-distribution", description),
            Origin::Http {
                domain: api.name.clone(),
                path: Some(format!("/{}", API_STAGE_NAME)),
            },
        )
        .with_domain_names(props.domain_names)
        .with_certificate(props.certificate_arn);
        distribution.add_behavior(
            "assets/*",
            Origin::Bucket {
                bucket: static_assets_bucket.reference(),
            },
        );

        let mut environment_variables = BTreeMap::new();
        environment_variables.insert(
            "StaticAssetsBucket".to_string(),
            static_assets_bucket.name.clone(),
        );
        let build_project = CompactBuildProject::new(
            format!("{}-build", description),
            BuildProjectProps {
                build_spec: props.build_spec.unwrap_or_else(app_build_spec),
                cache_bucket: Some(cache_bucket.reference()),
                environment_variables,
            },
        );

        let mut builder = CompactPipeline::builder(format!("{}-pipeline", description))
            .source(props.repository.clone())
            .build_project(build_project.reference())
            .artifact_store(artifacts_bucket.reference())
            .additional_output(SITE_ASSETS_ARTIFACT_NAME);
        if let Some(branch) = &props.branch {
            builder = builder.branch(branch.clone());
        }
        let mut pipeline = builder.build()?;

        pipeline.add_deployment_to_storage(
            "deploy-public-assets",
            static_assets_bucket.reference(),
            StorageDeployOptions {
                input: Some(Artifact::new(SITE_ASSETS_ARTIFACT_NAME)?),
                max_age: SITE_MAX_AGE,
                run_order: Some(1),
                ..Default::default()
            },
        )?;
        pipeline.add_deployment_to_compute(
            "deploy-mvc-lambda",
            function.reference(),
            DeployOptions {
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
            topology = "server-app",
            description,
            pipeline = pipeline.name(),
            "assembled topology"
        );

        Ok(Self {
            static_assets_bucket,
            artifacts_bucket,
            cache_bucket,
            function,
            api,
            distribution,
            build_project,
            pipeline,
            trigger,
            notifications,
        })
    }
}

/// .NET publish producing two secondary artifacts: the application under the
/// build output name and `wwwroot` under the site assets name.
fn app_build_spec() -> Value {
    let mut secondary = Map::new();
    secondary.insert(
        BUILD_OUTPUT_ARTIFACT_NAME.to_string(),
        json!({ "files": ["**/*"], "base-directory": "dist" }),
    );
    secondary.insert(
        SITE_ASSETS_ARTIFACT_NAME.to_string(),
        json!({ "files": ["**/*"], "base-directory": "distAssets" }),
    );

    json!({
        "version": "0.2",
        "phases": {
            "install": {
                "runtime-versions": { "dotnet": "8.0" }
            },
            "build": {
                "commands": [
                    "dotnet restore",
                    "dotnet test",
                    "dotnet publish -c release -o ./dist -r linux-x64 --no-self-contained"
                ]
            },
            "post_build": {
                "commands": [
                    "cp -r dist/wwwroot distAssets",
                    "rm -rf dist/wwwroot",
                    "aws s3 rm s3://$StaticAssetsBucket --recursive"
                ]
            }
        },
        "artifacts": {
            "secondary-artifacts": Value::Object(secondary)
        },
        "cache": {
            "paths": ["/root/.nuget/**/*"]
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use stagehand_core::pipeline::{ActionKind, BUILD_STAGE_NAME};

    fn make_props() -> ServerAppProps {
        ServerAppProps {
            description: "shop".to_string(),
            repository: SourceRepository::codecommit("shop"),
            branch: None,
            handler: "Shop::Shop.LambdaEntryPoint::FunctionHandlerAsync".to_string(),
            domain_names: Vec::new(),
            certificate_arn: None,
            slack_channel_arn: Some("arn:slack".to_string()),
            build_spec: None,
        }
    }

    #[test]
    fn test_assembles_server_app() {
        let topology = ServerAppTopology::new(make_props()).unwrap();
        let pipeline = &topology.pipeline;

        let build = &pipeline.stage(BUILD_STAGE_NAME).unwrap().actions[0];
        let outputs: Vec<_> = build.outputs.iter().map(|a| a.name()).collect();
        assert_eq!(outputs, vec!["siteAssets", "build-output"]);

        let deploy = pipeline.deploy_stage().unwrap();
        let names: Vec<_> = deploy.actions.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "deploy-public-assets",
                "deploy-mvc-lambda-update-code",
                "deploy-mvc-lambda",
                "invalidate-cloudfront",
            ]
        );
        assert_eq!(deploy.actions[0].inputs[0].name(), "siteAssets");
        assert!(matches!(
            &deploy.actions[1].kind,
            ActionKind::UpdateFunctionCode { function, .. } if function.name == "shop-app"
        ));
        assert_eq!(pipeline.companions().len(), 2);
        assert_eq!(pipeline.stages().len(), 3);
    }

    #[test]
    fn test_distribution_routes_assets_to_bucket() {
        let topology = ServerAppTopology::new(make_props()).unwrap();
        let behavior = &topology.distribution.additional_behaviors[0];
        assert_eq!(behavior.path_pattern.as_deref(), Some("assets/*"));
        assert!(matches!(
            &behavior.origin,
            Origin::Bucket { bucket } if bucket.name == "shop-static-assets"
        ));
        assert!(matches!(
            &topology.distribution.default_behavior.origin,
            Origin::Http { path: Some(path), .. } if path == "/prod"
        ));
    }

    #[test]
    fn test_build_spec_names_secondary_artifacts() {
        let topology = ServerAppTopology::new(make_props()).unwrap();
        let secondary = &topology.build_project.build_spec["artifacts"]["secondary-artifacts"];
        assert!(secondary.get(BUILD_OUTPUT_ARTIFACT_NAME).is_some());
        assert!(secondary.get(SITE_ASSETS_ARTIFACT_NAME).is_some());
    }

    #[test]
    fn test_function_defaults() {
        let topology = ServerAppTopology::new(make_props()).unwrap();
        assert_eq!(topology.function.memory_mb, Some(2048));
        assert_eq!(topology.function.reserved_concurrency, Some(2));
        assert_eq!(topology.function.timeout_seconds, 10);
        assert_eq!(topology.api.handler.name, "shop-app");
    }

    #[test]
    fn test_blank_handler_rejected() {
        let mut props = make_props();
        props.handler = String::new();
        assert!(matches!(
            ServerAppTopology::new(props),
            Err(Error::Configuration(_))
        ));
    }
}
