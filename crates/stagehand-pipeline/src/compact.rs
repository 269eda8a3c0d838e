//! The compact pipeline: `pull`, `build`, then one shared `deploy` stage.
//!
//! Construction wires the source artifact and the build output artifact into
//! the fixed pull and build stages. Every `add_*` method then appends to the
//! deploy stage, creating it on first use. Whatever the order or mix of
//! targets registered, the pipeline never holds more than one deploy stage.
//!
//! Duplicate action names, input artifacts the build never produces and
//! invalid run orders are not checked here. The platform rejects them when it
//! provisions the pipeline.

use serde::Serialize;
use serde_json::json;
use stagehand_core::artifact::Artifact;
use stagehand_core::function::FunctionSpec;
use stagehand_core::pipeline::{
    AccessControl, Action, ActionKind, BUILD_STAGE_NAME, CacheControl, DEPLOY_STAGE_NAME,
    PULL_STAGE_NAME, Pipeline, Stage,
};
use stagehand_core::resource::{
    BucketRef, BuildProjectRef, DEFAULT_BRANCH, DeploymentGroupRef, DistributionRef,
    FunctionRef, ServiceRef, SourceRepository,
};
use stagehand_core::{Error, Result};
use std::time::Duration;
use tracing::{debug, info};

use crate::companion;

/// Name of the action in the pull stage.
pub const PULL_ACTION_NAME: &str = "pull-source";
/// Name of the action in the build stage.
pub const BUILD_ACTION_NAME: &str = "build-source-code";

/// User parameter naming the deployment that invoked a function.
pub const DEPLOYMENT_PARAMETER: &str = "deployment";

/// Cache lifetime set on objects deployed to storage unless overridden.
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Options shared by the compute, container and host-group deployments.
#[derive(Debug, Clone, Default)]
pub struct DeployOptions {
    /// Artifact to deploy. Defaults to the build output artifact.
    pub input: Option<Artifact>,
    /// Position within the deploy stage. Unordered when absent.
    pub run_order: Option<u32>,
}

/// Options for deploying to a storage bucket.
#[derive(Debug, Clone)]
pub struct StorageDeployOptions {
    /// Artifact to deploy. Defaults to the build output artifact.
    pub input: Option<Artifact>,
    /// Position within the deploy stage. Unordered when absent.
    pub run_order: Option<u32>,
    pub access_control: AccessControl,
    /// `max-age` set on every deployed object.
    pub max_age: Duration,
    /// Unpack the artifact archive into the bucket instead of copying it as
    /// one object.
    pub extract: bool,
}

impl Default for StorageDeployOptions {
    fn default() -> Self {
        Self {
            input: None,
            run_order: None,
            access_control: AccessControl::Private,
            max_age: DEFAULT_MAX_AGE,
            extract: true,
        }
    }
}

/// Options for a CDN invalidation.
#[derive(Debug, Clone, Default)]
pub struct InvalidationOptions {
    /// Function performing the invalidation. When absent the pipeline
    /// provisions its own companion invalidation function.
    pub invalidator: Option<FunctionRef>,
    /// Position within the deploy stage. Unordered when absent.
    pub run_order: Option<u32>,
}

/// A pipeline that pulls one branch, builds it once and deploys the result to
/// any number of targets.
#[derive(Debug, Clone, Serialize)]
pub struct CompactPipeline {
    pipeline: Pipeline,
    source_artifact: Artifact,
    build_output_artifact: Artifact,
    update_code_function: Option<FunctionSpec>,
    invalidation_function: Option<FunctionSpec>,
}

/// Builder for [`CompactPipeline`].
#[derive(Debug, Clone, Default)]
pub struct CompactPipelineBuilder {
    name: String,
    source: Option<SourceRepository>,
    branch: Option<String>,
    build_project: Option<BuildProjectRef>,
    artifact_store: Option<BucketRef>,
    additional_outputs: Vec<String>,
}

impl CompactPipelineBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn source(mut self, source: SourceRepository) -> Self {
        self.source = Some(source);
        self
    }

    /// Branch to pull. Defaults to `master`.
    pub fn branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    pub fn build_project(mut self, project: BuildProjectRef) -> Self {
        self.build_project = Some(project);
        self
    }

    pub fn artifact_store(mut self, bucket: BucketRef) -> Self {
        self.artifact_store = Some(bucket);
        self
    }

    /// Declare another artifact the build produces alongside the build output.
    pub fn additional_output(mut self, name: impl Into<String>) -> Self {
        self.additional_outputs.push(name.into());
        self
    }

    pub fn additional_outputs<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.additional_outputs
            .extend(names.into_iter().map(Into::into));
        self
    }

    /// Assemble the pull and build stages.
    pub fn build(self) -> Result<CompactPipeline> {
        let source = self.source.ok_or_else(|| {
            Error::configuration(format!("pipeline '{}' has no source repository", self.name))
        })?;
        let project = self.build_project.ok_or_else(|| {
            Error::configuration(format!("pipeline '{}' has no build project", self.name))
        })?;
        let additional = self
            .additional_outputs
            .into_iter()
            .map(Artifact::new)
            .collect::<Result<Vec<_>>>()?;
        let branch = self.branch.unwrap_or_else(|| DEFAULT_BRANCH.to_string());

        let source_artifact = Artifact::source();
        let build_output_artifact = Artifact::build_output();

        let mut pipeline = Pipeline::new(self.name, self.artifact_store);
        pipeline.stage_or_insert(PULL_STAGE_NAME).actions.push(
            Action::new(
                PULL_ACTION_NAME,
                ActionKind::SourcePull {
                    source: source.resolve(branch),
                },
            )
            .with_outputs([source_artifact.clone()]),
        );
        pipeline.stage_or_insert(BUILD_STAGE_NAME).actions.push(
            Action::new(BUILD_ACTION_NAME, ActionKind::BuildExecute { project })
                .with_input(source_artifact.clone())
                .with_outputs(additional)
                .with_outputs([build_output_artifact.clone()]),
        );

        debug!(
            pipeline = %pipeline.name,
            repository = %source.identifier(),
            "assembled pull and build stages"
        );

        Ok(CompactPipeline {
            pipeline,
            source_artifact,
            build_output_artifact,
            update_code_function: None,
            invalidation_function: None,
        })
    }
}

impl CompactPipeline {
    pub fn builder(name: impl Into<String>) -> CompactPipelineBuilder {
        CompactPipelineBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.pipeline.name
    }

    /// Artifact produced by the pull stage.
    pub fn source_artifact(&self) -> &Artifact {
        &self.source_artifact
    }

    /// Primary artifact produced by the build stage.
    pub fn build_output_artifact(&self) -> &Artifact {
        &self.build_output_artifact
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn into_pipeline(self) -> Pipeline {
        self.pipeline
    }

    pub fn stages(&self) -> &[Stage] {
        &self.pipeline.stages
    }

    pub fn stage(&self, name: &str) -> Option<&Stage> {
        self.pipeline.stage(name)
    }

    /// The deploy stage, once any deployment has been registered.
    pub fn deploy_stage(&self) -> Option<&Stage> {
        self.pipeline.stage(DEPLOY_STAGE_NAME)
    }

    /// Every artifact the pipeline produces, whether or not anything consumes it.
    pub fn artifacts(&self) -> Vec<&Artifact> {
        self.pipeline.artifacts()
    }

    /// Functions the pipeline provisioned for its own deployment steps.
    pub fn companions(&self) -> Vec<&FunctionSpec> {
        self.update_code_function
            .iter()
            .chain(self.invalidation_function.iter())
            .collect()
    }

    /// Copy an artifact into a bucket.
    pub fn add_deployment_to_storage(
        &mut self,
        action_name: &str,
        bucket: BucketRef,
        options: StorageDeployOptions,
    ) -> Result<()> {
        validate_action_name(action_name)?;
        info!(
            pipeline = %self.pipeline.name,
            action = action_name,
            bucket = %bucket,
            "registering storage deployment"
        );

        let input = self.input_or_default(options.input);
        let action = Action::new(
            action_name,
            ActionKind::DeployToStorage {
                bucket,
                access_control: options.access_control,
                cache_control: vec![CacheControl::max_age(options.max_age)],
                extract: options.extract,
            },
        )
        .with_input(input)
        .with_run_order(options.run_order);

        self.deploy_stage_mut().actions.push(action);
        Ok(())
    }

    /// Deploy an artifact as a function's new code.
    ///
    /// Appends two actions: `<action_name>-update-code`, which hands the
    /// artifact to the companion updater function, followed by `action_name`,
    /// which invokes the updated function. With a run order `r` the invoke
    /// runs at `r + 1`. The updater is provisioned on the first call and
    /// shared by later ones.
    ///
    /// The invoked function receives `{"deployment": action_name}` as user
    /// parameters and must report the job result back to the pipeline.
    /// Until it does, the platform holds the action open and eventually
    /// fails it on timeout.
    pub fn add_deployment_to_compute(
        &mut self,
        action_name: &str,
        function: FunctionRef,
        options: DeployOptions,
    ) -> Result<()> {
        validate_action_name(action_name)?;
        info!(
            pipeline = %self.pipeline.name,
            action = action_name,
            function = %function,
            "registering compute deployment"
        );

        let pipeline_name = self.pipeline.name.clone();
        let updater = self
            .update_code_function
            .get_or_insert_with(|| {
                debug!(pipeline = %pipeline_name, "provisioning update-function-code companion");
                companion::update_function_code(&pipeline_name)
            })
            .reference();

        let input = self.input_or_default(options.input);
        let update = Action::new(
            format!("{}-update-code", action_name),
            ActionKind::UpdateFunctionCode {
                function: function.clone(),
                updater,
            },
        )
        .with_input(input)
        .with_run_order(options.run_order);
        let invoke = Action::new(
            action_name,
            ActionKind::InvokeFunction {
                function,
                user_parameters: Some(json!({ DEPLOYMENT_PARAMETER: action_name })),
            },
        )
        .with_run_order(options.run_order.map(|r| r.saturating_add(1)));

        let stage = self.deploy_stage_mut();
        stage.actions.push(update);
        stage.actions.push(invoke);
        Ok(())
    }

    /// Roll an artifact out to a container service.
    pub fn add_deployment_to_container(
        &mut self,
        action_name: &str,
        service: ServiceRef,
        options: DeployOptions,
    ) -> Result<()> {
        validate_action_name(action_name)?;
        info!(
            pipeline = %self.pipeline.name,
            action = action_name,
            service = %service,
            "registering container deployment"
        );

        let input = self.input_or_default(options.input);
        let action = Action::new(action_name, ActionKind::DeployToContainer { service })
            .with_input(input)
            .with_run_order(options.run_order);

        self.deploy_stage_mut().actions.push(action);
        Ok(())
    }

    /// Roll an artifact out to a deployment group of hosts.
    pub fn add_deployment_to_host_group(
        &mut self,
        action_name: &str,
        deployment_group: DeploymentGroupRef,
        options: DeployOptions,
    ) -> Result<()> {
        validate_action_name(action_name)?;
        info!(
            pipeline = %self.pipeline.name,
            action = action_name,
            deployment_group = %deployment_group,
            "registering host group deployment"
        );

        let input = self.input_or_default(options.input);
        let action = Action::new(
            action_name,
            ActionKind::DeployToHostGroup { deployment_group },
        )
        .with_input(input)
        .with_run_order(options.run_order);

        self.deploy_stage_mut().actions.push(action);
        Ok(())
    }

    /// Invalidate a distribution's cache.
    ///
    /// The distribution id reaches the invalidator as the `distributionId`
    /// user parameter.
    pub fn add_cdn_invalidation(
        &mut self,
        action_name: &str,
        distribution: DistributionRef,
        options: InvalidationOptions,
    ) -> Result<()> {
        validate_action_name(action_name)?;
        info!(
            pipeline = %self.pipeline.name,
            action = action_name,
            distribution = %distribution,
            "registering cdn invalidation"
        );

        let invalidator = match options.invalidator {
            Some(invalidator) => invalidator,
            None => {
                let pipeline_name = self.pipeline.name.clone();
                self.invalidation_function
                    .get_or_insert_with(|| {
                        debug!(pipeline = %pipeline_name, "provisioning cdn-invalidation companion");
                        companion::cdn_invalidation(&pipeline_name)
                    })
                    .reference()
            }
        };

        let action = Action::new(
            action_name,
            ActionKind::InvalidateCdn {
                invalidator,
                distribution,
            },
        )
        .with_run_order(options.run_order);

        self.deploy_stage_mut().actions.push(action);
        Ok(())
    }

    /// The single deploy stage, created on first use.
    fn deploy_stage_mut(&mut self) -> &mut Stage {
        if self.pipeline.stage(DEPLOY_STAGE_NAME).is_none() {
            debug!(pipeline = %self.pipeline.name, "creating deploy stage");
        }
        self.pipeline.stage_or_insert(DEPLOY_STAGE_NAME)
    }

    fn input_or_default(&self, input: Option<Artifact>) -> Artifact {
        input.unwrap_or_else(|| self.build_output_artifact.clone())
    }
}

fn validate_action_name(action_name: &str) -> Result<()> {
    if action_name.trim().is_empty() {
        return Err(Error::configuration("action name must not be empty"));
    }
    Ok(())
}
