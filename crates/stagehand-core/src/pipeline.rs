//! Pipeline, stage and action definitions.
//!
//! These types describe a pipeline for an external platform to provision and
//! run. Nothing here executes.

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

use crate::resource::{
    BucketRef, BuildProjectRef, DeploymentGroupRef, DistributionRef, FunctionRef, ServiceRef,
    SourceHandle, SourceRepository,
};
use crate::{Artifact, ResourceId};

/// Stage holding the source pull action.
pub const PULL_STAGE_NAME: &str = "pull";
/// Stage holding the build action.
pub const BUILD_STAGE_NAME: &str = "build";
/// Stage holding every deployment action.
pub const DEPLOY_STAGE_NAME: &str = "deploy";

/// A deployment pipeline description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pipeline {
    /// Unique identifier.
    pub id: ResourceId,
    /// Pipeline name.
    pub name: String,
    /// Bucket the platform stores artifacts in between stages.
    pub artifact_store: Option<BucketRef>,
    /// Stages in execution order.
    pub stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new(name: impl Into<String>, artifact_store: Option<BucketRef>) -> Self {
        Self {
            id: ResourceId::new(),
            name: name.into(),
            artifact_store,
            stages: Vec::new(),
        }
    }

    /// Find a stage by name.
    pub fn stage(&self, name: &str) -> Option<&Stage> {
        self.stages.iter().find(|s| s.name == name)
    }

    /// Return the stage with this name, appending an empty one if none exists.
    ///
    /// Pipelines hold a handful of stages, so this is a linear scan.
    pub fn stage_or_insert(&mut self, name: &str) -> &mut Stage {
        let index = match self.stages.iter().position(|s| s.name == name) {
            Some(index) => index,
            None => {
                self.stages.push(Stage::new(name));
                self.stages.len() - 1
            }
        };
        &mut self.stages[index]
    }

    /// Every artifact some action in the pipeline produces, in first-seen order.
    pub fn artifacts(&self) -> Vec<&Artifact> {
        let mut seen: Vec<&Artifact> = Vec::new();
        for action in self.stages.iter().flat_map(|s| s.actions.iter()) {
            for output in &action.outputs {
                if !seen.contains(&output) {
                    seen.push(output);
                }
            }
        }
        seen
    }
}

/// A named phase of a pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stage {
    /// Unique identifier.
    pub id: ResourceId,
    /// Stage name, unique within its pipeline.
    pub name: String,
    /// Actions in registration order.
    pub actions: Vec<Action>,
}

impl Stage {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ResourceId::new(),
            name: name.into(),
            actions: Vec::new(),
        }
    }

    pub fn action(&self, name: &str) -> Option<&Action> {
        self.actions.iter().find(|a| a.name == name)
    }
}

/// A unit of work within a stage.
///
/// Action names must be unique within a stage. That rule, the validity of
/// run orders and whether each input artifact is actually produced upstream
/// are all checked by the platform when it provisions the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    /// Action name.
    pub name: String,
    /// Position within the stage. Actions sharing a run order run in
    /// parallel; `None` leaves ordering to the platform.
    pub run_order: Option<u32>,
    /// Artifacts this action consumes.
    pub inputs: Vec<Artifact>,
    /// Artifacts this action produces.
    pub outputs: Vec<Artifact>,
    /// What the action does.
    pub kind: ActionKind,
}

impl Action {
    pub fn new(name: impl Into<String>, kind: ActionKind) -> Self {
        Self {
            name: name.into(),
            run_order: None,
            inputs: Vec::new(),
            outputs: Vec::new(),
            kind,
        }
    }

    pub fn with_run_order(mut self, run_order: Option<u32>) -> Self {
        self.run_order = run_order;
        self
    }

    pub fn with_input(mut self, artifact: Artifact) -> Self {
        self.inputs.push(artifact);
        self
    }

    pub fn with_outputs(mut self, artifacts: impl IntoIterator<Item = Artifact>) -> Self {
        self.outputs.extend(artifacts);
        self
    }

    pub fn category(&self) -> ActionCategory {
        self.kind.category()
    }

    pub fn provider(&self) -> ActionProvider {
        self.kind.provider()
    }

    /// Parameters handed to an invoked function, if any.
    pub fn user_parameters(&self) -> Option<serde_json::Value> {
        match &self.kind {
            ActionKind::UpdateFunctionCode { function, .. } => {
                Some(json!({ "LambdaName": function.name }))
            }
            ActionKind::InvokeFunction {
                user_parameters, ..
            } => user_parameters.clone(),
            ActionKind::InvalidateCdn { distribution, .. } => {
                Some(json!({ "distributionId": distribution.id }))
            }
            _ => None,
        }
    }
}

/// Target-specific configuration of an action.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionKind {
    /// Pull a repository branch.
    SourcePull { source: SourceHandle },
    /// Run a build project.
    BuildExecute { project: BuildProjectRef },
    /// Copy an artifact into a bucket.
    DeployToStorage {
        bucket: BucketRef,
        access_control: AccessControl,
        cache_control: Vec<CacheControl>,
        extract: bool,
    },
    /// Push an artifact into a function's code through an updater function.
    UpdateFunctionCode {
        function: FunctionRef,
        updater: FunctionRef,
    },
    /// Invoke a function.
    InvokeFunction {
        function: FunctionRef,
        user_parameters: Option<serde_json::Value>,
    },
    /// Roll an artifact out to a container service.
    DeployToContainer { service: ServiceRef },
    /// Roll an artifact out to a deployment group of hosts.
    DeployToHostGroup { deployment_group: DeploymentGroupRef },
    /// Purge a distribution's cache through an invalidator function.
    InvalidateCdn {
        invalidator: FunctionRef,
        distribution: DistributionRef,
    },
}

impl ActionKind {
    pub fn category(&self) -> ActionCategory {
        match self {
            ActionKind::SourcePull { .. } => ActionCategory::Source,
            ActionKind::BuildExecute { .. } => ActionCategory::Build,
            ActionKind::DeployToStorage { .. }
            | ActionKind::DeployToContainer { .. }
            | ActionKind::DeployToHostGroup { .. } => ActionCategory::Deploy,
            ActionKind::UpdateFunctionCode { .. }
            | ActionKind::InvokeFunction { .. }
            | ActionKind::InvalidateCdn { .. } => ActionCategory::Invoke,
        }
    }

    pub fn provider(&self) -> ActionProvider {
        match self {
            ActionKind::SourcePull { source } => match source.repository {
                SourceRepository::CodeCommit { .. } => ActionProvider::CodeCommit,
                SourceRepository::GitHub { .. } => ActionProvider::GitHub,
            },
            ActionKind::BuildExecute { .. } => ActionProvider::CodeBuild,
            ActionKind::DeployToStorage { .. } => ActionProvider::S3,
            ActionKind::UpdateFunctionCode { .. }
            | ActionKind::InvokeFunction { .. }
            | ActionKind::InvalidateCdn { .. } => ActionProvider::Lambda,
            ActionKind::DeployToContainer { .. } => ActionProvider::Ecs,
            ActionKind::DeployToHostGroup { .. } => ActionProvider::CodeDeploy,
        }
    }
}

/// Platform action category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionCategory {
    Source,
    Build,
    Deploy,
    Invoke,
}

impl std::fmt::Display for ActionCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionCategory::Source => write!(f, "Source"),
            ActionCategory::Build => write!(f, "Build"),
            ActionCategory::Deploy => write!(f, "Deploy"),
            ActionCategory::Invoke => write!(f, "Invoke"),
        }
    }
}

/// Platform action provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionProvider {
    CodeCommit,
    GitHub,
    CodeBuild,
    S3,
    Lambda,
    Ecs,
    CodeDeploy,
}

impl std::fmt::Display for ActionProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionProvider::CodeCommit => write!(f, "CodeCommit"),
            ActionProvider::GitHub => write!(f, "GitHub"),
            ActionProvider::CodeBuild => write!(f, "CodeBuild"),
            ActionProvider::S3 => write!(f, "S3"),
            ActionProvider::Lambda => write!(f, "Lambda"),
            ActionProvider::Ecs => write!(f, "ECS"),
            ActionProvider::CodeDeploy => write!(f, "CodeDeployToEC2"),
        }
    }
}

/// Canned access control applied to deployed objects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccessControl {
    #[default]
    Private,
    PublicRead,
    PublicReadWrite,
    AuthenticatedRead,
    AwsExecRead,
    BucketOwnerRead,
    BucketOwnerFullControl,
    LogDeliveryWrite,
}

impl std::fmt::Display for AccessControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccessControl::Private => write!(f, "private"),
            AccessControl::PublicRead => write!(f, "public-read"),
            AccessControl::PublicReadWrite => write!(f, "public-read-write"),
            AccessControl::AuthenticatedRead => write!(f, "authenticated-read"),
            AccessControl::AwsExecRead => write!(f, "aws-exec-read"),
            AccessControl::BucketOwnerRead => write!(f, "bucket-owner-read"),
            AccessControl::BucketOwnerFullControl => write!(f, "bucket-owner-full-control"),
            AccessControl::LogDeliveryWrite => write!(f, "log-delivery-write"),
        }
    }
}

/// A `Cache-Control` directive set on deployed objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheControl {
    MaxAge { seconds: u64 },
    SharedMaxAge { seconds: u64 },
    NoCache,
    NoStore,
    NoTransform,
    MustRevalidate,
    ProxyRevalidate,
    Public,
    Private,
}

impl CacheControl {
    pub fn max_age(duration: Duration) -> Self {
        Self::MaxAge {
            seconds: duration.as_secs(),
        }
    }

    pub fn shared_max_age(duration: Duration) -> Self {
        Self::SharedMaxAge {
            seconds: duration.as_secs(),
        }
    }
}

impl std::fmt::Display for CacheControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheControl::MaxAge { seconds } => write!(f, "max-age={}", seconds),
            CacheControl::SharedMaxAge { seconds } => write!(f, "s-maxage={}", seconds),
            CacheControl::NoCache => write!(f, "no-cache"),
            CacheControl::NoStore => write!(f, "no-store"),
            CacheControl::NoTransform => write!(f, "no-transform"),
            CacheControl::MustRevalidate => write!(f, "must-revalidate"),
            CacheControl::ProxyRevalidate => write!(f, "proxy-revalidate"),
            CacheControl::Public => write!(f, "public"),
            CacheControl::Private => write!(f, "private"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_build_action() -> Action {
        Action::new(
            "build",
            ActionKind::BuildExecute {
                project: BuildProjectRef::new("site-build"),
            },
        )
        .with_input(Artifact::source())
        .with_outputs([Artifact::build_output()])
    }

    #[test]
    fn test_stage_or_insert_reuses_existing_stage() {
        let mut pipeline = Pipeline::new("site", None);
        let first = pipeline.stage_or_insert(DEPLOY_STAGE_NAME).id;
        let second = pipeline.stage_or_insert(DEPLOY_STAGE_NAME).id;

        assert_eq!(first, second);
        assert_eq!(pipeline.stages.len(), 1);
    }

    #[test]
    fn test_stage_or_insert_appends_in_order() {
        let mut pipeline = Pipeline::new("site", None);
        pipeline.stage_or_insert(PULL_STAGE_NAME);
        pipeline.stage_or_insert(BUILD_STAGE_NAME);
        pipeline.stage_or_insert(PULL_STAGE_NAME);

        let names: Vec<_> = pipeline.stages.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["pull", "build"]);
    }

    #[test]
    fn test_artifacts_are_distinct_outputs() {
        let mut pipeline = Pipeline::new("site", None);
        pipeline
            .stage_or_insert(BUILD_STAGE_NAME)
            .actions
            .push(make_build_action());
        pipeline
            .stage_or_insert(DEPLOY_STAGE_NAME)
            .actions
            .push(make_build_action());

        assert_eq!(pipeline.artifacts(), vec![&Artifact::build_output()]);
    }

    #[test]
    fn test_category_and_provider() {
        let action = Action::new(
            "deploy",
            ActionKind::DeployToContainer {
                service: ServiceRef::new("prod", "web"),
            },
        );
        assert_eq!(action.category(), ActionCategory::Deploy);
        assert_eq!(action.provider().to_string(), "ECS");

        let source = Action::new(
            "pull",
            ActionKind::SourcePull {
                source: SourceRepository::github("acme", "shop", "token").resolve("main"),
            },
        );
        assert_eq!(source.provider(), ActionProvider::GitHub);
    }

    #[test]
    fn test_invalidation_user_parameters() {
        let action = Action::new(
            "invalidate",
            ActionKind::InvalidateCdn {
                invalidator: FunctionRef::new("invalidator"),
                distribution: DistributionRef::new("E2ABC"),
            },
        );
        assert_eq!(
            action.user_parameters(),
            Some(json!({ "distributionId": "E2ABC" }))
        );
    }

    #[test]
    fn test_cache_control_directives() {
        let week = CacheControl::max_age(Duration::from_secs(7 * 24 * 60 * 60));
        assert_eq!(week.to_string(), "max-age=604800");
        assert_eq!(CacheControl::NoCache.to_string(), "no-cache");
        assert_eq!(AccessControl::default().to_string(), "private");
    }
}
