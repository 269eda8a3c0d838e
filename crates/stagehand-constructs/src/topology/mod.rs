//! Ready-made deployment topologies.

mod server_app;
mod static_site;

pub use server_app::{ServerAppProps, ServerAppTopology};
pub use static_site::{StaticSiteProps, StaticSiteTopology};

use serde::Serialize;
use stagehand_core::Result;
use stagehand_core::resource::SourceRepository;
use stagehand_pipeline::CompactPipeline;

use crate::notification::SlackNotificationRule;
use crate::trigger::RepositoryChangeTriggerRule;

/// Any of the ready-made topologies.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Topology {
    StaticSite(StaticSiteTopology),
    ServerApp(ServerAppTopology),
}

impl Topology {
    pub fn kind(&self) -> &'static str {
        match self {
            Topology::StaticSite(_) => "static-site",
            Topology::ServerApp(_) => "server-app",
        }
    }

    pub fn pipeline(&self) -> &CompactPipeline {
        match self {
            Topology::StaticSite(t) => &t.pipeline,
            Topology::ServerApp(t) => &t.pipeline,
        }
    }
}

impl From<StaticSiteTopology> for Topology {
    fn from(topology: StaticSiteTopology) -> Self {
        Topology::StaticSite(topology)
    }
}

impl From<ServerAppTopology> for Topology {
    fn from(topology: ServerAppTopology) -> Self {
        Topology::ServerApp(topology)
    }
}

/// Trigger rule for repositories that publish change events.
fn change_trigger(
    description: &str,
    repository: &SourceRepository,
    branch: Option<&str>,
    pipeline: &CompactPipeline,
) -> Result<Option<RepositoryChangeTriggerRule>> {
    match repository {
        SourceRepository::CodeCommit { .. } => RepositoryChangeTriggerRule::new(
            format!("{}-trigger", description),
            repository,
            branch,
            pipeline.name(),
        )
        .map(Some),
        SourceRepository::GitHub { .. } => Ok(None),
    }
}

fn notifications(
    description: &str,
    pipeline: &CompactPipeline,
    slack_channel_arn: Option<&str>,
) -> Option<SlackNotificationRule> {
    slack_channel_arn.map(|arn| {
        SlackNotificationRule::new(format!("{}-notifications", description), pipeline.name(), arn)
    })
}
