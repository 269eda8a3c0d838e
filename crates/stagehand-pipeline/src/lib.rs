//! Compact deployment pipeline for Stagehand.
//!
//! A [`CompactPipeline`] pulls a repository branch, builds it with one build
//! project and then deploys the build output to any mix of targets through a
//! single shared `deploy` stage.

pub mod compact;
pub mod companion;

pub use compact::{
    CompactPipeline, CompactPipelineBuilder, DeployOptions, InvalidationOptions,
    StorageDeployOptions,
};
