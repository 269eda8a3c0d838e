//! Infrastructure constructs and ready-made topologies for Stagehand.
//!
//! Each construct is a description with its defaults already applied:
//! - Secure buckets (encryption, public access blocked, SSL enforced)
//! - Compact build projects (timeouts, small compute, build cache)
//! - Content distributions
//! - Pipeline notification and repository trigger rules
//!
//! The [`topology`] module composes them with a compact pipeline into
//! complete static-site and server-app deployments.

pub mod build_project;
pub mod distribution;
pub mod notification;
pub mod secure_bucket;
pub mod topology;
pub mod trigger;

pub use build_project::{BuildProjectProps, CompactBuildProject};
pub use distribution::{Distribution, Origin};
pub use notification::SlackNotificationRule;
pub use secure_bucket::{SecureBucket, SecureBucketProps};
pub use topology::{ServerAppProps, ServerAppTopology, StaticSiteProps, StaticSiteTopology, Topology};
pub use trigger::RepositoryChangeTriggerRule;
