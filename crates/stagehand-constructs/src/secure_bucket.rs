//! Buckets with secure defaults.

use serde::{Deserialize, Serialize};
use stagehand_core::resource::BucketRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketEncryption {
    S3Managed,
    KmsManaged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalPolicy {
    Destroy,
    Retain,
}

/// Caller-tunable settings. Everything security related is fixed.
#[derive(Debug, Clone, Default)]
pub struct SecureBucketProps {
    /// Empty the bucket when it is removed. Defaults to `true`.
    pub auto_delete_objects: Option<bool>,
    pub versioned: bool,
}

/// A bucket that is encrypted, never public, and only reachable over TLS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecureBucket {
    pub name: String,
    pub encryption: BucketEncryption,
    pub public_read_access: bool,
    pub block_public_access: bool,
    pub enforce_ssl: bool,
    pub removal_policy: RemovalPolicy,
    pub auto_delete_objects: bool,
    pub versioned: bool,
}

impl SecureBucket {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_props(name, SecureBucketProps::default())
    }

    pub fn with_props(name: impl Into<String>, props: SecureBucketProps) -> Self {
        Self {
            name: name.into(),
            encryption: BucketEncryption::S3Managed,
            public_read_access: false,
            block_public_access: true,
            enforce_ssl: true,
            removal_policy: RemovalPolicy::Destroy,
            auto_delete_objects: props.auto_delete_objects.unwrap_or(true),
            versioned: props.versioned,
        }
    }

    pub fn reference(&self) -> BucketRef {
        BucketRef::new(self.name.clone())
    }
}
