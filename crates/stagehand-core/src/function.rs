//! Serverless function descriptions.

use serde::{Deserialize, Serialize};

use crate::resource::FunctionRef;

/// Runtime a function's code targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Runtime {
    #[serde(rename = "nodejs20.x")]
    Nodejs20,
    #[serde(rename = "dotnet8")]
    Dotnet8,
    #[serde(rename = "provided.al2023")]
    Provided,
}

/// Where a function's code comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FunctionCode {
    /// A directory or archive packaged at provisioning time.
    Asset { path: String },
    /// A single source file embedded in the description.
    Inline { source: String },
}

/// Description of a function to provision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSpec {
    pub name: String,
    pub handler: String,
    pub runtime: Runtime,
    pub code: FunctionCode,
    pub timeout_seconds: u32,
    pub memory_mb: Option<u32>,
    pub reserved_concurrency: Option<u32>,
    /// Days to keep the function's logs. `None` keeps them forever.
    pub log_retention_days: Option<u32>,
    /// Remove the log group together with the function.
    pub destroy_log_group: bool,
}

impl FunctionSpec {
    pub fn reference(&self) -> FunctionRef {
        FunctionRef::new(self.name.clone())
    }
}
