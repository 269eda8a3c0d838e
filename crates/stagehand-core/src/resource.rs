//! References to external resources.
//!
//! Stagehand never provisions or calls these resources itself. A reference
//! only carries what the external platform needs to find the resource.

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Branch used when a source does not name one.
pub const DEFAULT_BRANCH: &str = "master";

/// A branch-addressable version control repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum SourceRepository {
    /// A CodeCommit repository, addressed by name.
    CodeCommit { name: String },
    /// A GitHub repository. The OAuth token is read from the named secret
    /// at provisioning time.
    GitHub {
        owner: String,
        repo: String,
        oauth_token_secret: String,
    },
}

impl SourceRepository {
    pub fn codecommit(name: impl Into<String>) -> Self {
        Self::CodeCommit { name: name.into() }
    }

    pub fn github(
        owner: impl Into<String>,
        repo: impl Into<String>,
        oauth_token_secret: impl Into<String>,
    ) -> Self {
        Self::GitHub {
            owner: owner.into(),
            repo: repo.into(),
            oauth_token_secret: oauth_token_secret.into(),
        }
    }

    /// Repository identifier as the provider knows it.
    pub fn identifier(&self) -> String {
        match self {
            SourceRepository::CodeCommit { name } => name.clone(),
            SourceRepository::GitHub { owner, repo, .. } => format!("{}/{}", owner, repo),
        }
    }

    /// Resolve the repository at a branch.
    pub fn resolve(&self, branch: impl Into<String>) -> SourceHandle {
        SourceHandle {
            repository: self.clone(),
            branch: branch.into(),
        }
    }
}

/// A repository pinned to a branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceHandle {
    pub repository: SourceRepository,
    pub branch: String,
}

/// A build project that runs the build stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Display)]
#[display("{name}")]
pub struct BuildProjectRef {
    pub name: String,
}

impl BuildProjectRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A storage bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Display)]
#[display("{name}")]
pub struct BucketRef {
    pub name: String,
}

impl BucketRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A serverless function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Display)]
#[display("{name}")]
pub struct FunctionRef {
    pub name: String,
}

impl FunctionRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A container service running in a cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Display)]
#[display("{cluster}/{name}")]
pub struct ServiceRef {
    pub cluster: String,
    pub name: String,
}

impl ServiceRef {
    pub fn new(cluster: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            cluster: cluster.into(),
            name: name.into(),
        }
    }
}

/// A deployment group of long-running hosts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Display)]
#[display("{application}/{name}")]
pub struct DeploymentGroupRef {
    pub application: String,
    pub name: String,
}

impl DeploymentGroupRef {
    pub fn new(application: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            application: application.into(),
            name: name.into(),
        }
    }
}

/// A content distribution, addressed by its identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Display)]
#[display("{id}")]
pub struct DistributionRef {
    pub id: String,
}

impl DistributionRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_pins_branch() {
        let repo = SourceRepository::codecommit("website");
        let handle = repo.resolve("release");
        assert_eq!(handle.branch, "release");
        assert_eq!(handle.repository, repo);
    }

    #[test]
    fn test_github_identifier() {
        let repo = SourceRepository::github("acme", "shop", "github-token");
        assert_eq!(repo.identifier(), "acme/shop");
    }

    #[test]
    fn test_display() {
        assert_eq!(ServiceRef::new("prod", "web").to_string(), "prod/web");
        assert_eq!(DistributionRef::new("E123").to_string(), "E123");
    }
}
