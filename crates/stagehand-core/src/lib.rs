//! Core domain types for Stagehand deployment pipelines.
//!
//! This crate contains:
//! - Resource identifiers and the shared error type
//! - Function descriptions
//! - Artifacts flowing between pipeline stages
//! - References to external resources (repositories, build projects, targets)
//! - The pipeline data model (pipelines, stages, actions)

pub mod artifact;
pub mod error;
pub mod function;
pub mod id;
pub mod pipeline;
pub mod resource;

pub use artifact::Artifact;
pub use error::{Error, Result};
pub use id::ResourceId;
