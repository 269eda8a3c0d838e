//! KDL configuration parsing for Stagehand.
//!
//! This crate handles parsing of:
//! - Topology definitions (stagehand.kdl)
//! - Variable interpolation in string values

pub mod error;
pub mod topology;
pub mod variables;

pub use error::{ConfigError, ConfigResult};
pub use topology::{
    LoadedTopology, TopologyProps, load_topology, load_topology_file, parse_topology,
    unresolved_variables,
};
pub use variables::{VariableContext, VariableContextBuilder};
