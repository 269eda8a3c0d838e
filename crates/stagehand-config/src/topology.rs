//! Topology configuration parsing.

use crate::{ConfigError, ConfigResult, VariableContext};
use kdl::{KdlDocument, KdlNode};
use stagehand_constructs::{
    ServerAppProps, ServerAppTopology, StaticSiteProps, StaticSiteTopology, Topology,
};
use stagehand_core::resource::SourceRepository;
use std::path::Path;

/// Parsed topology properties, ready to be assembled.
#[derive(Debug, Clone)]
pub enum TopologyProps {
    StaticSite(StaticSiteProps),
    ServerApp(ServerAppProps),
}

impl TopologyProps {
    pub fn kind(&self) -> &'static str {
        match self {
            TopologyProps::StaticSite(_) => "static-site",
            TopologyProps::ServerApp(_) => "server-app",
        }
    }

    /// Assemble the constructs described by these properties.
    pub fn build(self) -> stagehand_core::Result<Topology> {
        match self {
            TopologyProps::StaticSite(props) => StaticSiteTopology::new(props).map(Topology::from),
            TopologyProps::ServerApp(props) => ServerAppTopology::new(props).map(Topology::from),
        }
    }
}

/// Parse a topology configuration from KDL text.
///
/// Variables declared in a top-level `vars` block are added to `vars`
/// before any value is interpolated.
pub fn parse_topology(kdl: &str, vars: &VariableContext) -> ConfigResult<TopologyProps> {
    let doc: KdlDocument = kdl.parse()?;
    let ctx = document_context(&doc, vars);

    let mut topology = None;
    for node in doc.nodes() {
        if node.name().value() == "topology" {
            if topology.is_some() {
                return Err(ConfigError::Duplicate("topology".to_string()));
            }
            topology = Some(node);
        }
    }
    let node = topology.ok_or_else(|| ConfigError::MissingField("topology".to_string()))?;

    let kind = get_first_string_arg(node)
        .ok_or_else(|| ConfigError::MissingField("topology kind".to_string()))?;
    let fields = TopologyFields::parse(node, &ctx)?;

    match kind.as_str() {
        "static-site" => Ok(TopologyProps::StaticSite(StaticSiteProps {
            description: fields.description,
            repository: fields.repository,
            branch: fields.branch,
            domain_names: fields.domain_names,
            certificate_arn: fields.certificate_arn,
            slack_channel_arn: fields.slack_channel_arn,
            build_spec: None,
        })),
        "server-app" => {
            let handler = fields
                .handler
                .ok_or_else(|| ConfigError::MissingField("handler".to_string()))?;
            Ok(TopologyProps::ServerApp(ServerAppProps {
                description: fields.description,
                repository: fields.repository,
                branch: fields.branch,
                handler,
                domain_names: fields.domain_names,
                certificate_arn: fields.certificate_arn,
                slack_channel_arn: fields.slack_channel_arn,
                build_spec: None,
            }))
        }
        other => Err(ConfigError::InvalidValue {
            field: "topology kind".to_string(),
            message: format!("unknown topology '{}'", other),
        }),
    }
}

/// Parse and assemble a topology from KDL text.
pub fn load_topology(kdl: &str, vars: &VariableContext) -> ConfigResult<Topology> {
    Ok(parse_topology(kdl, vars)?.build()?)
}

/// Variables referenced in `kdl` that neither `vars` nor the document's
/// own `vars` block defines, each listed once.
pub fn unresolved_variables(kdl: &str, vars: &VariableContext) -> ConfigResult<Vec<String>> {
    let doc: KdlDocument = kdl.parse()?;
    Ok(document_context(&doc, vars).unresolved(kdl))
}

/// A topology assembled from a file.
#[derive(Debug, Clone)]
pub struct LoadedTopology {
    pub topology: Topology,
    /// Variables left verbatim in the file.
    pub unresolved: Vec<String>,
}

/// Read, parse and assemble a topology file.
pub fn load_topology_file(path: &Path, vars: &VariableContext) -> ConfigResult<LoadedTopology> {
    let text = std::fs::read_to_string(path)?;
    let unresolved = unresolved_variables(&text, vars)?;
    let topology = load_topology(&text, vars)?;
    Ok(LoadedTopology {
        topology,
        unresolved,
    })
}

/// `vars` extended with the document's top-level `vars` block.
fn document_context(doc: &KdlDocument, vars: &VariableContext) -> VariableContext {
    let mut ctx = vars.clone();
    for node in doc.nodes().iter().filter(|n| n.name().value() == "vars") {
        if let Some(children) = node.children() {
            for child in children.nodes() {
                if let Some(val) = get_first_string_arg(child) {
                    let val = ctx.interpolate(&val);
                    ctx.set(child.name().value(), val);
                }
            }
        }
    }
    ctx
}

/// Fields shared by every topology kind.
struct TopologyFields {
    description: String,
    repository: SourceRepository,
    branch: Option<String>,
    handler: Option<String>,
    domain_names: Vec<String>,
    certificate_arn: Option<String>,
    slack_channel_arn: Option<String>,
}

impl TopologyFields {
    fn parse(node: &KdlNode, ctx: &VariableContext) -> ConfigResult<Self> {
        let mut description = None;
        let mut repository = None;
        let mut branch = None;
        let mut handler = None;
        let mut domain_names = Vec::new();
        let mut certificate_arn = None;
        let mut slack_channel_arn = None;

        let Some(children) = node.children() else {
            return Err(ConfigError::MissingField("description".to_string()));
        };

        for child in children.nodes() {
            let arg = || get_first_string_arg(child).map(|s| ctx.interpolate(&s));
            match child.name().value() {
                "description" => description = arg(),
                "repository" => {
                    let name = arg().ok_or_else(|| ConfigError::InvalidValue {
                        field: "repository".to_string(),
                        message: "expected a repository name".to_string(),
                    })?;
                    set_repository(&mut repository, SourceRepository::codecommit(name))?;
                }
                "github" => {
                    let prop = |name: &str| {
                        get_string_prop(child, name)
                            .map(|s| ctx.interpolate(&s))
                            .ok_or_else(|| ConfigError::MissingField(format!("github {}", name)))
                    };
                    let source =
                        SourceRepository::github(prop("owner")?, prop("repo")?, prop("token-secret")?);
                    set_repository(&mut repository, source)?;
                }
                "branch" => branch = arg(),
                "handler" => handler = arg(),
                "domain" => domain_names.extend(
                    get_all_string_args(child)
                        .iter()
                        .map(|s| ctx.interpolate(s)),
                ),
                "certificate" => certificate_arn = arg(),
                "slack-channel" => slack_channel_arn = arg(),
                _ => {}
            }
        }

        Ok(Self {
            description: description
                .ok_or_else(|| ConfigError::MissingField("description".to_string()))?,
            repository: repository
                .ok_or_else(|| ConfigError::MissingField("repository".to_string()))?,
            branch,
            handler,
            domain_names,
            certificate_arn,
            slack_channel_arn,
        })
    }
}

fn set_repository(slot: &mut Option<SourceRepository>, source: SourceRepository) -> ConfigResult<()> {
    if slot.is_some() {
        return Err(ConfigError::Duplicate("repository".to_string()));
    }
    *slot = Some(source);
    Ok(())
}

// Helper functions

fn get_first_string_arg(node: &KdlNode) -> Option<String> {
    node.entries()
        .iter()
        .find(|e| e.name().is_none())
        .and_then(|e| e.value().as_string())
        .map(|s| s.to_string())
}

fn get_all_string_args(node: &KdlNode) -> Vec<String> {
    node.entries()
        .iter()
        .filter(|e| e.name().is_none())
        .filter_map(|e| e.value().as_string())
        .map(|s| s.to_string())
        .collect()
}

fn get_string_prop(node: &KdlNode, name: &str) -> Option<String> {
    node.get(name)
        .and_then(|v| v.as_string())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::VariableContextBuilder;

    #[test]
    fn test_parse_static_site() {
        let kdl = r#"
            topology "static-site" {
                description "marketing-site"
                repository "marketing-site"
                branch "release"
                domain "www.example.com" "example.com"
                certificate "arn:aws:acm:us-east-1:123:certificate/abc"
            }
        "#;

        let props = parse_topology(kdl, &VariableContext::new()).unwrap();
        let TopologyProps::StaticSite(props) = props else {
            panic!("expected static site");
        };
        assert_eq!(props.description, "marketing-site");
        assert_eq!(props.repository, SourceRepository::codecommit("marketing-site"));
        assert_eq!(props.branch.as_deref(), Some("release"));
        assert_eq!(props.domain_names, vec!["www.example.com", "example.com"]);
        assert!(props.slack_channel_arn.is_none());
    }

    #[test]
    fn test_parse_server_app_with_github() {
        let kdl = r#"
            topology "server-app" {
                description "storefront"
                github owner="acme" repo="storefront" token-secret="github-token"
                handler "Storefront::Storefront.LambdaEntryPoint::FunctionHandlerAsync"
            }
        "#;

        let props = parse_topology(kdl, &VariableContext::new()).unwrap();
        assert_eq!(props.kind(), "server-app");
        let TopologyProps::ServerApp(props) = props else {
            panic!("expected server app");
        };
        assert_eq!(props.repository, SourceRepository::github("acme", "storefront", "github-token"));
        assert!(props.branch.is_none());
    }

    #[test]
    fn test_server_app_requires_handler() {
        let kdl = r#"
            topology "server-app" {
                description "storefront"
                repository "storefront"
            }
        "#;

        let result = parse_topology(kdl, &VariableContext::new());
        assert!(matches!(result, Err(ConfigError::MissingField(f)) if f == "handler"));
    }

    #[test]
    fn test_missing_repository() {
        let kdl = r#"
            topology "static-site" {
                description "site"
            }
        "#;

        let result = parse_topology(kdl, &VariableContext::new());
        assert!(matches!(result, Err(ConfigError::MissingField(f)) if f == "repository"));
    }

    #[test]
    fn test_unknown_kind() {
        let kdl = r#"
            topology "mainframe" {
                description "legacy"
                repository "legacy"
            }
        "#;

        let result = parse_topology(kdl, &VariableContext::new());
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_duplicate_topology() {
        let kdl = r#"
            topology "static-site" {
                description "a"
                repository "a"
            }
            topology "static-site" {
                description "b"
                repository "b"
            }
        "#;

        let result = parse_topology(kdl, &VariableContext::new());
        assert!(matches!(result, Err(ConfigError::Duplicate(_))));
    }

    #[test]
    fn test_interpolation() {
        let kdl = r#"
            vars {
                site "docs"
            }
            topology "static-site" {
                description "${site}-site"
                repository "${site}"
                certificate "${env.CERT_ARN}"
                slack-channel "${env.SLACK_CHANNEL}"
            }
        "#;

        let ctx = VariableContextBuilder::new()
            .with_env("CERT_ARN", "arn:cert")
            .build();
        let TopologyProps::StaticSite(props) = parse_topology(kdl, &ctx).unwrap() else {
            panic!("expected static site");
        };
        assert_eq!(props.description, "docs-site");
        assert_eq!(props.repository, SourceRepository::codecommit("docs"));
        assert_eq!(props.certificate_arn.as_deref(), Some("arn:cert"));
        // Unresolved variables stay verbatim
        assert_eq!(props.slack_channel_arn.as_deref(), Some("${env.SLACK_CHANNEL}"));
    }

    #[test]
    fn test_unresolved_variables_see_vars_block() {
        let kdl = r#"
            vars {
                site "docs"
            }
            topology "static-site" {
                description "${site}-site"
                repository "${site}"
                certificate "${env.CERT_ARN}"
                slack-channel "${env.CERT_ARN}"
            }
        "#;

        let unresolved = unresolved_variables(kdl, &VariableContext::new()).unwrap();
        assert_eq!(unresolved, vec!["env.CERT_ARN"]);

        let TopologyProps::StaticSite(props) = parse_topology(kdl, &VariableContext::new()).unwrap()
        else {
            panic!("expected static site");
        };
        assert_eq!(props.description, "docs-site");
    }

    #[test]
    fn test_load_topology_file_reports_unresolved() {
        let path = std::env::temp_dir().join(format!(
            "stagehand-{}.kdl",
            stagehand_core::ResourceId::new()
        ));
        std::fs::write(
            &path,
            r#"
            vars {
                site "docs"
            }
            topology "static-site" {
                description "${site}"
                repository "${site}"
                certificate "${env.CERT_ARN}"
            }
            "#,
        )
        .unwrap();

        let loaded = load_topology_file(&path, &VariableContext::new());
        std::fs::remove_file(&path).unwrap();
        let loaded = loaded.unwrap();
        assert_eq!(loaded.topology.kind(), "static-site");
        assert_eq!(loaded.unresolved, vec!["env.CERT_ARN"]);
    }

    #[test]
    fn test_load_topology_file_missing() {
        let path = std::env::temp_dir().join("stagehand-does-not-exist.kdl");
        let result = load_topology_file(&path, &VariableContext::new());
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_topology_builds_pipeline() {
        let kdl = r#"
            topology "static-site" {
                description "site"
                repository "site"
            }
        "#;

        let topology = load_topology(kdl, &VariableContext::new()).unwrap();
        assert_eq!(topology.kind(), "static-site");
        assert_eq!(topology.pipeline().stages().len(), 3);
    }

    #[test]
    fn test_blank_description_rejected_on_build() {
        let kdl = r#"
            topology "static-site" {
                description "  "
                repository "site"
            }
        "#;

        let result = load_topology(kdl, &VariableContext::new());
        assert!(matches!(result, Err(ConfigError::Topology(_))));
    }

    #[test]
    fn test_invalid_kdl() {
        let result = parse_topology("topology {", &VariableContext::new());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
