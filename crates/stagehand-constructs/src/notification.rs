//! Chat notifications for pipeline executions.

use serde::{Deserialize, Serialize};

/// Pipeline execution events forwarded to the chat channel.
pub const PIPELINE_EXECUTION_EVENTS: [&str; 6] = [
    "codepipeline-pipeline-pipeline-execution-failed",
    "codepipeline-pipeline-pipeline-execution-canceled",
    "codepipeline-pipeline-pipeline-execution-started",
    "codepipeline-pipeline-pipeline-execution-resumed",
    "codepipeline-pipeline-pipeline-execution-succeeded",
    "codepipeline-pipeline-pipeline-execution-superseded",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DetailType {
    Basic,
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RuleStatus {
    Enabled,
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationTarget {
    pub target_type: String,
    pub target_address: String,
}

/// Posts every execution state change of a pipeline to a Slack channel
/// configured in the chat bot service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlackNotificationRule {
    pub name: String,
    pub detail_type: DetailType,
    pub event_type_ids: Vec<String>,
    /// Pipeline the rule watches.
    pub resource: String,
    pub status: RuleStatus,
    pub targets: Vec<NotificationTarget>,
}

impl SlackNotificationRule {
    pub fn new(
        name: impl Into<String>,
        pipeline_name: impl Into<String>,
        chat_configuration_arn: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            detail_type: DetailType::Basic,
            event_type_ids: PIPELINE_EXECUTION_EVENTS
                .iter()
                .map(|e| e.to_string())
                .collect(),
            resource: pipeline_name.into(),
            status: RuleStatus::Enabled,
            targets: vec![NotificationTarget {
                target_type: "AWSChatbotSlack".to_string(),
                target_address: chat_configuration_arn.into(),
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_watches_all_execution_events() {
        let rule = SlackNotificationRule::new("site-notifications", "site-pipeline", "arn:slack");
        assert_eq!(rule.event_type_ids.len(), 6);
        assert_eq!(rule.status, RuleStatus::Enabled);
        assert_eq!(rule.targets[0].target_type, "AWSChatbotSlack");
        assert_eq!(rule.targets[0].target_address, "arn:slack");
        assert_eq!(
            serde_json::to_value(rule.detail_type).unwrap(),
            serde_json::json!("BASIC")
        );
    }
}
