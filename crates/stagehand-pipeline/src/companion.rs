//! Functions a pipeline provisions for its own deployment steps.

use stagehand_core::function::{FunctionCode, FunctionSpec, Runtime};

/// Handler every companion function exposes.
pub const COMPANION_HANDLER: &str = "index.handler";

/// Function that replaces a target function's code with the artifact handed
/// to it by the pipeline, then reports the job result back.
///
/// Reads the target function name from the `LambdaName` user parameter.
pub fn update_function_code(pipeline_name: &str) -> FunctionSpec {
    FunctionSpec {
        name: format!("{}-update-function-code", pipeline_name),
        handler: COMPANION_HANDLER.to_string(),
        runtime: Runtime::Nodejs20,
        code: FunctionCode::Asset {
            path: "functions/update-function-code".to_string(),
        },
        timeout_seconds: 15,
        memory_mb: None,
        reserved_concurrency: None,
        log_retention_days: Some(1),
        destroy_log_group: false,
    }
}

/// Function that invalidates `/*` on the distribution named by the
/// `distributionId` user parameter.
pub fn cdn_invalidation(pipeline_name: &str) -> FunctionSpec {
    FunctionSpec {
        name: format!("{}-cdn-invalidation", pipeline_name),
        handler: COMPANION_HANDLER.to_string(),
        runtime: Runtime::Nodejs20,
        code: FunctionCode::Asset {
            path: "functions/cdn-invalidation".to_string(),
        },
        timeout_seconds: 60,
        memory_mb: None,
        reserved_concurrency: None,
        log_retention_days: Some(1),
        destroy_log_group: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_companion_defaults() {
        let updater = update_function_code("site");
        assert_eq!(updater.name, "site-update-function-code");
        assert_eq!(updater.timeout_seconds, 15);
        assert_eq!(updater.log_retention_days, Some(1));

        let invalidator = cdn_invalidation("site");
        assert_eq!(invalidator.timeout_seconds, 60);
        assert!(invalidator.destroy_log_group);
    }
}
