use crate::errors::ToolError;
use crate::managers::annotations::{AnnotationTool, AnnotationToolHandler, AnnotationsManager};
use crate::mcp::aliases::builtin_tool_alias_map_owned;
use crate::mcp::catalog::tool_catalog;
use crate::services::annotations_api::AnnotationsApi;
use crate::services::config::ClientConfig;
use crate::services::http_client::{HttpClient, PiwikClient};
use crate::services::logger::Logger;
use crate::services::tool_executor::{ToolExecutor, ToolHandler};
use crate::services::validation::Validation;
use std::collections::HashMap;
use std::sync::Arc;

pub struct App {
    pub logger: Logger,
    pub tool_executor: Arc<ToolExecutor>,
    pub annotations_manager: Arc<AnnotationsManager>,
}

impl App {
    fn validate_tool_wiring(
        handlers: &HashMap<String, Arc<dyn ToolHandler>>,
        alias_map: &HashMap<String, String>,
    ) -> Result<(), ToolError> {
        let mut missing: Vec<String> = tool_catalog()
            .iter()
            .filter(|tool| !handlers.contains_key(&tool.name) && !alias_map.contains_key(&tool.name))
            .map(|tool| tool.name.clone())
            .collect();
        let dangling: Vec<String> = alias_map
            .iter()
            .filter(|(_, target)| !handlers.contains_key(*target))
            .map(|(alias, _)| alias.clone())
            .collect();
        if missing.is_empty() && dangling.is_empty() {
            return Ok(());
        }
        missing.sort();
        Err(ToolError::internal("Tool wiring is incomplete")
            .with_hint("Every tool in tool_catalog.json needs a handler and every alias a target.")
            .with_details(serde_json::json!({
                "missing_tools": missing,
                "dangling_aliases": dangling,
            })))
    }

    /// Builds the app from `PIWIK_PRO_*` environment variables.
    pub fn initialize() -> Result<Self, ToolError> {
        let logger = Logger::new("annotations");
        let config = ClientConfig::from_env()?;
        logger.info(
            "configured",
            Some(&serde_json::json!({
                "base_url": config.base_url.as_str(),
                "timeout_ms": config.timeout.as_millis() as u64,
            })),
        );
        let client: Arc<dyn HttpClient> = Arc::new(PiwikClient::new(logger.clone(), config)?);
        Self::with_client(logger, client)
    }

    /// Builds the app around an existing transport. Every tool shares it.
    pub fn with_client(logger: Logger, client: Arc<dyn HttpClient>) -> Result<Self, ToolError> {
        let api = AnnotationsApi::new(client);
        let annotations_manager = Arc::new(AnnotationsManager::new(
            logger.clone(),
            Validation::new(),
            api,
        ));

        let mut handlers: HashMap<String, Arc<dyn ToolHandler>> = HashMap::new();
        for tool in AnnotationTool::ALL {
            handlers.insert(
                tool.name().to_string(),
                Arc::new(AnnotationToolHandler::new(annotations_manager.clone(), tool)),
            );
        }

        let alias_map = builtin_tool_alias_map_owned();

        Self::validate_tool_wiring(&handlers, &alias_map)?;

        let tool_executor = Arc::new(ToolExecutor::new(logger.clone(), handlers, alias_map));

        Ok(Self {
            logger,
            tool_executor,
            annotations_manager,
        })
    }
}
