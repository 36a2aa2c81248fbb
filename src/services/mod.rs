pub mod annotations_api;
pub mod config;
pub mod http_client;
pub mod logger;
pub mod tool_executor;
pub mod validation;
