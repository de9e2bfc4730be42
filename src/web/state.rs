//! # Web API Application State

use std::sync::Arc;

use crate::config::WebConfig;
use crate::system_context::PlatformContext;

/// Shared state handed to every handler
#[derive(Debug, Clone)]
pub struct AppState {
    pub context: Arc<PlatformContext>,
    pub config: WebConfig,
}

impl AppState {
    pub fn new(context: Arc<PlatformContext>) -> Self {
        let config = context.config_manager.config().web.clone();
        Self { context, config }
    }
}
