use std::sync::Arc;

use crate::api_client::IgClient;

/// Shared by every request handler. Read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub client: IgClient,
    pub default_stocks: Arc<Vec<String>>,
}

impl AppState {
    pub fn new(client: IgClient, default_stocks: Vec<String>) -> Self {
        Self {
            client,
            default_stocks: Arc::new(default_stocks),
        }
    }
}
