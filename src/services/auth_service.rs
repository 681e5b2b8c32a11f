use tracing::{error, info};

use crate::api_client::{ApiError, IgClient};
use crate::error::PipelineError;
use crate::models::Session;

/// Log in with the configured credentials. Every pipeline run gets a fresh
/// session; nothing is cached.
pub async fn authenticate(client: &IgClient) -> Result<Session, PipelineError> {
    info!("Authenticating with IG API...");

    match client.create_session().await {
        Ok(session) => {
            info!("Authentication successful");
            Ok(session)
        }
        Err(e @ ApiError::MissingHeader(_)) => {
            error!("Missing tokens in authentication response: {}", e);
            Err(PipelineError::AuthenticationFailed(e.to_string()))
        }
        Err(e) => {
            error!("Authentication request failed: {}", e);
            Err(PipelineError::AuthenticationFailed(e.to_string()))
        }
    }
}
