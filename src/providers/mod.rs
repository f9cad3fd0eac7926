pub mod compat;
pub mod openai;
pub mod traits;

use std::sync::Arc;

use log::info;

use crate::config::Settings;
use crate::error::AppError;
use compat::CompatProvider;
use openai::OpenAiProvider;
use traits::CompletionProvider;

/// Builds the completion provider from settings. A configured
/// `COMPAT_API_URL` routes completions through the OpenAI-compatible client;
/// otherwise the official OpenAI client is used. `None` when no API key is
/// configured, so the server can still serve non-AI endpoints.
pub fn build_provider(settings: &Settings) -> Option<Arc<dyn CompletionProvider + Send + Sync>> {
    let api_key = settings.api_key.clone()?;

    match &settings.compat_api_url {
        Some(url) => {
            info!("Using OpenAI-compatible endpoint: {}", url);
            Some(Arc::new(CompatProvider::new(
                api_key,
                url.clone(),
                settings.chat_model.clone(),
            )))
        }
        None => Some(Arc::new(OpenAiProvider::new(
            api_key,
            settings.chat_model.clone(),
        ))),
    }
}

/// Surfaces a missing provider as the configuration error the original
/// implementation reported per request.
pub fn require_provider(
    provider: &Option<Arc<dyn CompletionProvider + Send + Sync>>,
) -> Result<&Arc<dyn CompletionProvider + Send + Sync>, AppError> {
    provider.as_ref().ok_or_else(|| {
        AppError::Upstream(
            "OpenAI API key not configured. Please check your environment variables.".to_string(),
        )
    })
}
