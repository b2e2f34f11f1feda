use reqwest::{Client, RequestBuilder, Response};

use crate::config::ProviderConfig;
use crate::error::{AiResult, ProviderError};

pub(crate) fn build_client(config: &ProviderConfig) -> AiResult<Client> {
    Client::builder()
        .timeout(config.timeout)
        .build()
        .map_err(|e| ProviderError::Config(format!("Failed to build HTTP client: {e}")))
}

pub(crate) fn authorize(request: RequestBuilder, config: &ProviderConfig) -> RequestBuilder {
    match &config.api_key {
        Some(key) => request.bearer_auth(key),
        None => request,
    }
}

/// Send and turn non-2xx responses into [`ProviderError::Status`].
pub(crate) async fn send(request: RequestBuilder, config: &ProviderConfig) -> AiResult<Response> {
    let response = request.send().await.map_err(|e| match ProviderError::from(e) {
        ProviderError::Timeout(_) => ProviderError::Timeout(config.timeout.as_secs()),
        other => other,
    })?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(ProviderError::Status { status, body });
    }
    Ok(response)
}
