//! HTTP client for the Resolution Service
//!
//! Posts the request as JSON and expects `{"answer": string}` back. The
//! blocking `ureq` agent runs on Tokio's blocking pool so the async runtime
//! never stalls on network I/O.

use super::{
    ResolutionError, ResolutionErrorBody, ResolutionRequest, ResolutionResponse,
    ResolutionService,
};
use crate::config::ResolverConfig;
use async_trait::async_trait;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HttpResolutionService {
    agent: ureq::Agent,
    endpoint: String,
    user_agent: String,
}

impl HttpResolutionService {
    pub fn new(endpoint: impl Into<String>, timeout: Option<Duration>, user_agent: &str) -> Self {
        let mut builder = ureq::AgentBuilder::new();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Self {
            agent: builder.build(),
            endpoint: endpoint.into(),
            user_agent: user_agent.to_string(),
        }
    }

    pub fn from_config(config: &ResolverConfig) -> Self {
        Self::new(
            config.endpoint.clone(),
            config.timeout_ms.map(Duration::from_millis),
            &config.user_agent,
        )
    }

    /// Send one request and wait for the answer
    pub fn resolve_blocking(&self, request: &ResolutionRequest) -> Result<String, ResolutionError> {
        if !request.is_resolvable() {
            return Err(ResolutionError::MissingQuestion);
        }
        let body = serde_json::to_string(request)
            .map_err(|e| ResolutionError::InvalidResponse(e.to_string()))?;

        tracing::debug!("POST {} ({} bytes)", self.endpoint, body.len());
        let response = self
            .agent
            .post(&self.endpoint)
            .set("User-Agent", &self.user_agent)
            .set("Content-Type", "application/json")
            .set("Accept", "application/json")
            .send_string(&body);

        match response {
            Ok(response) => {
                let text = response
                    .into_string()
                    .map_err(|e| ResolutionError::Transport(e.to_string()))?;
                parse_answer(&text)
            }
            Err(ureq::Error::Status(code, response)) => {
                let message = response
                    .into_string()
                    .ok()
                    .and_then(|text| serde_json::from_str::<ResolutionErrorBody>(&text).ok())
                    .map(|body| body.error);
                tracing::warn!("Resolution service returned {}: {:?}", code, message);
                Err(ResolutionError::Status { code, message })
            }
            Err(ureq::Error::Transport(e)) => {
                tracing::warn!("Resolution request failed: {}", e);
                Err(ResolutionError::Transport(e.to_string()))
            }
        }
    }
}

fn parse_answer(body: &str) -> Result<String, ResolutionError> {
    serde_json::from_str::<ResolutionResponse>(body)
        .map(|response| response.answer)
        .map_err(|e| ResolutionError::InvalidResponse(e.to_string()))
}

#[async_trait]
impl ResolutionService for HttpResolutionService {
    async fn resolve(&self, request: ResolutionRequest) -> Result<String, ResolutionError> {
        let client = self.clone();
        tokio::task::spawn_blocking(move || client.resolve_blocking(&request))
            .await
            .map_err(|e| ResolutionError::Unavailable(e.to_string()))?
    }
}
