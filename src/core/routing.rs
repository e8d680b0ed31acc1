//! Per-query endpoint selection.
//!
//! [`RoutingResolver::resolve`] has no error path: when the routing service is
//! unreachable or replies with something unusable, the configured default
//! endpoint is used and the outage is reported only through tracing and the
//! optional diagnostic channel.

use crate::core::config::Config;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Label for results routed by the service without a name.
pub const ROUTED_FALLBACK_NAME: &str = "Remote Agent";
pub const DIRECT_ROUTE_PREFIX: &str = "Direct";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceKind {
    Nlweb,
    ChatgptApp,
}

impl ServiceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ServiceKind::Nlweb => "nlweb",
            ServiceKind::ChatgptApp => "chatgpt-app",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "nlweb" => Some(ServiceKind::Nlweb),
            "chatgpt-app" => Some(ServiceKind::ChatgptApp),
            _ => None,
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoutingResult {
    pub endpoint: String,
    pub name: String,
    pub kind: Option<ServiceKind>,
    pub confidence: Option<f64>,
}

/// Why a query fell back to the default endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    Transport(String),
    Status(u16),
    InvalidBody(String),
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::Transport(message) => write!(f, "routing service unreachable: {message}"),
            FallbackReason::Status(status) => write!(f, "routing service returned HTTP {status}"),
            FallbackReason::InvalidBody(message) => {
                write!(f, "routing service sent an unreadable reply: {message}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingDiagnostic {
    pub query: String,
    pub reason: FallbackReason,
}

#[derive(Serialize)]
struct RoutingRequest<'a> {
    query: &'a str,
}

#[derive(Debug, Deserialize)]
struct RoutingResponse {
    #[serde(default)]
    endpoint: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    confidence: Option<f64>,
}

pub struct RoutingResolver {
    http: reqwest::Client,
    routing_url: String,
    default_endpoint: String,
    default_name: String,
    diagnostics: Option<mpsc::UnboundedSender<RoutingDiagnostic>>,
}

impl RoutingResolver {
    pub fn new(
        http: reqwest::Client,
        routing_url: impl Into<String>,
        default_endpoint: impl Into<String>,
        default_name: impl Into<String>,
    ) -> Self {
        Self {
            http,
            routing_url: routing_url.into(),
            default_endpoint: default_endpoint.into(),
            default_name: default_name.into(),
            diagnostics: None,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.routing_timeout_secs()))
            .build()?;
        Ok(Self::new(
            http,
            config.routing_url(),
            config.default_endpoint(),
            config.default_endpoint_name(),
        ))
    }

    pub fn set_diagnostic_sender(&mut self, sender: mpsc::UnboundedSender<RoutingDiagnostic>) {
        self.diagnostics = Some(sender);
    }

    pub fn default_route(&self) -> RoutingResult {
        RoutingResult {
            endpoint: self.default_endpoint.clone(),
            name: self.default_name.clone(),
            kind: Some(ServiceKind::Nlweb),
            confidence: None,
        }
    }

    /// Picks the endpoint for `query`. An explicit override short-circuits
    /// without touching the network.
    pub async fn resolve(&self, query: &str, endpoint_override: Option<&str>) -> RoutingResult {
        if let Some(endpoint) = endpoint_override
            .map(str::trim)
            .filter(|endpoint| !endpoint.is_empty())
        {
            return RoutingResult {
                endpoint: endpoint.to_string(),
                name: format!("{DIRECT_ROUTE_PREFIX}: {endpoint}"),
                kind: None,
                confidence: None,
            };
        }

        match self.fetch(query).await {
            Ok(response) => self.route_from_response(response),
            Err(reason) => {
                warn!(url = %self.routing_url, %reason, "Routing unavailable, using default endpoint");
                if let Some(sender) = &self.diagnostics {
                    let _ = sender.send(RoutingDiagnostic {
                        query: query.to_string(),
                        reason,
                    });
                }
                self.default_route()
            }
        }
    }

    async fn fetch(&self, query: &str) -> Result<RoutingResponse, FallbackReason> {
        debug!(url = %self.routing_url, "Requesting route");
        let response = self
            .http
            .post(&self.routing_url)
            .json(&RoutingRequest { query })
            .send()
            .await
            .map_err(|err| FallbackReason::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FallbackReason::Status(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| FallbackReason::Transport(err.to_string()))?;
        serde_json::from_slice(&body).map_err(|err| FallbackReason::InvalidBody(err.to_string()))
    }

    fn route_from_response(&self, response: RoutingResponse) -> RoutingResult {
        let endpoint = response
            .endpoint
            .filter(|endpoint| !endpoint.trim().is_empty());

        let Some(endpoint) = endpoint else {
            debug!("Routing service had no endpoint for query; using default");
            return self.default_route();
        };

        let kind = response.kind.as_deref().and_then(|kind| {
            let parsed = ServiceKind::parse(kind);
            if parsed.is_none() {
                debug!(kind, "Ignoring unknown service kind");
            }
            parsed
        });

        RoutingResult {
            endpoint,
            name: response
                .name
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| ROUTED_FALLBACK_NAME.to_string()),
            kind,
            confidence: response.confidence,
        }
    }
}
