use super::types::error_from_body;
use crate::sdk::config::ProviderConfig;
use crate::sdk::geo::Coordinate;
use crate::sdk::routing::cache::key_signature;
use crate::sdk::routing::error::RoutingError;
use crate::sdk::routing::response::RouteResponse;
use crate::sdk::routing::service::RoutingProvider;
use crate::sdk::util::rate_limit::{wait_for_slot, Limiter};
use reqwest::blocking::Client;
use serde_json::Value;

/// HTTP routing provider: `GET {base}/v1/routing?waypoints=...&mode=...`.
pub struct RemoteRoutingProvider {
    client: Client,
    api_key: String,
    key_signature: String,
    base_url: String,
    mode: String,
    limiter: Limiter,
}

impl RemoteRoutingProvider {
    pub fn new(config: &ProviderConfig, limiter: Limiter) -> Result<Self, RoutingError> {
        if config.api_key.trim().is_empty() {
            return Err(RoutingError::MissingApiKey);
        }

        let client = Client::builder()
            .user_agent(concat!("courier-nav/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            key_signature: key_signature(&config.api_key),
            base_url: config.base_url.clone(),
            mode: config.mode.clone(),
            limiter,
        })
    }

    fn routing_url(&self) -> String {
        format!("{}/v1/routing", self.base_url)
    }

    /// Query parameters without the API key, which is appended separately
    /// so it never reaches the logs.
    fn query(&self, waypoints: &[Coordinate], optimize: bool) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("waypoints", encode_waypoints(waypoints)),
            ("mode", self.mode.clone()),
        ];
        if optimize {
            params.push(("optimize", "true".to_string()));
        }
        params
    }
}

/// `lat1,lng1|lat2,lng2|...`
pub fn encode_waypoints(waypoints: &[Coordinate]) -> String {
    waypoints
        .iter()
        .map(|c| format!("{},{}", c.lat, c.lng))
        .collect::<Vec<_>>()
        .join("|")
}

impl RoutingProvider for RemoteRoutingProvider {
    fn key_signature(&self) -> &str {
        &self.key_signature
    }

    fn fetch_route(
        &self,
        waypoints: &[Coordinate],
        optimize: bool,
    ) -> Result<RouteResponse, RoutingError> {
        wait_for_slot(&self.limiter);

        let url = self.routing_url();
        let params = self.query(waypoints, optimize);
        log::debug!("[PROVIDER] GET {} {:?}", url, params);

        let response = match self
            .client
            .get(&url)
            .query(&params)
            .query(&[("apiKey", self.api_key.as_str())])
            .send()
        {
            Ok(resp) => resp,
            Err(e) => {
                log::error!("Routing request failed. URL: {}\nError: {}", url, e);
                return Err(RoutingError::RequestError(e));
            }
        };

        let status = response.status();
        let text = response.text()?;

        if !status.is_success() {
            log::error!("Routing provider returned {}. Body: {}", status, text);
            return Err(error_from_body(status.as_u16(), &text));
        }

        let body: Value = serde_json::from_str(&text).map_err(|e| {
            log::error!(
                "Failed to parse routing response. URL: {}\nError: {}. Body: {}",
                url,
                e,
                text
            );
            e
        })?;

        Ok(RouteResponse::new(body))
    }
}
