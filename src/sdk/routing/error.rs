use thiserror::Error;

#[derive(Error, Debug)]
pub enum RoutingError {
    #[error("Routing is not configured: set ROUTING_API_KEY")]
    MissingApiKey,

    #[error("Not enough valid stops to plan a route (need at least 2, found {found})")]
    InsufficientWaypoints { found: usize },

    // Structured error body returned by the provider
    #[error("Routing provider error (code {code}): {message}")]
    ApiError { code: u32, message: String },

    // Non-success response whose body did not match any known error shape
    #[error("Routing provider returned HTTP {status}: {body}")]
    RawApiError { status: u16, body: String },

    #[error("Routing request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Failed to parse routing response: {0}")]
    ParseError(#[from] serde_json::Error),
}
