//! Read-only view of the request that originated a response.
//!
//! Only the request source matters to aggregation: load balancer invocations
//! expect a status description alongside the status code.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Platform front door that delivered the request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestSource {
    /// API Gateway proxy integration.
    #[default]
    ApiGateway,
    /// Application Load Balancer target.
    Alb,
}

impl RequestSource {
    /// Whether responses to this source carry a status description.
    #[must_use]
    pub const fn includes_status_description(self) -> bool { matches!(self, Self::Alb) }

    fn as_str(self) -> &'static str {
        match self {
            Self::ApiGateway => "API_GATEWAY",
            Self::Alb => "ALB",
        }
    }
}

impl fmt::Display for RequestSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Error returned when parsing an unknown request source.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown request source: {0}")]
pub struct UnknownRequestSource(String);

impl FromStr for RequestSource {
    type Err = UnknownRequestSource;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().replace('-', "_").as_str() {
            "API_GATEWAY" => Ok(Self::ApiGateway),
            "ALB" => Ok(Self::Alb),
            _ => Err(UnknownRequestSource(s.to_owned())),
        }
    }
}

/// Request metadata the aggregator consults.
pub trait RequestContext {
    /// Source variant of the originating request.
    fn request_source(&self) -> RequestSource;
}

impl RequestContext for RequestSource {
    fn request_source(&self) -> RequestSource { *self }
}
