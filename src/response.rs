//! Fully buffered response handed to the invocation harness.
//!
//! `AggregatedResponse` serialises to the proxy envelope field names used by
//! function-as-a-service front doors: `statusCode`, `statusDescription`,
//! `multiValueHeaders`, `body` and `isBase64Encoded`.

use serde::{Serialize, Serializer, ser::SerializeStruct};

use crate::headers::MultiValueHeaders;

/// Body of an aggregated response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResponseBody {
    /// Body decoded as UTF-8 text.
    Text(String),
    /// Binary body encoded as MIME base64.
    Base64(String),
}

impl ResponseBody {
    /// Textual representation placed in the envelope.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text(text) | Self::Base64(text) => text,
        }
    }
}

/// One complete response produced by a [`ResponseAggregator`](crate::ResponseAggregator).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AggregatedResponse {
    status_code: u16,
    status_description: Option<String>,
    multi_value_headers: MultiValueHeaders,
    body: Option<ResponseBody>,
}

impl AggregatedResponse {
    pub(crate) fn new(
        status_code: u16,
        status_description: Option<String>,
        multi_value_headers: MultiValueHeaders,
        body: Option<ResponseBody>,
    ) -> Self {
        Self {
            status_code,
            status_description,
            multi_value_headers,
            body,
        }
    }

    /// Numeric status code.
    #[must_use]
    pub const fn status_code(&self) -> u16 { self.status_code }

    /// Status description, present only for load balancer requests.
    #[must_use]
    pub fn status_description(&self) -> Option<&str> { self.status_description.as_deref() }

    /// Response headers.
    #[must_use]
    pub fn multi_value_headers(&self) -> &MultiValueHeaders { &self.multi_value_headers }

    /// Response body, absent when no body bytes were produced.
    #[must_use]
    pub fn body(&self) -> Option<&ResponseBody> { self.body.as_ref() }

    /// Whether the body is base64 encoded.
    #[must_use]
    pub fn is_base64_encoded(&self) -> bool { matches!(self.body, Some(ResponseBody::Base64(_))) }
}

impl Serialize for AggregatedResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let fields = if self.status_description.is_some() { 5 } else { 4 };
        let mut envelope = serializer.serialize_struct("AggregatedResponse", fields)?;
        envelope.serialize_field("statusCode", &self.status_code)?;
        if let Some(description) = &self.status_description {
            envelope.serialize_field("statusDescription", description)?;
        } else {
            envelope.skip_field("statusDescription")?;
        }
        envelope.serialize_field("multiValueHeaders", &self.multi_value_headers)?;
        envelope.serialize_field("body", &self.body.as_ref().map(ResponseBody::as_str))?;
        envelope.serialize_field("isBase64Encoded", &self.is_base64_encoded())?;
        envelope.end()
    }
}
