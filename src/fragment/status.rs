//! Status line and header fragment.

use std::borrow::Cow;

use http::{HeaderMap, HeaderName, HeaderValue, StatusCode, response::Parts};

/// Status code, optional reason text and headers of a response.
#[derive(Clone, Debug, PartialEq)]
pub struct StatusFragment {
    status: StatusCode,
    reason: Option<String>,
    headers: HeaderMap,
}

impl StatusFragment {
    /// Create a fragment with no reason text and no headers.
    #[must_use]
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            reason: None,
            headers: HeaderMap::new(),
        }
    }

    /// Attach explicit reason text.
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Append a header value, keeping any values already present.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Replace all headers.
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Status code of the response.
    #[must_use]
    pub const fn status(&self) -> StatusCode { self.status }

    /// Reason text: the explicit text if one was supplied, otherwise the
    /// canonical phrase for the status code. Codes without a canonical phrase
    /// get their class phrase followed by the code, e.g. `Server Error (599)`.
    #[must_use]
    pub fn reason_phrase(&self) -> Cow<'_, str> {
        if let Some(reason) = &self.reason {
            return Cow::Borrowed(reason);
        }
        match self.status.canonical_reason() {
            Some(reason) => Cow::Borrowed(reason),
            None => Cow::Owned(format!("{} ({})", class_phrase(self.status), self.status.as_u16())),
        }
    }

    /// Headers carried by the fragment.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap { &self.headers }

    /// Mutable access to the headers.
    pub fn headers_mut(&mut self) -> &mut HeaderMap { &mut self.headers }
}

impl From<Parts> for StatusFragment {
    fn from(parts: Parts) -> Self {
        Self {
            status: parts.status,
            reason: None,
            headers: parts.headers,
        }
    }
}

fn class_phrase(status: StatusCode) -> &'static str {
    match status.as_u16() / 100 {
        1 => "Informational",
        2 => "Success",
        3 => "Redirection",
        4 => "Client Error",
        5 => "Server Error",
        _ => "Unknown Status",
    }
}
