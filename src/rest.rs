// SPDX-License-Identifier: MIT OR Apache-2.0

//! An entity for a REST API.
//!
//! The HTTP client itself is not part of this crate.  [`RestEntity`] builds
//! requests, hands them to a [`Transport`] and traces the exchange:
//!
//! ```text
//! https://api.example.com:
//!     <<< GET https://api.example.com/users/1
//!     >>>
//!         {"id": 1}
//! ```

use crate::context::Context;
use crate::entity::Entity;
use crate::error::{Error, Result};
use std::fmt::Debug;

/// An HTTP request ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HttpRequest {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        HttpRequest {
            method: method.into(),
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// What came back for an [`HttpRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        HttpResponse {
            status,
            body: body.into(),
        }
    }

    /// Whether the status is in `[200, 400)`.
    pub fn is_success(&self) -> bool {
        (200..400).contains(&self.status)
    }
}

/// The HTTP client a [`RestEntity`] sends through.
///
/// Implementations report connection-level failures as
/// [`Error::Transport`]; a response with any status is a success at this
/// level.
pub trait Transport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse>;
}

/// Entity for a REST API, named after its base URL.
pub struct RestEntity<T> {
    context: Context,
    base_url: String,
    transport: T,
}

impl<T: Debug> Debug for RestEntity<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestEntity")
            .field("base_url", &self.base_url)
            .field("transport", &self.transport)
            .finish_non_exhaustive()
    }
}

impl<T: Transport> RestEntity<T> {
    pub fn new(context: Context, base_url: impl Into<String>, transport: T) -> Self {
        RestEntity {
            context,
            base_url: base_url.into(),
            transport,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Appends `path` to the base URL with exactly one `/` between them.
    pub fn build_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub fn new_request(&self, method: &str, path: &str) -> HttpRequest {
        HttpRequest::new(method, self.build_url(path))
    }

    /// Sends `request` and logs the response body as the result.
    ///
    /// Any status counts as an answer; see
    /// [`assert_send_request`](Self::assert_send_request) to fail on error
    /// statuses.
    pub fn send_request(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let _interaction = self.interaction().entered()?;
        self.request(Some(format!("{} {}", request.method, request.url).as_str()));
        let response = self.transport.send(request)?;
        self.result(None).run(|result| result.log(&response.body))?;
        Ok(response)
    }

    /// Like [`send_request`](Self::send_request), but a status outside
    /// `[200, 400)` is an [`Error::Status`].
    pub fn assert_send_request(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let response = self.send_request(request)?;
        if !response.is_success() {
            return Err(Error::Status {
                status: response.status,
                body: response.body,
            });
        }
        Ok(response)
    }
}

impl<T: Transport> Entity for RestEntity<T> {
    fn context(&self) -> &Context {
        &self.context
    }

    fn name(&self) -> &str {
        &self.base_url
    }
}
