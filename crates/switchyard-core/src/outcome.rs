//! Response envelopes.

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::StatusCode;
use http_body_util::Full;
use serde_json::{json, Value};

use crate::error::DispatchError;

/// HTTP response type produced by the engine.
pub type Response = http::Response<Full<Bytes>>;

/// A JSON payload with the status it is sent with.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseEnvelope {
    /// Body, serialized as JSON.
    pub data: Value,
    /// Response status.
    pub status: StatusCode,
}

impl ResponseEnvelope {
    /// Renders the envelope as a JSON response.
    #[must_use]
    pub fn into_response(self) -> Response {
        match serde_json::to_vec(&self.data) {
            Ok(body) => json_response(self.status, body),
            Err(err) => {
                tracing::error!(error = %err, "failed to serialize response envelope");
                let mut response = Response::new(Full::new(Bytes::new()));
                *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                response
            }
        }
    }
}

fn json_response(status: StatusCode, body: Vec<u8>) -> Response {
    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

/// What a route chain, middleware or exception handler answers with.
#[derive(Debug)]
pub enum Outcome {
    /// A JSON envelope.
    Envelope(ResponseEnvelope),
    /// A ready-made response, passed through untouched.
    Raw(Response),
}

impl Outcome {
    /// A `200 OK` envelope around a handler result.
    #[must_use]
    pub fn ok(data: Value) -> Self {
        Self::json(StatusCode::OK, data)
    }

    /// An envelope with an explicit status.
    #[must_use]
    pub fn json(status: StatusCode, data: Value) -> Self {
        Self::Envelope(ResponseEnvelope { data, status })
    }

    /// A pass-through response.
    #[must_use]
    pub fn raw(response: Response) -> Self {
        Self::Raw(response)
    }

    /// `{code: 404, error: "Not found."}`, returned when no route answers.
    #[must_use]
    pub fn not_found() -> Self {
        Self::json(
            StatusCode::NOT_FOUND,
            json!({ "code": 404, "error": "Not found." }),
        )
    }

    /// `{code: 502, error: "Bad request."}`, returned for a gateway request
    /// that is not a valid upgrade.
    #[must_use]
    pub fn bad_gateway() -> Self {
        Self::json(
            StatusCode::BAD_GATEWAY,
            json!({ "code": 502, "error": "Bad request." }),
        )
    }

    /// `{code: 500, error: ...}`, returned for errors no handler accepted.
    #[must_use]
    pub fn internal_error(error: &DispatchError) -> Self {
        Self::json(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "code": 500, "error": error.to_json() }),
        )
    }

    /// Returns the status the outcome will be sent with.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Envelope(envelope) => envelope.status,
            Self::Raw(response) => response.status(),
        }
    }

    /// Returns the envelope, if this is not a raw response.
    #[must_use]
    pub fn envelope(&self) -> Option<&ResponseEnvelope> {
        match self {
            Self::Envelope(envelope) => Some(envelope),
            Self::Raw(_) => None,
        }
    }

    /// Renders the outcome.
    #[must_use]
    pub fn into_response(self) -> Response {
        match self {
            Self::Envelope(envelope) => envelope.into_response(),
            Self::Raw(response) => response,
        }
    }
}

impl From<ResponseEnvelope> for Outcome {
    fn from(envelope: ResponseEnvelope) -> Self {
        Self::Envelope(envelope)
    }
}

impl From<Response> for Outcome {
    fn from(response: Response) -> Self {
        Self::Raw(response)
    }
}
