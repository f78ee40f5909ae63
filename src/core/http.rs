//! Shared HTTP client used by every API surface.

use std::time::Duration;

use bytes::Bytes;
use futures::{StreamExt, TryStreamExt, stream::BoxStream};
use reqwest::{Method, StatusCode, Url};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

use super::config::{ClientConfig, InspectorConfig};
use super::error::OpperError;

/// Thin wrapper over `reqwest::Client` that maps statuses onto [`OpperError`].
#[derive(Debug)]
pub struct HttpClient {
    client: reqwest::Client,
    base_url: String,
    auth_header: (String, String),
    timeout: Duration,
    inspector_config: Option<InspectorConfig>,
}

impl HttpClient {
    pub fn new(config: &ClientConfig) -> Result<Self, OpperError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.http.connect_timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| {
                OpperError::Configuration(format!("Failed to build reqwest client: {e}"))
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            auth_header: config.auth_header(),
            timeout: config.http.timeout,
            inspector_config: config.inspector.clone(),
        })
    }

    /// Percent-encodes every segment of a caller-supplied path, keeping the `/`
    /// separators, so `?`, `#` or spaces cannot escape into the query or fragment.
    pub fn encode_path(path: &str) -> Result<String, OpperError> {
        Self::encode_segments(path.split('/'))
    }

    /// Joins `segments` with `/`, percent-encoding each one (a `/` inside a
    /// segment becomes `%2F`).
    pub fn encode_segments<'a>(
        segments: impl IntoIterator<Item = &'a str>,
    ) -> Result<String, OpperError> {
        let mut url = Url::parse("http://localhost/")
            .map_err(|e| OpperError::Configuration(format!("Failed to build path: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| OpperError::Configuration("Failed to build path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        let encoded = url.path();
        Ok(encoded.strip_prefix('/').unwrap_or(encoded).to_string())
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get_json<Res>(&self, path: &str) -> Result<Res, OpperError>
    where
        Res: DeserializeOwned,
    {
        self.send_json::<(), Res>(Method::GET, path, None).await
    }

    pub async fn post_json<Req, Res>(&self, path: &str, body: &Req) -> Result<Res, OpperError>
    where
        Req: Serialize,
        Res: DeserializeOwned,
    {
        self.send_json(Method::POST, path, Some(body)).await
    }

    pub async fn patch_json<Req, Res>(&self, path: &str, body: &Req) -> Result<Res, OpperError>
    where
        Req: Serialize,
        Res: DeserializeOwned,
    {
        self.send_json(Method::PATCH, path, Some(body)).await
    }

    /// Returns `false` when the resource was already gone (404).
    #[tracing::instrument(name = "http_delete", skip(self), fields(path = %path), err)]
    pub async fn delete(&self, path: &str) -> Result<bool, OpperError> {
        let res = self.send(Method::DELETE, path, None, true).await?;
        let status = res.status();

        if status.is_success() {
            debug!(status = %status, "Resource deleted");
            return Ok(true);
        }
        if status == StatusCode::NOT_FOUND {
            debug!("Resource did not exist");
            return Ok(false);
        }

        Err(self.error_from_response(res).await)
    }

    /// Make a request with an optional JSON body and decode the JSON response.
    #[tracing::instrument(
        name = "http_json",
        skip(self, body),
        fields(method = %method, path = %path),
        err
    )]
    pub async fn send_json<Req, Res>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Req>,
    ) -> Result<Res, OpperError>
    where
        Req: Serialize,
        Res: DeserializeOwned,
    {
        let body_value = body.map(to_value).transpose()?;
        let res = self.send(method, path, body_value, true).await?;
        let status = res.status();

        if !status.is_success() {
            return Err(self.error_from_response(res).await);
        }

        debug!(status = %status, "HTTP request successful");

        let response_text = res.text().await.map_err(|e| OpperError::Transport {
            message: "Failed to read response body".to_string(),
            source: Box::new(e),
        })?;

        // Endpoints without a body still need to decode into `()` or `Value`.
        let response_value: serde_json::Value = if response_text.trim().is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_str(&response_text).map_err(|e| OpperError::Parse {
                message: "Failed to parse response as JSON".to_string(),
                source: Box::new(e),
            })?
        };

        self.inspect_response(&response_value);

        serde_json::from_value(response_value).map_err(|e| OpperError::Parse {
            message: "Failed to parse API response".to_string(),
            source: Box::new(e),
        })
    }

    /// POST a JSON body and hand back the raw body as a byte stream.
    ///
    /// Dropping the returned stream drops the response and releases the connection.
    #[tracing::instrument(name = "http_stream", skip(self, body), fields(path = %path), err)]
    pub async fn post_stream<Req>(
        &self,
        path: &str,
        body: &Req,
    ) -> Result<BoxStream<'static, Result<Bytes, OpperError>>, OpperError>
    where
        Req: Serialize,
    {
        let body_value = to_value(body)?;
        let res = self.send(Method::POST, path, Some(body_value), false).await?;
        let status = res.status();

        if !status.is_success() {
            return Err(self.error_from_response(res).await);
        }

        debug!(status = %status, "Streaming response opened");

        Ok(res
            .bytes_stream()
            .map_err(|e| OpperError::Transport {
                message: "Connection failed while streaming".to_string(),
                source: Box::new(e),
            })
            .boxed())
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
        bounded: bool,
    ) -> Result<reqwest::Response, OpperError> {
        let url = self.url(path);
        let mut req_builder = self
            .client
            .request(method, &url)
            .header(&self.auth_header.0, &self.auth_header.1);

        // Streams are not bounded by the total timeout once headers arrived.
        if bounded {
            req_builder = req_builder.timeout(self.timeout);
        }

        if let Some(body_value) = body {
            self.inspect_request(&body_value);
            req_builder = req_builder.json(&body_value);
        }

        req_builder.send().await.map_err(|e| OpperError::Transport {
            message: format!("Request to {url} failed"),
            source: Box::new(e),
        })
    }

    async fn error_from_response(&self, res: reqwest::Response) -> OpperError {
        let status = res.status();
        let error_text = res
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        warn!(status = %status, "API returned error status");

        let error_value = serde_json::from_str(&error_text).unwrap_or_else(|_| {
            serde_json::json!({
                "error": error_text,
                "status_code": status.as_u16()
            })
        });
        self.inspect_response(&error_value);

        classify_error(status, &error_value)
    }

    fn inspect_request(&self, value: &serde_json::Value) {
        if let Some(ref config) = self.inspector_config
            && let Some(ref inspector) = config.request_inspector
        {
            inspector(value);
        }
    }

    fn inspect_response(&self, value: &serde_json::Value) {
        if let Some(ref config) = self.inspector_config
            && let Some(ref inspector) = config.response_inspector
        {
            inspector(value);
        }
    }
}

fn to_value<T: Serialize>(body: &T) -> Result<serde_json::Value, OpperError> {
    serde_json::to_value(body).map_err(|e| OpperError::Parse {
        message: "Failed to serialize request body".to_string(),
        source: Box::new(e),
    })
}

/// Map a non-success status and its JSON body onto the error taxonomy.
pub(crate) fn classify_error(status: StatusCode, body: &serde_json::Value) -> OpperError {
    let message = error_detail(body);

    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            OpperError::ServerValidation {
                message,
                status_code: status.as_u16(),
            }
        }
        StatusCode::NOT_FOUND => OpperError::NotFound { message },
        StatusCode::CONFLICT => OpperError::Conflict { message },
        _ => OpperError::Api {
            message: format!("{status}: {message}"),
            status_code: Some(status.as_u16()),
        },
    }
}

/// Pull a readable message out of the error bodies the service produces:
/// `{"detail": "..."}`, `{"detail": [{"loc": [...], "msg": "..."}]}` or `{"error": "..."}`.
pub(crate) fn error_detail(body: &serde_json::Value) -> String {
    let detail = body.get("detail").or_else(|| body.get("error"));

    match detail {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Array(items)) => items
            .iter()
            .map(|item| {
                let msg = item
                    .get("msg")
                    .and_then(|m| m.as_str())
                    .unwrap_or("invalid value");
                let location = item
                    .get("loc")
                    .and_then(|l| l.as_array())
                    .map(|parts| {
                        parts
                            .iter()
                            .map(|p| match p {
                                serde_json::Value::String(s) => s.clone(),
                                other => other.to_string(),
                            })
                            .collect::<Vec<_>>()
                            .join(".")
                    });
                match location {
                    Some(loc) if !loc.is_empty() => format!("{loc}: {msg}"),
                    _ => msg.to_string(),
                }
            })
            .collect::<Vec<_>>()
            .join("; "),
        Some(other) => other.to_string(),
        None => body.to_string(),
    }
}
