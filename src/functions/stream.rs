use bytes::Bytes;
use futures::{Stream, StreamExt, stream::BoxStream};
use serde_json::Value;
use tracing::debug;

use crate::core::sse::{self, SseEvent};
use crate::core::{Delta, OpperError};

/// Streamed answer of a function call.
///
/// Deltas can be taken exactly once; the stream is pulled lazily from the open
/// connection and dropping it closes that connection.
pub struct StreamingResponse {
    deltas: Option<BoxStream<'static, Result<Delta, OpperError>>>,
}

impl std::fmt::Debug for StreamingResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingResponse")
            .field("consumed", &self.deltas.is_none())
            .finish()
    }
}

impl StreamingResponse {
    pub(crate) fn from_bytes<S>(body: S) -> Self
    where
        S: Stream<Item = Result<Bytes, OpperError>> + Send + Unpin + 'static,
    {
        Self::from_events(sse::decode(body))
    }

    fn from_events<S>(events: S) -> Self
    where
        S: Stream<Item = Result<SseEvent, OpperError>> + Send + 'static,
    {
        let deltas = events
            .filter_map(|event| async move {
                match event {
                    Ok(SseEvent::Data(data)) => delta_from_frame(&data),
                    Ok(SseEvent::Done) => None,
                    Err(e) => Some(Err(e)),
                }
            })
            // Nothing is yielded after the first error.
            .scan(false, |failed, item| {
                if *failed {
                    return futures::future::ready(None);
                }
                *failed = item.is_err();
                futures::future::ready(Some(item))
            })
            .boxed();

        Self {
            deltas: Some(deltas),
        }
    }

    /// Takes the delta stream. Every later call returns an empty stream.
    pub fn deltas(&mut self) -> BoxStream<'static, Result<Delta, OpperError>> {
        self.deltas
            .take()
            .unwrap_or_else(|| futures::stream::empty().boxed())
    }

    /// Drains the stream and concatenates the text deltas.
    pub async fn collect_text(&mut self) -> Result<String, OpperError> {
        let mut deltas = self.deltas();
        let mut text = String::new();
        while let Some(delta) = deltas.next().await {
            if let Delta::Text(fragment) = delta? {
                text.push_str(&fragment);
            }
        }
        Ok(text)
    }
}

fn delta_from_frame(data: &str) -> Option<Result<Delta, OpperError>> {
    let value: Value = match serde_json::from_str(data) {
        Ok(value) => value,
        Err(e) => {
            return Some(Err(OpperError::Parse {
                message: format!("Malformed stream frame: {data}"),
                source: Box::new(e),
            }));
        }
    };

    if let Some(error) = value.get("error").filter(|e| !e.is_null()) {
        let message = match error {
            Value::String(s) => s.clone(),
            other => other
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| other.to_string()),
        };
        return Some(Err(OpperError::Stream { message }));
    }

    match value.get("delta") {
        Some(Value::String(text)) => Some(Ok(Delta::Text(text.clone()))),
        Some(Value::Null) | None => {
            debug!(frame = %data, "Skipping metadata frame");
            None
        }
        Some(partial) => Some(Ok(Delta::Partial(partial.clone()))),
    }
}
