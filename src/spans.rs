use std::sync::Arc;

use serde_json::Value;

use crate::constants::spans::{FEEDBACK_SEGMENT, SPANS_ENDPOINT};
use crate::core::{HttpClient, OpperError};
use crate::types::EventFeedback;

/// Feedback on traced calls. Obtained from [`crate::Opper::spans`].
#[derive(Debug, Clone)]
pub struct Spans {
    http: Arc<HttpClient>,
}

impl Spans {
    pub(crate) fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }

    /// Scores the call recorded under `span_id`, as found in [`crate::ResponseMetadata`].
    #[tracing::instrument(skip(self, feedback), fields(score = feedback.score()), err)]
    pub async fn save_feedback(
        &self,
        span_id: &str,
        feedback: EventFeedback,
    ) -> Result<(), OpperError> {
        if span_id.trim().is_empty() {
            return Err(OpperError::invalid_argument("span_id", "must not be empty"));
        }
        let span_id = HttpClient::encode_segments([span_id])?;
        let _: Value = self
            .http
            .post_json(&format!("{SPANS_ENDPOINT}/{span_id}{FEEDBACK_SEGMENT}"), &feedback)
            .await?;
        Ok(())
    }
}
