use serde::{Deserialize, Serialize};

use crate::core::OpperError;

/// Feedback on a single call, scored from 0 (bad) to 1 (good).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawFeedback")]
pub struct EventFeedback {
    score: f64,
}

#[derive(Deserialize)]
struct RawFeedback {
    score: f64,
}

impl TryFrom<RawFeedback> for EventFeedback {
    type Error = OpperError;

    fn try_from(raw: RawFeedback) -> Result<Self, Self::Error> {
        EventFeedback::new(raw.score)
    }
}

impl EventFeedback {
    pub fn new(score: f64) -> Result<Self, OpperError> {
        if !(0.0..=1.0).contains(&score) {
            return Err(OpperError::invalid_argument(
                "score",
                format!("must be within [0, 1], got {score}"),
            ));
        }
        Ok(Self { score })
    }

    pub fn score(&self) -> f64 {
        self.score
    }
}
