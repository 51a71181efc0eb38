use serde::{Deserialize, Serialize};

use crate::error::{describe, AnalysisError, SUCCESS};
use crate::stats::PitchSummary;

/// Outcome of one analysis call as reported to callers.
///
/// The pitch fields are only present on success.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    pub status: i32,
    pub comment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pitch1: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pitch2: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pitch3: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pitch4: Option<f64>,
}

impl AnalysisResult {
    pub fn success(summary: PitchSummary) -> Self {
        Self {
            status: SUCCESS,
            comment: "success".into(),
            pitch1: Some(summary.pitch1),
            pitch2: Some(summary.pitch2),
            pitch3: Some(summary.pitch3),
            pitch4: Some(summary.pitch4),
        }
    }

    pub fn failure(err: &AnalysisError) -> Self {
        Self {
            status: err.status(),
            comment: err.to_string(),
            pitch1: None,
            pitch2: None,
            pitch3: None,
            pitch4: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == SUCCESS
    }

    /// The four descriptors, if all are present.
    pub fn summary(&self) -> Option<PitchSummary> {
        Some(PitchSummary {
            pitch1: self.pitch1?,
            pitch2: self.pitch2?,
            pitch3: self.pitch3?,
            pitch4: self.pitch4?,
        })
    }

    pub fn to_json(&self) -> String {
        // Serializing plain numbers and strings into a String cannot fail.
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(
                r#"{{"status":{},"comment":"{}"}}"#,
                self.status,
                describe(self.status).unwrap_or_default()
            )
        })
    }
}
