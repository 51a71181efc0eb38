use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Status code reported on success.
pub const SUCCESS: i32 = 0;

/// Status codes and their descriptions, as reported in the `comment` field.
pub static ERROR_CATALOG: [(i32, &str); 10] = [
    (SUCCESS, "success"),
    (1000, "Error : file not found"),
    (1001, "Error : file cannot be read"),
    (1002, "Error : file is not on correct format"),
    (2000, "Error : no speech detected"),
    (2001, "Error : cannot calculate pitch 1. Reason : ..."),
    (2002, "Error : cannot calculate pitch 2. Reason : ..."),
    (2003, "Error : cannot calculate pitch 3. Reason : ..."),
    (2004, "Error : cannot calculate pitch 4. Reason : ..."),
    (3000, "Error : Memory Allocation Error"),
];

/// Looks up the catalog description of a status code.
pub fn describe(status: i32) -> Option<&'static str> {
    ERROR_CATALOG
        .iter()
        .find(|(code, _)| *code == status)
        .map(|(_, desc)| *desc)
}

/// Failures of a single analysis call.
///
/// The `Display` output is the `comment` reported alongside [`status()`](Self::status).
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Error : file not found")]
    FileNotFound(#[source] std::io::Error),

    #[error("Error : file cannot be read")]
    FileUnreadable(#[source] std::io::Error),

    #[error("Error : file is not on correct format")]
    UnsupportedFormat(String),

    /// The f0 estimator failed to produce a contour.
    #[error("Error : no speech detected")]
    NoSpeech(String),

    /// One of the four statistics could not be computed. `index` is 1..=4.
    #[error("Error : cannot calculate pitch {index}. Reason : {reason}")]
    Pitch { index: u8, reason: String },

    #[error("Error : Memory Allocation Error {0}")]
    Allocation(String),
}

impl AnalysisError {
    pub fn status(&self) -> i32 {
        match self {
            AnalysisError::FileNotFound(_) => 1000,
            AnalysisError::FileUnreadable(_) => 1001,
            AnalysisError::UnsupportedFormat(_) => 1002,
            AnalysisError::NoSpeech(_) => 2000,
            AnalysisError::Pitch { index, .. } => 2000 + *index as i32,
            AnalysisError::Allocation(_) => 3000,
        }
    }

    /// Detail that is logged but not part of the reported comment.
    pub fn detail(&self) -> String {
        match self {
            AnalysisError::FileNotFound(e) | AnalysisError::FileUnreadable(e) => e.to_string(),
            AnalysisError::UnsupportedFormat(s)
            | AnalysisError::NoSpeech(s)
            | AnalysisError::Allocation(s) => s.clone(),
            AnalysisError::Pitch { reason, .. } => reason.clone(),
        }
    }

    pub(crate) fn pitch(index: u8, reason: impl Into<String>) -> Self {
        AnalysisError::Pitch {
            index,
            reason: reason.into(),
        }
    }
}

impl From<hound::Error> for AnalysisError {
    fn from(err: hound::Error) -> Self {
        match err {
            hound::Error::IoError(e) => AnalysisError::FileUnreadable(e),
            e => AnalysisError::UnsupportedFormat(e.to_string()),
        }
    }
}
