//! Domain error types.

/// Top-level error type for sigsweep.
#[derive(Debug, thiserror::Error)]
pub enum SigsweepError {
    #[error("invalid filter configuration: {reason}")]
    Configuration { reason: String },

    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    #[error("candle series out of order at bar {index}: {reason}")]
    DataOrder { index: usize, reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SigsweepError {
    pub(crate) fn configuration(reason: impl Into<String>) -> Self {
        SigsweepError::Configuration {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_argument(reason: impl Into<String>) -> Self {
        SigsweepError::InvalidArgument {
            reason: reason.into(),
        }
    }
}

impl From<&SigsweepError> for std::process::ExitCode {
    fn from(err: &SigsweepError) -> Self {
        let code: u8 = match err {
            SigsweepError::Io(_) => 1,
            SigsweepError::Configuration { .. }
            | SigsweepError::InvalidArgument { .. }
            | SigsweepError::ConfigParse { .. }
            | SigsweepError::ConfigMissing { .. }
            | SigsweepError::ConfigInvalid { .. } => 2,
            SigsweepError::DataOrder { .. } | SigsweepError::Data { .. } => 3,
            SigsweepError::Csv(_) | SigsweepError::Json(_) => 4,
        };
        std::process::ExitCode::from(code)
    }
}
